//! # Handlers
//!
//! The wallet side of a SIOPv2 exchange: fetch the Verifier's authentication
//! request, build a response presenting the holder's credentials, and post
//! the signed response back to the Verifier.
//!
//! ```rust,ignore
//! let request = fetch_request("https://verifier.example", &transport).await?;
//! let response = response_for(&request, &holder_did, vec![Kind::Object(vp)]);
//! let redirect =
//!     post_response(&request, &response, CompatibilityMode::Oidc, &signer, &transport).await?;
//! ```

use anyhow::Context;
use credo_core::Kind;
use credo_vdc::w3c::VerifiablePresentation;
use http::StatusCode;
use tracing::instrument;

use crate::Result;
use crate::error::transport;
use crate::provider::{HttpResponse, IdTokenSigner, Transport};
use crate::types::{CompatibilityMode, Siopv2Request, Siopv2Response};

const AUTHENTICATION_REQUESTS: &str = "authentication-requests";

/// Fetch a pending authentication request from the Verifier at
/// `verifier_url`.
///
/// # Errors
///
/// Returns [`crate::Error::Transport`] when the Verifier cannot be reached or
/// answers with an error status, and [`crate::Error::InvalidRequest`] when
/// the returned request URI cannot be parsed.
#[instrument(level = "debug", skip(transport))]
pub async fn fetch_request(verifier_url: &str, transport: &impl Transport) -> Result<Siopv2Request> {
    let url = format!("{}/{AUTHENTICATION_REQUESTS}", verifier_url.trim_end_matches('/'));
    let response =
        transport.get(&url).await.map_err(|e| transport!("issue fetching request: {e}"))?;
    if !response.status.is_success() {
        return Err(transport!("verifier returned {} fetching request", response.status));
    }
    Siopv2Request::from_uri(&response.body)
}

/// Build a response to `request` presenting `presentations` as
/// `subject_did`.
#[must_use]
pub fn response_for(
    request: &Siopv2Request, subject_did: &str, presentations: Vec<Kind<VerifiablePresentation>>,
) -> Siopv2Response {
    Siopv2Response::new(request, subject_did, presentations)
}

/// Sign the response's ID Token and post the response to the request's
/// `redirect_uri`.
///
/// Returns the redirect `Location` when the Verifier answers `302 Found`,
/// otherwise the response body.
///
/// # Errors
///
/// Returns [`crate::Error::ServerError`] when the ID Token cannot be signed
/// or the response encoded, and [`crate::Error::Transport`] when the
/// Verifier cannot be reached or redirects without a `Location`.
#[instrument(level = "debug", skip(response, signer, transport))]
pub async fn post_response(
    request: &Siopv2Request, response: &Siopv2Response, mode: CompatibilityMode,
    signer: &impl IdTokenSigner, transport: &impl Transport,
) -> Result<String> {
    let id_token =
        signer.sign_id_token(&response.id_token).await.context("signing id_token")?;

    let url = &request.redirect_uri;
    let sent = match mode {
        CompatibilityMode::Oidc => {
            let body = response.to_form_body(&id_token, request.state.as_deref())?;
            transport.post_form(url, &body).await
        }
        CompatibilityMode::EbsiWct => {
            let body = response.to_ebsi_wct_json(&id_token)?;
            transport.post_json(url, &body).await
        }
    };
    let HttpResponse {
        status,
        location,
        body,
    } = sent.map_err(|e| transport!("issue posting response: {e}"))?;

    if !status.is_success() && status != StatusCode::FOUND {
        tracing::warn!("verifier returned {status} for response: {body}");
    }
    if status == StatusCode::FOUND {
        return location.ok_or_else(|| transport!("redirect has no `Location`"));
    }
    Ok(body)
}
