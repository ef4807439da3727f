//! # Provider
//!
//! Collaborators supplied by the host application: an HTTP transport to reach
//! the Verifier and a signer for the Self-Issued ID Token.

use std::future::Future;

use anyhow::Result;
use http::StatusCode;
use serde_json::Value;

use crate::types::IdToken;

/// An HTTP response, reduced to what a Self-Issued OpenID Provider needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    /// Response status.
    pub status: StatusCode,

    /// The `Location` header, if any.
    pub location: Option<String>,

    /// Response body, as text.
    pub body: String,
}

impl HttpResponse {
    /// A response with the given status and body, and no `Location`.
    #[must_use]
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            location: None,
            body: body.into(),
        }
    }

    /// A `302 Found` redirect to `location`.
    #[must_use]
    pub fn redirect(location: impl Into<String>) -> Self {
        Self {
            status: StatusCode::FOUND,
            location: Some(location.into()),
            body: String::new(),
        }
    }
}

/// Sends requests to the Verifier. Implementations must not follow
/// redirects: a `302` and its `Location` are returned as-is.
pub trait Transport: Send + Sync {
    /// Send a `GET` request.
    fn get(&self, url: &str) -> impl Future<Output = Result<HttpResponse>> + Send;

    /// Send a `POST` request with an `application/x-www-form-urlencoded`
    /// body.
    fn post_form(&self, url: &str, body: &str) -> impl Future<Output = Result<HttpResponse>> + Send;

    /// Send a `POST` request with an `application/json` body.
    fn post_json(
        &self, url: &str, body: &Value,
    ) -> impl Future<Output = Result<HttpResponse>> + Send;
}

/// Signs the Self-Issued ID Token with the subject's key.
pub trait IdTokenSigner: Send + Sync {
    /// Sign `token`, returning a compact JWT.
    fn sign_id_token(&self, token: &IdToken) -> impl Future<Output = Result<String>> + Send;
}
