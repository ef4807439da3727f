//! # JOSE Envelopes
//!
//! When a credential is secured with an enveloping proof it travels as a
//! compact JWT: the claims set carries the credential under `vc` and the
//! credential itself has no `proof` member. Presentations travel the same
//! way under `vp`.
//!
//! Producing and checking the signature is left to the signing and
//! verification collaborators, which use [`jsonwebtoken`] for the compact
//! serialization. This module shapes the claims and reads them back out of a
//! token.

use chrono::serde::{ts_seconds, ts_seconds_option};
use chrono::{DateTime, TimeDelta, Utc};
pub use jsonwebtoken::{Algorithm, Header};
use jsonwebtoken::{DecodingKey, Validation};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::w3c::credential::W3cCredential;
use crate::w3c::vp::VerifiablePresentation;
use crate::{Error, Result};

/// Claims used for Verifiable Credential issuance when the credential is
/// secured as a JWT.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[allow(clippy::module_name_repetitions)]
pub struct VcClaims {
    /// The `issuer` property of the Credential.
    ///
    /// For example, "did:example:123456789abcdefghi".
    pub iss: String,

    /// The Holder ID the Credential is intended for. Typically, the DID of the
    /// Holder from the Credential's `credentialSubject.id` property.
    pub sub: String,

    /// The time the token was signed, encoded as a UNIX timestamp.
    #[serde(with = "ts_seconds")]
    pub iat: DateTime<Utc>,

    /// The Credential's `issuanceDate`, encoded as a UNIX timestamp.
    #[serde(with = "ts_seconds_option")]
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub nbf: Option<DateTime<Utc>>,

    /// The Credential's `expirationDate`, encoded as a UNIX timestamp.
    #[serde(with = "ts_seconds_option")]
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub exp: Option<DateTime<Utc>>,

    /// The `id` property of the Credential.
    pub jti: String,

    /// The Credential.
    pub vc: W3cCredential,
}

impl VcClaims {
    /// Create a Verifiable Credential JWT payload from a W3C Verifiable
    /// Credential. Any embedded proof is dropped: the envelope secures it.
    #[must_use]
    pub fn from_vc(vc: &W3cCredential, issued_at: DateTime<Utc>) -> Self {
        Self {
            iss: vc.issuer_id().unwrap_or_default().to_string(),
            sub: vc.subject().unwrap_or_default().to_string(),
            iat: issued_at,
            nbf: vc.issued_at(),
            exp: vc.expires_at(),
            jti: vc.id().unwrap_or_default().to_string(),
            vc: vc.without_proof(),
        }
    }
}

/// Claims used to present credentials as a JWT.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct VpClaims {
    /// The `holder` property of the Presentation.
    pub iss: String,

    /// The `id` property of the Presentation.
    pub jti: String,

    /// The `client_id` value from the Verifier's Authorization Request.
    pub aud: String,

    /// The `nonce` value from the Verifier's Authorization Request.
    pub nonce: String,

    /// The time the Presentation was created, encoded as a UNIX timestamp.
    #[serde(with = "ts_seconds")]
    pub nbf: DateTime<Utc>,

    /// The time the Presentation was signed, encoded as a UNIX timestamp.
    #[serde(with = "ts_seconds")]
    pub iat: DateTime<Utc>,

    /// The time the Presentation will expire, encoded as a UNIX timestamp.
    #[serde(with = "ts_seconds")]
    pub exp: DateTime<Utc>,

    /// The Verifiable Presentation.
    pub vp: VerifiablePresentation,
}

impl VpClaims {
    /// Create a Verifiable Presentation JWT payload, valid for `lifetime`
    /// from `issued_at`.
    #[must_use]
    pub fn from_vp(
        vp: VerifiablePresentation, audience: impl Into<String>, nonce: impl Into<String>,
        issued_at: DateTime<Utc>, lifetime: TimeDelta,
    ) -> Self {
        Self {
            iss: vp.holder.clone().unwrap_or_default(),
            jti: vp.id.clone().unwrap_or_default(),
            aud: audience.into(),
            nonce: nonce.into(),
            nbf: issued_at,
            iat: issued_at,
            exp: issued_at + lifetime,
            vp,
        }
    }
}

/// Decode the protected header of a compact JWS.
///
/// # Errors
///
/// Returns [`Error::MalformedCredential`] when `token` is not a compact JWS
/// or its header cannot be decoded.
pub fn decode_header(token: &str) -> Result<Header> {
    jsonwebtoken::decode_header(token.trim())
        .map_err(|e| Error::MalformedCredential(format!("issue decoding header: {e}")))
}

/// Decode the claims of a compact JWS without checking its signature or
/// time-based claims.
///
/// # Errors
///
/// Returns [`Error::MalformedCredential`] when `token` is not a compact JWS
/// or its payload cannot be decoded into `T`.
pub fn decode_payload<T: DeserializeOwned>(token: &str) -> Result<T> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.required_spec_claims.clear();
    validation.validate_exp = false;
    validation.validate_aud = false;

    jsonwebtoken::decode(token.trim(), &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .map_err(|e| Error::MalformedCredential(format!("issue decoding claims: {e}")))
}
