//! # Verifiable Presentations
//!
//! A presentation wraps one or more credentials for delivery to a verifier.
//! Credentials are carried either as JSON objects (embedded proofs) or as
//! compact JWT strings (enveloping proofs).

use credo_core::{Kind, OneMany};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::w3c::credential::{BASE_CONTEXT, W3cCredential};
use crate::w3c::proof::Proof;

/// The type every presentation's `type` contains.
pub const VERIFIABLE_PRESENTATION: &str = "VerifiablePresentation";

/// A Verifiable Presentation is used to combine and present credentials to a
/// Verifer.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct VerifiablePresentation {
    /// The @context property is used to map property URIs into short-form
    /// aliases. The first item is the base credentials context.
    #[serde(rename = "@context")]
    pub context: Vec<Kind<Value>>,

    /// MAY be used to provide a unique identifier for the presentation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// The type of presentation: `VerifiablePresentation` and, optionally,
    /// a more specific presentation type.
    #[serde(rename = "type")]
    pub type_: OneMany<String>,

    /// One or more Verifiable Credentials, as JSON documents or compact JWTs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verifiable_credential: Option<Vec<Kind<W3cCredential>>>,

    /// Holder is a URI for the entity that is generating the presentation.
    /// For example, did:example:ebfeb1f712ebc6f1c276e12ec21.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub holder: Option<String>,

    /// An embedded proof ensures that the presentation is verifiable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof: Option<OneMany<Proof>>,
}

impl VerifiablePresentation {
    /// Create a presentation of `credentials` held by `holder`.
    #[must_use]
    pub fn new(holder: impl Into<String>, credentials: Vec<Kind<W3cCredential>>) -> Self {
        Self {
            context: vec![Kind::String(BASE_CONTEXT.to_string())],
            id: Some(format!("urn:uuid:{}", uuid::Uuid::new_v4())),
            type_: OneMany::One(VERIFIABLE_PRESENTATION.to_string()),
            verifiable_credential: (!credentials.is_empty()).then_some(credentials),
            holder: Some(holder.into()),
            proof: None,
        }
    }

    /// The presented credentials.
    #[must_use]
    pub fn credentials(&self) -> &[Kind<W3cCredential>] {
        self.verifiable_credential.as_deref().unwrap_or_default()
    }

    /// Returns `true` when any presented credential is carried as a JWT.
    #[must_use]
    pub fn has_jwt_credentials(&self) -> bool {
        self.credentials().iter().any(|c| matches!(c, Kind::String(_)))
    }
}
