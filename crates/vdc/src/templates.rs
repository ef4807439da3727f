//! # Credential Templates
//!
//! Built-in credential templates, shipped with the crate as JSON documents.
//! A template is a complete sample credential: issuance replaces its
//! identity members and a data provider overlays the holder's claims.

use crate::w3c::W3cCredential;
use crate::{Error, Result};

const TEMPLATES: [(&str, &str); 3] = [
    ("VerifiableAttestation", include_str!("../templates/VerifiableAttestation.json")),
    ("VerifiableDiploma", include_str!("../templates/VerifiableDiploma.json")),
    ("VerifiableId", include_str!("../templates/VerifiableId.json")),
];

/// The names of the built-in templates.
#[must_use]
pub fn list() -> Vec<&'static str> {
    TEMPLATES.iter().map(|(name, _)| *name).collect()
}

/// Load the template registered under `name`.
///
/// # Errors
///
/// Returns [`Error::TemplateNotFound`] when no template is registered under
/// `name`.
pub fn load(name: &str) -> Result<W3cCredential> {
    let Some((_, text)) = TEMPLATES.iter().find(|(n, _)| *n == name) else {
        return Err(Error::TemplateNotFound(name.to_string()));
    };
    tracing::trace!("loading template {name}");
    W3cCredential::from_json(text)
}
