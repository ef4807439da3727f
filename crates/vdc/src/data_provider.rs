//! # Data Providers
//!
//! A data provider turns a credential template into the credential that will
//! be issued: it overlays holder-specific data and injects the identity
//! members the issuance is configured with.

use credo_core::json;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::instrument;

use crate::signatory::ProofConfig;
use crate::typed::TypedCredential;
use crate::w3c::{CredentialBuilder, W3cCredential};
use crate::Result;

/// Populates a credential template for issuance.
pub trait DataProvider: Send + Sync {
    /// Populate `template` for an issuance configured by `config`. The
    /// result is resolved to its concrete type by its declared `type`.
    ///
    /// # Errors
    ///
    /// Returns an error when the populated credential is invalid.
    fn populate(&self, template: W3cCredential, config: &ProofConfig) -> Result<TypedCredential>;
}

/// Deep-merges override data into the template.
///
/// At every object level, override members replace or are added to template
/// members, and template members the override does not mention are kept.
/// The credential `id`, `issuer`, `credentialSubject.id` and dates are then
/// taken from the [`ProofConfig`], except where the override sets them.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct MergingDataProvider {
    data: Map<String, Value>,
}

impl MergingDataProvider {
    /// Create a provider overlaying `data`.
    #[must_use]
    pub const fn new(data: Map<String, Value>) -> Self {
        Self { data }
    }

    /// Create a provider overlaying the JSON object in `text`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::MalformedInput`] when `text` is not a JSON
    /// object.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(Self::new(json::parse_object(text)?))
    }

    fn overrides(&self, name: &str) -> bool {
        self.data.contains_key(name)
    }

    fn overrides_subject_id(&self) -> bool {
        self.data.get("credentialSubject").and_then(|s| s.get("id")).is_some()
    }
}

impl DataProvider for MergingDataProvider {
    #[instrument(level = "debug", skip(self, template))]
    fn populate(&self, template: W3cCredential, config: &ProofConfig) -> Result<TypedCredential> {
        let mut properties = template.into_object();
        json::merge(&mut properties, &self.data);
        tracing::trace!("merged {} override members", self.data.len());

        let mut builder = CredentialBuilder::<W3cCredential>::from_object(properties);
        if !self.overrides("id") {
            let id = config
                .credential_id
                .clone()
                .unwrap_or_else(|| format!("urn:uuid:{}", uuid::Uuid::new_v4()));
            builder = builder.id(id);
        }
        if !self.overrides("issuer") {
            builder = builder.issuer_id(&config.issuer_did);
        }
        if let Some(subject_did) = config.subject_did.as_ref().filter(|_| !self.overrides_subject_id()) {
            builder = builder.subject_id(subject_did);
        }
        if let Some(date) = config.issue_date.filter(|_| !self.overrides("issuanceDate")) {
            builder = builder.issuance_date(date);
        }
        if let Some(date) = config.valid_date.filter(|_| !self.overrides("validFrom")) {
            builder = builder.valid_from(date);
        }
        if let Some(date) = config.expiration_date.filter(|_| !self.overrides("expirationDate")) {
            builder = builder.expiration_date(date);
        }

        Ok(TypedCredential::resolve(builder.build()?))
    }
}
