//! # Signatory
//!
//! Issuance orchestration. The [`Signatory`] completes a credential's identity
//! members (issuer, subject, id, dates), builds it, and hands it to a
//! [`Signer`] to be secured as an embedded proof or a JWT.
//!
//! Signing, verification, and DID resolution are collaborators supplied by
//! the caller through the traits in this module.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::data_provider::DataProvider;
use crate::error::stack;
use crate::templates;
use crate::w3c::{CredentialBuilder, Issuer, W3cCredential};
use crate::{Error, Result};

/// How the credential is secured.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProofType {
    /// An embedded Linked Data proof.
    #[default]
    LdProof,

    /// An enveloping JWT whose claims carry the credential.
    Jwt,
}

/// Options controlling how a credential is completed and signed.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProofConfig {
    /// The issuer's DID.
    pub issuer_did: String,

    /// The subject's (holder's) DID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_did: Option<String>,

    /// The verification method to sign with. Resolved from the issuer's DID
    /// when not set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer_verification_method: Option<String>,

    /// How the credential is secured.
    #[serde(default)]
    pub proof_type: ProofType,

    /// The proof purpose, e.g. `assertionMethod`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_purpose: Option<String>,

    /// The credential `id`. A `urn:uuid:` identifier is generated when not
    /// set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_id: Option<String>,

    /// The `issuanceDate`. Defaults to the time of issuance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_date: Option<DateTime<Utc>>,

    /// The `validFrom` date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_date: Option<DateTime<Utc>>,

    /// The `expirationDate`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<DateTime<Utc>>,

    /// The security domain the proof is bound to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    /// A challenge to bind the proof to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
}

impl ProofConfig {
    /// Create a config for credentials issued by, and about, the given DIDs.
    #[must_use]
    pub fn new(issuer_did: impl Into<String>, subject_did: impl Into<String>) -> Self {
        Self {
            issuer_did: issuer_did.into(),
            subject_did: Some(subject_did.into()),
            ..Self::default()
        }
    }

    /// Secure credentials with the given proof type.
    #[must_use]
    pub const fn proof_type(mut self, proof_type: ProofType) -> Self {
        self.proof_type = proof_type;
        self
    }

    /// Use `date` as the `issuanceDate`.
    #[must_use]
    pub const fn issue_date(mut self, date: DateTime<Utc>) -> Self {
        self.issue_date = Some(date);
        self
    }

    /// Sign with the given verification method.
    #[must_use]
    pub fn verification_method(mut self, method: impl Into<String>) -> Self {
        self.issuer_verification_method = Some(method.into());
        self
    }
}

/// Secures a built credential.
pub trait Signer: Send + Sync {
    /// Sign `credential` as directed by `config`.
    ///
    /// For [`ProofType::LdProof`] the result is the credential JSON with an
    /// embedded `proof`. For [`ProofType::Jwt`] it is a compact JWT whose
    /// claims carry the credential under `vc`.
    ///
    /// # Errors
    ///
    /// Returns an error when signing fails.
    fn sign(&self, credential: &W3cCredential, config: &ProofConfig) -> anyhow::Result<String>;
}

/// Checks a secured credential.
pub trait Verifier: Send + Sync {
    /// Verify credential text (JSON with an embedded proof, or a compact JWT).
    ///
    /// # Errors
    ///
    /// Returns an error when the credential cannot be checked at all, as
    /// opposed to failing verification.
    fn verify(&self, credential: &str) -> anyhow::Result<bool>;
}

/// Resolves DIDs to the verification methods in their DID documents.
pub trait DidResolver: Send + Sync {
    /// The identifier of the verification method `did` signs with.
    ///
    /// # Errors
    ///
    /// Returns an error when the DID cannot be resolved.
    fn verification_method(&self, did: &str) -> anyhow::Result<String>;
}

/// Issues credentials using the provided signing and resolution
/// collaborators.
#[derive(Debug)]
pub struct Signatory<'a, S, R> {
    signer: &'a S,
    resolver: &'a R,
}

impl<'a, S: Signer, R: DidResolver> Signatory<'a, S, R> {
    /// Create a signatory.
    pub const fn new(signer: &'a S, resolver: &'a R) -> Self {
        Self { signer, resolver }
    }

    /// Complete, build and sign the credential held by `builder`.
    ///
    /// A structured `issuer` replaces any issuer already set; its `id` is then
    /// set to the configured issuer DID, keeping the other properties. The
    /// subject id, dates and credential id are taken from `config`, with the
    /// issuance date defaulting to now and the id to a fresh `urn:uuid:`
    /// unless the builder already holds one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Resolution`] when the issuer's verification method
    /// cannot be resolved, the builder's error when the credential is
    /// invalid, and [`Error::Signing`] when signing fails.
    #[instrument(level = "debug", skip(self, builder, issuer))]
    pub fn issue(
        &self, builder: CredentialBuilder, config: &ProofConfig, issuer: Option<Issuer>,
    ) -> Result<String> {
        let config = self.complete(config)?;

        let mut builder = match issuer {
            Some(issuer) => builder.issuer(issuer),
            None => builder,
        };
        builder = builder.issuer_id(&config.issuer_did);
        if let Some(subject_did) = &config.subject_did {
            builder = builder.subject_id(subject_did);
        }
        builder = builder.issuance_date(config.issue_date.unwrap_or_else(Utc::now));
        if let Some(valid_date) = config.valid_date {
            builder = builder.valid_from(valid_date);
        }
        if let Some(expiration_date) = config.expiration_date {
            builder = builder.expiration_date(expiration_date);
        }
        if let Some(id) = &config.credential_id {
            builder = builder.id(id);
        } else if builder.get("id").is_none() {
            builder = builder.id(format!("urn:uuid:{}", uuid::Uuid::new_v4()));
        }

        let credential = builder.build()?;
        tracing::debug!("signing credential {}", credential.id().unwrap_or_default());

        self.signer.sign(&credential, &config).map_err(|e| Error::Signing(stack(&e)))
    }

    /// Load the named template, populate it with `provider`, and issue it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TemplateNotFound`] when no such template exists, and
    /// otherwise the errors of [`DataProvider::populate`] and
    /// [`Signatory::issue`].
    #[instrument(level = "debug", skip(self, provider))]
    pub fn issue_template(
        &self, template: &str, config: &ProofConfig, provider: &impl DataProvider,
    ) -> Result<String> {
        let template = templates::load(template)?;
        let populated = provider.populate(template, config)?;
        tracing::debug!("populated {} template", populated.type_name());

        let builder = CredentialBuilder::from_partial(populated.credential());
        self.issue(builder, config, None)
    }

    // Fill in the verification method when not configured.
    fn complete(&self, config: &ProofConfig) -> Result<ProofConfig> {
        let mut config = config.clone();
        if config.issuer_verification_method.is_none() {
            let method = self
                .resolver
                .verification_method(&config.issuer_did)
                .map_err(|e| Error::Resolution(stack(&e)))?;
            config.issuer_verification_method = Some(method);
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use anyhow::anyhow;
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;
    use crate::data_provider::MergingDataProvider;

    const DID: &str = "did:key:z6MkjchhfUsD6mmvni8mCdXHw216Xrm9bQe2mBH1P5RDjVJG";

    // Records what it was asked to sign and returns the credential JSON.
    #[derive(Default)]
    struct Recorder {
        config: Mutex<Option<ProofConfig>>,
    }

    impl Signer for Recorder {
        fn sign(&self, credential: &W3cCredential, config: &ProofConfig) -> anyhow::Result<String> {
            *self.config.lock().map_err(|_| anyhow!("poisoned"))? = Some(config.clone());
            Ok(credential.to_json())
        }
    }

    struct Resolver;

    impl DidResolver for Resolver {
        fn verification_method(&self, did: &str) -> anyhow::Result<String> {
            if !did.starts_with("did:key:") {
                return Err(anyhow!("unsupported method"));
            }
            let key = did.trim_start_matches("did:key:");
            Ok(format!("{did}#{key}"))
        }
    }

    struct Failing;

    impl Signer for Failing {
        fn sign(&self, _: &W3cCredential, _: &ProofConfig) -> anyhow::Result<String> {
            Err(anyhow!("key not found"))
        }
    }

    #[test]
    fn issue_completes_credential() {
        let signer = Recorder::default();
        let signatory = Signatory::new(&signer, &Resolver);
        let config =
            ProofConfig::new(DID, DID).issue_date(Utc.with_ymd_and_hms(2020, 11, 3, 0, 0, 0).unwrap());

        let builder = CredentialBuilder::new()
            .subject(|s| s.property("firstName", "Inco").property("familyName", "GNITO"));
        let issued = signatory.issue(builder, &config, None).expect("should issue");

        let vc = W3cCredential::from_json(&issued).expect("should parse");
        assert_eq!(vc.issuer_id(), Some(DID));
        assert_eq!(vc.subject(), Some(DID));
        assert_eq!(vc.issued(), Some("2020-11-03T00:00:00Z"));
        assert!(vc.id().is_some_and(|id| id.starts_with("urn:uuid:")));
        assert_eq!(vc.subject_claim("firstName"), Some(&json!("Inco")));

        let used = signer.config.lock().expect("lock").clone().expect("should sign");
        assert_eq!(used.issuer_verification_method, Some(format!("{DID}#{}", &DID[8..])));
    }

    #[test]
    fn structured_issuer_retained() {
        let signer = Recorder::default();
        let signatory = Signatory::new(&signer, &Resolver);
        let mut properties = serde_json::Map::new();
        properties.insert("name".to_string(), json!("Test Issuer"));

        let issued = signatory
            .issue(
                CredentialBuilder::new(),
                &ProofConfig::new(DID, DID),
                Some(Issuer::new("did:example:other", properties)),
            )
            .expect("should issue");

        let vc = W3cCredential::from_json(&issued).expect("should parse");
        assert_eq!(vc.property("issuer"), Some(&json!({"id": DID, "name": "Test Issuer"})));
    }

    #[test]
    fn configured_id_and_method() {
        let signer = Recorder::default();
        let signatory = Signatory::new(&signer, &Resolver);
        let config = ProofConfig {
            credential_id: Some("urn:uuid:fixed".to_string()),
            ..ProofConfig::new("did:web:issuer.example", DID).verification_method("did:web:issuer.example#key-0")
        };

        let issued = signatory.issue(CredentialBuilder::new(), &config, None).expect("should issue");
        let vc = W3cCredential::from_json(&issued).expect("should parse");
        assert_eq!(vc.id(), Some("urn:uuid:fixed"));
    }

    #[test]
    fn collaborator_failures() {
        let signatory = Signatory::new(&Failing, &Resolver);
        let result = signatory.issue(CredentialBuilder::new(), &ProofConfig::new(DID, DID), None);
        assert_eq!(result, Err(Error::Signing("key not found".to_string())));

        let signer = Recorder::default();
        let signatory = Signatory::new(&signer, &Resolver);
        let result =
            signatory.issue(CredentialBuilder::new(), &ProofConfig::new("did:web:unknown", DID), None);
        assert!(matches!(result, Err(Error::Resolution(_))));
    }

    #[test]
    fn issue_from_template() {
        let signer = Recorder::default();
        let signatory = Signatory::new(&signer, &Resolver);
        let config =
            ProofConfig::new(DID, DID).issue_date(Utc.with_ymd_and_hms(2020, 11, 3, 0, 0, 0).unwrap());
        let provider = MergingDataProvider::default();

        let issued =
            signatory.issue_template("VerifiableId", &config, &provider).expect("should issue");
        assert!(issued.contains("VerifiableId"));
        assert!(issued.contains("0904008084H"));
        assert!(issued.contains("Jane DOE"));

        let vc = W3cCredential::from_json(&issued).expect("should parse");
        assert_eq!(vc.issued(), Some("2020-11-03T00:00:00Z"));
        assert_eq!(vc.subject(), Some(DID));

        let result = signatory.issue_template("Unknown", &config, &provider);
        assert!(matches!(result, Err(Error::TemplateNotFound(_))));
    }

    #[test]
    fn config_serde() {
        let config: ProofConfig = serde_json::from_value(json!({
            "issuerDid": DID,
            "proofType": "JWT",
            "issueDate": "2020-11-03T00:00:00Z"
        }))
        .expect("should deserialize");
        assert_eq!(config.proof_type, ProofType::Jwt);
        assert_eq!(config.issue_date, Some(Utc.with_ymd_and_hms(2020, 11, 3, 0, 0, 0).unwrap()));
        assert_eq!(
            serde_json::to_value(ProofType::LdProof).expect("should serialize"),
            json!("LD_PROOF")
        );
    }
}
