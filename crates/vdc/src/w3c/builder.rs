//! # Credential Builder
//!
//! [`CredentialBuilder`] layers typed setters for the W3C credential members
//! over a [`BasicBuilder`] and owns a nested [`SubjectBuilder`] for
//! `credentialSubject`. The subject is folded into the credential only when
//! [`CredentialBuilder::build`] is called.
//!
//! ```rust
//! use credo_vdc::w3c::{CredentialBuilder, W3cCredential};
//!
//! let vc: W3cCredential = CredentialBuilder::with_types(["VerifiableAttestation"])
//!     .issuer_id("did:example:issuer")
//!     .subject(|s| s.id("did:example:holder").property("firstName", "Jane"))
//!     .build()
//!     .expect("should build");
//!
//! assert_eq!(vc.subject(), Some("did:example:holder"));
//! ```

use std::fmt::{self, Debug};

use chrono::{DateTime, Utc};
use credo_core::json;
use serde_json::{Map, Value};

use crate::builder::{BasicBuilder, Document};
use crate::w3c::credential::{BASE_CONTEXT, VERIFIABLE_CREDENTIAL, W3cCredential, format_date};
use crate::w3c::proof::Proof;
use crate::w3c::types::{CredentialSchema, CredentialSubject, Issuer};
use crate::{Error, Result};

const CREDENTIAL_SUBJECT: &str = "credentialSubject";

/// Builds the `credentialSubject` of a credential.
pub type SubjectBuilder = BasicBuilder<CredentialSubject>;

impl BasicBuilder<CredentialSubject> {
    /// Set the subject's identifier, typically the holder's DID.
    #[must_use]
    pub fn id(self, id: impl Into<String>) -> Self {
        self.property("id", id.into())
    }
}

/// Builds a [`W3cCredential`] (or any document type wrapping one).
pub struct CredentialBuilder<C = W3cCredential> {
    bag: BasicBuilder<C>,
    subject: SubjectBuilder,
}

impl<C> Clone for CredentialBuilder<C> {
    fn clone(&self) -> Self {
        Self {
            bag: self.bag.clone(),
            subject: self.subject.clone(),
        }
    }
}

impl<C> Debug for CredentialBuilder<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialBuilder")
            .field("properties", self.bag.properties())
            .field("subject", self.subject.properties())
            .finish()
    }
}

impl<C> Default for CredentialBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> CredentialBuilder<C> {
    /// Create a builder for a plain `VerifiableCredential`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_types(Vec::<String>::new())
    }

    /// Create a builder for a credential of the given types.
    /// `VerifiableCredential` is always the first type.
    #[must_use]
    pub fn with_types<I, T>(types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut all = vec![VERIFIABLE_CREDENTIAL.to_string()];
        for t in types {
            let t = t.into();
            if !all.contains(&t) {
                all.push(t);
            }
        }

        let bag = BasicBuilder::new()
            .property("@context", vec![BASE_CONTEXT])
            .property("type", all);
        Self {
            bag,
            subject: SubjectBuilder::new(),
        }
    }

    /// Create a builder seeded from a JSON object. The default `@context`
    /// and `type` are only added when `object` lacks them, so a complete
    /// credential keeps its member order.
    #[must_use]
    pub fn from_object(object: Map<String, Value>) -> Self {
        let seed = if object.contains_key("@context") && object.contains_key("type") {
            Self {
                bag: BasicBuilder::new(),
                subject: SubjectBuilder::new(),
            }
        } else {
            Self::new()
        };
        seed.set_from_object(object)
    }

    /// Append an entry (a URI or an inline context object) to `@context`.
    #[must_use]
    pub fn add_context(mut self, context: impl Into<Value>) -> Self {
        let context = context.into();
        match self.bag.get_mut("@context") {
            Some(Value::Array(contexts)) => contexts.push(context),
            Some(single) => {
                let first = single.take();
                *single = Value::Array(vec![first, context]);
            }
            None => self.bag.insert("@context", vec![Value::from(BASE_CONTEXT), context]),
        }
        self
    }

    /// Set the credential `id`.
    #[must_use]
    pub fn id(self, id: impl Into<String>) -> Self {
        self.property("id", id.into())
    }

    /// Set a structured issuer, replacing any existing issuer.
    #[must_use]
    pub fn issuer(self, issuer: Issuer) -> Self {
        self.property("issuer", issuer)
    }

    /// Set the issuer's identifier.
    ///
    /// A structured issuer keeps its other properties and only has its `id`
    /// replaced. Otherwise the issuer becomes the bare identifier.
    #[must_use]
    pub fn issuer_id(mut self, id: impl Into<String>) -> Self {
        let id = id.into();
        if let Some(Value::Object(issuer)) = self.bag.get_mut("issuer") {
            issuer.insert("id".to_string(), Value::String(id));
            return self;
        }
        self.property("issuer", id)
    }

    /// Set the `issuanceDate`.
    #[must_use]
    pub fn issuance_date(self, date: DateTime<Utc>) -> Self {
        self.property("issuanceDate", format_date(&date))
    }

    /// Set the `validFrom` date.
    #[must_use]
    pub fn valid_from(self, date: DateTime<Utc>) -> Self {
        self.property("validFrom", format_date(&date))
    }

    /// Set the `expirationDate`.
    #[must_use]
    pub fn expiration_date(self, date: DateTime<Utc>) -> Self {
        self.property("expirationDate", format_date(&date))
    }

    /// Set the `credentialSchema`.
    #[must_use]
    pub fn credential_schema(self, schema: CredentialSchema) -> Self {
        self.property("credentialSchema", schema)
    }

    /// Set the subject's identifier.
    #[must_use]
    pub fn subject_id(self, id: impl Into<String>) -> Self {
        self.subject(|s| s.id(id))
    }

    /// Mutate the nested subject builder.
    #[must_use]
    pub fn subject(mut self, f: impl FnOnce(SubjectBuilder) -> SubjectBuilder) -> Self {
        let subject = std::mem::take(&mut self.subject);
        self.subject = f(subject);
        self
    }

    /// Attach an embedded proof.
    #[must_use]
    pub fn proof(self, proof: Proof) -> Self {
        self.property("proof", proof)
    }

    /// Set `name` to `value`, replacing any previous value. Setting
    /// `credentialSubject` to an object merges into the subject builder.
    #[must_use]
    pub fn property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let name = name.into();
        if name == CREDENTIAL_SUBJECT {
            let mut object = Map::new();
            object.insert(name, value.into());
            return self.set_from_object(object);
        }
        self.bag.insert(name, value);
        self
    }

    /// Overlay every member of `object` onto the builder.
    ///
    /// Members are overwritten key by key, except `credentialSubject`: an
    /// object is merged into the subject builder, while any other shape
    /// replaces the subject outright.
    #[must_use]
    pub fn set_from_object(mut self, mut object: Map<String, Value>) -> Self {
        match object.get_mut(CREDENTIAL_SUBJECT) {
            Some(Value::Object(subject)) => {
                // the empty object left behind holds the member's position
                let subject = std::mem::take(subject);
                self.subject = self.subject.set_from_object(subject);
            }
            Some(_) => self.subject = SubjectBuilder::new(),
            None => {}
        }
        self.bag = self.bag.set_from_object(object);
        self
    }

    /// Parse `text` as a JSON object and overlay it onto the builder.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedInput`] when `text` is not a JSON object.
    pub fn set_from_json(self, text: &str) -> Result<Self> {
        let object = json::parse_object(text)?;
        Ok(self.set_from_object(object))
    }

    /// The current value of a credential member. `credentialSubject` reflects
    /// the subject builder.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Value> {
        if name == CREDENTIAL_SUBJECT {
            return self.folded_subject();
        }
        self.bag.get(name).cloned()
    }

    /// The subject builder's properties.
    #[must_use]
    pub const fn subject_properties(&self) -> &Map<String, Value> {
        self.subject.properties()
    }

    /// Remove a credential member.
    #[must_use]
    pub fn remove(mut self, name: &str) -> Self {
        if name == CREDENTIAL_SUBJECT {
            self.subject = SubjectBuilder::new();
        }
        self.bag.remove(name);
        self
    }

    /// Render the credential under construction, subject folded in, without
    /// validating it.
    #[must_use]
    pub fn to_object(&self) -> Map<String, Value> {
        let mut properties = self.bag.properties().clone();
        if let Some(subject) = self.folded_subject() {
            properties.insert(CREDENTIAL_SUBJECT.to_string(), subject);
        }
        properties
    }

    // `credentialSubject` with the subject builder folded in. Each subject of
    // a multi-subject credential takes the builder's properties.
    fn folded_subject(&self) -> Option<Value> {
        let current = self.bag.get(CREDENTIAL_SUBJECT);
        if self.subject.is_empty() {
            return current.cloned();
        }
        if let Some(Value::Array(subjects)) = current {
            let mut subjects = subjects.clone();
            for subject in subjects.iter_mut().filter_map(Value::as_object_mut) {
                for (key, value) in self.subject.properties() {
                    subject.insert(key.clone(), value.clone());
                }
            }
            return Some(Value::Array(subjects));
        }
        Some(Value::Object(self.subject.properties().clone()))
    }
}

impl<C: Document> CredentialBuilder<C> {
    /// Seed a builder with every member of an existing credential.
    #[must_use]
    pub fn from_partial(credential: &C) -> Self {
        Self::from_object(credential.to_object())
    }

    /// Seed a builder from credential JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedCredential`] or [`Error::SchemaViolation`]
    /// when `text` is not a valid credential.
    pub fn from_partial_json(text: &str) -> Result<Self> {
        let credential = W3cCredential::from_json(text)?;
        Ok(Self::from_object(credential.into_object()))
    }

    /// Build the credential. The subject builder is validated and folded into
    /// `credentialSubject`. When `credentialSubject` holds several subjects,
    /// the builder's properties are applied to each of them.
    ///
    /// The builder is left untouched: calling `build` again without
    /// intervening mutation yields an equal credential.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SchemaViolation`] when the subject or the credential
    /// is missing a required member or has one of the wrong shape.
    pub fn build(&self) -> Result<C> {
        let mut bag = self.bag.clone();
        if !self.subject.is_empty() {
            let subject = if matches!(bag.get(CREDENTIAL_SUBJECT), Some(Value::Array(_))) {
                self.folded_subject().unwrap_or_default()
            } else {
                Value::Object(self.subject.build()?.to_object())
            };
            bag.insert(CREDENTIAL_SUBJECT, subject);
        }
        let built = bag.build();
        if let Err(Error::SchemaViolation(e)) = &built {
            tracing::debug!("credential rejected at build: {e}");
        }
        built
    }
}
