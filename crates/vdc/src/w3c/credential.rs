//! # Verifiable Credentials Data Model
//!
//! [`W3cCredential`] is an immutable, validated view over the property bag
//! produced by [`crate::w3c::CredentialBuilder`]. Typed accessors read
//! through to the bag; every other member stays reachable through
//! [`W3cCredential::properties`], and serialization writes the bag back out
//! exactly as held.
//!
//! See <https://www.w3.org/TR/vc-data-model>.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use credo_core::{Kind, OneMany};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::builder::Document;
use crate::w3c::jose;
use crate::w3c::proof::Proof;
use crate::w3c::types::{CredentialSchema, CredentialSubject, Issuer};
use crate::{Error, Result};

/// The base context every credential's `@context` starts with.
pub const BASE_CONTEXT: &str = "https://www.w3.org/2018/credentials/v1";

/// The type every credential's `type` must contain.
pub const VERIFIABLE_CREDENTIAL: &str = "VerifiableCredential";

/// A W3C Verifiable Credential.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct W3cCredential {
    properties: Map<String, Value>,
}

impl W3cCredential {
    /// Parse a credential from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedCredential`] when `text` is not a JSON
    /// object, and [`Error::SchemaViolation`] when the credential `type` is
    /// missing or does not contain `VerifiableCredential`.
    ///
    /// Only `type` is checked. `@context` is carried through as given: it
    /// may be absent or omit [`BASE_CONTEXT`], and no JSON-LD processing is
    /// done.
    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| Error::MalformedCredential(e.to_string()))?;
        let Value::Object(properties) = value else {
            return Err(Error::MalformedCredential("credential is not a JSON object".to_string()));
        };
        Self::from_object(properties)
    }

    /// Parse a credential from either JSON text or a compact JWT carrying the
    /// credential in its `vc` claim.
    ///
    /// The JWT signature is not checked here.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedCredential`] when the text is neither form,
    /// and [`Error::SchemaViolation`] when the embedded credential is invalid.
    pub fn from_any(text: &str) -> Result<Self> {
        let text = text.trim();
        if text.starts_with('{') {
            return Self::from_json(text);
        }

        let claims: Map<String, Value> = jose::decode_payload(text)?;
        match claims.get("vc") {
            Some(Value::Object(vc)) => Self::from_object(vc.clone()),
            _ => Err(Error::MalformedCredential("JWT has no `vc` claim".to_string())),
        }
    }

    /// Render the credential as JSON text.
    #[must_use]
    pub fn to_json(&self) -> String {
        Value::Object(self.properties.clone()).to_string()
    }

    /// Render the credential as indented JSON text.
    #[must_use]
    pub fn to_json_pretty(&self) -> String {
        // a map of string keys always serializes
        serde_json::to_string_pretty(&self.properties).unwrap_or_else(|_| self.to_json())
    }

    /// The credential's properties, in document order.
    #[must_use]
    pub const fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }

    /// Consume the credential, returning its properties.
    #[must_use]
    pub fn into_object(self) -> Map<String, Value> {
        self.properties
    }

    /// A single property by name.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// The credential types, in declared order.
    #[must_use]
    pub fn types(&self) -> Vec<&str> {
        match self.properties.get("type") {
            Some(Value::String(t)) => vec![t.as_str()],
            Some(Value::Array(types)) => types.iter().filter_map(Value::as_str).collect(),
            _ => vec![],
        }
    }

    /// Returns `true` when `type_` is one of the credential's types.
    #[must_use]
    pub fn has_type(&self, type_: &str) -> bool {
        self.types().contains(&type_)
    }

    /// The `@context` entries: URIs or inline context objects.
    #[must_use]
    pub fn context(&self) -> Vec<Kind<Map<String, Value>>> {
        let entries = match self.properties.get("@context") {
            Some(Value::Array(entries)) => entries.as_slice(),
            Some(single) => std::slice::from_ref(single),
            None => &[],
        };
        entries
            .iter()
            .filter_map(|entry| match entry {
                Value::String(uri) => Some(Kind::String(uri.clone())),
                Value::Object(context) => Some(Kind::Object(context.clone())),
                _ => None,
            })
            .collect()
    }

    /// The credential `id`.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.properties.get("id").and_then(Value::as_str)
    }

    /// The issuer, either a bare identifier or an object with custom
    /// properties.
    #[must_use]
    pub fn issuer(&self) -> Option<Kind<Issuer>> {
        match self.properties.get("issuer")? {
            Value::String(id) => Some(Kind::String(id.clone())),
            value @ Value::Object(_) => {
                serde_json::from_value(value.clone()).ok().map(Kind::Object)
            }
            _ => None,
        }
    }

    /// The issuer's identifier, whichever form the issuer takes.
    #[must_use]
    pub fn issuer_id(&self) -> Option<&str> {
        match self.properties.get("issuer")? {
            Value::String(id) => Some(id),
            Value::Object(issuer) => issuer.get("id").and_then(Value::as_str),
            _ => None,
        }
    }

    /// The credential subject. Where several subjects are present, the first.
    #[must_use]
    pub fn credential_subject(&self) -> Option<CredentialSubject> {
        self.subject_object().and_then(|s| CredentialSubject::from_object(s.clone()).ok())
    }

    /// Every credential subject.
    #[must_use]
    pub fn credential_subjects(&self) -> Vec<CredentialSubject> {
        let subjects = match self.properties.get("credentialSubject") {
            Some(Value::Array(subjects)) => subjects.as_slice(),
            Some(single) => std::slice::from_ref(single),
            None => &[],
        };
        subjects
            .iter()
            .filter_map(|s| s.as_object())
            .filter_map(|s| CredentialSubject::from_object(s.clone()).ok())
            .collect()
    }

    /// The subject's identifier (`credentialSubject.id`).
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.subject_claim("id").and_then(Value::as_str)
    }

    /// A single claim from the (first) credential subject.
    #[must_use]
    pub fn subject_claim(&self, name: &str) -> Option<&Value> {
        self.subject_object()?.get(name)
    }

    /// The `issuanceDate`, as written.
    #[must_use]
    pub fn issued(&self) -> Option<&str> {
        self.properties.get("issuanceDate").and_then(Value::as_str)
    }

    /// The `validFrom` date, as written.
    #[must_use]
    pub fn valid_from(&self) -> Option<&str> {
        self.properties.get("validFrom").and_then(Value::as_str)
    }

    /// The `expirationDate`, as written.
    #[must_use]
    pub fn expiration_date(&self) -> Option<&str> {
        self.properties.get("expirationDate").and_then(Value::as_str)
    }

    /// The `issuanceDate` as an instant.
    #[must_use]
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        parse_date(self.issued()?)
    }

    /// The `expirationDate` as an instant.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        parse_date(self.expiration_date()?)
    }

    /// The credential schema reference.
    #[must_use]
    pub fn credential_schema(&self) -> Option<CredentialSchema> {
        let schema = match self.properties.get("credentialSchema")? {
            Value::Array(schemas) => schemas.first()?,
            single => single,
        };
        serde_json::from_value(schema.clone()).ok()
    }

    /// The embedded proof. Where several proofs are present, the first.
    #[must_use]
    pub fn proof(&self) -> Option<Proof> {
        let proof = match self.properties.get("proof")? {
            Value::Array(proofs) => proofs.first()?,
            single => single,
        };
        serde_json::from_value(proof.clone()).ok()
    }

    /// A copy of this credential without its `proof`: the document a signer
    /// signs over.
    #[must_use]
    pub fn without_proof(&self) -> Self {
        let mut properties = self.properties.clone();
        properties.shift_remove("proof");
        Self { properties }
    }

    /// Attach an embedded proof, replacing any existing one.
    #[must_use]
    pub fn with_proof(mut self, proof: Proof) -> Self {
        self.properties.insert("proof".to_string(), proof.into());
        self
    }

    fn subject_object(&self) -> Option<&Map<String, Value>> {
        match self.properties.get("credentialSubject")? {
            Value::Object(subject) => Some(subject),
            Value::Array(subjects) => subjects.first()?.as_object(),
            _ => None,
        }
    }
}

// Validation is limited to `type`; `@context` is not inspected.
impl Document for W3cCredential {
    fn from_object(properties: Map<String, Value>) -> Result<Self> {
        let types: OneMany<String> = match properties.get("type") {
            Some(value) => serde_json::from_value(value.clone()).map_err(|_| {
                Error::SchemaViolation("credential `type` must be a string or string array".into())
            })?,
            None => return Err(Error::SchemaViolation("credential `type` is missing".to_string())),
        };
        if !types.iter().any(|t| t == VERIFIABLE_CREDENTIAL) {
            return Err(Error::SchemaViolation(format!(
                "credential `type` does not contain `{VERIFIABLE_CREDENTIAL}`"
            )));
        }
        Ok(Self { properties })
    }

    fn to_object(&self) -> Map<String, Value> {
        self.properties.clone()
    }
}

impl FromStr for W3cCredential {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_json(s)
    }
}

impl Serialize for W3cCredential {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.properties.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for W3cCredential {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let properties = Map::deserialize(deserializer)?;
        Self::from_object(properties).map_err(serde::de::Error::custom)
    }
}

/// Format an instant the way credential dates are written: RFC 3339, UTC,
/// whole seconds, `Z` suffix. e.g. `2020-11-03T00:00:00Z`.
#[must_use]
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text).ok().map(|d| d.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn sample() -> Value {
        json!({
            "@context": [BASE_CONTEXT, {"firstName": "https://schema.org/givenName"}],
            "type": ["VerifiableCredential", "VerifiableAttestation"],
            "id": "urn:uuid:3732",
            "issuer": {"id": "did:example:issuer", "name": "Test Issuer"},
            "issuanceDate": "2020-11-03T00:00:00Z",
            "credentialSubject": {"id": "did:example:subject", "firstName": "Jane"},
            "credentialSchema": {"id": "https://schemas.example/v1", "type": "JsonSchema"},
            "evidence": [{"type": ["DocumentVerification"]}],
            "proof": {"type": "Ed25519Signature2018", "jws": "abc"}
        })
    }

    #[test]
    fn accessors() {
        let vc = W3cCredential::from_json(&sample().to_string()).expect("should parse");

        assert_eq!(vc.types(), ["VerifiableCredential", "VerifiableAttestation"]);
        assert!(vc.has_type("VerifiableAttestation"));
        assert_eq!(vc.context().len(), 2);
        assert_eq!(vc.context()[0], Kind::String(BASE_CONTEXT.to_string()));
        assert_eq!(vc.id(), Some("urn:uuid:3732"));
        assert_eq!(vc.issuer_id(), Some("did:example:issuer"));
        let Some(Kind::Object(issuer)) = vc.issuer() else {
            panic!("issuer should be an object");
        };
        assert_eq!(issuer.properties.get("name"), Some(&json!("Test Issuer")));
        assert_eq!(vc.subject(), Some("did:example:subject"));
        assert_eq!(vc.subject_claim("firstName"), Some(&json!("Jane")));
        assert_eq!(vc.issued(), Some("2020-11-03T00:00:00Z"));
        assert_eq!(vc.issued_at(), Some(Utc.with_ymd_and_hms(2020, 11, 3, 0, 0, 0).unwrap()));
        assert_eq!(vc.credential_schema().map(|s| s.type_), Some("JsonSchema".to_string()));
        assert_eq!(vc.proof().and_then(|p| p.jws), Some("abc".to_string()));
        assert_eq!(vc.property("evidence"), Some(&json!([{"type": ["DocumentVerification"]}])));
    }

    #[test]
    fn round_trip_is_lossless() {
        let vc = W3cCredential::from_json(&sample().to_string()).expect("should parse");
        let reparsed = W3cCredential::from_json(&vc.to_json()).expect("should reparse");
        assert_eq!(reparsed, vc);
        assert_eq!(Value::Object(reparsed.into_object()), sample());
    }

    #[test]
    fn serialization_keeps_order() {
        let text = r#"{"type":["VerifiableCredential"],"zeta":1,"alpha":2,"@context":[]}"#;
        let vc = W3cCredential::from_json(text).expect("should parse");
        assert_eq!(vc.to_json(), text);
    }

    #[test]
    fn malformed() {
        assert!(matches!(W3cCredential::from_json("[]"), Err(Error::MalformedCredential(_))));
        assert!(matches!(W3cCredential::from_json("{"), Err(Error::MalformedCredential(_))));
    }

    #[test]
    fn type_required() {
        assert!(matches!(
            W3cCredential::from_json(r#"{"issuer": "did:example:1"}"#),
            Err(Error::SchemaViolation(_))
        ));
        assert!(matches!(
            W3cCredential::from_json(r#"{"type": ["VerifiablePresentation"]}"#),
            Err(Error::SchemaViolation(_))
        ));
        assert!(matches!(
            W3cCredential::from_json(r#"{"type": 7}"#),
            Err(Error::SchemaViolation(_))
        ));
        assert!(W3cCredential::from_json(r#"{"type": "VerifiableCredential"}"#).is_ok());
    }

    #[test]
    fn proof_attach_and_strip() {
        let vc = W3cCredential::from_json(r#"{"type": ["VerifiableCredential"]}"#)
            .expect("should parse");
        let mut proof = Proof::new("Ed25519Signature2020");
        proof.proof_value = Some("z3FXQ".to_string());

        let signed = vc.clone().with_proof(proof);
        assert_eq!(signed.proof().and_then(|p| p.proof_value), Some("z3FXQ".to_string()));
        assert_eq!(signed.without_proof(), vc);
    }

    #[test]
    fn date_format() {
        let date = Utc.with_ymd_and_hms(2020, 11, 3, 0, 0, 0).unwrap();
        assert_eq!(format_date(&date), "2020-11-03T00:00:00Z");

        let with_nanos = date + chrono::Duration::milliseconds(250);
        assert_eq!(format_date(&with_nanos), "2020-11-03T00:00:00Z");
    }

    #[test]
    fn multiple_subjects() {
        let vc = W3cCredential::from_json(
            r#"{"type": ["VerifiableCredential"], "credentialSubject": [{"id": "did:a"}, {"id": "did:b"}]}"#,
        )
        .expect("should parse");
        assert_eq!(vc.subject(), Some("did:a"));
        assert_eq!(vc.credential_subjects().len(), 2);
    }

    #[test]
    fn issuer_object_without_id() {
        let vc = W3cCredential::from_json(
            r#"{"type": ["VerifiableCredential"], "issuer": {"name": "Test Issuer"}}"#,
        )
        .expect("should parse");

        let Some(Kind::Object(issuer)) = vc.issuer() else {
            panic!("issuer should be an object");
        };
        assert!(issuer.id.is_empty());
        assert_eq!(issuer.properties.get("name"), Some(&json!("Test Issuer")));
        assert_eq!(Value::from(issuer), json!({"name": "Test Issuer"}));
        assert_eq!(vc.issuer_id(), None);
    }

    #[test]
    fn context_not_validated() {
        let vc = W3cCredential::from_json(r#"{"type": ["VerifiableCredential"]}"#)
            .expect("should parse without @context");
        assert!(vc.context().is_empty());

        let vc = W3cCredential::from_json(
            r#"{"@context": ["https://example.com/other"], "type": ["VerifiableCredential"]}"#,
        )
        .expect("should parse with a foreign @context");
        assert_eq!(vc.context(), [Kind::String("https://example.com/other".to_string())]);
    }
}
