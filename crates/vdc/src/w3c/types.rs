//! # Credential Sub-Documents
//!
//! Typed views over the structured members of a credential. Each keeps any
//! properties it does not model in a flattened map so nothing is dropped.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::builder::Document;
use crate::{Error, Result};

/// Issuer identifies the issuer of the credential.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct Issuer {
    /// The issuer URI, typically a DID. Empty when an issuer object carries
    /// no `id`.
    #[serde(default)]
    pub id: String,

    /// Issuer-specific fields that may be used to express additional
    /// information about the issuer, e.g. `name`.
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

impl Issuer {
    /// Create an issuer with custom properties.
    #[must_use]
    pub fn new(id: impl Into<String>, properties: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            properties,
        }
    }

    /// Render the issuer as a JSON object, `id` first. An empty `id` is
    /// omitted.
    #[must_use]
    pub fn to_object(&self) -> Map<String, Value> {
        let mut map = Map::new();
        if !self.id.is_empty() {
            map.insert("id".to_string(), Value::String(self.id.clone()));
        }
        for (key, value) in &self.properties {
            if key != "id" {
                map.insert(key.clone(), value.clone());
            }
        }
        map
    }
}

impl Serialize for Issuer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_object().serialize(serializer)
    }
}

impl From<Issuer> for Value {
    fn from(issuer: Issuer) -> Self {
        Self::Object(issuer.to_object())
    }
}

/// `CredentialSubject` holds claims about the subject referenced by the
/// credential: an optional `id` (the subject's DID) plus any number of
/// custom properties, kept in their original order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CredentialSubject {
    properties: Map<String, Value>,
}

impl CredentialSubject {
    /// A URI that uniquely identifies the subject of the claims.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.properties.get("id").and_then(Value::as_str)
    }

    /// A single claim about the subject.
    #[must_use]
    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// All subject properties, including `id`.
    #[must_use]
    pub const fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }
}

impl Document for CredentialSubject {
    fn from_object(properties: Map<String, Value>) -> Result<Self> {
        if let Some(id) = properties.get("id") {
            if !id.is_string() {
                return Err(Error::SchemaViolation(
                    "`credentialSubject.id` must be a string".to_string(),
                ));
            }
        }
        Ok(Self { properties })
    }

    fn to_object(&self) -> Map<String, Value> {
        self.properties.clone()
    }
}

impl Serialize for CredentialSubject {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.properties.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CredentialSubject {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let properties = Map::deserialize(deserializer)?;
        Self::from_object(properties).map_err(serde::de::Error::custom)
    }
}

/// `CredentialSchema` identifies the schema the credential data conforms to.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct CredentialSchema {
    /// A URI identifying the schema file.
    pub id: String,

    /// The schema validator, e.g. "`FullJsonSchemaValidator2021`".
    #[serde(rename = "type")]
    pub type_: String,

    /// Any other schema properties.
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

impl CredentialSchema {
    /// Create a schema reference.
    #[must_use]
    pub fn new(id: impl Into<String>, type_: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            type_: type_.into(),
            properties: Map::new(),
        }
    }

    /// Render the schema reference as a JSON object.
    #[must_use]
    pub fn to_object(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("id".to_string(), Value::String(self.id.clone()));
        map.insert("type".to_string(), Value::String(self.type_.clone()));
        for (key, value) in &self.properties {
            if key != "id" && key != "type" {
                map.insert(key.clone(), value.clone());
            }
        }
        map
    }
}

impl Serialize for CredentialSchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_object().serialize(serializer)
    }
}

impl From<CredentialSchema> for Value {
    fn from(schema: CredentialSchema) -> Self {
        Self::Object(schema.to_object())
    }
}
