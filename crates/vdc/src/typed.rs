//! # Typed Credentials
//!
//! Concrete credential types with typed accessors over their subject claims.
//! A credential is mapped to a concrete type by its most specific (last)
//! declared `type`. Types without a concrete mapping stay generic
//! [`W3cCredential`]s and keep round-tripping untouched.

use std::ops::Deref;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::builder::Document;
use crate::w3c::W3cCredential;
use crate::{Error, Result};

macro_rules! typed_credential {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Serialize)]
        #[serde(transparent)]
        pub struct $name(W3cCredential);

        impl $name {
            /// The credential type this wrapper requires.
            pub const TYPE: &'static str = stringify!($name);

            /// The underlying credential.
            #[must_use]
            pub const fn credential(&self) -> &W3cCredential {
                &self.0
            }

            /// Consume the wrapper, returning the underlying credential.
            #[must_use]
            pub fn into_credential(self) -> W3cCredential {
                self.0
            }

            fn subject_str(&self, name: &str) -> Option<&str> {
                self.0.subject_claim(name).and_then(Value::as_str)
            }
        }

        impl Document for $name {
            fn from_object(properties: Map<String, Value>) -> Result<Self> {
                Self::try_from(W3cCredential::from_object(properties)?)
            }

            fn to_object(&self) -> Map<String, Value> {
                self.0.to_object()
            }
        }

        impl TryFrom<W3cCredential> for $name {
            type Error = Error;

            fn try_from(credential: W3cCredential) -> Result<Self> {
                if !credential.has_type(Self::TYPE) {
                    return Err(Error::SchemaViolation(format!(
                        "credential `type` does not contain `{}`",
                        Self::TYPE
                    )));
                }
                Ok(Self(credential))
            }
        }

        impl Deref for $name {
            type Target = W3cCredential;

            fn deref(&self) -> &W3cCredential {
                &self.0
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let credential = W3cCredential::deserialize(deserializer)?;
                Self::try_from(credential).map_err(serde::de::Error::custom)
            }
        }
    };
}

typed_credential!(
    /// A European natural-person identity credential.
    VerifiableId
);

typed_credential!(
    /// A higher-education diploma credential.
    VerifiableDiploma
);

impl VerifiableId {
    /// The subject's current first name(s).
    #[must_use]
    pub fn first_name(&self) -> Option<&str> {
        self.subject_str("firstName")
    }

    /// The subject's current family name(s).
    #[must_use]
    pub fn family_name(&self) -> Option<&str> {
        self.subject_str("familyName")
    }

    /// The subject's first and family names at birth.
    #[must_use]
    pub fn name_and_family_name_at_birth(&self) -> Option<&str> {
        self.subject_str("nameAndFamilyNameAtBirth")
    }

    /// The subject's unique national identifier.
    #[must_use]
    pub fn personal_identifier(&self) -> Option<&str> {
        self.subject_str("personalIdentifier")
    }

    /// The subject's date of birth.
    #[must_use]
    pub fn date_of_birth(&self) -> Option<&str> {
        self.subject_str("dateOfBirth")
    }

    /// The subject's place of birth.
    #[must_use]
    pub fn place_of_birth(&self) -> Option<&str> {
        self.subject_str("placeOfBirth")
    }

    /// The subject's gender.
    #[must_use]
    pub fn gender(&self) -> Option<&str> {
        self.subject_str("gender")
    }

    /// The subject's current address(es).
    #[must_use]
    pub fn current_address(&self) -> Vec<&str> {
        match self.0.subject_claim("currentAddress") {
            Some(Value::String(address)) => vec![address.as_str()],
            Some(Value::Array(addresses)) => addresses.iter().filter_map(Value::as_str).collect(),
            _ => vec![],
        }
    }
}

impl VerifiableDiploma {
    /// The diploma's identifier, as assigned by the awarding body.
    #[must_use]
    pub fn identifier(&self) -> Option<&str> {
        self.subject_str("identifier")
    }

    /// The preferred name of the body awarding the diploma.
    #[must_use]
    pub fn awarding_body_name(&self) -> Option<&str> {
        self.0
            .subject_claim("awardingOpportunity")?
            .pointer("/awardingBody/preferredName")
            .and_then(Value::as_str)
    }

    /// The title of the learning achievement.
    #[must_use]
    pub fn learning_achievement_title(&self) -> Option<&str> {
        self.0.subject_claim("learningAchievement")?.get("title").and_then(Value::as_str)
    }

    /// The title of the grading scheme.
    #[must_use]
    pub fn grading_scheme_title(&self) -> Option<&str> {
        self.0.subject_claim("gradingScheme")?.get("title").and_then(Value::as_str)
    }
}

/// A credential resolved to its concrete type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TypedCredential {
    /// A [`VerifiableId`].
    VerifiableId(VerifiableId),

    /// A [`VerifiableDiploma`].
    VerifiableDiploma(VerifiableDiploma),

    /// Any credential without a concrete mapping.
    Generic(W3cCredential),
}

impl TypedCredential {
    /// Resolve `credential` to a concrete type using its last declared type.
    /// Unknown types fall back to [`TypedCredential::Generic`].
    #[must_use]
    pub fn resolve(credential: W3cCredential) -> Self {
        let Some(type_) = credential.types().last().map(|t| (*t).to_string()) else {
            return Self::Generic(credential);
        };

        match type_.as_str() {
            VerifiableId::TYPE => Self::VerifiableId(VerifiableId(credential)),
            VerifiableDiploma::TYPE => Self::VerifiableDiploma(VerifiableDiploma(credential)),
            _ => {
                tracing::debug!("no concrete mapping for credential type `{type_}`, using generic");
                Self::Generic(credential)
            }
        }
    }

    /// The name of the resolved type, or `VerifiableCredential` for generic
    /// credentials.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::VerifiableId(_) => VerifiableId::TYPE,
            Self::VerifiableDiploma(_) => VerifiableDiploma::TYPE,
            Self::Generic(_) => crate::w3c::VERIFIABLE_CREDENTIAL,
        }
    }

    /// The underlying credential.
    #[must_use]
    pub const fn credential(&self) -> &W3cCredential {
        match self {
            Self::VerifiableId(vc) => vc.credential(),
            Self::VerifiableDiploma(vc) => vc.credential(),
            Self::Generic(vc) => vc,
        }
    }

    /// Consume the wrapper, returning the underlying credential.
    #[must_use]
    pub fn into_credential(self) -> W3cCredential {
        match self {
            Self::VerifiableId(vc) => vc.into_credential(),
            Self::VerifiableDiploma(vc) => vc.into_credential(),
            Self::Generic(vc) => vc,
        }
    }
}

impl From<W3cCredential> for TypedCredential {
    fn from(credential: W3cCredential) -> Self {
        Self::resolve(credential)
    }
}

impl<'de> Deserialize<'de> for TypedCredential {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        W3cCredential::deserialize(deserializer).map(Self::resolve)
    }
}
