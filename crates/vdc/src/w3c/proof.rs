//! Securing Credentials
//!
//! Verifiable Credentials can be secured using two different mechanisms:
//! enveloping proofs or embedded proofs. In the enveloping case the proof
//! wraps around the credential (a JWT whose claims carry the credential and
//! no `proof` member). Embedded proofs are included in the serialization,
//! alongside the credential itself, as the [`Proof`] object described here.
//!
//! Producing and checking proofs is the concern of the signing and
//! verification services; this module only models the embedded proof.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// An embedded (Linked Data) proof.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Proof {
    /// The specific proof type, e.g. "`Ed25519Signature2020`" or
    /// "`JsonWebSignature2020`".
    #[serde(rename = "type")]
    pub type_: String,

    /// The key used to create the proof, for legacy suites.
    pub creator: Option<String>,

    /// The date-time the proof was created, as written by the signer.
    pub created: Option<String>,

    /// The security domain in which the proof is meant to be used.
    pub domain: Option<String>,

    /// Used to mitigate replay attacks. SHOULD be included if a domain is
    /// specified.
    pub challenge: Option<String>,

    /// Supplied by the proof creator to decrease linkability.
    pub nonce: Option<String>,

    /// The reason for the proof, e.g. "`assertionMethod`".
    pub proof_purpose: Option<String>,

    /// The verification method used to create the proof, e.g.
    /// `did:example:123456789abcdefghi#keys-1`.
    pub verification_method: Option<String>,

    /// A detached JWS over the credential.
    pub jws: Option<String>,

    /// A multibase-encoded signature.
    pub proof_value: Option<String>,

    /// Suite-specific properties.
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

impl Proof {
    /// Create a proof of the given type.
    #[must_use]
    pub fn new(type_: impl Into<String>) -> Self {
        Self {
            type_: type_.into(),
            ..Self::default()
        }
    }

    /// Render the proof as a JSON object.
    #[must_use]
    pub fn to_object(&self) -> Map<String, Value> {
        const MODELLED: [&str; 10] = [
            "type",
            "creator",
            "created",
            "domain",
            "challenge",
            "nonce",
            "proofPurpose",
            "verificationMethod",
            "jws",
            "proofValue",
        ];

        let mut map = Map::new();
        map.insert("type".to_string(), Value::String(self.type_.clone()));
        let optional = [
            ("creator", &self.creator),
            ("created", &self.created),
            ("domain", &self.domain),
            ("challenge", &self.challenge),
            ("nonce", &self.nonce),
            ("proofPurpose", &self.proof_purpose),
            ("verificationMethod", &self.verification_method),
            ("jws", &self.jws),
            ("proofValue", &self.proof_value),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                map.insert(key.to_string(), Value::String(value.clone()));
            }
        }
        for (key, value) in &self.properties {
            if !MODELLED.contains(&key.as_str()) {
                map.insert(key.clone(), value.clone());
            }
        }
        map
    }
}

impl Serialize for Proof {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_object().serialize(serializer)
    }
}

impl From<Proof> for Value {
    fn from(proof: Proof) -> Self {
        Self::Object(proof.to_object())
    }
}
