//! # DID URL
//!
//! A DID URL is the scheme `did:`, a method name, and a method-specific
//! identifier, optionally followed by a `#` fragment selecting a resource
//! (typically a verification method) within the resolved DID document.
//!
//! ```text
//! did:<method>:<identifier>[#<fragment>]
//! ```
//!
//! The method is restricted to lowercase ASCII letters. Path and query
//! components are not interpreted: a `?` or `/` is treated as part of the
//! identifier.

use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::json::{Map, Value};
use crate::{Error, Result};

/// Version byte prefixed to random entropy for `did:ebsi` legal entities.
pub const EBSI_V1: u8 = 0x01;

/// Version byte prefixed to a JWK thumbprint for `did:ebsi` natural persons.
pub const EBSI_V2: u8 = 0x02;

const EBSI_V1_ENTROPY_LEN: usize = 16;

/// Multibase prefix for base58btc.
const BASE58BTC: char = 'z';

/// DID methods with built-in identifier generation.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DidMethod {
    /// `did:key`
    Key,

    /// `did:web`
    Web,

    /// `did:ebsi`
    Ebsi,

    /// `did:jwk`
    Jwk,
}

impl DidMethod {
    /// The method name as it appears in a DID.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Key => "key",
            Self::Web => "web",
            Self::Ebsi => "ebsi",
            Self::Jwk => "jwk",
        }
    }
}

impl Display for DidMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DidMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "key" => Ok(Self::Key),
            "web" => Ok(Self::Web),
            "ebsi" => Ok(Self::Ebsi),
            "jwk" => Ok(Self::Jwk),
            _ => Err(Error::InvalidDidSyntax(format!("unsupported DID method: {s}"))),
        }
    }
}

/// A parsed DID URL.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DidUrl {
    method: String,
    identifier: String,
    fragment: Option<String>,
}

impl DidUrl {
    /// Parse a DID URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDidSyntax`] when `url` does not match
    /// `did:<method>:<identifier>[#<fragment>]`: the method must be one or
    /// more of `a-z`, the identifier must be non-empty, a fragment (when the
    /// `#` is present) must be non-empty, and no line terminators may appear.
    pub fn parse(url: &str) -> Result<Self> {
        tracing::trace!(url, "parsing DID URL");
        let invalid = || Error::InvalidDidSyntax(url.to_string());

        let rest = url.strip_prefix("did:").ok_or_else(invalid)?;
        let (method, rest) = rest.split_once(':').ok_or_else(invalid)?;
        if !is_method_name(method) || rest.contains(['\n', '\r']) {
            return Err(invalid());
        }

        let (identifier, fragment) = match rest.split_once('#') {
            Some((identifier, fragment)) => (identifier, Some(fragment)),
            None => (rest, None),
        };
        if identifier.is_empty() || fragment.is_some_and(str::is_empty) {
            return Err(invalid());
        }

        Ok(Self {
            method: method.to_string(),
            identifier: identifier.to_string(),
            fragment: fragment.map(ToString::to_string),
        })
    }

    /// Returns `true` when `url` is a syntactically valid DID URL. Agrees
    /// with [`DidUrl::parse`].
    #[must_use]
    pub fn is_did_url(url: &str) -> bool {
        Self::parse(url).is_ok()
    }

    /// Create a DID URL from its parts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDidSyntax`] when the parts do not form a valid
    /// DID URL.
    pub fn new(
        method: impl Into<String>, identifier: impl Into<String>, fragment: Option<String>,
    ) -> Result<Self> {
        let mut url = format!("did:{}:{}", method.into(), identifier.into());
        if let Some(fragment) = fragment {
            url.push('#');
            url.push_str(&fragment);
        }
        Self::parse(&url)
    }

    /// Generate a DID from a version byte and entropy.
    ///
    /// The identifier is the base58btc multibase encoding of `version`
    /// followed by `entropy`, so identical input always yields the same DID.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDidSyntax`] when `method` is not a valid method
    /// name.
    pub fn generate(method: &str, version: u8, entropy: &[u8]) -> Result<Self> {
        if !is_method_name(method) {
            return Err(Error::InvalidDidSyntax(format!("invalid DID method: {method}")));
        }

        Ok(Self {
            method: method.to_string(),
            identifier: encode_identifier(version, entropy),
            fragment: None,
        })
    }

    /// Generate a random `did:ebsi` legal entity identifier (version 1).
    #[must_use]
    pub fn generate_ebsi_v1() -> Self {
        let entropy: [u8; EBSI_V1_ENTROPY_LEN] = rand::random();
        Self::ebsi(EBSI_V1, &entropy)
    }

    /// Generate a `did:ebsi` natural person identifier (version 2) from the
    /// thumbprint of the subject's public key. See [`jwk_thumbprint`].
    #[must_use]
    pub fn generate_ebsi_v2(thumbprint: &[u8]) -> Self {
        Self::ebsi(EBSI_V2, thumbprint)
    }

    fn ebsi(version: u8, entropy: &[u8]) -> Self {
        Self {
            method: DidMethod::Ebsi.to_string(),
            identifier: encode_identifier(version, entropy),
            fragment: None,
        }
    }

    /// The DID method name, e.g. `key`.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The method-specific identifier.
    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// The fragment, without the leading `#`.
    #[must_use]
    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    /// The DID without any fragment: `did:<method>:<identifier>`.
    #[must_use]
    pub fn did(&self) -> String {
        format!("did:{}:{}", self.method, self.identifier)
    }

    /// The full DID URL, including the fragment when present.
    #[must_use]
    pub fn url(&self) -> String {
        self.fragment.as_ref().map_or_else(|| self.did(), |f| format!("{}#{f}", self.did()))
    }

    /// Returns a copy of this DID URL with `fragment` set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDidSyntax`] when `fragment` is empty or holds a
    /// line terminator.
    pub fn with_fragment(&self, fragment: impl Into<String>) -> Result<Self> {
        Self::new(self.method.clone(), self.identifier.clone(), Some(fragment.into()))
    }
}

// base58btc multibase over `version || entropy`
fn encode_identifier(version: u8, entropy: &[u8]) -> String {
    let mut bytes = Vec::with_capacity(entropy.len() + 1);
    bytes.push(version);
    bytes.extend_from_slice(entropy);
    format!("{BASE58BTC}{}", bs58::encode(bytes).into_string())
}

fn is_method_name(method: &str) -> bool {
    !method.is_empty() && method.bytes().all(|b| b.is_ascii_lowercase())
}

impl Display for DidUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url())
    }
}

impl FromStr for DidUrl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for DidUrl {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.url())
    }
}

impl<'de> Deserialize<'de> for DidUrl {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let url = String::deserialize(deserializer)?;
        Self::parse(&url).map_err(serde::de::Error::custom)
    }
}

/// Compute the [RFC7638](https://www.rfc-editor.org/rfc/rfc7638) SHA-256
/// thumbprint of a public JWK.
///
/// Only the members required for the key type take part, serialized in
/// lexicographic order with no whitespace.
///
/// # Errors
///
/// Returns [`Error::MalformedInput`] when `kty` is missing or unsupported, or
/// a required member is missing or not a string.
pub fn jwk_thumbprint(jwk: &Map<String, Value>) -> Result<[u8; 32]> {
    let kty = jwk
        .get("kty")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::MalformedInput("JWK is missing `kty`".to_string()))?;

    // lexicographic order
    let members: &[&str] = match kty {
        "EC" => &["crv", "kty", "x", "y"],
        "OKP" => &["crv", "kty", "x"],
        "RSA" => &["e", "kty", "n"],
        "oct" => &["k", "kty"],
        _ => return Err(Error::MalformedInput(format!("unsupported JWK key type: {kty}"))),
    };

    let mut required = Map::new();
    for &member in members {
        let Some(Value::String(value)) = jwk.get(member) else {
            return Err(Error::MalformedInput(format!("JWK is missing `{member}`")));
        };
        required.insert(member.to_string(), Value::String(value.clone()));
    }

    let canonical = serde_json::to_vec(&required)
        .map_err(|e| Error::MalformedInput(format!("issue serializing JWK: {e}")))?;
    Ok(Sha256::digest(canonical).into())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const DID_KEY: &str = "did:key:z6MkpTHR8VNsBxYAAWHut2Geadd9jSwuBV8xRoAnwWsdvktH";

    #[test]
    fn parse_did() {
        let url = DidUrl::parse(DID_KEY).expect("should parse");
        assert_eq!(url.method(), "key");
        assert_eq!(url.identifier(), "z6MkpTHR8VNsBxYAAWHut2Geadd9jSwuBV8xRoAnwWsdvktH");
        assert_eq!(url.fragment(), None);
        assert_eq!(url.did(), DID_KEY);
        assert_eq!(url.url(), DID_KEY);
    }

    #[test]
    fn parse_fragment() {
        let text = "did:web:example.com:issuer#key-1";
        let url = DidUrl::parse(text).expect("should parse");

        assert_eq!(url.method(), "web");
        assert_eq!(url.identifier(), "example.com:issuer");
        assert_eq!(url.fragment(), Some("key-1"));
        assert_eq!(url.did(), "did:web:example.com:issuer");
        assert_eq!(url.to_string(), text);
    }

    #[test]
    fn grammar() {
        for valid in [DID_KEY, "did:ebsi:zabc#keys-1", "did:example:123?service=x"] {
            assert!(DidUrl::is_did_url(valid), "{valid} should be valid");
            assert!(DidUrl::parse(valid).is_ok());
        }

        for invalid in [
            "not-a-did",
            "did:",
            "did:key",
            "did:key:",
            "did::abc",
            "did:Key:abc",
            "did:k3y:abc",
            "did:key:#frag",
            "did:key:abc#",
            "did:key:abc\ndef",
            "DID:key:abc",
        ] {
            assert!(!DidUrl::is_did_url(invalid), "{invalid:?} should be invalid");
            assert_eq!(
                DidUrl::parse(invalid),
                Err(Error::InvalidDidSyntax(invalid.to_string())),
                "{invalid:?} should fail to parse"
            );
        }
    }

    #[test]
    fn generate_is_deterministic() {
        let entropy = [7u8; 16];
        let a = DidUrl::generate("ebsi", EBSI_V1, &entropy).expect("should generate");
        let b = DidUrl::generate("ebsi", EBSI_V1, &entropy).expect("should generate");
        assert_eq!(a, b);

        let identifier = a.identifier();
        assert!(identifier.starts_with('z'));
        assert!(!identifier[1..].contains(['0', 'O', 'I', 'l']));

        let decoded = bs58::decode(&identifier[1..]).into_vec().expect("should decode");
        assert_eq!(decoded.len(), entropy.len() + 1);
        assert_eq!(decoded[0], EBSI_V1);
        assert_eq!(&decoded[1..], &entropy);

        assert!(DidUrl::is_did_url(&a.did()));
        assert!(DidUrl::generate("EBSI", EBSI_V1, &entropy).is_err());
    }

    #[test]
    fn generate_ebsi() {
        let v1 = DidUrl::generate_ebsi_v1();
        assert_eq!(v1.method(), "ebsi");
        let decoded = bs58::decode(&v1.identifier()[1..]).into_vec().expect("should decode");
        assert_eq!(decoded.len(), 17);
        assert_eq!(decoded[0], EBSI_V1);

        let thumbprint = [9u8; 32];
        let v2 = DidUrl::generate_ebsi_v2(&thumbprint);
        assert_eq!(v2, DidUrl::generate("ebsi", EBSI_V2, &thumbprint).expect("should generate"));
    }

    #[test]
    fn serde_as_string() {
        let url = DidUrl::parse("did:key:z6Mk#z6Mk").expect("should parse");
        let value = serde_json::to_value(&url).expect("should serialize");
        assert_eq!(value, json!("did:key:z6Mk#z6Mk"));

        let back: DidUrl = serde_json::from_value(value).expect("should deserialize");
        assert_eq!(back, url);
        assert!(serde_json::from_value::<DidUrl>(json!("not-a-did")).is_err());
    }

    #[test]
    fn with_fragment() {
        let url = DidUrl::parse(DID_KEY).expect("should parse");
        let vm = url.with_fragment("keys-1").expect("should set fragment");
        assert_eq!(vm.url(), format!("{DID_KEY}#keys-1"));
        assert!(url.with_fragment("").is_err());
    }

    // RFC 7638, section 3.1
    #[test]
    fn rsa_thumbprint() {
        let Value::Object(jwk) = json!({
            "kty": "RSA",
            "n": "0vx7agoebGcQSuuPiLJXZptN9nndrQmbXEps2aiAFbWhM78LhWx4cbbfAAtVT86zwu1RK7aPFFxuhDR1L6tSoc_BJECPebWKRXjBZCiFV4n3oknjhMstn64tZ_2W-5JsGY4Hc5n9yBXArwl93lqt7_RN5w6Cf0h4QyQ5v-65YGjQR0_FDW2QvzqY368QQMicAtaSqzs8KJZgnYb9c7d0zgdAZHzu6qMQvRL5hajrn1n91CbOpbISD08qNLyrdkt-bFTWhAI4vMQFh6WeZu0fM4lFd2NcRwr3XPksINHaQ-G_xBniIqbw0Ls1jF44-csFCur-kEgU8awapJzKnqDKgw",
            "e": "AQAB",
            "alg": "RS256",
            "kid": "2011-04-29"
        }) else {
            panic!("should be an object");
        };

        let thumbprint = jwk_thumbprint(&jwk).expect("should compute thumbprint");
        let expected = [
            55, 54, 203, 177, 120, 124, 184, 48, 156, 119, 238, 140, 55, 5, 197, 225, 111, 251,
            158, 133, 151, 21, 144, 31, 30, 76, 89, 177, 17, 130, 245, 123,
        ];
        assert_eq!(thumbprint, expected);
    }

    #[test]
    fn thumbprint_requires_members() {
        let Value::Object(jwk) = json!({"kty": "OKP", "crv": "Ed25519"}) else {
            panic!("should be an object");
        };
        assert!(matches!(jwk_thumbprint(&jwk), Err(Error::MalformedInput(_))));
    }
}
