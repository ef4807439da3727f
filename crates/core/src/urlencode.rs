//! # Url Encoder/Decoder
//!
//! Encodes and decodes `application/x-www-form-urlencoded` query strings and
//! form bodies. Top-level members are written as plain strings; nested
//! objects and arrays are written as url-encoded JSON.

use anyhow::{Result, anyhow};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC.remove(b'.').remove(b'_').remove(b'-').remove(b'~');

/// Create an `application/x-www-form-urlencoded` representation of the
/// provided value. Members that serialize to `null` are omitted.
///
/// # Errors
///
/// Will return an error if the value cannot be serialized to a JSON object.
pub fn encode<T: Serialize>(value: &T) -> Result<String> {
    let encoded = to_pairs(value)?
        .into_iter()
        .map(|(k, v)| format!("{k}={}", utf8_percent_encode(&v, UNRESERVED)))
        .collect::<Vec<String>>();
    Ok(encoded.join("&"))
}

/// Flatten a value into `(name, value)` pairs, suitable for handing to an
/// HTTP client's form encoder. Values are not percent-encoded.
///
/// # Errors
///
/// Will return an error if the value cannot be serialized to a JSON object.
pub fn to_pairs<T: Serialize>(value: &T) -> Result<Vec<(String, String)>> {
    let Value::Object(map) = serde_json::to_value(value)? else {
        return Err(anyhow!("only objects can be url-encoded"));
    };

    let pairs = map
        .into_iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| match v {
            Value::String(s) => (k, s),
            other => (k, other.to_string()),
        })
        .collect();
    Ok(pairs)
}

/// Deserializes a url-encoded string to a value.
///
/// Members whose decoded value starts with `[` or `{` are parsed as JSON.
/// `+` is decoded as a space.
///
/// # Errors
///
/// Will return an error if a member holds malformed JSON, or the decoded
/// members cannot be deserialized to the requested type.
pub fn decode<T: DeserializeOwned>(s: &str) -> Result<T> {
    let mut map = Map::new();

    for part in s.split('&').filter(|p| !p.is_empty()) {
        let (key, encoded) = part.split_once('=').unwrap_or((part, ""));
        let key = percent_decode_str(key).decode_utf8_lossy();
        let plus_decoded = encoded.replace('+', " ");
        let decoded = percent_decode_str(&plus_decoded).decode_utf8_lossy();

        let value = if decoded.starts_with('[') || decoded.starts_with('{') {
            serde_json::from_str(&decoded).map_err(|e| anyhow!("issue decoding `{key}`: {e}"))?
        } else {
            Value::String(decoded.to_string())
        };
        map.insert(key.to_string(), value);
    }

    Ok(serde_json::from_value(Value::Object(map))?)
}

/// Returns the query component of a URI: the text after the first `?`, up
/// to any `#`. A string without a `?` is assumed to already be a query.
#[must_use]
pub fn query(uri: &str) -> &str {
    let query = uri.split_once('?').map_or(uri, |(_, q)| q);
    query.split_once('#').map_or(query, |(q, _)| q)
}
