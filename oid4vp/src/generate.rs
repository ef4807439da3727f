//! # Generate
//!
//! Random strings for request `nonce` and `state` values and presentation
//! submission identifiers.

use base64ct::{Base64UrlUnpadded, Encoding};

const SAFE_CHARS: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789)(*&^%$#@!~";
const TOKEN_LEN: usize = 32;

/// Generates a base64 encoded random string for `nonce`.
#[must_use]
pub fn nonce() -> String {
    token()
}

/// Generates a base64 encoded random string for `state`.
#[must_use]
pub fn state() -> String {
    token()
}

/// Generates a base64 encoded random string for use as an identifier.
#[must_use]
pub fn token() -> String {
    let rnd = random_string(TOKEN_LEN, SAFE_CHARS);
    Base64UrlUnpadded::encode_string(rnd.as_bytes())
}

/// Generates a random string from a given set of characters. Uses fastrand so is
/// not cryptographically secure.
#[must_use]
pub fn random_string(len: usize, charset: &str) -> String {
    let chars: Vec<char> = charset.chars().collect();
    (0..len).map(|_| chars[fastrand::usize(..chars.len())]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_url_safe() {
        let token = token();
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_ne!(nonce(), state());
    }

    #[test]
    fn random_from_charset() {
        let s = random_string(16, "ab");
        assert_eq!(s.len(), 16);
        assert!(s.chars().all(|c| c == 'a' || c == 'b'));
    }
}
