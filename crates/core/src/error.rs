//! # Core Errors

use thiserror::Error;

/// Errors raised while parsing structural input.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// Input text is not well-formed JSON, or is not the JSON object that
    /// was required.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// A DID URL does not match `did:<method>:<identifier>[#<fragment>]`.
    #[error("invalid DID syntax: {0}")]
    InvalidDidSyntax(String),
}
