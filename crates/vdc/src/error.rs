//! # Credential Errors
//!
//! Failures raised while building, parsing, or issuing credentials. Each is
//! surfaced to the immediate caller: no partially-built credential is ever
//! returned alongside an error.

use thiserror::Error;

/// Errors raised by the credential builder, model and issuance layers.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// Input text is not well-formed JSON, or not the JSON object that was
    /// required.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// Credential text could not be read as a credential document.
    #[error("malformed credential: {0}")]
    MalformedCredential(String),

    /// A required field is missing or has the wrong shape.
    #[error("schema violation: {0}")]
    SchemaViolation(String),

    /// A DID URL does not match the DID grammar.
    #[error("invalid DID syntax: {0}")]
    InvalidDidSyntax(String),

    /// No credential template is registered under the requested name.
    #[error("template not found: {0}")]
    TemplateNotFound(String),

    /// The DID resolution collaborator failed.
    #[error("resolution failed: {0}")]
    Resolution(String),

    /// The signing collaborator failed.
    #[error("signing failed: {0}")]
    Signing(String),
}

impl From<credo_core::Error> for Error {
    fn from(err: credo_core::Error) -> Self {
        match err {
            credo_core::Error::MalformedInput(e) => Self::MalformedInput(e),
            credo_core::Error::InvalidDidSyntax(e) => Self::InvalidDidSyntax(e),
        }
    }
}

// Flatten an `anyhow` error chain into a single message.
pub(crate) fn stack(err: &anyhow::Error) -> String {
    err.chain().map(ToString::to_string).collect::<Vec<_>>().join(" -> ")
}

#[cfg(test)]
mod tests {
    use anyhow::{Context, anyhow};

    use super::*;

    #[test]
    fn core_errors_convert() {
        let err: Error = credo_core::Error::InvalidDidSyntax("not-a-did".to_string()).into();
        assert_eq!(err, Error::InvalidDidSyntax("not-a-did".to_string()));
        assert_eq!(err.to_string(), "invalid DID syntax: not-a-did");
    }

    #[test]
    fn anyhow_stack() {
        let result = Err::<(), anyhow::Error>(anyhow!("key not found")).context("signing context");
        let Err(err) = result else {
            panic!("should be an error");
        };
        assert_eq!(stack(&err), "signing context -> key not found");
    }
}
