//! # `OpenID` Errors
//!
//! Errors raised while parsing Self-Issued OpenID Provider requests, building
//! responses, and exchanging them with a Verifier. Errors serialize as an
//! `OpenID` error response (`error` and `error_description`).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// `OpenID` error codes for Self-Issued OpenID Provider exchanges.
#[derive(Error, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[serde(tag = "error", content = "error_description")]
pub enum Error {
    /// The request is missing a required parameter, includes an unsupported
    /// parameter value, or is otherwise malformed.
    #[error(r#"{{"error": "invalid_request", "error_description": "{0}"}}"#)]
    InvalidRequest(String),

    /// An unexpected condition prevented the request from being fulfilled.
    #[error(r#"{{"error": "server_error", "error_description": "{0}"}}"#)]
    ServerError(String),

    /// The Verifier could not be reached, or answered with an error status.
    #[error(r#"{{"error": "transport_error", "error_description": "{0}"}}"#)]
    #[serde(rename = "transport_error")]
    Transport(String),
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<Self>() {
            Some(Self::InvalidRequest(e)) => Self::InvalidRequest(format!("{err}: {e}")),
            Some(Self::ServerError(e)) => Self::ServerError(format!("{err}: {e}")),
            Some(Self::Transport(e)) => Self::Transport(format!("{err}: {e}")),
            None => Self::ServerError(stack(&err)),
        }
    }
}

impl From<credo_vdc::Error> for Error {
    fn from(err: credo_vdc::Error) -> Self {
        Self::InvalidRequest(err.to_string())
    }
}

// Flatten an `anyhow` error chain into a single message.
pub(crate) fn stack(err: &anyhow::Error) -> String {
    let stack = err.chain().fold(String::new(), |cause, e| format!("{cause} -> {e}"));
    stack.trim_start_matches(" -> ").to_string()
}

/// Construct an `Error::InvalidRequest` error from a string or existing error
/// value.
macro_rules! invalid {
    ($fmt:expr, $($arg:tt)*) => {
        $crate::Error::InvalidRequest(format!($fmt, $($arg)*))
    };
     ($err:expr $(,)?) => {
        $crate::Error::InvalidRequest(format!($err))
    };
}
pub(crate) use invalid;

/// Construct an `Error::Transport` error from a string or existing error
/// value.
macro_rules! transport {
    ($fmt:expr, $($arg:tt)*) => {
        $crate::Error::Transport(format!($fmt, $($arg)*))
    };
     ($err:expr $(,)?) => {
        $crate::Error::Transport(format!($err))
    };
}
pub(crate) use transport;
