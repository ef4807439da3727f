//! A thin wallet-side transport for
//! [Self-Issued OpenID Provider v2](https://openid.net/specs/openid-connect-self-issued-v2-1_0.html)
//! and [OpenID for Verifiable Presentations](https://openid.net/specs/openid-4-verifiable-presentations-1_0.html).
//!
//! A holder fetches the Verifier's authentication request, presents
//! credentials in a `vp_token` alongside a Self-Issued ID Token, and posts the
//! response back. The HTTP client and the ID Token signer are supplied by the
//! host application (see [`provider`]).
//!
//! # Feature Flags
//!
//! * `wasm` - Enables random number generation in `wasm32` targets.

pub mod generate;
pub mod provider;
pub mod types;

mod error;
mod handlers;

pub use credo_vdc as vdc;

pub use self::error::Error;
pub use self::handlers::*;
pub use self::types::*;

/// Result type for Self-Issued OpenID Provider exchanges.
pub type Result<T, E = Error> = std::result::Result<T, E>;
