//! # Mock Providers
//!
//! An Ed25519 [`Keyring`] implementing the credential signing, verification
//! and DID resolution collaborators, and a [`MockVerifier`] serving SIOPv2
//! requests over an in-memory transport.

pub mod keyring;
pub mod verifier;

pub use keyring::Keyring;
pub use verifier::MockVerifier;
