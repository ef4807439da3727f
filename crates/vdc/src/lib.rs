//! # Verifiable Digital Credentials
//!
//! Builders, data model and issuance orchestration for
//! [W3C Verifiable Credentials](https://www.w3.org/TR/vc-data-model).
//!
//! Credentials are held as insertion-ordered JSON objects so issuer-defined
//! extension members survive a parse, mutate, build and serialize cycle.
//! Typed accessors and setters layer over that property bag.
//!
//! Signing, verification, and DID resolution are not performed here: they are
//! collaborators passed in by the caller (see [`signatory`]).

pub mod builder;
pub mod data_provider;
pub mod signatory;
pub mod templates;
pub mod typed;
pub mod w3c;

mod error;

pub use credo_core::{Kind, OneMany};

pub use crate::builder::{BasicBuilder, Document};
pub use crate::data_provider::{DataProvider, MergingDataProvider};
pub use crate::error::Error;
pub use crate::signatory::{DidResolver, ProofConfig, ProofType, Signatory, Signer, Verifier};
pub use crate::typed::{TypedCredential, VerifiableDiploma, VerifiableId};
pub use crate::w3c::{CredentialBuilder, SubjectBuilder, W3cCredential};

/// Result type for credential operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
