//! # W3C Verifiable Credentials
//!
//! The credential data model, its builders, presentations, and the JWT
//! envelope used when a credential is secured with an enveloping proof.
//!
//! See <https://www.w3.org/TR/vc-data-model>.

mod builder;
mod credential;
pub mod jose;
mod proof;
mod types;
mod vp;

pub use self::builder::{CredentialBuilder, SubjectBuilder};
pub use self::credential::{BASE_CONTEXT, VERIFIABLE_CREDENTIAL, W3cCredential, format_date};
pub use self::jose::{VcClaims, VpClaims};
pub use self::proof::Proof;
pub use self::types::{CredentialSchema, CredentialSubject, Issuer};
pub use self::vp::{VERIFIABLE_PRESENTATION, VerifiablePresentation};
