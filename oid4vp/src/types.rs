//! # Self-Issued OpenID Provider v2 (SIOPv2) Types

mod request;
mod response;

pub use self::request::*;
pub use self::response::*;
