//! Core components for verifying and signing requests at the edge.
//!
//! This crate provides the foundational types and traits shared by the
//! signer and the interceptor.
//!
//! ## Overview
//!
//! - **Context**: holds the environment configuration is resolved from
//! - **Traits**: credential loading (`ProvideCredential`) and request signing (`SignRequest`)
//! - **HeaderSet**: case-insensitive, case-preserving header storage with a pure merge
//! - **Error**: one error type whose [`Tier`] says whether a request must be blocked
//!
//! ## Utilities
//!
//! - [`hash`]: Cryptographic hashing utilities
//! - [`time`]: Time formatting utilities
//! - [`utils`]: General utilities including data redaction

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

pub mod hash;
pub mod time;
pub mod utils;

mod context;
pub use context::Context;
pub use context::Env;
pub use context::OsEnv;
pub use context::StaticEnv;

mod error;
pub use error::Error;
pub use error::ErrorKind;
pub use error::Result;
pub use error::Tier;

mod api;
pub use api::{ProvideCredential, SignRequest, SigningCredential};
mod headers;
pub use headers::{HeaderEntry, HeaderSet, SignatureResult};
mod request;
pub use request::CanonicalRequest;
