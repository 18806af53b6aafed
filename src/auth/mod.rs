//! Authentication module for Bitfinex API.
//!
//! This module provides:
//! - Credential management with secure secret storage
//! - Nonce generation for replay attack prevention
//! - HMAC-SHA384 signature generation for the v1 and v2 signing schemes
//! - [`AuthenticationProvider`], which signs outbound requests in place

mod credentials;
mod nonce;
mod provider;
pub mod signature;

pub use credentials::{Credentials, CredentialsProvider, EnvCredentials, StaticCredentials};
pub use nonce::{IncreasingNonce, NonceProvider};
pub use provider::AuthenticationProvider;
pub use signature::{SignedRequest, SigningContext, sign_hmac_sha384};
