//! # Bitfinex Client
//!
//! An async Rust client library for the Bitfinex exchange REST API, covering
//! request authentication for both the legacy v1 and the current v2 API.
//!
//! ## Features
//!
//! - Strictly increasing nonces, safe to share across threads
//! - HMAC-SHA384 signing for the v1 (base64 payload) and v2 schemes
//! - Byte-for-byte reproducible request bodies
//! - Normalized errors across every error envelope Bitfinex returns
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use bitfinex_api_client::auth::EnvCredentials;
//! use bitfinex_api_client::rest::{BitfinexRestClient, endpoints};
//! use bitfinex_api_client::types::{ApiVersion, RestRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = BitfinexRestClient::builder()
//!         .credentials(Arc::new(EnvCredentials::from_env()?))
//!         .build();
//!
//!     let request = RestRequest::post(ApiVersion::V2, endpoints::v2::WALLETS).signed();
//!     let wallets = client.send_json(&request).await?;
//!     println!("Wallets: {}", wallets);
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod error;
pub mod rest;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{BitfinexError, ServerError};
pub use types::{ApiVersion, Parameters, RestRequest};

/// Result type alias using BitfinexError
pub type Result<T> = std::result::Result<T, BitfinexError>;
