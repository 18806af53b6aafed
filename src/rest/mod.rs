//! Bitfinex REST API client.
//!
//! [`BitfinexRestClient`] is the transport for [`RestRequest`](crate::types::RestRequest)
//! descriptors: it signs, sends and decodes. Endpoint-specific methods are
//! built on top of [`BitfinexRestClient::send`].

mod client;
pub mod endpoints;

pub use client::{BitfinexRestClient, BitfinexRestClientBuilder};
pub use endpoints::BITFINEX_BASE_URL;
