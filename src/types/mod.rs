//! Request types used across the Bitfinex client library.

pub mod params;
pub mod request;
pub mod symbol;

pub use params::Parameters;
pub use request::{ApiVersion, RestRequest};
pub use symbol::{SymbolKind, validate_symbol};
