//! Bitfinex REST API endpoint constants.
//!
//! Endpoints are relative to their API version; combine them with
//! [`RestRequest::new`](crate::types::RestRequest::new).

/// Base URL for the Bitfinex REST API.
pub const BITFINEX_BASE_URL: &str = "https://api.bitfinex.com";

/// v2 endpoints.
pub mod v2 {
    /// Platform status (public).
    pub const PLATFORM_STATUS: &str = "platform/status";
    /// Tickers (public).
    pub const TICKERS: &str = "tickers";
    /// Wallets.
    pub const WALLETS: &str = "auth/r/wallets";
    /// Active orders.
    pub const ACTIVE_ORDERS: &str = "auth/r/orders";
    /// Active positions.
    pub const ACTIVE_POSITIONS: &str = "auth/r/positions";
    /// Submit an order.
    pub const SUBMIT_ORDER: &str = "auth/w/order/submit";
}

/// v1 endpoints.
pub mod v1 {
    /// Symbols (public).
    pub const SYMBOLS: &str = "symbols";
    /// Account info.
    pub const ACCOUNT_INFOS: &str = "account_infos";
    /// Order status.
    pub const ORDER_STATUS: &str = "order/status";
}
