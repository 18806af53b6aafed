//! Ordered request parameters.
//!
//! Each value is stored as pre-serialized JSON text, in insertion order. The
//! JSON object rendered by [`Parameters::to_json`] is therefore reproducible
//! byte-for-byte, which the v1 payload signature depends on.

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use crate::error::BitfinexError;
use crate::types::symbol::validate_symbol;

/// An ordered set of request parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parameters {
    entries: Vec<(String, String)>,
}

impl Parameters {
    /// Create an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert any serializable value.
    pub fn insert<T>(&mut self, key: impl Into<String>, value: &T) -> Result<(), BitfinexError>
    where
        T: Serialize + ?Sized,
    {
        let json = serde_json::to_string(value)?;
        self.insert_raw(key, json);
        Ok(())
    }

    /// Insert a string value.
    pub fn insert_str(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.insert_raw(key, Value::String(value.into()).to_string());
    }

    /// Insert an integer value.
    pub fn insert_int(&mut self, key: impl Into<String>, value: i64) {
        self.insert_raw(key, value.to_string());
    }

    /// Insert a decimal value.
    ///
    /// Bitfinex expects amounts and prices as decimal strings, so the value is
    /// sent quoted (`"0.5"`) to avoid any float conversion.
    pub fn insert_decimal(&mut self, key: impl Into<String>, value: Decimal) {
        self.insert_str(key, value.to_string());
    }

    /// Insert a validated `t`/`f` symbol.
    pub fn insert_symbol(
        &mut self,
        key: impl Into<String>,
        symbol: &str,
    ) -> Result<(), BitfinexError> {
        validate_symbol(symbol)?;
        self.insert_str(key, symbol);
        Ok(())
    }

    /// Insert a value that is already JSON text.
    ///
    /// The text is emitted verbatim; the caller is responsible for it being
    /// valid JSON. An existing key keeps its position and has its value replaced.
    pub fn insert_raw(&mut self, key: impl Into<String>, json: impl Into<String>) {
        let key = key.into();
        let json = json.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, value)) => *value = json,
            None => self.entries.push((key, json)),
        }
    }

    /// Builder-style [`Parameters::insert_str`].
    pub fn with_str(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert_str(key, value);
        self
    }

    /// Builder-style [`Parameters::insert_int`].
    pub fn with_int(mut self, key: impl Into<String>, value: i64) -> Self {
        self.insert_int(key, value);
        self
    }

    /// Builder-style [`Parameters::insert_decimal`].
    pub fn with_decimal(mut self, key: impl Into<String>, value: Decimal) -> Self {
        self.insert_decimal(key, value);
        self
    }

    /// Get the serialized JSON text of a value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value.as_str())
    }

    /// Iterate over `(key, json)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no parameters.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render the parameters as a JSON object, in insertion order.
    pub fn to_json(&self) -> String {
        let fields: Vec<String> = self
            .entries
            .iter()
            .map(|(key, value)| format!("{}:{}", Value::String(key.clone()), value))
            .collect();
        format!("{{{}}}", fields.join(","))
    }

    /// Render the parameters as a URL query string.
    ///
    /// JSON strings are unquoted; other values are sent as their JSON text.
    pub fn to_query_string(&self) -> Result<String, BitfinexError> {
        let pairs: Vec<(&str, String)> = self
            .entries
            .iter()
            .map(|(key, value)| {
                let value = serde_json::from_str::<String>(value).unwrap_or_else(|_| value.clone());
                (key.as_str(), value)
            })
            .collect();
        Ok(serde_urlencoded::to_string(pairs)?)
    }
}
