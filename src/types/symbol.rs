//! Bitfinex symbol validation.
//!
//! Trading pairs are prefixed with `t` (e.g. `tBTCUSD`, `tTESTBTC:TESTUSD`),
//! funding currencies with `f` (e.g. `fUSD`).

use crate::error::BitfinexError;

/// The market a symbol belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    /// Trading pair, `t` prefix
    Trading,
    /// Funding currency, `f` prefix
    Funding,
}

/// Validate a Bitfinex symbol and report which market it belongs to.
pub fn validate_symbol(symbol: &str) -> Result<SymbolKind, BitfinexError> {
    let invalid = || {
        BitfinexError::Configuration(format!(
            "{symbol} is not a valid Bitfinex symbol; expected tXXXYYY for trading pairs or fXXX for funding"
        ))
    };

    let (kind, body) = if let Some(body) = symbol.strip_prefix('t') {
        (SymbolKind::Trading, body)
    } else if let Some(body) = symbol.strip_prefix('f') {
        (SymbolKind::Funding, body)
    } else {
        return Err(invalid());
    };

    let valid = match kind {
        SymbolKind::Trading => {
            body.len() >= 6
                && body.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == ':')
                && !body.starts_with(':')
                && !body.ends_with(':')
        }
        SymbolKind::Funding => {
            body.len() >= 3 && body.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        }
    };

    if valid { Ok(kind) } else { Err(invalid()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_symbols() {
        for symbol in ["tBTCUSD", "tNANOUSD", "tNANOBTC", "tETHBTC", "tTESTBTC:TESTUSD"] {
            assert_eq!(validate_symbol(symbol).unwrap(), SymbolKind::Trading, "{symbol}");
        }
        for symbol in ["fBTC", "fNANO", "fUSD"] {
            assert_eq!(validate_symbol(symbol).unwrap(), SymbolKind::Funding, "{symbol}");
        }
    }

    #[test]
    fn test_invalid_symbols() {
        for symbol in [
            "dETHBTC", "tBEETC", "BTC-USDT", "BTC-USD", "tBTC-USD", "fBTC-USD", "fNA", "",
            "tbtcusd",
        ] {
            assert!(
                matches!(validate_symbol(symbol), Err(BitfinexError::Configuration(_))),
                "{symbol} should be rejected"
            );
        }
    }
}
