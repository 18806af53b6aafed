//! Nonce generation for Bitfinex API authentication.
//!
//! Bitfinex rejects any nonce that is not strictly greater than the last one
//! it accepted for the API key, so every signed request must draw from the
//! same provider for its credential set.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Trait for providing nonces for authenticated requests.
///
/// The nonce must be strictly increasing for each request. A custom provider
/// is accepted as-is: once a nonce has reached the server, every later
/// request needs a higher one, and nothing here checks that for you.
pub trait NonceProvider: Send + Sync {
    /// Generate the next nonce value.
    ///
    /// This value must be greater than any previously returned value.
    fn next_nonce(&self) -> u64;
}

/// Wall-clock nonces in microseconds, never repeating.
///
/// Each draw is `max(now_micros, previous + 1)`, committed atomically, so
/// concurrent callers in the same microsecond get distinct values and a
/// clock that steps backwards does not break the sequence.
#[derive(Debug)]
pub struct IncreasingNonce {
    issued: AtomicU64,
}

impl IncreasingNonce {
    /// Create a provider that follows the wall clock from its first draw.
    pub fn new() -> Self {
        Self::starting_after(0)
    }

    /// Create a provider whose first nonce is greater than `last`.
    ///
    /// Use this to resume after a nonce that was already sent with the same
    /// key, for example by a previous process.
    pub fn starting_after(last: u64) -> Self {
        Self {
            issued: AtomicU64::new(last),
        }
    }

    /// The most recently issued nonce (or the starting point if none was issued).
    pub fn last_nonce(&self) -> u64 {
        self.issued.load(Ordering::SeqCst)
    }

    fn clock_micros() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX))
            .unwrap_or_default()
    }
}

impl Default for IncreasingNonce {
    fn default() -> Self {
        Self::new()
    }
}

impl NonceProvider for IncreasingNonce {
    fn next_nonce(&self) -> u64 {
        let now = Self::clock_micros();
        let advance = |last: u64| Some(now.max(last.saturating_add(1)));

        // The closure never declines, so both arms carry the previous value.
        match self
            .issued
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, advance)
        {
            Ok(previous) | Err(previous) => now.max(previous.saturating_add(1)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_nonce_strictly_increasing() {
        let provider = IncreasingNonce::new();

        let mut last = 0u64;
        for _ in 0..1000 {
            let nonce = provider.next_nonce();
            assert!(nonce > last, "Nonce must be strictly increasing");
            last = nonce;
        }
        assert_eq!(provider.last_nonce(), last);
    }

    #[test]
    fn test_nonce_unique_across_threads() {
        let provider = Arc::new(IncreasingNonce::new());
        let mut handles = vec![];

        for _ in 0..100 {
            let p = provider.clone();
            handles.push(thread::spawn(move || {
                let mut nonces = Vec::with_capacity(100);
                for _ in 0..100 {
                    nonces.push(p.next_nonce());
                }
                nonces
            }));
        }

        let mut all_nonces = HashSet::new();
        for handle in handles {
            let nonces = handle.join().unwrap();
            // Each thread observes its own draws in increasing order.
            assert!(nonces.windows(2).all(|pair| pair[0] < pair[1]));
            for nonce in nonces {
                assert!(
                    all_nonces.insert(nonce),
                    "Nonce must be unique across threads"
                );
            }
        }
        assert_eq!(all_nonces.len(), 100 * 100);
    }

    #[test]
    fn test_nonce_survives_clock_behind_last() {
        // A starting point far ahead of the clock behaves like a clock rollback.
        let ahead = IncreasingNonce::clock_micros() + 60_000_000;
        let provider = IncreasingNonce::starting_after(ahead);

        assert_eq!(provider.next_nonce(), ahead + 1);
        assert_eq!(provider.next_nonce(), ahead + 2);
    }

    #[test]
    fn test_resumed_provider_stays_above_sent_nonce() {
        let provider = IncreasingNonce::new();
        let sent = provider.next_nonce();

        // A replacement provider for the same key picks up where this one stopped.
        let resumed = IncreasingNonce::starting_after(provider.last_nonce());
        assert!(resumed.next_nonce() > sent);
    }

    #[test]
    fn test_nonce_saturates_at_max() {
        let provider = IncreasingNonce::starting_after(u64::MAX);
        assert_eq!(provider.next_nonce(), u64::MAX);
    }

    #[test]
    fn test_nonce_tracks_clock() {
        let before = IncreasingNonce::clock_micros();
        let nonce = IncreasingNonce::new().next_nonce();
        assert!(nonce >= before);
    }
}
