//! Request authentication for both Bitfinex API generations.

use std::sync::Arc;

use crate::auth::signature::{SigningContext, sign_hmac_sha384};
use crate::auth::{CredentialsProvider, IncreasingNonce, NonceProvider};
use crate::error::BitfinexError;
use crate::types::RestRequest;

/// Authenticates outbound requests for one credential set.
///
/// The provider owns the nonce source for its credentials. Share a single
/// instance (it is cheap to wrap in an `Arc`) across every client and task
/// that signs with the same key; two providers for the same key will issue
/// colliding nonces.
#[derive(Clone)]
pub struct AuthenticationProvider {
    credentials: Arc<dyn CredentialsProvider>,
    nonce_provider: Arc<dyn NonceProvider>,
}

impl AuthenticationProvider {
    /// Create a provider with the default time-based nonce source.
    pub fn new(credentials: Arc<dyn CredentialsProvider>) -> Self {
        Self::with_nonce_provider(credentials, Arc::new(IncreasingNonce::new()))
    }

    /// Create a provider with a custom nonce source.
    ///
    /// The caller is responsible for the source being strictly increasing.
    pub fn with_nonce_provider(
        credentials: Arc<dyn CredentialsProvider>,
        nonce_provider: Arc<dyn NonceProvider>,
    ) -> Self {
        Self {
            credentials,
            nonce_provider,
        }
    }

    /// The configured API key, verbatim.
    pub fn api_key(&self) -> &str {
        self.credentials.get_credentials().api_key()
    }

    /// Draw the next nonce for this credential set.
    pub fn next_nonce(&self) -> u64 {
        self.nonce_provider.next_nonce()
    }

    /// Sign an arbitrary message with the configured secret.
    ///
    /// Returns the lowercase hex HMAC-SHA384 digest.
    pub fn sign(&self, message: &str) -> Result<String, BitfinexError> {
        let credentials = self.credentials.get_credentials();
        sign_hmac_sha384(message, credentials.expose_secret().as_bytes())
    }

    /// Authenticate a request in place.
    ///
    /// Unsigned requests are left untouched and consume no nonce. Signed
    /// requests consume exactly one nonce per call, so a retried request
    /// must be authenticated again from an unsigned copy.
    pub fn authenticate(&self, request: &mut RestRequest) -> Result<(), BitfinexError> {
        if !request.is_signed() {
            tracing::trace!(path = request.path(), "Public request, skipping signing");
            return Ok(());
        }

        let nonce = self.next_nonce();
        let signed = SigningContext::for_request(request, nonce)
            .sign(self.credentials.get_credentials())?;

        tracing::debug!(
            path = request.path(),
            version = %request.version(),
            nonce,
            "Authenticated request"
        );

        for (name, value) in signed.headers {
            request.add_header(name, value);
        }
        request.set_signed_body(signed.body);
        Ok(())
    }
}

impl std::fmt::Debug for AuthenticationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticationProvider")
            .field("api_key", &self.api_key())
            .finish_non_exhaustive()
    }
}
