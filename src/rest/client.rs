//! Bitfinex REST API client implementation.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use reqwest::Method;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, RequestBuilder};
use reqwest_retry::policies::ExponentialBackoff;
use reqwest_retry::{
    RetryDecision, RetryPolicy, Retryable, default_on_request_failure, default_on_request_success,
};
use reqwest_tracing::TracingMiddleware;
use serde_json::Value;
use url::Url;

use crate::auth::{AuthenticationProvider, CredentialsProvider, IncreasingNonce, NonceProvider};
use crate::error::{BitfinexError, ServerError};
use crate::rest::endpoints::BITFINEX_BASE_URL;
use crate::types::RestRequest;

/// The Bitfinex REST API client.
///
/// The client turns a [`RestRequest`] into an HTTP call: it authenticates
/// signed requests, retries transient failures with a fresh nonce on every
/// attempt, and normalizes error responses into [`ServerError`].
///
/// # Example
///
/// ```rust,no_run
/// use bitfinex_api_client::rest::{BitfinexRestClient, endpoints};
/// use bitfinex_api_client::types::{ApiVersion, RestRequest};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = BitfinexRestClient::new();
///
///     let request = RestRequest::get(ApiVersion::V2, endpoints::v2::PLATFORM_STATUS);
///     let status: Vec<i32> = client.send(&request).await?;
///     println!("Platform status: {:?}", status);
///
///     Ok(())
/// }
/// ```
///
/// For signed endpoints, provide credentials:
///
/// ```rust,no_run
/// use bitfinex_api_client::auth::StaticCredentials;
/// use bitfinex_api_client::rest::{BitfinexRestClient, endpoints};
/// use bitfinex_api_client::types::{ApiVersion, RestRequest};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let credentials = Arc::new(StaticCredentials::new("api_key", "api_secret")?);
///     let client = BitfinexRestClient::builder()
///         .credentials(credentials)
///         .build();
///
///     let request = RestRequest::post(ApiVersion::V2, endpoints::v2::WALLETS).signed();
///     let wallets = client.send_json(&request).await?;
///     println!("Wallets: {}", wallets);
///
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct BitfinexRestClient {
    http_client: ClientWithMiddleware,
    base_url: String,
    authenticator: Option<Arc<AuthenticationProvider>>,
    retry_policy: ExponentialBackoff,
}

impl BitfinexRestClient {
    /// Create a new client with default settings.
    ///
    /// This client can only access public endpoints.
    /// Use [`BitfinexRestClient::builder()`] to configure credentials for signed endpoints.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a new client builder.
    pub fn builder() -> BitfinexRestClientBuilder {
        BitfinexRestClientBuilder::new()
    }

    /// The authentication provider, if credentials were configured.
    ///
    /// Hand this to any other client that signs with the same key so that
    /// all of them draw from one nonce sequence.
    pub fn authenticator(&self) -> Option<&Arc<AuthenticationProvider>> {
        self.authenticator.as_ref()
    }

    /// Send a request and deserialize the response body.
    pub async fn send<T>(&self, request: &RestRequest) -> Result<T, BitfinexError>
    where
        T: serde::de::DeserializeOwned,
    {
        let body = self.send_json(request).await?;
        serde_json::from_value(body).map_err(|e| {
            BitfinexError::InvalidResponse(format!("Failed to decode response: {e}"))
        })
    }

    /// Send a request and return the raw JSON response.
    ///
    /// Pass the request unauthenticated: it is signed here, once per attempt.
    pub async fn send_json(&self, request: &RestRequest) -> Result<Value, BitfinexError> {
        if request.is_signed() && self.authenticator.is_none() {
            return Err(BitfinexError::MissingCredentials);
        }

        let started = SystemTime::now();
        let mut retries = 0u32;

        loop {
            let mut attempt = request.clone();
            if let Some(authenticator) = &self.authenticator {
                authenticator.authenticate(&mut attempt)?;
            }

            let outcome = self.build_request(&attempt)?.send().await;
            let retryable = match &outcome {
                Ok(response) => default_on_request_success(response),
                Err(error) => default_on_request_failure(error),
            };

            if matches!(retryable, Some(Retryable::Transient)) {
                if let RetryDecision::Retry { execute_after } =
                    self.retry_policy.should_retry(started, retries)
                {
                    let delay = execute_after
                        .duration_since(SystemTime::now())
                        .unwrap_or_default();
                    tracing::warn!(
                        path = attempt.path(),
                        retries,
                        ?delay,
                        "Transient failure, retrying with a fresh nonce"
                    );
                    tokio::time::sleep(delay).await;
                    retries += 1;
                    continue;
                }
            }

            return self.parse_response(outcome?).await;
        }
    }

    fn build_request(&self, request: &RestRequest) -> Result<RequestBuilder, BitfinexError> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, request.path()))?;

        // Signed requests always carry the body that was signed.
        let sends_query = request.method() == Method::GET && !request.is_signed();
        if sends_query && !request.parameters().is_empty() {
            url.set_query(Some(&request.parameters().to_query_string()?));
        }

        let mut builder = self.http_client.request(request.method().clone(), url);
        for (name, value) in request.headers() {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !sends_query {
            builder = builder
                .header(CONTENT_TYPE, "application/json")
                .body(request.json_body());
        }
        Ok(builder)
    }

    /// Parse a response from the Bitfinex API.
    async fn parse_response(&self, response: reqwest::Response) -> Result<Value, BitfinexError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let error = ServerError::from_raw(&body, status);
            return Err(BitfinexError::Api { status, error });
        }

        let parsed: Value = serde_json::from_str(&body).map_err(|e| {
            BitfinexError::InvalidResponse(format!(
                "Failed to parse response: {}. Body: {}",
                e, body
            ))
        })?;

        // v2 can report failures inside a 2xx body.
        if let Some(error) = ServerError::from_envelope(&parsed) {
            return Err(BitfinexError::Api { status, error });
        }

        Ok(parsed)
    }
}

impl Default for BitfinexRestClient {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BitfinexRestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitfinexRestClient")
            .field("base_url", &self.base_url)
            .field("has_credentials", &self.authenticator.is_some())
            .finish()
    }
}

/// Builder for [`BitfinexRestClient`].
pub struct BitfinexRestClientBuilder {
    base_url: String,
    credentials: Option<Arc<dyn CredentialsProvider>>,
    nonce_provider: Option<Arc<dyn NonceProvider>>,
    authenticator: Option<Arc<AuthenticationProvider>>,
    user_agent: Option<String>,
    max_retries: u32,
    retry_bounds: Option<(Duration, Duration)>,
}

impl BitfinexRestClientBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            base_url: BITFINEX_BASE_URL.to_string(),
            credentials: None,
            nonce_provider: None,
            authenticator: None,
            user_agent: None,
            max_retries: 3,
            retry_bounds: None,
        }
    }

    /// Set the base URL (useful for testing with a mock server).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the credentials provider for authenticated requests.
    pub fn credentials(mut self, credentials: Arc<dyn CredentialsProvider>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Set a custom nonce provider.
    ///
    /// Careful: once a nonce has been sent to the server, every later
    /// request needs a higher one.
    pub fn nonce_provider(mut self, provider: Arc<dyn NonceProvider>) -> Self {
        self.nonce_provider = Some(provider);
        self
    }

    /// Reuse an existing authentication provider.
    ///
    /// Takes precedence over [`credentials`](Self::credentials) and
    /// [`nonce_provider`](Self::nonce_provider).
    pub fn authenticator(mut self, authenticator: Arc<AuthenticationProvider>) -> Self {
        self.authenticator = Some(authenticator);
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Set the maximum number of retries for transient failures.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the minimum and maximum backoff between retries.
    pub fn retry_bounds(mut self, min: Duration, max: Duration) -> Self {
        self.retry_bounds = Some((min.min(max), min.max(max)));
        self
    }

    /// Build the client.
    pub fn build(self) -> BitfinexRestClient {
        // Build default headers.
        let mut headers = HeaderMap::new();
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("bitfinex-api-client/{}", env!("CARGO_PKG_VERSION")));
        let header_value = HeaderValue::from_str(&user_agent)
            .unwrap_or_else(|_| HeaderValue::from_static("bitfinex-api-client"));
        headers.insert(USER_AGENT, header_value);

        let reqwest_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        // Retries happen in the client so that each attempt is re-signed.
        let client = ClientBuilder::new(reqwest_client)
            .with(TracingMiddleware::default())
            .build();

        let mut backoff = ExponentialBackoff::builder();
        if let Some((min, max)) = self.retry_bounds {
            backoff = backoff.retry_bounds(min, max);
        }
        let retry_policy = backoff.build_with_max_retries(self.max_retries);

        let authenticator = match (self.authenticator, self.credentials) {
            (Some(authenticator), credentials) => {
                if credentials.is_some() || self.nonce_provider.is_some() {
                    tracing::warn!(
                        "Authenticator supplied; ignoring separately configured credentials and nonce provider"
                    );
                }
                Some(authenticator)
            }
            (None, Some(credentials)) => {
                let nonce_provider = self
                    .nonce_provider
                    .unwrap_or_else(|| Arc::new(IncreasingNonce::new()));
                Some(Arc::new(AuthenticationProvider::with_nonce_provider(
                    credentials,
                    nonce_provider,
                )))
            }
            (None, None) => {
                if self.nonce_provider.is_some() {
                    tracing::warn!("Nonce provider configured without credentials; ignoring it");
                }
                None
            }
        };

        BitfinexRestClient {
            http_client: client,
            base_url: self.base_url,
            authenticator,
            retry_policy,
        }
    }
}

impl Default for BitfinexRestClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
