//! The outbound request descriptor shared by the signing core and the transport.

use reqwest::Method;

use crate::error::BitfinexError;
use crate::types::params::Parameters;

/// Bitfinex REST API generation.
///
/// The generation selects the signing scheme: v1 signs a base64 payload sent
/// in `X-BFX-*` headers, v2 signs `/api` + path + nonce + body and sends
/// `bfx-*` headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiVersion {
    /// Legacy v1 API
    V1,
    /// Current v2 API
    V2,
}

impl ApiVersion {
    /// The path segment for this version (`v1` or `v2`).
    pub fn path_segment(self) -> &'static str {
        match self {
            ApiVersion::V1 => "v1",
            ApiVersion::V2 => "v2",
        }
    }

    /// Infer the version from a request path.
    ///
    /// Matches on the substrings `v1` then `v2` anywhere in the path, so a
    /// path such as `/v2/auth/r/v1stats` routes as v1. Prefer
    /// [`RestRequest::new`] with an explicit version.
    pub fn from_path(path: &str) -> Option<Self> {
        if path.contains("v1") {
            Some(ApiVersion::V1)
        } else if path.contains("v2") {
            Some(ApiVersion::V2)
        } else {
            None
        }
    }
}

impl std::fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path_segment())
    }
}

/// A pending REST request.
///
/// Authentication annotates the request in place: it attaches headers and
/// records the exact body that was signed. The caller's [`Parameters`] are
/// never modified.
#[derive(Debug, Clone)]
pub struct RestRequest {
    method: Method,
    version: ApiVersion,
    path: String,
    params: Parameters,
    signed: bool,
    headers: Vec<(String, String)>,
    body: Option<String>,
}

impl RestRequest {
    /// Create a request for `endpoint` under the given API version.
    ///
    /// The resulting path is `/v{n}/{endpoint}`.
    pub fn new(method: Method, version: ApiVersion, endpoint: &str) -> Self {
        let path = format!(
            "/{}/{}",
            version.path_segment(),
            endpoint.trim_start_matches('/')
        );
        Self {
            method,
            version,
            path,
            params: Parameters::new(),
            signed: false,
            headers: Vec::new(),
            body: None,
        }
    }

    /// Create a GET request.
    pub fn get(version: ApiVersion, endpoint: &str) -> Self {
        Self::new(Method::GET, version, endpoint)
    }

    /// Create a POST request.
    pub fn post(version: ApiVersion, endpoint: &str) -> Self {
        Self::new(Method::POST, version, endpoint)
    }

    /// Create a request from an absolute path, inferring the API version.
    pub fn from_path(method: Method, path: &str) -> Result<Self, BitfinexError> {
        let version = ApiVersion::from_path(path).ok_or_else(|| {
            BitfinexError::Configuration(format!("cannot infer API version from path {path}"))
        })?;
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };
        Ok(Self {
            method,
            version,
            path,
            params: Parameters::new(),
            signed: false,
            headers: Vec::new(),
            body: None,
        })
    }

    /// Mark the request as requiring authentication.
    pub fn signed(mut self) -> Self {
        self.signed = true;
        self
    }

    /// Set the request parameters.
    pub fn with_params(mut self, params: Parameters) -> Self {
        self.params = params;
        self
    }

    /// The HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The API version, which selects the signing scheme.
    pub fn version(&self) -> ApiVersion {
        self.version
    }

    /// The absolute request path, e.g. `/v2/auth/r/wallets`.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The caller's parameters.
    pub fn parameters(&self) -> &Parameters {
        &self.params
    }

    /// Whether the request must be authenticated.
    pub fn is_signed(&self) -> bool {
        self.signed
    }

    /// Attach a header to the outbound request.
    ///
    /// A header with the same name (compared case-insensitively, as on the
    /// wire) is replaced in place.
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .headers
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
        {
            Some(header) => *header = (name, value),
            None => self.headers.push((name, value)),
        }
    }

    /// Headers attached so far, in attachment order.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Look up an attached header by exact name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value.as_str())
    }

    /// The body recorded at signing time, if the request was authenticated.
    pub fn signed_body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    pub(crate) fn set_signed_body(&mut self, body: String) {
        self.body = Some(body);
    }

    /// The JSON body to transmit.
    ///
    /// For authenticated requests this is exactly the text that was signed.
    pub fn json_body(&self) -> String {
        match &self.body {
            Some(body) => body.clone(),
            None => self.params.to_json(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_builds_versioned_path() {
        let request = RestRequest::post(ApiVersion::V2, "auth/r/wallets");
        assert_eq!(request.path(), "/v2/auth/r/wallets");
        assert_eq!(request.method(), &Method::POST);
        assert!(!request.is_signed());

        let request = RestRequest::get(ApiVersion::V1, "/symbols");
        assert_eq!(request.path(), "/v1/symbols");
    }

    #[test]
    fn test_version_from_path() {
        assert_eq!(ApiVersion::from_path("/v1/account_infos"), Some(ApiVersion::V1));
        assert_eq!(ApiVersion::from_path("/v2/auth/r/orders"), Some(ApiVersion::V2));
        // Substring routing: v1 is checked first.
        assert_eq!(ApiVersion::from_path("/v2/auth/r/v1stats"), Some(ApiVersion::V1));
        assert_eq!(ApiVersion::from_path("/status"), None);
    }

    #[test]
    fn test_from_path() {
        let request = RestRequest::from_path(Method::POST, "v2/auth/r/positions").unwrap();
        assert_eq!(request.version(), ApiVersion::V2);
        assert_eq!(request.path(), "/v2/auth/r/positions");

        assert!(matches!(
            RestRequest::from_path(Method::GET, "/status"),
            Err(BitfinexError::Configuration(_))
        ));
    }

    #[test]
    fn test_json_body_prefers_signed_body() {
        let mut request = RestRequest::post(ApiVersion::V1, "order/status")
            .with_params(Parameters::new().with_int("order_id", 42));
        assert_eq!(request.json_body(), r#"{"order_id":42}"#);

        request.set_signed_body(r#"{"order_id":42,"nonce":"1"}"#.to_string());
        assert_eq!(request.json_body(), r#"{"order_id":42,"nonce":"1"}"#);
        assert_eq!(request.parameters().len(), 1);
    }

    #[test]
    fn test_headers() {
        let mut request = RestRequest::post(ApiVersion::V2, "auth/r/wallets");
        request.add_header("bfx-nonce", "1");
        assert_eq!(request.header("bfx-nonce"), Some("1"));
        assert_eq!(request.header("BFX-NONCE"), None);

        request.add_header("BFX-NONCE", "2");
        assert_eq!(request.headers().len(), 1);
        assert_eq!(request.header("BFX-NONCE"), Some("2"));
    }
}
