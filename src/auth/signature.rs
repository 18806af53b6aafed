//! HMAC-SHA384 signature generation for Bitfinex API authentication.
//!
//! Both API generations sign with HMAC-SHA384 keyed by the raw API secret and
//! send the digest as lowercase hex. They differ in what is signed:
//!
//! ```text
//! v1: payload = base64(json(params + request + nonce))
//!     signature = HMAC-SHA384(payload, secret)
//! v2: signature = HMAC-SHA384("/api" + path + nonce + json(params), secret)
//! ```

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use hmac::{Hmac, Mac};
use reqwest::Method;
use sha2::Sha384;

use crate::auth::Credentials;
use crate::error::BitfinexError;
use crate::types::{ApiVersion, Parameters, RestRequest};

type HmacSha384 = Hmac<Sha384>;

/// Authentication header names, case-sensitive as the exchange expects them.
pub mod headers {
    /// v1 API key header.
    pub const V1_API_KEY: &str = "X-BFX-APIKEY";
    /// v1 base64 payload header.
    pub const V1_PAYLOAD: &str = "X-BFX-PAYLOAD";
    /// v1 signature header.
    pub const V1_SIGNATURE: &str = "X-BFX-SIGNATURE";

    /// v2 API key header.
    pub const V2_API_KEY: &str = "bfx-apikey";
    /// v2 nonce header.
    pub const V2_NONCE: &str = "bfx-nonce";
    /// v2 signature header.
    pub const V2_SIGNATURE: &str = "bfx-signature";
}

/// Sign a message with HMAC-SHA384.
///
/// # Returns
///
/// The lowercase hex digest (96 characters).
///
/// # Example
///
/// ```rust
/// use bitfinex_api_client::auth::sign_hmac_sha384;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let signature = sign_hmac_sha384("SomeTestString", b"TestSecret")?;
/// assert_eq!(signature.len(), 96);
/// # Ok(())
/// # }
/// ```
pub fn sign_hmac_sha384(message: &str, secret: &[u8]) -> Result<String, BitfinexError> {
    let mut hmac = HmacSha384::new_from_slice(secret)
        .map_err(|e| BitfinexError::Configuration(format!("Invalid HMAC key: {e}")))?;
    hmac.update(message.as_bytes());
    Ok(hex::encode(hmac.finalize().into_bytes()))
}

/// Everything needed to sign one request.
///
/// Built fresh for every attempt and never cached.
#[derive(Debug, Clone, Copy)]
pub struct SigningContext<'a> {
    /// Signing scheme selector
    pub version: ApiVersion,
    /// HTTP method (not part of either base string)
    pub method: &'a Method,
    /// Absolute request path, e.g. `/v2/auth/r/wallets`
    pub path: &'a str,
    /// The caller's parameters
    pub params: &'a Parameters,
    /// Nonce drawn for this attempt
    pub nonce: u64,
}

impl<'a> SigningContext<'a> {
    /// Build a context for a request and a freshly drawn nonce.
    pub fn for_request(request: &'a RestRequest, nonce: u64) -> Self {
        Self {
            version: request.version(),
            method: request.method(),
            path: request.path(),
            params: request.parameters(),
            nonce,
        }
    }

    /// Sign with the scheme selected by the API version.
    pub fn sign(&self, credentials: &Credentials) -> Result<SignedRequest, BitfinexError> {
        match self.version {
            ApiVersion::V1 => sign_v1(self, credentials),
            ApiVersion::V2 => sign_v2(self, credentials),
        }
    }
}

/// The output of signing: headers to attach and the body that was signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    /// Authentication headers, in the order they are attached
    pub headers: Vec<(&'static str, String)>,
    /// The JSON body that must be transmitted unchanged
    pub body: String,
}

/// Build the v1 JSON body: the caller's parameters followed by `request` and `nonce`.
///
/// The parameters are copied; the caller's set is not modified.
pub fn v1_body(path: &str, nonce: u64, params: &Parameters) -> String {
    let mut signed = params.clone();
    signed.insert_str("request", path);
    signed.insert_str("nonce", nonce.to_string());
    signed.to_json()
}

/// Build the v2 signing message.
pub fn v2_message(path: &str, nonce: u64, body: &str) -> String {
    format!("/api{path}{nonce}{body}")
}

fn sign_v1(
    context: &SigningContext<'_>,
    credentials: &Credentials,
) -> Result<SignedRequest, BitfinexError> {
    let body = v1_body(context.path, context.nonce, context.params);
    let payload = BASE64.encode(body.as_bytes());
    let signature = sign_hmac_sha384(&payload, credentials.expose_secret().as_bytes())?;

    Ok(SignedRequest {
        headers: vec![
            (headers::V1_API_KEY, credentials.api_key().to_string()),
            (headers::V1_PAYLOAD, payload),
            (headers::V1_SIGNATURE, signature),
        ],
        body,
    })
}

fn sign_v2(
    context: &SigningContext<'_>,
    credentials: &Credentials,
) -> Result<SignedRequest, BitfinexError> {
    let body = context.params.to_json();
    let nonce = context.nonce.to_string();
    let message = v2_message(context.path, context.nonce, &body);
    let signature = sign_hmac_sha384(&message, credentials.expose_secret().as_bytes())?;

    Ok(SignedRequest {
        headers: vec![
            (headers::V2_API_KEY, credentials.api_key().to_string()),
            (headers::V2_NONCE, nonce),
            (headers::V2_SIGNATURE, signature),
        ],
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const NONCE: u64 = 1_700_000_000_000_000;

    fn credentials() -> Credentials {
        Credentials::new("TestKey", "TestSecret").unwrap()
    }

    #[test]
    fn test_known_signature_vector() {
        let signature = sign_hmac_sha384("SomeTestString", b"TestSecret").unwrap();
        assert_eq!(
            signature,
            "9052c73092b21b945bc5859cadba6a5658e142f021fcb092a72f68e8a0d5e6351cfebae52db9067d4360f796cb520960"
        );
    }

    #[test]
    fn test_signature_consistency() {
        let sig1 = sign_hmac_sha384("payload", b"my_secret").unwrap();
        let sig2 = sign_hmac_sha384("payload", b"my_secret").unwrap();
        assert_eq!(sig1, sig2);
        assert_ne!(sig1, sign_hmac_sha384("payload", b"other_secret").unwrap());
    }

    #[test]
    fn test_v1_signing() {
        let request = RestRequest::post(ApiVersion::V1, "account_infos").signed();
        let signed = SigningContext::for_request(&request, NONCE)
            .sign(&credentials())
            .unwrap();

        assert_eq!(
            signed.body,
            r#"{"request":"/v1/account_infos","nonce":"1700000000000000"}"#
        );
        assert_eq!(
            signed.headers,
            vec![
                (headers::V1_API_KEY, "TestKey".to_string()),
                (
                    headers::V1_PAYLOAD,
                    "eyJyZXF1ZXN0IjoiL3YxL2FjY291bnRfaW5mb3MiLCJub25jZSI6IjE3MDAwMDAwMDAwMDAwMDAifQ=="
                        .to_string()
                ),
                (
                    headers::V1_SIGNATURE,
                    "6893bad651a938e96dcd85a6736a471286e2bdce2fffad460c8d0231cc3b39c50a6b0db801d5d01603b584167267de1f"
                        .to_string()
                ),
            ]
        );
    }

    #[test]
    fn test_v1_body_leaves_caller_params_untouched() {
        let params = Parameters::new().with_int("order_id", 7);
        let body = v1_body("/v1/order/status", 5, &params);

        assert_eq!(
            body,
            r#"{"order_id":7,"request":"/v1/order/status","nonce":"5"}"#
        );
        assert_eq!(params.len(), 1);
        assert!(params.get("nonce").is_none());
    }

    #[test]
    fn test_v2_signing() {
        let request = RestRequest::post(ApiVersion::V2, "auth/r/wallets").signed();
        let signed = SigningContext::for_request(&request, NONCE)
            .sign(&credentials())
            .unwrap();

        assert_eq!(signed.body, "{}");
        assert_eq!(
            signed.headers,
            vec![
                (headers::V2_API_KEY, "TestKey".to_string()),
                (headers::V2_NONCE, "1700000000000000".to_string()),
                (
                    headers::V2_SIGNATURE,
                    "bb280411db840e99a896dc12515d76e74da836b4d98dac06833081a71c1fc453f4af49a4012a10448102c66962aa846d"
                        .to_string()
                ),
            ]
        );
    }

    #[test]
    fn test_v2_message_layout() {
        assert_eq!(
            v2_message("/v2/auth/w/order/submit", 12345, r#"{"type":"LIMIT"}"#),
            r#"/api/v2/auth/w/order/submit12345{"type":"LIMIT"}"#
        );
    }

    #[test]
    fn test_signature_changes_with_nonce() {
        let request = RestRequest::post(ApiVersion::V2, "auth/r/orders").signed();
        let first = SigningContext::for_request(&request, 1)
            .sign(&credentials())
            .unwrap();
        let second = SigningContext::for_request(&request, 2)
            .sign(&credentials())
            .unwrap();
        assert_ne!(first.headers[2], second.headers[2]);
    }

    #[test]
    fn test_signature_is_lowercase_hex() {
        let request = RestRequest::post(ApiVersion::V2, "auth/r/positions").signed();
        let signed = SigningContext::for_request(&request, NONCE)
            .sign(&credentials())
            .unwrap();
        let signature = &signed.headers[2].1;
        assert_eq!(signature.len(), 96);
        assert!(signature.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }
}
