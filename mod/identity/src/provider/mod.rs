//! Federation provider clients.
//!
//! Each provider implements the same two-step contract: build an
//! authorize URL carrying the caller's state nonce, then exchange the
//! returned code for a verified external identity. Provider credentials
//! never leave this layer; the flow above only ever sees a
//! [`ResolvedIdentity`].

pub mod facebook;
pub mod google;

pub use facebook::FacebookProvider;
pub use google::GoogleProvider;

use async_trait::async_trait;

use crate::model::{ProviderKind, ResolvedIdentity};
use crate::service::IdentityError;

#[async_trait]
pub trait ProviderClient: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// The provider's authorization URL for redirecting the user agent,
    /// with the state nonce embedded.
    fn authorize_url(&self, state: &str) -> String;

    /// Exchange an authorization code for the external identity. The code
    /// is single-use upstream; on transient failure the whole login
    /// restarts from the beginning.
    async fn fetch_identity(&self, code: &str) -> Result<ResolvedIdentity, IdentityError>;
}

/// Percent-encode a query component (unreserved characters pass through).
pub(crate) fn urlencode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

/// Shared HTTP client with a bounded per-request timeout. A hung
/// provider must fail the login, not the worker.
pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(10))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

pub(crate) fn send_error(provider: &str, e: reqwest::Error) -> IdentityError {
    IdentityError::ProviderExchangeFailed(format!("{}: {}", provider, e))
}

/// Map a non-2xx provider response. Client errors are definitive
/// rejections; server errors are transient.
pub(crate) async fn require_success(
    provider: &str,
    resp: reqwest::Response,
) -> Result<reqwest::Response, IdentityError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let snippet: String = body.chars().take(200).collect();
    if status.is_client_error() {
        Err(IdentityError::ProviderDenied(format!(
            "{} rejected the exchange ({}): {}",
            provider, status, snippet
        )))
    } else {
        Err(IdentityError::ProviderExchangeFailed(format!(
            "{} returned {}: {}",
            provider, status, snippet
        )))
    }
}
