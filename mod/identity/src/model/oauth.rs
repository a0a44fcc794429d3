use std::time::Instant;

use serde::Deserialize;

use crate::model::AuthProvider;

/// The external identity providers a client can federate through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Google,
    Facebook,
}

impl ProviderKind {
    /// Parse the `{provider}` path segment.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "google" => Some(ProviderKind::Google),
            "facebook" => Some(ProviderKind::Facebook),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Google => "google",
            ProviderKind::Facebook => "facebook",
        }
    }
}

impl From<ProviderKind> for AuthProvider {
    fn from(kind: ProviderKind) -> Self {
        match kind {
            ProviderKind::Google => AuthProvider::Google,
            ProviderKind::Facebook => AuthProvider::Facebook,
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server-held single-use nonce for one login attempt. Created at
/// login-begin, consumed (read-then-deleted) exactly once at callback.
#[derive(Debug, Clone)]
pub struct PendingLogin {
    pub state: String,
    pub provider: ProviderKind,
    pub created_at: Instant,
}

/// Query parameters the provider sends back to the callback endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    /// Set when the user denied the consent screen.
    #[serde(default)]
    pub error: Option<String>,
}

/// Identity resolved from a provider after code exchange.
#[derive(Debug, Clone)]
pub struct ResolvedIdentity {
    /// Provider-scoped subject id.
    pub subject: String,
    pub email: String,
    /// Display name from the provider profile.
    pub name: String,
    /// Whether the provider vouches for the email.
    pub verified: bool,
}

/// Client credentials for one OAuth provider.
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthClientConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}
