use serde::{Deserialize, Serialize};

/// How an account authenticates. An email maps to exactly one provider;
/// an account created by one provider can never log in through another
/// (that is a conflict, never a merge).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthProvider {
    /// Local email + password registration.
    #[serde(rename = "App auth")]
    AppAuth,
    #[serde(rename = "Google")]
    Google,
    #[serde(rename = "Facebook")]
    Facebook,
}

impl AuthProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthProvider::AppAuth => "App auth",
            AuthProvider::Google => "Google",
            AuthProvider::Facebook => "Facebook",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "App auth" => Some(AuthProvider::AppAuth),
            "Google" => Some(AuthProvider::Google),
            "Facebook" => Some(AuthProvider::Facebook),
            _ => None,
        }
    }
}

impl std::fmt::Display for AuthProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An account identity record.
#[derive(Debug, Clone, Serialize)]
pub struct Account {
    /// Unique identifier (UUIDv4, no dashes).
    pub id: String,

    /// Email address. Unique across all accounts.
    pub email: String,

    /// Display username. For federated accounts this derives from the
    /// provider's profile name.
    pub username: String,

    /// Password-equivalent secret. For federated accounts this is the
    /// provider subject id. Never serialized into responses.
    #[serde(skip_serializing)]
    pub secret: String,

    /// The single provider this account authenticates through.
    pub auth_provider: AuthProvider,

    /// Inactive accounts exist but have not confirmed their identity.
    pub is_active: bool,

    pub is_staff: bool,

    /// RFC 3339 creation timestamp.
    pub created_at: String,
}

/// Input for creating an account during first federated login.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub username: String,
    pub secret: String,
    pub auth_provider: AuthProvider,
    pub is_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_round_trip() {
        for p in [AuthProvider::AppAuth, AuthProvider::Google, AuthProvider::Facebook] {
            assert_eq!(AuthProvider::parse(p.as_str()), Some(p));
        }
        assert_eq!(AuthProvider::parse("Github"), None);
    }
}
