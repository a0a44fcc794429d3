use serde::{Deserialize, Serialize};

/// Claims of a locally minted access or refresh token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject: account id.
    pub sub: String,

    pub email: String,

    pub username: String,

    /// Issued at (unix seconds).
    pub iat: i64,

    /// Absolute expiry (unix seconds).
    pub exp: i64,
}

/// Request body for token refresh.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Token pair returned after federated login or refresh.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}
