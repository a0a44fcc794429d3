//! Facebook OAuth client.
//!
//! Facebook has no OpenID Connect layer here: the code is exchanged for
//! an access token, and the identity comes from a Graph API profile
//! lookup over TLS. Only confirmed emails are returned by the API, so a
//! resolved Facebook identity always counts as verified.

use async_trait::async_trait;
use serde::Deserialize;

use crate::model::{OAuthClientConfig, ProviderKind, ResolvedIdentity};
use crate::provider::{http_client, require_success, send_error, urlencode, ProviderClient};
use crate::service::IdentityError;

const AUTH_URL: &str = "https://www.facebook.com/v10.0/dialog/oauth";
const TOKEN_URL: &str = "https://graph.facebook.com/v10.0/oauth/access_token";
const PROFILE_URL: &str = "https://graph.facebook.com/me";

pub struct FacebookProvider {
    config: OAuthClientConfig,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct Profile {
    id: String,
    name: Option<String>,
    email: Option<String>,
}

impl FacebookProvider {
    pub fn new(config: OAuthClientConfig) -> Self {
        Self {
            config,
            http: http_client(),
        }
    }
}

#[async_trait]
impl ProviderClient for FacebookProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Facebook
    }

    fn authorize_url(&self, state: &str) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&scope=email&response_type=code&state={}",
            AUTH_URL,
            urlencode(&self.config.client_id),
            urlencode(&self.config.redirect_uri),
            urlencode(state),
        )
    }

    async fn fetch_identity(&self, code: &str) -> Result<ResolvedIdentity, IdentityError> {
        let resp = self
            .http
            .get(TOKEN_URL)
            .query(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("code", code),
            ])
            .send()
            .await
            .map_err(|e| send_error("facebook", e))?;
        let resp = require_success("facebook", resp).await?;
        let tokens: TokenResponse = resp
            .json()
            .await
            .map_err(|e| send_error("facebook", e))?;

        let resp = self
            .http
            .get(PROFILE_URL)
            .query(&[
                ("fields", "id,name,email"),
                ("access_token", tokens.access_token.as_str()),
            ])
            .send()
            .await
            .map_err(|e| send_error("facebook", e))?;
        let resp = require_success("facebook", resp).await?;
        let profile: Profile = resp
            .json()
            .await
            .map_err(|e| send_error("facebook", e))?;

        // Accounts registered by phone number have no email to key on.
        let email = profile.email.ok_or_else(|| {
            IdentityError::Validation("facebook account has no email".to_string())
        })?;
        let name = profile
            .name
            .unwrap_or_else(|| email.split('@').next().unwrap_or(&email).to_string());

        Ok(ResolvedIdentity {
            subject: profile.id,
            email,
            name,
            verified: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorize_url_carries_state_and_scope() {
        let provider = FacebookProvider::new(OAuthClientConfig {
            client_id: "fb-client".to_string(),
            client_secret: "shh".to_string(),
            redirect_uri: "https://example.com/oauth/facebook/callback".to_string(),
        });

        let url = provider.authorize_url("nonce-9");
        assert!(url.starts_with(AUTH_URL));
        assert!(url.contains("client_id=fb-client"));
        assert!(url.contains("scope=email"));
        assert!(url.contains("state=nonce-9"));
        assert!(url.contains("redirect_uri=https%3A%2F%2Fexample.com%2Foauth%2Ffacebook%2Fcallback"));
        assert!(!url.contains("shh"));
    }
}
