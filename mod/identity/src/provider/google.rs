//! Google OAuth client.
//!
//! The code exchange returns an OpenID Connect `id_token`; the identity
//! is taken from its claims after verifying the RS256 signature against
//! Google's published JWKS. The JWKS document is cached in-process and
//! refetched once when an unknown key id shows up, which covers Google's
//! key rotations without a restart.

use std::sync::RwLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{decode, decode_header, DecodingKey, Validation};
use serde::Deserialize;

use crate::model::{OAuthClientConfig, ProviderKind, ResolvedIdentity};
use crate::provider::{http_client, require_success, send_error, urlencode, ProviderClient};
use crate::service::IdentityError;

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const JWKS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";
const JWKS_TTL: Duration = Duration::from_secs(3600);

const SCOPES: &str = "openid https://www.googleapis.com/auth/userinfo.email https://www.googleapis.com/auth/userinfo.profile";

// Google issues both forms.
const ISSUERS: [&str; 2] = ["https://accounts.google.com", "accounts.google.com"];

pub struct GoogleProvider {
    config: OAuthClientConfig,
    http: reqwest::Client,
    jwks: JwksCache,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    id_token: String,
}

#[derive(Debug, Deserialize)]
struct IdClaims {
    sub: String,
    email: Option<String>,
    #[serde(default)]
    email_verified: bool,
    name: Option<String>,
}

impl GoogleProvider {
    pub fn new(config: OAuthClientConfig) -> Self {
        Self {
            config,
            http: http_client(),
            jwks: JwksCache::new(JWKS_TTL),
        }
    }

    async fn verify_id_token(&self, id_token: &str) -> Result<IdClaims, IdentityError> {
        let header = decode_header(id_token).map_err(|e| {
            IdentityError::ProviderExchangeFailed(format!("google id token header: {}", e))
        })?;
        let kid = header.kid.ok_or_else(|| {
            IdentityError::ProviderExchangeFailed("google id token has no key id".to_string())
        })?;

        let mut jwks = self.jwks.get(&self.http).await?;
        if jwks.find(&kid).is_none() {
            // Unknown kid: the cache may predate a key rotation.
            jwks = self.jwks.refresh(&self.http).await?;
        }
        let jwk = jwks.find(&kid).ok_or_else(|| {
            IdentityError::ProviderExchangeFailed(
                "google id token signed with an unpublished key".to_string(),
            )
        })?;
        let key = DecodingKey::from_jwk(jwk).map_err(|e| {
            IdentityError::ProviderExchangeFailed(format!("google jwks key unusable: {}", e))
        })?;

        let mut validation = Validation::new(header.alg);
        validation.set_audience(&[self.config.client_id.as_str()]);
        validation.set_issuer(&ISSUERS);

        let data = decode::<IdClaims>(id_token, &key, &validation).map_err(|e| {
            IdentityError::ProviderDenied(format!("google id token rejected: {}", e))
        })?;
        Ok(data.claims)
    }
}

#[async_trait]
impl ProviderClient for GoogleProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Google
    }

    fn authorize_url(&self, state: &str) -> String {
        format!(
            "{}?response_type=code&client_id={}&redirect_uri={}&scope={}&state={}&access_type=offline",
            AUTH_URL,
            urlencode(&self.config.client_id),
            urlencode(&self.config.redirect_uri),
            urlencode(SCOPES),
            urlencode(state),
        )
    }

    async fn fetch_identity(&self, code: &str) -> Result<ResolvedIdentity, IdentityError> {
        let resp = self
            .http
            .post(TOKEN_URL)
            .form(&[
                ("code", code),
                ("client_id", &self.config.client_id),
                ("client_secret", &self.config.client_secret),
                ("redirect_uri", &self.config.redirect_uri),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| send_error("google", e))?;
        let resp = require_success("google", resp).await?;

        let tokens: TokenResponse = resp
            .json()
            .await
            .map_err(|e| send_error("google", e))?;

        let claims = self.verify_id_token(&tokens.id_token).await?;
        let email = claims.email.ok_or_else(|| {
            IdentityError::Validation("google account has no email".to_string())
        })?;
        let name = claims
            .name
            .unwrap_or_else(|| email.split('@').next().unwrap_or(&email).to_string());

        Ok(ResolvedIdentity {
            subject: claims.sub,
            email,
            name,
            verified: claims.email_verified,
        })
    }
}

struct JwksCache {
    ttl: Duration,
    entry: RwLock<Option<(JwkSet, Instant)>>,
}

impl JwksCache {
    fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entry: RwLock::new(None),
        }
    }

    async fn get(&self, http: &reqwest::Client) -> Result<JwkSet, IdentityError> {
        if let Ok(entry) = self.entry.read() {
            if let Some((jwks, fetched_at)) = entry.as_ref() {
                if fetched_at.elapsed() < self.ttl {
                    return Ok(jwks.clone());
                }
            }
        }
        self.refresh(http).await
    }

    async fn refresh(&self, http: &reqwest::Client) -> Result<JwkSet, IdentityError> {
        let resp = http
            .get(JWKS_URL)
            .send()
            .await
            .map_err(|e| send_error("google jwks", e))?;
        let resp = require_success("google jwks", resp).await?;
        let jwks: JwkSet = resp
            .json()
            .await
            .map_err(|e| send_error("google jwks", e))?;

        if let Ok(mut entry) = self.entry.write() {
            *entry = Some((jwks.clone(), Instant::now()));
        }
        Ok(jwks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> GoogleProvider {
        GoogleProvider::new(OAuthClientConfig {
            client_id: "client-123".to_string(),
            client_secret: "shh".to_string(),
            redirect_uri: "https://example.com/oauth/google/callback".to_string(),
        })
    }

    #[test]
    fn authorize_url_carries_state_and_redirect() {
        let url = provider().authorize_url("nonce-1");
        assert!(url.starts_with(AUTH_URL));
        assert!(url.contains("client_id=client-123"));
        assert!(url.contains("state=nonce-1"));
        assert!(url.contains("redirect_uri=https%3A%2F%2Fexample.com%2Foauth%2Fgoogle%2Fcallback"));
        assert!(url.contains("scope=openid%20"));
        assert!(!url.contains("shh"));
    }
}
