//! Server configuration (TOML).

use std::path::{Path, PathBuf};

use serde::Deserialize;

use identity::model::OAuthClientConfig;
use identity::service::IdentityConfig;

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    pub storage: StorageConfig,
    pub signing: SigningConfig,
    #[serde(default)]
    pub tokens: TokenConfig,
    /// Provider sections are optional; a missing section disables that
    /// login path.
    pub google: Option<OAuthClientConfig>,
    pub facebook: Option<OAuthClientConfig>,
}

#[derive(Debug, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
}

#[derive(Debug, Deserialize)]
pub struct SigningConfig {
    pub secret: String,
    /// Previous secrets still accepted during rotation.
    #[serde(default)]
    pub previous: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TokenConfig {
    pub guest_ttl_secs: Option<i64>,
    pub access_ttl_secs: Option<i64>,
    pub refresh_ttl_secs: Option<i64>,
}

impl ServerConfig {
    /// A bare name resolves to `/etc/polls/<name>.toml`; anything with a
    /// `/` or `.` is used as a path directly.
    pub fn resolve_path(name_or_path: &str) -> PathBuf {
        if name_or_path.contains('/') || name_or_path.contains('.') {
            PathBuf::from(name_or_path)
        } else {
            PathBuf::from(format!("/etc/polls/{}.toml", name_or_path))
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    pub fn verify(&self) -> anyhow::Result<()> {
        if self.signing.secret.is_empty() {
            anyhow::bail!("signing.secret must not be empty");
        }
        if self.storage.data_dir.is_empty() {
            anyhow::bail!("storage.data_dir must not be empty");
        }
        Ok(())
    }

    pub fn identity_config(&self) -> IdentityConfig {
        let defaults = IdentityConfig::default();
        IdentityConfig {
            signing_key: self.signing.secret.clone(),
            previous_signing_keys: self.signing.previous.clone(),
            guest_token_ttl: self.tokens.guest_ttl_secs.unwrap_or(defaults.guest_token_ttl),
            access_token_ttl: self.tokens.access_ttl_secs.unwrap_or(defaults.access_token_ttl),
            refresh_token_ttl: self
                .tokens
                .refresh_ttl_secs
                .unwrap_or(defaults.refresh_token_ttl),
            ..defaults
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn resolve_bare_name_and_path() {
        assert_eq!(
            ServerConfig::resolve_path("prod"),
            PathBuf::from("/etc/polls/prod.toml")
        );
        assert_eq!(
            ServerConfig::resolve_path("./local.toml"),
            PathBuf::from("./local.toml")
        );
    }

    #[test]
    fn load_minimal_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
            [storage]
            data_dir = "/tmp/polls"

            [signing]
            secret = "s3cret"
            previous = ["old"]

            [tokens]
            access_ttl_secs = 600

            [google]
            client_id = "cid"
            client_secret = "csec"
            redirect_uri = "https://example.com/oauth/google/callback"
            "#
        )
        .unwrap();

        let config = ServerConfig::load(file.path()).unwrap();
        config.verify().unwrap();
        assert!(config.google.is_some());
        assert!(config.facebook.is_none());

        let identity = config.identity_config();
        assert_eq!(identity.signing_key, "s3cret");
        assert_eq!(identity.previous_signing_keys, vec!["old".to_string()]);
        assert_eq!(identity.access_token_ttl, 600);
        // Unset TTLs fall back to defaults.
        assert_eq!(identity.guest_token_ttl, 86400);
    }
}
