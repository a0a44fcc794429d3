pub mod guest;
pub mod issuer;
pub mod oauth;
pub mod pending;
pub mod vote;

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::model::ProviderKind;
use crate::provider::ProviderClient;
use crate::store::{AccountStore, EntityStore, StoreError};
use crate::token::{Keyring, SignedTokenCodec, TokenError};

/// Identity protocol error taxonomy.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// No pending login state for this session: the nonce was never
    /// issued, already consumed, or timed out.
    #[error("no pending login for this session")]
    CsrfStateMissing,

    /// The returned state does not match the stored nonce.
    #[error("login state mismatch")]
    CsrfStateMismatch,

    /// The provider reported that the user denied the request, or
    /// definitively rejected the handshake.
    #[error("provider denied the login: {0}")]
    ProviderDenied(String),

    /// Transient failure talking to the provider. The caller restarts at
    /// login-begin; authorization codes are single-use upstream.
    #[error("provider exchange failed: {0}")]
    ProviderExchangeFailed(String),

    /// The email already belongs to an account on a different provider.
    /// Never resolved silently; never a merge.
    #[error("{0}")]
    ProviderConflict(String),

    #[error("token has expired")]
    TokenExpired,

    #[error("{0}")]
    TokenInvalid(String),

    /// The guest already owns a comment on this thread.
    #[error("{0}")]
    DuplicateOwnership(String),

    #[error("{0}")]
    AlreadyVoted(String),

    #[error("{0}")]
    PermissionDenied(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("storage: {0}")]
    Storage(String),

    #[error("internal: {0}")]
    Internal(String),
}

impl From<IdentityError> for polls_core::ServiceError {
    fn from(e: IdentityError) -> Self {
        use polls_core::ServiceError;
        match e {
            IdentityError::CsrfStateMissing
            | IdentityError::CsrfStateMismatch
            | IdentityError::TokenExpired => ServiceError::Unauthorized(e.to_string()),
            IdentityError::ProviderDenied(m) => ServiceError::Unauthorized(m),
            IdentityError::TokenInvalid(m) => ServiceError::Unauthorized(m),
            IdentityError::ProviderExchangeFailed(m) => ServiceError::Upstream(m),
            IdentityError::ProviderConflict(m) => ServiceError::Conflict(m),
            IdentityError::DuplicateOwnership(m) | IdentityError::AlreadyVoted(m) => {
                ServiceError::Validation(m)
            }
            IdentityError::PermissionDenied(m) => ServiceError::PermissionDenied(m),
            IdentityError::NotFound(m) => ServiceError::NotFound(m),
            IdentityError::Validation(m) => ServiceError::Validation(m),
            IdentityError::Storage(m) => ServiceError::Storage(m),
            IdentityError::Internal(m) => ServiceError::Internal(m),
        }
    }
}

impl From<TokenError> for IdentityError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Expired => IdentityError::TokenExpired,
            other => IdentityError::TokenInvalid(other.to_string()),
        }
    }
}

impl From<StoreError> for IdentityError {
    fn from(e: StoreError) -> Self {
        IdentityError::Storage(e.to_string())
    }
}

/// Configuration for the identity service.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    /// Current signing secret for all locally minted tokens.
    pub signing_key: String,
    /// Previous secrets still accepted for verification (rotation grace).
    pub previous_signing_keys: Vec<String>,
    /// Guest ownership token lifetime in seconds (default: 24h).
    /// Reset on every ownership write, so the guest window slides.
    pub guest_token_ttl: i64,
    /// Access token lifetime in seconds (default: 2h).
    pub access_token_ttl: i64,
    /// Refresh token lifetime in seconds (default: 3 days).
    pub refresh_token_ttl: i64,
    /// How long a login-begin nonce stays consumable (default: 10 min).
    pub pending_login_ttl: u64,
    /// Max-age of the advisory `voted_answers` cookie (default: 30 days).
    pub vote_cookie_max_age: i64,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            signing_key: "polls-dev-secret-change-me".to_string(),
            previous_signing_keys: Vec::new(),
            guest_token_ttl: 86400,       // 24h
            access_token_ttl: 7200,       // 2h
            refresh_token_ttl: 259200,    // 3 days
            pending_login_ttl: 600,       // 10 min
            vote_cookie_max_age: 2592000, // 30 days
        }
    }
}

/// The identity service. Holds the storage collaborators, the token
/// codec, the configured federation providers, and the in-process
/// pending-login store.
pub struct IdentityService {
    pub(crate) accounts: Arc<dyn AccountStore>,
    pub(crate) entities: Arc<dyn EntityStore>,
    pub(crate) codec: SignedTokenCodec,
    pub(crate) pending: pending::PendingLoginStore,
    pub(crate) providers: HashMap<ProviderKind, Arc<dyn ProviderClient>>,
    pub(crate) config: IdentityConfig,
}

impl IdentityService {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        entities: Arc<dyn EntityStore>,
        providers: Vec<Arc<dyn ProviderClient>>,
        config: IdentityConfig,
    ) -> Arc<Self> {
        let codec = SignedTokenCodec::new(Keyring::new(
            &config.signing_key,
            &config.previous_signing_keys,
        ));
        let pending = pending::PendingLoginStore::new(config.pending_login_ttl);
        let providers = providers.into_iter().map(|p| (p.kind(), p)).collect();

        Arc::new(Self {
            accounts,
            entities,
            codec,
            pending,
            providers,
            config,
        })
    }

    pub fn config(&self) -> &IdentityConfig {
        &self.config
    }

    pub(crate) fn provider(
        &self,
        kind: ProviderKind,
    ) -> Result<&Arc<dyn ProviderClient>, IdentityError> {
        self.providers
            .get(&kind)
            .ok_or_else(|| IdentityError::NotFound(format!("provider '{}' is not configured", kind)))
    }
}
