//! Local auth token issuance.
//!
//! After a federated login resolves to an account, all further proof of
//! identity is a locally minted access/refresh pair. Provider tokens are
//! used once during the handshake and never stored or re-verified.

use crate::model::{AccessClaims, Account, TokenPair};
use crate::service::{IdentityError, IdentityService};
use crate::token::TokenPurpose;

impl IdentityService {
    /// Mint a fresh access/refresh pair for the account.
    pub fn issue_tokens(&self, account: &Account) -> Result<TokenPair, IdentityError> {
        let now = chrono::Utc::now().timestamp();

        let access = AccessClaims {
            sub: account.id.clone(),
            email: account.email.clone(),
            username: account.username.clone(),
            iat: now,
            exp: now + self.config.access_token_ttl,
        };
        let refresh = AccessClaims {
            exp: now + self.config.refresh_token_ttl,
            ..access.clone()
        };

        Ok(TokenPair {
            access_token: self.codec.encode(&access, TokenPurpose::Access)?,
            refresh_token: self.codec.encode(&refresh, TokenPurpose::Refresh)?,
            token_type: "Bearer".to_string(),
            expires_in: self.config.access_token_ttl,
        })
    }

    /// Verify a bearer access token and return its claims.
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, IdentityError> {
        Ok(self.codec.decode(token, TokenPurpose::Access)?)
    }

    /// Exchange a refresh token for a fresh pair. The account is re-read
    /// so a deactivated account stops refreshing immediately.
    pub fn refresh_tokens(&self, refresh_token: &str) -> Result<TokenPair, IdentityError> {
        let claims: AccessClaims = self.codec.decode(refresh_token, TokenPurpose::Refresh)?;

        let account = self
            .accounts
            .find_by_id(&claims.sub)?
            .ok_or_else(|| IdentityError::TokenInvalid("account no longer exists".to_string()))?;

        if !account.is_active {
            return Err(IdentityError::PermissionDenied(
                "account is deactivated".to_string(),
            ));
        }

        self.issue_tokens(&account)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::model::{AuthProvider, NewAccount};
    use crate::service::IdentityConfig;
    use crate::store::{AccountStore, SqliteStore};

    fn service_with_account() -> (Arc<IdentityService>, Account) {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let account = store
            .insert_if_absent(NewAccount {
                email: "a@example.com".to_string(),
                username: "Alice".to_string(),
                secret: "sub-123".to_string(),
                auth_provider: AuthProvider::Google,
                is_active: true,
            })
            .unwrap()
            .unwrap();
        let svc = IdentityService::new(store.clone(), store, Vec::new(), IdentityConfig::default());
        (svc, account)
    }

    #[test]
    fn access_token_round_trip() {
        let (svc, account) = service_with_account();
        let pair = svc.issue_tokens(&account).unwrap();
        assert_eq!(pair.token_type, "Bearer");
        assert_eq!(pair.expires_in, svc.config().access_token_ttl);

        let claims = svc.verify_access(&pair.access_token).unwrap();
        assert_eq!(claims.sub, account.id);
        assert_eq!(claims.email, "a@example.com");
        assert_eq!(claims.exp - claims.iat, svc.config().access_token_ttl);
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        let (svc, account) = service_with_account();
        let pair = svc.issue_tokens(&account).unwrap();

        let err = svc.verify_access(&pair.refresh_token).unwrap_err();
        assert!(matches!(err, IdentityError::TokenInvalid(_)));
    }

    #[test]
    fn refresh_issues_a_new_pair() {
        let (svc, account) = service_with_account();
        let pair = svc.issue_tokens(&account).unwrap();

        let renewed = svc.refresh_tokens(&pair.refresh_token).unwrap();
        let claims = svc.verify_access(&renewed.access_token).unwrap();
        assert_eq!(claims.sub, account.id);
    }

    #[test]
    fn refresh_with_access_token_is_rejected() {
        let (svc, account) = service_with_account();
        let pair = svc.issue_tokens(&account).unwrap();

        let err = svc.refresh_tokens(&pair.access_token).unwrap_err();
        assert!(matches!(err, IdentityError::TokenInvalid(_)));
    }

    #[test]
    fn deactivated_account_cannot_refresh() {
        let (svc, account) = service_with_account();
        let pair = svc.issue_tokens(&account).unwrap();

        svc.accounts.set_active(&account.id, false).unwrap();
        let err = svc.refresh_tokens(&pair.refresh_token).unwrap_err();
        assert!(matches!(err, IdentityError::PermissionDenied(_)));
    }
}
