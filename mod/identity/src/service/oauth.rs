//! Federated login flow.
//!
//! Begin issues a state nonce bound to the caller's session and returns
//! the provider authorize URL. Callback consumes the nonce before doing
//! anything else, exchanges the code through the provider client, and
//! resolves the external identity to a local account keyed by email.

use tracing::info;

use crate::model::{
    Account, AuthProvider, CallbackParams, NewAccount, ProviderKind, ResolvedIdentity, TokenPair,
};
use crate::service::{IdentityError, IdentityService};

impl IdentityService {
    /// Start a login attempt. Returns the provider URL to redirect the
    /// user agent to. Any earlier pending login for this session is
    /// replaced.
    pub fn begin_login(
        &self,
        kind: ProviderKind,
        session_id: &str,
    ) -> Result<String, IdentityError> {
        let provider = self.provider(kind)?;
        let state = polls_core::new_id();
        let url = provider.authorize_url(&state);
        self.pending.insert(session_id, state, kind);
        Ok(url)
    }

    /// Finish a login attempt from the provider callback.
    ///
    /// A provider `error` param fails the attempt immediately, before the
    /// nonce is even looked up, so a denial reports as a denial whether or
    /// not pending state exists. Every other outcome consumes the nonce
    /// first; either way the attempt is over and replaying the same
    /// callback finds nothing.
    pub async fn complete_login(
        &self,
        kind: ProviderKind,
        session_id: &str,
        params: &CallbackParams,
    ) -> Result<TokenPair, IdentityError> {
        if let Some(error) = &params.error {
            // The attempt is over; burn any pending nonce.
            let _ = self.pending.take(session_id);
            return Err(IdentityError::ProviderDenied(format!(
                "login cancelled: {}",
                error
            )));
        }

        let pending = self
            .pending
            .take(session_id)
            .ok_or(IdentityError::CsrfStateMissing)?;

        let state = params.state.as_deref().unwrap_or("");
        if pending.provider != kind || pending.state != state {
            return Err(IdentityError::CsrfStateMismatch);
        }

        let code = params
            .code
            .as_deref()
            .ok_or_else(|| IdentityError::Validation("missing authorization code".to_string()))?;

        let provider = self.provider(kind)?;
        let identity = provider.fetch_identity(code).await?;
        let account = self.resolve_account(kind, &identity)?;
        self.issue_tokens(&account)
    }

    /// Map an external identity onto a local account, keyed by email.
    /// First login creates the account; later logins must come through
    /// the same provider.
    fn resolve_account(
        &self,
        kind: ProviderKind,
        identity: &ResolvedIdentity,
    ) -> Result<Account, IdentityError> {
        let expected: AuthProvider = kind.into();

        if let Some(account) = self.accounts.find_by_email(&identity.email)? {
            return self.admit_existing(account, expected, identity);
        }

        let inserted = self.accounts.insert_if_absent(NewAccount {
            email: identity.email.clone(),
            username: identity.name.clone(),
            secret: identity.subject.clone(),
            auth_provider: expected,
            // An unverified email starts inactive until the provider
            // vouches for it on a later login.
            is_active: identity.verified,
        })?;

        match inserted {
            Some(account) => {
                info!(account = %account.id, provider = %kind, "created account via federation");
                Ok(account)
            }
            // Lost a first-login race; the winner's row is authoritative.
            None => {
                let account = self.accounts.find_by_email(&identity.email)?.ok_or_else(|| {
                    IdentityError::Internal("account vanished after insert conflict".to_string())
                })?;
                self.admit_existing(account, expected, identity)
            }
        }
    }

    fn admit_existing(
        &self,
        mut account: Account,
        expected: AuthProvider,
        identity: &ResolvedIdentity,
    ) -> Result<Account, IdentityError> {
        if account.auth_provider != expected {
            return Err(IdentityError::ProviderConflict(format!(
                "email '{}' is already registered via {}",
                account.email, account.auth_provider
            )));
        }

        if !account.is_active && identity.verified {
            self.accounts.set_active(&account.id, true)?;
            account.is_active = true;
            info!(account = %account.id, "activated account on verified login");
        }

        Ok(account)
    }
}
