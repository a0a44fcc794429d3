//! Guest ownership: anonymous comment authorship without accounts.
//!
//! A guest's only credential is a signed token carrying a stable guest id
//! and a map of question id to owned comment id. The token is the entire
//! record; nothing about guests is stored server-side. Losing the cookie
//! orphans the comments permanently.

use std::collections::BTreeMap;

use crate::model::{Comment, GuestClaims};
use crate::service::{IdentityError, IdentityService};
use crate::token::TokenPurpose;

impl IdentityService {
    /// Create a comment as an authenticated account. No ownership map is
    /// involved; access control happened at the token boundary.
    pub fn create_comment(&self, question_id: &str, text: &str) -> Result<Comment, IdentityError> {
        validate_text(text)?;
        Ok(self.entities.create_comment(question_id, text)?)
    }

    /// Create a comment as a guest and grant ownership of it.
    ///
    /// One comment per guest per question: if the presented token already
    /// owns a comment on this question the request is rejected and no
    /// comment row is created. The returned token has a fresh expiry.
    pub fn create_guest_comment(
        &self,
        token: Option<&str>,
        question_id: &str,
        text: &str,
    ) -> Result<(Comment, String), IdentityError> {
        validate_text(text)?;

        // A presented-but-bad token is an error, never "treat as new guest".
        // Silently reissuing would orphan the guest's prior comments.
        let claims = match token {
            Some(token) => self.decode_guest(token)?,
            None => GuestClaims {
                guest_id: polls_core::new_id(),
                owned: BTreeMap::new(),
                exp: 0,
            },
        };

        if claims.owned.contains_key(question_id) {
            return Err(IdentityError::DuplicateOwnership(format!(
                "you already commented on question '{}'",
                question_id
            )));
        }

        let comment = self.entities.create_comment(question_id, text)?;
        let token = self.issue_or_extend(claims, question_id, &comment.id)?;
        Ok((comment, token))
    }

    /// Edit a guest-owned comment. The token must own it.
    pub fn update_guest_comment(
        &self,
        token: Option<&str>,
        comment_id: &str,
        text: &str,
    ) -> Result<Comment, IdentityError> {
        validate_text(text)?;
        let claims = self.require_guest(token)?;
        self.require_ownership(&claims, comment_id)?;

        self.entities
            .update_comment_text(comment_id, text)?
            .ok_or_else(|| IdentityError::NotFound(format!("comment '{}' not found", comment_id)))
    }

    /// Delete a guest-owned comment and drop its ownership entry.
    ///
    /// Returns the re-issued token. The guest id and the original expiry
    /// are preserved: removal never extends the guest's window, and the
    /// token survives even when its ownership map becomes empty.
    pub fn delete_guest_comment(
        &self,
        token: Option<&str>,
        comment_id: &str,
    ) -> Result<String, IdentityError> {
        let claims = self.require_guest(token)?;
        self.require_ownership(&claims, comment_id)?;

        if !self.entities.delete_comment(comment_id)? {
            return Err(IdentityError::NotFound(format!(
                "comment '{}' not found",
                comment_id
            )));
        }

        let claims = remove_entry(claims, comment_id);
        Ok(self.codec.encode(&claims, TokenPurpose::Guest)?)
    }

    /// Read-path ownership probe. Absent, expired, or malformed tokens
    /// mean "not owned"; only write paths fail hard on a bad token.
    pub fn verify_ownership(&self, token: Option<&str>, comment_id: &str) -> bool {
        token
            .and_then(|t| self.decode_guest(t).ok())
            .map(|claims| claims.owns(comment_id))
            .unwrap_or(false)
    }

    /// Decode a guest token, or fail with 401 semantics when it is absent.
    pub fn require_guest(&self, token: Option<&str>) -> Result<GuestClaims, IdentityError> {
        match token {
            Some(token) => self.decode_guest(token),
            None => Err(IdentityError::TokenInvalid(
                "guest ownership token required".to_string(),
            )),
        }
    }

    /// Check that the claims own the given comment (403 semantics if not).
    pub fn require_ownership(
        &self,
        claims: &GuestClaims,
        comment_id: &str,
    ) -> Result<(), IdentityError> {
        if claims.owns(comment_id) {
            Ok(())
        } else {
            Err(IdentityError::PermissionDenied(format!(
                "comment '{}' is not owned by this guest",
                comment_id
            )))
        }
    }

    fn decode_guest(&self, token: &str) -> Result<GuestClaims, IdentityError> {
        Ok(self.codec.decode(token, TokenPurpose::Guest)?)
    }

    /// Add an ownership entry and re-sign with a fresh expiry. Every grant
    /// slides the guest's whole window forward.
    fn issue_or_extend(
        &self,
        mut claims: GuestClaims,
        question_id: &str,
        comment_id: &str,
    ) -> Result<String, IdentityError> {
        claims
            .owned
            .insert(question_id.to_string(), comment_id.to_string());
        claims.exp = chrono::Utc::now().timestamp() + self.config.guest_token_ttl;
        Ok(self.codec.encode(&claims, TokenPurpose::Guest)?)
    }
}

/// Drop the ownership entry pointing at `comment_id`. Guest id and expiry
/// stay untouched.
fn remove_entry(mut claims: GuestClaims, comment_id: &str) -> GuestClaims {
    claims.owned.retain(|_, owned| owned != comment_id);
    claims
}

fn validate_text(text: &str) -> Result<(), IdentityError> {
    if text.trim().is_empty() {
        return Err(IdentityError::Validation("text must not be empty".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::service::IdentityConfig;
    use crate::store::{EntityStore, SqliteStore};

    fn service() -> Arc<IdentityService> {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        IdentityService::new(store.clone(), store, Vec::new(), IdentityConfig::default())
    }

    fn decode(svc: &IdentityService, token: &str) -> GuestClaims {
        svc.codec.decode(token, TokenPurpose::Guest).unwrap()
    }

    #[test]
    fn first_comment_mints_a_token() {
        let svc = service();
        let (comment, token) = svc.create_guest_comment(None, "q-1", "hello").unwrap();

        let claims = decode(&svc, &token);
        assert_eq!(claims.owned.get("q-1"), Some(&comment.id));
        assert!(claims.owns(&comment.id));
        assert!(claims.exp > chrono::Utc::now().timestamp());
    }

    #[test]
    fn second_question_reuses_the_guest_id() {
        let svc = service();
        let (_, token) = svc.create_guest_comment(None, "q-1", "one").unwrap();
        let first = decode(&svc, &token);

        let (c2, token) = svc.create_guest_comment(Some(&token), "q-2", "two").unwrap();
        let second = decode(&svc, &token);

        assert_eq!(second.guest_id, first.guest_id);
        assert_eq!(second.owned.len(), 2);
        assert_eq!(second.owned.get("q-2"), Some(&c2.id));
    }

    #[test]
    fn duplicate_ownership_creates_no_comment_and_keeps_the_entry() {
        let svc = service();
        let (first, token) = svc.create_guest_comment(None, "q-1", "one").unwrap();

        let err = svc
            .create_guest_comment(Some(&token), "q-1", "again")
            .unwrap_err();
        assert!(matches!(err, IdentityError::DuplicateOwnership(_)));

        // The original mapping is untouched and the original comment intact.
        let claims = decode(&svc, &token);
        assert_eq!(claims.owned.get("q-1"), Some(&first.id));
        assert!(svc.entities.get_comment(&first.id).unwrap().is_some());
    }

    #[test]
    fn invalid_token_is_never_treated_as_a_new_guest() {
        let svc = service();
        let err = svc
            .create_guest_comment(Some("not-a-token"), "q-1", "hi")
            .unwrap_err();
        assert!(matches!(err, IdentityError::TokenInvalid(_)));
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let svc = service();
        let claims = GuestClaims {
            guest_id: "g-1".to_string(),
            owned: BTreeMap::new(),
            // Beyond the verifier's leeway.
            exp: chrono::Utc::now().timestamp() - 300,
        };
        let stale = svc.codec.encode(&claims, TokenPurpose::Guest).unwrap();

        let err = svc
            .create_guest_comment(Some(&stale), "q-1", "hi")
            .unwrap_err();
        assert!(matches!(err, IdentityError::TokenExpired));
    }

    #[test]
    fn update_requires_ownership() {
        let svc = service();
        let (comment, owner_token) = svc.create_guest_comment(None, "q-1", "mine").unwrap();
        let (_, stranger_token) = svc.create_guest_comment(None, "q-2", "other").unwrap();

        let err = svc
            .update_guest_comment(Some(&stranger_token), &comment.id, "hijack")
            .unwrap_err();
        assert!(matches!(err, IdentityError::PermissionDenied(_)));

        let updated = svc
            .update_guest_comment(Some(&owner_token), &comment.id, "edited")
            .unwrap();
        assert_eq!(updated.comment_text, "edited");
    }

    #[test]
    fn update_without_token_is_unauthorized() {
        let svc = service();
        let (comment, _) = svc.create_guest_comment(None, "q-1", "mine").unwrap();
        let err = svc.update_guest_comment(None, &comment.id, "x").unwrap_err();
        assert!(matches!(err, IdentityError::TokenInvalid(_)));
    }

    #[test]
    fn delete_preserves_guest_id_and_expiry() {
        let svc = service();
        let (comment, token) = svc.create_guest_comment(None, "q-1", "mine").unwrap();
        let before = decode(&svc, &token);

        let token = svc.delete_guest_comment(Some(&token), &comment.id).unwrap();
        let after = decode(&svc, &token);

        assert_eq!(after.guest_id, before.guest_id);
        assert_eq!(after.exp, before.exp);
        assert!(after.owned.is_empty());
        assert!(svc.entities.get_comment(&comment.id).unwrap().is_none());
    }

    #[test]
    fn emptied_token_can_comment_again_on_the_same_question() {
        let svc = service();
        let (comment, token) = svc.create_guest_comment(None, "q-1", "first").unwrap();
        let token = svc.delete_guest_comment(Some(&token), &comment.id).unwrap();

        let (second, token) = svc
            .create_guest_comment(Some(&token), "q-1", "second")
            .unwrap();
        let claims = decode(&svc, &token);
        assert_eq!(claims.owned.get("q-1"), Some(&second.id));
    }

    #[test]
    fn deleting_a_missing_comment_is_not_found() {
        let svc = service();
        let (comment, token) = svc.create_guest_comment(None, "q-1", "mine").unwrap();
        let token = svc.delete_guest_comment(Some(&token), &comment.id).unwrap();

        // Token no longer owns it, so the second delete fails on ownership.
        let err = svc.delete_guest_comment(Some(&token), &comment.id).unwrap_err();
        assert!(matches!(err, IdentityError::PermissionDenied(_)));
    }

    #[test]
    fn read_path_ownership_fails_open() {
        let svc = service();
        let (comment, token) = svc.create_guest_comment(None, "q-1", "mine").unwrap();

        assert!(svc.verify_ownership(Some(&token), &comment.id));
        assert!(!svc.verify_ownership(Some(&token), "someone-elses"));
        assert!(!svc.verify_ownership(Some("garbage"), &comment.id));
        assert!(!svc.verify_ownership(None, &comment.id));
    }

    #[test]
    fn empty_text_is_rejected() {
        let svc = service();
        let err = svc.create_guest_comment(None, "q-1", "   ").unwrap_err();
        assert!(matches!(err, IdentityError::Validation(_)));
    }
}
