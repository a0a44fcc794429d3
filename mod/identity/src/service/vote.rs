//! Vote deduplication.
//!
//! Guests carry their vote history in a plain unsigned cookie; it is
//! advisory, best-effort dedup only, and the server never trusts it for
//! anything but "did this browser already vote here". Authenticated
//! accounts get durable dedup backed by a uniqueness constraint, so a
//! signed-in user cannot double-vote by clearing cookies.

use std::collections::BTreeSet;

use crate::service::{IdentityError, IdentityService};

impl IdentityService {
    /// Vote on an answer as a guest. `voted` is the answer id set from the
    /// browser's vote-history cookie. Returns the new vote count and the
    /// updated set to write back.
    pub fn vote_as_guest(
        &self,
        answer_id: &str,
        voted: &BTreeSet<String>,
    ) -> Result<(i64, BTreeSet<String>), IdentityError> {
        if voted.contains(answer_id) {
            return Err(IdentityError::AlreadyVoted(format!(
                "already voted on answer '{}'",
                answer_id
            )));
        }

        let votes = self
            .entities
            .increment_vote(answer_id)?
            .ok_or_else(|| IdentityError::NotFound(format!("answer '{}' not found", answer_id)))?;

        let mut voted = voted.clone();
        voted.insert(answer_id.to_string());
        Ok((votes, voted))
    }

    /// Vote on an answer as an authenticated account. The durable vote
    /// record is claimed before the counter moves, so two concurrent votes
    /// from the same account bump the counter exactly once.
    pub fn vote_as_account(&self, account_id: &str, answer_id: &str) -> Result<i64, IdentityError> {
        if !self.entities.record_account_vote(account_id, answer_id)? {
            return Err(IdentityError::AlreadyVoted(format!(
                "already voted on answer '{}'",
                answer_id
            )));
        }

        self.entities
            .increment_vote(answer_id)?
            .ok_or_else(|| IdentityError::NotFound(format!("answer '{}' not found", answer_id)))
    }
}

/// Parse the vote-history cookie value (comma-separated answer ids).
/// Unparseable fragments are dropped silently; the cookie is advisory.
pub fn parse_voted_cookie(value: Option<&str>) -> BTreeSet<String> {
    value
        .unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Serialize the vote-history set back into cookie form.
pub fn format_voted_cookie(voted: &BTreeSet<String>) -> String {
    voted.iter().cloned().collect::<Vec<_>>().join(",")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::service::{IdentityConfig, IdentityService};
    use crate::store::{EntityStore, SqliteStore};

    fn service_with_answer() -> (Arc<IdentityService>, String) {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let answer = store.create_answer("q-1", "forty-two").unwrap();
        let svc = IdentityService::new(store.clone(), store, Vec::new(), IdentityConfig::default());
        (svc, answer.id)
    }

    #[test]
    fn guest_vote_bumps_and_records() {
        let (svc, answer_id) = service_with_answer();
        let voted = BTreeSet::new();

        let (votes, voted) = svc.vote_as_guest(&answer_id, &voted).unwrap();
        assert_eq!(votes, 1);
        assert!(voted.contains(&answer_id));

        let err = svc.vote_as_guest(&answer_id, &voted).unwrap_err();
        assert!(matches!(err, IdentityError::AlreadyVoted(_)));
    }

    #[test]
    fn guest_vote_on_missing_answer_is_not_found() {
        let (svc, _) = service_with_answer();
        let err = svc.vote_as_guest("missing", &BTreeSet::new()).unwrap_err();
        assert!(matches!(err, IdentityError::NotFound(_)));
    }

    #[test]
    fn account_vote_is_durable_across_cookie_loss() {
        let (svc, answer_id) = service_with_answer();

        assert_eq!(svc.vote_as_account("acc-1", &answer_id).unwrap(), 1);

        // No cookie involved: the second attempt hits the durable record.
        let err = svc.vote_as_account("acc-1", &answer_id).unwrap_err();
        assert!(matches!(err, IdentityError::AlreadyVoted(_)));

        // A different account still counts.
        assert_eq!(svc.vote_as_account("acc-2", &answer_id).unwrap(), 2);
    }

    #[test]
    fn cookie_round_trip() {
        let voted = parse_voted_cookie(Some("a1, a2,,a3"));
        assert_eq!(voted.len(), 3);
        assert_eq!(format_voted_cookie(&voted), "a1,a2,a3");

        assert!(parse_voted_cookie(None).is_empty());
        assert!(parse_voted_cookie(Some("")).is_empty());
    }
}
