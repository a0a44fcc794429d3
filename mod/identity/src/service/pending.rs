use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use crate::model::{PendingLogin, ProviderKind};

/// In-process store of pending login state, keyed by the caller's opaque
/// session id. Entries are single-use and expire after a short TTL.
///
/// Consumption is remove-first: [`take`](PendingLoginStore::take) removes
/// the entry before the caller compares the state nonce, so a second
/// callback with the same session id finds nothing regardless of whether
/// the first comparison succeeded.
pub struct PendingLoginStore {
    ttl: Duration,
    entries: RwLock<HashMap<String, PendingLogin>>,
}

impl PendingLoginStore {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            ttl: Duration::from_secs(ttl_secs),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Record a new pending login, replacing any previous one for the
    /// same session. Stale entries are pruned on the way in so abandoned
    /// logins do not accumulate.
    pub fn insert(&self, session_id: &str, state: String, provider: ProviderKind) {
        if let Ok(mut entries) = self.entries.write() {
            let ttl = self.ttl;
            entries.retain(|_, p| p.created_at.elapsed() < ttl);
            entries.insert(
                session_id.to_string(),
                PendingLogin {
                    state,
                    provider,
                    created_at: Instant::now(),
                },
            );
        }
    }

    /// Remove and return the pending login for this session, if it exists
    /// and has not expired. Expired entries are dropped, not returned.
    pub fn take(&self, session_id: &str) -> Option<PendingLogin> {
        let mut entries = self.entries.write().ok()?;
        let pending = entries.remove(session_id)?;
        if pending.created_at.elapsed() >= self.ttl {
            return None;
        }
        Some(pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_is_single_use() {
        let store = PendingLoginStore::new(600);
        store.insert("sess-1", "nonce-a".to_string(), ProviderKind::Google);

        let first = store.take("sess-1").unwrap();
        assert_eq!(first.state, "nonce-a");
        assert_eq!(first.provider, ProviderKind::Google);

        assert!(store.take("sess-1").is_none());
    }

    #[test]
    fn insert_replaces_previous_entry() {
        let store = PendingLoginStore::new(600);
        store.insert("sess-1", "nonce-a".to_string(), ProviderKind::Google);
        store.insert("sess-1", "nonce-b".to_string(), ProviderKind::Facebook);

        let pending = store.take("sess-1").unwrap();
        assert_eq!(pending.state, "nonce-b");
        assert_eq!(pending.provider, ProviderKind::Facebook);
    }

    #[test]
    fn expired_entry_is_gone() {
        let store = PendingLoginStore::new(0);
        store.insert("sess-1", "nonce-a".to_string(), ProviderKind::Google);
        assert!(store.take("sess-1").is_none());
    }
}
