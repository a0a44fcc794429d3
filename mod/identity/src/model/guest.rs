use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Claim set of the `anonymous_user_token` cookie.
///
/// The token IS the ownership database for a guest; there is no
/// server-side guest record. `owned` maps a question (thread) id to the
/// single comment the guest owns on that thread; the map key uniqueness
/// is what enforces one-comment-per-thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuestClaims {
    /// Stable guest identifier for the token's lifetime (UUIDv4, no dashes).
    pub guest_id: String,

    /// question id -> owned comment id.
    #[serde(default)]
    pub owned: BTreeMap<String, String>,

    /// Absolute expiry (unix seconds). Stored absolute, never relative,
    /// so re-encoding a mutated payload does not silently reset it.
    pub exp: i64,
}

impl GuestClaims {
    /// True iff the guest owns the given comment.
    pub fn owns(&self, comment_id: &str) -> bool {
        self.owned.values().any(|v| v == comment_id)
    }
}
