/// Generate a new random ID (UUIDv4, no dashes).
///
/// 128 bits of randomness, also used as the CSRF `state` nonce for
/// federated login.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string().replace('-', "")
}

/// Get the current time as an RFC 3339 string.
pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}
