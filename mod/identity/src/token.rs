//! Signed token codec.
//!
//! Encodes an opaque claim set to a compact signed string (HS256 JWT) and
//! decodes it back, failing closed on expiry, tampering, or a purpose the
//! caller did not expect. The `exp` claim is always an absolute timestamp
//! set by the caller; the codec never injects a relative TTL, so mutating
//! and re-encoding a payload keeps whatever expiry the caller chose.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// What a token is allowed to be used for. Enforced on every decode so a
/// guest-ownership token can never pass as an access credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPurpose {
    Guest,
    Access,
    Refresh,
}

impl TokenPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenPurpose::Guest => "guest",
            TokenPurpose::Access => "access",
            TokenPurpose::Refresh => "refresh",
        }
    }
}

/// Codec failure. Messages never contain key material.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,

    #[error("token purpose mismatch: expected '{expected}'")]
    ScopeMismatch { expected: &'static str },

    #[error("invalid token: {0}")]
    Invalid(String),
}

/// Signing key material, loaded once at startup.
///
/// Signing always uses the current key. Verification additionally tries
/// each previous key in order, which keeps live tokens valid through a
/// rotation grace window.
pub struct Keyring {
    encoding: EncodingKey,
    decoding: Vec<DecodingKey>,
}

impl Keyring {
    pub fn new(current: &str, previous: &[String]) -> Self {
        let mut decoding = vec![DecodingKey::from_secret(current.as_bytes())];
        for secret in previous {
            decoding.push(DecodingKey::from_secret(secret.as_bytes()));
        }
        Self {
            encoding: EncodingKey::from_secret(current.as_bytes()),
            decoding,
        }
    }
}

/// Encodes/decodes purpose-scoped signed claim sets.
pub struct SignedTokenCodec {
    keyring: Keyring,
}

impl SignedTokenCodec {
    pub fn new(keyring: Keyring) -> Self {
        Self { keyring }
    }

    /// Sign a claim set with the current key, stamping the given purpose.
    ///
    /// `claims` must serialize to a JSON object carrying an absolute `exp`
    /// claim (unix seconds).
    pub fn encode<T: Serialize>(
        &self,
        claims: &T,
        purpose: TokenPurpose,
    ) -> Result<String, TokenError> {
        let mut value = serde_json::to_value(claims)
            .map_err(|e| TokenError::Invalid(format!("claims not serializable: {}", e)))?;
        let obj = value
            .as_object_mut()
            .ok_or_else(|| TokenError::Invalid("claims must be a JSON object".into()))?;
        obj.insert(
            "purpose".to_string(),
            serde_json::Value::String(purpose.as_str().to_string()),
        );

        encode(&Header::default(), &value, &self.keyring.encoding)
            .map_err(|e| TokenError::Invalid(format!("encode failed: {}", e)))
    }

    /// Verify and decode a token, enforcing the expected purpose.
    ///
    /// Tries the current key first, then each previous key. A valid
    /// signature with an expired `exp` is reported as [`TokenError::Expired`];
    /// everything malformed or unverifiable is [`TokenError::Invalid`].
    pub fn decode<T: DeserializeOwned>(
        &self,
        token: &str,
        purpose: TokenPurpose,
    ) -> Result<T, TokenError> {
        let validation = Validation::default();

        for key in &self.keyring.decoding {
            match decode::<serde_json::Value>(token, key, &validation) {
                Ok(data) => {
                    let found = data
                        .claims
                        .get("purpose")
                        .and_then(|v| v.as_str())
                        .unwrap_or("");
                    if found != purpose.as_str() {
                        return Err(TokenError::ScopeMismatch {
                            expected: purpose.as_str(),
                        });
                    }
                    return serde_json::from_value(data.claims)
                        .map_err(|e| TokenError::Invalid(format!("bad claim shape: {}", e)));
                }
                Err(e) => match e.kind() {
                    // Signature checked out but the token is stale.
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        return Err(TokenError::Expired);
                    }
                    // Wrong key; a previous key may still verify it.
                    jsonwebtoken::errors::ErrorKind::InvalidSignature => continue,
                    _ => {
                        return Err(TokenError::Invalid(e.to_string()));
                    }
                },
            }
        }

        Err(TokenError::Invalid("signature verification failed".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize)]
    struct TestClaims {
        sub: String,
        exp: i64,
    }

    fn codec(current: &str, previous: &[&str]) -> SignedTokenCodec {
        let previous: Vec<String> = previous.iter().map(|s| s.to_string()).collect();
        SignedTokenCodec::new(Keyring::new(current, &previous))
    }

    fn claims_expiring_in(secs: i64) -> TestClaims {
        TestClaims {
            sub: "abc".to_string(),
            exp: chrono::Utc::now().timestamp() + secs,
        }
    }

    #[test]
    fn round_trip() {
        let codec = codec("secret-a", &[]);
        let token = codec.encode(&claims_expiring_in(600), TokenPurpose::Guest).unwrap();
        let decoded: TestClaims = codec.decode(&token, TokenPurpose::Guest).unwrap();
        assert_eq!(decoded.sub, "abc");
    }

    #[test]
    fn expired_token_fails_closed() {
        let codec = codec("secret-a", &[]);
        // Beyond the default 60s leeway.
        let token = codec.encode(&claims_expiring_in(-300), TokenPurpose::Guest).unwrap();
        let err = codec.decode::<TestClaims>(&token, TokenPurpose::Guest).unwrap_err();
        assert!(matches!(err, TokenError::Expired));
    }

    #[test]
    fn tampered_token_is_invalid() {
        let codec = codec("secret-a", &[]);
        let token = codec.encode(&claims_expiring_in(600), TokenPurpose::Guest).unwrap();
        let mut tampered = token.clone();
        // Flip a payload character.
        let idx = token.find('.').unwrap() + 1;
        let replacement = if &token[idx..idx + 1] == "A" { "B" } else { "A" };
        tampered.replace_range(idx..idx + 1, replacement);
        let err = codec.decode::<TestClaims>(&tampered, TokenPurpose::Guest).unwrap_err();
        assert!(matches!(err, TokenError::Invalid(_)));
    }

    #[test]
    fn garbage_token_is_invalid() {
        let codec = codec("secret-a", &[]);
        let err = codec
            .decode::<TestClaims>("this.is.not.a.jwt", TokenPurpose::Guest)
            .unwrap_err();
        assert!(matches!(err, TokenError::Invalid(_)));
    }

    #[test]
    fn purpose_is_enforced() {
        let codec = codec("secret-a", &[]);
        let token = codec.encode(&claims_expiring_in(600), TokenPurpose::Guest).unwrap();
        let err = codec.decode::<TestClaims>(&token, TokenPurpose::Access).unwrap_err();
        assert!(matches!(err, TokenError::ScopeMismatch { expected: "access" }));
    }

    #[test]
    fn previous_key_still_verifies() {
        let old = codec("secret-old", &[]);
        let token = old.encode(&claims_expiring_in(600), TokenPurpose::Access).unwrap();

        let rotated = codec("secret-new", &["secret-old"]);
        let decoded: TestClaims = rotated.decode(&token, TokenPurpose::Access).unwrap();
        assert_eq!(decoded.sub, "abc");

        // Without the old key in the ring, verification fails.
        let fresh = codec("secret-new", &[]);
        let err = fresh.decode::<TestClaims>(&token, TokenPurpose::Access).unwrap_err();
        assert!(matches!(err, TokenError::Invalid(_)));
    }
}
