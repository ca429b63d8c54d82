//! Signed session tokens.

use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use time::OffsetDateTime;
use tracing::error;

/// Claims carried by a session token. Immutable once signed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

/// A freshly minted token plus its expiry, for cookie construction.
#[derive(Clone, Debug)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: OffsetDateTime,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token has expired")]
    Expired,
    #[error("token is malformed")]
    Malformed,
    #[error("token signing failed")]
    Signing,
}

/// Issues and verifies HS256 session tokens with a process-wide secret.
///
/// Verification is stateless: rotating the key invalidates every
/// outstanding token, and there is no revocation list.
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    #[must_use]
    pub fn new(key: &SecretString, ttl: Duration) -> Self {
        let secret = key.expose_secret().as_bytes();

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    /// Mint a signed token for `username` expiring after the configured ttl.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Signing` when claim serialization or signing fails.
    pub fn issue(&self, username: &str) -> Result<IssuedToken, TokenError> {
        self.issue_at(username, OffsetDateTime::now_utc())
    }

    fn issue_at(&self, username: &str, now: OffsetDateTime) -> Result<IssuedToken, TokenError> {
        let expires_at = now + self.ttl;

        let claims = SessionClaims {
            username: username.to_string(),
            iat: now.unix_timestamp(),
            exp: expires_at.unix_timestamp(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding).map_err(|err| {
            error!("Failed to sign session token: {err}");
            TokenError::Signing
        })?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Validate signature and expiry, returning the embedded claims.
    ///
    /// # Errors
    ///
    /// `InvalidSignature` when the signature does not match the configured
    /// key, `Expired` past `exp`, `Malformed` when the token cannot be
    /// parsed. Claims are never returned unless the signature checks out.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<SessionClaims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Malformed,
            })
    }
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(
            &SecretString::from("sikreta".to_string()),
            Duration::from_secs(300),
        )
    }

    #[test]
    fn test_issue_then_verify() {
        let issuer = issuer();
        let issued = issuer.issue("alice").unwrap();

        let claims = issuer.verify(&issued.token).unwrap();
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.exp - claims.iat, 300);
        assert_eq!(claims.exp, issued.expires_at.unix_timestamp());
    }

    #[test]
    fn test_expiry_tracks_ttl() {
        let issuer = issuer();
        let issued = issuer.issue("alice").unwrap();

        let remaining = issued.expires_at - OffsetDateTime::now_utc();
        assert!(remaining.whole_seconds() > 295);
        assert!(remaining.whole_seconds() <= 300);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let issuer = issuer();
        let back_then = OffsetDateTime::now_utc() - Duration::from_secs(600);
        let issued = issuer.issue_at("alice", back_then).unwrap();

        assert_eq!(issuer.verify(&issued.token), Err(TokenError::Expired));
    }

    #[test]
    fn test_wrong_key_is_rejected() {
        let issued = issuer().issue("alice").unwrap();

        let other = TokenIssuer::new(
            &SecretString::from("alia sikreta".to_string()),
            Duration::from_secs(300),
        );

        assert_eq!(
            other.verify(&issued.token),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_garbage_is_malformed() {
        assert_eq!(issuer().verify("not-a-token"), Err(TokenError::Malformed));
        assert_eq!(issuer().verify(""), Err(TokenError::Malformed));
    }
}
