//! The login pipeline: throttle check, credential lookup, password
//! verify, token issue.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error};

use crate::auth::{
    hasher::PasswordHasher,
    throttle::{AttemptThrottle, ThrottleDecision},
    token::{IssuedToken, TokenIssuer},
};
use crate::store::UserStore;

/// Terminal outcome for a failed login attempt. Each variant maps to
/// exactly one HTTP status, and the display text is the full response
/// message, so no internal detail can leak past the pipeline boundary.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum LoginError {
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Invalid request payload")]
    InvalidPayload,
    #[error("Too many login attempts. Please try again later.")]
    RateLimited,
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Error generating token")]
    TokenGeneration,
}

impl LoginError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::InvalidPayload => StatusCode::BAD_REQUEST,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::TokenGeneration => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for LoginError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "message": self.to_string() }))).into_response()
    }
}

/// Runs the credential check sequence for one request.
///
/// The throttle is consulted first, before any store I/O, and counts
/// the attempt whether or not the credentials turn out to be valid.
pub struct LoginPipeline {
    store: Arc<dyn UserStore>,
    hasher: PasswordHasher,
    throttle: AttemptThrottle,
    issuer: TokenIssuer,
}

impl LoginPipeline {
    #[must_use]
    pub fn new(
        store: Arc<dyn UserStore>,
        hasher: PasswordHasher,
        throttle: AttemptThrottle,
        issuer: TokenIssuer,
    ) -> Self {
        Self {
            store,
            hasher,
            throttle,
            issuer,
        }
    }

    /// Authenticate one attempt and mint a session token on success.
    ///
    /// Unknown usernames, store failures, and wrong passwords all
    /// produce `InvalidCredentials` to keep usernames unenumerable;
    /// store failures are additionally logged server-side.
    ///
    /// # Errors
    ///
    /// One `LoginError` per failed pipeline stage.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<IssuedToken, LoginError> {
        if self.throttle.check(username) == ThrottleDecision::Limited {
            debug!("Login attempt rejected by throttle");
            return Err(LoginError::RateLimited);
        }

        let record = match self.store.find_by_username(username).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                debug!("Unknown username");
                return Err(LoginError::InvalidCredentials);
            }
            Err(err) => {
                error!("Failed to fetch user record: {err:#}");
                return Err(LoginError::InvalidCredentials);
            }
        };

        if !self.hasher.verify(&record.password_hash, password) {
            debug!("Password mismatch");
            return Err(LoginError::InvalidCredentials);
        }

        self.issuer
            .issue(username)
            .map_err(|_| LoginError::TokenGeneration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::throttle::ThrottlePolicy;
    use crate::store::testing::{FailingUserStore, MemoryUserStore};
    use secrecy::SecretString;
    use std::time::Duration;
    use time::OffsetDateTime;

    fn pipeline(store: Arc<dyn UserStore>) -> LoginPipeline {
        LoginPipeline::new(
            store,
            PasswordHasher::with_cost(4),
            AttemptThrottle::new(ThrottlePolicy::default()),
            TokenIssuer::new(
                &SecretString::from("sikreta".to_string()),
                Duration::from_secs(300),
            ),
        )
    }

    fn store_with_alice() -> Arc<MemoryUserStore> {
        let hasher = PasswordHasher::with_cost(4);
        let store = MemoryUserStore::default();
        store.insert("alice", &hasher.hash("password123").unwrap());
        Arc::new(store)
    }

    #[tokio::test]
    async fn test_successful_login_issues_token() {
        let pipeline = pipeline(store_with_alice());

        let issued = pipeline.authenticate("alice", "password123").await.unwrap();

        let claims = pipeline.issuer.verify(&issued.token).unwrap();
        assert_eq!(claims.username, "alice");

        let remaining = issued.expires_at - OffsetDateTime::now_utc();
        assert!(remaining.whole_seconds() > 295);
        assert!(remaining.whole_seconds() <= 300);
    }

    #[tokio::test]
    async fn test_unknown_user_and_wrong_password_are_identical() {
        let pipeline = pipeline(store_with_alice());

        let unknown = pipeline
            .authenticate("mallory", "password123")
            .await
            .unwrap_err();
        let mismatch = pipeline
            .authenticate("alice", "wrongpassword")
            .await
            .unwrap_err();

        assert_eq!(unknown, LoginError::InvalidCredentials);
        assert_eq!(unknown, mismatch);
        assert_eq!(unknown.status(), mismatch.status());
        assert_eq!(unknown.to_string(), mismatch.to_string());
    }

    #[tokio::test]
    async fn test_store_failure_maps_to_invalid_credentials() {
        let pipeline = pipeline(Arc::new(FailingUserStore));

        let err = pipeline
            .authenticate("alice", "password123")
            .await
            .unwrap_err();

        assert_eq!(err, LoginError::InvalidCredentials);
    }

    #[tokio::test]
    async fn test_sixth_attempt_is_limited_even_with_correct_password() {
        let pipeline = pipeline(store_with_alice());

        for _ in 0..5 {
            let err = pipeline
                .authenticate("alice", "wrongpassword")
                .await
                .unwrap_err();
            assert_eq!(err, LoginError::InvalidCredentials);
        }

        let err = pipeline
            .authenticate("alice", "password123")
            .await
            .unwrap_err();
        assert_eq!(err, LoginError::RateLimited);
    }

    #[tokio::test]
    async fn test_successful_login_consumes_a_slot() {
        let pipeline = pipeline(store_with_alice());

        // Four successes plus one failure fill the window.
        for _ in 0..4 {
            pipeline.authenticate("alice", "password123").await.unwrap();
        }
        pipeline
            .authenticate("alice", "wrongpassword")
            .await
            .unwrap_err();

        let err = pipeline
            .authenticate("alice", "password123")
            .await
            .unwrap_err();
        assert_eq!(err, LoginError::RateLimited);
    }

    #[test]
    fn test_error_statuses() {
        assert_eq!(
            LoginError::MethodNotAllowed.status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(LoginError::InvalidPayload.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            LoginError::RateLimited.status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            LoginError::InvalidCredentials.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            LoginError::TokenGeneration.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
