use anyhow::{Context, Result};
use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::{fmt, sync::Arc};
use time::{format_description::BorrowedFormatItem, macros::format_description};
use tracing::{debug, error, instrument};
use utoipa::ToSchema;

use crate::auth::{
    pipeline::{LoginError, LoginPipeline},
    token::IssuedToken,
};
use crate::ensaluti::handlers::valid_username;

// HTTP-date, the only Expires format cookies accept.
static COOKIE_EXPIRES_FORMAT: &[BorrowedFormatItem<'static>] = format_description!(
    "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT"
);

/// Transport-only credentials; dropped once the pipeline has run.
#[derive(ToSchema, Serialize, Deserialize)]
pub struct Credentials {
    username: String,
    password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[utoipa::path(
    post,
    path= "/login",
    request_body = Credentials,
    responses (
        (status = 200, description = "Login successful, token cookie set"),
        (status = 400, description = "Malformed credentials payload"),
        (status = 401, description = "Invalid username or password"),
        (status = 405, description = "Method not allowed"),
        (status = 429, description = "Too many login attempts"),
        (status = 500, description = "Token signing failure"),
    ),
    tag= "login"
)]
// axum handler for login
#[instrument(skip(pipeline))]
pub async fn login(
    pipeline: Extension<Arc<LoginPipeline>>,
    payload: Option<Json<Credentials>>,
) -> Response {
    let Some(Json(credentials)) = payload else {
        return LoginError::InvalidPayload.into_response();
    };

    if !valid_username(&credentials.username) || credentials.password.is_empty() {
        debug!("Malformed credentials payload");
        return LoginError::InvalidPayload.into_response();
    }

    let issued = match pipeline
        .authenticate(&credentials.username, &credentials.password)
        .await
    {
        Ok(issued) => issued,
        Err(err) => return err.into_response(),
    };

    let cookie = match token_cookie(&issued) {
        Ok(cookie) => cookie,
        Err(err) => {
            error!("Failed to build token cookie: {err:#}");
            return LoginError::TokenGeneration.into_response();
        }
    };

    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cookie);

    (
        StatusCode::OK,
        headers,
        Json(json!({ "message": "Login successful!" })),
    )
        .into_response()
}

/// Fallback for `/login` requests with any method other than POST.
pub async fn method_not_allowed() -> Response {
    LoginError::MethodNotAllowed.into_response()
}

/// Build the `token` cookie whose `Expires` matches the token expiry.
fn token_cookie(issued: &IssuedToken) -> Result<HeaderValue> {
    let expires = issued
        .expires_at
        .format(COOKIE_EXPIRES_FORMAT)
        .context("failed to format cookie expiry")?;

    HeaderValue::from_str(&format!(
        "token={}; Path=/; HttpOnly; Expires={expires}",
        issued.token
    ))
    .context("failed to build cookie header")
}
