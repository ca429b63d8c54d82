use crate::{
    auth::{
        hasher::PasswordHasher,
        pipeline::LoginPipeline,
        throttle::{AttemptThrottle, ThrottlePolicy},
        token::TokenIssuer,
    },
    cli::globals::GlobalArgs,
    store::{self, PgUserStore},
};
use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::{Extension, MatchedPath},
    http::{header::CONTENT_TYPE, HeaderName, HeaderValue, Method, Request},
    routing::{get, post},
    Router,
};
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;

pub mod handlers;
mod openapi;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(port: u16, dsn: String, globals: &GlobalArgs) -> Result<()> {
    // Connect to database
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(&dsn)
        .await
        .context("Failed to connect to database")?;

    store::ensure_schema(&pool).await?;

    // Seed the privileged account when configured, with the same hasher
    // the login pipeline verifies against.
    if let (Some(username), Some(password)) = (&globals.admin_username, &globals.admin_password) {
        store::seed::ensure_admin(&pool, &PasswordHasher::default(), username, password).await?;
    }

    let app = router(Arc::new(login_pipeline(&pool, globals)));

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

fn login_pipeline(pool: &PgPool, globals: &GlobalArgs) -> LoginPipeline {
    LoginPipeline::new(
        Arc::new(PgUserStore::new(pool.clone())),
        PasswordHasher::default(),
        AttemptThrottle::new(ThrottlePolicy {
            max_attempts: globals.max_attempts,
            reset_interval: Duration::from_secs(globals.reset_interval_seconds),
        }),
        TokenIssuer::new(
            &globals.token_key,
            Duration::from_secs(globals.token_ttl_seconds),
        ),
    )
}

/// Build the application router around a login pipeline.
#[must_use]
pub fn router(pipeline: Arc<LoginPipeline>) -> Router {
    // Browsers post credentials from arbitrary origins, and credentialed
    // CORS cannot use a wildcard, so the origin is mirrored.
    let cors = CorsLayer::new()
        .allow_headers([CONTENT_TYPE])
        .allow_methods([Method::POST])
        .allow_origin(AllowOrigin::mirror_request())
        .allow_credentials(true);

    Router::new()
        .route(
            "/login",
            post(handlers::login).fallback(handlers::login::method_not_allowed),
        )
        .route("/health", get(handlers::health))
        .route("/openapi.json", get(openapi::openapi))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &Request<Body>| {
                        HeaderValue::from_str(Ulid::new().to_string().as_str()).ok()
                    },
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(cors)
                .layer(Extension(pipeline)),
        )
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
