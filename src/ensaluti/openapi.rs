use axum::{response::IntoResponse, Json};
use utoipa::OpenApi;

use crate::ensaluti::handlers::login;

#[derive(OpenApi)]
#[openapi(
    paths(login::login),
    components(schemas(login::Credentials)),
    tags(
        (name = "login", description = "Credential authentication endpoints")
    )
)]
pub struct ApiDoc;

// axum handler serving the generated OpenAPI document
pub async fn openapi() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
