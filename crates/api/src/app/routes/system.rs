use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use stockroom_auth::{Role, has_role};

use crate::app::{dto, errors, services::AppServices};
use crate::context::PrincipalContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// Token principal plus the directory identity it resolves to (or `null`).
/// `is_admin` reflects the directory role, not the token roles.
pub async fn whoami(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    let identity = match services.directory.resolve(principal.principal()).await {
        Ok(identity) => identity,
        Err(e) => return errors::service_error_to_response(e),
    };

    Json(serde_json::json!({
        "user_id": principal.user_id().to_string(),
        "roles": principal.roles().iter().map(|r| r.as_str()).collect::<Vec<_>>(),
        "identity": identity.as_ref().map(dto::user_to_json),
        "is_admin": identity.as_ref().is_some_and(|i| has_role(i, &Role::ADMIN)),
    }))
    .into_response()
}
