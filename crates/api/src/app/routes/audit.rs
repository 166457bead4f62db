use std::sync::Arc;

use axum::{extract::Extension, response::IntoResponse, Json};

use crate::app::{dto, errors, services::AppServices};
use crate::context::PrincipalContext;

/// Audit log, newest first.
pub async fn list_audit(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    match services.lifecycle.list_audit_log(principal.principal()).await {
        Ok(entries) => Json(entries.iter().map(dto::audit_to_json).collect::<Vec<_>>()).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
