use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use stockroom_core::RequestId;
use stockroom_infra::ServiceError;
use stockroom_inventory::{ItemRequest, RequestAction};

use crate::app::{dto, errors, services::AppServices};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/pending", get(list_pending))
        .route("/approved", get(list_approved))
        .route("/:id/approve", post(approve))
        .route("/:id/reject", post(reject))
        .route("/:id/return", post(return_loan))
}

fn requests_response(result: Result<Vec<ItemRequest>, ServiceError>) -> axum::response::Response {
    match result {
        Ok(requests) => Json(requests.iter().map(dto::request_to_json).collect::<Vec<_>>()).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// Admin queue, oldest first.
pub async fn list_pending(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    requests_response(services.lifecycle.list_pending_requests(principal.principal()).await)
}

/// Active loans, oldest first.
pub async fn list_approved(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    requests_response(services.lifecycle.list_approved_requests(principal.principal()).await)
}

pub async fn approve(
    services: Extension<Arc<AppServices>>,
    principal: Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    transition(services, principal, &id, RequestAction::Approve).await
}

pub async fn reject(
    services: Extension<Arc<AppServices>>,
    principal: Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    transition(services, principal, &id, RequestAction::Reject).await
}

pub async fn return_loan(
    services: Extension<Arc<AppServices>>,
    principal: Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    transition(services, principal, &id, RequestAction::Return).await
}

async fn transition(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    raw_id: &str,
    action: RequestAction,
) -> axum::response::Response {
    let id: RequestId = match errors::parse_id(raw_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let actor = principal.principal();
    let result = match action {
        RequestAction::Approve => services.lifecycle.approve_request(actor, id).await,
        RequestAction::Reject => services.lifecycle.reject_request(actor, id).await,
        RequestAction::Return => services.lifecycle.return_request(actor, id).await,
    };

    match result {
        Ok(request) => Json(dto::request_to_json(&request)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
