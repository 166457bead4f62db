use axum::{routing::get, Router};

pub mod audit;
pub mod items;
pub mod requests;
pub mod system;
pub mod users;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/items", items::router())
        .nest("/requests", requests::router())
        .route("/audit", get(audit::list_audit))
}
