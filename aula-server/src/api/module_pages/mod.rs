//! Module Page API 模块
//!
//! 嵌套在 `/api/modules/{module_id}/pages` 之下

mod handler;

use axum::{Router, middleware, routing::get};

use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/modules/{module_id}/pages", routes())
}

fn routes() -> Router<ServerState> {
    let read_routes = Router::new()
        .route("/", get(handler::list))
        .layer(middleware::from_fn(require_permission("pages:read")));

    let write_routes = Router::new()
        .route("/", axum::routing::post(handler::create))
        .route("/reorder", axum::routing::patch(handler::reorder))
        .route(
            "/{page_id}",
            axum::routing::put(handler::update).delete(handler::delete),
        )
        .layer(middleware::from_fn(require_permission("pages:write")));

    read_routes.merge(write_routes)
}
