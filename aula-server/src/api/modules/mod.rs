//! Module API 模块

mod handler;

use axum::{Router, middleware, routing::get};

use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/modules", routes())
}

fn routes() -> Router<ServerState> {
    // 路径参数名与 module_pages 子路由保持一致 (matchit 要求同段同名)
    let read_routes = Router::new()
        .route("/", get(handler::list))
        .route("/{module_id}", get(handler::get_by_id))
        .layer(middleware::from_fn(require_permission("modules:read")));

    let write_routes = Router::new()
        .route("/", axum::routing::post(handler::create))
        .route("/{module_id}", axum::routing::put(handler::update))
        .layer(middleware::from_fn(require_permission("modules:write")));

    let delete_routes = Router::new()
        .route("/{module_id}", axum::routing::delete(handler::delete))
        .layer(middleware::from_fn(require_permission("modules:delete")));

    read_routes.merge(write_routes).merge(delete_routes)
}
