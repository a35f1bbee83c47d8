//! Route registration — module routes + system endpoints.

use axum::Router;
use axum::response::IntoResponse;
use axum::routing::get;
use tracing::info;

/// Build the complete router with all routes.
pub fn build_router(module_routes: Vec<(String, Router)>) -> Router {
    let mut app = Router::new()
        .route("/health", get(health))
        .route("/version", get(version));

    // Module routers carry their own `/{name}/v1` prefix.
    for (name, router) in module_routes {
        info!("Mounting module '{}'", name);
        app = app.merge(router);
    }

    app
}

async fn health() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "status": "ok",
    }))
}

async fn version() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": "certregd",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
