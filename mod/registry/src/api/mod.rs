pub mod certification;
pub mod course;
pub mod student;

use std::sync::Arc;

use axum::{Json, Router};
use serde::Serialize;

use certreg_core::ServiceError;

use crate::service::RegistryService;

/// Shared application state.
pub type AppState = Arc<RegistryService>;

/// Build the registry API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/registry/v1", api_routes())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(student::routes())
        .merge(course::routes())
        .merge(certification::routes())
}

/// Wrap a service result into a JSON response. `ServiceError` carries
/// its own status and `{"code", "message"}` body.
pub(crate) fn ok_json<T: Serialize>(
    result: Result<T, ServiceError>,
) -> Result<Json<T>, ServiceError> {
    result.map(Json)
}
