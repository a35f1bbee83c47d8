use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, post},
};

use certreg_core::ServiceError;

use super::AppState;
use crate::model::Certification;
use crate::service::certification::NewCertification;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/certifications", post(create_certification))
        .route("/certifications/{id}", delete(delete_certification))
}

async fn create_certification(
    State(svc): State<AppState>,
    Json(body): Json<NewCertification>,
) -> Result<(StatusCode, Json<Certification>), ServiceError> {
    let cert = svc.add_certification(body)?;
    Ok((StatusCode::CREATED, Json(cert)))
}

async fn delete_certification(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServiceError> {
    svc.remove_certification(&id)?;
    Ok(StatusCode::NO_CONTENT)
}
