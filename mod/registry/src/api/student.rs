use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use serde::Serialize;

use certreg_core::{ListParams, ServiceError};

use super::{AppState, ok_json};
use crate::model::Student;
use crate::service::certification::CertificationEntry;
use crate::service::progress::StudentProgress;
use crate::service::student::{NewStudent, StudentEntry};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/students", get(list_students).post(create_student))
        .route(
            "/students/{slug}",
            get(student_detail).patch(update_student).delete(delete_student),
        )
        .route(
            "/students/{slug}/certifications",
            get(list_student_certifications),
        )
}

/// Listing payload: students with nested certifications plus the
/// configured required codes and their display names.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StudentListResponse {
    items: Vec<StudentEntry>,
    total: usize,
    required: Vec<String>,
    required_names: Vec<String>,
}

async fn create_student(
    State(svc): State<AppState>,
    Json(body): Json<NewStudent>,
) -> Result<(StatusCode, Json<Student>), ServiceError> {
    let student = svc.create_student(body)?;
    Ok((StatusCode::CREATED, Json(student)))
}

async fn list_students(
    State(svc): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<StudentListResponse>, ServiceError> {
    let list = svc.list_students(&params)?;
    let required_names = svc.required_names()?;
    Ok(Json(StudentListResponse {
        items: list.items,
        total: list.total,
        required: svc.config().required_certs.clone(),
        required_names,
    }))
}

async fn student_detail(
    State(svc): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<StudentProgress>, ServiceError> {
    ok_json(svc.student_progress(&slug))
}

async fn update_student(
    State(svc): State<AppState>,
    Path(slug): Path<String>,
    Json(patch): Json<serde_json::Value>,
) -> Result<Json<Student>, ServiceError> {
    ok_json(svc.update_student(&slug, patch))
}

async fn delete_student(
    State(svc): State<AppState>,
    Path(slug): Path<String>,
) -> Result<StatusCode, ServiceError> {
    svc.delete_student(&slug)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_student_certifications(
    State(svc): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Vec<CertificationEntry>>, ServiceError> {
    ok_json(svc.list_certifications(&slug))
}
