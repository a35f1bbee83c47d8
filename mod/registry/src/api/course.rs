use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use serde::Deserialize;

use certreg_core::{ListParams, ListResult, ServiceError};

use super::{AppState, ok_json};
use crate::model::Course;
use crate::service::course::NewCourse;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/courses", get(list_courses).post(create_course))
        .route(
            "/courses/{code}",
            get(get_course).patch(update_course).delete(delete_course),
        )
}

// Not a flattened ListParams: serde_urlencoded can't drive numeric
// fields through `#[serde(flatten)]`.
#[derive(Debug, Deserialize)]
struct CourseListQuery {
    #[serde(default)]
    limit: Option<usize>,

    #[serde(default)]
    offset: Option<usize>,

    /// Only return active courses.
    #[serde(default)]
    active: bool,
}

impl CourseListQuery {
    fn params(&self) -> ListParams {
        let defaults = ListParams::default();
        ListParams {
            limit: self.limit.unwrap_or(defaults.limit),
            offset: self.offset.unwrap_or(defaults.offset),
            ..defaults
        }
    }
}

async fn create_course(
    State(svc): State<AppState>,
    Json(body): Json<NewCourse>,
) -> Result<(StatusCode, Json<Course>), ServiceError> {
    let course = svc.create_course(body)?;
    Ok((StatusCode::CREATED, Json(course)))
}

async fn get_course(
    State(svc): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<Course>, ServiceError> {
    ok_json(svc.get_course(&code))
}

async fn list_courses(
    State(svc): State<AppState>,
    Query(query): Query<CourseListQuery>,
) -> Result<Json<ListResult<Course>>, ServiceError> {
    ok_json(svc.list_courses(&query.params(), query.active))
}

async fn update_course(
    State(svc): State<AppState>,
    Path(code): Path<String>,
    Json(patch): Json<serde_json::Value>,
) -> Result<Json<Course>, ServiceError> {
    ok_json(svc.update_course(&code, patch))
}

async fn delete_course(
    State(svc): State<AppState>,
    Path(code): Path<String>,
) -> Result<StatusCode, ServiceError> {
    svc.delete_course(&code)?;
    Ok(StatusCode::NO_CONTENT)
}
