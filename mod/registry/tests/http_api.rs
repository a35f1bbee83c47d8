//! HTTP-level tests for the registry API, driven through the router
//! with `tower::ServiceExt::oneshot` over an in-memory store.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use certreg_core::Module;
use certreg_sql::SqliteStore;
use registry::RegistryModule;
use registry::config::RegistryConfig;
use registry::service::RegistryService;

fn test_router() -> Router {
    let db = Arc::new(SqliteStore::open_in_memory().unwrap());
    let config = RegistryConfig::with_required(["IC", "CBHC"]);
    let service = RegistryService::new(db, config).unwrap();
    RegistryModule::new(service).routes()
}

async fn api_call(
    router: &Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if body.is_some() {
        builder = builder.header("content-type", "application/json");
    }
    let body = match body {
        Some(v) => Body::from(serde_json::to_string(&v).unwrap()),
        None => Body::empty(),
    };
    let req = builder.body(body).unwrap();
    let resp = router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let json = if bytes.is_empty() {
        serde_json::json!(null)
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::json!(null))
    };
    (status, json)
}

async fn seed_courses(router: &Router) {
    for (code, name) in [
        ("IC", "Introduction to Cybersecurity"),
        ("CBHC", "Cybersecurity Basics Hands-on"),
    ] {
        let (status, _) = api_call(
            router,
            "POST",
            "/registry/v1/courses",
            Some(serde_json::json!({"code": code, "name": name})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }
}

async fn seed_student(router: &Router, first: &str, last: &str, email: &str) -> String {
    let (status, body) = api_call(
        router,
        "POST",
        "/registry/v1/students",
        Some(serde_json::json!({
            "firstName": first,
            "lastName": last,
            "email": email,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["slug"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn detail_shows_matched_and_missing_required_names() {
    let router = test_router();
    seed_courses(&router).await;
    let slug = seed_student(&router, "Carol", "Diaz", "carol@example.com").await;

    let (status, _) = api_call(
        &router,
        "POST",
        "/registry/v1/certifications",
        Some(serde_json::json!({"studentSlug": slug, "courseCode": "IC"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) =
        api_call(&router, "GET", &format!("/registry/v1/students/{slug}"), None).await;
    assert_eq!(status, StatusCode::OK);

    let text = body.to_string();
    assert!(text.contains("Carol"));
    assert!(text.contains("Introduction to Cybersecurity"));
    assert!(text.contains("Cybersecurity Basics Hands-on"));

    assert_eq!(body["complete"], serde_json::json!(false));
    let rows = body["required"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["code"], "IC");
    assert!(rows[0]["cert"].is_object());
    assert_eq!(rows[1]["code"], "CBHC");
    assert!(rows[1].get("cert").is_none());
}

#[tokio::test]
async fn detail_unknown_slug_is_404_with_stable_code() {
    let router = test_router();
    let (status, body) =
        api_call(&router, "GET", "/registry/v1/students/nobody", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn listing_search_with_no_match_returns_empty_collection() {
    let router = test_router();
    seed_student(&router, "Carol", "Diaz", "carol@example.com").await;

    let (status, body) =
        api_call(&router, "GET", "/registry/v1/students?q=zzz", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 0);
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn listing_carries_required_names_and_nested_certifications() {
    let router = test_router();
    seed_courses(&router).await;
    let slug = seed_student(&router, "Carol", "Diaz", "carol@example.com").await;
    api_call(
        &router,
        "POST",
        "/registry/v1/certifications",
        Some(serde_json::json!({"studentSlug": slug, "courseCode": "IC"})),
    )
    .await;

    let (status, body) = api_call(&router, "GET", "/registry/v1/students", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["required"], serde_json::json!(["IC", "CBHC"]));
    assert_eq!(
        body["requiredNames"],
        serde_json::json!([
            "Introduction to Cybersecurity",
            "Cybersecurity Basics Hands-on"
        ])
    );

    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    let certs = items[0]["certifications"].as_array().unwrap();
    assert_eq!(certs.len(), 1);
    assert_eq!(certs[0]["courseCode"], "IC");
    assert_eq!(certs[0]["course"]["name"], "Introduction to Cybersecurity");
}

#[tokio::test]
async fn listing_sort_parameter_switches_order() {
    let router = test_router();
    seed_student(&router, "Zoe", "Anders", "z@example.com").await;
    seed_student(&router, "Ana", "Zapata", "a@example.com").await;

    let (_, body) = api_call(&router, "GET", "/registry/v1/students", None).await;
    let first = body["items"][0]["fullName"].as_str().unwrap();
    assert_eq!(first, "Zoe Anders");

    let (_, body) =
        api_call(&router, "GET", "/registry/v1/students?sort=first_name", None).await;
    let first = body["items"][0]["fullName"].as_str().unwrap();
    assert_eq!(first, "Ana Zapata");
}

#[tokio::test]
async fn duplicate_certification_is_409() {
    let router = test_router();
    seed_courses(&router).await;
    let slug = seed_student(&router, "Carol", "Diaz", "carol@example.com").await;

    let payload = serde_json::json!({"studentSlug": slug, "courseCode": "IC"});
    let (status, _) = api_call(
        &router,
        "POST",
        "/registry/v1/certifications",
        Some(payload.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = api_call(
        &router,
        "POST",
        "/registry/v1/certifications",
        Some(payload),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "ALREADY_EXISTS");
}

#[tokio::test]
async fn delete_student_removes_it_and_its_certifications() {
    let router = test_router();
    seed_courses(&router).await;
    let slug = seed_student(&router, "Carol", "Diaz", "carol@example.com").await;
    api_call(
        &router,
        "POST",
        "/registry/v1/certifications",
        Some(serde_json::json!({"studentSlug": slug, "courseCode": "IC"})),
    )
    .await;

    let (status, _) = api_call(
        &router,
        "DELETE",
        &format!("/registry/v1/students/{slug}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) =
        api_call(&router, "GET", &format!("/registry/v1/students/{slug}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn patch_student_updates_name_but_not_slug() {
    let router = test_router();
    let slug = seed_student(&router, "Carol", "Diaz", "carol@example.com").await;

    let (status, body) = api_call(
        &router,
        "PATCH",
        &format!("/registry/v1/students/{slug}"),
        Some(serde_json::json!({"lastName": "Mendez"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fullName"], "Carol Mendez");
    assert_eq!(body["slug"], "carol-diaz");
}
