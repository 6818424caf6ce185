//! End-to-end contract against the in-memory backend

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use imis_core::SelectionKind;
use imis_server::{build_router, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

fn app(selection: SelectionKind) -> Router {
    build_router(Arc::new(AppState::in_memory(selection.policy())))
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

#[tokio::test]
async fn registration_scenario() {
    let app = app(SelectionKind::Active);
    let (status, created) = call(
        &app,
        Method::POST,
        "/patients",
        Some(json!({
            "firstName": "Ana",
            "lastName": "Lee",
            "gender": "f",
            "dateOfBirth": "1990-01-01"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let created: Value = serde_json::from_slice(&created).unwrap();
    let id = created["id"].as_str().unwrap();

    let (status, read) = call(&app, Method::GET, &format!("/patients/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_slice::<Value>(&read).unwrap(), created);

    let (status, body) = call(&app, Method::GET, "/patients/does-not-exist", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.is_empty());
}

#[tokio::test]
async fn active_policy_hides_open_and_expired_incidents() {
    let app = app(SelectionKind::Active);
    let (_, patient) = call(
        &app,
        Method::POST,
        "/patients",
        Some(json!({
            "id": "p-42",
            "firstName": "Bo",
            "lastName": "Kim",
            "gender": "m",
            "dateOfBirth": "1985-06-15"
        })),
    )
    .await;
    assert_eq!(serde_json::from_slice::<Value>(&patient).unwrap()["id"], "p-42");

    // no end date yet, and one long over
    for until in [Value::Null, json!("2020-04-03")] {
        let (status, _) = call(
            &app,
            Method::POST,
            "/api/incidents/quarantine",
            Some(json!({ "patient": "p-42", "eventDate": "2020-03-20", "until": until })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = call(&app, Method::GET, "/api/incidents/selected-for-quarantine", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_slice::<Value>(&body).unwrap(), json!([]));
}

#[tokio::test]
async fn pending_policy_selects_undecided_incidents() {
    let app = app(SelectionKind::Pending);
    call(
        &app,
        Method::POST,
        "/patients",
        Some(json!({
            "id": "p-7",
            "firstName": "Cy",
            "lastName": "Ng",
            "gender": "d",
            "dateOfBirth": "2001-12-31"
        })),
    )
    .await;
    call(
        &app,
        Method::POST,
        "/api/incidents/quarantine",
        Some(json!({ "patient": "p-7", "eventDate": "2020-03-20" })),
    )
    .await;

    let (_, body) = call(&app, Method::GET, "/api/incidents/selected-for-quarantine", None).await;
    let items: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(items.as_array().unwrap().len(), 1);
    assert_eq!(items[0]["patient"]["lastName"], "Ng");
}
