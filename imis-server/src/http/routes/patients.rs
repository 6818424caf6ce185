//! Patient endpoints

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use imis_core::{CreatePatientDto, GraphEncoder, Paginated, Pagination, PaginationParams};
use serde_json::Value;

use crate::http::error::ApiError;
use crate::http::extractors::{ValidJson, ValidQuery};
use crate::http::server::AppState;

/// GET /patients - list patients with pagination
async fn list_patients(
    State(state): State<Arc<AppState>>,
    ValidQuery(params): ValidQuery<PaginationParams>,
) -> Result<Json<Paginated<Value>>, ApiError> {
    let page = Pagination::from(params);
    let result = state.patients.list_patients(page).await?;
    let result = result.try_map(|items| GraphEncoder::patients_document(&items))?;
    Ok(Json(result))
}

/// POST /patients - register a patient
async fn add_patient(
    State(state): State<Arc<AppState>>,
    ValidJson(dto): ValidJson<CreatePatientDto>,
) -> Result<Json<Value>, ApiError> {
    let patient = state.patients.add_patient(dto).await?;
    Ok(Json(GraphEncoder::patient_document(&patient)?))
}

/// GET /patients/{id} - exact-id lookup
async fn find_patient_by_id(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let patient = state.patients.find_patient_by_id(&id).await?;
    Ok(Json(GraphEncoder::patient_document(&patient)?))
}

/// Patient routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/patients", get(list_patients).post(add_patient))
        .route("/patients/{id}", get(find_patient_by_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use imis_core::AllIncidents;
    use serde_json::json;
    use tower::ServiceExt;

    use crate::http::build_router;

    fn app() -> Router {
        build_router(Arc::new(AppState::in_memory(Arc::new(AllIncidents))))
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
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

    fn ana() -> Value {
        json!({
            "firstName": "Ana",
            "lastName": "Lee",
            "gender": "f",
            "dateOfBirth": "1990-01-01"
        })
    }

    #[tokio::test]
    async fn create_then_read_returns_same_body() {
        let app = app();
        let (status, created) = send(&app, Method::POST, "/patients", Some(ana())).await;
        assert_eq!(status, StatusCode::OK);

        let created: Value = serde_json::from_slice(&created).unwrap();
        let id = created["id"].as_str().unwrap().to_owned();
        assert!(!id.is_empty());
        assert_eq!(created["firstName"], "Ana");
        assert_eq!(created["dateOfBirth"], "1990-01-01");
        assert_eq!(created["confirmed"], false);
        assert_eq!(created["events"][0]["eventType"], "REGISTERED");
        assert_eq!(created["events"][0]["patient"], id.as_str());

        let (status, read) = send(&app, Method::GET, &format!("/patients/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        let read: Value = serde_json::from_slice(&read).unwrap();
        assert_eq!(read, created);
    }

    #[tokio::test]
    async fn submitted_fields_are_preserved() {
        let app = app();
        let mut body = ana();
        body["email"] = json!("ana@example.org");
        body["zip"] = json!(10115);
        body["symptoms"] = json!(["fever", "cough"]);
        body["riskAreas"] = json!([]);
        body["riskOccupation"] = json!("MEDICAL_STAFF");
        body["coronaContacts"] = json!(true);

        let (status, created) = send(&app, Method::POST, "/patients", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        let created: Value = serde_json::from_slice(&created).unwrap();
        assert_eq!(created["email"], "ana@example.org");
        assert_eq!(created["zip"], 10115);
        assert_eq!(created["symptoms"], json!(["fever", "cough"]));
        assert_eq!(created["riskAreas"], json!([]));
        assert_eq!(created["riskOccupation"], "MEDICAL_STAFF");
        assert_eq!(created["coronaContacts"], true);
    }

    #[tokio::test]
    async fn unknown_id_is_404_with_empty_body() {
        let (status, body) = send(&app(), Method::GET, "/patients/does-not-exist", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn missing_required_field_is_400() {
        let mut body = ana();
        body.as_object_mut().unwrap().remove("lastName");
        let (status, body) = send(&app(), Method::POST, "/patients", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"], "validation_error");
    }

    #[tokio::test]
    async fn delimiter_in_list_is_400() {
        let mut body = ana();
        body["symptoms"] = json!(["fever;cough"]);
        let (status, _) = send(&app(), Method::POST, "/patients", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_json_is_structured_400() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/patients")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"firstName\": "))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "validation_error");
    }

    #[tokio::test]
    async fn null_lists_and_confirmed_are_accepted() {
        let mut body = ana();
        for key in ["symptoms", "riskAreas", "preIllnesses", "confirmed"] {
            body[key] = Value::Null;
        }
        let (status, created) = send(&app(), Method::POST, "/patients", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        let created: Value = serde_json::from_slice(&created).unwrap();
        assert_eq!(created["symptoms"], json!([]));
        assert_eq!(created["preIllnesses"], json!([]));
        assert_eq!(created["confirmed"], false);
    }

    #[tokio::test]
    async fn malformed_query_is_structured_400() {
        let (status, body) = send(&app(), Method::GET, "/patients?page=abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"], "validation_error");
    }

    #[tokio::test]
    async fn duplicate_id_is_409() {
        let app = app();
        let mut body = ana();
        body["id"] = json!("p-1");
        let (status, _) = send(&app, Method::POST, "/patients", Some(body.clone())).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, Method::POST, "/patients", Some(body)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"], "conflict");
    }

    #[tokio::test]
    async fn list_is_paginated() {
        let app = app();
        for last in ["Lee", "Kim", "Park"] {
            let mut body = ana();
            body["lastName"] = json!(last);
            send(&app, Method::POST, "/patients", Some(body)).await;
        }

        let (status, body) = send(&app, Method::GET, "/patients?page=1&per_page=2", None).await;
        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["total"], 3);
        assert_eq!(body["per_page"], 2);
        assert_eq!(body["items"][0]["lastName"], "Kim");
        assert_eq!(body["items"][1]["lastName"], "Lee");
    }
}
