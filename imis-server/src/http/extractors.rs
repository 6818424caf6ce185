//! Custom Axum extractors

use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::Json;
use imis_core::ValidationError;
use serde::de::DeserializeOwned;

use super::error::ApiError;

/// JSON body whose parse failures become validation errors.
///
/// Axum's own `Json` rejects with a plain-text body; this keeps every 400
/// in the structured error format.
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::Validation(ValidationError::Malformed(rejection.body_text())))?;
        Ok(Self(value))
    }
}

/// Query string with the same structured rejection as [`ValidJson`].
pub struct ValidQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ValidQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::Validation(ValidationError::Malformed(rejection.body_text())))?;
        Ok(Self(value))
    }
}
