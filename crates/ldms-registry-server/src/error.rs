// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Maps registry/schema errors onto HTTP status codes (§7).

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ldms_registry_core::SchemaError;
use ldms_registry_store::RegistryError;
use serde::Serialize;

/// JSON error body returned by every failing handler.
#[derive(Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: u16,
}

impl ApiError {
    fn new(code: StatusCode, message: impl Into<String>) -> ApiError {
        ApiError {
            error: message.into(),
            code: code.as_u16(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> ApiError {
        ApiError::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn bad_input(message: impl Into<String>) -> ApiError {
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

impl From<SchemaError> for ApiError {
    fn from(e: SchemaError) -> Self {
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, rejection.body_text())
    }
}

/// A `Json<T>` extractor whose rejection is the uniform `ApiError` body
/// instead of axum's built-in plaintext rejection, so a malformed or
/// non-JSON request body still gets the §7 `BadSchema -> 500` shape.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(ApiJson(value))
    }
}

/// §7: `BadSchema`/`InvalidArgument` -> 500, `BackendUnavailable`/
/// `AllBackendsDown` -> 503, `SchemaNotFound` -> 404.
impl From<RegistryError> for ApiError {
    fn from(e: RegistryError) -> Self {
        let status = match &e {
            RegistryError::BadSchema(_)
            | RegistryError::DanglingRecordRef(_)
            | RegistryError::DuplicateFieldName(_)
            | RegistryError::InvalidArgument(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RegistryError::BackendUnavailable(_) | RegistryError::AllBackendsDown => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            RegistryError::SchemaNotFound(_) => StatusCode::NOT_FOUND,
        };
        ApiError::new(status, e.to_string())
    }
}
