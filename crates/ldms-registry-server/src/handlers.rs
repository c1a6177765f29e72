// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! HTTP request handlers for the schema registry REST surface (§4.4).

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ldms_registry_core::Schema;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{ApiError, ApiJson};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct AddSchemaRequest {
    pub schema: Value,
}

/// `POST /` -- add a schema, return `{"id": "<id>"}`.
pub async fn add_schema(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<AddSchemaRequest>,
) -> Result<Response, ApiError> {
    let schema = Schema::from_json(&json!({ "schema": body.schema }))?;
    let id = state.store.add(&schema)?;
    Ok((StatusCode::OK, Json(json!({ "id": id }))).into_response())
}

/// `POST /names/<name>/versions` (and `/subjects/<name>/versions`): the
/// body's schema name must match the path segment (§4.4).
pub async fn add_schema_under_name(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    ApiJson(body): ApiJson<AddSchemaRequest>,
) -> Result<Response, ApiError> {
    let schema = Schema::from_json(&json!({ "schema": body.schema }))?;
    if schema.name != name {
        return Err(ApiError::bad_input(format!(
            "schema name {:?} does not match path name {:?}",
            schema.name, name
        )));
    }
    let id = state.store.add(&schema)?;
    Ok((StatusCode::OK, Json(json!({ "id": id }))).into_response())
}

/// `GET /schemas/ids/<id>`.
pub async fn get_schema(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let schema = state.store.get(&id)?;
    Ok((StatusCode::OK, Json(schema.as_json())).into_response())
}

/// `DELETE /schemas/ids/<id>` -- return `["<id>"]`.
pub async fn delete_schema(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    state.store.delete(&id)?;
    Ok((StatusCode::OK, Json(json!([id]))).into_response())
}

/// `GET /names` (alias `/subjects`).
pub async fn list_names(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let names = state.store.list_names(None)?;
    let names: Vec<&String> = names.keys().collect();
    Ok((StatusCode::OK, Json(names)).into_response())
}

/// `DELETE /names/<name>` -- delete every id registered under `name`.
pub async fn delete_name(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    let deleted = state.store.delete_name(&name)?;
    Ok((StatusCode::OK, Json(deleted)).into_response())
}

/// `GET /names/<name>/versions` (alias `/subjects/<name>/versions`).
pub async fn name_versions(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    let grouped = state.store.list_names(Some(&name))?;
    let ids = grouped.get(&name).cloned().unwrap_or_default();
    Ok((StatusCode::OK, Json(ids)).into_response())
}

/// `GET /digests`.
pub async fn list_digests(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let digests = state.store.list_digests(None)?;
    let hexes: Vec<&String> = digests.keys().collect();
    Ok((StatusCode::OK, Json(hexes)).into_response())
}

/// `GET /digests/<hex>/versions` -- lowercase comparison on `<hex>`.
pub async fn digest_versions(
    State(state): State<Arc<AppState>>,
    Path(hex): Path<String>,
) -> Result<Response, ApiError> {
    let hex = hex.to_lowercase();
    let grouped = state.store.list_digests(Some(&hex))?;
    let ids = grouped.get(&hex).cloned().unwrap_or_default();
    Ok((StatusCode::OK, Json(ids)).into_response())
}
