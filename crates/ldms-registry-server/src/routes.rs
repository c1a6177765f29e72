// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Router assembly: the §4.4 surface plus its `/subjects` aliases and
//! trailing-slash equivalents, wired to [`crate::state::AppState`] and
//! guarded by the optional Basic-auth middleware.

use std::sync::Arc;

use axum::middleware;
use axum::routing::{delete, get, post};
use axum::Router;

use crate::auth::{self, BasicAuth};
use crate::handlers;
use crate::state::AppState;

pub fn build_router(state: Arc<AppState>, basic_auth: Arc<Option<BasicAuth>>) -> Router {
    Router::new()
        .route("/", post(handlers::add_schema))
        .route("/schemas/ids/:id", get(handlers::get_schema))
        .route("/schemas/ids/:id/", get(handlers::get_schema))
        .route("/schemas/ids/:id", delete(handlers::delete_schema))
        .route("/schemas/ids/:id/", delete(handlers::delete_schema))
        .route("/names", get(handlers::list_names))
        .route("/names/", get(handlers::list_names))
        .route("/subjects", get(handlers::list_names))
        .route("/subjects/", get(handlers::list_names))
        .route("/names/:name", delete(handlers::delete_name))
        .route("/names/:name/", delete(handlers::delete_name))
        .route("/names/:name/versions", get(handlers::name_versions))
        .route("/names/:name/versions/", get(handlers::name_versions))
        .route("/subjects/:name/versions", get(handlers::name_versions))
        .route("/subjects/:name/versions/", get(handlers::name_versions))
        .route(
            "/names/:name/versions",
            post(handlers::add_schema_under_name),
        )
        .route(
            "/names/:name/versions/",
            post(handlers::add_schema_under_name),
        )
        .route(
            "/subjects/:name/versions",
            post(handlers::add_schema_under_name),
        )
        .route(
            "/subjects/:name/versions/",
            post(handlers::add_schema_under_name),
        )
        .route("/digests", get(handlers::list_digests))
        .route("/digests/", get(handlers::list_digests))
        .route("/digests/:hex/versions", get(handlers::digest_versions))
        .route("/digests/:hex/versions/", get(handlers::digest_versions))
        .route_layer(middleware::from_fn_with_state(
            basic_auth,
            auth::require_basic_auth,
        ))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use ldms_registry_store::{MemoryKv, RegistryStore};
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    fn router_without_auth() -> Router {
        let state = AppState::new(RegistryStore::new(Arc::new(MemoryKv::new())));
        build_router(state, Arc::new(None))
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn add_then_fetch_schema_roundtrips() {
        let app = router_without_auth();
        let body = json!({
            "schema": {
                "name": "meminfo",
                "type": "record",
                "fields": [{"name": "MemTotal", "type": "u64"}]
            }
        });
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let id = body_json(response).await["id"].as_str().unwrap().to_string();
        assert!(id.starts_with("meminfo-"));

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/schemas/ids/{}", id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/names")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let names = body_json(response).await;
        assert_eq!(names, json!(["meminfo"]));
    }

    #[tokio::test]
    async fn trailing_slash_is_equivalent_to_bare_path() {
        let app = router_without_auth();
        let with_slash = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/names/")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let without_slash = app
            .oneshot(
                Request::builder()
                    .uri("/names")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(with_slash.status(), without_slash.status());
    }

    #[tokio::test]
    async fn dangling_record_ref_is_500() {
        let app = router_without_auth();
        let body = json!({
            "schema": {
                "name": "bad",
                "type": "record",
                "fields": [{"name": "r", "type": "array", "items": "record", "record_type": "nope"}]
            }
        });
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn malformed_json_body_gets_the_uniform_error_shape() {
        let app = router_without_auth();
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/")
                    .header("content-type", "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["code"], json!(500));
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn unconfigured_auth_is_a_pass_through() {
        let app = router_without_auth();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/names")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn configured_auth_rejects_missing_credentials() {
        let state = AppState::new(RegistryStore::new(Arc::new(MemoryKv::new())));
        let auth_config = crate::config::AuthConfig {
            auth_type: "simple".to_string(),
            users: vec![crate::config::UserEntry::Pair([
                "alice".to_string(),
                "hunter2".to_string(),
            ])],
        };
        let app = build_router(
            state,
            Arc::new(BasicAuth::from_config(Some(&auth_config))),
        );
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/names")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
