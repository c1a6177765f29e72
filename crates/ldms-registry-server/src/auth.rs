// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! HTTP Basic auth (§4.4): a predicate that runs before every handler.
//! Pass-through when no `auth` section is configured; `401` on missing
//! or wrong credentials otherwise.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::TypedHeader;
use headers::authorization::Basic;
use headers::Authorization;

use crate::config::AuthConfig;
use crate::error::ApiError;

/// Checks a decoded `username:password` pair against the configured
/// user list. `None` means no auth is configured -- every credential
/// check passes.
pub struct BasicAuth {
    users: Vec<(String, String)>,
}

impl BasicAuth {
    pub fn from_config(config: Option<&AuthConfig>) -> Option<BasicAuth> {
        let config = config?;
        let users = config
            .users
            .iter()
            .map(|u| (u.username().to_string(), u.password().to_string()))
            .collect();
        Some(BasicAuth { users })
    }

    fn check(&self, username: &str, password: &str) -> bool {
        self.users
            .iter()
            .any(|(u, p)| u == username && p == password)
    }
}

/// Middleware entry point: `from_fn_with_state` wires this in front of
/// the whole router. When `auth` is unconfigured, requests pass
/// straight through (§4.4 "if no auth is configured, requests pass
/// through"). The `Authorization: Basic` header is decoded by the
/// `headers`/`axum-extra` typed-header extractor rather than by hand;
/// `Option` absorbs a missing or malformed header into `None` instead
/// of rejecting the request before this middleware gets to choose the
/// response shape.
pub async fn require_basic_auth(
    State(auth): State<Arc<Option<BasicAuth>>>,
    basic: Option<TypedHeader<Authorization<Basic>>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(auth) = auth.as_ref() else {
        return next.run(request).await;
    };

    match basic {
        Some(TypedHeader(Authorization(basic)))
            if auth.check(basic.username(), basic.password()) =>
        {
            next.run(request).await
        }
        Some(_) => ApiError::unauthorized("invalid credentials").into_response(),
        None => ApiError::unauthorized("missing or malformed Authorization header")
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AuthConfig, UserEntry};

    fn config() -> AuthConfig {
        AuthConfig {
            auth_type: "simple".to_string(),
            users: vec![UserEntry::Named {
                username: "alice".to_string(),
                password: "hunter2".to_string(),
            }],
        }
    }

    #[test]
    fn no_config_means_no_auth() {
        assert!(BasicAuth::from_config(None).is_none());
    }

    #[test]
    fn correct_credentials_pass() {
        let auth = BasicAuth::from_config(Some(&config())).unwrap();
        assert!(auth.check("alice", "hunter2"));
    }

    #[test]
    fn wrong_password_fails() {
        let auth = BasicAuth::from_config(Some(&config())).unwrap();
        assert!(!auth.check("alice", "wrong"));
    }

    #[test]
    fn typed_basic_header_exposes_username_and_password() {
        let basic = Basic::new("alice", "hunter2");
        assert_eq!(basic.username(), "alice");
        assert_eq!(basic.password(), "hunter2");
    }
}
