// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! YAML configuration (§6.6): `schema_registry: {etcd_prefix, listen,
//! keyfile, certfile, auth}` plus a `members` list of KV endpoints.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Top-level configuration document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub schema_registry: SchemaRegistryConfig,
    #[serde(default)]
    pub members: Vec<Member>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaRegistryConfig {
    #[serde(default = "default_etcd_prefix")]
    pub etcd_prefix: String,
    #[serde(default = "default_listen")]
    pub listen: String,
    #[serde(default)]
    pub keyfile: Option<String>,
    #[serde(default)]
    pub certfile: Option<String>,
    #[serde(default)]
    pub auth: Option<AuthConfig>,
}

fn default_etcd_prefix() -> String {
    "/ldms/registry".to_string()
}

fn default_listen() -> String {
    "*:8080".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(rename = "type", default = "default_auth_type")]
    pub auth_type: String,
    pub users: Vec<UserEntry>,
}

fn default_auth_type() -> String {
    "simple".to_string()
}

/// A user credential, accepted either as `{"username":.., "password":..}`
/// or as a bare two-element array (§4.4 "also accepted as 2-element
/// arrays").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserEntry {
    Named { username: String, password: String },
    Pair([String; 2]),
}

impl UserEntry {
    pub fn username(&self) -> &str {
        match self {
            UserEntry::Named { username, .. } => username,
            UserEntry::Pair([username, _]) => username,
        }
    }

    pub fn password(&self) -> &str {
        match self {
            UserEntry::Named { password, .. } => password,
            UserEntry::Pair([_, password]) => password,
        }
    }
}

/// Listener address parsed from the `"addr:port"` convention (§4.4);
/// `"*"` binds all interfaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenAddr {
    pub host: String,
    pub port: u16,
}

impl ListenAddr {
    pub fn parse(s: &str) -> Result<ListenAddr, String> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| format!("malformed listen address: {}", s))?;
        let port: u16 = port
            .parse()
            .map_err(|_| format!("malformed listen port: {}", s))?;
        let host = if host == "*" { "0.0.0.0" } else { host };
        Ok(ListenAddr {
            host: host.to_string(),
            port,
        })
    }

    pub fn socket_addr(&self) -> Result<std::net::SocketAddr, String> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| format!("invalid listen address: {}", e))
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Config, String> {
        let text = fs::read_to_string(path)
            .map_err(|e| format!("failed to read config {}: {}", path.display(), e))?;
        serde_yaml::from_str(&text).map_err(|e| format!("failed to parse config: {}", e))
    }

    /// `true` when both `keyfile` and `certfile` are configured (§4.4).
    pub fn tls_enabled(&self) -> bool {
        self.schema_registry.keyfile.is_some() && self.schema_registry.certfile.is_some()
    }
}
