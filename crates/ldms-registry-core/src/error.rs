// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use std::fmt;

/// Errors raised while parsing, validating, or cross-mapping a schema.
///
/// Corresponds to the `BadSchema` / `DanglingRecordRef` /
/// `DuplicateFieldName` error kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// A required JSON field was absent. The string names the field.
    MissingField(&'static str),
    /// A field or schema `type` string did not resolve to a known kind.
    UnknownType(String),
    /// Two fields in the same record or schema share a name.
    DuplicateFieldName(String),
    /// The top-level schema `type` was not `"record"`.
    UnsupportedTopLevel(String),
    /// A `RecordArray` referenced a `record_type` name that does not
    /// match any `Record` field appearing earlier in the schema.
    DanglingRecordRef(String),
    /// The input was not valid JSON at all.
    MalformedJson(String),
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaError::MissingField(name) => write!(f, "missing field: {}", name),
            SchemaError::UnknownType(s) => write!(f, "unknown type: {}", s),
            SchemaError::DuplicateFieldName(name) => {
                write!(f, "duplicate field name: {}", name)
            }
            SchemaError::UnsupportedTopLevel(t) => {
                write!(f, "unsupported top-level schema type: {}", t)
            }
            SchemaError::DanglingRecordRef(name) => {
                write!(f, "record_array refers to unknown record type: {}", name)
            }
            SchemaError::MalformedJson(msg) => write!(f, "malformed schema JSON: {}", msg),
        }
    }
}

impl std::error::Error for SchemaError {}

impl From<serde_json::Error> for SchemaError {
    fn from(e: serde_json::Error) -> Self {
        SchemaError::MalformedJson(e.to_string())
    }
}
