// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Metric field and schema entities: JSON (de)serialization, digest, and
//! the compatibility predicate.

use std::collections::{HashMap, HashSet};

use serde_json::{json, Value};
use sha2::{Digest as _, Sha256};

use crate::error::SchemaError;
use crate::value_type::ValueType;

/// A single field in a schema, tagged by shape rather than by an
/// inheritance tree (the original `SchemaMetric` class hierarchy).
#[derive(Debug, Clone, PartialEq)]
pub enum MetricField {
    Primitive {
        name: String,
        kind: ValueType,
        is_meta: bool,
        units: Option<String>,
        doc: Option<String>,
    },
    Array {
        name: String,
        item_kind: ValueType,
        length: i64,
        is_meta: bool,
        units: Option<String>,
        doc: Option<String>,
    },
    List {
        name: String,
        heap_size: i64,
        is_meta: bool,
        units: Option<String>,
        doc: Option<String>,
    },
    Record {
        name: String,
        fields: Vec<MetricField>,
        is_meta: bool,
        units: Option<String>,
        doc: Option<String>,
    },
    RecordArray {
        name: String,
        record_type_name: String,
        length: i64,
        is_meta: bool,
        units: Option<String>,
        doc: Option<String>,
    },
}

/// The native metric-set descriptor form a collector library builds
/// metric sets from (§4.1 "Cross-mapping"). Produced by
/// [`Schema::to_descriptors`]; `rec_def` carries the nested descriptors
/// for a `Record` field, or the referenced record's descriptors for a
/// `RecordArray` field.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricDescriptor {
    pub name: String,
    pub metric_type: ValueType,
    pub count: Option<i64>,
    pub meta: Option<bool>,
    pub units: Option<String>,
    pub rec_def: Option<Vec<MetricDescriptor>>,
}

impl MetricField {
    pub fn name(&self) -> &str {
        match self {
            MetricField::Primitive { name, .. }
            | MetricField::Array { name, .. }
            | MetricField::List { name, .. }
            | MetricField::Record { name, .. }
            | MetricField::RecordArray { name, .. } => name,
        }
    }

    fn kind(&self) -> ValueType {
        match self {
            MetricField::Primitive { kind, .. } => *kind,
            MetricField::Array { item_kind, .. } => {
                item_kind.array_kind_of().unwrap_or(ValueType::RecordArray)
            }
            MetricField::List { .. } => ValueType::List,
            MetricField::Record { .. } => ValueType::RecordType,
            MetricField::RecordArray { .. } => ValueType::RecordArray,
        }
    }

    /// Parse a single field from its JSON object form.
    ///
    /// `{"name", "type", ["doc"], ["units"], ["is_meta"], ...type-specific}`
    pub fn from_json(obj: &Value) -> Result<MetricField, SchemaError> {
        let name = obj
            .get("name")
            .and_then(Value::as_str)
            .ok_or(SchemaError::MissingField("name"))?
            .to_string();
        let type_str = obj
            .get("type")
            .and_then(Value::as_str)
            .ok_or(SchemaError::MissingField("type"))?;
        let is_meta = obj.get("is_meta").and_then(Value::as_bool).unwrap_or(false);
        let units = obj
            .get("units")
            .and_then(Value::as_str)
            .map(|s| s.to_string());
        let doc = obj.get("doc").and_then(Value::as_str).map(|s| s.to_string());

        match type_str {
            "record" => {
                let fields_json = obj
                    .get("fields")
                    .and_then(Value::as_array)
                    .ok_or(SchemaError::MissingField("fields"))?;
                let mut seen = HashSet::new();
                let mut fields = Vec::with_capacity(fields_json.len());
                for f in fields_json {
                    let field = MetricField::from_json(f)?;
                    if !seen.insert(field.name().to_string()) {
                        return Err(SchemaError::DuplicateFieldName(field.name().to_string()));
                    }
                    fields.push(field);
                }
                Ok(MetricField::Record {
                    name,
                    fields,
                    is_meta,
                    units,
                    doc,
                })
            }
            "array" => {
                let items = obj
                    .get("items")
                    .and_then(Value::as_str)
                    .ok_or(SchemaError::MissingField("items"))?;
                let length = obj.get("len").and_then(Value::as_i64).unwrap_or(-1);
                if items == "record" {
                    let record_type_name = obj
                        .get("record_type")
                        .and_then(Value::as_str)
                        .ok_or(SchemaError::MissingField("record_type"))?
                        .to_string();
                    Ok(MetricField::RecordArray {
                        name,
                        record_type_name,
                        length,
                        is_meta,
                        units,
                        doc,
                    })
                } else {
                    let item_kind = ValueType::from_str_lossy(items)
                        .ok_or_else(|| SchemaError::UnknownType(items.to_string()))?;
                    Ok(MetricField::Array {
                        name,
                        item_kind,
                        length,
                        is_meta,
                        units,
                        doc,
                    })
                }
            }
            "list" => {
                let heap_size = obj.get("heap_sz").and_then(Value::as_i64).unwrap_or(-1);
                Ok(MetricField::List {
                    name,
                    heap_size,
                    is_meta,
                    units,
                    doc,
                })
            }
            other => {
                let kind = ValueType::from_str_lossy(other)
                    .ok_or_else(|| SchemaError::UnknownType(other.to_string()))?;
                Ok(MetricField::Primitive {
                    name,
                    kind,
                    is_meta,
                    units,
                    doc,
                })
            }
        }
    }

    /// Emit the canonical JSON object form of this field.
    pub fn as_json(&self) -> Value {
        match self {
            MetricField::Primitive {
                name,
                kind,
                is_meta,
                units,
                doc,
            } => json!({
                "name": name,
                "type": kind.canonical_str(),
                "is_meta": is_meta,
                "units": units,
                "doc": doc,
            }),
            MetricField::Array {
                name,
                item_kind,
                length,
                is_meta,
                units,
                doc,
            } => json!({
                "name": name,
                "type": "array",
                "items": item_kind.canonical_str(),
                "len": length,
                "is_meta": is_meta,
                "units": units,
                "doc": doc,
            }),
            MetricField::List {
                name,
                heap_size,
                is_meta,
                units,
                doc,
            } => json!({
                "name": name,
                "type": "list",
                "heap_sz": heap_size,
                "is_meta": is_meta,
                "units": units,
                "doc": doc,
            }),
            MetricField::Record {
                name,
                fields,
                is_meta,
                units,
                doc,
            } => json!({
                "name": name,
                "type": "record",
                "fields": fields.iter().map(MetricField::as_json).collect::<Vec<_>>(),
                "is_meta": is_meta,
                "units": units,
                "doc": doc,
            }),
            MetricField::RecordArray {
                name,
                record_type_name,
                length,
                is_meta,
                units,
                doc,
            } => json!({
                "name": name,
                "type": "array",
                "items": "record",
                "record_type": record_type_name,
                "len": length,
                "is_meta": is_meta,
                "units": units,
                "doc": doc,
            }),
        }
    }

    /// Append this field's digest contribution to `hasher`.
    ///
    /// For primitive/array/list/record-array fields: `name` bytes then
    /// the 4-byte little-endian kind code. For records: recurse into
    /// nested fields first, then the record's own name and kind.
    /// Array length, list heap size, `units`, `is_meta`, and `doc` never
    /// enter the digest.
    fn update_digest(&self, hasher: &mut Sha256) {
        if let MetricField::Record { fields, .. } = self {
            for field in fields {
                field.update_digest(hasher);
            }
        }
        hasher.update(self.name().as_bytes());
        hasher.update(self.kind().code().to_le_bytes());
    }

    /// Field-compatibility predicate (§3.5).
    pub fn compatible(&self, other: &MetricField) -> bool {
        match (self, other) {
            (
                MetricField::Primitive {
                    name: n0,
                    kind: k0,
                    is_meta: m0,
                    units: u0,
                    ..
                },
                MetricField::Primitive {
                    name: n1,
                    kind: k1,
                    is_meta: m1,
                    units: u1,
                    ..
                },
            ) => n0 == n1 && k0 == k1 && m0 == m1 && u0 == u1,
            (
                MetricField::Array {
                    name: n0,
                    item_kind: i0,
                    length: l0,
                    is_meta: m0,
                    units: u0,
                    ..
                },
                MetricField::Array {
                    name: n1,
                    item_kind: i1,
                    length: l1,
                    is_meta: m1,
                    units: u1,
                    ..
                },
            ) => n0 == n1 && i0 == i1 && l0 == l1 && m0 == m1 && u0 == u1,
            (
                MetricField::List {
                    name: n0,
                    is_meta: m0,
                    units: u0,
                    ..
                },
                MetricField::List {
                    name: n1,
                    is_meta: m1,
                    units: u1,
                    ..
                },
            ) => n0 == n1 && m0 == m1 && u0 == u1, // heap_size ignored
            (
                MetricField::Record {
                    name: n0,
                    fields: f0,
                    is_meta: m0,
                    units: u0,
                    ..
                },
                MetricField::Record {
                    name: n1,
                    fields: f1,
                    is_meta: m1,
                    units: u1,
                    ..
                },
            ) => {
                n0 == n1
                    && m0 == m1
                    && u0 == u1
                    && f0.len() == f1.len()
                    && f0.iter().zip(f1.iter()).all(|(a, b)| a.compatible(b))
            }
            (
                MetricField::RecordArray {
                    name: n0,
                    record_type_name: r0,
                    length: l0,
                    is_meta: m0,
                    units: u0,
                    ..
                },
                MetricField::RecordArray {
                    name: n1,
                    record_type_name: r1,
                    length: l1,
                    is_meta: m1,
                    units: u1,
                    ..
                },
            ) => n0 == n1 && r0 == r1 && l0 == l1 && m0 == m1 && u0 == u1,
            _ => false,
        }
    }

    /// Build this field's native descriptor form (§4.1 "Cross-mapping").
    ///
    /// `records` maps every `Record` name already realized earlier in
    /// the same schema to its descriptor list; a `RecordArray` looks
    /// its `record_type` up there and fails with `DanglingRecordRef` if
    /// it has not been realized yet (§4.6).
    fn to_descriptor(
        &self,
        records: &HashMap<String, Vec<MetricDescriptor>>,
    ) -> Result<MetricDescriptor, SchemaError> {
        match self {
            MetricField::Primitive {
                name,
                kind,
                is_meta,
                units,
                ..
            } => Ok(MetricDescriptor {
                name: name.clone(),
                metric_type: *kind,
                count: None,
                meta: Some(*is_meta),
                units: units.clone(),
                rec_def: None,
            }),
            MetricField::Array {
                name,
                item_kind,
                length,
                is_meta,
                units,
                ..
            } => {
                let metric_type = item_kind
                    .array_kind_of()
                    .ok_or_else(|| SchemaError::UnknownType(item_kind.canonical_str().to_string()))?;
                Ok(MetricDescriptor {
                    name: name.clone(),
                    metric_type,
                    count: Some(*length),
                    meta: Some(*is_meta),
                    units: units.clone(),
                    rec_def: None,
                })
            }
            MetricField::List {
                name,
                heap_size,
                is_meta,
                units,
                ..
            } => Ok(MetricDescriptor {
                name: name.clone(),
                metric_type: ValueType::List,
                count: Some(*heap_size),
                meta: Some(*is_meta),
                units: units.clone(),
                rec_def: None,
            }),
            MetricField::Record {
                name,
                fields,
                is_meta,
                units,
                ..
            } => {
                let nested = fields
                    .iter()
                    .map(|f| f.to_descriptor(records))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(MetricDescriptor {
                    name: name.clone(),
                    metric_type: ValueType::RecordType,
                    count: None,
                    meta: Some(*is_meta),
                    units: units.clone(),
                    rec_def: Some(nested),
                })
            }
            MetricField::RecordArray {
                name,
                record_type_name,
                length,
                is_meta,
                units,
                ..
            } => {
                let rec_def = records
                    .get(record_type_name)
                    .cloned()
                    .ok_or_else(|| SchemaError::DanglingRecordRef(record_type_name.clone()))?;
                Ok(MetricDescriptor {
                    name: name.clone(),
                    metric_type: ValueType::RecordArray,
                    count: Some(*length),
                    meta: Some(*is_meta),
                    units: units.clone(),
                    rec_def: Some(rec_def),
                })
            }
        }
    }
}

/// A named ordered list of metric fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub name: String,
    pub doc: Option<String>,
    pub fields: Vec<MetricField>,
}

impl Schema {
    /// Parse a schema from either `{"schema": {...}}` or `{...}` directly.
    pub fn from_json(value: &Value) -> Result<Schema, SchemaError> {
        let obj = value.get("schema").unwrap_or(value);
        let type_str = obj
            .get("type")
            .and_then(Value::as_str)
            .ok_or(SchemaError::MissingField("type"))?;
        if type_str != "record" {
            return Err(SchemaError::UnsupportedTopLevel(type_str.to_string()));
        }
        let name = obj
            .get("name")
            .and_then(Value::as_str)
            .ok_or(SchemaError::MissingField("name"))?
            .to_string();
        let doc = obj.get("doc").and_then(Value::as_str).map(|s| s.to_string());
        let fields_json = obj
            .get("fields")
            .and_then(Value::as_array)
            .ok_or(SchemaError::MissingField("fields"))?;

        let mut seen = HashSet::new();
        let mut fields = Vec::with_capacity(fields_json.len());
        let mut record_names = HashSet::new();
        for f in fields_json {
            let field = MetricField::from_json(f)?;
            if !seen.insert(field.name().to_string()) {
                return Err(SchemaError::DuplicateFieldName(field.name().to_string()));
            }
            if let MetricField::Record { name, .. } = &field {
                record_names.insert(name.clone());
            }
            if let MetricField::RecordArray {
                record_type_name, ..
            } = &field
            {
                if !record_names.contains(record_type_name) {
                    return Err(SchemaError::DanglingRecordRef(record_type_name.clone()));
                }
            }
            fields.push(field);
        }

        Ok(Schema { name, doc, fields })
    }

    pub fn from_json_str(s: &str) -> Result<Schema, SchemaError> {
        let value: Value = serde_json::from_str(s)?;
        Schema::from_json(&value)
    }

    /// Emit `{"schema": {...}}`.
    pub fn as_json(&self) -> Value {
        json!({
            "schema": {
                "name": self.name,
                "type": "record",
                "doc": self.doc,
                "fields": self.fields.iter().map(MetricField::as_json).collect::<Vec<_>>(),
            }
        })
    }

    pub fn as_json_string(&self) -> String {
        self.as_json().to_string()
    }

    /// SHA-256 digest over the structural fingerprint (§3.3). Pure
    /// function of the field list; array length, list heap size,
    /// `units`, `is_meta`, and `doc` are excluded by design.
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        for field in &self.fields {
            field.update_digest(&mut hasher);
        }
        hasher.finalize().into()
    }

    pub fn digest_hex(&self) -> String {
        self.digest().iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// `"<name>-<hex(digest)>"`.
    pub fn id(&self) -> String {
        format!("{}-{}", self.name, self.digest_hex())
    }

    /// Two schemas are compatible iff their field lists have equal
    /// length and every field pair is field-compatible (§3.5).
    pub fn compatible(&self, other: &Schema) -> bool {
        self.fields.len() == other.fields.len()
            && self
                .fields
                .iter()
                .zip(other.fields.iter())
                .all(|(a, b)| a.compatible(b))
    }

    /// Materialize this schema into the native metric-set descriptor
    /// form a collector library builds a set from (§4.1 "Cross-mapping",
    /// §4.6 "Record-array dependency ordering").
    ///
    /// Fields are realized in source order, keeping a name -> descriptor
    /// map of every `Record` realized so far; a `RecordArray` whose
    /// `record_type` has not yet been realized fails with
    /// `DanglingRecordRef`. `Schema::from_json` already rejects this
    /// ordering at parse time, so the only way to observe the error here
    /// is a `Schema` built by hand out of order.
    pub fn to_descriptors(&self) -> Result<Vec<MetricDescriptor>, SchemaError> {
        let mut records: HashMap<String, Vec<MetricDescriptor>> = HashMap::new();
        let mut out = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            let descriptor = field.to_descriptor(&records)?;
            if let MetricField::Record { name, .. } = field {
                records.insert(name.clone(), descriptor.rec_def.clone().unwrap_or_default());
            }
            out.push(descriptor);
        }
        Ok(out)
    }
}
