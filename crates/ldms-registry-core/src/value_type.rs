// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The closed set of metric value kinds and their string/descriptor
//! translation tables.

use serde::{Deserialize, Serialize};

/// A metric value kind.
///
/// Partitioned into scalars, fixed-length arrays of each scalar, `List`
/// (dynamically-sized heap region), `RecordType` (named composite
/// descriptor), `RecordInst` (instance of a record -- only appears in
/// live sets, never in a stored schema), `RecordArray` (array of record
/// instances referencing a `RecordType`), and `ListEntry` (virtual, never
/// serialized on its own).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Char,
    U8,
    S8,
    U16,
    S16,
    U32,
    S32,
    U64,
    S64,
    F32,
    D64,
    Timestamp,

    CharArray,
    U8Array,
    S8Array,
    U16Array,
    S16Array,
    U32Array,
    S32Array,
    U64Array,
    S64Array,
    F32Array,
    D64Array,
    TimestampArray,

    List,
    ListEntry,
    RecordType,
    RecordInst,
    RecordArray,
}

impl ValueType {
    /// Parse a type string, accepting both canonical compact forms
    /// (`"u32"`) and the Avro-flavored compatibility aliases
    /// (`"int"` -> S32, `"long"` -> S64, `"float"` -> F32, `"double"` -> D64).
    pub fn from_str_lossy(s: &str) -> Option<ValueType> {
        use ValueType::*;
        Some(match s {
            "int" => S32,
            "long" => S64,
            "float" => F32,
            "double" => D64,

            "char" => Char,
            "u8" => U8,
            "s8" => S8,
            "u16" => U16,
            "s16" => S16,
            "u32" => U32,
            "s32" => S32,
            "u64" => U64,
            "s64" => S64,
            "f32" => F32,
            "d64" => D64,
            "timestamp" => Timestamp,

            "char[]" => CharArray,
            "u8[]" => U8Array,
            "s8[]" => S8Array,
            "u16[]" => U16Array,
            "s16[]" => S16Array,
            "u32[]" => U32Array,
            "s32[]" => S32Array,
            "u64[]" => U64Array,
            "s64[]" => S64Array,
            "f32[]" => F32Array,
            "d64[]" => D64Array,
            "timestamp[]" => TimestampArray,

            "record" => RecordType,
            "record[]" => RecordArray,
            "list" => List,

            _ => return None,
        })
    }

    /// Emit the canonical compact string for this kind (inverse map,
    /// canonical forms only -- no aliases).
    pub fn canonical_str(self) -> &'static str {
        use ValueType::*;
        match self {
            Char => "char",
            U8 => "u8",
            S8 => "s8",
            U16 => "u16",
            S16 => "s16",
            U32 => "u32",
            S32 => "s32",
            U64 => "u64",
            S64 => "s64",
            F32 => "f32",
            D64 => "d64",
            Timestamp => "timestamp",

            CharArray => "char[]",
            U8Array => "u8[]",
            S8Array => "s8[]",
            U16Array => "u16[]",
            S16Array => "s16[]",
            U32Array => "u32[]",
            S32Array => "s32[]",
            U64Array => "u64[]",
            S64Array => "s64[]",
            F32Array => "f32[]",
            D64Array => "d64[]",
            TimestampArray => "timestamp[]",

            List => "list",
            ListEntry => "list_entry",
            RecordType => "record",
            RecordInst => "record_inst",
            RecordArray => "record[]",
        }
    }

    /// 4-byte little-endian code used in the digest and in the wire
    /// cross-mapping. Stable across releases -- never renumber.
    pub fn code(self) -> u32 {
        use ValueType::*;
        match self {
            Char => 1,
            U8 => 2,
            S8 => 3,
            U16 => 4,
            S16 => 5,
            U32 => 6,
            S32 => 7,
            U64 => 8,
            S64 => 9,
            F32 => 10,
            D64 => 11,

            CharArray => 12,
            U8Array => 13,
            S8Array => 14,
            U16Array => 15,
            S16Array => 16,
            U32Array => 17,
            S32Array => 18,
            U64Array => 19,
            S64Array => 20,
            F32Array => 21,
            D64Array => 22,

            List => 23,
            ListEntry => 24,
            RecordType => 25,
            RecordInst => 26,
            RecordArray => 27,
            Timestamp => 28,
            TimestampArray => 29,
        }
    }

    /// Is this a scalar (non-array, non-composite) kind?
    pub fn is_scalar(self) -> bool {
        use ValueType::*;
        matches!(
            self,
            Char | U8 | S8 | U16 | S16 | U32 | S32 | U64 | S64 | F32 | D64 | Timestamp
        )
    }

    /// Map a scalar item kind to its fixed-length array kind. Returns
    /// `RecordArray` for `RecordType`, matching the registry's `items:
    /// "record"` convention.
    pub fn array_kind_of(self) -> Option<ValueType> {
        use ValueType::*;
        Some(match self {
            Char => CharArray,
            U8 => U8Array,
            S8 => S8Array,
            U16 => U16Array,
            S16 => S16Array,
            U32 => U32Array,
            S32 => S32Array,
            U64 => U64Array,
            S64 => S64Array,
            F32 => F32Array,
            D64 => D64Array,
            Timestamp => TimestampArray,
            RecordType => RecordArray,
            other if matches!(
                other,
                CharArray
                    | U8Array
                    | S8Array
                    | U16Array
                    | S16Array
                    | U32Array
                    | S32Array
                    | U64Array
                    | S64Array
                    | F32Array
                    | D64Array
                    | TimestampArray
                    | RecordArray
            ) =>
            {
                other
            }
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_resolve_to_canonical_kinds() {
        assert_eq!(ValueType::from_str_lossy("int"), Some(ValueType::S32));
        assert_eq!(ValueType::from_str_lossy("long"), Some(ValueType::S64));
        assert_eq!(ValueType::from_str_lossy("float"), Some(ValueType::F32));
        assert_eq!(ValueType::from_str_lossy("double"), Some(ValueType::D64));
    }

    #[test]
    fn canonical_roundtrip_excludes_aliases() {
        for kind in [ValueType::S32, ValueType::S64, ValueType::F32, ValueType::D64] {
            let s = kind.canonical_str();
            assert_ne!(s, "int");
            assert_ne!(s, "long");
            assert_ne!(s, "float");
            assert_ne!(s, "double");
            assert_eq!(ValueType::from_str_lossy(s), Some(kind));
        }
    }

    #[test]
    fn unknown_string_is_none() {
        assert_eq!(ValueType::from_str_lossy("bogus"), None);
    }

    #[test]
    fn array_kind_of_scalar() {
        assert_eq!(ValueType::U32.array_kind_of(), Some(ValueType::U32Array));
        assert_eq!(
            ValueType::RecordType.array_kind_of(),
            Some(ValueType::RecordArray)
        );
    }
}
