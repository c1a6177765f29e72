// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use crate::error::ConfigUtilError;

/// Units accepted by [`parse_interval_us`], longest suffix first so that
/// `"us"`/`"ms"` are tried before the single-character `"s"`.
const UNITS: &[(&str, f64)] = &[
    ("us", 1.0),
    ("ms", 1_000.0),
    ("h", 3_600_000_000.0),
    ("m", 60_000_000.0),
    ("s", 1_000_000.0),
    ("d", 86_400_000_000.0),
];

/// Parse `<number><unit>` (case-insensitive unit, exactly one unit, no
/// trailing characters) into a microsecond count. A plain integer with
/// no unit passes through unchanged.
pub fn parse_interval_us(s: &str) -> Result<i64, ConfigUtilError> {
    if s.is_empty() {
        return Err(ConfigUtilError::BadInterval(s.to_string()));
    }
    if let Ok(n) = s.parse::<i64>() {
        return Ok(n);
    }
    let lower = s.to_lowercase();
    for (unit, factor) in UNITS {
        if let Some(number) = lower.strip_suffix(unit) {
            if number.is_empty() {
                return Err(ConfigUtilError::BadInterval(s.to_string()));
            }
            let value: f64 = number
                .parse()
                .map_err(|_| ConfigUtilError::BadInterval(s.to_string()))?;
            return Ok((value * factor) as i64);
        }
    }
    Err(ConfigUtilError::BadInterval(s.to_string()))
}

/// Clamp `offset_us` to at most half of `interval_us`; an absent offset
/// normalizes to zero.
pub fn check_offset(interval_us: i64, offset_us: Option<i64>) -> i64 {
    match offset_us {
        Some(offset) if offset > interval_us / 2 => interval_us / 2,
        Some(offset) => offset,
        None => 0,
    }
}
