// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use crate::error::ConfigUtilError;

/// Expand a comma-separated list of hostlist expressions
/// (`"node[01-04]"`, `"a,b[1-2],c"`) into the ordered list of literal
/// hostnames. A bracketed range preserves the zero-padding width of its
/// first endpoint (`[01-04]` yields `01`, `02`, `03`, `04`).
pub fn expand_hostlist(spec: &str) -> Result<Vec<String>, ConfigUtilError> {
    let mut out = Vec::new();
    for token in split_top_level_commas(spec) {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        out.extend(expand_token(token)?);
    }
    Ok(out)
}

fn split_top_level_commas(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

fn expand_token(token: &str) -> Result<Vec<String>, ConfigUtilError> {
    let open = match token.find('[') {
        Some(open) => open,
        None => return Ok(vec![token.to_string()]),
    };
    let close = token
        .rfind(']')
        .filter(|&c| c > open)
        .ok_or_else(|| ConfigUtilError::BadHostRange(token.to_string()))?;
    let prefix = &token[..open];
    let suffix = &token[close + 1..];
    let body = &token[open + 1..close];

    let mut numbers = Vec::new();
    for item in body.split(',') {
        let item = item.trim();
        if item.is_empty() {
            return Err(ConfigUtilError::BadHostRange(token.to_string()));
        }
        match item.split_once('-') {
            Some((lo, hi)) => {
                let width = lo.len();
                let start: u64 = lo
                    .parse()
                    .map_err(|_| ConfigUtilError::BadHostRange(token.to_string()))?;
                let end: u64 = hi
                    .parse()
                    .map_err(|_| ConfigUtilError::BadHostRange(token.to_string()))?;
                if start > end {
                    return Err(ConfigUtilError::BadHostRange(token.to_string()));
                }
                for n in start..=end {
                    numbers.push(format!("{:0width$}", n, width = width));
                }
            }
            None => {
                let width = item.len();
                let n: u64 = item
                    .parse()
                    .map_err(|_| ConfigUtilError::BadHostRange(token.to_string()))?;
                numbers.push(format!("{:0width$}", n, width = width));
            }
        }
    }

    Ok(numbers
        .into_iter()
        .map(|n| format!("{}{}{}", prefix, n, suffix))
        .collect())
}
