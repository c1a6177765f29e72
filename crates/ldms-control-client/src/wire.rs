// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wire framing: a 24-byte fixed header followed by a TLV attribute
//! block. Request and response share the same header shape; `errcode`
//! is meaningless (sent as zero) on a request and authoritative on a
//! response.

use crate::attr::{AttrId, Attribute};
use crate::error::ControlError;

pub const HEADER_LEN: usize = 24;
const MAGIC: u32 = 0x4C_44_4D_53; // "LDMS"

/// The 24-byte fixed header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub command_id: u16,
    pub flags: u16,
    /// Total message length, header included.
    pub msg_len: u32,
    pub request_id: u64,
    pub errcode: u32,
}

impl Header {
    pub fn to_bytes(self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        buf[0..4].copy_from_slice(&MAGIC.to_le_bytes());
        buf[4..6].copy_from_slice(&self.command_id.to_le_bytes());
        buf[6..8].copy_from_slice(&self.flags.to_le_bytes());
        buf[8..12].copy_from_slice(&self.msg_len.to_le_bytes());
        buf[12..20].copy_from_slice(&self.request_id.to_le_bytes());
        buf[20..24].copy_from_slice(&self.errcode.to_le_bytes());
        buf
    }

    pub fn from_bytes(buf: &[u8; HEADER_LEN]) -> Result<Header, ControlError> {
        let magic = u32::from_le_bytes(buf[0..4].try_into().unwrap());
        if magic != MAGIC {
            return Err(ControlError::ProtocolError(format!(
                "bad header magic: 0x{:08x}",
                magic
            )));
        }
        Ok(Header {
            command_id: u16::from_le_bytes(buf[4..6].try_into().unwrap()),
            flags: u16::from_le_bytes(buf[6..8].try_into().unwrap()),
            msg_len: u32::from_le_bytes(buf[8..12].try_into().unwrap()),
            request_id: u64::from_le_bytes(buf[12..20].try_into().unwrap()),
            errcode: u32::from_le_bytes(buf[20..24].try_into().unwrap()),
        })
    }
}

/// A request message: command, correlation id, and its attribute list.
#[derive(Debug, Clone)]
pub struct Request {
    pub command_id: u16,
    pub request_id: u64,
    pub attrs: Vec<Attribute>,
}

impl Request {
    /// Serialize header + TLV attribute block.
    pub fn encode(&self) -> Vec<u8> {
        let mut body = Vec::new();
        for attr in &self.attrs {
            let value = attr.value.as_bytes();
            body.extend_from_slice(&attr.id.code().to_le_bytes());
            body.extend_from_slice(&(value.len() as u32).to_le_bytes());
            body.extend_from_slice(value);
        }
        let header = Header {
            command_id: self.command_id,
            flags: 0,
            msg_len: (HEADER_LEN + body.len()) as u32,
            request_id: self.request_id,
            errcode: 0,
        };
        let mut out = Vec::with_capacity(HEADER_LEN + body.len());
        out.extend_from_slice(&header.to_bytes());
        out.extend_from_slice(&body);
        out
    }
}

/// A response message: correlation id, error code, and raw payload
/// bytes (either a JSON document or a plain message string, depending
/// on the operation -- see the operation template in §4.5).
#[derive(Debug, Clone)]
pub struct Response {
    pub request_id: u64,
    pub errcode: u32,
    pub payload: Vec<u8>,
}

/// Decode a TLV attribute block (used by the server side / tests; the
/// client only ever encodes attributes into requests).
pub fn decode_attrs(mut body: &[u8]) -> Result<Vec<Attribute>, ControlError> {
    let mut attrs = Vec::new();
    while !body.is_empty() {
        if body.len() < 6 {
            return Err(ControlError::ProtocolError(
                "truncated attribute TLV".to_string(),
            ));
        }
        let id = u16::from_le_bytes(body[0..2].try_into().unwrap());
        let len = u32::from_le_bytes(body[2..6].try_into().unwrap()) as usize;
        if body.len() < 6 + len {
            return Err(ControlError::ProtocolError(
                "attribute length exceeds buffer".to_string(),
            ));
        }
        let value = String::from_utf8_lossy(&body[6..6 + len]).into_owned();
        let attr_id = attr_id_from_code(id)
            .ok_or_else(|| ControlError::ProtocolError(format!("unknown attribute id {}", id)))?;
        attrs.push(Attribute {
            id: attr_id,
            value,
        });
        body = &body[6 + len..];
    }
    Ok(attrs)
}

fn attr_id_from_code(code: u16) -> Option<AttrId> {
    use AttrId::*;
    Some(match code {
        1 => Name,
        2 => Plugin,
        3 => Type,
        4 => Xprt,
        5 => Host,
        6 => Port,
        7 => Interval,
        8 => Offset,
        9 => Regex,
        10 => Stream,
        11 => Match,
        12 => Container,
        13 => Schema,
        14 => Metric,
        15 => Perm,
        16 => Auth,
        17 => String,
        18 => Push,
        19 => AutoInterval,
        20 => Instance,
        21 => Reset,
        _ => return None,
    })
}
