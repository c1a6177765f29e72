// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use std::fmt;

/// POSIX errno values the operation catalog returns, matching the
/// external caller convention (`errno.ENOTCONN`, `errno.EINVAL`, ...).
/// Values are the Linux numeric constants.
pub mod errno {
    pub const EINVAL: i32 = 22;
    pub const ENOTCONN: i32 = 107;
    pub const ETIMEDOUT: i32 = 110;
    pub const EPROTO: i32 = 71;
}

/// Internal error type for the transport/session layer. Every public
/// operation on [`crate::client::LdmsdControlClient`] converts this into
/// the `(errno, None)` convention rather than exposing it directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlError {
    NotConnected,
    Timeout,
    ProtocolError(String),
    InvalidArgument(String),
    Io(String),
}

impl ControlError {
    pub fn to_errno(&self) -> i32 {
        match self {
            ControlError::NotConnected => errno::ENOTCONN,
            ControlError::Timeout => errno::ETIMEDOUT,
            ControlError::ProtocolError(_) => errno::EPROTO,
            ControlError::InvalidArgument(_) => errno::EINVAL,
            ControlError::Io(_) => errno::ENOTCONN,
        }
    }
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlError::NotConnected => write!(f, "transport is not connected"),
            ControlError::Timeout => write!(f, "timed out waiting for a reply"),
            ControlError::ProtocolError(msg) => write!(f, "protocol error: {}", msg),
            ControlError::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
            ControlError::Io(msg) => write!(f, "transport io error: {}", msg),
        }
    }
}

impl std::error::Error for ControlError {}

impl From<std::io::Error> for ControlError {
    fn from(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::WouldBlock || e.kind() == std::io::ErrorKind::TimedOut
        {
            ControlError::Timeout
        } else {
            ControlError::Io(e.to_string())
        }
    }
}
