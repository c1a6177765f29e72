// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Daemon control protocol client: a framed request/response state
//! machine over a byte transport, and the typed operation catalog a
//! maestro-style orchestrator drives an `ldmsd` collector daemon with.
//!
//! ```text
//! LdmsdControlClient
//!   .prdcr_add/start/stop/...   }
//!   .updtr_add/start/stop/...   }-- builds Request { command_id, attrs }
//!   .strgp_add/start/stop/...   }
//!        |
//!        v
//!    Session   (INIT -> CONNECTED -> CLOSED, request id counter)
//!        |
//!        v
//!  RawChannel  (TcpChannel | fake, in tests)
//! ```
//!
//! Every operation returns `(errno, Option<serde_json::Value>)` rather
//! than raising -- the POSIX errno convention the external collector
//! daemon's own clients expect (§4.5, §7).

mod attr;
mod client;
mod command;
mod error;
mod session;
mod transport;
mod wire;

pub use attr::{AttrId, Attribute};
pub use client::{LdmsdControlClient, OpResult, UpdtrAddRequest};
pub use command::CommandId;
pub use error::{errno, ControlError};
pub use session::{Session, SessionState, Transport};
pub use transport::{RawChannel, TcpChannel};
pub use wire::{decode_attrs, Header, Request, Response, HEADER_LEN};
