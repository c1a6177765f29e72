// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The daemon control operation catalog (§4.5/§6.3): one method per
//! `ldmsd` command, each following the same template -- build a request,
//! send, receive, map the reply to `(errcode, body)`. Every method
//! returns the POSIX-errno convention the external caller expects
//! (`errno::ENOTCONN` on any transport failure, never a Rust panic or
//! exception).

use ldms_config_util::check_offset;
use serde_json::Value;

use crate::attr::{AttrId, Attribute};
use crate::command::CommandId;
use crate::error::{errno, ControlError};
use crate::session::{Session, SessionState, Transport};

/// `(errno, body)` -- the contract every control operation returns.
/// `errno::SUCCESS` maps to the Rust value `0`; on failure `body` is
/// always `None`.
pub type OpResult = (i32, Option<Value>);

fn ok_empty() -> i32 {
    0
}

/// Drives one `ldmsd` collector daemon over the framed request/response
/// protocol (§4.5). Not `Send`/`Sync`: a client owns exactly one
/// [`Session`] and is used from a single thread (§5).
pub struct LdmsdControlClient {
    session: Session,
}

impl LdmsdControlClient {
    pub fn new(transport: Transport) -> Self {
        LdmsdControlClient {
            session: Session::new(transport),
        }
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn connect(&mut self) -> Result<(), ControlError> {
        self.session.connect()
    }

    pub fn reconnect(&mut self) -> Result<(), ControlError> {
        self.session.reconnect()
    }

    pub fn close(&mut self) {
        self.session.close()
    }

    /// The operation template (§4.5): build, send, receive; on
    /// `errcode == 0` and `is_query`, JSON-decode the body; otherwise
    /// return it as a plain string (wrapped as a JSON string value so
    /// callers see one return shape). Any failure collapses to
    /// `(ENOTCONN, None)`.
    fn call(&mut self, command_id: CommandId, attrs: Vec<Attribute>, is_query: bool) -> OpResult {
        match self.call_inner(command_id, attrs, is_query) {
            Ok(result) => result,
            Err(_) => (errno::ENOTCONN, None),
        }
    }

    fn call_inner(
        &mut self,
        command_id: CommandId,
        attrs: Vec<Attribute>,
        is_query: bool,
    ) -> Result<OpResult, ControlError> {
        self.session.send(command_id.code(), attrs)?;
        let resp = self.session.receive(None)?;
        if resp.errcode != 0 {
            return Ok((resp.errcode as i32, None));
        }
        if resp.payload.is_empty() {
            return Ok((ok_empty(), None));
        }
        if is_query {
            let value: Value = serde_json::from_slice(&resp.payload)
                .map_err(|e| ControlError::ProtocolError(e.to_string()))?;
            Ok((ok_empty(), Some(value)))
        } else {
            let text = String::from_utf8_lossy(&resp.payload).into_owned();
            Ok((ok_empty(), Some(Value::String(text))))
        }
    }

    // -- auth / listener ---------------------------------------------

    pub fn auth_add(&mut self, name: &str, plugin: Option<&str>, auth_opt: Option<&str>) -> OpResult {
        let mut attrs = vec![Attribute::new(AttrId::Name, name)];
        if let Some(plugin) = plugin {
            attrs.push(Attribute::new(AttrId::Plugin, plugin));
        }
        if let Some(opt) = auth_opt {
            let value = if opt.contains('=') {
                opt.to_string()
            } else {
                format!("conf={}", opt)
            };
            attrs.push(Attribute::new(AttrId::String, value));
        }
        self.call(CommandId::AuthAdd, attrs, false)
    }

    pub fn listen(&mut self, xprt: &str, port: u16, host: Option<&str>, auth: Option<&str>) -> OpResult {
        let mut attrs = vec![
            Attribute::new(AttrId::Xprt, xprt),
            Attribute::new(AttrId::Port, port.to_string()),
        ];
        if let Some(host) = host {
            attrs.push(Attribute::new(AttrId::Host, host));
        }
        if let Some(auth) = auth {
            attrs.push(Attribute::new(AttrId::Auth, auth));
        }
        self.call(CommandId::Listen, attrs, false)
    }

    // -- introspection -------------------------------------------------

    pub fn dir_list(&mut self) -> OpResult {
        self.call(CommandId::Dir, vec![], true)
    }

    pub fn xprt_stats(&mut self, reset: bool) -> OpResult {
        self.call(
            CommandId::XprtStats,
            vec![Attribute::new(AttrId::Reset, reset.to_string())],
            true,
        )
    }

    pub fn thread_stats(&mut self, reset: bool) -> OpResult {
        self.call(
            CommandId::ThreadStats,
            vec![Attribute::new(AttrId::Reset, reset.to_string())],
            true,
        )
    }

    pub fn daemon_status(&mut self) -> OpResult {
        self.call(CommandId::DaemonStatus, vec![], true)
    }

    // -- plugin lifecycle -----------------------------------------------

    pub fn plugn_load(&mut self, name: &str) -> OpResult {
        self.call(
            CommandId::PlugnLoad,
            vec![Attribute::new(AttrId::Name, name)],
            false,
        )
    }

    pub fn plugn_config(&mut self, name: &str, cfg_str: &str) -> OpResult {
        self.call(
            CommandId::PlugnConfig,
            vec![
                Attribute::new(AttrId::Name, name),
                Attribute::new(AttrId::String, cfg_str),
            ],
            false,
        )
    }

    pub fn plugn_start(&mut self, name: &str, interval_us: i64, offset_us: Option<i64>) -> OpResult {
        let mut attrs = vec![
            Attribute::new(AttrId::Name, name),
            Attribute::new(AttrId::Interval, interval_us.to_string()),
        ];
        if let Some(offset_us) = offset_us {
            let offset = check_offset(interval_us, Some(offset_us));
            attrs.push(Attribute::new(AttrId::Offset, offset.to_string()));
        }
        self.call(CommandId::PlugnStart, attrs, true)
    }

    pub fn plugn_stop(&mut self, name: &str) -> OpResult {
        self.call(
            CommandId::PlugnStop,
            vec![Attribute::new(AttrId::Name, name)],
            false,
        )
    }

    pub fn plugn_status(&mut self, name: Option<&str>) -> OpResult {
        let attrs = name
            .map(|n| vec![Attribute::new(AttrId::Name, n)])
            .unwrap_or_default();
        self.call(CommandId::PlugnStatus, attrs, true)
    }

    // -- producer lifecycle ---------------------------------------------

    #[allow(clippy::too_many_arguments)]
    pub fn prdcr_add(
        &mut self,
        name: &str,
        ptype: &str,
        xprt: &str,
        host: &str,
        port: u16,
        reconnect_us: i64,
        auth: Option<&str>,
        perm: Option<u32>,
    ) -> OpResult {
        let mut attrs = vec![
            Attribute::new(AttrId::Name, name),
            Attribute::new(AttrId::Type, ptype),
            Attribute::new(AttrId::Xprt, xprt),
            Attribute::new(AttrId::Host, host),
            Attribute::new(AttrId::Port, port.to_string()),
            Attribute::new(AttrId::Interval, reconnect_us.to_string()),
        ];
        if let Some(auth) = auth {
            attrs.push(Attribute::new(AttrId::Auth, auth));
        }
        if let Some(perm) = perm {
            attrs.push(Attribute::new(AttrId::Perm, format!("{:o}", perm)));
        }
        self.call(CommandId::PrdcrAdd, attrs, false)
    }

    pub fn prdcr_del(&mut self, name: &str) -> OpResult {
        self.call(
            CommandId::PrdcrDel,
            vec![Attribute::new(AttrId::Name, name)],
            false,
        )
    }

    /// `start`/`stop` accept either a literal name or a regular
    /// expression, selecting the `*_REGEX` command variant (§4.5).
    pub fn prdcr_start(&mut self, name: &str, regex: bool, reconnect_us: Option<i64>) -> OpResult {
        let (command_id, attr_id) = if regex {
            (CommandId::PrdcrStartRegex, AttrId::Regex)
        } else {
            (CommandId::PrdcrStart, AttrId::Name)
        };
        let mut attrs = vec![Attribute::new(attr_id, name)];
        if let Some(reconnect_us) = reconnect_us {
            attrs.push(Attribute::new(AttrId::Interval, reconnect_us.to_string()));
        }
        self.call(command_id, attrs, false)
    }

    pub fn prdcr_stop(&mut self, name: &str, regex: bool) -> OpResult {
        let (command_id, attr_id) = if regex {
            (CommandId::PrdcrStopRegex, AttrId::Regex)
        } else {
            (CommandId::PrdcrStop, AttrId::Name)
        };
        self.call(command_id, vec![Attribute::new(attr_id, name)], false)
    }

    pub fn prdcr_subscribe(&mut self, regex: &str, stream: &str) -> OpResult {
        self.call(
            CommandId::PrdcrSubscribe,
            vec![
                Attribute::new(AttrId::Regex, regex),
                Attribute::new(AttrId::Stream, stream),
            ],
            false,
        )
    }

    pub fn prdcr_status(&mut self, name: Option<&str>) -> OpResult {
        let attrs = name
            .map(|n| vec![Attribute::new(AttrId::Name, n)])
            .unwrap_or_default();
        self.call(CommandId::PrdcrStatus, attrs, true)
    }

    pub fn prdcrset_status(
        &mut self,
        name: Option<&str>,
        instance: Option<&str>,
        schema: Option<&str>,
    ) -> OpResult {
        let mut attrs = Vec::new();
        if let Some(name) = name {
            attrs.push(Attribute::new(AttrId::Name, name));
        }
        if let Some(instance) = instance {
            attrs.push(Attribute::new(AttrId::Instance, instance));
        }
        if let Some(schema) = schema {
            attrs.push(Attribute::new(AttrId::Schema, schema));
        }
        self.call(CommandId::PrdcrSetStatus, attrs, true)
    }

    // -- updater lifecycle ------------------------------------------------

    /// `add` requires exactly one of `interval`+`offset`, `push`, or
    /// `auto`; any other combination fails `EINVAL` locally, before a
    /// message is ever sent (§4.5).
    pub fn updtr_add(&mut self, req: UpdtrAddRequest) -> OpResult {
        let mut attrs = vec![Attribute::new(AttrId::Name, req.name.as_str())];
        match (req.interval_us, req.push.as_deref(), req.auto) {
            (Some(interval_us), None, None) => {
                let offset = check_offset(interval_us, req.offset_us);
                attrs.push(Attribute::new(AttrId::Interval, interval_us.to_string()));
                attrs.push(Attribute::new(AttrId::Offset, offset.to_string()));
            }
            (None, Some(push), None) => {
                if push != "onchange" && push != "true" {
                    return (errno::EINVAL, None);
                }
                attrs.push(Attribute::new(AttrId::Push, push));
            }
            (None, None, Some(auto)) => {
                attrs.push(Attribute::new(AttrId::AutoInterval, auto.to_string()));
            }
            _ => return (errno::EINVAL, None),
        }
        if let Some(perm) = req.perm {
            attrs.push(Attribute::new(AttrId::Perm, format!("{:o}", perm)));
        }
        self.call(CommandId::UpdtrAdd, attrs, false)
    }

    pub fn updtr_del(&mut self, name: &str) -> OpResult {
        self.call(
            CommandId::UpdtrDel,
            vec![Attribute::new(AttrId::Name, name)],
            false,
        )
    }

    pub fn updtr_status(&mut self, name: Option<&str>) -> OpResult {
        let attrs = name
            .map(|n| vec![Attribute::new(AttrId::Name, n)])
            .unwrap_or_default();
        self.call(CommandId::UpdtrStatus, attrs, true)
    }

    /// `auto` is incompatible with `interval` (§4.5); `interval` requires
    /// no `auto`, matching the add-time exclusivity.
    pub fn updtr_start(
        &mut self,
        name: &str,
        interval_us: Option<i64>,
        offset_us: Option<i64>,
        auto: Option<bool>,
    ) -> OpResult {
        let mut attrs = vec![Attribute::new(AttrId::Name, name)];
        match (interval_us, auto) {
            (Some(_), Some(true)) => return (errno::EINVAL, None),
            (Some(interval_us), _) => {
                let offset = check_offset(interval_us, offset_us);
                attrs.push(Attribute::new(AttrId::Interval, interval_us.to_string()));
                attrs.push(Attribute::new(AttrId::Offset, offset.to_string()));
            }
            (None, Some(auto)) => {
                attrs.push(Attribute::new(AttrId::AutoInterval, auto.to_string()));
            }
            (None, None) => {}
        }
        self.call(CommandId::UpdtrStart, attrs, false)
    }

    pub fn updtr_stop(&mut self, name: &str) -> OpResult {
        self.call(
            CommandId::UpdtrStop,
            vec![Attribute::new(AttrId::Name, name)],
            false,
        )
    }

    pub fn updtr_prdcr_add(&mut self, name: &str, regex: &str) -> OpResult {
        self.call(
            CommandId::UpdtrPrdcrAdd,
            vec![
                Attribute::new(AttrId::Name, name),
                Attribute::new(AttrId::Regex, regex),
            ],
            false,
        )
    }

    pub fn updtr_prdcr_del(&mut self, name: &str, regex: &str) -> OpResult {
        self.call(
            CommandId::UpdtrPrdcrDel,
            vec![
                Attribute::new(AttrId::Name, name),
                Attribute::new(AttrId::Regex, regex),
            ],
            false,
        )
    }

    pub fn updtr_match_add(&mut self, name: &str, regex: &str, match_kind: &str) -> OpResult {
        self.call(
            CommandId::UpdtrMatchAdd,
            vec![
                Attribute::new(AttrId::Name, name),
                Attribute::new(AttrId::Regex, regex),
                Attribute::new(AttrId::Match, match_kind),
            ],
            false,
        )
    }

    pub fn updtr_match_del(&mut self, name: &str, regex: &str, match_kind: &str) -> OpResult {
        self.call(
            CommandId::UpdtrMatchDel,
            vec![
                Attribute::new(AttrId::Name, name),
                Attribute::new(AttrId::Regex, regex),
                Attribute::new(AttrId::Match, match_kind),
            ],
            false,
        )
    }

    pub fn updtr_match_list(&mut self, name: Option<&str>) -> OpResult {
        let attrs = name
            .map(|n| vec![Attribute::new(AttrId::Name, n)])
            .unwrap_or_default();
        self.call(CommandId::UpdtrMatchList, attrs, true)
    }

    // -- storage-policy lifecycle -----------------------------------------

    pub fn strgp_add(&mut self, name: &str, plugin: &str, container: &str, schema: &str, perm: Option<u32>) -> OpResult {
        let perm = perm.unwrap_or(0o777);
        let attrs = vec![
            Attribute::new(AttrId::Name, name),
            Attribute::new(AttrId::Plugin, plugin),
            Attribute::new(AttrId::Container, container),
            Attribute::new(AttrId::Schema, schema),
            Attribute::new(AttrId::Perm, format!("{:o}", perm)),
        ];
        self.call(CommandId::StrgpAdd, attrs, false)
    }

    pub fn strgp_del(&mut self, name: &str) -> OpResult {
        self.call(
            CommandId::StrgpDel,
            vec![Attribute::new(AttrId::Name, name)],
            false,
        )
    }

    pub fn strgp_start(&mut self, name: &str) -> OpResult {
        self.call(
            CommandId::StrgpStart,
            vec![Attribute::new(AttrId::Name, name)],
            false,
        )
    }

    pub fn strgp_stop(&mut self, name: &str) -> OpResult {
        self.call(
            CommandId::StrgpStop,
            vec![Attribute::new(AttrId::Name, name)],
            false,
        )
    }

    pub fn strgp_prdcr_add(&mut self, name: &str, regex: &str) -> OpResult {
        self.call(
            CommandId::StrgpPrdcrAdd,
            vec![
                Attribute::new(AttrId::Name, name),
                Attribute::new(AttrId::Regex, regex),
            ],
            false,
        )
    }

    pub fn strgp_prdcr_del(&mut self, name: &str, regex: &str) -> OpResult {
        self.call(
            CommandId::StrgpPrdcrDel,
            vec![
                Attribute::new(AttrId::Name, name),
                Attribute::new(AttrId::Regex, regex),
            ],
            false,
        )
    }

    pub fn strgp_metric_add(&mut self, name: &str, metric_name: &str) -> OpResult {
        self.call(
            CommandId::StrgpMetricAdd,
            vec![
                Attribute::new(AttrId::Name, name),
                Attribute::new(AttrId::Metric, metric_name),
            ],
            false,
        )
    }

    pub fn strgp_metric_del(&mut self, name: &str, metric_name: &str) -> OpResult {
        self.call(
            CommandId::StrgpMetricDel,
            vec![
                Attribute::new(AttrId::Name, name),
                Attribute::new(AttrId::Metric, metric_name),
            ],
            false,
        )
    }
}

/// Options for [`LdmsdControlClient::updtr_add`]. A struct rather than a
/// long positional parameter list, centralizing the three mutually
/// exclusive scheduling modes the original dict-keyed call accepted
/// (§9 "dynamic attribute dispatch" design note).
#[derive(Debug, Clone, Default)]
pub struct UpdtrAddRequest {
    pub name: String,
    pub interval_us: Option<i64>,
    pub offset_us: Option<i64>,
    pub push: Option<String>,
    pub auto: Option<bool>,
    pub perm: Option<u32>,
}

impl UpdtrAddRequest {
    pub fn new(name: impl Into<String>) -> Self {
        UpdtrAddRequest {
            name: name.into(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::RawChannel;
    use crate::wire::{decode_attrs, Header, HEADER_LEN};
    use std::collections::VecDeque;
    use std::io;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Default, Clone)]
    struct RecordingChannel {
        written: Arc<Mutex<Vec<u8>>>,
        to_read: Arc<Mutex<VecDeque<u8>>>,
    }

    impl RawChannel for RecordingChannel {
        fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
            self.written.lock().unwrap().extend_from_slice(buf);
            Ok(())
        }

        fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
            let mut queue = self.to_read.lock().unwrap();
            if queue.len() < buf.len() {
                return Err(io::Error::new(io::ErrorKind::TimedOut, "no more data"));
            }
            for slot in buf.iter_mut() {
                *slot = queue.pop_front().unwrap();
            }
            Ok(())
        }

        fn set_read_timeout(&mut self, _timeout: Option<Duration>) -> io::Result<()> {
            Ok(())
        }
    }

    fn queue_response(chan: &RecordingChannel, request_id: u64, errcode: u32, payload: &[u8]) {
        let header = Header {
            command_id: 0,
            flags: 0,
            msg_len: (HEADER_LEN + payload.len()) as u32,
            request_id,
            errcode,
        };
        let mut bytes = header.to_bytes().to_vec();
        bytes.extend_from_slice(payload);
        chan.to_read.lock().unwrap().extend(bytes);
    }

    fn client_with_channel() -> (LdmsdControlClient, RecordingChannel) {
        let mut client = LdmsdControlClient::new(Transport::new("sock", "localhost", 411));
        let chan = RecordingChannel::default();
        client.session.connect_with(Box::new(chan.clone()));
        (client, chan)
    }

    #[test]
    fn prdcr_start_regex_builds_regex_attr_and_interval() {
        let (mut client, chan) = client_with_channel();
        queue_response(&chan, 1, 0, b"");
        let (err, _) = client.prdcr_start("n.*", true, Some(2_000_000));
        assert_eq!(err, 0);
        let written = chan.written.lock().unwrap().clone();
        let header = Header::from_bytes(written[..HEADER_LEN].try_into().unwrap()).unwrap();
        assert_eq!(header.command_id, CommandId::PrdcrStartRegex.code());
        let attrs = decode_attrs(&written[HEADER_LEN..]).unwrap();
        assert_eq!(attrs[0].id, AttrId::Regex);
        assert_eq!(attrs[0].value, "n.*");
        assert_eq!(attrs[1].id, AttrId::Interval);
        assert_eq!(attrs[1].value, "2000000");
    }

    #[test]
    fn prdcr_start_literal_name_uses_name_attr() {
        let (mut client, chan) = client_with_channel();
        queue_response(&chan, 1, 0, b"");
        client.prdcr_start("literal", false, None);
        let written = chan.written.lock().unwrap().clone();
        let header = Header::from_bytes(written[..HEADER_LEN].try_into().unwrap()).unwrap();
        assert_eq!(header.command_id, CommandId::PrdcrStart.code());
        let attrs = decode_attrs(&written[HEADER_LEN..]).unwrap();
        assert_eq!(attrs[0].id, AttrId::Name);
    }

    #[test]
    fn updtr_add_with_interval_and_offset() {
        let (mut client, chan) = client_with_channel();
        queue_response(&chan, 1, 0, b"");
        let req = UpdtrAddRequest {
            name: "u1".into(),
            interval_us: Some(1_000_000),
            offset_us: Some(900_000),
            ..Default::default()
        };
        let (err, _) = client.updtr_add(req);
        assert_eq!(err, 0);
        let written = chan.written.lock().unwrap().clone();
        let attrs = decode_attrs(&written[HEADER_LEN..]).unwrap();
        // offset clamped to half of interval per check_offset
        assert_eq!(attrs[2].id, AttrId::Offset);
        assert_eq!(attrs[2].value, "500000");
    }

    #[test]
    fn updtr_add_rejects_conflicting_options_locally() {
        let (mut client, _chan) = client_with_channel();
        let req = UpdtrAddRequest {
            name: "u1".into(),
            interval_us: Some(1_000_000),
            push: Some("onchange".into()),
            ..Default::default()
        };
        let (err, body) = client.updtr_add(req);
        assert_eq!(err, errno::EINVAL);
        assert!(body.is_none());
    }

    #[test]
    fn updtr_add_rejects_bad_push_value() {
        let (mut client, _chan) = client_with_channel();
        let req = UpdtrAddRequest {
            name: "u1".into(),
            push: Some("maybe".into()),
            ..Default::default()
        };
        let (err, _) = client.updtr_add(req);
        assert_eq!(err, errno::EINVAL);
    }

    #[test]
    fn query_response_is_json_decoded() {
        let (mut client, chan) = client_with_channel();
        queue_response(&chan, 1, 0, br#"{"name":"meminfo"}"#);
        let (err, body) = client.dir_list();
        assert_eq!(err, 0);
        assert_eq!(body.unwrap()["name"], "meminfo");
    }

    #[test]
    fn nonzero_errcode_short_circuits_without_payload() {
        let (mut client, chan) = client_with_channel();
        queue_response(&chan, 1, 12, b"");
        let (err, body) = client.plugn_load("sampler");
        assert_eq!(err, 12);
        assert!(body.is_none());
    }

    #[test]
    fn silent_peer_closes_session_and_reports_enotconn() {
        let (mut client, _chan) = client_with_channel();
        // no response queued: read_exact fails immediately.
        let (err, body) = client.daemon_status();
        assert_eq!(err, errno::ENOTCONN);
        assert!(body.is_none());
        assert_eq!(client.state(), SessionState::Closed);
    }

    #[test]
    fn strgp_add_defaults_perm_to_0o777() {
        let (mut client, chan) = client_with_channel();
        queue_response(&chan, 1, 0, b"");
        client.strgp_add("sp1", "store_csv", "container", "meminfo", None);
        let written = chan.written.lock().unwrap().clone();
        let attrs = decode_attrs(&written[HEADER_LEN..]).unwrap();
        let perm = attrs.iter().find(|a| a.id == AttrId::Perm).unwrap();
        assert_eq!(perm.value, "777");
    }
}
