//! The `Snmp` session: configuration, lifecycle, and the single-shot
//! request dispatcher that `walk`/`bulk_walk` iterate on top of.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use tokio::sync::RwLock;

use crate::error::{Error, MalformedKind, Result};
use crate::message::Message;
use crate::oid::Oid;
use crate::pdu::{Pdu, PduType};
use crate::request_id::next_request_id;
use crate::transport::UdpTransport;
use crate::value::Value;
use crate::varbind::VarBind;
use crate::walk::{BulkWalk, Walk};

/// Default agent port.
pub const DEFAULT_PORT: u16 = 161;

/// An SNMPv2c session against one agent.
///
/// Cheap to clone; clones share the socket and configuration. The socket is
/// bound lazily on the first request (or via [`Snmp::open`]) and released
/// when the last clone drops or on [`Snmp::close`]. Overlapping requests
/// from clones or from one instance multiplex over the single socket under
/// distinct request-ids.
///
/// # Example
///
/// ```rust,no_run
/// use snmp2c::{Snmp, oid};
///
/// #[tokio::main]
/// async fn main() -> snmp2c::Result<()> {
///     let snmp = Snmp::builder("192.0.2.1")
///         .community("public")
///         .timeout(std::time::Duration::from_secs(2))
///         .build();
///
///     for vb in snmp.get(&[oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)]).await? {
///         println!("{}", vb);
///     }
///     snmp.close().await;
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Snmp {
    inner: Arc<SnmpInner>,
}

struct SnmpInner {
    config: SnmpConfig,
    state: RwLock<SessionState>,
}

enum SessionState {
    Idle,
    Open(Arc<UdpTransport>),
    Closed,
}

/// Resolved session configuration.
#[derive(Clone)]
pub(crate) struct SnmpConfig {
    pub(crate) host: String,
    pub(crate) port: u16,
    pub(crate) community: Bytes,
    pub(crate) timeout: Duration,
    pub(crate) retries: u32,
    pub(crate) non_repeaters: u32,
    pub(crate) max_repetitions: u32,
    pub(crate) validate_source_addr: bool,
    pub(crate) local_addr: Option<SocketAddr>,
    pub(crate) strict_walk: bool,
}

/// Builder for [`Snmp`] sessions.
///
/// Defaults: port 161, community `"public"`, timeout 10 s, 3 retries,
/// `max_repetitions` 10, `non_repeaters` 0, source-address validation on.
pub struct SnmpBuilder {
    config: SnmpConfig,
}

impl SnmpBuilder {
    fn new(host: impl Into<String>) -> Self {
        Self {
            config: SnmpConfig {
                host: host.into(),
                port: DEFAULT_PORT,
                community: Bytes::from_static(b"public"),
                timeout: Duration::from_secs(10),
                retries: 3,
                non_repeaters: 0,
                max_repetitions: 10,
                validate_source_addr: true,
                local_addr: None,
                strict_walk: false,
            },
        }
    }

    /// Agent port (default 161).
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Community string sent on every request (default `"public"`).
    ///
    /// Passed to the wire verbatim; any byte string is allowed.
    pub fn community(mut self, community: impl Into<Bytes>) -> Self {
        self.config.community = community.into();
        self
    }

    /// Per-attempt reply wait (default 10 s).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Additional attempts after the first on timeout (default 3).
    pub fn retries(mut self, retries: u32) -> Self {
        self.config.retries = retries;
        self
    }

    /// Default non-repeaters for bulk operations (default 0).
    pub fn non_repeaters(mut self, non_repeaters: u32) -> Self {
        self.config.non_repeaters = non_repeaters;
        self
    }

    /// Default max-repetitions for bulk operations (default 10).
    pub fn max_repetitions(mut self, max_repetitions: u32) -> Self {
        self.config.max_repetitions = max_repetitions;
        self
    }

    /// Drop replies whose source address differs from the agent's
    /// (default **true**).
    ///
    /// RFC 1901 does not require this check — some agents legitimately
    /// reply from a different interface — but accepting such replies lets
    /// any host that can guess a request-id spoof a response, so the
    /// hardening is on by default and exposed here for the agents that
    /// need it off.
    pub fn validate_source_addr(mut self, validate: bool) -> Self {
        self.config.validate_source_addr = validate;
        self
    }

    /// Bind the local socket to a fixed address instead of an ephemeral
    /// port.
    pub fn local_addr(mut self, addr: SocketAddr) -> Self {
        self.config.local_addr = Some(addr);
        self
    }

    /// Fail walks with [`Error::LoopDetected`] when an agent returns
    /// non-increasing OIDs, instead of silently ending the walk
    /// (default false).
    pub fn strict_walk(mut self, strict: bool) -> Self {
        self.config.strict_walk = strict;
        self
    }

    /// Build the session. No I/O happens until the first request or an
    /// explicit [`Snmp::open`].
    pub fn build(self) -> Snmp {
        Snmp {
            inner: Arc::new(SnmpInner {
                config: self.config,
                state: RwLock::new(SessionState::Idle),
            }),
        }
    }
}

impl Snmp {
    /// Start building a session for `host` (name or address).
    pub fn builder(host: impl Into<String>) -> SnmpBuilder {
        SnmpBuilder::new(host)
    }

    pub(crate) fn config(&self) -> &SnmpConfig {
        &self.inner.config
    }

    /// Bind the socket now instead of on the first request.
    ///
    /// Idempotent: a second call on an open session does nothing.
    pub async fn open(&self) -> Result<()> {
        self.transport().await.map(|_| ())
    }

    /// Whether [`Snmp::close`] has been called.
    pub async fn is_closed(&self) -> bool {
        matches!(*self.inner.state.read().await, SessionState::Closed)
    }

    /// Close the session: stop the receive loop, fail outstanding waiters
    /// with [`Error::Closed`], release the socket.
    ///
    /// Every later operation on this session (and its clones) fails with
    /// [`Error::Closed`].
    pub async fn close(&self) {
        let transport = {
            let mut state = self.inner.state.write().await;
            match std::mem::replace(&mut *state, SessionState::Closed) {
                SessionState::Open(transport) => Some(transport),
                SessionState::Idle | SessionState::Closed => None,
            }
        };
        if let Some(transport) = transport {
            transport.close().await;
        }
    }

    /// Get the transport, binding it first if the session is still idle.
    async fn transport(&self) -> Result<Arc<UdpTransport>> {
        {
            let state = self.inner.state.read().await;
            match &*state {
                SessionState::Open(transport) => return Ok(transport.clone()),
                SessionState::Closed => return Err(Error::Closed),
                SessionState::Idle => {}
            }
        }

        let mut state = self.inner.state.write().await;
        match &*state {
            SessionState::Open(transport) => Ok(transport.clone()),
            SessionState::Closed => Err(Error::Closed),
            SessionState::Idle => {
                let config = &self.inner.config;
                let peer = resolve(&config.host, config.port).await?;
                let transport = Arc::new(
                    UdpTransport::connect(peer, config.local_addr, config.validate_source_addr)
                        .await?,
                );
                tracing::debug!(
                    target: "snmp2c::session",
                    host = %config.host,
                    peer = %peer,
                    "session opened"
                );
                *state = SessionState::Open(transport.clone());
                Ok(transport)
            }
        }
    }

    /// Issue one PDU and return the Response PDU's varbinds.
    ///
    /// The message is encoded once; each retry re-sends the identical bytes
    /// under the identical request-id, so an agent that caches by
    /// request-id can deduplicate our retransmissions.
    pub(crate) async fn send_pdu(&self, pdu: Pdu) -> Result<Vec<VarBind>> {
        let transport = self.transport().await?;
        let config = &self.inner.config;

        let request_id = pdu.request_id;
        let pdu_type = pdu.pdu_type;
        let data = Message::new(config.community.clone(), pdu).encode();

        let start = Instant::now();
        for attempt in 0..=config.retries {
            if attempt > 0 {
                tracing::debug!(
                    target: "snmp2c::session",
                    peer = %transport.peer(),
                    request_id,
                    attempt,
                    "retrying {}",
                    pdu_type
                );
            }

            let mut waiter = transport.register(request_id);
            transport.send(&data).await?;

            match tokio::time::timeout(config.timeout, waiter.recv()).await {
                Ok(reply) => {
                    let bytes = reply?;
                    return self.accept_reply(request_id, bytes);
                }
                Err(_) => {
                    // Attempt timed out; the waiter guard drops here and
                    // deregisters, so a straggling reply is discarded.
                    continue;
                }
            }
        }

        let elapsed = start.elapsed();
        tracing::debug!(
            target: "snmp2c::session",
            peer = %transport.peer(),
            request_id,
            ?elapsed,
            retries = config.retries,
            "request timed out"
        );
        Err(Error::Timeout {
            target: transport.peer(),
            elapsed,
            retries: config.retries,
        })
    }

    /// Decode and validate a reply, mapping agent error-status to a typed
    /// failure.
    fn accept_reply(&self, request_id: i32, bytes: Bytes) -> Result<Vec<VarBind>> {
        let message = Message::decode(bytes)?;
        let pdu = message.pdu;

        if pdu.pdu_type != PduType::Response {
            return Err(Error::malformed(
                0,
                MalformedKind::UnexpectedPduType(pdu.pdu_type.tag()),
            ));
        }
        debug_assert_eq!(pdu.request_id, request_id, "transport matched a wrong id");

        if pdu.is_error() {
            let status = pdu.error_status();
            let index = pdu.error_index;
            let oid = usize::try_from(index)
                .ok()
                .and_then(|i| i.checked_sub(1))
                .and_then(|i| pdu.varbinds.get(i))
                .map(|vb| vb.oid.clone());
            tracing::debug!(
                target: "snmp2c::session",
                %status,
                index,
                "agent returned error-status"
            );
            return Err(Error::Agent { status, index, oid });
        }

        Ok(pdu.varbinds)
    }

    /// GetRequest: one varbind per requested OID.
    ///
    /// Per-OID absence comes back as [`Value::NoSuchObject`] or
    /// [`Value::NoSuchInstance`] values, so one missing variable never
    /// fails the rest of the request.
    pub async fn get(&self, oids: &[Oid]) -> Result<Vec<VarBind>> {
        if oids.is_empty() {
            return Ok(Vec::new());
        }
        self.send_pdu(Pdu::get_request(next_request_id(), oids)).await
    }

    /// GetNextRequest: the lexicographically next varbind for each
    /// requested OID.
    pub async fn get_next(&self, oids: &[Oid]) -> Result<Vec<VarBind>> {
        if oids.is_empty() {
            return Ok(Vec::new());
        }
        self.send_pdu(Pdu::get_next_request(next_request_id(), oids))
            .await
    }

    /// GetBulkRequest with the session's default `non_repeaters` and
    /// `max_repetitions`.
    pub async fn get_bulk(&self, oids: &[Oid]) -> Result<Vec<VarBind>> {
        let config = &self.inner.config;
        self.get_bulk_with(oids, config.non_repeaters, config.max_repetitions)
            .await
    }

    /// GetBulkRequest with explicit `non_repeaters` and `max_repetitions`.
    ///
    /// Returns up to
    /// `non_repeaters + (oids.len() - non_repeaters) * max_repetitions`
    /// varbinds.
    pub async fn get_bulk_with(
        &self,
        oids: &[Oid],
        non_repeaters: u32,
        max_repetitions: u32,
    ) -> Result<Vec<VarBind>> {
        if oids.is_empty() {
            return Ok(Vec::new());
        }
        self.send_pdu(Pdu::get_bulk_request(
            next_request_id(),
            non_repeaters as i32,
            max_repetitions as i32,
            oids,
        ))
        .await
    }

    /// SetRequest carrying typed values; returns the varbinds echoed by the
    /// agent on success.
    pub async fn set(&self, varbinds: &[(Oid, Value)]) -> Result<Vec<VarBind>> {
        if varbinds.is_empty() {
            return Ok(Vec::new());
        }
        let vbs = varbinds
            .iter()
            .map(|(oid, value)| VarBind::new(oid.clone(), value.clone()))
            .collect();
        self.send_pdu(Pdu::set_request(next_request_id(), vbs)).await
    }

    /// Walk the subtree under `root` with repeated GetNext requests.
    ///
    /// Yields varbinds with strictly increasing OIDs, all descendants of
    /// `root`; see [`Walk`] for the termination rules. Collect everything
    /// with [`Walk::collect`] or pull one at a time with [`Walk::next`].
    pub fn walk(&self, root: Oid) -> Walk {
        Walk::new(self.clone(), root)
    }

    /// Walk the subtree under `root` with GetBulk batches of the session's
    /// `max_repetitions`.
    pub fn bulk_walk(&self, root: Oid) -> BulkWalk {
        let max_repetitions = self.inner.config.max_repetitions;
        BulkWalk::new(self.clone(), root, max_repetitions)
    }

    /// Bulk walk with an explicit batch size.
    pub fn bulk_walk_with(&self, root: Oid, max_repetitions: u32) -> BulkWalk {
        BulkWalk::new(self.clone(), root, max_repetitions)
    }
}

/// Resolve `host:port` to the first usable socket address.
async fn resolve(host: &str, port: u16) -> Result<SocketAddr> {
    let mut addrs = tokio::net::lookup_host((host, port))
        .await
        .map_err(|e| Error::Io {
            target: None,
            source: e,
        })?;
    addrs.next().ok_or_else(|| Error::Io {
        target: None,
        source: std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("no address found for {host}"),
        ),
    })
}
