//! SNMPv2-Trap listener.
//!
//! A stand-alone UDP receiver that decodes unsolicited SNMPv2-Trap PDUs and
//! hands them to a user callback. Anything else that arrives — malformed
//! bytes, other SNMP versions, non-trap PDUs, traps from communities outside
//! the configured allow-set — is dropped silently; a counter records the
//! drops for observability.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::message::Message;
use crate::pdu::PduType;
use crate::util::bind_udp_socket;
use crate::varbind::VarBind;

/// Default trap port.
pub const DEFAULT_TRAP_PORT: u16 = 162;

/// A decoded SNMPv2-Trap notification.
#[derive(Debug, Clone)]
pub struct TrapMessage {
    /// Community string the sender used.
    pub community: Bytes,
    /// The trap's variable bindings, in wire order.
    pub varbinds: Vec<VarBind>,
}

/// Callback invoked for each accepted trap.
pub type TrapHandler = dyn Fn(TrapMessage, SocketAddr) + Send + Sync;

/// Builder for [`TrapListener`].
pub struct TrapListenerBuilder {
    bind_addr: String,
    communities: Option<HashSet<Bytes>>,
}

impl TrapListenerBuilder {
    fn new() -> Self {
        Self {
            bind_addr: format!("0.0.0.0:{DEFAULT_TRAP_PORT}"),
            communities: None,
        }
    }

    /// Local bind address (default `0.0.0.0:162`; binding port 162 needs
    /// elevated privileges on most systems).
    pub fn bind(mut self, addr: impl Into<String>) -> Self {
        self.bind_addr = addr.into();
        self
    }

    /// Accept traps only from the given community.
    ///
    /// May be called repeatedly to allow several. Without any call, every
    /// community is accepted.
    pub fn community(mut self, community: impl Into<Bytes>) -> Self {
        self.communities
            .get_or_insert_with(HashSet::new)
            .insert(community.into());
        self
    }

    /// Bind the socket and return the listener.
    pub async fn build<F>(self, handler: F) -> Result<TrapListener>
    where
        F: Fn(TrapMessage, SocketAddr) + Send + Sync + 'static,
    {
        let bind_addr: SocketAddr = self.bind_addr.parse().map_err(|_| Error::Io {
            target: None,
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid bind address: {}", self.bind_addr),
            ),
        })?;

        let socket = bind_udp_socket(bind_addr).map_err(|e| Error::Io {
            target: Some(bind_addr),
            source: e,
        })?;
        let local_addr = socket.local_addr().map_err(|e| Error::Io {
            target: Some(bind_addr),
            source: e,
        })?;

        tracing::debug!(target: "snmp2c::trap", local = %local_addr, "trap listener bound");

        Ok(TrapListener {
            socket,
            local_addr,
            communities: self.communities,
            handler: Arc::new(handler),
            dropped: AtomicU64::new(0),
            shutdown: CancellationToken::new(),
        })
    }
}

/// A bound SNMPv2-Trap receiver.
///
/// # Example
///
/// ```rust,no_run
/// use snmp2c::TrapListener;
///
/// #[tokio::main]
/// async fn main() -> snmp2c::Result<()> {
///     let listener = TrapListener::builder()
///         .bind("0.0.0.0:1162")
///         .community("public")
///         .build(|trap, source| {
///             for vb in &trap.varbinds {
///                 println!("{}: {}", source, vb);
///             }
///         })
///         .await?;
///
///     listener.run().await
/// }
/// ```
pub struct TrapListener {
    socket: UdpSocket,
    local_addr: SocketAddr,
    communities: Option<HashSet<Bytes>>,
    handler: Arc<TrapHandler>,
    dropped: AtomicU64,
    shutdown: CancellationToken,
}

impl TrapListener {
    /// Start building a listener.
    pub fn builder() -> TrapListenerBuilder {
        TrapListenerBuilder::new()
    }

    /// The bound local address.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// How many datagrams were dropped: malformed, wrong version, non-trap
    /// PDU, or disallowed community.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Ask [`TrapListener::run`] to return.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Receive datagrams and invoke the handler until [`shutdown`] is
    /// called. The socket closes when the listener is dropped.
    ///
    /// [`shutdown`]: TrapListener::shutdown
    pub async fn run(&self) -> Result<()> {
        let mut buf = vec![0u8; 65535];

        loop {
            let (len, source) = tokio::select! {
                biased;

                _ = self.shutdown.cancelled() => return Ok(()),

                result = self.socket.recv_from(&mut buf) => {
                    result.map_err(|e| Error::Io {
                        target: None,
                        source: e,
                    })?
                }
            };

            let data = Bytes::copy_from_slice(&buf[..len]);
            match self.accept(data, source) {
                Some(trap) => (self.handler)(trap, source),
                None => {
                    self.dropped.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
    }

    /// Decode and filter one datagram. `None` means drop.
    fn accept(&self, data: Bytes, source: SocketAddr) -> Option<TrapMessage> {
        let message = match Message::decode(data) {
            Ok(message) => message,
            Err(e) => {
                tracing::debug!(
                    target: "snmp2c::trap",
                    source = %source,
                    error = %e,
                    "dropping undecodable datagram"
                );
                return None;
            }
        };

        if message.pdu.pdu_type != PduType::SnmpV2Trap {
            tracing::debug!(
                target: "snmp2c::trap",
                source = %source,
                pdu = %message.pdu.pdu_type,
                "dropping non-trap PDU"
            );
            return None;
        }

        if let Some(allowed) = &self.communities
            && !allowed.contains(&message.community)
        {
            tracing::debug!(
                target: "snmp2c::trap",
                source = %source,
                "dropping trap from unlisted community"
            );
            return None;
        }

        Some(TrapMessage {
            community: message.community,
            varbinds: message.pdu.varbinds,
        })
    }
}

impl Drop for TrapListener {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
