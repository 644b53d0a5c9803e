//! UDP transport: one socket per session, replies demultiplexed by
//! request-id.
//!
//! A background receive task parses each inbound datagram only far enough to
//! pull out the request-id, then completes the matching waiter over a
//! oneshot channel. Datagrams from unexpected sources (when validation is
//! on), datagrams that fail the header parse, and datagrams with no waiting
//! request are dropped without disturbing anything else in flight.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use tokio::net::UdpSocket;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::util::{bind_udp_socket, ephemeral_addr_for};

/// Largest UDP payload: 65535 minus IP and UDP headers.
pub(crate) const MAX_UDP_PAYLOAD: usize = 65507;

type PendingMap = Arc<Mutex<HashMap<i32, oneshot::Sender<Bytes>>>>;

/// A bound UDP endpoint talking to one peer.
pub(crate) struct UdpTransport {
    socket: Arc<UdpSocket>,
    peer: SocketAddr,
    local_addr: SocketAddr,
    pending: PendingMap,
    shutdown: CancellationToken,
    recv_task: Mutex<Option<JoinHandle<()>>>,
}

impl UdpTransport {
    /// Bind a socket for `peer` and start the receive loop.
    pub(crate) async fn connect(
        peer: SocketAddr,
        local_addr: Option<SocketAddr>,
        validate_source_addr: bool,
    ) -> Result<Self> {
        let bind_addr = local_addr.unwrap_or_else(|| ephemeral_addr_for(peer));
        let socket = bind_udp_socket(bind_addr).map_err(|e| Error::Io {
            target: Some(bind_addr),
            source: e,
        })?;
        let local_addr = socket.local_addr().map_err(|e| Error::Io {
            target: Some(bind_addr),
            source: e,
        })?;

        tracing::debug!(
            target: "snmp2c::transport",
            local = %local_addr,
            peer = %peer,
            "transport bound"
        );

        let socket = Arc::new(socket);
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let shutdown = CancellationToken::new();

        let recv_task = tokio::spawn(recv_loop(
            socket.clone(),
            peer,
            validate_source_addr,
            pending.clone(),
            shutdown.clone(),
        ));

        Ok(Self {
            socket,
            peer,
            local_addr,
            pending,
            shutdown,
            recv_task: Mutex::new(Some(recv_task)),
        })
    }

    pub(crate) fn peer(&self) -> SocketAddr {
        self.peer
    }

    #[allow(dead_code)]
    pub(crate) fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Register a waiter for `request_id`.
    ///
    /// The returned guard removes the table entry when dropped, so a
    /// cancelled caller leaves nothing behind; a late reply for its id is
    /// then dropped by the receive loop.
    pub(crate) fn register(&self, request_id: i32) -> PendingReply {
        let (tx, rx) = oneshot::channel();
        self.pending.lock().unwrap().insert(request_id, tx);
        PendingReply {
            pending: self.pending.clone(),
            request_id,
            rx,
        }
    }

    /// Send one datagram to the peer.
    pub(crate) async fn send(&self, data: &[u8]) -> Result<()> {
        if data.len() > MAX_UDP_PAYLOAD {
            return Err(Error::MessageTooLarge {
                size: data.len(),
                limit: MAX_UDP_PAYLOAD,
            });
        }
        self.socket
            .send_to(data, self.peer)
            .await
            .map_err(|e| Error::Io {
                target: Some(self.peer),
                source: e,
            })?;
        Ok(())
    }

    /// Stop the receive loop and fail every outstanding waiter with
    /// [`Error::Closed`].
    ///
    /// The receive task is joined before waiters are cancelled, so no
    /// datagram is processed after this returns.
    pub(crate) async fn close(&self) {
        self.shutdown.cancel();
        let task = self.recv_task.lock().unwrap().take();
        if let Some(task) = task {
            let _ = task.await;
        }
        // Dropping the senders wakes every waiter with a closed channel.
        self.pending.lock().unwrap().clear();
        tracing::debug!(target: "snmp2c::transport", peer = %self.peer, "transport closed");
    }
}

impl Drop for UdpTransport {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// A registered waiter for one reply.
pub(crate) struct PendingReply {
    pending: PendingMap,
    request_id: i32,
    rx: oneshot::Receiver<Bytes>,
}

impl PendingReply {
    /// Wait for the reply. A closed channel means the transport shut down.
    pub(crate) async fn recv(&mut self) -> Result<Bytes> {
        (&mut self.rx).await.map_err(|_| Error::Closed)
    }
}

impl Drop for PendingReply {
    fn drop(&mut self) {
        self.pending.lock().unwrap().remove(&self.request_id);
    }
}

async fn recv_loop(
    socket: Arc<UdpSocket>,
    peer: SocketAddr,
    validate_source_addr: bool,
    pending: PendingMap,
    shutdown: CancellationToken,
) {
    let mut buf = vec![0u8; 65535];

    loop {
        let (len, source) = tokio::select! {
            biased;

            _ = shutdown.cancelled() => return,

            result = socket.recv_from(&mut buf) => match result {
                Ok(received) => received,
                Err(e) => {
                    if shutdown.is_cancelled() {
                        return;
                    }
                    tracing::warn!(target: "snmp2c::transport", error = %e, "recv error");
                    continue;
                }
            },
        };

        if validate_source_addr && source != peer {
            tracing::debug!(
                target: "snmp2c::transport",
                expected = %peer,
                actual = %source,
                "dropping datagram from unexpected source"
            );
            continue;
        }

        let Some(request_id) = extract_request_id(&buf[..len]) else {
            tracing::debug!(
                target: "snmp2c::transport",
                source = %source,
                bytes = len,
                "dropping datagram without a parseable request-id"
            );
            continue;
        };

        let waiter = pending.lock().unwrap().remove(&request_id);
        match waiter {
            Some(tx) => {
                // A send failure means the waiter was cancelled in the
                // meantime; the reply is dropped either way.
                let _ = tx.send(Bytes::copy_from_slice(&buf[..len]));
            }
            None => {
                tracing::debug!(
                    target: "snmp2c::transport",
                    request_id,
                    source = %source,
                    "dropping reply with no pending request"
                );
            }
        }
    }
}

/// Pull the request-id out of a v2c datagram without a full decode.
///
/// Walks `SEQUENCE { INTEGER version, OCTET STRING community, PDU }` far
/// enough to reach the PDU's leading `request-id` INTEGER. Returns `None`
/// for anything that does not match that shape.
fn extract_request_id(data: &[u8]) -> Option<i32> {
    let mut pos = 0;

    // Outer SEQUENCE.
    if *data.first()? != 0x30 {
        return None;
    }
    pos += 1;
    let (next, _) = read_length(data, pos)?;
    pos = next;

    // Version INTEGER: skip contents.
    if *data.get(pos)? != 0x02 {
        return None;
    }
    pos += 1;
    let (next, version_len) = read_length(data, pos)?;
    pos = next + version_len;

    // Community OCTET STRING: skip contents.
    if *data.get(pos)? != 0x04 {
        return None;
    }
    pos += 1;
    let (next, community_len) = read_length(data, pos)?;
    pos = next + community_len;

    // PDU: any context-class constructed tag in the v2c range.
    if !(0xA0..=0xA7).contains(data.get(pos)?) {
        return None;
    }
    pos += 1;
    let (next, _) = read_length(data, pos)?;
    pos = next;

    // request-id INTEGER.
    if *data.get(pos)? != 0x02 {
        return None;
    }
    pos += 1;
    let (next, id_len) = read_length(data, pos)?;
    pos = next;
    let bytes = data.get(pos..pos + id_len)?;
    if bytes.is_empty() || bytes.len() > 4 {
        return None;
    }

    let mut value: i32 = if bytes[0] & 0x80 != 0 { -1 } else { 0 };
    for &byte in bytes {
        value = (value << 8) | byte as i32;
    }
    Some(value)
}

/// Minimal BER length read for the header scan: `(new_pos, length)`.
fn read_length(data: &[u8], pos: usize) -> Option<(usize, usize)> {
    let first = *data.get(pos)?;
    if first < 0x80 {
        return Some((pos + 1, first as usize));
    }
    if first == 0x80 {
        return None;
    }
    let octets = (first & 0x7F) as usize;
    if octets > 4 {
        return None;
    }
    let mut len = 0usize;
    for &byte in data.get(pos + 1..pos + 1 + octets)? {
        len = (len << 8) | byte as usize;
    }
    Some((pos + 1 + octets, len))
}
