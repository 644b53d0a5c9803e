//! In-process SNMP agent for integration tests.
//!
//! Binds an ephemeral localhost port, answers Get/GetNext/GetBulk/Set out
//! of a `BTreeMap`, and shuts down on drop. Error injection and a
//! stuck-OID mode cover the failure-path tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use snmp2c::pdu::{Pdu, PduType};
use snmp2c::{Message, Oid, Value, VarBind, oid};
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Injectable agent behaviors.
#[derive(Clone, Default)]
struct Behavior {
    /// Respond to everything with this error-status / error-index.
    force_error: Option<(i32, i32)>,
    /// Answer every GetNext/GetBulk row with this fixed varbind, simulating
    /// an agent whose cursor never advances.
    stuck: Option<(Oid, Value)>,
}

struct AgentState {
    data: Mutex<BTreeMap<Oid, Value>>,
    behavior: Mutex<Behavior>,
    requests_seen: AtomicU64,
    community: Bytes,
}

/// An in-process SNMPv2c agent bound to an ephemeral localhost port.
pub struct TestAgent {
    addr: SocketAddr,
    state: Arc<AgentState>,
    cancel: CancellationToken,
    _task: JoinHandle<()>,
}

impl TestAgent {
    /// Start an agent seeded with the default system MIB data.
    pub async fn new() -> Self {
        Self::with_data(system_mib()).await
    }

    /// Start an agent with custom data.
    pub async fn with_data(data: BTreeMap<Oid, Value>) -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0").await.expect("bind agent");
        let addr = socket.local_addr().expect("agent addr");

        let state = Arc::new(AgentState {
            data: Mutex::new(data),
            behavior: Mutex::new(Behavior::default()),
            requests_seen: AtomicU64::new(0),
            community: Bytes::from_static(b"public"),
        });
        let cancel = CancellationToken::new();

        let task = tokio::spawn(serve(socket, state.clone(), cancel.clone()));

        Self {
            addr,
            state,
            cancel,
            _task: task,
        }
    }

    /// The agent's listening address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// A session pointed at this agent with short test timeouts.
    pub fn session(&self) -> snmp2c::Snmp {
        snmp2c::Snmp::builder("127.0.0.1")
            .port(self.addr.port())
            .timeout(std::time::Duration::from_millis(500))
            .retries(1)
            .build()
    }

    /// Insert or update a value.
    pub fn set(&self, oid: Oid, value: Value) {
        self.state.data.lock().unwrap().insert(oid, value);
    }

    /// Read a stored value.
    pub fn get(&self, oid: &Oid) -> Option<Value> {
        self.state.data.lock().unwrap().get(oid).cloned()
    }

    /// How many well-formed requests the agent has answered or dropped.
    pub fn requests_seen(&self) -> u64 {
        self.state.requests_seen.load(Ordering::Relaxed)
    }

    /// Respond to every request with the given error-status and error-index.
    pub fn force_error(&self, status: i32, index: i32) {
        self.state.behavior.lock().unwrap().force_error = Some((status, index));
    }

    /// Answer every traversal row with a fixed varbind.
    pub fn stick_on(&self, oid: Oid, value: Value) {
        self.state.behavior.lock().unwrap().stuck = Some((oid, value));
    }

    /// Stop the agent.
    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl Drop for TestAgent {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn serve(socket: UdpSocket, state: Arc<AgentState>, cancel: CancellationToken) {
    let mut buf = vec![0u8; 65535];

    loop {
        let (len, source) = tokio::select! {
            _ = cancel.cancelled() => return,
            result = socket.recv_from(&mut buf) => match result {
                Ok(received) => received,
                Err(_) => return,
            },
        };

        let Ok(message) = Message::decode(Bytes::copy_from_slice(&buf[..len])) else {
            continue;
        };
        state.requests_seen.fetch_add(1, Ordering::Relaxed);

        if message.community != state.community {
            continue;
        }

        let behavior = state.behavior.lock().unwrap().clone();
        let request = message.pdu;

        let response = if let Some((status, index)) = behavior.force_error {
            Pdu {
                pdu_type: PduType::Response,
                request_id: request.request_id,
                error_status: status,
                error_index: index,
                varbinds: request.varbinds,
            }
        } else {
            answer(&state, &behavior, request)
        };

        let reply = Message::new(state.community.clone(), response).encode();
        let _ = socket.send_to(&reply, source).await;
    }
}

fn answer(state: &AgentState, behavior: &Behavior, request: Pdu) -> Pdu {
    let data = state.data.lock().unwrap();

    let varbinds = match request.pdu_type {
        PduType::GetRequest => request
            .varbinds
            .iter()
            .map(|vb| lookup(&data, &vb.oid))
            .collect(),
        PduType::GetNextRequest => request
            .varbinds
            .iter()
            .map(|vb| next_of(&data, behavior, &vb.oid))
            .collect(),
        PduType::GetBulkRequest => {
            let non_repeaters = request.non_repeaters().max(0) as usize;
            let max_repetitions = request.max_repetitions().max(0) as usize;
            let mut out = Vec::new();
            for (i, vb) in request.varbinds.iter().enumerate() {
                if i < non_repeaters {
                    out.push(next_of(&data, behavior, &vb.oid));
                } else {
                    let mut cursor = vb.oid.clone();
                    for _ in 0..max_repetitions {
                        let next = next_of(&data, behavior, &cursor);
                        cursor = next.oid.clone();
                        let end = next.value == Value::EndOfMibView;
                        out.push(next);
                        if end {
                            break;
                        }
                    }
                }
            }
            out
        }
        PduType::SetRequest => {
            drop(data);
            let mut data = state.data.lock().unwrap();
            for vb in &request.varbinds {
                data.insert(vb.oid.clone(), vb.value.clone());
            }
            request.varbinds.clone()
        }
        PduType::Response | PduType::SnmpV2Trap => Vec::new(),
    };

    Pdu {
        pdu_type: PduType::Response,
        request_id: request.request_id,
        error_status: 0,
        error_index: 0,
        varbinds,
    }
}

fn lookup(data: &BTreeMap<Oid, Value>, oid: &Oid) -> VarBind {
    match data.get(oid) {
        Some(value) => VarBind::new(oid.clone(), value.clone()),
        None => VarBind::new(oid.clone(), Value::NoSuchObject),
    }
}

fn next_of(data: &BTreeMap<Oid, Value>, behavior: &Behavior, oid: &Oid) -> VarBind {
    if let Some((stuck_oid, stuck_value)) = &behavior.stuck {
        return VarBind::new(stuck_oid.clone(), stuck_value.clone());
    }
    match data
        .range::<Oid, _>((std::ops::Bound::Excluded(oid), std::ops::Bound::Unbounded))
        .next()
    {
        Some((next_oid, value)) => VarBind::new(next_oid.clone(), value.clone()),
        None => VarBind::new(oid.clone(), Value::EndOfMibView),
    }
}

/// A small system-group MIB: sysDescr, sysUpTime, sysName, plus a few
/// interface rows for traversal tests.
pub fn system_mib() -> BTreeMap<Oid, Value> {
    let mut data = BTreeMap::new();
    data.insert(oid!(1, 3, 6, 1, 2, 1, 1, 1, 0), Value::from("Test SNMP Agent"));
    data.insert(
        oid!(1, 3, 6, 1, 2, 1, 1, 2, 0),
        Value::ObjectIdentifier(oid!(1, 3, 6, 1, 4, 1, 8072, 3, 2, 10)),
    );
    data.insert(oid!(1, 3, 6, 1, 2, 1, 1, 3, 0), Value::TimeTicks(123456));
    data.insert(oid!(1, 3, 6, 1, 2, 1, 1, 5, 0), Value::from("test-agent"));
    data.insert(oid!(1, 3, 6, 1, 2, 1, 1, 6, 0), Value::from("lab rack 4"));
    data.insert(oid!(1, 3, 6, 1, 2, 1, 2, 1, 0), Value::Integer(2));
    data.insert(oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 2, 1), Value::from("lo0"));
    data.insert(oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 2, 2), Value::from("eth0"));
    data.insert(
        oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 10, 1),
        Value::Counter32(1_000),
    );
    data.insert(
        oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 10, 2),
        Value::Counter64(10_000_000_000),
    );
    data
}
