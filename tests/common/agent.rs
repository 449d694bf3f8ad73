//! In-process SNMP agent for integration tests.
//!
//! Serves a mutable key/value store over a real UDP socket on an ephemeral
//! localhost port, with fault injection for the failure paths: dropped
//! requests, replies with a wrong request id, injected error statuses, and
//! value rewrites on SET.

use snmpoll::{Oid, Value, VarBind, mib, oid};
use snmpoll::wire::{Pdu, PduKind, decode_message, encode_message};
use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::ops::Bound;
use std::sync::atomic::{AtomicI32, AtomicI64, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;

struct Behavior {
    /// Silently swallow this many requests (timeout simulation).
    drop_requests: AtomicU32,
    /// Answer this many more requests, then swallow everything
    /// (-1 = unlimited).
    answer_budget: AtomicI64,
    /// Answer this many requests with a mangled request id.
    wrong_id_replies: AtomicU32,
    /// Answer the next request with this error status (0 = disabled).
    fail_next_status: AtomicI32,
    /// On SET of a key, echo this value instead of the written one.
    rewrite_on_set: Mutex<HashMap<Oid, Value>>,
    /// Before answering any request, add these deltas to numeric keys.
    step_on_request: Mutex<Vec<(Oid, u64)>>,
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            drop_requests: AtomicU32::new(0),
            answer_budget: AtomicI64::new(-1),
            wrong_id_replies: AtomicU32::new(0),
            fail_next_status: AtomicI32::new(0),
            rewrite_on_set: Mutex::new(HashMap::new()),
            step_on_request: Mutex::new(Vec::new()),
        }
    }
}

/// An in-process SNMP agent bound to an ephemeral localhost port.
///
/// Starts serving on creation and stops when dropped.
pub struct TestAgent {
    addr: SocketAddr,
    store: Arc<Mutex<BTreeMap<Oid, Value>>>,
    behavior: Arc<Behavior>,
    task: JoinHandle<()>,
}

impl TestAgent {
    /// Agent with a small MIB-II-flavored data set.
    pub async fn new() -> Self {
        Self::with_data(Self::default_store()).await
    }

    /// Agent serving the given data.
    pub async fn with_data(data: BTreeMap<Oid, Value>) -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0").await.expect("bind agent");
        let addr = socket.local_addr().expect("agent addr");
        let store = Arc::new(Mutex::new(data));
        let behavior = Arc::new(Behavior::default());

        let task = tokio::spawn(serve(socket, store.clone(), behavior.clone()));

        Self {
            addr,
            store,
            behavior,
            task,
        }
    }

    /// The system group plus a three-interface ifTable slice.
    pub fn default_store() -> BTreeMap<Oid, Value> {
        let mut data = BTreeMap::new();
        data.insert(mib::sys_descr(), Value::from("snmpoll test agent"));
        data.insert(mib::sys_uptime(), Value::TimeTicks(360_000));
        data.insert(mib::if_number(), Value::Integer(3));
        for (index, name) in [(1u32, "lo0"), (2, "eth0"), (3, "eth1")] {
            data.insert(mib::if_index().child(index), Value::Integer(index as i32));
            data.insert(mib::if_descr().child(index), Value::from(name));
            data.insert(mib::if_type().child(index), Value::Integer(6));
            data.insert(
                mib::if_in_octets().child(index),
                Value::Counter32(1_000 * index),
            );
            data.insert(
                mib::if_out_octets().child(index),
                Value::Counter32(2_000 * index),
            );
        }
        // A neighboring subtree so walks can run past their root.
        data.insert(oid!(1, 3, 6, 1, 2, 1, 4, 12, 0), Value::Counter32(17));
        data
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Insert or replace a value.
    pub fn set(&self, oid: Oid, value: Value) {
        self.store.lock().unwrap().insert(oid, value);
    }

    /// Remove a value.
    pub fn remove(&self, oid: &Oid) -> Option<Value> {
        self.store.lock().unwrap().remove(oid)
    }

    /// Read a value back (SET assertions).
    pub fn get(&self, oid: &Oid) -> Option<Value> {
        self.store.lock().unwrap().get(oid).cloned()
    }

    /// Swallow the next `count` requests without answering.
    pub fn drop_requests(&self, count: u32) {
        self.behavior.drop_requests.store(count, Ordering::SeqCst);
    }

    /// Answer the next `count` requests, then swallow everything after.
    pub fn drop_after_next(&self, count: i64) {
        self.behavior.answer_budget.store(count, Ordering::SeqCst);
    }

    /// Answer the next `count` requests with a mangled request id.
    pub fn answer_with_wrong_id(&self, count: u32) {
        self.behavior
            .wrong_id_replies
            .store(count, Ordering::SeqCst);
    }

    /// Answer the next request with the given error status.
    pub fn fail_next_with_status(&self, status: i32) {
        self.behavior.fail_next_status.store(status, Ordering::SeqCst);
    }

    /// On SET of `oid`, echo `value` instead of what was written.
    pub fn rewrite_on_set(&self, oid: Oid, value: Value) {
        self.behavior
            .rewrite_on_set
            .lock()
            .unwrap()
            .insert(oid, value);
    }

    /// Before every answered request, add `delta` to the numeric value at
    /// `oid`. Drives deterministic counter/uptime advancement for sampling
    /// tests.
    pub fn step_on_request(&self, oid: Oid, delta: u64) {
        self.behavior
            .step_on_request
            .lock()
            .unwrap()
            .push((oid, delta));
    }
}

impl Drop for TestAgent {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve(socket: UdpSocket, store: Arc<Mutex<BTreeMap<Oid, Value>>>, behavior: Arc<Behavior>) {
    let mut buf = vec![0u8; 65_535];
    loop {
        let Ok((len, peer)) = socket.recv_from(&mut buf).await else {
            return;
        };
        let Ok((community, request)) = decode_message(bytes::Bytes::copy_from_slice(&buf[..len]))
        else {
            continue;
        };
        if community.as_ref() != b"public" {
            continue;
        }

        if decrement(&behavior.drop_requests) {
            continue;
        }

        if !consume_budget(&behavior.answer_budget) {
            continue;
        }

        apply_steps(&store, &behavior);

        let mut response = handle(&store, &behavior, &request);

        let status = behavior.fail_next_status.swap(0, Ordering::SeqCst);
        if status != 0 {
            response.error_status = status;
            response.error_index = 1;
            response.varbinds = request.varbinds.clone();
        }

        if decrement(&behavior.wrong_id_replies) {
            response.request_id = response.request_id.wrapping_add(1_000);
        }

        let encoded = encode_message(b"public", &response);
        let _ = socket.send_to(&encoded, peer).await;
    }
}

fn decrement(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

fn consume_budget(budget: &AtomicI64) -> bool {
    budget
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| match n {
            n if n < 0 => Some(n),
            0 => None,
            n => Some(n - 1),
        })
        .is_ok()
}

fn apply_steps(store: &Mutex<BTreeMap<Oid, Value>>, behavior: &Behavior) {
    let steps = behavior.step_on_request.lock().unwrap();
    if steps.is_empty() {
        return;
    }
    let mut store = store.lock().unwrap();
    for (oid, delta) in steps.iter() {
        if let Some(value) = store.get_mut(oid) {
            *value = match &*value {
                Value::Counter32(v) => Value::Counter32(v.wrapping_add(*delta as u32)),
                Value::Counter64(v) => Value::Counter64(v.wrapping_add(*delta)),
                Value::TimeTicks(v) => Value::TimeTicks(v.wrapping_add(*delta as u32)),
                Value::Gauge32(v) => Value::Gauge32(v.wrapping_add(*delta as u32)),
                other => other.clone(),
            };
        }
    }
}

fn handle(
    store: &Mutex<BTreeMap<Oid, Value>>,
    behavior: &Behavior,
    request: &Pdu,
) -> Pdu {
    let store_guard = store.lock().unwrap();
    let varbinds: Vec<VarBind> = match request.kind {
        PduKind::Get => request
            .varbinds
            .iter()
            .map(|vb| {
                let value = store_guard
                    .get(&vb.oid)
                    .cloned()
                    .unwrap_or(Value::NoSuchInstance);
                VarBind::new(vb.oid.clone(), value)
            })
            .collect(),
        PduKind::GetNext => request
            .varbinds
            .iter()
            .map(|vb| {
                store_guard
                    .range((Bound::Excluded(vb.oid.clone()), Bound::Unbounded))
                    .next()
                    .map(|(oid, value)| VarBind::new(oid.clone(), value.clone()))
                    .unwrap_or_else(|| VarBind::new(vb.oid.clone(), Value::EndOfMibView))
            })
            .collect(),
        PduKind::Set => {
            drop(store_guard);
            let rewrites = behavior.rewrite_on_set.lock().unwrap();
            let mut store_guard = store.lock().unwrap();
            request
                .varbinds
                .iter()
                .map(|vb| {
                    if let Some(replacement) = rewrites.get(&vb.oid) {
                        VarBind::new(vb.oid.clone(), replacement.clone())
                    } else {
                        store_guard.insert(vb.oid.clone(), vb.value.clone());
                        VarBind::new(vb.oid.clone(), vb.value.clone())
                    }
                })
                .collect()
        }
        PduKind::Response => Vec::new(),
    };

    Pdu::response(request.request_id, varbinds)
}
