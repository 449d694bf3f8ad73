//! SNMP polling client.
//!
//! One [`Client`] talks to one target device over a connected UDP channel.
//! Requests are strictly sequential within a client (no pipelining); run
//! independent clients for independent targets. Cloning is cheap and shares
//! the channel - concurrent callers on one client serialize behind an
//! internal gate so replies can never cross-correlate.

mod batch;
mod builder;
mod sample;
mod walk;

pub use batch::BatchResult;
pub use builder::ClientBuilder;
pub use sample::{Direction, TimedSample};

use crate::error::{Error, ErrorStatus, Result};
use crate::oid::Oid;
use crate::table::{Table, build_table};
use crate::transport::UdpChannel;
use crate::value::Value;
use crate::varbind::VarBind;
use crate::wire::{Pdu, PduKind, decode_message, encode_message};
use crate::mib;
use bytes::Bytes;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::instrument;

/// Client configuration.
///
/// Every knob here is caller-supplied; the core hardcodes none of them.
/// Most users construct this through [`ClientBuilder`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Community string sent with every request (default: "public").
    pub community: Bytes,
    /// Per-attempt reply timeout (default: 5 seconds).
    pub timeout: Duration,
    /// Retransmissions after the first attempt (default: 3).
    pub max_retries: u32,
    /// Largest varbind count per request; longer lists are split
    /// (default: 10).
    pub max_oids_per_request: usize,
    /// Hard cap on walk results (default: none).
    pub max_walk_results: Option<usize>,
    /// Pack batched sets into one request instead of sending them one by
    /// one (default: false).
    pub cumulative_sets: bool,
    /// Pause between consecutive requests of a non-cumulative batched set
    /// (default: zero). Deliberate backpressure for constrained device
    /// control planes.
    pub set_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            community: Bytes::from_static(b"public"),
            timeout: Duration::from_secs(5),
            max_retries: 3,
            max_oids_per_request: 10,
            max_walk_results: None,
            cumulative_sets: false,
            set_interval: Duration::ZERO,
        }
    }
}

#[derive(Debug)]
struct ClientInner {
    channel: UdpChannel,
    config: ClientConfig,
    /// One request in flight per channel; callers queue here.
    gate: Mutex<()>,
}

/// SNMP polling client for a single target.
///
/// # Example
///
/// ```rust,no_run
/// use snmpoll::{Client, mib};
/// use std::time::Duration;
///
/// # async fn example() -> snmpoll::Result<()> {
/// let client = Client::builder("192.0.2.1:161", "public")
///     .timeout(Duration::from_secs(2))
///     .max_retries(2)
///     .connect()
///     .await?;
///
/// let uptime = client.get_scalar(&mib::sys_uptime()).await?;
/// println!("uptime: {}", uptime);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl Client {
    /// Start building a client for `target` (host:port) with the given
    /// community.
    pub fn builder(target: impl Into<String>, community: impl Into<Bytes>) -> ClientBuilder {
        ClientBuilder::new(target, community)
    }

    /// Wrap an already-connected channel.
    pub fn new(channel: UdpChannel, config: ClientConfig) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                channel,
                config,
                gate: Mutex::new(()),
            }),
        }
    }

    /// The target address this client polls.
    pub fn target(&self) -> SocketAddr {
        self.inner.channel.target()
    }

    pub(crate) fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    fn next_request_id(&self) -> i32 {
        self.inner.channel.next_request_id()
    }

    /// Send a request PDU and return the classified response PDU.
    ///
    /// Retransmits on timeout up to `max_retries` times, then surfaces
    /// [`Error::Timeout`] naming the target. A reply with a non-success
    /// status becomes [`Error::Protocol`] carrying the device-supplied
    /// status.
    async fn send_request(&self, pdu: Pdu) -> Result<Pdu> {
        let config = &self.inner.config;
        let request_id = pdu.request_id;
        let data = encode_message(&config.community, &pdu);

        tracing::debug!(
            target: "snmpoll::client",
            message = "sending request",
            snmp.target = %self.target(),
            snmp.pdu_kind = %pdu.kind,
            snmp.request_id = request_id,
            snmp.varbind_count = pdu.varbinds.len(),
        );

        let _in_flight = self.inner.gate.lock().await;
        let start = Instant::now();

        for attempt in 0..=config.max_retries {
            if attempt > 0 {
                tracing::debug!(
                    target: "snmpoll::client",
                    message = "retransmitting after timeout",
                    snmp.target = %self.target(),
                    snmp.request_id = request_id,
                    snmp.attempt = attempt,
                );
            }

            self.inner.channel.send(&data).await?;

            match self.inner.channel.recv(request_id, config.timeout).await {
                Ok(bytes) => return self.classify_response(request_id, bytes),
                Err(e) if matches!(*e, Error::Timeout { .. }) => continue,
                Err(e) => return Err(e),
            }
        }

        let elapsed = start.elapsed();
        tracing::warn!(
            target: "snmpoll::client",
            message = "request timed out, no response received",
            snmp.target = %self.target(),
            snmp.request_id = request_id,
            snmp.elapsed_ms = elapsed.as_millis() as u64,
            snmp.retries = config.max_retries,
        );
        Err(Error::Timeout {
            target: self.target(),
            elapsed,
            retries: config.max_retries,
        }
        .boxed())
    }

    fn classify_response(&self, request_id: i32, bytes: Bytes) -> Result<Pdu> {
        let (_community, response) = decode_message(bytes)?;

        // The channel already filtered on the peeked id; re-check against
        // the fully decoded PDU before trusting it.
        if response.request_id != request_id || response.kind != PduKind::Response {
            tracing::warn!(
                target: "snmpoll::client",
                message = "response failed validation",
                snmp.target = %self.target(),
                snmp.expected_request_id = request_id,
                snmp.actual_request_id = response.request_id,
                snmp.pdu_kind = %response.kind,
            );
            return Err(Error::MalformedResponse {
                target: self.target(),
            }
            .boxed());
        }

        if response.is_error() {
            let status = ErrorStatus::from_i32(response.error_status);
            // error_index is 1-based; 0 means the error applies to the PDU.
            let oid = (response.error_index as usize)
                .checked_sub(1)
                .and_then(|idx| response.varbinds.get(idx))
                .map(|vb| vb.oid.clone());
            tracing::debug!(
                target: "snmpoll::client",
                message = "device returned error status",
                snmp.target = %self.target(),
                snmp.error_status = %status,
                snmp.error_index = response.error_index,
            );
            return Err(Error::Protocol {
                target: self.target(),
                status,
                index: response.error_index.max(0) as u32,
                oid,
            }
            .boxed());
        }

        tracing::debug!(
            target: "snmpoll::client",
            message = "response received",
            snmp.target = %self.target(),
            snmp.request_id = request_id,
            snmp.varbind_count = response.varbinds.len(),
        );
        Ok(response)
    }

    fn sole_varbind(&self, response: Pdu) -> Result<VarBind> {
        response.varbinds.into_iter().next().ok_or_else(|| {
            Error::MalformedResponse {
                target: self.target(),
            }
            .boxed()
        })
    }

    /// GET a single value.
    #[instrument(skip(self), err, fields(snmp.target = %self.target(), snmp.oid = %oid))]
    pub async fn get(&self, oid: &Oid) -> Result<VarBind> {
        let pdu = Pdu::get(self.next_request_id(), std::slice::from_ref(oid));
        let response = self.send_request(pdu).await?;
        self.sole_varbind(response)
    }

    /// GET multiple values.
    ///
    /// Lists longer than `max_oids_per_request` are split into several
    /// requests; results come back in input order.
    #[instrument(skip(self, oids), err, fields(snmp.target = %self.target(), snmp.oid_count = oids.len()))]
    pub async fn get_many(&self, oids: &[Oid]) -> Result<Vec<VarBind>> {
        let mut results = Vec::with_capacity(oids.len());
        for chunk in oids.chunks(self.inner.config.max_oids_per_request.max(1)) {
            let pdu = Pdu::get(self.next_request_id(), chunk);
            results.extend(self.send_request(pdu).await?.varbinds);
        }
        Ok(results)
    }

    /// GETNEXT: the lexicographic successor of a single key.
    #[instrument(skip(self), err, fields(snmp.target = %self.target(), snmp.oid = %oid))]
    pub async fn get_next(&self, oid: &Oid) -> Result<VarBind> {
        let pdu = Pdu::get_next(self.next_request_id(), std::slice::from_ref(oid));
        let response = self.send_request(pdu).await?;
        self.sole_varbind(response)
    }

    /// GETNEXT for multiple keys, chunked like [`get_many`](Self::get_many).
    #[instrument(skip(self, oids), err, fields(snmp.target = %self.target(), snmp.oid_count = oids.len()))]
    pub async fn get_next_many(&self, oids: &[Oid]) -> Result<Vec<VarBind>> {
        let mut results = Vec::with_capacity(oids.len());
        for chunk in oids.chunks(self.inner.config.max_oids_per_request.max(1)) {
            let pdu = Pdu::get_next(self.next_request_id(), chunk);
            results.extend(self.send_request(pdu).await?.varbinds);
        }
        Ok(results)
    }

    /// SET a single value, returning the device's echo of the binding.
    #[instrument(skip(self, value), err, fields(snmp.target = %self.target(), snmp.oid = %oid))]
    pub async fn set(&self, oid: &Oid, value: Value) -> Result<VarBind> {
        let varbind = VarBind::new(oid.clone(), value);
        let pdu = Pdu::set(self.next_request_id(), vec![varbind]);
        let response = self.send_request(pdu).await?;
        self.sole_varbind(response)
    }

    /// SET multiple values, chunked like [`get_many`](Self::get_many).
    #[instrument(skip(self, varbinds), err, fields(snmp.target = %self.target(), snmp.oid_count = varbinds.len()))]
    pub async fn set_many(&self, varbinds: &[(Oid, Value)]) -> Result<Vec<VarBind>> {
        let mut results = Vec::with_capacity(varbinds.len());
        for chunk in varbinds.chunks(self.inner.config.max_oids_per_request.max(1)) {
            let vbs: Vec<VarBind> = chunk
                .iter()
                .map(|(oid, value)| VarBind::new(oid.clone(), value.clone()))
                .collect();
            let pdu = Pdu::set(self.next_request_id(), vbs);
            results.extend(self.send_request(pdu).await?.varbinds);
        }
        Ok(results)
    }

    /// GET a single concrete value.
    ///
    /// Unlike [`get`](Self::get) this fails with [`Error::Syntax`] if the
    /// device answers with an exception marker instead of data.
    #[instrument(skip(self), err, fields(snmp.target = %self.target(), snmp.oid = %oid))]
    pub async fn get_scalar(&self, oid: &Oid) -> Result<Value> {
        self.get(oid).await?.into_concrete()
    }

    /// GET multiple concrete values, in input order.
    ///
    /// Fails with [`Error::Syntax`] on the first exception marker.
    #[instrument(skip(self, oids), err, fields(snmp.target = %self.target(), snmp.oid_count = oids.len()))]
    pub async fn get_scalars(&self, oids: &[Oid]) -> Result<Vec<Value>> {
        self.get_many(oids)
            .await?
            .into_iter()
            .map(VarBind::into_concrete)
            .collect()
    }

    /// Probe reachability via sysUpTime.
    ///
    /// True when the device echoes the sysUpTime key with a positive,
    /// concrete reading. Every failure mode - timeout, protocol error,
    /// exception marker, foreign key in the echo - reads as "not
    /// responding".
    #[instrument(skip(self), fields(snmp.target = %self.target()))]
    pub async fn is_responding(&self) -> bool {
        let uptime_key = mib::sys_uptime();
        match self.get(&uptime_key).await {
            Ok(vb) => {
                if vb.oid != uptime_key {
                    tracing::debug!(
                        target: "snmpoll::client",
                        message = "connectivity check failed: agent answered a different key",
                        snmp.target = %self.target(),
                        snmp.oid = %vb.oid,
                    );
                    return false;
                }
                match vb.into_concrete() {
                    Ok(value) => value.as_u32().is_some_and(|ticks| ticks > 0),
                    Err(_) => false,
                }
            }
            Err(e) => {
                tracing::debug!(
                    target: "snmpoll::client",
                    message = "connectivity check failed",
                    snmp.target = %self.target(),
                    error = %e,
                );
                false
            }
        }
    }

    /// Find the ifIndex of the interface named `name`.
    ///
    /// Walks the ifDescr column and returns the index arc of the first
    /// matching description, or `None` when no interface carries that name.
    #[instrument(skip(self), err, fields(snmp.target = %self.target(), snmp.if_name = name))]
    pub async fn lookup_if_index(&self, name: &str) -> Result<Option<u32>> {
        let descriptions = self.walk(&mib::if_descr()).await?;
        for vb in &descriptions {
            if vb.value.as_str() == Some(name) {
                return Ok(vb.oid.last());
            }
        }
        tracing::debug!(
            target: "snmpoll::client",
            message = "no interface with that description",
            snmp.target = %self.target(),
            snmp.if_name = name,
        );
        Ok(None)
    }

    /// Walk a table and reconstruct it.
    ///
    /// `entry` is the table's row prefix (e.g. [`mib::if_entry`]).
    #[instrument(skip(self), err, fields(snmp.target = %self.target(), snmp.oid = %entry))]
    pub async fn table(&self, entry: &Oid) -> Result<Table> {
        let entries = self.walk(entry).await?;
        Ok(build_table(&entries, entry))
    }

    /// ipOutNoRoutes.0 - a cheap health scalar for route exhaustion.
    #[instrument(skip(self), err, fields(snmp.target = %self.target()))]
    pub async fn ip_out_no_routes(&self) -> Result<u64> {
        let value = self.get_scalar(&mib::ip_out_no_routes()).await?;
        value.as_u64().ok_or_else(|| {
            Error::MalformedResponse {
                target: self.target(),
            }
            .boxed()
        })
    }
}
