//! UDP channel with request-id correlated receive.
//!
//! One channel owns one connected socket to one target. Replies are matched
//! by the request identifier embedded in the datagram; anything else arriving
//! on the socket - a late reply to an abandoned request, a duplicate, noise -
//! is logged and dropped, never handed to the wrong waiter.

use crate::error::{Error, Result};
use crate::wire::peek_request_id;
use bytes::Bytes;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicI32, Ordering};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::Instant;

/// Largest datagram the channel will accept.
const MAX_DATAGRAM: usize = 65_535;

/// Monotonic request-identifier allocator, one per channel.
///
/// Identifiers stay positive and are never reused within a channel's
/// lifetime (they wrap back to 1 only after i32::MAX allocations). Keeping
/// the counter per channel means independent pollers cannot collide however
/// many run concurrently.
#[derive(Debug)]
pub struct RequestIds {
    next: AtomicI32,
}

impl RequestIds {
    /// Start a fresh allocator at 1.
    pub fn new() -> Self {
        Self {
            next: AtomicI32::new(1),
        }
    }

    /// Allocate the next identifier.
    pub fn next(&self) -> i32 {
        // fetch_update never fails with this closure; wrap past i32::MAX
        // back to 1 rather than going negative.
        self.next
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |id| {
                Some(if id == i32::MAX { 1 } else { id + 1 })
            })
            .unwrap_or(1)
    }
}

impl Default for RequestIds {
    fn default() -> Self {
        Self::new()
    }
}

/// A connected UDP endpoint for one target device.
#[derive(Debug)]
pub struct UdpChannel {
    socket: UdpSocket,
    target: SocketAddr,
    local_addr: SocketAddr,
    ids: RequestIds,
}

impl UdpChannel {
    /// Bind an ephemeral socket of the target's address family and connect
    /// it.
    ///
    /// Failure here is a setup fault ([`Error::Io`]), not a per-request
    /// outcome.
    pub async fn connect(target: SocketAddr) -> Result<Self> {
        use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
        let bind_addr = if target.is_ipv4() {
            SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0)
        } else {
            SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0)
        };

        let socket = UdpSocket::bind(bind_addr)
            .await
            .map_err(|e| Error::Io { target, source: e }.boxed())?;
        socket
            .connect(target)
            .await
            .map_err(|e| Error::Io { target, source: e }.boxed())?;
        let local_addr = socket
            .local_addr()
            .map_err(|e| Error::Io { target, source: e }.boxed())?;

        tracing::debug!(
            target: "snmpoll::transport",
            message = "UDP channel connected",
            snmp.target = %target,
            snmp.local_addr = %local_addr,
        );

        Ok(Self {
            socket,
            target,
            local_addr,
            ids: RequestIds::new(),
        })
    }

    /// The remote address this channel sends to.
    pub fn target(&self) -> SocketAddr {
        self.target
    }

    /// The local bind address.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Allocate a request identifier from this channel's counter.
    pub fn next_request_id(&self) -> i32 {
        self.ids.next()
    }

    /// Transmit one encoded request.
    pub async fn send(&self, data: &[u8]) -> Result<()> {
        tracing::trace!(
            target: "snmpoll::transport",
            message = "send",
            snmp.target = %self.target,
            snmp.bytes = data.len(),
        );
        self.socket.send(data).await.map_err(|e| {
            Error::Io {
                target: self.target,
                source: e,
            }
            .boxed()
        })?;
        Ok(())
    }

    /// Wait for the reply carrying `request_id`, up to `timeout`.
    ///
    /// Datagrams with a different (or unreadable) request identifier are
    /// dropped and the wait continues against the same deadline. The
    /// deadline expiring yields [`Error::Timeout`] with `retries: 0`; the
    /// client layer re-raises it with the full retry context.
    pub async fn recv(&self, request_id: i32, timeout: Duration) -> Result<Bytes> {
        let deadline = Instant::now() + timeout;
        let mut buf = vec![0u8; MAX_DATAGRAM];

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }

            match tokio::time::timeout(remaining, self.socket.recv(&mut buf)).await {
                Ok(Ok(len)) => {
                    let data = Bytes::copy_from_slice(&buf[..len]);
                    match peek_request_id(&data) {
                        Some(id) if id == request_id => {
                            tracing::trace!(
                                target: "snmpoll::transport",
                                message = "reply correlated",
                                snmp.target = %self.target,
                                snmp.request_id = request_id,
                                snmp.bytes = len,
                            );
                            return Ok(data);
                        }
                        other => {
                            tracing::debug!(
                                target: "snmpoll::transport",
                                message = "dropping uncorrelated datagram",
                                snmp.target = %self.target,
                                snmp.expected_request_id = request_id,
                                snmp.actual_request_id = ?other,
                            );
                        }
                    }
                }
                Ok(Err(e)) => {
                    return Err(Error::Io {
                        target: self.target,
                        source: e,
                    }
                    .boxed());
                }
                Err(_) => break,
            }
        }

        Err(Error::Timeout {
            target: self.target,
            elapsed: timeout,
            retries: 0,
        }
        .boxed())
    }
}
