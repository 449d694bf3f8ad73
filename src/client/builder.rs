//! Client construction.

use super::{Client, ClientConfig};
use crate::error::{Error, Result};
use crate::transport::UdpChannel;
use bytes::Bytes;
use std::time::Duration;

/// Builder for [`Client`].
///
/// Created by [`Client::builder`]. All values have working defaults; only
/// the target and community are required.
///
/// # Example
///
/// ```rust,no_run
/// use snmpoll::Client;
/// use std::time::Duration;
///
/// # async fn example() -> snmpoll::Result<()> {
/// let client = Client::builder("core-sw1.example.net:161", "private")
///     .timeout(Duration::from_secs(2))
///     .max_retries(1)
///     .cumulative_sets(false)
///     .set_interval(Duration::from_millis(250))
///     .connect()
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    target: String,
    config: ClientConfig,
}

impl ClientBuilder {
    pub(crate) fn new(target: impl Into<String>, community: impl Into<Bytes>) -> Self {
        Self {
            target: target.into(),
            config: ClientConfig {
                community: community.into(),
                ..ClientConfig::default()
            },
        }
    }

    /// Per-attempt reply timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Retransmissions after the first attempt.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// Largest varbind count per request.
    pub fn max_oids_per_request(mut self, max: usize) -> Self {
        self.config.max_oids_per_request = max;
        self
    }

    /// Hard cap on walk results.
    pub fn max_walk_results(mut self, max: usize) -> Self {
        self.config.max_walk_results = Some(max);
        self
    }

    /// Pack batched sets into a single request.
    pub fn cumulative_sets(mut self, cumulative: bool) -> Self {
        self.config.cumulative_sets = cumulative;
        self
    }

    /// Pause between the individual requests of a throttled batched set.
    pub fn set_interval(mut self, interval: Duration) -> Self {
        self.config.set_interval = interval;
        self
    }

    /// Resolve the target, open the channel, and build the client.
    pub async fn connect(self) -> Result<Client> {
        if self.config.timeout.is_zero() {
            return Err(Error::Config("timeout must be non-zero".into()).boxed());
        }
        if self.config.max_oids_per_request == 0 {
            return Err(Error::Config("max_oids_per_request must be at least 1".into()).boxed());
        }

        let addr = tokio::net::lookup_host(&self.target)
            .await
            .map_err(|e| {
                Error::Config(format!("cannot resolve {}: {}", self.target, e).into()).boxed()
            })?
            .next()
            .ok_or_else(|| {
                Error::Config(format!("{} resolved to no addresses", self.target).into()).boxed()
            })?;

        let channel = UdpChannel::connect(addr).await?;
        Ok(Client::new(channel, self.config))
    }
}
