//! Timed counter sampling and rate derivation.
//!
//! A [`TimedSample`] pairs a value snapshot with the device's own uptime
//! reading taken in the same request. Two samples seconds apart yield an
//! elapsed time measured by the device clock, which tolerates network
//! jitter in a way the poller's wall clock cannot.

use super::Client;
use crate::error::{Error, Result};
use crate::mib;
use crate::oid::Oid;
use crate::value::Value;
use std::time::Duration;
use tracing::instrument;

/// Which octet counter a derived link rate reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Inbound octets (paired position 0).
    Inbound,
    /// Outbound octets (paired position 1).
    Outbound,
    /// Whichever of the two moved more.
    Peak,
}

/// A value snapshot stamped with the device clock.
///
/// Built once per sampling call and never mutated. The uptime is captured
/// in the same request as the values, so the stamp and the counters are
/// coherent.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedSample {
    values: Vec<Value>,
    uptime_millis: u64,
}

impl TimedSample {
    /// Construct a sample directly.
    ///
    /// [`Client::sample`] is the normal source; direct construction serves
    /// offline rate computation over recorded snapshots.
    pub fn new(values: Vec<Value>, uptime_millis: u64) -> Self {
        Self {
            values,
            uptime_millis,
        }
    }

    /// The sampled values, in request order (without the clock key).
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Device uptime at capture, in milliseconds.
    pub fn uptime_millis(&self) -> u64 {
        self.uptime_millis
    }

    /// Device-clock milliseconds elapsed since `earlier`.
    ///
    /// Negative when the device rebooted (or the samples are swapped).
    pub fn millis_since(&self, earlier: &TimedSample) -> i64 {
        self.uptime_millis as i64 - earlier.uptime_millis as i64
    }

    fn counter(&self, position: usize) -> Result<u64> {
        self.values
            .get(position)
            .and_then(Value::as_u64)
            .ok_or_else(|| Error::NonNumericSample { position }.boxed())
    }

    /// Derive a bit rate from two octet-counter samples.
    ///
    /// `self` is the later sample; `earlier` the first. Positions 0 and 1
    /// hold the inbound and outbound octet counters. Per position the delta
    /// is converted to bits (x8) and divided by the whole seconds the
    /// device clock advanced, rounding the result.
    ///
    /// Fails with [`Error::InvalidSample`] when the device clock did not
    /// advance by at least one second - a zero or negative interval is not
    /// a zero rate. Counter wraparound between the two samples is not
    /// corrected; counters are assumed wide enough for the interval.
    ///
    /// ```
    /// use snmpoll::{Direction, TimedSample, Value};
    ///
    /// let first = TimedSample::new(vec![Value::Counter32(1000)], 10_000);
    /// let second = TimedSample::new(vec![Value::Counter32(9000)], 20_000);
    /// // 8000 octets = 64000 bits over 10 s.
    /// assert_eq!(second.bitrate_since(&first, Direction::Inbound).unwrap(), 6400);
    /// ```
    pub fn bitrate_since(&self, earlier: &TimedSample, direction: Direction) -> Result<i64> {
        let elapsed_millis = self.millis_since(earlier);
        let elapsed_seconds = elapsed_millis / 1000;
        if elapsed_seconds <= 0 {
            return Err(Error::InvalidSample { elapsed_millis }.boxed());
        }

        let delta_bits = |position: usize| -> Result<i64> {
            let before = earlier.counter(position)?;
            let after = self.counter(position)?;
            Ok((after as i64 - before as i64) * 8)
        };

        let bits = match direction {
            Direction::Inbound => delta_bits(0)?,
            Direction::Outbound => delta_bits(1)?,
            Direction::Peak => {
                let inbound = delta_bits(0)?;
                let outbound = delta_bits(1)?;
                inbound.max(outbound)
            }
        };

        Ok((bits as f64 / elapsed_seconds as f64).round() as i64)
    }
}

impl Client {
    /// Capture a timed sample of `oids`.
    ///
    /// Issues one combined GET for the keys plus sysUpTime, splitting the
    /// uptime off as the sample clock. The whole list must fit in a single
    /// request - a sample spread over several requests would not share one
    /// clock reading.
    ///
    /// All returned values must be concrete; an exception marker fails the
    /// sample with [`Error::Syntax`].
    #[instrument(skip(self, oids), err, fields(snmp.target = %self.target(), snmp.oid_count = oids.len()))]
    pub async fn sample(&self, oids: &[Oid]) -> Result<TimedSample> {
        if oids.len() + 1 > self.config().max_oids_per_request {
            return Err(Error::Config(
                format!(
                    "timed sample needs {} keys in one request but max_oids_per_request is {}",
                    oids.len() + 1,
                    self.config().max_oids_per_request
                )
                .into(),
            )
            .boxed());
        }

        let mut keys: Vec<Oid> = oids.to_vec();
        keys.push(mib::sys_uptime());

        let mut values = self.get_scalars(&keys).await?;
        let clock = values.pop().ok_or_else(|| {
            Error::MalformedResponse {
                target: self.target(),
            }
            .boxed()
        })?;
        let ticks = clock.as_u32().ok_or_else(|| {
            Error::MalformedResponse {
                target: self.target(),
            }
            .boxed()
        })?;

        let sample = TimedSample::new(values, mib::ticks_to_millis(ticks));
        tracing::debug!(
            target: "snmpoll::client",
            message = "timed sample captured",
            snmp.target = %self.target(),
            snmp.value_count = sample.values().len(),
            snmp.uptime_ms = sample.uptime_millis(),
        );
        Ok(sample)
    }

    /// Measure the current bit rate of interface `if_index`.
    ///
    /// Samples ifInOctets/ifOutOctets, waits `interval` (suspending only
    /// this task), samples again, and derives the rate from the device
    /// clock delta. The pause is driven entirely by the caller's choice of
    /// `interval`.
    #[instrument(skip(self), err, fields(snmp.target = %self.target(), snmp.if_index = if_index))]
    pub async fn link_bitrate(
        &self,
        if_index: u32,
        interval: Duration,
        direction: Direction,
    ) -> Result<i64> {
        let keys = [
            mib::if_in_octets().child(if_index),
            mib::if_out_octets().child(if_index),
        ];

        let first = self.sample(&keys).await?;
        tokio::time::sleep(interval).await;
        let second = self.sample(&keys).await?;

        let rate = second.bitrate_since(&first, direction)?;
        tracing::debug!(
            target: "snmpoll::client",
            message = "link bitrate measured",
            snmp.target = %self.target(),
            snmp.if_index = if_index,
            snmp.elapsed_ms = second.millis_since(&first),
            snmp.bitrate = rate,
        );
        Ok(rate)
    }
}
