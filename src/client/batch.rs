//! Batched parameter get/set with two delivery policies.
//!
//! A batched set reports one boolean per target, never a single aggregate
//! pass/fail: a target counts as accepted only when the device echoes the
//! written value back identically. Delivery is either cumulative (one
//! packed request) or throttled (sequential requests with a configured
//! pause between them, so constrained control planes are not flooded).

use super::Client;
use crate::error::{Error, Result};
use crate::oid::Oid;
use crate::value::Value;
use crate::varbind::VarBind;
use crate::wire::Pdu;
use std::collections::BTreeMap;
use tracing::instrument;

/// Per-target outcome of a batched set.
///
/// `true` means the device echoed the written value unchanged.
pub type BatchResult = BTreeMap<Oid, bool>;

impl Client {
    /// Write a batch of values, one outcome per target.
    ///
    /// With `cumulative_sets` configured, all pairs go out in a single SET
    /// request; a request-level failure (timeout, protocol error) then
    /// fails the whole batch, since no target was durably delivered.
    ///
    /// Otherwise each pair is sent as its own SET with `set_interval`
    /// between consecutive requests, and a timeout or protocol error on
    /// one target records `false` for it without aborting the rest. Only
    /// transport faults (the socket itself failing) abort a throttled
    /// batch.
    #[instrument(skip(self, targets), err, fields(snmp.target = %self.target(), snmp.oid_count = targets.len(), snmp.cumulative = self.config().cumulative_sets))]
    pub async fn set_all(&self, targets: &[(Oid, Value)]) -> Result<BatchResult> {
        if self.config().cumulative_sets {
            self.set_all_cumulative(targets).await
        } else {
            self.set_all_throttled(targets).await
        }
    }

    async fn set_all_cumulative(&self, targets: &[(Oid, Value)]) -> Result<BatchResult> {
        if targets.is_empty() {
            return Ok(BatchResult::new());
        }

        // One packed request, deliberately not chunked: cumulative delivery
        // promises a single round trip.
        let varbinds: Vec<VarBind> = targets
            .iter()
            .map(|(oid, value)| VarBind::new(oid.clone(), value.clone()))
            .collect();
        let pdu = Pdu::set(self.next_request_id(), varbinds);
        let response = self.send_request(pdu).await?;

        if response.varbinds.len() != targets.len() {
            return Err(Error::MalformedResponse {
                target: self.target(),
            }
            .boxed());
        }

        let mut outcomes = BatchResult::new();
        for ((oid, value), echoed) in targets.iter().zip(&response.varbinds) {
            let accepted = echoed.oid == *oid && echoed.value == *value;
            if !accepted {
                tracing::debug!(
                    target: "snmpoll::client",
                    message = "device did not echo written value",
                    snmp.target = %self.target(),
                    snmp.oid = %oid,
                    snmp.echoed = %echoed,
                );
            }
            outcomes.insert(oid.clone(), accepted);
        }
        Ok(outcomes)
    }

    async fn set_all_throttled(&self, targets: &[(Oid, Value)]) -> Result<BatchResult> {
        let interval = self.config().set_interval;
        let mut outcomes = BatchResult::new();

        for (position, (oid, value)) in targets.iter().enumerate() {
            if position > 0 && !interval.is_zero() {
                tokio::time::sleep(interval).await;
            }

            let accepted = match self.set(oid, value.clone()).await {
                Ok(echoed) => echoed.oid == *oid && echoed.value == *value,
                Err(e) if matches!(*e, Error::Io { .. }) => return Err(e),
                Err(e) => {
                    // One bad target must not sink the rest of the batch.
                    tracing::warn!(
                        target: "snmpoll::client",
                        message = "set failed for target, continuing batch",
                        snmp.target = %self.target(),
                        snmp.oid = %oid,
                        error = %e,
                    );
                    false
                }
            };
            outcomes.insert(oid.clone(), accepted);
        }
        Ok(outcomes)
    }

    /// Read a batch of concrete values keyed by their OID.
    ///
    /// The read counterpart of [`set_all`](Self::set_all): same indexing
    /// convention, no echo-equality check. Fails with [`Error::Syntax`]
    /// when any target answers with an exception marker.
    #[instrument(skip(self, oids), err, fields(snmp.target = %self.target(), snmp.oid_count = oids.len()))]
    pub async fn get_all(&self, oids: &[Oid]) -> Result<BTreeMap<Oid, Value>> {
        let values = self.get_scalars(oids).await?;
        Ok(oids.iter().cloned().zip(values).collect())
    }
}
