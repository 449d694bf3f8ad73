//! Subtree enumeration.

use super::Client;
use crate::error::{Error, Result, WalkAbortReason};
use crate::oid::Oid;
use crate::value::Value;
use crate::varbind::VarBind;
use tokio::time::Instant;
use tracing::instrument;

impl Client {
    /// Enumerate every key/value under `root`.
    ///
    /// Issues GETNEXT requests starting at `root`, each continuing from the
    /// last key received, and accumulates the results in discovery order.
    /// The walk ends cleanly when the agent signals `endOfMibView` or
    /// returns a key outside the subtree; neither is an error. The full
    /// snapshot is returned only after termination - table reconstruction
    /// needs the complete sequence, so this is deliberately not a lazy
    /// stream.
    ///
    /// A request failure mid-walk fails the whole walk if nothing was
    /// accumulated yet. Once earlier pages have been delivered, the failure
    /// is logged and the partial snapshot is returned as final, the way
    /// incremental enumeration protocols treat a lost later page.
    ///
    /// Two agent misbehaviors abort with [`Error::WalkAborted`] instead:
    /// a key that does not strictly increase (would loop forever), and
    /// exceeding the configured `max_walk_results` cap.
    #[instrument(skip(self), err, fields(snmp.target = %self.target(), snmp.oid = %root))]
    pub async fn walk(&self, root: &Oid) -> Result<Vec<VarBind>> {
        let start = Instant::now();
        let mut snapshot: Vec<VarBind> = Vec::new();
        let mut requests: u32 = 0;
        let mut current = root.clone();

        loop {
            if let Some(max) = self.config().max_walk_results
                && snapshot.len() >= max
            {
                tracing::warn!(
                    target: "snmpoll::client",
                    message = "walk exceeded result cap",
                    snmp.target = %self.target(),
                    snmp.oid = %root,
                    snmp.result_cap = max,
                );
                return Err(Error::WalkAborted {
                    target: self.target(),
                    reason: WalkAbortReason::ResultCap,
                }
                .boxed());
            }

            requests += 1;
            let vb = match self.get_next(&current).await {
                Ok(vb) => vb,
                Err(e) if snapshot.is_empty() => return Err(e),
                Err(e) => {
                    // Earlier pages already arrived; the snapshot is what
                    // the device managed to deliver.
                    tracing::warn!(
                        target: "snmpoll::client",
                        message = "walk interrupted, returning partial snapshot",
                        snmp.target = %self.target(),
                        snmp.oid = %root,
                        snmp.objects = snapshot.len(),
                        error = %e,
                    );
                    break;
                }
            };

            if matches!(vb.value, Value::EndOfMibView) {
                break;
            }
            if !vb.oid.starts_with(root) {
                break;
            }
            if vb.oid <= current {
                tracing::warn!(
                    target: "snmpoll::client",
                    message = "agent returned non-increasing OID",
                    snmp.target = %self.target(),
                    snmp.previous = %current,
                    snmp.current = %vb.oid,
                );
                return Err(Error::WalkAborted {
                    target: self.target(),
                    reason: WalkAbortReason::NonIncreasing,
                }
                .boxed());
            }

            current = vb.oid.clone();
            snapshot.push(vb);
        }

        tracing::debug!(
            target: "snmpoll::client",
            message = "walk completed",
            snmp.target = %self.target(),
            snmp.oid = %root,
            snmp.objects = snapshot.len(),
            snmp.requests = requests,
            snmp.elapsed_ms = start.elapsed().as_millis() as u64,
        );
        Ok(snapshot)
    }
}
