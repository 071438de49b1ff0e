use super::{Outcome, ProbeResult, SharedProbe, SharedQueue};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Probe suspects from the queue until it is drained
#[instrument(skip(queue, probe, origin))]
pub async fn worker(
    id: usize,
    queue: SharedQueue,
    probe: SharedProbe,
    origin: Arc<str>,
) -> Vec<ProbeResult> {
    debug!("started worker {}", id);

    let mut results = Vec::new();
    while let Some(suspect) = queue.try_pop() {
        let host = suspect.records.fqdn(&origin);
        debug!(%host, reason = ?suspect.reason, "probing host");

        let outcome = match probe.probe(&host).await {
            Ok(true) => {
                debug!(%host, "host appears up");
                Outcome::Alive
            }
            Ok(false) => {
                debug!(%host, "host appears down, marking for removal");
                Outcome::Dead
            }
            Err(e) => {
                warn!(%host, error = %e, "unable to probe host");
                Outcome::Failed(e)
            }
        };

        results.push(ProbeResult { suspect, outcome });
    }

    debug!(probed = results.len(), "worker finished");
    results
}
