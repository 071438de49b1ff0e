use crate::classifier::Suspect;
use async_trait::async_trait;
use deadqueue::unlimited::Queue;
use futures::future::join_all;
use std::sync::Arc;
use tracing::info;

mod error;
mod ping;
mod worker;

pub use error::Error;
pub(crate) use error::Result;
pub use ping::Ping;

pub type SharedProbe = Arc<dyn Probe>;
type SharedQueue = Arc<Queue<Suspect>>;

/// A way of checking whether a host is still alive
#[async_trait]
pub trait Probe: Send + Sync {
    /// Check the host, returning whether it responded
    ///
    /// An error means the check itself could not be performed, which says
    /// nothing about the host.
    async fn probe(&self, host: &str) -> Result<bool>;
}

/// The result of probing a single host
#[derive(Debug)]
pub enum Outcome {
    Alive,
    Dead,
    Failed(Error),
}

#[derive(Debug)]
pub struct ProbeResult {
    pub suspect: Suspect,
    pub outcome: Outcome,
}

/// The suspects partitioned by their probe outcome
///
/// The order within each list depends on worker scheduling and is not stable
/// between runs.
#[derive(Debug, Default)]
pub struct Report {
    pub alive: Vec<Suspect>,
    pub dead: Vec<Suspect>,
    pub failed: Vec<(Suspect, Error)>,
}

impl Report {
    fn record(&mut self, result: ProbeResult) {
        match result.outcome {
            Outcome::Alive => self.alive.push(result.suspect),
            Outcome::Dead => self.dead.push(result.suspect),
            Outcome::Failed(e) => self.failed.push((result.suspect, e)),
        }
    }
}

/// Probe every suspect exactly once using a fixed pool of workers
///
/// Returns once every worker has drained the queue and exited. Hosts are
/// addressed as `<owner>.<origin>`.
pub async fn probe_all(
    probe: SharedProbe,
    origin: &str,
    suspects: Vec<Suspect>,
    workers: usize,
) -> Result<Report> {
    let queue: SharedQueue = Arc::new(Queue::new());
    for suspect in suspects {
        queue.push(suspect);
    }

    info!(count = workers, pending = queue.len(), "spawning probe workers");

    let origin: Arc<str> = Arc::from(origin);
    let handles = (0..workers.max(1))
        .map(|id| {
            tokio::spawn(worker::worker(
                id,
                queue.clone(),
                probe.clone(),
                origin.clone(),
            ))
        })
        .collect::<Vec<_>>();

    let mut report = Report::default();
    for handle in join_all(handles).await {
        for result in handle? {
            report.record(result);
        }
    }

    info!(
        alive = report.alive.len(),
        dead = report.dead.len(),
        failed = report.failed.len(),
        "probing complete"
    );

    Ok(report)
}
