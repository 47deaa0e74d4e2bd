//! Statistics reporter
//!
//! The reporter waits on a [`ReportTrigger`] and prints a counters snapshot
//! each time it fires. In the server the trigger is SIGHUP; an mpsc receiver
//! can stand in as an administrative channel where signals are unavailable.

use std::future::Future;
use std::io::Write;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::stats::SharedStats;

/// Source of "print the statistics now" notifications.
pub trait ReportTrigger {
    /// Waits for the next notification. Returns `false` once the source is
    /// closed and no further notifications can arrive.
    fn triggered(&mut self) -> impl Future<Output = bool> + Send;
}

#[cfg(unix)]
impl ReportTrigger for tokio::signal::unix::Signal {
    fn triggered(&mut self) -> impl Future<Output = bool> + Send {
        async move { self.recv().await.is_some() }
    }
}

impl ReportTrigger for mpsc::UnboundedReceiver<()> {
    fn triggered(&mut self) -> impl Future<Output = bool> + Send {
        async move { self.recv().await.is_some() }
    }
}

/// Prints counter snapshots to `out` on demand.
#[derive(Debug)]
pub struct Reporter<W> {
    stats: Arc<SharedStats>,
    out: W,
}

impl<W: Write> Reporter<W> {
    pub fn new(stats: Arc<SharedStats>, out: W) -> Self {
        Self { stats, out }
    }

    /// Writes one snapshot. Write failures are logged and otherwise ignored.
    pub fn report(&mut self) {
        if let Err(e) = self.stats.write_snapshot(&mut self.out) {
            warn!(error = %e, "failed to write statistics");
        }
    }

    /// Prints a snapshot every time `trigger` fires, until it closes.
    ///
    /// Returns the output sink once the trigger source is exhausted.
    pub async fn run<T: ReportTrigger>(mut self, mut trigger: T) -> W {
        while trigger.triggered().await {
            debug!("statistics requested");
            self.report();
        }
        debug!("statistics trigger closed");
        self.out
    }
}
