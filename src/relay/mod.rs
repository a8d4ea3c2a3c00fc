//! Relay module: moving polled media into the destinations.
//!
//! Provides:
//! - The relay loop that drains a poller stream into the fan-out
//! - Session counters

pub mod stats;

use std::future::Future;

use crate::download::MediaStream;
use crate::error::Result;
use crate::export::Destinations;

pub use stats::RelayStats;

/// Export every item the poller yields until `shutdown` resolves or
/// something fails.
///
/// Items are exported one at a time; the poller does not fetch the next one
/// until the current one has reached every destination. The poller task is
/// stopped before this returns.
pub async fn run<F>(
    mut stream: MediaStream,
    destinations: &Destinations,
    stats: &mut RelayStats,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let kinds = destinations.kinds();

    let result = loop {
        let next = tokio::select! {
            biased;
            _ = &mut shutdown => break Ok(()),
            next = stream.next() => next,
        };

        let item = match next {
            Some(Ok(item)) => item,
            Some(Err(e)) => break Err(e),
            None => {
                tracing::warn!("Poller stopped");
                break Ok(());
            }
        };

        let exported = tokio::select! {
            biased;
            _ = &mut shutdown => {
                tracing::info!(media = item.name(), "Interrupted during export");
                break Ok(());
            }
            exported = destinations.dispatch(&item) => exported,
        };
        if let Err(e) = exported {
            break Err(e);
        }

        stats.record(&item, &kinds);
        stats.cursor = stream.cursor();
    };

    stats.cursor = stream.cursor();
    stream.shutdown().await;

    tracing::info!(
        items = stats.total(),
        bytes = stats.bytes,
        since = %stats.cursor,
        "Relay stopped"
    );
    result
}
