use tokio::sync::mpsc::Receiver;
use tracing::{debug, info, warn};

use super::error::Error;
use super::types::{SharedGraph, WriterStats};
use common::{error::Error as ArbGraphError, types::RateRecord};

/// Async consumer that applies rate batches to the shared graph.
pub struct Writer {
    graph: SharedGraph,
    receiver: Receiver<Vec<RateRecord>>,
    skip_invalid_rates: bool,
}

impl Writer {
    pub fn new(
        graph: SharedGraph,
        receiver: Receiver<Vec<RateRecord>>,
        skip_invalid_rates: bool,
    ) -> Self {
        Self {
            graph,
            receiver,
            skip_invalid_rates,
        }
    }

    /// Run the writer asynchronously.
    ///
    /// Each batch is applied under the write lock, which is released before
    /// the next batch is awaited. Records are committed one at a time: an
    /// invalid rate is either skipped with a warning or ends the run, and in
    /// both cases earlier records stay in the graph.
    /// Exits when the receiver is closed.
    pub async fn process_updates(mut self) -> Result<WriterStats, Error> {
        info!("Writer ready.");
        let mut stats = WriterStats::default();

        while let Some(batch) = self.receiver.recv().await {
            let mut graph_guard = self.graph.write().await;
            for record in &batch {
                match graph_guard.update_rate(record) {
                    Ok(()) => stats.applied += 1,
                    Err(e @ ArbGraphError::InvalidRate { .. }) if self.skip_invalid_rates => {
                        warn!("Skipping record: {}", e);
                        stats.skipped += 1;
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            debug!("{} records added to graph", batch.len());
        }

        info!(
            "Receiver closed, shutting down writer ({} applied, {} skipped).",
            stats.applied, stats.skipped
        );
        Ok(stats)
    }

    /// Spawns the Writer task onto the Tokio runtime.
    pub fn spawn_task(self) -> tokio::task::JoinHandle<Result<WriterStats, Error>> {
        tokio::spawn(self.process_updates())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arb_graph_core::ExchangeGraph;
    use rust_decimal::Decimal;
    use std::sync::Arc;
    use tokio::sync::{RwLock, mpsc};

    fn record(origin: &str, destination: &str, rate: i64) -> RateRecord {
        RateRecord::new(origin, destination, Decimal::new(rate, 1))
    }

    async fn run_writer(batches: Vec<Vec<RateRecord>>, skip: bool) -> (SharedGraph, Result<WriterStats, Error>) {
        let graph: SharedGraph = Arc::new(RwLock::new(ExchangeGraph::new()));
        let (tx, rx) = mpsc::channel(batches.len().max(1));
        for batch in batches {
            tx.send(batch).await.expect("Send failed");
        }
        drop(tx);

        let result = Writer::new(graph.clone(), rx, skip).process_updates().await;
        (graph, result)
    }

    #[tokio::test]
    async fn applies_all_batches() {
        let (graph, result) = run_writer(
            vec![vec![record("USD", "EUR", 9)], vec![record("EUR", "GBP", 8)]],
            false,
        )
        .await;

        assert_eq!(result.unwrap(), WriterStats { applied: 2, skipped: 0 });
        assert_eq!(graph.read().await.len(), 3);
    }

    #[tokio::test]
    async fn invalid_rate_aborts_by_default() {
        let (graph, result) = run_writer(
            vec![vec![record("USD", "EUR", 9), record("EUR", "GBP", 0), record("GBP", "JPY", 9)]],
            false,
        )
        .await;

        assert!(matches!(
            result,
            Err(Error::GraphError(ArbGraphError::InvalidRate { .. }))
        ));
        let graph = graph.read().await;
        assert!(graph.contains("EUR"));
        assert!(!graph.contains("GBP"));
    }

    #[tokio::test]
    async fn invalid_rate_skipped_when_configured() {
        let (graph, result) = run_writer(
            vec![vec![record("USD", "EUR", 9), record("EUR", "GBP", -5), record("GBP", "JPY", 9)]],
            true,
        )
        .await;

        assert_eq!(result.unwrap(), WriterStats { applied: 2, skipped: 1 });
        assert_eq!(graph.read().await.currency_names(), vec!["USD", "EUR", "GBP", "JPY"]);
    }
}
