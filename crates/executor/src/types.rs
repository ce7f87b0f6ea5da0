use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::sync::mpsc::Sender;

use super::error::Error;
use arb_graph_core::ExchangeGraph;
use common::types::RateRecord;

/// The graph shared by the writer and the searcher.
///
/// Writers hold the exclusive lock for a whole batch, so a reader never sees
/// a graph halfway through an update.
pub type SharedGraph = Arc<RwLock<ExchangeGraph>>;

/// A trait defining the contract for any source that streams rate records
/// into the pipeline.
///
/// The trait bounds (`Send`, `Sync`, `'static`) let the implementation run
/// as a task on the multi-threaded Tokio runtime.
#[async_trait::async_trait]
pub trait RateStreamer: Send + Sync + 'static {
    /// Sends every record in batches. Returns the number of records sent.
    async fn run_stream(self, sender: Sender<Vec<RateRecord>>) -> Result<usize, Error>;
}

/// Outcome of applying a stream of records to the graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriterStats {
    pub applied: usize,
    pub skipped: usize,
}
