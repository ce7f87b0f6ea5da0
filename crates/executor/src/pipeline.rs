use std::path::Path;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use super::config::Config;
use super::error::Error;
use super::producer::Producer;
use super::tsv_streamer::TsvStreamer;
use super::types::{SharedGraph, WriterStats};
use super::writer::Writer;
use common::types::RateRecord;

/// Streams the rate file at `path` into `graph` and waits for both tasks.
///
/// A writer failure is reported ahead of the producer's, since the producer
/// only fails to send once the writer has stopped.
pub async fn ingest(path: &Path, graph: SharedGraph, config: &Config) -> Result<WriterStats, Error> {
    let (sender, receiver) = mpsc::channel::<Vec<RateRecord>>(config.executor.buffer_size.max(1));

    let producer_handle = spawn_producer(path, sender, config);
    let writer_handle = spawn_writer(graph, receiver, config.producer.skip_invalid_rates);

    let (produced, written) = tokio::join!(producer_handle, writer_handle);
    let stats = written??;
    let sent = produced??;

    info!("Pipeline finished: {} records read, {} applied, {} skipped.", sent, stats.applied, stats.skipped);
    Ok(stats)
}

fn spawn_producer(
    path: &Path,
    sender: mpsc::Sender<Vec<RateRecord>>,
    config: &Config,
) -> JoinHandle<Result<usize, Error>> {
    info!("Starting TsvStreamer producer task for {}...", path.display());
    let streamer = TsvStreamer::new(path, config.producer.batch_size);
    Producer::new(streamer).spawn(sender)
}

fn spawn_writer(
    graph: SharedGraph,
    receiver: mpsc::Receiver<Vec<RateRecord>>,
    skip_invalid_rates: bool,
) -> JoinHandle<Result<WriterStats, Error>> {
    Writer::new(graph, receiver, skip_invalid_rates).spawn_task()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DetectorSettings, ExecutorConfig, GraphConfig, ProducerConfig};
    use crate::searcher::ArbSearcher;
    use arb_graph_core::{BellmanFordSolver, ExchangeGraph};
    use std::io::Write;
    use std::sync::Arc;
    use tempfile::NamedTempFile;
    use tokio::sync::RwLock;

    fn test_config(skip_invalid_rates: bool) -> Config {
        Config {
            graph: GraphConfig { significant_digits: 9 },
            detector: DetectorSettings {
                epsilon: 1e-9,
                max_passes: None,
            },
            producer: ProducerConfig {
                batch_size: 2,
                skip_invalid_rates,
            },
            executor: ExecutorConfig { buffer_size: 1 },
        }
    }

    fn rate_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes()).expect("Failed to write rates");
        file
    }

    fn empty_graph() -> SharedGraph {
        Arc::new(RwLock::new(ExchangeGraph::new()))
    }

    #[tokio::test]
    async fn ingest_builds_graph() {
        let file = rate_file("USD\tEUR\t0.9\nEUR\tGBP\t0.8\nGBP\tUSD\t1.5\nUSD\tAUD\t1.4\nAUD\tNZD\t1.1\n");
        let graph = empty_graph();

        let stats = ingest(file.path(), graph.clone(), &test_config(false)).await.unwrap();

        assert_eq!(stats, WriterStats { applied: 5, skipped: 0 });
        assert_eq!(graph.read().await.len(), 5);
    }

    #[tokio::test]
    async fn parse_error_leaves_graph_empty() {
        let file = rate_file("USD\tEUR\t0.9\nthis is not a rate line\n");
        let graph = empty_graph();

        let result = ingest(file.path(), graph.clone(), &test_config(false)).await;

        assert!(matches!(result, Err(Error::Parse { line: 2, .. })));
        assert!(graph.read().await.is_empty());
    }

    #[tokio::test]
    async fn invalid_rate_reports_writer_error() {
        let file = rate_file("USD\tEUR\t0.9\nEUR\tGBP\t0\nGBP\tUSD\t1.5\nUSD\tJPY\t150\nJPY\tCHF\t0.006\n");
        let graph = empty_graph();

        let result = ingest(file.path(), graph, &test_config(false)).await;
        assert!(matches!(result, Err(Error::GraphError(_))));
    }

    #[tokio::test]
    async fn invalid_rate_skipped_when_configured() {
        let file = rate_file("USD\tEUR\t0.9\nEUR\tGBP\t0\nGBP\tUSD\t1.5\n");
        let graph = empty_graph();

        let stats = ingest(file.path(), graph, &test_config(true)).await.unwrap();
        assert_eq!(stats, WriterStats { applied: 2, skipped: 1 });
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let result = ingest(Path::new("no_such_rates.tsv"), empty_graph(), &test_config(false)).await;
        assert!(matches!(result, Err(Error::IoError(_))));
    }

    #[tokio::test]
    async fn sample_rates_surface_overlapping_cycles() {
        let path = Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/../../testdata"));
        let graph = empty_graph();

        let stats = ingest(path, graph.clone(), &test_config(false)).await.unwrap();
        assert_eq!(stats, WriterStats { applied: 9, skipped: 0 });

        let searcher = ArbSearcher::new(graph, BellmanFordSolver::default());
        assert_eq!(searcher.search_for_arbs(None).await.unwrap().len(), 4);

        let through_aud = searcher.search_for_arbs(Some("AUD")).await.unwrap();
        assert_eq!(through_aud.len(), 1);
        assert_eq!(through_aud[0].currencies, vec!["USD", "AUD", "JPY", "USD"]);
    }
}
