use std::collections::BTreeSet;
use tracing::info;

use super::{error::Error, types::SharedGraph};
use arb_graph_core::traits::CycleDetector;
use common::types::ArbitrageCycle;

pub struct ArbSearcher<S> {
    solver: S,
    graph: SharedGraph,
}

impl<S> ArbSearcher<S>
where
    S: CycleDetector,
{
    pub fn new(graph: SharedGraph, solver: S) -> Self {
        ArbSearcher { graph, solver }
    }

    /// Runs one detection pass over the current graph.
    ///
    /// The read lock is held for the whole pass, so no batch can land halfway
    /// through. With `through`, only cycles visiting that currency are kept.
    pub async fn search_for_arbs(&self, through: Option<&str>) -> Result<Vec<ArbitrageCycle>, Error> {
        let graph_guard = self.graph.read().await;

        if graph_guard.len() < 2 {
            info!("Searcher: Graph too small for multi-hop cycles, checking self-loops only.");
        } else {
            info!("Searcher: Starting cycle search over {} currencies...", graph_guard.len());
        }

        let cycles = match through {
            Some(currency) => self.solver.find_arbitrage_through(&graph_guard, currency)?,
            None => self.solver.find_arbitrage(&graph_guard)?,
        };

        if cycles.is_empty() {
            info!("Search complete: No arbitrage opportunities.");
        } else {
            info!("Search complete: {} cycle(s) FOUND.", cycles.len());
        }
        Ok(cycles)
    }

    pub async fn alone_currencies(&self) -> BTreeSet<String> {
        self.graph.read().await.alone_currencies()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arb_graph_core::{BellmanFordSolver, DetectorConfig, ExchangeGraph};
    use common::{error::Error as ArbGraphError, types::RateRecord};
    use rust_decimal::Decimal;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    fn shared(records: &[(&str, &str, i64)]) -> SharedGraph {
        let mut graph = ExchangeGraph::new();
        graph
            .update_rates(
                records
                    .iter()
                    .map(|(o, d, r)| RateRecord::new(*o, *d, Decimal::new(*r, 1))),
            )
            .expect("Valid records");
        Arc::new(RwLock::new(graph))
    }

    #[tokio::test]
    async fn finds_triangular_arbitrage() {
        let graph = shared(&[("USD", "EUR", 9), ("EUR", "GBP", 8), ("GBP", "USD", 15)]);
        let searcher = ArbSearcher::new(graph, BellmanFordSolver::default());

        let cycles = searcher.search_for_arbs(None).await.unwrap();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].currencies, vec!["USD", "EUR", "GBP", "USD"]);

        let through_usd = searcher.search_for_arbs(Some("USD")).await.unwrap();
        assert_eq!(through_usd, cycles);
    }

    #[tokio::test]
    async fn unknown_through_currency_is_not_found() {
        let graph = shared(&[("USD", "EUR", 9)]);
        let searcher = ArbSearcher::new(graph, BellmanFordSolver::default());

        let result = searcher.search_for_arbs(Some("JPY")).await;
        assert!(matches!(result, Err(Error::GraphError(ArbGraphError::NotFound(_)))));
    }

    #[tokio::test]
    async fn budget_exhaustion_surfaces_as_error() {
        let graph = shared(&[("USD", "EUR", 9), ("EUR", "GBP", 8), ("GBP", "USD", 15)]);
        let solver = BellmanFordSolver::new(DetectorConfig {
            max_passes: Some(1),
            ..DetectorConfig::default()
        });
        let searcher = ArbSearcher::new(graph, solver);

        let result = searcher.search_for_arbs(None).await;
        assert!(matches!(
            result,
            Err(Error::GraphError(ArbGraphError::BudgetExceeded(1)))
        ));
    }

    #[tokio::test]
    async fn lists_alone_currencies() {
        let graph = shared(&[("USD", "EUR", 9), ("USD", "GBP", 8), ("USD", "JPY", 15)]);
        let searcher = ArbSearcher::new(graph, BellmanFordSolver::default());

        let alone: Vec<String> = searcher.alone_currencies().await.into_iter().collect();
        assert_eq!(alone, vec!["EUR", "GBP", "JPY"]);
    }
}
