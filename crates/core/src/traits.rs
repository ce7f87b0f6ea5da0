use super::graph::ExchangeGraph;
use common::{error::Error, types::ArbitrageCycle};

/// Trait for detectors that certify the presence or absence of arbitrage.
pub trait CycleDetector {
    /// Finds profitable cycles in `graph`.
    ///
    /// Returns `Ok(cycles)` with every cycle found (empty when arbitrage is
    /// certified absent), or `Err(e)` when detection could not complete.
    fn find_arbitrage(&self, graph: &ExchangeGraph) -> Result<Vec<ArbitrageCycle>, Error>;

    /// Like [`CycleDetector::find_arbitrage`], keeping only cycles that pass
    /// through `currency`.
    ///
    /// The default filters the full result, which is only exact when
    /// `find_arbitrage` reports every profitable cycle.
    ///
    /// # Errors
    /// Returns `Error::NotFound` if `currency` is not in the graph.
    fn find_arbitrage_through(
        &self,
        graph: &ExchangeGraph,
        currency: &str,
    ) -> Result<Vec<ArbitrageCycle>, Error> {
        graph.get_currency(currency)?;
        Ok(self
            .find_arbitrage(graph)?
            .into_iter()
            .filter(|cycle| cycle.contains(currency))
            .collect())
    }
}
