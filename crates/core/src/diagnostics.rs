use std::collections::{BTreeSet, HashMap};

use super::graph::ExchangeGraph;

/// Returns the currencies that are the destination of exactly one directed
/// edge across the whole graph.
///
/// Only edge endpoints are counted; rate values play no part. A self-loop
/// counts as one reference to its own currency.
pub fn alone_currencies(graph: &ExchangeGraph) -> BTreeSet<String> {
    let mut occurrences: HashMap<&str, usize> = HashMap::new();

    for (neighbor, _) in graph.currencies().flat_map(|c| c.iter_edges()) {
        *occurrences.entry(neighbor).or_insert(0) += 1;
    }

    occurrences
        .into_iter()
        .filter(|&(_, count)| count == 1)
        .map(|(name, _)| name.to_string())
        .collect()
}
