use std::collections::BTreeMap;

use common::error::Error;

/// A node of the exchange graph: a currency name and its outbound edges.
///
/// Edge weights are `-ln(rate)`. The edge map is private; readers get a copy
/// through [`Currency::edges`] or a borrowing iterator through
/// [`Currency::iter_edges`], never a mutable handle.
#[derive(Debug, Clone)]
pub struct Currency {
    name: String,
    index: usize,
    edges: BTreeMap<String, f64>,
}

impl Currency {
    pub(crate) fn new(name: impl Into<String>, index: usize) -> Self {
        Self {
            name: name.into(),
            index,
            edges: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Position at which this currency first appeared in the graph.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Inserts or overwrites the weight of the edge `self -> neighbor`.
    ///
    /// The caller guarantees `weight` is finite.
    pub fn set_rate_to(&mut self, neighbor: impl Into<String>, weight: f64) {
        self.edges.insert(neighbor.into(), weight);
    }

    /// # Errors
    /// Returns `Error::NotFound` if there is no edge `self -> neighbor`.
    pub fn get_rate_to(&self, neighbor: &str) -> Result<f64, Error> {
        self.edges
            .get(neighbor)
            .copied()
            .ok_or_else(|| Error::NotFound(format!("Edge {} -> {}", self.name, neighbor)))
    }

    /// Returns a snapshot of the outbound edges.
    pub fn edges(&self) -> BTreeMap<String, f64> {
        self.edges.clone()
    }

    pub fn iter_edges(&self) -> impl Iterator<Item = (&str, f64)> {
        self.edges.iter().map(|(name, w)| (name.as_str(), *w))
    }

    pub fn degree(&self) -> usize {
        self.edges.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get() {
        let mut usd = Currency::new("USD", 0);
        usd.set_rate_to("EUR", 0.1);
        assert_eq!(usd.get_rate_to("EUR").unwrap(), 0.1);
        assert_eq!(usd.name(), "USD");
        assert_eq!(usd.index(), 0);
    }

    #[test]
    fn set_overwrites_existing_edge() {
        let mut usd = Currency::new("USD", 0);
        usd.set_rate_to("EUR", 0.1);
        usd.set_rate_to("EUR", 0.2);
        assert_eq!(usd.get_rate_to("EUR").unwrap(), 0.2);
        assert_eq!(usd.degree(), 1);
    }

    #[test]
    fn missing_edge_is_not_found() {
        let usd = Currency::new("USD", 0);
        assert!(matches!(usd.get_rate_to("JPY"), Err(Error::NotFound(_))));
    }

    #[test]
    fn edges_returns_a_detached_copy() {
        let mut usd = Currency::new("USD", 0);
        usd.set_rate_to("EUR", 0.1);

        let mut snapshot = usd.edges();
        snapshot.insert("GBP".to_string(), 0.5);
        snapshot.insert("EUR".to_string(), 9.9);

        assert_eq!(usd.degree(), 1);
        assert_eq!(usd.get_rate_to("EUR").unwrap(), 0.1);
        assert!(usd.get_rate_to("GBP").is_err());
    }
}
