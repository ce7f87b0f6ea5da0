use std::collections::{BTreeSet, HashMap};

use common::{
    error::Error,
    numeric_kernel::{Precision, log_weight, rate_from_weight},
    types::RateRecord,
};
use tracing::debug;

use super::currency::Currency;
use super::diagnostics;

/// Weighted digraph of currencies built from pairwise exchange rates.
///
/// Every record `(A, B, r)` writes `A -> B = -ln(r)` and `B -> A = ln(r)`, so
/// each pair is always stored as an exactly antisymmetric couple of weights.
/// Re-sending a pair overwrites both directions with the latest rate.
#[derive(Debug, Clone, Default)]
pub struct ExchangeGraph {
    nodes: Vec<Currency>,
    by_name: HashMap<String, usize>,
    precision: Precision,
}

impl ExchangeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_precision(precision: Precision) -> Self {
        Self {
            precision,
            ..Self::default()
        }
    }

    /// Builds a graph from an initial batch of records.
    ///
    /// # Errors
    /// Returns `Error::InvalidRate` on the first non-positive rate.
    pub fn from_records<I>(records: I, precision: Precision) -> Result<Self, Error>
    where
        I: IntoIterator<Item = RateRecord>,
    {
        let mut graph = Self::with_precision(precision);
        graph.update_rates(records)?;
        Ok(graph)
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// # Errors
    /// Returns `Error::NotFound` if `name` has never appeared in a record.
    pub fn get_currency(&self, name: &str) -> Result<&Currency, Error> {
        self.by_name
            .get(name)
            .map(|&i| &self.nodes[i])
            .ok_or_else(|| Error::NotFound(format!("Currency {}", name)))
    }

    /// Currencies in the order they first appeared.
    pub fn currencies(&self) -> impl Iterator<Item = &Currency> {
        self.nodes.iter()
    }

    pub fn currency_names(&self) -> Vec<&str> {
        self.nodes.iter().map(Currency::name).collect()
    }

    /// Raw conversion rate `origin -> destination`, recovered from the stored weight.
    ///
    /// # Errors
    /// Returns `Error::NotFound` if either currency or the edge is missing.
    pub fn conversion_rate(&self, origin: &str, destination: &str) -> Result<f64, Error> {
        let weight = self.get_currency(origin)?.get_rate_to(destination)?;
        Ok(rate_from_weight(weight))
    }

    /// Applies records in order. Records before a failing one stay committed.
    ///
    /// # Returns
    /// The number of records applied.
    ///
    /// # Errors
    /// Returns `Error::InvalidRate` for the first record with a non-positive rate.
    pub fn update_rates<I>(&mut self, records: I) -> Result<usize, Error>
    where
        I: IntoIterator<Item = RateRecord>,
    {
        let mut applied = 0;
        for record in records {
            self.update_rate(&record)?;
            applied += 1;
        }
        Ok(applied)
    }

    /// Applies a single record, creating its currencies on first sight.
    ///
    /// The rate is validated before anything is written, so a rejected record
    /// leaves the graph untouched.
    ///
    /// # Errors
    /// Returns `Error::InvalidRate` if the rate is not strictly positive.
    pub fn update_rate(&mut self, record: &RateRecord) -> Result<(), Error> {
        let weight =
            log_weight(record.rate, self.precision).ok_or_else(|| Error::InvalidRate {
                origin: record.origin.clone(),
                destination: record.destination.clone(),
                rate: record.rate.to_string(),
            })?;

        let origin = self.get_or_insert(&record.origin);
        let destination = self.get_or_insert(&record.destination);

        if origin == destination {
            // The reciprocal of a self-loop is the same edge.
            debug!(currency = %record.origin, rate = %record.rate, "self-loop quote");
            self.nodes[origin].set_rate_to(record.destination.as_str(), weight);
            return Ok(());
        }

        self.nodes[origin].set_rate_to(record.destination.as_str(), weight);
        self.nodes[destination].set_rate_to(record.origin.as_str(), -weight);
        Ok(())
    }

    /// Currencies referenced by exactly one directed edge across the graph.
    pub fn alone_currencies(&self) -> BTreeSet<String> {
        diagnostics::alone_currencies(self)
    }

    pub(crate) fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    fn get_or_insert(&mut self, name: &str) -> usize {
        if let Some(&i) = self.by_name.get(name) {
            return i;
        }
        let i = self.nodes.len();
        self.nodes.push(Currency::new(name, i));
        self.by_name.insert(name.to_string(), i);
        i
    }
}
