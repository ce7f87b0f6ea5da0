use std::ops::Range;

use common::error::Error;
use common::types::Edge;

use super::graph::ExchangeGraph;

/// Read-only snapshot of an [`ExchangeGraph`] in Compressed Sparse Row (CSR) format.
///
/// CSR format stores outgoing edges of each node contiguously in memory:
/// - `node_pointers[u]..node_pointers[u+1]` → edges from node `u`
/// - `edge_targets[i]` -> target node of edge `i`
/// - `edge_weights[i]` -> weight `-ln(rate)` of edge `i`
/// - `edge_source_by_index[i]` -> source node of edge `i`
///
/// Node `u` is the currency with insertion index `u`. Self-loops are left out;
/// the detector reads them straight from the graph.
#[derive(Debug, Clone)]
pub struct GraphCSR {
    pub num_nodes: usize,
    pub node_pointers: Vec<usize>,
    pub edge_targets: Vec<usize>,
    pub edge_weights: Vec<f64>,
    pub edge_source_by_index: Vec<usize>,
    pub node_names: Vec<String>,
}

impl GraphCSR {
    /// Creates a CSR snapshot from indexed edges `(src, dst, weight)`.
    ///
    /// Weights are taken as already transformed. Edges are stored sorted by
    /// source node so each node owns a contiguous block. Nodes are named by
    /// their index.
    pub fn from_edges(num_nodes: usize, edges: &mut [Edge]) -> Self {
        edges.sort_by_key(|(src, _, _)| *src);

        let (node_pointers, edge_targets, edge_weights, edge_source_by_index) =
            Self::build_csr_from_edges(num_nodes, edges);

        Self {
            num_nodes,
            node_pointers,
            edge_targets,
            edge_weights,
            edge_source_by_index,
            node_names: (0..num_nodes).map(|i| i.to_string()).collect(),
        }
    }

    /// Freezes the current state of `graph` into a CSR snapshot.
    pub fn from_graph(graph: &ExchangeGraph) -> Self {
        let num_nodes = graph.len();
        let mut edges: Vec<Edge> = Vec::new();

        for currency in graph.currencies() {
            let u = currency.index();
            for (neighbor, weight) in currency.iter_edges() {
                match graph.index_of(neighbor) {
                    Some(v) if v != u => edges.push((u, v, weight)),
                    _ => {}
                }
            }
        }

        let mut csr = Self::from_edges(num_nodes, &mut edges);
        csr.node_names = graph.currency_names().into_iter().map(String::from).collect();
        csr
    }

    /// Two-pass counting build of the CSR arrays.
    ///
    /// # Returns
    /// 1. `node_pointers`: start of each node's outgoing edges (size |V| + 1).
    /// 2. `edge_targets`: destination node `v` for each edge.
    /// 3. `edge_weights`: weight of each edge.
    /// 4. `edge_source_by_index`: source node `u` of each edge, for O(1)
    ///    reverse lookups while tracing predecessor chains.
    fn build_csr_from_edges(
        num_nodes: usize,
        edges: &[Edge],
    ) -> (Vec<usize>, Vec<usize>, Vec<f64>, Vec<usize>) {
        let m = edges.len();
        let mut node_pointers = vec![0; num_nodes + 1];

        for &(u, _, _) in edges {
            node_pointers[u + 1] += 1;
        }

        for i in 1..=num_nodes {
            node_pointers[i] += node_pointers[i - 1];
        }

        let mut edge_targets = vec![0; m];
        let mut edge_weights = vec![0.0; m];
        let mut edge_source_by_index = vec![0; m];

        let mut cursor = node_pointers.clone();

        for &(u, v, weight) in edges {
            let pos = cursor[u];
            edge_weights[pos] = weight;
            edge_targets[pos] = v;
            edge_source_by_index[pos] = u;
            cursor[u] += 1;
        }

        (
            node_pointers,
            edge_targets,
            edge_weights,
            edge_source_by_index,
        )
    }

    pub fn num_edges(&self) -> usize {
        self.edge_targets.len()
    }

    /// CSR index range of the edges leaving `u`.
    pub fn outgoing(&self, u: usize) -> Range<usize> {
        self.node_pointers[u]..self.node_pointers[u + 1]
    }

    /// CSR indices of the edges entering each node, grouped by target.
    pub fn incoming_edges(&self) -> Vec<Vec<usize>> {
        let mut incoming = vec![Vec::new(); self.num_nodes];
        for (i, &v) in self.edge_targets.iter().enumerate() {
            incoming[v].push(i);
        }
        incoming
    }

    /// O(1) lookup for the source node of a given edge index.
    ///
    /// # Errors
    /// Returns `Error::InvalidGraph` if `edge_idx` is out of bounds.
    pub fn get_edge_source_node(&self, edge_idx: usize) -> Result<usize, Error> {
        self.edge_source_by_index
            .get(edge_idx)
            .copied()
            .ok_or(Error::InvalidGraph)
    }

    /// # Errors
    /// Returns `Error::InvalidGraph` if `node` is out of bounds.
    pub fn node_name(&self, node: usize) -> Result<&str, Error> {
        self.node_names
            .get(node)
            .map(String::as_str)
            .ok_or(Error::InvalidGraph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::types::RateRecord;
    use rust_decimal::Decimal;

    #[test]
    fn from_edges_creates_correct_csr_for_small_graph() {
        let mut edges = vec![(2, 1, 0.5), (0, 2, -0.1), (0, 1, 0.2)];
        let csr = GraphCSR::from_edges(3, &mut edges);

        assert_eq!(csr.node_pointers, vec![0, 2, 2, 3]);
        assert_eq!(csr.edge_targets, vec![2, 1, 1]);
        assert_eq!(csr.edge_weights, vec![-0.1, 0.2, 0.5]);
        assert_eq!(csr.edge_source_by_index, vec![0, 0, 2]);
        assert_eq!(csr.num_nodes, 3);
    }

    #[test]
    fn node_with_no_outgoing_edges() {
        let mut edges = vec![(0, 2, 0.0)];
        let csr = GraphCSR::from_edges(3, &mut edges);

        assert_eq!(csr.node_pointers, vec![0, 1, 1, 1]);
        assert_eq!(csr.outgoing(1), 1..1);
        assert_eq!(csr.outgoing(0), 0..1);
    }

    #[test]
    fn incoming_edges_grouped_by_target() {
        let mut edges = vec![(2, 1, 0.5), (0, 2, -0.1), (0, 1, 0.2)];
        let csr = GraphCSR::from_edges(3, &mut edges);

        assert_eq!(csr.incoming_edges(), vec![vec![], vec![1, 2], vec![0]]);
    }

    #[test]
    fn empty_graph() {
        let csr = GraphCSR::from_edges(0, &mut []);

        assert_eq!(csr.num_nodes, 0);
        assert_eq!(csr.node_pointers, vec![0]);
        assert_eq!(csr.num_edges(), 0);
    }

    #[test]
    fn source_lookup_out_of_bounds() {
        let csr = GraphCSR::from_edges(2, &mut [(0, 1, 0.0)]);
        assert_eq!(csr.get_edge_source_node(0).unwrap(), 0);
        assert!(matches!(csr.get_edge_source_node(5), Err(Error::InvalidGraph)));
        assert!(matches!(csr.node_name(2), Err(Error::InvalidGraph)));
    }

    #[test]
    fn from_graph_mirrors_exchange_graph() {
        let mut graph = ExchangeGraph::new();
        graph
            .update_rates(vec![
                RateRecord::new("USD", "EUR", Decimal::new(9, 1)),
                RateRecord::new("EUR", "GBP", Decimal::new(8, 1)),
                RateRecord::new("XAU", "XAU", Decimal::new(15, 1)),
            ])
            .unwrap();

        let csr = GraphCSR::from_graph(&graph);

        assert_eq!(csr.num_nodes, 4);
        assert_eq!(csr.node_names, vec!["USD", "EUR", "GBP", "XAU"]);
        // Two reciprocal pairs, the self-loop is left out.
        assert_eq!(csr.num_edges(), 4);
        assert_eq!(csr.outgoing(3), 4..4);

        for i in 0..csr.num_edges() {
            let u = csr.get_edge_source_node(i).unwrap();
            let v = csr.edge_targets[i];
            let expected = graph
                .get_currency(csr.node_name(u).unwrap())
                .unwrap()
                .get_rate_to(csr.node_name(v).unwrap())
                .unwrap();
            assert_eq!(csr.edge_weights[i], expected);
        }
    }
}
