use super::csr::GraphCSR;
use super::currency::Currency;
use super::graph::ExchangeGraph;
use super::traits::CycleDetector;
use common::{
    error::Error,
    types::{ArbitrageCycle, CycleKind},
};
use std::collections::{HashSet, VecDeque};
use tracing::{debug, info};

/// Default tolerance below which a weight difference is treated as zero.
pub const DEFAULT_EPSILON: f64 = 1e-9;

/// Tuning knobs for [`BellmanFordSolver`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorConfig {
    /// A relaxation only counts if it improves a distance by more than this.
    pub epsilon: f64,
    /// Total relaxation passes allowed across all rounds. `None` is unbounded.
    pub max_passes: Option<usize>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
            max_passes: None,
        }
    }
}

/// A cycle traced through the predecessor graph, in CSR node indices.
#[derive(Debug, Clone, PartialEq)]
struct TracedCycle {
    /// Nodes in forward order, rotated to start at the lowest index. Not closed.
    nodes: Vec<usize>,
    /// CSR index of the edge leaving `nodes[k]`, for every `k`.
    edges: Vec<usize>,
    log_weight_sum: f64,
}

/// Distances and predecessor edges left by one full set of relaxation passes.
struct RoundState {
    pred_edge_idx: Vec<Option<usize>>,
    /// Nodes still relaxed by the extra pass.
    relaxed: Vec<usize>,
}

/// Negative-cycle detector implementing Bellman-Ford over `-ln(rate)` weights.
///
/// Detection runs in rounds, each over a subset of the snapshot's edges. A
/// round relaxes every usable edge `|V| - 1` times and then once more; any edge
/// that still relaxes leads back to a negative cycle. Once a cycle
/// `e1, e2, .., ek` is traced, its round is split into `k` narrower rounds:
/// the `i`-th drops `ei` and commits to `e1 .. e(i-1)`. Every other negative
/// cycle of the parent survives in at least one of them, so overlapping cycles
/// are surfaced as well as disjoint ones. A round ends its branch once it
/// certifies that its edges hold no negative cycle.
#[derive(Debug, Clone, Default)]
pub struct BellmanFordSolver {
    config: DetectorConfig,
}

impl BellmanFordSolver {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Finds every negative cycle in `graph`, one per distinct set of nodes.
    ///
    /// # Errors
    /// - `Error::BudgetExceeded` if `max_passes` runs out before a result is certified.
    /// - `Error::CycleReconstructionFailed` if a predecessor chain is broken.
    pub fn find_negative_cycles(&self, graph: &GraphCSR) -> Result<Vec<ArbitrageCycle>, Error> {
        self.search(graph, None)
    }

    /// Finds every negative cycle in `graph` that passes through `node`.
    ///
    /// # Errors
    /// Same as [`BellmanFordSolver::find_negative_cycles`], plus
    /// `Error::InvalidGraph` if `node` is out of bounds.
    pub fn find_negative_cycles_through(
        &self,
        graph: &GraphCSR,
        node: usize,
    ) -> Result<Vec<ArbitrageCycle>, Error> {
        if node >= graph.num_nodes {
            return Err(Error::InvalidGraph);
        }
        self.search(graph, Some(node))
    }

    /// Reports every currency quoted against itself at a rate above 1.
    pub fn find_self_loops(&self, graph: &ExchangeGraph) -> Vec<ArbitrageCycle> {
        graph
            .currencies()
            .filter_map(|currency| self.self_loop_of(currency))
            .collect()
    }

    fn self_loop_of(&self, currency: &Currency) -> Option<ArbitrageCycle> {
        let weight = currency.get_rate_to(currency.name()).ok()?;
        (weight < -self.config.epsilon).then(|| ArbitrageCycle {
            currencies: vec![currency.name().to_string(), currency.name().to_string()],
            log_weight_sum: weight,
            kind: CycleKind::SelfLoop,
        })
    }

    /// Explores rounds breadth-first, starting from the full edge set.
    ///
    /// With an `anchor`, rounds whose usable edges no longer reach the anchor
    /// are dropped and only cycles through it are reported.
    fn search(&self, graph: &GraphCSR, anchor: Option<usize>) -> Result<Vec<ArbitrageCycle>, Error> {
        let incoming = graph.incoming_edges();
        let mut pending = VecDeque::from([vec![true; graph.num_edges()]]);
        let mut explored: HashSet<Vec<bool>> = HashSet::new();
        let mut seen: HashSet<Vec<usize>> = HashSet::new();
        let mut cycles = Vec::new();
        let mut passes = 0usize;
        let mut round = 0usize;

        while let Some(usable) = pending.pop_front() {
            let usable = Self::trim_acyclic(graph, &incoming, usable);
            if anchor.is_some_and(|a| !graph.outgoing(a).any(|i| usable[i])) {
                continue;
            }
            if !usable.contains(&true) || !explored.insert(usable.clone()) {
                continue;
            }

            round += 1;
            let Some(state) = self.relaxation_round(graph, &usable, &mut passes)? else {
                debug!(round, passes, "no negative cycle among usable edges");
                continue;
            };

            let mut split_on: Option<TracedCycle> = None;
            let mut found_in_round = 0;
            for &start in &state.relaxed {
                let traced = self.reconstruct_cycle(start, &state.pred_edge_idx, graph)?;
                if traced.log_weight_sum >= -self.config.epsilon {
                    continue;
                }

                let through_anchor = anchor.is_none_or(|a| traced.nodes.contains(&a));
                let mut node_set = traced.nodes.clone();
                node_set.sort_unstable();
                if through_anchor && seen.insert(node_set) {
                    cycles.push(Self::to_arbitrage_cycle(&traced, graph)?);
                    found_in_round += 1;
                }
                if split_on.is_none() {
                    split_on = Some(traced);
                }
            }

            // A round that relaxed in its extra pass must trace a negative cycle.
            let traced = split_on.ok_or(Error::CycleReconstructionFailed)?;
            pending.extend(Self::split_round(graph, &incoming, &usable, &traced.edges));
            debug!(round, found = found_in_round, pending = pending.len(), "round complete");
        }

        Ok(cycles)
    }

    /// Splits a round around one of its cycles.
    ///
    /// Branch `i` drops `edges[i]`. It also keeps `edges[j]` for every `j < i`
    /// as the only way out of its source and the only way into its target.
    fn split_round(
        graph: &GraphCSR,
        incoming: &[Vec<usize>],
        usable: &[bool],
        edges: &[usize],
    ) -> Vec<Vec<bool>> {
        let mut committed = usable.to_vec();
        let mut branches = Vec::with_capacity(edges.len());

        for &edge in edges {
            let mut branch = committed.clone();
            branch[edge] = false;
            branches.push(branch);

            let (u, v) = (graph.edge_source_by_index[edge], graph.edge_targets[edge]);
            for other in graph.outgoing(u).chain(incoming[v].iter().copied()) {
                if other != edge {
                    committed[other] = false;
                }
            }
        }

        branches
    }

    /// Masks out every edge touching a node that cannot lie on a cycle,
    /// repeatedly, until each remaining node has a usable edge in and out.
    fn trim_acyclic(graph: &GraphCSR, incoming: &[Vec<usize>], mut usable: Vec<bool>) -> Vec<bool> {
        let num_nodes = graph.num_nodes;
        let mut in_degree = vec![0usize; num_nodes];
        let mut out_degree = vec![0usize; num_nodes];
        for (i, _) in usable.iter().enumerate().filter(|(_, u)| **u) {
            out_degree[graph.edge_source_by_index[i]] += 1;
            in_degree[graph.edge_targets[i]] += 1;
        }

        let mut removed = vec![false; num_nodes];
        let mut stack: Vec<usize> = (0..num_nodes)
            .filter(|&v| in_degree[v] == 0 || out_degree[v] == 0)
            .collect();

        while let Some(node) = stack.pop() {
            if removed[node] {
                continue;
            }
            removed[node] = true;

            for i in graph.outgoing(node).chain(incoming[node].iter().copied()) {
                if !usable[i] {
                    continue;
                }
                usable[i] = false;

                let (u, v) = (graph.edge_source_by_index[i], graph.edge_targets[i]);
                out_degree[u] -= 1;
                in_degree[v] -= 1;
                for x in [u, v] {
                    if !removed[x] && (in_degree[x] == 0 || out_degree[x] == 0) {
                        stack.push(x);
                    }
                }
            }
        }

        usable
    }

    /// Runs `|V| - 1` relaxation passes plus one extra pass over the usable edges.
    ///
    /// Every distance starts at 0.0, which is what a virtual source with a
    /// zero-weight edge to every node would produce after its first hop. That
    /// source is counted in `|V|`, so the number of passes before the extra one
    /// equals the number of real nodes.
    ///
    /// Returns `None` when distances converge (no negative cycle) and the
    /// predecessor state otherwise.
    fn relaxation_round(
        &self,
        graph: &GraphCSR,
        usable: &[bool],
        passes: &mut usize,
    ) -> Result<Option<RoundState>, Error> {
        let num_nodes = graph.num_nodes;
        let mut distance = vec![0.0f64; num_nodes];
        let mut pred_edge_idx = vec![None; num_nodes];

        for pass in 0..num_nodes {
            self.charge_pass(passes)?;
            if !self.relax_all(graph, usable, &mut distance, &mut pred_edge_idx, None) {
                debug!(pass, "distances converged");
                return Ok(None);
            }
        }

        self.charge_pass(passes)?;
        let mut relaxed = Vec::new();
        self.relax_all(
            graph,
            usable,
            &mut distance,
            &mut pred_edge_idx,
            Some(&mut relaxed),
        );

        if relaxed.is_empty() {
            return Ok(None);
        }
        Ok(Some(RoundState {
            pred_edge_idx,
            relaxed,
        }))
    }

    /// One pass over every usable edge. Returns whether any distance changed.
    fn relax_all(
        &self,
        graph: &GraphCSR,
        usable: &[bool],
        distance: &mut [f64],
        pred_edge_idx: &mut [Option<usize>],
        mut relaxed: Option<&mut Vec<usize>>,
    ) -> bool {
        let mut changed = false;

        for u in 0..graph.num_nodes {
            // 'i' is the CSR index of the edge (u, v)
            for i in graph.outgoing(u).filter(|&i| usable[i]) {
                let v = graph.edge_targets[i];
                let candidate = distance[u] + graph.edge_weights[i];
                if candidate < distance[v] - self.config.epsilon {
                    distance[v] = candidate;
                    pred_edge_idx[v] = Some(i);
                    changed = true;

                    if let Some(relaxed) = relaxed.as_mut() {
                        relaxed.push(v);
                    }
                }
            }
        }

        changed
    }

    fn charge_pass(&self, passes: &mut usize) -> Result<(), Error> {
        if let Some(budget) = self.config.max_passes {
            if *passes >= budget {
                return Err(Error::BudgetExceeded(budget));
            }
        }
        *passes += 1;
        Ok(())
    }

    /// Reconstructs the negative cycle behind a node relaxed in the extra pass.
    ///
    /// `start` may sit downstream of the cycle rather than on it. Walking
    /// predecessors `num_nodes` times is guaranteed to land inside the cycle;
    /// from there the walk continues until it returns to that node.
    ///
    /// # Errors
    /// Returns `Error::InvalidGraph` if `start` is out of bounds, or
    /// `Error::CycleReconstructionFailed` if the cycle cannot be reconstructed.
    fn reconstruct_cycle(
        &self,
        start: usize,
        pred_edge_idx: &[Option<usize>],
        graph: &GraphCSR,
    ) -> Result<TracedCycle, Error> {
        let num_nodes = graph.num_nodes;
        if start >= num_nodes {
            return Err(Error::InvalidGraph);
        }

        let mut trace_node = start;
        for _ in 0..num_nodes {
            let edge_idx = pred_edge_idx[trace_node].ok_or(Error::CycleReconstructionFailed)?;
            trace_node = graph.get_edge_source_node(edge_idx)?;
        }

        let cycle_start_node = trace_node;
        let mut edges: Vec<usize> = Vec::new();
        let mut current_node = cycle_start_node;

        loop {
            if edges.len() > num_nodes {
                return Err(Error::CycleReconstructionFailed);
            }

            let edge_idx = pred_edge_idx[current_node].ok_or(Error::CycleReconstructionFailed)?;
            edges.push(edge_idx);
            current_node = graph.get_edge_source_node(edge_idx)?;

            if current_node == cycle_start_node {
                break;
            }
        }

        edges.reverse();

        let mut nodes = Vec::with_capacity(edges.len());
        let mut log_weight_sum = 0.0f64;
        for &edge_idx in &edges {
            nodes.push(graph.get_edge_source_node(edge_idx)?);
            log_weight_sum += graph.edge_weights[edge_idx];
        }

        if let Some(lowest) = nodes.iter().enumerate().min_by_key(|&(_, n)| *n).map(|(i, _)| i) {
            nodes.rotate_left(lowest);
            edges.rotate_left(lowest);
        }

        Ok(TracedCycle {
            nodes,
            edges,
            log_weight_sum,
        })
    }

    fn to_arbitrage_cycle(traced: &TracedCycle, graph: &GraphCSR) -> Result<ArbitrageCycle, Error> {
        let mut currencies = traced
            .nodes
            .iter()
            .map(|&n| graph.node_name(n).map(String::from))
            .collect::<Result<Vec<_>, _>>()?;
        if let Some(first) = currencies.first().cloned() {
            currencies.push(first);
        }

        Ok(ArbitrageCycle {
            currencies,
            log_weight_sum: traced.log_weight_sum,
            kind: CycleKind::MultiHop,
        })
    }
}

impl CycleDetector for BellmanFordSolver {
    /// Certifies the presence or absence of arbitrage across the whole graph.
    ///
    /// # Returns
    /// - `Ok(cycles)` → Multi-hop cycles first, then self-loops. Empty means no arbitrage.
    /// - `Err(e)` → Detection did not complete; never to be read as "no arbitrage".
    fn find_arbitrage(&self, graph: &ExchangeGraph) -> Result<Vec<ArbitrageCycle>, Error> {
        let snapshot = GraphCSR::from_graph(graph);
        let mut cycles = self.find_negative_cycles(&snapshot)?;
        cycles.extend(self.find_self_loops(graph));

        info!(
            currencies = snapshot.num_nodes,
            edges = snapshot.num_edges(),
            cycles = cycles.len(),
            "arbitrage detection complete"
        );
        Ok(cycles)
    }

    /// Searches only the rounds that can still close a cycle through `currency`.
    fn find_arbitrage_through(
        &self,
        graph: &ExchangeGraph,
        currency: &str,
    ) -> Result<Vec<ArbitrageCycle>, Error> {
        let anchor = graph.get_currency(currency)?;
        let snapshot = GraphCSR::from_graph(graph);
        let mut cycles = self.find_negative_cycles_through(&snapshot, anchor.index())?;
        cycles.extend(self.self_loop_of(anchor));

        info!(
            currency,
            cycles = cycles.len(),
            "arbitrage detection through currency complete"
        );
        Ok(cycles)
    }
}
