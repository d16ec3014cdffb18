use crate::data::{Capacity, Rank, SolveError};
use log::trace;

/// Sentinel for "no parent edge" during path search.
pub const UNSET: usize = usize::MAX;

/// Residual flow network for one solve call.
///
/// Node layout: source `0`, candidate `i` at `1 + i`, time slot `j` at
/// `1 + m + j`, sink last. Every original edge is stored as a
/// forward/backward residual pair; the twin of edge `e` is `e ^ 1`, so
/// forward edges always carry even ids. The network is built fresh per
/// solve and owned exclusively by it.
#[derive(Debug)]
pub struct FlowNetwork {
    pub num_candidates: usize,
    pub num_time_slots: usize,
    total_capacity: u64,
    /// Target node per residual edge.
    pub(crate) to: Vec<usize>,
    /// Remaining capacity per residual edge.
    pub(crate) residual: Vec<i64>,
    /// Cost per unit flow, negated on backward edges.
    pub(crate) cost: Vec<i64>,
    /// Outgoing residual edge ids per node, in insertion order.
    pub(crate) adjacency: Vec<Vec<usize>>,
}

impl FlowNetwork {
    pub const SOURCE: usize = 0;

    pub fn candidate_node(&self, candidate: usize) -> usize {
        1 + candidate
    }

    pub fn slot_node(&self, slot: usize) -> usize {
        1 + self.num_candidates + slot
    }

    pub fn sink(&self) -> usize {
        1 + self.num_candidates + self.num_time_slots
    }

    pub fn num_nodes(&self) -> usize {
        self.num_candidates + self.num_time_slots + 2
    }

    /// Builds the transportation network for `m` candidates and `n` slots:
    /// unit edges source->candidate, a unit edge candidate->slot per ranking
    /// cell, and a capacity edge slot->sink. Slot edges are inserted in
    /// ascending slot order; the search relies on that order for its
    /// tie-breaking.
    pub fn build(
        m: usize,
        n: usize,
        rankings: &[Vec<Rank>],
        capacities: &[Capacity],
    ) -> Result<FlowNetwork, SolveError> {
        if rankings.len() != m {
            return Err(SolveError::ShapeMismatch(format!(
                "ranking matrix has {} rows, expected one per candidate ({})",
                rankings.len(),
                m
            )));
        }
        for (i, row) in rankings.iter().enumerate() {
            if row.len() != n {
                return Err(SolveError::ShapeMismatch(format!(
                    "ranking row {} has {} entries, expected one per time slot ({})",
                    i,
                    row.len(),
                    n
                )));
            }
        }
        if capacities.len() != n {
            return Err(SolveError::ShapeMismatch(format!(
                "capacity vector has {} entries, expected one per time slot ({})",
                capacities.len(),
                n
            )));
        }

        let mut network = FlowNetwork {
            num_candidates: m,
            num_time_slots: n,
            total_capacity: capacities.iter().map(|&c| u64::from(c)).sum(),
            to: Vec::new(),
            residual: Vec::new(),
            cost: Vec::new(),
            adjacency: vec![Vec::new(); m + n + 2],
        };

        for i in 0..m {
            let candidate = network.candidate_node(i);
            network.link(Self::SOURCE, candidate, 1, 0);
        }
        for i in 0..m {
            let candidate = network.candidate_node(i);
            for j in 0..n {
                let slot = network.slot_node(j);
                network.link(candidate, slot, 1, i64::from(rankings[i][j]));
            }
        }
        let sink = network.sink();
        for j in 0..n {
            let slot = network.slot_node(j);
            network.link(slot, sink, i64::from(capacities[j]), 0);
        }

        trace!(
            "Flow network built with {} nodes and {} residual edges.",
            network.num_nodes(),
            network.to.len()
        );
        Ok(network)
    }

    /// Confirms a feasible assignment can exist before any augmentation
    /// work: total slot capacity must cover every candidate. A table with
    /// candidates but no slots fails here too, since its capacity sums to
    /// zero.
    pub fn check_feasibility(&self) -> Result<(), SolveError> {
        if self.total_capacity < self.num_candidates as u64 {
            return Err(SolveError::InfeasibleCapacity(format!(
                "total slot capacity {} cannot cover {} candidates",
                self.total_capacity, self.num_candidates
            )));
        }
        Ok(())
    }

    fn link(&mut self, from: usize, to: usize, capacity: i64, cost: i64) {
        let e = self.to.len();
        self.to.push(to);
        self.residual.push(capacity);
        self.cost.push(cost);
        self.adjacency[from].push(e);

        self.to.push(from);
        self.residual.push(0);
        self.cost.push(-cost);
        self.adjacency[to].push(e + 1);
    }

    /// Pushes one unit of flow over residual edge `e`.
    pub(crate) fn push_unit(&mut self, e: usize) {
        self.residual[e] -= 1;
        self.residual[e ^ 1] += 1;
    }
}
