use crate::data::{
    CandidateAssignment, CandidateIndex, SchedulingOutput, SchedulingTableInfo, SolveError,
    TimeSlotIndex,
};
use crate::network::{FlowNetwork, UNSET};
use itertools::Itertools;
use log::{info, trace};
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

const INF: i64 = i64::MAX / 4;

/// Solves the scheduling table by minimum-cost flow: every candidate gets
/// exactly one time slot, no slot exceeds its capacity, and the sum of the
/// chosen ranks is minimal.

pub fn solve(input: &SchedulingTableInfo) -> Result<SchedulingOutput, SolveError> {
    solve_with_cancellation(input, &AtomicBool::new(false))
}

/// Like [`solve`], but checks `cancel` once before each augmentation and
/// aborts with [`SolveError::Cancelled`]. No partial assignment escapes an
/// aborted call.
pub fn solve_with_cancellation(
    input: &SchedulingTableInfo,
    cancel: &AtomicBool,
) -> Result<SchedulingOutput, SolveError> {
    let start_time = Instant::now();
    let m = input.num_candidates();
    let n = input.num_time_slots();

    if m == 0 {
        info!("No candidates to assign; returning the empty assignment.");
        return Ok(SchedulingOutput {
            assignments: Vec::new(),
            total_rank: 0,
        });
    }

    // model setup
    info!(
        "Setting up flow network with {} candidates and {} time slots...",
        m, n
    );
    let capacities = input.effective_capacities();
    let mut network = FlowNetwork::build(m, n, &input.candidates_time_slot_rankings, &capacities)?;
    network.check_feasibility()?;

    // solve
    info!("Starting min-cost flow solver...");
    saturate_candidates(&mut network, cancel)?;
    let pairs = extract_assignments(&network)?;
    let duration = start_time.elapsed();

    let total_rank: i64 = pairs
        .iter()
        .map(|&(i, j)| i64::from(input.candidates_time_slot_rankings[i][j]))
        .sum();
    let per_slot = pairs.iter().counts_by(|&(_, j)| j);
    trace!("Assignments per time slot: {:?}", per_slot);
    info!(
        "Optimal assignment found in {:.2?} with total rank {}.",
        duration, total_rank
    );

    let assignments = pairs
        .into_iter()
        .map(|(i, j)| CandidateAssignment {
            candidate_index: i,
            time_slot_index: j,
            candidate: input.candidates[i].clone(),
            assigned_time_slot: input.time_slots[j].clone(),
        })
        .collect();

    Ok(SchedulingOutput {
        assignments,
        total_rank,
    })
}

/// Runs one unit augmentation per candidate: successive shortest paths over
/// reduced costs, with the potential update keeping every residual edge
/// non-negative for the next Dijkstra pass.
fn saturate_candidates(network: &mut FlowNetwork, cancel: &AtomicBool) -> Result<(), SolveError> {
    let num_nodes = network.num_nodes();
    let sink = network.sink();
    let mut potential = vec![0i64; num_nodes];
    let mut dist = vec![INF; num_nodes];
    let mut parent_edge = vec![UNSET; num_nodes];

    for unit in 0..network.num_candidates {
        if cancel.load(Ordering::Relaxed) {
            info!("Solve cancelled after {} of {} augmentations.", unit, network.num_candidates);
            return Err(SolveError::Cancelled);
        }

        shortest_path(network, &potential, &mut dist, &mut parent_edge);
        if parent_edge[sink] == UNSET {
            // the pre-check passed, so a missing path means the network
            // itself is wrong
            return Err(SolveError::InfeasibleCapacity(format!(
                "no augmenting path for candidate unit {} despite the capacity pre-check",
                unit
            )));
        }

        for v in 0..num_nodes {
            if dist[v] < INF {
                potential[v] += dist[v];
            }
        }

        let mut v = sink;
        while v != FlowNetwork::SOURCE {
            let e = parent_edge[v];
            network.push_unit(e);
            v = network.to[e ^ 1];
        }
        trace!("Augmented unit {} of {}.", unit + 1, network.num_candidates);
    }

    Ok(())
}

/// Dijkstra from the source over reduced costs `cost + pot[u] - pot[v]`.
///
/// Heap entries are `(distance, node)`, so among equal distances the
/// lowest-numbered node settles first, and relaxation is strictly
/// improving. With slot nodes numbered in ascending slot order and slot
/// edges inserted in ascending slot order, equal-cost ties always resolve
/// toward the lowest-indexed slot.
fn shortest_path(
    network: &FlowNetwork,
    potential: &[i64],
    dist: &mut [i64],
    parent_edge: &mut [usize],
) {
    dist.fill(INF);
    parent_edge.fill(UNSET);
    dist[FlowNetwork::SOURCE] = 0;

    let mut heap = BinaryHeap::new();
    heap.push(Reverse((0i64, FlowNetwork::SOURCE)));

    while let Some(Reverse((d, u))) = heap.pop() {
        if d > dist[u] {
            continue;
        }
        for &e in &network.adjacency[u] {
            if network.residual[e] == 0 {
                continue;
            }
            let v = network.to[e];
            let next = d + network.cost[e] + potential[u] - potential[v];
            if next < dist[v] {
                dist[v] = next;
                parent_edge[v] = e;
                heap.push(Reverse((next, v)));
            }
        }
    }
}

/// Reads the saturated candidate->slot edges back into index pairs, in
/// ascending candidate order. Exactly one outgoing unit edge per candidate
/// must carry flow; anything else is a solver defect.
fn extract_assignments(
    network: &FlowNetwork,
) -> Result<Vec<(CandidateIndex, TimeSlotIndex)>, SolveError> {
    let mut pairs = Vec::with_capacity(network.num_candidates);

    for i in 0..network.num_candidates {
        let candidate = network.candidate_node(i);
        let mut assigned: Option<TimeSlotIndex> = None;
        for &e in &network.adjacency[candidate] {
            // forward edges carry even ids; a unit edge with no residual
            // capacity left is the one carrying the candidate's flow
            if e % 2 != 0 || network.residual[e] != 0 {
                continue;
            }
            let slot = network.to[e] - network.slot_node(0);
            if assigned.replace(slot).is_some() {
                return Err(SolveError::InternalInconsistency(format!(
                    "candidate {} has more than one saturated slot edge",
                    i
                )));
            }
        }
        match assigned {
            Some(slot) => pairs.push((i, slot)),
            None => {
                return Err(SolveError::InternalInconsistency(format!(
                    "candidate {} has no saturated slot edge",
                    i
                )));
            }
        }
    }

    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Capacity, Rank};

    fn table(rankings: Vec<Vec<Rank>>, capacities: Vec<Capacity>) -> SchedulingTableInfo {
        let m = rankings.len();
        let n = capacities.len();
        SchedulingTableInfo {
            candidates: (0..m).map(|i| format!("Candidate #{}", i)).collect(),
            time_slots: (0..n).map(|j| format!("Time #{}", j)).collect(),
            candidates_time_slot_rankings: rankings,
            assignments_per_time_slot: capacities,
        }
    }

    fn pairs(output: &SchedulingOutput) -> Vec<(usize, usize)> {
        output
            .assignments
            .iter()
            .map(|a| (a.candidate_index, a.time_slot_index))
            .collect()
    }

    /// Every capacity-respecting full assignment, by exhaustive enumeration.
    fn brute_force_minimum(rankings: &[Vec<Rank>], capacities: &[Capacity]) -> Option<i64> {
        let m = rankings.len();
        let n = capacities.len();
        (0..m)
            .map(|_| 0..n)
            .multi_cartesian_product()
            .filter(|slots| {
                let used = slots.iter().counts();
                used.iter()
                    .all(|(&&slot, &count)| count <= capacities[slot] as usize)
            })
            .map(|slots| {
                slots
                    .iter()
                    .enumerate()
                    .map(|(i, &j)| i64::from(rankings[i][j]))
                    .sum()
            })
            .min()
    }

    #[test]
    fn opposite_preferences_each_get_their_favorite() {
        let output = solve(&table(vec![vec![1, 2], vec![2, 1]], vec![1, 1])).unwrap();
        assert_eq!(pairs(&output), vec![(0, 0), (1, 1)]);
        assert_eq!(output.total_rank, 2);
    }

    #[test]
    fn shared_favorite_fits_within_slot_capacity() {
        // both top choices fit in slot 0; forcing one of them to slot 1
        // would cost more
        let output = solve(&table(
            vec![vec![1, 2], vec![1, 2], vec![2, 1]],
            vec![2, 1],
        ))
        .unwrap();
        assert_eq!(pairs(&output), vec![(0, 0), (1, 0), (2, 1)]);
        assert_eq!(output.total_rank, 3);
    }

    #[test]
    fn capacity_shortfall_is_infeasible() {
        let err = solve(&table(vec![vec![1], vec![1]], vec![1])).unwrap_err();
        assert!(matches!(err, SolveError::InfeasibleCapacity(_)));
    }

    #[test]
    fn equal_ranks_resolve_to_the_lowest_indexed_slot() {
        let output = solve(&table(vec![vec![1, 1]], vec![1, 1])).unwrap();
        assert_eq!(pairs(&output), vec![(0, 0)]);
    }

    #[test]
    fn no_candidates_is_a_trivial_success() {
        let output = solve(&table(vec![], vec![1, 1])).unwrap();
        assert!(output.assignments.is_empty());
        assert_eq!(output.total_rank, 0);
    }

    #[test]
    fn candidates_without_slots_are_infeasible() {
        let err = solve(&table(vec![vec![], vec![]], vec![])).unwrap_err();
        assert!(matches!(err, SolveError::InfeasibleCapacity(_)));
    }

    #[test]
    fn shape_mismatch_is_rejected_before_solving() {
        let mut input = table(vec![vec![1, 2], vec![2, 1]], vec![1, 1]);
        input.candidates_time_slot_rankings[1].pop();
        let err = solve(&input).unwrap_err();
        assert!(matches!(err, SolveError::ShapeMismatch(_)));
    }

    #[test]
    fn every_candidate_appears_exactly_once() {
        let output = solve(&table(
            vec![
                vec![3, 1, 2],
                vec![1, 3, 2],
                vec![2, 2, 1],
                vec![1, 1, 1],
            ],
            vec![2, 2, 2],
        ))
        .unwrap();

        let candidates: Vec<usize> = output
            .assignments
            .iter()
            .map(|a| a.candidate_index)
            .collect();
        assert_eq!(candidates, vec![0, 1, 2, 3]);
    }

    #[test]
    fn slot_capacities_are_respected() {
        let rankings = vec![vec![1, 2], vec![1, 2], vec![1, 2], vec![1, 2]];
        let capacities = vec![2, 2];
        let output = solve(&table(rankings, capacities.clone())).unwrap();

        let used = output
            .assignments
            .iter()
            .counts_by(|a| a.time_slot_index);
        for (slot, count) in used {
            assert!(count <= capacities[slot] as usize);
        }
    }

    #[test]
    fn repeated_solves_are_identical() {
        let input = table(
            vec![vec![2, 2, 1], vec![1, 1, 3], vec![2, 1, 1], vec![1, 2, 2]],
            vec![1, 2, 1],
        );
        let first = solve(&input).unwrap();
        let second = solve(&input).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn matches_brute_force_on_small_instances() {
        let instances: Vec<(Vec<Vec<Rank>>, Vec<Capacity>)> = vec![
            (vec![vec![1, 2], vec![2, 1]], vec![1, 1]),
            (vec![vec![1, 2], vec![1, 2], vec![2, 1]], vec![2, 1]),
            (
                vec![vec![4, 1, 3], vec![2, 5, 1], vec![3, 2, 2], vec![1, 4, 4]],
                vec![1, 2, 2],
            ),
            (
                vec![
                    vec![1, 1, 1, 1],
                    vec![2, 1, 4, 3],
                    vec![3, 4, 1, 2],
                    vec![2, 2, 2, 1],
                    vec![5, 1, 2, 4],
                ],
                vec![2, 1, 1, 2],
            ),
            (
                vec![vec![7, 7], vec![7, 7], vec![7, 7]],
                vec![2, 2],
            ),
        ];

        for (rankings, capacities) in instances {
            let expected = brute_force_minimum(&rankings, &capacities).unwrap();
            let output = solve(&table(rankings, capacities)).unwrap();
            assert_eq!(output.total_rank, expected);
        }
    }

    #[test]
    fn cancellation_aborts_before_the_first_augmentation() {
        let input = table(vec![vec![1, 2], vec![2, 1]], vec![1, 1]);
        let cancel = AtomicBool::new(true);
        let err = solve_with_cancellation(&input, &cancel).unwrap_err();
        assert_eq!(err, SolveError::Cancelled);
    }

    #[test]
    fn unset_cancellation_flag_solves_normally() {
        let input = table(vec![vec![1, 2], vec![2, 1]], vec![1, 1]);
        let cancel = AtomicBool::new(false);
        let output = solve_with_cancellation(&input, &cancel).unwrap();
        assert_eq!(pairs(&output), vec![(0, 0), (1, 1)]);
    }
}
