use serde::{Deserialize, Serialize};
use std::fmt;

// Type aliases for clarity
pub type CandidateIndex = usize;
pub type TimeSlotIndex = usize;
pub type Rank = u32;
pub type Capacity = u32;

/// The scheduling table collected by the client: named candidates, named
/// time slots, per-slot assignment ceilings, and each candidate's ranking
/// of every time slot (1 = most preferred).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingTableInfo {
    pub candidates: Vec<String>,
    pub time_slots: Vec<String>,
    /// Row `i`, column `j` is candidate `i`'s rank for time slot `j`.
    pub candidates_time_slot_rankings: Vec<Vec<Rank>>,
    /// Maximum number of candidates each time slot may receive. An empty
    /// vector means one assignment per slot (the single-assignment mode).
    #[serde(default)]
    pub assignments_per_time_slot: Vec<Capacity>,
}

impl SchedulingTableInfo {
    pub fn num_candidates(&self) -> usize {
        self.candidates.len()
    }

    pub fn num_time_slots(&self) -> usize {
        self.time_slots.len()
    }

    /// The capacity vector with the single-assignment default applied.
    pub fn effective_capacities(&self) -> Vec<Capacity> {
        if self.assignments_per_time_slot.is_empty() {
            vec![1; self.num_time_slots()]
        } else {
            self.assignments_per_time_slot.clone()
        }
    }
}

/// One candidate's final time-slot assignment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub struct CandidateAssignment {
    pub candidate_index: CandidateIndex,
    pub time_slot_index: TimeSlotIndex,
    pub candidate: String,
    pub assigned_time_slot: String,
}

impl fmt::Display for CandidateAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.candidate, self.assigned_time_slot)
    }
}

/// The final output of the solver: one assignment per candidate, ordered by
/// candidate index, plus the objective value actually achieved.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingOutput {
    pub assignments: Vec<CandidateAssignment>,
    pub total_rank: i64,
}

/// Failure taxonomy for one solve call. Every error is terminal for the
/// call and carries no partial assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveError {
    /// The ranking matrix or capacity vector does not match the candidate
    /// and time-slot counts.
    ShapeMismatch(String),
    /// Total slot capacity cannot cover every candidate.
    InfeasibleCapacity(String),
    /// A solver invariant was violated; indicates a defect, not bad input.
    InternalInconsistency(String),
    /// Cooperative cancellation was observed between augmentations.
    Cancelled,
}

impl fmt::Display for SolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveError::ShapeMismatch(detail) => write!(f, "shape mismatch: {}", detail),
            SolveError::InfeasibleCapacity(detail) => {
                write!(f, "infeasible capacity: {}", detail)
            }
            SolveError::InternalInconsistency(detail) => {
                write!(f, "internal inconsistency: {}", detail)
            }
            SolveError::Cancelled => write!(f, "solve cancelled"),
        }
    }
}

impl std::error::Error for SolveError {}
