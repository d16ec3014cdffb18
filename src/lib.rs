//! Ranked candidate-to-time-slot assignment solver.
//!
//! Takes a scheduling table — candidates, time slots, per-slot assignment
//! ceilings, and each candidate's ranking of every slot — and computes the
//! assignment minimizing the total rank, with every candidate placed in
//! exactly one slot. The optimization runs in-crate as a min-cost flow on a
//! transportation network rather than through an external ILP solver.
//!
//! - [`data`]: wire types and the error taxonomy
//! - [`network`]: flow-network construction and the feasibility pre-check
//! - [`solver`]: successive-shortest-path solver and assignment extraction
//! - [`server`]: JSON-over-HTTP surface for the solver

pub mod data;
pub mod network;
pub mod server;
pub mod solver;
