//! Constraint-satisfaction timetabling for university semesters.
//!
//! Subjects are variables, `(teacher, room, slot)` triples are values. The
//! [`solver::CspSolver`] prunes domains with AC-3, then runs a backtracking
//! search with MRV/LCV ordering and forward checking under a wall-clock
//! deadline, returning the best partial schedule when time runs out.
//!
//! [`jobs`] and [`server`] wrap the solver in background jobs and a small
//! JSON API.

pub mod ac3;
pub mod config;
pub mod constraints;
pub mod data;
pub mod error;
pub mod heuristics;
pub mod jobs;
pub mod ranker;
pub mod server;
pub mod solver;

pub use constraints::ConstraintChecker;
pub use error::{Infeasibility, SchedulerError};
pub use solver::CspSolver;
