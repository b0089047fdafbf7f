//! Error types for the timetable solver.

use std::fmt;

use thiserror::Error;

use crate::data::SubjectId;

/// Why no schedule could be produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Infeasibility {
    /// Arc consistency (or the initial domains) left a subject without candidates.
    DomainWipeout { subject_id: SubjectId },
    /// Every branch was explored and not a single subject could be placed.
    SearchExhausted,
    /// The deadline expired before the search placed its first subject.
    DeadlineBeforeFirstAssignment,
}

impl fmt::Display for Infeasibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Infeasibility::DomainWipeout { subject_id } => {
                write!(f, "subject {subject_id} has no remaining candidates")
            }
            Infeasibility::SearchExhausted => write!(f, "search space exhausted"),
            Infeasibility::DeadlineBeforeFirstAssignment => {
                write!(f, "deadline expired before any subject was placed")
            }
        }
    }
}

/// Main error type for scheduling operations
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Structural infeasibility. Needs a data fix, not a retry.
    #[error("No feasible solution: {0}")]
    NoFeasibleSolution(Infeasibility),

    #[error("Unknown subject: {0}")]
    UnknownSubject(SubjectId),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

/// Result type alias for scheduling operations
pub type Result<T> = std::result::Result<T, SchedulerError>;
