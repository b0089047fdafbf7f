//! Background generation jobs.
//!
//! A submitted snapshot gets a job id straight away; the search then runs on a
//! blocking task and its outcome is read back later through [`SchedulerService::status`].

use crate::config::SolverSettings;
use crate::constraints::ConstraintChecker;
use crate::data::{Assignment, Domains, ReferenceSnapshot, ScheduleVariable, SolverResult};
use crate::error::Result;
use crate::solver::CspSolver;
use log::{info, trace, warn};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use uuid::Uuid;

/// Score persisted against a job that produced no schedule at all.
pub const FAILED_JOB_SCORE: f64 = -1.0;

/// Lifecycle of a generation job.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Solving,
    Completed { result: SolverResult },
    Failed { reason: String, score: f64 },
}

impl JobStatus {
    pub fn is_finished(&self) -> bool {
        !matches!(self, JobStatus::Solving)
    }
}

/// Published once per job after its status is stored.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ScheduleEvent {
    #[serde(rename_all = "camelCase")]
    Completed {
        job_id: Uuid,
        score: f64,
        is_partial: bool,
        unassigned_count: usize,
    },
    #[serde(rename_all = "camelCase")]
    Failed { job_id: Uuid, reason: String },
}

#[derive(Debug, Error)]
#[error("Event publish failed: {0}")]
pub struct PublishError(pub String);

/// Outbound notification channel. Failures are logged and otherwise ignored.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: &ScheduleEvent) -> std::result::Result<(), PublishError>;
}

/// Writes events to the log as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogPublisher;

impl EventPublisher for LogPublisher {
    fn publish(&self, event: &ScheduleEvent) -> std::result::Result<(), PublishError> {
        let payload = serde_json::to_string(event).map_err(|e| PublishError(e.to_string()))?;
        info!("schedule event: {payload}");
        Ok(())
    }
}

/// One variable per subject, in snapshot order, and the initial domains:
/// every teacher × room × slot triple that passes the specialization and
/// availability rules on its own.
pub fn build_problem(
    snapshot: &ReferenceSnapshot,
    checker: &ConstraintChecker,
) -> (Vec<ScheduleVariable>, Domains) {
    let variables: Vec<ScheduleVariable> =
        snapshot.subjects.iter().map(ScheduleVariable::from).collect();

    let mut domains = Domains::with_capacity(variables.len());
    for variable in &variables {
        let mut candidates = Vec::new();
        for teacher in &snapshot.teachers {
            if !checker.specialization_satisfied(variable.subject_id, teacher.id) {
                continue;
            }
            for room in &snapshot.rooms {
                for slot in &snapshot.time_slots {
                    if checker.is_available(teacher.id, slot.id) {
                        candidates.push(Assignment::new(teacher.id, room.id, slot.id));
                    }
                }
            }
        }
        trace!(
            "Subject {} starts with {} candidates out of a theoretical maximum of {}.",
            variable.code,
            candidates.len(),
            snapshot.teachers.len() * snapshot.rooms.len() * snapshot.time_slots.len()
        );
        domains.insert(variable.subject_id, candidates);
    }
    (variables, domains)
}

/// Runs one complete generation synchronously.
pub fn solve_snapshot(
    snapshot: &ReferenceSnapshot,
    settings: &SolverSettings,
    budget: Duration,
) -> Result<SolverResult> {
    let deadline = Instant::now() + budget;
    let checker = ConstraintChecker::from_snapshot(snapshot);
    let (variables, domains) = build_problem(snapshot, &checker);
    let mut solver = CspSolver::new(variables, &domains, snapshot.slot_index(), checker)
        .with_lcv_slot_aware(settings.lcv_slot_aware);
    solver.solve(deadline)
}

/// Owns the in-memory job table and spawns one search per submission.
pub struct SchedulerService {
    jobs: RwLock<HashMap<Uuid, JobStatus>>,
    settings: SolverSettings,
    publisher: Arc<dyn EventPublisher>,
}

impl SchedulerService {
    pub fn new(settings: SolverSettings, publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            settings,
            publisher,
        }
    }

    /// Registers a job and starts solving it on a blocking task. Must be
    /// called from within a tokio runtime.
    pub fn submit(self: &Arc<Self>, snapshot: ReferenceSnapshot, budget: Option<Duration>) -> Uuid {
        let id = Uuid::new_v4();
        let budget = budget.unwrap_or_else(|| self.settings.deadline());
        self.jobs.write().insert(id, JobStatus::Solving);
        info!(
            "Job {id} submitted: {} subjects, budget {:.2?}",
            snapshot.subjects.len(),
            budget
        );

        let service = Arc::clone(self);
        tokio::task::spawn_blocking(move || service.run_job(id, &snapshot, budget));
        id
    }

    pub fn status(&self, id: &Uuid) -> Option<JobStatus> {
        self.jobs.read().get(id).cloned()
    }

    pub fn list_jobs(&self) -> Vec<Uuid> {
        self.jobs.read().keys().copied().collect()
    }

    fn run_job(&self, id: Uuid, snapshot: &ReferenceSnapshot, budget: Duration) {
        let (status, event) = match solve_snapshot(snapshot, &self.settings, budget) {
            Ok(result) => {
                if result.is_partial {
                    warn!(
                        "Job {id} produced a partial schedule: {} subjects unassigned",
                        result.unassigned.len()
                    );
                }
                let event = ScheduleEvent::Completed {
                    job_id: id,
                    score: result.score,
                    is_partial: result.is_partial,
                    unassigned_count: result.unassigned.len(),
                };
                (JobStatus::Completed { result }, event)
            }
            Err(e) => {
                warn!("Job {id} failed: {e}");
                let reason = e.to_string();
                let event = ScheduleEvent::Failed {
                    job_id: id,
                    reason: reason.clone(),
                };
                (
                    JobStatus::Failed {
                        reason,
                        score: FAILED_JOB_SCORE,
                    },
                    event,
                )
            }
        };
        self.jobs.write().insert(id, status);

        if let Err(e) = self.publisher.publish(&event) {
            warn!("Job {id}: {e}");
        }
    }
}
