use crate::ac3::establish_arc_consistency;
use crate::constraints::ConstraintChecker;
use crate::data::{
    Assignment, Domains, PartialAssignment, ScheduleEntry, ScheduleVariable, SlotIndex, SolverResult,
    SubjectId,
};
use crate::error::{Infeasibility, Result, SchedulerError};
use crate::heuristics::{order_lcv, select_mrv};
use log::{debug, info, trace};
use std::time::Instant;

/// Score of a schedule without any soft-constraint penalty.
pub const BASE_SCORE: f64 = 100.0;

/// Counters collected during one `solve` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub nodes: usize,
    pub backtracks: usize,
    pub forward_check_wipeouts: usize,
    /// Largest number of subjects assigned at once.
    pub max_depth: usize,
}

/// How a backtracking call ended.
enum Outcome {
    Complete(PartialAssignment),
    TimedOut,
    Exhausted,
}

/// Backtracking search with AC-3 preprocessing, MRV/LCV ordering and forward
/// checking. Anytime: when the deadline passes it hands back the largest
/// consistent partial assignment it has seen.
///
/// One solver serves one request; it owns its copy of the domains.
#[derive(Debug)]
pub struct CspSolver {
    variables: Vec<ScheduleVariable>,
    domains: Domains,
    slots: SlotIndex,
    checker: ConstraintChecker,
    lcv_slot_aware: bool,
    stats: SearchStats,
}

impl CspSolver {
    /// The caller's `domains` are cloned and never touched.
    pub fn new(
        variables: Vec<ScheduleVariable>,
        domains: &Domains,
        slots: SlotIndex,
        checker: ConstraintChecker,
    ) -> Self {
        Self {
            variables,
            domains: domains.clone(),
            slots,
            checker,
            lcv_slot_aware: true,
            stats: SearchStats::default(),
        }
    }

    /// When disabled, LCV counts conflicts by teacher/room identity alone.
    pub fn with_lcv_slot_aware(mut self, enabled: bool) -> Self {
        self.lcv_slot_aware = enabled;
        self
    }

    /// Statistics of the most recent `solve` call.
    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    /// Runs AC-3, then the backtracking search until it completes, exhausts
    /// the space or `deadline` passes.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::NoFeasibleSolution`] when AC-3 empties a domain or no
    /// subject could ever be placed.
    pub fn solve(&mut self, deadline: Instant) -> Result<SolverResult> {
        let start_time = Instant::now();
        info!(
            "Solving timetable with {} subjects and {} time slots...",
            self.variables.len(),
            self.slots.len()
        );
        self.stats = SearchStats::default();

        let mut domains = self.domains.clone();
        establish_arc_consistency(&self.variables, &mut domains, &self.checker, &self.slots)
            .map_err(|reason| {
                info!("Arc consistency proved the timetable infeasible: {reason}");
                SchedulerError::NoFeasibleSolution(reason)
            })?;

        let no_slots = SlotIndex::new();
        let mut search = Search {
            variables: &self.variables,
            checker: &self.checker,
            slots: &self.slots,
            lcv_slots: if self.lcv_slot_aware { &self.slots } else { &no_slots },
            deadline,
            best_partial: PartialAssignment::new(),
            stats: SearchStats::default(),
        };
        let mut assignment = PartialAssignment::with_capacity(self.variables.len());
        let outcome = search.backtrack(&mut assignment, &mut domains);
        self.stats = search.stats;
        debug!("Search statistics: {:?}", self.stats);

        let final_assignment = match outcome {
            Outcome::Complete(complete) => complete,
            Outcome::TimedOut | Outcome::Exhausted if !search.best_partial.is_empty() => {
                search.best_partial
            }
            Outcome::TimedOut => {
                return Err(SchedulerError::NoFeasibleSolution(
                    Infeasibility::DeadlineBeforeFirstAssignment,
                ));
            }
            Outcome::Exhausted => {
                return Err(SchedulerError::NoFeasibleSolution(Infeasibility::SearchExhausted));
            }
        };

        let result = self.build_result(final_assignment, start_time);
        info!(
            "Solver finished in {:.2?}: {} entries, score {:.2}, partial: {}",
            result.duration,
            result.entries.len(),
            result.score,
            result.is_partial
        );
        Ok(result)
    }

    fn build_result(&self, assignment: PartialAssignment, start_time: Instant) -> SolverResult {
        let soft_penalty = self.checker.evaluate_soft_constraints(&assignment, &self.slots);
        let hard_violations = self.checker.count_hard_violations(&assignment, &self.slots);
        let unassigned: Vec<SubjectId> = self
            .variables
            .iter()
            .map(|v| v.subject_id)
            .filter(|id| !assignment.contains_key(id))
            .collect();

        let mut entries: Vec<ScheduleEntry> = assignment
            .iter()
            .map(|(subject_id, a)| ScheduleEntry {
                subject_id: *subject_id,
                teacher_id: a.teacher_id,
                room_id: a.room_id,
                slot_id: a.slot_id,
            })
            .collect();
        entries.sort();

        SolverResult {
            entries,
            score: BASE_SCORE - soft_penalty,
            hard_violations,
            soft_penalty,
            is_partial: !unassigned.is_empty(),
            unassigned,
            duration: start_time.elapsed(),
        }
    }
}

/// Per-call search state. Domains and the assignment are passed through the
/// recursion explicitly.
struct Search<'s> {
    variables: &'s [ScheduleVariable],
    checker: &'s ConstraintChecker,
    slots: &'s SlotIndex,
    lcv_slots: &'s SlotIndex,
    deadline: Instant,
    best_partial: PartialAssignment,
    stats: SearchStats,
}

impl Search<'_> {
    fn backtrack(&mut self, assignment: &mut PartialAssignment, domains: &mut Domains) -> Outcome {
        // record before the deadline check so the deepest point reached is never lost
        if assignment.len() > self.best_partial.len() {
            self.best_partial = assignment.clone();
        }
        self.stats.max_depth = self.stats.max_depth.max(assignment.len());

        if Instant::now() >= self.deadline {
            debug!(
                "Deadline reached with {} of {} subjects assigned",
                self.best_partial.len(),
                self.variables.len()
            );
            return Outcome::TimedOut;
        }
        self.stats.nodes += 1;

        let variables = self.variables;
        let Some(variable) = select_mrv(variables, domains, assignment) else {
            return Outcome::Complete(assignment.clone());
        };
        let xi = variable.subject_id;
        let values = order_lcv(variable, variables, domains, assignment, self.checker, self.lcv_slots);

        for value in values {
            if !self.checker.is_consistent(xi, &value, assignment, self.slots) {
                continue;
            }
            assignment.insert(xi, value);
            let snapshot = domains.clone();

            if self.forward_check(xi, &value, assignment, domains) {
                match self.backtrack(assignment, domains) {
                    Outcome::Exhausted => {}
                    done => return done,
                }
            } else {
                self.stats.forward_check_wipeouts += 1;
                trace!("Forward check emptied a domain after placing subject {xi} at {value:?}");
            }

            *domains = snapshot;
            assignment.remove(&xi);
            self.stats.backtracks += 1;
        }

        Outcome::Exhausted
    }

    // drops values that clash with the new assignment; false on a wipeout
    fn forward_check(
        &self,
        xi: SubjectId,
        value: &Assignment,
        assignment: &PartialAssignment,
        domains: &mut Domains,
    ) -> bool {
        for xj in self
            .variables
            .iter()
            .map(|v| v.subject_id)
            .filter(|xj| *xj != xi && !assignment.contains_key(xj))
        {
            if let Some(domain) = domains.get_mut(&xj) {
                domain.retain(|other| !self.checker.conflicts(xi, value, xj, other, self.slots));
                if domain.is_empty() {
                    return false;
                }
            }
        }
        true
    }
}
