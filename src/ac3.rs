//! Arc consistency (AC-3) over the pairwise conflict constraint.
//!
//! Runs once before search. Every ordered pair of distinct variables is an
//! arc; revising `(xi, xj)` drops each value of `xi` that conflicts with every
//! value still left for `xj`.

use std::collections::VecDeque;

use log::{debug, trace};

use crate::constraints::ConstraintChecker;
use crate::data::{Domains, ScheduleVariable, SlotIndex, SubjectId};
use crate::error::Infeasibility;

/// Counters reported after a successful propagation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ac3Stats {
    pub arcs_processed: usize,
    pub arcs_revised: usize,
    pub values_pruned: usize,
}

/// Prunes `domains` in place until every arc is consistent.
///
/// Fails with [`Infeasibility::DomainWipeout`] as soon as a domain is empty,
/// including a variable that arrives with no candidates at all.
pub fn establish_arc_consistency(
    variables: &[ScheduleVariable],
    domains: &mut Domains,
    checker: &ConstraintChecker,
    slots: &SlotIndex,
) -> Result<Ac3Stats, Infeasibility> {
    for variable in variables {
        if domains.get(&variable.subject_id).is_none_or(Vec::is_empty) {
            return Err(Infeasibility::DomainWipeout {
                subject_id: variable.subject_id,
            });
        }
    }

    let ids: Vec<SubjectId> = variables.iter().map(|v| v.subject_id).collect();
    let mut queue: VecDeque<(SubjectId, SubjectId)> = ids
        .iter()
        .flat_map(|&xi| ids.iter().filter(move |&&xj| xj != xi).map(move |&xj| (xi, xj)))
        .collect();
    let mut stats = Ac3Stats::default();

    while let Some((xi, xj)) = queue.pop_front() {
        stats.arcs_processed += 1;
        let removed = revise(xi, xj, domains, checker, slots);
        if removed == 0 {
            continue;
        }
        stats.arcs_revised += 1;
        stats.values_pruned += removed;
        trace!("AC-3 pruned {removed} values of subject {xi} against subject {xj}");

        if domains.get(&xi).is_none_or(Vec::is_empty) {
            debug!("AC-3 wiped out the domain of subject {xi}");
            return Err(Infeasibility::DomainWipeout { subject_id: xi });
        }
        queue.extend(
            ids.iter()
                .filter(|&&xk| xk != xi && xk != xj)
                .map(|&xk| (xk, xi)),
        );
    }

    debug!(
        "AC-3 done: {} arcs processed, {} revised, {} values pruned",
        stats.arcs_processed, stats.arcs_revised, stats.values_pruned
    );
    Ok(stats)
}

// returns how many values were dropped from xi's domain
fn revise(
    xi: SubjectId,
    xj: SubjectId,
    domains: &mut Domains,
    checker: &ConstraintChecker,
    slots: &SlotIndex,
) -> usize {
    let Some(mut candidates) = domains.remove(&xi) else {
        return 0;
    };
    let before = candidates.len();
    let support = domains.get(&xj).map(Vec::as_slice).unwrap_or(&[]);
    candidates.retain(|vi| support.iter().any(|vj| !checker.conflicts(xi, vi, xj, vj, slots)));
    let removed = before - candidates.len();
    domains.insert(xi, candidates);
    removed
}
