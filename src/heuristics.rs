//! Variable and value ordering for the backtracking search.

use crate::constraints::ConstraintChecker;
use crate::data::{Assignment, Domains, PartialAssignment, ScheduleVariable, SlotIndex};

/// Minimum remaining values: the unassigned variable with the smallest
/// current domain. Ties go to the first one in `variables`.
pub fn select_mrv<'a>(
    variables: &'a [ScheduleVariable],
    domains: &Domains,
    assignment: &PartialAssignment,
) -> Option<&'a ScheduleVariable> {
    variables
        .iter()
        .filter(|v| !assignment.contains_key(&v.subject_id))
        .min_by_key(|v| domains.get(&v.subject_id).map_or(0, Vec::len))
}

/// Least constraining value: orders `variable`'s candidates by how many values
/// of the other unassigned variables they would rule out, fewest first.
/// Equal counts keep their domain order.
pub fn order_lcv(
    variable: &ScheduleVariable,
    variables: &[ScheduleVariable],
    domains: &Domains,
    assignment: &PartialAssignment,
    checker: &ConstraintChecker,
    slots: &SlotIndex,
) -> Vec<Assignment> {
    let Some(candidates) = domains.get(&variable.subject_id) else {
        return Vec::new();
    };
    let xi = variable.subject_id;
    let neighbours: Vec<(_, &Vec<Assignment>)> = variables
        .iter()
        .map(|v| v.subject_id)
        .filter(|&xj| xj != xi && !assignment.contains_key(&xj))
        .filter_map(|xj| domains.get(&xj).map(|d| (xj, d)))
        .collect();

    let mut scored: Vec<(usize, Assignment)> = candidates
        .iter()
        .map(|value| {
            let eliminated = neighbours
                .iter()
                .map(|(xj, domain)| {
                    domain
                        .iter()
                        .filter(|other| checker.conflicts(xi, value, *xj, other, slots))
                        .count()
                })
                .sum();
            (eliminated, *value)
        })
        .collect();
    scored.sort_by_key(|(eliminated, _)| *eliminated);
    scored.into_iter().map(|(_, value)| value).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{SubjectId, TimeSlot};

    fn variable(id: SubjectId) -> ScheduleVariable {
        ScheduleVariable {
            subject_id: id,
            code: format!("S{id}"),
            weekly_hours: 2,
            required_specializations: Vec::new(),
        }
    }

    #[test]
    fn mrv_picks_smallest_unassigned_domain() {
        let variables = vec![variable(1), variable(2), variable(3)];
        let domains = Domains::from([
            (1, vec![Assignment::new(1, 1, 1)]),
            (2, vec![Assignment::new(1, 1, 1), Assignment::new(1, 1, 2)]),
            (3, vec![Assignment::new(2, 2, 2)]),
        ]);
        let empty = PartialAssignment::new();
        assert_eq!(select_mrv(&variables, &domains, &empty).map(|v| v.subject_id), Some(1));

        let partial = PartialAssignment::from([(1, Assignment::new(1, 1, 1))]);
        assert_eq!(select_mrv(&variables, &domains, &partial).map(|v| v.subject_id), Some(3));
    }

    #[test]
    fn mrv_returns_none_when_complete() {
        let variables = vec![variable(1)];
        let domains = Domains::from([(1, vec![Assignment::new(1, 1, 1)])]);
        let complete = PartialAssignment::from([(1, Assignment::new(1, 1, 1))]);
        assert!(select_mrv(&variables, &domains, &complete).is_none());
    }

    #[test]
    fn lcv_tries_least_constraining_value_first() {
        let slots: SlotIndex = [TimeSlot::new(1, 0, 1, 2), TimeSlot::new(2, 0, 5, 6)]
            .into_iter()
            .map(|s| (s.id, s))
            .collect();
        let variables = vec![variable(1), variable(2)];
        let crowded = Assignment::new(7, 100, 1);
        let quiet = Assignment::new(7, 100, 2);
        let domains = Domains::from([
            (1, vec![crowded, quiet]),
            (2, vec![Assignment::new(7, 101, 1), Assignment::new(8, 100, 1)]),
        ]);
        let ordered = order_lcv(
            &variables[0],
            &variables,
            &domains,
            &PartialAssignment::new(),
            &ConstraintChecker::default(),
            &slots,
        );
        assert_eq!(ordered, vec![quiet, crowded]);

        // without slot data both values look equally constraining; domain order is kept
        let ordered = order_lcv(
            &variables[0],
            &variables,
            &domains,
            &PartialAssignment::new(),
            &ConstraintChecker::default(),
            &SlotIndex::new(),
        );
        assert_eq!(ordered, vec![crowded, quiet]);
    }
}
