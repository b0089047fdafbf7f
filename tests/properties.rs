use std::time::{Duration, Instant};

use itertools::Itertools;
use proptest::prelude::*;
use timetable_solver::ac3::establish_arc_consistency;
use timetable_solver::data::{
    Assignment, Domains, ScheduleVariable, SlotIndex, Subject, Teacher, TimeSlot,
};
use timetable_solver::{ConstraintChecker, CspSolver};

#[derive(Debug, Clone)]
struct Instance {
    variables: Vec<ScheduleVariable>,
    domains: Domains,
    slots: SlotIndex,
    teachers: Vec<Teacher>,
    subjects: Vec<Subject>,
}

impl Instance {
    fn checker(&self) -> ConstraintChecker {
        ConstraintChecker::new(&self.teachers, &self.subjects)
    }

    fn solver(&self) -> CspSolver {
        CspSolver::new(
            self.variables.clone(),
            &self.domains,
            self.slots.clone(),
            self.checker(),
        )
    }
}

fn specialization() -> impl Strategy<Value = Option<&'static str>> {
    prop::option::of(prop::sample::select(vec!["algebra", "optics"]))
}

fn instance() -> impl Strategy<Value = Instance> {
    (
        1usize..=5,
        1u32..=3,
        1u32..=2,
        prop::collection::vec((0u8..2, 0u32..4, 1u32..3), 1..=4),
    )
        .prop_flat_map(|(subject_count, teacher_count, room_count, slot_specs)| {
            let slot_count = slot_specs.len() as u32;
            let value = (1..=teacher_count, 1..=room_count, 1..=slot_count)
                .prop_map(|(t, r, s)| Assignment::new(t, r, s));
            (
                Just(slot_specs),
                prop::collection::vec(prop::collection::vec(value, 1..=4), subject_count),
                prop::collection::vec(specialization(), teacher_count as usize),
                prop::collection::vec(specialization(), subject_count),
            )
        })
        .prop_map(|(slot_specs, domain_lists, teacher_specs, subject_reqs)| {
            let slots = slot_specs
                .iter()
                .enumerate()
                .map(|(i, &(day, start, len))| {
                    let id = i as u32 + 1;
                    (id, TimeSlot::new(id, day, start, start + len))
                })
                .collect();
            let teachers = teacher_specs
                .iter()
                .enumerate()
                .map(|(i, spec)| Teacher {
                    id: i as u32 + 1,
                    name: format!("teacher-{i}"),
                    specializations: spec.iter().map(|s| s.to_string()).collect(),
                    max_weekly_hours: 20,
                    availability: Vec::new(),
                })
                .collect();
            let subjects: Vec<Subject> = subject_reqs
                .iter()
                .enumerate()
                .map(|(i, req)| Subject {
                    id: i as u32 + 1,
                    code: format!("S{i}"),
                    weekly_hours: 2,
                    required_specializations: req.iter().map(|s| s.to_string()).collect(),
                })
                .collect();
            let variables: Vec<ScheduleVariable> =
                subjects.iter().map(ScheduleVariable::from).collect();
            let domains = variables
                .iter()
                .map(|v| v.subject_id)
                .zip(domain_lists)
                .collect();
            Instance {
                variables,
                domains,
                slots,
                teachers,
                subjects,
            }
        })
}

fn deadline() -> Instant {
    Instant::now() + Duration::from_secs(10)
}

proptest! {
    #[test]
    fn results_never_double_book(instance in instance()) {
        let checker = instance.checker();
        if let Ok(result) = instance.solver().solve(deadline()) {
            prop_assert_eq!(result.hard_violations, 0);
            for (a, b) in result.entries.iter().tuple_combinations() {
                let overlap = instance.slots[&a.slot_id].overlaps(&instance.slots[&b.slot_id]);
                if overlap {
                    prop_assert_ne!(a.teacher_id, b.teacher_id);
                    prop_assert_ne!(a.room_id, b.room_id);
                }
            }
            for entry in &result.entries {
                prop_assert!(checker.specialization_satisfied(entry.subject_id, entry.teacher_id));
            }
        }
    }

    #[test]
    fn verdict_is_deterministic(instance in instance()) {
        let first = instance.solver().solve(deadline());
        let second = instance.solver().solve(deadline());
        match (first, second) {
            (Ok(a), Ok(b)) => {
                prop_assert_eq!(a.is_partial, b.is_partial);
                prop_assert_eq!(a.entries.len(), b.entries.len());
            }
            (Err(_), Err(_)) => {}
            (a, b) => prop_assert!(false, "verdicts differ: {:?} vs {:?}", a, b),
        }
    }

    #[test]
    fn best_partial_matches_deepest_point(instance in instance()) {
        let mut solver = instance.solver();
        if let Ok(result) = solver.solve(deadline()) {
            prop_assert_eq!(result.entries.len(), solver.stats().max_depth);
            prop_assert_eq!(result.is_partial, result.entries.len() < instance.variables.len());
        }
    }

    #[test]
    fn arc_consistency_keeps_every_solution_value(instance in instance()) {
        let checker = instance.checker();
        let mut pruned = instance.domains.clone();
        let verdict = establish_arc_consistency(
            &instance.variables,
            &mut pruned,
            &checker,
            &instance.slots,
        );

        let ids: Vec<_> = instance.variables.iter().map(|v| v.subject_id).collect();
        let solutions = ids
            .iter()
            .map(|id| instance.domains[id].iter())
            .multi_cartesian_product()
            .filter(|values| {
                ids.iter().zip(values).tuple_combinations().all(|((xi, vi), (xj, vj))| {
                    !checker.conflicts(*xi, vi, *xj, vj, &instance.slots)
                })
            });

        for solution in solutions {
            prop_assert!(verdict.is_ok(), "AC-3 rejected a solvable instance");
            for (id, value) in ids.iter().zip(solution) {
                prop_assert!(pruned[id].contains(value));
            }
        }
    }
}
