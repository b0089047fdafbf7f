use crate::data::{
    Assignment, PartialAssignment, ReferenceSnapshot, SlotId, SlotIndex, Subject, SubjectId,
    Teacher, TeacherId,
};
use itertools::Itertools;
use std::collections::{HashMap, HashSet};

// soft constraint weights
const GAP_PENALTY_WEIGHT: f64 = 2.0;
const LOAD_IMBALANCE_WEIGHT: f64 = 1.5;
// idle periods a teacher may have in a day before it counts as a gap
const TOLERATED_GAP: i64 = 2;

/// Evaluates hard and soft constraints against a read-only reference snapshot.
///
/// The checker never mutates its maps once built, so a single instance can be
/// consulted by the solver, the heuristics and the ranker alike.
#[derive(Debug, Clone, Default)]
pub struct ConstraintChecker {
    availability: HashMap<TeacherId, HashSet<SlotId>>,
    specializations: HashMap<TeacherId, HashSet<String>>,
    required_specializations: HashMap<SubjectId, Vec<String>>,
    weekly_hours: HashMap<SubjectId, u32>,
    max_weekly_hours: HashMap<TeacherId, u32>,
}

impl ConstraintChecker {
    pub fn new(teachers: &[Teacher], subjects: &[Subject]) -> Self {
        let availability = teachers
            .iter()
            .filter(|t| !t.availability.is_empty())
            .map(|t| (t.id, t.availability.iter().copied().collect()))
            .collect();
        let specializations = teachers
            .iter()
            .filter(|t| !t.specializations.is_empty())
            .map(|t| (t.id, t.specializations.iter().cloned().collect()))
            .collect();
        let required_specializations = subjects
            .iter()
            .filter(|s| !s.required_specializations.is_empty())
            .map(|s| (s.id, s.required_specializations.clone()))
            .collect();

        Self {
            availability,
            specializations,
            required_specializations,
            weekly_hours: subjects.iter().map(|s| (s.id, s.weekly_hours)).collect(),
            max_weekly_hours: teachers.iter().map(|t| (t.id, t.max_weekly_hours)).collect(),
        }
    }

    pub fn from_snapshot(snapshot: &ReferenceSnapshot) -> Self {
        Self::new(&snapshot.teachers, &snapshot.subjects)
    }

    /// Whether `candidate` can be added to `partial` for `subject_id` without
    /// breaking a hard constraint.
    ///
    /// Checks, in order: teacher double-booking, room double-booking,
    /// specialization, availability. An unknown candidate slot fails the check.
    pub fn is_consistent(
        &self,
        subject_id: SubjectId,
        candidate: &Assignment,
        partial: &PartialAssignment,
        slots: &SlotIndex,
    ) -> bool {
        let Some(candidate_slot) = slots.get(&candidate.slot_id) else {
            return false;
        };
        let others = move || partial.iter().filter(move |(id, _)| **id != subject_id);

        let teacher_clash = others().any(|(_, existing)| {
            existing.teacher_id == candidate.teacher_id
                && slots
                    .get(&existing.slot_id)
                    .is_none_or(|slot| slot.overlaps(candidate_slot))
        });
        if teacher_clash {
            return false;
        }

        let room_clash = others().any(|(_, existing)| {
            existing.room_id == candidate.room_id
                && slots
                    .get(&existing.slot_id)
                    .is_none_or(|slot| slot.overlaps(candidate_slot))
        });
        if room_clash {
            return false;
        }

        self.specialization_satisfied(subject_id, candidate.teacher_id)
            && self.is_available(candidate.teacher_id, candidate.slot_id)
    }

    /// Pairwise conflict test used by arc consistency and LCV: the two slots
    /// overlap and the values share a teacher or a room.
    ///
    /// A slot id missing from `slots` counts as overlapping, so calling this
    /// with an empty index degrades to a pure teacher/room identity test.
    pub fn conflicts(
        &self,
        xi: SubjectId,
        val_i: &Assignment,
        xj: SubjectId,
        val_j: &Assignment,
        slots: &SlotIndex,
    ) -> bool {
        if xi == xj {
            return false;
        }
        if val_i.teacher_id != val_j.teacher_id && val_i.room_id != val_j.room_id {
            return false;
        }
        match (slots.get(&val_i.slot_id), slots.get(&val_j.slot_id)) {
            (Some(a), Some(b)) => a.overlaps(b),
            _ => true,
        }
    }

    /// `2.0 * gap penalty + 1.5 * load imbalance` over a finished assignment.
    pub fn evaluate_soft_constraints(&self, assignment: &PartialAssignment, slots: &SlotIndex) -> f64 {
        GAP_PENALTY_WEIGHT * gap_penalty(assignment, slots)
            + LOAD_IMBALANCE_WEIGHT * load_imbalance_penalty(assignment)
    }

    /// Audits a finished assignment: every unordered pair that double-books a
    /// teacher or a room counts once, as does every entry failing its own
    /// specialization, availability or slot lookup.
    pub fn count_hard_violations(&self, assignment: &PartialAssignment, slots: &SlotIndex) -> usize {
        let entries: Vec<(&SubjectId, &Assignment)> = assignment.iter().collect();
        let pair_violations = entries
            .iter()
            .tuple_combinations()
            .filter(|((xi, vi), (xj, vj))| self.conflicts(**xi, vi, **xj, vj, slots))
            .count();
        let unary_violations = entries
            .iter()
            .filter(|(subject_id, value)| {
                !slots.contains_key(&value.slot_id)
                    || !self.specialization_satisfied(**subject_id, value.teacher_id)
                    || !self.is_available(value.teacher_id, value.slot_id)
            })
            .count();
        pair_violations + unary_violations
    }

    /// Hard-constraint reading of specializations: a subject without
    /// requirements, or a teacher without specialization data, always passes.
    pub fn specialization_satisfied(&self, subject_id: SubjectId, teacher_id: TeacherId) -> bool {
        match self.specializations.get(&teacher_id) {
            Some(_) => self.has_matching_specialization(subject_id, teacher_id),
            None => true,
        }
    }

    /// Strict reading: the subject requires nothing, or the teacher holds at
    /// least one of the required specializations.
    pub fn has_matching_specialization(&self, subject_id: SubjectId, teacher_id: TeacherId) -> bool {
        let Some(required) = self.required_specializations.get(&subject_id) else {
            return true;
        };
        self.specializations
            .get(&teacher_id)
            .is_some_and(|held| required.iter().any(|r| held.contains(r)))
    }

    /// Teachers without availability data are always available.
    pub fn is_available(&self, teacher_id: TeacherId, slot_id: SlotId) -> bool {
        self.availability
            .get(&teacher_id)
            .is_none_or(|slots| slots.contains(&slot_id))
    }

    pub fn has_availability_data(&self, teacher_id: TeacherId) -> bool {
        self.availability.contains_key(&teacher_id)
    }

    pub fn max_weekly_hours(&self, teacher_id: TeacherId) -> u32 {
        self.max_weekly_hours.get(&teacher_id).copied().unwrap_or(0)
    }

    pub fn weekly_hours(&self, subject_id: SubjectId) -> u32 {
        self.weekly_hours.get(&subject_id).copied().unwrap_or(0)
    }
}

// per teacher per day: periods left idle beyond the tolerated gap
fn gap_penalty(assignment: &PartialAssignment, slots: &SlotIndex) -> f64 {
    let starts_by_teacher_day: HashMap<(TeacherId, u8), Vec<i64>> = assignment
        .values()
        .filter_map(|a| {
            slots
                .get(&a.slot_id)
                .map(|slot| ((a.teacher_id, slot.day_of_week), i64::from(slot.start_period)))
        })
        .into_group_map();

    starts_by_teacher_day
        .values()
        .map(|starts| {
            let (earliest, latest) = match starts.iter().minmax().into_option() {
                Some((lo, hi)) => (*lo, *hi),
                None => return 0,
            };
            let span = latest - earliest;
            let count = starts.len() as i64;
            (span - count - TOLERATED_GAP).max(0)
        })
        .sum::<i64>() as f64
}

// mean absolute deviation of per-teacher entry counts
fn load_imbalance_penalty(assignment: &PartialAssignment) -> f64 {
    let counts = assignment.values().counts_by(|a| a.teacher_id);
    if counts.is_empty() {
        return 0.0;
    }
    let n = counts.len() as f64;
    let mean = counts.values().sum::<usize>() as f64 / n;
    counts
        .values()
        .map(|&c| (c as f64 - mean).abs())
        .sum::<f64>()
        / n
}
