use crate::constraints::ConstraintChecker;
use crate::data::{PartialAssignment, SubjectId, TeacherId};
use log::debug;
use serde::Serialize;

const SPECIALIZATION_BONUS: i64 = 30;
const LOAD_HEADROOM_CAP: i64 = 20;
const AVAILABILITY_BONUS: i64 = 5;

/// A teacher suggestion with its score. Higher is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherRanking {
    pub teacher_id: TeacherId,
    pub score: i64,
}

/// Scores teachers for a single subject. Read-only and independent of the solver.
#[derive(Debug, Clone, Copy)]
pub struct TeacherRanker<'a> {
    checker: &'a ConstraintChecker,
}

impl<'a> TeacherRanker<'a> {
    pub fn new(checker: &'a ConstraintChecker) -> Self {
        Self { checker }
    }

    /// `30 * [specialization matches] + min(20, max hours - assigned hours)
    /// + 5 * [availability data exists]`, best first. Ties keep input order.
    pub fn rank_for_subject(
        &self,
        subject_id: SubjectId,
        candidate_teachers: &[TeacherId],
        current_assignment: &PartialAssignment,
    ) -> Vec<TeacherRanking> {
        let mut ranked: Vec<TeacherRanking> = candidate_teachers
            .iter()
            .map(|&teacher_id| TeacherRanking {
                teacher_id,
                score: self.score(subject_id, teacher_id, current_assignment),
            })
            .collect();
        ranked.sort_by_key(|r| std::cmp::Reverse(r.score));
        debug!("Ranked {} teachers for subject {subject_id}", ranked.len());
        ranked
    }

    fn score(
        &self,
        subject_id: SubjectId,
        teacher_id: TeacherId,
        current_assignment: &PartialAssignment,
    ) -> i64 {
        let assigned_hours: i64 = current_assignment
            .iter()
            .filter(|(_, a)| a.teacher_id == teacher_id)
            .map(|(subject, _)| i64::from(self.checker.weekly_hours(*subject)))
            .sum();
        let headroom = i64::from(self.checker.max_weekly_hours(teacher_id)) - assigned_hours;

        let mut score = headroom.min(LOAD_HEADROOM_CAP);
        if self.checker.has_matching_specialization(subject_id, teacher_id) {
            score += SPECIALIZATION_BONUS;
        }
        if self.checker.has_availability_data(teacher_id) {
            score += AVAILABILITY_BONUS;
        }
        score
    }
}
