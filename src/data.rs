use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

// Type aliases for clarity
pub type TeacherId = u32;
pub type SubjectId = u32;
pub type RoomId = u32;
pub type SlotId = u32;

/// Candidate values per subject, in the order the search should consider them.
pub type Domains = HashMap<SubjectId, Vec<Assignment>>;

/// The assignment under construction by the search.
pub type PartialAssignment = HashMap<SubjectId, Assignment>;

/// Time slots keyed by id.
pub type SlotIndex = HashMap<SlotId, TimeSlot>;

/// A teacher as delivered by the teacher directory.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: TeacherId,
    pub name: String,
    #[serde(default)]
    pub specializations: Vec<String>,
    pub max_weekly_hours: u32,
    /// Slot ids the teacher can teach in. Empty means no availability data.
    #[serde(default)]
    pub availability: Vec<SlotId>,
}

/// A subject offered this semester.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: SubjectId,
    pub code: String,
    pub weekly_hours: u32,
    #[serde(default)]
    pub required_specializations: Vec<String>,
}

/// Represents a physical room.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: RoomId,
    pub capacity: u32,
    #[serde(default)]
    pub room_type: String,
}

/// One entry of the semester calendar. Periods are half-open: `[start_period, end_period)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub id: SlotId,
    pub day_of_week: u8,
    pub start_period: u32,
    pub end_period: u32,
}

impl TimeSlot {
    pub fn new(id: SlotId, day_of_week: u8, start_period: u32, end_period: u32) -> Self {
        Self {
            id,
            day_of_week,
            start_period,
            end_period,
        }
    }

    /// Two slots overlap iff they share a day and their period ranges intersect.
    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.day_of_week == other.day_of_week
            && self.start_period < other.end_period
            && other.start_period < self.end_period
    }
}

/// Everything the solver reads, fetched once before search begins.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceSnapshot {
    pub teachers: Vec<Teacher>,
    pub subjects: Vec<Subject>,
    pub rooms: Vec<Room>,
    pub time_slots: Vec<TimeSlot>,
}

impl ReferenceSnapshot {
    pub fn slot_index(&self) -> SlotIndex {
        self.time_slots.iter().map(|s| (s.id, *s)).collect()
    }
}

/// One subject waiting for a (teacher, room, slot) triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleVariable {
    pub subject_id: SubjectId,
    pub code: String,
    pub weekly_hours: u32,
    pub required_specializations: Vec<String>,
}

impl From<&Subject> for ScheduleVariable {
    fn from(subject: &Subject) -> Self {
        Self {
            subject_id: subject.id,
            code: subject.code.clone(),
            weekly_hours: subject.weekly_hours,
            required_specializations: subject.required_specializations.clone(),
        }
    }
}

/// A candidate value for a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub teacher_id: TeacherId,
    pub room_id: RoomId,
    pub slot_id: SlotId,
}

impl Assignment {
    pub fn new(teacher_id: TeacherId, room_id: RoomId, slot_id: SlotId) -> Self {
        Self {
            teacher_id,
            room_id,
            slot_id,
        }
    }
}

/// A scheduled subject, as handed to the storage collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub subject_id: SubjectId,
    pub teacher_id: TeacherId,
    pub room_id: RoomId,
    pub slot_id: SlotId,
}

impl ScheduleEntry {
    pub fn assignment(&self) -> Assignment {
        Assignment::new(self.teacher_id, self.room_id, self.slot_id)
    }
}

impl fmt::Display for ScheduleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "subject {} -> teacher {}, room {}, slot {}",
            self.subject_id, self.teacher_id, self.room_id, self.slot_id
        )
    }
}

/// Converts an entry list back into the search's map form.
pub fn entries_to_assignment(entries: &[ScheduleEntry]) -> PartialAssignment {
    entries
        .iter()
        .map(|e| (e.subject_id, e.assignment()))
        .collect()
}

/// The final output of the solver.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolverResult {
    pub entries: Vec<ScheduleEntry>,
    /// `100 - soft_penalty`. Not clamped: a negative score means a poor schedule.
    pub score: f64,
    pub hard_violations: usize,
    pub soft_penalty: f64,
    pub is_partial: bool,
    /// Subjects left without an entry. Empty unless `is_partial`.
    pub unassigned: Vec<SubjectId>,
    pub duration: Duration,
}
