use crate::course::Course;
use crate::slot::TimeSlot;
use std::collections::BTreeSet;

/// One selected course overlapping the candidate, with the shared slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub course_id: usize,
    pub slots: BTreeSet<TimeSlot>,
}

impl Conflict {
    pub fn slot_labels(&self) -> Vec<String> {
        self.slots.iter().map(TimeSlot::label).collect()
    }
}

/// Conflicts of a candidate course against the current selection, in the
/// order the conflicting courses were first encountered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictReport {
    pub candidate_id: usize,
    pub conflicts: Vec<Conflict>,
}

impl ConflictReport {
    pub fn new(candidate_id: usize) -> Self {
        Self {
            candidate_id,
            conflicts: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conflicts.len()
    }

    pub(crate) fn record(&mut self, course_id: usize, slot: TimeSlot) {
        match self.conflicts.iter_mut().find(|c| c.course_id == course_id) {
            Some(conflict) => {
                conflict.slots.insert(slot);
            }
            None => self.conflicts.push(Conflict {
                course_id,
                slots: BTreeSet::from([slot]),
            }),
        }
    }

    pub fn slots_with(&self, course_id: usize) -> Option<&BTreeSet<TimeSlot>> {
        self.conflicts
            .iter()
            .find(|c| c.course_id == course_id)
            .map(|c| &c.slots)
    }

    /// Renders the report as user-facing lines, resolving course ids
    /// against `courses` (indexed by id).
    pub fn describe(&self, courses: &[Course]) -> Vec<String> {
        let mut lines = Vec::with_capacity(1 + self.conflicts.len() * 2);
        if let Some(candidate) = courses.get(self.candidate_id) {
            lines.push(format!(
                "Conflicts detected for '{}' ({}) - Section {}:",
                candidate.name, candidate.code, candidate.section
            ));
        }
        for conflict in &self.conflicts {
            let Some(other) = courses.get(conflict.course_id) else {
                continue;
            };
            lines.push(format!(
                "  -> Conflicts with '{}' ({}) - Section {}",
                other.name, other.code, other.section
            ));
            lines.push(format!(
                "     Overlapping times: {}",
                conflict.slot_labels().join(", ")
            ));
        }
        lines
    }
}
