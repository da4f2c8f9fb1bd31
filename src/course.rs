use crate::slot::{self, TimeSlot};
use std::collections::{BTreeSet, HashMap};

pub const COLUMN_ORGANIZATION: &str = "órgão ofertante";
pub const COLUMN_PERIOD: &str = "período";
pub const COLUMN_SECTION: &str = "turma";
pub const COLUMN_CODE: &str = "código";
pub const COLUMN_NAME: &str = "disciplina";
pub const COLUMN_INSTRUCTOR: &str = "docente";
pub const COLUMN_SCHEDULE: &str = "horário";
pub const COLUMN_ROOM: &str = "sala/lab";

/// Selection status shown next to a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourseStatus {
    Selected,
    Available,
    Unavailable,
}

impl CourseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CourseStatus::Selected => "Selecionada",
            CourseStatus::Available => "Disponível",
            CourseStatus::Unavailable => "Indisponível",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Course {
    /// Position of the course in the source data; stable for a given load.
    pub id: usize,
    pub organization: String,
    pub period: String,
    pub section: String,
    pub code: String,
    pub name: String,
    pub instructor: String,
    pub schedule: String,
    pub room: String,
    pub slots: BTreeSet<TimeSlot>,
    pub selected: bool,
    pub available: bool,
}

impl Course {
    pub fn new(id: usize, code: impl Into<String>, name: impl Into<String>, schedule: &str) -> Self {
        Self {
            id,
            organization: String::new(),
            period: String::new(),
            section: String::new(),
            code: code.into(),
            name: name.into(),
            instructor: String::new(),
            schedule: schedule.to_string(),
            room: String::new(),
            slots: slot::parse_slots(schedule),
            selected: false,
            available: true,
        }
    }

    /// Builds a course from a source row whose keys were already lowercased
    /// and trimmed. Missing columns become empty strings.
    pub fn from_row(id: usize, row: &HashMap<String, String>) -> Self {
        let field = |key: &str| row.get(key).cloned().unwrap_or_default();
        let schedule = field(COLUMN_SCHEDULE);
        Self {
            id,
            organization: field(COLUMN_ORGANIZATION),
            period: field(COLUMN_PERIOD),
            section: field(COLUMN_SECTION),
            code: field(COLUMN_CODE),
            name: field(COLUMN_NAME),
            instructor: field(COLUMN_INSTRUCTOR),
            slots: slot::parse_slots(&schedule),
            schedule,
            room: field(COLUMN_ROOM),
            selected: false,
            available: true,
        }
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = section.into();
        self
    }

    /// Sections of one offering share a code, compared case-insensitively.
    pub fn same_offering(&self, other: &Course) -> bool {
        self.code.to_lowercase() == other.code.to_lowercase()
    }

    pub fn has_code(&self, code: &str) -> bool {
        self.code.to_lowercase() == code.trim().to_lowercase()
    }

    pub fn slots_on_day(&self, day: u8) -> BTreeSet<TimeSlot> {
        self.slots.iter().filter(|s| s.day() == day).copied().collect()
    }

    pub fn status(&self) -> CourseStatus {
        if self.selected {
            CourseStatus::Selected
        } else if self.available {
            CourseStatus::Available
        } else {
            CourseStatus::Unavailable
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_row_reads_normalized_columns_and_parses_slots() {
        let row: HashMap<String, String> = [
            ("órgão ofertante", "CIn"),
            ("turma", "A"),
            ("código", "CIN0130"),
            ("disciplina", "SISTEMAS DIGITAIS"),
            ("docente", "Fulano"),
            ("horário", "2M12 4M12"),
            ("sala/lab", "E112"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let course = Course::from_row(3, &row);
        assert_eq!(course.id, 3);
        assert_eq!(course.code, "CIN0130");
        assert_eq!(course.section, "A");
        assert_eq!(course.room, "E112");
        assert_eq!(course.period, "");
        assert_eq!(course.slots.len(), 4);
        assert!(!course.selected);
        assert!(course.available);
        assert_eq!(course.status(), CourseStatus::Available);
    }

    #[test]
    fn same_offering_ignores_case() {
        let a = Course::new(0, "cin0130", "A", "2M1");
        let b = Course::new(1, "CIN0130", "A", "3M1").with_section("B");
        let c = Course::new(2, "CIN0131", "A", "2M1");
        assert!(a.same_offering(&b));
        assert!(!a.same_offering(&c));
        assert!(a.has_code(" CIN0130 "));
    }

    #[test]
    fn slots_on_day_filters_other_days() {
        let course = Course::new(0, "X", "X", "2M12 3T1");
        assert_eq!(course.slots_on_day(2).len(), 2);
        assert_eq!(course.slots_on_day(3).len(), 1);
        assert!(course.slots_on_day(5).is_empty());
    }
}
