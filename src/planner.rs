use crate::conflict::ConflictReport;
use crate::course::Course;
use crate::occupancy::OccupancyIndex;
use crate::persistence::{self, PersistenceError, SelectionStore};
use crate::slot::{self, SlotCodeError};
use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const FUZZY_RESULT_LIMIT: usize = 10;
pub const FUZZY_SCORE_THRESHOLD: f64 = 0.3;

#[derive(Debug)]
pub enum PlannerError {
    SourceNotFound(PathBuf),
    Persistence(PersistenceError),
    UnknownCourse(usize),
    AlreadySelected { name: String },
    NotSelected { name: String },
    Conflicts(ConflictReport),
    InvalidTimeCode(SlotCodeError),
}

impl fmt::Display for PlannerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlannerError::SourceNotFound(path) => {
                write!(f, "course data file not found: {}", path.display())
            }
            PlannerError::Persistence(err) => write!(f, "{err}"),
            PlannerError::UnknownCourse(id) => write!(f, "no course with id {id}"),
            PlannerError::AlreadySelected { name } => {
                write!(f, "course '{name}' is already in the schedule")
            }
            PlannerError::NotSelected { name } => {
                write!(f, "course '{name}' is not in the schedule")
            }
            PlannerError::Conflicts(report) => write!(
                f,
                "cannot add course: it conflicts with {} selected course(s)",
                report.len()
            ),
            PlannerError::InvalidTimeCode(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for PlannerError {}

impl From<PersistenceError> for PlannerError {
    fn from(value: PersistenceError) -> Self {
        Self::Persistence(value)
    }
}

impl From<SlotCodeError> for PlannerError {
    fn from(value: SlotCodeError) -> Self {
        Self::InvalidTimeCode(value)
    }
}

/// A course matched by name search together with its relevance score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit<'a> {
    pub course: &'a Course,
    pub score: f64,
}

/// Word-overlap similarity between a query and a course name.
///
/// Every (query word, name word) pair where one contains the other adds the
/// ratio of the shorter length to the longer one; the sum is divided by the
/// number of query words. An empty query scores zero.
pub fn fuzzy_score(query: &str, name: &str) -> f64 {
    let query = query.to_uppercase();
    let name = name.to_uppercase();
    let query_words: Vec<&str> = query.split_whitespace().collect();
    if query_words.is_empty() {
        return 0.0;
    }
    let name_words: Vec<&str> = name.split_whitespace().collect();

    let mut total = 0.0;
    for q in &query_words {
        for n in &name_words {
            if n.contains(q) || q.contains(n) {
                let (q_len, n_len) = (q.chars().count(), n.chars().count());
                total += q_len.min(n_len) as f64 / q_len.max(n_len) as f64;
            }
        }
    }
    total / query_words.len() as f64
}

/// Owns every loaded course, the derived occupancy and the selection store.
pub struct Planner {
    courses: Vec<Course>,
    occupancy: OccupancyIndex,
    store: Box<dyn SelectionStore>,
}

impl Planner {
    /// Builds a planner over already-constructed courses. Course ids are
    /// reassigned to their positions. Selection flags on the input are kept.
    pub fn from_courses(mut courses: Vec<Course>, store: Box<dyn SelectionStore>) -> Self {
        for (idx, course) in courses.iter_mut().enumerate() {
            course.id = idx;
        }
        let mut planner = Self {
            courses,
            occupancy: OccupancyIndex::default(),
            store,
        };
        planner.recompute_availability();
        planner
    }

    /// Loads courses from the CSV at `source`, then applies the persisted
    /// selection by course name. A missing source is an error; a missing or
    /// unreadable selection only produces a warning and an empty selection.
    pub fn load<P: AsRef<Path>>(
        source: P,
        store: Box<dyn SelectionStore>,
    ) -> Result<Self, PlannerError> {
        let source = source.as_ref();
        if !source.exists() {
            return Err(PlannerError::SourceNotFound(source.to_path_buf()));
        }
        let rows = persistence::load_course_rows(source)?;
        let courses: Vec<Course> = rows
            .iter()
            .enumerate()
            .map(|(idx, row)| Course::from_row(idx, row))
            .collect();
        info!(path = %source.display(), count = courses.len(), "loaded courses");

        let mut planner = Self::from_courses(courses, store);
        planner.apply_persisted_selection();
        Ok(planner)
    }

    fn apply_persisted_selection(&mut self) {
        let names = match self.store.load_selection_names() {
            Ok(names) => names,
            Err(err) => {
                warn!(error = %err, "could not load saved selections; starting with none");
                return;
            }
        };
        let mut matched = 0;
        for course in self.courses.iter_mut() {
            if names.contains(&course.name) {
                course.selected = true;
                matched += 1;
            }
        }
        info!(saved = names.len(), matched, "applied saved selections");
        self.recompute_availability();
    }

    /// Rebuilds the occupancy index from the selected courses and refreshes
    /// every course's `available` flag against it.
    pub fn recompute_availability(&mut self) -> &OccupancyIndex {
        self.occupancy = OccupancyIndex::build(&self.courses);
        for course in self.courses.iter_mut() {
            course.available =
                course.selected || !course.slots.iter().any(|s| self.occupancy.is_occupied(s));
        }
        debug!(
            occupied_slots = self.occupancy.occupied_slot_count(),
            "recomputed availability"
        );
        &self.occupancy
    }

    pub fn occupancy(&self) -> &OccupancyIndex {
        &self.occupancy
    }

    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    pub fn course(&self, id: usize) -> Option<&Course> {
        self.courses.get(id)
    }

    fn course_or_err(&self, id: usize) -> Result<&Course, PlannerError> {
        self.courses.get(id).ok_or(PlannerError::UnknownCourse(id))
    }

    /// Selected courses sharing a slot with `candidate`, excluding courses
    /// with the candidate's own code.
    pub fn conflicts_for(&self, candidate: &Course, occupancy: &OccupancyIndex) -> ConflictReport {
        let mut report = ConflictReport::new(candidate.id);
        for slot in &candidate.slots {
            for &other_id in occupancy.courses_at(slot) {
                let Some(other) = self.courses.get(other_id) else {
                    continue;
                };
                if !other.same_offering(candidate) {
                    report.record(other_id, *slot);
                }
            }
        }
        report
    }

    /// Selects a course. Fails without side effects when it is already
    /// selected or overlaps any selected course of a different code.
    pub fn add_course(&mut self, id: usize) -> Result<(), PlannerError> {
        let candidate = self.course_or_err(id)?;
        if candidate.selected {
            return Err(PlannerError::AlreadySelected {
                name: candidate.name.clone(),
            });
        }

        let report = self.conflicts_for(candidate, &self.occupancy);
        if !report.is_empty() {
            debug!(course = %candidate.code, conflicts = report.len(), "add refused");
            return Err(PlannerError::Conflicts(report));
        }

        self.courses[id].selected = true;
        self.recompute_availability();
        self.persist_selection();
        info!(course = %self.courses[id].code, section = %self.courses[id].section, "course added");
        Ok(())
    }

    pub fn remove_course(&mut self, id: usize) -> Result<(), PlannerError> {
        let course = self.course_or_err(id)?;
        if !course.selected {
            return Err(PlannerError::NotSelected {
                name: course.name.clone(),
            });
        }

        self.courses[id].selected = false;
        self.recompute_availability();
        self.persist_selection();
        info!(course = %self.courses[id].code, section = %self.courses[id].section, "course removed");
        Ok(())
    }

    pub fn selected_names(&self) -> Vec<String> {
        self.selected_courses()
            .into_iter()
            .map(|c| c.name.clone())
            .collect()
    }

    /// Writes the selection out. A failed write is logged and the in-memory
    /// selection stays as it is.
    fn persist_selection(&self) {
        let names = self.selected_names();
        if let Err(err) = self.store.save_selection_names(&names) {
            warn!(error = %err, "could not save selections");
        }
    }

    pub fn find_by_code(&self, code: &str) -> Vec<&Course> {
        self.courses.iter().filter(|c| c.has_code(code)).collect()
    }

    /// Top matches by [`fuzzy_score`], best first. Equal scores keep source
    /// order.
    pub fn fuzzy_search(&self, query: &str) -> Vec<SearchHit<'_>> {
        let mut hits: Vec<SearchHit<'_>> = self
            .courses
            .iter()
            .map(|course| SearchHit {
                course,
                score: fuzzy_score(query, &course.name),
            })
            .filter(|hit| hit.score > FUZZY_SCORE_THRESHOLD)
            .collect();
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        hits.truncate(FUZZY_RESULT_LIMIT);
        hits
    }

    /// Courses whose classes on the token's day all fall inside the token's
    /// slots. Courses without classes that day are left out.
    pub fn find_by_time_code(&self, token: &str) -> Result<Vec<&Course>, PlannerError> {
        let group = slot::parse_slot_group(token)?;
        Ok(self
            .courses
            .iter()
            .filter(|course| {
                let day_slots = course.slots_on_day(group.day);
                !day_slots.is_empty() && day_slots.is_subset(&group.slots)
            })
            .collect())
    }

    /// All courses ordered by name, ignoring case.
    pub fn courses_by_name(&self) -> Vec<&Course> {
        let mut courses: Vec<&Course> = self.courses.iter().collect();
        courses.sort_by_key(|c| c.name.to_lowercase());
        courses
    }

    pub fn selected_courses(&self) -> Vec<&Course> {
        self.courses.iter().filter(|c| c.selected).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::PersistenceResult;
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct MemoryStore {
        saved: Rc<RefCell<Vec<Vec<String>>>>,
        fail_saves: bool,
    }

    impl SelectionStore for MemoryStore {
        fn load_selection_names(&self) -> PersistenceResult<HashSet<String>> {
            Ok(self
                .saved
                .borrow()
                .last()
                .cloned()
                .unwrap_or_default()
                .into_iter()
                .collect())
        }

        fn save_selection_names(&self, names: &[String]) -> PersistenceResult<()> {
            if self.fail_saves {
                return Err(PersistenceError::Store("disk full".into()));
            }
            self.saved.borrow_mut().push(names.to_vec());
            Ok(())
        }
    }

    fn planner(courses: Vec<Course>) -> (Planner, MemoryStore) {
        let store = MemoryStore::default();
        (Planner::from_courses(courses, Box::new(store.clone())), store)
    }

    #[test]
    fn fuzzy_score_matches_substrings_in_both_directions() {
        assert_eq!(fuzzy_score("sistemas", "SISTEMAS DIGITAIS"), 1.0);
        assert_eq!(fuzzy_score("SIST", "SISTEMAS"), 0.5);
        assert_eq!(fuzzy_score("SISTEMAS", "SIST"), 0.5);
        assert_eq!(fuzzy_score("", "SISTEMAS"), 0.0);
        assert_eq!(fuzzy_score("redes calculo", "REDES"), 0.5);
    }

    #[test]
    fn add_course_persists_and_marks_overlaps_unavailable() {
        let (mut planner, store) = planner(vec![
            Course::new(0, "CIN0130", "SISTEMAS DIGITAIS", "2M12"),
            Course::new(0, "CIN0131", "ALGORITMOS", "2M23"),
        ]);
        planner.add_course(0).unwrap();

        assert!(planner.courses()[0].selected);
        assert!(planner.courses()[0].available);
        assert!(!planner.courses()[1].available);
        assert_eq!(
            store.saved.borrow().last().unwrap(),
            &vec!["SISTEMAS DIGITAIS".to_string()]
        );
    }

    #[test]
    fn failed_save_keeps_in_memory_selection() {
        let store = MemoryStore {
            fail_saves: true,
            ..MemoryStore::default()
        };
        let mut planner = Planner::from_courses(
            vec![Course::new(0, "CIN0130", "SISTEMAS DIGITAIS", "2M12")],
            Box::new(store),
        );
        planner.add_course(0).unwrap();
        assert!(planner.courses()[0].selected);
    }

    #[test]
    fn unknown_course_id_is_rejected() {
        let (mut planner, _) = planner(vec![]);
        assert!(matches!(planner.add_course(3), Err(PlannerError::UnknownCourse(3))));
        assert!(matches!(planner.remove_course(0), Err(PlannerError::UnknownCourse(0))));
    }

    #[test]
    fn same_code_sections_do_not_conflict() {
        let (mut planner, _) = planner(vec![
            Course::new(0, "CIN0130", "SISTEMAS DIGITAIS", "2M12").with_section("A"),
            Course::new(0, "cin0130", "SISTEMAS DIGITAIS", "2M12").with_section("B"),
        ]);
        planner.add_course(0).unwrap();
        let report = planner.conflicts_for(&planner.courses()[1], planner.occupancy());
        assert!(report.is_empty());
        planner.add_course(1).unwrap();
    }

    #[test]
    fn remove_course_frees_slots() {
        let (mut planner, store) = planner(vec![
            Course::new(0, "A1", "ALPHA", "3T12"),
            Course::new(0, "B1", "BETA", "3T2"),
        ]);
        planner.add_course(0).unwrap();
        assert!(!planner.courses()[1].available);

        planner.remove_course(0).unwrap();
        assert!(planner.courses()[1].available);
        assert!(planner.occupancy().is_empty());
        assert!(store.saved.borrow().last().unwrap().is_empty());
        assert!(matches!(
            planner.remove_course(0),
            Err(PlannerError::NotSelected { .. })
        ));
    }

    #[test]
    fn courses_by_name_ignores_case() {
        let (planner, _) = planner(vec![
            Course::new(0, "C", "cálculo", ""),
            Course::new(0, "A", "Algoritmos", ""),
            Course::new(0, "B", "BANCO DE DADOS", ""),
        ]);
        let names: Vec<_> = planner.courses_by_name().iter().map(|c| c.code.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn fuzzy_search_keeps_source_order_for_ties() {
        let (planner, _) = planner(vec![
            Course::new(0, "X1", "REDES", ""),
            Course::new(0, "X2", "REDES NEURAIS", ""),
            Course::new(0, "X3", "REDES", ""),
            Course::new(0, "X4", "COMPILADORES", ""),
        ]);
        let hits = planner.fuzzy_search("redes");
        let codes: Vec<_> = hits.iter().map(|h| h.course.code.as_str()).collect();
        assert_eq!(codes, vec!["X1", "X2", "X3"]);
    }
}
