pub mod config;
pub mod conflict;
pub mod course;
pub mod grid;
pub mod ingest;
pub mod occupancy;
pub mod persistence;
pub mod planner;
pub mod slot;

pub use config::{PlannerConfig, StoreKind};
pub use conflict::{Conflict, ConflictReport};
pub use course::{Course, CourseStatus};
pub use grid::ScheduleGrid;
pub use occupancy::OccupancyIndex;
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqliteSelectionStore;
pub use persistence::{
    JsonSelectionStore, PersistenceError, PersistenceResult, SelectionStore, load_course_rows,
};
pub use planner::{Planner, PlannerError, SearchHit, fuzzy_score};
pub use slot::{Period, SlotCodeError, SlotGroup, TimeSlot, parse_slot_group, parse_slots};
