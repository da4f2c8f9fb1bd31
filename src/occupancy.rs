use crate::course::Course;
use crate::slot::TimeSlot;
use std::collections::BTreeMap;

/// Slot → ids of the selected courses holding it. Always rebuilt in full
/// from the course list; there is no incremental update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OccupancyIndex {
    slots: BTreeMap<TimeSlot, Vec<usize>>,
}

impl OccupancyIndex {
    pub fn build(courses: &[Course]) -> Self {
        let mut slots: BTreeMap<TimeSlot, Vec<usize>> = BTreeMap::new();
        for course in courses.iter().filter(|c| c.selected) {
            for slot in &course.slots {
                slots.entry(*slot).or_default().push(course.id);
            }
        }
        Self { slots }
    }

    pub fn courses_at(&self, slot: &TimeSlot) -> &[usize] {
        self.slots.get(slot).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_occupied(&self, slot: &TimeSlot) -> bool {
        self.slots.contains_key(slot)
    }

    pub fn contains(&self, slot: &TimeSlot, course_id: usize) -> bool {
        self.courses_at(slot).contains(&course_id)
    }

    pub fn occupied_slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TimeSlot, &[usize])> {
        self.slots.iter().map(|(slot, ids)| (slot, ids.as_slice()))
    }
}
