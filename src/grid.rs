use crate::course::Course;
use crate::slot::{self, FIRST_DAY, LAST_DAY};

pub const FIRST_HOUR: u8 = 6;
pub const LAST_HOUR: u8 = 23;
pub const EMPTY_CELL: &str = "-";

/// Evening slots start on 50-minute boundaries; their rows carry the real
/// start time while the row key stays the regularized hour.
const EVENING_LABELS: [(u8, &str); 6] = [
    (18, "18:00"),
    (19, "18:50"),
    (20, "19:40"),
    (21, "20:30"),
    (22, "21:20"),
    (23, "22:10"),
];

fn row_label(hour: u8) -> String {
    EVENING_LABELS
        .iter()
        .find(|(h, _)| *h == hour)
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| format!("{hour:02}:00"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridRow {
    pub hour: u8,
    pub label: String,
    /// One entry per day column; each holds the codes placed in that cell.
    pub cells: Vec<Vec<String>>,
}

/// Weekly day × hour view of the selected courses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleGrid {
    pub days: Vec<u8>,
    pub rows: Vec<GridRow>,
}

impl ScheduleGrid {
    /// Places every slot of every selected course. Two courses in the same
    /// cell are both kept, in course order.
    pub fn build<'a, I>(courses: I) -> Self
    where
        I: IntoIterator<Item = &'a Course>,
    {
        let days: Vec<u8> = (FIRST_DAY..=LAST_DAY).collect();
        let mut rows: Vec<GridRow> = (FIRST_HOUR..=LAST_HOUR)
            .map(|hour| GridRow {
                hour,
                label: row_label(hour),
                cells: vec![Vec::new(); days.len()],
            })
            .collect();

        for course in courses.into_iter().filter(|c| c.selected) {
            for slot in &course.slots {
                let row = (slot.display_hour() - FIRST_HOUR) as usize;
                let col = (slot.day() - FIRST_DAY) as usize;
                if let Some(cell) = rows.get_mut(row).and_then(|r| r.cells.get_mut(col)) {
                    cell.push(course.code.clone());
                }
            }
        }

        Self { days, rows }
    }

    pub fn header(&self) -> Vec<String> {
        let mut header = vec!["Hora".to_string()];
        header.extend(
            self.days
                .iter()
                .map(|d| slot::day_name(*d).unwrap_or("?").to_string()),
        );
        header
    }

    pub fn cell(&self, day: u8, hour: u8) -> Option<&[String]> {
        let col = self.days.iter().position(|d| *d == day)?;
        self.rows
            .iter()
            .find(|r| r.hour == hour)
            .and_then(|r| r.cells.get(col))
            .map(Vec::as_slice)
    }

    /// Display text for each row: the time label followed by one cell per
    /// day, comma-joined, or `-` when empty.
    pub fn text_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                let mut out = Vec::with_capacity(row.cells.len() + 1);
                out.push(row.label.clone());
                out.extend(row.cells.iter().map(|cell| {
                    if cell.is_empty() {
                        EMPTY_CELL.to_string()
                    } else {
                        cell.join(", ")
                    }
                }));
                out
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rows
            .iter()
            .all(|r| r.cells.iter().all(|c| c.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selected(id: usize, code: &str, schedule: &str) -> Course {
        let mut course = Course::new(id, code, code, schedule);
        course.selected = true;
        course
    }

    #[test]
    fn grid_covers_six_to_twenty_three_with_evening_labels() {
        let grid = ScheduleGrid::build(std::iter::empty());
        assert_eq!(grid.rows.len(), 18);
        let labels: Vec<_> = grid.rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels[0], "06:00");
        assert_eq!(labels[11], "17:00");
        assert_eq!(
            &labels[12..],
            &["18:00", "18:50", "19:40", "20:30", "21:20", "22:10"]
        );
        assert_eq!(grid.header().len(), 7);
        assert_eq!(grid.header()[6], "Sábado");
        assert!(grid.is_empty());
    }

    #[test]
    fn slots_map_to_regularized_hours() {
        let courses = vec![selected(0, "CIN0130", "2M1 3T6 7N6")];
        let grid = ScheduleGrid::build(&courses);
        assert_eq!(grid.cell(2, 6).unwrap(), &["CIN0130".to_string()]);
        assert_eq!(grid.cell(3, 17).unwrap(), &["CIN0130".to_string()]);
        assert_eq!(grid.cell(7, 23).unwrap(), &["CIN0130".to_string()]);
        assert!(grid.cell(4, 6).unwrap().is_empty());
    }

    #[test]
    fn colliding_courses_share_a_cell() {
        let courses = vec![
            selected(0, "CIN0130", "2M1"),
            selected(1, "CIN0131", "2M1"),
            Course::new(2, "CIN0132", "X", "2M1"),
        ];
        let grid = ScheduleGrid::build(&courses);
        let text = grid.text_rows();
        assert_eq!(text[0][0], "06:00");
        assert_eq!(text[0][1], "CIN0130, CIN0131");
        assert_eq!(text[0][2], "-");
    }
}
