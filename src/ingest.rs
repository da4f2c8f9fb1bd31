//! Turns raw spreadsheet exports into the normalized course CSV the planner
//! loads: splits "CODE - NAME" cells, pulls rooms out of the schedule text
//! and converts weekday/time ranges into slot codes.

use crate::persistence::PersistenceResult;
use crate::slot::{Period, TimeSlot, format_slots};
use chrono::NaiveTime;
use regex::Regex;
use std::collections::{BTreeSet, HashSet};
use std::fs::File;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, info};

static CODE_NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z]{2,}\d{3,})\s*-\s*(.+)").unwrap());
static CODE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Z]{2,}\d{3,}").unwrap());
static ROOM_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(([^)]+)\)").unwrap());
static PARENS_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\([^)]*\)").unwrap());
static SLASH_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+/\s+").unwrap());
static WHITESPACE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static DAY_RANGE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(seg|ter|qua|qui|sex|sab)\.\s*(\d{2}:\d{2})-(\d{2}:\d{2})").unwrap()
});

pub const FORMATTED_HEADER: [&str; 7] = [
    "Órgão ofertante",
    "Turma",
    "Código",
    "Disciplina",
    "Docente",
    "Horário",
    "Sala/Lab",
];

/// Reference teaching slots: (start, end, period, hour index).
/// Evening slots are 50 minutes back to back, unlike the hourly day slots.
const REFERENCE_SLOTS: [((u32, u32), (u32, u32), Period, u8); 18] = [
    ((6, 0), (6, 50), Period::Morning, 1),
    ((7, 0), (7, 50), Period::Morning, 2),
    ((8, 0), (8, 50), Period::Morning, 3),
    ((9, 0), (9, 50), Period::Morning, 4),
    ((10, 0), (10, 50), Period::Morning, 5),
    ((11, 0), (11, 50), Period::Morning, 6),
    ((12, 0), (12, 50), Period::Afternoon, 1),
    ((13, 0), (13, 50), Period::Afternoon, 2),
    ((14, 0), (14, 50), Period::Afternoon, 3),
    ((15, 0), (15, 50), Period::Afternoon, 4),
    ((16, 0), (16, 50), Period::Afternoon, 5),
    ((17, 0), (17, 50), Period::Afternoon, 6),
    ((18, 0), (18, 50), Period::Evening, 1),
    ((18, 50), (19, 40), Period::Evening, 2),
    ((19, 40), (20, 30), Period::Evening, 3),
    ((20, 30), (21, 20), Period::Evening, 4),
    ((21, 20), (22, 10), Period::Evening, 5),
    ((22, 10), (23, 0), Period::Evening, 6),
];

fn day_code(abbreviation: &str) -> Option<u8> {
    match abbreviation {
        "seg" => Some(2),
        "ter" => Some(3),
        "qua" => Some(4),
        "qui" => Some(5),
        "sex" => Some(6),
        "sab" => Some(7),
        _ => None,
    }
}

fn time_of(hm: (u32, u32)) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(hm.0, hm.1, 0)
}

/// Lowercases and strips diacritics; other non-ASCII characters are dropped.
pub fn normalize_text(text: &str) -> String {
    text.chars()
        .filter_map(|c| {
            let folded = match c {
                'á' | 'à' | 'â' | 'ã' | 'ä' | 'Á' | 'À' | 'Â' | 'Ã' | 'Ä' => 'a',
                'é' | 'è' | 'ê' | 'ë' | 'É' | 'È' | 'Ê' | 'Ë' => 'e',
                'í' | 'ì' | 'î' | 'ï' | 'Í' | 'Ì' | 'Î' | 'Ï' => 'i',
                'ó' | 'ò' | 'ô' | 'õ' | 'ö' | 'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' => 'o',
                'ú' | 'ù' | 'û' | 'ü' | 'Ú' | 'Ù' | 'Û' | 'Ü' => 'u',
                'ç' | 'Ç' => 'c',
                'ñ' | 'Ñ' => 'n',
                c if c.is_ascii() => c.to_ascii_lowercase(),
                _ => return None,
            };
            Some(folded)
        })
        .collect()
}

/// Converts free text such as `"seg. 08:00-09:50 / qua. 08:00-09:50"` into
/// slot codes (`"2M345 4M345"`).
///
/// A range claims a reference slot when the slot's start or its end lies
/// inside the range, both bounds inclusive. Segments that do not parse are
/// skipped.
pub fn schedule_text_to_code(raw: &str) -> String {
    let mut slots: BTreeSet<TimeSlot> = BTreeSet::new();

    for part in raw.split('/').map(str::trim) {
        let normalized = normalize_text(part);
        let Some(caps) = DAY_RANGE_REGEX.captures(&normalized) else {
            continue;
        };
        let Some(day) = day_code(&caps[1]) else {
            continue;
        };
        let (Ok(start), Ok(end)) = (
            NaiveTime::parse_from_str(&caps[2], "%H:%M"),
            NaiveTime::parse_from_str(&caps[3], "%H:%M"),
        ) else {
            debug!(segment = part, "skipping schedule segment with invalid time");
            continue;
        };

        for (slot_start, slot_end, period, hour) in REFERENCE_SLOTS {
            let (Some(slot_start), Some(slot_end)) = (time_of(slot_start), time_of(slot_end))
            else {
                continue;
            };
            let start_inside = slot_start >= start && slot_start <= end;
            let end_inside = slot_end >= start && slot_end <= end;
            if start_inside || end_inside {
                if let Ok(slot) = TimeSlot::new(day, period, hour) {
                    slots.insert(slot);
                }
            }
        }
    }

    format_slots(&slots)
}

/// Splits `"CIN0130 - SISTEMAS DIGITAIS"` into code and name. Falls back to
/// a leading code token separated by whitespace; otherwise the whole text is
/// the name.
pub fn split_code_and_name(text: &str) -> (String, String) {
    if let Some(caps) = CODE_NAME_REGEX.captures(text) {
        return (caps[1].to_string(), caps[2].to_string());
    }
    let mut parts = text.trim_start().splitn(2, char::is_whitespace);
    if let (Some(first), Some(rest)) = (parts.next(), parts.next()) {
        let rest = rest.trim_start();
        if !rest.is_empty() && CODE_REGEX.is_match(first) {
            return (first.to_string(), rest.to_string());
        }
    }
    (String::new(), text.to_string())
}

/// Removes parenthesized rooms from a schedule cell. Returns the cleaned
/// schedule and the distinct rooms in order of appearance, space-joined.
pub fn split_schedule_and_room(cell: &str) -> (String, String) {
    let mut seen = HashSet::new();
    let rooms: Vec<&str> = ROOM_REGEX
        .captures_iter(cell)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .filter(|room| seen.insert(*room))
        .collect();

    let cleaned = PARENS_REGEX.replace_all(cell, "");
    let cleaned = SLASH_REGEX.replace_all(&cleaned, " / ");
    let cleaned = cleaned.replace("  ", " ").trim().to_string();
    (cleaned, rooms.join(" "))
}

pub fn clean_instructor(name: &str) -> String {
    WHITESPACE_REGEX.replace_all(name, " ").trim().to_string()
}

/// Normalizes one raw row: organization, section, "CODE - NAME",
/// instructor, schedule with rooms. Short rows are padded.
pub fn format_row(row: &[String]) -> [String; 7] {
    let field = |idx: usize| row.get(idx).cloned().unwrap_or_default();
    let (code, name) = split_code_and_name(&field(2));
    let (schedule, room) = split_schedule_and_room(&field(4));
    [
        field(0),
        field(1),
        code,
        name,
        clean_instructor(&field(3)),
        schedule_text_to_code(&schedule),
        room,
    ]
}

/// Formats merged raw rows (first row is a header) into the planner's CSV
/// layout. Section banners, repeated headers and rows without a code or a
/// name are dropped.
pub fn format_rows(merged: &[Vec<String>]) -> Vec<Vec<String>> {
    let mut out = vec![FORMATTED_HEADER.iter().map(|h| h.to_string()).collect()];
    for row in merged.iter().skip(1) {
        let Some(first) = row.first() else {
            continue;
        };
        if first.starts_with("Período:") || first.starts_with("Órgão ofertante") {
            continue;
        }
        let formatted = format_row(row);
        if !formatted[2].is_empty() && !formatted[3].is_empty() {
            out.push(formatted.to_vec());
        }
    }
    out
}

/// Merges several sheet exports, keeping the header of the first non-empty one.
pub fn merge_csv_texts<S: AsRef<str>>(texts: &[S]) -> PersistenceResult<Vec<Vec<String>>> {
    let mut merged = Vec::new();
    let mut have_header = false;
    for text in texts {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_ref().as_bytes());
        let mut rows = Vec::new();
        for record in reader.records() {
            rows.push(record?.iter().map(ToOwned::to_owned).collect::<Vec<String>>());
        }
        let mut rows = rows.into_iter();
        let Some(header) = rows.next() else {
            continue;
        };
        if !have_header {
            merged.push(header);
            have_header = true;
        }
        merged.extend(rows);
    }
    Ok(merged)
}

/// Reads a raw export at `input`, formats it and writes the planner CSV to
/// `output`. Returns the number of course rows written.
pub fn format_raw_csv<P: AsRef<Path>, Q: AsRef<Path>>(input: P, output: Q) -> PersistenceResult<usize> {
    let raw = std::fs::read_to_string(input.as_ref())?;
    let merged = merge_csv_texts(&[raw])?;
    let formatted = format_rows(&merged);

    let file = File::create(output.as_ref())?;
    let mut writer = csv::Writer::from_writer(file);
    for row in &formatted {
        writer.write_record(row)?;
    }
    writer.flush()?;

    let written = formatted.len().saturating_sub(1);
    info!(
        input = %input.as_ref().display(),
        output = %output.as_ref().display(),
        rows = written,
        "formatted raw course export"
    );
    Ok(written)
}
