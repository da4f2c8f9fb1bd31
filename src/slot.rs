use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Any `<day><period><hours>` group found anywhere in a schedule string.
static SLOT_GROUP_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([2-7])([MTN])(\d+)").unwrap());

/// A single group anchored at the start of a search token, e.g. `2M123`.
static SEARCH_TOKEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([2-7])([MTN])([1-6]+)").unwrap());

pub const FIRST_DAY: u8 = 2;
pub const LAST_DAY: u8 = 7;
pub const HOURS_PER_PERIOD: u8 = 6;

/// Coarse time-of-day bucket a slot belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Period {
    Morning,
    Afternoon,
    Evening,
}

impl Period {
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'M' => Some(Period::Morning),
            'T' => Some(Period::Afternoon),
            'N' => Some(Period::Evening),
            _ => None,
        }
    }

    pub fn letter(self) -> char {
        match self {
            Period::Morning => 'M',
            Period::Afternoon => 'T',
            Period::Evening => 'N',
        }
    }

    /// Clock hour of the first slot in this period.
    pub fn base_hour(self) -> u8 {
        match self {
            Period::Morning => 6,
            Period::Afternoon => 12,
            Period::Evening => 18,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Period::Morning => "Manhã",
            Period::Afternoon => "Tarde",
            Period::Evening => "Noite",
        }
    }
}

/// Display name for a day code (2 = Monday ... 7 = Saturday).
pub fn day_name(day: u8) -> Option<&'static str> {
    match day {
        2 => Some("Segunda"),
        3 => Some("Terça"),
        4 => Some("Quarta"),
        5 => Some("Quinta"),
        6 => Some("Sexta"),
        7 => Some("Sábado"),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotCodeError {
    InvalidFormat(String),
    OutOfRange { day: u8, hour_index: u8 },
}

impl fmt::Display for SlotCodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotCodeError::InvalidFormat(token) => write!(
                f,
                "invalid time code '{token}': use day[2-7] period[M/T/N] hours[1-6], e.g. 2M123"
            ),
            SlotCodeError::OutOfRange { day, hour_index } => write!(
                f,
                "time slot out of range (day {day}, hour index {hour_index})"
            ),
        }
    }
}

impl std::error::Error for SlotCodeError {}

/// One discrete 50-minute teaching slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeSlot {
    day: u8,
    period: Period,
    hour_index: u8,
}

impl TimeSlot {
    pub fn new(day: u8, period: Period, hour_index: u8) -> Result<Self, SlotCodeError> {
        if !(FIRST_DAY..=LAST_DAY).contains(&day) || !(1..=HOURS_PER_PERIOD).contains(&hour_index)
        {
            return Err(SlotCodeError::OutOfRange { day, hour_index });
        }
        Ok(Self {
            day,
            period,
            hour_index,
        })
    }

    pub fn day(&self) -> u8 {
        self.day
    }

    pub fn period(&self) -> Period {
        self.period
    }

    pub fn hour_index(&self) -> u8 {
        self.hour_index
    }

    /// Regularized clock hour used for display: the period base hour plus
    /// the index offset. Evening slots really start at irregular 50-minute
    /// boundaries, but are always labelled on the hour.
    pub fn display_hour(&self) -> u8 {
        self.period.base_hour() + self.hour_index - 1
    }

    /// Human label such as `Segunda Manhã 6:00`.
    pub fn label(&self) -> String {
        format!(
            "{} {} {}:00",
            day_name(self.day).unwrap_or("?"),
            self.period.display_name(),
            self.display_hour()
        )
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.day, self.period.letter(), self.hour_index)
    }
}

impl FromStr for TimeSlot {
    type Err = SlotCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SlotCodeError::InvalidFormat(s.to_string());
        let mut chars = s.trim().chars();
        let day = chars.next().and_then(|c| c.to_digit(10)).ok_or_else(invalid)? as u8;
        let period = chars.next().and_then(Period::from_letter).ok_or_else(invalid)?;
        let hour_index = chars.next().and_then(|c| c.to_digit(10)).ok_or_else(invalid)? as u8;
        if chars.next().is_some() {
            return Err(invalid());
        }
        TimeSlot::new(day, period, hour_index)
    }
}

fn expand_group(day: &str, period: &str, hours: &str, slots: &mut BTreeSet<TimeSlot>) {
    let Some(day) = day.parse::<u8>().ok() else {
        return;
    };
    let Some(period) = period.chars().next().and_then(Period::from_letter) else {
        return;
    };
    for digit in hours.chars().filter_map(|c| c.to_digit(10)) {
        // Digits 0 and 7-9 are not teaching slots and are dropped.
        if let Ok(slot) = TimeSlot::new(day, period, digit as u8) {
            slots.insert(slot);
        }
    }
}

/// Parses every slot group in `raw`. Text that is not a slot group is
/// ignored, so malformed input yields whatever valid groups it contains.
pub fn parse_slots(raw: &str) -> BTreeSet<TimeSlot> {
    let mut slots = BTreeSet::new();
    for caps in SLOT_GROUP_REGEX.captures_iter(raw) {
        expand_group(&caps[1], &caps[2], &caps[3], &mut slots);
    }
    slots
}

/// A single slot group as typed in a time search, e.g. `2M12`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotGroup {
    pub day: u8,
    pub period: Period,
    pub slots: BTreeSet<TimeSlot>,
}

impl SlotGroup {
    pub fn display_hours(&self) -> Vec<String> {
        self.slots
            .iter()
            .map(|slot| format!("{}:00", slot.display_hour()))
            .collect()
    }
}

/// Parses a search token. The token must start with a complete group;
/// anything after the group is ignored.
pub fn parse_slot_group(token: &str) -> Result<SlotGroup, SlotCodeError> {
    let normalized = token.trim().to_ascii_uppercase();
    let caps = SEARCH_TOKEN_REGEX
        .captures(&normalized)
        .ok_or_else(|| SlotCodeError::InvalidFormat(token.trim().to_string()))?;

    let mut slots = BTreeSet::new();
    expand_group(&caps[1], &caps[2], &caps[3], &mut slots);
    let first = slots
        .iter()
        .next()
        .copied()
        .ok_or_else(|| SlotCodeError::InvalidFormat(token.trim().to_string()))?;

    Ok(SlotGroup {
        day: first.day(),
        period: first.period(),
        slots,
    })
}

/// Compact canonical code for a slot set, e.g. `2M12 3T45`.
pub fn format_slots(slots: &BTreeSet<TimeSlot>) -> String {
    let mut groups: BTreeMap<(u8, char), String> = BTreeMap::new();
    for slot in slots {
        groups
            .entry((slot.day(), slot.period().letter()))
            .or_default()
            .push_str(&slot.hour_index().to_string());
    }
    groups
        .into_iter()
        .map(|((day, letter), hours)| format!("{day}{letter}{hours}"))
        .collect::<Vec<_>>()
        .join(" ")
}
