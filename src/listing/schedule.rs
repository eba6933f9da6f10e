//! Weekly operating schedule of a listing.
//!
//! Stored documents keep the schedule as flat keys (`hari_senin`,
//! `hari_senin_buka`, `hari_senin_tutup`, `hari_senin_buka2`, ...), so the
//! serde impls here read and write that layout instead of a nested value.

use regex::Regex;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

/// Stored value for a day that never closes.
pub const OPEN_ALL_DAY: &str = "Buka 24 Jam";
/// Display text for a day without any hours.
pub const UNSET_LABEL: &str = "Belum diatur";

static CLOCK_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([01]\d|2[0-3]):([0-5]\d)$").expect("clock time pattern is valid")
});

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Invalid time '{0}': expected HH:MM between 00:00 and 23:59")]
    InvalidTime(String),
    #[error("Incomplete interval for {day}: both opening and closing time are required")]
    IncompleteInterval { day: Day },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Day {
    Senin,
    Selasa,
    Rabu,
    Kamis,
    Jumat,
    Sabtu,
    Minggu,
}

impl Day {
    pub const ALL: [Day; 7] = [
        Day::Senin,
        Day::Selasa,
        Day::Rabu,
        Day::Kamis,
        Day::Jumat,
        Day::Sabtu,
        Day::Minggu,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Day::Senin => "senin",
            Day::Selasa => "selasa",
            Day::Rabu => "rabu",
            Day::Kamis => "kamis",
            Day::Jumat => "jumat",
            Day::Sabtu => "sabtu",
            Day::Minggu => "minggu",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = self.key();
        let mut chars = key.chars();
        if let Some(first) = chars.next() {
            write!(f, "{}{}", first.to_ascii_uppercase(), chars.as_str())?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime {
    hour: u8,
    minute: u8,
}

impl ClockTime {
    pub fn new(hour: u8, minute: u8) -> Result<Self, ScheduleError> {
        if hour > 23 || minute > 59 {
            return Err(ScheduleError::InvalidTime(format!("{hour:02}:{minute:02}")));
        }
        Ok(Self { hour, minute })
    }

    pub fn hour(self) -> u8 {
        self.hour
    }

    pub fn minute(self) -> u8 {
        self.minute
    }
}

impl FromStr for ClockTime {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let captures = CLOCK_TIME
            .captures(trimmed)
            .ok_or_else(|| ScheduleError::InvalidTime(s.to_string()))?;
        let hour = captures[1]
            .parse()
            .map_err(|_| ScheduleError::InvalidTime(s.to_string()))?;
        let minute = captures[2]
            .parse()
            .map_err(|_| ScheduleError::InvalidTime(s.to_string()))?;
        Self::new(hour, minute)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// One opening interval. Closing before opening means the interval runs past midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeRange {
    pub open: ClockTime,
    pub close: ClockTime,
}

impl TimeRange {
    pub fn new(open: ClockTime, close: ClockTime) -> Self {
        Self { open, close }
    }

    pub fn parse(open: &str, close: &str) -> Result<Self, ScheduleError> {
        Ok(Self::new(open.parse()?, close.parse()?))
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.open, self.close)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DaySchedule {
    #[default]
    Closed,
    OpenAllDay,
    Hours {
        first: TimeRange,
        second: Option<TimeRange>,
    },
}

impl DaySchedule {
    pub fn hours(first: TimeRange) -> Self {
        DaySchedule::Hours {
            first,
            second: None,
        }
    }

    pub fn split(first: TimeRange, second: TimeRange) -> Self {
        DaySchedule::Hours {
            first,
            second: Some(second),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            DaySchedule::Closed => UNSET_LABEL.to_string(),
            DaySchedule::OpenAllDay => OPEN_ALL_DAY.to_string(),
            DaySchedule::Hours { first, second: None } => first.to_string(),
            DaySchedule::Hours {
                first,
                second: Some(second),
            } => format!("{first} & {second}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WeeklySchedule {
    days: [DaySchedule; 7],
}

impl WeeklySchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, day: Day) -> DaySchedule {
        self.days[day.index()]
    }

    pub fn set(&mut self, day: Day, schedule: DaySchedule) {
        self.days[day.index()] = schedule;
    }

    pub fn with(mut self, day: Day, schedule: DaySchedule) -> Self {
        self.set(day, schedule);
        self
    }

    pub fn clear(&mut self, day: Day) {
        self.set(day, DaySchedule::Closed);
    }

    /// Copies one day's hours onto the whole week.
    pub fn apply_to_all(&mut self, schedule: DaySchedule) {
        self.days = [schedule; 7];
    }

    pub fn describe(&self, day: Day) -> String {
        self.get(day).describe()
    }

    pub fn is_empty(&self) -> bool {
        self.days.iter().all(|d| *d == DaySchedule::Closed)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Day, DaySchedule)> + '_ {
        Day::ALL.into_iter().map(|day| (day, self.get(day)))
    }

    pub fn to_document_fields(&self) -> BTreeMap<String, String> {
        let mut fields = BTreeMap::new();
        for (day, schedule) in self.iter() {
            let key = day.key();
            match schedule {
                DaySchedule::Closed => {}
                DaySchedule::OpenAllDay => {
                    fields.insert(format!("hari_{key}"), OPEN_ALL_DAY.to_string());
                }
                DaySchedule::Hours { first, second } => {
                    fields.insert(format!("hari_{key}_buka"), first.open.to_string());
                    fields.insert(format!("hari_{key}_tutup"), first.close.to_string());
                    if let Some(second) = second {
                        fields.insert(format!("hari_{key}_buka2"), second.open.to_string());
                        fields.insert(format!("hari_{key}_tutup2"), second.close.to_string());
                    }
                }
            }
        }
        fields
    }

    /// Every key a schedule may occupy in a stored document.
    pub fn document_keys() -> impl Iterator<Item = String> {
        Day::ALL.into_iter().flat_map(|day| {
            let key = day.key();
            [
                format!("hari_{key}"),
                format!("hari_{key}_buka"),
                format!("hari_{key}_tutup"),
                format!("hari_{key}_buka2"),
                format!("hari_{key}_tutup2"),
            ]
        })
    }

    /// Rebuilds a schedule from stored keys. Unparseable or half-filled intervals
    /// are dropped; a lone second interval is promoted to the first slot.
    pub fn from_document_fields<'a>(fields: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let lookup: HashMap<&str, &str> = fields
            .into_iter()
            .filter(|(k, _)| k.starts_with("hari_"))
            .collect();

        let interval = |open_key: String, close_key: String| -> Option<TimeRange> {
            let open = lookup.get(open_key.as_str())?;
            let close = lookup.get(close_key.as_str())?;
            TimeRange::parse(open, close).ok()
        };

        let mut schedule = Self::new();
        for day in Day::ALL {
            let key = day.key();
            if lookup.get(format!("hari_{key}").as_str()) == Some(&OPEN_ALL_DAY) {
                schedule.set(day, DaySchedule::OpenAllDay);
                continue;
            }
            let first = interval(format!("hari_{key}_buka"), format!("hari_{key}_tutup"));
            let second = interval(format!("hari_{key}_buka2"), format!("hari_{key}_tutup2"));
            let day_schedule = match (first, second) {
                (Some(first), second) => DaySchedule::Hours { first, second },
                (None, Some(second)) => DaySchedule::hours(second),
                (None, None) => DaySchedule::Closed,
            };
            schedule.set(day, day_schedule);
        }
        schedule
    }
}

impl Serialize for WeeklySchedule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields = self.to_document_fields();
        let mut map = serializer.serialize_map(Some(fields.len()))?;
        for (key, value) in &fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for WeeklySchedule {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw: BTreeMap<String, serde_json::Value> = BTreeMap::deserialize(deserializer)?;
        Ok(Self::from_document_fields(
            raw.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.as_str(), s))),
        ))
    }
}

/// Form-style input for one day, as entered by a submitter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayInput {
    #[serde(default)]
    pub open_all_day: bool,
    #[serde(default)]
    pub open: String,
    #[serde(default)]
    pub close: String,
    #[serde(default)]
    pub open2: String,
    #[serde(default)]
    pub close2: String,
}

impl DayInput {
    pub fn from_schedule(schedule: DaySchedule) -> Self {
        match schedule {
            DaySchedule::Closed => Self::default(),
            DaySchedule::OpenAllDay => Self {
                open_all_day: true,
                ..Self::default()
            },
            DaySchedule::Hours { first, second } => Self {
                open_all_day: false,
                open: first.open.to_string(),
                close: first.close.to_string(),
                open2: second.map(|r| r.open.to_string()).unwrap_or_default(),
                close2: second.map(|r| r.close.to_string()).unwrap_or_default(),
            },
        }
    }

    /// Strict conversion used when validating submissions: a half-filled
    /// interval is an error instead of being dropped.
    pub fn to_schedule(&self, day: Day) -> Result<DaySchedule, ScheduleError> {
        if self.open_all_day {
            return Ok(DaySchedule::OpenAllDay);
        }
        let pair = |open: &str, close: &str| -> Result<Option<TimeRange>, ScheduleError> {
            match (open.trim().is_empty(), close.trim().is_empty()) {
                (true, true) => Ok(None),
                (false, false) => TimeRange::parse(open, close).map(Some),
                _ => Err(ScheduleError::IncompleteInterval { day }),
            }
        };
        let first = pair(&self.open, &self.close)?;
        let second = pair(&self.open2, &self.close2)?;
        Ok(match (first, second) {
            (Some(first), second) => DaySchedule::Hours { first, second },
            (None, Some(second)) => DaySchedule::hours(second),
            (None, None) => DaySchedule::Closed,
        })
    }
}
