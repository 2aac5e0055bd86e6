use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A bookable interval on one date, as `HH:MM` strings.
///
/// Values are kept exactly as entered so that a half-typed time can live in
/// the editor; `validation::validate_range` decides whether it is usable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: String,
    pub end: String,
}

impl TimeRange {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }
}

impl Default for TimeRange {
    fn default() -> Self {
        Self::new("09:00", "10:00")
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Stable identity of a range inside one editor session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RangeId(Uuid);

impl RangeId {
    pub fn generate() -> Self {
        RangeId(Uuid::new_v4())
    }
}

impl fmt::Display for RangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeStatus {
    /// Not yet acknowledged by the store.
    New,
    Submitted,
    /// Submitted, temporarily unlocked for changes.
    Editing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeEntry {
    pub id: RangeId,
    pub range: TimeRange,
    pub status: RangeStatus,
}

impl RangeEntry {
    pub fn new(range: TimeRange) -> Self {
        Self {
            id: RangeId::generate(),
            range,
            status: RangeStatus::New,
        }
    }

    pub fn submitted(range: TimeRange) -> Self {
        Self {
            status: RangeStatus::Submitted,
            ..Self::new(range)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeField {
    Start,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    Morning,
    Afternoon,
    Fullday,
}

impl Preset {
    pub fn range(self) -> TimeRange {
        match self {
            Preset::Morning => TimeRange::new("09:00", "12:00"),
            Preset::Afternoon => TimeRange::new("13:00", "17:00"),
            Preset::Fullday => TimeRange::new("09:00", "17:00"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditToggle {
    Entered,
    /// Local edits were discarded and the date reloaded.
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOutcome {
    pub persisted: usize,
    /// Some saved time on today's date has already started.
    pub partial_today: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkOutcome {
    pub dates: Vec<NaiveDate>,
    pub updated: u32,
}

// Wire DTOs for the remote availability endpoints

#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityResponse {
    #[serde(default)]
    pub availability: Option<AvailabilityPayload>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AvailabilityPayload {
    #[serde(default)]
    pub ranges: Vec<TimeRange>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SaveAvailabilityRequest<'a> {
    pub email: &'a str,
    pub date: NaiveDate,
    pub ranges: &'a [TimeRange],
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkAvailabilityRequest<'a> {
    pub email: &'a str,
    pub dates: &'a [NaiveDate],
    pub ranges: &'a [TimeRange],
}

#[derive(Debug, Clone, Deserialize)]
pub struct BulkAvailabilityResponse {
    #[serde(default)]
    pub updated: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct DoctorListedRequest<'a> {
    pub email: &'a str,
    pub listed: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AvailableSlotsResponse {
    #[serde(default)]
    pub slots: Vec<String>,
}
