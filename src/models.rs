use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// One of the two tracked event days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "u8", into = "u8")]
pub enum Day {
    #[default]
    One,
    Two,
}

impl Day {
    pub const ALL: [Day; 2] = [Day::One, Day::Two];

    pub fn number(self) -> u8 {
        match self {
            Day::One => 1,
            Day::Two => 2,
        }
    }
}

impl TryFrom<u8> for Day {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Day::One),
            2 => Ok(Day::Two),
            other => Err(format!("day must be 1 or 2, got {other}")),
        }
    }
}

impl From<Day> for u8 {
    fn from(day: Day) -> Self {
        day.number()
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Timestamp field within an attendance record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Slot {
    #[serde(rename = "entrada", alias = "check_in")]
    CheckIn,
    #[serde(rename = "salida", alias = "check_out")]
    CheckOut,
}

impl Slot {
    pub fn label(self) -> &'static str {
        match self {
            Slot::CheckIn => "Check-in",
            Slot::CheckOut => "Check-out",
        }
    }

    pub fn form_value(self) -> &'static str {
        match self {
            Slot::CheckIn => "entrada",
            Slot::CheckOut => "salida",
        }
    }
}

/// Row of the `personas` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: Uuid,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "ooad", default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Row of the `asistencias` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: i64,
    #[serde(rename = "persona_id")]
    pub person_id: Uuid,
    #[serde(rename = "dia")]
    pub day: Day,
    #[serde(rename = "entrada", default)]
    pub check_in: Option<DateTime<Utc>>,
    #[serde(rename = "salida", default)]
    pub check_out: Option<DateTime<Utc>>,
}

impl AttendanceRecord {
    pub fn slot(&self, slot: Slot) -> Option<DateTime<Utc>> {
        match slot {
            Slot::CheckIn => self.check_in,
            Slot::CheckOut => self.check_out,
        }
    }

    pub fn slot_mut(&mut self, slot: Slot) -> &mut Option<DateTime<Utc>> {
        match slot {
            Slot::CheckIn => &mut self.check_in,
            Slot::CheckOut => &mut self.check_out,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TablesData {
    #[serde(default)]
    pub personas: Vec<Person>,
    #[serde(default)]
    pub asistencias: Vec<AttendanceRecord>,
    #[serde(default)]
    pub next_record_id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    #[default]
    Pending,
    Attended,
    NotAttended,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Attended => "attended",
            Status::NotAttended => "not-attended",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Status::Pending => "Pending",
            Status::Attended => "Attended",
            Status::NotAttended => "Did not attend",
        }
    }
}

/// Entry of the roster document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterPerson {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub status: Status,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marked_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Attended,
    NotAttended,
}

impl StatusFilter {
    pub const ALL: [StatusFilter; 4] = [
        StatusFilter::All,
        StatusFilter::Pending,
        StatusFilter::Attended,
        StatusFilter::NotAttended,
    ];

    pub fn matches(self, status: Status) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Pending => status == Status::Pending,
            StatusFilter::Attended => status == Status::Attended,
            StatusFilter::NotAttended => status == Status::NotAttended,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Pending => "pending",
            StatusFilter::Attended => "attended",
            StatusFilter::NotAttended => "not-attended",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StatusFilter::All => "All",
            StatusFilter::Pending => "Pending",
            StatusFilter::Attended => "Attended",
            StatusFilter::NotAttended => "Did not attend",
        }
    }
}

/// Query string of the tables dashboard.
#[derive(Debug, Clone, Copy, Deserialize, Default)]
pub struct AttendanceView {
    #[serde(default)]
    pub day: Day,
}

/// Query string of the roster dashboard.
#[derive(Debug, Clone, Copy, Deserialize, Default)]
pub struct RosterView {
    #[serde(default)]
    pub filter: StatusFilter,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct AddPersonRequest {
    pub name: String,
    #[serde(default, alias = "ooad")]
    pub category: Option<String>,
    /// Day the tables dashboard was showing, used to return to the same view.
    #[serde(default)]
    pub day: Option<Day>,
    #[serde(default)]
    pub filter: Option<StatusFilter>,
}

#[derive(Debug, Deserialize)]
pub struct MarkAttendanceRequest {
    pub person_id: Uuid,
    pub day: Day,
    pub slot: Slot,
}

#[derive(Debug, Deserialize)]
pub struct MarkStatusRequest {
    pub status: Status,
    #[serde(default)]
    pub filter: Option<StatusFilter>,
}

/// Hidden field carried by roster forms so the redirect keeps the filter.
#[derive(Debug, Deserialize, Default)]
pub struct FilterForm {
    #[serde(default)]
    pub filter: Option<StatusFilter>,
}

/// Answers collected by the two clear-all confirmation steps.
#[derive(Debug, Deserialize, Default)]
pub struct ClearRequest {
    #[serde(default)]
    pub first: Option<String>,
    #[serde(default)]
    pub second: Option<String>,
}

impl ClearRequest {
    pub fn answers(&self) -> (bool, bool) {
        (is_yes(self.first.as_deref()), is_yes(self.second.as_deref()))
    }
}

fn is_yes(answer: Option<&str>) -> bool {
    matches!(
        answer.map(str::trim).map(str::to_ascii_lowercase).as_deref(),
        Some("yes" | "true")
    )
}

/// Query string of the clear-all page. The second question is only reached
/// with the first answer carried along.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ClearStepQuery {
    #[serde(default)]
    pub step: Option<u8>,
    #[serde(default)]
    pub first: Option<String>,
}

impl ClearStepQuery {
    pub fn first_confirmed(&self) -> bool {
        self.step == Some(2) && is_yes(self.first.as_deref())
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct StatsQuery {
    #[serde(default)]
    pub day: Option<Day>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayStats {
    pub day: Day,
    pub total_people: usize,
    pub check_ins: usize,
    pub check_outs: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RosterStats {
    pub total: usize,
    pub pending: usize,
    pub attended: usize,
    pub not_attended: usize,
}
