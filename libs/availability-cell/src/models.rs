use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==============================================================================
// SLOT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Slot {
    pub id: Uuid,
    pub date: NaiveDate,
    #[serde(with = "slot_time")]
    pub start_time: NaiveTime,
    #[serde(with = "slot_time")]
    pub end_time: NaiveTime,
    #[serde(rename = "duration", default)]
    pub duration_minutes: u32,
    pub appointment_type: SlotType,
    pub status: SlotStatus,
    #[serde(default)]
    pub location: Option<SlotLocation>,
    #[serde(default)]
    pub pricing: Option<SlotPricing>,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub recurrence_pattern: Option<RecurrencePattern>,
    #[serde(default)]
    pub recurrence_end_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default = "default_max_appointments")]
    pub max_appointments_per_slot: u32,
}

impl Slot {
    pub fn is_bookable(&self) -> bool {
        self.status == SlotStatus::Available
            && !matches!(self.appointment_type, SlotType::Break | SlotType::Other)
    }

    /// Minutes between start and end, used when the server omits `duration`.
    pub fn span_minutes(&self) -> i64 {
        (self.end_time - self.start_time).num_minutes()
    }

    pub fn effective_duration_minutes(&self) -> u32 {
        if self.duration_minutes > 0 {
            self.duration_minutes
        } else {
            self.span_minutes().max(0) as u32
        }
    }
}

fn default_max_appointments() -> u32 {
    1
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SlotType {
    Consultation,
    FollowUp,
    Emergency,
    Telemedicine,
    Break,
    #[serde(other)]
    Other,
}

impl fmt::Display for SlotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotType::Consultation => write!(f, "consultation"),
            SlotType::FollowUp => write!(f, "follow_up"),
            SlotType::Emergency => write!(f, "emergency"),
            SlotType::Telemedicine => write!(f, "telemedicine"),
            SlotType::Break => write!(f, "break"),
            SlotType::Other => write!(f, "other"),
        }
    }
}

/// Transitions between these are owned by the server.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    Available,
    Booked,
    Blocked,
    Tentative,
    Cancelled,
    #[serde(other)]
    Other,
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotStatus::Available => write!(f, "available"),
            SlotStatus::Booked => write!(f, "booked"),
            SlotStatus::Blocked => write!(f, "blocked"),
            SlotStatus::Tentative => write!(f, "tentative"),
            SlotStatus::Cancelled => write!(f, "cancelled"),
            SlotStatus::Other => write!(f, "other"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RecurrencePattern {
    Daily,
    Weekly,
    Monthly,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LocationType {
    Clinic,
    Hospital,
    Virtual,
    HomeVisit,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlotLocation {
    #[serde(rename = "type")]
    pub location_type: LocationType,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub room: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlotPricing {
    pub base_fee: f64,
    pub currency: String,
    #[serde(default)]
    pub insurance_accepted: bool,
}

/// Slot-shaped record submitted on create and update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlotDraft {
    pub date: NaiveDate,
    #[serde(with = "slot_time")]
    pub start_time: NaiveTime,
    #[serde(with = "slot_time")]
    pub end_time: NaiveTime,
    pub slot_duration: u32,
    pub appointment_type: SlotType,
    pub location: Option<SlotLocation>,
    pub pricing: Option<SlotPricing>,
    pub is_recurring: bool,
    pub recurrence_pattern: Option<RecurrencePattern>,
    pub recurrence_end_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub max_appointments_per_slot: u32,
}

impl SlotDraft {
    /// A one-off consultation slot, the form's starting state.
    pub fn new(date: NaiveDate, start_time: NaiveTime, end_time: NaiveTime) -> Self {
        Self {
            date,
            start_time,
            end_time,
            slot_duration: (end_time - start_time).num_minutes().max(0) as u32,
            appointment_type: SlotType::Consultation,
            location: None,
            pricing: None,
            is_recurring: false,
            recurrence_pattern: None,
            recurrence_end_date: None,
            notes: None,
            max_appointments_per_slot: 1,
        }
    }

    pub fn recurring(mut self, pattern: RecurrencePattern, end_date: NaiveDate) -> Self {
        self.is_recurring = true;
        self.recurrence_pattern = Some(pattern);
        self.recurrence_end_date = Some(end_date);
        self
    }
}

impl From<&Slot> for SlotDraft {
    fn from(slot: &Slot) -> Self {
        Self {
            date: slot.date,
            start_time: slot.start_time,
            end_time: slot.end_time,
            slot_duration: slot.effective_duration_minutes(),
            appointment_type: slot.appointment_type,
            location: slot.location.clone(),
            pricing: slot.pricing.clone(),
            is_recurring: slot.is_recurring,
            recurrence_pattern: slot.recurrence_pattern,
            recurrence_end_date: slot.recurrence_end_date,
            notes: slot.notes.clone(),
            max_appointments_per_slot: slot.max_appointments_per_slot,
        }
    }
}

// ==============================================================================
// WINDOW RESPONSE MODELS
// ==============================================================================

/// One entry of the server's day-keyed list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DayAvailability {
    pub date: NaiveDate,
    #[serde(default)]
    pub slots: Vec<Slot>,
}

/// A calendar column: one date and its slots ordered by start time.
#[derive(Debug, Clone, PartialEq)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub slots: Vec<Slot>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AvailabilitySummary {
    #[serde(rename = "total_slots")]
    pub total: u32,
    #[serde(rename = "available_slots")]
    pub available: u32,
    #[serde(rename = "booked_slots")]
    pub booked: u32,
    #[serde(rename = "cancelled_slots")]
    pub cancelled: u32,
}

impl AvailabilitySummary {
    pub fn from_slots<'a>(slots: impl IntoIterator<Item = &'a Slot>) -> Self {
        slots.into_iter().fold(Self::default(), |mut summary, slot| {
            summary.total += 1;
            match slot.status {
                SlotStatus::Available => summary.available += 1,
                SlotStatus::Booked => summary.booked += 1,
                SlotStatus::Cancelled => summary.cancelled += 1,
                SlotStatus::Blocked | SlotStatus::Tentative | SlotStatus::Other => {}
            }
            summary
        })
    }
}

/// `data` of `GET /availability`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WindowAvailability {
    #[serde(default)]
    pub availability: Vec<DayAvailability>,
    #[serde(default)]
    pub availability_summary: Option<AvailabilitySummary>,
}

// ==============================================================================
// TIME FORMAT
// ==============================================================================

/// Parses the `HH:MM` / `HH:MM:SS` strings the portal API uses for slot times.
pub fn parse_slot_time(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .ok()
}

pub fn format_slot_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

pub mod slot_time {
    use chrono::NaiveTime;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_slot_time(*time))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_slot_time(&raw)
            .ok_or_else(|| D::Error::custom(format!("invalid slot time `{}`", raw)))
    }
}
