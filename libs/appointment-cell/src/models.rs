// libs/appointment-cell/src/models.rs
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use availability_cell::models::{slot_time, LocationType, Slot, SlotType};

// ==============================================================================
// SEARCH MODELS
// ==============================================================================

/// Filters for `GET /availability/search`. Unset fields are left out of the
/// query string.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SlotSearchFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointment_type: Option<SlotType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_type: Option<LocationType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_fee: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insurance_accepted: Option<bool>,
}

impl SlotSearchFilters {
    pub fn on_date(date: NaiveDate) -> Self {
        Self {
            start_date: Some(date),
            end_date: Some(date),
            ..Self::default()
        }
    }

    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let value = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => return Vec::new(),
        };

        value
            .into_iter()
            .filter_map(|(key, value)| match value {
                Value::Null => None,
                Value::String(s) => Some((key, s)),
                other => Some((key, other.to_string())),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderSummary {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub specialty: Option<String>,
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default)]
    pub years_experience: Option<u32>,
}

impl ProviderSummary {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderAvailability {
    pub provider: ProviderSummary,
    #[serde(default)]
    pub available_slots: Vec<Slot>,
}

/// `data` of `GET /availability/search`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchResults {
    #[serde(default)]
    pub results: Vec<ProviderAvailability>,
}

// ==============================================================================
// BOOKING MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingRequest {
    pub provider_id: Uuid,
    pub slot_id: Uuid,
    pub appointment_date: NaiveDate,
    #[serde(with = "slot_time")]
    pub start_time: NaiveTime,
    pub appointment_type: SlotType,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

impl BookingRequest {
    pub fn for_slot(provider_id: Uuid, slot: &Slot) -> Self {
        Self {
            provider_id,
            slot_id: slot.id,
            appointment_date: slot.date,
            start_time: slot.start_time,
            appointment_type: slot.appointment_type,
            reason: None,
            notes: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}
