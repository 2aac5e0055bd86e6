use chrono::NaiveDate;
use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use shared_config::AppConfig;
use shared_models::error::PortalError;
use shared_store::PortalApiClient;

use crate::models::{AvailableSlotsResponse, DoctorListedRequest, TimeRange};
use crate::validation::{format_hhmm, validate_range};

/// Doctor-facing directory calls: listing toggle and bookable slots.
pub struct DoctorDirectory {
    client: PortalApiClient,
}

impl DoctorDirectory {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: PortalApiClient::new(config),
        }
    }

    /// Show or hide the doctor in patient-facing search.
    pub async fn set_listed(&self, email: &str, listed: bool) -> Result<Value, PortalError> {
        debug!("Setting listed={} for {}", listed, email);

        let body = serde_json::to_value(DoctorListedRequest { email, listed })
            .map_err(|e| PortalError::validation(e.to_string()))?;
        let response = self.client.post_acknowledged("/doctor/listed", body).await?;

        Ok(response.get("doctor").cloned().unwrap_or(Value::Null))
    }

    pub async fn available_slots(
        &self,
        doctor_id: &str,
        date: NaiveDate,
        slot_minutes: u32,
    ) -> Result<Vec<String>, PortalError> {
        if slot_minutes == 0 {
            return Err(PortalError::validation("Slot length must be positive"));
        }

        debug!("Fetching {}-minute slots for doctor {} on {}", slot_minutes, doctor_id, date);

        let path = format!("/doctor/{}/available-slots", doctor_id);
        let query = [
            ("date", date.format("%Y-%m-%d").to_string()),
            ("slot", slot_minutes.to_string()),
        ];
        let response: AvailableSlotsResponse = self.client
            .request(Method::GET, &path, &query, None)
            .await?;

        Ok(response.slots)
    }
}

/// Slot start times (`HH:MM`) where a whole slot fits inside a range.
///
/// Invalid ranges are ignored. With `not_before`, starts at or before that
/// minute are dropped. The result is sorted and free of repeats.
pub fn split_into_slots(
    ranges: &[TimeRange],
    slot_minutes: u32,
    not_before: Option<u32>,
) -> Vec<String> {
    if slot_minutes == 0 {
        return Vec::new();
    }

    let mut starts: Vec<u32> = ranges
        .iter()
        .filter_map(|range| validate_range(range).ok())
        .flat_map(|(start, end)| {
            (start..end)
                .step_by(slot_minutes as usize)
                .take_while(move |slot| slot + slot_minutes <= end)
        })
        .filter(|slot| not_before.map_or(true, |limit| *slot > limit))
        .collect();

    starts.sort_unstable();
    starts.dedup();
    starts.into_iter().map(format_hhmm).collect()
}
