use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Method;
use tracing::debug;

use shared_config::AppConfig;
use shared_models::error::PortalError;
use shared_store::PortalApiClient;

use crate::models::{
    AvailabilityResponse, BulkAvailabilityRequest, BulkAvailabilityResponse,
    SaveAvailabilityRequest, TimeRange,
};

/// Remote persistence for a doctor's per-date ranges.
///
/// Every write replaces the whole set for a date.
#[async_trait]
pub trait AvailabilityStore: Send + Sync {
    async fn fetch_ranges(&self, email: &str, date: NaiveDate) -> Result<Vec<TimeRange>, PortalError>;

    async fn save_ranges(
        &self,
        email: &str,
        date: NaiveDate,
        ranges: &[TimeRange],
    ) -> Result<(), PortalError>;

    /// Returns how many dates the store reports as updated.
    async fn bulk_replace(
        &self,
        email: &str,
        dates: &[NaiveDate],
        ranges: &[TimeRange],
    ) -> Result<u32, PortalError>;
}

pub struct HttpAvailabilityStore {
    client: PortalApiClient,
}

impl HttpAvailabilityStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: PortalApiClient::new(config),
        }
    }

    pub fn with_client(client: PortalApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AvailabilityStore for HttpAvailabilityStore {
    async fn fetch_ranges(&self, email: &str, date: NaiveDate) -> Result<Vec<TimeRange>, PortalError> {
        debug!("Fetching availability for {} on {}", email, date);

        let query = [
            ("email", email.to_string()),
            ("date", date.format("%Y-%m-%d").to_string()),
        ];
        let response: AvailabilityResponse = self.client
            .request(Method::GET, "/availability", &query, None)
            .await?;

        Ok(response.availability.map(|a| a.ranges).unwrap_or_default())
    }

    async fn save_ranges(
        &self,
        email: &str,
        date: NaiveDate,
        ranges: &[TimeRange],
    ) -> Result<(), PortalError> {
        debug!("Saving {} range(s) for {} on {}", ranges.len(), email, date);

        let body = serde_json::to_value(SaveAvailabilityRequest { email, date, ranges })
            .map_err(|e| PortalError::validation(e.to_string()))?;
        self.client.post_acknowledged("/availability", body).await?;

        Ok(())
    }

    async fn bulk_replace(
        &self,
        email: &str,
        dates: &[NaiveDate],
        ranges: &[TimeRange],
    ) -> Result<u32, PortalError> {
        debug!("Replacing availability for {} on {} date(s)", email, dates.len());

        let body = serde_json::to_value(BulkAvailabilityRequest { email, dates, ranges })
            .map_err(|e| PortalError::validation(e.to_string()))?;
        let response = self.client.post_acknowledged("/availability/bulk", body).await?;

        let parsed: BulkAvailabilityResponse = serde_json::from_value(response)
            .map_err(|e| PortalError::StoreRejection(format!("malformed bulk response: {}", e)))?;

        Ok(parsed.updated)
    }
}
