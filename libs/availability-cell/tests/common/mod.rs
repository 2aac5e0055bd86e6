use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;

use availability_cell::{AvailabilityEditor, AvailabilityStore, TimeRange};
use shared_models::error::PortalError;
use shared_utils::clock::FixedClock;

pub const DOCTOR_EMAIL: &str = "dr.reyes@example.com";

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2030, 1, 15).unwrap()
}

pub fn days_from_today(offset: i64) -> NaiveDate {
    today() + chrono::Duration::days(offset)
}

pub fn range(start: &str, end: &str) -> TimeRange {
    TimeRange::new(start, end)
}

/// Store double that keeps per-date sets in memory and records every write.
#[derive(Default)]
pub struct InMemoryStore {
    dates: Mutex<HashMap<NaiveDate, Vec<TimeRange>>>,
    saves: Mutex<Vec<(NaiveDate, Vec<TimeRange>)>>,
    bulk_calls: Mutex<Vec<(Vec<NaiveDate>, Vec<TimeRange>)>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl InMemoryStore {
    pub fn seeded(date: NaiveDate, ranges: Vec<TimeRange>) -> Self {
        let store = Self::default();
        store.dates.lock().unwrap().insert(date, ranges);
        store
    }

    pub fn stored(&self, date: NaiveDate) -> Vec<TimeRange> {
        self.dates.lock().unwrap().get(&date).cloned().unwrap_or_default()
    }

    pub fn saves(&self) -> Vec<(NaiveDate, Vec<TimeRange>)> {
        self.saves.lock().unwrap().clone()
    }

    pub fn bulk_calls(&self) -> Vec<(Vec<NaiveDate>, Vec<TimeRange>)> {
        self.bulk_calls.lock().unwrap().clone()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl AvailabilityStore for InMemoryStore {
    async fn fetch_ranges(&self, _email: &str, date: NaiveDate) -> Result<Vec<TimeRange>, PortalError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(PortalError::Transport("connection reset".to_string()));
        }
        Ok(self.stored(date))
    }

    async fn save_ranges(
        &self,
        _email: &str,
        date: NaiveDate,
        ranges: &[TimeRange],
    ) -> Result<(), PortalError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PortalError::StoreRejection("API error (500): unavailable".to_string()));
        }
        self.saves.lock().unwrap().push((date, ranges.to_vec()));
        self.dates.lock().unwrap().insert(date, ranges.to_vec());
        Ok(())
    }

    async fn bulk_replace(
        &self,
        _email: &str,
        dates: &[NaiveDate],
        ranges: &[TimeRange],
    ) -> Result<u32, PortalError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PortalError::StoreRejection("API error (500): unavailable".to_string()));
        }
        self.bulk_calls.lock().unwrap().push((dates.to_vec(), ranges.to_vec()));
        let mut stored = self.dates.lock().unwrap();
        for date in dates {
            stored.insert(*date, ranges.to_vec());
        }
        Ok(dates.len() as u32)
    }
}

/// Editor on today's date at `hour:minute`, backed by `store`.
pub fn editor_at(store: Arc<InMemoryStore>, hour: u32, minute: u32) -> AvailabilityEditor {
    let clock = Arc::new(FixedClock::at(today(), hour, minute));
    AvailabilityEditor::new(store, clock, DOCTOR_EMAIL)
}
