use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use shared_models::error::PortalError;
use shared_models::notice::Notice;
use shared_utils::clock::Clock;

use crate::models::{
    BulkOutcome, EditToggle, Preset, RangeEntry, RangeField, RangeId, RangeStatus,
    SaveOutcome, TimeRange,
};
use crate::services::doctor::split_into_slots;
use crate::services::store::AvailabilityStore;
use crate::validation::{
    bulk_target_dates, classify_for_today, has_duplicates, validate_range, TodayFit,
};

const DEFAULT_BULK_DAYS: u32 = 7;

/// A doctor's editable availability for one selected date.
///
/// Operations take `&mut self`, so one user action completes before the
/// next begins. Every rejection or store failure also queues a [`Notice`].
pub struct AvailabilityEditor {
    store: Arc<dyn AvailabilityStore>,
    clock: Arc<dyn Clock>,
    doctor_email: String,
    selected_date: NaiveDate,
    ranges: Vec<RangeEntry>,
    bulk_day_count: u32,
    notices: Vec<Notice>,
}

impl AvailabilityEditor {
    pub fn new(
        store: Arc<dyn AvailabilityStore>,
        clock: Arc<dyn Clock>,
        doctor_email: impl Into<String>,
    ) -> Self {
        let selected_date = clock.today();
        Self {
            store,
            clock,
            doctor_email: doctor_email.into(),
            selected_date,
            ranges: Vec::new(),
            bulk_day_count: DEFAULT_BULK_DAYS,
            notices: Vec::new(),
        }
    }

    pub fn doctor_email(&self) -> &str {
        &self.doctor_email
    }

    pub fn selected_date(&self) -> NaiveDate {
        self.selected_date
    }

    pub fn ranges(&self) -> &[RangeEntry] {
        &self.ranges
    }

    pub fn range(&self, id: RangeId) -> Option<&RangeEntry> {
        self.ranges.iter().find(|entry| entry.id == id)
    }

    pub fn status_of(&self, id: RangeId) -> Option<RangeStatus> {
        self.range(id).map(|entry| entry.status)
    }

    pub fn editing_id(&self) -> Option<RangeId> {
        self.ranges
            .iter()
            .find(|entry| entry.status == RangeStatus::Editing)
            .map(|entry| entry.id)
    }

    pub fn bulk_day_count(&self) -> u32 {
        self.bulk_day_count
    }

    pub fn set_bulk_day_count(&mut self, days: u32) {
        self.bulk_day_count = days;
    }

    /// Drain the notices queued since the last call.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Select `date` and replace local state with what the store holds.
    ///
    /// A failed fetch leaves an empty set rather than an error.
    pub async fn load_for_date(&mut self, date: NaiveDate) -> usize {
        self.selected_date = date;

        let fetched = self.store.fetch_ranges(&self.doctor_email, date).await;
        match fetched {
            Ok(ranges) => {
                debug!("Loaded {} range(s) for {}", ranges.len(), date);
                self.ranges = ranges.into_iter().map(RangeEntry::submitted).collect();
            }
            Err(e) => {
                warn!("Could not load availability for {}: {}", date, e);
                self.ranges.clear();
            }
        }

        self.ranges.len()
    }

    pub fn add_range(&mut self) -> RangeId {
        let entry = RangeEntry::new(TimeRange::default());
        let id = entry.id;
        self.ranges.push(entry);
        id
    }

    pub fn update_field(
        &mut self,
        id: RangeId,
        field: RangeField,
        value: impl Into<String>,
    ) -> Result<(), PortalError> {
        let index = self.position(id)?;

        if self.ranges[index].status == RangeStatus::Submitted {
            return Err(self.reject(PortalError::validation(
                "This time slot is saved. Click edit before changing it",
            )));
        }

        let range = &mut self.ranges[index].range;
        match field {
            RangeField::Start => range.start = value.into(),
            RangeField::End => range.end = value.into(),
        }
        Ok(())
    }

    /// Remove a range and persist the rest; restored exactly if the store fails.
    pub async fn remove_range(&mut self, id: RangeId) -> Result<(), PortalError> {
        let index = self.position(id)?;
        self.ensure_not_past()?;

        let snapshot = self.ranges.clone();
        let removed = self.ranges.remove(index);
        let remaining = self.current_ranges();

        match self.persist(&remaining).await {
            Ok(()) => {
                info!("Removed {} on {}", removed.range, self.selected_date);
                self.notices.push(Notice::success("Time slot removed"));
                Ok(())
            }
            Err(e) => {
                self.ranges = snapshot;
                Err(e)
            }
        }
    }

    pub async fn toggle_edit(&mut self, id: RangeId) -> Result<EditToggle, PortalError> {
        let index = self.position(id)?;

        let status = self.ranges[index].status;
        match status {
            RangeStatus::New => Err(self.reject(PortalError::validation(
                "Save this time slot first before editing it",
            ))),
            RangeStatus::Editing => {
                self.load_for_date(self.selected_date).await;
                self.notices.push(Notice::info("Edit cancelled"));
                Ok(EditToggle::Cancelled)
            }
            RangeStatus::Submitted => {
                if self.editing_id().is_some() {
                    return Err(self.reject(PortalError::validation(
                        "Finish editing the current time slot first",
                    )));
                }
                self.ranges[index].status = RangeStatus::Editing;
                Ok(EditToggle::Entered)
            }
        }
    }

    /// Save one new or unlocked range by persisting the entire set.
    pub async fn save_range(&mut self, id: RangeId) -> Result<SaveOutcome, PortalError> {
        let index = self.position(id)?;
        let entry = self.ranges[index].clone();

        if entry.status == RangeStatus::Submitted {
            return Err(self.reject(PortalError::validation(
                "This time slot is already saved",
            )));
        }

        let (start, end) = match validate_range(&entry.range) {
            Ok(bounds) => bounds,
            Err(e) => return Err(self.reject(e)),
        };

        if self.ranges.iter().any(|other| other.id != id && other.range == entry.range) {
            return Err(self.reject(PortalError::validation(format!(
                "The time slot {} already exists for this date",
                entry.range
            ))));
        }

        let invalid_sibling = self
            .ranges
            .iter()
            .enumerate()
            .filter(|(_, other)| other.id != id)
            .find_map(|(slot, other)| validate_range(&other.range).err().map(|e| (slot, e)));
        if let Some((slot, e)) = invalid_sibling {
            let err = match e {
                PortalError::Validation(msg) => {
                    PortalError::validation(format!("Slot {}: {}", slot + 1, msg))
                }
                other => other,
            };
            return Err(self.reject(err));
        }

        self.ensure_not_past()?;

        let mut partial_today = false;
        if self.is_today() {
            match classify_for_today(start, end, self.clock.minutes_now()) {
                TodayFit::Elapsed => {
                    return Err(self.reject(PortalError::validation(
                        "This time slot has already passed today",
                    )));
                }
                TodayFit::Partial => partial_today = true,
                TodayFit::Upcoming => {}
            }
        }

        let payload = self.current_ranges();
        self.persist(&payload).await?;

        self.ranges[index].status = RangeStatus::Submitted;
        self.notices.push(if partial_today {
            Notice::success("Time slot saved. Part of it has already passed today")
        } else {
            Notice::success("Time slot saved")
        });

        Ok(SaveOutcome {
            persisted: payload.len(),
            partial_today,
        })
    }

    /// Persist every range for the selected date.
    ///
    /// On today's date ranges that are already over are left out, and are
    /// dropped locally once the store accepts the rest.
    pub async fn save_all(&mut self) -> Result<SaveOutcome, PortalError> {
        let bounds = self.validate_set()?;
        self.ensure_not_past()?;

        let mut partial_today = false;
        let surviving: Vec<RangeEntry> = if self.is_today() {
            let now = self.clock.minutes_now();
            self.ranges
                .iter()
                .zip(bounds)
                .filter_map(|(entry, (start, end))| match classify_for_today(start, end, now) {
                    TodayFit::Elapsed => None,
                    TodayFit::Partial => {
                        partial_today = true;
                        Some(entry.clone())
                    }
                    TodayFit::Upcoming => Some(entry.clone()),
                })
                .collect()
        } else {
            self.ranges.clone()
        };

        if surviving.is_empty() {
            return Err(self.reject(PortalError::validation(
                "All selected time slots have already passed today",
            )));
        }

        let dropped = self.ranges.len() - surviving.len();
        if dropped > 0 {
            debug!("Leaving out {} elapsed range(s) for today", dropped);
        }

        let payload: Vec<TimeRange> = surviving.iter().map(|entry| entry.range.clone()).collect();
        self.persist(&payload).await?;

        self.ranges = surviving
            .into_iter()
            .map(|entry| RangeEntry { status: RangeStatus::Submitted, ..entry })
            .collect();

        info!(
            "Saved {} range(s) for {} on {}",
            payload.len(),
            self.doctor_email,
            self.selected_date
        );
        self.notices.push(if partial_today {
            Notice::success("Availability saved. Some slots have already started today")
        } else {
            Notice::success("Availability saved")
        });

        Ok(SaveOutcome {
            persisted: payload.len(),
            partial_today,
        })
    }

    /// Fill a target range with a preset; never saves.
    pub fn apply_preset(&mut self, preset: Preset) -> Result<RangeId, PortalError> {
        let target = self.editing_id().or_else(|| {
            self.ranges
                .iter()
                .rev()
                .find(|entry| entry.status == RangeStatus::New)
                .map(|entry| entry.id)
        });

        match target {
            Some(id) => {
                let index = self.position(id)?;
                self.ranges[index].range = preset.range();
                Ok(id)
            }
            None if self.ranges.is_empty() => {
                let entry = RangeEntry::new(preset.range());
                let id = entry.id;
                self.ranges.push(entry);
                Ok(id)
            }
            None => Err(self.reject(PortalError::validation(
                "Add a new time slot or click edit on an existing one before applying a preset",
            ))),
        }
    }

    /// Replace availability on the next `days` dates with the current set.
    pub async fn apply_bulk(&mut self, days: u32) -> Result<BulkOutcome, PortalError> {
        self.validate_set()?;

        let dates = bulk_target_dates(self.selected_date, days, self.clock.today());
        if dates.is_empty() {
            return Err(self.reject(PortalError::validation(
                "There are no upcoming dates to copy this availability to",
            )));
        }

        let ranges = self.current_ranges();
        let result = self.store.bulk_replace(&self.doctor_email, &dates, &ranges).await;
        let updated = match result {
            Ok(updated) => updated,
            Err(e) => return Err(self.reject(e)),
        };

        info!("Copied {} range(s) to {} date(s)", ranges.len(), dates.len());
        self.notices.push(Notice::success(format!(
            "Availability applied to {} day(s)",
            dates.len()
        )));

        Ok(BulkOutcome { dates, updated })
    }

    pub async fn clear_all(&mut self) -> Result<(), PortalError> {
        self.ensure_not_past()?;
        self.persist(&[]).await?;

        self.ranges.clear();
        self.notices.push(Notice::success("All time slots cleared"));
        Ok(())
    }

    /// Bookable slot starts implied by the saved ranges.
    pub fn preview_slots(&self, slot_minutes: u32) -> Vec<String> {
        let saved: Vec<TimeRange> = self.ranges
            .iter()
            .filter(|entry| entry.status != RangeStatus::New)
            .map(|entry| entry.range.clone())
            .collect();

        let not_before = self.is_today().then(|| self.clock.minutes_now());
        split_into_slots(&saved, slot_minutes, not_before)
    }

    // Private helper methods

    fn position(&mut self, id: RangeId) -> Result<usize, PortalError> {
        match self.ranges.iter().position(|entry| entry.id == id) {
            Some(index) => Ok(index),
            None => Err(self.reject(PortalError::validation("Unknown time slot"))),
        }
    }

    fn is_today(&self) -> bool {
        self.selected_date == self.clock.today()
    }

    fn ensure_not_past(&mut self) -> Result<(), PortalError> {
        if self.selected_date < self.clock.today() {
            return Err(self.reject(PortalError::PastDate(self.selected_date)));
        }
        Ok(())
    }

    /// Non-empty, every range valid, no duplicate pairs.
    fn validate_set(&mut self) -> Result<Vec<(u32, u32)>, PortalError> {
        if self.ranges.is_empty() {
            return Err(self.reject(PortalError::validation("Add at least one time slot")));
        }

        let mut bounds = Vec::with_capacity(self.ranges.len());
        for (slot, entry) in self.ranges.iter().enumerate() {
            match validate_range(&entry.range) {
                Ok(pair) => bounds.push(pair),
                Err(PortalError::Validation(msg)) => {
                    let err = PortalError::validation(format!("Slot {}: {}", slot + 1, msg));
                    return Err(self.reject(err));
                }
                Err(e) => return Err(self.reject(e)),
            }
        }

        if has_duplicates(self.ranges.iter().map(|entry| &entry.range)) {
            return Err(self.reject(PortalError::validation(
                "Duplicate time slots are not allowed",
            )));
        }

        Ok(bounds)
    }

    fn current_ranges(&self) -> Vec<TimeRange> {
        self.ranges.iter().map(|entry| entry.range.clone()).collect()
    }

    async fn persist(&mut self, ranges: &[TimeRange]) -> Result<(), PortalError> {
        let result = self.store.save_ranges(&self.doctor_email, self.selected_date, ranges).await;
        match result {
            Ok(()) => Ok(()),
            Err(e) => Err(self.reject(e)),
        }
    }

    fn reject(&mut self, err: PortalError) -> PortalError {
        warn!("Availability action rejected: {}", err);
        self.notices.push(Notice::from(&err));
        err
    }
}
