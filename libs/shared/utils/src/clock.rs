use std::sync::Mutex;

use chrono::{Local, NaiveDate, NaiveDateTime, Timelike};

/// Source of the portal's notion of "now", in the user's local time.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }

    /// Minutes elapsed since local midnight.
    fn minutes_now(&self) -> u32 {
        let now = self.now();
        now.hour() * 60 + now.minute()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Clock frozen at a settable instant.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<NaiveDateTime>,
}

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self { now: Mutex::new(now) }
    }

    /// `date` at `hour:minute`; panics on an impossible time, test use only.
    pub fn at(date: NaiveDate, hour: u32, minute: u32) -> Self {
        let time = date
            .and_hms_opt(hour, minute, 0)
            .unwrap_or_else(|| panic!("invalid test time {}:{}", hour, minute));
        Self::new(time)
    }

    pub fn set(&self, now: NaiveDateTime) {
        if let Ok(mut guard) = self.now.lock() {
            *guard = now;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        match self.now.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}
