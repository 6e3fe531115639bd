//! Calendar source for the daily access-key window.

use chrono::{NaiveDate, Utc};

/// Supplies "today" as a UTC calendar date.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;

    /// Today's date as `YYYY-MM-DD`.
    fn today_iso(&self) -> String {
        self.today().format("%Y-%m-%d").to_string()
    }
}

/// Wall clock, UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// Clock pinned to a settable date.
#[derive(Debug)]
pub struct FixedClock {
    date: std::sync::RwLock<NaiveDate>,
}

impl FixedClock {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date: std::sync::RwLock::new(date),
        }
    }

    /// Move the clock forward by `days`.
    pub fn advance_days(&self, days: u64) {
        if let Ok(mut date) = self.date.write()
            && let Some(next) = date.checked_add_days(chrono::Days::new(days))
        {
            *date = next;
        }
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.date
            .read()
            .map(|d| *d)
            .unwrap_or_else(|_| Utc::now().date_naive())
    }
}
