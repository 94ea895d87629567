//! Source of "today" for date rules (past dates, overdue loans)

use std::sync::RwLock;

use chrono::{Duration, NaiveDate, Utc};

pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Wall clock, UTC calendar date
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// Manually driven clock
#[derive(Debug)]
pub struct FixedClock {
    today: RwLock<NaiveDate>,
}

impl FixedClock {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today: RwLock::new(today),
        }
    }

    pub fn set(&self, today: NaiveDate) {
        let mut guard = self.today.write().unwrap_or_else(|e| e.into_inner());
        *guard = today;
    }

    pub fn advance_days(&self, days: i64) {
        let mut guard = self.today.write().unwrap_or_else(|e| e.into_inner());
        *guard += Duration::days(days);
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        *self.today.read().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_advances() {
        let clock = FixedClock::new(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        clock.advance_days(9);
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 6, 10).unwrap());
        clock.set(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
    }
}
