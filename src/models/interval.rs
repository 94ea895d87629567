//! Date ranges and the overlap rule shared by every conflict query.
//!
//! Ranges are half-open day ranges: `start` is the first day, `end` is the
//! first day after the range. Two ranges that only touch (`a.end == b.start`)
//! do not overlap.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult, ErrorCode};

/// Half-open interval intersection: `a_start < b_end && b_start < a_end`
pub fn overlaps(a_start: NaiveDate, a_end: NaiveDate, b_start: NaiveDate, b_end: NaiveDate) -> bool {
    a_start < b_end && b_start < a_end
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Build a range, refusing empty or inverted ones
    pub fn new(start: NaiveDate, end: NaiveDate) -> AppResult<Self> {
        if start >= end {
            return Err(AppError::InvalidInput(
                ErrorCode::InvalidDates,
                format!("start_date {} must be before end_date {}", start, end),
            ));
        }
        Ok(Self { start, end })
    }

    /// Build a range that must also not start before `today`
    pub fn new_from(start: NaiveDate, end: NaiveDate, today: NaiveDate) -> AppResult<Self> {
        let range = Self::new(start, end)?;
        if range.start < today {
            return Err(AppError::InvalidInput(
                ErrorCode::PastDate,
                format!("start_date {} is in the past", start),
            ));
        }
        Ok(range)
    }

    pub fn overlaps(&self, other: &DateRange) -> bool {
        overlaps(self.start, self.end, other.start, other.end)
    }

    /// True when `other` lies entirely inside this range
    pub fn contains(&self, other: &DateRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Parts of `self` left over after removing `other`, in date order
    pub fn subtract(&self, other: &DateRange) -> Vec<DateRange> {
        if !self.overlaps(other) {
            return vec![*self];
        }
        let mut rest = Vec::with_capacity(2);
        if self.start < other.start {
            rest.push(DateRange { start: self.start, end: other.start });
        }
        if other.end < self.end {
            rest.push(DateRange { start: other.end, end: self.end });
        }
        rest
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}
