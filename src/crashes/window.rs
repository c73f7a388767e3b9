//! Date and card windows
//!
//! A [`DateWindow`] is a month span inside one calendar year, the unit the
//! upstream API accepts. A [`CardWindow`] is a slice of the paginated crash
//! cards for one date window.

use crate::{GibddError, Result};
use chrono::{Datelike, NaiveDate};
use std::fmt;
use std::ops::RangeInclusive;

/// Formats one upstream date tag, e.g. `MONTHS:3.2020`
pub fn date_tag(year: i32, month: u32) -> String {
    format!("MONTHS:{}.{}", month, year)
}

/// Month span within one calendar year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateWindow {
    year: i32,
    first_month: u32,
    last_month: u32,
}

impl DateWindow {
    pub(crate) fn new(year: i32, first_month: u32, last_month: u32) -> Result<Self> {
        if !(1..=12).contains(&first_month) || !(1..=12).contains(&last_month) {
            return Err(GibddError::InvalidWindow(format!(
                "months must be within 1-12, got {}-{}",
                first_month, last_month
            )));
        }

        if last_month < first_month {
            return Err(GibddError::InvalidWindow(format!(
                "last month {} is before first month {}",
                last_month, first_month
            )));
        }

        Ok(Self {
            year,
            first_month,
            last_month,
        })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn first_month(&self) -> u32 {
        self.first_month
    }

    pub fn last_month(&self) -> u32 {
        self.last_month
    }

    pub fn months(&self) -> RangeInclusive<u32> {
        self.first_month..=self.last_month
    }

    /// One date tag per month of the window, in order
    pub fn date_tags(&self) -> Vec<String> {
        self.months().map(|m| date_tag(self.year, m)).collect()
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} months {}-{}",
            self.year, self.first_month, self.last_month
        )
    }
}

/// Half-open slice `[start, end)` of a date window's crash cards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardWindow {
    start: u32,
    end: u32,
}

impl CardWindow {
    /// Single-card window used to learn the total count
    pub const PROBE: CardWindow = CardWindow { start: 0, end: 1 };

    pub fn new(start: u32, end: u32) -> Result<Self> {
        if end < start {
            return Err(GibddError::InvalidWindow(format!(
                "card window end {} is before start {}",
                end, start
            )));
        }
        Ok(Self { start, end })
    }

    /// Window covering the first `count` cards
    pub fn sized(count: u32) -> Self {
        Self {
            start: 0,
            end: count,
        }
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Splits `[period_start, period_end]` into per-year month windows
///
/// The first window runs from the start month to December, every full year
/// in between covers January-December, and the last window runs from January
/// to the end month. A span inside one year yields a single window.
/// Days are ignored; only years and months matter upstream.
///
/// # Errors
///
/// `InvalidPeriod` when `period_end` is earlier than `period_start`.
pub fn split_range(period_start: NaiveDate, period_end: NaiveDate) -> Result<Vec<DateWindow>> {
    if period_end < period_start {
        return Err(GibddError::InvalidPeriod {
            start: period_start,
            end: period_end,
        });
    }

    let (start_year, start_month) = (period_start.year(), period_start.month());
    let (end_year, end_month) = (period_end.year(), period_end.month());

    if start_year == end_year {
        return Ok(vec![DateWindow::new(start_year, start_month, end_month)?]);
    }

    let mut windows = Vec::with_capacity((end_year - start_year + 1) as usize);
    windows.push(DateWindow::new(start_year, start_month, 12)?);
    for year in (start_year + 1)..end_year {
        windows.push(DateWindow::new(year, 1, 12)?);
    }
    windows.push(DateWindow::new(end_year, 1, end_month)?);

    Ok(windows)
}
