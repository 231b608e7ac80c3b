//! Trading-calendar lookup and cache.
//!
//! The engine counts warmup in exact trading days, so converting "N trading
//! days before the requested start" into a calendar date needs a session
//! calendar. Holiday-aware calendars belong to the market-data collaborator;
//! the built-in [`WeekdayCalendar`] (Mon-Fri) is the default, and the
//! [`CalendarCache`] lets callers register richer calendars per exchange.
//!
//! The cache is an explicit object passed where needed — no process-wide
//! mutable state.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::error::DataError;

/// A trading-session calendar for one exchange.
pub trait TradingCalendar: Send + Sync {
    /// True if the exchange holds a session on `date`.
    fn is_session(&self, date: NaiveDate) -> bool;
}

/// Monday-to-Friday calendar with no holidays.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeekdayCalendar;

impl TradingCalendar for WeekdayCalendar {
    fn is_session(&self, date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
    }
}

// Scan guard: a real exchange calendar never goes this long without a
// session, so exceeding it means the registered calendar is broken.
const MAX_SESSION_GAP_DAYS: i64 = 366;

/// First session on or after `date`.
pub fn first_session_on_or_after(
    calendar: &dyn TradingCalendar,
    date: NaiveDate,
) -> Result<NaiveDate, DataError> {
    let mut candidate = date;
    for _ in 0..MAX_SESSION_GAP_DAYS {
        if calendar.is_session(candidate) {
            return Ok(candidate);
        }
        candidate += Duration::days(1);
    }
    Err(DataError::NoSession {
        date,
        scanned: MAX_SESSION_GAP_DAYS,
    })
}

/// Date of the `count`-th session strictly before `date`.
///
/// This is the warmup entry point: loading history from the returned date
/// guarantees exactly `count` trading days of data before `date`.
pub fn sessions_before(
    calendar: &dyn TradingCalendar,
    date: NaiveDate,
    count: usize,
) -> Result<NaiveDate, DataError> {
    if count == 0 {
        return first_session_on_or_after(calendar, date);
    }
    let mut remaining = count;
    let mut candidate = date;
    let mut gap: i64 = 0;
    loop {
        candidate -= Duration::days(1);
        gap += 1;
        if calendar.is_session(candidate) {
            remaining -= 1;
            if remaining == 0 {
                return Ok(candidate);
            }
            gap = 0;
        } else if gap > MAX_SESSION_GAP_DAYS {
            return Err(DataError::NoSession {
                date: candidate,
                scanned: MAX_SESSION_GAP_DAYS,
            });
        }
    }
}

/// All sessions in `[start, end]`, ascending.
pub fn sessions_in_range(
    calendar: &dyn TradingCalendar,
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<NaiveDate> {
    let mut out = Vec::new();
    let mut candidate = start;
    while candidate <= end {
        if calendar.is_session(candidate) {
            out.push(candidate);
        }
        candidate += Duration::days(1);
    }
    out
}

/// Lazily-populated calendar cache keyed by exchange code.
pub struct CalendarCache {
    calendars: HashMap<String, Arc<dyn TradingCalendar>>,
}

impl CalendarCache {
    pub fn new() -> Self {
        Self {
            calendars: HashMap::new(),
        }
    }

    /// Register a calendar for an exchange (case-insensitive key).
    pub fn register(&mut self, exchange: &str, calendar: Arc<dyn TradingCalendar>) {
        self.calendars.insert(exchange.to_uppercase(), calendar);
    }

    /// Calendar for `exchange`, populating a [`WeekdayCalendar`] on first use.
    pub fn get(&mut self, exchange: &str) -> Arc<dyn TradingCalendar> {
        self.calendars
            .entry(exchange.to_uppercase())
            .or_insert_with(|| Arc::new(WeekdayCalendar))
            .clone()
    }
}

impl Default for CalendarCache {
    fn default() -> Self {
        Self::new()
    }
}
