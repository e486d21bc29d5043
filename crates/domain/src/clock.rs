//! Time source for order numbers and timestamps.

use chrono::{DateTime, Local, NaiveDate, Utc};

/// Supplies the current instant and the server-local calendar date.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// The calendar date order numbers are stamped with.
    fn today(&self) -> NaiveDate;
}

/// Wall clock; order-number dates use the server's local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Clock pinned to a settable date, for tests and replays.
#[derive(Debug)]
pub struct ManualClock {
    today: std::sync::RwLock<NaiveDate>,
}

impl ManualClock {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today: std::sync::RwLock::new(today),
        }
    }

    /// Moves the clock to another calendar date.
    pub fn set_today(&self, today: NaiveDate) {
        *self
            .today
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = today;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> NaiveDate {
        *self
            .today
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
