use chrono::{DateTime, Utc};

use crate::domain::YearMonth;

/// Source of "now" for operations that depend on the calendar.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn current_month(&self) -> YearMonth {
        YearMonth::of_instant(self.now())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a single instant; used by tests and replayed scripts.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
