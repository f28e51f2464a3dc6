//! Generation date stamp for file banners

use chrono::{Local, NaiveDate};

/// Format of the date written into banners
pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// Supplies the generation date
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;

    fn date_stamp(&self) -> String {
        self.today().format(DATE_FORMAT).to_string()
    }
}

/// Local wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Always reports the same date, for reproducible output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDate);

impl FixedClock {
    /// `None` for an impossible date
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
