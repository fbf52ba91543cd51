use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate, Weekday};

use super::domain::DayType;
use crate::config::CalendarConfig;

/// Day-of-week classification consumed by the routing policy.
pub trait Calendar: Send + Sync {
    fn classify(&self, date: NaiveDate) -> DayType;
}

/// Monday to Friday working week with optional institution holidays.
#[derive(Debug, Clone, Default)]
pub struct WorkweekCalendar {
    holidays: BTreeSet<NaiveDate>,
}

impl WorkweekCalendar {
    pub fn with_holidays(holidays: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            holidays: holidays.into_iter().collect(),
        }
    }

    pub fn from_config(config: &CalendarConfig) -> Self {
        Self::with_holidays(config.holidays.iter().copied())
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains(&date)
    }
}

impl Calendar for WorkweekCalendar {
    fn classify(&self, date: NaiveDate) -> DayType {
        match date.weekday() {
            Weekday::Sat | Weekday::Sun => DayType::WeekendOrHoliday,
            _ if self.is_holiday(date) => DayType::WeekendOrHoliday,
            _ => DayType::Weekday,
        }
    }
}
