use std::fmt;
use std::str::FromStr;
use std::thread;
use std::time::Duration;

use chrono::{Local, NaiveDateTime, NaiveTime};
use tracing::info;

use crate::error::AppError;

pub const DEFAULT_RUN_TIME: &str = "09:00";
pub const POLL_INTERVAL: Duration = Duration::from_secs(60);

/// A job that runs once a day at a fixed local wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    at: NaiveTime,
}

impl DailySchedule {
    pub fn new(at: NaiveTime) -> Self {
        Self { at }
    }

    /// The first run time strictly after `now`.
    pub fn next_run_after(&self, now: NaiveDateTime) -> NaiveDateTime {
        let today = now.date().and_time(self.at);
        if today > now {
            today
        } else {
            today + chrono::Duration::days(1)
        }
    }

    /// Runs `job` immediately, then every day at the scheduled time,
    /// checking the clock every `poll`. Only ends with the process.
    pub fn run_forever<F: FnMut()>(&self, poll: Duration, mut job: F) -> ! {
        info!("Scheduler started. Will run daily at {}", self);

        let mut next_run = self.next_run_after(Local::now().naive_local());

        info!("Running initial digest on startup...");
        job();

        loop {
            thread::sleep(poll);
            let now = Local::now().naive_local();
            if now >= next_run {
                job();
                next_run = self.next_run_after(Local::now().naive_local());
                info!("Next digest scheduled for {}", next_run.format("%Y-%m-%d %H:%M"));
            }
        }
    }
}

impl FromStr for DailySchedule {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveTime::parse_from_str(s.trim(), "%H:%M")
            .map(Self::new)
            .map_err(|e| AppError::ConfigError(format!("Invalid run time {:?} (expected HH:MM): {}", s, e)))
    }
}

impl fmt::Display for DailySchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.at.format("%H:%M"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn parses_hh_mm() {
        let schedule: DailySchedule = "09:00".parse().unwrap();
        assert_eq!(schedule.to_string(), "09:00");
        assert_eq!("18:45".parse::<DailySchedule>().unwrap().to_string(), "18:45");
    }

    #[test]
    fn rejects_invalid_times() {
        assert!("25:00".parse::<DailySchedule>().is_err());
        assert!("noon".parse::<DailySchedule>().is_err());
        assert!("".parse::<DailySchedule>().is_err());
    }

    #[test]
    fn next_run_is_today_when_still_ahead() {
        let schedule: DailySchedule = "09:00".parse().unwrap();
        assert_eq!(schedule.next_run_after(at(7, 30)), at(9, 0));
    }

    #[test]
    fn next_run_rolls_over_to_tomorrow() {
        let schedule: DailySchedule = "09:00".parse().unwrap();
        let tomorrow = at(9, 0) + chrono::Duration::days(1);
        assert_eq!(schedule.next_run_after(at(9, 0)), tomorrow);
        assert_eq!(schedule.next_run_after(at(23, 59)), tomorrow);
    }
}
