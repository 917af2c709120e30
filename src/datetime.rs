use std::sync::OnceLock;

use chrono::{Datelike, Duration, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Microseconds in a day.
const DAY_US: i64 = 86_400_000_000;

/// Calendar epoch used to interpret serial date numbers.
///
/// Spreadsheets support two base date systems:
/// - `Windows1900` (the default; reproduces the Lotus 1-2-3 leap year bug in
///   which the nonexistent date 1900-02-29 is serial number 60)
/// - `Mac1904` (epoch 1904-01-01, no bug)
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Calendar {
    #[serde(rename = "windows_1900")]
    Windows1900,
    #[serde(rename = "mac_1904")]
    Mac1904,
}

impl Default for Calendar {
    fn default() -> Self {
        Calendar::Windows1900
    }
}

fn base_1900() -> NaiveDate {
    NaiveDate::from_ymd_opt(1899, 12, 31).expect("valid epoch")
}

fn base_1904() -> NaiveDate {
    NaiveDate::from_ymd_opt(1904, 1, 1).expect("valid epoch")
}

/// A calendar date.
///
/// The fields are plain so that the phantom 1900-02-29 (which the 1900 date
/// system assigns serial 60) is representable; every other value is validated
/// when converting to or from serial numbers.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Date {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl Date {
    pub const fn new(year: i32, month: u32, day: u32) -> Self {
        Self { year, month, day }
    }

    fn is_1900_leap_bug_day(&self) -> bool {
        self.year == 1900 && self.month == 2 && self.day == 29
    }

    fn to_civil(self) -> Result<NaiveDate, ModelError> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day).ok_or_else(|| {
            ModelError::InvalidParameter(format!(
                "invalid date {}-{:02}-{:02}",
                self.year, self.month, self.day
            ))
        })
    }

    /// Day count since the calendar epoch.
    ///
    /// In the 1900 system, serials at or beyond 1900-03-01 are one day ahead
    /// of the real calendar so that the phantom 1900-02-29 occupies serial 60.
    pub fn to_number(self, calendar: Calendar) -> Result<i64, ModelError> {
        match calendar {
            Calendar::Windows1900 => {
                if self.is_1900_leap_bug_day() {
                    return Ok(60);
                }
                let civil = self.to_civil()?;
                let days = (civil - base_1900()).num_days();
                Ok(if days >= 60 { days + 1 } else { days })
            }
            Calendar::Mac1904 => {
                let civil = self.to_civil()?;
                Ok((civil - base_1904()).num_days())
            }
        }
    }

    /// Exact inverse of [`Date::to_number`].
    pub fn from_number(number: i64, calendar: Calendar) -> Result<Self, ModelError> {
        if number < 0 {
            return Err(ModelError::InvalidParameter(format!(
                "negative date serial {number}"
            )));
        }
        let civil = match calendar {
            Calendar::Windows1900 => {
                if number == 60 {
                    return Ok(Date::new(1900, 2, 29));
                }
                let days = if number > 60 { number - 1 } else { number };
                base_1900() + Duration::days(days)
            }
            Calendar::Mac1904 => base_1904() + Duration::days(number),
        };
        Ok(Date::new(civil.year(), civil.month(), civil.day()))
    }

    /// Day of the week, Sunday = 0 through Saturday = 6.
    ///
    /// The phantom 1900-02-29 reports Wednesday, consistent with the fiction
    /// that 1900-01-01 (serial 1) was a Sunday.
    pub fn weekday(self) -> Result<u32, ModelError> {
        if self.is_1900_leap_bug_day() {
            return Ok(3);
        }
        Ok(self.to_civil()?.weekday().num_days_from_sunday())
    }
}

/// A time of day with microsecond resolution.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Time {
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub microsecond: u32,
}

impl Time {
    pub const fn new(hour: u32, minute: u32, second: u32, microsecond: u32) -> Self {
        Self {
            hour,
            minute,
            second,
            microsecond,
        }
    }

    fn total_microseconds(self) -> i64 {
        i64::from(self.hour) * 3_600_000_000
            + i64::from(self.minute) * 60_000_000
            + i64::from(self.second) * 1_000_000
            + i64::from(self.microsecond)
    }

    /// Fraction of a day, accurate to about one microsecond.
    pub fn to_number(self) -> f64 {
        self.total_microseconds() as f64 / DAY_US as f64
    }

    /// Rebuild a time of day from a day fraction, rounding to the nearest
    /// microsecond and carrying overflow through seconds, minutes and hours.
    /// The boolean is true when rounding carried into the next day.
    pub fn from_day_fraction(fraction: f64) -> (Self, bool) {
        let mut us = (fraction * DAY_US as f64).round() as i64;
        let carried = us >= DAY_US;
        if carried {
            us -= DAY_US;
        }
        let us = us.max(0);
        let time = Self {
            hour: (us / 3_600_000_000) as u32,
            minute: (us / 60_000_000 % 60) as u32,
            second: (us / 1_000_000 % 60) as u32,
            microsecond: (us % 1_000_000) as u32,
        };
        (time, carried)
    }

    /// Inverse of [`Time::to_number`] for fractions within one day.
    pub fn from_number(fraction: f64) -> Self {
        Self::from_day_fraction(fraction).0
    }

    /// Parse a time-of-day literal: `H:MM`, `H:MM:SS`, `H:MM:SS.ffffff`.
    ///
    /// When the final component carries a fraction and only two components
    /// are present, they are minutes and seconds (`"30:33.87"` is 30 minutes
    /// 33.87 seconds, not 30 hours). Fractions beyond six digits truncate.
    /// Returns `None` when the text does not match the grammar or a component
    /// is out of range.
    pub fn parse(text: &str) -> Option<Self> {
        static PATTERN: OnceLock<Regex> = OnceLock::new();
        let pattern = PATTERN.get_or_init(|| {
            Regex::new(r"^(\d{1,2}):(\d{1,2})(?::(\d{1,2}))?(?:\.(\d+))?$")
                .expect("time pattern compiles")
        });
        let captures = pattern.captures(text)?;

        let first: u32 = captures[1].parse().ok()?;
        let second_component: u32 = captures[2].parse().ok()?;
        let third: Option<u32> = captures.get(3).and_then(|m| m.as_str().parse().ok());
        let microsecond = captures.get(4).map_or(0, |m| {
            let digits = m.as_str();
            let mut padded: String = digits.chars().take(6).collect();
            while padded.len() < 6 {
                padded.push('0');
            }
            padded.parse().unwrap_or(0)
        });

        let (hour, minute, second) = match third {
            Some(s) => (first, second_component, s),
            // A fraction with only two components means minutes:seconds.
            None if captures.get(4).is_some() => (0, first, second_component),
            None => (first, second_component, 0),
        };

        if hour >= 24 || minute >= 60 || second >= 60 {
            return None;
        }
        Some(Self::new(hour, minute, second, microsecond))
    }
}

/// A calendar date combined with a time of day.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateTime {
    pub date: Date,
    pub time: Time,
}

impl DateTime {
    #[allow(clippy::too_many_arguments)]
    pub const fn new(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
        microsecond: u32,
    ) -> Self {
        Self {
            date: Date::new(year, month, day),
            time: Time::new(hour, minute, second, microsecond),
        }
    }

    /// Serial number: whole days since the epoch plus the day fraction.
    pub fn to_number(self, calendar: Calendar) -> Result<f64, ModelError> {
        Ok(self.date.to_number(calendar)? as f64 + self.time.to_number())
    }

    /// Exact inverse of [`DateTime::to_number`], carrying microsecond
    /// round-up into the next day when needed.
    pub fn from_number(number: f64, calendar: Calendar) -> Result<Self, ModelError> {
        let mut serial_day = number.floor() as i64;
        let (time, carried) = Time::from_day_fraction(number - serial_day as f64);
        if carried {
            serial_day += 1;
        }
        Ok(Self {
            date: Date::from_number(serial_day, calendar)?,
            time,
        })
    }
}

/// A duration, stored in calendar-free components.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Timedelta {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    pub microseconds: i64,
}

impl Timedelta {
    pub const fn new(days: i64, hours: i64, minutes: i64, seconds: i64, microseconds: i64) -> Self {
        Self {
            days,
            hours,
            minutes,
            seconds,
            microseconds,
        }
    }

    /// Duration as a (possibly fractional) number of days.
    pub fn to_number(self) -> f64 {
        let us = self.days * DAY_US
            + self.hours * 3_600_000_000
            + self.minutes * 60_000_000
            + self.seconds * 1_000_000
            + self.microseconds;
        us as f64 / DAY_US as f64
    }

    /// Inverse of [`Timedelta::to_number`], normalized to positive
    /// sub-day components.
    pub fn from_number(number: f64) -> Self {
        let days = number.floor() as i64;
        let (time, carried) = Time::from_day_fraction(number - days as f64);
        Self {
            days: days + i64::from(carried),
            hours: i64::from(time.hour),
            minutes: i64::from(time.minute),
            seconds: i64::from(time.second),
            microseconds: i64::from(time.microsecond),
        }
    }
}
