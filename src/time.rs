// Copyright  (C) 2020, Kisio Digital and/or its affiliates. All rights reserved.
//
// This file is part of Navitia,
// the software to build cool stuff with public transport.
//
// Hope you'll enjoy and contribute to this project,
// powered by Kisio Digital (www.kisio.com).
// Help us simplify mobility and open public transport:
// a non ending quest to the responsive locomotion way of traveling!
//
// This contribution is a part of the research and development work of the
// IVA Project which aims to enhance traveler information and is carried out
// under the leadership of the Technological Research Institute SystemX,
// with the partnership and support of the transport organization authority
// Ile-De-France Mobilités (IDFM), SNCF, and public funds
// under the scope of the French Program "Investissements d’Avenir".
//
// LICENCE: This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <http://www.gnu.org/licenses/>.
//
// Stay tuned using
// twitter @navitia
// channel `#navitia` on riot https://riot.im/app/#/room/#navitia:matrix.org
// https://groups.google.com/d/forum/navitia
// www.navitia.io

use chrono::NaiveDate;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

mod calendar;

/// Duration since "noon minus 12 hours" on a service day.
/// This corresponds to the "Time" notion found in gtfs stop_times.txt :
/// a trip running overnight may have times greater than 24:00:00, and a
/// service day shifted by realtime may reach backwards before 00:00:00.
/// Only values between -48:00:00 and 48:00:00 are representable.
#[derive(Debug, Clone, Copy, Eq, PartialEq, PartialOrd, Ord, Hash)]
pub struct SecondsSinceDayStart {
    seconds: i32,
}

pub const MAX_SECONDS_SINCE_DAY_START: i32 = 48 * 60 * 60; // 48h

pub const MAX_TIMEZONE_OFFSET: i32 = 24 * 60 * 60; // 24h in seconds

/// Duration since 00:00:00 UTC on the first allowed day of the data,
/// minus a safety margin for timezones and overnight trips.
/// This is used in the search to store a point in time in an unambiguous way.
#[derive(Debug, Clone, Copy, Eq, PartialEq, PartialOrd, Ord, Hash)]
pub struct SecondsSinceDatasetUtcStart {
    pub(crate) seconds: u32,
}

/// Number of days since the first allowed day of the data
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct DaysSinceDatasetStart {
    pub(crate) days: u16,
}

// we allow 36_600 days which is more than 100 years, and less than u16::MAX = 65_535 days
pub const MAX_DAYS_IN_CALENDAR: u16 = 100 * 366;

pub struct Calendar {
    first_date: NaiveDate, // first date which may be allowed
    last_date: NaiveDate,  // last date (included) which may be allowed
    nb_of_days: u16,       // == (last_date - first_date).num_of_days() + 1
                           // we allow at most MAX_DAYS_IN_CALENDAR days
}

#[derive(Debug, Eq, PartialEq, Clone, Copy, Ord, PartialOrd)]
pub struct PositiveDuration {
    pub(crate) seconds: u32,
}

impl PositiveDuration {
    pub fn zero() -> Self {
        Self { seconds: 0 }
    }

    pub const fn from_seconds(seconds: u32) -> Self {
        Self { seconds }
    }

    pub const fn from_hms(hours: u32, minutes: u32, seconds: u32) -> PositiveDuration {
        let total_seconds = seconds + 60 * minutes + 60 * 60 * hours;
        PositiveDuration {
            seconds: total_seconds,
        }
    }

    pub fn total_seconds(&self) -> u64 {
        self.seconds as u64
    }

    pub fn is_zero(&self) -> bool {
        self.seconds == 0
    }
}

impl Display for PositiveDuration {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let hours = self.seconds / (60 * 60);
        let minutes_in_secs = self.seconds % (60 * 60);
        let minutes = minutes_in_secs / 60;
        let seconds = minutes_in_secs % 60;
        write!(f, "{:02}:{:02}:{:02}", hours, minutes, seconds)
    }
}

#[derive(Debug)]
pub struct DurationParseError {
    text: String,
}

impl Display for DurationParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Unable to parse `{}` as a duration. A duration should look like 01:23:45.",
            self.text
        )
    }
}

impl std::error::Error for DurationParseError {}

impl FromStr for PositiveDuration {
    type Err = DurationParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mk_err = || DurationParseError {
            text: text.to_string(),
        };
        let mut fields = text.split(':');
        let hours: u32 = fields
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(mk_err)?;
        let minutes: u32 = fields
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(mk_err)?;
        let seconds: u32 = fields
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(mk_err)?;
        if fields.next().is_some() || minutes >= 60 || seconds >= 60 {
            return Err(mk_err());
        }
        Ok(PositiveDuration::from_hms(hours, minutes, seconds))
    }
}

impl Serialize for PositiveDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PositiveDuration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        PositiveDuration::from_str(&text).map_err(de::Error::custom)
    }
}

impl std::ops::Add for PositiveDuration {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            seconds: self.seconds + rhs.seconds,
        }
    }
}

impl SecondsSinceDayStart {
    pub fn zero() -> Self {
        Self { seconds: 0 }
    }

    pub fn min() -> Self {
        Self {
            seconds: -MAX_SECONDS_SINCE_DAY_START,
        }
    }

    pub fn max() -> Self {
        Self {
            seconds: MAX_SECONDS_SINCE_DAY_START,
        }
    }

    pub fn from_seconds(seconds: i32) -> Option<Self> {
        if seconds > MAX_SECONDS_SINCE_DAY_START || seconds < -MAX_SECONDS_SINCE_DAY_START {
            None
        } else {
            Some(Self { seconds })
        }
    }

    /// Builds from an "extended" hour that may exceed 24, as in gtfs stop_times.
    pub fn from_hms(hours: u32, minutes: u32, seconds: u32) -> Option<Self> {
        let total = (seconds + 60 * minutes + 60 * 60 * hours) as i64;
        if total > MAX_SECONDS_SINCE_DAY_START as i64 {
            None
        } else {
            Some(Self {
                seconds: total as i32,
            })
        }
    }

    pub fn total_seconds(&self) -> i32 {
        self.seconds
    }

    /// Shifts by a (possibly negative) number of seconds.
    /// Returns `None` when the result falls outside the allowed [-48h, 48h] range.
    pub fn checked_add_signed(&self, delta: i32) -> Option<Self> {
        let result = i64::from(self.seconds) + i64::from(delta);
        if result > MAX_SECONDS_SINCE_DAY_START as i64
            || result < -(MAX_SECONDS_SINCE_DAY_START as i64)
        {
            None
        } else {
            Some(Self {
                seconds: result as i32,
            })
        }
    }
}

impl Display for SecondsSinceDayStart {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let sign = if self.seconds < 0 { "-" } else { "" };
        let abs = self.seconds.unsigned_abs();
        write!(
            f,
            "{}{:02}:{:02}:{:02}",
            sign,
            abs / 60 / 60,
            abs / 60 % 60,
            abs % 60
        )
    }
}

impl FromStr for SecondsSinceDayStart {
    type Err = DurationParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mk_err = || DurationParseError {
            text: text.to_string(),
        };
        let (sign, body) = match text.strip_prefix('-') {
            Some(body) => (-1i32, body),
            None => (1i32, text),
        };
        let mut fields = body.split(':');
        let hours: u32 = fields
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(mk_err)?;
        let minutes: u32 = fields
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(mk_err)?;
        let seconds: u32 = fields
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(mk_err)?;
        if fields.next().is_some() || minutes >= 60 || seconds >= 60 {
            return Err(mk_err());
        }
        let total = (seconds + 60 * minutes + 60 * 60 * hours) as i64 * i64::from(sign);
        if total.unsigned_abs() > MAX_SECONDS_SINCE_DAY_START as u64 {
            return Err(mk_err());
        }
        Ok(Self {
            seconds: total as i32,
        })
    }
}

impl SecondsSinceDatasetUtcStart {
    pub fn total_seconds(&self) -> u32 {
        self.seconds
    }

    pub fn duration_since(
        &self,
        earlier: &SecondsSinceDatasetUtcStart,
    ) -> Option<PositiveDuration> {
        self.seconds
            .checked_sub(earlier.seconds)
            .map(|seconds| PositiveDuration { seconds })
    }

    pub fn checked_add(&self, duration: PositiveDuration) -> Option<Self> {
        self.seconds
            .checked_add(duration.seconds)
            .map(|seconds| Self { seconds })
    }

    pub fn checked_sub(&self, duration: PositiveDuration) -> Option<Self> {
        self.seconds
            .checked_sub(duration.seconds)
            .map(|seconds| Self { seconds })
    }
}

impl std::ops::Add<PositiveDuration> for SecondsSinceDatasetUtcStart {
    type Output = Self;

    fn add(self, rhs: PositiveDuration) -> Self::Output {
        Self {
            seconds: self.seconds + rhs.seconds,
        }
    }
}
