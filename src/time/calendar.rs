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

use super::{
    Calendar, DaysSinceDatasetStart, SecondsSinceDatasetUtcStart, MAX_DAYS_IN_CALENDAR,
    MAX_SECONDS_SINCE_DAY_START, MAX_TIMEZONE_OFFSET,
};
use chrono::{LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use chrono_tz::Tz as Timezone;
use std::convert::TryFrom;

impl Calendar {
    pub fn new(first_date: NaiveDate, last_date: NaiveDate) -> Self {
        assert!(first_date <= last_date);
        let nb_of_days_i64: i64 = (last_date - first_date).num_days() + 1;
        assert!(
            nb_of_days_i64 < MAX_DAYS_IN_CALENDAR as i64,
            "Trying to construct a calendar with {:#} days \
            which is more than the maximum allowed of {:#} days",
            nb_of_days_i64,
            MAX_DAYS_IN_CALENDAR
        );

        // unwrap here is safe because :
        // - nb_of_days_i64 >= 0 since we asserted above that first_date <= last_date
        // - nb_of_days_i64 < MAX_DAYS_IN_CALENDAR < u16::MAX
        let nb_of_days: u16 = TryFrom::try_from(nb_of_days_i64).unwrap();

        Self {
            first_date,
            last_date,
            nb_of_days,
        }
    }

    pub fn nb_of_days(&self) -> u16 {
        self.nb_of_days
    }

    pub fn first_date(&self) -> &NaiveDate {
        &self.first_date
    }

    pub fn last_date(&self) -> &NaiveDate {
        &self.last_date
    }

    pub fn contains_date(&self, date: &NaiveDate) -> bool {
        self.first_date <= *date && *date <= self.last_date
    }

    /// The earliest datetime representable as a `SecondsSinceDatasetUtcStart`.
    /// A margin is kept before `first_date` so that overnight trips and
    /// west-most timezones still yield non-negative offsets.
    pub fn first_datetime(&self) -> NaiveDateTime {
        self.first_date.and_time(NaiveTime::MIN)
            - chrono::Duration::seconds(i64::from(MAX_TIMEZONE_OFFSET))
            - chrono::Duration::seconds(i64::from(MAX_SECONDS_SINCE_DAY_START))
    }

    pub fn last_datetime(&self) -> NaiveDateTime {
        self.last_date.and_time(NaiveTime::MIN)
            + chrono::Duration::seconds(i64::from(MAX_TIMEZONE_OFFSET))
            + chrono::Duration::seconds(i64::from(MAX_SECONDS_SINCE_DAY_START))
    }

    pub fn contains_datetime(&self, datetime: &NaiveDateTime) -> bool {
        *datetime >= self.first_datetime() && *datetime <= self.last_datetime()
    }

    pub fn to_naive_date(&self, day: &DaysSinceDatasetStart) -> NaiveDate {
        *self.first_date() + chrono::Duration::days(day.days as i64)
    }

    pub fn to_naive_datetime(&self, seconds: &SecondsSinceDatasetUtcStart) -> NaiveDateTime {
        self.first_datetime() + chrono::Duration::seconds(i64::from(seconds.seconds))
    }

    pub fn to_pretty_string(&self, seconds: &SecondsSinceDatasetUtcStart) -> String {
        let datetime = self.to_naive_datetime(seconds);
        datetime.format("%H:%M:%S %d-%b-%y").to_string()
    }

    /// Converts an UTC datetime into seconds since the dataset start.
    /// Returns `None` when the datetime is outside the validity period.
    pub fn datetime_to_seconds(
        &self,
        datetime: &NaiveDateTime,
    ) -> Option<SecondsSinceDatasetUtcStart> {
        if !self.contains_datetime(datetime) {
            return None;
        }
        let seconds_i64 = (*datetime - self.first_datetime()).num_seconds();
        // the cast is safe because we checked above that datetime is between
        // first_datetime() and last_datetime(), and the calendar length is
        // bounded by MAX_DAYS_IN_CALENDAR
        let seconds = seconds_i64 as u32;
        Some(SecondsSinceDatasetUtcStart { seconds })
    }

    pub fn date_to_days_since_start(&self, date: &NaiveDate) -> Option<DaysSinceDatasetStart> {
        self.date_to_offset(date)
            .map(|offset| DaysSinceDatasetStart { days: offset })
    }

    pub(crate) fn date_to_offset(&self, date: &NaiveDate) -> Option<u16> {
        if *date < self.first_date || *date > self.last_date {
            None
        } else {
            let offset_64: i64 = (*date - self.first_date).num_days();
            // the cast is safe because :
            //  - offset_64 is positive since we checked that date >= self.first_date
            //  - offset_64 < u16::MAX since at construction we ensured that
            //    (last_date - first_date).num_days() < MAX_DAYS_IN_CALENDAR < u16::MAX
            let offset = offset_64 as u16;
            Some(offset)
        }
    }

    /// Resolves the UTC origin of a local service day : "noon minus 12 hours"
    /// on `date` in `timezone`, expressed in seconds since the dataset start.
    /// This is the instant to which all stop times of that day are relative.
    pub fn day_start(
        &self,
        date: &NaiveDate,
        timezone: &Timezone,
    ) -> Option<SecondsSinceDatasetUtcStart> {
        if !self.contains_date(date) {
            return None;
        }
        // using noon instead of midnight makes the origin insensitive to
        // daylight saving time changes, which happen in the early morning
        let local_noon = date.and_hms_opt(12, 0, 0)?;
        let noon = match timezone.from_local_datetime(&local_noon) {
            LocalResult::Single(datetime) => datetime,
            LocalResult::Ambiguous(earliest, _) => earliest,
            LocalResult::None => {
                return None;
            }
        };
        let day_origin = noon.naive_utc() - chrono::Duration::hours(12);
        self.datetime_to_seconds(&day_origin)
    }
}
