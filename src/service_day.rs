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

use chrono::{NaiveDate, NaiveDateTime, TimeZone};

use crate::model::{ServiceIdx, ServiceSet, TransitNetwork};
use crate::time::{SecondsSinceDatasetUtcStart, SecondsSinceDayStart};

/// A calendar date resolved against the network : the UTC origin of its
/// stop times, and the set of services active on it.
///
/// Service days are built once per search (yesterday, today, tomorrow
/// relative to the query time) and read-only afterwards; every state of the
/// search references them by index.
#[derive(Debug, Clone)]
pub struct ServiceDay {
    date: NaiveDate,
    day_start: SecondsSinceDatasetUtcStart,
    services: ServiceSet,
}

impl ServiceDay {
    /// Returns `None` when `date` is outside the network calendar.
    pub fn new(network: &TransitNetwork, date: NaiveDate) -> Option<Self> {
        let day_start = network.calendar().day_start(&date, network.timezone())?;
        let services = network.services_running_on(&date)?;
        Some(Self {
            date,
            day_start,
            services,
        })
    }

    pub fn date(&self) -> &NaiveDate {
        &self.date
    }

    /// Converts a time of this service day into an absolute time.
    /// Returns `None` when the result would fall before the dataset start.
    pub fn time(&self, seconds: SecondsSinceDayStart) -> Option<SecondsSinceDatasetUtcStart> {
        let result =
            i64::from(self.day_start.total_seconds()) + i64::from(seconds.total_seconds());
        if result < 0 || result > i64::from(u32::MAX) {
            None
        } else {
            Some(SecondsSinceDatasetUtcStart {
                seconds: result as u32,
            })
        }
    }

    pub fn service_running(&self, service: ServiceIdx) -> bool {
        self.services.contains(service)
    }

    pub fn any_service_running(&self, services: &ServiceSet) -> bool {
        self.services.intersects(services)
    }
}

/// Builds the service days relevant to a search starting at `datetime`
/// (UTC) : yesterday, today and tomorrow in the network timezone, in that
/// order. Scanning must consider all three, and in this order : a trip
/// coded at 25:00 yesterday or at 00:30 tomorrow may both serve a state
/// just before midnight, and ties favor the earlier day.
pub fn build_search_days(network: &TransitNetwork, datetime: &NaiveDateTime) -> Vec<ServiceDay> {
    let local_date = network
        .timezone()
        .from_utc_datetime(datetime)
        .date_naive();
    let mut days = Vec::with_capacity(3);
    let candidates = [
        local_date.pred_opt(),
        Some(local_date),
        local_date.succ_opt(),
    ];
    for candidate in candidates.into_iter().flatten() {
        if let Some(day) = ServiceDay::new(network, candidate) {
            days.push(day);
        }
    }
    days
}
