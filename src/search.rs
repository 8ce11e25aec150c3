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

pub mod board_alight;
pub mod state;

use std::sync::Arc;

use chrono::NaiveDateTime;

use crate::model::{PatternIdx, TransitNetwork};
use crate::realtime::snapshot::RealtimeSnapshot;
use crate::service_day::{build_search_days, ServiceDay};
use crate::time::SecondsSinceDatasetUtcStart;
use crate::timetables::Timetable;
use crate::transfers::TransferTable;

#[derive(Debug)]
pub enum BadRequest {
    DatetimeOutOfCalendar(NaiveDateTime),
}

impl std::fmt::Display for BadRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BadRequest::DatetimeOutOfCalendar(datetime) => write!(
                f,
                "The requested datetime {} is out of the validity period of the data.",
                datetime
            ),
        }
    }
}

impl std::error::Error for BadRequest {}

/// Everything a search reads while it runs : the static network, the
/// transfer rules, the service days around the query time, and the realtime
/// snapshot pinned at search start.
///
/// All of it is read-shared and immutable for the duration of the search,
/// so traversals are plain synchronous computation with no locking.
pub struct SearchContext<'a> {
    pub network: &'a TransitNetwork,
    pub transfers: &'a TransferTable,
    /// yesterday, today, tomorrow relative to the query time, in that order
    pub service_days: Vec<ServiceDay>,
    /// the snapshot this search reads; never replaced mid-search, so a
    /// stale-but-consistent view is all a traversal can ever observe
    pub snapshot: Arc<RealtimeSnapshot>,
    start_time: SecondsSinceDatasetUtcStart,
}

impl<'a> SearchContext<'a> {
    pub fn new(
        network: &'a TransitNetwork,
        transfers: &'a TransferTable,
        snapshot: Arc<RealtimeSnapshot>,
        datetime: &NaiveDateTime,
    ) -> Result<Self, BadRequest> {
        let start_time = network
            .calendar()
            .datetime_to_seconds(datetime)
            .ok_or(BadRequest::DatetimeOutOfCalendar(*datetime))?;
        let service_days = build_search_days(network, datetime);
        Ok(Self {
            network,
            transfers,
            service_days,
            snapshot,
            start_time,
        })
    }

    pub fn start_time(&self) -> SecondsSinceDatasetUtcStart {
        self.start_time
    }

    /// The timetable a traversal must read for `(pattern, day)` : the
    /// realtime overlay of the pinned snapshot when one exists, else the
    /// scheduled baseline.
    pub fn effective_timetable(&self, pattern: PatternIdx, day: &ServiceDay) -> &Timetable {
        match self.snapshot.resolve(pattern, day.date()) {
            Some(timetable) => timetable.as_ref(),
            None => self.network.scheduled_timetable(pattern),
        }
    }
}
