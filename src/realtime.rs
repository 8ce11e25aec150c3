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

pub mod snapshot;
pub mod snapshot_source;

use chrono::NaiveDate;

use crate::time::SecondsSinceDayStart;
use crate::timetables::TripTimesError;

/// One structured update record, as delivered by an (out of scope) feed
/// poller/parser : a trip reference, the affected service date, and either
/// a cancellation or per-stop time adjustments.
#[derive(Debug, Clone)]
pub struct TripUpdate {
    pub trip_id: String,
    pub date: NaiveDate,
    pub canceled: bool,
    pub stop_time_updates: Vec<StopTimeUpdate>,
}

#[derive(Debug, Clone)]
pub struct StopTimeUpdate {
    /// position of the stop within the trip's pattern
    pub position: usize,
    pub event: StopTimeEvent,
}

#[derive(Debug, Clone)]
pub enum StopTimeEvent {
    /// shift of arrival and departure, propagated downstream until the next
    /// explicit event
    Delay { seconds: i32 },
    /// explicit replacement times
    NewTimes {
        arrival: SecondsSinceDayStart,
        departure: SecondsSinceDayStart,
    },
}

/// Why one update record could not be applied. A bad record is dropped and
/// counted; it never aborts the rest of its batch.
#[derive(Debug)]
pub enum UpdateError {
    UnknownTrip(String),
    DateOutOfCalendar(String, NaiveDate),
    MissingScheduledRow(String, NaiveDate),
    Times(String, TripTimesError),
}

impl std::fmt::Display for UpdateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpdateError::UnknownTrip(trip_id) => {
                write!(f, "the trip `{}` is unknown to the network", trip_id)
            }
            UpdateError::DateOutOfCalendar(trip_id, date) => write!(
                f,
                "the update of trip `{}` targets {}, which is outside the calendar",
                trip_id, date
            ),
            UpdateError::MissingScheduledRow(trip_id, date) => write!(
                f,
                "no scheduled times for trip `{}` to apply an update for {} onto",
                trip_id, date
            ),
            UpdateError::Times(trip_id, error) => write!(
                f,
                "the update of trip `{}` yields invalid stop times : {}",
                trip_id, error
            ),
        }
    }
}

impl std::error::Error for UpdateError {}
