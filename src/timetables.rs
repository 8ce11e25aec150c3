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

mod timetable;
mod trip_times;

pub use timetable::Timetable;
pub use trip_times::{inspect, TripTimes};

use crate::model::StopIdx;

#[derive(Debug, PartialEq, Eq, Clone, Copy, PartialOrd, Ord)]
pub enum FlowDirection {
    BoardOnly,
    DebarkOnly,
    BoardAndDebark,
    NoBoardDebark,
}

pub type StopFlows = Vec<(StopIdx, FlowDirection)>;

/// An invalid set of stop times for one trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TripTimesError {
    DepartureBeforeArrival(usize),   // departure[position] < arrival[position]
    DecreasingTimes(usize, usize),   // arrival[downstream] < departure[upstream]
    BadLength,                       // fewer than two positions, or mismatched vectors
    BadPosition(usize),              // an update names a position the trip does not have
    TimeOutOfRange(usize),           // a time shifted outside the allowed [-48h, 48h] range
}

impl std::fmt::Display for TripTimesError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TripTimesError::DepartureBeforeArrival(position) => write!(
                f,
                "departure time at position {} is before the arrival time there",
                position
            ),
            TripTimesError::DecreasingTimes(upstream, downstream) => write!(
                f,
                "arrival time at position {} is before the departure time at position {}",
                downstream, upstream
            ),
            TripTimesError::BadLength => {
                write!(f, "a trip needs at least two positions and equal-length time vectors")
            }
            TripTimesError::BadPosition(position) => write!(
                f,
                "position {} does not exist on this trip",
                position
            ),
            TripTimesError::TimeOutOfRange(position) => write!(
                f,
                "the time at position {} falls outside the allowed range of a service day",
                position
            ),
        }
    }
}

impl std::error::Error for TripTimesError {}
