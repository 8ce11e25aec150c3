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

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use chrono_tz::Tz as Timezone;

use crate::time::Calendar;
use crate::timetables::{StopFlows, Timetable};

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord)]
pub struct StopIdx {
    pub(crate) idx: usize,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord)]
pub struct RouteIdx {
    pub(crate) idx: usize,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord)]
pub struct PatternIdx {
    pub(crate) idx: usize,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord)]
pub struct TripIdx {
    pub(crate) idx: usize,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord)]
pub struct ServiceIdx {
    pub(crate) idx: usize,
}

/// Physical mode of a pattern, used for mode filtering and per-mode costs.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Mode {
    Bus,
    Coach,
    Tramway,
    Metro,
    Train,
    Ferry,
    Funicular,
    Gondola,
}

impl Mode {
    fn mask(self) -> u32 {
        1u32 << (self as u32)
    }
}

/// A set of `Mode`s stored as a bitmask.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct ModeSet {
    mask: u32,
}

impl ModeSet {
    pub fn empty() -> Self {
        Self { mask: 0 }
    }

    pub fn all() -> Self {
        Self { mask: u32::MAX }
    }

    pub fn new(modes: &[Mode]) -> Self {
        let mut result = Self::empty();
        for mode in modes {
            result.insert(*mode);
        }
        result
    }

    pub fn insert(&mut self, mode: Mode) {
        self.mask |= mode.mask();
    }

    pub fn contains(&self, mode: Mode) -> bool {
        self.mask & mode.mask() != 0
    }
}

/// A set of service ids, one flag per service of the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSet {
    allowed: Vec<bool>,
}

impl ServiceSet {
    pub fn new(nb_of_services: usize) -> Self {
        Self {
            allowed: vec![false; nb_of_services],
        }
    }

    pub fn insert(&mut self, service: ServiceIdx) {
        debug_assert!(service.idx < self.allowed.len());
        self.allowed[service.idx] = true;
    }

    pub fn contains(&self, service: ServiceIdx) -> bool {
        self.allowed.get(service.idx).copied().unwrap_or(false)
    }

    pub fn intersects(&self, other: &ServiceSet) -> bool {
        self.allowed
            .iter()
            .zip(other.allowed.iter())
            .any(|(a, b)| *a && *b)
    }
}

pub struct StopData {
    pub id: String,
    pub name: String,
}

pub struct RouteData {
    pub id: String,
    pub name: String,
    pub agency_id: String,
    pub mode: Mode,
    /// Routes restricted to eligible riders; disallowed by default in requests.
    pub eligibility_restricted: bool,
}

pub struct PatternData {
    pub(crate) route: RouteIdx,
    pub(crate) mode: Mode,
    pub(crate) stop_flows: StopFlows,
    /// services of all trips of this pattern; used by the lower bound
    /// to prove a pattern unusable without scanning its timetable
    pub(crate) services: ServiceSet,
    pub(crate) wheelchair_accessible: Vec<bool>,
}

impl PatternData {
    pub fn route(&self) -> RouteIdx {
        self.route
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn nb_of_positions(&self) -> usize {
        self.stop_flows.len()
    }

    pub fn stop_at(&self, position: usize) -> StopIdx {
        self.stop_flows[position].0
    }

    pub fn can_board_at(&self, position: usize) -> bool {
        use crate::timetables::FlowDirection::{BoardAndDebark, BoardOnly};
        matches!(self.stop_flows[position].1, BoardAndDebark | BoardOnly)
    }

    pub fn can_debark_at(&self, position: usize) -> bool {
        use crate::timetables::FlowDirection::{BoardAndDebark, DebarkOnly};
        matches!(self.stop_flows[position].1, BoardAndDebark | DebarkOnly)
    }

    pub fn wheelchair_accessible(&self, position: usize) -> bool {
        self.wheelchair_accessible[position]
    }

    pub fn services(&self) -> &ServiceSet {
        &self.services
    }
}

pub struct TripData {
    pub id: String,
    pub pattern: PatternIdx,
    pub route: RouteIdx,
    pub service: ServiceIdx,
}

/// The static transit data, built once from a feed and immutable afterwards.
/// Realtime changes never touch this structure : they live in copies managed
/// by the snapshot source.
pub struct TransitNetwork {
    pub(crate) calendar: Calendar,
    pub(crate) timezone: Timezone,

    pub(crate) stops: Vec<StopData>,
    pub(crate) routes: Vec<RouteData>,
    pub(crate) patterns: Vec<PatternData>,
    pub(crate) trips: Vec<TripData>,

    /// scheduled (baseline) timetable of each pattern, indexed by PatternIdx
    pub(crate) scheduled_timetables: Vec<Arc<Timetable>>,

    /// `service_days[service][day]` tells whether `service` runs on `day`
    pub(crate) service_days: Vec<Vec<bool>>,

    pub(crate) stop_id_to_idx: HashMap<String, StopIdx>,
    pub(crate) route_id_to_idx: HashMap<String, RouteIdx>,
    pub(crate) trip_id_to_idx: HashMap<String, TripIdx>,
    pub(crate) service_id_to_idx: HashMap<String, ServiceIdx>,
}

impl TransitNetwork {
    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    pub fn timezone(&self) -> &Timezone {
        &self.timezone
    }

    pub fn nb_of_stops(&self) -> usize {
        self.stops.len()
    }

    pub fn nb_of_patterns(&self) -> usize {
        self.patterns.len()
    }

    pub fn nb_of_trips(&self) -> usize {
        self.trips.len()
    }

    pub fn stop(&self, stop: StopIdx) -> &StopData {
        &self.stops[stop.idx]
    }

    pub fn route(&self, route: RouteIdx) -> &RouteData {
        &self.routes[route.idx]
    }

    pub fn pattern(&self, pattern: PatternIdx) -> &PatternData {
        &self.patterns[pattern.idx]
    }

    pub fn trip(&self, trip: TripIdx) -> &TripData {
        &self.trips[trip.idx]
    }

    pub fn scheduled_timetable(&self, pattern: PatternIdx) -> &Timetable {
        &self.scheduled_timetables[pattern.idx]
    }

    pub fn scheduled_timetable_arc(&self, pattern: PatternIdx) -> Arc<Timetable> {
        self.scheduled_timetables[pattern.idx].clone()
    }

    pub fn stop_idx(&self, id: &str) -> Option<StopIdx> {
        self.stop_id_to_idx.get(id).copied()
    }

    pub fn route_idx(&self, id: &str) -> Option<RouteIdx> {
        self.route_id_to_idx.get(id).copied()
    }

    pub fn trip_idx(&self, id: &str) -> Option<TripIdx> {
        self.trip_id_to_idx.get(id).copied()
    }

    pub fn service_idx(&self, id: &str) -> Option<ServiceIdx> {
        self.service_id_to_idx.get(id).copied()
    }

    pub fn pattern_of_trip(&self, trip: TripIdx) -> PatternIdx {
        self.trips[trip.idx].pattern
    }

    pub fn position_of_stop(&self, pattern: PatternIdx, stop: StopIdx) -> Option<usize> {
        self.patterns[pattern.idx]
            .stop_flows
            .iter()
            .position(|(candidate, _)| *candidate == stop)
    }

    pub fn nb_of_services(&self) -> usize {
        self.service_days.len()
    }

    pub fn service_runs_on(&self, service: ServiceIdx, date: &NaiveDate) -> bool {
        match self.calendar.date_to_offset(date) {
            Some(offset) => self.service_days[service.idx][offset as usize],
            None => false,
        }
    }

    /// The set of services active on `date`, or `None` when `date` is
    /// outside the calendar.
    pub fn services_running_on(&self, date: &NaiveDate) -> Option<ServiceSet> {
        let offset = self.calendar.date_to_offset(date)? as usize;
        let mut result = ServiceSet::new(self.nb_of_services());
        for (service_idx, days) in self.service_days.iter().enumerate() {
            if days[offset] {
                result.insert(ServiceIdx { idx: service_idx });
            }
        }
        Some(result)
    }
}
