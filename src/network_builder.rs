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

use std::collections::{BTreeMap, HashMap, HashSet};
use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;
use chrono_tz::Tz as Timezone;

use crate::model::{
    Mode, PatternData, PatternIdx, RouteData, RouteIdx, ServiceIdx, ServiceSet, StopData,
    StopIdx, TransitNetwork, TripData, TripIdx,
};
use crate::time::{Calendar, SecondsSinceDayStart};
use crate::timetables::{FlowDirection, StopFlows, Timetable, TripTimes};
use crate::transfers::{TransferRule, TransferTable};

pub const DEFAULT_SERVICE_ID: &str = "default_service";
pub const DEFAULT_ROUTE_ID: &str = "default_route";
pub const DEFAULT_AGENCY_ID: &str = "default_agency";

pub const DEFAULT_TIMEZONE: Timezone = chrono_tz::UTC;

/// Builder used to easily create a `TransitNetwork` (and its
/// `TransferTable`) for tests and demos.
/// Note: if not explicitly set, all trips are attached to a default
/// calendar covering the whole validity period.
///
/// Being a test facility, the builder panics on inconsistent input instead
/// of propagating errors.
pub struct NetworkBuilder {
    first_date: NaiveDate,
    last_date: NaiveDate,
    timezone: Timezone,

    stops: Vec<StopData>,
    stop_id_to_idx: HashMap<String, StopIdx>,

    routes: Vec<RouteData>,
    route_id_to_idx: HashMap<String, RouteIdx>,

    service_dates: Vec<Vec<NaiveDate>>,
    service_id_to_idx: HashMap<String, ServiceIdx>,

    trips: Vec<TripSpec>,
    transfers: Vec<TransferSpec>,

    inaccessible_stops: HashSet<String>,
}

struct TripSpec {
    id: String,
    route: Option<String>,
    service: Option<String>,
    stop_times: Vec<StopTimeSpec>,
}

struct StopTimeSpec {
    stop_id: String,
    arrival: SecondsSinceDayStart,
    departure: SecondsSinceDayStart,
    flow: FlowDirection,
}

struct TransferSpec {
    from_stop: String,
    to_stop: String,
    from_trip: Option<String>,
    to_trip: Option<String>,
    rule: TransferRule,
}

/// Builder used to create and modify a new trip within a `NetworkBuilder`.
pub struct TripBuilder {
    spec: TripSpec,
}

impl TripBuilder {
    pub fn route(mut self, id: &str) -> Self {
        self.spec.route = Some(id.to_string());
        self
    }

    pub fn service(mut self, id: &str) -> Self {
        self.spec.service = Some(id.to_string());
        self
    }

    /// Adds a stop time. Times are "HH:MM:SS" strings and may exceed
    /// 24:00:00 for overnight trips, as in gtfs stop_times.
    pub fn st(self, stop_id: &str, arrival: &str, departure: &str) -> Self {
        self.st_flow(stop_id, arrival, departure, FlowDirection::BoardAndDebark)
    }

    pub fn st_flow(
        mut self,
        stop_id: &str,
        arrival: &str,
        departure: &str,
        flow: FlowDirection,
    ) -> Self {
        let arrival = SecondsSinceDayStart::from_str(arrival)
            .expect("badly formatted arrival time");
        let departure = SecondsSinceDayStart::from_str(departure)
            .expect("badly formatted departure time");
        self.spec.stop_times.push(StopTimeSpec {
            stop_id: stop_id.to_string(),
            arrival,
            departure,
            flow,
        });
        self
    }
}

impl NetworkBuilder {
    pub fn new(first_date: &str, last_date: &str) -> Self {
        let first_date = parse_date(first_date);
        let last_date = parse_date(last_date);
        assert!(first_date <= last_date);
        Self {
            first_date,
            last_date,
            timezone: DEFAULT_TIMEZONE,
            stops: Vec::new(),
            stop_id_to_idx: HashMap::new(),
            routes: Vec::new(),
            route_id_to_idx: HashMap::new(),
            service_dates: Vec::new(),
            service_id_to_idx: HashMap::new(),
            trips: Vec::new(),
            transfers: Vec::new(),
            inaccessible_stops: HashSet::new(),
        }
    }

    pub fn timezone(mut self, timezone: Timezone) -> Self {
        self.timezone = timezone;
        self
    }

    /// Declares a service running on the given dates.
    pub fn calendar(mut self, id: &str, dates: &[&str]) -> Self {
        let dates: Vec<NaiveDate> = dates.iter().map(|date| parse_date(date)).collect();
        self.insert_service(id, dates);
        self
    }

    pub fn route(self, id: &str, mode: Mode) -> Self {
        self.add_route(id, mode, DEFAULT_AGENCY_ID, false)
    }

    pub fn route_with_agency(self, id: &str, mode: Mode, agency_id: &str) -> Self {
        self.add_route(id, mode, agency_id, false)
    }

    /// A route restricted to eligible riders.
    pub fn restricted_route(self, id: &str, mode: Mode) -> Self {
        self.add_route(id, mode, DEFAULT_AGENCY_ID, true)
    }

    fn add_route(mut self, id: &str, mode: Mode, agency_id: &str, restricted: bool) -> Self {
        assert!(
            !self.route_id_to_idx.contains_key(id),
            "route `{}` already exists",
            id
        );
        let idx = RouteIdx {
            idx: self.routes.len(),
        };
        self.routes.push(RouteData {
            id: id.to_string(),
            name: id.to_string(),
            agency_id: agency_id.to_string(),
            mode,
            eligibility_restricted: restricted,
        });
        self.route_id_to_idx.insert(id.to_string(), idx);
        self
    }

    /// Adds a new trip to the network
    ///
    /// ```
    /// # use hermod::network_builder::NetworkBuilder;
    ///
    /// # fn main() {
    /// let (network, _) = NetworkBuilder::new("2020-01-01", "2020-01-02")
    ///     .trip("toto", |t| {
    ///         t.st("A", "10:00:00", "10:00:01")
    ///             .st("B", "11:00:00", "11:00:01")
    ///     })
    ///     .trip("tata", |t| {
    ///         t.st("C", "08:00:00", "08:00:01")
    ///             .st("B", "09:00:00", "09:00:01")
    ///     })
    ///     .build();
    /// # }
    /// ```
    pub fn trip<F>(mut self, id: &str, initer: F) -> Self
    where
        F: FnOnce(TripBuilder) -> TripBuilder,
    {
        let trip_builder = TripBuilder {
            spec: TripSpec {
                id: id.to_string(),
                route: None,
                service: None,
                stop_times: Vec::new(),
            },
        };
        let trip_builder = initer(trip_builder);
        assert!(
            trip_builder.spec.stop_times.len() >= 2,
            "trip `{}` needs at least two stop times",
            id
        );
        self.trips.push(trip_builder.spec);
        self
    }

    pub fn transfer(mut self, from_stop: &str, to_stop: &str, rule: TransferRule) -> Self {
        self.transfers.push(TransferSpec {
            from_stop: from_stop.to_string(),
            to_stop: to_stop.to_string(),
            from_trip: None,
            to_trip: None,
            rule,
        });
        self
    }

    pub fn trip_transfer(
        mut self,
        from_stop: &str,
        to_stop: &str,
        from_trip: &str,
        to_trip: &str,
        rule: TransferRule,
    ) -> Self {
        self.transfers.push(TransferSpec {
            from_stop: from_stop.to_string(),
            to_stop: to_stop.to_string(),
            from_trip: Some(from_trip.to_string()),
            to_trip: Some(to_trip.to_string()),
            rule,
        });
        self
    }

    /// Marks a stop as not wheelchair accessible, on every pattern.
    pub fn inaccessible_stop(mut self, stop_id: &str) -> Self {
        self.inaccessible_stops.insert(stop_id.to_string());
        self
    }

    fn insert_service(&mut self, id: &str, dates: Vec<NaiveDate>) -> ServiceIdx {
        if let Some(idx) = self.service_id_to_idx.get(id) {
            return *idx;
        }
        let idx = ServiceIdx {
            idx: self.service_dates.len(),
        };
        self.service_dates.push(dates);
        self.service_id_to_idx.insert(id.to_string(), idx);
        idx
    }

    fn get_or_create_stop(&mut self, id: &str) -> StopIdx {
        if let Some(idx) = self.stop_id_to_idx.get(id) {
            return *idx;
        }
        let idx = StopIdx {
            idx: self.stops.len(),
        };
        self.stops.push(StopData {
            id: id.to_string(),
            name: id.to_string(),
        });
        self.stop_id_to_idx.insert(id.to_string(), idx);
        idx
    }

    pub fn build(mut self) -> (TransitNetwork, TransferTable) {
        let calendar = Calendar::new(self.first_date, self.last_date);

        // a default service covering the whole validity period, for trips
        // that did not name one
        let all_dates: Vec<NaiveDate> = {
            let mut dates = Vec::new();
            let mut date = self.first_date;
            while date <= self.last_date {
                dates.push(date);
                match date.succ_opt() {
                    Some(next) => date = next,
                    None => break,
                }
            }
            dates
        };
        if self.trips.iter().any(|trip| trip.service.is_none()) {
            self.insert_service(DEFAULT_SERVICE_ID, all_dates);
        }
        if self.trips.iter().any(|trip| trip.route.is_none())
            && !self.route_id_to_idx.contains_key(DEFAULT_ROUTE_ID)
        {
            self = self.route(DEFAULT_ROUTE_ID, Mode::Bus);
        }

        let nb_of_services = self.service_dates.len();
        let nb_of_days = calendar.nb_of_days() as usize;
        let mut service_days = vec![vec![false; nb_of_days]; nb_of_services];
        for (service_idx, dates) in self.service_dates.iter().enumerate() {
            for date in dates {
                if let Some(offset) = calendar.date_to_offset(date) {
                    service_days[service_idx][offset as usize] = true;
                }
            }
        }

        // group trips into patterns : same route and same stop/flow sequence
        let mut trips: Vec<TripData> = Vec::new();
        let mut trip_id_to_idx: HashMap<String, TripIdx> = HashMap::new();
        let mut patterns: Vec<PatternData> = Vec::new();
        let mut pattern_rows: Vec<Vec<TripTimes>> = Vec::new();
        let mut stop_flows_to_pattern: BTreeMap<(RouteIdx, StopFlows), PatternIdx> =
            BTreeMap::new();

        let trip_specs = std::mem::take(&mut self.trips);
        for spec in &trip_specs {
            let route_id = spec.route.as_deref().unwrap_or(DEFAULT_ROUTE_ID);
            let route_idx = *self
                .route_id_to_idx
                .get(route_id)
                .unwrap_or_else(|| panic!("trip `{}` uses unknown route `{}`", spec.id, route_id));
            let service_id = spec.service.as_deref().unwrap_or(DEFAULT_SERVICE_ID);
            let service_idx = *self
                .service_id_to_idx
                .get(service_id)
                .unwrap_or_else(|| {
                    panic!("trip `{}` uses unknown service `{}`", spec.id, service_id)
                });

            let nb_of_positions = spec.stop_times.len();
            let stop_flows: StopFlows = spec
                .stop_times
                .iter()
                .enumerate()
                .map(|(position, stop_time)| {
                    let stop_idx = self.get_or_create_stop(&stop_time.stop_id);
                    let flow = correct_flow(stop_time.flow, position, nb_of_positions);
                    (stop_idx, flow)
                })
                .collect();

            let mode = self.routes[route_idx.idx].mode;
            let pattern_idx = *stop_flows_to_pattern
                .entry((route_idx, stop_flows.clone()))
                .or_insert_with(|| {
                    let idx = PatternIdx {
                        idx: patterns.len(),
                    };
                    let wheelchair_accessible = stop_flows
                        .iter()
                        .map(|(stop_idx, _)| {
                            !self
                                .inaccessible_stops
                                .contains(&self.stops[stop_idx.idx].id)
                        })
                        .collect();
                    patterns.push(PatternData {
                        route: route_idx,
                        mode,
                        stop_flows: stop_flows.clone(),
                        services: ServiceSet::new(nb_of_services),
                        wheelchair_accessible,
                    });
                    pattern_rows.push(Vec::new());
                    idx
                });

            let trip_idx = TripIdx { idx: trips.len() };
            assert!(
                trip_id_to_idx
                    .insert(spec.id.clone(), trip_idx)
                    .is_none(),
                "trip `{}` already exists",
                spec.id
            );
            trips.push(TripData {
                id: spec.id.clone(),
                pattern: pattern_idx,
                route: route_idx,
                service: service_idx,
            });
            patterns[pattern_idx.idx].services.insert(service_idx);

            let arrival_times = spec.stop_times.iter().map(|st| st.arrival).collect();
            let departure_times = spec.stop_times.iter().map(|st| st.departure).collect();
            let row = TripTimes::new(trip_idx, service_idx, arrival_times, departure_times)
                .unwrap_or_else(|error| {
                    panic!("trip `{}` has invalid stop times : {}", spec.id, error)
                });
            pattern_rows[pattern_idx.idx].push(row);
        }

        let scheduled_timetables: Vec<Arc<Timetable>> = pattern_rows
            .into_iter()
            .enumerate()
            .map(|(idx, rows)| Arc::new(Timetable::new(PatternIdx { idx }, rows)))
            .collect();

        let mut transfer_table = TransferTable::new();
        for spec in &self.transfers {
            let from_stop = *self
                .stop_id_to_idx
                .get(&spec.from_stop)
                .unwrap_or_else(|| panic!("transfer from unknown stop `{}`", spec.from_stop));
            let to_stop = *self
                .stop_id_to_idx
                .get(&spec.to_stop)
                .unwrap_or_else(|| panic!("transfer to unknown stop `{}`", spec.to_stop));
            let from_trip = spec.from_trip.as_ref().map(|id| {
                *trip_id_to_idx
                    .get(id)
                    .unwrap_or_else(|| panic!("transfer from unknown trip `{}`", id))
            });
            let to_trip = spec.to_trip.as_ref().map(|id| {
                *trip_id_to_idx
                    .get(id)
                    .unwrap_or_else(|| panic!("transfer to unknown trip `{}`", id))
            });
            transfer_table.insert(from_stop, to_stop, from_trip, to_trip, spec.rule);
        }

        let network = TransitNetwork {
            calendar,
            timezone: self.timezone,
            stops: self.stops,
            routes: self.routes,
            patterns,
            trips,
            scheduled_timetables,
            service_days,
            stop_id_to_idx: self.stop_id_to_idx,
            route_id_to_idx: self.route_id_to_idx,
            trip_id_to_idx,
            service_id_to_idx: self.service_id_to_idx,
        };
        (network, transfer_table)
    }
}

/// The first position of a trip cannot be debarked, the last cannot be
/// boarded; declared flows are corrected accordingly.
fn correct_flow(flow: FlowDirection, position: usize, nb_of_positions: usize) -> FlowDirection {
    use FlowDirection::{BoardAndDebark, BoardOnly, DebarkOnly, NoBoardDebark};
    if position == 0 {
        match flow {
            BoardAndDebark => BoardOnly,
            DebarkOnly => NoBoardDebark,
            other => other,
        }
    } else if position == nb_of_positions - 1 {
        match flow {
            BoardAndDebark => DebarkOnly,
            BoardOnly => NoBoardDebark,
            other => other,
        }
    } else {
        flow
    }
}

fn parse_date(date: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date, "%Y-%m-%d").expect("badly formatted date")
}
