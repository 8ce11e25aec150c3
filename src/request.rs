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

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::model::{Mode, ModeSet, RouteData, RouteIdx};
use crate::service_day::ServiceDay;
use crate::time::PositiveDuration;
use crate::timetables::TripTimes;

pub const DEFAULT_WAIT_RELUCTANCE: f64 = 1.0;
pub const DEFAULT_WAIT_AT_BEGINNING_FACTOR: f64 = 0.4;
pub const DEFAULT_BOARD_COST: f64 = 600.0;
pub const DEFAULT_NONPREFERRED_TRANSFER_PENALTY: f64 = 180.0;
pub const DEFAULT_OTHER_THAN_PREFERRED_ROUTES_PENALTY: f64 = 300.0;
pub const DEFAULT_UNPREFERRED_ROUTE_PENALTY: f64 = 300.0;

pub fn default_wait_reluctance() -> f64 {
    DEFAULT_WAIT_RELUCTANCE
}

pub fn default_wait_at_beginning_factor() -> f64 {
    DEFAULT_WAIT_AT_BEGINNING_FACTOR
}

pub fn default_board_cost() -> f64 {
    DEFAULT_BOARD_COST
}

pub fn default_nonpreferred_transfer_penalty() -> f64 {
    DEFAULT_NONPREFERRED_TRANSFER_PENALTY
}

pub fn default_other_than_preferred_routes_penalty() -> f64 {
    DEFAULT_OTHER_THAN_PREFERRED_ROUTES_PENALTY
}

pub fn default_unpreferred_route_penalty() -> f64 {
    DEFAULT_UNPREFERRED_ROUTE_PENALTY
}

/// The numeric weights of a request, as read from configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestParams {
    /// multiplier applied to seconds spent waiting between legs
    #[serde(default = "default_wait_reluctance")]
    pub wait_reluctance: f64,

    /// multiplier applied to the wait before the very first boarding
    #[serde(default = "default_wait_at_beginning_factor")]
    pub wait_at_beginning_factor: f64,

    /// flat cost of boarding a vehicle
    #[serde(default = "default_board_cost")]
    pub board_cost: f64,

    /// penalty for a transfer constrained by an explicit rule that is not
    /// marked preferred
    #[serde(default = "default_nonpreferred_transfer_penalty")]
    pub nonpreferred_transfer_penalty: f64,

    /// penalty for riding a route outside the preferred set, when one is given
    #[serde(default = "default_other_than_preferred_routes_penalty")]
    pub other_than_preferred_routes_penalty: f64,

    /// penalty for riding a route of the unpreferred set
    #[serde(default = "default_unpreferred_route_penalty")]
    pub unpreferred_route_penalty: f64,
}

impl Default for RequestParams {
    fn default() -> Self {
        Self {
            wait_reluctance: DEFAULT_WAIT_RELUCTANCE,
            wait_at_beginning_factor: DEFAULT_WAIT_AT_BEGINNING_FACTOR,
            board_cost: DEFAULT_BOARD_COST,
            nonpreferred_transfer_penalty: DEFAULT_NONPREFERRED_TRANSFER_PENALTY,
            other_than_preferred_routes_penalty: DEFAULT_OTHER_THAN_PREFERRED_ROUTES_PENALTY,
            unpreferred_route_penalty: DEFAULT_UNPREFERRED_ROUTE_PENALTY,
        }
    }
}

/// A predicate banning specific departures : a (service day, trip row,
/// position) triple that matches is never boarded.
pub trait DepartureMatcher: Send + Sync {
    fn matches(&self, day: &ServiceDay, trip_times: &TripTimes, position: usize) -> bool;
}

/// Matches nothing.
pub struct EmptyDepartureMatcher;

impl DepartureMatcher for EmptyDepartureMatcher {
    fn matches(&self, _day: &ServiceDay, _trip_times: &TripTimes, _position: usize) -> bool {
        false
    }
}

/// Everything a traversal needs to know about the query : direction, mode
/// and route filters, accessibility, weight factors, and the
/// reverse-optimization toggles.
#[derive(Clone)]
pub struct RoutingRequest {
    /// when true the search runs backwards from the arrival datetime, and
    /// time decreases along a path
    pub arrive_by: bool,

    pub modes: ModeSet,
    pub wheelchair_accessible: bool,
    /// allow routes restricted to eligible riders
    pub allow_restricted_routes: bool,

    pub banned_routes: HashSet<RouteIdx>,
    pub banned_agencies: HashSet<String>,
    pub preferred_routes: HashSet<RouteIdx>,
    pub unpreferred_routes: HashSet<RouteIdx>,

    pub wait_reluctance: f64,
    pub wait_at_beginning_factor: f64,
    pub board_cost: f64,
    pub nonpreferred_transfer_penalty: f64,
    pub other_than_preferred_routes_penalty: f64,
    pub unpreferred_route_penalty: f64,

    /// extra dwell applied when entering a vehicle, per mode
    pub board_slacks: HashMap<Mode, PositiveDuration>,
    /// extra dwell applied when leaving a vehicle, per mode
    pub alight_slacks: HashMap<Mode, PositiveDuration>,

    /// apply board costs on alight so that a reverse-optimizing pass yields
    /// costs comparable to a plain forward search
    pub reverse_optimizing: bool,
    /// attempt to slide alights forward during the search itself
    pub reverse_optimize_on_the_fly: bool,

    pub banned_departures: Option<Arc<dyn DepartureMatcher>>,
}

impl RoutingRequest {
    pub fn from_params(params: &RequestParams) -> Self {
        Self {
            arrive_by: false,
            modes: ModeSet::all(),
            wheelchair_accessible: false,
            allow_restricted_routes: false,
            banned_routes: HashSet::new(),
            banned_agencies: HashSet::new(),
            preferred_routes: HashSet::new(),
            unpreferred_routes: HashSet::new(),
            wait_reluctance: params.wait_reluctance,
            wait_at_beginning_factor: params.wait_at_beginning_factor,
            board_cost: params.board_cost,
            nonpreferred_transfer_penalty: params.nonpreferred_transfer_penalty,
            other_than_preferred_routes_penalty: params.other_than_preferred_routes_penalty,
            unpreferred_route_penalty: params.unpreferred_route_penalty,
            board_slacks: HashMap::new(),
            alight_slacks: HashMap::new(),
            reverse_optimizing: false,
            reverse_optimize_on_the_fly: false,
            banned_departures: None,
        }
    }

    pub fn board_slack(&self, mode: Mode) -> PositiveDuration {
        self.board_slacks
            .get(&mode)
            .copied()
            .unwrap_or_else(PositiveDuration::zero)
    }

    pub fn alight_slack(&self, mode: Mode) -> PositiveDuration {
        self.alight_slacks
            .get(&mode)
            .copied()
            .unwrap_or_else(PositiveDuration::zero)
    }

    pub fn route_is_banned(&self, route_idx: RouteIdx, route: &RouteData) -> bool {
        self.banned_routes.contains(&route_idx)
            || self.banned_agencies.contains(&route.agency_id)
    }

    /// The request-level penalty for riding `route`, independent of any
    /// transfer.
    pub fn preferences_penalty_for_route(&self, route_idx: RouteIdx) -> f64 {
        let mut penalty = 0.0;
        if !self.preferred_routes.is_empty() && !self.preferred_routes.contains(&route_idx) {
            penalty += self.other_than_preferred_routes_penalty;
        }
        if self.unpreferred_routes.contains(&route_idx) {
            penalty += self.unpreferred_route_penalty;
        }
        penalty
    }

    /// Admissible lower bound on the cost of any future boarding.
    pub fn board_cost_lower_bound(&self) -> f64 {
        self.board_cost
    }
}

impl Default for RoutingRequest {
    fn default() -> Self {
        Self::from_params(&RequestParams::default())
    }
}
