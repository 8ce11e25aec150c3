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

use std::sync::Arc;

use crate::model::{PatternIdx, RouteIdx, StopIdx, TripIdx};
use crate::time::{PositiveDuration, SecondsSinceDatasetUtcStart};

/// What kind of transition produced a state. The former deep hierarchy of
/// edge classes reduces to this : board/alight is one kind with a flag,
/// dispatched by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    /// the search origin, no transition behind it
    Origin,
    /// any non-transit transition (street, waiting, ...)
    Street,
    BoardAlight { boarding: bool },
}

impl TransitionKind {
    pub fn is_board_alight(&self) -> bool {
        matches!(self, TransitionKind::BoardAlight { .. })
    }
}

/// One immutable node of a path under construction.
///
/// States form a singly-linked back-chain to their parent through shared
/// ownership; ancestors are never mutated, and chains are acyclic by
/// construction (a child is always created after its parent).
#[derive(Debug, Clone)]
pub struct SearchState {
    time: SecondsSinceDatasetUtcStart,
    weight: f64,
    nb_of_boardings: u32,
    kind: TransitionKind,

    /// the trip currently ridden, if on board
    trip: Option<TripIdx>,
    route: Option<RouteIdx>,
    /// index into the search context's service days
    service_day: Option<usize>,
    last_pattern: Option<PatternIdx>,

    previous_trip: Option<TripIdx>,
    previous_stop: Option<StopIdx>,
    last_alighted_time: Option<SecondsSinceDatasetUtcStart>,

    initial_wait: Option<PositiveDuration>,
    /// how much later the previous leg could have ended while still
    /// permitting everything that followed; fuels reverse optimization
    last_next_arrival_delta: Option<PositiveDuration>,

    parent: Option<Arc<SearchState>>,
}

impl SearchState {
    pub fn origin(time: SecondsSinceDatasetUtcStart) -> Arc<Self> {
        Arc::new(Self {
            time,
            weight: 0.0,
            nb_of_boardings: 0,
            kind: TransitionKind::Origin,
            trip: None,
            route: None,
            service_day: None,
            last_pattern: None,
            previous_trip: None,
            previous_stop: None,
            last_alighted_time: None,
            initial_wait: None,
            last_next_arrival_delta: None,
            parent: None,
        })
    }

    /// Starts building a child of `self`. `forward` tells in which
    /// direction time advances : `true` for a depart-after search, `false`
    /// for arrive-by.
    pub fn edit(self: &Arc<Self>, kind: TransitionKind, forward: bool) -> StateEditor {
        let mut child = (**self).clone();
        child.kind = kind;
        child.parent = Some(self.clone());
        StateEditor {
            child,
            forward,
            overflowed: false,
        }
    }

    pub fn time(&self) -> SecondsSinceDatasetUtcStart {
        self.time
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn nb_of_boardings(&self) -> u32 {
        self.nb_of_boardings
    }

    pub fn ever_boarded(&self) -> bool {
        self.nb_of_boardings > 0
    }

    pub fn kind(&self) -> TransitionKind {
        self.kind
    }

    pub fn trip(&self) -> Option<TripIdx> {
        self.trip
    }

    pub fn route(&self) -> Option<RouteIdx> {
        self.route
    }

    pub fn service_day(&self) -> Option<usize> {
        self.service_day
    }

    pub fn last_pattern(&self) -> Option<PatternIdx> {
        self.last_pattern
    }

    pub fn previous_trip(&self) -> Option<TripIdx> {
        self.previous_trip
    }

    pub fn previous_stop(&self) -> Option<StopIdx> {
        self.previous_stop
    }

    pub fn last_alighted_time(&self) -> Option<SecondsSinceDatasetUtcStart> {
        self.last_alighted_time
    }

    pub fn initial_wait(&self) -> Option<PositiveDuration> {
        self.initial_wait
    }

    pub fn last_next_arrival_delta(&self) -> Option<PositiveDuration> {
        self.last_next_arrival_delta
    }

    pub fn parent(&self) -> Option<&Arc<SearchState>> {
        self.parent.as_ref()
    }

    /// Copy with a shifted time and a replaced parent; the reverse
    /// optimization rebuilds slid chains with this.
    pub(crate) fn with_time_and_parent(
        &self,
        time: SecondsSinceDatasetUtcStart,
        parent: Option<Arc<SearchState>>,
    ) -> SearchState {
        let mut copy = self.clone();
        copy.time = time;
        copy.parent = parent;
        copy
    }

    pub(crate) fn with_parent_weight_and_delta(
        &self,
        parent: Option<Arc<SearchState>>,
        weight: f64,
        last_next_arrival_delta: Option<PositiveDuration>,
    ) -> SearchState {
        let mut copy = self.clone();
        copy.parent = parent;
        copy.weight = weight;
        copy.last_next_arrival_delta = last_next_arrival_delta;
        copy
    }
}

/// Mutable builder of the next state. Everything not explicitly set is
/// inherited from the parent; `into_state` freezes the result.
pub struct StateEditor {
    child: SearchState,
    forward: bool,
    overflowed: bool,
}

impl StateEditor {
    /// Advances time in the direction of the search. An overflow (for
    /// instance an arrive-by search walking before the dataset start) marks
    /// the editor dead : `into_state` will return `None`.
    pub fn increment_time(&mut self, duration: PositiveDuration) {
        let moved = if self.forward {
            self.child.time.checked_add(duration)
        } else {
            self.child.time.checked_sub(duration)
        };
        match moved {
            Some(time) => self.child.time = time,
            None => self.overflowed = true,
        }
    }

    pub fn increment_weight(&mut self, weight: f64) {
        self.child.weight += weight;
    }

    pub fn increment_boardings(&mut self) {
        self.child.nb_of_boardings += 1;
    }

    pub fn set_trip(&mut self, trip: TripIdx) {
        self.child.trip = Some(trip);
    }

    pub fn clear_trip(&mut self) {
        self.child.trip = None;
    }

    pub fn set_route(&mut self, route: RouteIdx) {
        self.child.route = Some(route);
    }

    pub fn set_service_day(&mut self, service_day: usize) {
        self.child.service_day = Some(service_day);
    }

    pub fn set_last_pattern(&mut self, pattern: PatternIdx) {
        self.child.last_pattern = Some(pattern);
    }

    pub fn set_previous_trip(&mut self, trip: TripIdx) {
        self.child.previous_trip = Some(trip);
    }

    pub fn set_previous_stop(&mut self, stop: StopIdx) {
        self.child.previous_stop = Some(stop);
    }

    pub fn set_last_alighted_time(&mut self, time: SecondsSinceDatasetUtcStart) {
        self.child.last_alighted_time = Some(time);
    }

    pub fn set_initial_wait(&mut self, wait: PositiveDuration) {
        self.child.initial_wait = Some(wait);
    }

    pub fn set_last_next_arrival_delta(&mut self, delta: Option<PositiveDuration>) {
        self.child.last_next_arrival_delta = delta;
    }

    /// Freezes the child state. `None` when a time increment overflowed the
    /// dataset validity period, which simply makes this branch a dead end.
    pub fn into_state(self) -> Option<Arc<SearchState>> {
        if self.overflowed {
            None
        } else {
            Some(Arc::new(self.child))
        }
    }
}
