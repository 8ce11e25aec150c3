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

use tracing::error;

use crate::model::{PatternIdx, StopIdx, TransitNetwork};
use crate::request::RoutingRequest;
use crate::search::state::{SearchState, TransitionKind};
use crate::search::SearchContext;
use crate::time::{PositiveDuration, SecondsSinceDatasetUtcStart};
use crate::timetables::TripTimes;
use crate::transfers::{TransferTable, TransferVerdict};

/// Boarding or alighting a vehicle of one pattern at one position.
///
/// Note that boarding/alighting is distinct from the direction of the
/// search : an arrive-by search selects its trip while traversing an
/// alight, and merely steps off transit while traversing a board.
#[derive(Debug, Clone, Copy)]
pub struct BoardAlight {
    pattern: PatternIdx,
    position: usize,
    boarding: bool,
}

/// An internal invariant was violated during a traversal. This is distinct
/// from the usual "no transition" outcome : the caller may log and treat
/// the branch as dead, but should not confuse it with "no trip found".
#[derive(Debug)]
pub enum TraverseError {
    ReverseOptimizationFailed,
}

impl std::fmt::Display for TraverseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TraverseError::ReverseOptimizationFailed => {
                write!(f, "could not rebuild an optimized state from a valid boarding")
            }
        }
    }
}

impl std::error::Error for TraverseError {}

impl BoardAlight {
    /// A boarding transition, or `None` when the pattern does not allow
    /// boarding at `position`. Transitions are simply not created for
    /// positions with a no-pickup flow, so `traverse` never re-checks it.
    pub fn board(network: &TransitNetwork, pattern: PatternIdx, position: usize) -> Option<Self> {
        let pattern_data = network.pattern(pattern);
        if position + 1 >= pattern_data.nb_of_positions()
            || !pattern_data.can_board_at(position)
        {
            return None;
        }
        Some(Self {
            pattern,
            position,
            boarding: true,
        })
    }

    /// An alighting transition, or `None` when the pattern does not allow
    /// debarking at `position`.
    pub fn alight(network: &TransitNetwork, pattern: PatternIdx, position: usize) -> Option<Self> {
        let pattern_data = network.pattern(pattern);
        if position == 0
            || position >= pattern_data.nb_of_positions()
            || !pattern_data.can_debark_at(position)
        {
            return None;
        }
        Some(Self {
            pattern,
            position,
            boarding: false,
        })
    }

    pub fn pattern(&self) -> PatternIdx {
        self.pattern
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_boarding(&self) -> bool {
        self.boarding
    }

    fn stop(&self, ctx: &SearchContext<'_>) -> StopIdx {
        ctx.network.pattern(self.pattern).stop_at(self.position)
    }

    pub fn traverse(
        &self,
        s0: &Arc<SearchState>,
        ctx: &SearchContext<'_>,
        request: &RoutingRequest,
    ) -> Result<Option<Arc<SearchState>>, TraverseError> {
        self.traverse_with_arrival(s0, ctx, request, None)
    }

    /// Full traversal entry point. `arrival_time_at_stop` is only provided
    /// by a reverse-optimization pass : the leaving-transit branch then uses
    /// it to account the initial wait of the journey.
    pub fn traverse_with_arrival(
        &self,
        s0: &Arc<SearchState>,
        ctx: &SearchContext<'_>,
        request: &RoutingRequest,
        arrival_time_at_stop: Option<SecondsSinceDatasetUtcStart>,
    ) -> Result<Option<Arc<SearchState>>, TraverseError> {
        // two board/alight transitions in a row would be a zero-duration
        // shortcut, or a spurious leg change
        if s0.kind().is_board_alight() {
            return Ok(None);
        }

        let pattern_data = ctx.network.pattern(self.pattern);

        if request.wheelchair_accessible && !pattern_data.wheelchair_accessible(self.position) {
            return Ok(None);
        }

        let route_idx = pattern_data.route();
        let route = ctx.network.route(route_idx);
        if !request.allow_restricted_routes && route.eligibility_restricted {
            return Ok(None);
        }

        // Entering/leaving transit is not the same thing as boarding or
        // alighting : an arrive-by search leaves transit while traversing a
        // board transition.
        let leaving_transit =
            (self.boarding && request.arrive_by) || (!self.boarding && !request.arrive_by);

        if leaving_transit {
            self.traverse_off_transit(s0, ctx, request, arrival_time_at_stop)
        } else {
            self.traverse_onto_transit(s0, ctx, request)
        }
    }

    /// Stepping off transit : no trip to select, only dwell, bookkeeping
    /// for transfers, and the reverse-optimization delta.
    fn traverse_off_transit(
        &self,
        s0: &Arc<SearchState>,
        ctx: &SearchContext<'_>,
        request: &RoutingRequest,
        arrival_time_at_stop: Option<SecondsSinceDatasetUtcStart>,
    ) -> Result<Option<Arc<SearchState>>, TraverseError> {
        let forward = !request.arrive_by;
        let mut editor = s0.edit(
            TransitionKind::BoardAlight {
                boarding: self.boarding,
            },
            forward,
        );
        editor.clear_trip();
        editor.set_last_alighted_time(s0.time());
        // remember where we got off, for transfer rules at the next boarding
        editor.set_previous_stop(self.stop(ctx));
        editor.set_last_pattern(self.pattern);

        let mode = ctx.network.pattern(self.pattern).mode();
        let slack = if self.boarding {
            request.board_slack(mode)
        } else {
            request.alight_slack(mode)
        };
        if !slack.is_zero() {
            editor.increment_time(slack);
            editor.increment_weight(slack.total_seconds() as f64 * request.wait_reluctance);
        }

        if let Some(arrival) = arrival_time_at_stop {
            // this only occurs at the beginning of the journey, during a
            // reverse-optimization pass
            let wait = s0
                .time()
                .duration_since(&arrival)
                .or_else(|| arrival.duration_since(&s0.time()))
                .unwrap_or_else(PositiveDuration::zero);
            editor.increment_time(wait);
            editor.increment_weight(
                wait.total_seconds() as f64 * request.wait_at_beginning_factor,
            );
            editor.set_initial_wait(wait);
        }

        // a reverse-optimizing pass charges board costs on this side, so
        // that its plans remain comparable to non-optimized ones
        if request.reverse_optimizing {
            editor.increment_weight(request.board_cost);
        }

        if request.reverse_optimize_on_the_fly {
            editor.set_last_next_arrival_delta(self.next_arrival_delta(s0, ctx));
        }

        Ok(editor.into_state())
    }

    /// How much later the trip we are stepping off could have run at this
    /// position, i.e. the gap to the next departure in the same timetable.
    fn next_arrival_delta(
        &self,
        s0: &Arc<SearchState>,
        ctx: &SearchContext<'_>,
    ) -> Option<PositiveDuration> {
        let trip = s0.trip()?;
        let day = &ctx.service_days[s0.service_day()?];
        let timetable = ctx.effective_timetable(self.pattern, day);
        let row = timetable.trip_row(trip)?;
        let departure = day.time(row.departure_time(self.position))?;
        timetable.next_departure_after(day, self.position, departure)
    }

    /// Going onto transit : select the best trip over all relevant service
    /// days, then build the child state with wait, transfer and preference
    /// costs.
    fn traverse_onto_transit(
        &self,
        s0: &Arc<SearchState>,
        ctx: &SearchContext<'_>,
        request: &RoutingRequest,
    ) -> Result<Option<Arc<SearchState>>, TraverseError> {
        let pattern_data = ctx.network.pattern(self.pattern);

        // never re-board the pattern we just rode
        if s0.last_pattern() == Some(self.pattern) {
            return Ok(None);
        }

        if !request.modes.contains(pattern_data.mode()) {
            return Ok(None);
        }

        let route_idx = pattern_data.route();
        if request.route_is_banned(route_idx, ctx.network.route(route_idx)) {
            return Ok(None);
        }

        // Check every service day : a state at 23:59 Sunday may need a bus
        // coded at 00:01 Monday, and a 25:00 trip of today competes with a
        // 00:30 trip of tomorrow. So no day is skipped early, and the scan
        // does not stop at the first day with a trip; only the viability
        // pre-check may prove a whole day useless against the current best.
        let mut best: Option<(usize, &TripTimes, PositiveDuration)> = None;
        for (day_idx, day) in ctx.service_days.iter().enumerate() {
            let timetable = ctx.effective_timetable(self.pattern, day);
            let best_wait = best.map(|(_, _, wait)| wait);
            if !timetable.temporally_viable(day, s0.time(), best_wait, self.boarding) {
                continue;
            }
            let (row, time_at_stop) =
                match timetable.next_trip(day, s0.time(), self.position, self.boarding) {
                    Some(found) => found,
                    None => continue,
                };
            // wait is relative to departures when boarding, arrivals when
            // alighting
            let wait = if self.boarding {
                time_at_stop.duration_since(&s0.time())
            } else {
                s0.time().duration_since(&time_at_stop)
            };
            let wait = match wait {
                Some(wait) => wait,
                None => {
                    // next_trip only returns trips on the good side of
                    // s0.time(), so this cannot happen on coherent data
                    error!("negative wait time when boarding");
                    continue;
                }
            };
            // strict comparison : on equal waits the earlier day wins
            if best.map_or(true, |(_, _, best_wait)| wait < best_wait) {
                best = Some((day_idx, row, wait));
            }
        }

        let (best_day_idx, best_row, best_wait) = match best {
            Some(found) => found,
            None => return Ok(None), // no appropriate trip
        };

        if let Some(matcher) = &request.banned_departures {
            if matcher.matches(&ctx.service_days[best_day_idx], best_row, self.position) {
                return Ok(None);
            }
        }

        let trip = best_row.trip();
        let trip_data = ctx.network.trip(trip);

        let forward = !request.arrive_by;
        let mut editor = s0.edit(
            TransitionKind::BoardAlight {
                boarding: self.boarding,
            },
            forward,
        );
        editor.set_service_day(best_day_idx);
        editor.set_trip(trip);
        editor.increment_time(best_wait);
        editor.increment_boardings();
        editor.set_previous_trip(trip);
        editor.set_route(trip_data.route);

        let wait_cost = if !s0.ever_boarded() && !request.reverse_optimizing {
            editor.set_initial_wait(best_wait);
            best_wait.total_seconds() as f64 * request.wait_at_beginning_factor
        } else {
            best_wait.total_seconds() as f64 * request.wait_reluctance
        };

        let preferences_penalty = request.preferences_penalty_for_route(route_idx);

        // if this is not the first boarding, we are transferring
        let mut transfer_penalty = 0.0;
        if s0.ever_boarded() {
            if let (Some(previous_stop), Some(previous_trip)) =
                (s0.previous_stop(), s0.previous_trip())
            {
                let rule = ctx.transfers.transfer_rule(
                    previous_stop,
                    self.stop(ctx),
                    previous_trip,
                    trip,
                    self.boarding,
                );
                match TransferTable::determine_transfer_penalty(
                    rule,
                    best_wait,
                    request.nonpreferred_transfer_penalty,
                ) {
                    TransferVerdict::Forbidden => return Ok(None),
                    TransferVerdict::Allowed { extra_weight } => {
                        transfer_penalty = extra_weight;
                    }
                }
            }
        }
        editor.increment_weight(preferences_penalty + transfer_penalty);

        // when reverse optimizing, the board cost is applied on the other
        // side of the leg to prevent state domination through free alights
        if request.reverse_optimizing {
            editor.increment_weight(wait_cost);
        } else {
            editor.increment_weight(wait_cost + request.board_cost);
        }

        let new_state = match editor.into_state() {
            Some(state) => state,
            None => return Ok(None),
        };

        // The last alight can be slid forward by up to best_wait without
        // impacting this boarding; when the recorded delta fits, rebuild
        // the chain with the slide applied.
        if request.reverse_optimize_on_the_fly
            && !request.reverse_optimizing
            && s0.ever_boarded()
        {
            if let Some(delta) = s0.last_next_arrival_delta() {
                if delta <= best_wait {
                    return match reverse_optimize(&new_state, delta, forward, request) {
                        Some(optimized) => Ok(Some(optimized)),
                        None => {
                            error!("could not rebuild an optimized state, this shouldn't happen");
                            Err(TraverseError::ReverseOptimizationFailed)
                        }
                    };
                }
            }
        }

        Ok(Some(new_state))
    }

    /// A costless traversal for optimistic/heuristic exploration.
    pub fn optimistic_traverse(
        &self,
        s0: &Arc<SearchState>,
        request: &RoutingRequest,
    ) -> Option<Arc<SearchState>> {
        let editor = s0.edit(
            TransitionKind::BoardAlight {
                boarding: self.boarding,
            },
            !request.arrive_by,
        );
        editor.into_state()
    }

    /// Admissible lower bound on the time spent by any traversal of this
    /// transition. Only the side of the search that selects trips can prove
    /// a pattern unusable; the other side is free.
    pub fn time_lower_bound(&self, ctx: &SearchContext<'_>, request: &RoutingRequest) -> f64 {
        if (request.arrive_by && self.boarding) || (!request.arrive_by && !self.boarding) {
            let pattern_data = ctx.network.pattern(self.pattern);
            if !request.modes.contains(pattern_data.mode()) {
                return f64::INFINITY;
            }
            let services = pattern_data.services();
            for day in &ctx.service_days {
                if day.any_service_running(services) {
                    return 0.0;
                }
            }
            f64::INFINITY
        } else {
            0.0
        }
    }

    /// If the bound search reaches this transition on the trip-selection
    /// side, the pattern's usefulness is decided by `time_lower_bound`;
    /// otherwise a boarding is still ahead and its cost bounds the weight.
    pub fn weight_lower_bound(&self, ctx: &SearchContext<'_>, request: &RoutingRequest) -> f64 {
        if (request.arrive_by && self.boarding) || (!request.arrive_by && !self.boarding) {
            self.time_lower_bound(ctx, request)
        } else {
            request.board_cost_lower_bound()
        }
    }
}

/// Rebuilds the chain of `state` with the most recent alight (and every
/// state after it) slid by `slide` in the direction of the search, and the
/// wait cost of the final boarding reduced accordingly. The boarded trip
/// and the final time are unchanged.
///
/// Returns `None` when no alight exists behind `state` or when sliding
/// would push an intermediate state past the final boarding time; both
/// are invariant violations, since the caller checked the recorded delta.
fn reverse_optimize(
    state: &Arc<SearchState>,
    slide: PositiveDuration,
    forward: bool,
    request: &RoutingRequest,
) -> Option<Arc<SearchState>> {
    // gather the suffix [parent, ..., most recent alight]
    let mut suffix: Vec<Arc<SearchState>> = Vec::new();
    let mut cursor = state.parent()?.clone();
    loop {
        suffix.push(cursor.clone());
        if cursor.kind().is_board_alight() {
            break;
        }
        cursor = cursor.parent()?.clone();
    }

    // rebuild oldest-first, each state slid by `slide`
    let mut rebuilt_parent: Option<Arc<SearchState>> = suffix.last()?.parent().cloned();
    for old in suffix.iter().rev() {
        let slid_time = if forward {
            old.time().checked_add(slide)?
        } else {
            old.time().checked_sub(slide)?
        };
        let valid = if forward {
            slid_time <= state.time()
        } else {
            slid_time >= state.time()
        };
        if !valid {
            return None;
        }
        rebuilt_parent = Some(Arc::new(old.with_time_and_parent(slid_time, rebuilt_parent)));
    }

    // the wait before the final boarding shrank by `slide`
    let optimized_weight =
        state.weight() - slide.total_seconds() as f64 * request.wait_reluctance;
    Some(Arc::new(state.with_parent_weight_and_delta(
        rebuilt_parent,
        optimized_weight,
        None,
    )))
}
