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

use crate::model::{PatternIdx, TripIdx};
use crate::service_day::ServiceDay;
use crate::time::{PositiveDuration, SecondsSinceDatasetUtcStart, SecondsSinceDayStart};
use crate::timetables::TripTimes;

/// The trip-time rows of one pattern, for one version of the data :
/// either the scheduled baseline, or a realtime overlay for one service day.
///
/// A timetable is immutable once published to readers. The mutating methods
/// are only ever called on working copies owned by the snapshot source.
#[derive(Debug, Clone)]
pub struct Timetable {
    pattern: PatternIdx,
    /// rows ordered by increasing departure time at the first position
    rows: Vec<TripTimes>,
    /// earliest departure and latest arrival over all positions of all
    /// non-canceled rows; `None` when every row is canceled
    bounds: Option<(SecondsSinceDayStart, SecondsSinceDayStart)>,
}

impl Timetable {
    pub fn new(pattern: PatternIdx, mut rows: Vec<TripTimes>) -> Self {
        rows.sort_by_key(|row| row.departure_time(0));
        let mut result = Self {
            pattern,
            rows,
            bounds: None,
        };
        result.update_bounds();
        result
    }

    pub fn pattern(&self) -> PatternIdx {
        self.pattern
    }

    pub fn nb_of_trips(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> impl Iterator<Item = &TripTimes> {
        self.rows.iter()
    }

    pub fn trip_row(&self, trip: TripIdx) -> Option<&TripTimes> {
        self.rows.iter().find(|row| row.trip() == trip)
    }

    /// Replaces the row of `row.trip()` (or inserts a new one) in this
    /// working copy, keeping rows ordered and bounds up to date.
    pub(crate) fn set_trip_times(&mut self, row: TripTimes) {
        match self
            .rows
            .iter()
            .position(|candidate| candidate.trip() == row.trip())
        {
            Some(position) => self.rows[position] = row,
            None => self.rows.push(row),
        }
        self.rows.sort_by_key(|row| row.departure_time(0));
        self.update_bounds();
    }

    fn update_bounds(&mut self) {
        let mut bounds: Option<(SecondsSinceDayStart, SecondsSinceDayStart)> = None;
        for row in self.rows.iter().filter(|row| !row.is_canceled()) {
            for position in 0..row.nb_of_positions() {
                let departure = row.departure_time(position);
                let arrival = row.arrival_time(position);
                bounds = match bounds {
                    None => Some((departure, arrival)),
                    Some((min_departure, max_arrival)) => Some((
                        std::cmp::min(min_departure, departure),
                        std::cmp::max(max_arrival, arrival),
                    )),
                };
            }
        }
        self.bounds = bounds;
    }

    /// A cheap monotonic pre-check : can any trip of this timetable possibly
    /// beat `best_wait` for a state at `search_time` ?
    ///
    /// When `boarding`, the earliest departure of the whole table must not be
    /// later than the current best absolute boarding time; when alighting
    /// (arrive-by trip selection), the latest arrival must not be earlier
    /// than the current best absolute alighting time.
    pub fn temporally_viable(
        &self,
        day: &ServiceDay,
        search_time: SecondsSinceDatasetUtcStart,
        best_wait: Option<PositiveDuration>,
        boarding: bool,
    ) -> bool {
        let (min_departure, max_arrival) = match self.bounds {
            Some(bounds) => bounds,
            None => return false, // every row is canceled
        };
        let best_wait = match best_wait {
            Some(wait) => wait,
            None => return true, // no best yet, anything may improve
        };
        if boarding {
            let best_time = match search_time.checked_add(best_wait) {
                Some(time) => time,
                None => return false,
            };
            match day.time(min_departure) {
                Some(earliest) => earliest <= best_time,
                None => false,
            }
        } else {
            let best_time = match search_time.checked_sub(best_wait) {
                Some(time) => time,
                None => return false,
            };
            match day.time(max_arrival) {
                Some(latest) => latest >= best_time,
                None => false,
            }
        }
    }

    /// Finds the best boardable (resp. debarkable) trip at `position`
    /// relative to `time` : the one with the earliest departure not before
    /// `time` when `boarding`, or the latest arrival not after `time`
    /// otherwise. Canceled rows and rows whose service does not run on `day`
    /// are skipped.
    pub fn next_trip(
        &self,
        day: &ServiceDay,
        time: SecondsSinceDatasetUtcStart,
        position: usize,
        boarding: bool,
    ) -> Option<(&TripTimes, SecondsSinceDatasetUtcStart)> {
        let mut best: Option<(&TripTimes, SecondsSinceDatasetUtcStart)> = None;
        for row in &self.rows {
            if row.is_canceled() || !day.service_running(row.service()) {
                continue;
            }
            if boarding {
                let departure = match day.time(row.departure_time(position)) {
                    Some(departure) => departure,
                    None => continue,
                };
                if departure < time {
                    continue;
                }
                if best.map_or(true, |(_, best_time)| departure < best_time) {
                    best = Some((row, departure));
                }
            } else {
                let arrival = match day.time(row.arrival_time(position)) {
                    Some(arrival) => arrival,
                    None => continue,
                };
                if arrival > time {
                    continue;
                }
                if best.map_or(true, |(_, best_time)| arrival > best_time) {
                    best = Some((row, arrival));
                }
            }
        }
        best
    }

    /// The delay until the next departure strictly after `departure` at
    /// `position`, among trips running on `day`. Supports the on-the-fly
    /// reverse optimization bookkeeping.
    pub fn next_departure_after(
        &self,
        day: &ServiceDay,
        position: usize,
        departure: SecondsSinceDatasetUtcStart,
    ) -> Option<PositiveDuration> {
        let mut best: Option<SecondsSinceDatasetUtcStart> = None;
        for row in &self.rows {
            if row.is_canceled() || !day.service_running(row.service()) {
                continue;
            }
            let candidate = match day.time(row.departure_time(position)) {
                Some(candidate) => candidate,
                None => continue,
            };
            if candidate <= departure {
                continue;
            }
            if best.map_or(true, |best_time| candidate < best_time) {
                best = Some(candidate);
            }
        }
        best.and_then(|next| next.duration_since(&departure))
    }
}
