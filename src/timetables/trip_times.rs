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

use crate::model::{ServiceIdx, TripIdx};
use crate::realtime::{StopTimeEvent, TripUpdate};
use crate::time::SecondsSinceDayStart;
use crate::timetables::TripTimesError;

/// One row of arrival/departure times for one trip of a pattern.
///
/// Two flavors share this type : the scheduled rows built once with the
/// network, and realtime-adjusted rows derived by `apply_update` on a copy.
/// Times within a row are monotonic :
///   arrival[i] <= departure[i] <= arrival[i+1]
/// except when the row is marked canceled, in which case the times are kept
/// but the row is never selectable.
#[derive(Debug, Clone)]
pub struct TripTimes {
    trip: TripIdx,
    service: ServiceIdx,
    arrival_times: Vec<SecondsSinceDayStart>,
    departure_times: Vec<SecondsSinceDayStart>,
    canceled: bool,
}

impl TripTimes {
    pub fn new(
        trip: TripIdx,
        service: ServiceIdx,
        arrival_times: Vec<SecondsSinceDayStart>,
        departure_times: Vec<SecondsSinceDayStart>,
    ) -> Result<Self, TripTimesError> {
        inspect(&arrival_times, &departure_times)?;
        Ok(Self {
            trip,
            service,
            arrival_times,
            departure_times,
            canceled: false,
        })
    }

    pub fn trip(&self) -> TripIdx {
        self.trip
    }

    pub fn service(&self) -> ServiceIdx {
        self.service
    }

    pub fn nb_of_positions(&self) -> usize {
        self.arrival_times.len()
    }

    pub fn arrival_time(&self, position: usize) -> SecondsSinceDayStart {
        self.arrival_times[position]
    }

    pub fn departure_time(&self, position: usize) -> SecondsSinceDayStart {
        self.departure_times[position]
    }

    pub fn is_canceled(&self) -> bool {
        self.canceled
    }

    /// Derives a new row by applying a realtime update onto a copy of this
    /// one. Delays propagate to all downstream positions until another
    /// explicit update overrides them, as in gtfs-realtime.
    pub fn apply_update(&self, update: &TripUpdate) -> Result<TripTimes, TripTimesError> {
        let nb_of_positions = self.nb_of_positions();

        let mut events: Vec<Option<&StopTimeEvent>> = vec![None; nb_of_positions];
        for stop_time_update in &update.stop_time_updates {
            if stop_time_update.position >= nb_of_positions {
                return Err(TripTimesError::BadPosition(stop_time_update.position));
            }
            events[stop_time_update.position] = Some(&stop_time_update.event);
        }

        let mut arrival_times = Vec::with_capacity(nb_of_positions);
        let mut departure_times = Vec::with_capacity(nb_of_positions);
        let mut current_delay: i32 = 0;
        for position in 0..nb_of_positions {
            match events[position] {
                Some(StopTimeEvent::Delay { seconds }) => {
                    current_delay = *seconds;
                    arrival_times.push(
                        self.arrival_times[position]
                            .checked_add_signed(current_delay)
                            .ok_or(TripTimesError::TimeOutOfRange(position))?,
                    );
                    departure_times.push(
                        self.departure_times[position]
                            .checked_add_signed(current_delay)
                            .ok_or(TripTimesError::TimeOutOfRange(position))?,
                    );
                }
                Some(StopTimeEvent::NewTimes {
                    arrival,
                    departure,
                }) => {
                    arrival_times.push(*arrival);
                    departure_times.push(*departure);
                    // downstream stops without an explicit update keep the
                    // delay implied by the new departure
                    current_delay =
                        departure.total_seconds() - self.departure_times[position].total_seconds();
                }
                None => {
                    arrival_times.push(
                        self.arrival_times[position]
                            .checked_add_signed(current_delay)
                            .ok_or(TripTimesError::TimeOutOfRange(position))?,
                    );
                    departure_times.push(
                        self.departure_times[position]
                            .checked_add_signed(current_delay)
                            .ok_or(TripTimesError::TimeOutOfRange(position))?,
                    );
                }
            }
        }

        let canceled = update.canceled;
        if !canceled {
            inspect(&arrival_times, &departure_times)?;
        }

        Ok(TripTimes {
            trip: self.trip,
            service: self.service,
            arrival_times,
            departure_times,
            canceled,
        })
    }
}

/// Checks the monotonicity invariant of one row of stop times.
pub fn inspect(
    arrival_times: &[SecondsSinceDayStart],
    departure_times: &[SecondsSinceDayStart],
) -> Result<(), TripTimesError> {
    if arrival_times.len() < 2 || arrival_times.len() != departure_times.len() {
        return Err(TripTimesError::BadLength);
    }
    for position in 0..arrival_times.len() {
        if departure_times[position] < arrival_times[position] {
            return Err(TripTimesError::DepartureBeforeArrival(position));
        }
        if position + 1 < arrival_times.len()
            && arrival_times[position + 1] < departure_times[position]
        {
            return Err(TripTimesError::DecreasingTimes(position, position + 1));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seconds(value: i32) -> SecondsSinceDayStart {
        SecondsSinceDayStart::from_seconds(value).unwrap()
    }

    #[test]
    fn inspect_accepts_monotonic_times() {
        let arrivals = vec![seconds(100), seconds(200), seconds(300)];
        let departures = vec![seconds(110), seconds(210), seconds(300)];
        assert!(inspect(&arrivals, &departures).is_ok());
    }

    #[test]
    fn inspect_rejects_departure_before_arrival() {
        let arrivals = vec![seconds(100), seconds(200)];
        let departures = vec![seconds(90), seconds(200)];
        assert_eq!(
            inspect(&arrivals, &departures),
            Err(TripTimesError::DepartureBeforeArrival(0))
        );
    }

    #[test]
    fn inspect_rejects_decreasing_times_between_positions() {
        let arrivals = vec![seconds(100), seconds(105)];
        let departures = vec![seconds(110), seconds(120)];
        assert_eq!(
            inspect(&arrivals, &departures),
            Err(TripTimesError::DecreasingTimes(0, 1))
        );
    }

    #[test]
    fn inspect_rejects_single_position() {
        let arrivals = vec![seconds(100)];
        let departures = vec![seconds(100)];
        assert_eq!(
            inspect(&arrivals, &departures),
            Err(TripTimesError::BadLength)
        );
    }
}
