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

use crate::model::{StopIdx, TripIdx};
use crate::time::PositiveDuration;

/// Transfer semantics between a stop pair, possibly narrowed to trips.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransferRule {
    /// this transfer may never be used
    Forbidden,
    /// the wait between alighting and boarding must be at least this long
    MinSeconds(PositiveDuration),
    /// this transfer is guaranteed and carries no penalty
    Preferred,
}

/// The outcome of evaluating a transfer against a concrete wait.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransferVerdict {
    Forbidden,
    Allowed { extra_weight: f64 },
}

struct TransferEntry {
    from_trip: Option<TripIdx>,
    to_trip: Option<TripIdx>,
    rule: TransferRule,
}

/// Transfer rules between stops and trips, static after the network build.
///
/// Lookup is by decreasing specificity : an entry naming both trips wins
/// over one naming only the alighting trip, which wins over one naming only
/// the boarding trip, which wins over a stop-pair-only entry.
#[derive(Default)]
pub struct TransferTable {
    entries: HashMap<(StopIdx, StopIdx), Vec<TransferEntry>>,
}

impl TransferTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        from_stop: StopIdx,
        to_stop: StopIdx,
        from_trip: Option<TripIdx>,
        to_trip: Option<TripIdx>,
        rule: TransferRule,
    ) {
        self.entries
            .entry((from_stop, to_stop))
            .or_default()
            .push(TransferEntry {
                from_trip,
                to_trip,
                rule,
            });
    }

    pub fn nb_of_entries(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Looks up the rule for transferring from `(previous_stop,
    /// previous_trip)` to `(stop, trip)`. When `boarding` is false the
    /// transition belongs to an arrive-by trip selection and the lookup
    /// direction is reversed, since the chronological transfer then goes
    /// from the "new" leg to the "previous" one.
    ///
    /// This is a pure function of its arguments : same inputs always yield
    /// the same rule.
    pub fn transfer_rule(
        &self,
        previous_stop: StopIdx,
        stop: StopIdx,
        previous_trip: TripIdx,
        trip: TripIdx,
        boarding: bool,
    ) -> Option<TransferRule> {
        let (from_stop, to_stop, from_trip, to_trip) = if boarding {
            (previous_stop, stop, previous_trip, trip)
        } else {
            (stop, previous_stop, trip, previous_trip)
        };
        let entries = self.entries.get(&(from_stop, to_stop))?;

        let specificity = |entry: &TransferEntry| -> Option<u8> {
            match (entry.from_trip, entry.to_trip) {
                (Some(from), Some(to)) if from == from_trip && to == to_trip => Some(3),
                (Some(from), None) if from == from_trip => Some(2),
                (None, Some(to)) if to == to_trip => Some(1),
                (None, None) => Some(0),
                _ => None,
            }
        };

        entries
            .iter()
            .filter_map(|entry| specificity(entry).map(|rank| (rank, entry.rule)))
            .max_by_key(|(rank, _)| *rank)
            .map(|(_, rule)| rule)
    }

    /// Evaluates a rule against the computed wait. Pure : no lookup, no
    /// state. An unknown transfer (no rule) costs nothing; an explicit
    /// minimum that the wait satisfies costs the non-preferred penalty; an
    /// unsatisfiable minimum, like an explicit ban, forbids the transfer.
    pub fn determine_transfer_penalty(
        rule: Option<TransferRule>,
        wait: PositiveDuration,
        nonpreferred_transfer_penalty: f64,
    ) -> TransferVerdict {
        match rule {
            None => TransferVerdict::Allowed { extra_weight: 0.0 },
            Some(TransferRule::Preferred) => TransferVerdict::Allowed { extra_weight: 0.0 },
            Some(TransferRule::Forbidden) => TransferVerdict::Forbidden,
            Some(TransferRule::MinSeconds(min_duration)) => {
                if wait < min_duration {
                    TransferVerdict::Forbidden
                } else {
                    TransferVerdict::Allowed {
                        extra_weight: nonpreferred_transfer_penalty,
                    }
                }
            }
        }
    }
}
