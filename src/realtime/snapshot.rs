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

use crate::model::PatternIdx;
use crate::timetables::Timetable;

/// An immutable, versioned view of every realtime-adjusted timetable.
///
/// Once published, a snapshot never changes : supersession happens by
/// swapping the published reference, never by mutating contents. A search
/// that obtained a snapshot may keep reading it for its whole execution,
/// however stale it becomes.
pub struct RealtimeSnapshot {
    version: u64,
    timetables: HashMap<(PatternIdx, NaiveDate), Arc<Timetable>>,
}

impl RealtimeSnapshot {
    pub(crate) fn empty() -> Self {
        Self {
            version: 0,
            timetables: HashMap::new(),
        }
    }

    pub(crate) fn new(
        version: u64,
        timetables: HashMap<(PatternIdx, NaiveDate), Arc<Timetable>>,
    ) -> Self {
        Self {
            version,
            timetables,
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn nb_of_timetables(&self) -> usize {
        self.timetables.len()
    }

    /// The realtime overlay for `(pattern, date)`, if any. Callers fall
    /// back to the scheduled baseline when this returns `None`.
    pub fn resolve(&self, pattern: PatternIdx, date: &NaiveDate) -> Option<&Arc<Timetable>> {
        self.timetables.get(&(pattern, *date))
    }
}
