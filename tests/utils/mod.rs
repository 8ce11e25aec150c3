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

#![allow(dead_code)]

use std::sync::Arc;

use hermod::chrono::NaiveDateTime;
use hermod::config::UpdaterConfig;
use hermod::realtime::snapshot::RealtimeSnapshot;
use hermod::search::state::SearchState;
use hermod::search::SearchContext;
use hermod::transfers::TransferTable;
use hermod::{BoardAlight, SnapshotSource, TransitNetwork};

pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("debug")
        .try_init();
}

pub fn datetime(text: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S").expect("badly formatted datetime")
}

pub fn empty_snapshot() -> Arc<RealtimeSnapshot> {
    SnapshotSource::new(UpdaterConfig::default()).snapshot()
}

pub fn board_at(network: &TransitNetwork, trip_id: &str, stop_id: &str) -> BoardAlight {
    let trip_idx = network.trip_idx(trip_id).expect("unknown trip");
    let pattern = network.pattern_of_trip(trip_idx);
    let stop_idx = network.stop_idx(stop_id).expect("unknown stop");
    let position = network
        .position_of_stop(pattern, stop_idx)
        .expect("stop not on pattern");
    BoardAlight::board(network, pattern, position).expect("no boarding allowed there")
}

pub fn alight_at(network: &TransitNetwork, trip_id: &str, stop_id: &str) -> BoardAlight {
    let trip_idx = network.trip_idx(trip_id).expect("unknown trip");
    let pattern = network.pattern_of_trip(trip_idx);
    let stop_idx = network.stop_idx(stop_id).expect("unknown stop");
    let position = network
        .position_of_stop(pattern, stop_idx)
        .expect("stop not on pattern");
    BoardAlight::alight(network, pattern, position).expect("no alighting allowed there")
}

/// Builds a search context pinned on `snapshot` plus the origin state of a
/// search starting at `datetime_text` (UTC).
pub fn search_start<'a>(
    network: &'a TransitNetwork,
    transfers: &'a TransferTable,
    snapshot: Arc<RealtimeSnapshot>,
    datetime_text: &str,
) -> (SearchContext<'a>, Arc<SearchState>) {
    let context = SearchContext::new(network, transfers, snapshot, &datetime(datetime_text))
        .expect("datetime outside the network validity period");
    let origin = SearchState::origin(context.start_time());
    (context, origin)
}

/// The seconds separating two states, in either direction.
pub fn seconds_between(a: &SearchState, b: &SearchState) -> u64 {
    b.time()
        .duration_since(&a.time())
        .or_else(|| a.time().duration_since(&b.time()))
        .expect("one of the two orders must work")
        .total_seconds()
}
