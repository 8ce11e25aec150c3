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

mod utils;

use std::sync::Arc;

use anyhow::Error;
use hermod::model::{Mode, TransitNetwork};
use hermod::network_builder::NetworkBuilder;
use hermod::search::board_alight::TraverseError;
use hermod::search::state::{SearchState, TransitionKind};
use hermod::time::PositiveDuration;
use hermod::transfers::TransferTable;
use hermod::{RoutingRequest, SearchContext};
use utils::{alight_at, board_at, empty_snapshot, init, search_start, seconds_between};

/// Two trips on the feeder pattern ten/thirty minutes apart, then a
/// connection with a long wait : the alight can slide forward by one
/// headway without losing the connection.
fn sliding_network() -> (TransitNetwork, TransferTable) {
    NetworkBuilder::new("2020-01-01", "2020-01-02")
        .calendar("service1", &["2020-01-01"])
        .route("1", Mode::Bus)
        .route("2", Mode::Bus)
        .trip("feeder_1", |t| {
            t.route("1")
                .service("service1")
                .st("A", "08:00:00", "08:00:00")
                .st("B", "08:10:00", "08:10:00")
        })
        .trip("feeder_2", |t| {
            t.route("1")
                .service("service1")
                .st("A", "08:20:00", "08:20:00")
                .st("B", "08:30:00", "08:30:00")
        })
        .trip("connection", |t| {
            t.route("2")
                .service("service1")
                .st("B", "08:40:00", "08:40:00")
                .st("C", "08:50:00", "08:50:00")
        })
        .build()
}

fn ride_feeder_and_alight(
    network: &TransitNetwork,
    context: &SearchContext<'_>,
    origin: &Arc<SearchState>,
    request: &RoutingRequest,
) -> Result<Arc<SearchState>, Error> {
    let board = board_at(network, "feeder_1", "A");
    let on_board = board
        .traverse(origin, context, request)?
        .expect("the feeder should be boardable");
    let mut riding = on_board.edit(TransitionKind::Street, true);
    riding.increment_time(PositiveDuration::from_hms(0, 10, 0));
    let at_b = riding.into_state().expect("still within the calendar");
    let alighted = alight_at(network, "feeder_1", "B")
        .traverse(&at_b, context, request)?
        .expect("alighting should succeed");
    Ok(alighted
        .edit(TransitionKind::Street, true)
        .into_state()
        .expect("still within the calendar"))
}

/// Alighting with the on-the-fly toggle records the gap to the next
/// departure of the same timetable.
#[test]
fn test_alight_records_next_arrival_delta() -> Result<(), Error> {
    init();
    let (network, transfers) = sliding_network();
    let (context, origin) =
        search_start(&network, &transfers, empty_snapshot(), "2020-01-01T07:58:00");
    let mut request = RoutingRequest::default();
    request.reverse_optimize_on_the_fly = true;

    let off_transit = ride_feeder_and_alight(&network, &context, &origin, &request)?;

    // feeder_2 departs B twenty minutes after feeder_1
    assert_eq!(
        off_transit.last_next_arrival_delta(),
        Some(PositiveDuration::from_hms(0, 20, 0))
    );
    Ok(())
}

/// When the recorded delta fits within the boarding wait, the traversal
/// yields an optimized state : same arrival, strictly smaller weight, and
/// an alight slid forward in the rebuilt chain.
#[test]
fn test_boarding_produces_an_optimized_state() -> Result<(), Error> {
    init();
    let (network, transfers) = sliding_network();

    let plain_request = RoutingRequest::default();
    let mut optimizing_request = RoutingRequest::default();
    optimizing_request.reverse_optimize_on_the_fly = true;

    let run = |request: &RoutingRequest| -> Result<Arc<SearchState>, Error> {
        let (context, origin) =
            search_start(&network, &transfers, empty_snapshot(), "2020-01-01T07:58:00");
        let off_transit = ride_feeder_and_alight(&network, &context, &origin, request)?;
        Ok(board_at(&network, "connection", "B")
            .traverse(&off_transit, &context, request)?
            .expect("the connection should be boardable"))
    };

    let plain = run(&plain_request)?;
    let optimized = run(&optimizing_request)?;

    // the boarded trip and the timeline end are unchanged
    assert_eq!(optimized.trip(), plain.trip());
    assert_eq!(optimized.time(), plain.time());

    // the wait moved out of the journey : 20 minutes at wait reluctance
    let slide_cost = 20.0 * 60.0 * plain_request.wait_reluctance;
    assert!((plain.weight() - optimized.weight() - slide_cost).abs() < 1e-9);

    // the rebuilt chain alights 20 minutes later
    let slid_alight = optimized
        .parent()
        .and_then(|street| street.parent())
        .expect("the rebuilt chain still has the alight");
    assert!(slid_alight.kind().is_board_alight());
    assert_eq!(seconds_between(slid_alight, &plain), 10 * 60);
    Ok(())
}

/// A recorded delta without any alight behind the state is an internal
/// inconsistency : the traversal surfaces it as a distinct error, not as
/// "no trip found".
#[test]
fn test_missing_alight_surfaces_a_distinct_error() -> Result<(), Error> {
    init();
    let (network, transfers) = sliding_network();
    let (context, origin) =
        search_start(&network, &transfers, empty_snapshot(), "2020-01-01T08:25:00");
    let mut request = RoutingRequest::default();
    request.reverse_optimize_on_the_fly = true;

    // forge a state that claims a previous leg and a delta, without any
    // board/alight transition in its history
    let mut editor = origin.edit(TransitionKind::Street, true);
    editor.increment_boardings();
    editor.set_last_next_arrival_delta(Some(PositiveDuration::from_hms(0, 1, 0)));
    let forged = editor.into_state().expect("still within the calendar");

    let board = board_at(&network, "connection", "B");
    match board.traverse(&forged, &context, &request) {
        Err(TraverseError::ReverseOptimizationFailed) => Ok(()),
        other => panic!("expected a reverse optimization failure, got {:?}", other),
    }
}

/// In an arrive-by search the trip selection happens on the alight side,
/// and time walks backwards.
#[test]
fn test_arrive_by_selects_latest_arrival() -> Result<(), Error> {
    init();
    let (network, transfers) = sliding_network();
    let (context, origin) =
        search_start(&network, &transfers, empty_snapshot(), "2020-01-01T09:00:00");
    let mut request = RoutingRequest::default();
    request.arrive_by = true;

    let alight = alight_at(&network, "feeder_1", "B");
    let state = alight
        .traverse(&origin, &context, &request)?
        .expect("a trip should be selectable");

    // feeder_2 arrives at B at 08:30, the latest arrival before 09:00
    assert_eq!(state.trip(), network.trip_idx("feeder_2"));
    assert!(state.time() < origin.time());
    assert_eq!(seconds_between(&origin, &state), 30 * 60);
    Ok(())
}
