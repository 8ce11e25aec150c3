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
use hermod::search::state::{SearchState, TransitionKind};
use hermod::time::PositiveDuration;
use hermod::transfers::{TransferRule, TransferTable, TransferVerdict};
use hermod::RoutingRequest;
use utils::{alight_at, board_at, empty_snapshot, init, search_start};

fn connection_network(rule: Option<TransferRule>) -> (TransitNetwork, TransferTable) {
    let builder = NetworkBuilder::new("2020-01-01", "2020-01-02")
        .calendar("service1", &["2020-01-01"])
        .route("1", Mode::Bus)
        .route("2", Mode::Bus)
        .trip("feeder", |t| {
            t.route("1")
                .service("service1")
                .st("A", "08:00:00", "08:00:00")
                .st("B", "08:10:00", "08:10:00")
        })
        .trip("connection", |t| {
            t.route("2")
                .service("service1")
                .st("B", "08:20:00", "08:20:00")
                .st("C", "08:40:00", "08:40:00")
        });
    let builder = match rule {
        Some(rule) => builder.trip_transfer("B", "B", "feeder", "connection", rule),
        None => builder,
    };
    builder.build()
}

#[test]
fn test_transfer_rule_is_a_pure_function() -> Result<(), Error> {
    init();
    let (network, transfers) =
        connection_network(Some(TransferRule::MinSeconds(PositiveDuration::from_hms(0, 5, 0))));
    let from_stop = network.stop_idx("B").expect("stop B exists");
    let from_trip = network.trip_idx("feeder").expect("feeder exists");
    let to_trip = network.trip_idx("connection").expect("connection exists");

    let first = transfers.transfer_rule(from_stop, from_stop, from_trip, to_trip, true);
    let second = transfers.transfer_rule(from_stop, from_stop, from_trip, to_trip, true);
    assert_eq!(first, second);

    let wait = PositiveDuration::from_hms(0, 10, 0);
    let verdict_one = TransferTable::determine_transfer_penalty(first, wait, 180.0);
    let verdict_two = TransferTable::determine_transfer_penalty(second, wait, 180.0);
    assert_eq!(verdict_one, verdict_two);
    assert_eq!(
        verdict_one,
        TransferVerdict::Allowed {
            extra_weight: 180.0
        }
    );
    Ok(())
}

#[test]
fn test_unsatisfiable_minimum_forbids_the_verdict() {
    init();
    let rule = Some(TransferRule::MinSeconds(PositiveDuration::from_hms(0, 15, 0)));
    let wait = PositiveDuration::from_hms(0, 10, 0);
    assert_eq!(
        TransferTable::determine_transfer_penalty(rule, wait, 180.0),
        TransferVerdict::Forbidden
    );
}

#[test]
fn test_forbidden_transfer_rejects_boarding() -> Result<(), Error> {
    init();
    let (network, transfers) = connection_network(Some(TransferRule::Forbidden));
    let request = RoutingRequest::default();
    let (context, origin) =
        search_start(&network, &transfers, empty_snapshot(), "2020-01-01T07:58:00");

    let off_transit = ride_feeder_to_b(&network, &context, &origin, &request)?;
    let board = board_at(&network, "connection", "B");
    assert!(board.traverse(&off_transit, &context, &request)?.is_none());
    Ok(())
}

#[test]
fn test_minimum_transfer_time_unmet_rejects_boarding() -> Result<(), Error> {
    init();
    // alight at 08:10, next boarding at 08:20 : a 15 minutes minimum cannot
    // be satisfied
    let (network, transfers) =
        connection_network(Some(TransferRule::MinSeconds(PositiveDuration::from_hms(0, 15, 0))));
    let request = RoutingRequest::default();
    let (context, origin) =
        search_start(&network, &transfers, empty_snapshot(), "2020-01-01T07:58:00");

    let off_transit = ride_feeder_to_b(&network, &context, &origin, &request)?;
    let board = board_at(&network, "connection", "B");
    assert!(board.traverse(&off_transit, &context, &request)?.is_none());
    Ok(())
}

#[test]
fn test_constrained_transfer_costs_the_nonpreferred_penalty() -> Result<(), Error> {
    init();
    let constrained =
        connection_network(Some(TransferRule::MinSeconds(PositiveDuration::from_hms(0, 5, 0))));
    let preferred = connection_network(Some(TransferRule::Preferred));
    let request = RoutingRequest::default();

    let weight_constrained = weight_after_connection(&constrained.0, &constrained.1, &request)?;
    let weight_preferred = weight_after_connection(&preferred.0, &preferred.1, &request)?;

    assert!(
        (weight_constrained - weight_preferred - request.nonpreferred_transfer_penalty).abs()
            < 1e-9
    );
    Ok(())
}

#[test]
fn test_unknown_transfer_costs_nothing_extra() -> Result<(), Error> {
    init();
    let without_rule = connection_network(None);
    let preferred = connection_network(Some(TransferRule::Preferred));
    let request = RoutingRequest::default();

    let weight_without = weight_after_connection(&without_rule.0, &without_rule.1, &request)?;
    let weight_preferred = weight_after_connection(&preferred.0, &preferred.1, &request)?;

    assert!((weight_without - weight_preferred).abs() < 1e-9);
    Ok(())
}

fn ride_feeder_to_b(
    network: &TransitNetwork,
    context: &hermod::SearchContext<'_>,
    origin: &Arc<SearchState>,
    request: &RoutingRequest,
) -> Result<Arc<SearchState>, Error> {
    let board = board_at(network, "feeder", "A");
    let on_board = board
        .traverse(origin, context, request)?
        .expect("the feeder should be boardable");
    let mut riding = on_board.edit(TransitionKind::Street, true);
    riding.increment_time(PositiveDuration::from_hms(0, 10, 0));
    let at_b = riding.into_state().expect("still within the calendar");
    let alight = alight_at(network, "feeder", "B");
    let alighted = alight
        .traverse(&at_b, context, request)?
        .expect("alighting should succeed");
    Ok(alighted
        .edit(TransitionKind::Street, true)
        .into_state()
        .expect("still within the calendar"))
}

fn weight_after_connection(
    network: &TransitNetwork,
    transfers: &TransferTable,
    request: &RoutingRequest,
) -> Result<f64, Error> {
    let (context, origin) =
        search_start(network, transfers, empty_snapshot(), "2020-01-01T07:58:00");
    let off_transit = ride_feeder_to_b(network, &context, &origin, request)?;
    let board = board_at(network, "connection", "B");
    let boarded = board
        .traverse(&off_transit, &context, request)?
        .expect("the connection should be boardable");
    Ok(boarded.weight())
}
