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

use anyhow::Error;
use hermod::chrono::NaiveDate;
use hermod::config::UpdaterConfig;
use hermod::model::{Mode, TransitNetwork};
use hermod::network_builder::NetworkBuilder;
use hermod::realtime::{StopTimeEvent, StopTimeUpdate, TripUpdate};
use hermod::time::PositiveDuration;
use hermod::transfers::TransferTable;
use hermod::{RoutingRequest, SnapshotSource};
use utils::{board_at, datetime, init, search_start, seconds_between};

fn two_departures_network() -> (TransitNetwork, TransferTable) {
    NetworkBuilder::new("2020-01-01", "2020-01-05")
        .calendar("service1", &["2020-01-01", "2020-01-02", "2020-01-03"])
        .route("1", Mode::Bus)
        .trip("first", |t| {
            t.route("1")
                .service("service1")
                .st("A", "08:00:00", "08:00:00")
                .st("B", "08:30:00", "08:30:00")
        })
        .trip("second", |t| {
            t.route("1")
                .service("service1")
                .st("A", "08:15:00", "08:15:00")
                .st("B", "08:45:00", "08:45:00")
        })
        .build()
}

fn delay_update(trip_id: &str, date: &str, seconds: i32) -> TripUpdate {
    TripUpdate {
        trip_id: trip_id.to_string(),
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").expect("badly formatted date"),
        canceled: false,
        stop_time_updates: vec![StopTimeUpdate {
            position: 0,
            event: StopTimeEvent::Delay { seconds },
        }],
    }
}

fn cancel_update(trip_id: &str, date: &str) -> TripUpdate {
    TripUpdate {
        trip_id: trip_id.to_string(),
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").expect("badly formatted date"),
        canceled: true,
        stop_time_updates: Vec::new(),
    }
}

/// A +600s delay on the 08:00 trip makes a 07:58 arrival board it at its
/// delayed departure, with a 720s wait.
#[test]
fn test_delayed_trip_is_boarded_at_its_new_time() -> Result<(), Error> {
    init();
    let (network, transfers) = two_departures_network();
    let mut source = SnapshotSource::new(UpdaterConfig::default());

    source.apply_updates(
        &network,
        "feed",
        false,
        false,
        &[delay_update("first", "2020-01-01", 600)],
        datetime("2020-01-01T07:00:00"),
    );

    let (context, origin) = search_start(
        &network,
        &transfers,
        source.snapshot(),
        "2020-01-01T07:58:00",
    );
    let board = board_at(&network, "first", "A");
    let state = board
        .traverse(&origin, &context, &RoutingRequest::default())?
        .expect("the delayed trip should be boardable");

    assert_eq!(state.trip(), network.trip_idx("first"));
    assert_eq!(seconds_between(&origin, &state), 720);
    Ok(())
}

/// The source resolves the overlay for an updated day, and falls back on
/// the scheduled baseline everywhere else.
#[test]
fn test_timetable_resolution_prefers_the_overlay() -> Result<(), Error> {
    init();
    let (network, _transfers) = two_departures_network();
    let mut source = SnapshotSource::new(UpdaterConfig::default());

    source.apply_updates(
        &network,
        "feed",
        false,
        false,
        &[delay_update("first", "2020-01-01", 600)],
        datetime("2020-01-01T07:00:00"),
    );

    let trip_idx = network.trip_idx("first").expect("trip exists");
    let pattern = network.pattern_of_trip(trip_idx);
    let date = |text: &str| NaiveDate::parse_from_str(text, "%Y-%m-%d").expect("valid date");

    let updated = source.timetable_for_pattern_and_day(&network, pattern, &date("2020-01-01"));
    let updated_row = updated.trip_row(trip_idx).expect("row exists");
    assert_eq!(
        updated_row.departure_time(0),
        hermod::time::SecondsSinceDayStart::from_hms(8, 10, 0).expect("valid time")
    );

    let baseline = source.timetable_for_pattern_and_day(&network, pattern, &date("2020-01-02"));
    let baseline_row = baseline.trip_row(trip_idx).expect("row exists");
    assert_eq!(
        baseline_row.departure_time(0),
        hermod::time::SecondsSinceDayStart::from_hms(8, 0, 0).expect("valid time")
    );
    Ok(())
}

/// A canceled trip becomes unselectable at the next published snapshot,
/// while a search still holding the previous snapshot keeps seeing it.
#[test]
fn test_cancellation_with_bounded_staleness() -> Result<(), Error> {
    init();
    let (network, transfers) = two_departures_network();
    let mut source = SnapshotSource::new(UpdaterConfig::default());

    source.apply_updates(
        &network,
        "feed",
        false,
        false,
        &[delay_update("first", "2020-01-01", 60)],
        datetime("2020-01-01T07:00:00"),
    );
    let old_snapshot = source.snapshot();

    source.apply_updates(
        &network,
        "feed",
        false,
        false,
        &[cancel_update("first", "2020-01-01")],
        datetime("2020-01-01T07:10:00"),
    );
    let new_snapshot = source.snapshot();
    assert!(new_snapshot.version() > old_snapshot.version());

    let request = RoutingRequest::default();
    let board = board_at(&network, "first", "A");

    // the in-flight search still sees the delayed trip
    let (old_context, old_origin) =
        search_start(&network, &transfers, old_snapshot, "2020-01-01T07:58:00");
    let old_state = board
        .traverse(&old_origin, &old_context, &request)?
        .expect("the old snapshot still offers the first trip");
    assert_eq!(old_state.trip(), network.trip_idx("first"));
    assert_eq!(seconds_between(&old_origin, &old_state), 180);

    // a fresh search falls back on the second departure
    let (new_context, new_origin) =
        search_start(&network, &transfers, new_snapshot, "2020-01-01T07:58:00");
    let new_state = board
        .traverse(&new_origin, &new_context, &request)?
        .expect("the second trip remains boardable");
    assert_eq!(new_state.trip(), network.trip_idx("second"));
    assert_eq!(seconds_between(&new_origin, &new_state), 1020);
    Ok(())
}

/// A full-dataset batch replaces everything previously known for its feed :
/// data not re-asserted in the batch reverts to schedule.
#[test]
fn test_full_dataset_replaces_previous_feed_state() -> Result<(), Error> {
    init();
    let (network, transfers) = two_departures_network();
    let mut source = SnapshotSource::new(UpdaterConfig::default());

    source.apply_updates(
        &network,
        "feed",
        false,
        false,
        &[delay_update("first", "2020-01-01", 600)],
        datetime("2020-01-01T07:00:00"),
    );

    // the full dataset only re-asserts a delay on "second"
    source.apply_updates(
        &network,
        "feed",
        true,
        false,
        &[delay_update("second", "2020-01-01", 60)],
        datetime("2020-01-01T07:10:00"),
    );

    let (context, origin) = search_start(
        &network,
        &transfers,
        source.snapshot(),
        "2020-01-01T07:58:00",
    );
    let board = board_at(&network, "first", "A");
    let state = board
        .traverse(&origin, &context, &RoutingRequest::default())?
        .expect("a trip should be boardable");

    // "first" runs on schedule again : 08:00, wait 120s
    assert_eq!(state.trip(), network.trip_idx("first"));
    assert_eq!(seconds_between(&origin, &state), 120);
    Ok(())
}

/// An unresolvable record is dropped and counted; the rest of its batch is
/// applied.
#[test]
fn test_bad_record_does_not_abort_the_batch() -> Result<(), Error> {
    init();
    let (network, _transfers) = two_departures_network();
    let mut source = SnapshotSource::new(UpdaterConfig::default());

    source.apply_updates(
        &network,
        "feed",
        false,
        false,
        &[
            delay_update("ghost_trip", "2020-01-01", 600),
            delay_update("first", "2020-01-01", 600),
        ],
        datetime("2020-01-01T07:00:00"),
    );

    assert_eq!(source.nb_of_dropped_updates(), 1);
    assert_eq!(source.nb_of_applied_updates(), 1);

    let snapshot = source.snapshot();
    let trip_idx = network.trip_idx("first").expect("trip exists");
    let pattern = network.pattern_of_trip(trip_idx);
    assert!(snapshot
        .resolve(pattern, &NaiveDate::from_ymd_opt(2020, 1, 1).expect("valid date"))
        .is_some());
    Ok(())
}

/// Publication is throttled : within the minimum interval the version does
/// not move, and the pending data is published once the interval elapses.
#[test]
fn test_publication_is_throttled() -> Result<(), Error> {
    init();
    let (network, _transfers) = two_departures_network();
    let mut config = UpdaterConfig::default();
    config.max_snapshot_frequency = PositiveDuration::from_hms(0, 1, 0);
    let mut source = SnapshotSource::new(config);

    source.apply_updates(
        &network,
        "feed",
        false,
        false,
        &[delay_update("first", "2020-01-01", 60)],
        datetime("2020-01-01T07:00:00"),
    );
    let version_after_first = source.snapshot().version();

    // two seconds later : staged, but not published
    source.apply_updates(
        &network,
        "feed",
        false,
        false,
        &[delay_update("second", "2020-01-01", 60)],
        datetime("2020-01-01T07:00:02"),
    );
    assert_eq!(source.snapshot().version(), version_after_first);

    // once the interval has elapsed, the pending data goes out
    assert!(source.maybe_publish(datetime("2020-01-01T07:01:30")));
    assert!(source.snapshot().version() > version_after_first);
    Ok(())
}

/// Purge only drops entries whose service day has fully elapsed : today is
/// never purged mid-day, and yesterday survives for its overnight trips.
#[test]
fn test_purge_keeps_today_and_yesterday() -> Result<(), Error> {
    init();
    let (network, _transfers) = two_departures_network();
    let mut source = SnapshotSource::new(UpdaterConfig::default());

    source.apply_updates(
        &network,
        "feed",
        false,
        false,
        &[
            delay_update("first", "2020-01-01", 60),
            delay_update("first", "2020-01-02", 60),
            delay_update("first", "2020-01-03", 60),
        ],
        datetime("2020-01-01T08:00:00"),
    );

    // wall clock is now midday on 2020-01-03
    source.publish(datetime("2020-01-03T12:00:00"));
    let snapshot = source.snapshot();

    let trip_idx = network.trip_idx("first").expect("trip exists");
    let pattern = network.pattern_of_trip(trip_idx);
    let date = |text: &str| NaiveDate::parse_from_str(text, "%Y-%m-%d").expect("valid date");

    assert!(snapshot.resolve(pattern, &date("2020-01-01")).is_none());
    assert!(snapshot.resolve(pattern, &date("2020-01-02")).is_some());
    assert!(snapshot.resolve(pattern, &date("2020-01-03")).is_some());
    Ok(())
}

/// With readiness blocking, the source only reports primed after the last
/// page of a full-dataset load.
#[test]
fn test_readiness_blocks_until_full_dataset() -> Result<(), Error> {
    init();
    let (network, _transfers) = two_departures_network();
    let mut config = UpdaterConfig::default();
    config.block_readiness_until_initialized = true;
    let mut source = SnapshotSource::new(config);
    assert!(!source.is_primed());

    // an incremental batch does not prime
    source.apply_updates(
        &network,
        "feed",
        false,
        false,
        &[delay_update("first", "2020-01-01", 60)],
        datetime("2020-01-01T07:00:00"),
    );
    assert!(!source.is_primed());

    // a full dataset with more pages to come does not prime either
    source.apply_updates(
        &network,
        "feed",
        true,
        true,
        &[delay_update("first", "2020-01-01", 60)],
        datetime("2020-01-01T07:00:10"),
    );
    assert!(!source.is_primed());

    // the last page does
    source.apply_updates(
        &network,
        "feed",
        true,
        false,
        &[delay_update("second", "2020-01-01", 60)],
        datetime("2020-01-01T07:00:20"),
    );
    assert!(source.is_primed());
    Ok(())
}
