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

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, info, warn};

use crate::config::UpdaterConfig;
use crate::model::{PatternIdx, TransitNetwork};
use crate::realtime::snapshot::RealtimeSnapshot;
use crate::realtime::{TripUpdate, UpdateError};
use crate::timetables::Timetable;

/// Shared read handle onto the published snapshot. Cheap to clone; each
/// search grabs the latest snapshot once and then never touches the lock
/// again.
#[derive(Clone)]
pub struct SnapshotReader {
    published: Arc<RwLock<Arc<RealtimeSnapshot>>>,
}

impl SnapshotReader {
    pub fn latest(&self) -> Arc<RealtimeSnapshot> {
        // a poisoned lock only means another thread panicked while holding
        // it; the snapshot behind it is immutable and safe to read
        let guard = self
            .published
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.clone()
    }
}

/// Owner of the mutable working view of realtime timetables.
///
/// Exactly one logical writer drives this struct (it takes `&mut self`
/// everywhere); readers go through `SnapshotReader` and never block on a
/// merge. The working buffer is built aside and made visible in a single
/// reference swap, so readers observe either the previous snapshot or the
/// next one, never a mix.
pub struct SnapshotSource {
    config: UpdaterConfig,

    /// working copies, keyed by (pattern, service date)
    buffer: HashMap<(PatternIdx, NaiveDate), Timetable>,
    /// which buffer entries each feed contributed, for full-dataset resets
    feed_entries: HashMap<String, HashSet<(PatternIdx, NaiveDate)>>,

    published: Arc<RwLock<Arc<RealtimeSnapshot>>>,
    next_version: u64,
    dirty: bool,
    last_publish: Option<NaiveDateTime>,

    nb_of_applied: u64,
    nb_of_dropped: u64,
    nb_applied_since_log: u64,

    primed: bool,
}

impl SnapshotSource {
    pub fn new(config: UpdaterConfig) -> Self {
        Self {
            config,
            buffer: HashMap::new(),
            feed_entries: HashMap::new(),
            published: Arc::new(RwLock::new(Arc::new(RealtimeSnapshot::empty()))),
            next_version: 1,
            dirty: false,
            last_publish: None,
            nb_of_applied: 0,
            nb_of_dropped: 0,
            nb_applied_since_log: 0,
            primed: false,
        }
    }

    pub fn reader(&self) -> SnapshotReader {
        SnapshotReader {
            published: self.published.clone(),
        }
    }

    pub fn snapshot(&self) -> Arc<RealtimeSnapshot> {
        self.reader().latest()
    }

    /// Whether this source has seen enough data to serve requests. When
    /// `block_readiness_until_initialized` is configured, this only turns
    /// true after the last page of a full-dataset load.
    pub fn is_primed(&self) -> bool {
        self.primed
    }

    pub fn nb_of_applied_updates(&self) -> u64 {
        self.nb_of_applied
    }

    pub fn nb_of_dropped_updates(&self) -> u64 {
        self.nb_of_dropped
    }

    /// The timetable readers should use for `(pattern, date)` : the
    /// realtime overlay of the currently published snapshot when one
    /// exists, else the scheduled baseline. Searches that need a stable
    /// view across many calls should instead pin a snapshot once and
    /// resolve against it.
    pub fn timetable_for_pattern_and_day(
        &self,
        network: &TransitNetwork,
        pattern: PatternIdx,
        date: &NaiveDate,
    ) -> Arc<Timetable> {
        let snapshot = self.snapshot();
        match snapshot.resolve(pattern, date) {
            Some(timetable) => timetable.clone(),
            None => network.scheduled_timetable_arc(pattern),
        }
    }

    /// Merges a batch of updates into the working buffer, then publishes a
    /// new snapshot unless one was published too recently.
    ///
    /// A full-dataset batch first drops every entry previously contributed
    /// by `feed_id`, so that only re-asserted data survives. A record that
    /// cannot be resolved is dropped, counted and logged; the batch goes on.
    pub fn apply_updates(
        &mut self,
        network: &TransitNetwork,
        feed_id: &str,
        is_full_dataset: bool,
        more_data: bool,
        updates: &[TripUpdate],
        now: NaiveDateTime,
    ) {
        if is_full_dataset {
            if let Some(entries) = self.feed_entries.remove(feed_id) {
                for key in &entries {
                    self.buffer.remove(key);
                }
                debug!(
                    "full dataset for feed `{}` : dropped {} previously staged timetables",
                    feed_id,
                    entries.len()
                );
                self.dirty = true;
            }
        }

        let mut applied_in_batch = 0u64;
        for update in updates {
            match self.stage_update(network, feed_id, update) {
                Ok(()) => {
                    applied_in_batch += 1;
                }
                Err(error) => {
                    self.nb_of_dropped += 1;
                    warn!("dropping update from feed `{}` : {}", feed_id, error);
                }
            }
        }
        if applied_in_batch > 0 {
            self.dirty = true;
        }
        self.nb_of_applied += applied_in_batch;
        self.nb_applied_since_log += applied_in_batch;

        if self.config.log_frequency > 0 && self.nb_applied_since_log >= self.config.log_frequency
        {
            info!(
                "realtime updates : {} applied, {} dropped, {} timetables staged",
                self.nb_of_applied,
                self.nb_of_dropped,
                self.buffer.len()
            );
            self.nb_applied_since_log = 0;
        }

        if is_full_dataset && !more_data {
            // the initial full load is complete, the source may serve
            self.primed = true;
        } else if !self.config.block_readiness_until_initialized {
            self.primed = true;
        }

        self.maybe_publish(now);
    }

    fn stage_update(
        &mut self,
        network: &TransitNetwork,
        feed_id: &str,
        update: &TripUpdate,
    ) -> Result<(), UpdateError> {
        let trip_idx = network
            .trip_idx(&update.trip_id)
            .ok_or_else(|| UpdateError::UnknownTrip(update.trip_id.clone()))?;
        if !network.calendar().contains_date(&update.date) {
            return Err(UpdateError::DateOutOfCalendar(
                update.trip_id.clone(),
                update.date,
            ));
        }
        let pattern = network.pattern_of_trip(trip_idx);

        let working = self
            .buffer
            .entry((pattern, update.date))
            .or_insert_with(|| network.scheduled_timetable(pattern).clone());

        let base_row = working.trip_row(trip_idx).ok_or_else(|| {
            UpdateError::MissingScheduledRow(update.trip_id.clone(), update.date)
        })?;
        let new_row = base_row
            .apply_update(update)
            .map_err(|error| UpdateError::Times(update.trip_id.clone(), error))?;
        working.set_trip_times(new_row);

        self.feed_entries
            .entry(feed_id.to_string())
            .or_default()
            .insert((pattern, update.date));
        Ok(())
    }

    /// Publishes the working buffer as a new immutable snapshot, unless the
    /// previous publication is more recent than the configured minimum
    /// interval. Returns whether a publication happened.
    pub fn maybe_publish(&mut self, now: NaiveDateTime) -> bool {
        if !self.dirty {
            return false;
        }
        if let Some(last) = self.last_publish {
            let min_interval =
                chrono::Duration::seconds(self.config.max_snapshot_frequency.total_seconds() as i64);
            if now.signed_duration_since(last) < min_interval {
                return false;
            }
        }
        self.publish(now);
        true
    }

    /// Unconditional publication, bypassing the throttle. Used on shutdown
    /// flushes and by operators forcing a refresh.
    pub fn publish(&mut self, now: NaiveDateTime) {
        if self.config.purge_expired_data {
            self.purge_expired(&now.date());
        }

        let timetables = self
            .buffer
            .iter()
            .map(|(key, timetable)| (*key, Arc::new(timetable.clone())))
            .collect();
        let snapshot = Arc::new(RealtimeSnapshot::new(self.next_version, timetables));
        self.next_version += 1;

        {
            let mut guard = self
                .published
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            *guard = snapshot;
        }

        self.dirty = false;
        self.last_publish = Some(now);
        info!(
            "published realtime snapshot version {} with {} timetables",
            self.next_version - 1,
            self.buffer.len()
        );
    }

    /// Drops staged entries whose service day has fully elapsed. Yesterday
    /// is kept : its overnight trips may still be running.
    fn purge_expired(&mut self, today: &NaiveDate) {
        let yesterday = match today.pred_opt() {
            Some(date) => date,
            None => return,
        };
        let before = self.buffer.len();
        self.buffer.retain(|(_, date), _| *date >= yesterday);
        for entries in self.feed_entries.values_mut() {
            entries.retain(|(_, date)| *date >= yesterday);
        }
        let purged = before - self.buffer.len();
        if purged > 0 {
            info!("purged {} expired realtime timetables", purged);
        }
    }
}
