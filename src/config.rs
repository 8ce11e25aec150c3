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

use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::time::PositiveDuration;

pub const DEFAULT_PERIOD: &str = "00:01:00";
pub const DEFAULT_MAX_SNAPSHOT_FREQUENCY: &str = "00:00:01";
pub const DEFAULT_LOG_FREQUENCY: u64 = 2000;

pub fn default_period() -> PositiveDuration {
    PositiveDuration::from_str(DEFAULT_PERIOD).unwrap()
}

pub fn default_max_snapshot_frequency() -> PositiveDuration {
    PositiveDuration::from_str(DEFAULT_MAX_SNAPSHOT_FREQUENCY).unwrap()
}

pub fn default_log_frequency() -> u64 {
    DEFAULT_LOG_FREQUENCY
}

fn default_true() -> bool {
    true
}

/// Parameters of one realtime updater, consumed by the snapshot source.
/// The polling itself happens outside this crate; only the cadences and
/// toggles matter here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdaterConfig {
    /// interval between two polls of the upstream feed
    #[serde(default = "default_period")]
    pub period: PositiveDuration,

    /// number of applied update records between two summary log lines
    #[serde(default = "default_log_frequency")]
    pub log_frequency: u64,

    /// minimum interval between two snapshot publications
    #[serde(default = "default_max_snapshot_frequency")]
    pub max_snapshot_frequency: PositiveDuration,

    /// drop staged data whose service day has fully elapsed
    #[serde(default = "default_true")]
    pub purge_expired_data: bool,

    /// attempt fuzzy matching of trip identifiers (the matching itself is
    /// performed by the feed parser, upstream of this crate)
    #[serde(default = "default_true")]
    pub fuzzy_trip_matching: bool,

    /// delay the readiness signal until a first full dataset was ingested
    #[serde(default)]
    pub block_readiness_until_initialized: bool,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            period: default_period(),
            log_frequency: default_log_frequency(),
            max_snapshot_frequency: default_max_snapshot_frequency(),
            purge_expired_data: true,
            fuzzy_trip_matching: true,
            block_readiness_until_initialized: false,
        }
    }
}

impl Display for UpdaterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "--period {} --log_frequency {} --max_snapshot_frequency {} \
             --purge_expired_data {} --fuzzy_trip_matching {} \
             --block_readiness_until_initialized {}",
            self.period,
            self.log_frequency,
            self.max_snapshot_frequency,
            self.purge_expired_data,
            self.fuzzy_trip_matching,
            self.block_readiness_until_initialized
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    GtfsRtHttp,
    SiriVmHttp,
}

impl FromStr for SourceType {
    type Err = SourceTypeConfigError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let source_type = match s {
            "gtfs_rt_http" => SourceType::GtfsRtHttp,
            "siri_vm_http" => SourceType::SiriVmHttp,
            _ => Err(SourceTypeConfigError {
                source_type_name: s.to_string(),
            })?,
        };
        Ok(source_type)
    }
}

impl Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceType::GtfsRtHttp => write!(f, "gtfs_rt_http"),
            SourceType::SiriVmHttp => write!(f, "siri_vm_http"),
        }
    }
}

#[derive(Debug)]
pub struct SourceTypeConfigError {
    pub source_type_name: String,
}

impl Display for SourceTypeConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Bad source type given : `{}`",
            self.source_type_name
        )
    }
}

impl std::error::Error for SourceTypeConfigError {}

/// Configuration of one feed. An invalid feed config is fatal for that
/// feed only; other feeds keep running.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    pub feed_id: String,
    pub source_type: SourceType,
    #[serde(default)]
    pub updater: UpdaterConfig,
}

impl FeedConfig {
    pub fn validate(&self) -> Result<(), FeedConfigError> {
        if self.feed_id.is_empty() {
            return Err(FeedConfigError::EmptyFeedId);
        }
        Ok(())
    }
}

#[derive(Debug)]
pub enum FeedConfigError {
    EmptyFeedId,
}

impl Display for FeedConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedConfigError::EmptyFeedId => write!(f, "A feed config must provide a feed_id."),
        }
    }
}

impl std::error::Error for FeedConfigError {}
