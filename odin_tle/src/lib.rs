/*
 * Copyright © 2025, United States Government, as represented by the Administrator of
 * the National Aeronautics and Space Administration. All rights reserved.
 *
 * The “ODIN” software is licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License. You may obtain a copy
 * of the License at http://www.apache.org/licenses/LICENSE-2.0.
 *
 * Unless required by applicable law or agreed to in writing, software distributed under
 * the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND,
 * either express or implied. See the License for the specific language governing permissions
 * and limitations under the License.
 */

//! periodic retrieval of TLE element sets from space-track.org, celestrak.org and the SatNOGS DB.
//!
//! The [`scheduler::RefreshScheduler`] polls each [`adapter::TleSource`] according to its cadence,
//! parses the responses into [`tle::SatelliteRecord`]s and hands raw responses, parsed records and
//! error log entries to a [`sink::PersistenceSink`]. The [`propagator::BatchPropagator`] is an
//! independent on-demand step that turns parsed records into a snapshot of current positions

pub mod errors;
pub use errors::{OdinTleError,Result};

pub mod source;
pub use source::SourceId;

pub mod tle;
pub mod config;
pub mod sink;
pub mod adapter;
pub mod sources;
pub mod scheduler;
pub mod geodetic;
pub mod propagator;

use std::path::Path;
use tracing_subscriber::EnvFilter;
use crate::{sources::celestrak::split_three_line, tle::SatelliteRecord};

/// install a fmt tracing subscriber that uses RUST_LOG to set the max level, defaulting to `info`.
/// This only succeeds if there is no global subscriber set yet
pub fn init_tracing () {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else( |_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter( filter).try_init();
}

/// read records to propagate from either a JSON file with parsed records (as written by the
/// ingester) or a text file with 3-line TLEs. Unparsable TLEs are skipped with a warning
pub fn read_satellite_records (path: impl AsRef<Path>)->Result<Vec<SatelliteRecord>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string( path)?;

    if path.extension().is_some_and( |ext| ext.eq_ignore_ascii_case("json")) {
        Ok( serde_json::from_str( &text)? )
    } else {
        let mut records: Vec<SatelliteRecord> = Vec::new();
        for raw in split_three_line( &text) {
            match tle::parse_raw_tle( &raw) {
                Ok(rec) => records.push(rec),
                Err(e) => tracing::warn!("skipping TLE {}: {e}", raw.identifier())
            }
        }
        Ok(records)
    }
}
