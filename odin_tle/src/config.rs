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

use std::{fs, path::{Path,PathBuf}, time::Duration};
use serde::{Deserialize,Serialize};
use crate::{
    errors::{config_error, Result},
    sources::{celestrak::CelesTrakConfig, satnogs::SatNogsConfig, spacetrack::SpaceTrackConfig},
};

pub const DEFAULT_CYCLE_INTERVAL: Duration = Duration::from_secs( 3600);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs( 45);

/// minimum time between successful refreshes of each source
#[derive(Serialize,Deserialize,Debug,Clone,PartialEq)]
#[serde(default)]
pub struct CadenceConfig {
    pub spacetrack: Duration,
    pub celestrak: Duration,
    pub satnogs: Duration,
}

impl Default for CadenceConfig {
    fn default()->Self {
        CadenceConfig {
            spacetrack: Duration::from_secs( 24 * 3600),
            celestrak: Duration::from_secs( 3600),
            satnogs: Duration::from_secs( 3600),
        }
    }
}

/// top level configuration of the TLE ingester, normally read from a RON file such as
/// ```ron
/// TleIngestConfig(
///     data_dir: "data/tle",
///     cycle_interval: (secs: 3600, nanos: 0),
///     spacetrack: ( enabled: false ),
/// )
/// ```
/// All fields are optional. Credentials are never part of this file, they are read from the environment
#[derive(Serialize,Deserialize,Debug,Clone)]
#[serde(default)]
pub struct TleIngestConfig {
    pub data_dir: PathBuf,
    pub cycle_interval: Duration, // how long to sleep between cycles
    pub request_timeout: Duration,
    pub cadence: CadenceConfig,

    pub celestrak: CelesTrakConfig,
    pub satnogs: SatNogsConfig,
    pub spacetrack: SpaceTrackConfig,
}

impl Default for TleIngestConfig {
    fn default()->Self {
        TleIngestConfig {
            data_dir: PathBuf::from("data/tle"),
            cycle_interval: DEFAULT_CYCLE_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            cadence: CadenceConfig::default(),
            celestrak: CelesTrakConfig::default(),
            satnogs: SatNogsConfig::default(),
            spacetrack: SpaceTrackConfig::default(),
        }
    }
}

impl TleIngestConfig {
    pub fn from_ron_str (s: &str)->Result<Self> {
        let config: TleIngestConfig = ron::de::from_str( s)?;
        config.check()?;
        Ok(config)
    }

    pub fn check (&self)->Result<()> {
        if self.cycle_interval.is_zero() {
            return Err( config_error!("cycle_interval has to be positive"))
        }
        if self.request_timeout.is_zero() {
            return Err( config_error!("request_timeout has to be positive"))
        }
        Ok(())
    }
}

/// load a RON config from the given path
pub fn load_config_path (path: impl AsRef<Path>)->Result<TleIngestConfig> {
    let path = path.as_ref();
    let text = fs::read_to_string( path).map_err(|e| config_error!("cannot read config {path:?}: {e}"))?;
    TleIngestConfig::from_ron_str( &text)
}
