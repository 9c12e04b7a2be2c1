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

use std::{fmt, str::FromStr};
use serde::{Deserialize,Serialize};
use crate::errors::{config_error, OdinTleError};

/// the upstream TLE providers we know how to poll.
/// Declaration order is the tie breaker for sources with the same cadence
#[derive(Debug,Clone,Copy,PartialEq,Eq,Hash,PartialOrd,Ord,Serialize,Deserialize)]
#[serde(rename_all="lowercase")]
pub enum SourceId {
    SpaceTrack,
    CelesTrak,
    SatNogs,
}

impl SourceId {
    pub const ALL: [SourceId;3] = [SourceId::SpaceTrack, SourceId::CelesTrak, SourceId::SatNogs];

    /// lower case name used for artifact filenames and logs
    pub fn name (&self)->&'static str {
        match self {
            SourceId::SpaceTrack => "spacetrack",
            SourceId::CelesTrak => "celestrak",
            SourceId::SatNogs => "satnogs",
        }
    }

    /// prefix of synthesized satellite names (`<PREFIX>_SAT_<ordinal>`) for sources without name lines
    pub fn name_prefix (&self)->&'static str {
        match self {
            SourceId::SpaceTrack => "SPACETRACK",
            SourceId::CelesTrak => "CELESTRAK",
            SourceId::SatNogs => "SATNOGS",
        }
    }

    pub fn synthetic_name (&self, ordinal: usize)->String {
        format!("{}_SAT_{}", self.name_prefix(), ordinal)
    }
}

impl fmt::Display for SourceId {
    fn fmt (&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for SourceId {
    type Err = OdinTleError;

    fn from_str (s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "spacetrack" | "space-track" => Ok(SourceId::SpaceTrack),
            "celestrak" => Ok(SourceId::CelesTrak),
            "satnogs" => Ok(SourceId::SatNogs),
            _ => Err( config_error!("unknown TLE source {s}"))
        }
    }
}
