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
#![allow(unused)]

use std::{collections::HashMap, sync::{Arc,Mutex,atomic::{AtomicUsize,Ordering}}, time::Duration};
use async_trait::async_trait;
use odin_tle::{
    adapter::TleSource,
    errors::{OdinTleError, Result},
    propagator::GeoPosition,
    sink::{ErrorLogEntry, PersistenceSink},
    sources::{celestrak::split_three_line, satnogs::parse_satnogs_response, spacetrack::split_two_line},
    tle::{RawTle, SatelliteRecord},
    SourceId,
};

/* #region test-data *************************************************************/

pub const ISS_L1: &str = "1 25544U 98067A   08264.51782528 -.00002182  00000-0 -11606-4 0  2927";
pub const ISS_L2: &str = "2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537";

pub const NOAA21_L1: &str = "1 54234U 22150A   25076.92835707  .00000366  00000-0  19403-3 0  9994";
pub const NOAA21_L2: &str = "2 54234  98.7204  17.0432 0002710  72.7407 287.4066 14.19556514121811";

pub const NOAA20_L1: &str = "1 43013U 17073A   25076.50000000  .00000050  00000-0  45000-4 0  9992";
pub const NOAA20_L2: &str = "2 43013  98.7300  20.1000 0001500  90.0000 270.1000 14.19550000380004";

/// low orbit (~190km) with high drag that decays within days
pub const DECAYING_L1: &str = "1 99999U 25001A   25077.00000000  .01000000  00000-0  50000-2 0  9992";
pub const DECAYING_L2: &str = "2 99999  51.6416 247.4627 0006703 130.5360 325.0288 16.30000000000105";

/// 3-line celestrak style response with two objects
pub fn celestrak_text ()->String {
    format!("ISS (ZARYA)\r\n{ISS_L1}\r\n{ISS_L2}\r\nNOAA 21\r\n{NOAA21_L1}\r\n{NOAA21_L2}\r\n")
}

/// 2-line space-track style response with three objects
pub fn spacetrack_text ()->String {
    format!("{ISS_L1}\n{ISS_L2}\n{NOAA21_L1}\n{NOAA21_L2}\n{NOAA20_L1}\n{NOAA20_L2}\n")
}

/// line with a wrong checksum digit
pub fn corrupt (line: &str)->String {
    let (head, last) = line.split_at( line.len()-1);
    let d: u32 = last.parse().unwrap();
    format!("{head}{}", (d + 1) % 10)
}

/* #endregion test-data */

/* #region memory sink ***********************************************************/

#[derive(Default)]
pub struct MemorySink {
    pub raw: Mutex<HashMap<SourceId,Vec<u8>>>,
    pub parsed: Mutex<HashMap<SourceId,Vec<SatelliteRecord>>>,
    pub errors: Mutex<Vec<ErrorLogEntry>>,
    pub snapshot: Mutex<Option<Vec<GeoPosition>>>,
}

impl MemorySink {
    pub fn new ()->Arc<Self> { Arc::new( MemorySink::default()) }

    pub fn n_parsed (&self, source: SourceId)->usize {
        self.parsed.lock().unwrap().get(&source).map( |v| v.len()).unwrap_or(0)
    }

    pub fn has_raw (&self, source: SourceId)->bool {
        self.raw.lock().unwrap().contains_key(&source)
    }

    pub fn errors (&self)->Vec<ErrorLogEntry> {
        self.errors.lock().unwrap().clone()
    }
}

#[async_trait]
impl PersistenceSink for MemorySink {
    async fn save_raw (&self, source: SourceId, raw: &[u8]) -> Result<()> {
        self.raw.lock().unwrap().insert( source, raw.to_vec());
        Ok(())
    }

    async fn save_parsed (&self, source: SourceId, records: &[SatelliteRecord]) -> Result<()> {
        self.parsed.lock().unwrap().insert( source, records.to_vec());
        Ok(())
    }

    async fn append_error (&self, entry: &ErrorLogEntry) -> Result<()> {
        self.errors.lock().unwrap().push( entry.clone());
        Ok(())
    }

    async fn save_snapshot (&self, positions: &[GeoPosition]) -> Result<()> {
        *self.snapshot.lock().unwrap() = Some( positions.to_vec());
        Ok(())
    }
}

/* #endregion memory sink */

/* #region scripted source *******************************************************/

/// a TleSource with a canned response that counts how often it was fetched
pub struct ScriptedSource {
    id: SourceId,
    response: std::result::Result<String,String>,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedSource {
    pub fn ok (id: SourceId, text: impl ToString)->Self {
        ScriptedSource { id, response: Ok(text.to_string()), delay: None, calls: Arc::new( AtomicUsize::new(0)) }
    }

    pub fn failing (id: SourceId, msg: impl ToString)->Self {
        ScriptedSource { id, response: Err(msg.to_string()), delay: None, calls: Arc::new( AtomicUsize::new(0)) }
    }

    pub fn with_delay (mut self, delay: Duration)->Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls (&self)->Arc<AtomicUsize> {
        self.calls.clone()
    }
}

#[async_trait]
impl TleSource for ScriptedSource {
    fn id (&self)->SourceId { self.id }

    async fn fetch (&self)->Result<String> {
        self.calls.fetch_add( 1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep( delay).await;
        }
        self.response.clone().map_err( |msg| OdinTleError::TransportError(msg))
    }

    fn extract (&self, raw: &str)->Result<Vec<RawTle>> {
        match self.id {
            SourceId::SpaceTrack => split_two_line( raw),
            SourceId::SatNogs => parse_satnogs_response( raw),
            SourceId::CelesTrak => Ok( split_three_line( raw))
        }
    }
}

pub fn n_calls (calls: &Arc<AtomicUsize>)->usize {
    calls.load( Ordering::SeqCst)
}

/* #endregion scripted source */

/// SatNOGS style JSON response with one object
pub fn satnogs_json ()->String {
    format!(r#"[{{"tle0": "0 NOAA 20", "tle1": "{NOAA20_L1}", "tle2": "{NOAA20_L2}", "norad_cat_id": 43013}}]"#)
}
