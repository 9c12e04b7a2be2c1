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

//! glue between raw TLE text and the satkit element loader

use chrono::{DateTime,Utc};
use serde::{Deserialize,Serialize};
use satkit::{Instant,TLE};
use crate::errors::{tle_error, Result};

/// fixed column width of TLE element lines (incl. checksum)
pub const TLE_LINE_LEN: usize = 69;

/// one object as it was cut out of a source response. `name` is either the name line of the source
/// or a synthesized one - the adapter decides which before we get here
#[derive(Debug,Clone,PartialEq,Eq)]
pub struct RawTle {
    pub ordinal: usize, // 1-based position within the source batch
    pub name: String,
    pub line1: String,
    pub line2: String,
}

impl RawTle {
    pub fn new (ordinal: usize, name: impl ToString, line1: impl ToString, line2: impl ToString)->Self {
        RawTle { ordinal, name: name.to_string(), line1: line1.to_string(), line2: line2.to_string() }
    }

    /// identifier used in error log entries
    pub fn identifier (&self)->String {
        format!("#{} {}", self.ordinal, self.name)
    }
}

/// the mean orbital elements we extract from a validated line pair. We keep the lines so that
/// records can be turned back into propagatable satkit TLEs
#[derive(Serialize,Deserialize,Debug,Clone,PartialEq)]
pub struct OrbitalElements {
    pub sat_num: u32,
    pub epoch: DateTime<Utc>,
    pub inclination: f64,     // degrees
    pub raan: f64,            // degrees
    pub eccentricity: f64,
    pub arg_of_perigee: f64,  // degrees
    pub mean_anomaly: f64,    // degrees
    pub mean_motion: f64,     // revs per day
    pub bstar: f64,
    pub line1: String,
    pub line2: String,
}

impl OrbitalElements {
    /// get a fresh satkit TLE for propagation (sgp4 mutates its TLE argument)
    pub fn to_tle (&self)->Result<TLE> {
        TLE::load_2line( &self.line1, &self.line2).map_err(|e| tle_error!("2 line Satkit TLE import failed {:?}", e))
    }

    /// orbit period in minutes
    pub fn period_minutes (&self)->f64 {
        (24.0 * 60.0) / self.mean_motion
    }
}

/// a successfully parsed object. These are never constructed from partial data
#[derive(Serialize,Deserialize,Debug,Clone,PartialEq)]
pub struct SatelliteRecord {
    pub name: String,

    #[serde(flatten)]
    pub elements: OrbitalElements,
}

impl SatelliteRecord {
    pub fn new (name: impl ToString, elements: OrbitalElements)->Self {
        SatelliteRecord { name: name.to_string(), elements }
    }
}

/// parse a raw object into a record, keeping the name the adapter assigned
pub fn parse_raw_tle (raw: &RawTle)->Result<SatelliteRecord> {
    parse_tle( &raw.line1, &raw.line2).map( |elements| SatelliteRecord::new( &raw.name, elements))
}

/// syntactically validate a TLE line pair and load it through satkit
pub fn parse_tle (line1: &str, line2: &str)->Result<OrbitalElements> {
    let line1 = line1.trim_end();
    let line2 = line2.trim_end();

    let n1 = check_line( line1, '1')?;
    let n2 = check_line( line2, '2')?;
    if n1 != n2 {
        return Err( tle_error!("catalog number mismatch between lines: {n1} != {n2}"))
    }

    let tle = TLE::load_2line( line1, line2).map_err(|e| tle_error!("2 line Satkit TLE import failed {:?}", e))?;
    let epoch = datetime_from_instant( &tle.epoch).ok_or( tle_error!("TLE epoch out of range for {n1}"))?;

    Ok( OrbitalElements {
        sat_num: n1,
        epoch,
        inclination: tle.inclination,
        raan: tle.raan,
        eccentricity: tle.eccen,
        arg_of_perigee: tle.arg_of_perigee,
        mean_anomaly: tle.mean_anomaly,
        mean_motion: tle.mean_motion,
        bstar: tle.bstar,
        line1: line1.to_string(),
        line2: line2.to_string(),
    })
}

/// TLE modulo-10 checksum over the first 68 columns: digits count their value, '-' counts 1
pub fn tle_checksum (line: &str)->u32 {
    line.chars().take( TLE_LINE_LEN-1).fold( 0, |acc,c| {
        match c {
            '0'..='9' => acc + c.to_digit(10).unwrap_or(0),
            '-' => acc + 1,
            _ => acc
        }
    }) % 10
}

/// check line marker, width and checksum. Returns the catalog number of the line
fn check_line (line: &str, marker: char)->Result<u32> {
    if !line.is_ascii() {
        return Err( tle_error!("non-ASCII TLE line {marker}"))
    }
    if line.len() != TLE_LINE_LEN {
        return Err( tle_error!("invalid length of TLE line {marker}: {}", line.len()))
    }

    let mut chars = line.chars();
    if chars.next() != Some(marker) || chars.next() != Some(' ') {
        return Err( tle_error!("not a TLE line {marker}: '{line}'"))
    }

    let expected = line[TLE_LINE_LEN-1..].parse::<u32>().map_err(|_| tle_error!("no checksum in TLE line {marker}"))?;
    let actual = tle_checksum(line);
    if expected != actual {
        return Err( tle_error!("checksum mismatch in TLE line {marker}: expected {expected}, computed {actual}"))
    }

    line[2..7].trim().parse::<u32>().map_err(|_| tle_error!("invalid catalog number in TLE line {marker}: '{}'", &line[2..7]))
}

//--- satkit time conversion

pub fn instant_from_datetime (dt: &DateTime<Utc>)->Instant {
    Instant::from_unixtime( dt.timestamp_millis() as f64 / 1000.0)
}

pub fn datetime_from_instant (t: &Instant)->Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis( (t.as_unixtime() * 1000.0).round() as i64)
}
