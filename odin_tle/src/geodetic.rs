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

//! TEME to geodetic conversion for propagated positions

use chrono::{DateTime,Utc};
use satkit::{consts::WGS84_A, frametransform::qteme2itrf, itrfcoord::ITRFCoord, mathtypes::Vector3};
use crate::tle::instant_from_datetime;

pub const EQUATORIAL_EARTH_RADIUS: f64 = WGS84_A; // meters

/// WGS-84 geodetic coordinates
#[derive(Debug,Clone,Copy,PartialEq)]
pub struct Geodetic {
    pub latitude_deg: f64,
    pub longitude_deg: f64, // [-180,180]
    pub altitude_km: f64,
}

impl From<&ITRFCoord> for Geodetic {
    fn from (c: &ITRFCoord)->Self {
        let (lat, lon, hae) = c.to_geodetic_rad();
        Geodetic { latitude_deg: lat.to_degrees(), longitude_deg: lon.to_degrees(), altitude_km: hae / 1000.0 }
    }
}

/// convert a TEME position (meters) at time t into geodetic coordinates
pub fn teme_to_geodetic (p: &[f64;3], t: &DateTime<Utc>)->Geodetic {
    let pteme = Vector3::new( p[0], p[1], p[2]);
    let itrf = qteme2itrf( &instant_from_datetime(t)).to_rotation_matrix() * pteme;
    Geodetic::from( &ITRFCoord::from_vector( &itrf))
}

/// ITRF (meters) to WGS-84 geodetic conversion
pub fn ecef_to_geodetic (x: f64, y: f64, z: f64)->Geodetic {
    Geodetic::from( &ITRFCoord::from_vector( &Vector3::new( x, y, z)))
}
