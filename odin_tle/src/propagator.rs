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

use chrono::{DateTime,Utc};
use serde::{Deserialize,Serialize};
use satkit::sgp4::{sgp4, SGP4Error};
use tracing::{info,warn};
use crate::{
    errors::{propagation_error, Result},
    geodetic::{teme_to_geodetic, EQUATORIAL_EARTH_RADIUS},
    sink::PersistenceSink,
    tle::{instant_from_datetime, OrbitalElements, SatelliteRecord},
};

/// snapshot entry for one propagated object. Altitude is in kilometers
#[derive(Serialize,Deserialize,Debug,Clone,PartialEq)]
pub struct GeoPosition {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

/// TEME position (meters) and velocity (meters/sec)
#[derive(Debug,Clone,Copy,PartialEq)]
pub struct StateVector {
    pub position: [f64;3],
    pub velocity: [f64;3],
}

impl StateVector {
    pub fn radius (&self)->f64 {
        let [x,y,z] = self.position;
        (x*x + y*y + z*z).sqrt()
    }

    /// a state is only usable if we have both a finite position above ground and a finite velocity
    pub fn is_valid (&self)->bool {
        self.position.iter().chain( self.velocity.iter()).all( |v| v.is_finite())
            && self.radius() > EQUATORIAL_EARTH_RADIUS
            && self.velocity.iter().any( |v| *v != 0.0)
    }
}

/// something that can compute the state of an object at a given time
pub trait Propagator {
    fn propagate (&self, elements: &OrbitalElements, t: DateTime<Utc>)->Result<StateVector>;
}

/// SGP4 propagation through satkit
#[derive(Debug,Clone,Copy,Default)]
pub struct Sgp4Propagator;

impl Propagator for Sgp4Propagator {
    fn propagate (&self, elements: &OrbitalElements, t: DateTime<Utc>)->Result<StateVector> {
        let mut tle = elements.to_tle()?;
        let tvec = vec![ instant_from_datetime(&t) ];

        let (pteme, vteme, errs) = sgp4( &mut tle, &tvec); // this mutates the TLE, which is why we use a fresh one
        if let Some(e) = errs.iter().find( |e| **e != SGP4Error::SGP4Success) {
            return Err( propagation_error!("SGP4 failed for {} at {t}: {e}", elements.sat_num))
        }

        let sv = StateVector {
            position: [ pteme[(0,0)], pteme[(1,0)], pteme[(2,0)] ],
            velocity: [ vteme[(0,0)], vteme[(1,0)], vteme[(2,0)] ],
        };

        if sv.is_valid() {
            Ok(sv)
        } else {
            Err( propagation_error!("no valid state for {} at {t} (decayed?)", elements.sat_num))
        }
    }
}

/// why an object did not make it into a snapshot
#[derive(Debug,Clone,PartialEq)]
pub struct PropagationDiagnostic {
    pub name: String,
    pub message: String,
}

/// the positions of all propagatable objects at a single time
#[derive(Debug,Clone,PartialEq)]
pub struct PropagationSnapshot {
    pub time: DateTime<Utc>,
    pub positions: Vec<GeoPosition>,
    pub skipped: Vec<PropagationDiagnostic>,
}

/// computes current geodetic positions for a batch of records. Objects that can't be propagated
/// are skipped with a diagnostic, they never fail the batch
pub struct BatchPropagator<P: Propagator = Sgp4Propagator> {
    propagator: P,
}

impl BatchPropagator<Sgp4Propagator> {
    pub fn sgp4 ()->Self {
        BatchPropagator { propagator: Sgp4Propagator }
    }
}

impl<P: Propagator> BatchPropagator<P> {
    pub fn new (propagator: P)->Self {
        BatchPropagator { propagator }
    }

    pub fn compute (&self, records: &[SatelliteRecord], t: DateTime<Utc>)->PropagationSnapshot {
        let mut positions: Vec<GeoPosition> = Vec::with_capacity( records.len());
        let mut skipped: Vec<PropagationDiagnostic> = Vec::new();

        for rec in records {
            match self.propagator.propagate( &rec.elements, t) {
                Ok(sv) => {
                    let g = teme_to_geodetic( &sv.position, &t);
                    positions.push( GeoPosition {
                        name: rec.name.clone(),
                        latitude: g.latitude_deg,
                        longitude: g.longitude_deg,
                        altitude: g.altitude_km,
                    });
                }
                Err(e) => {
                    warn!("propagation failed for satellite: {} ({e})", rec.name);
                    skipped.push( PropagationDiagnostic { name: rec.name.clone(), message: e.to_string() });
                }
            }
        }

        PropagationSnapshot { time: t, positions, skipped }
    }

    /// compute the snapshot and store it, replacing whatever snapshot the sink had before
    pub async fn compute_and_save (&self, records: &[SatelliteRecord], t: DateTime<Utc>, sink: &dyn PersistenceSink)->Result<PropagationSnapshot> {
        let snapshot = self.compute( records, t);
        sink.save_snapshot( &snapshot.positions).await?;

        info!("saved positions of {} objects at {t} ({} skipped)", snapshot.positions.len(), snapshot.skipped.len());
        Ok(snapshot)
    }
}
