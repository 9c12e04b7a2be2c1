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

//! the concrete upstream TLE providers

use std::time::Duration;
use reqwest::{Client,Response};
use crate::{
    adapter::TleSource,
    config::TleIngestConfig,
    errors::{OdinTleError, Result},
};

pub mod celestrak;
pub mod satnogs;
pub mod spacetrack;

use celestrak::CelesTrakSource;
use satnogs::SatNogsSource;
use spacetrack::{SpaceTrackCredentials, SpaceTrackSource};

/// all requests of a source go through a client with a bounded timeout so that a hanging
/// server eventually turns into a logged transport error
pub fn build_client (timeout: Duration)->Result<Client> {
    Ok( Client::builder().timeout( timeout).build()? )
}

/// get the response body or turn non-2xx responses into transport errors
pub(crate) async fn response_text (response: Response, what: &str)->Result<String> {
    let status = response.status();
    if status.is_success() {
        Ok( response.text().await? )
    } else {
        Err( OdinTleError::TransportError( format!("{what} request failed with HTTP {status}")))
    }
}

/// create the enabled sources of the config. Credentials are only used by space-track.org
pub fn create_sources (config: &TleIngestConfig, credentials: Option<SpaceTrackCredentials>)->Result<Vec<Box<dyn TleSource>>> {
    let mut sources: Vec<Box<dyn TleSource>> = Vec::with_capacity(3);

    if config.spacetrack.enabled {
        sources.push( Box::new( SpaceTrackSource::new( config.spacetrack.clone(), credentials, config.request_timeout)?));
    }
    if config.celestrak.enabled {
        sources.push( Box::new( CelesTrakSource::new( config.celestrak.clone(), config.request_timeout)?));
    }
    if config.satnogs.enabled {
        sources.push( Box::new( SatNogsSource::new( config.satnogs.clone(), config.request_timeout)?));
    }

    Ok(sources)
}
