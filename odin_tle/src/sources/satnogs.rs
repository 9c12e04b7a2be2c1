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

use std::time::Duration;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize,Serialize};
use crate::{
    adapter::TleSource,
    errors::Result,
    source::SourceId,
    tle::RawTle,
};
use super::{build_client, response_text};

pub const SATNOGS_URL: &str = "https://db.satnogs.org/api/tle/?format=json";

#[derive(Serialize,Deserialize,Debug,Clone)]
#[serde(default)]
pub struct SatNogsConfig {
    pub enabled: bool,
    pub url: String,
}

impl Default for SatNogsConfig {
    fn default()->Self {
        SatNogsConfig { enabled: true, url: SATNOGS_URL.to_string() }
    }
}

/// one element of the SatNOGS tle endpoint response. We only need the lines - everything else
/// in there is ignored. Lines are optional so that a single incomplete entry does not invalidate
/// the whole response
#[derive(Deserialize,Debug)]
struct SatNogsTle {
    tle0: Option<String>,
    tle1: Option<String>,
    tle2: Option<String>,
}

/// the SatNOGS DB, which returns a JSON array of `{tle0,tle1,tle2,..}` objects
pub struct SatNogsSource {
    config: SatNogsConfig,
    client: Client,
}

impl SatNogsSource {
    pub fn new (config: SatNogsConfig, timeout: Duration)->Result<Self> {
        let client = build_client( timeout)?;
        Ok( SatNogsSource { config, client } )
    }
}

#[async_trait]
impl TleSource for SatNogsSource {
    fn id (&self)->SourceId { SourceId::SatNogs }

    async fn fetch (&self)->Result<String> {
        let response = self.client.get( &self.config.url).send().await?;
        response_text( response, "db.satnogs.org").await
    }

    fn extract (&self, raw: &str)->Result<Vec<RawTle>> {
        parse_satnogs_response( raw)
    }
}

/// turn the JSON response into raw objects. A response that is not a JSON array fails the whole batch
pub fn parse_satnogs_response (json: &str)->Result<Vec<RawTle>> {
    let entries: Vec<SatNogsTle> = serde_json::from_str( json)?;

    Ok( entries.into_iter().enumerate().map( |(i,e)| {
        let ordinal = i+1;
        let name = e.tle0.as_deref()
            .and_then( satnogs_name)
            .unwrap_or_else( || SourceId::SatNogs.synthetic_name(ordinal));
        let line1 = e.tle1.as_deref().map( str::trim).unwrap_or_default();
        let line2 = e.tle2.as_deref().map( str::trim).unwrap_or_default();
        RawTle::new( ordinal, name, line1, line2)
    }).collect() )
}

/// SatNOGS name lines follow the 3LE convention of a leading "0 " marker
fn satnogs_name (tle0: &str)->Option<String> {
    let s = tle0.trim();
    let s = s.strip_prefix("0 ").unwrap_or(s).trim();
    if s.is_empty() { None } else { Some(s.to_string()) }
}
