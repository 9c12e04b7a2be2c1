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

pub const CELESTRAK_URL: &str = "https://celestrak.org/NORAD/elements/gp.php?GROUP=active&FORMAT=tle";

#[derive(Serialize,Deserialize,Debug,Clone)]
#[serde(default)]
pub struct CelesTrakConfig {
    pub enabled: bool,
    pub url: String,
}

impl Default for CelesTrakConfig {
    fn default()->Self {
        CelesTrakConfig { enabled: true, url: CELESTRAK_URL.to_string() }
    }
}

/// celestrak.org GP data in plain TLE format (name line followed by the two element lines)
pub struct CelesTrakSource {
    config: CelesTrakConfig,
    client: Client,
}

impl CelesTrakSource {
    pub fn new (config: CelesTrakConfig, timeout: Duration)->Result<Self> {
        let client = build_client( timeout)?;
        Ok( CelesTrakSource { config, client } )
    }
}

#[async_trait]
impl TleSource for CelesTrakSource {
    fn id (&self)->SourceId { SourceId::CelesTrak }

    async fn fetch (&self)->Result<String> {
        let response = self.client.get( &self.config.url).send().await?;
        response_text( response, "celestrak.org").await
    }

    fn extract (&self, raw: &str)->Result<Vec<RawTle>> {
        Ok( split_three_line( raw) )
    }
}

/// split 3-line (name, line 1, line 2) blocks. Blank lines are ignored and name lines are trimmed.
/// An incomplete trailing block is still returned so that it shows up as a parse error of that object
pub fn split_three_line (text: &str)->Vec<RawTle> {
    let lines: Vec<&str> = text.lines().map( |l| l.trim()).filter( |l| !l.is_empty()).collect();

    lines.chunks(3).enumerate().map( |(i,block)| {
        let ordinal = i+1;
        let line1 = block.get(1).copied().unwrap_or_default();
        let line2 = block.get(2).copied().unwrap_or_default();
        RawTle::new( ordinal, block[0], line1, line2)
    }).collect()
}
