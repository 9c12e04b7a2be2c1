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

use std::{fmt, sync::LazyLock, time::Duration};
use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, header::{HeaderMap, COOKIE, SET_COOKIE}};
use serde::{Deserialize,Serialize};
use tracing::debug;
use crate::{
    adapter::TleSource,
    errors::{auth_error, config_error, tle_error, Result},
    source::SourceId,
    tle::RawTle,
};
use super::{build_client, response_text};

pub const SPACETRACK_LOGIN_URL: &str = "https://www.space-track.org/ajaxauth/login";
pub const SPACETRACK_QUERY_URL: &str = "https://www.space-track.org/basicspacedata/query/class/tle_latest/ORDINAL/1/NORAD_CAT_ID/>0/format/tle";

pub const USERNAME_ENV: &str = "SPACETRACK_USERNAME";
pub const PASSWORD_ENV: &str = "SPACETRACK_PASSWORD";

/// space-track.org pads some element lines with two blanks in front of letters (e.g. the
/// classification). We only strip those in lines coming from space-track
static PADDING_ARTIFACT_RE: LazyLock<Regex> = LazyLock::new(||
    Regex::new( r" {2}([A-Z])").unwrap()
);

/// login form fields as expected by space-track.org
#[derive(Serialize,Deserialize,Clone)]
pub struct SpaceTrackCredentials {
    identity: String,
    password: String
}

impl SpaceTrackCredentials {
    pub fn new (identity: impl ToString, password: impl ToString)->Self {
        SpaceTrackCredentials { identity: identity.to_string(), password: password.to_string() }
    }

    /// get credentials from the process environment
    pub fn from_env ()->Result<Self> {
        Self::from_lookup( |key| std::env::var(key).ok())
    }

    /// get credentials through the provided key lookup. Missing or blank values are config errors
    pub fn from_lookup<F> (lookup: F)->Result<Self> where F: Fn(&str)->Option<String> {
        let identity = lookup(USERNAME_ENV).filter( |s| !s.trim().is_empty());
        let password = lookup(PASSWORD_ENV).filter( |s| !s.trim().is_empty());

        match (identity, password) {
            (Some(identity), Some(password)) => Ok( SpaceTrackCredentials { identity, password } ),
            (None, _) => Err( config_error!("missing space-track.org credentials: {USERNAME_ENV} not set")),
            (_, None) => Err( config_error!("missing space-track.org credentials: {PASSWORD_ENV} not set")),
        }
    }

    pub fn is_complete (&self)->bool {
        !self.identity.trim().is_empty() && !self.password.trim().is_empty()
    }
}

impl fmt::Debug for SpaceTrackCredentials {
    fn fmt (&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SpaceTrackCredentials {{ identity: {:?}, password: \"***\" }}", self.identity)
    }
}

/// endpoints for space-track.org TLE retrieval. Credentials are not part of this
#[derive(Serialize,Deserialize,Debug,Clone)]
#[serde(default)]
pub struct SpaceTrackConfig {
    pub enabled: bool,
    pub login_url: String,
    pub query_url: String,
}

impl Default for SpaceTrackConfig {
    fn default()->Self {
        SpaceTrackConfig {
            enabled: true,
            login_url: SPACETRACK_LOGIN_URL.to_string(),
            query_url: SPACETRACK_QUERY_URL.to_string()
        }
    }
}

/// latest TLEs of all catalog objects from space-track.org. This is the only source that needs
/// to log in - the login response provides a session cookie we have to send with the query.
/// Since this is only polled once a day we log in for each fetch instead of keeping the cookie
pub struct SpaceTrackSource {
    config: SpaceTrackConfig,
    credentials: Option<SpaceTrackCredentials>,
    client: Client,
}

impl SpaceTrackSource {
    pub fn new (config: SpaceTrackConfig, credentials: Option<SpaceTrackCredentials>, timeout: Duration)->Result<Self> {
        let client = build_client( timeout)?;
        Ok( SpaceTrackSource { config, credentials, client } )
    }

    fn credentials (&self)->Result<&SpaceTrackCredentials> {
        self.credentials.as_ref()
            .filter( |c| c.is_complete())
            .ok_or( config_error!("no space-track.org credentials (set {USERNAME_ENV} and {PASSWORD_ENV})"))
    }

    async fn login (&self)->Result<String> {
        let credentials = self.credentials()?;

        let response = self.client
            .post( &self.config.login_url)
            .form( credentials)
            .send()
            .await.map_err(|e| auth_error!("space-track.org login failed: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            return Err( auth_error!("space-track.org login failed with HTTP {status}"))
        }

        let cookie = session_cookie( response.headers())?;
        let body = response.text().await.map_err(|e| auth_error!("space-track.org login response unreadable: {e}"))?;
        if body.contains("\"Login\":\"Failed\"") {
            return Err( auth_error!("space-track.org rejected credentials"))
        }

        debug!("logged into space-track.org");
        Ok(cookie)
    }
}

#[async_trait]
impl TleSource for SpaceTrackSource {
    fn id (&self)->SourceId { SourceId::SpaceTrack }

    fn check_ready (&self)->Result<()> {
        self.credentials().map( |_| ())
    }

    async fn fetch (&self)->Result<String> {
        let cookie = self.login().await?;

        let response = self.client
            .get( &self.config.query_url)
            .header( COOKIE, cookie)
            .send()
            .await?;

        response_text( response, "space-track.org query").await
    }

    fn extract (&self, raw: &str)->Result<Vec<RawTle>> {
        split_two_line( raw)
    }
}

/// the session cookie to send with queries: the `name=value` part of all Set-Cookie headers
pub fn session_cookie (headers: &HeaderMap)->Result<String> {
    let parts: Vec<&str> = headers.get_all( SET_COOKIE).iter()
        .filter_map( |v| v.to_str().ok())
        .filter_map( |v| v.split(';').next())
        .map( |v| v.trim())
        .filter( |v| !v.is_empty())
        .collect();

    if parts.is_empty() {
        Err( auth_error!("space-track.org login failed to obtain cookie"))
    } else {
        Ok( parts.join("; "))
    }
}

/// split a name-less 2-line response into objects with synthesized names.
/// Since names are derived from positions we only accept strictly aligned batches - an odd number
/// of lines or anything other than a line 1 / line 2 pair rejects the whole batch
pub fn split_two_line (text: &str)->Result<Vec<RawTle>> {
    let lines: Vec<&str> = text.lines().map( |l| l.trim()).filter( |l| !l.is_empty()).collect();
    if lines.len() % 2 != 0 {
        return Err( tle_error!("misaligned space-track.org response: odd number of lines ({})", lines.len()))
    }

    let mut tles: Vec<RawTle> = Vec::with_capacity( lines.len() / 2);
    for (i,pair) in lines.chunks_exact(2).enumerate() {
        let ordinal = i+1;
        if !pair[0].starts_with("1 ") || !pair[1].starts_with("2 ") {
            return Err( tle_error!("misaligned space-track.org response at object {ordinal} (line {})", 2*i + 1))
        }
        let line1 = strip_padding_artifacts( pair[0]);
        tles.push( RawTle::new( ordinal, SourceId::SpaceTrack.synthetic_name(ordinal), line1, pair[1]));
    }

    Ok(tles)
}

/// remove the double blank space-track.org inserts before upper case letters of element line 1
pub fn strip_padding_artifacts (line: &str)->String {
    PADDING_ARTIFACT_RE.replace_all( line, "$1").into_owned()
}
