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

use std::{fs, path::{Path,PathBuf}};
use async_trait::async_trait;
use chrono::{DateTime,Utc};
use serde::{Deserialize,Serialize};
use tokio::{io::AsyncWriteExt, sync::Mutex};
use crate::{
    errors::{config_error, Result},
    propagator::GeoPosition,
    source::SourceId,
    tle::SatelliteRecord,
};

pub const ERROR_LOG_FILE: &str = "error.log";
pub const SNAPSHOT_FILE: &str = "orbits.json";

/// append-only diagnostic record. These are written but never read back by the ingester
#[derive(Serialize,Deserialize,Debug,Clone,PartialEq)]
pub struct ErrorLogEntry {
    pub source: SourceId,
    pub identifier: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ErrorLogEntry {
    pub fn new (source: SourceId, identifier: impl ToString, message: impl ToString, timestamp: DateTime<Utc>)->Self {
        ErrorLogEntry { source, identifier: identifier.to_string(), message: message.to_string(), timestamp }
    }
}

/// where fetched, parsed and propagated data ends up. Each call either succeeds or fails as a whole
#[async_trait]
pub trait PersistenceSink: Send + Sync {
    /// store the unmodified source response (overwrites the previous one for this source)
    async fn save_raw (&self, source: SourceId, raw: &[u8]) -> Result<()>;

    /// store the full parsed batch of a source (overwrites the previous one for this source)
    async fn save_parsed (&self, source: SourceId, records: &[SatelliteRecord]) -> Result<()>;

    async fn append_error (&self, entry: &ErrorLogEntry) -> Result<()>;

    /// store the current positions of all propagated objects. This is a full state, not a delta
    async fn save_snapshot (&self, positions: &[GeoPosition]) -> Result<()>;
}

/* #region file sink ***************************************************************************************/

/// a PersistenceSink that keeps everything as files within a single data directory
#[derive(Debug)]
pub struct FileSink {
    dir: PathBuf,
    append_lock: Mutex<()>, // serializes error log appends
}

impl FileSink {
    pub fn new (dir: impl AsRef<Path>)->Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        ensure_writable_dir( &dir)?;
        Ok( FileSink { dir, append_lock: Mutex::new(()) } )
    }

    pub fn dir (&self)->&Path {
        &self.dir
    }

    pub fn raw_path (&self, source: SourceId)->PathBuf {
        let ext = match source {
            SourceId::SatNogs => "json", // satnogs responds with JSON
            _ => "txt"
        };
        self.dir.join( format!("{}_tles_raw.{ext}", source.name()))
    }

    pub fn parsed_path (&self, source: SourceId)->PathBuf {
        self.dir.join( format!("{}_tles.json", source.name()))
    }

    pub fn error_log_path (&self)->PathBuf {
        self.dir.join( ERROR_LOG_FILE)
    }

    pub fn snapshot_path (&self)->PathBuf {
        self.dir.join( SNAPSHOT_FILE)
    }
}

#[async_trait]
impl PersistenceSink for FileSink {
    async fn save_raw (&self, source: SourceId, raw: &[u8]) -> Result<()> {
        replace_file_contents( &self.raw_path(source), raw).await
    }

    async fn save_parsed (&self, source: SourceId, records: &[SatelliteRecord]) -> Result<()> {
        let data = serde_json::to_vec_pretty( records)?;
        replace_file_contents( &self.parsed_path(source), &data).await
    }

    async fn append_error (&self, entry: &ErrorLogEntry) -> Result<()> {
        let mut line = serde_json::to_string( entry)?;
        line.push('\n');

        let _guard = self.append_lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open( self.error_log_path()).await?;
        file.write_all( line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    async fn save_snapshot (&self, positions: &[GeoPosition]) -> Result<()> {
        let data = serde_json::to_vec_pretty( positions)?;
        replace_file_contents( &self.snapshot_path(), &data).await
    }
}

/// write to a sibling temp file and rename it so that readers never see partial contents
async fn replace_file_contents (path: &Path, data: &[u8]) -> Result<()> {
    let fname = path.file_name().and_then( |f| f.to_str()).ok_or( config_error!("invalid artifact path {path:?}"))?;
    let tmp_path = path.with_file_name( format!(".{fname}.tmp"));

    tokio::fs::write( &tmp_path, data).await?;
    tokio::fs::rename( &tmp_path, path).await?;
    Ok(())
}

/// check if dir exists and is writable, try to create it otherwise
fn ensure_writable_dir (dir: &Path)->Result<()> {
    if dir.is_dir() {
        let md = fs::metadata( dir)?;
        if md.permissions().readonly() {
            return Err( config_error!("data dir {dir:?} not writable"))
        }
        Ok(())
    } else {
        Ok( fs::create_dir_all( dir)? )
    }
}

/* #endregion file sink */
