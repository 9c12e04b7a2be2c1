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

use async_trait::async_trait;
use chrono::{DateTime,Utc};
use tracing::{info,warn};
use crate::{
    errors::{OdinTleError, Result},
    sink::{ErrorLogEntry, PersistenceSink},
    source::SourceId,
    tle::{parse_raw_tle, RawTle, SatelliteRecord},
};

/// a trait for upstream TLE providers.
/// Implementors only know how to get the response and how to cut it into objects (including all
/// source specific text normalization). Parsing, error logging and persistence is common to all
/// sources and done by [`refresh_source`]
#[async_trait]
pub trait TleSource: Send + Sync {
    fn id (&self)->SourceId;

    /// check if we have everything to poll this source (credentials etc.)
    fn check_ready (&self)->Result<()> { Ok(()) }

    /// one (authenticated if required) network fetch, returning the response body
    async fn fetch (&self)->Result<String>;

    /// split the response body into raw objects
    fn extract (&self, raw: &str)->Result<Vec<RawTle>>;
}

/// what a successful source refresh produced
#[derive(Debug,Clone,PartialEq)]
pub struct RefreshReport {
    pub source: SourceId,
    pub n_objects: usize,
    pub n_records: usize,
    pub n_errors: usize,
}

/// parse all raw objects of a batch. Objects that fail to parse turn into error log entries,
/// they never abort the batch
pub fn parse_batch (source: SourceId, blocks: &[RawTle], now: DateTime<Utc>)->(Vec<SatelliteRecord>,Vec<ErrorLogEntry>) {
    let mut records: Vec<SatelliteRecord> = Vec::with_capacity( blocks.len());
    let mut errors: Vec<ErrorLogEntry> = Vec::new();

    for raw in blocks {
        match parse_raw_tle( raw) {
            Ok(rec) => records.push( rec),
            Err(e) => {
                warn!("{source} object {} rejected: {e}", raw.identifier());
                errors.push( ErrorLogEntry::new( source, raw.identifier(), e, now))
            }
        }
    }

    (records, errors)
}

/// one fetch -> parse -> persist cycle for the given source.
/// Only failures that make the whole source unusable for this cycle are returned as errors
pub async fn refresh_source (source: &dyn TleSource, sink: &dyn PersistenceSink, now: DateTime<Utc>)->Result<RefreshReport> {
    let id = source.id();

    let raw = source.fetch().await?;
    let blocks = source.extract( &raw)?;
    if blocks.is_empty() {
        return Err( OdinTleError::EmptyResultError( format!("no {id} objects found")))
    }
    sink.save_raw( id, raw.as_bytes()).await?;

    let (records, errors) = parse_batch( id, &blocks, now);
    if !errors.is_empty() {
        warn!("{} of {} {id} objects failed to parse", errors.len(), blocks.len());
    }
    for e in &errors {
        if let Err(log_err) = sink.append_error( e).await {
            warn!("failed to record {id} error for {}: {log_err}", e.identifier);
        }
    }

    if records.is_empty() {
        return Err( OdinTleError::EmptyResultError( format!("none of the {} {id} objects could be parsed", blocks.len())))
    }
    sink.save_parsed( id, &records).await?;

    info!("saved {} parsed {id} TLEs", records.len());
    Ok( RefreshReport { source: id, n_objects: blocks.len(), n_records: records.len(), n_errors: errors.len() } )
}
