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

use std::path::PathBuf;
use tokio;
use anyhow::{anyhow, Result};
use chrono::{DateTime,Utc};
use clap::Parser;
use odin_tle::{init_tracing, read_satellite_records, propagator::BatchPropagator, sink::FileSink};

#[derive(Parser, Debug)]
#[command(version, about, long_about = "compute current positions of satellites from TLEs")]
pub struct Args {
    /// directory to store the position snapshot
    #[arg(short,long, default_value = "data/tle")]
    pub data_dir: PathBuf,

    /// reference time as RFC3339 (default: now)
    #[arg(short,long)]
    pub time: Option<String>,

    /// parsed records (*.json) or 3-line TLE text file
    pub input: PathBuf,
}

#[tokio::main]
async fn main()->Result<()> {
    init_tracing();
    let args = Args::parse();

    let t: DateTime<Utc> = match &args.time {
        Some(s) => DateTime::parse_from_rfc3339( s).map_err(|e| anyhow!("invalid time {s}: {e}"))?.with_timezone(&Utc),
        None => Utc::now()
    };

    let records = read_satellite_records( &args.input)?;
    let sink = FileSink::new( &args.data_dir)?;

    let snapshot = BatchPropagator::sgp4().compute_and_save( &records, t, &sink).await?;
    println!("saved {} positions to {:?} ({} objects skipped)", snapshot.positions.len(), sink.snapshot_path(), snapshot.skipped.len());

    Ok(())
}
