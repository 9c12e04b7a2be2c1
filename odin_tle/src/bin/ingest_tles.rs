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

use std::{path::PathBuf, sync::Arc};
use tokio;
use tokio_util::sync::CancellationToken;
use anyhow::Result;
use clap::Parser;
use tracing::{info,error};
use odin_tle::{
    config::{load_config_path, TleIngestConfig},
    init_tracing,
    scheduler::{CadencePolicy, RefreshScheduler, RefreshState},
    sink::FileSink,
    sources::{create_sources, spacetrack::SpaceTrackCredentials},
    SourceId,
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = "periodically retrieve TLEs from space-track.org, celestrak.org and SatNOGS")]
pub struct Args {
    /// RON config file (defaults are used if not set)
    #[arg(short,long)]
    pub config: Option<PathBuf>,

    /// directory to store raw and parsed TLEs (overrides config)
    #[arg(short,long)]
    pub data_dir: Option<PathBuf>,

    /// only poll the given sources (spacetrack, celestrak, satnogs). Can be repeated
    #[arg(short,long)]
    pub source: Vec<SourceId>,

    /// run a single refresh cycle and exit
    #[arg(long)]
    pub once: bool,
}

#[tokio::main]
async fn main()->Result<()> {
    init_tracing();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config_path( path)?,
        None => TleIngestConfig::default()
    };
    if let Some(data_dir) = &args.data_dir {
        config.data_dir = data_dir.clone();
    }
    if !args.source.is_empty() {
        config.spacetrack.enabled &= args.source.contains( &SourceId::SpaceTrack);
        config.celestrak.enabled &= args.source.contains( &SourceId::CelesTrak);
        config.satnogs.enabled &= args.source.contains( &SourceId::SatNogs);
    }

    // missing credentials are fatal - we don't want to start with a source that fails every cycle
    let credentials = if config.spacetrack.enabled { Some( SpaceTrackCredentials::from_env()?) } else { None };

    let sink = Arc::new( FileSink::new( &config.data_dir)?);
    let sources = create_sources( &config, credentials)?;
    let policy = CadencePolicy::from_config( &config.cadence)?;
    info!("storing TLEs in {:?}", sink.dir());
    let scheduler = RefreshScheduler::new( sources, sink, policy, config.cycle_interval)?;

    if args.once {
        let (_state, report) = scheduler.run_once( RefreshState::new()).await;
        for (id,outcome) in &report.outcomes {
            println!("{id}: {outcome:?}");
        }
        return Ok(())
    }

    let cancel = CancellationToken::new();
    let ctrlc_cancel = cancel.clone();
    tokio::spawn( async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("cannot listen for Ctrl-C: {e}");
        }
        ctrlc_cancel.cancel();
    });

    scheduler.run( RefreshState::new(), cancel).await;
    info!("TLE ingestion terminated");

    Ok(())
}
