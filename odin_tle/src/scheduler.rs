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

//! the multi-source refresh loop.
//!
//! Each cycle walks all configured sources in priority order (longest cadence first). A source is
//! refreshed if it never succeeded or its cadence has elapsed since its last success. Failures
//! are logged and recorded in the error log but never stop other sources or the loop. The
//! per-source success times live in an explicit [`RefreshState`] that is passed into and returned
//! from each cycle

use std::{cmp::Reverse, collections::{HashMap,HashSet}, sync::Arc, time::Duration};
use chrono::{DateTime,TimeDelta,Utc};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug,error,info,warn};
use crate::{
    adapter::{refresh_source, RefreshReport, TleSource},
    config::CadenceConfig,
    errors::{config_error, OdinTleError, Result},
    sink::{ErrorLogEntry, PersistenceSink},
    source::SourceId,
};

/// source of "now" for the run loop
pub trait Clock: Send + Sync {
    fn now (&self)->DateTime<Utc>;
}

#[derive(Debug,Clone,Copy,Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now (&self)->DateTime<Utc> { Utc::now() }
}

/* #region cadence and state ****************************************************************************/

/// minimum refresh interval per source
#[derive(Debug,Clone,PartialEq)]
pub struct CadencePolicy {
    cadences: HashMap<SourceId,TimeDelta>,
}

impl CadencePolicy {
    pub fn from_config (config: &CadenceConfig)->Result<Self> {
        let mut cadences = HashMap::new();
        cadences.insert( SourceId::SpaceTrack, to_time_delta( config.spacetrack)?);
        cadences.insert( SourceId::CelesTrak, to_time_delta( config.celestrak)?);
        cadences.insert( SourceId::SatNogs, to_time_delta( config.satnogs)?);
        Ok( CadencePolicy { cadences } )
    }

    pub fn with_cadence (mut self, source: SourceId, cadence: TimeDelta)->Self {
        self.cadences.insert( source, cadence);
        self
    }

    pub fn cadence (&self, source: SourceId)->TimeDelta {
        self.cadences.get( &source).copied().unwrap_or( TimeDelta::zero())
    }
}

impl Default for CadencePolicy {
    fn default()->Self {
        CadencePolicy { cadences: HashMap::from([
            (SourceId::SpaceTrack, TimeDelta::hours(24)),
            (SourceId::CelesTrak, TimeDelta::hours(1)),
            (SourceId::SatNogs, TimeDelta::hours(1)),
        ])}
    }
}

fn to_time_delta (d: Duration)->Result<TimeDelta> {
    TimeDelta::from_std(d).map_err(|_| config_error!("cadence out of range: {d:?}"))
}

/// when did each source last refresh successfully. This is not persisted - an empty state
/// (e.g. after a restart) makes every source due
#[derive(Debug,Clone,Default,PartialEq)]
pub struct RefreshState {
    last_success: HashMap<SourceId,DateTime<Utc>>,
}

impl RefreshState {
    pub fn new ()->Self {
        RefreshState::default()
    }

    pub fn last_success (&self, source: SourceId)->Option<DateTime<Utc>> {
        self.last_success.get( &source).copied()
    }

    /// a source is due if it never succeeded or at least its cadence has passed since then
    pub fn is_due (&self, source: SourceId, now: DateTime<Utc>, policy: &CadencePolicy)->bool {
        match self.last_success( source) {
            Some(t) => now - t >= policy.cadence( source),
            None => true
        }
    }

    /// earliest time the source becomes due again
    pub fn next_due (&self, source: SourceId, policy: &CadencePolicy)->Option<DateTime<Utc>> {
        self.last_success( source).map( |t| t + policy.cadence( source))
    }

    pub fn record_success (&mut self, source: SourceId, t: DateTime<Utc>) {
        self.last_success.insert( source, t);
    }
}

/* #endregion cadence and state */

/* #region cycle results ********************************************************************************/

#[derive(Debug)]
pub enum SourceOutcome {
    /// not due yet
    Skipped { next_due: Option<DateTime<Utc>> },
    Refreshed( RefreshReport ),
    Failed( OdinTleError ),
}

impl SourceOutcome {
    pub fn is_refreshed (&self)->bool { matches!( self, SourceOutcome::Refreshed(_)) }
    pub fn is_failed (&self)->bool { matches!( self, SourceOutcome::Failed(_)) }
    pub fn is_skipped (&self)->bool { matches!( self, SourceOutcome::Skipped{..}) }
}

/// what happened to each source within one cycle, in the order they were processed
#[derive(Debug)]
pub struct CycleReport {
    pub time: DateTime<Utc>,
    pub outcomes: Vec<(SourceId,SourceOutcome)>,
}

impl CycleReport {
    pub fn outcome (&self, source: SourceId)->Option<&SourceOutcome> {
        self.outcomes.iter().find( |(id,_)| *id == source).map( |(_,o)| o)
    }

    pub fn n_refreshed (&self)->usize { self.outcomes.iter().filter( |(_,o)| o.is_refreshed()).count() }
    pub fn n_failed (&self)->usize { self.outcomes.iter().filter( |(_,o)| o.is_failed()).count() }
    pub fn n_skipped (&self)->usize { self.outcomes.iter().filter( |(_,o)| o.is_skipped()).count() }
}

/* #endregion cycle results */

/// the object that owns the sources and decides when to refresh them
pub struct RefreshScheduler {
    sources: Vec<Box<dyn TleSource>>,
    sink: Arc<dyn PersistenceSink>,
    policy: CadencePolicy,
    cycle_interval: Duration,
    clock: Arc<dyn Clock>,
}

impl RefreshScheduler {
    /// this refuses to create a scheduler if any source is not ready (e.g. missing credentials)
    /// since such a source would fail in every cycle
    pub fn new (mut sources: Vec<Box<dyn TleSource>>, sink: Arc<dyn PersistenceSink>, policy: CadencePolicy, cycle_interval: Duration)->Result<Self> {
        if sources.is_empty() {
            return Err( config_error!("no TLE sources configured"))
        }

        let mut ids: HashSet<SourceId> = HashSet::new();
        for src in &sources {
            if !ids.insert( src.id()) {
                return Err( config_error!("duplicate TLE source {}", src.id()))
            }
            src.check_ready()?;
        }

        sources.sort_by_key( |src| (Reverse( policy.cadence( src.id())), src.id()));

        Ok( RefreshScheduler { sources, sink, policy, cycle_interval, clock: Arc::new( SystemClock) } )
    }

    pub fn with_clock (mut self, clock: Arc<dyn Clock>)->Self {
        self.clock = clock;
        self
    }

    /// source ids in processing order
    pub fn source_ids (&self)->Vec<SourceId> {
        self.sources.iter().map( |src| src.id()).collect()
    }

    pub fn is_due (&self, state: &RefreshState, source: SourceId, now: DateTime<Utc>)->bool {
        state.is_due( source, now, &self.policy)
    }

    /// attempt a refresh of every due source. Sources are processed one after the other and a
    /// failing source only affects its own state entry
    pub async fn run_cycle (&self, mut state: RefreshState, now: DateTime<Utc>)->(RefreshState,CycleReport) {
        let (report, _) = self.cycle( &mut state, now, &CancellationToken::new()).await;
        (state, report)
    }

    /// run a single cycle at the current clock time
    pub async fn run_once (&self, state: RefreshState)->(RefreshState,CycleReport) {
        let now = self.clock.now();
        self.run_cycle( state, now).await
    }

    /// the refresh loop. This only returns once the cancel token is triggered, which can also
    /// happen while a source is fetched. Sources that already completed keep their state in that case
    pub async fn run (&self, mut state: RefreshState, cancel: CancellationToken)->RefreshState {
        info!("starting TLE refresh loop for {:?}", self.source_ids());

        loop {
            let now = self.clock.now();
            let (report, cancelled) = self.cycle( &mut state, now, &cancel).await;
            if cancelled {
                info!("TLE refresh loop cancelled after {} of {} sources", report.outcomes.len(), self.sources.len());
                return state
            }

            info!("TLE refresh cycle done: {} refreshed, {} failed, {} skipped",
                  report.n_refreshed(), report.n_failed(), report.n_skipped());

            debug!("waiting {:?} for next TLE refresh cycle", self.cycle_interval);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("TLE refresh loop cancelled");
                    return state
                }
                _ = sleep( self.cycle_interval) => {}
            }
        }
    }

    /// process all sources in priority order until done or cancelled. Returns the outcomes of the
    /// processed sources and whether the cycle was cut short
    async fn cycle (&self, state: &mut RefreshState, now: DateTime<Utc>, cancel: &CancellationToken)->(CycleReport,bool) {
        let mut outcomes: Vec<(SourceId,SourceOutcome)> = Vec::with_capacity( self.sources.len());

        for src in &self.sources {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                outcome = self.process_source( src.as_ref(), state, now) => Some(outcome),
            };

            match outcome {
                Some(outcome) => outcomes.push( (src.id(), outcome)),
                None => {
                    debug!("TLE refresh cycle cancelled during {} refresh", src.id());
                    return (CycleReport { time: now, outcomes }, true)
                }
            }
        }

        (CycleReport { time: now, outcomes }, false)
    }

    /// refresh a single source if it is due, recording success in the state and failure in the error log
    async fn process_source (&self, src: &dyn TleSource, state: &mut RefreshState, now: DateTime<Utc>)->SourceOutcome {
        let id = src.id();

        if !state.is_due( id, now, &self.policy) {
            let next_due = state.next_due( id, &self.policy);
            debug!("{id} not due before {next_due:?}");
            return SourceOutcome::Skipped{ next_due }
        }

        match refresh_source( src, self.sink.as_ref(), now).await {
            Ok(report) => {
                state.record_success( id, now);
                SourceOutcome::Refreshed(report)
            }
            Err(e) => {
                error!("refreshing {id} TLEs failed: {e}");
                let entry = ErrorLogEntry::new( id, "refresh", &e, now);
                if let Err(log_err) = self.sink.append_error( &entry).await {
                    warn!("failed to record {id} error: {log_err}");
                }
                SourceOutcome::Failed(e)
            }
        }
    }
}
