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

#![allow(unused)]

mod common;

use std::{io, sync::Arc, time::Duration};
use async_trait::async_trait;
use chrono::{DateTime,TimeDelta,TimeZone,Utc};
use tokio_util::sync::CancellationToken;
use odin_tle::{
    adapter::{refresh_source, TleSource},
    config::CadenceConfig,
    errors::{OdinTleError, Result},
    propagator::GeoPosition,
    sink::{ErrorLogEntry, PersistenceSink},
    tle::SatelliteRecord,
    scheduler::{CadencePolicy, Clock, RefreshScheduler, RefreshState, SourceOutcome},
    sources::spacetrack::{SpaceTrackConfig, SpaceTrackSource},
    SourceId,
};
use common::*;

const CYCLE: Duration = Duration::from_secs( 3600);

fn t0 ()->DateTime<Utc> {
    Utc.with_ymd_and_hms( 2025, 3, 18, 0, 0, 0).unwrap()
}

struct FixedClock( DateTime<Utc> );

impl Clock for FixedClock {
    fn now (&self)->DateTime<Utc> { self.0 }
}

fn all_sources ()->Vec<ScriptedSource> {
    vec![
        ScriptedSource::ok( SourceId::SpaceTrack, spacetrack_text()),
        ScriptedSource::ok( SourceId::CelesTrak, celestrak_text()),
        ScriptedSource::ok( SourceId::SatNogs, "[]"), // replaced where a satnogs result matters
    ]
}

fn boxed (sources: Vec<ScriptedSource>)->Vec<Box<dyn TleSource>> {
    sources.into_iter().map( |s| Box::new(s) as Box<dyn TleSource>).collect()
}

#[test]
fn test_default_cadence () {
    let policy = CadencePolicy::default();
    assert_eq!( policy.cadence( SourceId::SpaceTrack), TimeDelta::hours(24));
    assert_eq!( policy.cadence( SourceId::CelesTrak), TimeDelta::hours(1));
    assert_eq!( policy.cadence( SourceId::SatNogs), TimeDelta::hours(1));

    assert_eq!( CadencePolicy::from_config( &CadenceConfig::default()).unwrap(), policy);
}

#[test]
fn test_is_due () {
    let policy = CadencePolicy::default();
    let mut state = RefreshState::new();

    // never refreshed sources are always due
    for id in SourceId::ALL {
        assert!( state.is_due( id, t0(), &policy));
        assert_eq!( state.next_due( id, &policy), None);
    }

    state.record_success( SourceId::SpaceTrack, t0());
    state.record_success( SourceId::CelesTrak, t0());

    assert!( !state.is_due( SourceId::SpaceTrack, t0() + TimeDelta::hours(23), &policy));
    assert!( state.is_due( SourceId::SpaceTrack, t0() + TimeDelta::hours(24), &policy));
    assert_eq!( state.next_due( SourceId::SpaceTrack, &policy), Some( t0() + TimeDelta::hours(24)));

    assert!( !state.is_due( SourceId::CelesTrak, t0() + TimeDelta::minutes(59), &policy));
    assert!( state.is_due( SourceId::CelesTrak, t0() + TimeDelta::hours(1), &policy));
    assert!( state.is_due( SourceId::SatNogs, t0() + TimeDelta::minutes(1), &policy));
}

#[test]
fn test_processing_order () {
    let sources = vec![
        ScriptedSource::ok( SourceId::SatNogs, "[]"),
        ScriptedSource::ok( SourceId::CelesTrak, celestrak_text()),
        ScriptedSource::ok( SourceId::SpaceTrack, spacetrack_text()),
    ];
    let scheduler = RefreshScheduler::new( boxed(sources), MemorySink::new(), CadencePolicy::default(), CYCLE).unwrap();
    assert_eq!( scheduler.source_ids(), vec![SourceId::SpaceTrack, SourceId::CelesTrak, SourceId::SatNogs]);
}

#[test]
fn test_rejected_scheduler_setup () {
    assert!( matches!( RefreshScheduler::new( Vec::new(), MemorySink::new(), CadencePolicy::default(), CYCLE), Err(OdinTleError::ConfigError(_))));

    let sources = vec![
        ScriptedSource::ok( SourceId::CelesTrak, celestrak_text()),
        ScriptedSource::ok( SourceId::CelesTrak, celestrak_text()),
    ];
    assert!( RefreshScheduler::new( boxed(sources), MemorySink::new(), CadencePolicy::default(), CYCLE).is_err());
}

#[test]
fn test_missing_credentials () {
    let spacetrack = SpaceTrackSource::new( SpaceTrackConfig::default(), None, Duration::from_secs(5)).unwrap();
    let celestrak = ScriptedSource::ok( SourceId::CelesTrak, celestrak_text());
    let calls = celestrak.calls();

    let sources: Vec<Box<dyn TleSource>> = vec![ Box::new(spacetrack), Box::new(celestrak) ];
    match RefreshScheduler::new( sources, MemorySink::new(), CadencePolicy::default(), CYCLE) {
        Err(e) => assert!( e.is_fatal()),
        Ok(_) => panic!("scheduler should not start without space-track credentials")
    }
    assert_eq!( n_calls( &calls), 0);
}

#[tokio::test]
async fn test_cadence_across_cycles () {
    let sink = MemorySink::new();
    let mut sources = all_sources();
    sources[2] = ScriptedSource::ok( SourceId::SatNogs, satnogs_json());
    let calls: Vec<_> = sources.iter().map( |s| s.calls()).collect();

    let scheduler = RefreshScheduler::new( boxed(sources), sink.clone(), CadencePolicy::default(), CYCLE).unwrap();

    // first cycle refreshes everything
    let (state, report) = scheduler.run_cycle( RefreshState::new(), t0()).await;
    assert_eq!( report.n_refreshed(), 3);
    for id in SourceId::ALL {
        assert_eq!( state.last_success( id), Some(t0()));
        assert!( sink.has_raw( id));
    }
    assert_eq!( sink.n_parsed( SourceId::SpaceTrack), 3);
    assert_eq!( sink.n_parsed( SourceId::CelesTrak), 2);
    assert_eq!( sink.n_parsed( SourceId::SatNogs), 1);

    // nothing is due half an hour later
    assert!( !scheduler.is_due( &state, SourceId::CelesTrak, t0() + TimeDelta::minutes(30)));
    let (state, report) = scheduler.run_cycle( state, t0() + TimeDelta::minutes(30)).await;
    assert_eq!( report.n_skipped(), 3);
    assert!( calls.iter().all( |c| n_calls(c) == 1));

    // after an hour only the hourly sources are refreshed
    let t1 = t0() + TimeDelta::hours(1);
    let (state, report) = scheduler.run_cycle( state, t1).await;
    assert!( report.outcome( SourceId::SpaceTrack).unwrap().is_skipped());
    assert!( report.outcome( SourceId::CelesTrak).unwrap().is_refreshed());
    assert!( report.outcome( SourceId::SatNogs).unwrap().is_refreshed());
    assert_eq!( state.last_success( SourceId::SpaceTrack), Some(t0()));
    assert_eq!( state.last_success( SourceId::CelesTrak), Some(t1));

    // space-track is refreshed again after a day
    let (state, report) = scheduler.run_cycle( state, t0() + TimeDelta::hours(24)).await;
    assert_eq!( report.n_refreshed(), 3);
    assert_eq!( n_calls( &calls[0]), 2);
    assert_eq!( n_calls( &calls[1]), 3);
}

#[tokio::test]
async fn test_failure_isolation () {
    let sink = MemorySink::new();
    let sources = vec![
        ScriptedSource::failing( SourceId::SpaceTrack, "HTTP 503"),
        ScriptedSource::ok( SourceId::CelesTrak, celestrak_text()),
        ScriptedSource::ok( SourceId::SatNogs, satnogs_json()),
    ];
    let calls: Vec<_> = sources.iter().map( |s| s.calls()).collect();
    let scheduler = RefreshScheduler::new( boxed(sources), sink.clone(), CadencePolicy::default(), CYCLE).unwrap();

    let (state, report) = scheduler.run_cycle( RefreshState::new(), t0()).await;
    assert!( calls.iter().all( |c| n_calls(c) == 1));
    assert!( matches!( report.outcome( SourceId::SpaceTrack), Some(SourceOutcome::Failed(OdinTleError::TransportError(_)))));
    assert_eq!( report.n_refreshed(), 2);

    // failed source keeps its (empty) state and is retried in the next cycle
    assert_eq!( state.last_success( SourceId::SpaceTrack), None);
    assert!( !sink.has_raw( SourceId::SpaceTrack));

    let errors = sink.errors();
    assert_eq!( errors.len(), 1);
    assert_eq!( errors[0].source, SourceId::SpaceTrack);
    assert_eq!( errors[0].identifier, "refresh");
    assert!( errors[0].message.contains("HTTP 503"));

    let (state, report) = scheduler.run_cycle( state, t0() + TimeDelta::minutes(10)).await;
    assert!( report.outcome( SourceId::SpaceTrack).unwrap().is_failed());
    assert_eq!( report.n_skipped(), 2);
    assert_eq!( n_calls( &calls[0]), 2);
    assert_eq!( n_calls( &calls[1]), 1);
}

#[tokio::test]
async fn test_empty_result () {
    let sink = MemorySink::new();
    let satnogs = ScriptedSource::ok( SourceId::SatNogs, "[]");

    match refresh_source( &satnogs, sink.as_ref(), t0()).await {
        Err(OdinTleError::EmptyResultError(_)) => {}
        other => panic!("expected empty result error, got {other:?}")
    }
    assert!( !sink.has_raw( SourceId::SatNogs));

    // a batch in which no object parses also fails the source, but we keep the raw response
    let celestrak = ScriptedSource::ok( SourceId::CelesTrak, format!("BROKEN\n{}\n{ISS_L2}\n", corrupt( ISS_L1)));
    assert!( matches!( refresh_source( &celestrak, sink.as_ref(), t0()).await, Err(OdinTleError::EmptyResultError(_))));
    assert!( sink.has_raw( SourceId::CelesTrak));
    assert_eq!( sink.n_parsed( SourceId::CelesTrak), 0);
    assert_eq!( sink.errors().len(), 1);
}

#[tokio::test]
async fn test_partial_batch () {
    let sink = MemorySink::new();
    let text = format!("NOAA 21\n{NOAA21_L1}\n{}\nNOAA 20\n{NOAA20_L1}\n{NOAA20_L2}\n", corrupt( NOAA21_L2));
    let celestrak = ScriptedSource::ok( SourceId::CelesTrak, text);

    let report = refresh_source( &celestrak, sink.as_ref(), t0()).await.unwrap();
    assert_eq!( (report.n_objects, report.n_records, report.n_errors), (2, 1, 1));

    let parsed = sink.parsed.lock().unwrap().get( &SourceId::CelesTrak).cloned().unwrap();
    assert_eq!( parsed[0].name, "NOAA 20");

    let errors = sink.errors();
    assert_eq!( errors.len(), 1);
    assert_eq!( errors[0].identifier, "#1 NOAA 21");
}

#[tokio::test]
async fn test_misaligned_spacetrack_batch () {
    let sink = MemorySink::new();
    let spacetrack = ScriptedSource::ok( SourceId::SpaceTrack, format!("{ISS_L1}\n{ISS_L2}\n{NOAA21_L2}\n"));

    assert!( matches!( refresh_source( &spacetrack, sink.as_ref(), t0()).await, Err(OdinTleError::TleError(_))));
    assert!( !sink.has_raw( SourceId::SpaceTrack));
}

#[tokio::test]
async fn test_run_once_uses_clock () {
    let sink = MemorySink::new();
    let sources = vec![ ScriptedSource::ok( SourceId::CelesTrak, celestrak_text()) ];
    let scheduler = RefreshScheduler::new( boxed(sources), sink, CadencePolicy::default(), CYCLE).unwrap()
        .with_clock( Arc::new( FixedClock( t0())));

    let (state, report) = scheduler.run_once( RefreshState::new()).await;
    assert_eq!( report.time, t0());
    assert_eq!( state.last_success( SourceId::CelesTrak), Some( t0()));
}

#[tokio::test]
async fn test_run_loop_cancellation () {
    let sink = MemorySink::new();
    let celestrak = ScriptedSource::ok( SourceId::CelesTrak, celestrak_text());
    let calls = celestrak.calls();

    let policy = CadencePolicy::default().with_cadence( SourceId::CelesTrak, TimeDelta::zero());
    let scheduler = RefreshScheduler::new( boxed( vec![celestrak]), sink, policy, Duration::from_millis(10)).unwrap();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn( async move {
        tokio::time::sleep( Duration::from_millis(200)).await;
        trigger.cancel();
    });

    let state = tokio::time::timeout( Duration::from_secs(5), scheduler.run( RefreshState::new(), cancel)).await.unwrap();
    assert!( state.last_success( SourceId::CelesTrak).is_some());
    assert!( n_calls( &calls) >= 2);
}

#[tokio::test]
async fn test_cancel_during_fetch () {
    let sink = MemorySink::new();
    let sources = vec![
        ScriptedSource::ok( SourceId::SpaceTrack, spacetrack_text()),
        ScriptedSource::ok( SourceId::CelesTrak, celestrak_text()).with_delay( Duration::from_secs(30)),
    ];
    let scheduler = RefreshScheduler::new( boxed(sources), sink, CadencePolicy::default(), CYCLE).unwrap();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn( async move {
        tokio::time::sleep( Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let state = tokio::time::timeout( Duration::from_secs(5), scheduler.run( RefreshState::new(), cancel)).await.unwrap();
    assert!( state.last_success( SourceId::SpaceTrack).is_some());
    assert!( state.last_success( SourceId::CelesTrak).is_none());
}

/// a sink that stores everything but can't write its error log
#[derive(Default)]
struct BrokenLogSink( MemorySink );

#[async_trait]
impl PersistenceSink for BrokenLogSink {
    async fn save_raw (&self, source: SourceId, raw: &[u8]) -> Result<()> { self.0.save_raw( source, raw).await }
    async fn save_parsed (&self, source: SourceId, records: &[SatelliteRecord]) -> Result<()> { self.0.save_parsed( source, records).await }
    async fn save_snapshot (&self, positions: &[GeoPosition]) -> Result<()> { self.0.save_snapshot( positions).await }

    async fn append_error (&self, _entry: &ErrorLogEntry) -> Result<()> {
        Err( OdinTleError::IOError( io::Error::new( io::ErrorKind::StorageFull, "no space left")))
    }
}

#[tokio::test]
async fn test_error_log_failure_keeps_batch () {
    let sink = BrokenLogSink::default();
    let text = format!("NOAA 21\n{NOAA21_L1}\n{}\nNOAA 20\n{NOAA20_L1}\n{NOAA20_L2}\n", corrupt( NOAA21_L2));
    let celestrak = ScriptedSource::ok( SourceId::CelesTrak, text);

    let report = refresh_source( &celestrak, &sink, t0()).await.unwrap();
    assert_eq!( (report.n_records, report.n_errors), (1, 1));
    assert_eq!( sink.0.n_parsed( SourceId::CelesTrak), 1);
}

#[tokio::test]
async fn test_loop_matches_single_cycle () {
    fn scheduler ()->RefreshScheduler {
        let sources = vec![
            ScriptedSource::failing( SourceId::SpaceTrack, "HTTP 500"),
            ScriptedSource::ok( SourceId::CelesTrak, celestrak_text()),
            ScriptedSource::ok( SourceId::SatNogs, satnogs_json()),
        ];
        RefreshScheduler::new( boxed(sources), MemorySink::new(), CadencePolicy::default(), CYCLE).unwrap()
            .with_clock( Arc::new( FixedClock( t0())))
    }

    let (expected, report) = scheduler().run_cycle( RefreshState::new(), t0()).await;
    assert_eq!( (report.n_refreshed(), report.n_failed()), (2, 1));

    // the loop completes its first cycle and then gets cancelled while sleeping
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn( async move {
        tokio::time::sleep( Duration::from_millis(200)).await;
        trigger.cancel();
    });
    let state = tokio::time::timeout( Duration::from_secs(5), scheduler().run( RefreshState::new(), cancel)).await.unwrap();

    assert_eq!( state, expected);
    assert_eq!( state.last_success( SourceId::SpaceTrack), None);
    assert_eq!( state.last_success( SourceId::SatNogs), Some( t0()));
}
