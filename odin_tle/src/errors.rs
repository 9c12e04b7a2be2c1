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

use thiserror::Error;

pub type Result<T> = std::result::Result<T, OdinTleError>;

#[derive(Error,Debug)]
pub enum OdinTleError {

    /// missing credentials or unusable config - the only error that stops the process
    #[error("config error {0}")]
    ConfigError( String ),

    #[error("IO error {0}")]
    IOError( #[from] std::io::Error),

    #[error("http error {0}")]
    HttpError( #[from] reqwest::Error),

    #[error("transport error {0}")]
    TransportError( String ),

    #[error("authentication error {0}")]
    AuthError( String ),

    #[error("empty result {0}")]
    EmptyResultError( String ),

    #[error("TLE error {0}")]
    TleError( String ),

    #[error("propagation error {0}")]
    PropagationError( String ),

    #[error("JSON error {0}")]
    JsonError( #[from] serde_json::Error),

    #[error("RON error {0}")]
    RonError( #[from] ron::error::SpannedError),
}

impl OdinTleError {
    /// only configuration errors are allowed to halt the process, everything else is a per-source
    /// or per-object condition
    pub fn is_fatal (&self)->bool {
        matches!( self, OdinTleError::ConfigError(_))
    }
}

macro_rules! tle_error {
    ($fmt:literal $(, $arg:expr )* ) => {
        $crate::errors::OdinTleError::TleError( format!( $fmt $(, $arg)* ))
    };
}
pub (crate) use tle_error;

macro_rules! config_error {
    ($fmt:literal $(, $arg:expr )* ) => {
        $crate::errors::OdinTleError::ConfigError( format!( $fmt $(, $arg)* ))
    };
}
pub (crate) use config_error;

macro_rules! auth_error {
    ($fmt:literal $(, $arg:expr )* ) => {
        $crate::errors::OdinTleError::AuthError( format!( $fmt $(, $arg)* ))
    };
}
pub (crate) use auth_error;

macro_rules! propagation_error {
    ($fmt:literal $(, $arg:expr )* ) => {
        $crate::errors::OdinTleError::PropagationError( format!( $fmt $(, $arg)* ))
    };
}
pub (crate) use propagation_error;
