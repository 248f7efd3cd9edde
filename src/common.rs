/*
 fiware-stack
 Copyright 2025 Peter Pearson.
 Licensed under the Apache License, Version 2.0 (the "License");
 You may not use this file except in compliance with the License.
 You may obtain a copy of the License at
 http://www.apache.org/licenses/LICENSE-2.0
 Unless required by applicable law or agreed to in writing, software
 distributed under the License is distributed on an "AS IS" BASIS,
 WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 See the License for the specific language governing permissions and
 limitations under the License.
 ---------
*/

use std::io;

use thiserror::Error;

use crate::comm::CommError;
use crate::keystone::AuthenticationError;

#[derive(Error, Debug)]
pub enum FileLoadError {
    #[error("{0}")]
    CustomError(String),
    #[error("{0}")]
    StdError(String),
    #[error("I/O error: {0}")]
    IOError(#[from] io::Error),
}

impl From<std::str::Utf8Error> for FileLoadError {
    fn from(error: std::str::Utf8Error) -> Self {
        FileLoadError::StdError(error.to_string())
    }
}

#[derive(Error, Debug)]
pub enum StackError {
    #[error(transparent)]
    Comm(#[from] CommError),

    #[error(transparent)]
    Authentication(#[from] AuthenticationError),

    #[error("not authenticated with the identity service")]
    NotAuthenticated,

    #[error("service '{service_type}' is not available in region '{region}'")]
    ServiceUnavailable { service_type: String, region: String },

    #[error("several {what}s available, choose one of: {}", .choices.join(", "))]
    SelectionNeeded { what: String, choices: Vec<String> },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("couldn't load file: {0}")]
    FileLoad(#[from] FileLoadError),
}
