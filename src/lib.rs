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

pub mod cloud_setup;
pub mod comm;
pub mod common;
pub mod config;
pub mod fiware_lab;
pub mod instance_params;
pub mod keystone;
pub mod neutron;
pub mod nova;
pub mod params;
pub mod service_target;

#[cfg(feature = "cli")]
pub mod logging;

pub use common::{FileLoadError, StackError};
pub use config::StackConfig;
pub use keystone::{AccessInfo, AuthRequest, AuthState, EndpointKind, ProtocolVersion, Session};
