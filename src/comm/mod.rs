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

pub mod comm_common;
pub mod comm_client;
pub mod comm_endpoint;
pub mod comm_transport;

pub use comm_client::{Comm, UnauthorizedHook};
pub use comm_common::{CommError, CommRequest, CommResponse, HttpMethod, ResponseBody};
pub use comm_endpoint::get_endpoint_url;
pub use comm_transport::{HttpTransport, UreqTransport};
