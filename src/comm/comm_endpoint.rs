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

use crate::keystone::keystone_catalog::{EndpointKind, Service};
use crate::keystone::keystone_common::ProtocolVersion;

/// Pick the url of `service` for `region` and `kind`.
/// v3: the first endpoint in the region whose interface matches the kind.
/// v2: the first endpoint in the region, then its url for the kind (which may be missing).
/// `None` means the service isn't reachable in that region.
pub fn get_endpoint_url(service: &Service, region: &str, kind: EndpointKind, version: ProtocolVersion) -> Option<String> {
    match version {
        ProtocolVersion::V3 => {
            service.endpoints.iter()
                .find(|e| e.is_in_region(region) && e.interface.as_deref() == Some(kind.interface()))
                .and_then(|e| e.url.clone())
        },
        ProtocolVersion::V2 => {
            service.endpoints.iter()
                .find(|e| e.is_in_region(region))
                .and_then(|e| e.v2_url(kind).map(|u| u.to_string()))
        }
    }
}
