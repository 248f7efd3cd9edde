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

use crate::common::StackError;
use crate::keystone::{EndpointKind, Session};

/// Where a service's requests go: resolved per call from the session's catalog
/// for one region and endpoint kind, with an optional proxy prefix in front.
#[derive(Clone, Debug, PartialEq)]
pub struct ServiceTarget {
    pub service_type:   String,
    pub region:         String,
    pub endpoint_kind:  EndpointKind,
    pub proxy_prefix:   Option<String>,
}

impl ServiceTarget {
    pub fn new(service_type: &str, region: &str) -> ServiceTarget {
        ServiceTarget { service_type: service_type.to_string(), region: region.to_string(),
                        endpoint_kind: EndpointKind::Public, proxy_prefix: None }
    }

    /// Resolve the service's base url, failing rather than building a broken url
    /// when the session isn't authenticated or the region has no such endpoint.
    pub fn resolve(&self, session: &Session) -> Result<String, StackError> {
        if !session.is_authenticated() {
            return Err(StackError::NotAuthenticated);
        }

        let endpoint = session.endpoint_url(&self.service_type, &self.region, self.endpoint_kind)
            .ok_or_else(|| StackError::ServiceUnavailable { service_type: self.service_type.clone(),
                                                             region: self.region.clone() })?;

        match &self.proxy_prefix {
            Some(prefix) => Ok(format!("{}{}", prefix, endpoint)),
            None => Ok(endpoint)
        }
    }
}

// joins without doubling up or dropping the '/'
pub fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
