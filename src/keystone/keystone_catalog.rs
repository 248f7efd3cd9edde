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

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Network exposure class of an endpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[derive(Copy)]
pub enum EndpointKind {
    #[default]
    Public,
    Internal,
    Admin
}

impl EndpointKind {
    /// Key of the url within a v2 catalog endpoint ("publicURL" etc).
    pub fn v2_key(&self) -> &'static str {
        match self {
            EndpointKind::Public    => "publicURL",
            EndpointKind::Internal  => "internalURL",
            EndpointKind::Admin     => "adminURL",
        }
    }

    /// Value of the `interface` field of a v3 catalog endpoint.
    pub fn interface(&self) -> &'static str {
        match self {
            EndpointKind::Public    => "public",
            EndpointKind::Internal  => "internal",
            EndpointKind::Admin     => "admin",
        }
    }
}

impl fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.v2_key())
    }
}

impl FromStr for EndpointKind {
    type Err = String;

    // accepts both the v2 spelling ("internalURL") and the bare v3 interface name ("internal")
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let interface = s.strip_suffix("URL").unwrap_or(s);
        match interface {
            "public"    => Ok(EndpointKind::Public),
            "internal"  => Ok(EndpointKind::Internal),
            "admin"     => Ok(EndpointKind::Admin),
            _ => Err(format!("Unknown endpoint type: '{}'", s))
        }
    }
}

/// One endpoint of a catalog entry. v2 catalogs carry one url per kind on each
/// endpoint, v3 catalogs carry one endpoint per kind with an `interface` tag.
#[derive(Clone, Debug, Default, PartialEq)]
#[derive(Serialize, Deserialize)]
pub struct Endpoint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region:         Option<String>,

    // v3
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface:      Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url:            Option<String>,

    // v2
    #[serde(rename = "publicURL", default, skip_serializing_if = "Option::is_none")]
    pub public_url:     Option<String>,
    #[serde(rename = "internalURL", default, skip_serializing_if = "Option::is_none")]
    pub internal_url:   Option<String>,
    #[serde(rename = "adminURL", default, skip_serializing_if = "Option::is_none")]
    pub admin_url:      Option<String>,

    #[serde(flatten)]
    pub extra:          BTreeMap<String, Value>,
}

impl Endpoint {
    pub fn v2_url(&self, kind: EndpointKind) -> Option<&str> {
        let url = match kind {
            EndpointKind::Public    => &self.public_url,
            EndpointKind::Internal  => &self.internal_url,
            EndpointKind::Admin     => &self.admin_url,
        };
        url.as_deref()
    }

    pub fn is_in_region(&self, region: &str) -> bool {
        self.region.as_deref() == Some(region)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
#[derive(Serialize, Deserialize)]
pub struct Service {
    #[serde(rename = "type")]
    pub service_type:   String,

    #[serde(default)]
    pub name:           String,

    #[serde(default)]
    pub endpoints:      Vec<Endpoint>,

    #[serde(flatten)]
    pub extra:          BTreeMap<String, Value>,
}

impl Service {
    /// All distinct regions this service has endpoints in, in catalog order.
    pub fn regions(&self) -> Vec<&str> {
        let mut regions: Vec<&str> = Vec::new();
        for endpoint in &self.endpoints {
            if let Some(region) = endpoint.region.as_deref() {
                if !regions.contains(&region) {
                    regions.push(region);
                }
            }
        }
        regions
    }
}
