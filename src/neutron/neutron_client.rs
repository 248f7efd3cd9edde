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

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::comm::{CommRequest, CommResponse};
use crate::common::StackError;
use crate::keystone::{EndpointKind, Session};
use crate::service_target::{ServiceTarget, join_url};

pub const NETWORK_SERVICE_TYPE: &str = "network";

// neutron endpoints in the catalog don't include the api version
const API_VERSION_PATH: &str = "v2.0";

#[derive(Clone, Debug, PartialEq)]
#[derive(Serialize, Deserialize)]
pub struct Network {
    pub id:                 String,
    #[serde(default)]
    pub name:               String,
    #[serde(default)]
    pub status:             Option<String>,
    #[serde(default)]
    pub shared:             bool,
    #[serde(rename = "router:external", default)]
    pub external:           bool,
    #[serde(default)]
    pub subnets:            Vec<String>,
    #[serde(default)]
    pub tenant_id:          Option<String>,

    #[serde(flatten)]
    pub extra:              BTreeMap<String, Value>,
}

#[derive(Deserialize)]
struct NetworkList {
    networks:   Vec<Network>,
}

#[derive(Clone, Debug, PartialEq)]
#[derive(Serialize, Deserialize)]
pub struct Subnet {
    pub id:             String,
    #[serde(default)]
    pub name:           String,
    pub network_id:     String,
    #[serde(default)]
    pub cidr:           Option<String>,
    #[serde(default)]
    pub ip_version:     Option<u8>,

    #[serde(flatten)]
    pub extra:          BTreeMap<String, Value>,
}

#[derive(Deserialize)]
struct SubnetList {
    subnets:    Vec<Subnet>,
}

/// Networking API calls for one region.
pub struct Neutron<'a> {
    session:    &'a Session,
    target:     ServiceTarget,
}

impl<'a> Neutron<'a> {
    pub fn new(session: &'a Session, region: &str) -> Neutron<'a> {
        Neutron { session, target: ServiceTarget::new(NETWORK_SERVICE_TYPE, region) }
    }

    pub fn configure(mut self, endpoint_kind: EndpointKind) -> Neutron<'a> {
        self.target.endpoint_kind = endpoint_kind;
        self
    }

    pub fn with_proxy_prefix(mut self, prefix: Option<&str>) -> Neutron<'a> {
        self.target.proxy_prefix = prefix.map(|p| p.to_string());
        self
    }

    fn get(&self, resource: &str) -> Result<CommResponse, StackError> {
        let base = self.target.resolve(self.session)?;
        let url = join_url(&join_url(&base, API_VERSION_PATH), resource);
        let request = CommRequest::get(&url).with_token(self.session.token());
        Ok(self.session.send(&request)?)
    }

    pub fn list_networks(&self) -> Result<Vec<Network>, StackError> {
        let list: NetworkList = self.get("networks")?.parse()?;
        Ok(list.networks)
    }

    pub fn list_subnets(&self) -> Result<Vec<Subnet>, StackError> {
        let list: SubnetList = self.get("subnets")?.parse()?;
        Ok(list.subnets)
    }
}
