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

use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

#[derive(Clone, Debug, PartialEq)]
#[derive(Serialize, Deserialize)]
pub struct Flavor {
    pub id:         String,
    pub name:       String,
    #[serde(default)]
    pub ram:        Option<u64>,
    #[serde(default)]
    pub vcpus:      Option<u32>,
    #[serde(default)]
    pub disk:       Option<u64>,
}

#[derive(Deserialize)]
pub(crate) struct FlavorList {
    pub flavors:    Vec<Flavor>,
}

#[derive(Deserialize)]
pub(crate) struct FlavorDetail {
    pub flavor:     Flavor,
}

#[derive(Clone, Debug, PartialEq)]
#[derive(Serialize, Deserialize)]
pub struct SecurityGroup {
    // nova-network used integer ids, neutron-backed nova uses uuids
    pub id:             Value,
    pub name:           String,
    #[serde(default)]
    pub description:    Option<String>,
    #[serde(default)]
    pub rules:          Vec<Value>,
}

#[derive(Deserialize)]
pub(crate) struct SecurityGroupList {
    pub security_groups:    Vec<SecurityGroup>,
}

#[derive(Clone, Debug, PartialEq)]
#[derive(Serialize, Deserialize)]
pub struct FloatingIpPool {
    pub name:       String,
}

#[derive(Deserialize)]
pub(crate) struct FloatingIpPoolList {
    pub floating_ip_pools:  Vec<FloatingIpPool>,
}

#[derive(Clone, Debug, PartialEq)]
#[derive(Serialize, Deserialize)]
pub struct Keypair {
    pub name:           String,
    #[serde(default)]
    pub fingerprint:    Option<String>,
    #[serde(default)]
    pub public_key:     Option<String>,
}

#[derive(Deserialize)]
struct KeypairEntry {
    keypair:    Keypair,
}

// nova wraps each entry of the list in its own object
#[derive(Deserialize)]
pub(crate) struct KeypairList {
    keypairs:   Vec<KeypairEntry>,
}

impl KeypairList {
    pub fn into_keypairs(self) -> Vec<Keypair> {
        self.keypairs.into_iter().map(|k| k.keypair).collect()
    }
}

#[derive(Clone, Debug, PartialEq)]
#[derive(Serialize, Deserialize)]
pub struct Server {
    pub id:         String,
    #[serde(default)]
    pub name:       String,
    #[serde(default)]
    pub status:     Option<String>,
    #[serde(default)]
    pub addresses:  Option<Value>,

    #[serde(flatten)]
    pub extra:      BTreeMap<String, Value>,
}

impl Server {
    /// First fixed or floating IPv4 address of the requested type ("fixed"/"floating").
    pub fn ipv4_address(&self, address_type: &str) -> Option<String> {
        let networks = self.addresses.as_ref()?.as_object()?;
        for addresses in networks.values() {
            for address in addresses.as_array()? {
                let version = address.get("version").and_then(|v| v.as_u64()).unwrap_or(4);
                let ttype = address.get("OS-EXT-IPS:type").and_then(|v| v.as_str()).unwrap_or("fixed");
                if version == 4 && ttype == address_type {
                    if let Some(addr) = address.get("addr").and_then(|v| v.as_str()) {
                        return Some(addr.to_string());
                    }
                }
            }
        }

        None
    }
}

#[derive(Deserialize)]
pub(crate) struct ServerList {
    pub servers:    Vec<Server>,
}

#[derive(Deserialize)]
pub(crate) struct ServerDetail {
    pub server:     Server,
}

/// Response to a server creation: the new id, and the generated admin
/// password if the cloud hands one back.
#[derive(Clone, Debug, PartialEq)]
#[derive(Serialize, Deserialize)]
pub struct CreatedServer {
    pub id:             String,
    #[serde(rename = "adminPass", default)]
    pub admin_pass:     Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct CreatedServerResponse {
    pub server:     CreatedServer,
}

/// Parameters for creating a server. Only name, image and flavor are required.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ServerCreate {
    pub name:                   String,
    pub image_ref:              String,
    pub flavor_ref:             String,
    pub key_name:               Option<String>,
    pub user_data:              Option<String>,
    pub security_groups:        Vec<String>,
    pub min_count:              Option<u32>,
    pub max_count:              Option<u32>,
    pub availability_zone:      Option<String>,
    // network uuids
    pub networks:               Vec<String>,
    pub block_device_mapping:   Option<Value>,
    pub metadata:               BTreeMap<String, String>,
}

impl ServerCreate {
    pub fn new(name: &str, image_ref: &str, flavor_ref: &str) -> ServerCreate {
        ServerCreate { name: name.to_string(), image_ref: image_ref.to_string(), flavor_ref: flavor_ref.to_string(),
                       ..Default::default() }
    }

    /// Booting from a volume goes to a different resource.
    pub fn resource_path(&self) -> &'static str {
        if self.block_device_mapping.is_some() {
            "os-volumes_boot"
        }
        else {
            "servers"
        }
    }

    pub fn to_json(&self) -> Value {
        let mut server = Map::new();
        server.insert("name".to_string(), json!(self.name));
        server.insert("imageRef".to_string(), json!(self.image_ref));
        server.insert("flavorRef".to_string(), json!(self.flavor_ref));

        if !self.metadata.is_empty() {
            server.insert("metadata".to_string(), json!(self.metadata));
        }

        if let Some(key_name) = &self.key_name {
            server.insert("key_name".to_string(), json!(key_name));
        }

        // nova wants user data base64 encoded
        if let Some(user_data) = &self.user_data {
            let encoded = base64::engine::general_purpose::STANDARD.encode(user_data.as_bytes());
            server.insert("user_data".to_string(), json!(encoded));
        }

        if let Some(mapping) = &self.block_device_mapping {
            server.insert("block_device_mapping".to_string(), mapping.clone());
        }

        if !self.security_groups.is_empty() {
            let groups: Vec<Value> = self.security_groups.iter().map(|name| json!({ "name": name })).collect();
            server.insert("security_groups".to_string(), Value::Array(groups));
        }

        server.insert("min_count".to_string(), json!(self.min_count.unwrap_or(1)));
        server.insert("max_count".to_string(), json!(self.max_count.unwrap_or(1)));

        if let Some(zone) = &self.availability_zone {
            server.insert("availability_zone".to_string(), json!(zone));
        }

        if !self.networks.is_empty() {
            let networks: Vec<Value> = self.networks.iter().map(|uuid| json!({ "uuid": uuid })).collect();
            server.insert("networks".to_string(), Value::Array(networks));
        }

        json!({ "server": server })
    }
}
