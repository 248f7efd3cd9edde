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

use serde::de::DeserializeOwned;
use tracing::info;

use crate::comm::CommRequest;
use crate::common::StackError;
use crate::keystone::{EndpointKind, Session};
use crate::service_target::{ServiceTarget, join_url};

use super::nova_common::{CreatedServer, CreatedServerResponse, Flavor, FlavorDetail, FlavorList};
use super::nova_common::{FloatingIpPool, FloatingIpPoolList, Keypair, KeypairList, SecurityGroup, SecurityGroupList};
use super::nova_common::{Server, ServerCreate, ServerDetail, ServerList};

pub const COMPUTE_SERVICE_TYPE: &str = "compute";

/// Compute API calls for one region, made with the session's current token.
pub struct Nova<'a> {
    session:    &'a Session,
    target:     ServiceTarget,
}

impl<'a> Nova<'a> {
    pub fn new(session: &'a Session, region: &str) -> Nova<'a> {
        Nova { session, target: ServiceTarget::new(COMPUTE_SERVICE_TYPE, region) }
    }

    pub fn configure(mut self, endpoint_kind: EndpointKind) -> Nova<'a> {
        self.target.endpoint_kind = endpoint_kind;
        self
    }

    pub fn with_proxy_prefix(mut self, prefix: Option<&str>) -> Nova<'a> {
        self.target.proxy_prefix = prefix.map(|p| p.to_string());
        self
    }

    fn url(&self, path: &str) -> Result<String, StackError> {
        let base = self.target.resolve(self.session)?;
        Ok(join_url(&base, path))
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, StackError> {
        let request = CommRequest::get(&self.url(path)?).with_token(self.session.token());
        let response = self.session.send(&request)?;
        Ok(response.parse()?)
    }

    pub fn list_flavors(&self, detailed: bool) -> Result<Vec<Flavor>, StackError> {
        let path = if detailed { "flavors/detail" } else { "flavors" };
        let list: FlavorList = self.get(path)?;
        Ok(list.flavors)
    }

    pub fn get_flavor(&self, id: &str) -> Result<Flavor, StackError> {
        let detail: FlavorDetail = self.get(&format!("flavors/{}", id))?;
        Ok(detail.flavor)
    }

    pub fn list_security_groups(&self) -> Result<Vec<SecurityGroup>, StackError> {
        let list: SecurityGroupList = self.get("os-security-groups")?;
        Ok(list.security_groups)
    }

    pub fn list_floating_ip_pools(&self) -> Result<Vec<FloatingIpPool>, StackError> {
        let list: FloatingIpPoolList = self.get("os-floating-ip-pools")?;
        Ok(list.floating_ip_pools)
    }

    pub fn list_keypairs(&self) -> Result<Vec<Keypair>, StackError> {
        let list: KeypairList = self.get("os-keypairs")?;
        Ok(list.into_keypairs())
    }

    pub fn list_servers(&self, detailed: bool) -> Result<Vec<Server>, StackError> {
        let path = if detailed { "servers/detail" } else { "servers" };
        let list: ServerList = self.get(path)?;
        Ok(list.servers)
    }

    pub fn get_server(&self, id: &str) -> Result<Server, StackError> {
        let detail: ServerDetail = self.get(&format!("servers/{}", id))?;
        Ok(detail.server)
    }

    pub fn create_server(&self, params: &ServerCreate) -> Result<CreatedServer, StackError> {
        let url = self.url(params.resource_path())?;
        let request = CommRequest::post(&url, params.to_json()).with_token(self.session.token());
        let response = self.session.send(&request)?;
        let created: CreatedServerResponse = response.parse()?;

        info!(id = %created.server.id, name = %params.name, region = %self.target.region, "server created");

        Ok(created.server)
    }

    pub fn delete_server(&self, id: &str) -> Result<(), StackError> {
        let request = CommRequest::delete(&self.url(&format!("servers/{}", id))?).with_token(self.session.token());
        self.session.send(&request)?;

        info!(id = %id, region = %self.target.region, "server deletion requested");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::comm::comm_common::HttpResponse;
    use crate::comm::comm_transport::scripted::ScriptedTransport;
    use crate::comm::HttpMethod;
    use crate::keystone::AuthRequest;

    fn authenticated_session() -> (Session, ScriptedTransport) {
        let script = ScriptedTransport::new();
        let mut session = Session::new("http://keystone/v2.0/", None, Box::new(script.clone()));
        script.push_json(200, &json!({"access": {
            "token": {"id": "tok1"},
            "serviceCatalog": [{"type": "compute", "endpoints": [
                {"region": "Spain2", "publicURL": "http://nova:8774/v2/t1", "internalURL": "http://nova-int:8774/v2/t1"}]}]}}));
        session.authenticate(&AuthRequest::password("alice", "secret")).unwrap();
        (session, script)
    }

    #[test]
    fn test_list_flavors() {
        let (session, script) = authenticated_session();
        script.push_json(200, &json!({"flavors": [{"id": "1", "name": "m1.tiny", "ram": 512, "vcpus": 1, "disk": 1}]}));

        let flavors = Nova::new(&session, "Spain2").list_flavors(true).unwrap();
        assert_eq!(flavors.len(), 1);
        assert_eq!(flavors[0].name, "m1.tiny");
        assert_eq!(flavors[0].ram, Some(512));

        let sent = script.sent();
        assert_eq!(sent[1].url, "http://nova:8774/v2/t1/flavors/detail");
        assert_eq!(sent[1].header("X-Auth-Token"), Some("tok1"));
    }

    #[test]
    fn test_get_flavor() {
        let (session, script) = authenticated_session();
        script.push_json(200, &json!({"flavor": {"id": "2", "name": "m1.small", "ram": 2048, "vcpus": 1, "disk": 20}}));

        let flavor = Nova::new(&session, "Spain2").get_flavor("2").unwrap();
        assert_eq!(flavor.name, "m1.small");
        assert_eq!(flavor.disk, Some(20));
        assert_eq!(script.sent()[1].url, "http://nova:8774/v2/t1/flavors/2");
    }

    #[test]
    fn test_endpoint_kind_and_proxy() {
        let (session, script) = authenticated_session();
        script.push_json(200, &json!({"floating_ip_pools": [{"name": "public-ext-net-01"}]}));

        let nova = Nova::new(&session, "Spain2")
                        .configure(EndpointKind::Internal)
                        .with_proxy_prefix(Some("https://rancher.example/v2-beta/proxy/"));
        let pools = nova.list_floating_ip_pools().unwrap();
        assert_eq!(pools[0].name, "public-ext-net-01");

        assert_eq!(script.sent()[1].url, "https://rancher.example/v2-beta/proxy/http://nova-int:8774/v2/t1/os-floating-ip-pools");
    }

    #[test]
    fn test_unknown_region_is_an_error() {
        let (session, script) = authenticated_session();

        let res = Nova::new(&session, "Nowhere").list_keypairs();
        assert!(matches!(res, Err(StackError::ServiceUnavailable { .. })));
        // nothing sent past the authentication
        assert_eq!(script.sent_count(), 1);
    }

    #[test]
    fn test_not_authenticated() {
        let script = ScriptedTransport::new();
        let session = Session::new("http://keystone/v2.0/", None, Box::new(script.clone()));

        assert!(matches!(Nova::new(&session, "Spain2").list_servers(false), Err(StackError::NotAuthenticated)));
        assert_eq!(script.sent_count(), 0);
    }

    #[test]
    fn test_create_and_delete_server() {
        let (session, script) = authenticated_session();
        script.push_json(202, &json!({"server": {"id": "s1", "adminPass": "pw", "links": []}}));
        script.push(HttpResponse::new(204, ""));

        let nova = Nova::new(&session, "Spain2");
        let created = nova.create_server(&ServerCreate::new("node1", "img", "2")).unwrap();
        assert_eq!(created.id, "s1");
        assert_eq!(created.admin_pass.as_deref(), Some("pw"));

        nova.delete_server("s1").unwrap();

        let sent = script.sent();
        assert_eq!(sent[1].method, HttpMethod::Post);
        assert_eq!(sent[1].url, "http://nova:8774/v2/t1/servers");
        assert_eq!(sent[2].method, HttpMethod::Delete);
        assert_eq!(sent[2].url, "http://nova:8774/v2/t1/servers/s1");
    }

    #[test]
    fn test_service_error_passed_through() {
        let (session, script) = authenticated_session();
        script.push(HttpResponse::new(404, "itemNotFound"));

        let res = Nova::new(&session, "Spain2").get_server("missing");
        match res {
            Err(StackError::Comm(e)) => assert_eq!(e.status(), Some(404)),
            _ => panic!("expected a 404 error")
        }
    }
}
