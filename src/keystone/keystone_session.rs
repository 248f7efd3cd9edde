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

use tracing::{debug, info, warn};

use crate::comm::{Comm, CommRequest, CommResponse, CommError, HttpTransport, UnauthorizedHook};
use crate::comm::get_endpoint_url;
use crate::common::StackError;

use super::keystone_catalog::{Endpoint, EndpointKind, Service};
use super::keystone_common::{AccessInfo, AuthRequest, AuthState, AuthenticationError, ProtocolVersion, Tenant};
use super::keystone_protocol::{IdentityProtocol, protocol_for_version};

/// Identity session against one Keystone endpoint: authentication state, the
/// token and service catalog from the last successful authentication, and the
/// request path every other API call goes through.
///
/// One session per cloud; nothing here is global, so several sessions (against
/// different clouds or as different users) can live side by side.
pub struct Session {
    comm:               Comm,

    base_url:           String,
    admin_url:          Option<String>,

    auth_state:         AuthState,
    protocol:           Box<dyn IdentityProtocol>,

    access:             Option<AccessInfo>,
    token:              Option<String>,

    // the oauth2 token v3 was authenticated with, used for listing organisations
    access_token:       Option<String>,

    recheck_on_unauthorized:    bool,
}

impl Session {
    pub fn new(identity_url: &str, admin_url: Option<&str>, transport: Box<dyn HttpTransport>) -> Session {
        let mut session = Session {
            comm: Comm::new(transport),
            base_url: String::new(),
            admin_url: None,
            auth_state: AuthState::Disconnected,
            protocol: protocol_for_version(ProtocolVersion::V2),
            access: None,
            token: None,
            access_token: None,
            recheck_on_unauthorized: true,
        };
        session.init(identity_url, admin_url);
        session
    }

    /// (Re)initialise against an identity endpoint, dropping any previous
    /// authentication. The protocol version is fixed here from the url.
    pub fn init(&mut self, identity_url: &str, admin_url: Option<&str>) {
        let version = ProtocolVersion::from_identity_url(identity_url);

        self.base_url = identity_url.to_string();
        self.admin_url = admin_url.map(|u| u.to_string());
        self.protocol = protocol_for_version(version);
        self.access = None;
        self.token = None;
        self.access_token = None;
        self.auth_state = AuthState::Disconnected;

        debug!(url = %identity_url, version = %version, "identity session initialised");
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn admin_url(&self) -> Option<&str> {
        self.admin_url.as_deref()
    }

    pub fn auth_state(&self) -> AuthState {
        self.auth_state
    }

    pub fn protocol_version(&self) -> ProtocolVersion {
        self.protocol.version()
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth_state == AuthState::Authenticated
    }

    /// Current bearer token, only while authenticated.
    pub fn token(&self) -> Option<&str> {
        if !self.is_authenticated() {
            return None;
        }
        self.token.as_deref()
    }

    pub fn access_info(&self) -> Option<&AccessInfo> {
        if !self.is_authenticated() {
            return None;
        }
        self.access.as_ref()
    }

    /// Turn the validate-on-401 behaviour of `send()` on or off.
    pub fn set_token_recheck(&mut self, enabled: bool) {
        self.recheck_on_unauthorized = enabled;
    }

    /// Authenticate with either a token or username / password, optionally scoped
    /// to a project. On failure the state becomes `AuthenticationError` and any
    /// previous token / catalog is no longer reported.
    pub fn authenticate(&mut self, request: &AuthRequest) -> Result<&AccessInfo, AuthenticationError> {
        self.auth_state = AuthState::Authenticating;

        let method = if request.token.is_some() { "token" } else { "password" };
        info!(url = %self.base_url, version = %self.protocol.version(), method, "authenticating");

        let comm_request = self.protocol.auth_request(&self.base_url, request);
        let outcome = self.comm.send(&comm_request, None)
                            .and_then(|response| self.protocol.parse_auth_response(response));

        match outcome {
            Ok(access) => {
                self.token = Some(access.token.id.clone());
                self.access_token = if self.protocol.version() == ProtocolVersion::V3 { request.token.clone() } else { None };
                self.auth_state = AuthState::Authenticated;

                info!(expires = access.token.expires.as_deref().unwrap_or("unknown"),
                      services = access.service_catalog.len(), "authenticated");

                Ok(&*self.access.insert(access))
            },
            Err(cause) => {
                self.auth_state = AuthState::AuthenticationError;
                self.token = None;
                self.access = None;
                self.access_token = None;

                warn!(error = %cause, "authentication failed");

                Err(AuthenticationError { state: self.auth_state, cause })
            }
        }
    }

    /// Ask the identity service whether the current token is still valid.
    pub fn validate_token(&self) -> Result<CommResponse, StackError> {
        let token = self.token.as_deref().ok_or(StackError::NotAuthenticated)?;

        let request = self.protocol.validate_request(&self.base_url, token);
        let response = self.comm.send(&request, None)?;
        Ok(response)
    }

    /// First catalog entry of the given type, only while authenticated.
    pub fn get_service(&self, service_type: &str) -> Option<&Service> {
        self.get_service_catalog()?
            .iter()
            .find(|service| service.service_type == service_type)
    }

    pub fn get_service_catalog(&self) -> Option<&[Service]> {
        self.access_info().map(|access| access.service_catalog.as_slice())
    }

    /// First endpoint of the service type in the region, whatever its kind.
    pub fn get_endpoint(&self, region: &str, service_type: &str) -> Option<&Endpoint> {
        self.get_service(service_type)?
            .endpoints
            .iter()
            .find(|endpoint| endpoint.is_in_region(region))
    }

    pub fn endpoint_url(&self, service_type: &str, region: &str, kind: EndpointKind) -> Option<String> {
        let service = self.get_service(service_type)?;
        get_endpoint_url(service, region, kind, self.protocol.version())
    }

    /// Tenants (v2) or organisations (v3) visible to the current user, from the
    /// public identity url or from the admin url.
    pub fn list_tenants(&self, admin: bool) -> Result<Vec<Tenant>, StackError> {
        let url = if admin {
            self.admin_url.as_deref().ok_or_else(|| StackError::Config("no admin url configured".to_string()))?
        }
        else {
            self.base_url.as_str()
        };

        let token = self.access_token.as_deref()
                        .or(self.token.as_deref())
                        .ok_or(StackError::NotAuthenticated)?;

        let request = self.protocol.tenants_request(url, token);
        let response = self.send(&request)?;
        let tenants = self.protocol.parse_tenants(response)?;
        Ok(tenants)
    }

    /// Send a request on behalf of this session. A 401 response triggers a
    /// token validation whose outcome is only logged; the 401 is returned as is.
    pub fn send(&self, request: &CommRequest) -> Result<CommResponse, CommError> {
        let hook: Option<&dyn UnauthorizedHook> = if self.recheck_on_unauthorized { Some(self) } else { None };
        self.comm.send(request, hook)
    }
}

impl UnauthorizedHook for Session {
    fn on_unauthorized(&self, request: &CommRequest) {
        warn!(url = %request.url, "unauthorized response, checking token with keystone...");

        match self.validate_token() {
            Ok(_) => {
                warn!("token is valid, possibly an issue with the service's own authentication");
            },
            Err(e) => {
                warn!(error = %e, "token is no longer valid");
            }
        }
    }
}
