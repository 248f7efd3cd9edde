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

use serde::Deserialize;
use serde_json::{json, Value};

use crate::comm::{CommError, CommRequest, CommResponse};
use crate::comm::comm_common::{HEADER_SUBJECT_TOKEN};

use super::keystone_catalog::Service;
use super::keystone_common::{AccessInfo, AuthRequest, ProtocolVersion, Role, Tenant, TenantRef, TokenInfo, UserInfo};

// v3 password authentication is always against this user domain
pub const DEFAULT_USER_DOMAIN: &str = "default";

/// The parts of the identity API which differ between protocol versions.
/// One implementation is picked when a session is initialised.
pub trait IdentityProtocol {
    fn version(&self) -> ProtocolVersion;

    // relative to the identity base url
    fn auth_path(&self) -> &'static str;

    fn build_credentials(&self, request: &AuthRequest) -> Value;

    fn parse_auth_response(&self, response: CommResponse) -> Result<AccessInfo, CommError>;

    fn validate_request(&self, base_url: &str, token: &str) -> CommRequest;

    fn tenants_request(&self, base_url: &str, token: &str) -> CommRequest;

    fn parse_tenants(&self, response: CommResponse) -> Result<Vec<Tenant>, CommError>;

    fn auth_request(&self, base_url: &str, request: &AuthRequest) -> CommRequest {
        let url = format!("{}{}", base_url, self.auth_path());
        // a 401 here just means bad credentials, there's no token to re-check yet
        CommRequest::post(&url, self.build_credentials(request)).skip_token_recheck()
    }
}

pub fn protocol_for_version(version: ProtocolVersion) -> Box<dyn IdentityProtocol> {
    match version {
        ProtocolVersion::V2 => Box::new(IdentityV2 {}),
        ProtocolVersion::V3 => Box::new(IdentityV3 {}),
    }
}

fn malformed(response: &CommResponse, detail: &str) -> CommError {
    CommError::MalformedBody { status: response.status, detail: detail.to_string() }
}

pub struct IdentityV2 {

}

#[derive(Deserialize)]
struct V2AuthResponse {
    access:     AccessInfo,
}

#[derive(Deserialize)]
struct V2TenantList {
    #[serde(default)]
    tenants:    Vec<Tenant>,
}

impl IdentityProtocol for IdentityV2 {
    fn version(&self) -> ProtocolVersion {
        ProtocolVersion::V2
    }

    fn auth_path(&self) -> &'static str {
        "tokens"
    }

    fn build_credentials(&self, request: &AuthRequest) -> Value {
        let mut credentials = if let Some(token) = &request.token {
            json!({
                "auth": {
                    "token": {
                        "id": token
                    }
                }
            })
        }
        else {
            json!({
                "auth": {
                    "passwordCredentials": {
                        "username": request.username.as_deref().unwrap_or(""),
                        "password": request.password.as_deref().unwrap_or(""),
                    }
                }
            })
        };

        if let Some(project_id) = &request.project_id {
            credentials["auth"]["tenantId"] = json!(project_id);
        }

        credentials
    }

    fn parse_auth_response(&self, response: CommResponse) -> Result<AccessInfo, CommError> {
        let parsed: V2AuthResponse = response.parse()?;
        Ok(parsed.access)
    }

    fn validate_request(&self, base_url: &str, token: &str) -> CommRequest {
        CommRequest::get(&format!("{}tokens/{}", base_url, token))
            .with_token(Some(token))
            .skip_token_recheck()
    }

    fn tenants_request(&self, base_url: &str, token: &str) -> CommRequest {
        CommRequest::get(&format!("{}tenants", base_url)).with_token(Some(token))
    }

    fn parse_tenants(&self, response: CommResponse) -> Result<Vec<Tenant>, CommError> {
        let parsed: V2TenantList = response.parse()?;
        Ok(parsed.tenants)
    }
}

pub struct IdentityV3 {

}

#[derive(Deserialize)]
struct V3Project {
    id:     String,
    #[serde(default)]
    name:   String,
}

#[derive(Deserialize)]
struct V3Token {
    #[serde(default)]
    expires_at:     Option<String>,
    #[serde(default)]
    project:        Option<V3Project>,
    #[serde(default)]
    catalog:        Vec<Service>,
    #[serde(default)]
    user:           Option<UserInfo>,
    #[serde(default)]
    roles:          Vec<Role>,
}

#[derive(Deserialize)]
struct V3AuthResponse {
    token:      V3Token,
}

#[derive(Deserialize)]
struct V3OrganizationList {
    #[serde(default)]
    organizations:  Vec<Tenant>,
}

impl IdentityProtocol for IdentityV3 {
    fn version(&self) -> ProtocolVersion {
        ProtocolVersion::V3
    }

    fn auth_path(&self) -> &'static str {
        "auth/tokens"
    }

    fn build_credentials(&self, request: &AuthRequest) -> Value {
        let mut credentials = if let Some(token) = &request.token {
            json!({
                "auth": {
                    "identity": {
                        "methods": ["oauth2"],
                        "oauth2": {
                            "access_token_id": token
                        }
                    }
                }
            })
        }
        else {
            json!({
                "auth": {
                    "identity": {
                        "methods": ["password"],
                        "password": {
                            "user": {
                                "name": request.username.as_deref().unwrap_or(""),
                                "domain": { "id": DEFAULT_USER_DOMAIN },
                                "password": request.password.as_deref().unwrap_or(""),
                            }
                        }
                    }
                }
            })
        };

        if let Some(project_id) = &request.project_id {
            credentials["auth"]["scope"] = json!({ "project": { "id": project_id } });
        }

        credentials
    }

    // The token itself only comes back in the X-Subject-Token header, the body
    // has everything else, so the two get stitched together into the v2 layout.
    fn parse_auth_response(&self, response: CommResponse) -> Result<AccessInfo, CommError> {
        let token_id = match &response.subject_token {
            Some(token) if !token.is_empty() => token.clone(),
            _ => {
                return Err(malformed(&response, &format!("missing {} header", HEADER_SUBJECT_TOKEN)));
            }
        };

        let parsed: V3AuthResponse = response.parse()?;
        let token = parsed.token;

        Ok(AccessInfo {
            token: TokenInfo {
                id: token_id,
                expires: token.expires_at,
                tenant: token.project.map(|p| TenantRef { id: p.id, name: p.name }),
            },
            service_catalog: token.catalog,
            user: token.user,
            roles: token.roles,
        })
    }

    fn validate_request(&self, base_url: &str, token: &str) -> CommRequest {
        CommRequest::get(&format!("{}auth/tokens", base_url))
            .with_token(Some(token))
            .with_header(HEADER_SUBJECT_TOKEN, token)
            .skip_token_recheck()
    }

    // the FIWARE identity manager keys this on the oauth2 access token, in the path
    fn tenants_request(&self, base_url: &str, token: &str) -> CommRequest {
        CommRequest::get(&format!("{}authorized_organizations/{}", base_url, token))
    }

    fn parse_tenants(&self, response: CommResponse) -> Result<Vec<Tenant>, CommError> {
        let parsed: V3OrganizationList = response.parse()?;
        Ok(parsed.organizations)
    }
}
