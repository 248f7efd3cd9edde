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

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::comm::CommError;
use super::keystone_catalog::Service;

#[derive(Clone, Debug, PartialEq, Eq)]
#[derive(Copy)]
pub enum AuthState {
    Disconnected,
    Authenticating,
    Authenticated,
    AuthenticationError
}

impl AuthState {
    /// Numeric state codes, as reported to front ends.
    pub fn code(&self) -> u8 {
        match self {
            AuthState::Disconnected         => 0,
            AuthState::Authenticating       => 1,
            AuthState::Authenticated        => 2,
            AuthState::AuthenticationError  => 3,
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            AuthState::Disconnected         => "Disconnected",
            AuthState::Authenticating       => "Authenticating",
            AuthState::Authenticated        => "Authenticated",
            AuthState::AuthenticationError  => "(401) Unauthorized",
        }
    }
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[derive(Copy)]
pub enum ProtocolVersion {
    V2,
    V3
}

impl ProtocolVersion {
    pub fn from_identity_url(url: &str) -> ProtocolVersion {
        if url.contains("v3") {
            ProtocolVersion::V3
        }
        else {
            ProtocolVersion::V2
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolVersion::V2 => write!(f, "v2"),
            ProtocolVersion::V3 => write!(f, "v3"),
        }
    }
}

/// Credentials for one `authenticate()` call. If a token is set it's used in
/// preference to the username / password.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AuthRequest {
    pub username:       Option<String>,
    pub password:       Option<String>,
    pub token:          Option<String>,
    pub project_id:     Option<String>,
}

impl AuthRequest {
    pub fn password(username: &str, password: &str) -> AuthRequest {
        AuthRequest { username: Some(username.to_string()), password: Some(password.to_string()),
                      ..Default::default() }
    }

    pub fn token(token: &str) -> AuthRequest {
        AuthRequest { token: Some(token.to_string()), ..Default::default() }
    }

    pub fn with_project(mut self, project_id: &str) -> AuthRequest {
        self.project_id = Some(project_id.to_string());
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
#[derive(Serialize, Deserialize)]
pub struct TenantRef {
    pub id:         String,
    #[serde(default)]
    pub name:       String,
}

#[derive(Clone, Debug, Default, PartialEq)]
#[derive(Serialize, Deserialize)]
pub struct TokenInfo {
    pub id:         String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires:    Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant:     Option<TenantRef>,
}

#[derive(Clone, Debug, Default, PartialEq)]
#[derive(Serialize, Deserialize)]
pub struct Role {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id:         Option<String>,
    pub name:       String,

    #[serde(flatten)]
    pub extra:      BTreeMap<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq)]
#[derive(Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(default)]
    pub id:         String,
    #[serde(default)]
    pub name:       String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles:      Vec<Role>,

    #[serde(flatten)]
    pub extra:      BTreeMap<String, Value>,
}

/// Normalised result of a successful authentication, in the v2 `access` layout
/// whichever protocol version produced it.
#[derive(Clone, Debug, Default, PartialEq)]
#[derive(Serialize, Deserialize)]
pub struct AccessInfo {
    pub token:              TokenInfo,
    #[serde(rename = "serviceCatalog", default)]
    pub service_catalog:    Vec<Service>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user:               Option<UserInfo>,

    // v3 puts the roles of a scoped token on the token, not on the user
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles:              Vec<Role>,
}

impl AccessInfo {
    /// Roles of the user: from the user object (v2) or from the token (v3).
    pub fn roles(&self) -> &[Role] {
        match &self.user {
            Some(user) if !user.roles.is_empty() => &user.roles,
            _ => &self.roles
        }
    }
}

/// Tenant (v2) / project or organisation (v3) the user has access to.
#[derive(Clone, Debug, Default, PartialEq)]
#[derive(Serialize, Deserialize)]
pub struct Tenant {
    pub id:             String,
    #[serde(default)]
    pub name:           String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description:    Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled:        Option<bool>,
    // FIWARE Lab marks the tenants which can actually run instances
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_cloud_project:   Option<bool>,

    #[serde(flatten)]
    pub extra:          BTreeMap<String, Value>,
}

/// A failed `authenticate()` call. `state` is the session state the failure
/// left behind, which is always `AuthState::AuthenticationError`.
#[derive(Error, Clone, Debug, PartialEq)]
#[error("authentication failed, state {state} ({}): {cause}", .state.describe())]
pub struct AuthenticationError {
    pub state:  AuthState,
    #[source]
    pub cause:  CommError,
}
