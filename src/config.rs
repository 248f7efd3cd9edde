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
use std::path::Path;

use crate::common::StackError;
use crate::keystone::{AuthRequest, EndpointKind};
use crate::params::Params;

// value meaning "ask for it interactively"
pub const PROMPT_VALUE: &str = "$PROMPT";

/// Connection settings for one cloud.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StackConfig {
    pub auth_url:       String,
    // v3 identity url for project-scoped logins, when auth_url is a v2 one
    pub auth_url_v3:    Option<String>,
    pub admin_url:      Option<String>,
    pub username:       Option<String>,
    pub password:       Option<String>,
    pub token:          Option<String>,
    pub project_id:     Option<String>,
    pub region:         Option<String>,
    // prepended to the identity url and to every service endpoint
    pub proxy_prefix:   Option<String>,
    pub endpoint_kind:  EndpointKind,
}

// (env variable, file key)
const SETTINGS: &[(&str, &str)] = &[
    ("FIWARE_AUTH_URL",         "auth_url"),
    ("FIWARE_AUTH_URL_V3",      "auth_url_v3"),
    ("FIWARE_ADMIN_URL",        "admin_url"),
    ("FIWARE_USERNAME",         "username"),
    ("FIWARE_PASSWORD",         "password"),
    ("FIWARE_TOKEN",            "token"),
    ("FIWARE_PROJECT_ID",       "project_id"),
    ("FIWARE_REGION",           "region"),
    ("FIWARE_PROXY_PREFIX",     "proxy_prefix"),
    ("FIWARE_ENDPOINT_TYPE",    "endpoint_type"),
];

impl StackConfig {
    /// Configure from `FIWARE_*` environment variables. `FIWARE_AUTH_URL` is required.
    pub fn from_env() -> Result<StackConfig, StackError> {
        let mut values = BTreeMap::new();
        for (env_name, key) in SETTINGS {
            if let Ok(value) = std::env::var(env_name) {
                values.insert(key.to_string(), value);
            }
        }

        StackConfig::from_values(&values)
    }

    pub fn from_file(path: &Path) -> Result<StackConfig, StackError> {
        let params = Params::from_yaml_file(path)?;
        StackConfig::from_params(&params)
    }

    pub fn from_params(params: &Params) -> Result<StackConfig, StackError> {
        let mut values = BTreeMap::new();
        for (_env_name, key) in SETTINGS {
            if let Some(value) = params.get_string_or_int_value_as_string(key) {
                values.insert(key.to_string(), value);
            }
        }

        StackConfig::from_values(&values)
    }

    fn from_values(values: &BTreeMap<String, String>) -> Result<StackConfig, StackError> {
        let get = |key: &str| -> Option<String> {
            values.get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
        };

        let auth_url = get("auth_url")
            .ok_or_else(|| StackError::Config("no identity url set (FIWARE_AUTH_URL / auth_url)".to_string()))?;

        let endpoint_kind = match get("endpoint_type") {
            Some(kind) => kind.parse().map_err(StackError::Config)?,
            None => EndpointKind::Public
        };

        Ok(StackConfig {
            auth_url: ensure_trailing_slash(&auth_url),
            auth_url_v3: get("auth_url_v3").map(|u| ensure_trailing_slash(&u)),
            admin_url: get("admin_url").map(|u| ensure_trailing_slash(&u)),
            username: get("username"),
            password: get("password"),
            token: get("token"),
            project_id: get("project_id"),
            region: get("region"),
            proxy_prefix: get("proxy_prefix"),
            endpoint_kind,
        })
    }

    /// Identity url as the session should see it, i.e. behind the proxy if there is one.
    pub fn identity_url(&self) -> String {
        self.with_proxy(&self.auth_url)
    }

    /// Identity url for the project-scoped login: the v3 url if one is set.
    pub fn scoped_identity_url(&self) -> String {
        match &self.auth_url_v3 {
            Some(url) => self.with_proxy(url),
            None => self.identity_url()
        }
    }

    pub fn identity_admin_url(&self) -> Option<String> {
        self.admin_url.as_ref().map(|url| self.with_proxy(url))
    }

    fn with_proxy(&self, url: &str) -> String {
        match &self.proxy_prefix {
            Some(prefix) => format!("{}{}", prefix, url),
            None => url.to_string()
        }
    }

    pub fn needs_password_prompt(&self) -> bool {
        self.token.is_none() && self.username.is_some() &&
            (self.password.is_none() || self.password.as_deref() == Some(PROMPT_VALUE))
    }

    /// Credentials for `Session::authenticate()`: a token if one is configured,
    /// otherwise username / password.
    pub fn auth_request(&self) -> Result<AuthRequest, StackError> {
        let request = if let Some(token) = &self.token {
            AuthRequest::token(token)
        }
        else {
            match (&self.username, &self.password) {
                (Some(username), Some(password)) if password != PROMPT_VALUE => AuthRequest::password(username, password),
                _ => {
                    return Err(StackError::Config("no credentials configured: need a token, or a username and password".to_string()));
                }
            }
        };

        Ok(match &self.project_id {
            Some(project_id) => request.with_project(project_id),
            None => request
        })
    }
}

// endpoint paths are appended straight onto the identity url
fn ensure_trailing_slash(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    }
    else {
        format!("{}/", url)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn values(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_default_endpoint_kind() {
        assert_eq!(StackConfig::default().endpoint_kind, EndpointKind::Public);

        let config = StackConfig::from_values(&values(&[("auth_url", "http://keystone/v2.0")])).unwrap();
        assert_eq!(config.endpoint_kind, EndpointKind::Public);
        assert_eq!(config.scoped_identity_url(), "http://keystone/v2.0/");
    }

    #[test]
    fn test_scoped_identity_url() {
        let config = StackConfig::from_values(&values(&[
            ("auth_url", "http://keystone:4730/v2.0/"),
            ("auth_url_v3", "http://keystone:4730/v3"),
            ("proxy_prefix", "https://rancher.example/v2-beta/proxy/"),
        ])).unwrap();

        assert_eq!(config.scoped_identity_url(), "https://rancher.example/v2-beta/proxy/http://keystone:4730/v3/");
    }

    #[test]
    fn test_requires_auth_url() {
        let res = StackConfig::from_values(&values(&[("username", "alice")]));
        assert!(matches!(res, Err(StackError::Config(_))));
    }

    #[test]
    fn test_values() {
        let config = StackConfig::from_values(&values(&[
            ("auth_url", "https://cloud.lab.fiware.org:4730/v3"),
            ("username", "alice"),
            ("password", "secret"),
            ("project_id", "p1"),
            ("proxy_prefix", "https://rancher.example/v2-beta/proxy/"),
            ("endpoint_type", "internalURL"),
            ("region", " "),
        ])).unwrap();

        assert_eq!(config.auth_url, "https://cloud.lab.fiware.org:4730/v3/");
        assert_eq!(config.identity_url(), "https://rancher.example/v2-beta/proxy/https://cloud.lab.fiware.org:4730/v3/");
        assert_eq!(config.endpoint_kind, EndpointKind::Internal);
        // blank values count as unset
        assert!(config.region.is_none());

        assert_eq!(config.auth_request().unwrap(), AuthRequest::password("alice", "secret").with_project("p1"));
    }

    #[test]
    fn test_bad_endpoint_type() {
        let res = StackConfig::from_values(&values(&[("auth_url", "http://keystone/v2.0/"), ("endpoint_type", "private")]));
        assert!(matches!(res, Err(StackError::Config(_))));
    }

    #[test]
    fn test_token_wins() {
        let config = StackConfig::from_values(&values(&[
            ("auth_url", "http://keystone/v3/"), ("username", "alice"), ("password", "secret"), ("token", "oauth"),
        ])).unwrap();

        assert_eq!(config.auth_request().unwrap(), AuthRequest::token("oauth"));
        assert!(!config.needs_password_prompt());
    }

    #[test]
    fn test_password_prompt() {
        let mut config = StackConfig::from_values(&values(&[("auth_url", "http://keystone/v2.0/"), ("username", "alice")])).unwrap();
        assert!(config.needs_password_prompt());
        assert!(config.auth_request().is_err());

        config.password = Some(PROMPT_VALUE.to_string());
        assert!(config.needs_password_prompt());
        assert!(config.auth_request().is_err());

        config.password = Some("typed".to_string());
        assert!(!config.needs_password_prompt());
        assert!(config.auth_request().is_ok());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "auth_url: http://keystone:5000/v2.0/").unwrap();
        writeln!(file, "admin_url: http://keystone:35357/v2.0").unwrap();
        writeln!(file, "token: abc").unwrap();
        writeln!(file, "project_id: 8f1a00b2c3d4e5f6a7b8c9d0e1f2a3b4").unwrap();

        let config = StackConfig::from_file(file.path()).unwrap();
        assert_eq!(config.admin_url.as_deref(), Some("http://keystone:35357/v2.0/"));
        assert_eq!(config.identity_admin_url().as_deref(), Some("http://keystone:35357/v2.0/"));
        assert_eq!(config.project_id.as_deref(), Some("8f1a00b2c3d4e5f6a7b8c9d0e1f2a3b4"));
        assert_eq!(config.auth_request().unwrap(), AuthRequest::token("abc").with_project("8f1a00b2c3d4e5f6a7b8c9d0e1f2a3b4"));
    }

    #[test]
    fn test_missing_file() {
        let res = StackConfig::from_file(Path::new("/nonexistent/fiware-stack.yaml"));
        assert!(matches!(res, Err(StackError::FileLoad(_))));
    }
}
