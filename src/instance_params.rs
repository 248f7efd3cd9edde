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
use std::path::Path;

use tracing::warn;

use crate::common::FileLoadError;
use crate::fiware_lab;
use crate::nova::ServerCreate;
use crate::params::{ParamValue, Params};

/// Parameters of a "create instance" request, loaded from a `.txt` file of
/// `key: value` lines or from a `.yaml` file.
#[derive(Clone, Debug, PartialEq)]
pub struct InstanceParams {
    pub region:     Option<String>,
    pub params:     Params,
}

impl fmt::Display for InstanceParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Region: {}", self.region.as_deref().unwrap_or("(default)"))?;
        write!(f, "{}", self.params)
    }
}

const REQUIRED_PARAMS: &[&str] = &["name", "image", "flavor"];

impl InstanceParams {
    pub fn from_file(path: &Path) -> Result<InstanceParams, FileLoadError> {
        let extension_lower = path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .ok_or_else(|| FileLoadError::CustomError("Unknown file type.".to_string()))?;

        let params = match extension_lower.as_str() {
            "txt" => {
                let content = std::fs::read_to_string(path)?;
                Params::from_key_value_lines(&content)?
            },
            "yaml" | "yml" => Params::from_yaml_file(path)?,
            _ => return Err(FileLoadError::CustomError("Unknown file type.".to_string()))
        };

        InstanceParams::from_params(params)
    }

    pub fn from_params(mut params: Params) -> Result<InstanceParams, FileLoadError> {
        let region = params.get_string_or_int_value_as_string("region");
        params.values.remove("region");

        let instance_params = InstanceParams { region, params };
        instance_params.check_required_params()?;

        Ok(instance_params)
    }

    fn check_required_params(&self) -> Result<(), FileLoadError> {
        let missing: Vec<&str> = REQUIRED_PARAMS.iter()
            .copied()
            .filter(|param| self.params.get_string_or_int_value_as_string(param).is_none())
            .collect();

        if !missing.is_empty() {
            return Err(FileLoadError::CustomError(format!("Missing required parameter(s): {}", missing.join(", "))));
        }

        if let Some(region) = &self.region {
            if !fiware_lab::is_known_region(region) {
                // private clouds have their own region names
                warn!(region = %region, "not a known FIWARE Lab region");
            }
        }

        Ok(())
    }

    /// Login user for the image, if it's one of the FIWARE Lab base images.
    pub fn ssh_user(&self) -> Option<&'static str> {
        let image = self.params.get_string_or_int_value_as_string("image")?;
        fiware_lab::find_image(&image).map(|lab_image| lab_image.ssh_user)
    }

    pub fn to_server_create(&self) -> Result<ServerCreate, FileLoadError> {
        let get = |key: &str| self.params.get_string_or_int_value_as_string(key);
        let required = |key: &str| get(key)
            .ok_or_else(|| FileLoadError::CustomError(format!("Missing required parameter: {}", key)));

        let mut server = ServerCreate::new(&required("name")?, &required("image")?, &required("flavor")?);

        server.key_name = get("key_name");
        server.availability_zone = get("availability_zone");
        server.security_groups = self.params.get_values_as_vec_of_strings("security_groups");
        server.networks = self.params.get_values_as_vec_of_strings("networks");

        server.user_data = match (get("user_data"), get("user_data_file")) {
            (Some(_), Some(_)) => {
                return Err(FileLoadError::CustomError("Only one of 'user_data' and 'user_data_file' can be set.".to_string()));
            },
            (Some(data), None) => Some(data),
            (None, Some(file)) => Some(std::fs::read_to_string(file)?),
            (None, None) => None
        };

        server.min_count = self.count_param("min_count")?;
        server.max_count = self.count_param("max_count")?;
        if let (Some(min), Some(max)) = (server.min_count, server.max_count) {
            if min > max {
                return Err(FileLoadError::CustomError(format!("min_count ({}) is greater than max_count ({}).", min, max)));
            }
        }

        if let Some(ParamValue::Map(values)) = self.params.get_raw_value("metadata") {
            server.metadata = values.iter()
                .map(|(key, value)| {
                    let value = match value {
                        ParamValue::Str(s) => s.clone(),
                        other => other.to_string()
                    };
                    (key.clone(), value)
                })
                .collect::<BTreeMap<String, String>>();
        }

        Ok(server)
    }

    fn count_param(&self, key: &str) -> Result<Option<u32>, FileLoadError> {
        if !self.params.has_value(key) {
            return Ok(None);
        }

        match self.params.get_value_as_int(key) {
            Some(count) if count >= 1 => u32::try_from(count)
                .map(Some)
                .map_err(|e| FileLoadError::StdError(e.to_string())),
            _ => Err(FileLoadError::CustomError(format!("Invalid value for '{}': expected a positive integer.", key)))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_file(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_txt_file() {
        let file = write_file(".txt", "
# web node
name: web-1
image: base_ubuntu_14.04
flavor: 2
region: Spain2
key_name: laptop
security_groups: default, ssh
");

        let params = InstanceParams::from_file(file.path()).unwrap();
        assert_eq!(params.region.as_deref(), Some("Spain2"));
        assert!(!params.params.has_value("region"));
        assert_eq!(params.ssh_user(), Some("ubuntu"));

        let server = params.to_server_create().unwrap();
        assert_eq!(server.name, "web-1");
        assert_eq!(server.flavor_ref, "2");
        assert_eq!(server.key_name.as_deref(), Some("laptop"));
        assert_eq!(server.security_groups, vec!["default".to_string(), "ssh".to_string()]);
        assert!(server.min_count.is_none());
    }

    #[test]
    fn test_yaml_file() {
        let file = write_file(".YAML", "
name: db-1
image: 0c1f2a7e-64a0-4ab6-8a25-0d3d1c0c3e11
flavor: 3
min_count: 1
max_count: 2
networks:
  - 8f6a8a0d-1c0e-4b7e-9d1c-7c0d2f0b4a55
metadata:
  role: database
  replicas: 2
");

        let params = InstanceParams::from_file(file.path()).unwrap();
        assert!(params.region.is_none());
        assert!(params.ssh_user().is_none());

        let server = params.to_server_create().unwrap();
        assert_eq!(server.flavor_ref, "3");
        assert_eq!(server.min_count, Some(1));
        assert_eq!(server.max_count, Some(2));
        assert_eq!(server.networks, vec!["8f6a8a0d-1c0e-4b7e-9d1c-7c0d2f0b4a55".to_string()]);
        assert_eq!(server.metadata.get("role").map(|s| s.as_str()), Some("database"));
        assert_eq!(server.metadata.get("replicas").map(|s| s.as_str()), Some("2"));
    }

    #[test]
    fn test_missing_required() {
        let file = write_file(".txt", "name: web-1\n");
        match InstanceParams::from_file(file.path()) {
            Err(FileLoadError::CustomError(msg)) => assert!(msg.contains("image, flavor")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_region_still_loads() {
        let params = InstanceParams::from_params(Params::from_key_value_lines("name: a\nimage: i\nflavor: 1\nregion: RegionOne").unwrap()).unwrap();
        assert_eq!(params.region.as_deref(), Some("RegionOne"));
        assert!(params.to_server_create().is_ok());
    }

    #[test]
    fn test_unknown_extension() {
        let file = write_file(".json", "{}");
        assert!(matches!(InstanceParams::from_file(file.path()), Err(FileLoadError::CustomError(_))));
    }

    #[test]
    fn test_user_data_file() {
        let script = write_file(".sh", "#!/bin/sh\necho hello\n");
        let content = format!("name: a\nimage: i\nflavor: 1\nuser_data_file: {}\n", script.path().display());
        let params = InstanceParams::from_params(Params::from_key_value_lines(&content).unwrap()).unwrap();

        let server = params.to_server_create().unwrap();
        assert_eq!(server.user_data.as_deref(), Some("#!/bin/sh\necho hello\n"));
    }

    #[test]
    fn test_bad_counts() {
        let params = InstanceParams::from_params(Params::from_key_value_lines("name: a\nimage: i\nflavor: 1\nmin_count: 3\nmax_count: 2").unwrap()).unwrap();
        assert!(params.to_server_create().is_err());

        let params = InstanceParams::from_params(Params::from_key_value_lines("name: a\nimage: i\nflavor: 1\nmax_count: zero").unwrap()).unwrap();
        assert!(params.to_server_create().is_err());
    }
}
