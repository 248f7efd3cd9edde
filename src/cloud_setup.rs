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

use tracing::info;

use crate::common::StackError;
use crate::config::StackConfig;
use crate::keystone::{Session, Tenant};
use crate::nova::nova_client::COMPUTE_SERVICE_TYPE;

/// Project and region a session ended up scoped to.
#[derive(Clone, Debug, PartialEq)]
pub struct CloudSetup {
    pub project:    Tenant,
    pub region:     String,
}

/// Only tenants flagged as cloud projects can run instances.
pub fn cloud_projects(tenants: Vec<Tenant>) -> Vec<Tenant> {
    tenants.into_iter().filter(|tenant| tenant.is_cloud_project == Some(true)).collect()
}

/// Pick a project: the requested one, or the only one there is.
pub fn choose_project(projects: &[Tenant], requested: Option<&str>) -> Result<Tenant, StackError> {
    if let Some(id) = requested {
        return projects.iter()
            .find(|project| project.id == id || project.name == id)
            .cloned()
            .ok_or_else(|| StackError::Config(format!("'{}' is not one of the available cloud projects", id)));
    }

    match projects {
        [] => Err(StackError::Config("no cloud projects available for this user".to_string())),
        [project] => Ok(project.clone()),
        _ => Err(StackError::SelectionNeeded {
            what: "project".to_string(),
            choices: projects.iter().map(|p| format!("{} ({})", p.id, p.name)).collect(),
        })
    }
}

/// Regions the compute service has endpoints in, from the session's catalog.
pub fn compute_regions(session: &Session) -> Vec<String> {
    session.get_service(COMPUTE_SERVICE_TYPE)
        .map(|service| service.regions().into_iter().map(|r| r.to_string()).collect())
        .unwrap_or_default()
}

pub fn choose_region(regions: &[String], requested: Option<&str>) -> Result<String, StackError> {
    if let Some(region) = requested {
        if regions.iter().any(|r| r == region) {
            return Ok(region.to_string());
        }
        return Err(StackError::ServiceUnavailable { service_type: COMPUTE_SERVICE_TYPE.to_string(),
                                                    region: region.to_string() });
    }

    match regions {
        [] => Err(StackError::Config("no compute regions in the service catalog".to_string())),
        [region] => Ok(region.clone()),
        _ => Err(StackError::SelectionNeeded { what: "region".to_string(), choices: regions.to_vec() })
    }
}

/// Log in unscoped, pick a cloud project, log in again scoped to it (against the
/// v3 url if configured) and pick a compute region from the new catalog.
/// The session is left authenticated against the scoped url.
pub fn setup_session(session: &mut Session, config: &StackConfig, requested_project: Option<&str>,
                     requested_region: Option<&str>) -> Result<CloudSetup, StackError> {
    let mut request = config.auth_request()?;
    request.project_id = None;

    session.authenticate(&request)?;
    let projects = cloud_projects(session.list_tenants(false)?);
    let project = choose_project(&projects, requested_project.or(config.project_id.as_deref()))?;

    info!(project = %project.id, "cloud project selected");

    let admin_url = config.identity_admin_url();
    session.init(&config.scoped_identity_url(), admin_url.as_deref());
    session.authenticate(&request.with_project(&project.id))?;

    let regions = compute_regions(session);
    let region = choose_region(&regions, requested_region.or(config.region.as_deref()))?;

    info!(project = %project.id, region = %region, "session scoped");

    Ok(CloudSetup { project, region })
}
