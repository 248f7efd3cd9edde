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

use std::env;
use std::path::Path;
use std::time::Duration;

use fiware_stack::cloud_setup;
use fiware_stack::comm::UreqTransport;
use fiware_stack::config::{StackConfig, PROMPT_VALUE};
use fiware_stack::fiware_lab;
use fiware_stack::instance_params::InstanceParams;
use fiware_stack::logging;
use fiware_stack::neutron::Neutron;
use fiware_stack::nova::Nova;
use fiware_stack::{Session, StackError};

fn main() {
    let mut args: Vec<String> = env::args().collect();

    let verbose = take_flag(&mut args, "-v") || take_flag(&mut args, "--verbose");
    if let Err(err) = logging::init_logging(verbose) {
        eprintln!("Warning: {}", err);
    }

    let config_path = match take_option(&mut args, "--config") {
        Ok(path) => path,
        Err(err) => {
            eprintln!("Error: {}", err);
            return;
        }
    };

    if args.len() < 2 {
        print_usage();
        return;
    }

    let config = match &config_path {
        Some(path) => StackConfig::from_file(Path::new(path)),
        None => StackConfig::from_env()
    };

    let config = match config {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {}", err);
            return;
        }
    };

    match handle_command(&args, config) {
        Ok(true) => {},
        Ok(false) => {
            eprintln!("Error: Didn't understand command line args...");
            print_usage();
        },
        Err(err) => {
            eprintln!("Error: {}", err);
        }
    }
}

fn print_usage() {
    eprintln!("Usage: fiware-stack [--config <file.yaml>] [-v] <command>");
    eprintln!("Commands:");
    eprintln!("  auth");
    eprintln!("  catalog");
    eprintln!("  tenants [admin]");
    eprintln!("  setup [<project> [<region>]]");
    eprintln!("  list <flavors|secgroups|pools|keypairs|servers|networks|images|regions|labregions>");
    eprintln!("  createInstance <file.txt|file.yaml>");
    eprintln!("  deleteInstance <id>");
}

fn take_flag(args: &mut Vec<String>, flag: &str) -> bool {
    match args.iter().position(|a| a == flag) {
        Some(index) => {
            args.remove(index);
            true
        },
        None => false
    }
}

fn take_option(args: &mut Vec<String>, option: &str) -> Result<Option<String>, String> {
    let index = match args.iter().position(|a| a == option) {
        Some(index) => index,
        None => return Ok(None)
    };

    if index + 1 >= args.len() {
        return Err(format!("{} needs a value", option));
    }

    let value = args.remove(index + 1);
    args.remove(index);
    Ok(Some(value))
}

// return value indicates whether the command was understood.
fn handle_command(args: &[String], config: StackConfig) -> Result<bool, StackError> {
    let command = args[1].as_str();

    // these don't need the cloud
    if command == "list" && args.len() >= 3 {
        match args[2].as_str() {
            "images" => {
                for image in fiware_lab::IMAGES {
                    println!("{:<20} {:<26} ssh user: {}", image.slug, image.name, image.ssh_user);
                }
                return Ok(true);
            },
            "labregions" => {
                for region in fiware_lab::REGIONS {
                    println!("{}", region);
                }
                return Ok(true);
            },
            _ => {}
        }
    }

    let known = match command {
        "auth" | "catalog" | "tenants" | "setup" => true,
        "list" | "createInstance" | "deleteInstance" => args.len() >= 3,
        _ => false
    };
    if !known {
        return Ok(false);
    }

    if command == "setup" {
        let mut session = new_session(&config);
        let project = args.get(2).map(|a| a.as_str());
        let region = args.get(3).map(|a| a.as_str());
        let setup = cloud_setup::setup_session(&mut session, &prompt_for_password(config)?, project, region)?;

        println!("Project: {} ({})", setup.project.id, setup.project.name);
        println!("Region: {}", setup.region);
        println!("Identity: {}", session.base_url());
        return Ok(true);
    }

    let session = connect(config.clone())?;

    match command {
        "auth" => {
            print_access(&session);
            Ok(true)
        },
        "catalog" => {
            for service in session.get_service_catalog().unwrap_or(&[]) {
                println!("{} ({})", service.service_type, service.name);
                for endpoint in &service.endpoints {
                    let region = endpoint.region.as_deref().unwrap_or("-");
                    match (&endpoint.interface, &endpoint.url) {
                        (Some(interface), Some(url)) => println!("  {:<18} {:<9} {}", region, interface, url),
                        _ => println!("  {:<18} {}", region, endpoint.public_url.as_deref().unwrap_or("-")),
                    }
                }
            }
            Ok(true)
        },
        "tenants" => {
            let admin = args.get(2).map(|a| a == "admin").unwrap_or(false);
            for tenant in session.list_tenants(admin)? {
                let cloud = if tenant.is_cloud_project == Some(true) { "cloud" } else { "" };
                println!("{:<34} {:<30} {}", tenant.id, tenant.name, cloud);
            }
            Ok(true)
        },
        "list" if args.len() >= 3 => handle_list_command(&args[2], &session, &config),
        "createInstance" if args.len() >= 3 => {
            let params = InstanceParams::from_file(Path::new(&args[2]))?;
            let region = region_for(params.region.as_deref(), &config)?;
            let server = params.to_server_create()?;

            let created = nova_for(&session, &region, &config).create_server(&server)?;
            println!("Created instance: {}", created.id);
            if let Some(password) = &created.admin_pass {
                println!("Admin password: {}", password);
            }
            if let Some(user) = params.ssh_user() {
                println!("Login user: {}", user);
            }
            Ok(true)
        },
        "deleteInstance" if args.len() >= 3 => {
            let region = region_for(None, &config)?;
            nova_for(&session, &region, &config).delete_server(&args[2])?;
            println!("Deleted instance: {}", args[2]);
            Ok(true)
        },
        _ => Ok(false)
    }
}

fn handle_list_command(list_type: &str, session: &Session, config: &StackConfig) -> Result<bool, StackError> {
    if list_type == "regions" {
        for region in cloud_setup::compute_regions(session) {
            println!("{}", region);
        }
        return Ok(true);
    }

    let region = region_for(None, config)?;
    let nova = nova_for(session, &region, config);

    match list_type {
        "flavors" => {
            for flavor in nova.list_flavors(true)? {
                println!("{:<8} {:<20} vcpus: {:<3} ram: {} MB, disk: {} GB", flavor.id, flavor.name,
                         flavor.vcpus.unwrap_or(0), flavor.ram.unwrap_or(0), flavor.disk.unwrap_or(0));
            }
        },
        "secgroups" => {
            for group in nova.list_security_groups()? {
                let id = group.id.as_str().map(|id| id.to_string()).unwrap_or_else(|| group.id.to_string());
                println!("{:<38} {}", id, group.name);
            }
        },
        "pools" => {
            for pool in nova.list_floating_ip_pools()? {
                println!("{}", pool.name);
            }
        },
        "keypairs" => {
            for keypair in nova.list_keypairs()? {
                println!("{:<24} {}", keypair.name, keypair.fingerprint.as_deref().unwrap_or("-"));
            }
        },
        "servers" => {
            for server in nova.list_servers(true)? {
                println!("{:<38} {:<24} {:<8} {}", server.id, server.name, server.status.as_deref().unwrap_or("-"),
                         server.ipv4_address("floating").or_else(|| server.ipv4_address("fixed")).unwrap_or_default());
            }
        },
        "networks" => {
            let neutron = Neutron::new(session, &region)
                .configure(config.endpoint_kind)
                .with_proxy_prefix(config.proxy_prefix.as_deref());
            for network in neutron.list_networks()? {
                println!("{:<38} {:<24} {}", network.id, network.name, if network.external { "external" } else { "" });
            }
        },
        _ => {
            eprintln!("Unrecognised list type: '{}'", list_type);
            return Ok(false);
        }
    }

    Ok(true)
}

fn prompt_for_password(mut config: StackConfig) -> Result<StackConfig, StackError> {
    if config.needs_password_prompt() {
        eprint!("Password for {}: ", config.username.as_deref().unwrap_or_default());
        let password = rpassword::read_password()
            .map_err(|e| StackError::Config(format!("couldn't read password: {}", e)))?;
        if password == PROMPT_VALUE {
            return Err(StackError::Config("no password entered".to_string()));
        }
        config.password = Some(password);
    }

    Ok(config)
}

fn new_session(config: &StackConfig) -> Session {
    let agent = ureq::AgentBuilder::new()
        .timeout_connect(Duration::from_secs(10))
        .timeout(Duration::from_secs(60))
        .build();

    let admin_url = config.identity_admin_url();
    Session::new(&config.identity_url(), admin_url.as_deref(), Box::new(UreqTransport::with_agent(agent)))
}

fn connect(config: StackConfig) -> Result<Session, StackError> {
    let config = prompt_for_password(config)?;

    let mut session = new_session(&config);
    session.authenticate(&config.auth_request()?)?;

    Ok(session)
}

fn region_for(region: Option<&str>, config: &StackConfig) -> Result<String, StackError> {
    region.map(|r| r.to_string())
        .or_else(|| config.region.clone())
        .ok_or_else(|| StackError::Config("no region set (FIWARE_REGION / region)".to_string()))
}

fn nova_for<'a>(session: &'a Session, region: &str, config: &StackConfig) -> Nova<'a> {
    Nova::new(session, region)
        .configure(config.endpoint_kind)
        .with_proxy_prefix(config.proxy_prefix.as_deref())
}

fn print_access(session: &Session) {
    println!("Identity: {} ({})", session.base_url(), session.protocol_version());
    println!("State: {}", session.auth_state().describe());

    if let Some(access) = session.access_info() {
        println!("Token: {}", access.token.id);
        if let Some(expires) = &access.token.expires {
            println!("Expires: {}", expires);
        }
        if let Some(tenant) = &access.token.tenant {
            println!("Project: {} ({})", tenant.name, tenant.id);
        }
        if let Some(user) = &access.user {
            println!("User: {} ({})", user.name, user.id);
        }
        let roles: Vec<&str> = access.roles().iter().map(|r| r.name.as_str()).collect();
        if !roles.is_empty() {
            println!("Roles: {}", roles.join(", "));
        }
        println!("Services: {}", access.service_catalog.len());
    }
}
