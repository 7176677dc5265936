//! Command handlers: turn parsed arguments into service calls and render
//! the results.

use std::collections::HashMap;
use std::path::Path;

use azvm_azure::types::VirtualMachine;
use azvm_azure::virtual_machines::extract_resource_group;
use log::info;

use crate::cli::{Command, OutputFormat};
use crate::error::{CliError, CliResult};
use crate::output;
use crate::service::AzvmService;

/// A subcommand with its local inputs (files, tags) already loaded, so
/// bad input is reported before any call to Azure.
#[derive(Debug)]
pub enum Request {
    CreateVm {
        resource_group: String,
        location: String,
        vm: VirtualMachine,
        tags: Option<HashMap<String, String>>,
        wait: bool,
    },
    ResolveDiagnostics {
        resource_group: String,
        location: String,
        os_disk_uri: Option<String>,
    },
    FindDiagnosticsAccount {
        resource_group: String,
        os_disk_uri: Option<String>,
    },
    OperationStatus {
        url: String,
    },
}

pub fn prepare(command: &Command) -> CliResult<Request> {
    Ok(match command {
        Command::CreateVm {
            resource_group,
            location,
            vm_file,
            tags,
            wait,
        } => {
            let vm = read_vm_description(vm_file)?;
            Request::CreateVm {
                resource_group: target_resource_group(resource_group.as_deref(), &vm)?,
                location: location.clone(),
                vm,
                tags: tag_map(tags),
                wait: *wait,
            }
        }
        Command::ResolveDiagnostics {
            resource_group,
            location,
            os_disk_uri,
        } => Request::ResolveDiagnostics {
            resource_group: resource_group.clone(),
            location: location.clone(),
            os_disk_uri: os_disk_uri.clone(),
        },
        Command::FindDiagnosticsAccount {
            resource_group,
            os_disk_uri,
        } => Request::FindDiagnosticsAccount {
            resource_group: resource_group.clone(),
            os_disk_uri: os_disk_uri.clone(),
        },
        Command::OperationStatus { url } => Request::OperationStatus { url: url.clone() },
    })
}

pub async fn execute(
    service: &AzvmService,
    request: &Request,
    format: OutputFormat,
) -> CliResult<String> {
    match request {
        Request::CreateVm {
            resource_group,
            location,
            vm,
            tags,
            wait,
        } => {
            let status = service
                .create_vm(resource_group, location, vm, tags.as_ref(), *wait)
                .await?;
            output::render_status(&status, format)
        }

        Request::ResolveDiagnostics {
            resource_group,
            location,
            os_disk_uri,
        } => {
            let endpoint = service
                .resolve_diagnostics(resource_group, location, os_disk_uri.as_deref())
                .await?;
            output::render_endpoint(&endpoint, format)
        }

        Request::FindDiagnosticsAccount {
            resource_group,
            os_disk_uri,
        } => {
            let account = service
                .find_diagnostics_account(resource_group, os_disk_uri.as_deref())
                .await?;
            output::render_account(account.as_ref(), format)
        }

        Request::OperationStatus { url } => {
            let status = service.operation_status(url).await?;
            output::render_status(&status, format)
        }
    }
}

pub fn read_vm_description(path: &Path) -> CliResult<VirtualMachine> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let vm = serde_json::from_str(&text).map_err(|source| CliError::VmDescription {
        path: path.to_path_buf(),
        source,
    })?;
    info!("Loaded VM description from {}", path.display());
    Ok(vm)
}

/// The explicit group, else the one named in the VM's resource id.
pub fn target_resource_group(explicit: Option<&str>, vm: &VirtualMachine) -> CliResult<String> {
    explicit
        .map(str::trim)
        .filter(|rg| !rg.is_empty())
        .map(str::to_string)
        .or_else(|| extract_resource_group(vm))
        .ok_or_else(|| {
            CliError::InvalidArgument(
                "--resource-group is required when the VM description has no resource id".into(),
            )
        })
}

/// `None` when no `--tag` was given so the VM keeps its own tags.
pub fn tag_map(tags: &[(String, String)]) -> Option<HashMap<String, String>> {
    if tags.is_empty() {
        None
    } else {
        Some(tags.iter().cloned().collect())
    }
}
