//! VM create requests: merge the caller's VM description with location, tags
//! and a boot-diagnostics profile, submit it, and project the long-running
//! operation into an [`OperationStatus`].
//!
//! Nothing here polls; waiting for completion belongs to the caller.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use log::info;
use url::Url;

use crate::control_plane::ComputeControlPlane;
use crate::diagnostics::StorageAccountResolver;
use crate::types::{
    operation_states, AzureError, AzureErrorKind, AzureResult, DiagnosticsProfile,
    LongRunningOperation, OperationStatus, VirtualMachine,
};
use crate::virtual_machines::os_disk_uri;

pub struct VmProvisioner {
    compute: Arc<dyn ComputeControlPlane>,
    resolver: StorageAccountResolver,
}

impl VmProvisioner {
    pub fn new(compute: Arc<dyn ComputeControlPlane>, resolver: StorageAccountResolver) -> Self {
        Self { compute, resolver }
    }

    pub fn resolver(&self) -> &StorageAccountResolver {
        &self.resolver
    }

    /// Assemble and submit `vm`. An empty `location` keeps the VM's own;
    /// `tags: None` keeps the VM's own tags.
    pub async fn create_virtual_machine(
        &self,
        resource_group: &str,
        location: &str,
        vm: &VirtualMachine,
        tags: Option<&HashMap<String, String>>,
    ) -> AzureResult<OperationStatus> {
        let request = self.assemble(resource_group, location, vm, tags).await?;
        info!(
            "Submitting VM {}/{} in {}",
            resource_group, request.name, request.location
        );
        let operation = self.compute.create_or_update(resource_group, &request).await?;
        Ok(project_operation(&request.name, &operation))
    }

    /// Build the request that would be submitted, resolving the diagnostics
    /// endpoint when needed.
    pub async fn assemble(
        &self,
        resource_group: &str,
        location: &str,
        vm: &VirtualMachine,
        tags: Option<&HashMap<String, String>>,
    ) -> AzureResult<VirtualMachine> {
        if vm.name.trim().is_empty() {
            return Err(AzureError::new(
                AzureErrorKind::Validation,
                "VM description has no name",
            ));
        }
        let location = effective_location(location, vm).ok_or_else(|| {
            AzureError::new(
                AzureErrorKind::Validation,
                format!("No location given and VM {} has none", vm.name),
            )
        })?;

        let diagnostics = if needs_diagnostics_endpoint(vm) {
            let endpoint = self
                .resolver
                .resolve_diagnostics_endpoint(resource_group, &location, os_disk_uri(vm))
                .await?;
            Some(with_boot_diagnostics(vm.properties.diagnostics_profile.as_ref(), endpoint))
        } else {
            vm.properties.diagnostics_profile.clone()
        };

        Ok(build_request(vm, location, tags, diagnostics))
    }
}

fn effective_location(explicit: &str, vm: &VirtualMachine) -> Option<String> {
    [explicit, vm.location.as_str()]
        .into_iter()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
}

/// True when the VM has no diagnostics profile, or has boot diagnostics
/// enabled without a storage URI.
pub fn needs_diagnostics_endpoint(vm: &VirtualMachine) -> bool {
    match &vm.properties.diagnostics_profile {
        None => true,
        Some(profile) => profile
            .boot_diagnostics
            .as_ref()
            .map(|b| b.enabled && b.storage_uri.as_deref().map_or(true, str::is_empty))
            .unwrap_or(false),
    }
}

fn with_boot_diagnostics(existing: Option<&DiagnosticsProfile>, endpoint: String) -> DiagnosticsProfile {
    let mut profile = existing.cloned().unwrap_or_default();
    let mut boot = profile.boot_diagnostics.take().unwrap_or_default();
    boot.enabled = true;
    boot.storage_uri = Some(endpoint);
    profile.boot_diagnostics = Some(boot);
    profile
}

fn build_request(
    vm: &VirtualMachine,
    location: String,
    tags: Option<&HashMap<String, String>>,
    diagnostics: Option<DiagnosticsProfile>,
) -> VirtualMachine {
    let mut request = vm.clone();
    request.location = location;
    request.tags = tags.cloned().unwrap_or_else(|| vm.tags.clone());
    request.properties.diagnostics_profile = diagnostics;
    request
}

/// Caller-facing view of a submitted create.
pub fn project_operation(vm_name: &str, operation: &LongRunningOperation) -> OperationStatus {
    let now = Utc::now();
    let state = operation
        .resource
        .as_ref()
        .and_then(|vm| vm.properties.provisioning_state.as_deref());
    let status = match state {
        Some(s) if s.eq_ignore_ascii_case(operation_states::SUCCEEDED) => operation_states::SUCCEEDED,
        Some(s) if s.eq_ignore_ascii_case(operation_states::FAILED) => operation_states::FAILED,
        Some(s) if s.eq_ignore_ascii_case(operation_states::CANCELED) => operation_states::CANCELED,
        _ => operation_states::IN_PROGRESS,
    };
    let terminal = status != operation_states::IN_PROGRESS;

    let name = operation
        .async_operation_url
        .as_deref()
        .and_then(operation_id)
        .or_else(|| operation.request_id.clone())
        .unwrap_or_else(|| vm_name.to_string());

    OperationStatus {
        name,
        status: status.to_string(),
        start_time: Some(now),
        end_time: terminal.then_some(now),
        error: None,
        operation_url: operation.async_operation_url.clone(),
    }
}

/// Last path segment of an async-operation URL.
fn operation_id(operation_url: &str) -> Option<String> {
    let url = Url::parse(operation_url).ok()?;
    url.path_segments()?
        .filter(|s| !s.is_empty())
        .last()
        .map(str::to_string)
}

// ─── Tests ──────────────────────────────────────────────────────────
