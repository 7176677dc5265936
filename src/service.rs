//! Service façade over the ARM control planes.
//!
//! Holds the injected storage/compute collaborators plus the settings each
//! command needs, and builds resolvers and provisioners on demand.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use azvm_azure::auth;
use azvm_azure::client::AzureClient;
use azvm_azure::control_plane::{ComputeControlPlane, StorageControlPlane};
use azvm_azure::diagnostics::{ResolverSettings, StorageAccountResolver};
use azvm_azure::provisioning::VmProvisioner;
use azvm_azure::types::{
    AzureError, AzureErrorKind, OperationStatus, StorageAccountRef, VirtualMachine,
};
use log::{debug, info, warn};
use tokio::time::Instant;

use crate::config::{AzvmConfig, OperationSettings};
use crate::error::CliResult;

pub struct AzvmService {
    storage: Arc<dyn StorageControlPlane>,
    compute: Arc<dyn ComputeControlPlane>,
    subscription_id: String,
    diagnostics: ResolverSettings,
    operations: OperationSettings,
}

impl AzvmService {
    pub fn new(
        storage: Arc<dyn StorageControlPlane>,
        compute: Arc<dyn ComputeControlPlane>,
        subscription_id: impl Into<String>,
        config: &AzvmConfig,
    ) -> Self {
        Self {
            storage,
            compute,
            subscription_id: subscription_id.into(),
            diagnostics: config.diagnostics.clone(),
            operations: config.operations.clone(),
        }
    }

    /// Authenticate against Azure AD and wire one `AzureClient` in as both
    /// control planes.
    pub async fn connect(config: &AzvmConfig) -> CliResult<Self> {
        let mut client = AzureClient::with_config(config.azure.clone());
        client.set_credentials(config.credentials.clone());
        let subscription_id = client.subscription_id()?.to_string();
        auth::authenticate(&mut client).await?;
        info!("Authenticated to subscription {}", subscription_id);

        let client = Arc::new(client);
        Ok(Self::new(client.clone(), client, subscription_id, config))
    }

    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    pub fn operation_settings(&self) -> &OperationSettings {
        &self.operations
    }

    pub fn resolver(&self) -> StorageAccountResolver {
        StorageAccountResolver::new(
            self.storage.clone(),
            self.subscription_id.clone(),
            self.diagnostics.clone(),
        )
    }

    pub fn provisioner(&self) -> VmProvisioner {
        VmProvisioner::new(self.compute.clone(), self.resolver())
    }

    // ── Virtual machines ─────────────────────────────────────────────

    pub async fn create_vm(
        &self,
        resource_group: &str,
        location: &str,
        vm: &VirtualMachine,
        tags: Option<&HashMap<String, String>>,
        wait: bool,
    ) -> CliResult<OperationStatus> {
        let status = self
            .provisioner()
            .create_virtual_machine(resource_group, location, vm, tags)
            .await?;
        if wait {
            self.wait_for_completion(status).await
        } else {
            Ok(status)
        }
    }

    pub async fn operation_status(&self, url: &str) -> CliResult<OperationStatus> {
        Ok(self.compute.get_operation_status(url).await?)
    }

    /// Poll `initial` until it reaches a terminal state. Returns it unchanged
    /// when it is already terminal or carries no polling URL.
    pub async fn wait_for_completion(&self, initial: OperationStatus) -> CliResult<OperationStatus> {
        let url = match initial.operation_url.as_deref() {
            _ if initial.is_terminal() => return Ok(initial),
            Some(url) => url.to_string(),
            None => {
                warn!(
                    "Operation {} returned no Azure-AsyncOperation URL; not waiting for it",
                    initial.name
                );
                return Ok(initial);
            }
        };
        let interval = Duration::from_secs(self.operations.poll_interval_secs);
        // None when the timeout is beyond what Instant can represent.
        let deadline = Instant::now().checked_add(Duration::from_secs(self.operations.timeout_secs));

        loop {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                return Err(AzureError::new(
                    AzureErrorKind::Timeout,
                    format!(
                        "Operation {} still running after {}s",
                        initial.name, self.operations.timeout_secs
                    ),
                )
                .into());
            }
            tokio::time::sleep(interval).await;

            let mut status = self.compute.get_operation_status(&url).await?;
            if status.name.is_empty() {
                status.name = initial.name.clone();
            }
            if status.start_time.is_none() {
                status.start_time = initial.start_time;
            }
            if status.is_terminal() {
                info!("Operation {} finished: {}", status.name, status.status);
                return Ok(status);
            }
            debug!("Operation {} is {}", status.name, status.status);
        }
    }

    // ── Boot diagnostics ─────────────────────────────────────────────

    pub async fn resolve_diagnostics(
        &self,
        resource_group: &str,
        location: &str,
        os_disk_uri: Option<&str>,
    ) -> CliResult<String> {
        Ok(self
            .resolver()
            .resolve_diagnostics_endpoint(resource_group, location, os_disk_uri)
            .await?)
    }

    pub async fn find_diagnostics_account(
        &self,
        resource_group: &str,
        os_disk_uri: Option<&str>,
    ) -> CliResult<Option<StorageAccountRef>> {
        Ok(self.resolver().find_existing(resource_group, os_disk_uri).await?)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
