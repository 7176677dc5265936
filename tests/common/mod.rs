//! In-memory ARM control plane that records every call.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use azvm::config::{AzvmConfig, OperationSettings};
use azvm::service::AzvmService;
use azvm_azure::control_plane::{ComputeControlPlane, StorageControlPlane};
use azvm_azure::diagnostics::ResolverSettings;
use azvm_azure::types::{
    operation_states, AzureError, AzureErrorKind, AzureResult, CreateStorageAccountRequest,
    LongRunningOperation, NameAvailability, OperationStatus, StorageAccount,
    StorageAccountProperties, StorageEndpoints, StorageSku, VirtualMachine,
};

pub const SUBSCRIPTION: &str = "00000000-1111-2222-3333-444444444444";
pub const ASYNC_URL: &str = "https://management.azure.com/subscriptions/00000000-1111-2222-3333-444444444444/providers/Microsoft.Compute/locations/westus2/operations/7d3c2f10-aaaa-bbbb-cccc-000000000001?api-version=2024-03-01";

#[derive(Default)]
pub struct FakeArm {
    accounts: Mutex<Vec<(String, StorageAccount)>>,
    unavailable_names: AtomicUsize,
    calls: Mutex<Vec<String>>,
    submitted: Mutex<Vec<(String, VirtualMachine)>>,
    statuses: Mutex<VecDeque<OperationStatus>>,
    pub operation_url: Option<String>,
}

impl FakeArm {
    pub fn new() -> Self {
        Self {
            operation_url: Some(ASYNC_URL.to_string()),
            ..Default::default()
        }
    }

    pub fn with_account(self, resource_group: &str, account: StorageAccount) -> Self {
        self.accounts
            .lock()
            .unwrap()
            .push((resource_group.to_string(), account));
        self
    }

    /// The next `n` availability checks report the name as taken.
    pub fn with_unavailable_names(self, n: usize) -> Self {
        self.unavailable_names.store(n, Ordering::SeqCst);
        self
    }

    pub fn with_statuses(self, statuses: Vec<OperationStatus>) -> Self {
        *self.statuses.lock().unwrap() = statuses.into();
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    pub fn submitted(&self) -> Vec<(String, VirtualMachine)> {
        self.submitted.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

pub fn account(name: &str, sku: Option<&str>) -> StorageAccount {
    StorageAccount {
        id: format!("/subscriptions/{SUBSCRIPTION}/resourceGroups/rg/providers/Microsoft.Storage/storageAccounts/{name}"),
        name: name.to_string(),
        location: "westus2".to_string(),
        sku: sku.map(|s| StorageSku {
            name: Some(s.to_string()),
            tier: None,
        }),
        properties: Some(StorageAccountProperties {
            provisioning_state: Some("Succeeded".into()),
            primary_endpoints: Some(StorageEndpoints {
                blob: Some(blob_endpoint(name)),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn blob_endpoint(name: &str) -> String {
    format!("https://{name}.blob.core.windows.net/")
}

#[async_trait]
impl StorageControlPlane for FakeArm {
    async fn get_properties(
        &self,
        resource_group: &str,
        account_name: &str,
    ) -> AzureResult<StorageAccount> {
        self.record(format!("get_properties {resource_group}/{account_name}"));
        self.accounts
            .lock()
            .unwrap()
            .iter()
            .find(|(rg, a)| rg == resource_group && a.name == account_name)
            .map(|(_, a)| a.clone())
            .ok_or_else(|| {
                AzureError::with_status(
                    AzureErrorKind::NotFound,
                    format!("ResourceNotFound: {account_name}"),
                    404,
                )
            })
    }

    async fn list_by_resource_group(&self, resource_group: &str) -> AzureResult<Vec<StorageAccount>> {
        self.record(format!("list {resource_group}"));
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .filter(|(rg, _)| rg == resource_group)
            .map(|(_, a)| a.clone())
            .collect())
    }

    async fn check_name_availability(&self, account_name: &str) -> AzureResult<NameAvailability> {
        self.record(format!("check {account_name}"));
        let taken = self
            .unavailable_names
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        Ok(NameAvailability {
            name_available: !taken,
            reason: taken.then(|| "AlreadyExists".to_string()),
            message: None,
        })
    }

    async fn create(
        &self,
        resource_group: &str,
        account_name: &str,
        request: &CreateStorageAccountRequest,
    ) -> AzureResult<()> {
        let sku = request.sku.name.clone().unwrap_or_default();
        self.record(format!("create {resource_group}/{account_name} {sku} {}", request.kind));
        let mut created = account(account_name, Some(&sku));
        created.location = request.location.clone();
        created.kind = Some(request.kind.clone());
        self.accounts
            .lock()
            .unwrap()
            .push((resource_group.to_string(), created));
        Ok(())
    }
}

#[async_trait]
impl ComputeControlPlane for FakeArm {
    async fn create_or_update(
        &self,
        resource_group: &str,
        vm: &VirtualMachine,
    ) -> AzureResult<LongRunningOperation> {
        self.record(format!("create_or_update {resource_group}/{}", vm.name));
        self.submitted
            .lock()
            .unwrap()
            .push((resource_group.to_string(), vm.clone()));
        let mut resource = vm.clone();
        resource.properties.provisioning_state = Some("Creating".into());
        Ok(LongRunningOperation {
            status_code: 201,
            resource: Some(resource),
            async_operation_url: self.operation_url.clone(),
            request_id: Some("req-0001".into()),
        })
    }

    async fn get_operation_status(&self, operation_url: &str) -> AzureResult<OperationStatus> {
        self.record(format!("operation_status {operation_url}"));
        let next = self.statuses.lock().unwrap().pop_front();
        let mut status = next.unwrap_or_else(|| OperationStatus {
            status: operation_states::SUCCEEDED.into(),
            ..Default::default()
        });
        status.operation_url = Some(operation_url.to_string());
        Ok(status)
    }
}

/// Settings with every wait shortened to zero.
pub fn fast_config() -> AzvmConfig {
    AzvmConfig {
        diagnostics: ResolverSettings {
            endpoint_poll_interval_secs: 0,
            ..Default::default()
        },
        operations: OperationSettings {
            poll_interval_secs: 0,
            timeout_secs: 60,
        },
        ..Default::default()
    }
}

pub fn service(fake: &Arc<FakeArm>, config: &AzvmConfig) -> AzvmService {
    AzvmService::new(fake.clone(), fake.clone(), SUBSCRIPTION, config)
}
