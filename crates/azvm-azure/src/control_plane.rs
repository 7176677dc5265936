//! Control-plane seams consumed by the diagnostics resolver and the VM
//! create path.
//!
//! `AzureClient` implements both traits against ARM; tests substitute mocks.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::client::AzureClient;
use crate::storage;
use crate::types::{
    AzureResult, CreateStorageAccountRequest, LongRunningOperation, NameAvailability,
    OperationStatus, StorageAccount, VirtualMachine,
};
use crate::virtual_machines;

/// Storage management operations.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait StorageControlPlane: Send + Sync {
    async fn get_properties(
        &self,
        resource_group: &str,
        account_name: &str,
    ) -> AzureResult<StorageAccount>;

    async fn list_by_resource_group(&self, resource_group: &str)
        -> AzureResult<Vec<StorageAccount>>;

    async fn check_name_availability(&self, account_name: &str) -> AzureResult<NameAvailability>;

    async fn create(
        &self,
        resource_group: &str,
        account_name: &str,
        request: &CreateStorageAccountRequest,
    ) -> AzureResult<()>;
}

/// Compute management operations.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ComputeControlPlane: Send + Sync {
    async fn create_or_update(
        &self,
        resource_group: &str,
        vm: &VirtualMachine,
    ) -> AzureResult<LongRunningOperation>;

    async fn get_operation_status(&self, operation_url: &str) -> AzureResult<OperationStatus>;
}

#[async_trait]
impl StorageControlPlane for AzureClient {
    async fn get_properties(
        &self,
        resource_group: &str,
        account_name: &str,
    ) -> AzureResult<StorageAccount> {
        storage::get_storage_account(self, resource_group, account_name).await
    }

    async fn list_by_resource_group(
        &self,
        resource_group: &str,
    ) -> AzureResult<Vec<StorageAccount>> {
        storage::list_storage_accounts_in_rg(self, resource_group).await
    }

    async fn check_name_availability(&self, account_name: &str) -> AzureResult<NameAvailability> {
        storage::check_name_availability(self, account_name).await
    }

    async fn create(
        &self,
        resource_group: &str,
        account_name: &str,
        request: &CreateStorageAccountRequest,
    ) -> AzureResult<()> {
        storage::create_storage_account(self, resource_group, account_name, request).await?;
        Ok(())
    }
}

#[async_trait]
impl ComputeControlPlane for AzureClient {
    async fn create_or_update(
        &self,
        resource_group: &str,
        vm: &VirtualMachine,
    ) -> AzureResult<LongRunningOperation> {
        virtual_machines::create_or_update_vm(self, resource_group, vm).await
    }

    async fn get_operation_status(&self, operation_url: &str) -> AzureResult<OperationStatus> {
        virtual_machines::get_operation_status(self, operation_url).await
    }
}
