//! Azure Storage Accounts – get, list by resource group, name availability,
//! create.

use log::debug;

use crate::client::AzureClient;
use crate::types::{
    ArmPutResponse, AzureResult, CheckNameAvailabilityRequest, CreateStorageAccountRequest,
    NameAvailability, StorageAccount,
};

const STORAGE_ACCOUNT_TYPE: &str = "Microsoft.Storage/storageAccounts";

/// List storage accounts in a resource group.
pub async fn list_storage_accounts_in_rg(
    client: &AzureClient,
    resource_group: &str,
) -> AzureResult<Vec<StorageAccount>> {
    let api = &client.config().api_version_storage;
    let url = client.resource_group_url(
        resource_group,
        &format!(
            "/providers/Microsoft.Storage/storageAccounts?api-version={}",
            api
        ),
    )?;
    debug!("list_storage_accounts_in_rg({}) → {}", resource_group, url);
    client.get_all_pages(&url).await
}

/// Get a single storage account.
pub async fn get_storage_account(
    client: &AzureClient,
    resource_group: &str,
    account_name: &str,
) -> AzureResult<StorageAccount> {
    let api = &client.config().api_version_storage;
    let url = client.resource_group_url(
        resource_group,
        &format!(
            "/providers/Microsoft.Storage/storageAccounts/{}?api-version={}",
            account_name, api
        ),
    )?;
    debug!("get_storage_account({}/{}) → {}", resource_group, account_name, url);
    client.get_json(&url).await
}

/// Ask whether a storage account name is free across Azure.
pub async fn check_name_availability(
    client: &AzureClient,
    account_name: &str,
) -> AzureResult<NameAvailability> {
    let api = &client.config().api_version_storage;
    let url = client.subscription_url(&format!(
        "/providers/Microsoft.Storage/checkNameAvailability?api-version={}",
        api
    ))?;
    debug!("check_name_availability({}) → {}", account_name, url);
    let body = CheckNameAvailabilityRequest {
        name: account_name.to_string(),
        resource_type: STORAGE_ACCOUNT_TYPE.to_string(),
    };
    client.post_json(&url, &body).await
}

/// Create a storage account.
///
/// Creation is asynchronous on the service side; the response body is
/// absent when ARM answers 202.
pub async fn create_storage_account(
    client: &AzureClient,
    resource_group: &str,
    account_name: &str,
    request: &CreateStorageAccountRequest,
) -> AzureResult<ArmPutResponse<StorageAccount>> {
    let api = &client.config().api_version_storage;
    let url = client.resource_group_url(
        resource_group,
        &format!(
            "/providers/Microsoft.Storage/storageAccounts/{}?api-version={}",
            account_name, api
        ),
    )?;
    debug!("create_storage_account({}/{}) → {}", resource_group, account_name, url);
    client.put_long_running(&url, request).await
}

// ─── Tests ──────────────────────────────────────────────────────────
