//! Boot-diagnostics storage account resolution.
//!
//! Resolution is split in two phases so the mutating branch stays visible:
//! [`StorageAccountResolver::find_existing`] only reads, while
//! [`StorageAccountResolver::provision`] creates a billable account.
//! [`StorageAccountResolver::resolve_diagnostics_endpoint`] composes them.
//!
//! Premium locally-redundant accounts are never chosen for diagnostics blobs.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::control_plane::StorageControlPlane;
use crate::naming::{account_name_from_uri, generate_account_name};
use crate::types::{
    storage_skus, AzureError, AzureErrorKind, AzureResult, CreateStorageAccountRequest,
    StorageAccount, StorageAccountRef, StorageSku,
};

const DIAGNOSTICS_ACCOUNT_KIND: &str = "StorageV2";

/// Tuning for [`StorageAccountResolver`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ResolverSettings {
    /// Generated names tried before giving up.
    pub max_name_attempts: u32,
    /// Property lookups while waiting for a new account's blob endpoint.
    pub endpoint_poll_attempts: u32,
    pub endpoint_poll_interval_secs: u64,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            max_name_attempts: 16,
            endpoint_poll_attempts: 10,
            endpoint_poll_interval_secs: 3,
        }
    }
}

/// Finds or creates the storage account that hosts boot-diagnostics blobs.
pub struct StorageAccountResolver {
    storage: Arc<dyn StorageControlPlane>,
    subscription_id: String,
    settings: ResolverSettings,
}

impl StorageAccountResolver {
    pub fn new(
        storage: Arc<dyn StorageControlPlane>,
        subscription_id: impl Into<String>,
        settings: ResolverSettings,
    ) -> Self {
        Self {
            storage,
            subscription_id: subscription_id.into(),
            settings,
        }
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    /// Blob endpoint for boot diagnostics in `resource_group`, creating a
    /// `Standard_GRS` account at `location` when nothing reusable exists.
    pub async fn resolve_diagnostics_endpoint(
        &self,
        resource_group: &str,
        location: &str,
        os_disk_uri: Option<&str>,
    ) -> AzureResult<String> {
        let account = match self.find_existing(resource_group, os_disk_uri).await? {
            Some(account) => account,
            None => self.provision(resource_group, location).await?,
        };
        Ok(account.blob_endpoint)
    }

    /// Read-only phase: reuse the OS disk's account, else the first suitable
    /// account listed in the group.
    pub async fn find_existing(
        &self,
        resource_group: &str,
        os_disk_uri: Option<&str>,
    ) -> AzureResult<Option<StorageAccountRef>> {
        if let Some(name) = os_disk_uri.and_then(account_name_from_uri) {
            if let Some(found) = self.os_disk_account(resource_group, &name).await? {
                return Ok(Some(found));
            }
        } else if let Some(uri) = os_disk_uri {
            debug!("No storage account name in OS disk URI {}", uri);
        }

        let accounts = self.storage.list_by_resource_group(resource_group).await?;
        let found = accounts
            .iter()
            .filter(|a| is_listed_candidate(a))
            .find_map(|a| account_ref(resource_group, a));

        match &found {
            Some(account) => info!(
                "Reusing storage account {}/{} for boot diagnostics",
                resource_group, account.name
            ),
            None => info!(
                "No reusable storage account among {} in {}",
                accounts.len(),
                resource_group
            ),
        }
        Ok(found)
    }

    async fn os_disk_account(
        &self,
        resource_group: &str,
        name: &str,
    ) -> AzureResult<Option<StorageAccountRef>> {
        match self.storage.get_properties(resource_group, name).await {
            Ok(account) if !is_premium_lrs(&account) => {
                let found = account_ref(resource_group, &account);
                if found.is_some() {
                    info!(
                        "Reusing OS disk storage account {}/{} for boot diagnostics",
                        resource_group, name
                    );
                }
                Ok(found)
            }
            Ok(_) => {
                info!("OS disk storage account {} is {}, skipping", name, storage_skus::PREMIUM_LRS);
                Ok(None)
            }
            Err(e) if e.is_not_found() => {
                info!("OS disk storage account {} not found in {}", name, resource_group);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Mutating phase: create a `Standard_GRS` account under a fresh name and
    /// wait for its blob endpoint.
    pub async fn provision(
        &self,
        resource_group: &str,
        location: &str,
    ) -> AzureResult<StorageAccountRef> {
        let name = self.available_account_name(resource_group).await?;
        let request = CreateStorageAccountRequest {
            location: location.to_string(),
            kind: DIAGNOSTICS_ACCOUNT_KIND.to_string(),
            sku: StorageSku {
                name: Some(storage_skus::STANDARD_GRS.to_string()),
                tier: None,
            },
            tags: HashMap::new(),
        };

        info!(
            "Creating boot diagnostics storage account {}/{} in {}",
            resource_group, name, location
        );
        self.storage.create(resource_group, &name, &request).await?;
        self.await_blob_endpoint(resource_group, &name).await
    }

    async fn available_account_name(&self, resource_group: &str) -> AzureResult<String> {
        let attempts = self.settings.max_name_attempts.max(1);
        for attempt in 1..=attempts {
            let candidate = generate_account_name(&self.subscription_id, resource_group);
            let availability = self.storage.check_name_availability(&candidate).await?;
            if availability.name_available {
                return Ok(candidate);
            }
            warn!(
                "Storage account name {} unavailable ({}), attempt {}/{}",
                candidate,
                availability.reason.as_deref().unwrap_or("no reason given"),
                attempt,
                attempts
            );
        }
        Err(AzureError::name_generation_exhausted(attempts))
    }

    async fn await_blob_endpoint(
        &self,
        resource_group: &str,
        name: &str,
    ) -> AzureResult<StorageAccountRef> {
        let attempts = self.settings.endpoint_poll_attempts.max(1);
        let interval = Duration::from_secs(self.settings.endpoint_poll_interval_secs);

        for attempt in 1..=attempts {
            match self.storage.get_properties(resource_group, name).await {
                Ok(account) => {
                    if let Some(found) = account_ref(resource_group, &account) {
                        return Ok(found);
                    }
                }
                // ARM may not list the account yet right after the PUT.
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e),
            }
            if attempt < attempts {
                debug!(
                    "Waiting for blob endpoint of {}/{} ({}/{})",
                    resource_group, name, attempt, attempts
                );
                tokio::time::sleep(interval).await;
            }
        }

        Err(AzureError::new(
            AzureErrorKind::Timeout,
            format!("Storage account {name} has no blob endpoint after {attempts} lookups"),
        ))
    }
}

fn is_premium_lrs(account: &StorageAccount) -> bool {
    account
        .sku_name()
        .map(|sku| sku.eq_ignore_ascii_case(storage_skus::PREMIUM_LRS))
        .unwrap_or(false)
}

/// Listed accounts additionally need a known SKU.
fn is_listed_candidate(account: &StorageAccount) -> bool {
    account.sku_name().is_some() && !is_premium_lrs(account)
}

fn account_ref(resource_group: &str, account: &StorageAccount) -> Option<StorageAccountRef> {
    let blob_endpoint = account.blob_endpoint()?;
    Some(StorageAccountRef {
        name: account.name.clone(),
        resource_group: resource_group.to_string(),
        location: account.location.clone(),
        sku_name: account.sku_name().map(str::to_string),
        blob_endpoint: blob_endpoint.to_string(),
    })
}

// ─── Tests ──────────────────────────────────────────────────────────
