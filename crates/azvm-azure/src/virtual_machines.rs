//! Azure Virtual Machines – create or update, async-operation status.

use log::debug;
use url::Url;

use crate::client::AzureClient;
use crate::types::{
    AzureError, AzureErrorKind, AzureResult, LongRunningOperation, OperationStatus,
    VirtualMachine, ARM_BASE,
};

/// Submit a VM definition. Returns as soon as ARM accepts the request.
pub async fn create_or_update_vm(
    client: &AzureClient,
    resource_group: &str,
    vm: &VirtualMachine,
) -> AzureResult<LongRunningOperation> {
    let api = &client.config().api_version_compute;
    let url = client.resource_group_url(
        resource_group,
        &format!(
            "/providers/Microsoft.Compute/virtualMachines/{}?api-version={}",
            vm.name, api
        ),
    )?;
    debug!("create_or_update_vm({}/{}) → {}", resource_group, vm.name, url);
    let resp = client.put_long_running::<_, VirtualMachine>(&url, vm).await?;
    Ok(LongRunningOperation {
        status_code: resp.status_code,
        resource: resp.body,
        async_operation_url: resp.async_operation_url,
        request_id: resp.request_id,
    })
}

/// Fetch an `Azure-AsyncOperation` status resource.
///
/// Only management-endpoint URLs are followed.
pub async fn get_operation_status(
    client: &AzureClient,
    operation_url: &str,
) -> AzureResult<OperationStatus> {
    if !is_management_url(operation_url) {
        return Err(AzureError::new(
            AzureErrorKind::Validation,
            format!("Operation URL is not an ARM endpoint: {operation_url}"),
        ));
    }
    debug!("get_operation_status → {}", operation_url);
    let mut status: OperationStatus = client.get_json(operation_url).await?;
    status.operation_url = Some(operation_url.to_string());
    Ok(status)
}

/// True for `https` URLs on the ARM host and default port.
fn is_management_url(operation_url: &str) -> bool {
    match (Url::parse(operation_url), Url::parse(ARM_BASE)) {
        (Ok(url), Ok(base)) => {
            url.scheme() == "https"
                && url.host_str() == base.host_str()
                && url.port_or_known_default() == Some(443)
        }
        _ => false,
    }
}

/// Extract the OS disk VHD URI of an unmanaged-disk VM.
pub fn os_disk_uri(vm: &VirtualMachine) -> Option<&str> {
    vm.properties
        .storage_profile
        .as_ref()
        .and_then(|sp| sp.os_disk.as_ref())
        .and_then(|od| od.vhd.as_ref())
        .map(|vhd| vhd.uri.as_str())
        .filter(|uri| !uri.is_empty())
}

/// Extract resource group name from the VM resource ID.
pub fn extract_resource_group(vm: &VirtualMachine) -> Option<String> {
    vm.id
        .split('/')
        .collect::<Vec<_>>()
        .windows(2)
        .find(|w| w[0].eq_ignore_ascii_case("resourceGroups"))
        .map(|w| w[1].to_string())
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::*;

    fn vm_with_disk(uri: &str) -> VirtualMachine {
        VirtualMachine {
            id: "/subscriptions/sub1/resourceGroups/prod-rg/providers/Microsoft.Compute/virtualMachines/vm1".into(),
            name: "vm1".into(),
            location: "westus".into(),
            properties: VmProperties {
                storage_profile: Some(StorageProfile {
                    os_disk: Some(OsDisk {
                        vhd: Some(VirtualHardDisk { uri: uri.into() }),
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn os_disk_uri_present() {
        let vm = vm_with_disk("https://acct.blob.core.windows.net/vhds/os.vhd");
        assert_eq!(
            os_disk_uri(&vm),
            Some("https://acct.blob.core.windows.net/vhds/os.vhd")
        );
    }

    #[test]
    fn os_disk_uri_absent_or_empty() {
        assert!(os_disk_uri(&VirtualMachine::default()).is_none());
        assert!(os_disk_uri(&vm_with_disk("")).is_none());
    }

    #[test]
    fn extract_resource_group_from_id() {
        let vm = vm_with_disk("x");
        assert_eq!(extract_resource_group(&vm).as_deref(), Some("prod-rg"));
        assert!(extract_resource_group(&VirtualMachine::default()).is_none());
    }

    #[tokio::test]
    async fn operation_status_rejects_foreign_url() {
        let c = AzureClient::new();
        for url in [
            "https://example.com/op/1",
            "https://management.azure.com.evil.example/op/1",
            "https://management.azure.com@evil.example/op/1",
            "http://management.azure.com/op/1",
            "https://management.azure.com:8443/op/1",
            "not a url",
        ] {
            let err = get_operation_status(&c, url).await.unwrap_err();
            assert_eq!(err.kind, AzureErrorKind::Validation, "{url}");
        }
    }

    #[tokio::test]
    async fn operation_status_accepts_management_host() {
        // Passes the host check and stops at the missing token.
        let c = AzureClient::new();
        let err = get_operation_status(
            &c,
            "https://management.azure.com/subscriptions/s/providers/Microsoft.Compute/locations/westus/operations/1?api-version=2024-03-01",
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind, AzureErrorKind::NotAuthenticated);
    }

    #[test]
    fn management_url_check() {
        assert!(is_management_url("https://management.azure.com/op"));
        assert!(is_management_url("https://MANAGEMENT.azure.com:443/op"));
        assert!(!is_management_url("https://management.azure.com.evil.example/op"));
    }

    #[tokio::test]
    async fn create_requires_subscription() {
        let c = AzureClient::new();
        let err = create_or_update_vm(&c, "rg", &vm_with_disk("x"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, AzureErrorKind::SubscriptionNotSet);
    }
}
