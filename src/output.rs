//! Console rendering for command results.
//!
//! Text output is an aligned `Key : Value` list; JSON output is the
//! serialized model, camelCase like the ARM wire format.

use azvm_azure::types::{OperationStatus, StorageAccountRef};
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::error::CliResult;

pub fn render_status(status: &OperationStatus, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Json => to_json(status),
        OutputFormat::Text => {
            let error = status
                .error
                .as_ref()
                .map(|e| format!("{}: {}", e.code, e.message));
            Ok(key_values(&[
                ("Name", Some(status.name.clone())),
                ("Status", Some(status.status.clone())),
                ("StartTime", status.start_time.map(|t| t.to_rfc3339())),
                ("EndTime", status.end_time.map(|t| t.to_rfc3339())),
                ("Error", error),
                ("OperationUrl", status.operation_url.clone()),
            ]))
        }
    }
}

pub fn render_account(account: Option<&StorageAccountRef>, format: OutputFormat) -> CliResult<String> {
    match (format, account) {
        (OutputFormat::Json, _) => to_json(&account),
        (OutputFormat::Text, None) => Ok("No reusable diagnostics storage account found".into()),
        (OutputFormat::Text, Some(a)) => Ok(key_values(&[
            ("Name", Some(a.name.clone())),
            ("ResourceGroup", Some(a.resource_group.clone())),
            ("Location", Some(a.location.clone())),
            ("SkuName", a.sku_name.clone()),
            ("BlobEndpoint", Some(a.blob_endpoint.clone())),
        ])),
    }
}

pub fn render_endpoint(endpoint: &str, format: OutputFormat) -> CliResult<String> {
    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Endpoint<'a> {
        blob_endpoint: &'a str,
    }

    match format {
        OutputFormat::Json => to_json(&Endpoint {
            blob_endpoint: endpoint,
        }),
        OutputFormat::Text => Ok(endpoint.to_string()),
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> CliResult<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Rows with no value are omitted.
fn key_values(rows: &[(&str, Option<String>)]) -> String {
    let width = rows
        .iter()
        .filter(|(_, v)| v.is_some())
        .map(|(k, _)| k.len())
        .max()
        .unwrap_or(0);
    rows.iter()
        .filter_map(|(k, v)| v.as_ref().map(|v| format!("{k:<width$} : {v}")))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use azvm_azure::types::ArmErrorDetail;

    fn account() -> StorageAccountRef {
        StorageAccountRef {
            name: "diagacct".into(),
            resource_group: "rg".into(),
            location: "westus".into(),
            sku_name: Some("Standard_GRS".into()),
            blob_endpoint: "https://diagacct.blob.core.windows.net/".into(),
        }
    }

    #[test]
    fn status_text_skips_missing_fields() {
        let status = OperationStatus {
            name: "op1".into(),
            status: "Failed".into(),
            error: Some(ArmErrorDetail {
                code: "QuotaExceeded".into(),
                message: "cores".into(),
            }),
            ..Default::default()
        };
        let text = render_status(&status, OutputFormat::Text).unwrap();
        assert_eq!(
            text,
            "Name   : op1\nStatus : Failed\nError  : QuotaExceeded: cores"
        );
    }

    #[test]
    fn status_json_is_camel_case() {
        let status = OperationStatus {
            name: "op1".into(),
            status: "InProgress".into(),
            operation_url: Some("https://management.azure.com/op".into()),
            ..Default::default()
        };
        let json = render_status(&status, OutputFormat::Json).unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["operationUrl"], "https://management.azure.com/op");
        assert!(v.get("endTime").is_none());
    }

    #[test]
    fn account_text_and_json() {
        let a = account();
        let text = render_account(Some(&a), OutputFormat::Text).unwrap();
        assert!(text.starts_with("Name          : diagacct\n"));
        assert!(text.ends_with("BlobEndpoint  : https://diagacct.blob.core.windows.net/"));

        let json = render_account(Some(&a), OutputFormat::Json).unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["resourceGroup"], "rg");
        assert_eq!(v["skuName"], "Standard_GRS");
    }

    #[test]
    fn missing_account() {
        assert_eq!(render_account(None, OutputFormat::Json).unwrap(), "null");
        assert!(render_account(None, OutputFormat::Text)
            .unwrap()
            .starts_with("No reusable"));
    }

    #[test]
    fn endpoint_formats() {
        let e = "https://x.blob.core.windows.net/";
        assert_eq!(render_endpoint(e, OutputFormat::Text).unwrap(), e);
        let json = render_endpoint(e, OutputFormat::Json).unwrap();
        assert!(json.contains("\"blobEndpoint\""));
    }
}
