mod common;

use std::fs;
use std::sync::Arc;

use azvm::cli::{Cli, OutputFormat};
use azvm::commands;
use azvm::error::CliError;
use clap::Parser;
use tempfile::TempDir;

use common::{account, fast_config, service, FakeArm, ASYNC_URL};

const VM_JSON: &str = r#"{
  "id": "/subscriptions/00000000-1111-2222-3333-444444444444/resourceGroups/rg-app/providers/Microsoft.Compute/virtualMachines/app01",
  "name": "app01",
  "location": "westeurope",
  "tags": { "team": "payments" },
  "properties": {
    "hardwareProfile": { "vmSize": "Standard_B2s" },
    "storageProfile": {
      "osDisk": {
        "name": "app01-os",
        "createOption": "FromImage",
        "vhd": { "uri": "https://appdisks.blob.core.windows.net/vhds/app01.vhd" }
      }
    },
    "osProfile": { "computerName": "app01", "adminUsername": "azureuser" }
  }
}"#;

fn write_vm(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("vm.json");
    fs::write(&path, VM_JSON).unwrap();
    path
}

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("azvm").chain(args.iter().copied())).unwrap()
}

#[tokio::test]
async fn create_vm_uses_group_from_resource_id() {
    let dir = TempDir::new().unwrap();
    let vm_file = write_vm(&dir);
    let fake = Arc::new(FakeArm::new().with_account("rg-app", account("appdisks", Some("Standard_LRS"))));
    let svc = service(&fake, &fast_config());
    let cli = parse(&[
        "create-vm",
        "--vm-file",
        vm_file.to_str().unwrap(),
        "--tag",
        "env=prod",
        "--output",
        "json",
    ]);

    let out = commands::execute(&svc, &commands::prepare(&cli.command).unwrap(), cli.output)
        .await
        .unwrap();

    let v: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(v["status"], "InProgress");
    assert_eq!(v["operationUrl"], ASYNC_URL);

    let (rg, request) = &fake.submitted()[0];
    assert_eq!(rg, "rg-app");
    assert_eq!(request.location, "westeurope");
    assert_eq!(request.tags.len(), 1);
    assert_eq!(request.tags["env"], "prod");
    let boot = request
        .properties
        .diagnostics_profile
        .as_ref()
        .and_then(|d| d.boot_diagnostics.as_ref())
        .unwrap();
    assert!(boot.enabled);
    assert_eq!(
        boot.storage_uri.as_deref(),
        Some("https://appdisks.blob.core.windows.net/")
    );
}

#[test]
fn create_vm_rejects_malformed_description() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("vm.json");
    fs::write(&path, "{ not json").unwrap();
    let cli = parse(&["create-vm", "-g", "rg", "--vm-file", path.to_str().unwrap()]);

    let err = commands::prepare(&cli.command).unwrap_err();

    assert!(matches!(err, CliError::VmDescription { .. }));
}

#[tokio::test]
async fn run_rejects_bad_vm_file_before_authenticating() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.yaml");
    fs::write(&config, "").unwrap();
    let vm_file = dir.path().join("vm.json");
    fs::write(&vm_file, "[]").unwrap();
    let cli = parse(&[
        "--config",
        config.to_str().unwrap(),
        "create-vm",
        "-g",
        "rg",
        "--vm-file",
        vm_file.to_str().unwrap(),
    ]);

    // No credentials are configured, so reaching the sign-in step would
    // fail with an Azure error instead.
    let err = azvm::run(cli).await.unwrap_err();

    assert!(matches!(err, CliError::VmDescription { .. }), "{err}");
}

#[tokio::test]
async fn find_reports_missing_account_as_text() {
    let fake = Arc::new(FakeArm::new().with_account("rg", account("fast", Some("Premium_LRS"))));
    let svc = service(&fake, &fast_config());
    let cli = parse(&["find-diagnostics-account", "-g", "rg"]);

    let out = commands::execute(&svc, &commands::prepare(&cli.command).unwrap(), OutputFormat::Text)
        .await
        .unwrap();

    assert_eq!(out, "No reusable diagnostics storage account found");
    assert_eq!(fake.count("create"), 0);
    assert_eq!(fake.count("check"), 0);
}

#[tokio::test]
async fn resolve_prints_endpoint() {
    let fake = Arc::new(FakeArm::new().with_account("rg", account("diag", Some("Standard_GRS"))));
    let svc = service(&fake, &fast_config());
    let cli = parse(&["resolve-diagnostics", "-g", "rg", "-l", "westus"]);

    let out = commands::execute(&svc, &commands::prepare(&cli.command).unwrap(), cli.output)
        .await
        .unwrap();

    assert_eq!(out, "https://diag.blob.core.windows.net/");
}

#[tokio::test]
async fn operation_status_renders_text() {
    let fake = Arc::new(FakeArm::new());
    let svc = service(&fake, &fast_config());
    let cli = parse(&["operation-status", "--url", ASYNC_URL]);

    let out = commands::execute(&svc, &commands::prepare(&cli.command).unwrap(), cli.output)
        .await
        .unwrap();

    assert!(out.contains("Status       : Succeeded"));
    assert!(out.contains(&format!("OperationUrl : {ASYNC_URL}")));
}
