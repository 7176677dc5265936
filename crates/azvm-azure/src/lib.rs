//! # azvm – Azure VM provisioning with boot diagnostics
//!
//! Azure Resource Manager (ARM) integration for creating virtual machines
//! whose boot diagnostics land in a resolved storage account.
//!
//! ## Features
//!
//! - **OAuth2 Authentication** – client-credentials flow, token expiry tracking
//! - **Storage Accounts** – get, list by resource group, name availability, create
//! - **Virtual Machines** – create or update, async-operation status
//! - **Diagnostics Resolution** – reuse the OS disk's account or a listed one,
//!   provision a `Standard_GRS` account otherwise
//! - **Provisioning** – VM request assembly and operation-status projection

pub mod types;
pub mod client;
pub mod auth;
pub mod storage;
pub mod virtual_machines;
pub mod control_plane;
pub mod naming;
pub mod diagnostics;
pub mod provisioning;
