//! ARM response payloads.
//!
//! Only the fields the samples read or print are modelled; unknown fields are
//! ignored. Request bodies are built with `serde_json::json!` next to the call.
//! - [`resources`] - Resource groups and the generic resource list
//! - [`network`] - VNets, subnets, NSGs, public IPs, NICs
//! - [`storage`] - Storage accounts and keys
//! - [`compute`] - Virtual machines and managed disks
//! - [`keyvault`] - Vaults and secrets

pub mod compute;
pub mod keyvault;
pub mod network;
pub mod resources;
pub mod storage;

pub use compute::{Disk, VirtualMachine};
pub use keyvault::{Secret, Vault};
pub use network::{NetworkInterface, PublicIpAddress, SecurityGroup, Subnet, VirtualNetwork};
pub use resources::{GenericResource, ResourceGroup};
pub use storage::{CheckNameAvailabilityResult, StorageAccount, StorageAccountKeys};
