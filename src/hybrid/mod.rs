//! Resource wrappers used by the samples.
//!
//! Each function issues one management call (plus its long-running
//! operation, if any) and reports failures with the message prefix of its
//! resource kind.
//! - [`resources`] - Resource groups
//! - [`network`] - VNets, NSGs, public IPs, NICs
//! - [`storage`] - Storage accounts and keys
//! - [`dataplane`] - Blob containers with Shared Key auth
//! - [`compute`] - Virtual machines and managed disks
//! - [`keyvault`] - Vaults and secrets

pub mod compute;
pub mod dataplane;
pub mod keyvault;
pub mod network;
pub mod resources;
pub mod storage;

/// Error type of the wrappers: a formatted message around the ARM failure.
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
