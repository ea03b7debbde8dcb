//! Azure Resource Manager plumbing.
//!
//! This module handles everything between a service principal and an ARM call:
//! - [`environment`] - Endpoint discovery from the ARM metadata document
//! - [`iam`] - Service principal tokens (secret or certificate)
//! - [`client`] - Authenticated REST calls and paging
//! - [`poller`] - Long-running operation polling
//! - [`profile`] - Azure Stack Hub API profiles

mod client;
mod environment;
mod error;
mod iam;
mod poller;
mod profile;

pub use client::{
    ArmClient, ArmResponse, DEFAULT_LRO_TIMEOUT, DEFAULT_POLL_FREQUENCY, PROVISIONING_TIMEOUT,
};
pub use environment::{
    is_adfs_endpoint, storage_suffix_from_arm_url, Environment, MetadataAuthentication,
    MetadataDocument, ADFS_TENANT,
};
pub use error::{ArmError, Result};
pub use iam::{token_endpoint, AccessToken, ClientCertificate, Credential};
pub use poller::{lro_status, provisioning_state, retry_after, LroStatus, Poller};
pub use profile::{ApiProfile, GENERIC_RESOURCES_API_VERSION, PROFILE_2018_03_01, PROFILE_2020_09_01};
