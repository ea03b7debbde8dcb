//! Sample sequences, one per subcommand.
//!
//! Every sample starts from a [`SampleContext`]: a discovered environment, a
//! credential that already produced a token, and an [`ArmClient`] pinned to
//! an API profile.
//! - [`resource_group`] - Create, get, list and delete a resource group
//! - [`storage`] - Storage account lifecycle and keys
//! - [`keyvault`] - Vault with a full-access policy and a secret
//! - [`vm`] - VHD-backed VM, then a managed disk VM
//! - [`managed_disk`] - VM with an attached managed disk
//! - [`dataplane`] - Blob upload with Shared Key auth
//! - [`hybrid_vm`] - VM sample configured from environment variables

pub mod dataplane;
pub mod hybrid_vm;
pub mod keyvault;
pub mod managed_disk;
pub mod resource_group;
pub mod storage;
pub mod vm;

use crate::azure::{
    ApiProfile, ArmClient, Credential, Environment, ADFS_TENANT, DEFAULT_LRO_TIMEOUT,
    DEFAULT_POLL_FREQUENCY, PROFILE_2020_09_01,
};
use crate::config::{AuthMode, SpConfig};
use crate::hybrid::compute::VmCredentials;
use crate::hybrid::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// How long a sample waits for a resource group or VM deletion.
pub const DELETE_TIMEOUT: Duration = Duration::from_secs(500);

#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub disable_instance_discovery: bool,
    pub profile: ApiProfile,
    pub poll_frequency: Duration,
    pub lro_timeout: Duration,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        ConnectOptions {
            disable_instance_discovery: false,
            profile: PROFILE_2020_09_01,
            poll_frequency: DEFAULT_POLL_FREQUENCY,
            lro_timeout: DEFAULT_LRO_TIMEOUT,
        }
    }
}

/// Everything a sample needs to talk to one Azure Stack Hub stamp.
#[derive(Debug)]
pub struct SampleContext {
    pub config: SpConfig,
    pub environment: Environment,
    pub http: reqwest::Client,
    pub client: ArmClient,
    /// Tenant as configured. On ADFS stamps the token uses `adfs` instead,
    /// but key vault access policies still need the real tenant id.
    pub admin_tenant_id: String,
    pub disable_instance_discovery: bool,
}

fn token_error(e: impl std::fmt::Display) -> String {
    format!("Cannot generate token. Error details: {e}.")
}

impl SampleContext {
    /// Discover the environment, authenticate and build the ARM client.
    pub async fn connect(
        config: SpConfig,
        auth: AuthMode,
        options: ConnectOptions,
    ) -> Result<Self> {
        let http = reqwest::Client::new();
        let environment = Environment::from_url(&http, &config.resource_manager_endpoint_url)
            .await
            .map_err(|e| format!("Failed to get environment from url: {e}"))?;

        let mut disable_instance_discovery = options.disable_instance_discovery;
        if environment.is_adfs() {
            log::warn!(
                "ADFS authority {} detected, using tenant '{ADFS_TENANT}' without instance discovery",
                environment.active_directory_endpoint
            );
            disable_instance_discovery = true;
        }
        log::debug!("instance discovery disabled: {disable_instance_discovery}");

        println!("Creating credential and getting token");
        let tenant = environment.effective_tenant(&config.tenant_id);
        let credential = match auth {
            AuthMode::Secret => Credential::client_secret(
                http.clone(),
                &environment.active_directory_endpoint,
                tenant,
                &config.client_id,
                &config.client_secret,
                &environment.token_audience,
            ),
            AuthMode::Certificate(cert) => Credential::client_certificate(
                http.clone(),
                &environment.active_directory_endpoint,
                tenant,
                &config.client_id,
                cert,
                &environment.token_audience,
            ),
        }
        .map_err(token_error)?;
        credential.get_token().await.map_err(token_error)?;

        let client = ArmClient::new(
            http.clone(),
            &environment.resource_manager_endpoint,
            &config.subscription_id,
            Arc::new(credential),
            options.profile,
        )?
        .with_poll_frequency(options.poll_frequency)
        .with_lro_timeout(options.lro_timeout);

        Ok(SampleContext {
            admin_tenant_id: config.tenant_id.clone(),
            config,
            environment,
            http,
            client,
            disable_instance_discovery,
        })
    }

    pub fn location(&self) -> &str {
        &self.config.location
    }
}

/// `~/.ssh/id_rsa.pub`, or a relative `.ssh/id_rsa.pub` without a home
/// directory.
pub fn default_ssh_key_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_default()
        .join(".ssh")
        .join("id_rsa.pub")
}

/// Admin credentials of a sample VM. A missing key file is not an error
/// here; [`crate::hybrid::compute::os_profile`] decides whether the password
/// is enough.
pub fn vm_credentials(username: &str, password: Option<&str>, key_path: &Path) -> VmCredentials {
    let ssh_key_data = match std::fs::read_to_string(key_path) {
        Ok(data) => data.trim().to_string(),
        Err(e) => {
            log::debug!("no SSH public key at {}: {e}", key_path.display());
            String::new()
        }
    };
    VmCredentials {
        username: username.to_string(),
        password: password.unwrap_or_default().to_string(),
        ssh_key_data,
        ssh_key_path: key_path.display().to_string(),
    }
}

/// Fail early when neither a password nor a key file is available.
pub fn require_vm_login(creds: &VmCredentials) -> Result<()> {
    if creds.password.is_empty() && creds.ssh_key_data.is_empty() {
        return Err(format!(
            "Both VM admin password and SSH key pair path {} are invalid. At least one required to create VM. \
             Usage for password authentication: azure-stack-samples <SAMPLE> <PASSWORD>",
            creds.ssh_key_path
        )
        .into());
    }
    Ok(())
}
