use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Azure Stack Hub provisioning samples
#[derive(Parser, Debug)]
#[command(name = "azure-stack-samples")]
#[command(about = "Provision resource groups, networks, storage, VMs and key vaults on Azure Stack Hub")]
#[command(version)]
pub struct CliArgs {
    /// Use azureSecretSpConfig.json even if a certificate config exists
    #[arg(long, global = true)]
    pub secret: bool,

    /// Delete the sample resource group at the end
    #[arg(long, global = true)]
    pub clean: bool,

    /// Disable authority instance discovery (always on for ADFS)
    #[arg(long = "disable-id", global = true)]
    pub disable_instance_discovery: bool,

    /// Directory holding azureCertSpConfig.json / azureSecretSpConfig.json
    #[arg(long, global = true, default_value = ".")]
    pub config_dir: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available samples
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Create, get, list and optionally delete a resource group
    ResourceGroup,

    /// Storage account lifecycle: name check, create, list, keys, delete
    Storage,

    /// Key vault with a full-access policy and a secret round trip
    Keyvault,

    /// VHD-backed VM, then a managed disk VM, in one resource group
    Vm {
        /// Admin password; optional when ~/.ssh/id_rsa.pub exists
        #[arg(value_name = "PASSWORD")]
        args: Vec<String>,
    },

    /// VM with an attached managed disk; `clean` deletes the resource group
    ManagedDisk {
        /// `clean`, or the admin password
        #[arg(value_name = "clean|PASSWORD")]
        args: Vec<String>,
    },

    /// Upload a file to a blob container; `clean` deletes the resource group
    Dataplane {
        #[arg(value_name = "clean")]
        args: Vec<String>,
    },

    /// VM sample configured from AZURE_* environment variables
    HybridVm {
        #[arg(value_name = "PASSWORD")]
        args: Vec<String>,
    },
}

/// At most one positional argument is accepted by the samples.
pub fn single_positional(args: &[String]) -> Result<Option<&str>, String> {
    match args {
        [] => Ok(None),
        [one] => Ok(Some(one.as_str())),
        _ => Err(format!(
            "Error, invalid number of CLI arguments: {}",
            args.len()
        )),
    }
}
