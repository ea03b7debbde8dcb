//! Azure Stack Hub provisioning samples.
//!
//! Each subcommand of the binary runs one fixed sequence of Azure Resource
//! Manager calls. The crate carries its own thin ARM client: environment
//! discovery, service principal tokens, long-running operation polling and
//! `nextLink` paging.

pub mod azure;
pub mod cli;
pub mod config;
pub mod hybrid;
pub mod logging;
pub mod models;
pub mod output;
pub mod samples;

use azure::PROVISIONING_TIMEOUT;
use cli::{single_positional, CliArgs, Commands};
use config::{load_sp_config, AuthMode, SpConfig};
use samples::{default_ssh_key_path, ConnectOptions, SampleContext};

fn connect_options(args: &CliArgs) -> ConnectOptions {
    let mut options = ConnectOptions {
        disable_instance_discovery: args.disable_instance_discovery,
        ..Default::default()
    };
    // Only the vm sample bounds its network waits to a minute.
    if matches!(args.command, Commands::ManagedDisk { .. } | Commands::HybridVm { .. }) {
        options.lro_timeout = PROVISIONING_TIMEOUT;
    }
    options
}

async fn connect_from_files(args: &CliArgs) -> hybrid::Result<SampleContext> {
    let (config, auth) = load_sp_config(&args.config_dir, args.secret)?;
    SampleContext::connect(config, auth, connect_options(args)).await
}

/// Run the sample selected on the command line.
///
/// Positional arguments are validated before any network call is made.
pub async fn run(args: &CliArgs) -> hybrid::Result<()> {
    match &args.command {
        Commands::ResourceGroup => {
            let ctx = connect_from_files(args).await?;
            samples::resource_group::run(&ctx, args.clean).await
        }
        Commands::Storage => {
            let ctx = connect_from_files(args).await?;
            samples::storage::run(&ctx, args.clean).await
        }
        Commands::Keyvault => {
            let ctx = connect_from_files(args).await?;
            samples::keyvault::run(&ctx, args.clean).await
        }
        Commands::Vm { args: positional } => {
            let password = single_positional(positional)?;
            let ctx = connect_from_files(args).await?;
            samples::vm::run(&ctx, password, args.clean).await
        }
        Commands::ManagedDisk { args: positional } => {
            let arg = single_positional(positional)?;
            if args.clean || arg == Some("clean") {
                let ctx = connect_from_files(args).await?;
                return samples::managed_disk::clean(&ctx).await;
            }
            let creds = samples::vm_credentials(
                samples::managed_disk::USERNAME,
                arg,
                &default_ssh_key_path(),
            );
            samples::require_vm_login(&creds)?;
            let ctx = connect_from_files(args).await?;
            samples::managed_disk::run(&ctx, &creds).await
        }
        Commands::Dataplane { args: positional } => {
            let clean = match single_positional(positional)? {
                Some("clean") => true,
                Some(other) => return Err(format!("Error, unknown argument: {other}").into()),
                None => args.clean,
            };
            let ctx = connect_from_files(args).await?;
            if clean {
                samples::dataplane::clean(&ctx).await
            } else {
                let file = std::env::current_dir()?.join(samples::dataplane::UPLOAD_FILE);
                samples::dataplane::run(&ctx, &file).await
            }
        }
        Commands::HybridVm { args: positional } => {
            let password = single_positional(positional)?;
            let creds = samples::vm_credentials(
                samples::hybrid_vm::USERNAME,
                password,
                &default_ssh_key_path(),
            );
            samples::require_vm_login(&creds)?;
            let ctx =
                SampleContext::connect(SpConfig::from_env(), AuthMode::Secret, connect_options(args))
                    .await?;
            samples::hybrid_vm::run(&ctx, &creds).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_connect_options_wait_long_for_vm_samples() {
        let args = CliArgs::parse_from(["azure-stack-samples", "managed-disk", "clean"]);
        assert_eq!(connect_options(&args).lro_timeout, PROVISIONING_TIMEOUT);
        let args = CliArgs::parse_from(["azure-stack-samples", "hybrid-vm"]);
        assert_eq!(connect_options(&args).lro_timeout, PROVISIONING_TIMEOUT);
        let args = CliArgs::parse_from(["azure-stack-samples", "--disable-id", "vm"]);
        let options = connect_options(&args);
        assert_eq!(options.lro_timeout, azure::DEFAULT_LRO_TIMEOUT);
        assert!(options.disable_instance_discovery);
    }
}
