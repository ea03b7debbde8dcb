use super::SampleContext;
use crate::azure::{ArmClient, PROFILE_2018_03_01};
use crate::hybrid::compute::{self, VmCredentials};
use crate::hybrid::{network, resources, storage, Result};
use crate::output;

pub const RESOURCE_GROUP: &str = "azure-sample-rg";
const VM: &str = "az-samples-go-vmname";
const NIC: &str = "nic1";
pub const USERNAME: &str = "VMAdmin";
const VNET: &str = "vnet1";
const SUBNET: &str = "subnet1";
const NSG: &str = "nsg1";
const PUBLIC_IP: &str = "ip1";
const STORAGE_ACCOUNT: &str = "samplestacc";

/// Print a failed step and remember it; the steps after the network
/// security group do not depend on each other's success.
fn report(failed: &mut bool, result: Result<()>) {
    if let Err(e) = result {
        output::failure(&e.to_string());
        *failed = true;
    }
}

async fn create_vm(
    ctx: &SampleContext,
    legacy: &ArmClient,
    creds: &VmCredentials,
) -> Result<()> {
    let client = &ctx.client;
    let nic = network::get_nic(legacy, RESOURCE_GROUP, NIC)
        .await
        .map_err(|e| format!("Cannot create VM, reason: failed to get network interface: {e}"))?;
    let vhd = compute::vhd_uri(
        STORAGE_ACCOUNT,
        &ctx.environment.storage_endpoint_suffix,
        VM,
    );
    compute::create_vm(
        client,
        RESOURCE_GROUP,
        VM,
        ctx.location(),
        nic.id.as_deref(),
        &vhd,
        creds,
    )
    .await?;
    Ok(())
}

/// RG, VNet and NSG must succeed; the public IP, NIC, storage account and
/// VM are each attempted and their failures collected.
///
/// Network and storage calls use the 2018-03-01 profile, resources and
/// compute the context's profile.
pub async fn run(ctx: &SampleContext, creds: &VmCredentials) -> Result<()> {
    let client = &ctx.client;
    let legacy = client.with_profile(PROFILE_2018_03_01);
    let location = ctx.location();

    output::step(&format!("Creating resource group '{RESOURCE_GROUP}'..."));
    resources::create_resource_group(client, RESOURCE_GROUP, location).await?;

    output::step(&format!("Creating virtual network '{VNET}' and subnet '{SUBNET}'..."));
    network::create_virtual_network_and_subnets(&legacy, RESOURCE_GROUP, VNET, SUBNET, location)
        .await?;

    output::step(&format!("Creating network security group '{NSG}'..."));
    network::create_network_security_group(&legacy, RESOURCE_GROUP, NSG, location).await?;

    let mut failed = false;

    output::step(&format!("Creating public ip '{PUBLIC_IP}'..."));
    let result = network::create_public_ip(&legacy, RESOURCE_GROUP, PUBLIC_IP, location)
        .await
        .map(|_| ());
    report(&mut failed, result);

    output::step(&format!("Creating network interface '{NIC}'..."));
    let result = network::create_network_interface(
        &legacy,
        RESOURCE_GROUP,
        NIC,
        NSG,
        VNET,
        SUBNET,
        PUBLIC_IP,
        location,
    )
    .await
    .map(|_| ());
    report(&mut failed, result);

    output::step(&format!("Creating storage account '{STORAGE_ACCOUNT}'..."));
    let result =
        storage::create_storage_account(&legacy, STORAGE_ACCOUNT, RESOURCE_GROUP, location, None)
            .await
            .map(|_| ());
    report(&mut failed, result);

    output::step(&format!("Creating vm '{VM}'..."));
    report(&mut failed, create_vm(ctx, &legacy, creds).await);

    if failed {
        return Err("hybrid VM sample finished with errors".into());
    }
    output::success("Sample completed successfully.");
    Ok(())
}
