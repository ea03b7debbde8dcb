//! Virtual machine and managed disk operations.

use super::Result;
use crate::azure::{ArmClient, PROVISIONING_TIMEOUT};
use crate::models::{Disk, VirtualMachine};
use serde_json::{json, Value};
use std::time::Duration;

pub const PUBLISHER: &str = "Canonical";
pub const OFFER: &str = "UbuntuServer";
pub const SKU: &str = "16.04-LTS";
pub const VM_SIZE: &str = "Standard_A1";

const VIRTUAL_MACHINES: &str = "Microsoft.Compute/virtualMachines";
const DISKS: &str = "Microsoft.Compute/disks";
const ERROR_PREFIX: &str = "Cannot create VM, reason:";

/// How the admin account of a new VM logs in.
#[derive(Debug, Clone, Default)]
pub struct VmCredentials {
    pub username: String,
    pub password: String,
    pub ssh_key_data: String,
    /// Where the SSH key was looked up, for error messages.
    pub ssh_key_path: String,
}

/// Build the `osProfile` of a VM.
///
/// An SSH key wins over a password; one of the two is required, and so is
/// the username.
pub fn os_profile(vm_name: &str, creds: &VmCredentials) -> Result<Value> {
    let VmCredentials {
        username,
        password,
        ssh_key_data,
        ssh_key_path,
    } = creds;

    if !username.is_empty() && !ssh_key_data.is_empty() {
        Ok(json!({
            "computerName": vm_name,
            "adminUsername": username,
            "linuxConfiguration": {
                "ssh": {
                    "publicKeys": [{
                        "path": format!("/home/{username}/.ssh/authorized_keys"),
                        "keyData": ssh_key_data
                    }]
                }
            }
        }))
    } else if !username.is_empty() && !password.is_empty() {
        Ok(json!({
            "computerName": vm_name,
            "adminUsername": username,
            "adminPassword": password
        }))
    } else if ssh_key_data.is_empty() && password.is_empty() {
        Err(format!(
            "{ERROR_PREFIX} Both VM admin password and SSH key pair path {ssh_key_path} are invalid. \
             At least one required to create VM. Usage for password authentication: azure-stack-samples <SAMPLE> <PASSWORD>"
        )
        .into())
    } else {
        Err(format!("{ERROR_PREFIX} VM admin username is an empty string.").into())
    }
}

/// Blob URI of the unmanaged OS disk of `vm_name`.
pub fn vhd_uri(storage_account: &str, storage_suffix: &str, vm_name: &str) -> String {
    format!("https://{storage_account}.blob.{storage_suffix}/vhds/{vm_name}.vhd")
}

fn image_reference() -> Value {
    json!({
        "publisher": PUBLISHER,
        "offer": OFFER,
        "sku": SKU,
        "version": "latest"
    })
}

fn network_profile(nic_id: Option<&str>) -> Value {
    json!({
        "networkInterfaces": [{
            "id": nic_id,
            "properties": { "primary": true }
        }]
    })
}

/// VM whose OS disk is a VHD blob in a storage account.
pub fn vm_body(location: &str, os_profile: Value, nic_id: Option<&str>, vhd_uri: &str) -> Value {
    json!({
        "location": location,
        "properties": {
            "hardwareProfile": { "vmSize": VM_SIZE },
            "storageProfile": {
                "imageReference": image_reference(),
                "osDisk": {
                    "name": "osDisk",
                    "vhd": { "uri": vhd_uri },
                    "createOption": "FromImage"
                }
            },
            "osProfile": os_profile,
            "networkProfile": network_profile(nic_id)
        }
    })
}

/// VM with a managed OS disk and an existing managed disk attached at LUN 1.
pub fn managed_disk_vm_body(
    location: &str,
    os_profile: Value,
    nic_id: Option<&str>,
    disk_name: &str,
    disk_id: Option<&str>,
) -> Value {
    json!({
        "location": location,
        "properties": {
            "hardwareProfile": { "vmSize": VM_SIZE },
            "storageProfile": {
                "imageReference": image_reference(),
                "osDisk": {
                    "name": "osDisk",
                    "createOption": "FromImage"
                },
                "dataDisks": [{
                    "createOption": "Attach",
                    "managedDisk": {
                        "storageAccountType": "Standard_LRS",
                        "id": disk_id
                    },
                    "caching": "ReadOnly",
                    "diskSizeGB": 1,
                    "lun": 1,
                    "name": disk_name
                }]
            },
            "osProfile": os_profile,
            "networkProfile": network_profile(nic_id)
        }
    })
}

pub fn empty_disk_body(location: &str, size_gb: i32) -> Value {
    json!({
        "location": location,
        "properties": {
            "creationData": { "createOption": "Empty" },
            "diskSizeGB": size_gb
        }
    })
}

async fn put_vm(client: &ArmClient, rg: &str, vm_name: &str, body: &Value) -> Result<VirtualMachine> {
    let path = client.provider_path(rg, VIRTUAL_MACHINES, vm_name);
    let poller = client
        .begin_put(&path, client.profile().compute, body)
        .await
        .map_err(|e| format!("{ERROR_PREFIX} {e}"))?;
    let vm = poller
        .with_timeout(PROVISIONING_TIMEOUT)
        .wait()
        .await
        .map_err(|e| format!("{ERROR_PREFIX} {e}"))?;
    log::info!("virtual machine {vm_name} created");
    Ok(vm)
}

/// Create a VM on `nic_id` with an unmanaged OS disk at `vhd_uri`.
pub async fn create_vm(
    client: &ArmClient,
    rg: &str,
    vm_name: &str,
    location: &str,
    nic_id: Option<&str>,
    vhd_uri: &str,
    creds: &VmCredentials,
) -> Result<VirtualMachine> {
    let body = vm_body(location, os_profile(vm_name, creds)?, nic_id, vhd_uri);
    put_vm(client, rg, vm_name, &body).await
}

/// Create an empty managed disk of `size_gb` GB.
pub async fn create_managed_disk(
    client: &ArmClient,
    rg: &str,
    disk_name: &str,
    location: &str,
    size_gb: i32,
) -> Result<Disk> {
    let path = client.provider_path(rg, DISKS, disk_name);
    let poller = client
        .begin_put(&path, client.profile().disks, &empty_disk_body(location, size_gb))
        .await
        .map_err(|e| format!("{ERROR_PREFIX} {e}"))?;
    let disk = poller
        .wait()
        .await
        .map_err(|e| format!("{ERROR_PREFIX} {e}"))?;
    log::info!("managed disk {disk_name} created");
    Ok(disk)
}

/// Create a VM on `nic_id` with `disk` attached as a data disk.
#[allow(clippy::too_many_arguments)]
pub async fn create_vm_with_managed_disk(
    client: &ArmClient,
    rg: &str,
    vm_name: &str,
    location: &str,
    nic_id: Option<&str>,
    disk_name: &str,
    disk_id: Option<&str>,
    creds: &VmCredentials,
) -> Result<VirtualMachine> {
    let body = managed_disk_vm_body(
        location,
        os_profile(vm_name, creds)?,
        nic_id,
        disk_name,
        disk_id,
    );
    put_vm(client, rg, vm_name, &body).await
}

pub async fn get_vm(client: &ArmClient, rg: &str, vm_name: &str) -> Result<VirtualMachine> {
    let path = client.provider_path(rg, VIRTUAL_MACHINES, vm_name);
    Ok(client.get(&path, client.profile().compute).await?)
}

/// All VMs of a resource group, across pages.
pub async fn list_vms(client: &ArmClient, rg: &str) -> Result<Vec<VirtualMachine>> {
    let path = format!(
        "{}/providers/{VIRTUAL_MACHINES}",
        client.resource_group_path(rg)
    );
    Ok(client.list_all(&path, client.profile().compute, &[]).await?)
}

pub async fn delete_vm(
    client: &ArmClient,
    rg: &str,
    vm_name: &str,
    timeout: Duration,
) -> Result<()> {
    let path = client.provider_path(rg, VIRTUAL_MACHINES, vm_name);
    client
        .begin_delete(&path, client.profile().compute)
        .await?
        .with_timeout(timeout)
        .poll_until_done()
        .await
        .map_err(|e| format!("Error deleting vm {vm_name}: {e}"))?;
    log::info!("virtual machine {vm_name} deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds(username: &str, password: &str, key: &str) -> VmCredentials {
        VmCredentials {
            username: username.to_string(),
            password: password.to_string(),
            ssh_key_data: key.to_string(),
            ssh_key_path: "/home/me/.ssh/id_rsa.pub".to_string(),
        }
    }

    #[test]
    fn test_os_profile_prefers_ssh_key() {
        let profile = os_profile("vm1", &creds("VMAdmin", "Password!23", "ssh-rsa AAAA"))
            .expect("ssh profile");
        let key = &profile["linuxConfiguration"]["ssh"]["publicKeys"][0];
        assert_eq!(key["path"], "/home/VMAdmin/.ssh/authorized_keys");
        assert_eq!(key["keyData"], "ssh-rsa AAAA");
        assert!(profile.get("adminPassword").is_none());
    }

    #[test]
    fn test_os_profile_password() {
        let profile = os_profile("vm1", &creds("VMAdmin", "Password!23", "")).expect("profile");
        assert_eq!(profile["adminPassword"], "Password!23");
        assert_eq!(profile["computerName"], "vm1");
        assert!(profile.get("linuxConfiguration").is_none());
    }

    #[test]
    fn test_os_profile_needs_key_or_password() {
        let err = os_profile("vm1", &creds("VMAdmin", "", "")).expect_err("no credentials");
        let msg = err.to_string();
        assert!(msg.starts_with("Cannot create VM, reason: Both VM admin password and SSH key pair path"));
        assert!(msg.contains("/home/me/.ssh/id_rsa.pub"));
    }

    #[test]
    fn test_os_profile_needs_username() {
        let err = os_profile("vm1", &creds("", "Password!23", "")).expect_err("no username");
        assert_eq!(
            err.to_string(),
            "Cannot create VM, reason: VM admin username is an empty string."
        );
    }

    #[test]
    fn test_vhd_uri() {
        assert_eq!(
            vhd_uri("samplestacc", "local.azurestack.external", "vm1"),
            "https://samplestacc.blob.local.azurestack.external/vhds/vm1.vhd"
        );
    }

    #[test]
    fn test_managed_disk_vm_body() {
        let body = managed_disk_vm_body(
            "local",
            json!({}),
            Some("nic-id"),
            "disk1",
            Some("disk-id"),
        );
        let storage = &body["properties"]["storageProfile"];
        assert_eq!(storage["imageReference"]["publisher"], "Canonical");
        assert_eq!(storage["imageReference"]["sku"], "16.04-LTS");
        assert!(storage["osDisk"].get("vhd").is_none());
        let data = &storage["dataDisks"][0];
        assert_eq!(data["lun"], 1);
        assert_eq!(data["caching"], "ReadOnly");
        assert_eq!(data["managedDisk"]["id"], "disk-id");
        assert_eq!(data["managedDisk"]["storageAccountType"], "Standard_LRS");
        assert_eq!(
            body["properties"]["networkProfile"]["networkInterfaces"][0]["id"],
            "nic-id"
        );
        assert_eq!(body["properties"]["hardwareProfile"]["vmSize"], "Standard_A1");
    }

    #[test]
    fn test_empty_disk_body() {
        let body = empty_disk_body("local", 1);
        assert_eq!(body["properties"]["creationData"]["createOption"], "Empty");
        assert_eq!(body["properties"]["diskSizeGB"], 1);
    }
}
