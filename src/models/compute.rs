//! Virtual machine and managed disk payloads.

use serde::Deserialize;

use super::network::SubResource;

#[derive(Deserialize, Debug, Clone, Default)]
pub struct VirtualMachine {
    pub id: Option<String>,
    pub name: Option<String>,
    pub location: Option<String>,
    pub properties: Option<VirtualMachineProperties>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineProperties {
    pub vm_id: Option<String>,
    pub hardware_profile: Option<HardwareProfile>,
    pub storage_profile: Option<StorageProfile>,
    pub os_profile: Option<OsProfile>,
    pub provisioning_state: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct HardwareProfile {
    pub vm_size: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct StorageProfile {
    pub os_disk: Option<OsDisk>,
    #[serde(default)]
    pub data_disks: Vec<DataDisk>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct OsDisk {
    pub name: Option<String>,
    pub vhd: Option<VirtualHardDisk>,
    pub managed_disk: Option<SubResource>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct VirtualHardDisk {
    pub uri: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct DataDisk {
    pub name: Option<String>,
    pub lun: Option<i32>,
    pub caching: Option<String>,
    #[serde(rename = "diskSizeGB")]
    pub disk_size_gb: Option<i32>,
    pub managed_disk: Option<SubResource>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct OsProfile {
    pub computer_name: Option<String>,
    pub admin_username: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct Disk {
    pub id: Option<String>,
    pub name: Option<String>,
    pub location: Option<String>,
    pub properties: Option<DiskProperties>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct DiskProperties {
    #[serde(rename = "diskSizeGB")]
    pub disk_size_gb: Option<i32>,
    pub disk_state: Option<String>,
    pub provisioning_state: Option<String>,
}
