//! Storage account payloads.

use serde::Deserialize;

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct CheckNameAvailabilityResult {
    #[serde(default)]
    pub name_available: bool,
    pub reason: Option<String>,
    pub message: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct StorageAccount {
    pub id: Option<String>,
    pub name: Option<String>,
    pub location: Option<String>,
    pub kind: Option<String>,
    pub sku: Option<Sku>,
    pub properties: Option<StorageAccountProperties>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct Sku {
    pub name: Option<String>,
    pub tier: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct StorageAccountProperties {
    pub provisioning_state: Option<String>,
    pub primary_endpoints: Option<Endpoints>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct Endpoints {
    pub blob: Option<String>,
    pub queue: Option<String>,
    pub table: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct StorageAccountKeys {
    #[serde(default)]
    pub keys: Vec<StorageAccountKey>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct StorageAccountKey {
    pub key_name: Option<String>,
    pub value: Option<String>,
    pub permissions: Option<String>,
}
