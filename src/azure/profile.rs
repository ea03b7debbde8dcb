//! Azure Stack Hub API profiles.
//!
//! A profile pins one API version per resource provider so the same calls
//! work against every stamp that supports the profile.

/// API versions used for each resource provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiProfile {
    pub name: &'static str,
    pub resources: &'static str,
    pub network: &'static str,
    pub storage: &'static str,
    pub compute: &'static str,
    pub disks: &'static str,
    pub keyvault: &'static str,
}

/// `2020-09-01-hybrid`, supported by Azure Stack Hub 2008 and later.
pub const PROFILE_2020_09_01: ApiProfile = ApiProfile {
    name: "2020-09-01-hybrid",
    resources: "2019-10-01",
    network: "2018-11-01",
    storage: "2019-06-01",
    compute: "2020-06-01",
    disks: "2019-07-01",
    keyvault: "2016-10-01",
};

/// `2018-03-01-hybrid`, the profile of the older samples.
pub const PROFILE_2018_03_01: ApiProfile = ApiProfile {
    name: "2018-03-01-hybrid",
    resources: "2018-02-01",
    network: "2017-10-01",
    storage: "2016-01-01",
    compute: "2017-03-30",
    disks: "2017-03-30",
    keyvault: "2016-10-01",
};

/// Version of the generic `resources` list used to enumerate key vaults.
pub const GENERIC_RESOURCES_API_VERSION: &str = "2015-11-01";

impl Default for ApiProfile {
    fn default() -> Self {
        PROFILE_2020_09_01
    }
}
