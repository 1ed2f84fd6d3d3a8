//! Azure locations evaluated per service.

/// Public-cloud regions
const PUBLIC_REGIONS: &[&str] = &[
    "eastus",
    "eastus2",
    "westus",
    "centralus",
    "northcentralus",
    "southcentralus",
    "westcentralus",
    "westus2",
    "westus3",
    "canadacentral",
    "canadaeast",
    "brazilsouth",
    "northeurope",
    "westeurope",
    "uksouth",
    "ukwest",
    "francecentral",
    "germanywestcentral",
    "norwayeast",
    "switzerlandnorth",
    "swedencentral",
    "polandcentral",
    "italynorth",
    "eastasia",
    "southeastasia",
    "japaneast",
    "japanwest",
    "australiaeast",
    "australiasoutheast",
    "australiacentral",
    "centralindia",
    "southindia",
    "westindia",
    "koreacentral",
    "koreasouth",
    "uaenorth",
    "qatarcentral",
    "israelcentral",
    "southafricanorth",
];

/// Government-cloud regions
const GOV_REGIONS: &[&str] = &[
    "usgovvirginia",
    "usgovtexas",
    "usgovarizona",
    "usdodcentral",
    "usdodeast",
];

/// Services whose resources are not bound to a region
const GLOBAL_SERVICES: &[&str] = &[
    "resourceGroups",
    "roleDefinitions",
    "policyAssignments",
    "subscriptions",
    "users",
];

/// Pseudo-location used for global services
pub const GLOBAL_LOCATION: &str = "global";

/// Resolves the locations a plugin iterates for a service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Locations {
    govcloud: bool,
}

impl Locations {
    pub fn new(govcloud: bool) -> Self {
        Self { govcloud }
    }

    pub fn is_govcloud(&self) -> bool {
        self.govcloud
    }

    /// Every region of the selected cloud
    pub fn regions(&self) -> &'static [&'static str] {
        if self.govcloud {
            GOV_REGIONS
        } else {
            PUBLIC_REGIONS
        }
    }

    /// Locations to evaluate for `service`
    pub fn for_service(&self, service: &str) -> &'static [&'static str] {
        if GLOBAL_SERVICES.contains(&service) {
            &[GLOBAL_LOCATION]
        } else {
            self.regions()
        }
    }
}
