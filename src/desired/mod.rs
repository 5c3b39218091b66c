//! Desired state of a managed MySQL server.
//!
//! The declarative framework hands the core a loosely typed attribute map in
//! which nested blocks arrive as single-element sets. [`DesiredState`] is the
//! typed form of that map: nested blocks are plain optional structs, and
//! [`DesiredState::from_value`] enforces the single-element rule once at the
//! boundary.

mod attributes;
mod values;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ReconcileError;
use crate::secret::Secret;

pub use values::{
    CreateMode, GeoRedundantBackup, ServerVersion, SkuFamily, SkuTier, SslEnforcement,
    UnknownValue,
};

const SKU_NAMES: &[&str] = &[
    "B_Gen4_1",
    "B_Gen4_2",
    "B_Gen5_1",
    "B_Gen5_2",
    "GP_Gen4_2",
    "GP_Gen4_4",
    "GP_Gen4_8",
    "GP_Gen4_16",
    "GP_Gen4_32",
    "GP_Gen5_2",
    "GP_Gen5_4",
    "GP_Gen5_8",
    "GP_Gen5_16",
    "GP_Gen5_32",
    "MO_Gen5_2",
    "MO_Gen5_4",
    "MO_Gen5_8",
    "MO_Gen5_16",
];

const SKU_CAPACITIES: &[u32] = &[2, 4, 8, 16, 32];

const STORAGE_SIZES_MB: &[u32] = &[
    5_120, 128_000, 179_200, 256_000, 307_200, 384_000, 435_200, 512_000, 563_200, 640_000,
    691_200, 768_000, 819_200, 896_000, 947_200, 1_048_576,
];

const BACKUP_RETENTION_DAYS: std::ops::RangeInclusive<u32> = 7..=35;

/// Pricing tier block.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Sku {
    /// Sku name such as `GP_Gen5_2`.
    pub name: String,
    /// Pricing tier.
    pub tier: SkuTier,
    /// Hardware generation.
    pub family: SkuFamily,
    /// vCore count.
    pub capacity: u32,
}

/// Storage and backup block.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct StorageProfile {
    /// Provisioned storage in megabytes. Fixed at creation.
    pub storage_mb: u32,
    /// Days backups are retained; `None` keeps the remote value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_retention_days: Option<u32>,
    /// Backup replication; `None` keeps the remote value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo_redundant_backup: Option<GeoRedundantBackup>,
}

/// User-declared configuration of one server, plus its computed host name.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct DesiredState {
    /// Server name. Fixed at creation.
    pub name: String,
    /// Region. Fixed at creation.
    pub location: String,
    /// Resource group. Fixed at creation.
    #[serde(rename = "resource_group_name")]
    pub resource_group: String,
    /// Pricing tier.
    #[serde(default, deserialize_with = "attributes::sku_block")]
    pub sku: Option<Sku>,
    /// Administrator user name. Fixed at creation.
    pub administrator_login: String,
    /// Administrator password. Never written back.
    #[serde(default, skip_serializing)]
    pub administrator_login_password: Secret,
    /// Engine version. Fixed at creation.
    pub version: ServerVersion,
    /// Storage and backup settings.
    #[serde(default, deserialize_with = "attributes::storage_profile_block")]
    pub storage_profile: Option<StorageProfile>,
    /// TLS requirement.
    pub ssl_enforcement: SslEnforcement,
    /// Creation flavour. Not reported back by reads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_mode: Option<CreateMode>,
    /// Resource tags.
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    /// Host name assigned by the control plane.
    #[serde(default, rename = "fqdn", skip_serializing_if = "Option::is_none")]
    pub fully_qualified_domain_name: Option<String>,
}

impl DesiredState {
    /// Checks that every field holds a value the control plane accepts.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::MalformedInput`] naming the first offending
    /// field.
    pub fn validate(&self) -> Result<(), ReconcileError> {
        require_non_empty("name", &self.name)?;
        require_non_empty("location", &self.location)?;
        require_non_empty("resource_group_name", &self.resource_group)?;
        require_non_empty("administrator_login", &self.administrator_login)?;
        if self.administrator_login_password.is_blank() {
            return Err(malformed("administrator_login_password must not be empty"));
        }

        let sku = self
            .sku
            .as_ref()
            .ok_or_else(|| malformed("exactly one `sku` block is required, found 0"))?;
        if !SKU_NAMES.iter().any(|known| known.eq_ignore_ascii_case(&sku.name)) {
            return Err(malformed(format!("unsupported sku name `{}`", sku.name)));
        }
        if !SKU_CAPACITIES.contains(&sku.capacity) {
            return Err(malformed(format!(
                "unsupported sku capacity {}",
                sku.capacity
            )));
        }

        let storage = self.storage_profile.as_ref().ok_or_else(|| {
            malformed("exactly one `storage_profile` block is required, found 0")
        })?;
        if !STORAGE_SIZES_MB.contains(&storage.storage_mb) {
            return Err(malformed(format!(
                "unsupported storage size {} MB",
                storage.storage_mb
            )));
        }
        if let Some(days) = storage.backup_retention_days
            && !BACKUP_RETENTION_DAYS.contains(&days)
        {
            return Err(malformed(format!(
                "backup_retention_days must be between {} and {}, got {days}",
                BACKUP_RETENTION_DAYS.start(),
                BACKUP_RETENTION_DAYS.end()
            )));
        }
        Ok(())
    }

    /// Lists the fixed-at-creation fields whose values differ between `self`
    /// (the stored state) and `planned`.
    ///
    /// Locations are compared after normalisation and resource groups without
    /// regard to case, matching how the control plane addresses them.
    #[must_use]
    pub fn replacement_fields(&self, planned: &Self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.name != planned.name {
            fields.push("name");
        }
        if normalize_location(&self.location) != normalize_location(&planned.location) {
            fields.push("location");
        }
        if !self.resource_group.eq_ignore_ascii_case(&planned.resource_group) {
            fields.push("resource_group_name");
        }
        if self.administrator_login != planned.administrator_login {
            fields.push("administrator_login");
        }
        if self.version != planned.version {
            fields.push("version");
        }
        let stored_mb = self.storage_profile.as_ref().map(|p| p.storage_mb);
        let planned_mb = planned.storage_profile.as_ref().map(|p| p.storage_mb);
        if stored_mb != planned_mb {
            fields.push("storage_profile.storage_mb");
        }
        fields
    }
}

/// Normalises a region name the way the control plane compares them.
///
/// ```
/// assert_eq!(dbserver::desired::normalize_location("West Europe"), "westeurope");
/// ```
#[must_use]
pub fn normalize_location(location: &str) -> String {
    location
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

fn require_non_empty(field: &str, value: &str) -> Result<(), ReconcileError> {
    if value.trim().is_empty() {
        return Err(malformed(format!("{field} must not be empty")));
    }
    Ok(())
}

fn malformed(message: impl Into<String>) -> ReconcileError {
    ReconcileError::MalformedInput(message.into())
}
