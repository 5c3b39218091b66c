//! Request and response bodies exchanged with the control plane.
//!
//! Enum-like values stay as strings here: the remote side normalises their
//! case, and the mapper owns the conversion into typed values.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::secret::Secret;

/// Pricing tier block.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Sku {
    /// Sku name such as `GP_Gen5_2`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Tier such as `GeneralPurpose`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
    /// vCore count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<i32>,
    /// Hardware generation such as `Gen5`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
}

/// Storage and backup block.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StorageProfile {
    /// Provisioned storage in megabytes.
    #[serde(rename = "storageMB", skip_serializing_if = "Option::is_none")]
    pub storage_mb: Option<i32>,
    /// Days backups are retained.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_retention_days: Option<i32>,
    /// `Enabled` or `Disabled`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geo_redundant_backup: Option<String>,
}

/// Body of a create request.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerForCreate {
    /// Region to place the server in.
    pub location: String,
    /// Pricing tier.
    pub sku: Sku,
    /// Server properties.
    pub properties: ServerPropertiesForCreate,
    /// Resource tags.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

/// Properties of a create request.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerPropertiesForCreate {
    /// Discriminator selecting the creation flavour.
    pub create_mode: String,
    /// Administrator user name.
    pub administrator_login: String,
    /// Administrator password.
    pub administrator_login_password: Secret,
    /// Engine version such as `5.7`.
    pub version: String,
    /// `Enabled` or `Disabled`.
    pub ssl_enforcement: String,
    /// Storage and backup settings.
    pub storage_profile: StorageProfile,
}

/// Body of an update request. Only mutable fields are representable.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerUpdateParameters {
    /// Pricing tier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<Sku>,
    /// Server properties.
    pub properties: ServerUpdateProperties,
    /// Resource tags; an empty map clears them.
    pub tags: BTreeMap<String, String>,
}

/// Properties of an update request.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerUpdateProperties {
    /// Backup settings; `storageMB` is never sent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_profile: Option<StorageProfile>,
    /// Administrator password.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub administrator_login_password: Option<Secret>,
    /// `Enabled` or `Disabled`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl_enforcement: Option<String>,
}

/// Server record returned by a read.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Server {
    /// Fully qualified resource identity.
    pub id: Option<String>,
    /// Server name.
    pub name: Option<String>,
    /// Region, in whatever spelling the control plane chose.
    pub location: Option<String>,
    /// Pricing tier.
    pub sku: Option<Sku>,
    /// Server properties.
    pub properties: Option<ServerProperties>,
    /// Resource tags.
    pub tags: Option<BTreeMap<String, String>>,
}

/// Properties of a server record.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerProperties {
    /// Administrator user name.
    pub administrator_login: Option<String>,
    /// Engine version.
    pub version: Option<String>,
    /// `Enabled` or `Disabled`.
    pub ssl_enforcement: Option<String>,
    /// Provisioning state such as `Ready`.
    pub user_visible_state: Option<String>,
    /// Host name clients connect to.
    pub fully_qualified_domain_name: Option<String>,
    /// Earliest point-in-time restore timestamp.
    pub earliest_restore_date: Option<String>,
    /// Storage and backup settings.
    pub storage_profile: Option<StorageProfile>,
}
