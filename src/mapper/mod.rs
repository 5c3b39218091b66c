//! Expansion of desired state into request bodies and flattening of remote
//! records back into desired state.
//!
//! Everything here is pure: no I/O, no logging, no knowledge of which
//! lifecycle step is running.

use crate::api::wire;
use crate::desired::{CreateMode, DesiredState, Sku, StorageProfile, normalize_location};
use crate::error::ReconcileError;

/// Builds the sku block of a request.
///
/// # Errors
///
/// Returns [`ReconcileError::MalformedInput`] when the desired state has no
/// sku block or the capacity does not fit the wire type.
pub fn expand_sku(desired: &DesiredState) -> Result<wire::Sku, ReconcileError> {
    let sku = desired.sku.as_ref().ok_or_else(|| {
        ReconcileError::MalformedInput(String::from(
            "exactly one `sku` block is required, found 0",
        ))
    })?;
    Ok(wire::Sku {
        name: Some(sku.name.clone()),
        tier: Some(sku.tier.as_str().to_owned()),
        capacity: Some(to_wire_int("sku.capacity", sku.capacity)?),
        family: Some(sku.family.as_str().to_owned()),
    })
}

/// Builds the storage block of a create request.
///
/// # Errors
///
/// Returns [`ReconcileError::MalformedInput`] when the desired state has no
/// storage block or a number does not fit the wire type.
pub fn expand_storage_profile(
    desired: &DesiredState,
) -> Result<wire::StorageProfile, ReconcileError> {
    let profile = desired.storage_profile.as_ref().ok_or_else(|| {
        ReconcileError::MalformedInput(String::from(
            "exactly one `storage_profile` block is required, found 0",
        ))
    })?;
    Ok(wire::StorageProfile {
        storage_mb: Some(to_wire_int("storage_profile.storage_mb", profile.storage_mb)?),
        backup_retention_days: profile
            .backup_retention_days
            .map(|days| to_wire_int("storage_profile.backup_retention_days", days))
            .transpose()?,
        geo_redundant_backup: profile
            .geo_redundant_backup
            .map(|geo| geo.as_str().to_owned()),
    })
}

/// Converts a remote sku block into its desired-state form.
///
/// # Errors
///
/// Returns [`ReconcileError::IncompleteRemoteData`] when name, tier,
/// capacity, or family is absent, and
/// [`ReconcileError::UnrecognisedRemoteValue`] when one holds an unknown
/// value.
pub fn flatten_sku(remote: &wire::Sku) -> Result<Sku, ReconcileError> {
    let name = required("sku.name", remote.name.as_ref())?;
    let tier = required("sku.tier", remote.tier.as_ref())?;
    let capacity = required("sku.capacity", remote.capacity.as_ref())?;
    let family = required("sku.family", remote.family.as_ref())?;

    Ok(Sku {
        name: name.clone(),
        tier: tier
            .parse()
            .map_err(|_| ReconcileError::unrecognised("sku.tier", tier.as_str()))?,
        family: family
            .parse()
            .map_err(|_| ReconcileError::unrecognised("sku.family", family.as_str()))?,
        capacity: from_wire_int("sku.capacity", *capacity)?,
    })
}

/// Converts a remote storage block into its desired-state form.
///
/// # Errors
///
/// Returns [`ReconcileError::IncompleteRemoteData`] when `storageMB` is
/// absent, and [`ReconcileError::UnrecognisedRemoteValue`] for negative
/// numbers or unknown backup settings.
pub fn flatten_storage_profile(
    remote: &wire::StorageProfile,
) -> Result<StorageProfile, ReconcileError> {
    let storage_mb = required("storage_profile.storage_mb", remote.storage_mb.as_ref())?;
    Ok(StorageProfile {
        storage_mb: from_wire_int("storage_profile.storage_mb", *storage_mb)?,
        backup_retention_days: remote
            .backup_retention_days
            .map(|days| from_wire_int("storage_profile.backup_retention_days", days))
            .transpose()?,
        geo_redundant_backup: remote
            .geo_redundant_backup
            .as_deref()
            .map(|geo| {
                geo.parse().map_err(|_| {
                    ReconcileError::unrecognised("storage_profile.geo_redundant_backup", geo)
                })
            })
            .transpose()?,
    })
}

/// Builds the body of a create request.
///
/// # Errors
///
/// Propagates errors from [`expand_sku`] and [`expand_storage_profile`].
pub fn expand_create(desired: &DesiredState) -> Result<wire::ServerForCreate, ReconcileError> {
    Ok(wire::ServerForCreate {
        location: desired.location.clone(),
        sku: expand_sku(desired)?,
        properties: wire::ServerPropertiesForCreate {
            create_mode: desired
                .create_mode
                .unwrap_or(CreateMode::Default)
                .as_str()
                .to_owned(),
            administrator_login: desired.administrator_login.clone(),
            administrator_login_password: desired.administrator_login_password.clone(),
            version: desired.version.as_str().to_owned(),
            ssl_enforcement: desired.ssl_enforcement.as_str().to_owned(),
            storage_profile: expand_storage_profile(desired)?,
        },
        tags: desired.tags.clone(),
    })
}

/// Builds the body of an update request.
///
/// Fields fixed at creation are never carried: the engine version and
/// administrator login have no slot in the body, and `storageMB` is dropped
/// from the storage block. Unset backup settings stay unset so the remote
/// values are kept.
///
/// # Errors
///
/// Propagates errors from [`expand_sku`] and [`expand_storage_profile`].
pub fn expand_update(
    desired: &DesiredState,
) -> Result<wire::ServerUpdateParameters, ReconcileError> {
    let storage = wire::StorageProfile {
        storage_mb: None,
        ..expand_storage_profile(desired)?
    };
    let storage_profile = (storage != wire::StorageProfile::default()).then_some(storage);

    Ok(wire::ServerUpdateParameters {
        sku: Some(expand_sku(desired)?),
        properties: wire::ServerUpdateProperties {
            storage_profile,
            administrator_login_password: Some(desired.administrator_login_password.clone()),
            ssl_enforcement: Some(desired.ssl_enforcement.as_str().to_owned()),
        },
        tags: desired.tags.clone(),
    })
}

/// Produces the desired state implied by a remote record.
///
/// Values the control plane never returns (the password and the creation
/// flavour) are carried over from `prior`. The resource group is taken from
/// `prior` as well; callers that hold an identity overwrite it.
///
/// # Errors
///
/// Returns [`ReconcileError::IncompleteRemoteData`] when a required field is
/// absent and [`ReconcileError::UnrecognisedRemoteValue`] when an enum-like
/// field holds an unknown value.
pub fn flatten_server(
    remote: &wire::Server,
    prior: &DesiredState,
) -> Result<DesiredState, ReconcileError> {
    let properties = required("properties", remote.properties.as_ref())?;
    let version = required("properties.version", properties.version.as_ref())?;
    let ssl = required(
        "properties.ssl_enforcement",
        properties.ssl_enforcement.as_ref(),
    )?;

    Ok(DesiredState {
        name: required("name", remote.name.as_ref())?.clone(),
        location: remote
            .location
            .as_deref()
            .map_or_else(|| prior.location.clone(), normalize_location),
        resource_group: prior.resource_group.clone(),
        sku: Some(flatten_sku(required("sku", remote.sku.as_ref())?)?),
        administrator_login: required(
            "properties.administrator_login",
            properties.administrator_login.as_ref(),
        )?
        .clone(),
        administrator_login_password: prior.administrator_login_password.clone(),
        version: version
            .parse()
            .map_err(|_| ReconcileError::unrecognised("properties.version", version.as_str()))?,
        storage_profile: Some(flatten_storage_profile(required(
            "properties.storage_profile",
            properties.storage_profile.as_ref(),
        )?)?),
        ssl_enforcement: ssl.parse().map_err(|_| {
            ReconcileError::unrecognised("properties.ssl_enforcement", ssl.as_str())
        })?,
        create_mode: prior.create_mode,
        tags: remote.tags.clone().unwrap_or_default(),
        fully_qualified_domain_name: properties.fully_qualified_domain_name.clone(),
    })
}

fn required<'a, T>(field: &str, value: Option<&'a T>) -> Result<&'a T, ReconcileError> {
    value.ok_or_else(|| ReconcileError::incomplete(field))
}

fn to_wire_int(field: &str, value: u32) -> Result<i32, ReconcileError> {
    i32::try_from(value)
        .map_err(|_| ReconcileError::MalformedInput(format!("{field} {value} is out of range")))
}

fn from_wire_int(field: &str, value: i32) -> Result<u32, ReconcileError> {
    u32::try_from(value).map_err(|_| ReconcileError::unrecognised(field, value.to_string()))
}
