//! Conversion between the framework's attribute map and [`DesiredState`].

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::{DesiredState, Sku, StorageProfile};
use crate::error::ReconcileError;

/// Decodes a nested block given bare or as a set holding exactly one element.
///
/// The element is decoded on its own so field-level errors keep their cause.
fn singleton<'de, D, T>(deserializer: D, block: &str) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let element = match Option::<Value>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(Value::Array(items)) => {
            let found = items.len();
            let mut elements = items.into_iter();
            match (elements.next(), elements.next()) {
                (Some(item), None) => item,
                _ => {
                    return Err(D::Error::custom(format!(
                        "exactly one `{block}` block is required, found {found}"
                    )));
                }
            }
        }
        Some(other) => other,
    };
    serde_json::from_value(element)
        .map(Some)
        .map_err(|err| D::Error::custom(format!("invalid `{block}` block: {err}")))
}

pub(super) fn sku_block<'de, D>(deserializer: D) -> Result<Option<Sku>, D::Error>
where
    D: Deserializer<'de>,
{
    singleton(deserializer, "sku")
}

pub(super) fn storage_profile_block<'de, D>(
    deserializer: D,
) -> Result<Option<StorageProfile>, D::Error>
where
    D: Deserializer<'de>,
{
    singleton(deserializer, "storage_profile")
}

impl DesiredState {
    /// Builds a desired state from the framework's attribute map.
    ///
    /// `sku` and `storage_profile` may be given either as an object or as a
    /// set holding exactly one object. Enum-like values are matched without
    /// regard to case. The result is not range-checked; call
    /// [`DesiredState::validate`] for that.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::MalformedInput`] when a block set does not
    /// hold exactly one element, a required attribute is missing, or a value
    /// has the wrong shape.
    pub fn from_value(value: Value) -> Result<Self, ReconcileError> {
        serde_json::from_value(value).map_err(|err| ReconcileError::MalformedInput(err.to_string()))
    }

    /// Renders the state as an attribute map for the framework to persist.
    ///
    /// The administrator password is omitted.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::MalformedInput`] if the state cannot be
    /// encoded.
    pub fn to_value(&self) -> Result<Value, ReconcileError> {
        serde_json::to_value(self).map_err(|err| ReconcileError::MalformedInput(err.to_string()))
    }
}
