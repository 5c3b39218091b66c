//! Structured identifiers for managed database servers.
//!
//! The remote control plane addresses a server by a path of the form
//! `/subscriptions/{sub}/resourceGroups/{rg}/providers/{namespace}/servers/{name}`.
//! The path is the only key persisted locally, so it must survive a
//! parse/format round trip unchanged.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

const SUBSCRIPTIONS: &str = "subscriptions";
const RESOURCE_GROUPS: &str = "resourceGroups";
const PROVIDERS: &str = "providers";
const SERVERS: &str = "servers";

/// Errors raised while decoding a resource identity.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("invalid server identity `{input}`: {reason}")]
pub struct IdentityError {
    /// Identity string as supplied.
    pub input: String,
    /// Which part of the grammar was violated.
    pub reason: String,
}

impl IdentityError {
    fn new(input: &str, reason: impl Into<String>) -> Self {
        Self {
            input: input.to_owned(),
            reason: reason.into(),
        }
    }
}

/// Decoded server identity.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct ResourceId {
    /// Subscription owning the resource group.
    pub subscription_id: String,
    /// Resource group holding the server.
    pub resource_group: String,
    /// Provider namespace, for example `Microsoft.DBforMySQL`.
    pub provider: String,
    /// Server name.
    pub name: String,
}

impl ResourceId {
    /// Builds an identity from its components.
    #[must_use]
    pub fn new(
        subscription_id: impl Into<String>,
        resource_group: impl Into<String>,
        provider: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group: resource_group.into(),
            provider: provider.into(),
            name: name.into(),
        }
    }

    /// Parses an identity string.
    ///
    /// Key segments are matched case-insensitively because the control plane
    /// treats identities that way; [`fmt::Display`] emits the canonical
    /// spelling.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError`] when the path is not a sequence of
    /// `key/value` pairs in the order subscriptions, resource group,
    /// providers, servers, or when any value is empty.
    pub fn parse(input: &str) -> Result<Self, IdentityError> {
        let trimmed = input.trim();
        if !trimmed.starts_with('/') {
            return Err(IdentityError::new(input, "must start with `/`"));
        }

        let segments: Vec<&str> = trimmed.trim_matches('/').split('/').collect();
        if segments.iter().any(|segment| segment.is_empty()) {
            return Err(IdentityError::new(input, "contains an empty path segment"));
        }
        let chunks = segments.chunks_exact(2);
        if !chunks.remainder().is_empty() {
            return Err(IdentityError::new(input, "key without a value"));
        }

        let mut pairs = chunks.map(|pair| match pair {
            [key, value] => (*key, *value),
            _ => ("", ""),
        });

        let subscription_id = expect_key(input, pairs.next(), SUBSCRIPTIONS)?;
        let resource_group = expect_key(input, pairs.next(), RESOURCE_GROUPS)?;
        let provider = expect_key(input, pairs.next(), PROVIDERS)?;
        let name = expect_key(input, pairs.next(), SERVERS)?;

        if let Some((key, _)) = pairs.next() {
            return Err(IdentityError::new(
                input,
                format!("unexpected segment `{key}` after the server name"),
            ));
        }

        Ok(Self::new(subscription_id, resource_group, provider, name))
    }
}

fn expect_key<'a>(
    input: &str,
    pair: Option<(&str, &'a str)>,
    expected: &str,
) -> Result<&'a str, IdentityError> {
    match pair {
        Some((key, value)) if key.eq_ignore_ascii_case(expected) => Ok(value),
        Some((key, _)) => Err(IdentityError::new(
            input,
            format!("expected `{expected}` segment, found `{key}`"),
        )),
        None => Err(IdentityError::new(
            input,
            format!("missing `{expected}` segment"),
        )),
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "/{SUBSCRIPTIONS}/{}/{RESOURCE_GROUPS}/{}/{PROVIDERS}/{}/{SERVERS}/{}",
            self.subscription_id, self.resource_group, self.provider, self.name
        )
    }
}

impl FromStr for ResourceId {
    type Err = IdentityError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}
