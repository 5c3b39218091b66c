//! Error types surfaced by the reconciliation core.

use thiserror::Error;

use crate::api::ApiError;
use crate::identity::IdentityError;

/// Errors raised by the mapper, identity resolver, waiter, and reconciler.
///
/// Every variant leaves the local [`crate::ServerInstance`] in a state from
/// which the same operation can be invoked again once the cause is fixed.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ReconcileError {
    /// Desired state violates the block or value constraints of the resource.
    #[error("malformed desired state: {0}")]
    MalformedInput(String),
    /// Persisted or imported identity does not decode.
    #[error(transparent)]
    InvalidIdentity(#[from] IdentityError),
    /// The server does not exist remotely.
    #[error("server {name} (resource group {resource_group}) not found")]
    NotFound {
        /// Resource group that was queried.
        resource_group: String,
        /// Server name that was queried.
        name: String,
    },
    /// The remote record lacks a field the API contract guarantees.
    #[error("remote record is missing required field `{field}`")]
    IncompleteRemoteData {
        /// Dotted path of the missing field.
        field: String,
    },
    /// The remote record carries a value outside the known set.
    #[error("remote record has unrecognised value `{value}` for `{field}`")]
    UnrecognisedRemoteValue {
        /// Dotted path of the offending field.
        field: String,
        /// Value returned by the remote system.
        value: String,
    },
    /// A long-running operation finished unsuccessfully.
    #[error("remote operation failed: {detail}")]
    OperationFailed {
        /// Detail reported by the remote system.
        detail: String,
    },
    /// The caller's cancellation token fired.
    #[error("operation cancelled")]
    Cancelled,
    /// Network, authentication, or protocol failure from the API client,
    /// passed through unchanged.
    #[error("transport error: {0}")]
    Transport(#[from] ApiError),
    /// Update was asked to change fields that can only be set at creation.
    #[error("changing {} requires replacing the server", .fields.join(", "))]
    RequiresReplacement {
        /// Names of the changed immutable fields.
        fields: Vec<&'static str>,
    },
    /// Create was invoked for an instance that already has an identity.
    #[error("server is already managed as {id}")]
    AlreadyManaged {
        /// Identity currently stored.
        id: String,
    },
    /// Update or delete was invoked for an instance without an identity.
    #[error("server has no stored identity")]
    Unmanaged,
}

impl ReconcileError {
    pub(crate) fn incomplete(field: &str) -> Self {
        Self::IncompleteRemoteData {
            field: field.to_owned(),
        }
    }

    pub(crate) fn unrecognised(field: &str, value: impl Into<String>) -> Self {
        Self::UnrecognisedRemoteValue {
            field: field.to_owned(),
            value: value.into(),
        }
    }
}
