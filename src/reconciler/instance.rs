//! Local record of one managed server.

use super::Phase;
use crate::desired::DesiredState;
use crate::error::ReconcileError;
use crate::identity::ResourceId;

/// Desired state paired with the identity persisted for it.
///
/// Only [`super::ServerReconciler`] assigns or clears the identity.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ServerInstance {
    id: Option<ResourceId>,
    desired: DesiredState,
}

impl ServerInstance {
    /// Starts tracking a server that has not been created yet.
    #[must_use]
    pub const fn new(desired: DesiredState) -> Self {
        Self { id: None, desired }
    }

    /// Restores an instance from the framework's persisted key.
    ///
    /// An empty key means the server is absent.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::InvalidIdentity`] when a non-empty key does
    /// not decode.
    pub fn from_persisted(desired: DesiredState, persisted_id: &str) -> Result<Self, ReconcileError> {
        if persisted_id.trim().is_empty() {
            return Ok(Self::new(desired));
        }
        Ok(Self::managed(ResourceId::parse(persisted_id)?, desired))
    }

    pub(super) const fn managed(id: ResourceId, desired: DesiredState) -> Self {
        Self {
            id: Some(id),
            desired,
        }
    }

    /// Stored identity, if the server exists.
    #[must_use]
    pub const fn id(&self) -> Option<&ResourceId> {
        self.id.as_ref()
    }

    /// Key for the framework to persist; empty when absent.
    #[must_use]
    pub fn persisted_id(&self) -> String {
        self.id.as_ref().map(ToString::to_string).unwrap_or_default()
    }

    /// Current desired state, including read-back values.
    #[must_use]
    pub const fn desired(&self) -> &DesiredState {
        &self.desired
    }

    /// Consumes the instance, returning the desired state.
    #[must_use]
    pub fn into_desired(self) -> DesiredState {
        self.desired
    }

    /// Whether the server is known to exist.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        if self.id.is_some() {
            Phase::Present
        } else {
            Phase::Absent
        }
    }

    pub(super) fn assign(&mut self, id: Option<ResourceId>, desired: DesiredState) {
        self.id = id;
        self.desired = desired;
    }

    pub(super) fn clear(&mut self) {
        self.id = None;
        self.desired.fully_qualified_domain_name = None;
    }
}
