//! Create, read, update, delete, and import for one managed server.
//!
//! A [`ServerInstance`] pairs the desired state with the identity stored for
//! it. [`ServerReconciler`] moves an instance through its lifecycle:
//!
//! - create: submit, wait, read back, then store the identity;
//! - read: refresh from the remote record, clearing the identity on drift;
//! - update: reject fixed-at-creation changes, submit, wait, read back;
//! - delete: submit, wait, then clear the identity;
//! - import: decode an external identity and read the record.
//!
//! Create and update never trust the mutation response; the read that follows
//! the wait is the only source of post-state. Local state is assigned only
//! after every remote step succeeded, so a failed call can simply be retried.

mod instance;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::api::wire::Server;
use crate::api::{ApiError, ServerApi};
use crate::desired::DesiredState;
use crate::error::ReconcileError;
use crate::identity::ResourceId;
use crate::mapper::{expand_create, expand_update, flatten_server};
use crate::waiter::{OperationWaiter, cancellable};

pub use instance::ServerInstance;

/// Lifecycle phase of a server as the reconciler perceives it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Phase {
    /// No identity is stored.
    Absent,
    /// A create is in flight.
    Creating,
    /// An identity is stored.
    Present,
    /// An update is in flight.
    Updating,
    /// A delete is in flight.
    Deleting,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Absent => "absent",
            Self::Creating => "creating",
            Self::Present => "present",
            Self::Updating => "updating",
            Self::Deleting => "deleting",
        })
    }
}

/// Result of a successful read.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReadOutcome {
    /// The record exists and the local state was refreshed from it.
    Present,
    /// No record exists; any stored identity has been cleared.
    Absent,
}

/// Drives one server instance towards its desired state.
#[derive(Debug)]
pub struct ServerReconciler<A: ?Sized> {
    api: Arc<A>,
    waiter: OperationWaiter,
}

impl<A: ?Sized> Clone for ServerReconciler<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            waiter: self.waiter,
        }
    }
}

impl<A> ServerReconciler<A>
where
    A: ServerApi + ?Sized,
{
    /// Creates a reconciler over a shared API client.
    #[must_use]
    pub fn new(api: Arc<A>) -> Self {
        Self {
            api,
            waiter: OperationWaiter::default(),
        }
    }

    /// Overrides the delay between operation polls.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.waiter = OperationWaiter::new(interval);
        self
    }

    /// Creates the server described by `instance` and stores its identity.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::AlreadyManaged`] when an identity is already
    /// stored, [`ReconcileError::MalformedInput`] when the desired state does
    /// not validate, [`ReconcileError::IncompleteRemoteData`] when the
    /// read-back lacks an identity, and any waiter or transport error. The
    /// instance is left untouched on every error.
    #[instrument(
        skip_all,
        fields(
            phase = %Phase::Creating,
            resource_group = %instance.desired().resource_group,
            name = %instance.desired().name,
        )
    )]
    pub async fn create(
        &self,
        instance: &mut ServerInstance,
        cancel: &CancellationToken,
    ) -> Result<(), ReconcileError> {
        if let Some(id) = instance.id() {
            return Err(ReconcileError::AlreadyManaged { id: id.to_string() });
        }
        let desired = instance.desired();
        desired.validate()?;
        let body = expand_create(desired)?;
        let resource_group = desired.resource_group.as_str();
        let name = desired.name.as_str();

        info!("submitting create");
        let handle = cancellable(cancel, self.api.create(resource_group, name, &body)).await??;
        self.waiter.wait(self.api.as_ref(), &handle, cancel).await?;

        let record = self.fetch(resource_group, name, cancel).await?;
        let raw_id = record
            .id
            .as_deref()
            .ok_or_else(|| ReconcileError::incomplete("id"))?;
        let id = ResourceId::parse(raw_id)?;
        let mut refreshed = flatten_server(&record, desired)?;
        refreshed.resource_group.clone_from(&id.resource_group);

        info!(id = %id, "server created");
        instance.assign(Some(id), refreshed);
        Ok(())
    }

    /// Refreshes `instance` from the remote record.
    ///
    /// Without a stored identity this is a no-op returning
    /// [`ReadOutcome::Absent`]. When the record no longer exists the identity
    /// is cleared and [`ReadOutcome::Absent`] is returned.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::IncompleteRemoteData`] or
    /// [`ReconcileError::UnrecognisedRemoteValue`] when the record cannot be
    /// flattened, and any transport or cancellation error.
    #[instrument(skip_all, fields(id = ?instance.id().map(ToString::to_string)))]
    pub async fn read(
        &self,
        instance: &mut ServerInstance,
        cancel: &CancellationToken,
    ) -> Result<ReadOutcome, ReconcileError> {
        let Some(id) = instance.id().cloned() else {
            return Ok(ReadOutcome::Absent);
        };

        match self.fetch(&id.resource_group, &id.name, cancel).await {
            Ok(record) => {
                let mut refreshed = flatten_server(&record, instance.desired())?;
                refreshed.resource_group.clone_from(&id.resource_group);
                instance.assign(Some(id), refreshed);
                Ok(ReadOutcome::Present)
            }
            Err(ReconcileError::NotFound { .. }) => {
                warn!("server no longer exists; clearing identity");
                instance.clear();
                Ok(ReadOutcome::Absent)
            }
            Err(err) => Err(err),
        }
    }

    /// Applies `planned` to the existing server in place.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::Unmanaged`] without a stored identity and
    /// [`ReconcileError::RequiresReplacement`] when `planned` changes a field
    /// fixed at creation; both are raised before any remote call. Otherwise
    /// returns validation, waiter, transport, or flatten errors, leaving the
    /// instance untouched.
    #[instrument(
        skip_all,
        fields(phase = %Phase::Updating, id = ?instance.id().map(ToString::to_string))
    )]
    pub async fn update(
        &self,
        instance: &mut ServerInstance,
        planned: DesiredState,
        cancel: &CancellationToken,
    ) -> Result<(), ReconcileError> {
        let id = instance.id().cloned().ok_or(ReconcileError::Unmanaged)?;
        let fields = instance.desired().replacement_fields(&planned);
        if !fields.is_empty() {
            warn!(fields = ?fields, "update rejected; replacement required");
            return Err(ReconcileError::RequiresReplacement { fields });
        }
        planned.validate()?;
        let body = expand_update(&planned)?;

        info!("submitting update");
        let handle =
            cancellable(cancel, self.api.update(&id.resource_group, &id.name, &body)).await??;
        self.waiter.wait(self.api.as_ref(), &handle, cancel).await?;

        let record = self.fetch(&id.resource_group, &id.name, cancel).await?;
        let mut refreshed = flatten_server(&record, &planned)?;
        refreshed.resource_group.clone_from(&id.resource_group);

        info!("server updated");
        instance.assign(Some(id), refreshed);
        Ok(())
    }

    /// Deletes the server and clears the stored identity.
    ///
    /// A server that is already gone counts as deleted, so a delete retried
    /// after a partial failure converges.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::Unmanaged`] without a stored identity and
    /// any waiter, transport, or cancellation error; the identity is kept in
    /// that case so the delete can be retried.
    #[instrument(
        skip_all,
        fields(phase = %Phase::Deleting, id = ?instance.id().map(ToString::to_string))
    )]
    pub async fn delete(
        &self,
        instance: &mut ServerInstance,
        cancel: &CancellationToken,
    ) -> Result<(), ReconcileError> {
        let id = instance.id().cloned().ok_or(ReconcileError::Unmanaged)?;

        info!("submitting delete");
        match cancellable(cancel, self.api.delete(&id.resource_group, &id.name)).await? {
            Ok(handle) => self.waiter.wait(self.api.as_ref(), &handle, cancel).await?,
            Err(ApiError::NotFound) => warn!("server already absent"),
            Err(err) => return Err(err.into()),
        }

        info!("server deleted");
        instance.clear();
        Ok(())
    }

    /// Adopts an existing server from its identity string.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::InvalidIdentity`] when `raw_id` does not
    /// decode, [`ReconcileError::NotFound`] when no such server exists, and
    /// any flatten, transport, or cancellation error.
    #[instrument(skip_all, fields(id = %raw_id))]
    pub async fn import(
        &self,
        raw_id: &str,
        cancel: &CancellationToken,
    ) -> Result<ServerInstance, ReconcileError> {
        let id = ResourceId::parse(raw_id)?;
        let record = self.fetch(&id.resource_group, &id.name, cancel).await?;
        let mut desired = flatten_server(&record, &DesiredState::default())?;
        desired.resource_group.clone_from(&id.resource_group);

        info!("server imported");
        Ok(ServerInstance::managed(id, desired))
    }

    async fn fetch(
        &self,
        resource_group: &str,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<Server, ReconcileError> {
        match cancellable(cancel, self.api.get(resource_group, name)).await? {
            Ok(record) => Ok(record),
            Err(ApiError::NotFound) => Err(ReconcileError::NotFound {
                resource_group: resource_group.to_owned(),
                name: name.to_owned(),
            }),
            Err(err) => Err(err.into()),
        }
    }
}
