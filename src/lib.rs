//! Lifecycle reconciler for managed MySQL servers.
//!
//! The crate maps a declarative server description onto the resource-manager
//! REST API: it creates, reads, updates in place, deletes, and imports
//! servers, waiting on long-running operations until they finish. The core
//! talks to the control plane only through the [`ServerApi`] trait; an HTTP
//! client lives in [`arm`] and an in-memory double in [`test_support`].

pub mod api;
pub mod arm;
pub mod config;
pub mod credentials;
pub mod desired;
pub mod error;
pub mod identity;
pub mod mapper;
pub mod reconciler;
pub mod secret;
pub mod test_support;
pub mod waiter;

pub use api::{ApiError, OperationHandle, OperationStatus, ServerApi};
pub use arm::ArmServersClient;
pub use config::{ArmConfig, ConfigError};
pub use desired::DesiredState;
pub use error::ReconcileError;
pub use identity::{IdentityError, ResourceId};
pub use reconciler::{Phase, ReadOutcome, ServerInstance, ServerReconciler};
pub use secret::Secret;
pub use waiter::OperationWaiter;
