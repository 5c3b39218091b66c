//! Remote API seam consumed by the reconciler.
//!
//! [`ServerApi`] is the only way the core talks to the control plane. The
//! production implementation lives in [`crate::arm`]; tests drive the core
//! through [`crate::test_support::ScriptedApi`].

pub mod wire;

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use wire::{Server, ServerForCreate, ServerUpdateParameters};

/// Future returned by [`ServerApi`] calls.
pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ApiError>> + Send + 'a>>;

/// Errors raised by API clients.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ApiError {
    /// The addressed server does not exist.
    #[error("resource not found")]
    NotFound,
    /// The request never produced an HTTP response.
    #[error("request failed: {message}")]
    Transport {
        /// Message from the HTTP client.
        message: String,
    },
    /// The control plane answered with an unexpected status.
    #[error("unexpected status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, as text.
        body: String,
    },
    /// The response body did not match the expected shape.
    #[error("failed to decode response: {message}")]
    Decode {
        /// Message from the decoder.
        message: String,
    },
}

/// Token for an in-flight create, update, or delete.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum OperationHandle {
    /// The control plane applied the change synchronously.
    Completed,
    /// Poll this status URL for `{ "status": ... }` documents.
    AsyncOperation(String),
    /// Poll this URL until it stops answering `202 Accepted`.
    Location(String),
}

/// Observed state of a long-running operation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum OperationStatus {
    /// Still running.
    Pending,
    /// Finished successfully.
    Succeeded,
    /// Finished unsuccessfully with the remote detail.
    Failed(String),
}

impl OperationStatus {
    /// Reports whether polling can stop.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Server management operations offered by the control plane.
pub trait ServerApi: Send + Sync {
    /// Submits a create request.
    fn create<'a>(
        &'a self,
        resource_group: &'a str,
        name: &'a str,
        parameters: &'a ServerForCreate,
    ) -> ApiFuture<'a, OperationHandle>;

    /// Submits an in-place update.
    fn update<'a>(
        &'a self,
        resource_group: &'a str,
        name: &'a str,
        parameters: &'a ServerUpdateParameters,
    ) -> ApiFuture<'a, OperationHandle>;

    /// Submits a delete request.
    fn delete<'a>(&'a self, resource_group: &'a str, name: &'a str)
    -> ApiFuture<'a, OperationHandle>;

    /// Fetches the current record, failing with [`ApiError::NotFound`] when
    /// the server is absent.
    fn get<'a>(&'a self, resource_group: &'a str, name: &'a str) -> ApiFuture<'a, Server>;

    /// Queries the status of a long-running operation.
    fn poll_operation<'a>(&'a self, handle: &'a OperationHandle) -> ApiFuture<'a, OperationStatus>;
}
