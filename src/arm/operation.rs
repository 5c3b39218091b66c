//! Interpretation of long-running operation responses.
//!
//! Mutations answer with an `Azure-AsyncOperation` header pointing at a status
//! document, a `Location` header to poll until it stops answering
//! `202 Accepted`, or neither when the change applied synchronously.

use reqwest::header::{HeaderMap, LOCATION};
use serde::Deserialize;

use crate::api::{OperationHandle, OperationStatus};

pub(super) const ASYNC_OPERATION_HEADER: &str = "azure-asyncoperation";

/// Status document served at an `Azure-AsyncOperation` URL.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub(super) struct AsyncOperationBody {
    #[serde(default)]
    pub(super) status: String,
    #[serde(default)]
    pub(super) error: Option<OperationErrorBody>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub(super) struct OperationErrorBody {
    #[serde(default)]
    pub(super) code: Option<String>,
    #[serde(default)]
    pub(super) message: Option<String>,
}

fn header_url(headers: &HeaderMap, name: impl reqwest::header::AsHeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
}

/// Picks the polling handle advertised by a mutation response.
pub(super) fn handle_from_headers(headers: &HeaderMap) -> OperationHandle {
    if let Some(url) = header_url(headers, ASYNC_OPERATION_HEADER) {
        return OperationHandle::AsyncOperation(url);
    }
    header_url(headers, LOCATION).map_or(OperationHandle::Completed, OperationHandle::Location)
}

/// Maps an async-operation status document onto [`OperationStatus`].
pub(super) fn interpret_status(body: &AsyncOperationBody) -> OperationStatus {
    let status = body.status.trim();
    if status.eq_ignore_ascii_case("succeeded") {
        return OperationStatus::Succeeded;
    }
    if status.eq_ignore_ascii_case("failed")
        || status.eq_ignore_ascii_case("canceled")
        || status.eq_ignore_ascii_case("cancelled")
    {
        return OperationStatus::Failed(failure_detail(status, body.error.as_ref()));
    }
    OperationStatus::Pending
}

fn failure_detail(status: &str, error: Option<&OperationErrorBody>) -> String {
    let code = error.and_then(|err| err.code.as_deref());
    let message = error.and_then(|err| err.message.as_deref());
    match (code, message) {
        (Some(error_code), Some(error_message)) => format!("{error_code}: {error_message}"),
        (Some(detail), None) | (None, Some(detail)) => detail.to_owned(),
        (None, None) => format!("operation {status}"),
    }
}

/// Maps a `Location` poll response onto [`OperationStatus`].
pub(super) fn interpret_location(status: u16, body: &str) -> OperationStatus {
    match status {
        202 => OperationStatus::Pending,
        200 | 201 | 204 => OperationStatus::Succeeded,
        other if body.trim().is_empty() => {
            OperationStatus::Failed(format!("operation ended with status {other}"))
        }
        _ => OperationStatus::Failed(body.to_owned()),
    }
}
