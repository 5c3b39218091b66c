//! Access-token resolution for the management API.
//!
//! A bearer token can be supplied inline (typically through `ARM_ACCESS_TOKEN`)
//! or as a path to a file holding it, which suits tokens minted by an external
//! `az account get-access-token` job. The two sources are mutually exclusive.

use camino::Utf8Path;
use cap_std::{ambient_authority, fs_utf8::Dir};
use thiserror::Error;

use crate::secret::Secret;

/// Errors raised while resolving the access token.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum CredentialError {
    /// Raised when both inline and file sources are provided.
    #[error("access token cannot be provided both inline and via file")]
    BothProvided,
    /// Raised when neither source is provided.
    #[error("missing access token: set ARM_ACCESS_TOKEN or ARM_ACCESS_TOKEN_FILE")]
    Missing,
    /// Raised when an inline token is empty or only whitespace.
    #[error("access token must not be empty")]
    InlineEmpty,
    /// Raised when a file path is empty or only whitespace.
    #[error("access token file path must not be empty")]
    FilePathEmpty,
    /// Raised when a file resolves to empty or only whitespace.
    #[error("access token file must not be empty")]
    FileEmpty,
    /// Raised when reading the file source fails.
    #[error("failed to read access token file `{path}`: {message}")]
    FileRead {
        /// Expanded path that failed to read.
        path: String,
        /// Underlying error message.
        message: String,
    },
}

/// Resolves the bearer token from either an inline value or a file.
///
/// Token files usually end with a newline, so surrounding whitespace is
/// trimmed from both sources.
///
/// # Errors
///
/// Returns [`CredentialError`] when the inputs are invalid or the file cannot
/// be read.
pub fn resolve_access_token(
    inline: Option<&str>,
    file: Option<&str>,
) -> Result<Secret, CredentialError> {
    match (inline, file) {
        (Some(_), Some(_)) => Err(CredentialError::BothProvided),
        (None, None) => Err(CredentialError::Missing),
        (Some(token), None) => non_blank(token)
            .map(Secret::new)
            .ok_or(CredentialError::InlineEmpty),
        (None, Some(path)) => {
            if path.trim().is_empty() {
                return Err(CredentialError::FilePathEmpty);
            }
            let expanded = expand_tilde(path);
            let content =
                read_to_string_ambient(&expanded).map_err(|message| CredentialError::FileRead {
                    path: expanded.clone(),
                    message,
                })?;
            non_blank(&content)
                .map(Secret::new)
                .ok_or(CredentialError::FileEmpty)
        }
    }
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Expands a leading `~/` using the `HOME` environment variable.
#[must_use]
pub fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = std::env::var_os("HOME")
    {
        return format!("{}/{rest}", home.to_string_lossy());
    }
    path.to_owned()
}

fn read_to_string_ambient(path: &str) -> Result<String, String> {
    let path_buf = Utf8Path::new(path);

    let (dir_path, file_path) = if path_buf.is_absolute() {
        let parent = path_buf
            .parent()
            .ok_or_else(|| format!("path has no parent directory: {path_buf}"))?;
        let file_name = path_buf
            .file_name()
            .ok_or_else(|| format!("path has no file name: {path_buf}"))?;
        (parent, Utf8Path::new(file_name))
    } else {
        (Utf8Path::new("."), path_buf)
    };

    let dir =
        Dir::open_ambient_dir(dir_path, ambient_authority()).map_err(|err| err.to_string())?;
    dir.read_to_string(file_path).map_err(|err| err.to_string())
}
