//! Shared constants for integration tests.
//!
//! Integration tests are compiled as separate crates (one per top-level file in
//! `tests/`). Placing shared constants under `tests/common/` avoids creating an
//! additional integration test binary while still allowing reuse via:
//!
//! ```rust
//! #[path = "common/test_constants.rs"]
//! mod test_constants;
//! ```

/// API version used when none is configured.
pub const DEFAULT_API_VERSION: &str = "2017-12-01";

/// Provider namespace used when none is configured.
pub const DEFAULT_PROVIDER_NAMESPACE: &str = "Microsoft.DBforMySQL";
