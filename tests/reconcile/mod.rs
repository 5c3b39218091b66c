//! Lifecycle BDD harness.

mod bdd_steps;
mod scenarios;
mod test_helpers;
