//! BDD scenarios for the server lifecycle.

use rstest_bdd_macros::scenario;

use super::test_helpers::{ReconcileContext, reconcile_context};

#[scenario(
    path = "tests/features/reconcile.feature",
    name = "Create a server and store its identity"
)]
fn scenario_create(reconcile_context: ReconcileContext) {
    let _ = reconcile_context;
}

#[scenario(
    path = "tests/features/reconcile.feature",
    name = "Remote creation failure leaves the server absent"
)]
fn scenario_create_failure(reconcile_context: ReconcileContext) {
    let _ = reconcile_context;
}

#[scenario(
    path = "tests/features/reconcile.feature",
    name = "Reject an engine version change before contacting the API"
)]
fn scenario_reject_version_change(reconcile_context: ReconcileContext) {
    let _ = reconcile_context;
}

#[scenario(
    path = "tests/features/reconcile.feature",
    name = "Scale the server in place"
)]
fn scenario_scale_in_place(reconcile_context: ReconcileContext) {
    let _ = reconcile_context;
}

#[scenario(
    path = "tests/features/reconcile.feature",
    name = "Read after delete reports absence"
)]
fn scenario_read_after_delete(reconcile_context: ReconcileContext) {
    let _ = reconcile_context;
}

#[scenario(
    path = "tests/features/reconcile.feature",
    name = "Out-of-band deletion clears the identity"
)]
fn scenario_drift(reconcile_context: ReconcileContext) {
    let _ = reconcile_context;
}

#[scenario(
    path = "tests/features/reconcile.feature",
    name = "Import an existing server"
)]
fn scenario_import(reconcile_context: ReconcileContext) {
    let _ = reconcile_context;
}

#[scenario(
    path = "tests/features/reconcile.feature",
    name = "Import rejects a malformed identity"
)]
fn scenario_import_malformed(reconcile_context: ReconcileContext) {
    let _ = reconcile_context;
}
