//! BDD step definitions for the server lifecycle.

use dbserver::desired::{ServerVersion, Sku, SkuFamily, SkuTier};
use dbserver::test_support::scripted_id;
use dbserver::{OperationStatus, Phase, ServerInstance};
use rstest_bdd_macros::{given, then, when};
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

use super::test_helpers::{ReconcileContext, StepOutcome, desired_server};

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("assertion failed: {0}")]
    Assertion(String),
}

fn runtime() -> Result<Runtime, StepError> {
    Runtime::new().map_err(|err| StepError::Assertion(err.to_string()))
}

fn take_instance(ctx: &mut ReconcileContext) -> Result<ServerInstance, StepError> {
    ctx.instance
        .take()
        .ok_or_else(|| StepError::Assertion(String::from("no server instance in context")))
}

#[given("a desired server \"{name}\" in resource group \"{resource_group}\"")]
fn desired_server_step(
    mut reconcile_context: ReconcileContext,
    name: String,
    resource_group: String,
) -> ReconcileContext {
    reconcile_context.instance = Some(ServerInstance::new(desired_server(&name, &resource_group)));
    reconcile_context
}

#[given("a managed server \"{name}\" in resource group \"{resource_group}\"")]
fn managed_server(
    mut reconcile_context: ReconcileContext,
    name: String,
    resource_group: String,
) -> Result<ReconcileContext, StepError> {
    let runtime = runtime()?;
    let mut instance = ServerInstance::new(desired_server(&name, &resource_group));
    let reconciler = reconcile_context.reconciler();
    runtime
        .block_on(reconciler.create(&mut instance, &CancellationToken::new()))
        .map_err(|err| StepError::Assertion(format!("setup create failed: {err}")))?;
    reconcile_context.instance = Some(instance);
    Ok(reconcile_context)
}

#[given("the next operation fails with \"{detail}\"")]
fn next_operation_fails(reconcile_context: ReconcileContext, detail: String) -> ReconcileContext {
    reconcile_context
        .api
        .push_status(OperationStatus::Failed(detail));
    reconcile_context
}

#[given("the planned engine version is \"{version}\"")]
fn planned_version(
    mut reconcile_context: ReconcileContext,
    version: String,
) -> Result<ReconcileContext, StepError> {
    let version: ServerVersion = version
        .parse()
        .map_err(|err| StepError::Assertion(format!("{err}")))?;
    let mut planned = planned_from(&reconcile_context)?;
    planned.version = version;
    reconcile_context.planned = Some(planned);
    Ok(reconcile_context)
}

#[given("the planned sku is \"{sku_name}\" with capacity \"{capacity}\"")]
fn planned_sku(
    mut reconcile_context: ReconcileContext,
    sku_name: String,
    capacity: u32,
) -> Result<ReconcileContext, StepError> {
    let mut planned = planned_from(&reconcile_context)?;
    planned.sku = Some(Sku {
        name: sku_name,
        tier: SkuTier::GeneralPurpose,
        family: SkuFamily::Gen5,
        capacity,
    });
    reconcile_context.planned = Some(planned);
    Ok(reconcile_context)
}

fn planned_from(ctx: &ReconcileContext) -> Result<dbserver::DesiredState, StepError> {
    if let Some(planned) = ctx.planned.clone() {
        return Ok(planned);
    }
    ctx.instance
        .as_ref()
        .map(|instance| instance.desired().clone())
        .ok_or_else(|| StepError::Assertion(String::from("no server instance in context")))
}

#[given("the server is deleted outside the tool")]
fn deleted_out_of_band(reconcile_context: ReconcileContext) -> Result<ReconcileContext, StepError> {
    let id = reconcile_context
        .instance
        .as_ref()
        .and_then(|instance| instance.id().cloned())
        .ok_or_else(|| StepError::Assertion(String::from("server is not managed")))?;
    reconcile_context
        .api
        .remove_server(&id.resource_group, &id.name);
    Ok(reconcile_context)
}

#[when("I create the server")]
fn create_server(mut reconcile_context: ReconcileContext) -> Result<ReconcileContext, StepError> {
    let runtime = runtime()?;
    let mut instance = take_instance(&mut reconcile_context)?;
    reconcile_context.calls_before_step = reconcile_context.api.calls().len();
    let reconciler = reconcile_context.reconciler();
    let result = runtime.block_on(reconciler.create(&mut instance, &CancellationToken::new()));
    reconcile_context.record(result);
    reconcile_context.instance = Some(instance);
    Ok(reconcile_context)
}

#[when("I update the server")]
fn update_server(mut reconcile_context: ReconcileContext) -> Result<ReconcileContext, StepError> {
    let runtime = runtime()?;
    let planned = planned_from(&reconcile_context)?;
    let mut instance = take_instance(&mut reconcile_context)?;
    reconcile_context.calls_before_step = reconcile_context.api.calls().len();
    let reconciler = reconcile_context.reconciler();
    let result =
        runtime.block_on(reconciler.update(&mut instance, planned, &CancellationToken::new()));
    reconcile_context.record(result);
    reconcile_context.instance = Some(instance);
    Ok(reconcile_context)
}

#[when("I delete the server")]
fn delete_server(mut reconcile_context: ReconcileContext) -> Result<ReconcileContext, StepError> {
    let runtime = runtime()?;
    let mut instance = take_instance(&mut reconcile_context)?;
    reconcile_context.calls_before_step = reconcile_context.api.calls().len();
    let reconciler = reconcile_context.reconciler();
    let result = runtime.block_on(reconciler.delete(&mut instance, &CancellationToken::new()));
    reconcile_context.record(result);
    reconcile_context.instance = Some(instance);
    Ok(reconcile_context)
}

#[when("I read the server")]
fn read_server(mut reconcile_context: ReconcileContext) -> Result<ReconcileContext, StepError> {
    let runtime = runtime()?;
    let mut instance = take_instance(&mut reconcile_context)?;
    reconcile_context.calls_before_step = reconcile_context.api.calls().len();
    let reconciler = reconcile_context.reconciler();
    let result = runtime.block_on(reconciler.read(&mut instance, &CancellationToken::new()));
    reconcile_context.record(result);
    reconcile_context.instance = Some(instance);
    Ok(reconcile_context)
}

#[when("I import server \"{name}\" in resource group \"{resource_group}\"")]
fn import_server(
    reconcile_context: ReconcileContext,
    name: String,
    resource_group: String,
) -> Result<ReconcileContext, StepError> {
    run_import(reconcile_context, &scripted_id(&resource_group, &name))
}

#[when("I import the identity \"{raw_id}\"")]
fn import_identity(
    reconcile_context: ReconcileContext,
    raw_id: String,
) -> Result<ReconcileContext, StepError> {
    run_import(reconcile_context, &raw_id)
}

fn run_import(
    mut reconcile_context: ReconcileContext,
    raw_id: &str,
) -> Result<ReconcileContext, StepError> {
    let runtime = runtime()?;
    reconcile_context.calls_before_step = reconcile_context.api.calls().len();
    let reconciler = reconcile_context.reconciler();
    match runtime.block_on(reconciler.import(raw_id, &CancellationToken::new())) {
        Ok(instance) => {
            reconcile_context.instance = Some(instance);
            reconcile_context.outcome = Some(StepOutcome::Success);
        }
        Err(err) => reconcile_context.outcome = Some(StepOutcome::Failure(err.to_string())),
    }
    Ok(reconcile_context)
}

#[then("the outcome is successful")]
fn outcome_successful(reconcile_context: &ReconcileContext) -> Result<(), StepError> {
    match &reconcile_context.outcome {
        Some(StepOutcome::Success) => Ok(()),
        Some(StepOutcome::Failure(message)) => Err(StepError::Assertion(format!(
            "expected success, got failure: {message}"
        ))),
        None => Err(StepError::Assertion(String::from("missing outcome"))),
    }
}

#[then("the error mentions \"{fragment}\"")]
fn error_mentions(reconcile_context: &ReconcileContext, fragment: String) -> Result<(), StepError> {
    let Some(StepOutcome::Failure(message)) = &reconcile_context.outcome else {
        return Err(StepError::Assertion(String::from("expected failure outcome")));
    };
    if message.contains(&fragment) {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected error to mention {fragment:?}, got {message:?}"
        )))
    }
}

#[then("the stored identity names server \"{name}\" in resource group \"{resource_group}\"")]
fn identity_names(
    reconcile_context: &ReconcileContext,
    name: String,
    resource_group: String,
) -> Result<(), StepError> {
    let stored = reconcile_context
        .instance
        .as_ref()
        .map(ServerInstance::persisted_id)
        .unwrap_or_default();
    let expected = scripted_id(&resource_group, &name);
    if stored == expected {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected identity {expected}, got {stored:?}"
        )))
    }
}

#[then("the host name is \"{fqdn}\"")]
fn host_name(reconcile_context: &ReconcileContext, fqdn: String) -> Result<(), StepError> {
    let actual = reconcile_context
        .instance
        .as_ref()
        .and_then(|instance| instance.desired().fully_qualified_domain_name.clone());
    if actual.as_deref() == Some(fqdn.as_str()) {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected host name {fqdn}, got {actual:?}"
        )))
    }
}

#[then("the stored sku is \"{sku_name}\"")]
fn stored_sku(reconcile_context: &ReconcileContext, sku_name: String) -> Result<(), StepError> {
    let actual = reconcile_context
        .instance
        .as_ref()
        .and_then(|instance| instance.desired().sku.as_ref().map(|sku| sku.name.clone()));
    if actual.as_deref() == Some(sku_name.as_str()) {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected sku {sku_name}, got {actual:?}"
        )))
    }
}

#[then("the server is absent")]
fn server_absent(reconcile_context: &ReconcileContext) -> Result<(), StepError> {
    let phase = reconcile_context
        .instance
        .as_ref()
        .map_or(Phase::Absent, ServerInstance::phase);
    if phase == Phase::Absent {
        Ok(())
    } else {
        Err(StepError::Assertion(format!("expected absent, got {phase}")))
    }
}

#[then("no remote call was made by the last step")]
fn no_remote_call(reconcile_context: &ReconcileContext) -> Result<(), StepError> {
    let calls = reconcile_context.api.calls().len();
    if calls == reconcile_context.calls_before_step {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected no new calls, {} were made",
            calls - reconcile_context.calls_before_step
        )))
    }
}
