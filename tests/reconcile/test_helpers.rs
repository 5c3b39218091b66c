//! Shared fixtures and helpers for lifecycle BDD scenarios.

use std::sync::Arc;
use std::time::Duration;

use dbserver::test_support::ScriptedApi;
use dbserver::{DesiredState, ServerInstance, ServerReconciler};
use rstest::fixture;
use serde_json::json;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StepOutcome {
    Success,
    Failure(String),
}

#[derive(Clone, Debug)]
pub struct ReconcileContext {
    pub api: ScriptedApi,
    pub instance: Option<ServerInstance>,
    pub planned: Option<DesiredState>,
    pub calls_before_step: usize,
    pub outcome: Option<StepOutcome>,
}

impl ReconcileContext {
    pub fn reconciler(&self) -> ServerReconciler<ScriptedApi> {
        ServerReconciler::new(Arc::new(self.api.clone())).with_poll_interval(Duration::from_millis(1))
    }

    pub fn record<T, E: std::fmt::Display>(&mut self, result: Result<T, E>) {
        self.outcome = Some(match result {
            Ok(_) => StepOutcome::Success,
            Err(err) => StepOutcome::Failure(err.to_string()),
        });
    }
}

#[fixture]
pub fn reconcile_context() -> ReconcileContext {
    ReconcileContext {
        api: ScriptedApi::new(),
        instance: None,
        planned: None,
        calls_before_step: 0,
        outcome: None,
    }
}

pub fn desired_server(name: &str, resource_group: &str) -> DesiredState {
    DesiredState::from_value(json!({
        "name": name,
        "location": "West Europe",
        "resource_group_name": resource_group,
        "sku": [{"name": "GP_Gen5_2", "tier": "GeneralPurpose", "family": "Gen5", "capacity": 2}],
        "administrator_login": "admin",
        "administrator_login_password": "***",
        "version": "5.7",
        "storage_profile": [{"storage_mb": 5120, "backup_retention_days": 7, "geo_redundant_backup": "Disabled"}],
        "ssl_enforcement": "Enabled"
    }))
    .unwrap_or_else(|err| panic!("fixture attributes should decode: {err}"))
}
