//! Test support utilities shared across unit and integration tests.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::env;
use std::ffi::OsString;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, MutexGuard as AsyncMutexGuard};

use crate::api::wire::{Server, ServerForCreate, ServerProperties, ServerUpdateParameters};
use crate::api::{ApiError, ApiFuture, OperationHandle, OperationStatus, ServerApi};

/// Subscription used in identities minted by [`ScriptedApi`].
pub const SCRIPTED_SUBSCRIPTION: &str = "00000000-0000-0000-0000-000000000000";
/// Provider namespace used in identities minted by [`ScriptedApi`].
pub const SCRIPTED_PROVIDER: &str = "Microsoft.DBforMySQL";
/// Domain appended to server names to form their host name.
pub const SCRIPTED_FQDN_SUFFIX: &str = "mysql.example.net";

/// Kind of call made against [`ScriptedApi`].
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum CallKind {
    /// [`ServerApi::create`].
    Create,
    /// [`ServerApi::update`].
    Update,
    /// [`ServerApi::delete`].
    Delete,
    /// [`ServerApi::get`].
    Get,
}

/// Records a single call made through [`ScriptedApi`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ApiCall {
    /// Which operation was invoked.
    pub kind: CallKind,
    /// Resource group argument.
    pub resource_group: String,
    /// Server name argument.
    pub name: String,
}

/// In-memory control plane that stores server records and replays scripted
/// operation outcomes in FIFO order.
///
/// Mutations apply to the stored records at submission time. Polls pop the
/// next scripted [`OperationStatus`], defaulting to success once the script
/// is exhausted.
#[derive(Clone, Debug, Default)]
pub struct ScriptedApi {
    state: Arc<Mutex<State>>,
}

#[derive(Debug, Default)]
struct State {
    servers: BTreeMap<(String, String), Server>,
    statuses: VecDeque<OperationStatus>,
    failures: Vec<(CallKind, ApiError)>,
    calls: Vec<ApiCall>,
    last_create: Option<ServerForCreate>,
    last_update: Option<ServerUpdateParameters>,
    polls: usize,
    operations: usize,
    omit_ids: bool,
}

fn key(resource_group: &str, name: &str) -> (String, String) {
    (resource_group.to_ascii_lowercase(), name.to_owned())
}

/// Builds the identity string the scripted control plane assigns.
#[must_use]
pub fn scripted_id(resource_group: &str, name: &str) -> String {
    format!(
        "/subscriptions/{SCRIPTED_SUBSCRIPTION}/resourceGroups/{resource_group}/providers/{SCRIPTED_PROVIDER}/servers/{name}"
    )
}

impl State {
    fn record(&mut self, kind: CallKind, resource_group: &str, name: &str) -> Result<(), ApiError> {
        self.calls.push(ApiCall {
            kind,
            resource_group: resource_group.to_owned(),
            name: name.to_owned(),
        });
        match self.failures.iter().position(|(k, _)| *k == kind) {
            Some(index) => Err(self.failures.remove(index).1),
            None => Ok(()),
        }
    }

    fn next_handle(&mut self) -> OperationHandle {
        self.operations += 1;
        OperationHandle::AsyncOperation(format!("scripted://operations/{}", self.operations))
    }
}

impl ScriptedApi {
    /// Creates an empty control plane.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queues the outcome of the next operation poll.
    pub fn push_status(&self, status: OperationStatus) {
        self.lock().statuses.push_back(status);
    }

    /// Makes the next call of `kind` fail with `error` before touching state.
    pub fn fail_next(&self, kind: CallKind, error: ApiError) {
        self.lock().failures.push((kind, error));
    }

    /// Stores a record as if it had been created outside the tool.
    pub fn insert_server(&self, resource_group: &str, server: Server) {
        let name = server.name.clone().unwrap_or_default();
        self.lock().servers.insert(key(resource_group, &name), server);
    }

    /// Removes a record as if it had been deleted outside the tool.
    pub fn remove_server(&self, resource_group: &str, name: &str) {
        self.lock().servers.remove(&key(resource_group, name));
    }

    /// Returns the stored record for `name`, if any.
    #[must_use]
    pub fn server(&self, resource_group: &str, name: &str) -> Option<Server> {
        self.lock().servers.get(&key(resource_group, name)).cloned()
    }

    /// Makes subsequent reads return records without an `id`.
    pub fn omit_ids(&self) {
        self.lock().omit_ids = true;
    }

    /// Returns every call recorded so far.
    #[must_use]
    pub fn calls(&self) -> Vec<ApiCall> {
        self.lock().calls.clone()
    }

    /// Returns the kinds of every call recorded so far.
    #[must_use]
    pub fn call_kinds(&self) -> Vec<CallKind> {
        self.lock().calls.iter().map(|call| call.kind).collect()
    }

    /// Returns the body of the most recent create request.
    #[must_use]
    pub fn last_create(&self) -> Option<ServerForCreate> {
        self.lock().last_create.clone()
    }

    /// Returns the body of the most recent update request.
    #[must_use]
    pub fn last_update(&self) -> Option<ServerUpdateParameters> {
        self.lock().last_update.clone()
    }

    /// Returns how many operation polls were served.
    #[must_use]
    pub fn poll_count(&self) -> usize {
        self.lock().polls
    }
}

impl ServerApi for ScriptedApi {
    fn create<'a>(
        &'a self,
        resource_group: &'a str,
        name: &'a str,
        parameters: &'a ServerForCreate,
    ) -> ApiFuture<'a, OperationHandle> {
        Box::pin(async move {
            let mut state = self.lock();
            state.record(CallKind::Create, resource_group, name)?;
            state.last_create = Some(parameters.clone());
            let server = Server {
                id: Some(scripted_id(resource_group, name)),
                name: Some(name.to_owned()),
                location: Some(parameters.location.clone()),
                sku: Some(parameters.sku.clone()),
                properties: Some(ServerProperties {
                    administrator_login: Some(parameters.properties.administrator_login.clone()),
                    version: Some(parameters.properties.version.clone()),
                    ssl_enforcement: Some(parameters.properties.ssl_enforcement.clone()),
                    user_visible_state: Some(String::from("Ready")),
                    fully_qualified_domain_name: Some(format!("{name}.{SCRIPTED_FQDN_SUFFIX}")),
                    earliest_restore_date: None,
                    storage_profile: Some(parameters.properties.storage_profile.clone()),
                }),
                tags: Some(parameters.tags.clone()),
            };
            state.servers.insert(key(resource_group, name), server);
            Ok(state.next_handle())
        })
    }

    fn update<'a>(
        &'a self,
        resource_group: &'a str,
        name: &'a str,
        parameters: &'a ServerUpdateParameters,
    ) -> ApiFuture<'a, OperationHandle> {
        Box::pin(async move {
            let mut state = self.lock();
            state.record(CallKind::Update, resource_group, name)?;
            state.last_update = Some(parameters.clone());
            let server = state
                .servers
                .get_mut(&key(resource_group, name))
                .ok_or(ApiError::NotFound)?;
            if let Some(sku) = &parameters.sku {
                server.sku = Some(sku.clone());
            }
            let properties = server.properties.get_or_insert_with(ServerProperties::default);
            if let Some(ssl) = &parameters.properties.ssl_enforcement {
                properties.ssl_enforcement = Some(ssl.clone());
            }
            if let Some(patch) = &parameters.properties.storage_profile {
                let profile = properties
                    .storage_profile
                    .get_or_insert_with(Default::default);
                if patch.backup_retention_days.is_some() {
                    profile.backup_retention_days = patch.backup_retention_days;
                }
                if patch.geo_redundant_backup.is_some() {
                    profile.geo_redundant_backup = patch.geo_redundant_backup.clone();
                }
            }
            server.tags = Some(parameters.tags.clone());
            Ok(state.next_handle())
        })
    }

    fn delete<'a>(
        &'a self,
        resource_group: &'a str,
        name: &'a str,
    ) -> ApiFuture<'a, OperationHandle> {
        Box::pin(async move {
            let mut state = self.lock();
            state.record(CallKind::Delete, resource_group, name)?;
            state
                .servers
                .remove(&key(resource_group, name))
                .ok_or(ApiError::NotFound)?;
            Ok(state.next_handle())
        })
    }

    fn get<'a>(&'a self, resource_group: &'a str, name: &'a str) -> ApiFuture<'a, Server> {
        Box::pin(async move {
            let mut state = self.lock();
            state.record(CallKind::Get, resource_group, name)?;
            let omit_ids = state.omit_ids;
            let mut server = state
                .servers
                .get(&key(resource_group, name))
                .cloned()
                .ok_or(ApiError::NotFound)?;
            if omit_ids {
                server.id = None;
            }
            Ok(server)
        })
    }

    fn poll_operation<'a>(&'a self, handle: &'a OperationHandle) -> ApiFuture<'a, OperationStatus> {
        Box::pin(async move {
            let mut state = self.lock();
            state.polls += 1;
            if matches!(handle, OperationHandle::Completed) {
                return Ok(OperationStatus::Succeeded);
            }
            Ok(state
                .statuses
                .pop_front()
                .unwrap_or(OperationStatus::Succeeded))
        })
    }
}

/// Global mutex used to serialise environment mutation in tests.
pub static ENV_LOCK: AsyncMutex<()> = AsyncMutex::const_new(());

/// Guard that holds the env mutex and restores variables on drop.
pub struct EnvGuard {
    previous: Vec<(String, Option<OsString>)>,
    _guard: AsyncMutexGuard<'static, ()>,
}

impl EnvGuard {
    /// Sets and clears environment variables while holding a global mutex.
    ///
    /// Each pair with `Some(value)` is set; each pair with `None` is removed.
    pub async fn set_vars(pairs: &[(&str, Option<&str>)]) -> Self {
        debug_assert!(
            {
                let mut seen = BTreeSet::new();
                pairs.iter().all(|(key, _)| seen.insert(*key))
            },
            "duplicate environment variable keys passed to EnvGuard::set_vars"
        );

        let guard = ENV_LOCK.lock().await;
        let mut previous = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            let old = env::var_os(key);
            // SAFETY: Environment mutation is serialised by `ENV_LOCK`, preventing races.
            unsafe {
                match value {
                    Some(val) => env::set_var(key, val),
                    None => env::remove_var(key),
                }
            }
            previous.push(((*key).to_owned(), old));
        }

        Self {
            previous,
            _guard: guard,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, old) in &self.previous {
            // SAFETY: Environment mutation is serialised by holding `_guard`.
            unsafe {
                match old {
                    Some(val) => env::set_var(key, val),
                    None => env::remove_var(key),
                }
            }
        }
    }
}
