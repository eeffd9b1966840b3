//! Testing utilities for WSA workspace
//!
//! An in-memory content-management server implementing the remote traits,
//! with a shared call journal and scriptable failures, plus fixtures.

#![allow(missing_docs)]

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use wsa_core::{
    ActivationRequest, Connection, ModuleAdminAgent, Project, RemoteError, Scope, WebAppId,
};

/// One call made against the in-memory server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    Connect,
    Disconnect,
    Lock { project: String },
    Unlock { project: String },
    Save { project: String },
    SetActiveWebServer { scope: String, server: String },
    Deploy(WebAppId),
    Undeploy(WebAppId),
}

impl RemoteCall {
    /// Whether the call changes remote state or locks
    #[must_use]
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Self::Connect | Self::Disconnect)
    }
}

/// Calls shared by every object of one in-memory server
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<RemoteCall>>>);

impl Journal {
    fn record(&self, call: RemoteCall) {
        self.0.lock().push(call);
    }

    /// Snapshot of all calls so far
    #[must_use]
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.0.lock().clone()
    }

    /// Number of calls matching `predicate`
    pub fn count(&self, predicate: impl Fn(&RemoteCall) -> bool) -> usize {
        self.0.lock().iter().filter(|&call| predicate(call)).count()
    }

    pub fn clear(&self) {
        self.0.lock().clear();
    }
}

#[derive(Debug, Default)]
struct ProjectState {
    committed: HashMap<String, String>,
    pending: HashMap<String, String>,
    locked: bool,
    lock_script: VecDeque<Result<(), RemoteError>>,
    save_script: VecDeque<Result<(), RemoteError>>,
}

/// In-memory project
///
/// Changes made while locked are pending until `save`; `unlock` discards
/// whatever was not saved. Lock and save answer from their scripts first.
#[derive(Debug)]
pub struct InMemoryProject {
    id: u64,
    name: String,
    state: Mutex<ProjectState>,
    journal: Journal,
}

impl InMemoryProject {
    fn new(id: u64, name: &str, journal: Journal) -> Self {
        Self {
            id,
            name: name.to_string(),
            state: Mutex::new(ProjectState::default()),
            journal,
        }
    }

    /// Set an active web server without going through lock/save
    pub fn seed_active_web_server(&self, scope_name: &str, server_name: &str) {
        self.state
            .lock()
            .committed
            .insert(scope_name.to_string(), server_name.to_string());
    }

    /// Saved active web server, ignoring pending changes
    #[must_use]
    pub fn saved_active_web_server(&self, scope_name: &str) -> Option<String> {
        self.state.lock().committed.get(scope_name).cloned()
    }

    /// Queue results for upcoming lock calls
    pub fn script_locks(&self, results: impl IntoIterator<Item = Result<(), RemoteError>>) {
        self.state.lock().lock_script.extend(results);
    }

    /// Queue results for upcoming save calls
    pub fn script_saves(&self, results: impl IntoIterator<Item = Result<(), RemoteError>>) {
        self.state.lock().save_script.extend(results);
    }

    /// Let the next `n` lock calls fail as if another session held the lock
    pub fn fail_next_locks(&self, n: usize) {
        let error = RemoteError::Lock(format!("project '{}' is locked by another session", self.name));
        self.script_locks(std::iter::repeat(Err(error)).take(n));
    }

    /// Let the next `n` save calls fail
    pub fn fail_next_saves(&self, n: usize) {
        let error = RemoteError::Persistence(format!("project '{}' could not be saved", self.name));
        self.script_saves(std::iter::repeat(Err(error)).take(n));
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.state.lock().locked
    }
}

impl Project for InMemoryProject {
    fn id(&self) -> u64 {
        self.id
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn active_web_server(&self, scope_name: &str) -> Option<String> {
        let state = self.state.lock();
        state
            .pending
            .get(scope_name)
            .or_else(|| state.committed.get(scope_name))
            .cloned()
    }

    fn set_active_web_server(&self, scope_name: &str, server_name: &str) -> Result<(), RemoteError> {
        self.journal.record(RemoteCall::SetActiveWebServer {
            scope: scope_name.to_string(),
            server: server_name.to_string(),
        });
        let mut state = self.state.lock();
        if !state.locked {
            return Err(RemoteError::Lock(format!("project '{}' is not locked", self.name)));
        }
        state
            .pending
            .insert(scope_name.to_string(), server_name.to_string());
        Ok(())
    }

    fn lock(&self) -> Result<(), RemoteError> {
        self.journal.record(RemoteCall::Lock {
            project: self.name.clone(),
        });
        let mut state = self.state.lock();
        if let Some(scripted) = state.lock_script.pop_front() {
            scripted?;
        }
        if state.locked {
            return Err(RemoteError::Lock(format!("project '{}' is already locked", self.name)));
        }
        state.locked = true;
        Ok(())
    }

    fn unlock(&self) {
        self.journal.record(RemoteCall::Unlock {
            project: self.name.clone(),
        });
        let mut state = self.state.lock();
        state.pending.clear();
        state.locked = false;
    }

    fn save(&self) -> Result<(), RemoteError> {
        self.journal.record(RemoteCall::Save {
            project: self.name.clone(),
        });
        let mut state = self.state.lock();
        if let Some(scripted) = state.save_script.pop_front() {
            scripted?;
        }
        if !state.locked {
            return Err(RemoteError::Lock(format!("project '{}' is not locked", self.name)));
        }
        let pending = std::mem::take(&mut state.pending);
        state.committed.extend(pending);
        Ok(())
    }
}

/// In-memory deployment agent
///
/// Answers from scripted results first and `Ok(true)` once a script runs dry.
#[derive(Debug, Default)]
pub struct InMemoryModuleAdminAgent {
    deploy_script: Mutex<VecDeque<Result<bool, RemoteError>>>,
    undeploy_script: Mutex<VecDeque<Result<bool, RemoteError>>>,
    deployed: Mutex<HashSet<WebAppId>>,
    journal: Journal,
}

impl InMemoryModuleAdminAgent {
    /// Queue results for upcoming deploy calls
    pub fn script_deploys(&self, results: impl IntoIterator<Item = Result<bool, RemoteError>>) {
        self.deploy_script.lock().extend(results);
    }

    /// Queue results for upcoming undeploy calls
    pub fn script_undeploys(&self, results: impl IntoIterator<Item = Result<bool, RemoteError>>) {
        self.undeploy_script.lock().extend(results);
    }

    #[must_use]
    pub fn is_deployed(&self, web_app: &WebAppId) -> bool {
        self.deployed.lock().contains(web_app)
    }
}

impl ModuleAdminAgent for InMemoryModuleAdminAgent {
    fn deploy_web_app(&self, web_app: &WebAppId) -> Result<bool, RemoteError> {
        self.journal.record(RemoteCall::Deploy(web_app.clone()));
        let result = self.deploy_script.lock().pop_front().unwrap_or(Ok(true));
        if matches!(result, Ok(true)) {
            self.deployed.lock().insert(web_app.clone());
        }
        result
    }

    fn undeploy_web_app(&self, web_app: &WebAppId) -> Result<bool, RemoteError> {
        self.journal.record(RemoteCall::Undeploy(web_app.clone()));
        let result = self.undeploy_script.lock().pop_front().unwrap_or(Ok(true));
        if matches!(result, Ok(true)) {
            self.deployed.lock().remove(web_app);
        }
        result
    }
}

/// In-memory connection owning projects and the deployment agent
#[derive(Debug)]
pub struct InMemoryConnection {
    connected: Mutex<bool>,
    connect_error: Mutex<Option<RemoteError>>,
    projects: Mutex<Vec<Arc<InMemoryProject>>>,
    agent: Arc<InMemoryModuleAdminAgent>,
    journal: Journal,
}

impl InMemoryConnection {
    /// Disconnected server without projects
    #[must_use]
    pub fn new() -> Self {
        let journal = Journal::default();
        Self {
            connected: Mutex::new(false),
            connect_error: Mutex::new(None),
            projects: Mutex::new(Vec::new()),
            agent: Arc::new(InMemoryModuleAdminAgent {
                journal: journal.clone(),
                ..Default::default()
            }),
            journal,
        }
    }

    /// Add a project
    pub fn add_project(&self, id: u64, name: &str) -> Arc<InMemoryProject> {
        let project = Arc::new(InMemoryProject::new(id, name, self.journal.clone()));
        self.projects.lock().push(Arc::clone(&project));
        project
    }

    /// Let the next `connect` fail
    pub fn fail_connect(&self, error: RemoteError) {
        *self.connect_error.lock() = Some(error);
    }

    pub fn set_connected(&self, connected: bool) {
        *self.connected.lock() = connected;
    }

    #[must_use]
    pub fn agent(&self) -> Arc<InMemoryModuleAdminAgent> {
        Arc::clone(&self.agent)
    }

    #[must_use]
    pub fn journal(&self) -> &Journal {
        &self.journal
    }
}

impl Default for InMemoryConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl Connection for InMemoryConnection {
    fn connect(&self) -> Result<(), RemoteError> {
        self.journal.record(RemoteCall::Connect);
        if let Some(error) = self.connect_error.lock().take() {
            return Err(error);
        }
        *self.connected.lock() = true;
        Ok(())
    }

    fn disconnect(&self) {
        self.journal.record(RemoteCall::Disconnect);
        *self.connected.lock() = false;
    }

    fn is_connected(&self) -> bool {
        *self.connected.lock()
    }

    fn projects(&self) -> Vec<Arc<dyn Project>> {
        self.projects
            .lock()
            .iter()
            .map(|project| Arc::clone(project) as Arc<dyn Project>)
            .collect()
    }

    fn project_by_name(&self, name: &str) -> Option<Arc<dyn Project>> {
        self.projects
            .lock()
            .iter()
            .find(|project| project.name == name)
            .map(|project| Arc::clone(project) as Arc<dyn Project>)
    }

    fn module_admin_agent(&self) -> Arc<dyn ModuleAdminAgent> {
        Arc::clone(&self.agent) as Arc<dyn ModuleAdminAgent>
    }
}

/// Project name used by the fixtures
pub const TEST_PROJECT: &str = "Mithras Energy";

/// Connected server holding [`TEST_PROJECT`]
#[must_use]
pub fn connected_server() -> (InMemoryConnection, Arc<InMemoryProject>) {
    let connection = InMemoryConnection::new();
    let project = connection.add_project(4711, TEST_PROJECT);
    connection.set_connected(true);
    (connection, project)
}

/// Request against [`TEST_PROJECT`]
#[must_use]
pub fn request_for(server_name: &str, scopes: &[Scope], force_activation: bool) -> ActivationRequest {
    ActivationRequest::builder()
        .at_project_name(TEST_PROJECT)
        .with_server_name(server_name)
        .for_scopes(scopes.iter().cloned())
        .with_force_activation(force_activation)
        .build()
        .expect("all request fields are set")
}

/// Initialize test logging (call once per test module)
pub fn init_test_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("wsa_core=debug".parse().expect("valid directive")),
        )
        .with_test_writer()
        .try_init();
}
