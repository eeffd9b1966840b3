//! Per-scope migration with recovery
//!
//! Moves one scope to a new web server: undeploy, reassign the active web
//! server under the project lock, deploy. Any failure switches to
//! [`ScopeMigration::recover_deployment_for_scope`], which walks through all
//! of its steps and collects what went wrong instead of stopping early.

use crate::error::{CallFailure, RecoveryIncomplete, RemoteError, StepError};
use crate::lock;
use crate::observability::scope_span;
use crate::remote::{ModuleAdminAgent, Project};
use crate::report::MigrationOutcome;
use crate::scope::{Scope, WebAppId};
use crate::state_machine::{MigrationState, MigrationTracker};

/// Deploy or undeploy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Call {
    Deploy,
    Undeploy,
}

impl Call {
    fn verb(self) -> &'static str {
        match self {
            Call::Deploy => "deploy",
            Call::Undeploy => "undeploy",
        }
    }

    fn step_error(self, web_app: &WebAppId, failure: CallFailure) -> StepError {
        let web_app = web_app.to_string();
        match self {
            Call::Deploy => StepError::Deploy { web_app, failure },
            Call::Undeploy => StepError::Undeploy { web_app, failure },
        }
    }
}

/// Migrates scopes of one project
pub struct ScopeMigration<'a> {
    project: &'a dyn Project,
    agent: &'a dyn ModuleAdminAgent,
    verify_recovery: bool,
}

impl<'a> ScopeMigration<'a> {
    /// Create a migration over `project` using `agent` for deployments
    #[must_use]
    pub fn new(project: &'a dyn Project, agent: &'a dyn ModuleAdminAgent) -> Self {
        Self {
            project,
            agent,
            verify_recovery: false,
        }
    }

    /// Re-read the active web server after recovery
    #[must_use]
    pub fn with_verify_recovery(mut self, verify: bool) -> Self {
        self.verify_recovery = verify;
        self
    }

    /// Move `scope` to `server_name`
    ///
    /// `original` is the active web server observed before any mutation and
    /// is the restore target on failure. Never fails: errors end up in the
    /// returned outcome.
    pub fn migrate(&self, scope: &Scope, server_name: &str, original: Option<&str>) -> MigrationOutcome {
        let web_app = scope.web_app_id(self.project);
        let span = scope_span(scope.scope_name(), &web_app.to_string());
        let _guard = span.enter();

        let mut tracker = MigrationTracker::new();
        let result = self.run_forward(scope, &web_app, server_name, &mut tracker);
        let outcome = match result {
            Ok(()) => {
                tracing::info!(server = server_name, "Activated web server for scope");
                MigrationOutcome::Migrated
            }
            Err(cause) => {
                tracing::error!(error = %cause, "Web server activation failed, restoring original deployment");
                transition(&mut tracker, MigrationState::Recovering);
                let recovery = self.recover_deployment_for_scope(scope, original);
                transition(&mut tracker, MigrationState::RecoveryDone);
                match recovery {
                    Ok(()) => MigrationOutcome::recovered(&cause),
                    Err(incomplete) => MigrationOutcome::recovery_failed(&cause, &incomplete),
                }
            }
        };
        tracing::debug!(path = ?tracker.history(), "Migration finished");
        outcome
    }

    fn run_forward(
        &self,
        scope: &Scope,
        web_app: &WebAppId,
        server_name: &str,
        tracker: &mut MigrationTracker,
    ) -> Result<(), StepError> {
        self.call(Call::Undeploy, scope, web_app)?;
        transition(tracker, MigrationState::Undeployed);

        lock::set_active_web_server(self.project, scope.scope_name(), server_name)?;
        transition(tracker, MigrationState::Reassigned);

        self.call(Call::Deploy, scope, web_app)?;
        transition(tracker, MigrationState::Deployed);
        transition(tracker, MigrationState::Done);
        Ok(())
    }

    /// Best-effort restore of `original` as active web server for `scope`
    ///
    /// Undeploys, reassigns `original` (the empty string when there was none)
    /// and redeploys when there is an original server to deploy to. Every
    /// step runs regardless of earlier failures.
    ///
    /// # Errors
    /// - `RecoveryIncomplete` listing every failed step
    pub fn recover_deployment_for_scope(
        &self,
        scope: &Scope,
        original: Option<&str>,
    ) -> Result<(), RecoveryIncomplete> {
        let scope_name = scope.scope_name();
        let web_app = scope.web_app_id(self.project);
        let original = original.filter(|server| !server.is_empty());
        tracing::warn!(original = ?original, "Trying to recover deployment for scope");

        let mut errors = Vec::new();

        if let Err(e) = self.call(Call::Undeploy, scope, &web_app) {
            tracing::error!(error = %e, "Recovery: undeploy failed");
            errors.push(e);
        }

        if let Err(e) = lock::set_active_web_server(self.project, scope_name, original.unwrap_or_default()) {
            tracing::error!(error = %e, "Recovery: resetting active web server failed");
            errors.push(e);
        }

        if original.is_some() {
            if let Err(e) = self.call(Call::Deploy, scope, &web_app) {
                tracing::error!(error = %e, "Recovery: redeploy failed");
                errors.push(e);
            }
        } else {
            tracing::debug!("Recovery: no original web server, nothing to redeploy");
        }

        if self.verify_recovery {
            let actual = self
                .project
                .active_web_server(scope_name)
                .filter(|server| !server.is_empty());
            if actual.as_deref() != original {
                errors.push(StepError::Unverified {
                    scope: scope_name.to_string(),
                    expected: original.map(str::to_string),
                    actual,
                });
            }
        } else {
            tracing::warn!(
                "Recovery for scope {scope_name} finished. Please verify the active web server and the deployment manually."
            );
        }

        if errors.is_empty() {
            tracing::info!("Recovery for scope succeeded");
            Ok(())
        } else {
            let incomplete = RecoveryIncomplete {
                scope: scope_name.to_string(),
                errors,
            };
            tracing::error!(error = %incomplete, "Recovery for scope incomplete");
            Err(incomplete)
        }
    }

    fn call(&self, call: Call, scope: &Scope, web_app: &WebAppId) -> Result<(), StepError> {
        tracing::debug!(web_app = %web_app, "Trying to {} web app", call.verb());
        let result = match call {
            Call::Deploy => self.agent.deploy_web_app(web_app),
            Call::Undeploy => self.agent.undeploy_web_app(web_app),
        };
        match result {
            Ok(true) => Ok(()),
            Ok(false) => {
                tracing::error!(web_app = %web_app, "Could not {} web app", call.verb());
                Err(call.step_error(web_app, CallFailure::Rejected))
            }
            Err(e) => {
                log_call_error(call, scope, &e);
                Err(call.step_error(web_app, CallFailure::Remote(e)))
            }
        }
    }
}

impl std::fmt::Debug for ScopeMigration<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeMigration")
            .field("project", &self.project.name())
            .field("verify_recovery", &self.verify_recovery)
            .finish_non_exhaustive()
    }
}

fn log_call_error(call: Call, scope: &Scope, error: &RemoteError) {
    let verb = call.verb();
    if !error.is_permission_denied() {
        tracing::error!(error = %error, "Could not {verb} web app");
    } else if scope.is_global() {
        tracing::error!(
            error = %error,
            "Permission denied: server administrator rights are required to {verb} global web app {scope}"
        );
    } else {
        tracing::error!(
            error = %error,
            "Permission denied: project administrator rights are required to {verb} web app for scope {scope}"
        );
    }
}

fn transition(tracker: &mut MigrationTracker, to: MigrationState) {
    if let Err(e) = tracker.advance(to) {
        tracing::error!(error = %e, "Migration state out of order");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::WebScope;
    use mockall::{mock, Sequence};
    use parking_lot::Mutex;
    use std::collections::HashMap;

    mock! {
        Agent {}
        impl ModuleAdminAgent for Agent {
            fn deploy_web_app(&self, web_app: &WebAppId) -> Result<bool, RemoteError>;
            fn undeploy_web_app(&self, web_app: &WebAppId) -> Result<bool, RemoteError>;
        }
    }

    #[derive(Default)]
    struct TestProject {
        servers: Mutex<HashMap<String, String>>,
        fail_save: bool,
        unlocks: Mutex<u32>,
    }

    impl TestProject {
        fn with_server(scope: &str, server: &str) -> Self {
            let project = Self::default();
            project.servers.lock().insert(scope.to_string(), server.to_string());
            project
        }
    }

    impl Project for TestProject {
        fn id(&self) -> u64 {
            7
        }

        fn name(&self) -> String {
            "test".to_string()
        }

        fn active_web_server(&self, scope_name: &str) -> Option<String> {
            self.servers.lock().get(scope_name).cloned()
        }

        fn set_active_web_server(&self, scope_name: &str, server_name: &str) -> Result<(), RemoteError> {
            self.servers
                .lock()
                .insert(scope_name.to_string(), server_name.to_string());
            Ok(())
        }

        fn lock(&self) -> Result<(), RemoteError> {
            Ok(())
        }

        fn unlock(&self) {
            *self.unlocks.lock() += 1;
        }

        fn save(&self) -> Result<(), RemoteError> {
            if self.fail_save {
                Err(RemoteError::Persistence("read-only".into()))
            } else {
                Ok(())
            }
        }
    }

    fn webedit() -> Scope {
        Scope::Project(WebScope::WebEdit)
    }

    #[test]
    fn happy_path_calls_in_order() {
        let project = TestProject::default();
        let mut agent = MockAgent::new();
        let mut seq = Sequence::new();
        agent
            .expect_undeploy_web_app()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(true));
        agent
            .expect_deploy_web_app()
            .withf(|id| *id == WebAppId::Project { project_id: 7, scope: WebScope::WebEdit })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(true));

        let outcome = ScopeMigration::new(&project, &agent).migrate(&webedit(), "JettyA", None);

        assert_eq!(outcome, MigrationOutcome::Migrated);
        assert_eq!(project.active_web_server("WEBEDIT").as_deref(), Some("JettyA"));
        assert_eq!(*project.unlocks.lock(), 1);
    }

    #[test]
    fn undeploy_failure_recovers_without_redeploy_when_unset() {
        let project = TestProject::default();
        let mut agent = MockAgent::new();
        agent.expect_undeploy_web_app().times(2).returning(|_| Ok(false));
        agent.expect_deploy_web_app().never();

        let outcome = ScopeMigration::new(&project, &agent).migrate(&webedit(), "JettyA", None);

        match outcome {
            MigrationOutcome::RecoveryFailed { cause, errors } => {
                assert!(cause.starts_with("undeploy of"));
                assert_eq!(errors.len(), 1);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(project.active_web_server("WEBEDIT").as_deref(), Some(""));
    }

    #[test]
    fn deploy_failure_restores_original_server() {
        let project = TestProject::with_server("WEBEDIT", "JettyA");
        let mut agent = MockAgent::new();
        agent.expect_undeploy_web_app().times(2).returning(|_| Ok(true));
        let mut deploys = 0;
        agent.expect_deploy_web_app().times(2).returning(move |_| {
            deploys += 1;
            Ok(deploys > 1)
        });

        let outcome =
            ScopeMigration::new(&project, &agent).migrate(&webedit(), "JettyB", Some("JettyA"));

        assert!(matches!(outcome, MigrationOutcome::Recovered { .. }));
        assert_eq!(project.active_web_server("WEBEDIT").as_deref(), Some("JettyA"));
        assert_eq!(*project.unlocks.lock(), 2);
    }

    #[test]
    fn recovery_continues_after_failed_steps() {
        let project = TestProject::with_server("GLOBAL", "JettyA");
        let mut agent = MockAgent::new();
        agent
            .expect_undeploy_web_app()
            .times(1)
            .returning(|_| Err(RemoteError::PermissionDenied("not a server admin".into())));
        agent.expect_deploy_web_app().times(1).returning(|_| Ok(false));

        let migration = ScopeMigration::new(&project, &agent);
        let err = migration
            .recover_deployment_for_scope(&Scope::global("fs5root"), Some("JettyA"))
            .unwrap_err();

        assert_eq!(err.errors.len(), 2);
        assert!(err.errors[0].is_permission_denied());
        assert!(matches!(err.errors[1], StepError::Deploy { failure: CallFailure::Rejected, .. }));
        assert_eq!(project.active_web_server("GLOBAL").as_deref(), Some("JettyA"));
    }

    #[test]
    fn reassign_failure_enters_recovery() {
        let project = TestProject {
            fail_save: true,
            ..TestProject::with_server("PREVIEW", "JettyA")
        };
        let mut agent = MockAgent::new();
        agent.expect_undeploy_web_app().times(2).returning(|_| Ok(true));
        agent.expect_deploy_web_app().times(1).returning(|_| Ok(true));

        let outcome = ScopeMigration::new(&project, &agent).migrate(
            &Scope::Project(WebScope::Preview),
            "JettyB",
            Some("JettyA"),
        );

        match outcome {
            MigrationOutcome::RecoveryFailed { cause, errors } => {
                assert!(cause.contains("could not be set as active web server"));
                assert_eq!(errors.len(), 1);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(*project.unlocks.lock(), 2);
    }

    #[test]
    fn verification_reports_mismatch() {
        let project = TestProject {
            fail_save: true,
            ..TestProject::with_server("STAGING", "JettyB")
        };
        let mut agent = MockAgent::new();
        agent.expect_undeploy_web_app().returning(|_| Ok(true));
        agent.expect_deploy_web_app().returning(|_| Ok(true));

        let err = ScopeMigration::new(&project, &agent)
            .with_verify_recovery(true)
            .recover_deployment_for_scope(&Scope::Project(WebScope::Staging), Some("JettyA"))
            .unwrap_err();

        assert!(matches!(
            err.errors.last(),
            Some(StepError::Unverified { actual: Some(server), .. }) if server == "JettyB"
        ));
    }
}
