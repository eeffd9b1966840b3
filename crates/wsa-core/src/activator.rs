//! Web server activator
//!
//! Entry point for activations:
//! - Checks preconditions against the remote server
//! - Decides per scope whether the active web server has to change
//! - Runs the migration with recovery for every scope that needs it
//! - Reports one outcome per scope

use crate::config::ActivatorConfig;
use crate::decision::{should_activate_web_server, ActivationDecision, SkipReason};
use crate::error::{ActivationError, PreconditionFailure};
use crate::migration::ScopeMigration;
use crate::observability::activation_span;
use crate::remote::{Connection, Project};
use crate::report::{ActivationReport, MigrationOutcome};
use crate::request::ActivationRequest;
use crate::scope::Scope;
use std::sync::Arc;

/// Activates a web server for scopes of a project
#[derive(Debug, Clone, Default)]
pub struct WebServerActivator {
    config: ActivatorConfig,
}

impl WebServerActivator {
    /// Create an activator
    #[inline]
    #[must_use]
    pub fn new(config: ActivatorConfig) -> Self {
        Self { config }
    }

    /// Get configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ActivatorConfig {
        &self.config
    }

    /// Activate and reduce the result to a single flag
    ///
    /// `true` when preconditions held and no scope needed a rollback.
    pub fn activate_web_server(
        &self,
        connection: Option<&dyn Connection>,
        request: &ActivationRequest,
    ) -> bool {
        match self.activate(connection, request) {
            Ok(report) => report.is_success(),
            Err(_) => false,
        }
    }

    /// Activate `request.server_name()` for every requested scope
    ///
    /// Scopes are processed in request order, one at a time. Migration
    /// failures do not abort the remaining scopes; they are recovered and
    /// reported per scope.
    ///
    /// # Errors
    /// - `ActivationError::Precondition` if the connection, project or scope
    ///   list is unusable; no scope is touched in that case
    pub fn activate(
        &self,
        connection: Option<&dyn Connection>,
        request: &ActivationRequest,
    ) -> Result<ActivationReport, ActivationError> {
        let span = activation_span(request.project_name(), request.server_name());
        let _guard = span.enter();

        let (connection, project) = check_preconditions(connection, request).map_err(|e| {
            tracing::error!(reason = %e, "Preconditions for server activation are not fulfilled!");
            ActivationError::from(e)
        })?;

        let agent = connection.module_admin_agent();
        let migration = ScopeMigration::new(project.as_ref(), agent.as_ref())
            .with_verify_recovery(self.config.verify_recovery);

        let mut report = ActivationReport::new(request.project_name(), request.server_name());
        for scope in request.scopes().iter().flatten() {
            let outcome = process_scope(&migration, project.as_ref(), scope, request);
            report.push(scope.clone(), outcome);
        }

        let summary = report.summary();
        tracing::info!(
            skipped = summary.skipped,
            migrated = summary.migrated,
            recovered = summary.recovered,
            recovery_failed = summary.recovery_failed,
            "Web server activation finished"
        );
        Ok(report)
    }

    /// Validate, connect, activate and disconnect
    ///
    /// The connection is closed again on every path after a successful
    /// connect.
    ///
    /// # Errors
    /// - `ActivationError::InvalidArgument` for an empty project, server or
    ///   scope list, checked before connecting
    /// - `ActivationError::Connection` if connecting fails
    /// - anything [`WebServerActivator::activate`] returns
    pub fn connect_and_activate(
        &self,
        connection: &dyn Connection,
        request: &ActivationRequest,
    ) -> Result<ActivationReport, ActivationError> {
        request.validate()?;
        connection.connect()?;
        let result = self.activate(Some(connection), request);
        connection.disconnect();
        result
    }
}

/// Check that an activation may start
///
/// Checks in order and stops at the first failure: connected, any projects,
/// project exists, no absent scope.
///
/// # Errors
/// - the first `PreconditionFailure` found
pub fn check_preconditions<'c>(
    connection: Option<&'c dyn Connection>,
    request: &ActivationRequest,
) -> Result<(&'c dyn Connection, Arc<dyn Project>), PreconditionFailure> {
    let connection = match connection {
        Some(connection) if connection.is_connected() => connection,
        _ => {
            tracing::error!("Please provide a connected connection");
            return Err(PreconditionFailure::NotConnected);
        }
    };

    if connection.projects().is_empty() {
        tracing::error!("Could not find any projects on the server.");
        return Err(PreconditionFailure::NoProjects);
    }

    let Some(project) = connection.project_by_name(request.project_name()) else {
        tracing::error!(
            "Could not find project with name '{}' on the server.",
            request.project_name()
        );
        return Err(PreconditionFailure::ProjectNotFound(
            request.project_name().to_string(),
        ));
    };

    if let Some(position) = request.scopes().iter().position(Option::is_none) {
        tracing::error!("Found absent scope in scopes. All scopes must be present.");
        return Err(PreconditionFailure::AbsentScope(position));
    }

    Ok((connection, project))
}

fn process_scope(
    migration: &ScopeMigration<'_>,
    project: &dyn Project,
    scope: &Scope,
    request: &ActivationRequest,
) -> MigrationOutcome {
    let scope_name = scope.scope_name();
    let current = project.active_web_server(scope_name);
    let decision = should_activate_web_server(
        current.as_deref(),
        request.server_name(),
        request.is_force_activation(),
    );

    match decision {
        ActivationDecision::Activate => {
            match current.as_deref() {
                None | Some("") => {
                    tracing::info!("Could not find an activated web server for scope {scope_name}.");
                }
                Some(active) => {
                    tracing::info!(
                        "Replacing active web server '{active}' for scope {scope_name} (force activation)."
                    );
                }
            }
            migration.migrate(scope, request.server_name(), current.as_deref())
        }
        ActivationDecision::Skip(reason) => {
            match reason {
                SkipReason::AlreadyActive => tracing::info!(
                    "'{}' is already the activated web server for scope {scope_name}.",
                    request.server_name()
                ),
                SkipReason::ForceRequired => tracing::info!(
                    "'{}' already has an activated web server for scope {scope_name}. \
                     Enable 'force activation' flag to overwrite the currently active web server.",
                    request.project_name()
                ),
            }
            tracing::info!("Skip activation for scope {scope_name}");
            MigrationOutcome::Skipped { reason }
        }
    }
}
