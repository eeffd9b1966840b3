//! Activation request model
//!
//! An [`ActivationRequest`] describes one activation: which project, which
//! server, which scopes and whether an existing assignment may be overwritten.
//! Requests are immutable and built with [`ActivationRequestBuilder`].

use crate::error::ActivationError;
use crate::scope::Scope;
use serde::{Deserialize, Serialize};

/// Immutable description of one activation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationRequest {
    project_name: String,
    server_name: String,
    scopes: Vec<Option<Scope>>,
    force_activation: bool,
}

impl ActivationRequest {
    /// Start building a request
    #[inline]
    #[must_use]
    pub fn builder() -> ActivationRequestBuilder {
        ActivationRequestBuilder::default()
    }

    /// Target project name
    #[inline]
    #[must_use]
    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    /// Server that should become active
    #[inline]
    #[must_use]
    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    /// Requested scopes in processing order; `None` marks an absent entry
    #[inline]
    #[must_use]
    pub fn scopes(&self) -> &[Option<Scope>] {
        &self.scopes
    }

    /// Whether an existing, different assignment may be overwritten
    #[inline]
    #[must_use]
    pub fn is_force_activation(&self) -> bool {
        self.force_activation
    }

    /// Caller-facing argument validation
    ///
    /// # Errors
    /// - `ActivationError::InvalidArgument` for an empty project name, server
    ///   name or scope list
    pub fn validate(&self) -> Result<(), ActivationError> {
        if self.project_name.trim().is_empty() {
            return Err(ActivationError::InvalidArgument(
                "Missing parameter for project name".to_string(),
            ));
        }
        if self.server_name.trim().is_empty() {
            return Err(ActivationError::InvalidArgument(
                "Missing parameter for web server name".to_string(),
            ));
        }
        if self.scopes.is_empty() {
            return Err(ActivationError::InvalidArgument(
                "Missing parameter for web app scopes".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for [`ActivationRequest`]
#[derive(Debug, Clone, Default)]
pub struct ActivationRequestBuilder {
    project_name: Option<String>,
    server_name: Option<String>,
    scopes: Option<Vec<Option<Scope>>>,
    force_activation: Option<bool>,
}

impl ActivationRequestBuilder {
    /// Set the target project
    #[must_use]
    pub fn at_project_name(mut self, project_name: impl Into<String>) -> Self {
        self.project_name = Some(project_name.into());
        self
    }

    /// Set the server to activate
    #[must_use]
    pub fn with_server_name(mut self, server_name: impl Into<String>) -> Self {
        self.server_name = Some(server_name.into());
        self
    }

    /// Set the scopes; accepts `Scope` or `Option<Scope>` items
    #[must_use]
    pub fn for_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Option<Scope>>,
    {
        self.scopes = Some(scopes.into_iter().map(Into::into).collect());
        self
    }

    /// Set the force flag
    #[must_use]
    pub fn with_force_activation(mut self, force_activation: bool) -> Self {
        self.force_activation = Some(force_activation);
        self
    }

    /// Build the request
    ///
    /// Values are taken as given; see [`ActivationRequest::validate`].
    ///
    /// # Errors
    /// - `ActivationError::IncompleteRequest` naming the first missing field
    pub fn build(self) -> Result<ActivationRequest, ActivationError> {
        Ok(ActivationRequest {
            project_name: self
                .project_name
                .ok_or(ActivationError::IncompleteRequest("project name"))?,
            server_name: self
                .server_name
                .ok_or(ActivationError::IncompleteRequest("server name"))?,
            scopes: self
                .scopes
                .ok_or(ActivationError::IncompleteRequest("scopes"))?,
            force_activation: self
                .force_activation
                .ok_or(ActivationError::IncompleteRequest("force activation flag"))?,
        })
    }
}
