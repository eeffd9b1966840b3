//! WSA Core - Web Server Activation
//!
//! Moves the "active web server" of project web app scopes to a new server:
//! - Builds and validates activation requests
//! - Checks preconditions against the remote server
//! - Decides per scope whether activation is needed
//! - Migrates each scope (undeploy, reassign, deploy)
//! - Rolls back to the original server when a step fails
//!
//! # Example
//!
//! ```rust,ignore
//! use wsa_core::{ActivationRequest, Scope, WebScope, WebServerActivator};
//!
//! let request = ActivationRequest::builder()
//!     .at_project_name("Mithras Energy")
//!     .with_server_name("FirstSpirit Jetty")
//!     .for_scopes([Scope::Project(WebScope::WebEdit)])
//!     .with_force_activation(true)
//!     .build()?;
//!
//! let report = WebServerActivator::default().connect_and_activate(&connection, &request)?;
//! println!("{}", report.to_json()?);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod activator;
pub mod config;
pub mod decision;
pub mod error;
pub mod lock;
pub mod migration;
pub mod observability;
pub mod remote;
pub mod report;
pub mod request;
pub mod scope;
pub mod scope_parser;
pub mod state_machine;

// Re-exports for convenience
pub use activator::{check_preconditions, WebServerActivator};
pub use config::{ActivatorConfig, LogConfig, LogFormat};
pub use decision::{should_activate_web_server, ActivationDecision, SkipReason};
pub use error::{
    ActivationError, CallFailure, PreconditionFailure, RecoveryIncomplete, RemoteError, StepError,
};
pub use lock::ProjectLock;
pub use migration::ScopeMigration;
pub use remote::{Connection, ModuleAdminAgent, Project};
pub use report::{ActivationReport, MigrationOutcome, OutcomeSummary, ScopeReport};
pub use request::{ActivationRequest, ActivationRequestBuilder};
pub use scope::{Scope, WebAppId, WebScope};
pub use scope_parser::parse_scopes;
pub use state_machine::{MigrationState, MigrationTracker};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with WSA Core
    pub use crate::{
        ActivationReport, ActivationRequest, Connection, MigrationOutcome, ModuleAdminAgent,
        Project, Scope, WebScope, WebServerActivator,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
