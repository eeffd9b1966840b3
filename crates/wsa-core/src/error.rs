//! Error types for WSA Core
//!
//! Provides error handling for:
//! - Request construction and caller-facing validation
//! - Precondition checks against the remote server
//! - Remote calls (deploy, undeploy, lock, save)
//! - Migration steps and incomplete recoveries

/// Main activation error type
#[derive(Debug, thiserror::Error)]
pub enum ActivationError {
    /// A required request field was never supplied to the builder
    #[error("incomplete activation request: missing {0}")]
    IncompleteRequest(&'static str),

    /// Caller supplied an unusable argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Remote state does not allow the activation to start
    #[error("preconditions for server activation are not fulfilled: {0}")]
    Precondition(#[from] PreconditionFailure),

    /// Connecting to or talking with the server failed outside a migration
    #[error("connection error: {0}")]
    Connection(#[from] RemoteError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl ActivationError {
    /// Check if error stems from a failed precondition
    #[inline]
    #[must_use]
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::Precondition(_))
    }

    /// Check if error was caused by bad caller input
    #[inline]
    #[must_use]
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::IncompleteRequest(_) | Self::InvalidArgument(_))
    }
}

/// Precondition failures, in the order they are checked
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PreconditionFailure {
    /// No connection, or the connection is closed
    #[error("please provide a connected connection")]
    NotConnected,

    /// The server reports no projects at all
    #[error("could not find any projects on the server")]
    NoProjects,

    /// Named project does not exist
    #[error("could not find project with name '{0}' on the server")]
    ProjectNotFound(String),

    /// A scope entry was absent
    #[error("found absent scope at position {0}; all scopes must be present")]
    AbsentScope(usize),
}

/// Failures reported by the remote administration API
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// Authorization layer rejected the call
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Project lock could not be acquired
    #[error("cannot lock project: {0}")]
    Lock(String),

    /// Project could not be saved
    #[error("cannot save project: {0}")]
    Persistence(String),

    /// Connection-level failure
    #[error("connection failed: {0}")]
    Connection(String),

    /// Any other remote failure
    #[error("remote call failed: {0}")]
    Remote(String),
}

impl RemoteError {
    /// Check if the remote rejected the call for lack of rights
    #[inline]
    #[must_use]
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied(_))
    }

    /// Check if error belongs to the lock/save family
    #[inline]
    #[must_use]
    pub fn is_lock_or_persistence(&self) -> bool {
        matches!(self, Self::Lock(_) | Self::Persistence(_))
    }
}

/// Why a deploy or undeploy call did not succeed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallFailure {
    /// The call completed but the server answered `false`
    #[error("rejected by the server")]
    Rejected,

    /// The call itself failed
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// A failed step of the migration state machine or of its recovery
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StepError {
    /// Undeploying the web app failed
    #[error("undeploy of '{web_app}' failed: {failure}")]
    Undeploy {
        /// Web app that was being undeployed
        web_app: String,
        /// Failure detail
        failure: CallFailure,
    },

    /// Locking, mutating or saving the project failed
    #[error("'{server}' could not be set as active web server for scope '{scope}': {source}")]
    Reassign {
        /// Scope name
        scope: String,
        /// Server that was being assigned
        server: String,
        /// Underlying remote failure
        #[source]
        source: RemoteError,
    },

    /// Deploying the web app failed
    #[error("deploy of '{web_app}' failed: {failure}")]
    Deploy {
        /// Web app that was being deployed
        web_app: String,
        /// Failure detail
        failure: CallFailure,
    },

    /// Post-recovery read-back did not match the original server
    #[error("active web server for scope '{scope}' is {actual:?} after recovery, expected {expected:?}")]
    Unverified {
        /// Scope name
        scope: String,
        /// Server that should be active
        expected: Option<String>,
        /// Server that is active
        actual: Option<String>,
    },
}

impl StepError {
    /// Check if step failed because the remote denied permission
    #[must_use]
    pub fn is_permission_denied(&self) -> bool {
        match self {
            Self::Undeploy { failure, .. } | Self::Deploy { failure, .. } => {
                matches!(failure, CallFailure::Remote(e) if e.is_permission_denied())
            }
            Self::Reassign { source, .. } => source.is_permission_denied(),
            Self::Unverified { .. } => false,
        }
    }
}

/// Recovery ran all its sub-steps but some of them failed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("recovery of scope '{scope}' incomplete: {} step(s) failed", .errors.len())]
pub struct RecoveryIncomplete {
    /// Scope name
    pub scope: String,
    /// Every sub-step failure, in execution order
    pub errors: Vec<StepError>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activation_error_display() {
        let err = ActivationError::from(PreconditionFailure::ProjectNotFound("Mithras".into()));
        assert!(err.to_string().contains("'Mithras'"));
        assert!(err.is_precondition());
        assert!(!err.is_invalid_input());
    }

    #[test]
    fn step_error_permission_denied() {
        let denied = StepError::Deploy {
            web_app: "global(fs5root)".to_string(),
            failure: CallFailure::Remote(RemoteError::PermissionDenied("no admin".into())),
        };
        assert!(denied.is_permission_denied());

        let rejected = StepError::Undeploy {
            web_app: "global(fs5root)".to_string(),
            failure: CallFailure::Rejected,
        };
        assert!(!rejected.is_permission_denied());
    }

    #[test]
    fn recovery_incomplete_counts_errors() {
        let err = RecoveryIncomplete {
            scope: "WEBEDIT".to_string(),
            errors: vec![
                StepError::Undeploy {
                    web_app: "x".into(),
                    failure: CallFailure::Rejected,
                },
                StepError::Deploy {
                    web_app: "x".into(),
                    failure: CallFailure::Rejected,
                },
            ],
        };
        assert_eq!(
            err.to_string(),
            "recovery of scope 'WEBEDIT' incomplete: 2 step(s) failed"
        );
    }
}
