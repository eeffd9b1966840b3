//! Activation outcomes
//!
//! Every processed scope ends in exactly one [`MigrationOutcome`]. The
//! [`ActivationReport`] collects them in request order.

use crate::decision::SkipReason;
use crate::error::{StepError, RecoveryIncomplete};
use crate::scope::Scope;
use serde::{Deserialize, Serialize};

/// Final state of one scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MigrationOutcome {
    /// No action needed
    Skipped {
        /// Why the scope was left alone
        reason: SkipReason,
    },
    /// New server active and web app deployed
    Migrated,
    /// Migration failed, every recovery step succeeded
    Recovered {
        /// Failure that triggered the recovery
        cause: String,
    },
    /// Migration failed and recovery left work undone
    RecoveryFailed {
        /// Failure that triggered the recovery
        cause: String,
        /// Recovery step failures
        errors: Vec<String>,
    },
}

impl MigrationOutcome {
    pub(crate) fn recovered(cause: &StepError) -> Self {
        Self::Recovered {
            cause: cause.to_string(),
        }
    }

    pub(crate) fn recovery_failed(cause: &StepError, incomplete: &RecoveryIncomplete) -> Self {
        Self::RecoveryFailed {
            cause: cause.to_string(),
            errors: incomplete.errors.iter().map(ToString::to_string).collect(),
        }
    }

    /// Whether the scope ended in its requested or untouched state
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Skipped { .. } | Self::Migrated)
    }
}

/// Outcome for one requested scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeReport {
    /// Requested scope
    pub scope: Scope,
    /// What happened to it
    pub outcome: MigrationOutcome,
}

/// Tally of outcomes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeSummary {
    /// Skipped scopes
    pub skipped: usize,
    /// Migrated scopes
    pub migrated: usize,
    /// Scopes rolled back to their original server
    pub recovered: usize,
    /// Scopes whose rollback was incomplete
    pub recovery_failed: usize,
}

/// Per-scope outcomes of one activation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationReport {
    /// Project the activation ran against
    pub project_name: String,
    /// Server that was activated
    pub server_name: String,
    /// Outcomes in request order
    pub scopes: Vec<ScopeReport>,
}

impl ActivationReport {
    pub(crate) fn new(project_name: &str, server_name: &str) -> Self {
        Self {
            project_name: project_name.to_string(),
            server_name: server_name.to_string(),
            scopes: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, scope: Scope, outcome: MigrationOutcome) {
        self.scopes.push(ScopeReport { scope, outcome });
    }

    /// True when no scope needed a rollback
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.scopes.iter().all(|report| report.outcome.is_success())
    }

    /// Count outcomes by kind
    #[must_use]
    pub fn summary(&self) -> OutcomeSummary {
        self.scopes
            .iter()
            .fold(OutcomeSummary::default(), |mut summary, report| {
                match report.outcome {
                    MigrationOutcome::Skipped { .. } => summary.skipped += 1,
                    MigrationOutcome::Migrated => summary.migrated += 1,
                    MigrationOutcome::Recovered { .. } => summary.recovered += 1,
                    MigrationOutcome::RecoveryFailed { .. } => summary.recovery_failed += 1,
                }
                summary
            })
    }

    /// Render as pretty JSON
    ///
    /// # Errors
    /// Returns the serializer error; cannot happen for well-formed reports
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
