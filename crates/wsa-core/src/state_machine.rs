//! Migration states
//!
//! Forward path: `Start -> Undeployed -> Reassigned -> Deployed -> Done`.
//! Any forward state may fall into `Recovering`, which always ends in
//! `RecoveryDone`.

use serde::{Deserialize, Serialize};

/// State of one scope migration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationState {
    /// Nothing done yet
    Start,
    /// Web app removed from the old server
    Undeployed,
    /// Active web server points at the new server
    Reassigned,
    /// Web app deployed to the new server
    Deployed,
    /// Migration complete
    Done,
    /// Restoring the original configuration
    Recovering,
    /// Recovery finished, successfully or not
    RecoveryDone,
}

/// Illegal state transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("illegal migration transition {from:?} -> {to:?}")]
pub struct IllegalTransition {
    /// Current state
    pub from: MigrationState,
    /// Requested state
    pub to: MigrationState,
}

/// States reachable from `from`
#[must_use]
pub fn allowed_transitions(from: MigrationState) -> &'static [MigrationState] {
    use MigrationState::*;
    match from {
        Start => &[Undeployed, Recovering],
        Undeployed => &[Reassigned, Recovering],
        Reassigned => &[Deployed, Recovering],
        Deployed => &[Done],
        Recovering => &[RecoveryDone],
        Done | RecoveryDone => &[],
    }
}

/// Validates a state transition
///
/// # Errors
/// - `IllegalTransition` if `to` is not reachable from `from`
pub fn validate_transition(from: MigrationState, to: MigrationState) -> Result<(), IllegalTransition> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(IllegalTransition { from, to })
    }
}

/// Tracks the state of one scope migration and the path it took
#[derive(Debug, Clone)]
pub struct MigrationTracker {
    state: MigrationState,
    history: Vec<MigrationState>,
}

impl MigrationTracker {
    /// Start tracking a migration
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: MigrationState::Start,
            history: vec![MigrationState::Start],
        }
    }

    /// Current state
    #[inline]
    #[must_use]
    pub fn state(&self) -> MigrationState {
        self.state
    }

    /// Every state visited, in order
    #[inline]
    #[must_use]
    pub fn history(&self) -> &[MigrationState] {
        &self.history
    }

    /// Move to `to`
    ///
    /// # Errors
    /// - `IllegalTransition` if `to` is not reachable from the current state
    pub fn advance(&mut self, to: MigrationState) -> Result<(), IllegalTransition> {
        validate_transition(self.state, to)?;
        tracing::trace!(from = ?self.state, to = ?to, "Migration transition");
        self.state = to;
        self.history.push(to);
        Ok(())
    }
}

impl Default for MigrationTracker {
    fn default() -> Self {
        Self::new()
    }
}
