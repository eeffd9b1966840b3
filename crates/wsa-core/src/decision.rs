//! Activation decision
//!
//! Decides per scope whether the active web server has to change. Pure: no
//! remote calls, no logging, total over every input combination.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a scope is left untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Target server is already the active one
    AlreadyActive,
    /// Another server is active and force activation is off
    ForceRequired,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::AlreadyActive => f.write_str("target server is already active"),
            SkipReason::ForceRequired => {
                f.write_str("another server is active; force activation required to overwrite")
            }
        }
    }
}

/// Result of [`should_activate_web_server`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationDecision {
    /// Migrate the scope to the target server
    Activate,
    /// Leave the scope alone
    Skip(SkipReason),
}

impl ActivationDecision {
    /// Whether the scope has to be migrated
    #[inline]
    #[must_use]
    pub fn should_activate(self) -> bool {
        matches!(self, Self::Activate)
    }
}

/// Decide whether `target` has to become the active web server
///
/// An empty `current` counts as unset.
#[must_use]
pub fn should_activate_web_server(
    current: Option<&str>,
    target: &str,
    force_activation: bool,
) -> ActivationDecision {
    match current {
        None | Some("") => ActivationDecision::Activate,
        Some(active) if active == target => ActivationDecision::Skip(SkipReason::AlreadyActive),
        Some(_) if !force_activation => ActivationDecision::Skip(SkipReason::ForceRequired),
        Some(_) => ActivationDecision::Activate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn unset_activates() {
        assert_eq!(should_activate_web_server(None, "JettyA", false), ActivationDecision::Activate);
        assert_eq!(should_activate_web_server(Some(""), "JettyA", false), ActivationDecision::Activate);
    }

    #[test]
    fn same_server_skips_even_with_force() {
        assert_eq!(
            should_activate_web_server(Some("JettyA"), "JettyA", true),
            ActivationDecision::Skip(SkipReason::AlreadyActive)
        );
    }

    #[test]
    fn differing_server_needs_force() {
        assert_eq!(
            should_activate_web_server(Some("JettyA"), "JettyB", false),
            ActivationDecision::Skip(SkipReason::ForceRequired)
        );
        assert!(should_activate_web_server(Some("JettyA"), "JettyB", true).should_activate());
    }

    proptest! {
        #[test]
        fn prop_unset_always_activates(target in "[A-Za-z]{1,12}", force in any::<bool>()) {
            prop_assert!(should_activate_web_server(None, &target, force).should_activate());
        }

        #[test]
        fn prop_equal_never_activates(server in "[A-Za-z]{1,12}", force in any::<bool>()) {
            prop_assert!(!should_activate_web_server(Some(&server), &server, force).should_activate());
        }

        #[test]
        fn prop_differing_follows_force(
            current in "[a-m]{1,8}",
            target in "[n-z]{1,8}",
            force in any::<bool>(),
        ) {
            prop_assert_eq!(
                should_activate_web_server(Some(&current), &target, force).should_activate(),
                force
            );
        }
    }
}
