//! Scoped project locking
//!
//! [`ProjectLock`] holds the exclusive project lock for the lifetime of the
//! guard. The unlock happens in `Drop`, so every exit path releases it.

use crate::error::{RemoteError, StepError};
use crate::remote::Project;

/// Guard for the exclusive project lock
#[must_use = "the project is unlocked as soon as the guard is dropped"]
pub struct ProjectLock<'a> {
    project: &'a dyn Project,
}

impl<'a> ProjectLock<'a> {
    /// Lock `project`
    ///
    /// The guard exists before the lock call, so a failed lock is still
    /// followed by exactly one unlock. The server treats unlocking an unheld
    /// lock as a no-op.
    ///
    /// # Errors
    /// - `RemoteError::Lock` if the lock is held elsewhere
    pub fn acquire(project: &'a dyn Project) -> Result<Self, RemoteError> {
        let guard = Self { project };
        project.lock()?;
        Ok(guard)
    }

    /// The locked project
    #[inline]
    #[must_use]
    pub fn project(&self) -> &'a dyn Project {
        self.project
    }
}

impl Drop for ProjectLock<'_> {
    fn drop(&mut self) {
        tracing::debug!("Unlocking project");
        self.project.unlock();
    }
}

impl std::fmt::Debug for ProjectLock<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectLock")
            .field("project", &self.project.name())
            .finish()
    }
}

/// Set `server_name` as active web server for `scope_name` under the project lock
///
/// # Errors
/// - `StepError::Reassign` if locking, mutating or saving fails
pub fn set_active_web_server(
    project: &dyn Project,
    scope_name: &str,
    server_name: &str,
) -> Result<(), StepError> {
    tracing::debug!(server = server_name, scope = scope_name, "Try setting active web server");

    let assign = || -> Result<(), RemoteError> {
        let lock = ProjectLock::acquire(project)?;
        lock.project().set_active_web_server(scope_name, server_name)?;
        lock.project().save()
    };

    assign().map_err(|source| {
        tracing::error!(error = %source, "Cannot lock and save project!");
        StepError::Reassign {
            scope: scope_name.to_string(),
            server: server_name.to_string(),
            source,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    #[derive(Default)]
    struct CountingProject {
        lock_error: Option<RemoteError>,
        save_error: Option<RemoteError>,
        locks: Mutex<u32>,
        unlocks: Mutex<u32>,
        servers: Mutex<HashMap<String, String>>,
    }

    impl Project for CountingProject {
        fn id(&self) -> u64 {
            1
        }

        fn name(&self) -> String {
            "counting".to_string()
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
            *self.locks.lock() += 1;
            self.lock_error.clone().map_or(Ok(()), Err)
        }

        fn unlock(&self) {
            *self.unlocks.lock() += 1;
        }

        fn save(&self) -> Result<(), RemoteError> {
            self.save_error.clone().map_or(Ok(()), Err)
        }
    }

    #[test]
    fn unlocks_after_success() {
        let project = CountingProject::default();
        set_active_web_server(&project, "WEBEDIT", "JettyA").unwrap();

        assert_eq!(*project.locks.lock(), 1);
        assert_eq!(*project.unlocks.lock(), 1);
        assert_eq!(project.active_web_server("WEBEDIT").as_deref(), Some("JettyA"));
    }

    #[test]
    fn unlocks_after_save_failure() {
        let project = CountingProject {
            save_error: Some(RemoteError::Persistence("disk full".into())),
            ..Default::default()
        };
        let err = set_active_web_server(&project, "WEBEDIT", "JettyA").unwrap_err();

        assert!(matches!(err, StepError::Reassign { ref server, .. } if server == "JettyA"));
        assert_eq!(*project.unlocks.lock(), 1);
    }

    #[test]
    fn unlocks_after_lock_failure() {
        let project = CountingProject {
            lock_error: Some(RemoteError::Lock("held by editor".into())),
            ..Default::default()
        };
        let err = set_active_web_server(&project, "PREVIEW", "JettyB").unwrap_err();

        assert!(matches!(
            err,
            StepError::Reassign {
                source: RemoteError::Lock(_),
                ..
            }
        ));
        assert_eq!(*project.unlocks.lock(), 1);
        assert_eq!(project.active_web_server("PREVIEW"), None);
    }
}
