//! Remote administration API
//!
//! The activator never talks to the server directly. Everything it needs is
//! behind these three traits, implemented by the connection layer of the
//! embedding application (and by the in-memory server used in tests).

use crate::error::RemoteError;
use crate::scope::WebAppId;
use std::sync::Arc;

/// Connection to the content-management server
pub trait Connection: Send + Sync {
    /// Open the connection
    fn connect(&self) -> Result<(), RemoteError>;

    /// Close the connection
    fn disconnect(&self);

    /// Whether the connection is currently open
    fn is_connected(&self) -> bool;

    /// All projects visible to the connected user
    fn projects(&self) -> Vec<Arc<dyn Project>>;

    /// Look up a project by its name
    fn project_by_name(&self, name: &str) -> Option<Arc<dyn Project>>;

    /// Agent used to deploy and undeploy web apps
    fn module_admin_agent(&self) -> Arc<dyn ModuleAdminAgent>;
}

/// Handle to one remote project
///
/// Mutations require [`Project::lock`] and become visible to others only
/// after [`Project::save`].
pub trait Project: Send + Sync {
    /// Numeric project id
    fn id(&self) -> u64;

    /// Project name
    fn name(&self) -> String;

    /// Active web server for a scope name, `None` when unset
    fn active_web_server(&self, scope_name: &str) -> Option<String>;

    /// Assign the active web server for a scope name
    fn set_active_web_server(&self, scope_name: &str, server_name: &str)
        -> Result<(), RemoteError>;

    /// Acquire the exclusive project lock
    fn lock(&self) -> Result<(), RemoteError>;

    /// Release the project lock
    fn unlock(&self);

    /// Persist pending changes
    fn save(&self) -> Result<(), RemoteError>;
}

/// Web app deployment agent
pub trait ModuleAdminAgent: Send + Sync {
    /// Deploy a web app to its scope's active web server
    fn deploy_web_app(&self, web_app: &WebAppId) -> Result<bool, RemoteError>;

    /// Undeploy a web app from its scope's active web server
    fn undeploy_web_app(&self, web_app: &WebAppId) -> Result<bool, RemoteError>;
}
