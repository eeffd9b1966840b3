//! Web application scopes
//!
//! A [`Scope`] names one web application binding of a project. Global scopes
//! carry the name of a server-wide web app; project-local scopes are one of
//! the fixed [`WebScope`] kinds. Both resolve to a deployable [`WebAppId`].

use crate::remote::Project;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Scope name used for every global web app
pub const GLOBAL_SCOPE_NAME: &str = "GLOBAL";

/// Project-local web app kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WebScope {
    /// Preview web app
    Preview,
    /// Staging web app
    Staging,
    /// Edit-mode web app
    WebEdit,
}

impl WebScope {
    /// All project-local kinds
    pub const ALL: [WebScope; 3] = [WebScope::Preview, WebScope::Staging, WebScope::WebEdit];

    /// Key into the project's active web server map
    #[inline]
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            WebScope::Preview => "PREVIEW",
            WebScope::Staging => "STAGING",
            WebScope::WebEdit => "WEBEDIT",
        }
    }
}

impl fmt::Display for WebScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WebScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WebScope::ALL
            .into_iter()
            .find(|scope| scope.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown web scope '{}'", s.trim()))
    }
}

/// One web application binding
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Server-wide web app, identified by its name
    Global(String),
    /// Web app belonging to a single project
    Project(WebScope),
}

impl Scope {
    /// Create a global scope
    #[inline]
    #[must_use]
    pub fn global(web_app: impl Into<String>) -> Self {
        Self::Global(web_app.into())
    }

    /// Check if this is a global scope
    #[inline]
    #[must_use]
    pub fn is_global(&self) -> bool {
        matches!(self, Self::Global(_))
    }

    /// Key into the project's active web server map
    #[inline]
    #[must_use]
    pub fn scope_name(&self) -> &'static str {
        match self {
            Self::Global(_) => GLOBAL_SCOPE_NAME,
            Self::Project(scope) => scope.name(),
        }
    }

    /// Resolve the deployable web app id for `project`
    #[must_use]
    pub fn web_app_id(&self, project: &dyn Project) -> WebAppId {
        match self {
            Self::Global(web_app) => WebAppId::Global {
                web_app: web_app.clone(),
            },
            Self::Project(scope) => WebAppId::Project {
                project_id: project.id(),
                scope: *scope,
            },
        }
    }
}

impl From<WebScope> for Scope {
    fn from(scope: WebScope) -> Self {
        Self::Project(scope)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global(web_app) => write!(f, "global({web_app})"),
            Self::Project(scope) => write!(f, "{scope}"),
        }
    }
}

/// Deployable web app identity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WebAppId {
    /// Global web app
    Global {
        /// Web app name
        web_app: String,
    },
    /// Project-local web app
    Project {
        /// Owning project
        project_id: u64,
        /// Web app kind
        scope: WebScope,
    },
}

impl fmt::Display for WebAppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global { web_app } => write!(f, "global({web_app})"),
            Self::Project { project_id, scope } => write!(f, "{scope}@project-{project_id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn web_scope_parses_case_insensitive() {
        assert_eq!("webedit".parse::<WebScope>(), Ok(WebScope::WebEdit));
        assert_eq!(" Preview ".parse::<WebScope>(), Ok(WebScope::Preview));
        assert!("LIVE".parse::<WebScope>().is_err());
    }

    #[test]
    fn scope_names() {
        assert_eq!(Scope::global("fs5root").scope_name(), "GLOBAL");
        assert_eq!(Scope::from(WebScope::Staging).scope_name(), "STAGING");
    }

    #[test]
    fn scope_identity_includes_web_app_for_global() {
        assert_eq!(Scope::global("a"), Scope::global("a"));
        assert_ne!(Scope::global("a"), Scope::global("b"));
        assert_eq!(Scope::Project(WebScope::WebEdit), WebScope::WebEdit.into());
    }

    #[test]
    fn display() {
        assert_eq!(Scope::global("fs5root").to_string(), "global(fs5root)");
        assert_eq!(Scope::Project(WebScope::WebEdit).to_string(), "WEBEDIT");
        let id = WebAppId::Project {
            project_id: 42,
            scope: WebScope::Preview,
        };
        assert_eq!(id.to_string(), "PREVIEW@project-42");
    }
}
