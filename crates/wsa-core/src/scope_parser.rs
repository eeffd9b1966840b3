//! Scope list parsing
//!
//! Accepts comma-separated values such as `WEBEDIT, preview, global(fs5root)`.
//! Project-local kinds are matched case-insensitively; global web apps are
//! written as `global(<WebAppName>)`.

use crate::error::ActivationError;
use crate::scope::{Scope, WebScope, GLOBAL_SCOPE_NAME};

const GLOBAL_PREFIX: &str = "global(";

/// Parse a comma-separated scope list, keeping order and duplicates
///
/// # Errors
/// - `ActivationError::InvalidArgument` for empty input, empty entries,
///   unknown kinds or a global entry without a web app name
pub fn parse_scopes(input: &str) -> Result<Vec<Scope>, ActivationError> {
    if input.trim().is_empty() {
        return Err(ActivationError::InvalidArgument(
            "Missing parameter for web app scopes".to_string(),
        ));
    }
    input.split(',').map(parse_scope).collect()
}

/// Parse a single scope entry
///
/// # Errors
/// - `ActivationError::InvalidArgument` if the entry is not a known scope
pub fn parse_scope(entry: &str) -> Result<Scope, ActivationError> {
    let entry = entry.trim();
    if entry.is_empty() {
        return Err(ActivationError::InvalidArgument(
            "empty entry in web app scopes".to_string(),
        ));
    }

    if let Some(web_app) = strip_global(entry) {
        let web_app = web_app.trim();
        if web_app.is_empty() {
            return Err(ActivationError::InvalidArgument(format!(
                "global web app name missing in '{entry}'"
            )));
        }
        return Ok(Scope::global(web_app));
    }

    if entry.eq_ignore_ascii_case(GLOBAL_SCOPE_NAME) {
        return Err(ActivationError::InvalidArgument(format!(
            "'{entry}' needs a web app name, use global(<WebAppName>)"
        )));
    }

    entry
        .parse::<WebScope>()
        .map(Scope::Project)
        .map_err(ActivationError::InvalidArgument)
}

fn strip_global(entry: &str) -> Option<&str> {
    let head = entry.get(..GLOBAL_PREFIX.len())?;
    if !head.eq_ignore_ascii_case(GLOBAL_PREFIX) {
        return None;
    }
    entry[GLOBAL_PREFIX.len()..].strip_suffix(')')
}
