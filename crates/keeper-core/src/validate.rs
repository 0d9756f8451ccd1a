//! Route table validation.
//!
//! Validation never blocks rendering. Issues are plain strings collected
//! per pass; how loudly they are surfaced depends on the [`WarningPolicy`].

use std::collections::HashSet;

use crate::error::KeeperError;
use crate::route::RouteNode;

/// How configuration issues are surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningPolicy {
    /// Production builds: collect only.
    Silent,
    /// Log each issue as a warning.
    Lenient,
    /// Log each issue and fail on the first one.
    Strict,
}

impl WarningPolicy {
    /// Policy for a build context.
    ///
    /// Development builds are strict unless the caller disabled the error
    /// boundary, in which case issues are only logged.
    pub fn for_build(dev_build: bool, disable_error_boundary: bool) -> Self {
        match (dev_build, disable_error_boundary) {
            (false, _) => WarningPolicy::Silent,
            (true, true) => WarningPolicy::Lenient,
            (true, false) => WarningPolicy::Strict,
        }
    }
}

/// Check one route's own fields.
pub fn validate_node<V>(node: &RouteNode<V>) -> Vec<String> {
    let mut issues = Vec::new();
    let path = node.path.as_deref();
    let shown = path.unwrap_or("");
    let redirect_pathname = node.redirect_to.as_ref().map(|r| r.pathname.as_str());

    if node.element.is_some() && node.redirect_to.is_some() {
        issues.push(format!(
            "Route at path=\"{shown}\" cannot have both \"element\" and \"redirectTo\"."
        ));
    }

    if node.element.is_none() && node.redirect_to.is_none() {
        issues.push(format!(
            "Route at path=\"{shown}\" must provide at least an \"element\" or \"redirectTo\"."
        ));
    }

    if node.index && path.is_some() {
        issues.push("Index route must not define a \"path\".".to_string());
    }

    if let Some(route_type) = node.route_type.as_ref().filter(|t| !t.is_known()) {
        issues.push(format!(
            "Invalid route type \"{route_type}\" at path=\"{shown}\". Expected \"private\", \"public\", or \"neutral\"."
        ));
    }

    if node.redirect_to.is_some() && !node.children.is_empty() {
        issues.push(format!("Redirect route \"{shown}\" should not have children."));
    }

    if redirect_pathname.is_some_and(|p| p.trim().is_empty()) {
        issues.push("redirectTo.pathname cannot be empty.".to_string());
    }

    if path == Some("/") && node.route_type.as_ref().is_some_and(|t| t.is_known()) {
        issues.push(
            "Root \"/\" does not need a type. It is handled differently. Please refer docs"
                .to_string(),
        );
    }

    if let (Some(path), Some(target)) = (path, redirect_pathname) {
        if !path.is_empty() && path == target {
            issues.push("redirectTo and path can't have the same route.".to_string());
        }
    }

    let has_target =
        node.element.is_some() || redirect_pathname.is_some_and(|p| !p.is_empty());
    if path == Some("") && has_target {
        issues.push(
            "A route with an element or redirect must define a valid \"path\".".to_string(),
        );
    }

    issues
}

/// Check a whole route table.
///
/// Each sibling group may hold one index route and no repeated paths.
/// Children are checked under their parent's resolved path, which is also
/// the `parentKey` named in duplicate reports.
pub fn validate_tree<V>(routes: &[RouteNode<V>]) -> Vec<String> {
    let mut issues = Vec::new();
    walk(routes, "", &mut issues);
    issues
}

fn walk<V>(routes: &[RouteNode<V>], parent_key: &str, issues: &mut Vec<String>) {
    let mut used_paths = HashSet::new();
    let mut index_used = false;

    for route in routes {
        if route.index {
            if index_used {
                issues.push(format!(
                    "Duplicate index route at parentKey=\"{parent_key}\"."
                ));
            }
            index_used = true;
        }

        if let Some(path) = route.path.as_deref().filter(|p| !p.is_empty()) {
            if !used_paths.insert(path) {
                issues.push(format!(
                    "Duplicate path \"{path}\" at parentKey=\"{parent_key}\"."
                ));
            }
        }

        issues.extend(validate_node(route));

        if !route.children.is_empty() {
            walk(&route.children, &route.resolved_path(parent_key), issues);
        }
    }
}

/// Surface issues according to `policy`.
///
/// In strict mode the first issue is returned as an error after all of
/// them have been logged.
pub fn report_issues(issues: &[String], policy: WarningPolicy) -> Result<(), KeeperError> {
    if policy == WarningPolicy::Silent {
        return Ok(());
    }

    for issue in issues {
        tracing::warn!(target: "routekeeper::validate", "[Route Validation] {issue}");
    }

    match (policy, issues.first()) {
        (WarningPolicy::Strict, Some(first)) => {
            Err(KeeperError::Configuration(format!("[Route Validation] {first}")))
        }
        _ => Ok(()),
    }
}

/// Validate one node and surface its issues according to `policy`.
pub fn validate_node_with_policy<V>(
    node: &RouteNode<V>,
    policy: WarningPolicy,
) -> Result<Vec<String>, KeeperError> {
    let issues = validate_node(node);
    report_issues(&issues, policy)?;
    Ok(issues)
}
