//! Route table types.
//!
//! A route table is an ordered list of [`RouteNode`]s. Nodes are generic
//! over the host's view type `V`, so the same table can be compiled for any
//! UI framework that can clone a renderable.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::path::resolve_path;
use crate::redirect::RedirectSpec;

/// Access class of a route.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RouteType {
    /// Only authenticated users may enter.
    Private,
    /// Only anonymous users may enter (login, signup).
    Public,
    /// Everyone may enter.
    Neutral,
    /// A value outside the three known classes, kept so it can be reported.
    Unrecognized(String),
}

impl RouteType {
    /// Get the route type as a string.
    pub fn as_str(&self) -> &str {
        match self {
            RouteType::Private => "private",
            RouteType::Public => "public",
            RouteType::Neutral => "neutral",
            RouteType::Unrecognized(raw) => raw,
        }
    }

    /// Whether this is one of `private`, `public` or `neutral`.
    pub fn is_known(&self) -> bool {
        !matches!(self, RouteType::Unrecognized(_))
    }
}

impl From<&str> for RouteType {
    fn from(s: &str) -> Self {
        match s {
            "private" => RouteType::Private,
            "public" => RouteType::Public,
            "neutral" => RouteType::Neutral,
            other => RouteType::Unrecognized(other.to_string()),
        }
    }
}

impl From<String> for RouteType {
    fn from(s: String) -> Self {
        RouteType::from(s.as_str())
    }
}

impl From<RouteType> for String {
    fn from(t: RouteType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for RouteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a route renders.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteElement<V> {
    /// Rendered directly.
    Immediate(V),
    /// Loaded asynchronously; rendered inside a suspense boundary showing
    /// `fallback` (or the global loading view) until it resolves.
    Deferred {
        /// The lazily loaded view.
        view: V,
        /// Per-route loading view.
        fallback: Option<V>,
    },
}

impl<V> RouteElement<V> {
    /// The view to render once loaded.
    pub fn view(&self) -> &V {
        match self {
            RouteElement::Immediate(view) | RouteElement::Deferred { view, .. } => view,
        }
    }

    /// Whether the element needs a suspense boundary.
    pub fn is_deferred(&self) -> bool {
        matches!(self, RouteElement::Deferred { .. })
    }
}

/// One entry of a route table.
///
/// Fields are public so tables can be built from untyped input and then
/// validated; the builder methods cover the common shapes.
///
/// # Example
///
/// ```rust
/// use keeper_core::RouteNode;
///
/// let routes = vec![
///     RouteNode::new("/", "home"),
///     RouteNode::new("login", "login").public(),
///     RouteNode::new("dashboard", "dashboard")
///         .private()
///         .with_roles(["admin"])
///         .with_children(vec![RouteNode::index("overview")]),
///     RouteNode::redirect("old-dashboard", "/dashboard"),
/// ];
/// assert_eq!(routes.len(), 4);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RouteNode<V> {
    /// Own path segment(s), relative or absolute.
    pub path: Option<String>,
    /// Index route of its parent.
    pub index: bool,
    /// What to render.
    pub element: Option<RouteElement<V>>,
    /// Access class; inherited from the parent when absent.
    pub route_type: Option<RouteType>,
    /// Roles allowed to enter; empty means no role restriction.
    pub roles: BTreeSet<String>,
    /// Ignore roles inherited from ancestors.
    pub exclude_parent_role: bool,
    /// Redirect instead of rendering.
    pub redirect_to: Option<RedirectSpec>,
    /// Nested routes.
    pub children: Vec<RouteNode<V>>,
}

impl<V> Default for RouteNode<V> {
    fn default() -> Self {
        Self {
            path: None,
            index: false,
            element: None,
            route_type: None,
            roles: BTreeSet::new(),
            exclude_parent_role: false,
            redirect_to: None,
            children: Vec::new(),
        }
    }
}

impl<V> RouteNode<V> {
    /// A route rendering `view` at `path`.
    pub fn new(path: impl Into<String>, view: V) -> Self {
        Self {
            path: Some(path.into()),
            element: Some(RouteElement::Immediate(view)),
            ..Default::default()
        }
    }

    /// A lazily loaded route at `path`.
    pub fn lazy(path: impl Into<String>, view: V) -> Self {
        Self {
            path: Some(path.into()),
            element: Some(RouteElement::Deferred {
                view,
                fallback: None,
            }),
            ..Default::default()
        }
    }

    /// An index route rendering `view`.
    pub fn index(view: V) -> Self {
        Self {
            index: true,
            element: Some(RouteElement::Immediate(view)),
            ..Default::default()
        }
    }

    /// A pathless layout route.
    pub fn layout(view: V, children: Vec<RouteNode<V>>) -> Self {
        Self {
            element: Some(RouteElement::Immediate(view)),
            children,
            ..Default::default()
        }
    }

    /// A route at `path` that redirects to `pathname`.
    pub fn redirect(path: impl Into<String>, pathname: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            redirect_to: Some(RedirectSpec::new(pathname)),
            ..Default::default()
        }
    }

    /// A route at `path` that redirects according to `spec`.
    pub fn redirect_with(path: impl Into<String>, spec: RedirectSpec) -> Self {
        Self {
            path: Some(path.into()),
            redirect_to: Some(spec),
            ..Default::default()
        }
    }

    /// Set the access class.
    pub fn with_type(mut self, route_type: impl Into<RouteType>) -> Self {
        self.route_type = Some(route_type.into());
        self
    }

    /// Mark as private.
    pub fn private(self) -> Self {
        self.with_type(RouteType::Private)
    }

    /// Mark as public.
    pub fn public(self) -> Self {
        self.with_type(RouteType::Public)
    }

    /// Mark as neutral.
    pub fn neutral(self) -> Self {
        self.with_type(RouteType::Neutral)
    }

    /// Restrict to users holding any of `roles`.
    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    /// Ignore roles inherited from ancestors.
    pub fn exclude_parent_role(mut self) -> Self {
        self.exclude_parent_role = true;
        self
    }

    /// Set nested routes.
    pub fn with_children(mut self, children: Vec<RouteNode<V>>) -> Self {
        self.children = children;
        self
    }

    /// Set the loading view of a deferred element.
    ///
    /// An immediate element becomes deferred.
    pub fn with_fallback(mut self, fallback: V) -> Self {
        self.element = match self.element.take() {
            Some(RouteElement::Immediate(view)) | Some(RouteElement::Deferred { view, .. }) => {
                Some(RouteElement::Deferred {
                    view,
                    fallback: Some(fallback),
                })
            }
            None => None,
        };
        self
    }

    /// Resolved path of this node under `parent`.
    pub fn resolved_path(&self, parent: &str) -> String {
        resolve_path(self.path.as_deref(), self.index, parent)
    }

    /// Roles that apply to this node given the roles of its ancestors.
    pub fn effective_roles(&self, parent_roles: &BTreeSet<String>) -> BTreeSet<String> {
        if self.exclude_parent_role {
            return self.roles.clone();
        }
        parent_roles.union(&self.roles).cloned().collect()
    }
}

/// Whether any node in the table declares roles.
pub fn routes_use_roles<V>(routes: &[RouteNode<V>]) -> bool {
    routes
        .iter()
        .any(|r| !r.roles.is_empty() || routes_use_roles(&r.children))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roles(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_route_type_from_str() {
        assert_eq!(RouteType::from("private"), RouteType::Private);
        assert_eq!(RouteType::from("public"), RouteType::Public);
        assert_eq!(RouteType::from("neutral"), RouteType::Neutral);
        assert_eq!(
            RouteType::from("secret"),
            RouteType::Unrecognized("secret".into())
        );
        assert!(!RouteType::from("Private").is_known());
    }

    #[test]
    fn test_route_type_serde() {
        let t: RouteType = serde_json::from_str("\"admin-only\"").unwrap();
        assert_eq!(t.as_str(), "admin-only");
        assert_eq!(serde_json::to_string(&RouteType::Private).unwrap(), "\"private\"");
    }

    #[test]
    fn test_effective_roles_inherit() {
        let node = RouteNode::new("reports", ()).with_roles(["analyst"]);
        let effective = node.effective_roles(&roles(&["admin"]));
        assert_eq!(effective, roles(&["admin", "analyst"]));
    }

    #[test]
    fn test_effective_roles_exclude_parent() {
        let node = RouteNode::new("reports", ())
            .with_roles(["analyst"])
            .exclude_parent_role();
        assert_eq!(node.effective_roles(&roles(&["admin"])), roles(&["analyst"]));
    }

    #[test]
    fn test_with_fallback_makes_deferred() {
        let node = RouteNode::new("slow", "page").with_fallback("spinner");
        assert_eq!(
            node.element,
            Some(RouteElement::Deferred {
                view: "page",
                fallback: Some("spinner"),
            })
        );
    }

    #[test]
    fn test_routes_use_roles_nested() {
        let flat = vec![RouteNode::new("a", ()), RouteNode::new("b", ())];
        assert!(!routes_use_roles(&flat));

        let nested = vec![RouteNode::new("a", ())
            .with_children(vec![RouteNode::new("b", ()).with_roles(["admin"])])];
        assert!(routes_use_roles(&nested));
    }

    #[test]
    fn test_redirect_builder() {
        let node: RouteNode<()> = RouteNode::redirect("old", "/new");
        assert!(node.element.is_none());
        assert_eq!(node.redirect_to.unwrap().pathname, "/new");
    }
}
