//! Guarded route compiler.
//!
//! Turns a caller's route table into a tree of [`CompiledRoute`]s the host
//! router can mount. Each node is decided independently, in declaration
//! order, with its access class and roles inherited from its ancestors:
//!
//! ```text
//! redirectTo set            -> Redirect ("Redirect configured")
//! resolved path is "/"      -> element if authenticated, else the private fallback
//! private, anonymous        -> Redirect to private_redirect ("User not authenticated")
//! private, missing role     -> Blocked (unauthorized view)
//! public, authenticated     -> Redirect to public_redirect ("User already authenticated")
//! neutral / allowed         -> Render
//! unrecognized type         -> Empty
//! ```
//!
//! The whole tree is recomputed on every relevant change; nothing is
//! cached between passes.

use std::collections::BTreeSet;

use crate::config::{GuardViews, KeeperConfig};
use crate::redirect::{build_redirect, NavigateInstruction, RedirectSpec, GUARD_NAME};
use crate::route::{RouteElement, RouteNode, RouteType};

/// Reason recorded for redirects declared in the route table.
pub const REASON_CONFIGURED: &str = "Redirect configured";
/// Reason recorded when an anonymous user hits a private route.
pub const REASON_NOT_AUTHENTICATED: &str = "User not authenticated";
/// Reason recorded when an authenticated user hits a public route.
pub const REASON_ALREADY_AUTHENTICATED: &str = "User already authenticated";

/// Inputs that vary per compile pass.
#[derive(Debug, Clone, Copy)]
pub struct GuardInput<'a> {
    /// Whether the user is authenticated.
    pub authenticated: bool,
    /// Roles held by the user.
    pub user_roles: &'a BTreeSet<String>,
    /// Current location path.
    pub location: &'a str,
    /// Timing collection is on (tracking configured and testing mode set).
    pub tracking: bool,
}

/// A view ready to mount.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered<V> {
    /// The view.
    pub view: V,
    /// Suspense fallback when the view is lazily loaded.
    pub suspense: Option<V>,
    /// Resolved path to time, when this view is instrumented.
    pub track: Option<String>,
}

impl<V> Rendered<V> {
    fn plain(view: V) -> Self {
        Self {
            view,
            suspense: None,
            track: None,
        }
    }
}

/// What a compiled route does when matched.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteOutcome<V> {
    /// Mount a view.
    Render(Rendered<V>),
    /// Navigate elsewhere.
    Redirect(NavigateInstruction),
    /// Access denied; mount the unauthorized view.
    Blocked(Rendered<V>),
    /// Render nothing.
    Empty,
}

impl<V> RouteOutcome<V> {
    /// The redirect, if this outcome is one.
    pub fn as_redirect(&self) -> Option<&NavigateInstruction> {
        match self {
            RouteOutcome::Redirect(nav) => Some(nav),
            _ => None,
        }
    }

    /// The mounted view, for `Render` and `Blocked`.
    pub fn rendered(&self) -> Option<&Rendered<V>> {
        match self {
            RouteOutcome::Render(r) | RouteOutcome::Blocked(r) => Some(r),
            _ => None,
        }
    }
}

/// Shape of the host route element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteShape {
    /// Index route, no path.
    Index,
    /// Route wrapping compiled children.
    Parent,
    /// Route without children.
    Leaf,
}

/// One compiled route.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledRoute<V> {
    /// Stable key among siblings.
    pub key: String,
    /// The node's own path, `None` for index routes.
    pub path: Option<String>,
    /// Resolved absolute path.
    pub full_path: String,
    /// Host element shape.
    pub shape: RouteShape,
    /// Access class after inheritance.
    pub route_type: RouteType,
    /// Guard decision.
    pub outcome: RouteOutcome<V>,
    /// Compiled children.
    pub children: Vec<CompiledRoute<V>>,
}

/// A compiled route table plus the catch-all route.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledTree<V> {
    /// Compiled routes in declaration order.
    pub routes: Vec<CompiledRoute<V>>,
    /// View for locations no route matches.
    pub not_found: V,
}

impl<V> CompiledTree<V> {
    /// Depth-first search for the route resolved to `full_path`.
    pub fn find(&self, full_path: &str) -> Option<&CompiledRoute<V>> {
        fn search<'a, V>(
            routes: &'a [CompiledRoute<V>],
            full_path: &str,
        ) -> Option<&'a CompiledRoute<V>> {
            routes.iter().find_map(|r| {
                if r.full_path == full_path && r.shape != RouteShape::Index {
                    Some(r)
                } else {
                    search(&r.children, full_path)
                }
            })
        }
        search(&self.routes, full_path)
    }

    /// Number of compiled routes, excluding the catch-all.
    pub fn len(&self) -> usize {
        fn count<V>(routes: &[CompiledRoute<V>]) -> usize {
            routes.iter().map(|r| 1 + count(&r.children)).sum()
        }
        count(&self.routes)
    }

    /// Whether no routes were compiled.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Compiles route tables for one configuration and view set.
#[derive(Debug)]
pub struct RouteCompiler<'a, V> {
    config: &'a KeeperConfig,
    views: &'a GuardViews<V>,
    input: GuardInput<'a>,
}

impl<'a, V: Clone> RouteCompiler<'a, V> {
    /// Create a compiler for one pass.
    pub fn new(config: &'a KeeperConfig, views: &'a GuardViews<V>, input: GuardInput<'a>) -> Self {
        Self {
            config,
            views,
            input,
        }
    }

    /// Compile a whole table and append the catch-all route.
    pub fn compile(&self, routes: &[RouteNode<V>]) -> CompiledTree<V> {
        let compiled = self.compile_routes(routes, "", None, &BTreeSet::new());
        let tree = CompiledTree {
            routes: compiled,
            not_found: self.views.not_found.clone(),
        };
        tracing::debug!(
            routes = tree.len(),
            location = self.input.location,
            authenticated = self.input.authenticated,
            "route tree compiled"
        );
        tree
    }

    /// Compile one sibling group under `parent_path`.
    pub fn compile_routes(
        &self,
        routes: &[RouteNode<V>],
        parent_path: &str,
        inherited_type: Option<&RouteType>,
        parent_roles: &BTreeSet<String>,
    ) -> Vec<CompiledRoute<V>> {
        routes
            .iter()
            .map(|node| self.compile_node(node, parent_path, inherited_type, parent_roles))
            .collect()
    }

    fn compile_node(
        &self,
        node: &RouteNode<V>,
        parent_path: &str,
        inherited_type: Option<&RouteType>,
        parent_roles: &BTreeSet<String>,
    ) -> CompiledRoute<V> {
        let full_path = node.resolved_path(parent_path);
        let effective_roles = node.effective_roles(parent_roles);
        let route_type = node
            .route_type
            .clone()
            .or_else(|| inherited_type.cloned())
            .unwrap_or(RouteType::Public);

        let outcome = self.decide(node, &full_path, &route_type, &effective_roles);

        let children =
            self.compile_routes(&node.children, &full_path, Some(&route_type), &effective_roles);

        let (shape, path, key) = if node.index {
            (RouteShape::Index, None, format!("{full_path}index"))
        } else {
            let own = node.path.clone().unwrap_or_default();
            let shape = if children.is_empty() {
                RouteShape::Leaf
            } else {
                RouteShape::Parent
            };
            (shape, node.path.clone(), format!("{parent_path}{own}"))
        };

        CompiledRoute {
            key,
            path,
            full_path,
            shape,
            route_type,
            outcome,
            children,
        }
    }

    fn decide(
        &self,
        node: &RouteNode<V>,
        full_path: &str,
        route_type: &RouteType,
        effective_roles: &BTreeSet<String>,
    ) -> RouteOutcome<V> {
        if let Some(spec) = &node.redirect_to {
            return RouteOutcome::Redirect(self.redirect(spec, REASON_CONFIGURED));
        }

        let track = self.track_path(node, full_path);

        if full_path == "/" {
            let view = match (&node.element, self.input.authenticated) {
                (Some(element), true) => element.view().clone(),
                _ => self.views.private_fallback.clone(),
            };
            return RouteOutcome::Render(Rendered {
                view,
                suspense: None,
                track,
            });
        }

        let Some(element) = &node.element else {
            return RouteOutcome::Empty;
        };
        let rendered = Rendered {
            view: element.view().clone(),
            suspense: match element {
                RouteElement::Deferred { fallback, .. } => {
                    Some(fallback.clone().unwrap_or_else(|| self.views.loading.clone()))
                }
                RouteElement::Immediate(_) => None,
            },
            track: track.clone(),
        };

        match route_type {
            RouteType::Private if !self.input.authenticated => RouteOutcome::Redirect(
                self.redirect(
                    &RedirectSpec::new(self.config.safe_private_redirect()),
                    REASON_NOT_AUTHENTICATED,
                ),
            ),
            RouteType::Private if !self.has_role_access(effective_roles) => {
                let mut blocked = Rendered::plain(self.views.unauthorized.clone());
                blocked.track = track;
                RouteOutcome::Blocked(blocked)
            }
            RouteType::Private => RouteOutcome::Render(rendered),
            RouteType::Public if self.input.authenticated => RouteOutcome::Redirect(
                self.redirect(
                    &RedirectSpec::new(self.config.safe_public_redirect()),
                    REASON_ALREADY_AUTHENTICATED,
                ),
            ),
            RouteType::Public | RouteType::Neutral => RouteOutcome::Render(rendered),
            RouteType::Unrecognized(raw) => {
                tracing::debug!(path = full_path, route_type = %raw, "unrecognized route type renders nothing");
                RouteOutcome::Empty
            }
        }
    }

    fn redirect(&self, spec: &RedirectSpec, reason: &str) -> NavigateInstruction {
        // The host delivers the on_redirect notification when the redirect mounts.
        build_redirect(spec, GUARD_NAME, reason, self.input.location, None)
    }

    fn has_role_access(&self, effective_roles: &BTreeSet<String>) -> bool {
        effective_roles.is_empty() || !effective_roles.is_disjoint(self.input.user_roles)
    }

    fn track_path(&self, node: &RouteNode<V>, full_path: &str) -> Option<String> {
        let tracked = self.input.tracking && !node.index && self.input.location == full_path;
        tracked.then(|| full_path.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::redirect::STATE_REASON;

    fn views() -> GuardViews<&'static str> {
        GuardViews {
            loading: "loading",
            private_fallback: "landing",
            unauthorized: "unauthorized",
            not_found: "not-found",
        }
    }

    fn roles(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn compile_with(
        routes: &[RouteNode<&'static str>],
        authenticated: bool,
        user_roles: &BTreeSet<String>,
        location: &str,
        tracking: bool,
    ) -> CompiledTree<&'static str> {
        let config = KeeperConfig::default();
        let views = views();
        let input = GuardInput {
            authenticated,
            user_roles,
            location,
            tracking,
        };
        RouteCompiler::new(&config, &views, input).compile(routes)
    }

    fn compile(routes: &[RouteNode<&'static str>], authenticated: bool) -> CompiledTree<&'static str> {
        compile_with(routes, authenticated, &BTreeSet::new(), "/elsewhere", false)
    }

    #[test]
    fn test_private_redirects_anonymous() {
        let tree = compile(&[RouteNode::new("dashboard", "dash").private()], false);
        let nav = tree.routes[0].outcome.as_redirect().unwrap();

        assert_eq!(nav.to.pathname, "/login");
        assert_eq!(nav.state[STATE_REASON], REASON_NOT_AUTHENTICATED);
        assert_eq!(nav.from_path(), Some("/elsewhere"));
    }

    #[test]
    fn test_private_renders_authenticated() {
        let tree = compile(&[RouteNode::new("dashboard", "dash").private()], true);
        let rendered = tree.routes[0].outcome.rendered().unwrap();
        assert_eq!(rendered.view, "dash");
        assert!(matches!(tree.routes[0].outcome, RouteOutcome::Render(_)));
    }

    #[test]
    fn test_public_redirects_authenticated() {
        let tree = compile(&[RouteNode::new("signup", "signup").public()], true);
        let nav = tree.routes[0].outcome.as_redirect().unwrap();

        assert_eq!(nav.to.pathname, "/");
        assert_eq!(nav.reason(), Some(REASON_ALREADY_AUTHENTICATED));
    }

    #[test]
    fn test_untyped_defaults_to_public() {
        let tree = compile(&[RouteNode::new("about", "about")], true);
        assert_eq!(tree.routes[0].route_type, RouteType::Public);
        assert!(tree.routes[0].outcome.as_redirect().is_some());
    }

    #[test]
    fn test_neutral_always_renders() {
        for auth in [true, false] {
            let tree = compile(&[RouteNode::new("terms", "terms").neutral()], auth);
            assert_eq!(tree.routes[0].outcome.rendered().unwrap().view, "terms");
        }
    }

    #[test]
    fn test_role_denied_blocks() {
        let routes = [RouteNode::new("admin", "admin").private().with_roles(["admin"])];
        let tree = compile_with(&routes, true, &roles(&["user"]), "/x", false);

        match &tree.routes[0].outcome {
            RouteOutcome::Blocked(r) => assert_eq!(r.view, "unauthorized"),
            other => panic!("expected blocked, got {other:?}"),
        }
    }

    #[test]
    fn test_role_granted_renders() {
        let routes = [RouteNode::new("admin", "admin").private().with_roles(["admin", "ops"])];
        let tree = compile_with(&routes, true, &roles(&["ops"]), "/x", false);
        assert_eq!(tree.routes[0].outcome.rendered().unwrap().view, "admin");
    }

    #[test]
    fn test_roles_inherited_by_children() {
        let routes = [RouteNode::new("admin", "layout")
            .private()
            .with_roles(["admin"])
            .with_children(vec![
                RouteNode::new("users", "users"),
                RouteNode::new("help", "help")
                    .with_roles(["user"])
                    .exclude_parent_role(),
            ])];
        let tree = compile_with(&routes, true, &roles(&["user"]), "/x", false);
        let children = &tree.routes[0].children;

        assert!(matches!(children[0].outcome, RouteOutcome::Blocked(_)));
        assert_eq!(children[0].route_type, RouteType::Private);
        assert_eq!(children[1].outcome.rendered().unwrap().view, "help");
    }

    #[test]
    fn test_root_ignores_type() {
        let routes = [RouteNode::new("/", "home").public()];

        let anon = compile(&routes, false);
        assert_eq!(anon.routes[0].outcome.rendered().unwrap().view, "landing");

        let authed = compile(&routes, true);
        assert_eq!(authed.routes[0].outcome.rendered().unwrap().view, "home");
    }

    #[test]
    fn test_configured_redirect_wins() {
        let routes = [RouteNode::<&str>::redirect("old", "/new").private()];
        let tree = compile(&routes, false);
        let nav = tree.routes[0].outcome.as_redirect().unwrap();

        assert_eq!(nav.to.pathname, "/new");
        assert_eq!(nav.reason(), Some(REASON_CONFIGURED));
    }

    #[test]
    fn test_unrecognized_type_renders_nothing() {
        let tree = compile(&[RouteNode::new("x", "x").with_type("vip")], true);
        assert_eq!(tree.routes[0].outcome, RouteOutcome::Empty);
    }

    #[test]
    fn test_lazy_wrapped_in_suspense() {
        let routes = [
            RouteNode::lazy("reports", "reports").neutral(),
            RouteNode::new("slow", "slow").with_fallback("skeleton").neutral(),
        ];
        let tree = compile(&routes, false);

        let reports = tree.routes[0].outcome.rendered().unwrap();
        assert_eq!(reports.suspense, Some("loading"));
        let slow = tree.routes[1].outcome.rendered().unwrap();
        assert_eq!(slow.suspense, Some("skeleton"));
    }

    #[test]
    fn test_shapes_and_keys() {
        let routes = [
            RouteNode::new("dashboard", "layout").neutral().with_children(vec![
                RouteNode::index("overview"),
                RouteNode::new("settings", "settings"),
            ]),
            RouteNode::new("about", "about").neutral(),
        ];
        let tree = compile(&routes, true);

        let dashboard = &tree.routes[0];
        assert_eq!(dashboard.shape, RouteShape::Parent);
        assert_eq!(dashboard.key, "dashboard");
        assert_eq!(dashboard.children[0].shape, RouteShape::Index);
        assert_eq!(dashboard.children[0].path, None);
        assert_eq!(dashboard.children[0].key, "/dashboardindex");
        assert_eq!(dashboard.children[0].full_path, "/dashboard");
        assert_eq!(dashboard.children[1].key, "/dashboardsettings");
        assert_eq!(dashboard.children[1].full_path, "/dashboard/settings");
        assert_eq!(tree.routes[1].shape, RouteShape::Leaf);
        assert_eq!(tree.not_found, "not-found");
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn test_type_inherited_through_levels() {
        let routes = [RouteNode::new("app", "layout").private().with_children(vec![
            RouteNode::new("billing", "billing").with_children(vec![RouteNode::new("invoices", "inv")]),
        ])];
        let tree = compile(&routes, false);
        let invoices = &tree.routes[0].children[0].children[0];

        assert_eq!(invoices.full_path, "/app/billing/invoices");
        assert_eq!(invoices.route_type, RouteType::Private);
        assert!(invoices.outcome.as_redirect().is_some());
    }

    #[test]
    fn test_tracking_only_current_location() {
        let routes = [
            RouteNode::new("a", "a").neutral(),
            RouteNode::new("b", "b").neutral(),
        ];
        let tree = compile_with(&routes, false, &BTreeSet::new(), "/b", true);

        assert_eq!(tree.routes[0].outcome.rendered().unwrap().track, None);
        assert_eq!(
            tree.routes[1].outcome.rendered().unwrap().track.as_deref(),
            Some("/b")
        );
    }

    #[test]
    fn test_tracking_disabled() {
        let routes = [RouteNode::new("b", "b").neutral()];
        let tree = compile_with(&routes, false, &BTreeSet::new(), "/b", false);
        assert_eq!(tree.routes[0].outcome.rendered().unwrap().track, None);
    }

    #[test]
    fn test_index_not_tracked() {
        let routes = [RouteNode::new("a", "a").neutral().with_children(vec![RouteNode::index("i")])];
        let tree = compile_with(&routes, false, &BTreeSet::new(), "/a", true);

        assert!(tree.routes[0].outcome.rendered().unwrap().track.is_some());
        assert!(tree.routes[0].children[0].outcome.rendered().unwrap().track.is_none());
    }

    #[test]
    fn test_find_by_full_path() {
        let routes = [RouteNode::new("a", "a").neutral().with_children(vec![
            RouteNode::index("i"),
            RouteNode::new("b", "b"),
        ])];
        let tree = compile(&routes, false);

        assert_eq!(tree.find("/a").unwrap().key, "a");
        assert_eq!(tree.find("/a/b").unwrap().key, "/ab");
        assert!(tree.find("/nope").is_none());
    }

    #[test]
    fn test_blank_private_redirect_falls_back() {
        let config = KeeperConfig::default().with_private_redirect("");
        let views = views();
        let empty = BTreeSet::new();
        let input = GuardInput {
            authenticated: false,
            user_roles: &empty,
            location: "/vault",
            tracking: false,
        };
        let routes = [RouteNode::new("vault", "vault").private()];
        let tree = RouteCompiler::new(&config, &views, input).compile(&routes);

        assert_eq!(tree.routes[0].outcome.as_redirect().unwrap().to.pathname, "/login");
    }
}
