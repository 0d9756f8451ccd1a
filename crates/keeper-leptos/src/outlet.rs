//! Location matching and nested rendering of compiled routes.
//!
//! The compiled tree changes shape with auth state, so it cannot be
//! expressed as the static route tuples `leptos_router` expects. Instead the
//! current location is matched here and the chain of matched routes is
//! rendered level by level: each parent renders its view, and the
//! [`KeeperOutlet`] inside that view renders the next level.

use std::sync::Arc;

use keeper_core::{
    resolve_path, CompiledRoute, CompiledTree, KeeperHooks, NavigateInstruction, RelativeTo,
    Rendered, RouteOutcome, RouteShape, TimingMode,
};
use leptos::prelude::*;
use leptos_router::hooks::{use_location, use_navigate};
use leptos_router::NavigateOptions;

use crate::boundary::TimingBoundary;
use crate::handle::{use_route_keeper, KeeperHandle};

/// Find the routes `location` renders, outermost first.
///
/// Every sibling is tried; when several match, the most specific pattern
/// wins (static over `:param` over `*`), then declaration order.
pub fn match_routes<'a, V>(
    routes: &'a [CompiledRoute<V>],
    location: &str,
) -> Option<Vec<&'a CompiledRoute<V>>> {
    let mut best: Option<(u32, Vec<&'a CompiledRoute<V>>)> = None;
    for route in routes {
        let Some(chain) = match_route(route, location) else {
            continue;
        };
        let score = chain.last().map_or(0, |r| specificity(&r.full_path));
        if best.as_ref().map_or(true, |(top, _)| score > *top) {
            best = Some((score, chain));
        }
    }
    best.map(|(_, chain)| chain)
}

fn match_route<'a, V>(
    route: &'a CompiledRoute<V>,
    location: &str,
) -> Option<Vec<&'a CompiledRoute<V>>> {
    match route.shape {
        RouteShape::Index | RouteShape::Leaf => {
            pattern_matches(&route.full_path, location, false).then(|| vec![route])
        }
        RouteShape::Parent => {
            if !pattern_matches(&route.full_path, location, true) {
                return None;
            }
            if let Some(mut chain) = match_routes(&route.children, location) {
                chain.insert(0, route);
                return Some(chain);
            }
            pattern_matches(&route.full_path, location, false).then(|| vec![route])
        }
    }
}

/// Whether `location` matches `pattern`.
///
/// Patterns use `/`-separated segments: literals, `:name` for any single
/// segment and `*` (optionally named) for the rest of the path. With
/// `prefix` set, extra location segments are allowed.
pub fn pattern_matches(pattern: &str, location: &str, prefix: bool) -> bool {
    let mut pattern = segments(pattern);
    let mut location = segments(location);

    loop {
        match (pattern.next(), location.next()) {
            (None, None) => return true,
            (None, Some(_)) => return prefix,
            (Some(p), _) if p.starts_with('*') => return true,
            (Some(_), None) => return false,
            (Some(p), Some(l)) => {
                if !p.starts_with(':') && p != l {
                    return false;
                }
            }
        }
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

fn specificity(pattern: &str) -> u32 {
    segments(pattern)
        .map(|s| match s.as_bytes()[0] {
            b'*' => 1,
            b':' => 2,
            _ => 3,
        })
        .sum()
}

#[derive(Clone)]
pub(crate) struct RenderEnv {
    pub hooks: KeeperHooks,
    pub mode: TimingMode,
}

/// Matched outcomes plus the level the next outlet renders.
#[derive(Clone)]
struct OutletChain {
    levels: Arc<Vec<RouteOutcome<ViewFn>>>,
    depth: usize,
    env: RenderEnv,
}

/// Render the compiled tree for `location`.
pub(crate) fn render_tree(tree: CompiledTree<ViewFn>, location: &str, env: RenderEnv) -> AnyView {
    let Some(matched) = match_routes(&tree.routes, location) else {
        tracing::debug!(location, "no route matched");
        return tree.not_found.run();
    };

    let levels = matched.into_iter().map(|r| r.outcome.clone()).collect();
    let chain = OutletChain {
        levels: Arc::new(levels),
        depth: 0,
        env,
    };
    view! { <OutletLevel chain=chain/> }.into_any()
}

/// Renders the matched child route of the enclosing parent route.
///
/// Place it inside the view of any route that has children. Outside a
/// matched parent it renders nothing.
#[component]
pub fn KeeperOutlet() -> impl IntoView {
    use_context::<OutletChain>().map(|chain| view! { <OutletLevel chain=chain/> })
}

#[component]
fn OutletLevel(chain: OutletChain) -> impl IntoView {
    let Some(outcome) = chain.levels.get(chain.depth).cloned() else {
        return ().into_any();
    };
    let env = chain.env.clone();
    provide_context(OutletChain {
        depth: chain.depth + 1,
        ..chain
    });
    render_outcome(outcome, env)
}

fn render_outcome(outcome: RouteOutcome<ViewFn>, env: RenderEnv) -> AnyView {
    match outcome {
        RouteOutcome::Redirect(nav) => view! { <GuardRedirect nav=nav hooks=env.hooks/> }.into_any(),
        RouteOutcome::Render(rendered) | RouteOutcome::Blocked(rendered) => {
            render_view(rendered, env.mode)
        }
        RouteOutcome::Empty => ().into_any(),
    }
}

fn render_view(rendered: Rendered<ViewFn>, mode: TimingMode) -> AnyView {
    let Rendered {
        view,
        suspense,
        track,
    } = rendered;

    let content = move || match track {
        Some(path) => view! {
            <TimingBoundary path=path mode=mode>
                {view.run()}
            </TimingBoundary>
        }
        .into_any(),
        None => view.run(),
    };

    match suspense {
        Some(fallback) => view! {
            <Suspense fallback=move || fallback.run()>
                {content()}
            </Suspense>
        }
        .into_any(),
        None => content(),
    }
}

/// Performs a guard redirect once mounted.
#[component]
fn GuardRedirect(nav: NavigateInstruction, hooks: KeeperHooks) -> impl IntoView {
    let handle = use_route_keeper();
    let location = use_location();
    let navigate = use_navigate();

    Effect::new(move |_| {
        let current = location.pathname.get_untracked();
        let (href, resolve) = prepare_redirect(&handle, &nav, &hooks, &current);
        navigate(
            &href,
            NavigateOptions {
                resolve,
                replace: nav.replace,
                scroll: !nav.prevent_scroll_reset.unwrap_or(false),
                ..Default::default()
            },
        );
    });
}

/// Note the trail and notify for a redirect leaving `current`.
///
/// Returns the href to navigate to and whether the router should still
/// resolve it.
fn prepare_redirect(
    handle: &KeeperHandle,
    nav: &NavigateInstruction,
    hooks: &KeeperHooks,
    current: &str,
) -> (String, bool) {
    let mut target = nav.to.clone();
    let resolve = match nav.relative {
        Some(RelativeTo::Path) if !target.pathname.starts_with('/') => {
            target.pathname = resolve_path(Some(&target.pathname), false, current);
            false
        }
        _ => true,
    };
    let href = target.href();

    if let Some(trail) = nav.trail() {
        handle.note_redirect(&target.pathname, trail);
    }
    nav.notify(hooks.redirect_hook());
    tracing::debug!(
        from = %current,
        to = %href,
        reason = nav.reason().unwrap_or_default(),
        "guard redirect"
    );

    (href, resolve)
}

#[cfg(test)]
mod tests {
    use super::*;
    use keeper_core::{
        GuardInput, GuardViews, KeeperConfig, KeeperContext, ManualClock, MemoryStore,
        RouteCompiler, RouteNode,
    };
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn tree(routes: &[RouteNode<&'static str>]) -> CompiledTree<&'static str> {
        compile(routes, true, "/")
    }

    fn compile(
        routes: &[RouteNode<&'static str>],
        authenticated: bool,
        location: &str,
    ) -> CompiledTree<&'static str> {
        let config = KeeperConfig::default();
        let views = GuardViews {
            loading: "loading",
            private_fallback: "landing",
            unauthorized: "unauthorized",
            not_found: "not-found",
        };
        let roles = BTreeSet::new();
        let input = GuardInput {
            authenticated,
            user_roles: &roles,
            location,
            tracking: false,
        };
        RouteCompiler::new(&config, &views, input).compile(routes)
    }

    fn matched(tree: &CompiledTree<&'static str>, location: &str) -> Option<Vec<String>> {
        match_routes(&tree.routes, location)
            .map(|chain| chain.iter().map(|r| r.key.clone()).collect())
    }

    #[test]
    fn test_pattern_segments() {
        assert!(pattern_matches("/", "/", false));
        assert!(pattern_matches("/users/:id", "/users/7", false));
        assert!(!pattern_matches("/users/:id", "/users", false));
        assert!(pattern_matches("/files/*", "/files/a/b", false));
        assert!(pattern_matches("/files/*rest", "/files", false));
        assert!(pattern_matches("/users", "/users/7", true));
        assert!(!pattern_matches("/users", "/users/7", false));
        assert!(pattern_matches("/about", "/about/", false));
    }

    #[test]
    fn test_nested_chain() {
        let t = tree(&[RouteNode::new("dashboard", "layout").neutral().with_children(vec![
            RouteNode::index("overview"),
            RouteNode::new("settings", "settings"),
        ])]);

        assert_eq!(
            matched(&t, "/dashboard/settings"),
            Some(vec!["dashboard".to_string(), "/dashboardsettings".to_string()])
        );
        assert_eq!(
            matched(&t, "/dashboard"),
            Some(vec!["dashboard".to_string(), "/dashboardindex".to_string()])
        );
        assert_eq!(matched(&t, "/dashboard/missing"), None);
    }

    #[test]
    fn test_static_beats_param() {
        let t = tree(&[
            RouteNode::new("/users/:id", "user").neutral(),
            RouteNode::new("/users/new", "new").neutral(),
        ]);
        assert_eq!(matched(&t, "/users/new"), Some(vec!["/users/new".to_string()]));
        assert_eq!(matched(&t, "/users/3"), Some(vec!["/users/:id".to_string()]));
    }

    #[test]
    fn test_unmatched_location() {
        let t = tree(&[RouteNode::new("/", "home")]);
        assert!(matched(&t, "/nowhere").is_none());
        assert_eq!(matched(&t, "/"), Some(vec!["/".to_string()]));
    }

    fn dashboard_redirect() -> NavigateInstruction {
        let t = compile(
            &[RouteNode::new("dashboard", "dashboard").private()],
            false,
            "/dashboard",
        );
        t.routes[0].outcome.as_redirect().cloned().expect("redirect")
    }

    fn keeper() -> (KeeperHandle, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let core = KeeperContext::with_clock(Arc::new(MemoryStore::new()), clock.clone());
        (KeeperHandle::from_context(core), clock)
    }

    /// Navigates to `path`, mounts its timed view and unmounts it after `ms`.
    fn visit(handle: &KeeperHandle, clock: &ManualClock, path: &'static str, ms: i64) {
        handle.settle_trail(path);
        let route = Owner::new();
        route.with(|| {
            let _view = view! { <TimingBoundary path=path>"page"</TimingBoundary> };
        });
        clock.advance_ms(ms);
        route.cleanup();
    }

    #[test]
    fn test_redirect_notifies_once() {
        let owner = Owner::new();
        owner.with(|| {
            let (handle, _) = keeper();
            let calls = Arc::new(AtomicUsize::new(0));
            let hooks = KeeperHooks::new().on_redirect({
                let calls = calls.clone();
                move |from: &str, to: &str| {
                    assert_eq!((from, to), ("/dashboard", "/login"));
                    calls.fetch_add(1, Ordering::SeqCst);
                }
            });

            let nav = dashboard_redirect();
            assert_eq!(calls.load(Ordering::SeqCst), 0);

            let (href, resolve) = prepare_redirect(&handle, &nav, &hooks, "/dashboard");
            assert_eq!(href, "/login");
            assert!(resolve);
            assert_eq!(calls.load(Ordering::SeqCst), 1);

            let trail = handle.core().pending_trail().expect("trail noted");
            assert_eq!(trail.intended_path.as_deref(), Some("/dashboard"));
        });
    }

    #[test]
    fn test_path_relative_redirect_resolved_against_location() {
        let owner = Owner::new();
        owner.with(|| {
            let (handle, _) = keeper();
            let mut nav = dashboard_redirect();
            nav.to.pathname = "login".into();
            nav.relative = Some(RelativeTo::Path);

            let (href, resolve) = prepare_redirect(&handle, &nav, &KeeperHooks::new(), "/account");
            assert_eq!(href, "/account/login");
            assert!(!resolve);
            assert!(handle.core().claim_trail("/account/login").is_some());
        });
    }

    #[test]
    fn test_boundary_records_once_on_unmount() {
        let owner = Owner::new();
        owner.with(|| {
            let (handle, clock) = keeper();
            provide_context(handle.clone());

            let route = Owner::new();
            route.with(|| {
                let _view = view! { <TimingBoundary path="/reports">"reports"</TimingBoundary> };
            });
            assert!(handle.timing_records().is_empty());

            clock.advance_ms(12);
            route.cleanup();
            let records = handle.timing_records();
            assert_eq!(records.len(), 1);
            assert_eq!(records[0].path, "/reports");
            assert_eq!(records[0].load_time, 12);

            route.cleanup();
            assert_eq!(handle.timing_records().len(), 1);
        });
    }

    #[test]
    fn test_redirect_trail_only_on_landing_timing() {
        let owner = Owner::new();
        owner.with(|| {
            let (handle, clock) = keeper();
            provide_context(handle.clone());

            prepare_redirect(&handle, &dashboard_redirect(), &KeeperHooks::new(), "/dashboard");
            visit(&handle, &clock, "/login", 5);
            visit(&handle, &clock, "/about", 8);

            let records = handle.timing_records();
            assert_eq!(records.len(), 2);

            let about = &records[0];
            assert_eq!(about.path, "/about");
            assert_eq!(about.redirected, Some(false));
            assert_eq!(about.intended_path.as_deref(), Some("/about"));

            let login = &records[1];
            assert_eq!(login.redirected, Some(true));
            assert_eq!(login.intended_path.as_deref(), Some("/dashboard"));
            assert_eq!(
                login.metadata.as_ref().and_then(|m| m.reason.as_deref()),
                Some("User not authenticated")
            );
        });
    }
}
