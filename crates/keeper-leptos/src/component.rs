//! The `RouteKeeper` component.

use std::collections::BTreeSet;
use std::sync::Arc;

use keeper_core::{
    report_issues, routes_use_roles, validate_tree, AuthState, GuardInput, GuardViews, KeeperConfig,
    KeeperError, KeeperHooks, KeyValueStore, RouteCompiler, RouteNode, TimingMode,
};
use leptos::error::Errors;
use leptos::prelude::*;
use leptos_router::hooks::use_location;

use crate::handle::KeeperHandle;
use crate::launcher::Launcher;
use crate::outlet::{render_tree, RenderEnv};
use crate::storage::browser_store;
use crate::views::default_views;

/// Guarded routes for a Leptos application.
///
/// Must be rendered inside a `leptos_router` `<Router>`. Routes are
/// recompiled whenever the routes, auth state, roles or location change;
/// the matched chain is rendered in place and parents render their child
/// through [`KeeperOutlet`](crate::KeeperOutlet).
///
/// ```rust,ignore
/// use keeper_leptos::prelude::*;
///
/// let routes = vec![
///     RouteNode::new("/", ViewFn::from(|| view! { <Home/> })),
///     RouteNode::new("login", ViewFn::from(|| view! { <Login/> })).public(),
///     RouteNode::new("admin", ViewFn::from(|| view! { <Admin/> }))
///         .private()
///         .with_roles(["admin"]),
/// ];
///
/// view! {
///     <Router>
///         <RouteKeeper routes=routes auth=signed_in user_roles=roles/>
///     </Router>
/// }
/// ```
#[component]
pub fn RouteKeeper(
    /// Route table.
    #[prop(into)]
    routes: Signal<Vec<RouteNode<ViewFn>>>,
    /// Whether the user is authenticated. Wrap a token or `"true"`/`"false"`
    /// string with [`auth_from_string`].
    #[prop(into)]
    auth: Signal<bool>,
    /// Roles held by the user.
    #[prop(optional, into)]
    user_roles: MaybeProp<Vec<String>>,
    /// While true, only the loading view renders.
    #[prop(optional, into)]
    loading: MaybeProp<bool>,
    #[prop(optional)] config: KeeperConfig,
    /// Replacement guard views; the built-in ones are used otherwise.
    #[prop(optional)]
    views: Option<GuardViews<ViewFn>>,
    #[prop(optional)] hooks: KeeperHooks,
    /// Durable store for developer preferences; `localStorage` by default.
    #[prop(optional)]
    store: Option<Arc<dyn KeyValueStore>>,
    /// Replacement for the built-in inspector opened by the launcher.
    #[prop(optional)]
    inspector: Option<ViewFn>,
) -> impl IntoView {
    let handle = KeeperHandle::new(store.unwrap_or_else(browser_store));
    provide_context(handle.clone());

    let views = views.unwrap_or_else(default_views);
    let policy = config.warning_policy();
    let location = use_location();
    let pathname = location.pathname;

    if config.dev_build {
        tracing::info!(
            tracking = config.tracking,
            testing_mode = handle.testing_mode(),
            "RouteKeeper mounted"
        );
    }

    Effect::new({
        let hooks = hooks.clone();
        let handle = handle.clone();
        let mode = config.timing_mode;
        move |_| {
            let path = pathname.get();
            hooks.route_changed(&path);
            handle.settle_trail(&path);
            if mode == TimingMode::OnChange {
                handle.settle_probe(&path);
            }
        }
    });

    let fatal = RwSignal::new(None::<String>);
    Effect::new({
        let handle = handle.clone();
        let config = config.clone();
        move |_| {
            let (mut issues, uses_roles) =
                routes.with(|r| (validate_tree(r), routes_use_roles(r)));
            issues.extend(config.redirect_issues());
            handle.set_issues(issues.clone());

            if uses_roles && user_roles.with(|r| r.as_ref().map_or(true, Vec::is_empty)) {
                tracing::debug!("routes declare roles but the user has none");
            }

            let escalated = match report_issues(&issues, policy) {
                Ok(()) => None,
                Err(KeeperError::Configuration(message)) => Some(message),
                Err(other) => Some(other.to_string()),
            };
            fatal.set(escalated);
        }
    });

    let guarded = {
        let config = config.clone();
        move || -> Result<AnyView, KeeperError> {
            if loading.get().unwrap_or(false) {
                return Ok(views.loading.run());
            }
            if let Some(message) = fatal.get() {
                return Err(KeeperError::Configuration(message));
            }

            let path = pathname.get();
            let roles: BTreeSet<String> = user_roles.get().unwrap_or_default().into_iter().collect();
            let input = GuardInput {
                authenticated: auth.get(),
                user_roles: &roles,
                location: &path,
                tracking: config.tracking && handle.testing_mode(),
            };
            let tree = routes.with(|r| RouteCompiler::new(&config, &views, input).compile(r));

            let env = RenderEnv {
                hooks: hooks.clone(),
                mode: config.timing_mode,
            };
            Ok(render_tree(tree, &path, env))
        }
    };

    let body = if config.disable_error_boundary {
        guarded.into_any()
    } else {
        view! {
            <ErrorBoundary fallback=|errors| view! { <RouteError errors=errors/> }>
                {guarded}
            </ErrorBoundary>
        }
        .into_any()
    };

    let tooling = (config.tracking && config.dev_build).then(|| {
        view! { <Launcher inspector=inspector/> }
    });

    view! {
        {body}
        {tooling}
    }
}

/// Authentication signal from a boolean-like string.
///
/// Empty, `"false"`, `"no"` and `"0"` (case-insensitive) are
/// unauthenticated; any other value, such as a token, is authenticated.
pub fn auth_from_string(value: impl Into<Signal<String>>) -> Signal<bool> {
    let value = value.into();
    Signal::derive(move || value.with(|v| AuthState::from(v.as_str()).is_authenticated()))
}

#[component]
fn RouteError(errors: ArcRwSignal<Errors>) -> impl IntoView {
    view! {
        <div class="rk-error" role="alert" style="padding: 2rem;">
            <h2>"RouteKeeper configuration error"</h2>
            <ul>
                {move || {
                    errors
                        .get()
                        .into_iter()
                        .map(|(_, e)| view! { <li>{e.to_string()}</li> })
                        .collect::<Vec<_>>()
                }}
            </ul>
        </div>
    }
}
