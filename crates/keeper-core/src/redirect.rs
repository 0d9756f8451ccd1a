//! Redirect instructions.
//!
//! Guards never navigate themselves. They build a [`NavigateInstruction`]
//! which the host router turns into its own redirect. The instruction's
//! state carries `__rk*` bookkeeping so the landing route can tell it was
//! reached through a guard.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// State key: navigation was produced by a guard.
pub const STATE_REDIRECTED: &str = "__rkRedirected";
/// State key: path the user was on when the guard fired.
pub const STATE_FROM: &str = "__rkFrom";
/// State key: path the user originally asked for.
pub const STATE_INTENDED_PATH: &str = "__rkIntendedPath";
/// State key: name of the guard.
pub const STATE_GUARD: &str = "__rkGuard";
/// State key: why the guard redirected.
pub const STATE_REASON: &str = "__rkReason";

/// Guard name used for every redirect RouteKeeper emits.
pub const GUARD_NAME: &str = "RouteKeeper";

/// Callback invoked with `(from, to)` when a redirect is issued.
pub type RedirectHook = dyn Fn(&str, &str) + Send + Sync;

/// How a relative `pathname` is resolved by the host router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelativeTo {
    /// Relative to the route hierarchy.
    Route,
    /// Relative to the URL path.
    Path,
}

fn default_replace() -> bool {
    true
}

/// Declarative redirect target of a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectSpec {
    /// Target path.
    pub pathname: String,
    /// Query string, with or without the leading `?`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    /// Fragment, with or without the leading `#`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    /// Caller state merged into the navigation state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<Map<String, Value>>,
    /// Replace the current history entry.
    #[serde(default = "default_replace")]
    pub replace: bool,
    /// Relative resolution mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative: Option<RelativeTo>,
    /// Keep the scroll position after navigating.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prevent_scroll_reset: Option<bool>,
}

impl RedirectSpec {
    /// Redirect to `pathname`, replacing the history entry.
    pub fn new(pathname: impl Into<String>) -> Self {
        Self {
            pathname: pathname.into(),
            search: None,
            hash: None,
            state: None,
            replace: true,
            relative: None,
            prevent_scroll_reset: None,
        }
    }

    /// Set the query string.
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Set the fragment.
    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = Some(hash.into());
        self
    }

    /// Set caller state.
    pub fn with_state(mut self, state: Map<String, Value>) -> Self {
        self.state = Some(state);
        self
    }

    /// Push a new history entry instead of replacing.
    pub fn push(mut self) -> Self {
        self.replace = false;
        self
    }

    /// Set the relative resolution mode.
    pub fn with_relative(mut self, relative: RelativeTo) -> Self {
        self.relative = Some(relative);
        self
    }

    /// Keep or reset scroll position.
    pub fn with_prevent_scroll_reset(mut self, prevent: bool) -> Self {
        self.prevent_scroll_reset = Some(prevent);
        self
    }
}

/// Where a redirect goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigateTarget {
    /// Target path.
    pub pathname: String,
    /// Query string including `?`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    /// Fragment including `#`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

impl NavigateTarget {
    /// Full location string (`pathname?search#hash`).
    pub fn href(&self) -> String {
        let mut href = self.pathname.clone();
        if let Some(search) = &self.search {
            href.push_str(search);
        }
        if let Some(hash) = &self.hash {
            href.push_str(hash);
        }
        href
    }
}

/// A redirect for the host router to perform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigateInstruction {
    /// Target location.
    pub to: NavigateTarget,
    /// Replace the current history entry.
    pub replace: bool,
    /// Relative resolution mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relative: Option<RelativeTo>,
    /// Keep the scroll position after navigating.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prevent_scroll_reset: Option<bool>,
    /// Caller state merged with the `__rk*` bookkeeping fields.
    pub state: Map<String, Value>,
}

impl NavigateInstruction {
    /// Path the redirect was issued from.
    pub fn from_path(&self) -> Option<&str> {
        self.state.get(STATE_FROM).and_then(Value::as_str)
    }

    /// Reason recorded by the guard.
    pub fn reason(&self) -> Option<&str> {
        self.state.get(STATE_REASON).and_then(Value::as_str)
    }

    /// Typed view of the guard bookkeeping.
    pub fn trail(&self) -> Option<GuardTrail> {
        GuardTrail::from_state(&self.state)
    }

    /// Deliver the `(from, to)` notification for this redirect.
    pub fn notify(&self, hook: Option<&RedirectHook>) {
        if let Some(hook) = hook {
            hook(self.from_path().unwrap_or_default(), &self.to.pathname);
        }
    }
}

/// Guard bookkeeping read back from navigation state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GuardTrail {
    /// Navigation was produced by a guard.
    pub redirected: bool,
    /// Path the guard fired on.
    pub from: Option<String>,
    /// Path originally requested.
    pub intended_path: Option<String>,
    /// Guard name.
    pub guard: Option<String>,
    /// Redirect reason.
    pub reason: Option<String>,
}

impl GuardTrail {
    /// Read the `__rk*` fields from navigation state.
    ///
    /// Returns `None` when the state carries none of them.
    pub fn from_state(state: &Map<String, Value>) -> Option<Self> {
        let text = |key: &str| state.get(key).and_then(Value::as_str).map(String::from);

        let trail = Self {
            redirected: state
                .get(STATE_REDIRECTED)
                .and_then(Value::as_bool)
                .unwrap_or(false),
            from: text(STATE_FROM),
            intended_path: text(STATE_INTENDED_PATH),
            guard: text(STATE_GUARD),
            reason: text(STATE_REASON),
        };

        if trail == Self::default() {
            None
        } else {
            Some(trail)
        }
    }
}

/// Build the navigate instruction for `spec`.
///
/// `search` and `hash` are attached only when non-empty and get their
/// leading `?`/`#` if missing. Caller state is kept and the guard fields
/// are written on top of it. `on_redirect` is called with
/// `(current_path, spec.pathname)` before returning.
pub fn build_redirect(
    spec: &RedirectSpec,
    guard: &str,
    reason: &str,
    current_path: &str,
    on_redirect: Option<&RedirectHook>,
) -> NavigateInstruction {
    let to = NavigateTarget {
        pathname: spec.pathname.clone(),
        search: prefixed(spec.search.as_deref(), '?'),
        hash: prefixed(spec.hash.as_deref(), '#'),
    };

    let mut state = spec.state.clone().unwrap_or_default();
    state.insert(STATE_REDIRECTED.into(), Value::Bool(true));
    state.insert(STATE_FROM.into(), Value::String(current_path.into()));
    state.insert(STATE_INTENDED_PATH.into(), Value::String(current_path.into()));
    state.insert(STATE_GUARD.into(), Value::String(guard.into()));
    state.insert(STATE_REASON.into(), Value::String(reason.into()));

    tracing::debug!(
        from = current_path,
        to = %to.href(),
        guard,
        reason,
        "redirect issued"
    );

    let instruction = NavigateInstruction {
        to,
        replace: spec.replace,
        relative: spec.relative,
        prevent_scroll_reset: spec.prevent_scroll_reset,
        state,
    };
    instruction.notify(on_redirect);
    instruction
}

fn prefixed(value: Option<&str>, prefix: char) -> Option<String> {
    match value {
        Some(v) if v.is_empty() => None,
        Some(v) if v.starts_with(prefix) => Some(v.to_string()),
        Some(v) => Some(format!("{prefix}{v}")),
        None => None,
    }
}
