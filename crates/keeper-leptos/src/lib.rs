//! Leptos wiring for RouteKeeper.
//!
//! [`RouteKeeper`] compiles a [`RouteNode`](keeper_core::RouteNode) table
//! against the current auth state and location and renders the guarded
//! result inside a `leptos_router` `<Router>`. Route views are
//! [`ViewFn`](leptos::prelude::ViewFn)s; parents render their matched child
//! through [`KeeperOutlet`].
//!
//! Developer tooling reads the shared state through [`use_route_keeper`]:
//! the floating [`Launcher`] and its [`Inspector`] show configuration issues
//! and route timings, and switch testing mode.
//!
//! # Features
//!
//! - `csr` / `hydrate`: client builds; also switches timestamps to the JS
//!   clock.
//! - `ssr`: server rendering. Preferences are not persisted on the server.

pub mod prelude;
mod boundary;
mod component;
mod handle;
mod inspector;
mod launcher;
mod outlet;
mod storage;
mod views;

pub use boundary::*;
pub use component::*;
pub use handle::*;
pub use inspector::*;
pub use launcher::*;
pub use outlet::{match_routes, pattern_matches, KeeperOutlet, KeeperOutletProps};
pub use storage::*;
pub use views::*;
