//! RouteKeeper core.
//!
//! Declarative route guarding for component-based UIs. A caller describes
//! its routes as a table of [`RouteNode`]s; RouteKeeper validates the table
//! and compiles it, per render, into guarded routes the host router mounts.
//!
//! # Architecture
//!
//! - [`resolve_path`] turns a node's path and its parent's path into one
//!   absolute path.
//! - [`validate_tree`] reports configuration problems as strings.
//! - [`build_redirect`] produces the navigate instructions guards emit.
//! - [`RouteCompiler`] applies auth, role and redirect rules to every node.
//! - [`KeeperContext`] holds the issues, timings and testing mode of one
//!   mounted instance.
//!
//! Nothing here is tied to a UI framework: routes are generic over the
//! host's view type. See `keeper-leptos` for the Leptos wiring.
//!
//! # Quick Start
//!
//! ```rust
//! use std::collections::BTreeSet;
//! use keeper_core::prelude::*;
//!
//! let routes = vec![
//!     RouteNode::new("/", "home"),
//!     RouteNode::new("login", "login").public(),
//!     RouteNode::new("dashboard", "dashboard").private(),
//! ];
//! assert!(validate_tree(&routes).is_empty());
//!
//! let config = KeeperConfig::default();
//! let views = GuardViews {
//!     loading: "loading",
//!     private_fallback: "landing",
//!     unauthorized: "unauthorized",
//!     not_found: "not found",
//! };
//! let roles = BTreeSet::new();
//! let input = GuardInput {
//!     authenticated: false,
//!     user_roles: &roles,
//!     location: "/dashboard",
//!     tracking: false,
//! };
//! let tree = RouteCompiler::new(&config, &views, input).compile(&routes);
//! let nav = tree.routes[2].outcome.as_redirect().unwrap();
//! assert_eq!(nav.to.pathname, "/login");
//! ```

pub mod prelude;
mod compile;
mod config;
mod context;
mod error;
mod launcher;
mod path;
mod redirect;
mod route;
mod storage;
mod timing;
mod validate;

pub use compile::*;
pub use config::*;
pub use context::*;
pub use error::*;
pub use launcher::*;
pub use path::*;
pub use redirect::*;
pub use route::*;
pub use storage::*;
pub use timing::*;
pub use validate::*;
