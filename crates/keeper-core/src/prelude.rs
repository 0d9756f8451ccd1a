//! Prelude for convenient imports.
//!
//! ```rust,ignore
//! use keeper_core::prelude::*;
//! ```

pub use crate::{
    build_redirect, resolve_path, routes_use_roles, validate_node, validate_tree, AuthState,
    CompiledRoute, CompiledTree, GuardInput, GuardViews, KeeperConfig, KeeperContext,
    KeeperError, KeeperHooks, KeyValueStore, MemoryStore, NavigateInstruction, NoopStore,
    RedirectSpec, RouteCompiler, RouteElement, RouteNode, RouteOutcome, RouteShape, RouteTiming,
    RouteType, TimingMode,
};
