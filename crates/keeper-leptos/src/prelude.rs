//! Prelude for convenient imports.
//!
//! ```rust,ignore
//! use keeper_leptos::prelude::*;
//! ```

pub use keeper_core::prelude::*;

pub use crate::{
    auth_from_string, browser_store, default_views, try_use_route_keeper, use_route_keeper,
    BrowserStore, Inspector, KeeperHandle, KeeperOutlet, Launcher, RouteKeeper, TimingBoundary,
};
pub use leptos::prelude::ViewFn;
