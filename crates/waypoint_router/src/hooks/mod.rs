//! Lifecycle hooks around route actions.
//!
//! Hooks let plugins observe every perform and remove without touching the
//! drivers: analytics, screen tracking, debug overlays.
//!
//! - **Schedule markers** ([`schedule`]): empty types naming the hook points
//! - **Events** ([`events`]): the [`RouteEvent`] enum every hook receives
//! - **API** ([`api`]): registration and invocation
//!
//! Hooks run on the thread that drove the route, after the router released
//! its lock, in registration order.
//!
//! # Example
//!
//! ```ignore
//! hooks.register_observer::<(OnRouteDidPerform, OnRouteDidRemove)>(
//!     "screen_tracker",
//!     |event: &RouteEvent| match event {
//!         RouteEvent::DidPerform { router, .. } => track_shown(router.router),
//!         RouteEvent::DidRemove { router } => track_hidden(router.router),
//!         _ => {}
//!     },
//! )?;
//! ```

pub mod api;
pub mod events;
pub mod schedule;

pub use api::{HookRegistrationError, RouteHooks};
pub use events::RouteEvent;
pub use schedule::{
    OnRouteDidPerform, OnRouteDidRemove, OnRouteError, OnRouteWillPerform, OnRouteWillRemove,
};
