//! Schedule markers for route lifecycle hooks.
//!
//! Use them with [`RouteHooks::register_observer`](super::RouteHooks::register_observer).
//! Event data comes through [`RouteEvent`](super::RouteEvent).

use waypoint_system::plugin::Schedule;

// ─────────────────────────────────────────────────────────────────────────────
// Perform
// ─────────────────────────────────────────────────────────────────────────────

/// Runs after a perform passed its checks, before the destination is made.
///
/// Event data: [`RouteEvent::WillPerform`](super::RouteEvent::WillPerform)
pub struct OnRouteWillPerform;
impl Schedule for OnRouteWillPerform {}

/// Runs after a perform succeeded.
///
/// Event data: [`RouteEvent::DidPerform`](super::RouteEvent::DidPerform)
pub struct OnRouteDidPerform;
impl Schedule for OnRouteDidPerform {}

// ─────────────────────────────────────────────────────────────────────────────
// Remove
// ─────────────────────────────────────────────────────────────────────────────

/// Runs after a remove passed its checks, before the reverse transition.
///
/// Event data: [`RouteEvent::WillRemove`](super::RouteEvent::WillRemove)
pub struct OnRouteWillRemove;
impl Schedule for OnRouteWillRemove {}

/// Runs after a remove succeeded.
///
/// Event data: [`RouteEvent::DidRemove`](super::RouteEvent::DidRemove)
pub struct OnRouteDidRemove;
impl Schedule for OnRouteDidRemove {}

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Runs once for every failed action, including failed preconditions.
///
/// Event data: [`RouteEvent::Error`](super::RouteEvent::Error)
pub struct OnRouteError;
impl Schedule for OnRouteError {}
