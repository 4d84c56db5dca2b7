//! Capability registry and route state machine for Waypoint (Layer 2).
//!
//! `waypoint_router` lets callers open a screen by naming what they need from
//! it, a *capability*, instead of naming the screen type. The capability is
//! resolved to a registered route driver, and a [`Router`] drives the
//! destination through its lifecycle:
//!
//! ```text
//! make/prepare -> perform -> routed -> remove -> removed
//! ```
//!
//! # Core Concepts
//!
//! - [`CapabilityId`] - a view or module capability, by type or identifier
//! - [`RouterRegistry`] - capability, adapter and destination bindings
//! - [`RouteDriver`] - makes and prepares one kind of destination
//! - [`Router`] - the per-route state machine
//! - [`PresentationExecutor`] - the toolkit side of every transition
//! - [`Navigator`] - entry points tying the pieces together
//! - [`RoutingPlugin`] - server integration
//!
//! # Architecture
//!
//! - **Layer 1** (`waypoint_system`): plugin lifecycle and server
//! - **Layer 2** (`waypoint_router`): registry and state machine (this crate)
//! - **Layer 3** (application plugins): concrete drivers and screens

/// Capability identities and compile-time conformance.
pub mod capability;

/// Per-route configuration.
pub mod config;

/// Route driver trait and type erasure.
pub mod driver;

/// Registration and route errors.
pub mod error;

/// Presentation executor trait.
pub mod executor;

/// Process-wide error handler.
pub mod handler;

/// Lifecycle hooks around route actions.
pub mod hooks;

/// Navigator entry points and auto-creation.
pub mod navigator;

/// Routing plugin.
pub mod plugin;

/// Capability to router registry.
pub mod registry;

/// Route types and remove action inference.
pub mod route;

/// Router state machine.
pub mod router;

/// Route sources and their context.
pub mod source;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::capability::{
        CapabilityId, CapabilityKind, DestinationClass, ProvidesModule, ProvidesView,
    };
    pub use crate::config::{RemoveConfig, RouteConfig, ViewConfig};
    pub use crate::driver::{DriverId, ErasedDestination, ErasedModule, RouteDriver};
    pub use crate::error::{PresentationError, RegistrationError, RouteAction, RouteError};
    pub use crate::executor::{DismissRequest, PresentRequest, PresentationExecutor};
    pub use crate::handler::{clear_global_error_handler, set_global_error_handler};
    pub use crate::hooks::{
        OnRouteDidPerform, OnRouteDidRemove, OnRouteError, OnRouteWillPerform, OnRouteWillRemove,
        RouteEvent, RouteHooks,
    };
    pub use crate::navigator::{AutoCreateOutcome, Navigator};
    pub use crate::plugin::RoutingPlugin;
    pub use crate::registry::{
        ModuleRouterType, RegistryReport, RouterRegistry, RouterType, ViewRouterType,
    };
    pub use crate::route::{RealRouteType, RemoveAction, RouteType, RouteTypeMask};
    pub use crate::router::{Router, RouterId, RouterInfo, RouterState};
    pub use crate::source::{RoutePath, RouteSource, SourceContext, SourceHost, SourceRef};
}

// Re-export key types at crate root for convenience
pub use capability::{CapabilityId, CapabilityKind, ProvidesModule, ProvidesView};
pub use driver::RouteDriver;
pub use error::{PresentationError, RegistrationError, RouteError};
pub use executor::PresentationExecutor;
pub use navigator::Navigator;
pub use plugin::RoutingPlugin;
pub use registry::{RouterRegistry, RouterType};
pub use route::{RealRouteType, RouteType};
pub use router::{Router, RouterState};
