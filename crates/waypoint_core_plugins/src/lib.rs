//! Core infrastructure plugins for Waypoint.
//!
//! - [`TracingPlugin`] - Logging and observability via the `tracing` crate
//! - [`DefaultPlugins`] - Bundle of the infrastructure plugins
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use waypoint_core_plugins::DefaultPlugins;
//! use waypoint_router::prelude::*;
//! use waypoint_system::plugin::PluginGroup;
//! use waypoint_system::server::Server;
//!
//! struct HeadlessExecutor;
//!
//! impl PresentationExecutor for HeadlessExecutor {
//!     fn present(&self, _request: &PresentRequest) -> Result<(), PresentationError> {
//!         Ok(())
//!     }
//!
//!     fn dismiss(&self, _request: &DismissRequest) -> Result<(), PresentationError> {
//!         Ok(())
//!     }
//! }
//!
//! let mut server = Server::new();
//! server
//!     .add_plugins(DefaultPlugins.build())
//!     .add_plugins(RoutingPlugin::new(Arc::new(HeadlessExecutor)));
//! server.finish();
//! assert!(server.get_global::<Navigator>().is_some());
//! ```
//!
//! # Architecture
//!
//! This crate is part of Layer 1 infrastructure:
//!
//! - **Layer 1** (`waypoint_system`, `waypoint_core_plugins`): lifecycle and infrastructure
//! - **Layer 2** (`waypoint_router`): capability registry and route state machine
//! - **Layer 3** (application plugins): concrete route drivers and screens

mod tracing_plugin;

pub use tracing_plugin::{TracingConfig, TracingFormat, TracingPlugin};

use waypoint_system::plugin::{PluginGroup, PluginGroupBuilder};

/// Default infrastructure plugins.
///
/// Currently only [`TracingPlugin`]. The routing plugin is added separately
/// because it needs the host's presentation executor.
///
/// # Customization
///
/// ```
/// use tracing::Level;
/// use waypoint_core_plugins::{DefaultPlugins, TracingPlugin};
/// use waypoint_system::plugin::PluginGroup;
///
/// let plugins = DefaultPlugins
///     .build()
///     .disable::<TracingPlugin>()
///     .add(TracingPlugin::default().with_router_level(Level::DEBUG));
/// assert_eq!(plugins.len(), 1);
/// ```
pub struct DefaultPlugins;

impl PluginGroup for DefaultPlugins {
    fn build(self) -> PluginGroupBuilder {
        PluginGroupBuilder::new().add(TracingPlugin::default())
    }
}
