//! Plugin lifecycle primitives for Waypoint (Layer 1).
//!
//! `waypoint_system` provides the startup skeleton every Waypoint host uses:
//!
//! - [`api`] - API trait for build-time capability registries
//! - [`plugin`] - Plugin trait, plugin groups and schedule markers
//! - [`resource`] - Marker trait for read-only globals
//! - [`server`] - Server runtime for plugin orchestration
//!
//! # Architecture
//!
//! - **Layer 1** (`waypoint_system`, `waypoint_core_plugins`): lifecycle and infrastructure
//! - **Layer 2** (`waypoint_router`): capability registry and route state machine
//! - **Layer 3** (application plugins): concrete route drivers and screens
//!
//! # Example
//!
//! ```
//! use waypoint_system::plugin::Plugin;
//! use waypoint_system::resource::GlobalResource;
//! use waypoint_system::server::Server;
//!
//! #[derive(Default)]
//! struct AppInfo { name: &'static str }
//! impl GlobalResource for AppInfo {}
//!
//! struct AppInfoPlugin;
//!
//! impl Plugin for AppInfoPlugin {
//!     fn build(&self, server: &mut Server) {
//!         server.insert_global(AppInfo { name: "demo" });
//!     }
//! }
//!
//! let mut server = Server::new();
//! server.add_plugins(AppInfoPlugin);
//! server.finish();
//! assert_eq!(server.get_global::<AppInfo>().unwrap().name, "demo");
//! ```

/// API trait for capability registration.
pub mod api;

/// Plugin trait for extensible functionality.
pub mod plugin;

/// Global resource marker.
pub mod resource;

/// Server runtime for plugin orchestration.
pub mod server;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::api::*;
    pub use crate::plugin::*;
    pub use crate::resource::*;
    pub use crate::server::*;
}
