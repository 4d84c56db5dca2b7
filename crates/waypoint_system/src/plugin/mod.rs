//! Plugin system for composing a navigation host.
//!
//! Every piece of startup work in Waypoint is a plugin: the routing plugin
//! installs the router registry, feature plugins register their route
//! drivers against it, and the tracing plugin installs the log subscriber.
//!
//! # Lifecycle
//!
//! 1. **Build** - `build()` runs in dependency order. Route drivers register here.
//! 2. **Ready** - `ready()` runs in dependency order. The routing plugin freezes
//!    the registry here, so every registration must have happened in `build()`.
//! 3. **Cleanup** - `cleanup()` runs in reverse dependency order.
//!
//! # Example
//!
//! ```
//! use waypoint_system::plugin::{Plugin, PluginId};
//! use waypoint_system::server::Server;
//!
//! struct LoggingPlugin;
//! impl Plugin for LoggingPlugin {
//!     fn build(&self, _server: &mut Server) {}
//! }
//!
//! struct CheckoutScreensPlugin;
//! impl Plugin for CheckoutScreensPlugin {
//!     fn build(&self, _server: &mut Server) {
//!         // register route drivers here
//!     }
//!
//!     fn dependencies(&self) -> Vec<PluginId> {
//!         vec![PluginId::of::<LoggingPlugin>()]
//!     }
//! }
//!
//! let mut server = Server::new();
//! server
//!     .add_plugins(CheckoutScreensPlugin)
//!     .add_plugins(LoggingPlugin);
//! server.finish();
//! ```

mod schedule;

pub use schedule::{IntoScheduleIds, Schedule, ScheduleId};

use core::any::TypeId;

use crate::server::Server;

// ─────────────────────────────────────────────────────────────────────────────
// PluginId
// ─────────────────────────────────────────────────────────────────────────────

/// Unique identifier for a plugin type.
///
/// Used for dependency resolution and duplicate detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PluginId {
    type_id: TypeId,
    type_name: &'static str,
}

impl PluginId {
    /// Creates a `PluginId` for the given plugin type.
    #[must_use]
    pub fn of<P: Plugin>() -> Self {
        Self {
            type_id: TypeId::of::<P>(),
            type_name: core::any::type_name::<P>(),
        }
    }

    /// Returns the underlying `TypeId`.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the type name for debugging.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Plugin Trait
// ─────────────────────────────────────────────────────────────────────────────

/// A unit of startup work for a navigation host.
///
/// # Example
///
/// ```ignore
/// pub struct ProfileScreensPlugin;
///
/// impl Plugin for ProfileScreensPlugin {
///     fn build(&self, server: &mut Server) {
///         let registry = server
///             .api::<RouterRegistry>()
///             .expect("RoutingPlugin must be added first");
///         registry.register_view::<dyn ProfileInput, ProfileRouter>();
///     }
///
///     fn dependencies(&self) -> Vec<PluginId> {
///         vec![PluginId::of::<RoutingPlugin>()]
///     }
/// }
/// ```
pub trait Plugin: Send + Sync + 'static {
    /// Configures the server. Called once, in dependency order.
    fn build(&self, server: &mut Server);

    /// Called after every plugin has been built.
    ///
    /// Use this for validation and for work that depends on registrations
    /// made by other plugins.
    fn ready(&self, _server: &mut Server) {}

    /// Called when the server shuts down, in reverse dependency order.
    fn cleanup(&self, _server: &mut Server) {}

    /// Returns the plugin's name for debugging and error messages.
    fn name(&self) -> &str {
        core::any::type_name::<Self>()
    }

    /// Declares plugins that must be built before this one.
    ///
    /// The server panics in `finish()` if a dependency was never added.
    fn dependencies(&self) -> Vec<PluginId> {
        Vec::new()
    }

    /// Returns true if this plugin can only be added once.
    fn is_unique(&self) -> bool {
        true
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Plugins Trait (for add_plugins polymorphism)
// ─────────────────────────────────────────────────────────────────────────────

/// Types that can be added to a server: single plugins or plugin groups.
pub trait Plugins {
    /// Adds these plugins to the server.
    fn add_to_server(self, server: &mut Server);
}

impl<P: Plugin> Plugins for P {
    fn add_to_server(self, server: &mut Server) {
        let id = PluginId::of::<P>();
        server.add_plugin_boxed(id, Box::new(self));
    }
}

impl Plugins for PluginGroupBuilder {
    fn add_to_server(self, server: &mut Server) {
        for boxed in self.plugins {
            server.add_plugin_boxed(boxed.id, boxed.plugin);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// PluginGroup
// ─────────────────────────────────────────────────────────────────────────────

/// A collection of plugins that can be added together.
pub trait PluginGroup {
    /// Returns the plugins in this group.
    fn build(self) -> PluginGroupBuilder;
}

/// A boxed plugin with its captured [`PluginId`].
pub(crate) struct BoxedPlugin {
    pub(crate) id: PluginId,
    pub(crate) plugin: Box<dyn Plugin>,
}

/// Builder for customizing plugin groups.
///
/// ```ignore
/// DefaultPlugins
///     .build()
///     .disable::<TracingPlugin>()
///     .add(CustomTracingPlugin::new())
/// ```
#[derive(Default)]
pub struct PluginGroupBuilder {
    pub(crate) plugins: Vec<BoxedPlugin>,
}

impl PluginGroupBuilder {
    /// Creates a new empty plugin group builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            plugins: Vec::new(),
        }
    }

    /// Adds a plugin to the end of the group.
    #[must_use]
    #[expect(
        clippy::should_implement_trait,
        reason = "This is a builder method, not std::ops::Add"
    )]
    pub fn add<P: Plugin>(mut self, plugin: P) -> Self {
        self.plugins.push(BoxedPlugin {
            id: PluginId::of::<P>(),
            plugin: Box::new(plugin),
        });
        self
    }

    /// Removes a plugin from the group by type. No-op if absent.
    #[must_use]
    pub fn disable<P: Plugin>(mut self) -> Self {
        let target = PluginId::of::<P>();
        self.plugins.retain(|p| p.id != target);
        self
    }

    /// Returns the number of plugins in the group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Returns true if the group contains no plugins.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}
