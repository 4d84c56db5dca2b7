//! Provides the routing APIs and the [`Navigator`] global.

use std::sync::Arc;

use waypoint_system::plugin::Plugin;
use waypoint_system::server::Server;

use crate::executor::PresentationExecutor;
use crate::hooks::RouteHooks;
use crate::navigator::Navigator;
use crate::registry::RouterRegistry;

/// Plugin that owns route registration and navigation.
///
/// # Lifecycle
///
/// 1. **`build()` phase**: inserts the [`RouterRegistry`] and [`RouteHooks`]
///    APIs. Screen plugins that depend on this plugin register their drivers,
///    adapters and hooks from their own `build()`.
///
/// 2. **`ready()` phase**: freezes the registry, logs a warning for every
///    dangling adapter and every driver without a destination class, and
///    inserts the [`Navigator`] global.
///
/// # Usage
///
/// ```ignore
/// server
///     .add_plugins(RoutingPlugin::new(Arc::new(UiKitExecutor)))
///     .add_plugins(DetailScreensPlugin);
/// server.finish();
/// ```
pub struct RoutingPlugin {
    executor: Arc<dyn PresentationExecutor>,
    registry: RouterRegistry,
}

impl RoutingPlugin {
    /// Creates the plugin with a fresh registry.
    #[must_use]
    pub fn new(executor: Arc<dyn PresentationExecutor>) -> Self {
        Self {
            executor,
            registry: RouterRegistry::new(),
        }
    }

    /// Uses an existing registry instead of a fresh one.
    #[must_use]
    pub fn with_registry(mut self, registry: RouterRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Uses the process-wide registry.
    #[must_use]
    pub fn with_global_registry(self) -> Self {
        self.with_registry(RouterRegistry::global())
    }
}

impl Plugin for RoutingPlugin {
    fn build(&self, server: &mut Server) {
        server.insert_api(self.registry.clone());
        server.insert_api(RouteHooks::new());
    }

    fn ready(&self, server: &mut Server) {
        self.registry.finish_registration();

        let report = self.registry.validate();
        for adapter in &report.unresolved_adapters {
            tracing::warn!(adapter = %adapter, "adapter does not resolve to a router");
        }
        for router in &report.routers_without_destination {
            tracing::warn!(router, "router has no registered destination class");
        }

        let hooks = server.api::<RouteHooks>().cloned().unwrap_or_default();
        let navigator =
            Navigator::new(self.registry.clone(), Arc::clone(&self.executor)).with_hooks(hooks);
        server.insert_global(navigator);

        tracing::debug!(
            capabilities = self.registry.capability_count(),
            "routing ready"
        );
    }
}
