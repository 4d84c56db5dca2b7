//! Capability-based view routing for Rust UI hosts.
//!
//! Callers open a screen by naming the interface they need from it. The
//! registry resolves that capability to a route driver, and a router drives
//! the destination through a checked perform/remove lifecycle on top of the
//! host's presentation executor.
//!
//! ```
//! use std::sync::Arc;
//! use waypoint::prelude::*;
//!
//! trait GreetingInput: Send + Sync {
//!     fn greeting(&self) -> &str;
//! }
//!
//! struct GreetingScreen;
//!
//! impl GreetingInput for GreetingScreen {
//!     fn greeting(&self) -> &str {
//!         "hello"
//!     }
//! }
//!
//! #[derive(Default)]
//! struct GreetingRouter;
//!
//! impl RouteDriver for GreetingRouter {
//!     type Destination = GreetingScreen;
//!     type Module = ();
//!
//!     fn make_destination(&self, _module: &()) -> Option<GreetingScreen> {
//!         Some(GreetingScreen)
//!     }
//! }
//!
//! impl ProvidesView<dyn GreetingInput> for GreetingRouter {
//!     fn as_view(destination: Arc<GreetingScreen>) -> Arc<dyn GreetingInput> {
//!         destination
//!     }
//! }
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
//! let registry = RouterRegistry::new();
//! registry
//!     .register_view::<dyn GreetingInput, GreetingRouter>()
//!     .register_destination::<GreetingScreen, GreetingRouter>();
//! registry.finish_registration();
//!
//! let navigator = Navigator::new(registry, Arc::new(HeadlessExecutor));
//! let greeting = navigator.make_destination::<dyn GreetingInput>(|_| {}).unwrap();
//! assert_eq!(greeting.greeting(), "hello");
//! ```

/// Layer 1: plugin lifecycle and server.
pub use waypoint_system;

/// Layer 1: infrastructure plugins.
pub use waypoint_core_plugins;

/// Layer 2: capability registry and route state machine.
pub use waypoint_router;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use waypoint_core_plugins::{DefaultPlugins, TracingConfig, TracingFormat, TracingPlugin};
    pub use waypoint_router::prelude::*;
    pub use waypoint_system::prelude::*;
}
