//! Route drivers: the per-destination half of a router.
//!
//! A [`RouteDriver`] knows how to make and prepare one kind of destination.
//! Everything else (state, legality, executor calls, error reporting) lives
//! in [`Router`](crate::Router) and is shared by every driver.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use waypoint_router::prelude::*;
//!
//! pub trait DetailInput: Send + Sync {
//!     fn item(&self) -> u64;
//! }
//!
//! pub struct DetailScreen { item: u64 }
//!
//! impl DetailInput for DetailScreen {
//!     fn item(&self) -> u64 { self.item }
//! }
//!
//! #[derive(Default)]
//! pub struct DetailConfig { pub item: u64 }
//!
//! #[derive(Default)]
//! pub struct DetailRouter;
//!
//! impl RouteDriver for DetailRouter {
//!     type Destination = DetailScreen;
//!     type Module = DetailConfig;
//!
//!     fn make_destination(&self, module: &DetailConfig) -> Option<DetailScreen> {
//!         Some(DetailScreen { item: module.item })
//!     }
//! }
//!
//! impl ProvidesView<dyn DetailInput> for DetailRouter {
//!     fn as_view(destination: Arc<DetailScreen>) -> Arc<dyn DetailInput> {
//!         destination
//!     }
//! }
//!
//! let registry = RouterRegistry::new();
//! registry.register_view::<dyn DetailInput, DetailRouter>();
//! registry.register_destination::<DetailScreen, DetailRouter>();
//! registry.finish_registration();
//!
//! let router_type = registry.resolve(&CapabilityId::view::<dyn DetailInput>()).unwrap();
//! assert!(router_type.name().ends_with("DetailRouter"));
//! ```

use core::any::{Any, TypeId};
use core::fmt;
use std::sync::Arc;

use crate::capability::DestinationClass;
use crate::error::PresentationError;
use crate::route::RouteTypeMask;
use crate::source::RouteSource;

/// A destination with its concrete type erased.
pub type ErasedDestination = Arc<dyn Any + Send + Sync>;

/// A configuration module with its concrete type erased.
pub type ErasedModule = dyn Any + Send + Sync;

// ─────────────────────────────────────────────────────────────────────────────
// DriverId
// ─────────────────────────────────────────────────────────────────────────────

/// Identity of a route driver type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DriverId {
    type_id: TypeId,
    type_name: &'static str,
}

impl DriverId {
    /// Creates the id for driver `R`.
    #[must_use]
    pub fn of<R: RouteDriver>() -> Self {
        Self {
            type_id: TypeId::of::<R>(),
            type_name: core::any::type_name::<R>(),
        }
    }

    /// Returns the underlying `TypeId`.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the driver's type name.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Display for DriverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// RouteDriver
// ─────────────────────────────────────────────────────────────────────────────

/// Makes and prepares destinations of one type.
///
/// Only [`make_destination`](Self::make_destination) is required. The
/// remaining methods have defaults suited to a screen controller that needs
/// no extra preparation.
pub trait RouteDriver: Send + Sync + 'static {
    /// The destination this driver manages.
    type Destination: Send + Sync + 'static;

    /// Configuration filled in by the caller before the destination is made.
    type Module: Default + Send + Sync + 'static;

    /// Makes a new destination, or `None` if the module is unusable.
    fn make_destination(&self, module: &Self::Module) -> Option<Self::Destination>;

    /// Injects dependencies into a destination. Called for every destination
    /// the router manages, including externally created ones.
    fn prepare_destination(&self, _destination: &Self::Destination, _module: &Self::Module) {}

    /// Called after all preparation, including the caller's.
    fn did_finish_prepare_destination(
        &self,
        _destination: &Self::Destination,
        _module: &Self::Module,
    ) {
    }

    /// Returns true if an externally created destination is already prepared.
    ///
    /// When false, the source that surfaced the destination must prepare it
    /// before the router takes it over.
    fn destination_from_external_prepared(&self, _destination: &Self::Destination) -> bool {
        true
    }

    /// Route types this driver accepts.
    fn supported_route_types(&self) -> RouteTypeMask {
        RouteTypeMask::VIEW_CONTROLLER_DEFAULT
    }

    /// Performs a [`RouteType::Custom`](crate::RouteType::Custom) transition.
    fn perform_custom_route(
        &self,
        _destination: &Self::Destination,
        _source: &dyn RouteSource,
        _animated: bool,
    ) -> Result<(), PresentationError> {
        Err(PresentationError::unsupported("custom route"))
    }

    /// Returns true if the driver can reverse its custom transition now.
    fn can_remove_custom_route(&self, _destination: &Self::Destination) -> bool {
        false
    }

    /// Reverses a custom transition.
    fn remove_custom_route(
        &self,
        _destination: &Self::Destination,
        _animated: bool,
    ) -> Result<(), PresentationError> {
        Err(PresentationError::unsupported("custom route removal"))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Type erasure
// ─────────────────────────────────────────────────────────────────────────────

/// Object-safe view of a [`RouteDriver`].
pub(crate) trait ErasedDriver: Send + Sync {
    fn id(&self) -> DriverId;
    fn destination_class(&self) -> DestinationClass;
    fn new_module(&self) -> Box<ErasedModule>;
    fn make_destination(&self, module: &ErasedModule) -> Option<ErasedDestination>;
    fn prepare_destination(&self, destination: &ErasedDestination, module: &ErasedModule);
    fn did_finish_prepare_destination(&self, destination: &ErasedDestination, module: &ErasedModule);
    fn destination_from_external_prepared(&self, destination: &ErasedDestination) -> bool;
    fn supported_route_types(&self) -> RouteTypeMask;
    fn perform_custom_route(
        &self,
        destination: &ErasedDestination,
        source: &dyn RouteSource,
        animated: bool,
    ) -> Result<(), PresentationError>;
    fn can_remove_custom_route(&self, destination: &ErasedDestination) -> bool;
    fn remove_custom_route(
        &self,
        destination: &ErasedDestination,
        animated: bool,
    ) -> Result<(), PresentationError>;
}

struct Erased<R>(R);

impl<R: RouteDriver> Erased<R> {
    fn parts<'a>(
        destination: &'a ErasedDestination,
        module: &'a ErasedModule,
    ) -> Option<(&'a R::Destination, &'a R::Module)> {
        let destination = (**destination).downcast_ref::<R::Destination>()?;
        let module = module.downcast_ref::<R::Module>()?;
        Some((destination, module))
    }

    fn destination(destination: &ErasedDestination) -> Option<&R::Destination> {
        (**destination).downcast_ref::<R::Destination>()
    }
}

impl<R: RouteDriver> ErasedDriver for Erased<R> {
    fn id(&self) -> DriverId {
        DriverId::of::<R>()
    }

    fn destination_class(&self) -> DestinationClass {
        DestinationClass::of::<R::Destination>()
    }

    fn new_module(&self) -> Box<ErasedModule> {
        Box::new(R::Module::default())
    }

    fn make_destination(&self, module: &ErasedModule) -> Option<ErasedDestination> {
        let module = module.downcast_ref::<R::Module>()?;
        let destination = self.0.make_destination(module)?;
        Some(Arc::new(destination))
    }

    fn prepare_destination(&self, destination: &ErasedDestination, module: &ErasedModule) {
        if let Some((destination, module)) = Self::parts(destination, module) {
            self.0.prepare_destination(destination, module);
        }
    }

    fn did_finish_prepare_destination(&self, destination: &ErasedDestination, module: &ErasedModule) {
        if let Some((destination, module)) = Self::parts(destination, module) {
            self.0.did_finish_prepare_destination(destination, module);
        }
    }

    fn destination_from_external_prepared(&self, destination: &ErasedDestination) -> bool {
        Self::destination(destination)
            .is_none_or(|destination| self.0.destination_from_external_prepared(destination))
    }

    fn supported_route_types(&self) -> RouteTypeMask {
        self.0.supported_route_types()
    }

    fn perform_custom_route(
        &self,
        destination: &ErasedDestination,
        source: &dyn RouteSource,
        animated: bool,
    ) -> Result<(), PresentationError> {
        let destination = Self::destination(destination)
            .ok_or_else(|| PresentationError::failed("destination type changed"))?;
        self.0.perform_custom_route(destination, source, animated)
    }

    fn can_remove_custom_route(&self, destination: &ErasedDestination) -> bool {
        Self::destination(destination)
            .is_some_and(|destination| self.0.can_remove_custom_route(destination))
    }

    fn remove_custom_route(
        &self,
        destination: &ErasedDestination,
        animated: bool,
    ) -> Result<(), PresentationError> {
        let destination = Self::destination(destination)
            .ok_or_else(|| PresentationError::failed("destination type changed"))?;
        self.0.remove_custom_route(destination, animated)
    }
}

/// Erases a driver instance.
pub(crate) fn erase<R: RouteDriver>(driver: R) -> Arc<dyn ErasedDriver> {
    Arc::new(Erased(driver))
}
