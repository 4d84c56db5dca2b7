//! Capability to router registry.
//!
//! The registry has two phases, like every registry in a Waypoint host:
//!
//! 1. **Open**: plugins bind capabilities, destination classes and adapters
//!    during `build()`. Conflicting bindings are programming mistakes and
//!    panic (or return [`RegistrationError`] from the `try_*` variants).
//! 2. **Frozen**: [`finish_registration`](RouterRegistry::finish_registration)
//!    seals the table. Lookups are pure from then on.
//!
//! Writers are serialized by a mutex and publish a new immutable snapshot on
//! every successful registration. Readers load the current snapshot without
//! locking, so lookups from any thread never wait on a writer.
//!
//! # Example
//!
//! ```ignore
//! registry
//!     .register_driver(DetailRouter::new(store))
//!     .view::<dyn DetailInput>()
//!     .module::<dyn DetailModule>()
//!     .exclusive_destination();
//!
//! registry.register_view_adapter::<dyn LegacyDetailInput, dyn DetailInput>();
//! registry.finish_registration();
//! ```

use core::any::Any;
use core::fmt;
use core::marker::PhantomData;
use std::borrow::Cow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock};

use arc_swap::ArcSwap;
use hashbrown::HashMap;
use parking_lot::Mutex;
use waypoint_system::api::API;

use crate::capability::{CapabilityId, CapabilityKind, DestinationClass, ProvidesModule, ProvidesView};
use crate::config::{ModuleCast, ViewCast};
use crate::driver::{DriverId, ErasedDestination, ErasedDriver, ErasedModule, RouteDriver, erase};
use crate::error::RegistrationError;
use crate::route::{RouteType, RouteTypeMask};

type Cast = Arc<dyn Any + Send + Sync>;

// ─────────────────────────────────────────────────────────────────────────────
// RouterType
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
struct DriverRecord {
    id: DriverId,
    driver: Arc<dyn ErasedDriver>,
    capabilities: Vec<CapabilityId>,
    casts: HashMap<CapabilityId, Cast>,
    destination_registered: bool,
}

/// A registered route driver, as returned by lookups.
///
/// Cheap to clone. Two `RouterType`s are equal when they refer to the same
/// driver type.
#[derive(Clone)]
pub struct RouterType {
    record: Arc<DriverRecord>,
}

impl RouterType {
    /// Returns the driver's id.
    #[must_use]
    pub fn id(&self) -> DriverId {
        self.record.id
    }

    /// Returns the driver's type name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.record.id.type_name()
    }

    /// Returns the class of destination the driver makes.
    #[must_use]
    pub fn destination_class(&self) -> DestinationClass {
        self.record.driver.destination_class()
    }

    /// Returns true once the destination class was registered for this driver.
    #[must_use]
    pub fn has_registered_destination(&self) -> bool {
        self.record.destination_registered
    }

    /// Capabilities bound directly to this driver, in registration order.
    #[must_use]
    pub fn capabilities(&self) -> &[CapabilityId] {
        &self.record.capabilities
    }

    /// Route types the driver accepts.
    #[must_use]
    pub fn supported_route_types(&self) -> RouteTypeMask {
        self.record.driver.supported_route_types()
    }

    /// Returns true if the driver accepts `route_type`.
    #[must_use]
    pub fn supports_route_type(&self, route_type: RouteType) -> bool {
        self.supported_route_types().contains(route_type)
    }

    /// Returns true if the driver offers typed access through `capability`.
    #[must_use]
    pub fn provides(&self, capability: &CapabilityId) -> bool {
        self.record.casts.contains_key(capability)
    }

    pub(crate) fn driver(&self) -> &dyn ErasedDriver {
        &*self.record.driver
    }

    fn view_cast<P: ?Sized + 'static>(&self) -> Option<ViewCast<P>> {
        let cast = self.record.casts.get(&CapabilityId::view::<P>())?;
        (**cast).downcast_ref::<ViewCast<P>>().copied()
    }

    fn module_cast<P: ?Sized + 'static>(&self) -> Option<ModuleCast<P>> {
        let cast = self.record.casts.get(&CapabilityId::module::<P>())?;
        (**cast).downcast_ref::<ModuleCast<P>>().copied()
    }
}

impl PartialEq for RouterType {
    fn eq(&self, other: &Self) -> bool {
        self.record.id == other.record.id
    }
}

impl Eq for RouterType {}

impl fmt::Debug for RouterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterType")
            .field("driver", &self.name())
            .field("capabilities", &self.record.capabilities)
            .finish_non_exhaustive()
    }
}

/// A router resolved through the view capability `P`.
pub struct ViewRouterType<P: ?Sized + 'static> {
    router_type: RouterType,
    capability: CapabilityId,
    cast: Option<ViewCast<P>>,
}

impl<P: ?Sized + 'static> ViewRouterType<P> {
    /// Returns the untyped router.
    #[must_use]
    pub fn router_type(&self) -> &RouterType {
        &self.router_type
    }

    /// Returns the capability used for the lookup.
    #[must_use]
    pub fn capability(&self) -> &CapabilityId {
        &self.capability
    }

    /// Returns the cast, or `None` when the driver only serves `P` through an
    /// adapter and never declared conformance to it.
    #[must_use]
    pub fn cast(&self) -> Option<ViewCast<P>> {
        self.cast
    }

    /// Views an erased destination through `P`.
    #[must_use]
    pub fn view(&self, destination: &ErasedDestination) -> Option<Arc<P>> {
        (self.cast?)(Arc::clone(destination))
    }
}

impl<P: ?Sized + 'static> Clone for ViewRouterType<P> {
    fn clone(&self) -> Self {
        Self {
            router_type: self.router_type.clone(),
            capability: self.capability.clone(),
            cast: self.cast,
        }
    }
}

/// A router resolved through the module capability `P`.
pub struct ModuleRouterType<P: ?Sized + 'static> {
    router_type: RouterType,
    capability: CapabilityId,
    cast: Option<ModuleCast<P>>,
}

impl<P: ?Sized + 'static> ModuleRouterType<P> {
    /// Returns the untyped router.
    #[must_use]
    pub fn router_type(&self) -> &RouterType {
        &self.router_type
    }

    /// Returns the capability used for the lookup.
    #[must_use]
    pub fn capability(&self) -> &CapabilityId {
        &self.capability
    }

    /// Returns the cast, or `None` when the driver never declared
    /// conformance to `P`.
    #[must_use]
    pub fn cast(&self) -> Option<ModuleCast<P>> {
        self.cast
    }
}

impl<P: ?Sized + 'static> Clone for ModuleRouterType<P> {
    fn clone(&self) -> Self {
        Self {
            router_type: self.router_type.clone(),
            capability: self.capability.clone(),
            cast: self.cast,
        }
    }
}

fn cast_view<P: ?Sized + 'static, R: ProvidesView<P>>(destination: ErasedDestination) -> Option<Arc<P>> {
    let destination = destination.downcast::<R::Destination>().ok()?;
    Some(<R as ProvidesView<P>>::as_view(destination))
}

fn cast_module<P: ?Sized + 'static, R: ProvidesModule<P>>(module: &mut ErasedModule) -> Option<&mut P> {
    module
        .downcast_mut::<R::Module>()
        .map(<R as ProvidesModule<P>>::as_module)
}

// ─────────────────────────────────────────────────────────────────────────────
// RegistrySnapshot
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
enum Binding {
    Router(DriverId),
    Adapter(CapabilityId),
}

#[derive(Clone, Default)]
struct DestinationEntry {
    routers: Vec<DriverId>,
    exclusive: bool,
}

/// One immutable version of the registry table.
#[derive(Clone, Default)]
struct RegistrySnapshot {
    bindings: HashMap<CapabilityId, Binding>,
    destinations: HashMap<DestinationClass, DestinationEntry>,
    routers: HashMap<DriverId, RouterType>,
}

impl RegistrySnapshot {
    fn ensure_router(&mut self, driver: &Arc<dyn ErasedDriver>) -> DriverId {
        let id = driver.id();
        self.routers.entry(id).or_insert_with(|| RouterType {
            record: Arc::new(DriverRecord {
                id,
                driver: Arc::clone(driver),
                capabilities: Vec::new(),
                casts: HashMap::new(),
                destination_registered: false,
            }),
        });
        id
    }

    fn record_mut(&mut self, id: DriverId) -> Option<&mut DriverRecord> {
        self.routers
            .get_mut(&id)
            .map(|router_type| Arc::make_mut(&mut router_type.record))
    }

    /// Follows adapter hops to the terminal driver.
    fn terminal(&self, capability: &CapabilityId) -> Option<DriverId> {
        let mut current = capability;
        for _ in 0..=self.bindings.len() {
            match self.bindings.get(current)? {
                Binding::Router(id) => return Some(*id),
                Binding::Adapter(next) => current = next,
            }
        }
        tracing::error!(capability = %capability, "adapter chain does not terminate");
        None
    }

    fn resolve(&self, capability: &CapabilityId) -> Option<RouterType> {
        let id = self.terminal(capability)?;
        self.routers.get(&id).cloned()
    }

    fn bind(
        &mut self,
        capability: CapabilityId,
        driver: &Arc<dyn ErasedDriver>,
        cast: Option<Cast>,
    ) -> Result<(), RegistrationError> {
        let id = driver.id();
        match self.bindings.get(&capability) {
            Some(Binding::Router(existing)) if *existing != id => {
                return Err(RegistrationError::CapabilityConflict {
                    capability,
                    existing: existing.type_name(),
                    requested: id.type_name(),
                });
            }
            Some(Binding::Adapter(adaptee)) => {
                return Err(RegistrationError::CapabilityIsAdapter {
                    adaptee: adaptee.clone(),
                    capability,
                });
            }
            Some(Binding::Router(_)) | None => {}
        }

        self.ensure_router(driver);
        self.bindings
            .insert(capability.clone(), Binding::Router(id));
        if let Some(record) = self.record_mut(id) {
            if !record.capabilities.contains(&capability) {
                record.capabilities.push(capability.clone());
            }
            if let Some(cast) = cast {
                record.casts.insert(capability, cast);
            }
        }
        Ok(())
    }

    fn conform(&mut self, capability: CapabilityId, driver: &Arc<dyn ErasedDriver>, cast: Cast) {
        let id = self.ensure_router(driver);
        if let Some(record) = self.record_mut(id) {
            record.casts.insert(capability, cast);
        }
    }

    fn adapt(&mut self, adapter: CapabilityId, adaptee: CapabilityId) -> Result<(), RegistrationError> {
        if adapter.kind() != adaptee.kind() {
            return Err(RegistrationError::KindMismatch { adapter, adaptee });
        }

        match self.bindings.get(&adapter) {
            Some(Binding::Router(id)) => {
                return Err(RegistrationError::AdapterHasDirectBinding {
                    router: id.type_name(),
                    adapter,
                });
            }
            Some(Binding::Adapter(existing)) if *existing == adaptee => return Ok(()),
            Some(Binding::Adapter(existing)) => {
                return Err(RegistrationError::AdapterConflict {
                    existing: existing.clone(),
                    adapter,
                    requested: adaptee,
                });
            }
            None => {}
        }

        let mut chain = vec![adapter.clone(), adaptee.clone()];
        let mut current = &adaptee;
        loop {
            if *current == adapter {
                return Err(RegistrationError::AdapterCycle { chain });
            }
            match self.bindings.get(current) {
                Some(Binding::Adapter(next)) => {
                    chain.push(next.clone());
                    current = next;
                }
                _ => break,
            }
        }

        self.bindings.insert(adapter, Binding::Adapter(adaptee));
        Ok(())
    }

    fn bind_destination(
        &mut self,
        driver: &Arc<dyn ErasedDriver>,
        exclusive: bool,
    ) -> Result<(), RegistrationError> {
        let id = self.ensure_router(driver);
        let class = driver.destination_class();
        let entry = self.destinations.entry(class).or_default();

        if entry.exclusive
            && let Some(owner) = entry.routers.first()
            && *owner != id
        {
            return Err(RegistrationError::ExclusiveDestination {
                destination: class,
                owner: owner.type_name(),
                requested: id.type_name(),
            });
        }

        if exclusive {
            let others: Vec<&'static str> = entry
                .routers
                .iter()
                .filter(|router| **router != id)
                .map(DriverId::type_name)
                .collect();
            if !others.is_empty() {
                return Err(RegistrationError::DestinationShared {
                    destination: class,
                    routers: others,
                    requested: id.type_name(),
                });
            }
            entry.exclusive = true;
        }

        if !entry.routers.contains(&id) {
            entry.routers.push(id);
        }
        if let Some(record) = self.record_mut(id) {
            record.destination_registered = true;
        }
        Ok(())
    }

    fn routers_for_class(&self, class: &DestinationClass) -> Vec<RouterType> {
        self.destinations
            .get(class)
            .map(|entry| {
                entry
                    .routers
                    .iter()
                    .filter_map(|id| self.routers.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// RegistryReport
// ─────────────────────────────────────────────────────────────────────────────

/// Findings of [`RouterRegistry::validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryReport {
    /// Adapters whose chain ends at a capability with no binding.
    pub unresolved_adapters: Vec<CapabilityId>,
    /// Drivers that never registered their destination class.
    pub routers_without_destination: Vec<&'static str>,
}

impl RegistryReport {
    /// Returns true if nothing was found.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.unresolved_adapters.is_empty() && self.routers_without_destination.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// RouterRegistry
// ─────────────────────────────────────────────────────────────────────────────

struct RegistryInner {
    writer: Mutex<()>,
    snapshot: ArcSwap<RegistrySnapshot>,
    finished: AtomicBool,
}

/// Registry of route drivers, keyed by capability and destination class.
///
/// Cloning yields another handle to the same registry.
#[derive(Clone)]
pub struct RouterRegistry {
    inner: Arc<RegistryInner>,
}

impl API for RouterRegistry {}

impl Default for RouterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL_REGISTRY: LazyLock<RouterRegistry> = LazyLock::new(RouterRegistry::new);

impl RouterRegistry {
    /// Creates an empty, open registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                writer: Mutex::new(()),
                snapshot: ArcSwap::from_pointee(RegistrySnapshot::default()),
                finished: AtomicBool::new(false),
            }),
        }
    }

    /// Returns a handle to the process-wide registry.
    #[must_use]
    pub fn global() -> RouterRegistry {
        GLOBAL_REGISTRY.clone()
    }

    /// Returns true if both handles refer to the same registry.
    #[must_use]
    pub fn ptr_eq(&self, other: &RouterRegistry) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Applies `update` to a copy of the current table and publishes it.
    ///
    /// Nothing is published when `update` fails.
    fn write<T>(
        &self,
        what: impl FnOnce() -> String,
        update: impl FnOnce(&mut RegistrySnapshot) -> Result<T, RegistrationError>,
    ) -> Result<T, RegistrationError> {
        let _writer = self.inner.writer.lock();
        if self.inner.finished.load(Ordering::Acquire) {
            return Err(RegistrationError::RegistrationFinished { what: what() });
        }

        let mut next = RegistrySnapshot::clone(&self.inner.snapshot.load());
        let value = update(&mut next)?;
        self.inner.snapshot.store(Arc::new(next));
        Ok(value)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Registration
    // ─────────────────────────────────────────────────────────────────────────

    /// Starts registering bindings for a driver instance.
    ///
    /// The first instance of a driver type that gets bound is the one the
    /// registry keeps.
    pub fn register_driver<R: RouteDriver>(&self, driver: R) -> DriverRegistrar<'_, R> {
        DriverRegistrar {
            registry: self,
            driver: erase(driver),
            _marker: PhantomData,
        }
    }

    /// Starts registering bindings for a default-constructed driver.
    pub fn driver<R: RouteDriver + Default>(&self) -> DriverRegistrar<'_, R> {
        self.register_driver(R::default())
    }

    /// Binds the view capability `P` to driver `R`.
    ///
    /// # Panics
    ///
    /// Panics on any [`RegistrationError`].
    pub fn register_view<P, R>(&self) -> &Self
    where
        P: ?Sized + 'static,
        R: ProvidesView<P> + Default,
    {
        self.driver::<R>().view::<P>();
        self
    }

    /// Fallible form of [`register_view`](Self::register_view).
    pub fn try_register_view<P, R>(&self) -> Result<&Self, RegistrationError>
    where
        P: ?Sized + 'static,
        R: ProvidesView<P> + Default,
    {
        self.driver::<R>().try_view::<P>()?;
        Ok(self)
    }

    /// Binds the module capability `P` to driver `R`.
    ///
    /// # Panics
    ///
    /// Panics on any [`RegistrationError`].
    pub fn register_module<P, R>(&self) -> &Self
    where
        P: ?Sized + 'static,
        R: ProvidesModule<P> + Default,
    {
        self.driver::<R>().module::<P>();
        self
    }

    /// Fallible form of [`register_module`](Self::register_module).
    pub fn try_register_module<P, R>(&self) -> Result<&Self, RegistrationError>
    where
        P: ?Sized + 'static,
        R: ProvidesModule<P> + Default,
    {
        self.driver::<R>().try_module::<P>()?;
        Ok(self)
    }

    /// Binds a string identifier to driver `R`.
    ///
    /// # Panics
    ///
    /// Panics on any [`RegistrationError`].
    pub fn register_identifier<R: RouteDriver + Default>(
        &self,
        kind: CapabilityKind,
        identifier: impl Into<Cow<'static, str>>,
    ) -> &Self {
        self.driver::<R>().identifier(kind, identifier);
        self
    }

    /// Fallible form of [`register_identifier`](Self::register_identifier).
    pub fn try_register_identifier<R: RouteDriver + Default>(
        &self,
        kind: CapabilityKind,
        identifier: impl Into<Cow<'static, str>>,
    ) -> Result<&Self, RegistrationError> {
        self.driver::<R>().try_identifier(kind, identifier)?;
        Ok(self)
    }

    /// Associates destination class `D` with driver `R`.
    ///
    /// # Panics
    ///
    /// Panics if `D` is exclusively bound to another driver, or when frozen.
    pub fn register_destination<D, R>(&self) -> &Self
    where
        D: Send + Sync + 'static,
        R: RouteDriver<Destination = D> + Default,
    {
        self.driver::<R>().destination();
        self
    }

    /// Fallible form of [`register_destination`](Self::register_destination).
    pub fn try_register_destination<D, R>(&self) -> Result<&Self, RegistrationError>
    where
        D: Send + Sync + 'static,
        R: RouteDriver<Destination = D> + Default,
    {
        self.driver::<R>().try_destination()?;
        Ok(self)
    }

    /// Associates `D` with `R` and forbids any other driver from binding it.
    ///
    /// # Panics
    ///
    /// Panics if another driver already binds `D`, or when frozen.
    pub fn register_exclusive_destination<D, R>(&self) -> &Self
    where
        D: Send + Sync + 'static,
        R: RouteDriver<Destination = D> + Default,
    {
        self.driver::<R>().exclusive_destination();
        self
    }

    /// Fallible form of
    /// [`register_exclusive_destination`](Self::register_exclusive_destination).
    pub fn try_register_exclusive_destination<D, R>(&self) -> Result<&Self, RegistrationError>
    where
        D: Send + Sync + 'static,
        R: RouteDriver<Destination = D> + Default,
    {
        self.driver::<R>().try_exclusive_destination()?;
        Ok(self)
    }

    /// Makes the view capability `A` resolve through `T`.
    ///
    /// # Panics
    ///
    /// Panics on any [`RegistrationError`].
    pub fn register_view_adapter<A: ?Sized + 'static, T: ?Sized + 'static>(&self) -> &Self {
        self.register_adapter(CapabilityId::view::<A>(), CapabilityId::view::<T>())
    }

    /// Makes the module capability `A` resolve through `T`.
    ///
    /// # Panics
    ///
    /// Panics on any [`RegistrationError`].
    pub fn register_module_adapter<A: ?Sized + 'static, T: ?Sized + 'static>(&self) -> &Self {
        self.register_adapter(CapabilityId::module::<A>(), CapabilityId::module::<T>())
    }

    /// Makes `adapter` resolve through `adaptee`.
    ///
    /// The adaptee does not need to be bound yet.
    ///
    /// # Panics
    ///
    /// Panics on any [`RegistrationError`].
    pub fn register_adapter(&self, adapter: CapabilityId, adaptee: CapabilityId) -> &Self {
        if let Err(err) = self.try_register_adapter(adapter, adaptee) {
            panic!("{err}");
        }
        self
    }

    /// Fallible form of [`register_adapter`](Self::register_adapter).
    pub fn try_register_adapter(
        &self,
        adapter: CapabilityId,
        adaptee: CapabilityId,
    ) -> Result<&Self, RegistrationError> {
        self.write(
            || format!("adapter {adapter} for {adaptee}"),
            |snapshot| snapshot.adapt(adapter.clone(), adaptee.clone()),
        )?;
        tracing::debug!(adapter = %adapter, adaptee = %adaptee, "registered adapter");
        Ok(self)
    }

    fn bind(
        &self,
        capability: CapabilityId,
        driver: &Arc<dyn ErasedDriver>,
        cast: Option<Cast>,
    ) -> Result<(), RegistrationError> {
        let router = driver.id();
        self.write(
            || format!("{capability} for `{router}`"),
            |snapshot| snapshot.bind(capability.clone(), driver, cast),
        )?;
        tracing::debug!(capability = %capability, router = %router, "registered capability");
        Ok(())
    }

    fn conform(
        &self,
        capability: CapabilityId,
        driver: &Arc<dyn ErasedDriver>,
        cast: Cast,
    ) -> Result<(), RegistrationError> {
        let router = driver.id();
        self.write(
            || format!("conformance of `{router}` to {capability}"),
            |snapshot| {
                snapshot.conform(capability.clone(), driver, cast);
                Ok(())
            },
        )
    }

    fn bind_destination(
        &self,
        driver: &Arc<dyn ErasedDriver>,
        exclusive: bool,
    ) -> Result<(), RegistrationError> {
        let router = driver.id();
        let class = driver.destination_class();
        self.write(
            || format!("{class} for `{router}`"),
            |snapshot| snapshot.bind_destination(driver, exclusive),
        )?;
        tracing::debug!(destination = %class, router = %router, exclusive, "registered destination");
        Ok(())
    }

    /// Freezes the registry. Idempotent.
    pub fn finish_registration(&self) {
        let _writer = self.inner.writer.lock();
        if !self.inner.finished.swap(true, Ordering::AcqRel) {
            let snapshot = self.inner.snapshot.load();
            tracing::debug!(
                capabilities = snapshot.bindings.len(),
                routers = snapshot.routers.len(),
                "router registration finished"
            );
        }
    }

    /// Returns true once [`finish_registration`](Self::finish_registration) ran.
    #[must_use]
    pub fn is_registration_finished(&self) -> bool {
        self.inner.finished.load(Ordering::Acquire)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lookup
    // ─────────────────────────────────────────────────────────────────────────

    /// Resolves a capability to its router, following adapters.
    #[must_use]
    pub fn resolve(&self, capability: &CapabilityId) -> Option<RouterType> {
        self.inner.snapshot.load().resolve(capability)
    }

    /// Resolves the view capability `P`.
    #[must_use]
    pub fn view_router<P: ?Sized + 'static>(&self) -> Option<ViewRouterType<P>> {
        let capability = CapabilityId::view::<P>();
        let router_type = self.resolve(&capability)?;
        let cast = router_type.view_cast::<P>();
        Some(ViewRouterType {
            router_type,
            capability,
            cast,
        })
    }

    /// Resolves the module capability `P`.
    #[must_use]
    pub fn module_router<P: ?Sized + 'static>(&self) -> Option<ModuleRouterType<P>> {
        let capability = CapabilityId::module::<P>();
        let router_type = self.resolve(&capability)?;
        let cast = router_type.module_cast::<P>();
        Some(ModuleRouterType {
            router_type,
            capability,
            cast,
        })
    }

    /// Returns the router registered for driver type `R`.
    #[must_use]
    pub fn router_type<R: RouteDriver>(&self) -> Option<RouterType> {
        self.inner
            .snapshot
            .load()
            .routers
            .get(&DriverId::of::<R>())
            .cloned()
    }

    /// Returns true if the capability has a binding, direct or adapter.
    #[must_use]
    pub fn contains(&self, capability: &CapabilityId) -> bool {
        self.inner.snapshot.load().bindings.contains_key(capability)
    }

    /// Returns the adaptee if `capability` is an adapter.
    #[must_use]
    pub fn adaptee(&self, capability: &CapabilityId) -> Option<CapabilityId> {
        match self.inner.snapshot.load().bindings.get(capability)? {
            Binding::Adapter(adaptee) => Some(adaptee.clone()),
            Binding::Router(_) => None,
        }
    }

    /// Routers registered for destination class `D`, in registration order.
    #[must_use]
    pub fn routers_for_destination<D: 'static>(&self) -> Vec<RouterType> {
        self.routers_for_class(&DestinationClass::of::<D>())
    }

    /// Routers registered for a destination class, in registration order.
    #[must_use]
    pub fn routers_for_class(&self, class: &DestinationClass) -> Vec<RouterType> {
        self.inner.snapshot.load().routers_for_class(class)
    }

    /// The router that manages an erased destination: the exclusive owner,
    /// or the first driver registered for its class.
    #[must_use]
    pub fn router_for_destination(&self, destination: &ErasedDestination) -> Option<RouterType> {
        self.routers_for_class(&DestinationClass::of_erased(destination))
            .into_iter()
            .next()
    }

    /// Returns true if `D` is exclusively bound.
    #[must_use]
    pub fn is_exclusive_destination<D: 'static>(&self) -> bool {
        self.inner
            .snapshot
            .load()
            .destinations
            .get(&DestinationClass::of::<D>())
            .is_some_and(|entry| entry.exclusive)
    }

    /// Number of capability bindings, adapters included.
    #[must_use]
    pub fn capability_count(&self) -> usize {
        self.inner.snapshot.load().bindings.len()
    }

    /// Checks the table for dangling adapters and drivers without a
    /// destination class.
    #[must_use]
    pub fn validate(&self) -> RegistryReport {
        let snapshot = self.inner.snapshot.load();

        let mut unresolved_adapters: Vec<CapabilityId> = snapshot
            .bindings
            .iter()
            .filter(|(_, binding)| matches!(binding, Binding::Adapter(_)))
            .filter(|(capability, _)| snapshot.terminal(capability).is_none())
            .map(|(capability, _)| capability.clone())
            .collect();
        unresolved_adapters.sort_by(|a, b| a.name().cmp(b.name()));

        let mut routers_without_destination: Vec<&'static str> = snapshot
            .routers
            .values()
            .filter(|router_type| !router_type.has_registered_destination())
            .map(RouterType::name)
            .collect();
        routers_without_destination.sort_unstable();

        RegistryReport {
            unresolved_adapters,
            routers_without_destination,
        }
    }
}

impl fmt::Debug for RouterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.inner.snapshot.load();
        f.debug_struct("RouterRegistry")
            .field("capabilities", &snapshot.bindings.len())
            .field("routers", &snapshot.routers.len())
            .field("finished", &self.is_registration_finished())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// DriverRegistrar
// ─────────────────────────────────────────────────────────────────────────────

/// Chained registration for one driver.
///
/// Each method registers immediately. The plain methods panic on a
/// [`RegistrationError`]; the `try_*` methods return it.
pub struct DriverRegistrar<'a, R: RouteDriver> {
    registry: &'a RouterRegistry,
    driver: Arc<dyn ErasedDriver>,
    _marker: PhantomData<fn() -> R>,
}

impl<'a, R: RouteDriver> DriverRegistrar<'a, R> {
    /// Binds the view capability `P`.
    pub fn try_view<P: ?Sized + 'static>(self) -> Result<Self, RegistrationError>
    where
        R: ProvidesView<P>,
    {
        let cast: ViewCast<P> = cast_view::<P, R>;
        self.registry
            .bind(CapabilityId::view::<P>(), &self.driver, Some(Arc::new(cast)))?;
        Ok(self)
    }

    /// Binds the view capability `P`. Panics on conflict.
    pub fn view<P: ?Sized + 'static>(self) -> Self
    where
        R: ProvidesView<P>,
    {
        self.try_view::<P>().unwrap_or_else(|err| panic!("{err}"))
    }

    /// Binds the module capability `P`.
    pub fn try_module<P: ?Sized + 'static>(self) -> Result<Self, RegistrationError>
    where
        R: ProvidesModule<P>,
    {
        let cast: ModuleCast<P> = cast_module::<P, R>;
        self.registry
            .bind(CapabilityId::module::<P>(), &self.driver, Some(Arc::new(cast)))?;
        Ok(self)
    }

    /// Binds the module capability `P`. Panics on conflict.
    pub fn module<P: ?Sized + 'static>(self) -> Self
    where
        R: ProvidesModule<P>,
    {
        self.try_module::<P>().unwrap_or_else(|err| panic!("{err}"))
    }

    /// Binds a string identifier.
    pub fn try_identifier(
        self,
        kind: CapabilityKind,
        identifier: impl Into<Cow<'static, str>>,
    ) -> Result<Self, RegistrationError> {
        self.registry
            .bind(CapabilityId::identifier(kind, identifier), &self.driver, None)?;
        Ok(self)
    }

    /// Binds a string identifier. Panics on conflict.
    pub fn identifier(self, kind: CapabilityKind, identifier: impl Into<Cow<'static, str>>) -> Self {
        self.try_identifier(kind, identifier)
            .unwrap_or_else(|err| panic!("{err}"))
    }

    /// Declares typed access through `P` without binding it.
    ///
    /// Used when `P` is an adapter that resolves to this driver.
    pub fn try_conforms_to_view<P: ?Sized + 'static>(self) -> Result<Self, RegistrationError>
    where
        R: ProvidesView<P>,
    {
        let cast: ViewCast<P> = cast_view::<P, R>;
        self.registry
            .conform(CapabilityId::view::<P>(), &self.driver, Arc::new(cast))?;
        Ok(self)
    }

    /// Declares typed access through `P` without binding it. Panics when
    /// frozen.
    pub fn conforms_to_view<P: ?Sized + 'static>(self) -> Self
    where
        R: ProvidesView<P>,
    {
        self.try_conforms_to_view::<P>()
            .unwrap_or_else(|err| panic!("{err}"))
    }

    /// Declares typed module access through `P` without binding it.
    pub fn try_conforms_to_module<P: ?Sized + 'static>(self) -> Result<Self, RegistrationError>
    where
        R: ProvidesModule<P>,
    {
        let cast: ModuleCast<P> = cast_module::<P, R>;
        self.registry
            .conform(CapabilityId::module::<P>(), &self.driver, Arc::new(cast))?;
        Ok(self)
    }

    /// Declares typed module access through `P` without binding it. Panics
    /// when frozen.
    pub fn conforms_to_module<P: ?Sized + 'static>(self) -> Self
    where
        R: ProvidesModule<P>,
    {
        self.try_conforms_to_module::<P>()
            .unwrap_or_else(|err| panic!("{err}"))
    }

    /// Registers the driver's destination class.
    pub fn try_destination(self) -> Result<Self, RegistrationError> {
        self.registry.bind_destination(&self.driver, false)?;
        Ok(self)
    }

    /// Registers the driver's destination class. Panics on conflict.
    pub fn destination(self) -> Self {
        self.try_destination().unwrap_or_else(|err| panic!("{err}"))
    }

    /// Registers the driver's destination class exclusively.
    pub fn try_exclusive_destination(self) -> Result<Self, RegistrationError> {
        self.registry.bind_destination(&self.driver, true)?;
        Ok(self)
    }

    /// Registers the driver's destination class exclusively. Panics on
    /// conflict.
    pub fn exclusive_destination(self) -> Self {
        self.try_exclusive_destination()
            .unwrap_or_else(|err| panic!("{err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Detail: Send + Sync {}
    trait Legacy: Send + Sync {}
    trait Older: Send + Sync {}

    struct DetailScreen;
    impl Detail for DetailScreen {}

    #[derive(Default)]
    struct DetailRouter;

    impl RouteDriver for DetailRouter {
        type Destination = DetailScreen;
        type Module = ();

        fn make_destination(&self, _module: &()) -> Option<DetailScreen> {
            Some(DetailScreen)
        }
    }

    impl ProvidesView<dyn Detail> for DetailRouter {
        fn as_view(destination: Arc<DetailScreen>) -> Arc<dyn Detail> {
            destination
        }
    }

    #[derive(Default)]
    struct OtherRouter;

    impl RouteDriver for OtherRouter {
        type Destination = DetailScreen;
        type Module = ();

        fn make_destination(&self, _module: &()) -> Option<DetailScreen> {
            Some(DetailScreen)
        }
    }

    impl ProvidesView<dyn Detail> for OtherRouter {
        fn as_view(destination: Arc<DetailScreen>) -> Arc<dyn Detail> {
            destination
        }
    }

    #[test]
    fn resolve_direct_binding() {
        let registry = RouterRegistry::new();
        registry.register_view::<dyn Detail, DetailRouter>();

        let router_type = registry
            .resolve(&CapabilityId::view::<dyn Detail>())
            .expect("bound");
        assert_eq!(router_type.id(), DriverId::of::<DetailRouter>());
        assert_eq!(router_type.capabilities(), &[CapabilityId::view::<dyn Detail>()]);
    }

    #[test]
    fn same_binding_twice_is_idempotent() {
        let registry = RouterRegistry::new();
        registry.register_view::<dyn Detail, DetailRouter>();
        registry
            .try_register_view::<dyn Detail, DetailRouter>()
            .expect("idempotent");
        assert_eq!(registry.capability_count(), 1);
        assert_eq!(
            registry
                .router_type::<DetailRouter>()
                .expect("registered")
                .capabilities()
                .len(),
            1
        );
    }

    #[test]
    fn conflicting_binding_rejected() {
        let registry = RouterRegistry::new();
        registry.register_view::<dyn Detail, DetailRouter>();

        let err = registry
            .try_register_view::<dyn Detail, OtherRouter>()
            .expect_err("conflict");
        assert!(matches!(err, RegistrationError::CapabilityConflict { .. }));
        assert_eq!(
            registry
                .resolve(&CapabilityId::view::<dyn Detail>())
                .map(|r| r.id()),
            Some(DriverId::of::<DetailRouter>())
        );
    }

    #[test]
    #[should_panic(expected = "is already registered to")]
    fn conflicting_binding_panics() {
        let registry = RouterRegistry::new();
        registry.register_view::<dyn Detail, DetailRouter>();
        registry.register_view::<dyn Detail, OtherRouter>();
    }

    #[test]
    fn adapter_chain_resolves_to_terminal() {
        let registry = RouterRegistry::new();
        registry
            .register_view_adapter::<dyn Older, dyn Legacy>()
            .register_view_adapter::<dyn Legacy, dyn Detail>()
            .register_view::<dyn Detail, DetailRouter>();

        let direct = registry.resolve(&CapabilityId::view::<dyn Detail>());
        assert_eq!(registry.resolve(&CapabilityId::view::<dyn Older>()), direct);
        assert_eq!(
            registry.adaptee(&CapabilityId::view::<dyn Older>()),
            Some(CapabilityId::view::<dyn Legacy>())
        );
    }

    #[test]
    fn adapter_and_direct_binding_are_exclusive() {
        let registry = RouterRegistry::new();
        let alias = CapabilityId::identifier(CapabilityKind::View, "detail");
        registry.register_adapter(alias.clone(), CapabilityId::view::<dyn Detail>());

        let err = registry
            .try_register_identifier::<DetailRouter>(CapabilityKind::View, "detail")
            .expect_err("alias is an adapter");
        assert!(matches!(err, RegistrationError::CapabilityIsAdapter { .. }));

        registry.register_view::<dyn Detail, DetailRouter>();
        let err = registry
            .try_register_adapter(CapabilityId::view::<dyn Detail>(), CapabilityId::view::<dyn Legacy>())
            .expect_err("direct binding");
        assert!(matches!(err, RegistrationError::AdapterHasDirectBinding { .. }));
        assert_eq!(
            registry.resolve(&alias).map(|r| r.id()),
            Some(DriverId::of::<DetailRouter>())
        );
    }

    #[test]
    fn adapter_conflict_rejected() {
        let registry = RouterRegistry::new();
        registry.register_view_adapter::<dyn Older, dyn Legacy>();
        registry.register_view_adapter::<dyn Older, dyn Legacy>();

        let err = registry
            .try_register_adapter(CapabilityId::view::<dyn Older>(), CapabilityId::view::<dyn Detail>())
            .expect_err("conflict");
        assert!(matches!(err, RegistrationError::AdapterConflict { .. }));
    }

    #[test]
    fn two_step_cycle_rejected() {
        let registry = RouterRegistry::new();
        registry.register_view_adapter::<dyn Older, dyn Legacy>();
        let err = registry
            .try_register_adapter(CapabilityId::view::<dyn Legacy>(), CapabilityId::view::<dyn Older>())
            .expect_err("cycle");
        assert!(err.to_string().starts_with("adapter cycle:"));
        assert!(registry.adaptee(&CapabilityId::view::<dyn Legacy>()).is_none());
    }

    #[test]
    fn self_adapter_is_a_cycle() {
        let registry = RouterRegistry::new();
        let err = registry
            .try_register_adapter(CapabilityId::view::<dyn Legacy>(), CapabilityId::view::<dyn Legacy>())
            .expect_err("cycle");
        assert!(matches!(err, RegistrationError::AdapterCycle { ref chain } if chain.len() == 2));
        assert!(!registry.contains(&CapabilityId::view::<dyn Legacy>()));
    }

    #[test]
    fn kind_mismatch_rejected() {
        let registry = RouterRegistry::new();
        let err = registry
            .try_register_adapter(CapabilityId::view::<dyn Legacy>(), CapabilityId::module::<dyn Detail>())
            .expect_err("kind mismatch");
        assert!(matches!(err, RegistrationError::KindMismatch { .. }));
    }

    #[test]
    fn frozen_registry_rejects_and_keeps_table() {
        let registry = RouterRegistry::new();
        registry.register_view::<dyn Detail, DetailRouter>();
        registry.finish_registration();
        registry.finish_registration();

        let err = registry
            .try_register_adapter(CapabilityId::view::<dyn Legacy>(), CapabilityId::view::<dyn Detail>())
            .expect_err("frozen");
        assert!(matches!(err, RegistrationError::RegistrationFinished { .. }));
        assert_eq!(registry.capability_count(), 1);
        assert!(registry.is_registration_finished());
    }

    #[test]
    fn typed_lookup_casts_destination() {
        let registry = RouterRegistry::new();
        registry.register_view::<dyn Detail, DetailRouter>();

        let view_router = registry.view_router::<dyn Detail>().expect("bound");
        let destination: ErasedDestination = Arc::new(DetailScreen);
        assert!(view_router.view(&destination).is_some());

        let wrong: ErasedDestination = Arc::new(0_u8);
        assert!(view_router.view(&wrong).is_none());
    }

    #[test]
    fn adapter_typed_access_needs_conformance() {
        let registry = RouterRegistry::new();
        registry
            .register_view::<dyn Detail, DetailRouter>()
            .register_view_adapter::<dyn Legacy, dyn Detail>();

        let legacy = registry.view_router::<dyn Legacy>().expect("resolves");
        assert!(legacy.cast().is_none());
        assert_eq!(legacy.router_type().id(), DriverId::of::<DetailRouter>());
    }

    #[test]
    fn exclusive_destination_blocks_others() {
        let registry = RouterRegistry::new();
        registry.register_exclusive_destination::<DetailScreen, DetailRouter>();
        registry.register_destination::<DetailScreen, DetailRouter>();

        let err = registry
            .try_register_destination::<DetailScreen, OtherRouter>()
            .expect_err("exclusive");
        assert!(matches!(err, RegistrationError::ExclusiveDestination { .. }));
        assert_eq!(registry.routers_for_destination::<DetailScreen>().len(), 1);
        assert!(registry.is_exclusive_destination::<DetailScreen>());
    }

    #[test]
    fn exclusive_after_shared_rejected() {
        let registry = RouterRegistry::new();
        registry.register_destination::<DetailScreen, OtherRouter>();

        let err = registry
            .try_register_exclusive_destination::<DetailScreen, DetailRouter>()
            .expect_err("shared");
        assert!(matches!(
            err,
            RegistrationError::DestinationShared { ref routers, .. } if routers.len() == 1
        ));
    }

    #[test]
    fn shared_destination_keeps_order() {
        let registry = RouterRegistry::new();
        registry
            .register_destination::<DetailScreen, OtherRouter>()
            .register_destination::<DetailScreen, DetailRouter>();

        let ids: Vec<DriverId> = registry
            .routers_for_destination::<DetailScreen>()
            .iter()
            .map(RouterType::id)
            .collect();
        assert_eq!(ids, vec![DriverId::of::<OtherRouter>(), DriverId::of::<DetailRouter>()]);

        let destination: ErasedDestination = Arc::new(DetailScreen);
        assert_eq!(
            registry.router_for_destination(&destination).map(|r| r.id()),
            Some(DriverId::of::<OtherRouter>())
        );
    }

    #[test]
    fn validate_reports_dangling_adapters_and_missing_destinations() {
        let registry = RouterRegistry::new();
        registry
            .register_view::<dyn Detail, DetailRouter>()
            .register_view_adapter::<dyn Older, dyn Legacy>();

        let report = registry.validate();
        assert_eq!(report.unresolved_adapters, vec![CapabilityId::view::<dyn Older>()]);
        assert_eq!(report.routers_without_destination.len(), 1);
        assert!(!report.is_clean());

        registry
            .register_destination::<DetailScreen, DetailRouter>()
            .register_view_adapter::<dyn Legacy, dyn Detail>();
        assert!(registry.validate().is_clean());
    }

    #[test]
    fn identifier_binding() {
        let registry = RouterRegistry::new();
        registry.register_identifier::<DetailRouter>(CapabilityKind::View, "app://detail");

        let found = registry.resolve(&CapabilityId::identifier(CapabilityKind::View, "app://detail"));
        assert_eq!(found.map(|r| r.id()), Some(DriverId::of::<DetailRouter>()));
        assert!(
            registry
                .resolve(&CapabilityId::identifier(CapabilityKind::Module, "app://detail"))
                .is_none()
        );
    }

    #[test]
    fn clones_share_state() {
        let registry = RouterRegistry::new();
        let handle = registry.clone();
        handle.register_view::<dyn Detail, DetailRouter>();
        assert!(registry.ptr_eq(&handle));
        assert!(registry.contains(&CapabilityId::view::<dyn Detail>()));
    }
}
