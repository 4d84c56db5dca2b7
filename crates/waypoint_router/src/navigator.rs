//! Entry points for performing routes.
//!
//! [`Navigator`] ties a [`RouterRegistry`] to a presentation executor and the
//! route hooks. The routing plugin inserts one as a global once registration
//! is finished; tests build their own.
//!
//! ```ignore
//! let navigator = server.get_global::<Navigator>().unwrap();
//!
//! let router = navigator.perform_view::<dyn DetailInput>(
//!     RoutePath::push_from(&screen),
//!     |config| {
//!         config.prepare_destination(|detail| detail.show_item(42));
//!     },
//! )?;
//!
//! router.remove()?;
//! ```

use core::fmt;
use std::sync::Arc;

use waypoint_system::resource::GlobalResource;

use crate::capability::{CapabilityId, DestinationClass};
use crate::config::{CompletionHandler, RemoveConfig, RouteConfig, ViewConfig};
use crate::driver::ErasedDestination;
use crate::error::{RouteAction, RouteError};
use crate::executor::PresentationExecutor;
use crate::handler;
use crate::hooks::{RouteEvent, RouteHooks};
use crate::registry::{RouterRegistry, RouterType};
use crate::route::{RealRouteType, RouteType};
use crate::router::{RouteEnv, Router};
use crate::source::{RoutePath, SourceRef};

/// Result of [`Navigator::auto_create`].
#[derive(Debug)]
pub enum AutoCreateOutcome {
    /// A router now manages the destination.
    Managed(Router),
    /// No router is registered for the destination's class.
    Unmanaged,
}

impl AutoCreateOutcome {
    /// Returns the router, if one was created.
    #[must_use]
    pub fn router(self) -> Option<Router> {
        match self {
            AutoCreateOutcome::Managed(router) => Some(router),
            AutoCreateOutcome::Unmanaged => None,
        }
    }
}

/// Resolves capabilities and creates routers bound to one executor.
///
/// Cloning yields another handle sharing the registry, executor and hooks.
#[derive(Clone)]
pub struct Navigator {
    registry: RouterRegistry,
    env: RouteEnv,
}

impl GlobalResource for Navigator {}

impl Navigator {
    /// Creates a navigator with an empty hook table.
    #[must_use]
    pub fn new(registry: RouterRegistry, executor: Arc<dyn PresentationExecutor>) -> Self {
        Self {
            registry,
            env: RouteEnv {
                executor,
                hooks: RouteHooks::new(),
            },
        }
    }

    /// Uses `hooks` for every router this navigator creates.
    #[must_use]
    pub fn with_hooks(mut self, hooks: RouteHooks) -> Self {
        self.env.hooks = hooks;
        self
    }

    /// Returns the registry.
    #[must_use]
    pub fn registry(&self) -> &RouterRegistry {
        &self.registry
    }

    /// Returns the hook table.
    #[must_use]
    pub fn hooks(&self) -> &RouteHooks {
        &self.env.hooks
    }

    /// Reports a failure that happened before any router existed.
    fn reject(&self, action: RouteAction, error: RouteError) -> RouteError {
        tracing::warn!(%action, %error, "route rejected");
        handler::report(None, action, &error);
        self.env.hooks.invoke(&RouteEvent::Error {
            router: None,
            action,
            error: error.clone(),
        });
        error
    }

    fn resolve(&self, capability: &CapabilityId) -> Result<RouterType, RouteError> {
        self.registry.resolve(capability).ok_or_else(|| {
            self.reject(
                RouteAction::Resolve,
                RouteError::NotRegistered {
                    capability: capability.clone(),
                },
            )
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Routers
    // ─────────────────────────────────────────────────────────────────────────

    /// Creates an unrouted router for `router_type`.
    #[must_use]
    pub fn router(&self, router_type: &RouterType, path: RoutePath) -> Router {
        self.router_with(router_type, path, |_, _| {})
    }

    /// Creates an unrouted router, configuring perform and remove.
    pub fn router_with(
        &self,
        router_type: &RouterType,
        path: RoutePath,
        configure: impl FnOnce(&mut RouteConfig, &mut RemoveConfig),
    ) -> Router {
        let mut config = RouteConfig::from(path);
        let mut remove_config = RemoveConfig::default();
        configure(&mut config, &mut remove_config);
        Router::new(
            router_type.clone(),
            self.env.clone(),
            config,
            remove_config,
            router_type.driver().new_module(),
        )
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Perform by capability
    // ─────────────────────────────────────────────────────────────────────────

    /// Resolves `capability` and performs a route along `path`.
    ///
    /// Returns the routed router. Resolution failures are reported to the
    /// global error handler and the error hooks; the configure closure never
    /// runs for them.
    pub fn perform(&self, capability: &CapabilityId, path: RoutePath) -> Result<Router, RouteError> {
        self.perform_with_removing(capability, path, |_, _| {})
    }

    /// Like [`perform`](Self::perform), configuring the route first.
    pub fn perform_with(
        &self,
        capability: &CapabilityId,
        path: RoutePath,
        configure: impl FnOnce(&mut RouteConfig),
    ) -> Result<Router, RouteError> {
        self.perform_with_removing(capability, path, |config, _| configure(config))
    }

    /// Like [`perform`](Self::perform), configuring both perform and remove.
    pub fn perform_with_removing(
        &self,
        capability: &CapabilityId,
        path: RoutePath,
        configure: impl FnOnce(&mut RouteConfig, &mut RemoveConfig),
    ) -> Result<Router, RouteError> {
        let router_type = self.resolve(capability)?;
        let router = self.router_with(&router_type, path, configure);
        router.perform()?;
        Ok(router)
    }

    /// Like [`perform`](Self::perform), with a completion callback.
    pub fn perform_with_completion(
        &self,
        capability: &CapabilityId,
        path: RoutePath,
        completion: impl Fn(Result<&ErasedDestination, &RouteError>, RouteAction) + Send + Sync + 'static,
    ) -> Result<Router, RouteError> {
        let completion: CompletionHandler = Arc::new(completion);
        self.perform_with(capability, path, move |config| {
            config.completion_handler = Some(completion);
        })
    }

    /// Performs a route through the view capability `P`.
    ///
    /// The configure closure sees the destination as `P`.
    pub fn perform_view<P: ?Sized + 'static>(
        &self,
        path: RoutePath,
        configure: impl FnOnce(&mut ViewConfig<'_, P>),
    ) -> Result<Router, RouteError> {
        let router = self.view_route::<P>(path, configure)?;
        router.perform()?;
        Ok(router)
    }

    fn view_route<P: ?Sized + 'static>(
        &self,
        path: RoutePath,
        configure: impl FnOnce(&mut ViewConfig<'_, P>),
    ) -> Result<Router, RouteError> {
        let capability = CapabilityId::view::<P>();
        let view_router = self.registry.view_router::<P>().ok_or_else(|| {
            self.reject(
                RouteAction::Resolve,
                RouteError::NotRegistered {
                    capability: capability.clone(),
                },
            )
        })?;
        let Some(cast) = view_router.cast() else {
            return Err(self.reject(
                RouteAction::Resolve,
                RouteError::CapabilityNotProvided {
                    capability,
                    router: view_router.router_type().name(),
                },
            ));
        };

        let router_type = view_router.router_type();
        Ok(self.router_with(router_type, path, |config, _| {
            configure(&mut ViewConfig::new(config, cast));
        }))
    }

    /// Makes a destination through the view capability `P` without any
    /// transition.
    pub fn make_destination<P: ?Sized + 'static>(
        &self,
        configure: impl FnOnce(&mut ViewConfig<'_, P>),
    ) -> Result<Arc<P>, RouteError> {
        let capability = CapabilityId::view::<P>();
        let router = self.view_route::<P>(RoutePath::make_destination(), configure)?;
        router.perform()?;

        let view_router = self.registry.view_router::<P>();
        router
            .destination()
            .and_then(|destination| view_router?.view(&destination))
            .ok_or_else(|| {
                self.reject(
                    RouteAction::Perform,
                    RouteError::CapabilityNotProvided {
                        capability,
                        router: router.name(),
                    },
                )
            })
    }

    /// Performs a route through the module capability `P`.
    ///
    /// The configure closure fills in the driver's module through `P`
    /// before the destination is made.
    pub fn perform_module<P: ?Sized + 'static>(
        &self,
        path: RoutePath,
        configure: impl FnOnce(&mut RouteConfig, &mut P),
    ) -> Result<Router, RouteError> {
        let capability = CapabilityId::module::<P>();
        let module_router = self.registry.module_router::<P>().ok_or_else(|| {
            self.reject(
                RouteAction::Resolve,
                RouteError::NotRegistered {
                    capability: capability.clone(),
                },
            )
        })?;
        let router_type = module_router.router_type();
        let not_provided = || RouteError::CapabilityNotProvided {
            capability: capability.clone(),
            router: router_type.name(),
        };

        let Some(cast) = module_router.cast() else {
            return Err(self.reject(RouteAction::Resolve, not_provided()));
        };
        let mut module = router_type.driver().new_module();
        let mut config = RouteConfig::from(path);
        match cast(&mut *module) {
            Some(typed) => configure(&mut config, typed),
            None => return Err(self.reject(RouteAction::Resolve, not_provided())),
        }

        let router = Router::new(
            router_type.clone(),
            self.env.clone(),
            config,
            RemoveConfig::default(),
            module,
        );
        router.perform()?;
        Ok(router)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Existing destinations
    // ─────────────────────────────────────────────────────────────────────────

    fn check_destination(
        &self,
        router_type: &RouterType,
        destination: &ErasedDestination,
        action: RouteAction,
    ) -> Result<(), RouteError> {
        let class = DestinationClass::of_erased(destination);
        if class == router_type.destination_class() && router_type.has_registered_destination() {
            return Ok(());
        }
        Err(self.reject(
            action,
            RouteError::DestinationMismatch {
                router: router_type.name(),
                destination: class,
            },
        ))
    }

    /// Prepares an externally created destination and returns an unrouted
    /// router holding it.
    ///
    /// A later [`Router::perform`] presents this destination instead of
    /// making a new one.
    pub fn prepare_destination(
        &self,
        router_type: &RouterType,
        destination: ErasedDestination,
        path: RoutePath,
        configure: impl FnOnce(&mut RouteConfig),
    ) -> Result<Router, RouteError> {
        self.check_destination(router_type, &destination, RouteAction::PrepareDestination)?;

        let mut config = RouteConfig::from(path);
        configure(&mut config);

        let driver = router_type.driver();
        let module = driver.new_module();
        if let Some(prepare) = &config.prepare_destination {
            prepare(&destination);
        }
        driver.prepare_destination(&destination, &*module);
        driver.did_finish_prepare_destination(&destination, &*module);

        Ok(Router::with_prepared(
            router_type.clone(),
            self.env.clone(),
            config,
            module,
            destination,
        ))
    }

    /// Performs a route on a destination made earlier.
    pub fn perform_on_destination(
        &self,
        router_type: &RouterType,
        destination: ErasedDestination,
        path: RoutePath,
        configure: impl FnOnce(&mut RouteConfig),
    ) -> Result<Router, RouteError> {
        let router = self.prepare_destination(router_type, destination, path, configure)?;
        router.perform()?;
        Ok(router)
    }

    /// Wraps a destination the toolkit showed on its own in a routed router.
    ///
    /// `observed` is the transition the toolkit used. The router is created
    /// with `auto_created = true` and can only remove transitions it can
    /// reverse without having performed them.
    ///
    /// # Panics
    ///
    /// In debug builds, panics when the driver reports the destination as
    /// unprepared and no source is alive to prepare it. Release builds log
    /// the problem and continue.
    pub fn auto_create(
        &self,
        destination: ErasedDestination,
        source: Option<SourceRef>,
        observed: RealRouteType,
    ) -> AutoCreateOutcome {
        let Some(router_type) = self.registry.router_for_destination(&destination) else {
            tracing::debug!(
                destination = DestinationClass::of_erased(&destination).type_name(),
                "no router for externally shown destination"
            );
            return AutoCreateOutcome::Unmanaged;
        };

        let driver = router_type.driver();
        let mut module = driver.new_module();
        if !driver.destination_from_external_prepared(&destination) {
            match source.as_ref().and_then(SourceRef::upgrade) {
                Some(source) => source.prepare_destination_from_external(&destination, &mut *module),
                None => {
                    let message = format!(
                        "destination of `{}` needs preparation but no source was found",
                        router_type.name()
                    );
                    if cfg!(debug_assertions) {
                        panic!("{message}");
                    }
                    tracing::error!(driver = router_type.name(), "{message}");
                }
            }
        }
        driver.prepare_destination(&destination, &*module);
        driver.did_finish_prepare_destination(&destination, &*module);

        let config = RouteConfig {
            source,
            route_type: observed_route_type(observed),
            ..RouteConfig::default()
        };
        AutoCreateOutcome::Managed(Router::auto_created(
            router_type,
            self.env.clone(),
            config,
            module,
            destination,
            observed,
        ))
    }
}

fn observed_route_type(observed: RealRouteType) -> RouteType {
    match observed {
        RealRouteType::Unknown => RouteType::PerformSegue,
        RealRouteType::Push => RouteType::Push,
        RealRouteType::PresentModally => RouteType::PresentModally,
        RealRouteType::PresentAsPopover => RouteType::PresentAsPopover,
        RealRouteType::AddAsChild => RouteType::AddAsChildViewController,
        RealRouteType::AddAsSubview => RouteType::AddAsSubview,
        RealRouteType::Custom => RouteType::Custom,
    }
}

impl fmt::Debug for Navigator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Navigator")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
