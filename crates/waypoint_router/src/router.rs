//! The per-route state machine.
//!
//! A [`Router`] drives one destination through
//! `Unrouted → Routing → Routed → Removing → Removed`. A failed perform moves
//! to `RouteFailed` and may be retried; a fatal executor failure moves to
//! `Invalidated` for good.
//!
//! Every action follows the same shape: check and claim the transition under
//! the state lock, release the lock, call out to the driver and executor, then
//! record the outcome under the lock again. Callbacks and hooks always run with
//! the lock released.

use core::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::config::{RemoveConfig, RouteConfig};
use crate::driver::{ErasedDestination, ErasedModule};
use crate::error::{RouteAction, RouteError};
use crate::executor::{DismissRequest, PresentRequest, PresentationExecutor};
use crate::handler;
use crate::hooks::{RouteEvent, RouteHooks};
use crate::registry::RouterType;
use crate::route::{RealRouteType, RemoveAction, RouteType};
use crate::source::{RouteSource, SourceContext, SourceRef};

// ─────────────────────────────────────────────────────────────────────────────
// RouterState
// ─────────────────────────────────────────────────────────────────────────────

/// Lifecycle state of a [`Router`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouterState {
    /// Created, nothing performed yet.
    Unrouted,
    /// A perform is in flight.
    Routing,
    /// The destination is active.
    Routed,
    /// A remove is in flight.
    Removing,
    /// The destination was removed. The router may perform again.
    Removed,
    /// The last perform failed. The router may perform again.
    RouteFailed,
    /// A fatal failure left the router unusable.
    Invalidated,
}

impl RouterState {
    /// Returns true if a perform may start from this state.
    #[must_use]
    pub fn can_begin_perform(self) -> bool {
        matches!(
            self,
            RouterState::Unrouted | RouterState::RouteFailed | RouterState::Removed
        )
    }

    /// Returns true while an action is in flight.
    #[must_use]
    pub fn is_busy(self) -> bool {
        matches!(self, RouterState::Routing | RouterState::Removing)
    }
}

impl fmt::Display for RouterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RouterState::Unrouted => "unrouted",
            RouterState::Routing => "routing",
            RouterState::Routed => "routed",
            RouterState::Removing => "removing",
            RouterState::Removed => "removed",
            RouterState::RouteFailed => "route failed",
            RouterState::Invalidated => "invalidated",
        };
        f.write_str(name)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// RouterId / RouterInfo
// ─────────────────────────────────────────────────────────────────────────────

/// Process-unique router instance id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouterId(u64);

impl RouterId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw id.
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RouterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Snapshot of a router, handed to hooks and error handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterInfo {
    /// Instance id.
    pub id: RouterId,
    /// Driver type name.
    pub router: &'static str,
    /// State when the snapshot was taken.
    pub state: RouterState,
    /// Configured route type.
    pub route_type: RouteType,
    /// True for routers created around an externally shown destination.
    pub auto_created: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

/// Collaborators shared by every router a navigator creates.
#[derive(Clone)]
pub(crate) struct RouteEnv {
    pub(crate) executor: Arc<dyn PresentationExecutor>,
    pub(crate) hooks: RouteHooks,
}

struct RouterInner {
    state: RouterState,
    destination: Option<ErasedDestination>,
    presented: Option<ErasedDestination>,
    prepared: Option<ErasedDestination>,
    real_route_type: Option<RealRouteType>,
    routing_from_internal: bool,
}

struct Shared {
    id: RouterId,
    router_type: RouterType,
    env: RouteEnv,
    auto_created: bool,
    config: RouteConfig,
    remove_config: RemoveConfig,
    module: Box<ErasedModule>,
    inner: Mutex<RouterInner>,
}

/// One route: a destination and the transitions that show and hide it.
///
/// Cloning yields another handle to the same router.
#[derive(Clone)]
pub struct Router {
    shared: Arc<Shared>,
}

/// Outcome of the perform checks.
struct PerformPlan {
    source: Option<Arc<dyn RouteSource>>,
    context: Option<SourceContext>,
    real_route_type: Option<RealRouteType>,
}

/// Outcome of the remove checks.
struct RemovePlan {
    destination: ErasedDestination,
    presented: ErasedDestination,
    real_route_type: RealRouteType,
    action: RemoveAction,
}

impl Router {
    pub(crate) fn new(
        router_type: RouterType,
        env: RouteEnv,
        config: RouteConfig,
        remove_config: RemoveConfig,
        module: Box<ErasedModule>,
    ) -> Self {
        Self::build(
            router_type,
            env,
            config,
            remove_config,
            module,
            false,
            RouterInner {
                state: RouterState::Unrouted,
                destination: None,
                presented: None,
                prepared: None,
                real_route_type: None,
                routing_from_internal: false,
            },
        )
    }

    /// Creates an unrouted router holding an already prepared destination.
    pub(crate) fn with_prepared(
        router_type: RouterType,
        env: RouteEnv,
        config: RouteConfig,
        module: Box<ErasedModule>,
        destination: ErasedDestination,
    ) -> Self {
        Self::build(
            router_type,
            env,
            config,
            RemoveConfig::default(),
            module,
            false,
            RouterInner {
                state: RouterState::Unrouted,
                destination: None,
                presented: None,
                prepared: Some(destination),
                real_route_type: None,
                routing_from_internal: false,
            },
        )
    }

    /// Creates a routed router around a destination the toolkit showed.
    pub(crate) fn auto_created(
        router_type: RouterType,
        env: RouteEnv,
        config: RouteConfig,
        module: Box<ErasedModule>,
        destination: ErasedDestination,
        observed: RealRouteType,
    ) -> Self {
        Self::build(
            router_type,
            env,
            config,
            RemoveConfig::default(),
            module,
            true,
            RouterInner {
                state: RouterState::Routed,
                presented: Some(Arc::clone(&destination)),
                destination: Some(destination),
                prepared: None,
                real_route_type: Some(observed),
                routing_from_internal: false,
            },
        )
    }

    fn build(
        router_type: RouterType,
        env: RouteEnv,
        config: RouteConfig,
        remove_config: RemoveConfig,
        module: Box<ErasedModule>,
        auto_created: bool,
        inner: RouterInner,
    ) -> Self {
        let router = Self {
            shared: Arc::new(Shared {
                id: RouterId::next(),
                router_type,
                env,
                auto_created,
                config,
                remove_config,
                module,
                inner: Mutex::new(inner),
            }),
        };
        tracing::debug!(
            router = %router.id(),
            driver = router.name(),
            route_type = %router.route_type(),
            auto_created,
            "router created"
        );
        router
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Returns the instance id.
    #[must_use]
    pub fn id(&self) -> RouterId {
        self.shared.id
    }

    /// Returns the driver's type name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.shared.router_type.name()
    }

    /// Returns the router type this instance was created from.
    #[must_use]
    pub fn router_type(&self) -> &RouterType {
        &self.shared.router_type
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> RouterState {
        self.shared.inner.lock().state
    }

    /// Returns the configured route type.
    #[must_use]
    pub fn route_type(&self) -> RouteType {
        self.shared.config.route_type
    }

    /// Returns the route configuration.
    #[must_use]
    pub fn config(&self) -> &RouteConfig {
        &self.shared.config
    }

    /// Returns true if the router was created around an externally shown
    /// destination.
    #[must_use]
    pub fn is_auto_created(&self) -> bool {
        self.shared.auto_created
    }

    /// Returns the concrete style of the last successful perform.
    #[must_use]
    pub fn real_route_type(&self) -> Option<RealRouteType> {
        self.shared.inner.lock().real_route_type
    }

    /// Returns true while the router itself is driving a transition.
    #[must_use]
    pub fn is_routing_from_internal(&self) -> bool {
        self.shared.inner.lock().routing_from_internal
    }

    /// Returns the active destination.
    #[must_use]
    pub fn destination(&self) -> Option<ErasedDestination> {
        self.shared.inner.lock().destination.clone()
    }

    /// Returns the active destination as its concrete type.
    #[must_use]
    pub fn destination_as<D: Send + Sync + 'static>(&self) -> Option<Arc<D>> {
        self.destination()?.downcast::<D>().ok()
    }

    /// Returns a snapshot for hooks and logs.
    #[must_use]
    pub fn info(&self) -> RouterInfo {
        self.info_with(self.state())
    }

    fn info_with(&self, state: RouterState) -> RouterInfo {
        RouterInfo {
            id: self.id(),
            router: self.name(),
            state,
            route_type: self.route_type(),
            auto_created: self.shared.auto_created,
        }
    }

    fn executor(&self) -> &dyn PresentationExecutor {
        &*self.shared.env.executor
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Perform
    // ─────────────────────────────────────────────────────────────────────────

    /// Returns true if [`perform`](Self::perform) would pass its checks now.
    ///
    /// Does not change any state.
    #[must_use]
    pub fn can_perform(&self) -> bool {
        self.state().can_begin_perform() && self.plan_perform().is_ok()
    }

    fn plan_perform(&self) -> Result<PerformPlan, RouteError> {
        if !self.executor().is_ui_thread() {
            return Err(RouteError::NotOnUiThread);
        }

        let config = &self.shared.config;
        let route_type = config.route_type;
        if !self.shared.router_type.supports_route_type(route_type) {
            return Err(RouteError::UnsupportedRouteType {
                route_type,
                router: self.name(),
            });
        }

        if !route_type.requires_source() {
            return Ok(PerformPlan {
                source: config.source.as_ref().and_then(SourceRef::upgrade),
                context: None,
                real_route_type: None,
            });
        }

        let source = config
            .source
            .as_ref()
            .ok_or(RouteError::MissingSource { route_type })?
            .upgrade()
            .ok_or(RouteError::SourceUnavailable)?;
        let context = source.context();
        let real_route_type = context
            .resolve(route_type)
            .map_err(|reason| RouteError::RouteNotPossible { route_type, reason })?;

        Ok(PerformPlan {
            source: Some(source),
            context: Some(context),
            real_route_type,
        })
    }

    /// Performs the route.
    ///
    /// Makes and prepares the destination (or takes the one prepared
    /// earlier), then hands the transition to the executor. Exactly one
    /// outcome is reported through the configured handlers, the global
    /// error handler, and the route hooks.
    pub fn perform(&self) -> Result<(), RouteError> {
        self.ensure_ui_thread(RouteAction::Perform)?;
        let prepared = {
            let mut inner = self.shared.inner.lock();
            if !inner.state.can_begin_perform() {
                let state = inner.state;
                drop(inner);
                let error = RouteError::InvalidState {
                    action: RouteAction::Perform,
                    state,
                };
                self.report_failure(RouteAction::Perform, &error, state);
                return Err(error);
            }
            inner.state = RouterState::Routing;
            inner.routing_from_internal = true;
            inner.prepared.take()
        };

        match self.run_perform(prepared) {
            Ok((destination, presented, real_route_type)) => {
                self.finish_perform(destination, presented, real_route_type);
                Ok(())
            }
            Err((error, prepared)) => {
                let state = {
                    let mut inner = self.shared.inner.lock();
                    inner.state = if error.is_fatal() {
                        RouterState::Invalidated
                    } else {
                        RouterState::RouteFailed
                    };
                    inner.routing_from_internal = false;
                    if !error.is_fatal() {
                        inner.prepared = prepared;
                    }
                    inner.state
                };
                self.report_failure(RouteAction::Perform, &error, state);
                Err(error)
            }
        }
    }

    /// Runs a claimed perform. On failure, hands back a destination that
    /// was prepared before the perform so a retry can present it.
    fn run_perform(
        &self,
        prepared: Option<ErasedDestination>,
    ) -> Result<
        (ErasedDestination, ErasedDestination, Option<RealRouteType>),
        (RouteError, Option<ErasedDestination>),
    > {
        let plan = match self.plan_perform() {
            Ok(plan) => plan,
            Err(error) => return Err((error, prepared)),
        };

        let config = &self.shared.config;
        let driver = self.shared.router_type.driver();
        let module = &*self.shared.module;

        let (destination, was_prepared) = match prepared {
            Some(destination) => (destination, true),
            None => match driver.make_destination(module) {
                Some(destination) => (destination, false),
                None => {
                    return Err((
                        RouteError::MakeDestinationFailed { router: self.name() },
                        None,
                    ));
                }
            },
        };

        if !was_prepared {
            if let Some(prepare) = &config.prepare_destination {
                prepare(&destination);
            }
            driver.prepare_destination(&destination, module);
            driver.did_finish_prepare_destination(&destination, module);
        }

        self.shared.env.hooks.invoke(&RouteEvent::WillPerform {
            router: self.info_with(RouterState::Routing),
        });

        let retained = was_prepared.then(|| Arc::clone(&destination));
        let keep = |error: RouteError| (error, retained.clone());

        let Some(real_route_type) = plan.real_route_type else {
            tracing::debug!(router = %self.id(), "destination made without a transition");
            let presented = Arc::clone(&destination);
            return Ok((destination, presented, None));
        };

        let Some(source) = plan.source else {
            return Err(keep(RouteError::SourceUnavailable));
        };

        let presented = if real_route_type == RealRouteType::Custom {
            driver
                .perform_custom_route(&destination, &*source, config.animated)
                .map_err(|error| keep(error.into()))?;
            Arc::clone(&destination)
        } else {
            let presented = match &config.container_wrapper {
                Some(wrap) => wrap(Arc::clone(&destination)),
                None => Arc::clone(&destination),
            };
            let request = PresentRequest {
                presented: Arc::clone(&presented),
                destination: Arc::clone(&destination),
                route_type: config.route_type,
                real_route_type,
                source,
                context: plan.context.unwrap_or_default(),
                animated: config.animated,
            };
            self.executor()
                .present(&request)
                .map_err(|error| keep(error.into()))?;
            presented
        };

        Ok((destination, presented, Some(real_route_type)))
    }

    fn finish_perform(
        &self,
        destination: ErasedDestination,
        presented: ErasedDestination,
        real_route_type: Option<RealRouteType>,
    ) {
        {
            let mut inner = self.shared.inner.lock();
            inner.state = RouterState::Routed;
            inner.destination = Some(Arc::clone(&destination));
            inner.presented = Some(presented);
            inner.real_route_type = real_route_type;
            inner.routing_from_internal = false;
        }

        tracing::debug!(
            router = %self.id(),
            driver = self.name(),
            real_route_type = ?real_route_type,
            "route performed"
        );

        let config = &self.shared.config;
        if let Some(success) = &config.success_handler {
            success(&destination);
        }
        self.shared.env.hooks.invoke(&RouteEvent::DidPerform {
            router: self.info_with(RouterState::Routed),
            real_route_type,
        });
        if let Some(completion) = &config.completion_handler {
            completion(Ok(&destination), RouteAction::Perform);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Remove
    // ─────────────────────────────────────────────────────────────────────────

    /// Returns true if [`remove`](Self::remove) would pass its checks now.
    ///
    /// Does not change any state.
    #[must_use]
    pub fn can_remove(&self) -> bool {
        let snapshot = {
            let inner = self.shared.inner.lock();
            if inner.state != RouterState::Routed {
                return false;
            }
            (
                inner.destination.clone(),
                inner.presented.clone(),
                inner.real_route_type,
            )
        };
        self.plan_remove(snapshot).is_ok()
    }

    /// Returns the reverse action a remove would use, if any.
    #[must_use]
    pub fn remove_action(&self) -> Option<RemoveAction> {
        let (destination, real_route_type) = {
            let inner = self.shared.inner.lock();
            (inner.destination.clone()?, inner.real_route_type?)
        };
        let driver = self.shared.router_type.driver();
        real_route_type.remove_action(driver.can_remove_custom_route(&destination))
    }

    fn plan_remove(
        &self,
        (destination, presented, real_route_type): (
            Option<ErasedDestination>,
            Option<ErasedDestination>,
            Option<RealRouteType>,
        ),
    ) -> Result<RemovePlan, RouteError> {
        if !self.executor().is_ui_thread() {
            return Err(RouteError::NotOnUiThread);
        }

        let destination = destination.ok_or(RouteError::DestinationUnavailable)?;
        if !self.executor().is_destination_alive(&destination) {
            return Err(RouteError::DestinationUnavailable);
        }

        let real_route_type = real_route_type.ok_or(RouteError::CannotRemove {
            reason: "the destination was made without a transition",
        })?;

        let driver = self.shared.router_type.driver();
        let action = real_route_type
            .remove_action(driver.can_remove_custom_route(&destination))
            .ok_or(RouteError::CannotRemove {
                reason: "the reverse transition cannot be determined",
            })?;

        if self.shared.auto_created && !real_route_type.reversible_without_observation() {
            return Err(RouteError::CannotRemove {
                reason: "the router did not observe the forward transition",
            });
        }

        Ok(RemovePlan {
            presented: presented.unwrap_or_else(|| Arc::clone(&destination)),
            destination,
            real_route_type,
            action,
        })
    }

    /// Removes the route by reversing the recorded transition.
    pub fn remove(&self) -> Result<(), RouteError> {
        self.ensure_ui_thread(RouteAction::Remove)?;
        let snapshot = {
            let mut inner = self.shared.inner.lock();
            if inner.state != RouterState::Routed {
                let state = inner.state;
                drop(inner);
                let error = RouteError::InvalidState {
                    action: RouteAction::Remove,
                    state,
                };
                self.report_failure(RouteAction::Remove, &error, state);
                return Err(error);
            }
            inner.state = RouterState::Removing;
            inner.routing_from_internal = true;
            (
                inner.destination.clone(),
                inner.presented.clone(),
                inner.real_route_type,
            )
        };

        match self.run_remove(snapshot) {
            Ok(destination) => {
                self.finish_remove(&destination);
                Ok(())
            }
            Err(error) => {
                let state = {
                    let mut inner = self.shared.inner.lock();
                    inner.state = if error.is_fatal() {
                        RouterState::Invalidated
                    } else {
                        RouterState::Routed
                    };
                    inner.routing_from_internal = false;
                    inner.state
                };
                self.report_failure(RouteAction::Remove, &error, state);
                Err(error)
            }
        }
    }

    fn run_remove(
        &self,
        snapshot: (
            Option<ErasedDestination>,
            Option<ErasedDestination>,
            Option<RealRouteType>,
        ),
    ) -> Result<ErasedDestination, RouteError> {
        let plan = self.plan_remove(snapshot)?;

        let remove_config = &self.shared.remove_config;
        self.shared.env.hooks.invoke(&RouteEvent::WillRemove {
            router: self.info_with(RouterState::Removing),
            action: plan.action,
        });
        if let Some(prepare) = &remove_config.prepare_destination {
            prepare(&plan.destination);
        }

        if plan.action == RemoveAction::RemoveCustom {
            self.shared
                .router_type
                .driver()
                .remove_custom_route(&plan.destination, remove_config.animated)?;
        } else {
            let request = DismissRequest {
                presented: plan.presented,
                destination: Arc::clone(&plan.destination),
                action: plan.action,
                real_route_type: plan.real_route_type,
                source: self
                    .shared
                    .config
                    .source
                    .as_ref()
                    .and_then(SourceRef::upgrade),
                animated: remove_config.animated,
            };
            self.executor().dismiss(&request)?;
        }

        Ok(plan.destination)
    }

    fn finish_remove(&self, destination: &ErasedDestination) {
        {
            let mut inner = self.shared.inner.lock();
            inner.state = RouterState::Removed;
            inner.destination = None;
            inner.presented = None;
            inner.routing_from_internal = false;
        }

        tracing::debug!(router = %self.id(), driver = self.name(), "route removed");

        let remove_config = &self.shared.remove_config;
        if let Some(success) = &remove_config.success_handler {
            success(destination);
        }
        self.shared.env.hooks.invoke(&RouteEvent::DidRemove {
            router: self.info_with(RouterState::Removed),
        });
        if let Some(completion) = &remove_config.completion_handler {
            completion(Ok(destination), RouteAction::Remove);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Failure reporting
    // ─────────────────────────────────────────────────────────────────────────

    /// Rejects an action started off the UI thread without touching the
    /// state.
    fn ensure_ui_thread(&self, action: RouteAction) -> Result<(), RouteError> {
        if self.executor().is_ui_thread() {
            return Ok(());
        }
        tracing::error!(router = %self.id(), %action, "called off the UI thread");
        let error = RouteError::NotOnUiThread;
        self.report_failure(action, &error, self.state());
        Err(error)
    }

    fn report_failure(&self, action: RouteAction, error: &RouteError, state: RouterState) {
        let info = self.info_with(state);
        if error.is_precondition() {
            tracing::warn!(router = %info.id, driver = info.router, %action, %error, "route rejected");
        } else {
            tracing::error!(router = %info.id, driver = info.router, %action, %error, "route failed");
        }

        let (error_handler, completion_handler) = match action {
            RouteAction::Remove => (
                self.shared.remove_config.error_handler.as_ref(),
                self.shared.remove_config.completion_handler.as_ref(),
            ),
            _ => (
                self.shared.config.error_handler.as_ref(),
                self.shared.config.completion_handler.as_ref(),
            ),
        };

        if let Some(on_error) = error_handler {
            on_error(action, error);
        }
        handler::report(Some(&info), action, error);
        self.shared.env.hooks.invoke(&RouteEvent::Error {
            router: Some(info),
            action,
            error: error.clone(),
        });
        if let Some(completion) = completion_handler {
            completion(Err(error), action);
        }
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("id", &self.id())
            .field("driver", &self.name())
            .field("state", &self.state())
            .field("route_type", &self.route_type())
            .field("auto_created", &self.shared.auto_created)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PresentationError;
    use crate::registry::RouterRegistry;
    use crate::source::RoutePath;
    use crate::driver::RouteDriver;
    use std::sync::atomic::{AtomicBool, AtomicUsize};

    struct Screen;

    #[derive(Default)]
    struct ScreenRouter;

    impl RouteDriver for ScreenRouter {
        type Destination = Screen;
        type Module = ();

        fn make_destination(&self, _module: &()) -> Option<Screen> {
            Some(Screen)
        }
    }

    #[derive(Default)]
    struct Executor {
        presents: AtomicUsize,
        dismisses: AtomicUsize,
        fail_next: AtomicBool,
    }

    impl PresentationExecutor for Executor {
        fn present(&self, _request: &PresentRequest) -> Result<(), PresentationError> {
            self.presents.fetch_add(1, Ordering::SeqCst);
            if self.fail_next.swap(false, Ordering::SeqCst) {
                return Err(PresentationError::failed("busy"));
            }
            Ok(())
        }

        fn dismiss(&self, _request: &DismissRequest) -> Result<(), PresentationError> {
            self.dismisses.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Source(SourceContext);

    impl RouteSource for Source {
        fn context(&self) -> SourceContext {
            self.0
        }
    }

    fn router(executor: &Arc<Executor>, config: RouteConfig) -> Router {
        let registry = RouterRegistry::new();
        registry.register_destination::<Screen, ScreenRouter>();
        let router_type = registry.router_type::<ScreenRouter>().expect("registered");
        let env = RouteEnv {
            executor: Arc::clone(executor) as Arc<dyn PresentationExecutor>,
            hooks: RouteHooks::new(),
        };
        Router::new(router_type, env, config, RemoveConfig::default(), Box::new(()))
    }

    #[test]
    fn state_display_is_lowercase() {
        assert_eq!(RouterState::RouteFailed.to_string(), "route failed");
        assert!(RouterState::Removed.can_begin_perform());
        assert!(!RouterState::Invalidated.can_begin_perform());
    }

    #[test]
    fn perform_then_remove() {
        let executor = Arc::new(Executor::default());
        let source = Arc::new(Source(SourceContext::navigation()));
        let router = router(&executor, RoutePath::push_from(&source).into());

        assert!(router.can_perform());
        router.perform().expect("perform");
        assert_eq!(router.state(), RouterState::Routed);
        assert_eq!(router.real_route_type(), Some(RealRouteType::Push));
        assert_eq!(router.remove_action(), Some(RemoveAction::Pop));
        assert!(router.destination_as::<Screen>().is_some());

        router.remove().expect("remove");
        assert_eq!(router.state(), RouterState::Removed);
        assert!(router.destination().is_none());
        assert_eq!(executor.presents.load(Ordering::SeqCst), 1);
        assert_eq!(executor.dismisses.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_perform_can_retry() {
        let executor = Arc::new(Executor::default());
        executor.fail_next.store(true, Ordering::SeqCst);
        let source = Arc::new(Source(SourceContext::default()));
        let router = router(&executor, RoutePath::present_modally_from(&source).into());

        assert!(router.perform().is_err());
        assert_eq!(router.state(), RouterState::RouteFailed);
        assert!(router.destination().is_none());

        router.perform().expect("retry");
        assert_eq!(router.state(), RouterState::Routed);
    }

    #[test]
    fn perform_while_routed_is_rejected() {
        let executor = Arc::new(Executor::default());
        let source = Arc::new(Source(SourceContext::default()));
        let router = router(&executor, RoutePath::present_modally_from(&source).into());
        router.perform().expect("perform");

        let err = router.perform().expect_err("already routed");
        assert_eq!(
            err,
            RouteError::InvalidState {
                action: RouteAction::Perform,
                state: RouterState::Routed
            }
        );
        assert_eq!(router.state(), RouterState::Routed);
        assert_eq!(executor.presents.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dead_source_fails_before_executor() {
        let executor = Arc::new(Executor::default());
        let source = Arc::new(Source(SourceContext::default()));
        let config = RouteConfig::from(RoutePath::new(
            SourceRef::new(&source),
            RouteType::PresentModally,
        ));
        let router = router(&executor, config);
        drop(source);

        assert!(!router.can_perform());
        assert_eq!(router.perform(), Err(RouteError::SourceUnavailable));
        assert_eq!(executor.presents.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn make_destination_cannot_be_removed() {
        let executor = Arc::new(Executor::default());
        let router = router(&executor, RoutePath::make_destination().into());

        router.perform().expect("make");
        assert_eq!(router.state(), RouterState::Routed);
        assert!(router.real_route_type().is_none());
        assert!(!router.can_remove());
        assert!(matches!(router.remove(), Err(RouteError::CannotRemove { .. })));
        assert_eq!(router.state(), RouterState::Routed);
        assert_eq!(executor.presents.load(Ordering::SeqCst), 0);
    }
}
