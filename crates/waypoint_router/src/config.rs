//! Per-route configuration.
//!
//! A [`RouteConfig`] is built fresh for every perform through a configure
//! closure; a smaller [`RemoveConfig`] drives removal. Callbacks are stored as
//! `Arc`s so a router can hand them out without holding its lock.

use core::ops::{Deref, DerefMut};
use std::sync::Arc;

use crate::driver::{ErasedDestination, ErasedModule};
use crate::error::{RouteAction, RouteError};
use crate::route::RouteType;
use crate::source::{RoutePath, SourceRef};

/// Callback receiving the destination.
pub type DestinationHandler = Arc<dyn Fn(&ErasedDestination) + Send + Sync>;

/// Callback receiving a failure.
pub type ErrorHandler = Arc<dyn Fn(RouteAction, &RouteError) + Send + Sync>;

/// Callback receiving the outcome of an action.
pub type CompletionHandler =
    Arc<dyn Fn(Result<&ErasedDestination, &RouteError>, RouteAction) + Send + Sync>;

/// Wraps the destination in a container before presentation.
pub type ContainerWrapper = Arc<dyn Fn(ErasedDestination) -> ErasedDestination + Send + Sync>;

// ─────────────────────────────────────────────────────────────────────────────
// RouteConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration of one perform.
#[derive(Clone)]
pub struct RouteConfig {
    /// The initiating source. Only `MakeDestination` may omit it.
    pub source: Option<SourceRef>,
    /// The requested transition.
    pub route_type: RouteType,
    /// Whether the executor should animate.
    pub animated: bool,
    /// Called with the destination before the driver prepares it.
    pub prepare_destination: Option<DestinationHandler>,
    /// Called once the route is performed.
    pub success_handler: Option<DestinationHandler>,
    /// Called when an action fails.
    pub error_handler: Option<ErrorHandler>,
    /// Called after every action with its outcome.
    pub completion_handler: Option<CompletionHandler>,
    /// Produces the object the executor presents.
    pub container_wrapper: Option<ContainerWrapper>,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            source: None,
            route_type: RouteType::default(),
            animated: true,
            prepare_destination: None,
            success_handler: None,
            error_handler: None,
            completion_handler: None,
            container_wrapper: None,
        }
    }
}

impl From<RoutePath> for RouteConfig {
    fn from(path: RoutePath) -> Self {
        Self {
            source: path.source,
            route_type: path.route_type,
            ..Self::default()
        }
    }
}

impl RouteConfig {
    /// Sets the destination preparation callback.
    pub fn on_prepare(&mut self, f: impl Fn(&ErasedDestination) + Send + Sync + 'static) -> &mut Self {
        self.prepare_destination = Some(Arc::new(f));
        self
    }

    /// Sets the preparation callback for destinations of type `D`.
    ///
    /// Destinations of other types are ignored.
    pub fn on_prepare_as<D: Send + Sync + 'static>(
        &mut self,
        f: impl Fn(&D) + Send + Sync + 'static,
    ) -> &mut Self {
        self.on_prepare(move |destination| {
            if let Some(destination) = (**destination).downcast_ref::<D>() {
                f(destination);
            }
        })
    }

    /// Sets the success callback.
    pub fn on_success(&mut self, f: impl Fn(&ErasedDestination) + Send + Sync + 'static) -> &mut Self {
        self.success_handler = Some(Arc::new(f));
        self
    }

    /// Sets the error callback.
    pub fn on_error(&mut self, f: impl Fn(RouteAction, &RouteError) + Send + Sync + 'static) -> &mut Self {
        self.error_handler = Some(Arc::new(f));
        self
    }

    /// Sets the completion callback.
    pub fn on_completion(
        &mut self,
        f: impl Fn(Result<&ErasedDestination, &RouteError>, RouteAction) + Send + Sync + 'static,
    ) -> &mut Self {
        self.completion_handler = Some(Arc::new(f));
        self
    }

    /// Wraps the destination before it is presented.
    pub fn wrap_in_container(
        &mut self,
        f: impl Fn(ErasedDestination) -> ErasedDestination + Send + Sync + 'static,
    ) -> &mut Self {
        self.container_wrapper = Some(Arc::new(f));
        self
    }

    /// Returns the route path part of the configuration.
    #[must_use]
    pub fn path(&self) -> RoutePath {
        RoutePath {
            source: self.source.clone(),
            route_type: self.route_type,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// RemoveConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration of one remove.
#[derive(Clone)]
pub struct RemoveConfig {
    /// Whether the executor should animate.
    pub animated: bool,
    /// Called with the destination before the reverse transition.
    pub prepare_destination: Option<DestinationHandler>,
    /// Called once the route is removed.
    pub success_handler: Option<DestinationHandler>,
    /// Called when removal fails.
    pub error_handler: Option<ErrorHandler>,
    /// Called after removal with its outcome.
    pub completion_handler: Option<CompletionHandler>,
}

impl Default for RemoveConfig {
    fn default() -> Self {
        Self {
            animated: true,
            prepare_destination: None,
            success_handler: None,
            error_handler: None,
            completion_handler: None,
        }
    }
}

impl RemoveConfig {
    /// Sets the callback run before the reverse transition.
    pub fn on_prepare(&mut self, f: impl Fn(&ErasedDestination) + Send + Sync + 'static) -> &mut Self {
        self.prepare_destination = Some(Arc::new(f));
        self
    }

    /// Sets the success callback.
    pub fn on_success(&mut self, f: impl Fn(&ErasedDestination) + Send + Sync + 'static) -> &mut Self {
        self.success_handler = Some(Arc::new(f));
        self
    }

    /// Sets the error callback.
    pub fn on_error(&mut self, f: impl Fn(RouteAction, &RouteError) + Send + Sync + 'static) -> &mut Self {
        self.error_handler = Some(Arc::new(f));
        self
    }

    /// Sets the completion callback.
    pub fn on_completion(
        &mut self,
        f: impl Fn(Result<&ErasedDestination, &RouteError>, RouteAction) + Send + Sync + 'static,
    ) -> &mut Self {
        self.completion_handler = Some(Arc::new(f));
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ViewConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Casts an erased destination to a view capability.
pub type ViewCast<P> = fn(ErasedDestination) -> Option<Arc<P>>;

/// Casts an erased module to a module capability.
pub type ModuleCast<P> = for<'m> fn(&'m mut ErasedModule) -> Option<&'m mut P>;

/// [`RouteConfig`] whose destination callbacks see the capability `P`.
///
/// Dereferences to the underlying [`RouteConfig`] for everything else.
pub struct ViewConfig<'a, P: ?Sized + 'static> {
    config: &'a mut RouteConfig,
    cast: ViewCast<P>,
}

impl<'a, P: ?Sized + 'static> ViewConfig<'a, P> {
    pub(crate) fn new(config: &'a mut RouteConfig, cast: ViewCast<P>) -> Self {
        Self { config, cast }
    }

    /// Prepares the destination through the capability interface.
    pub fn prepare_destination(&mut self, f: impl Fn(&P) + Send + Sync + 'static) -> &mut Self {
        let cast = self.cast;
        self.config.on_prepare(move |destination| {
            if let Some(view) = cast(Arc::clone(destination)) {
                f(&view);
            }
        });
        self
    }

    /// Receives the performed destination through the capability interface.
    pub fn on_performed(&mut self, f: impl Fn(Arc<P>) + Send + Sync + 'static) -> &mut Self {
        let cast = self.cast;
        self.config.on_success(move |destination| {
            if let Some(view) = cast(Arc::clone(destination)) {
                f(view);
            }
        });
        self
    }
}

impl<P: ?Sized + 'static> Deref for ViewConfig<'_, P> {
    type Target = RouteConfig;

    fn deref(&self) -> &Self::Target {
        self.config
    }
}

impl<P: ?Sized + 'static> DerefMut for ViewConfig<'_, P> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Screen(u32);

    #[test]
    fn path_round_trips_through_config() {
        let config = RouteConfig::from(RoutePath::make_destination());
        assert_eq!(config.route_type, RouteType::MakeDestination);
        assert!(config.source.is_none());
        assert!(config.animated);
        assert_eq!(config.path().route_type, RouteType::MakeDestination);
    }

    #[test]
    fn typed_prepare_ignores_other_types() {
        let seen = Arc::new(AtomicU32::new(0));
        let mut config = RouteConfig::default();
        let sink = Arc::clone(&seen);
        config.on_prepare_as::<Screen>(move |screen| {
            sink.store(screen.0, Ordering::SeqCst);
        });

        let prepare = config.prepare_destination.clone().expect("callback set");
        let other: ErasedDestination = Arc::new(5_u8);
        prepare(&other);
        assert_eq!(seen.load(Ordering::SeqCst), 0);

        let screen: ErasedDestination = Arc::new(Screen(9));
        prepare(&screen);
        assert_eq!(seen.load(Ordering::SeqCst), 9);
    }

    #[test]
    fn view_config_casts_destination() {
        trait Numbered: Send + Sync {
            fn number(&self) -> u32;
        }
        impl Numbered for Screen {
            fn number(&self) -> u32 {
                self.0
            }
        }
        fn cast(destination: ErasedDestination) -> Option<Arc<dyn Numbered>> {
            let screen: Arc<dyn Numbered> = destination.downcast::<Screen>().ok()?;
            Some(screen)
        }

        let seen = Arc::new(AtomicU32::new(0));
        let mut config = RouteConfig::default();
        {
            let mut view = ViewConfig::<dyn Numbered>::new(&mut config, cast);
            let sink = Arc::clone(&seen);
            view.prepare_destination(move |numbered| {
                sink.store(numbered.number(), Ordering::SeqCst);
            });
            view.animated = false;
        }

        assert!(!config.animated);
        let prepare = config.prepare_destination.expect("callback set");
        prepare(&(Arc::new(Screen(3)) as ErasedDestination));
        assert_eq!(seen.load(Ordering::SeqCst), 3);
    }
}
