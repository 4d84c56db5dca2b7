//! Route sources and the context a transition starts from.
//!
//! A source is the screen or view that initiates a route. Routers only hold a
//! weak reference to it ([`SourceRef`]) and upgrade it right before each
//! transition, so a source that was torn down fails the route instead of
//! being kept alive by it.

use std::sync::{Arc, Weak};

use crate::driver::{ErasedDestination, ErasedModule};
use crate::route::{RealRouteType, RouteType};

// ─────────────────────────────────────────────────────────────────────────────
// SourceContext
// ─────────────────────────────────────────────────────────────────────────────

/// What kind of object hosts the transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SourceHost {
    /// A screen controller. Hosts every transition except `AddAsSubview`.
    #[default]
    ViewController,
    /// A plain view. Hosts only `AddAsSubview`.
    View,
}

/// Snapshot of the source's container structure at the time of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SourceContext {
    /// The source is inside a navigation stack.
    pub in_navigation_stack: bool,
    /// The source already has an active modal presentation.
    pub presenting: bool,
    /// The source is inside a split container.
    pub in_split_container: bool,
    /// Kind of object hosting the transition.
    pub host: SourceHost,
}

impl SourceContext {
    /// Context of a controller inside a navigation stack.
    #[must_use]
    pub fn navigation() -> Self {
        Self {
            in_navigation_stack: true,
            ..Self::default()
        }
    }

    /// Context of a plain view.
    #[must_use]
    pub fn view() -> Self {
        Self {
            host: SourceHost::View,
            ..Self::default()
        }
    }

    /// Checks that `real` is structurally possible from this context.
    ///
    /// Returns the reason when it is not.
    pub fn check(&self, real: RealRouteType) -> Result<(), &'static str> {
        match (real, self.host) {
            (RealRouteType::AddAsSubview, SourceHost::View) => Ok(()),
            (RealRouteType::AddAsSubview, SourceHost::ViewController) => {
                Err("the source is not a view")
            }
            (RealRouteType::Custom | RealRouteType::Unknown, _) => Ok(()),
            (_, SourceHost::View) => Err("the source is not a view controller"),
            (RealRouteType::Push, _) if !self.in_navigation_stack => {
                Err("the source is not in a navigation stack")
            }
            (RealRouteType::PresentModally | RealRouteType::PresentAsPopover, _)
                if self.presenting =>
            {
                Err("the source is already presenting")
            }
            _ => Ok(()),
        }
    }

    /// Resolves `route_type` against this context and checks it.
    ///
    /// `Ok(None)` means the type performs no transition.
    pub fn resolve(&self, route_type: RouteType) -> Result<Option<RealRouteType>, &'static str> {
        match route_type.resolve(self) {
            Some(real) => self.check(real).map(|()| Some(real)),
            None => Ok(None),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// RouteSource
// ─────────────────────────────────────────────────────────────────────────────

/// An object that can initiate routes.
///
/// Implemented by the host toolkit's screens and views. The context is read
/// fresh for every check; implementations must not cache it.
pub trait RouteSource: Send + Sync + 'static {
    /// Returns the current container context.
    fn context(&self) -> SourceContext;

    /// Returns a name for log messages.
    fn name(&self) -> &str {
        core::any::type_name::<Self>()
    }

    /// Prepares a destination the toolkit created without a router, before a
    /// router takes it over.
    ///
    /// Only called for drivers that report the destination as unprepared.
    fn prepare_destination_from_external(
        &self,
        _destination: &ErasedDestination,
        _module: &mut ErasedModule,
    ) {
    }
}

/// Non-owning reference to a [`RouteSource`].
#[derive(Clone)]
pub struct SourceRef {
    source: Weak<dyn RouteSource>,
}

impl SourceRef {
    /// Creates a weak reference to `source`.
    #[must_use]
    pub fn new<S: RouteSource>(source: &Arc<S>) -> Self {
        let source: Arc<dyn RouteSource> = source.clone();
        Self {
            source: Arc::downgrade(&source),
        }
    }

    /// Creates a weak reference from an erased source.
    #[must_use]
    pub fn from_dyn(source: &Arc<dyn RouteSource>) -> Self {
        Self {
            source: Arc::downgrade(source),
        }
    }

    /// Upgrades the reference, or `None` if the source was dropped.
    #[must_use]
    pub fn upgrade(&self) -> Option<Arc<dyn RouteSource>> {
        self.source.upgrade()
    }

    /// Returns true while the source is alive.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.source.strong_count() > 0
    }
}

impl core::fmt::Debug for SourceRef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SourceRef")
            .field("alive", &self.is_alive())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// RoutePath
// ─────────────────────────────────────────────────────────────────────────────

/// Where a route starts and how it transitions.
#[derive(Debug, Clone, Default)]
pub struct RoutePath {
    /// The initiating source. Only `MakeDestination` may omit it.
    pub source: Option<SourceRef>,
    /// The requested transition.
    pub route_type: RouteType,
}

impl RoutePath {
    /// Route from `source` with `route_type`.
    #[must_use]
    pub fn new(source: SourceRef, route_type: RouteType) -> Self {
        Self {
            source: Some(source),
            route_type,
        }
    }

    /// Push from `source`.
    #[must_use]
    pub fn push_from<S: RouteSource>(source: &Arc<S>) -> Self {
        Self::new(SourceRef::new(source), RouteType::Push)
    }

    /// Present modally from `source`.
    #[must_use]
    pub fn present_modally_from<S: RouteSource>(source: &Arc<S>) -> Self {
        Self::new(SourceRef::new(source), RouteType::PresentModally)
    }

    /// Show from `source`.
    #[must_use]
    pub fn show_from<S: RouteSource>(source: &Arc<S>) -> Self {
        Self::new(SourceRef::new(source), RouteType::Show)
    }

    /// Add as subview of `source`.
    #[must_use]
    pub fn add_as_subview_of<S: RouteSource>(source: &Arc<S>) -> Self {
        Self::new(SourceRef::new(source), RouteType::AddAsSubview)
    }

    /// Make the destination without a transition.
    #[must_use]
    pub fn make_destination() -> Self {
        Self {
            source: None,
            route_type: RouteType::MakeDestination,
        }
    }
}
