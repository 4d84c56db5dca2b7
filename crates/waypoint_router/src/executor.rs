//! The presentation executor: the toolkit side of a transition.
//!
//! Routers decide whether and how a transition may happen; the executor
//! carries it out. Each perform or remove calls the executor at most once.

use std::sync::Arc;

use crate::driver::ErasedDestination;
use crate::error::PresentationError;
use crate::route::{RealRouteType, RemoveAction, RouteType};
use crate::source::{RouteSource, SourceContext};

/// A forward transition handed to the executor.
pub struct PresentRequest {
    /// Object to present. This is the container when the route configured a
    /// container wrapper, otherwise the destination itself.
    pub presented: ErasedDestination,
    /// The destination the router owns.
    pub destination: ErasedDestination,
    /// Transition style the caller asked for.
    pub route_type: RouteType,
    /// Concrete style resolved from the source context.
    pub real_route_type: RealRouteType,
    /// The live source.
    pub source: Arc<dyn RouteSource>,
    /// Source context the style was resolved against.
    pub context: SourceContext,
    /// Whether to animate.
    pub animated: bool,
}

/// A reverse transition handed to the executor.
pub struct DismissRequest {
    /// Object that was presented.
    pub presented: ErasedDestination,
    /// The destination the router owns.
    pub destination: ErasedDestination,
    /// Reverse action inferred from the recorded style.
    pub action: RemoveAction,
    /// Style recorded when the route was performed.
    pub real_route_type: RealRouteType,
    /// The source, if it is still alive.
    pub source: Option<Arc<dyn RouteSource>>,
    /// Whether to animate.
    pub animated: bool,
}

/// Toolkit adapter that performs transitions.
///
/// ```ignore
/// struct UiKitExecutor;
///
/// impl PresentationExecutor for UiKitExecutor {
///     fn present(&self, request: &PresentRequest) -> Result<(), PresentationError> {
///         match request.real_route_type {
///             RealRouteType::Push => push(&request.source, &request.presented),
///             _ => present(&request.source, &request.presented),
///         }
///     }
///
///     fn dismiss(&self, request: &DismissRequest) -> Result<(), PresentationError> {
///         reverse(request.action, &request.presented)
///     }
/// }
/// ```
pub trait PresentationExecutor: Send + Sync + 'static {
    /// Performs a forward transition.
    fn present(&self, request: &PresentRequest) -> Result<(), PresentationError>;

    /// Performs a reverse transition.
    fn dismiss(&self, request: &DismissRequest) -> Result<(), PresentationError>;

    /// Returns false once the destination has been torn down by the toolkit.
    fn is_destination_alive(&self, _destination: &ErasedDestination) -> bool {
        true
    }

    /// Returns true on the toolkit's UI thread.
    fn is_ui_thread(&self) -> bool {
        true
    }
}
