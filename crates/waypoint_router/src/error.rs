//! Error types for registration and routing.

use core::fmt;

use thiserror::Error;

use crate::capability::{CapabilityId, DestinationClass};
use crate::route::RouteType;
use crate::router::RouterState;

// ─────────────────────────────────────────────────────────────────────────────
// RegistrationError
// ─────────────────────────────────────────────────────────────────────────────

/// Errors produced while populating a [`RouterRegistry`](crate::RouterRegistry).
///
/// Every variant is a programming mistake. The panicking `register_*`
/// methods raise these as panics; the `try_register_*` variants return them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// The registry was frozen by `finish_registration()`.
    #[error("registration is finished, cannot register {what}")]
    RegistrationFinished {
        /// Description of the rejected registration.
        what: String,
    },

    /// The capability is already bound to another router.
    #[error("{capability} is already registered to `{existing}`, cannot register it to `{requested}`")]
    CapabilityConflict {
        /// The capability being registered.
        capability: CapabilityId,
        /// Router the capability is bound to.
        existing: &'static str,
        /// Router the caller tried to bind.
        requested: &'static str,
    },

    /// The capability is already registered as an adapter.
    #[error("{capability} is registered as an adapter of {adaptee}, cannot bind it to a router")]
    CapabilityIsAdapter {
        /// The capability being registered.
        capability: CapabilityId,
        /// Adaptee the capability currently forwards to.
        adaptee: CapabilityId,
    },

    /// The adapter already has a router bound directly.
    #[error("{adapter} is directly registered to `{router}`, cannot register it as an adapter")]
    AdapterHasDirectBinding {
        /// The adapter capability.
        adapter: CapabilityId,
        /// Router the adapter is bound to.
        router: &'static str,
    },

    /// The adapter already forwards to a different adaptee.
    #[error("{adapter} already adapts {existing}, cannot adapt {requested}")]
    AdapterConflict {
        /// The adapter capability.
        adapter: CapabilityId,
        /// Current adaptee.
        existing: CapabilityId,
        /// Adaptee the caller tried to set.
        requested: CapabilityId,
    },

    /// The adapter edge would close a cycle.
    #[error("adapter cycle: {}", format_chain(.chain))]
    AdapterCycle {
        /// The cycle, starting and ending with the same capability.
        chain: Vec<CapabilityId>,
    },

    /// An adapter and its adaptee are of different kinds.
    #[error("{adapter} and {adaptee} are of different kinds")]
    KindMismatch {
        /// The adapter capability.
        adapter: CapabilityId,
        /// The adaptee capability.
        adaptee: CapabilityId,
    },

    /// The destination class is exclusively bound to another router.
    #[error("{destination} is exclusively registered to `{owner}`, cannot register it to `{requested}`")]
    ExclusiveDestination {
        /// The destination class.
        destination: DestinationClass,
        /// Router holding the exclusive binding.
        owner: &'static str,
        /// Router the caller tried to bind.
        requested: &'static str,
    },

    /// Exclusive registration requested for a class other routers already use.
    #[error("{destination} is already registered to {}, cannot make it exclusive to `{requested}`", .routers.join(", "))]
    DestinationShared {
        /// The destination class.
        destination: DestinationClass,
        /// Routers already bound to the class.
        routers: Vec<&'static str>,
        /// Router the caller tried to bind exclusively.
        requested: &'static str,
    },
}

fn format_chain(chain: &[CapabilityId]) -> String {
    chain
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

// ─────────────────────────────────────────────────────────────────────────────
// PresentationError
// ─────────────────────────────────────────────────────────────────────────────

/// Failure reported by a [`PresentationExecutor`](crate::PresentationExecutor)
/// or by a driver's custom route.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PresentationError {
    /// The transition did not happen. The router may retry.
    #[error("presentation failed: {0}")]
    Failed(String),

    /// The destination was left partially constructed. The router is unusable.
    #[error("presentation left the destination partially constructed: {0}")]
    Fatal(String),

    /// The executor or driver does not implement the requested transition.
    #[error("{0} is not supported")]
    Unsupported(String),
}

impl PresentationError {
    /// Creates a [`Failed`](Self::Failed).
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }

    /// Creates a [`Fatal`](Self::Fatal).
    pub fn fatal(msg: impl Into<String>) -> Self {
        Self::Fatal(msg.into())
    }

    /// Creates an [`Unsupported`](Self::Unsupported).
    pub fn unsupported(what: impl Into<String>) -> Self {
        Self::Unsupported(what.into())
    }

    /// Returns true if the router must be discarded after this failure.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// RouteError
// ─────────────────────────────────────────────────────────────────────────────

/// The operation a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteAction {
    /// Resolving a capability to a router.
    Resolve,
    /// Preparing an externally created destination.
    PrepareDestination,
    /// Performing a route.
    Perform,
    /// Removing a route.
    Remove,
}

impl fmt::Display for RouteAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Resolve => "resolve",
            Self::PrepareDestination => "prepare destination",
            Self::Perform => "perform",
            Self::Remove => "remove",
        };
        f.write_str(name)
    }
}

/// Failure of a route operation.
///
/// Precondition variants are raised before any executor call. Runtime
/// variants are raised by the destination, the driver, or the executor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// No router is registered for the capability.
    #[error("no router registered for {capability}")]
    NotRegistered {
        /// The unresolved capability.
        capability: CapabilityId,
    },

    /// The router does not provide typed access through the capability.
    #[error("router `{router}` does not provide {capability}")]
    CapabilityNotProvided {
        /// The capability the caller used.
        capability: CapabilityId,
        /// The resolved router.
        router: &'static str,
    },

    /// The router's state does not allow the action.
    #[error("cannot {action} while the router is {state}")]
    InvalidState {
        /// The rejected action.
        action: RouteAction,
        /// State at the time of the call.
        state: RouterState,
    },

    /// The source was dropped before the transition.
    #[error("the route source is no longer alive")]
    SourceUnavailable,

    /// The route type needs a source but none was configured.
    #[error("{route_type} requires a source")]
    MissingSource {
        /// The configured route type.
        route_type: RouteType,
    },

    /// The driver does not support the route type.
    #[error("router `{router}` does not support {route_type}")]
    UnsupportedRouteType {
        /// The configured route type.
        route_type: RouteType,
        /// The driver.
        router: &'static str,
    },

    /// Called off the UI thread.
    #[error("route operations must run on the UI thread")]
    NotOnUiThread,

    /// The route type is impossible in the source's current context.
    #[error("cannot perform {route_type}: {reason}")]
    RouteNotPossible {
        /// The configured route type.
        route_type: RouteType,
        /// Why the source cannot host the transition.
        reason: &'static str,
    },

    /// The route cannot be reversed by the router.
    #[error("cannot remove route: {reason}")]
    CannotRemove {
        /// Why removal is not possible.
        reason: &'static str,
    },

    /// The destination is gone.
    #[error("the destination is no longer alive")]
    DestinationUnavailable,

    /// The driver did not produce a destination.
    #[error("router `{router}` failed to make a destination")]
    MakeDestinationFailed {
        /// The driver.
        router: &'static str,
    },

    /// The destination passed in is not the driver's destination type.
    #[error("router `{router}` cannot manage destination {destination}")]
    DestinationMismatch {
        /// The driver.
        router: &'static str,
        /// The class of the destination passed in.
        destination: DestinationClass,
    },

    /// The executor or custom route failed.
    #[error(transparent)]
    Presentation(#[from] PresentationError),
}

impl RouteError {
    /// Returns true if the router is unusable after this error.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Presentation(err) if err.is_fatal())
    }

    /// Returns true if the error was raised before any toolkit action.
    #[must_use]
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::NotRegistered { .. }
                | Self::CapabilityNotProvided { .. }
                | Self::InvalidState { .. }
                | Self::MissingSource { .. }
                | Self::UnsupportedRouteType { .. }
                | Self::NotOnUiThread
                | Self::RouteNotPossible { .. }
                | Self::CannotRemove { .. }
                | Self::DestinationMismatch { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Detail {}
    trait LegacyDetail {}

    #[test]
    fn cycle_message_lists_chain() {
        let a = CapabilityId::view::<dyn Detail>();
        let b = CapabilityId::view::<dyn LegacyDetail>();
        let err = RegistrationError::AdapterCycle {
            chain: vec![a.clone(), b, a],
        };
        let msg = err.to_string();
        assert!(msg.starts_with("adapter cycle: "));
        assert_eq!(msg.matches(" -> ").count(), 2);
    }

    #[test]
    fn fatal_presentation_is_fatal_route_error() {
        let err = RouteError::from(PresentationError::fatal("half built"));
        assert!(err.is_fatal());
        assert!(!err.is_precondition());

        let err = RouteError::from(PresentationError::failed("busy"));
        assert!(!err.is_fatal());
    }

    #[test]
    fn precondition_classification() {
        assert!(RouteError::NotOnUiThread.is_precondition());
        assert!(
            RouteError::InvalidState {
                action: RouteAction::Perform,
                state: RouterState::Routed,
            }
            .is_precondition()
        );
        assert!(!RouteError::SourceUnavailable.is_precondition());
        assert!(!RouteError::DestinationUnavailable.is_precondition());
    }

    #[test]
    fn invalid_state_message() {
        let err = RouteError::InvalidState {
            action: RouteAction::Remove,
            state: RouterState::Unrouted,
        };
        assert_eq!(err.to_string(), "cannot remove while the router is unrouted");
    }
}
