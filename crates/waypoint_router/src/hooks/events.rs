//! Event payload passed to route hooks.

use waypoint_system::plugin::ScheduleId;

use super::schedule::{
    OnRouteDidPerform, OnRouteDidRemove, OnRouteError, OnRouteWillPerform, OnRouteWillRemove,
};
use crate::error::{RouteAction, RouteError};
use crate::route::{RealRouteType, RemoveAction};
use crate::router::RouterInfo;

/// Event delivered to every route hook.
#[derive(Debug, Clone)]
pub enum RouteEvent {
    /// A perform is about to run.
    WillPerform {
        /// The router performing.
        router: RouterInfo,
    },

    /// A perform succeeded.
    DidPerform {
        /// The router after the transition.
        router: RouterInfo,
        /// Concrete style used. `None` for `MakeDestination`.
        real_route_type: Option<RealRouteType>,
    },

    /// A remove is about to run.
    WillRemove {
        /// The router removing.
        router: RouterInfo,
        /// The reverse transition about to run.
        action: RemoveAction,
    },

    /// A remove succeeded.
    DidRemove {
        /// The router after the transition.
        router: RouterInfo,
    },

    /// An action failed.
    Error {
        /// The failing router, if one existed.
        router: Option<RouterInfo>,
        /// The failed action.
        action: RouteAction,
        /// The failure.
        error: RouteError,
    },
}

impl RouteEvent {
    /// Returns the schedule this event is delivered on.
    #[must_use]
    pub fn schedule(&self) -> ScheduleId {
        match self {
            RouteEvent::WillPerform { .. } => ScheduleId::of::<OnRouteWillPerform>(),
            RouteEvent::DidPerform { .. } => ScheduleId::of::<OnRouteDidPerform>(),
            RouteEvent::WillRemove { .. } => ScheduleId::of::<OnRouteWillRemove>(),
            RouteEvent::DidRemove { .. } => ScheduleId::of::<OnRouteDidRemove>(),
            RouteEvent::Error { .. } => ScheduleId::of::<OnRouteError>(),
        }
    }

    /// Returns the router the event concerns, if any.
    #[must_use]
    pub fn router(&self) -> Option<&RouterInfo> {
        match self {
            RouteEvent::WillPerform { router }
            | RouteEvent::DidPerform { router, .. }
            | RouteEvent::WillRemove { router, .. }
            | RouteEvent::DidRemove { router } => Some(router),
            RouteEvent::Error { router, .. } => router.as_ref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_without_router() {
        let event = RouteEvent::Error {
            router: None,
            action: RouteAction::Resolve,
            error: RouteError::NotOnUiThread,
        };
        assert!(event.router().is_none());
        assert_eq!(event.schedule(), ScheduleId::of::<OnRouteError>());
    }
}
