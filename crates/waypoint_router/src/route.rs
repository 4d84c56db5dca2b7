//! Route types and removal inference.
//!
//! A [`RouteType`] is what the caller asks for. Adaptive types (`Show`,
//! `ShowDetail`, `PerformSegue`) only become a concrete [`RealRouteType`]
//! once the source's context is known, and that resolution happens exactly
//! once per successful perform.
//!
//! [`RealRouteType::remove_action`] is the whole of removal inference: the
//! reverse of each concrete style is fixed, and the composite category
//! [`RealRouteType::Unknown`] has no reverse.

use core::fmt;
use core::ops::{BitOr, BitOrAssign};

use crate::source::SourceContext;

// ─────────────────────────────────────────────────────────────────────────────
// RouteType
// ─────────────────────────────────────────────────────────────────────────────

/// Transition style requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RouteType {
    /// Push onto the source's navigation stack.
    Push,
    /// Present modally from the source.
    #[default]
    PresentModally,
    /// Present as a popover anchored in the source.
    PresentAsPopover,
    /// Run a toolkit-defined segue. The concrete style is not observable.
    PerformSegue,
    /// Push when the source is in a navigation stack, otherwise present.
    Show,
    /// Show in the detail column of a split container.
    ShowDetail,
    /// Add as a child of the source controller. The caller finishes the
    /// view hierarchy.
    AddAsChildViewController,
    /// Add the destination view to the source view.
    AddAsSubview,
    /// Driver-defined transition.
    Custom,
    /// Make and prepare the destination without any transition.
    MakeDestination,
}

impl RouteType {
    /// Every route type, in declaration order.
    pub const ALL: [RouteType; 10] = [
        RouteType::Push,
        RouteType::PresentModally,
        RouteType::PresentAsPopover,
        RouteType::PerformSegue,
        RouteType::Show,
        RouteType::ShowDetail,
        RouteType::AddAsChildViewController,
        RouteType::AddAsSubview,
        RouteType::Custom,
        RouteType::MakeDestination,
    ];

    /// Returns true for types whose concrete style depends on the source.
    #[must_use]
    pub fn is_adaptive(self) -> bool {
        matches!(
            self,
            RouteType::Show | RouteType::ShowDetail | RouteType::PerformSegue
        )
    }

    /// Returns true if the type needs a live source.
    #[must_use]
    pub fn requires_source(self) -> bool {
        self != RouteType::MakeDestination
    }

    /// Resolves the concrete style used in the given source context.
    ///
    /// Returns `None` for [`RouteType::MakeDestination`], which performs no
    /// transition.
    #[must_use]
    pub fn resolve(self, context: &SourceContext) -> Option<RealRouteType> {
        let real = match self {
            RouteType::Push => RealRouteType::Push,
            RouteType::PresentModally => RealRouteType::PresentModally,
            RouteType::PresentAsPopover => RealRouteType::PresentAsPopover,
            RouteType::PerformSegue => RealRouteType::Unknown,
            RouteType::Show if context.in_navigation_stack => RealRouteType::Push,
            RouteType::Show if context.in_split_container => RealRouteType::Unknown,
            RouteType::Show => RealRouteType::PresentModally,
            RouteType::ShowDetail if context.in_split_container => RealRouteType::Unknown,
            RouteType::ShowDetail => RealRouteType::PresentModally,
            RouteType::AddAsChildViewController => RealRouteType::AddAsChild,
            RouteType::AddAsSubview => RealRouteType::AddAsSubview,
            RouteType::Custom => RealRouteType::Custom,
            RouteType::MakeDestination => return None,
        };
        Some(real)
    }

    /// Returns the mask bit for this type.
    #[must_use]
    pub fn mask(self) -> RouteTypeMask {
        RouteTypeMask(1 << self as u16)
    }
}

impl fmt::Display for RouteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RouteType::Push => "push",
            RouteType::PresentModally => "present modally",
            RouteType::PresentAsPopover => "present as popover",
            RouteType::PerformSegue => "perform segue",
            RouteType::Show => "show",
            RouteType::ShowDetail => "show detail",
            RouteType::AddAsChildViewController => "add as child view controller",
            RouteType::AddAsSubview => "add as subview",
            RouteType::Custom => "custom route",
            RouteType::MakeDestination => "make destination",
        };
        f.write_str(name)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// RouteTypeMask
// ─────────────────────────────────────────────────────────────────────────────

/// Set of route types a driver supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RouteTypeMask(u16);

impl RouteTypeMask {
    /// No route types.
    pub const NONE: RouteTypeMask = RouteTypeMask(0);

    /// Every route type.
    pub const ALL: RouteTypeMask = RouteTypeMask((1u16 << RouteType::ALL.len()) - 1);

    /// Types a controller destination supports without opting in.
    pub const VIEW_CONTROLLER_DEFAULT: RouteTypeMask = RouteTypeMask(
        Self::ALL.0 & !(1 << RouteType::AddAsSubview as u16) & !(1 << RouteType::Custom as u16),
    );

    /// Types a plain view destination supports without opting in.
    pub const VIEW_DEFAULT: RouteTypeMask = RouteTypeMask(
        (1 << RouteType::AddAsSubview as u16) | (1 << RouteType::MakeDestination as u16),
    );

    /// Returns true if `route_type` is in the mask.
    #[must_use]
    pub fn contains(self, route_type: RouteType) -> bool {
        self.0 & route_type.mask().0 != 0
    }

    /// Returns the mask with `route_type` added.
    #[must_use]
    pub fn with(self, route_type: RouteType) -> Self {
        self | route_type.mask()
    }

    /// Returns the mask with `route_type` removed.
    #[must_use]
    pub fn without(self, route_type: RouteType) -> Self {
        RouteTypeMask(self.0 & !route_type.mask().0)
    }

    /// Iterates the contained route types in declaration order.
    pub fn iter(self) -> impl Iterator<Item = RouteType> {
        RouteType::ALL.into_iter().filter(move |ty| self.contains(*ty))
    }
}

impl BitOr for RouteTypeMask {
    type Output = RouteTypeMask;

    fn bitor(self, rhs: Self) -> Self::Output {
        RouteTypeMask(self.0 | rhs.0)
    }
}

impl BitOr<RouteType> for RouteTypeMask {
    type Output = RouteTypeMask;

    fn bitor(self, rhs: RouteType) -> Self::Output {
        self | rhs.mask()
    }
}

impl BitOrAssign for RouteTypeMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl FromIterator<RouteType> for RouteTypeMask {
    fn from_iter<I: IntoIterator<Item = RouteType>>(iter: I) -> Self {
        iter.into_iter()
            .fold(RouteTypeMask::NONE, |mask, ty| mask.with(ty))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// RealRouteType
// ─────────────────────────────────────────────────────────────────────────────

/// Concrete transition style recorded when a perform succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RealRouteType {
    /// The presentation was composed from several primitive transitions
    /// whose order the router could not observe.
    Unknown,
    /// Pushed onto a navigation stack.
    Push,
    /// Presented modally.
    PresentModally,
    /// Presented as a popover.
    PresentAsPopover,
    /// Added as a child controller.
    AddAsChild,
    /// Added as a subview.
    AddAsSubview,
    /// Driver-defined transition.
    Custom,
}

/// Reverse transition for a [`RealRouteType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoveAction {
    /// Pop from the navigation stack.
    Pop,
    /// Dismiss the presentation.
    Dismiss,
    /// Remove the child controller from its parent.
    RemoveFromParent,
    /// Remove the view from its superview.
    RemoveFromSuperview,
    /// Let the driver reverse its custom transition.
    RemoveCustom,
}

impl RealRouteType {
    /// Returns the reverse action, or `None` when it cannot be determined.
    ///
    /// `custom_removable` is the driver's answer to whether it can reverse
    /// its own custom transition.
    #[must_use]
    pub fn remove_action(self, custom_removable: bool) -> Option<RemoveAction> {
        match self {
            RealRouteType::Unknown => None,
            RealRouteType::Push => Some(RemoveAction::Pop),
            RealRouteType::PresentModally | RealRouteType::PresentAsPopover => {
                Some(RemoveAction::Dismiss)
            }
            RealRouteType::AddAsChild => Some(RemoveAction::RemoveFromParent),
            RealRouteType::AddAsSubview => Some(RemoveAction::RemoveFromSuperview),
            RealRouteType::Custom => custom_removable.then_some(RemoveAction::RemoveCustom),
        }
    }

    /// Returns true if a router that did not perform this transition can
    /// still reverse it.
    ///
    /// Pushes and child insertions depend on container structure the router
    /// never saw. Custom transitions depend on driver state set during the
    /// perform.
    #[must_use]
    pub fn reversible_without_observation(self) -> bool {
        matches!(
            self,
            RealRouteType::PresentModally
                | RealRouteType::PresentAsPopover
                | RealRouteType::AddAsSubview
        )
    }
}

impl fmt::Display for RealRouteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RealRouteType::Unknown => "unknown",
            RealRouteType::Push => "push",
            RealRouteType::PresentModally => "present modally",
            RealRouteType::PresentAsPopover => "present as popover",
            RealRouteType::AddAsChild => "add as child",
            RealRouteType::AddAsSubview => "add as subview",
            RealRouteType::Custom => "custom",
        };
        f.write_str(name)
    }
}
