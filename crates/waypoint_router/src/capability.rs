//! Capability declarations and destination classes.
//!
//! A capability is the abstract interface a caller asks for instead of a
//! concrete screen type. View capabilities describe what the destination
//! itself exposes; module capabilities describe the configuration object a
//! caller fills in before the destination is made.
//!
//! In Rust a capability is usually a trait object type:
//!
//! ```
//! use waypoint_router::capability::CapabilityId;
//!
//! pub trait DetailInput {
//!     fn show_item(&self, id: u64);
//! }
//!
//! let capability = CapabilityId::view::<dyn DetailInput>();
//! assert!(capability.name().contains("DetailInput"));
//! ```
//!
//! Identifier capabilities cover routes that are addressed by name, such as
//! deep links.

use core::any::{Any, TypeId};
use core::fmt;
use core::hash::{Hash, Hasher};
use std::borrow::Cow;
use std::sync::Arc;

use crate::driver::RouteDriver;

// ─────────────────────────────────────────────────────────────────────────────
// CapabilityId
// ─────────────────────────────────────────────────────────────────────────────

/// Whether a capability describes a destination or a configuration module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapabilityKind {
    /// Interface exposed by the destination.
    View,
    /// Interface exposed by the configuration object.
    Module,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Identity {
    Type(TypeId),
    Name(Cow<'static, str>),
}

/// Identity of a capability declaration.
///
/// Two ids are equal when their kind and identity match. The type name is
/// kept for messages only.
#[derive(Clone)]
pub struct CapabilityId {
    kind: CapabilityKind,
    identity: Identity,
    name: Cow<'static, str>,
}

impl CapabilityId {
    /// View capability for the interface type `P`.
    #[must_use]
    pub fn view<P: ?Sized + 'static>() -> Self {
        Self::of_type::<P>(CapabilityKind::View)
    }

    /// Module capability for the interface type `P`.
    #[must_use]
    pub fn module<P: ?Sized + 'static>() -> Self {
        Self::of_type::<P>(CapabilityKind::Module)
    }

    /// Capability addressed by a string identifier.
    #[must_use]
    pub fn identifier(kind: CapabilityKind, identifier: impl Into<Cow<'static, str>>) -> Self {
        let identifier = identifier.into();
        Self {
            kind,
            identity: Identity::Name(identifier.clone()),
            name: identifier,
        }
    }

    fn of_type<P: ?Sized + 'static>(kind: CapabilityKind) -> Self {
        Self {
            kind,
            identity: Identity::Type(TypeId::of::<P>()),
            name: Cow::Borrowed(core::any::type_name::<P>()),
        }
    }

    /// Returns the capability kind.
    #[must_use]
    pub fn kind(&self) -> CapabilityKind {
        self.kind
    }

    /// Returns the type name or identifier.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true for identifier capabilities.
    #[must_use]
    pub fn is_identifier(&self) -> bool {
        matches!(self.identity, Identity::Name(_))
    }
}

impl PartialEq for CapabilityId {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.identity == other.identity
    }
}

impl Eq for CapabilityId {}

impl Hash for CapabilityId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.identity.hash(state);
    }
}

impl fmt::Debug for CapabilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityId")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .finish()
    }
}

impl fmt::Display for CapabilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            CapabilityKind::View => "view",
            CapabilityKind::Module => "module",
        };
        if self.is_identifier() {
            write!(f, "{kind} identifier `{}`", self.name)
        } else {
            write!(f, "{kind} capability `{}`", self.name)
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// DestinationClass
// ─────────────────────────────────────────────────────────────────────────────

/// Concrete type of a destination, used for destination-to-router lookup.
#[derive(Debug, Clone, Copy)]
pub struct DestinationClass {
    type_id: TypeId,
    type_name: &'static str,
}

impl DestinationClass {
    /// Creates the class for `D`.
    #[must_use]
    pub fn of<D: 'static>() -> Self {
        Self {
            type_id: TypeId::of::<D>(),
            type_name: core::any::type_name::<D>(),
        }
    }

    /// Class of an erased destination.
    ///
    /// The type name is unknown for erased values, so messages fall back to
    /// a placeholder.
    #[must_use]
    pub fn of_erased(destination: &crate::driver::ErasedDestination) -> Self {
        Self {
            type_id: Any::type_id(&**destination),
            type_name: "<erased destination>",
        }
    }

    /// Returns the underlying `TypeId`.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the type name for debugging.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl PartialEq for DestinationClass {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for DestinationClass {}

impl Hash for DestinationClass {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Display for DestinationClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "destination `{}`", self.type_name)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Conformance
// ─────────────────────────────────────────────────────────────────────────────

/// Declares that a driver's destination exposes the view interface `P`.
///
/// Registering `P` for a driver requires this impl, so a capability can never
/// be bound to a router whose destination does not implement it.
///
/// ```ignore
/// impl ProvidesView<dyn DetailInput> for DetailRouter {
///     fn as_view(destination: Arc<DetailScreen>) -> Arc<dyn DetailInput> {
///         destination
///     }
/// }
/// ```
pub trait ProvidesView<P: ?Sized + 'static>: RouteDriver {
    /// Views the destination through the capability interface.
    fn as_view(destination: Arc<Self::Destination>) -> Arc<P>;
}

/// Declares that a driver's configuration module exposes the interface `P`.
///
/// ```ignore
/// impl ProvidesModule<dyn DetailModule> for DetailRouter {
///     fn as_module(module: &mut DetailConfig) -> &mut (dyn DetailModule + 'static) {
///         module
///     }
/// }
/// ```
pub trait ProvidesModule<P: ?Sized + 'static>: RouteDriver {
    /// Views the module through the capability interface.
    fn as_module(module: &mut Self::Module) -> &mut P;
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashbrown::HashSet;

    trait Detail {}
    trait Compose {}
    struct DetailScreen;

    #[test]
    fn kind_is_part_of_identity() {
        assert_eq!(CapabilityId::view::<dyn Detail>(), CapabilityId::view::<dyn Detail>());
        assert_ne!(CapabilityId::view::<dyn Detail>(), CapabilityId::module::<dyn Detail>());
        assert_ne!(CapabilityId::view::<dyn Detail>(), CapabilityId::view::<dyn Compose>());
    }

    #[test]
    fn identifier_equality_ignores_storage() {
        let owned = CapabilityId::identifier(CapabilityKind::View, String::from("app://detail"));
        let borrowed = CapabilityId::identifier(CapabilityKind::View, "app://detail");
        assert_eq!(owned, borrowed);

        let mut set = HashSet::new();
        set.insert(owned);
        assert!(set.contains(&borrowed));
        assert!(borrowed.is_identifier());
    }

    #[test]
    fn identifier_never_equals_type_capability() {
        let typed = CapabilityId::view::<dyn Detail>();
        let named = CapabilityId::identifier(CapabilityKind::View, typed.name().to_owned());
        assert_ne!(typed, named);
    }

    #[test]
    fn display_names_kind() {
        let id = CapabilityId::module::<dyn Compose>();
        assert!(id.to_string().starts_with("module capability `"));
        let id = CapabilityId::identifier(CapabilityKind::View, "settings");
        assert_eq!(id.to_string(), "view identifier `settings`");
    }

    #[test]
    fn destination_class_of_erased_matches_typed() {
        let erased: crate::driver::ErasedDestination = Arc::new(DetailScreen);
        assert_eq!(DestinationClass::of_erased(&erased), DestinationClass::of::<DetailScreen>());
    }
}
