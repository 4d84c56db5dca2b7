//! Schedule identifiers for lifecycle hook points.
//!
//! A schedule is identified by a marker type (any `'static` type) wrapped in
//! a [`ScheduleId`]. Layer 2 defines the markers (`OnRouteWillPerform`,
//! `OnRouteDidRemove`, ...) and invokes hooks registered against them.

use core::any::TypeId;
use variadics_please::all_tuples;

/// Identifier for a hook schedule, derived from a marker type.
///
/// # Example
///
/// ```
/// # use waypoint_system::plugin::ScheduleId;
/// pub struct OnScreenShown;
///
/// let schedule = ScheduleId::of::<OnScreenShown>();
/// assert!(schedule.type_name().ends_with("OnScreenShown"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScheduleId {
    type_id: TypeId,
    type_name: &'static str,
}

impl ScheduleId {
    /// Creates a `ScheduleId` for the given schedule marker type.
    #[must_use]
    pub fn of<S: 'static>() -> Self {
        Self {
            type_id: TypeId::of::<S>(),
            type_name: core::any::type_name::<S>(),
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

    /// Returns the marker's name without its module path.
    #[must_use]
    pub fn short_name(&self) -> &'static str {
        self.type_name
            .rsplit("::")
            .next()
            .unwrap_or(self.type_name)
    }
}

/// Marker trait for schedule types.
///
/// The trait carries no methods; it exists so that [`IntoScheduleIds`] can
/// accept schedule types by trait bound.
pub trait Schedule: 'static {}

/// Trait for types that can be converted into a list of schedule IDs.
///
/// Implemented for single schedules and tuples of schedules, so a hook can be
/// registered on several lifecycle points at once.
pub trait IntoScheduleIds {
    /// Returns the schedule IDs for this type.
    fn schedule_ids() -> Vec<ScheduleId>;
}

impl<S: Schedule> IntoScheduleIds for S {
    fn schedule_ids() -> Vec<ScheduleId> {
        vec![ScheduleId::of::<S>()]
    }
}

macro_rules! impl_into_schedule_ids_for_tuple {
    ($($S:ident),*) => {
        impl<$($S: Schedule),*> IntoScheduleIds for ($($S,)*) {
            fn schedule_ids() -> Vec<ScheduleId> {
                vec![$(ScheduleId::of::<$S>()),*]
            }
        }
    };
}

all_tuples!(impl_into_schedule_ids_for_tuple, 2, 8, S);

#[cfg(test)]
mod tests {
    use super::*;

    struct WillShow;
    impl Schedule for WillShow {}

    struct DidShow;
    impl Schedule for DidShow {}

    struct DidHide;
    impl Schedule for DidHide {}

    #[test]
    fn schedule_id_equality() {
        assert_eq!(ScheduleId::of::<WillShow>(), ScheduleId::of::<WillShow>());
        assert_ne!(ScheduleId::of::<WillShow>(), ScheduleId::of::<DidShow>());
    }

    #[test]
    fn short_name_strips_module_path() {
        assert_eq!(ScheduleId::of::<DidHide>().short_name(), "DidHide");
    }

    #[test]
    fn into_schedule_ids_tuple_keeps_order() {
        let ids = <(WillShow, DidShow, DidHide)>::schedule_ids();
        assert_eq!(
            ids,
            vec![
                ScheduleId::of::<WillShow>(),
                ScheduleId::of::<DidShow>(),
                ScheduleId::of::<DidHide>(),
            ]
        );
    }
}
