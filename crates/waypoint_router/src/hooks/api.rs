//! Hook registration API for route actions.
//!
//! [`RouteHooks`] is inserted as an API by the routing plugin. Plugins
//! register observers during `build()`; the navigator's routers invoke them
//! for the rest of the process.
//!
//! # Multi-Schedule Registration
//!
//! ```ignore
//! hooks.register_observer::<(OnRouteWillPerform, OnRouteError), _>(
//!     "audit",
//!     |event: &RouteEvent| tracing::info!(?event, "route"),
//! )?;
//! ```

use core::fmt;
use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::RwLock;
use thiserror::Error;
use waypoint_system::api::API;
use waypoint_system::plugin::{IntoScheduleIds, ScheduleId};

use super::events::RouteEvent;

type Hook = Arc<dyn Fn(&RouteEvent) + Send + Sync>;

// ─────────────────────────────────────────────────────────────────────────────
// HookRegistrationError
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can occur during hook registration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HookRegistrationError {
    /// A hook with this name already exists on the schedule.
    #[error("hook '{name}' already registered for schedule '{}'", .schedule.type_name())]
    DuplicateName {
        /// The schedule where the duplicate was found.
        schedule: ScheduleId,
        /// The duplicate hook name.
        name: String,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// RouteHooks
// ─────────────────────────────────────────────────────────────────────────────

struct HookEntry {
    name: String,
    hook: Hook,
}

/// API for registering and invoking route lifecycle hooks.
///
/// Cloning yields another handle to the same hook table, so the navigator
/// and the server share registrations.
#[derive(Clone, Default)]
pub struct RouteHooks {
    hooks: Arc<RwLock<HashMap<ScheduleId, Vec<HookEntry>>>>,
}

impl API for RouteHooks {}

impl RouteHooks {
    /// Creates an empty hook table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an observer for one or more schedules.
    ///
    /// For a tuple of schedules each registration is named
    /// `"{name}@{schedule}"`.
    pub fn register_observer<S, F>(
        &self,
        name: impl Into<String>,
        hook: F,
    ) -> Result<&Self, HookRegistrationError>
    where
        S: IntoScheduleIds,
        F: Fn(&RouteEvent) + Send + Sync + 'static,
    {
        let schedules = S::schedule_ids();
        let name = name.into();
        let hook: Hook = Arc::new(hook);

        for schedule in &schedules {
            let hook_name = if schedules.len() > 1 {
                format!("{}@{}", name, schedule.short_name())
            } else {
                name.clone()
            };
            self.register_arc(*schedule, hook_name, Arc::clone(&hook))?;
        }
        Ok(self)
    }

    fn register_arc(
        &self,
        schedule: ScheduleId,
        name: String,
        hook: Hook,
    ) -> Result<(), HookRegistrationError> {
        let mut hooks = self.hooks.write();
        let entries = hooks.entry(schedule).or_default();

        if entries.iter().any(|entry| entry.name == name) {
            return Err(HookRegistrationError::DuplicateName { schedule, name });
        }

        entries.push(HookEntry { name, hook });
        Ok(())
    }

    /// Invokes every hook on the event's schedule, in registration order.
    ///
    /// The table lock is released before the first hook runs, so hooks may
    /// register further hooks.
    pub fn invoke(&self, event: &RouteEvent) {
        let schedule = event.schedule();
        let hooks: Vec<Hook> = {
            let table = self.hooks.read();
            match table.get(&schedule) {
                Some(entries) => entries.iter().map(|entry| Arc::clone(&entry.hook)).collect(),
                None => return,
            }
        };

        for hook in hooks {
            hook(event);
        }
    }

    /// Removes a hook by name. Returns true if it existed.
    pub fn remove_hook(&self, schedule: ScheduleId, name: &str) -> bool {
        let mut hooks = self.hooks.write();
        let Some(entries) = hooks.get_mut(&schedule) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|entry| entry.name != name);
        entries.len() != before
    }

    /// Returns the number of hooks registered for the schedule.
    #[must_use]
    pub fn hook_count(&self, schedule: ScheduleId) -> usize {
        let hooks = self.hooks.read();
        hooks.get(&schedule).map_or(0, Vec::len)
    }

    /// Checks if a hook with the given name exists on the schedule.
    #[must_use]
    pub fn contains_hook(&self, schedule: ScheduleId, name: &str) -> bool {
        let hooks = self.hooks.read();
        hooks
            .get(&schedule)
            .is_some_and(|entries| entries.iter().any(|entry| entry.name == name))
    }
}

impl fmt::Debug for RouteHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hooks = self.hooks.read();
        let count: usize = hooks.values().map(Vec::len).sum();
        f.debug_struct("RouteHooks")
            .field("schedules", &hooks.len())
            .field("hooks", &count)
            .finish_non_exhaustive()
    }
}
