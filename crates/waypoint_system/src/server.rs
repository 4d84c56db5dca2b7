//! Server runtime for plugin orchestration.
//!
//! The [`Server`] owns the plugins of a navigation host together with the
//! APIs and globals they install. It is intentionally minimal: it orders
//! plugins, runs their lifecycle phases, and stores what they insert.
//!
//! # Lifecycle
//!
//! 1. **Dependency Resolution** - Validate and topologically sort plugins
//! 2. **Build Phase** - Call `plugin.build()` in dependency order
//! 3. **Ready Phase** - Call `plugin.ready()` in dependency order
//! 4. **Cleanup Phase** - Call `plugin.cleanup()` in reverse order
//!
//! The two-phase build/ready split is what lets the routing plugin accept
//! registrations from every feature plugin before it freezes the registry.

use crate::api::API;
use crate::plugin::{Plugin, PluginId, Plugins};
use crate::resource::GlobalResource;
use core::any::{Any, TypeId};
use hashbrown::{HashMap, HashSet};

/// Type-erased value stored by the server.
type Boxed = Box<dyn Any + Send + Sync>;

/// Build state of the server: `NotStarted` → `Building` → `Built`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum BuildState {
    #[default]
    NotStarted,
    Building,
    Built,
}

/// The runtime that orchestrates plugins and stores their APIs and globals.
///
/// # Example
///
/// ```ignore
/// let mut server = Server::new();
/// server
///     .add_plugins(TracingPlugin::default())
///     .add_plugins(RoutingPlugin::new(executor))
///     .add_plugins(CheckoutScreensPlugin);
/// server.finish();
///
/// let navigator = server.get_global::<Navigator>().unwrap();
/// ```
pub struct Server {
    /// Read-only values inserted via [`insert_global()`](Self::insert_global).
    globals: HashMap<TypeId, Boxed>,

    /// Build-time registries inserted via [`insert_api()`](Self::insert_api).
    apis: HashMap<TypeId, Boxed>,

    /// Plugins pending build (not yet sorted).
    pending_plugins: Vec<PluginEntry>,

    /// Plugins that have been built, in dependency order.
    built_plugins: Vec<PluginEntry>,

    /// Plugin IDs already added, for duplicate detection.
    plugin_ids: HashSet<PluginId>,

    build_state: BuildState,
}

/// Internal entry for a registered plugin.
struct PluginEntry {
    id: PluginId,
    plugin: Box<dyn Plugin>,
    /// Cached for error messages.
    name: String,
}

impl Default for Server {
    fn default() -> Self {
        Self::new()
    }
}

impl Server {
    /// Creates a new empty server.
    #[must_use]
    pub fn new() -> Self {
        Self {
            globals: HashMap::new(),
            apis: HashMap::new(),
            pending_plugins: Vec::new(),
            built_plugins: Vec::new(),
            plugin_ids: HashSet::new(),
            build_state: BuildState::NotStarted,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Plugin Management
    // ─────────────────────────────────────────────────────────────────────────

    /// Adds one or more plugins to the server.
    ///
    /// # Panics
    ///
    /// Panics if a unique plugin is added twice.
    pub fn add_plugins<P: Plugins>(&mut self, plugins: P) -> &mut Self {
        plugins.add_to_server(self);
        self
    }

    /// Adds a boxed plugin with its captured ID.
    pub(crate) fn add_plugin_boxed(&mut self, id: PluginId, plugin: Box<dyn Plugin>) {
        let name = plugin.name().to_string();

        if plugin.is_unique() && self.plugin_ids.contains(&id) {
            panic!(
                "Plugin '{name}' is unique and was already added.\n\
                 If you intended to add this plugin multiple times, \
                 set `is_unique()` to return `false`."
            );
        }
        self.plugin_ids.insert(id);

        let entry = PluginEntry { id, plugin, name };

        // Plugins added from inside build() are built on the spot.
        if self.build_state == BuildState::Building {
            entry.plugin.build(self);
            self.built_plugins.push(entry);
        } else {
            self.pending_plugins.push(entry);
        }
    }

    /// Returns true if a plugin of the given type has been added.
    #[must_use]
    pub fn has_plugin<P: Plugin>(&self) -> bool {
        self.plugin_ids.contains(&PluginId::of::<P>())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Globals
    // ─────────────────────────────────────────────────────────────────────────

    /// Inserts a global, returning the previous value of the same type.
    pub fn insert_global<R: GlobalResource>(&mut self, resource: R) -> Option<R> {
        self.globals
            .insert(TypeId::of::<R>(), Box::new(resource))
            .and_then(|old| old.downcast::<R>().ok())
            .map(|boxed| *boxed)
    }

    /// Returns true if a global of type `R` exists.
    #[must_use]
    pub fn contains_global<R: GlobalResource>(&self) -> bool {
        self.globals.contains_key(&TypeId::of::<R>())
    }

    /// Gets a reference to a global.
    #[must_use]
    pub fn get_global<R: GlobalResource>(&self) -> Option<&R> {
        self.globals
            .get(&TypeId::of::<R>())
            .and_then(|boxed| boxed.downcast_ref::<R>())
    }

    /// Removes a global and returns it.
    pub fn remove_global<R: GlobalResource>(&mut self) -> Option<R> {
        self.globals
            .remove(&TypeId::of::<R>())
            .and_then(|boxed| boxed.downcast::<R>().ok())
            .map(|boxed| *boxed)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // API Access
    // ─────────────────────────────────────────────────────────────────────────

    /// Inserts an API, returning the previous value of the same type.
    ///
    /// ```ignore
    /// fn build(&self, server: &mut Server) {
    ///     server.insert_api(RouteHooks::new());
    /// }
    /// ```
    pub fn insert_api<A: API>(&mut self, api: A) -> Option<A> {
        self.apis
            .insert(TypeId::of::<A>(), Box::new(api))
            .and_then(|old| old.downcast::<A>().ok())
            .map(|boxed| *boxed)
    }

    /// Gets a reference to an API.
    #[must_use]
    pub fn api<A: API>(&self) -> Option<&A> {
        self.apis
            .get(&TypeId::of::<A>())
            .and_then(|boxed| boxed.downcast_ref::<A>())
    }

    /// Returns true if an API of type `A` exists.
    #[must_use]
    pub fn contains_api<A: API>(&self) -> bool {
        self.apis.contains_key(&TypeId::of::<A>())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Returns whether [`finish()`](Self::finish) has completed.
    #[must_use]
    pub fn is_built(&self) -> bool {
        self.build_state == BuildState::Built
    }

    /// Builds all plugins, then readies them, in dependency order.
    ///
    /// # Panics
    ///
    /// - If a plugin's dependency is not satisfied
    /// - If there is a circular dependency between plugins
    /// - If called more than once
    pub fn finish(&mut self) {
        if self.build_state != BuildState::NotStarted {
            panic!("Server::finish() was already called. Cannot build twice.");
        }

        let sorted_plugins = self.sort_plugins_by_dependencies();

        self.build_state = BuildState::Building;
        for entry in sorted_plugins {
            entry.plugin.build(self);
            self.built_plugins.push(entry);
        }

        // ready() takes &mut Server, so the built list is moved out while it runs.
        let mut readied = core::mem::take(&mut self.built_plugins);
        for entry in &readied {
            entry.plugin.ready(self);
        }
        loop {
            let late = core::mem::take(&mut self.built_plugins);
            if late.is_empty() {
                break;
            }
            for entry in &late {
                entry.plugin.ready(self);
            }
            readied.extend(late);
        }
        self.built_plugins = readied;

        self.build_state = BuildState::Built;
    }

    /// Cleans up all plugins in reverse dependency order.
    pub fn cleanup(&mut self) {
        let plugins = core::mem::take(&mut self.built_plugins);
        for entry in plugins.iter().rev() {
            entry.plugin.cleanup(self);
        }
        self.built_plugins = plugins;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internal: Dependency Resolution
    // ─────────────────────────────────────────────────────────────────────────

    /// Sorts pending plugins by dependencies using Kahn's algorithm.
    ///
    /// # Panics
    ///
    /// - If a plugin's dependency is not found
    /// - If there is a circular dependency
    fn sort_plugins_by_dependencies(&mut self) -> Vec<PluginEntry> {
        let pending = core::mem::take(&mut self.pending_plugins);
        let n = pending.len();
        if n == 0 {
            return Vec::new();
        }

        let id_to_index: HashMap<PluginId, usize> = pending
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry.id, i))
            .collect();

        let mut in_degree = vec![0usize; n];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];

        for (i, entry) in pending.iter().enumerate() {
            for dep_id in entry.plugin.dependencies() {
                if let Some(&dep_idx) = id_to_index.get(&dep_id) {
                    dependents[dep_idx].push(i);
                    in_degree[i] += 1;
                } else if !self.built_plugins.iter().any(|p| p.id == dep_id) {
                    let dep_name = dep_id.type_name();
                    panic!(
                        "Plugin '{}' requires '{}' which was not added.\n\
                         Add {} before calling finish().",
                        entry.name, dep_name, dep_name
                    );
                }
            }
        }

        // Seed in reverse so that independent plugins keep insertion order.
        let mut queue: Vec<usize> = (0..n).rev().filter(|&i| in_degree[i] == 0).collect();
        let mut sorted_indices: Vec<usize> = Vec::with_capacity(n);

        while let Some(idx) = queue.pop() {
            sorted_indices.push(idx);
            for &dependent_idx in dependents[idx].iter().rev() {
                in_degree[dependent_idx] -= 1;
                if in_degree[dependent_idx] == 0 {
                    queue.push(dependent_idx);
                }
            }
        }

        if sorted_indices.len() != n {
            let in_cycle: Vec<&str> = in_degree
                .iter()
                .enumerate()
                .filter(|(_, deg)| **deg > 0)
                .map(|(i, _)| pending[i].name.as_str())
                .collect();

            panic!(
                "Circular dependency detected among plugins: {in_cycle:?}\n\
                 Break the cycle by extracting shared functionality into a separate plugin."
            );
        }

        let mut slots: Vec<Option<PluginEntry>> = pending.into_iter().map(Some).collect();
        sorted_indices
            .into_iter()
            .filter_map(|idx| slots[idx].take())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct Log(Arc<Mutex<Vec<String>>>);
    impl GlobalResource for Log {}

    struct Recorder {
        label: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Plugin for Recorder {
        fn build(&self, _server: &mut Server) {
            self.log.lock().unwrap().push(format!("build:{}", self.label));
        }

        fn ready(&self, _server: &mut Server) {
            self.log.lock().unwrap().push(format!("ready:{}", self.label));
        }

        fn cleanup(&self, _server: &mut Server) {
            self.log.lock().unwrap().push(format!("cleanup:{}", self.label));
        }

        fn is_unique(&self) -> bool {
            false
        }
    }

    #[test]
    fn globals_round_trip() {
        let mut server = Server::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        assert!(server.insert_global(Log(Arc::clone(&log))).is_none());
        assert!(server.contains_global::<Log>());
        assert!(server.get_global::<Log>().is_some());
        assert!(server.remove_global::<Log>().is_some());
        assert!(!server.contains_global::<Log>());
    }

    #[test]
    fn phases_run_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut server = Server::new();
        server
            .add_plugins(Recorder {
                label: "a",
                log: Arc::clone(&log),
            })
            .add_plugins(Recorder {
                label: "b",
                log: Arc::clone(&log),
            });
        server.finish();
        server.cleanup();

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "build:a",
                "build:b",
                "ready:a",
                "ready:b",
                "cleanup:b",
                "cleanup:a"
            ]
        );
        assert!(server.is_built());
    }

    #[test]
    #[should_panic(expected = "already called")]
    fn finish_twice_panics() {
        let mut server = Server::new();
        server.finish();
        server.finish();
    }
}
