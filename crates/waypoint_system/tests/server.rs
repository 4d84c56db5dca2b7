//! Integration tests for `Server` plugin orchestration.
//!
//! - Dependency ordering for build/ready
//! - Missing and circular dependency detection
//! - Unique plugin enforcement
//! - API storage with interior mutability

use std::sync::{Arc, Mutex};

use waypoint_system::api::API;
use waypoint_system::plugin::{Plugin, PluginGroup, PluginGroupBuilder, PluginId};
use waypoint_system::server::Server;

// ─────────────────────────────────────────────────────────────────────────────
// Test Plugins
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct ScreenCatalog {
    names: Mutex<Vec<&'static str>>,
}

impl API for ScreenCatalog {}

impl ScreenCatalog {
    fn add(&self, name: &'static str) {
        self.names.lock().unwrap().push(name);
    }
}

struct CatalogPlugin;

impl Plugin for CatalogPlugin {
    fn build(&self, server: &mut Server) {
        server.insert_api(ScreenCatalog::default());
    }
}

struct SettingsScreensPlugin;

impl Plugin for SettingsScreensPlugin {
    fn build(&self, server: &mut Server) {
        server
            .api::<ScreenCatalog>()
            .expect("CatalogPlugin must be built first")
            .add("settings");
    }

    fn dependencies(&self) -> Vec<PluginId> {
        vec![PluginId::of::<CatalogPlugin>()]
    }
}

struct ProfileScreensPlugin;

impl Plugin for ProfileScreensPlugin {
    fn build(&self, server: &mut Server) {
        server
            .api::<ScreenCatalog>()
            .expect("CatalogPlugin must be built first")
            .add("profile");
    }

    fn dependencies(&self) -> Vec<PluginId> {
        vec![PluginId::of::<CatalogPlugin>()]
    }
}

struct CycleA;
impl Plugin for CycleA {
    fn build(&self, _server: &mut Server) {}
    fn dependencies(&self) -> Vec<PluginId> {
        vec![PluginId::of::<CycleB>()]
    }
}

struct CycleB;
impl Plugin for CycleB {
    fn build(&self, _server: &mut Server) {}
    fn dependencies(&self) -> Vec<PluginId> {
        vec![PluginId::of::<CycleA>()]
    }
}

struct FeatureScreens;

impl PluginGroup for FeatureScreens {
    fn build(self) -> PluginGroupBuilder {
        PluginGroupBuilder::new()
            .add(SettingsScreensPlugin)
            .add(ProfileScreensPlugin)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn dependencies_are_built_first() {
    let mut server = Server::new();
    server
        .add_plugins(SettingsScreensPlugin)
        .add_plugins(CatalogPlugin);
    server.finish();

    let catalog = server.api::<ScreenCatalog>().unwrap();
    assert_eq!(*catalog.names.lock().unwrap(), vec!["settings"]);
}

#[test]
fn plugin_group_adds_all_members() {
    let mut server = Server::new();
    server
        .add_plugins(CatalogPlugin)
        .add_plugins(FeatureScreens.build());
    server.finish();

    assert!(server.has_plugin::<SettingsScreensPlugin>());
    assert!(server.has_plugin::<ProfileScreensPlugin>());
    let names = server.api::<ScreenCatalog>().unwrap().names.lock().unwrap().clone();
    assert_eq!(names, vec!["settings", "profile"]);
}

#[test]
fn disabled_group_member_is_skipped() {
    let mut server = Server::new();
    server
        .add_plugins(CatalogPlugin)
        .add_plugins(FeatureScreens.build().disable::<ProfileScreensPlugin>());
    server.finish();

    assert!(!server.has_plugin::<ProfileScreensPlugin>());
}

#[test]
#[should_panic(expected = "which was not added")]
fn missing_dependency_panics() {
    let mut server = Server::new();
    server.add_plugins(SettingsScreensPlugin);
    server.finish();
}

#[test]
#[should_panic(expected = "Circular dependency")]
fn circular_dependency_panics() {
    let mut server = Server::new();
    server.add_plugins(CycleA).add_plugins(CycleB);
    server.finish();
}

#[test]
#[should_panic(expected = "is unique and was already added")]
fn unique_plugin_added_twice_panics() {
    let mut server = Server::new();
    server.add_plugins(CatalogPlugin).add_plugins(CatalogPlugin);
}

#[test]
fn plugin_added_during_build_is_readied() {
    struct Child(Arc<Mutex<bool>>);
    impl Plugin for Child {
        fn build(&self, _server: &mut Server) {}
        fn ready(&self, _server: &mut Server) {
            *self.0.lock().unwrap() = true;
        }
    }

    struct Parent(Arc<Mutex<bool>>);
    impl Plugin for Parent {
        fn build(&self, server: &mut Server) {
            server.add_plugins(Child(Arc::clone(&self.0)));
        }
    }

    let flag = Arc::new(Mutex::new(false));
    let mut server = Server::new();
    server.add_plugins(Parent(Arc::clone(&flag)));
    server.finish();

    assert!(*flag.lock().unwrap());
}
