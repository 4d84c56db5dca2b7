//! Navigator entry points: resolution failures, existing destinations,
//! auto-creation, hooks, and plugin wiring.


use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use test_utils::{
    BadgeView, BrokenInput, DetailInput, DetailRouter, DetailScreen, ExternalRouter,
    ExternalScreen, LegacyDetailInput, RecordingExecutor, TestSource, navigator,
};
use waypoint_router::prelude::*;
use waypoint_system::plugin::{Plugin, PluginId, ScheduleId};
use waypoint_system::server::Server;

fn detail_type(navigator: &Navigator) -> RouterType {
    navigator
        .registry()
        .router_type::<DetailRouter>()
        .expect("DetailRouter should be registered")
}

/// Collects the name of every hook event in order.
fn record_events(hooks: &RouteHooks) -> Arc<Mutex<Vec<&'static str>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    hooks
        .register_observer::<(
            OnRouteWillPerform,
            OnRouteDidPerform,
            OnRouteWillRemove,
            OnRouteDidRemove,
            OnRouteError,
        ), _>("recorder", move |event: &RouteEvent| {
            let name = match event {
                RouteEvent::WillPerform { .. } => "will perform",
                RouteEvent::DidPerform { .. } => "did perform",
                RouteEvent::WillRemove { .. } => "will remove",
                RouteEvent::DidRemove { .. } => "did remove",
                RouteEvent::Error { .. } => "error",
            };
            sink.lock().unwrap().push(name);
        })
        .expect("recorder should register once");
    events
}

// ═══════════════════════════════════════════════════════════════════════════════
// RESOLUTION
// ═══════════════════════════════════════════════════════════════════════════════

trait UnknownInput: Send + Sync {}

#[test]
fn unregistered_capability_skips_configuration() {
    let (navigator, executor) = navigator();
    let errors = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&errors);
    navigator
        .hooks()
        .register_observer::<OnRouteError, _>("errors", move |event: &RouteEvent| {
            if let RouteEvent::Error { router, action, .. } = event {
                sink.lock().unwrap().push((router.is_none(), *action));
            }
        })
        .expect("register");

    let configured = AtomicBool::new(false);
    let source = TestSource::bare();
    let err = navigator
        .perform_with(
            &CapabilityId::view::<dyn UnknownInput>(),
            RoutePath::present_modally_from(&source),
            |_| configured.store(true, Ordering::SeqCst),
        )
        .expect_err("nothing registered");

    assert!(matches!(err, RouteError::NotRegistered { .. }));
    assert!(!configured.load(Ordering::SeqCst));
    assert_eq!(*errors.lock().unwrap(), vec![(true, RouteAction::Resolve)]);
    assert!(executor.calls().is_empty());
}

#[test]
fn typed_access_requires_conformance() {
    let registry = RouterRegistry::new();
    registry
        .register_view::<dyn DetailInput, DetailRouter>()
        .register_destination::<DetailScreen, DetailRouter>()
        .register_view_adapter::<dyn LegacyDetailInput, dyn DetailInput>();
    registry.finish_registration();
    let navigator = Navigator::new(registry, RecordingExecutor::new());
    let source = TestSource::bare();

    let err = navigator
        .perform_view::<dyn LegacyDetailInput>(RoutePath::present_modally_from(&source), |_| {})
        .expect_err("adaptee does not provide the adapter");
    assert!(matches!(err, RouteError::CapabilityNotProvided { .. }));

    navigator
        .perform(
            &CapabilityId::view::<dyn LegacyDetailInput>(),
            RoutePath::present_modally_from(&source),
        )
        .expect("untyped routing still works");
}

#[test]
fn make_destination_reports_failed_driver() {
    let (navigator, _executor) = navigator();
    let err = navigator
        .make_destination::<dyn BrokenInput>(|_| {})
        .err()
        .expect("driver makes nothing");
    assert!(matches!(err, RouteError::MakeDestinationFailed { .. }));
}

#[test]
fn completion_sees_single_success() {
    let (navigator, _executor) = navigator();
    let completions = Arc::new(AtomicUsize::new(0));
    let sink = Arc::clone(&completions);
    let source = TestSource::in_navigation();

    navigator
        .perform_with_completion(
            &CapabilityId::view::<dyn DetailInput>(),
            RoutePath::push_from(&source),
            move |result, action| {
                assert!(result.is_ok());
                assert_eq!(action, RouteAction::Perform);
                sink.fetch_add(1, Ordering::SeqCst);
            },
        )
        .expect("push should succeed");
    assert_eq!(completions.load(Ordering::SeqCst), 1);
}

// ═══════════════════════════════════════════════════════════════════════════════
// EXISTING DESTINATIONS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn prepared_destination_is_presented_as_is() {
    let (navigator, executor) = navigator();
    let screen = Arc::new(DetailScreen::default());
    let source = TestSource::bare();

    let router = navigator
        .prepare_destination(
            &detail_type(&navigator),
            Arc::clone(&screen) as ErasedDestination,
            RoutePath::present_modally_from(&source),
            |config| {
                config.on_prepare_as::<DetailScreen>(|screen| {
                    screen.caller_prepared.store(true, Ordering::SeqCst);
                });
            },
        )
        .expect("destination class matches");

    assert_eq!(router.state(), RouterState::Unrouted);
    assert!(screen.is_prepared());
    assert!(screen.caller_prepared.load(Ordering::SeqCst));
    assert_eq!(executor.present_count(), 0);

    router.perform().expect("perform should succeed");
    let routed = router.destination_as::<DetailScreen>().expect("destination");
    assert!(Arc::ptr_eq(&routed, &screen));
}

#[test]
fn prepared_destination_survives_failed_perform() {
    let (navigator, executor) = navigator();
    let screen = Arc::new(DetailScreen::default());
    let source = TestSource::bare();
    let router = navigator
        .prepare_destination(
            &detail_type(&navigator),
            Arc::clone(&screen) as ErasedDestination,
            RoutePath::present_modally_from(&source),
            |_| {},
        )
        .expect("destination class matches");

    executor.fail_next_present(PresentationError::failed("busy"));
    assert!(router.perform().is_err());
    router.perform().expect("retry should succeed");

    let routed = router.destination_as::<DetailScreen>().expect("destination");
    assert!(Arc::ptr_eq(&routed, &screen));
}

#[test]
fn foreign_destination_is_rejected() {
    let (navigator, _executor) = navigator();
    let events = record_events(navigator.hooks());
    let source = TestSource::bare();

    let err = navigator
        .perform_on_destination(
            &detail_type(&navigator),
            Arc::new(BadgeView),
            RoutePath::present_modally_from(&source),
            |_| {},
        )
        .expect_err("badge is not a detail screen");

    assert!(matches!(err, RouteError::DestinationMismatch { .. }));
    assert_eq!(*events.lock().unwrap(), vec!["error"]);
}

// ═══════════════════════════════════════════════════════════════════════════════
// AUTO-CREATION
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn auto_created_router_starts_routed() {
    let (navigator, executor) = navigator();
    let source = TestSource::bare();
    let screen = Arc::new(DetailScreen::default());

    let router = navigator
        .auto_create(
            Arc::clone(&screen) as ErasedDestination,
            Some(SourceRef::new(&source)),
            RealRouteType::PresentModally,
        )
        .router()
        .expect("DetailScreen is registered");

    assert!(router.is_auto_created());
    assert_eq!(router.state(), RouterState::Routed);
    assert_eq!(router.route_type(), RouteType::PresentModally);
    assert!(screen.is_prepared());

    assert!(router.can_remove());
    router.remove().expect("dismiss is reversible");
    assert_eq!(
        executor.calls(),
        vec![test_utils::ExecutorCall::Dismiss {
            action: RemoveAction::Dismiss,
            real_route_type: RealRouteType::PresentModally,
        }]
    );
}

#[test]
fn auto_created_push_cannot_be_removed() {
    let (navigator, executor) = navigator();
    let source = TestSource::in_navigation();

    let router = navigator
        .auto_create(
            Arc::new(DetailScreen::default()),
            Some(SourceRef::new(&source)),
            RealRouteType::Push,
        )
        .router()
        .expect("DetailScreen is registered");

    assert_eq!(router.remove_action(), Some(RemoveAction::Pop));
    assert!(!router.can_remove());
    assert!(matches!(
        router.remove(),
        Err(RouteError::CannotRemove {
            reason: "the router did not observe the forward transition"
        })
    ));
    assert_eq!(executor.dismiss_count(), 0);
}

#[test]
fn unknown_destination_is_unmanaged() {
    let (navigator, _executor) = navigator();
    let outcome = navigator.auto_create(Arc::new(7_u32), None, RealRouteType::PresentModally);
    assert!(matches!(outcome, AutoCreateOutcome::Unmanaged));
}

fn external_navigator() -> (Navigator, Arc<Mutex<Vec<Option<&'static str>>>>) {
    let driver = ExternalRouter::default();
    let tokens = Arc::clone(&driver.prepared_tokens);
    let registry = RouterRegistry::new();
    registry.register_driver(driver).destination();
    registry.finish_registration();
    (Navigator::new(registry, RecordingExecutor::new()), tokens)
}

#[test]
fn source_prepares_external_destination() {
    let (navigator, tokens) = external_navigator();
    let source = TestSource::bare();

    let outcome = navigator.auto_create(
        Arc::new(ExternalScreen),
        Some(SourceRef::new(&source)),
        RealRouteType::PresentAsPopover,
    );

    assert!(outcome.router().is_some());
    assert_eq!(source.external_prepares(), 1);
    assert_eq!(*tokens.lock().unwrap(), vec![Some("from source")]);
}

#[test]
#[cfg(debug_assertions)]
#[should_panic(expected = "needs preparation but no source was found")]
fn external_destination_without_source_panics() {
    let (navigator, _tokens) = external_navigator();
    let _ = navigator.auto_create(Arc::new(ExternalScreen), None, RealRouteType::PresentModally);
}

// ═══════════════════════════════════════════════════════════════════════════════
// HOOKS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn hooks_follow_route_lifecycle() {
    let (navigator, executor) = navigator();
    let events = record_events(navigator.hooks());
    let source = TestSource::in_navigation();

    let router = navigator
        .perform(&CapabilityId::view::<dyn DetailInput>(), RoutePath::push_from(&source))
        .expect("push should succeed");
    router.remove().expect("pop should succeed");
    assert_eq!(
        *events.lock().unwrap(),
        vec!["will perform", "did perform", "will remove", "did remove"]
    );

    events.lock().unwrap().clear();
    executor.fail_next_present(PresentationError::failed("busy"));
    assert!(router.perform().is_err());
    assert_eq!(*events.lock().unwrap(), vec!["will perform", "error"]);
}

#[test]
fn hook_sees_routing_state() {
    let (navigator, _executor) = navigator();
    let states = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&states);
    navigator
        .hooks()
        .register_observer::<(OnRouteWillPerform, OnRouteDidPerform), _>(
            "states",
            move |event: &RouteEvent| {
                if let Some(router) = event.router() {
                    sink.lock().unwrap().push(router.state);
                }
            },
        )
        .expect("register");

    let source = TestSource::bare();
    navigator
        .perform(
            &CapabilityId::view::<dyn DetailInput>(),
            RoutePath::present_modally_from(&source),
        )
        .expect("present should succeed");
    assert_eq!(
        *states.lock().unwrap(),
        vec![RouterState::Routing, RouterState::Routed]
    );
}

// ═══════════════════════════════════════════════════════════════════════════════
// PLUGIN
// ═══════════════════════════════════════════════════════════════════════════════

struct DetailScreensPlugin;

impl Plugin for DetailScreensPlugin {
    fn build(&self, server: &mut Server) {
        let registry = server
            .api::<RouterRegistry>()
            .expect("RoutingPlugin should build first");
        registry
            .driver::<DetailRouter>()
            .view::<dyn DetailInput>()
            .destination();

        let hooks = server.api::<RouteHooks>().expect("hooks api");
        hooks
            .register_observer::<OnRouteDidPerform, _>("detail_tracker", |_: &RouteEvent| {})
            .expect("register");
    }

    fn dependencies(&self) -> Vec<PluginId> {
        vec![PluginId::of::<RoutingPlugin>()]
    }
}

#[test]
fn plugin_publishes_frozen_navigator() {
    let executor = RecordingExecutor::new();
    let mut server = Server::new();
    server
        .add_plugins(DetailScreensPlugin)
        .add_plugins(RoutingPlugin::new(Arc::clone(&executor) as Arc<dyn PresentationExecutor>));
    server.finish();

    let navigator = server.get_global::<Navigator>().expect("navigator global");
    assert!(navigator.registry().is_registration_finished());
    assert_eq!(
        navigator
            .hooks()
            .hook_count(ScheduleId::of::<OnRouteDidPerform>()),
        1
    );

    let source = TestSource::in_navigation();
    navigator
        .perform(&CapabilityId::view::<dyn DetailInput>(), RoutePath::push_from(&source))
        .expect("push should succeed");
    assert_eq!(executor.present_count(), 1);
}
