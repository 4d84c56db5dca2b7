//! Process-wide error handler tests.
//!
//! The handler is a process global, so every test in this binary holds
//! `HANDLER_LOCK` while it installs one.


use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use test_utils::{DetailInput, DetailRouter, OutcomeLog, TestSource, navigator};
use waypoint_router::handler::has_global_error_handler;
use waypoint_router::prelude::*;

static HANDLER_LOCK: Mutex<()> = Mutex::new(());

trait MissingInput: Send + Sync {}

#[test]
fn handler_sees_router_failures_with_info() {
    let _guard = HANDLER_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    set_global_error_handler(move |router, action, error| {
        sink.lock()
            .unwrap()
            .push((router.map(|info| info.state), action, error.clone()));
    });

    let (navigator, executor) = navigator();
    executor.fail_next_present(PresentationError::failed("busy"));
    let log = OutcomeLog::default();
    let source = TestSource::bare();
    let router_type = navigator
        .registry()
        .router_type::<DetailRouter>()
        .expect("registered");
    let router = navigator.router_with(
        &router_type,
        RoutePath::present_modally_from(&source),
        |config, _| log.attach(config),
    );
    let err = router.perform().expect_err("present fails");
    clear_global_error_handler();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![(Some(RouterState::RouteFailed), RouteAction::Perform, err.clone())]
    );
    assert_eq!(
        log.entries(),
        vec![
            test_utils::Outcome::Error(RouteAction::Perform, err),
            test_utils::Outcome::Completed(RouteAction::Perform, false),
        ]
    );
}

#[test]
fn handler_sees_resolution_failures_without_router() {
    let _guard = HANDLER_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let count = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&count);
    set_global_error_handler(move |router, action, error| {
        assert!(router.is_none());
        assert_eq!(action, RouteAction::Resolve);
        assert!(matches!(error, RouteError::NotRegistered { .. }));
        counter.fetch_add(1, Ordering::SeqCst);
    });
    assert!(has_global_error_handler());

    let (navigator, _executor) = navigator();
    let source = TestSource::bare();
    let result = navigator.perform(
        &CapabilityId::view::<dyn MissingInput>(),
        RoutePath::present_modally_from(&source),
    );
    clear_global_error_handler();

    assert!(result.is_err());
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn successful_routes_are_not_reported() {
    let _guard = HANDLER_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let count = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&count);
    set_global_error_handler(move |_, _, _| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let (navigator, _executor) = navigator();
    let source = TestSource::in_navigation();
    let router = navigator
        .perform(&CapabilityId::view::<dyn DetailInput>(), RoutePath::push_from(&source))
        .expect("push should succeed");
    router.remove().expect("pop should succeed");
    clear_global_error_handler();

    assert_eq!(count.load(Ordering::SeqCst), 0);
}

#[test]
fn cleared_handler_is_not_called() {
    let _guard = HANDLER_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let count = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&count);
    set_global_error_handler(move |_, _, _| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    clear_global_error_handler();
    assert!(!has_global_error_handler());

    let (navigator, _executor) = navigator();
    let source = TestSource::bare();
    let _ = navigator.perform(
        &CapabilityId::view::<dyn MissingInput>(),
        RoutePath::present_modally_from(&source),
    );
    assert_eq!(count.load(Ordering::SeqCst), 0);
}
