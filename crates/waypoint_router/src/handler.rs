//! Process-wide error handler.
//!
//! Every route failure is passed to the global handler in addition to the
//! per-call error callback. The handler is for logging and telemetry; it
//! cannot change the outcome.
//!
//! ```
//! use waypoint_router::handler::{clear_global_error_handler, set_global_error_handler};
//!
//! set_global_error_handler(|router, action, error| {
//!     let name = router.map_or("<none>", |info| info.router);
//!     tracing::error!(router = name, %action, %error, "route failed");
//! });
//! clear_global_error_handler();
//! ```

use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::error::{RouteAction, RouteError};
use crate::router::RouterInfo;

struct ErrorHandlerSlot(Box<dyn Fn(Option<&RouterInfo>, RouteAction, &RouteError) + Send + Sync>);

static GLOBAL_ERROR_HANDLER: ArcSwapOption<ErrorHandlerSlot> = ArcSwapOption::const_empty();

/// Installs the global error handler, replacing any previous one.
pub fn set_global_error_handler<F>(handler: F)
where
    F: Fn(Option<&RouterInfo>, RouteAction, &RouteError) + Send + Sync + 'static,
{
    GLOBAL_ERROR_HANDLER.store(Some(Arc::new(ErrorHandlerSlot(Box::new(handler)))));
}

/// Removes the global error handler.
pub fn clear_global_error_handler() {
    GLOBAL_ERROR_HANDLER.store(None);
}

/// Returns true if a global error handler is installed.
#[must_use]
pub fn has_global_error_handler() -> bool {
    GLOBAL_ERROR_HANDLER.load().is_some()
}

/// Passes a failure to the global handler, if any.
pub(crate) fn report(router: Option<&RouterInfo>, action: RouteAction, error: &RouteError) {
    let handler = GLOBAL_ERROR_HANDLER.load_full();
    if let Some(handler) = handler {
        (handler.0)(router, action, error);
    }
}
