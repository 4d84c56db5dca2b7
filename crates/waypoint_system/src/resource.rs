//! Global resource marker.
//!
//! Globals are inserted by plugins while the server builds and are read-only
//! afterwards. The `Navigator` inserted by the routing plugin and the
//! `TracingConfig` inserted by the tracing plugin are globals.

/// Marker for read-only, server-lifetime values.
///
/// # Example
///
/// ```
/// use waypoint_system::resource::GlobalResource;
///
/// struct Theme { dark: bool }
/// impl GlobalResource for Theme {}
/// ```
pub trait GlobalResource: Send + Sync + 'static {}
