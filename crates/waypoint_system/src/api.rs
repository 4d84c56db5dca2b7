//! API trait for capability registration.
//!
//! APIs are build-time registries that plugins use to expose capabilities
//! to other plugins. The router registry and the lifecycle hook table are
//! both APIs: route plugins reach them through `server.api::<A>()` while the
//! server is building, and they stay reachable afterwards for lookups.
//!
//! # API vs Global
//!
//! | Aspect | API | Global |
//! |--------|-----|--------|
//! | **Purpose** | Plugin orchestration | Read-only runtime state |
//! | **Access method** | `server.api::<A>()` | `server.get_global::<R>()` |
//! | **Mutation** | Interior mutability during build | Never |
//!
//! # Interior Mutability Pattern
//!
//! APIs that accept registrations use interior mutability so that plugins
//! only need `&Server`:
//!
//! ```ignore
//! pub struct RouterRegistry {
//!     writer: Mutex<()>,
//!     snapshot: ArcSwap<RegistrySnapshot>,
//! }
//!
//! impl API for RouterRegistry {}
//! ```

/// Marker trait for capability APIs.
///
/// ```ignore
/// use waypoint_system::api::API;
///
/// pub struct MyAPI { /* ... */ }
///
/// impl API for MyAPI {}
/// ```
pub trait API: Send + Sync + 'static {}
