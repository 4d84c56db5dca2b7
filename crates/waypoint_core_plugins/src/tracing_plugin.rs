//! Tracing and observability plugin.
//!
//! Provides [`TracingPlugin`] which installs the `tracing` subscriber and
//! exposes its configuration as a global.
//!
//! # Lifecycle
//!
//! - **`build()`** inserts the [`TracingConfig`] global so other plugins can
//!   read the intended configuration during build.
//! - **`ready()`** installs the subscriber. The routing plugin logs its
//!   registry summary from its own `ready()`, so list this plugin first to
//!   see it.
//!
//! # Example
//!
//! ```
//! use waypoint_system::server::Server;
//! use waypoint_core_plugins::{TracingConfig, TracingFormat, TracingPlugin};
//! use tracing::Level;
//!
//! let mut server = Server::new();
//! server.add_plugins(
//!     TracingPlugin::default()
//!         .with_level(Level::WARN)
//!         .with_router_level(Level::DEBUG)
//!         .with_format(TracingFormat::Compact),
//! );
//! server.finish();
//!
//! let config = server.get_global::<TracingConfig>().unwrap();
//! assert_eq!(config.router_level, Some(Level::DEBUG));
//! ```

use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use waypoint_system::plugin::Plugin;
use waypoint_system::resource::GlobalResource;
use waypoint_system::server::Server;

/// Log target of the router crate.
const ROUTER_TARGET: &str = "waypoint_router";

// ─────────────────────────────────────────────────────────────────────────────
// TracingFormat
// ─────────────────────────────────────────────────────────────────────────────

/// Tracing output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingFormat {
    /// Human-readable colored output (default).
    #[default]
    Pretty,
    /// Compact single-line output.
    Compact,
    /// JSON structured output for log aggregation.
    Json,
}

// ─────────────────────────────────────────────────────────────────────────────
// TracingConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Tracing configuration global.
///
/// Screen plugins can read this during `build()` to decide how chatty their
/// own hooks should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TracingConfig {
    /// The configured default log level.
    pub level: Level,
    /// Level for router registration and state transitions, if overridden.
    pub router_level: Option<Level>,
    /// The configured output format.
    pub format: TracingFormat,
}

impl TracingConfig {
    /// Returns true if router debug events are emitted.
    #[must_use]
    pub fn logs_route_transitions(&self) -> bool {
        self.router_level.unwrap_or(self.level) >= Level::DEBUG
    }
}

impl GlobalResource for TracingConfig {}

// ─────────────────────────────────────────────────────────────────────────────
// TracingPlugin
// ─────────────────────────────────────────────────────────────────────────────

/// Tracing and logging plugin.
///
/// Installs a [`tracing_subscriber`] registry with an [`EnvFilter`] and a
/// formatting layer.
///
/// # Filter Resolution
///
/// 1. An explicit [`with_env_filter`](Self::with_env_filter) string wins.
/// 2. Otherwise `RUST_LOG`, when set and valid.
/// 3. Otherwise the configured level, plus the router override if any.
///
/// # Globals Provided
///
/// | Global | Description |
/// |--------|-------------|
/// | [`TracingConfig`] | Tracing configuration (read-only) |
///
/// # Configuration Options
///
/// ```
/// use waypoint_core_plugins::{TracingFormat, TracingPlugin};
/// use tracing::Level;
///
/// // Development: route transitions visible, everything else at info
/// let dev_plugin = TracingPlugin::default()
///     .with_router_level(Level::DEBUG)
///     .with_span_events(true);
///
/// // Production: JSON output for log aggregation
/// let prod_plugin = TracingPlugin::default()
///     .with_format(TracingFormat::Json)
///     .with_env_filter("waypoint_router=warn,info");
/// ```
#[derive(Debug, Clone)]
pub struct TracingPlugin {
    /// Default log level.
    level: Level,
    /// Level for the router crate.
    router_level: Option<Level>,
    /// Output format.
    format: TracingFormat,
    /// Filter string (e.g., "`waypoint_router=debug,info`").
    env_filter: Option<String>,
    /// Whether to include span events (enter/exit).
    span_events: bool,
}

impl Default for TracingPlugin {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            router_level: None,
            format: TracingFormat::Pretty,
            env_filter: None,
            span_events: false,
        }
    }
}

impl TracingPlugin {
    /// Creates a new `TracingPlugin` with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default log level.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Sets the level for router registration and state transitions.
    #[must_use]
    pub fn with_router_level(mut self, level: Level) -> Self {
        self.router_level = Some(level);
        self
    }

    /// Sets the output format.
    #[must_use]
    pub fn with_format(mut self, format: TracingFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets an explicit filter string, overriding `RUST_LOG` and the levels.
    ///
    /// Format: `target=level,target=level,...`
    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Enables span enter/exit events in output.
    #[must_use]
    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    /// Filter directives built from the configured levels.
    fn level_directives(&self) -> String {
        match self.router_level {
            Some(router) => format!("{},{ROUTER_TARGET}={}", self.level, router),
            None => self.level.to_string(),
        }
    }

    fn env_filter(&self) -> EnvFilter {
        let fallback = || EnvFilter::new(self.level_directives());
        match &self.env_filter {
            Some(filter) => EnvFilter::try_new(filter).unwrap_or_else(|err| {
                // No subscriber yet, so this goes nowhere unless the host
                // installed its own.
                tracing::warn!(%err, %filter, "invalid tracing filter, using configured levels");
                fallback()
            }),
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback()),
        }
    }
}

impl Plugin for TracingPlugin {
    fn build(&self, server: &mut Server) {
        server.insert_global(TracingConfig {
            level: self.level,
            router_level: self.router_level,
            format: self.format,
        });
    }

    fn ready(&self, _server: &mut Server) {
        let env_filter = self.env_filter();
        let span_events = if self.span_events {
            FmtSpan::ENTER | FmtSpan::EXIT
        } else {
            FmtSpan::NONE
        };

        // try_init fails when a global subscriber is already set; keep it.
        let installed = match self.format {
            TracingFormat::Pretty => tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_span_events(span_events),
                )
                .try_init()
                .is_ok(),
            TracingFormat::Compact => tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .compact()
                        .with_span_events(span_events),
                )
                .try_init()
                .is_ok(),
            TracingFormat::Json => tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_span_events(span_events),
                )
                .try_init()
                .is_ok(),
        };

        tracing::info!(
            level = %self.level,
            router_level = ?self.router_level,
            format = ?self.format,
            installed,
            "TracingPlugin initialized"
        );
    }

    fn cleanup(&self, _server: &mut Server) {
        tracing::info!("TracingPlugin shutting down");
    }
}
