//! # OpenTelemetry Console Instrumentation
//!
//! Instrumentation for console/CLI application frameworks. It wraps the
//! framework's command execution in spans and forwards framework log records
//! as events on the active span, so applications get traced command runs
//! without writing any tracing code themselves.
//!
//! The crate owns no span lifecycle, context propagation, or export logic;
//! all of that is delegated to the [`opentelemetry`] API. It only decides
//! *when* a span starts and ends and *which* attributes and events land on
//! it, through two extension points the host framework calls directly:
//!
//! * [`ConsoleInstrumentation`] — a before/after pair around each command
//!   invocation. The "before" half starts a span named `Command <name>` as a
//!   child of the current context and attaches it; the "after" half records
//!   the exit code (and any escaped error) and ends the span. The
//!   [`APP_LONG_RUNNING`](console::APP_LONG_RUNNING) environment variable
//!   disables it entirely for daemon-style processes.
//! * [`LogWatcher`] — receives every log record the framework emits and
//!   appends those at or above the configured minimum level
//!   ([`OTEL_LOG_LEVEL`](logs::OTEL_LOG_LEVEL), default `INFO`) as events on
//!   whatever span is currently active.
//!
//! Instrumentation is fail-open: neither component ever panics or returns an
//! error into the host's control flow.
//!
//! ## Example
//!
//! ```
//! use opentelemetry_instrumentation_console::{
//!     CodeLocation, ConsoleInstrumentation, LogRecord, LogWatcher,
//! };
//! use opentelemetry_sdk::trace::SdkTracerProvider;
//!
//! let provider = SdkTracerProvider::builder().build();
//! let console = ConsoleInstrumentation::new(&provider);
//! let watcher = LogWatcher::new();
//!
//! // The host framework calls this before executing a command...
//! let active = console.begin_command(Some("migrate"), CodeLocation::default());
//!
//! // ...feeds its log stream through the watcher while the command runs...
//! let context = serde_json::Map::new();
//! watcher.record(&LogRecord::new("info", "applying migrations", &context));
//!
//! // ...and hands the guard back once the command returns.
//! if let Some(active) = active {
//!     active.finish(Some(0), None);
//! }
//! ```
#![warn(
    future_incompatible,
    missing_debug_implementations,
    missing_docs,
    nonstandard_style,
    rust_2018_idioms,
    unreachable_pub,
    unused
)]
#![cfg_attr(docsrs, feature(doc_cfg), deny(rustdoc::broken_intra_doc_links))]
#![doc(
    html_logo_url = "https://raw.githubusercontent.com/open-telemetry/opentelemetry-rust/main/assets/logo.svg"
)]

pub mod console;
pub mod logs;

pub use console::{ActiveCommand, CodeLocation, ConsoleInstrumentation};
pub use logs::{LogLevel, LogRecord, LogWatcher};
