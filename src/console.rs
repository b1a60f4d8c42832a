//! Command span instrumentation for console frameworks.
//!
//! A host framework calls [`ConsoleInstrumentation::begin_command`] before it
//! executes a named command and [`ActiveCommand::finish`] once the command
//! returns. Everything in between runs with the command span attached as the
//! current context, so child spans and [`LogWatcher`] events nest under it.
//!
//! [`LogWatcher`]: crate::logs::LogWatcher

use std::{env, error::Error, fmt, marker::PhantomData};

use opentelemetry::{
    otel_debug,
    trace::{Status, TraceContextExt, Tracer, TracerProvider},
    Context, ContextGuard, KeyValue,
};
#[allow(deprecated)]
use opentelemetry_semantic_conventions::attribute::EXCEPTION_ESCAPED;
use opentelemetry_semantic_conventions::attribute::{
    CODE_FILE_PATH, CODE_FUNCTION_NAME, CODE_LINE_NUMBER, CODE_NAMESPACE, EXCEPTION_MESSAGE,
};

/// Environment variable that disables command spans entirely.
///
/// Long-running processes (queue workers, daemons) execute a single command
/// for their whole lifetime; a per-invocation span is meaningless there.
pub const APP_LONG_RUNNING: &str = "APP_LONG_RUNNING";

const COMMAND_FINISHED_EVENT: &str = "command finished";
const EXIT_CODE_ATTRIBUTE: &str = "exit-code";

fn long_running_process() -> bool {
    env::var(APP_LONG_RUNNING)
        .map(|value| {
            matches!(
                value.trim().to_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            )
        })
        .unwrap_or(false)
}

/// Source location of the command entry point, recorded as `code.*` span
/// attributes.
///
/// Every field is optional; hosts that cannot supply a piece of metadata
/// simply leave it unset and no attribute is recorded for it.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodeLocation<'a> {
    /// Name of the invoked function or method.
    pub function: Option<&'a str>,
    /// Module or type that defines the function.
    pub namespace: Option<&'a str>,
    /// Path of the defining source file.
    pub file: Option<&'a str>,
    /// Line number of the entry point within `file`.
    pub line: Option<u32>,
}

impl CodeLocation<'_> {
    fn attributes(&self) -> Vec<KeyValue> {
        let mut attributes = Vec::with_capacity(4);
        if let Some(function) = self.function {
            attributes.push(KeyValue::new(CODE_FUNCTION_NAME, function.to_owned()));
        }
        if let Some(namespace) = self.namespace {
            attributes.push(KeyValue::new(CODE_NAMESPACE, namespace.to_owned()));
        }
        if let Some(file) = self.file {
            attributes.push(KeyValue::new(CODE_FILE_PATH, file.to_owned()));
        }
        if let Some(line) = self.line {
            attributes.push(KeyValue::new(CODE_LINE_NUMBER, i64::from(line)));
        }
        attributes
    }
}

/// Wraps a console framework's command execution in spans.
///
/// One span is created per command invocation, named `Command <name>` and
/// parented on whatever context is current when the command starts. The
/// instrumentation is disabled wholesale when [`APP_LONG_RUNNING`] is truthy.
pub struct ConsoleInstrumentation<P, T>
where
    P: TracerProvider<Tracer = T>,
    T: Tracer,
{
    tracer: T,
    enabled: bool,
    _provider: PhantomData<P>,
}

impl<P, T> ConsoleInstrumentation<P, T>
where
    P: TracerProvider<Tracer = T>,
    T: Tracer,
    T::Span: Send + Sync + 'static,
{
    /// Create an instrumentation instance, honoring the [`APP_LONG_RUNNING`]
    /// environment gate.
    pub fn new(provider: &P) -> Self {
        Self::with_enabled(provider, !long_running_process())
    }

    /// Create an instrumentation instance with an explicit enabled flag,
    /// bypassing the environment gate.
    pub fn with_enabled(provider: &P, enabled: bool) -> Self {
        if !enabled {
            otel_debug!(name: "ConsoleInstrumentation.Disabled");
        }
        ConsoleInstrumentation {
            tracer: provider.tracer("opentelemetry-instrumentation-console"),
            enabled,
            _provider: PhantomData,
        }
    }

    /// Start a span for the command `name` and attach it as the current
    /// context.
    ///
    /// Returns `None` when the instrumentation is disabled; the host hands
    /// the returned value back through [`ActiveCommand::finish`] either way,
    /// so a disabled enter makes the matching exit a no-op. An empty or
    /// absent name falls back to `"unknown"`.
    pub fn begin_command(
        &self,
        name: Option<&str>,
        source: CodeLocation<'_>,
    ) -> Option<ActiveCommand> {
        if !self.enabled {
            return None;
        }

        let name = match name {
            Some(name) if !name.is_empty() => name,
            _ => "unknown",
        };
        let builder = self
            .tracer
            .span_builder(format!("Command {name}"))
            .with_attributes(source.attributes());

        let parent = Context::current();
        let span = self.tracer.build_with_context(builder, &parent);
        let cx = parent.with_span(span);
        let guard = cx.clone().attach();

        Some(ActiveCommand {
            cx,
            guard: Some(guard),
        })
    }
}

impl<P, T> fmt::Debug for ConsoleInstrumentation<P, T>
where
    P: TracerProvider<Tracer = T>,
    T: Tracer,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleInstrumentation")
            .field("enabled", &self.enabled)
            .finish()
    }
}

/// A command span that is attached as the current context.
///
/// The context is detached exactly once: either by [`finish`], or by `Drop`
/// when the command unwinds before the host reaches its exit hook. Dropping
/// without `finish` still ends the span, so spans never leak on error paths.
///
/// The guard is bound to the thread that started the command, matching the
/// thread-local context it holds open.
///
/// [`finish`]: ActiveCommand::finish
#[must_use = "dropping an ActiveCommand ends its span without recording an exit"]
pub struct ActiveCommand {
    cx: Context,
    guard: Option<ContextGuard>,
}

impl ActiveCommand {
    /// Detach the command context and end the span.
    ///
    /// Records a `command finished` event carrying the exit code when the
    /// host supplies one. When the command escaped with an error, the error
    /// is recorded as an exception event and the span status is set to error
    /// with the error's message; the host's own propagation of that error is
    /// not interfered with.
    #[allow(deprecated)]
    pub fn finish(mut self, exit_code: Option<i32>, error: Option<&dyn Error>) {
        drop(self.guard.take());

        let span = self.cx.span();
        let mut attributes = Vec::with_capacity(1);
        if let Some(code) = exit_code {
            attributes.push(KeyValue::new(EXIT_CODE_ATTRIBUTE, i64::from(code)));
        }
        span.add_event(COMMAND_FINISHED_EVENT, attributes);

        if let Some(error) = error {
            let message = error.to_string();
            span.add_event(
                "exception",
                vec![
                    KeyValue::new(EXCEPTION_MESSAGE, message.clone()),
                    KeyValue::new(EXCEPTION_ESCAPED, true),
                ],
            );
            span.set_status(Status::error(message));
        }

        span.end();
    }
}

impl Drop for ActiveCommand {
    fn drop(&mut self) {
        // Only reached when `finish` was never called, e.g. on unwind.
        if let Some(guard) = self.guard.take() {
            drop(guard);
            self.cx.span().end();
        }
    }
}

impl fmt::Debug for ActiveCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveCommand")
            .field("span_context", self.cx.span().span_context())
            .finish()
    }
}
