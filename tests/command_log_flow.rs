use opentelemetry_instrumentation_console::{
    CodeLocation, ConsoleInstrumentation, LogLevel, LogRecord, LogWatcher,
};
use opentelemetry_sdk::trace::{InMemorySpanExporter, SdkTracerProvider};
use serde_json::{Map, Value};

fn setup() -> (InMemorySpanExporter, SdkTracerProvider) {
    let exporter = InMemorySpanExporter::default();
    let provider = SdkTracerProvider::builder()
        .with_simple_exporter(exporter.clone())
        .build();
    (exporter, provider)
}

#[test]
fn logs_during_a_command_land_on_the_command_span() {
    let (exporter, provider) = setup();
    let console = ConsoleInstrumentation::with_enabled(&provider, true);
    let watcher = LogWatcher::with_min_level(LogLevel::Info);

    let source = CodeLocation {
        function: Some("handle"),
        namespace: Some("app::commands::Migrate"),
        ..CodeLocation::default()
    };
    let active = console
        .begin_command(Some("migrate"), source)
        .expect("instrumentation enabled");

    let mut context = Map::new();
    context.insert("batch".to_owned(), Value::from(1));
    watcher.record(&LogRecord::new("notice", "running migration", &context));
    watcher.record(&LogRecord::new("debug", "filtered out", &context));

    active.finish(Some(0), None);

    let spans = exporter.get_finished_spans().unwrap();
    assert_eq!(spans.len(), 1);
    let span = &spans[0];
    assert_eq!(span.name, "Command migrate");

    let names: Vec<&str> = span.events.iter().map(|event| event.name.as_ref()).collect();
    assert_eq!(names, vec!["running migration", "command finished"]);

    let log_event = &span.events[0];
    let context_attribute = log_event
        .attributes
        .iter()
        .find(|kv| kv.key.as_str() == "context")
        .map(|kv| kv.value.as_str().into_owned());
    assert_eq!(context_attribute.as_deref(), Some(r#"{"batch":1}"#));
}

#[test]
fn logs_outside_a_command_are_dropped() {
    let (exporter, provider) = setup();
    let console = ConsoleInstrumentation::with_enabled(&provider, true);
    let watcher = LogWatcher::with_min_level(LogLevel::Info);

    let active = console
        .begin_command(Some("migrate"), CodeLocation::default())
        .expect("instrumentation enabled");
    active.finish(Some(0), None);

    let context = Map::new();
    watcher.record(&LogRecord::new("error", "too late", &context));

    let spans = exporter.get_finished_spans().unwrap();
    assert_eq!(spans.len(), 1);
    assert!(spans[0].events.iter().all(|event| event.name != "too late"));
}
