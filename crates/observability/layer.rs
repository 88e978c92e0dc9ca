use std::collections::BTreeMap;

use chrono::Utc;
use tracing::{
    Event, Level, Subscriber,
    field::{Field, Visit},
};
use tracing_subscriber::{Layer, layer::Context, registry::LookupSpan};

use super::alerts::{AlertDispatcher, AlertEvent};

const REDACTED: &str = "[REDACTED]";

/// Forwards events at or above `min_level` to the alert dispatcher.
pub(crate) struct AlertLayer {
    dispatcher: AlertDispatcher,
    min_level: Level,
}

impl AlertLayer {
    pub(crate) fn new(dispatcher: AlertDispatcher, min_level: Level) -> Self {
        Self {
            dispatcher,
            min_level,
        }
    }
}

#[derive(Default)]
struct FieldCollector {
    fields: BTreeMap<String, String>,
}

impl FieldCollector {
    fn insert(&mut self, field: &Field, value: String) {
        let value = if is_sensitive(field.name()) {
            REDACTED.to_string()
        } else {
            value
        };
        self.fields.insert(field.name().to_string(), value);
    }
}

impl Visit for FieldCollector {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.insert(field, format!("{value:?}"));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, value.to_string());
    }
}

impl<S> Layer<S> for AlertLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let metadata = event.metadata();
        // Level ordering is inverted: ERROR is the "smallest".
        if *metadata.level() > self.min_level {
            return;
        }

        let mut collector = FieldCollector::default();
        event.record(&mut collector);
        let message = collector.fields.remove("message");

        let span_path = ctx
            .event_span(event)
            .map(|span| {
                span.scope()
                    .from_root()
                    .map(|s| s.metadata().name().to_string())
                    .collect()
            })
            .unwrap_or_default();

        self.dispatcher.dispatch(AlertEvent {
            level: *metadata.level(),
            timestamp: Utc::now(),
            target: metadata.target().to_string(),
            location: metadata
                .file()
                .zip(metadata.line())
                .map(|(file, line)| format!("{file}:{line}")),
            message,
            fields: collector.fields,
            span_path,
        });
    }
}

/// Payment credentials and payout destinations never leave the process.
pub(crate) fn is_sensitive(field_name: &str) -> bool {
    let field = field_name.to_ascii_lowercase();
    [
        "secret",
        "token",
        "password",
        "authorization",
        "signature",
        "webhook_url",
        "account",
    ]
    .iter()
    .any(|needle| field.contains(needle))
}
