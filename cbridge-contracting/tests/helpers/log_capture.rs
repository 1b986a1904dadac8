//! Collects the `message_id` field of every tracing event on this thread

use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::field::{Field, Visit};
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

#[derive(Clone, Default)]
pub struct MessageIds {
    seen: Arc<Mutex<Vec<String>>>,
}

impl MessageIds {
    /// Install as the thread default subscriber until the guard drops
    pub fn capture() -> (Self, DefaultGuard) {
        let ids = Self::default();
        let subscriber = tracing_subscriber::registry().with(ids.clone());
        let guard = tracing::subscriber::set_default(subscriber);
        (ids, guard)
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

struct MessageIdVisitor(Option<String>);

impl Visit for MessageIdVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message_id" {
            self.0 = Some(value.to_string());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message_id" {
            self.0 = Some(format!("{:?}", value).trim_matches('"').to_string());
        }
    }
}

impl<S: Subscriber> Layer<S> for MessageIds {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageIdVisitor(None);
        event.record(&mut visitor);
        if let Some(id) = visitor.0 {
            self.seen.lock().unwrap().push(id);
        }
    }
}
