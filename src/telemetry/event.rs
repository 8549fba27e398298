//! Single telemetry events.

use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::telemetry::error::TransportError;
use crate::telemetry::transmission::Transmission;

/// Wire form of an event as handed to a [`Transmission`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventPayload {
    pub data: Map<String, Value>,
}

/// A key/value record built from the client's static fields plus whatever
/// the caller adds. Consumed by [`Event::send`].
pub struct Event {
    fields: Map<String, Value>,
    transmission: Arc<dyn Transmission>,
}

impl Event {
    pub(crate) fn new(static_fields: &Map<String, Value>, transmission: Arc<dyn Transmission>) -> Self {
        Self {
            fields: static_fields.clone(),
            transmission,
        }
    }

    /// Set a field, replacing any previous value under the same key.
    pub fn add_field(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Hand the event to the transmission. Never waits on the network.
    pub fn send(self) -> Result<(), TransportError> {
        if self.fields.is_empty() {
            return Err(TransportError::EmptyEvent);
        }
        self.transmission.enqueue(EventPayload { data: self.fields })
    }
}

impl std::fmt::Debug for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Event").field("fields", &self.fields).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::future::BoxFuture;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Capture(Mutex<Vec<EventPayload>>);

    impl Transmission for Capture {
        fn enqueue(&self, event: EventPayload) -> Result<(), TransportError> {
            self.0.lock().unwrap().push(event);
            Ok(())
        }

        fn close(&self) -> BoxFuture<'_, ()> {
            Box::pin(async {})
        }
    }

    #[test]
    fn test_static_fields_seed_event() {
        let mut statics = Map::new();
        statics.insert("server".into(), Value::from("web-1"));
        let capture = Arc::new(Capture::default());

        let mut event = Event::new(&statics, capture.clone());
        event.add_field("method", "GET").add_field("query", Option::<String>::None);
        event.send().unwrap();

        let sent = capture.0.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].data["server"], "web-1");
        assert_eq!(sent[0].data["method"], "GET");
        assert_eq!(sent[0].data["query"], Value::Null);
    }

    #[test]
    fn test_empty_event_rejected() {
        let capture = Arc::new(Capture::default());
        let event = Event::new(&Map::new(), capture.clone());

        assert!(matches!(event.send(), Err(TransportError::EmptyEvent)));
        assert!(capture.0.lock().unwrap().is_empty());
    }

    #[test]
    fn test_payload_serializes_under_data_key() {
        let mut data = Map::new();
        data.insert("path".into(), Value::from("/orders"));
        let json = serde_json::to_value(EventPayload { data }).unwrap();
        assert_eq!(json, serde_json::json!({ "data": { "path": "/orders" } }));
    }
}
