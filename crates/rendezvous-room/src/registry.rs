//! A registered room type: its factory, defaults, and event emitter
//! (spec §3, §4.5 "named room types with default options, filter and
//! sort options, event emitter").

use std::sync::Arc;

use rendezvous_protocol::{ClientOptions, RoomId, SortSpec};
use tokio::sync::broadcast;

use crate::RoomHandlerFactory;

/// A handler-level lifecycle event, broadcast to anyone observing a
/// registered room type (spec §3: "Emits events: create, join, leave,
/// lock, unlock, dispose").
#[derive(Debug, Clone)]
pub enum HandlerEvent {
    Create(RoomId),
    Join(RoomId),
    Leave(RoomId),
    Lock(RoomId),
    Unlock(RoomId),
    Dispose(RoomId),
}

/// The default broadcast capacity for a handler's event channel. Lagging
/// subscribers drop old events rather than block room actors.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// One registered room type: `MatchMaker::define_room_type`'s return value.
pub struct HandlerRegistration {
    pub name: String,
    pub factory: Arc<dyn RoomHandlerFactory>,
    pub default_options: ClientOptions,
    pub filter_by: Vec<String>,
    pub sort_options: Option<SortSpec>,
    events: broadcast::Sender<HandlerEvent>,
}

impl HandlerRegistration {
    pub fn new(name: impl Into<String>, factory: Arc<dyn RoomHandlerFactory>, default_options: ClientOptions) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            name: name.into(),
            factory,
            default_options,
            filter_by: Vec::new(),
            sort_options: None,
            events,
        }
    }

    pub fn filter_by(mut self, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.filter_by = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn sort_options(mut self, sort: SortSpec) -> Self {
        self.sort_options = Some(sort);
        self
    }

    /// Subscribes to this room type's handler-level events.
    pub fn subscribe(&self) -> broadcast::Receiver<HandlerEvent> {
        self.events.subscribe()
    }

    /// Broadcasts an event to current subscribers. Best-effort: no
    /// subscribers means the event is simply dropped.
    pub fn emit(&self, event: HandlerEvent) {
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RoomHandler;

    struct NoopFactory;
    struct NoopHandler;

    #[async_trait::async_trait]
    impl RoomHandler for NoopHandler {
        async fn on_create(&mut self, _options: ClientOptions) -> Result<(), crate::RoomError> {
            Ok(())
        }
        async fn reserve_seat(&mut self, _session_id: rendezvous_protocol::SessionId, _options: ClientOptions) -> bool {
            true
        }
        async fn release_seat(&mut self, _session_id: rendezvous_protocol::SessionId) {}
        async fn has_reserved_seat(&self, _session_id: rendezvous_protocol::SessionId) -> bool {
            true
        }
        async fn disconnect(&mut self) {}
        async fn call(&mut self, _method: &str, args: serde_json::Value) -> Result<serde_json::Value, crate::RoomError> {
            Ok(args)
        }
    }

    impl RoomHandlerFactory for NoopFactory {
        fn create(&self) -> Box<dyn RoomHandler> {
            Box::new(NoopHandler)
        }
    }

    #[test]
    fn test_filter_by_and_sort_options_builders_set_fields() {
        let registration = HandlerRegistration::new("chat", Arc::new(NoopFactory), ClientOptions::new())
            .filter_by(["mode", "region"])
            .sort_options(SortSpec::new().push("clients", rendezvous_protocol::SortDirection::Descending));
        assert_eq!(registration.filter_by, vec!["mode", "region"]);
        assert!(registration.sort_options.is_some());
    }

    #[tokio::test]
    async fn test_emit_with_no_subscribers_does_not_panic() {
        let registration = HandlerRegistration::new("chat", Arc::new(NoopFactory), ClientOptions::new());
        registration.emit(HandlerEvent::Create(RoomId("r1".into())));
    }

    #[tokio::test]
    async fn test_subscriber_receives_emitted_event() {
        let registration = HandlerRegistration::new("chat", Arc::new(NoopFactory), ClientOptions::new());
        let mut rx = registration.subscribe();
        registration.emit(HandlerEvent::Lock(RoomId("r1".into())));
        let event = rx.recv().await.unwrap();
        assert!(matches!(event, HandlerEvent::Lock(_)));
    }
}
