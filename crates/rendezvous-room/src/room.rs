//! Room actor: an isolated Tokio task owning one `Box<dyn RoomHandler>`.
//!
//! Mirrors the teacher's `arcforge_room::room::RoomActor` mechanics —
//! one task per room, commands in via a bounded `mpsc` channel with
//! `oneshot` reply channels, no shared mutable state. The matchmaker's
//! local room table maps `RoomId -> RoomHandle`; a room exists there
//! exactly as long as its actor task is alive (spec invariant 2).

use rendezvous_protocol::{ClientOptions, RoomId, RoomInternalState, SessionId};
use tokio::sync::{mpsc, oneshot};

use crate::{RoomError, RoomHandler};

/// Lifecycle and membership events an actor emits back to its owner.
///
/// Consumed by the matchmaker's own event loop (REDESIGN FLAGS item 1:
/// an explicit typed channel in place of dynamic emitter lookup).
#[derive(Debug, Clone)]
pub enum RoomEvent {
    Create,
    Join(SessionId),
    Leave(SessionId),
    Lock,
    Unlock,
    Dispose,
    Disconnect,
}

pub(crate) enum RoomCommand {
    Create {
        options: ClientOptions,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    ReserveSeat {
        session_id: SessionId,
        options: ClientOptions,
        reply: oneshot::Sender<bool>,
    },
    ReleaseSeat {
        session_id: SessionId,
        reply: oneshot::Sender<()>,
    },
    HasReservedSeat {
        session_id: SessionId,
        reply: oneshot::Sender<bool>,
    },
    Call {
        method: String,
        args: serde_json::Value,
        reply: oneshot::Sender<Result<serde_json::Value, RoomError>>,
    },
    Lock {
        reply: oneshot::Sender<()>,
    },
    Unlock {
        reply: oneshot::Sender<()>,
    },
    Disconnect {
        reply: oneshot::Sender<()>,
    },
    Dispose {
        reply: oneshot::Sender<()>,
    },
    InternalState {
        reply: oneshot::Sender<RoomInternalState>,
    },
}

/// Handle to a running room actor. Cheap to clone — just an `mpsc::Sender`.
#[derive(Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    pub async fn create(&self, options: ClientOptions) -> Result<(), RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomCommand::Create { options, reply }).await?;
        rx.await.map_err(|_| RoomError::Unavailable(self.room_id.clone()))?
    }

    pub async fn reserve_seat(&self, session_id: SessionId, options: ClientOptions) -> Result<bool, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomCommand::ReserveSeat { session_id, options, reply }).await?;
        rx.await.map_err(|_| RoomError::Unavailable(self.room_id.clone()))
    }

    /// Releases `session_id`'s seat, forwarding to the handler and
    /// emitting [`RoomEvent::Leave`] (spec §4.11, "leave(client): forward
    /// to handler").
    pub async fn release_seat(&self, session_id: SessionId) -> Result<(), RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomCommand::ReleaseSeat { session_id, reply }).await?;
        rx.await.map_err(|_| RoomError::Unavailable(self.room_id.clone()))
    }

    pub async fn has_reserved_seat(&self, session_id: SessionId) -> Result<bool, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomCommand::HasReservedSeat { session_id, reply }).await?;
        rx.await.map_err(|_| RoomError::Unavailable(self.room_id.clone()))
    }

    /// The room's current place in `CREATING -> CREATED -> DISPOSING`
    /// (spec §3, §4.11).
    pub async fn internal_state(&self) -> Result<RoomInternalState, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomCommand::InternalState { reply }).await?;
        rx.await.map_err(|_| RoomError::Unavailable(self.room_id.clone()))
    }

    pub async fn call(
        &self,
        method: &str,
        args: serde_json::Value,
    ) -> Result<serde_json::Value, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomCommand::Call { method: method.to_string(), args, reply }).await?;
        rx.await.map_err(|_| RoomError::Unavailable(self.room_id.clone()))?
    }

    pub async fn lock(&self) -> Result<(), RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomCommand::Lock { reply }).await?;
        rx.await.map_err(|_| RoomError::Unavailable(self.room_id.clone()))
    }

    pub async fn unlock(&self) -> Result<(), RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomCommand::Unlock { reply }).await?;
        rx.await.map_err(|_| RoomError::Unavailable(self.room_id.clone()))
    }

    pub async fn disconnect(&self) -> Result<(), RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomCommand::Disconnect { reply }).await?;
        rx.await.map_err(|_| RoomError::Unavailable(self.room_id.clone()))
    }

    /// Tells the actor to tear itself down; its task exits once this
    /// returns, which is what drops the actor's end of the channel.
    pub async fn dispose(&self) -> Result<(), RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomCommand::Dispose { reply }).await?;
        rx.await.map_err(|_| RoomError::Unavailable(self.room_id.clone()))
    }

    async fn send(&self, cmd: RoomCommand) -> Result<(), RoomError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))
    }
}

struct RoomActor {
    room_id: RoomId,
    handler: Box<dyn RoomHandler>,
    locked: bool,
    internal_state: RoomInternalState,
    events: mpsc::UnboundedSender<(RoomId, RoomEvent)>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    async fn run(mut self) {
        tracing::info!(room_id = %self.room_id, "room actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Create { options, reply } => {
                    let result = self.handler.on_create(options).await;
                    if result.is_ok() {
                        self.internal_state = RoomInternalState::Created;
                        self.emit(RoomEvent::Create);
                    }
                    let _ = reply.send(result);
                }
                RoomCommand::ReserveSeat { session_id, options, reply } => {
                    let reserved = self.handler.reserve_seat(session_id.clone(), options).await;
                    if reserved {
                        self.emit(RoomEvent::Join(session_id));
                    }
                    let _ = reply.send(reserved);
                }
                RoomCommand::ReleaseSeat { session_id, reply } => {
                    self.handler.release_seat(session_id.clone()).await;
                    self.emit(RoomEvent::Leave(session_id));
                    let _ = reply.send(());
                }
                RoomCommand::HasReservedSeat { session_id, reply } => {
                    let has = self.handler.has_reserved_seat(session_id).await;
                    let _ = reply.send(has);
                }
                RoomCommand::Call { method, args, reply } => {
                    let result = self.handler.call(&method, args).await;
                    let _ = reply.send(result);
                }
                RoomCommand::Lock { reply } => {
                    self.locked = true;
                    self.emit(RoomEvent::Lock);
                    let _ = reply.send(());
                }
                RoomCommand::Unlock { reply } => {
                    self.locked = false;
                    self.emit(RoomEvent::Unlock);
                    let _ = reply.send(());
                }
                RoomCommand::Disconnect { reply } => {
                    self.handler.disconnect().await;
                    self.emit(RoomEvent::Disconnect);
                    let _ = reply.send(());
                }
                RoomCommand::Dispose { reply } => {
                    tracing::info!(room_id = %self.room_id, "room disposing");
                    self.internal_state = RoomInternalState::Disposing;
                    self.emit(RoomEvent::Dispose);
                    let _ = reply.send(());
                    break;
                }
                RoomCommand::InternalState { reply } => {
                    let _ = reply.send(self.internal_state);
                }
            }
        }

        tracing::info!(room_id = %self.room_id, "room actor stopped");
    }

    fn emit(&self, event: RoomEvent) {
        let _ = self.events.send((self.room_id.clone(), event));
    }
}

/// Spawns a new room actor task and returns a handle to communicate with it.
pub fn spawn_room(
    room_id: RoomId,
    handler: Box<dyn RoomHandler>,
    events: mpsc::UnboundedSender<(RoomId, RoomEvent)>,
    channel_size: usize,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size);

    let actor = RoomActor {
        room_id: room_id.clone(),
        handler,
        locked: false,
        internal_state: RoomInternalState::Creating,
        events,
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle { room_id, sender: tx }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};

    struct EchoHandler {
        seats: Arc<Mutex<HashSet<SessionId>>>,
        max_clients: usize,
    }

    #[async_trait]
    impl RoomHandler for EchoHandler {
        async fn on_create(&mut self, _options: ClientOptions) -> Result<(), RoomError> {
            Ok(())
        }

        async fn reserve_seat(&mut self, session_id: SessionId, _options: ClientOptions) -> bool {
            let mut seats = self.seats.lock().unwrap();
            if seats.len() >= self.max_clients {
                return false;
            }
            seats.insert(session_id);
            true
        }

        async fn release_seat(&mut self, session_id: SessionId) {
            self.seats.lock().unwrap().remove(&session_id);
        }

        async fn has_reserved_seat(&self, session_id: SessionId) -> bool {
            self.seats.lock().unwrap().contains(&session_id)
        }

        async fn disconnect(&mut self) {
            self.seats.lock().unwrap().clear();
        }

        async fn call(&mut self, method: &str, args: serde_json::Value) -> Result<serde_json::Value, RoomError> {
            match method {
                "echo" => Ok(args),
                other => Err(RoomError::UnknownMethod(RoomId("r1".into()), other.to_string())),
            }
        }
    }

    fn spawn_echo_room(max_clients: usize) -> (RoomHandle, mpsc::UnboundedReceiver<(RoomId, RoomEvent)>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let handler = Box::new(EchoHandler { seats: Arc::new(Mutex::new(HashSet::new())), max_clients });
        let handle = spawn_room(RoomId("r1".into()), handler, events_tx, 8);
        (handle, events_rx)
    }

    #[tokio::test]
    async fn test_create_emits_create_event() {
        let (handle, mut events) = spawn_echo_room(2);
        handle.create(ClientOptions::new()).await.unwrap();
        let (_, event) = events.recv().await.unwrap();
        assert!(matches!(event, RoomEvent::Create));
    }

    #[tokio::test]
    async fn test_reserve_seat_succeeds_until_capacity_then_fails() {
        let (handle, mut events) = spawn_echo_room(1);
        handle.create(ClientOptions::new()).await.unwrap();
        events.recv().await.unwrap();

        let ok = handle.reserve_seat(SessionId("s1".into()), ClientOptions::new()).await.unwrap();
        assert!(ok);
        let (_, event) = events.recv().await.unwrap();
        assert!(matches!(event, RoomEvent::Join(_)));

        let full = handle.reserve_seat(SessionId("s2".into()), ClientOptions::new()).await.unwrap();
        assert!(!full);
    }

    #[tokio::test]
    async fn test_release_seat_emits_leave_and_frees_capacity() {
        let (handle, mut events) = spawn_echo_room(1);
        handle.create(ClientOptions::new()).await.unwrap();
        events.recv().await.unwrap();

        let session_id = SessionId("s1".into());
        handle.reserve_seat(session_id.clone(), ClientOptions::new()).await.unwrap();
        events.recv().await.unwrap();

        handle.release_seat(session_id.clone()).await.unwrap();
        assert!(matches!(events.recv().await.unwrap().1, RoomEvent::Leave(_)));
        assert!(!handle.has_reserved_seat(session_id.clone()).await.unwrap());

        let ok = handle.reserve_seat(SessionId("s2".into()), ClientOptions::new()).await.unwrap();
        assert!(ok);
    }

    #[tokio::test]
    async fn test_internal_state_transitions_creating_created_disposing() {
        let (handle, _events) = spawn_echo_room(2);
        assert_eq!(handle.internal_state().await.unwrap(), RoomInternalState::Creating);

        handle.create(ClientOptions::new()).await.unwrap();
        assert_eq!(handle.internal_state().await.unwrap(), RoomInternalState::Created);

        handle.dispose().await.unwrap();
        assert!(handle.internal_state().await.is_err());
    }

    #[tokio::test]
    async fn test_has_reserved_seat_reflects_prior_reservation() {
        let (handle, _events) = spawn_echo_room(2);
        handle.create(ClientOptions::new()).await.unwrap();
        handle.reserve_seat(SessionId("s1".into()), ClientOptions::new()).await.unwrap();
        assert!(handle.has_reserved_seat(SessionId("s1".into())).await.unwrap());
        assert!(!handle.has_reserved_seat(SessionId("s2".into())).await.unwrap());
    }

    #[tokio::test]
    async fn test_call_dispatches_to_handler_method() {
        let (handle, _events) = spawn_echo_room(2);
        let result = handle.call("echo", serde_json::json!("hi")).await.unwrap();
        assert_eq!(result, serde_json::json!("hi"));
    }

    #[tokio::test]
    async fn test_call_unknown_method_errors() {
        let (handle, _events) = spawn_echo_room(2);
        let result = handle.call("nope", serde_json::Value::Null).await;
        assert!(matches!(result, Err(RoomError::UnknownMethod(_, _))));
    }

    #[tokio::test]
    async fn test_lock_then_unlock_emit_expected_events() {
        let (handle, mut events) = spawn_echo_room(2);
        handle.lock().await.unwrap();
        assert!(matches!(events.recv().await.unwrap().1, RoomEvent::Lock));
        handle.unlock().await.unwrap();
        assert!(matches!(events.recv().await.unwrap().1, RoomEvent::Unlock));
    }

    #[tokio::test]
    async fn test_dispose_emits_event_and_stops_actor() {
        let (handle, mut events) = spawn_echo_room(2);
        handle.dispose().await.unwrap();
        assert!(matches!(events.recv().await.unwrap().1, RoomEvent::Dispose));
        assert!(handle.call("echo", serde_json::Value::Null).await.is_err());
    }
}
