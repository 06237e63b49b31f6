//! The MatchMaker core (spec §4.5–§4.14): registry of room handlers,
//! per-process room table, load-balanced room creator, remote-room-call
//! IPC, seat-reservation concurrency gate, room state machine, node
//! discovery, and graceful shutdown.
//!
//! Encapsulated as a single struct with a `new → setup → shutdown`
//! lifecycle (REDESIGN FLAGS item 4) rather than module-level globals.
//! The local room table, handler registry, and local `room-count`
//! mirror are all guarded by `tokio::sync::Mutex`, matching the
//! teacher's `Mutex<SessionManager>`/`Mutex<RoomManager<G>>` pattern in
//! `arcforge::server::ServerState` — critical sections here span
//! `.await` points (presence calls, IPC round trips), so a raw
//! `std::sync::Mutex` would be wrong.

use std::collections::HashMap;
use std::sync::Arc;

use rendezvous_driver::{Driver, FindConditions, RoomListingHandle};
use rendezvous_ipc::{request_from_ipc, subscribe_ipc, IpcError};
use rendezvous_presence::Presence;
use rendezvous_protocol::{
    keys, ClientOptions, IpcRequestKind, MatchMakeError, MatchMakeErrorCode, Node, ProcessId,
    RoomId, RoomListing, RoomMethod, SeatReservation, SeatReservationError, SessionId,
};
use rendezvous_room::{
    spawn_room, HandlerEvent, HandlerRegistration, RoomEvent, RoomHandle, RoomHandlerFactory,
};
use tokio::sync::{mpsc, Mutex};

use crate::config::MatchMakerConfig;
use crate::dispatch::{ProcessDispatch, RoomDispatch};
use crate::{discovery, lobby};

struct RoomEntry {
    handle: RoomHandle,
    name: String,
    listing: RoomListingHandle,
}

/// The distributed matchmaking and room-lifecycle core for one process
/// in the cluster.
pub struct MatchMaker {
    process_id: ProcessId,
    node: Node,
    presence: Arc<dyn Presence>,
    driver: Arc<dyn Driver>,
    config: MatchMakerConfig,
    handlers: Mutex<HashMap<String, Arc<HandlerRegistration>>>,
    rooms: Mutex<HashMap<RoomId, RoomEntry>>,
    is_shutting_down: Mutex<bool>,
    room_events_tx: mpsc::UnboundedSender<(RoomId, RoomEvent)>,
    room_events_rx: Mutex<Option<mpsc::UnboundedReceiver<(RoomId, RoomEvent)>>>,
}

impl MatchMaker {
    pub fn new(
        process_id: ProcessId,
        node: Node,
        presence: Arc<dyn Presence>,
        driver: Arc<dyn Driver>,
        config: MatchMakerConfig,
    ) -> Arc<Self> {
        let (room_events_tx, room_events_rx) = mpsc::unbounded_channel();
        Arc::new(Self {
            process_id,
            node,
            presence,
            driver,
            config,
            handlers: Mutex::new(HashMap::new()),
            rooms: Mutex::new(HashMap::new()),
            is_shutting_down: Mutex::new(false),
            room_events_tx,
            room_events_rx: Mutex::new(Some(room_events_rx)),
        })
    }

    pub fn process_id(&self) -> &ProcessId {
        &self.process_id
    }

    /// Registers this node, installs the process inbox dispatcher, and
    /// starts the room-event loop. Must run before any other operation.
    pub async fn setup(self: &Arc<Self>) -> Result<(), MatchMakeError> {
        discovery::register_node(self.presence.as_ref(), &self.node)
            .await
            .map_err(|e| MatchMakeError::unhandled(e.to_string()))?;

        let dispatch = Arc::new(ProcessDispatch { matchmaker: self.clone() });
        subscribe_ipc(self.presence.clone(), keys::process_channel(&self.process_id), dispatch)
            .await
            .map_err(|e| MatchMakeError::unhandled(e.to_string()))?;

        let events_rx = self
            .room_events_rx
            .lock()
            .await
            .take()
            .expect("setup called more than once");
        let mm = self.clone();
        tokio::spawn(async move { mm.run_event_loop(events_rx).await });

        Ok(())
    }

    // -----------------------------------------------------------------
    // Handler registry
    // -----------------------------------------------------------------

    pub async fn define_room_type(
        self: &Arc<Self>,
        name: impl Into<String>,
        factory: Arc<dyn RoomHandlerFactory>,
        default_options: ClientOptions,
    ) -> Arc<HandlerRegistration> {
        let name = name.into();
        let registration = Arc::new(HandlerRegistration::new(name.clone(), factory, default_options));
        self.handlers.lock().await.insert(name.clone(), registration.clone());

        let mm = self.clone();
        tokio::spawn(async move { mm.cleanup_stale_rooms(&name).await });

        registration
    }

    pub async fn remove_room_type(&self, name: &str) {
        self.handlers.lock().await.remove(name);
    }

    pub async fn has_handler(&self, name: &str) -> bool {
        self.handlers.lock().await.contains_key(name)
    }

    async fn handler(&self, name: &str) -> Result<Arc<HandlerRegistration>, MatchMakeError> {
        self.handlers
            .lock()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| MatchMakeError::no_handler(name))
    }

    // -----------------------------------------------------------------
    // Public matchmaking operations (spec §4.5)
    // -----------------------------------------------------------------

    pub async fn join_or_create(
        self: &Arc<Self>,
        name: &str,
        options: ClientOptions,
    ) -> Result<SeatReservation, MatchMakeError> {
        let handler = self.handler(name).await?;
        for _ in 0..self.config.join_or_create_max_attempts {
            let existing = self.find_one_room_available(name, &options, &handler).await?;
            let listing = match existing {
                Some(listing) => listing,
                None => self.create_room(name, options.clone()).await?,
            };
            match self.reserve_seat_for(&listing, options.clone()).await {
                Ok(reservation) => return Ok(reservation),
                Err(err) if err.code == MatchMakeErrorCode::SeatReservationFailed => continue,
                Err(err) => return Err(err),
            }
        }
        Err(MatchMakeError::new(
            MatchMakeErrorCode::SeatReservationFailed,
            format!("exhausted {} joinOrCreate attempts for \"{name}\"", self.config.join_or_create_max_attempts),
        ))
    }

    pub async fn create(
        self: &Arc<Self>,
        name: &str,
        options: ClientOptions,
    ) -> Result<SeatReservation, MatchMakeError> {
        let listing = self.create_room(name, options.clone()).await?;
        self.reserve_seat_for(&listing, options).await
    }

    pub async fn join(
        self: &Arc<Self>,
        name: &str,
        options: ClientOptions,
    ) -> Result<SeatReservation, MatchMakeError> {
        let handler = self.handler(name).await?;
        for _ in 0..self.config.join_or_create_max_attempts {
            let listing = self
                .find_one_room_available(name, &options, &handler)
                .await?
                .ok_or_else(|| MatchMakeError::invalid_criteria(name))?;
            match self.reserve_seat_for(&listing, options.clone()).await {
                Ok(reservation) => return Ok(reservation),
                Err(err) if err.code == MatchMakeErrorCode::SeatReservationFailed => continue,
                Err(err) => return Err(err),
            }
        }
        Err(MatchMakeError::invalid_criteria(name))
    }

    pub async fn join_by_id(
        self: &Arc<Self>,
        room_id: &RoomId,
        mut options: ClientOptions,
    ) -> Result<SeatReservation, MatchMakeError> {
        let listing = self.find_listing_by_id(room_id).await?;

        if let Some(session_id) = options.remove("sessionId").and_then(|v| v.as_str().map(String::from)) {
            let has = self
                .remote_room_call(room_id, RoomMethod::HasReservedSeat, serde_json::json!(session_id))
                .await?;
            return if has.as_bool().unwrap_or(false) {
                Ok(SeatReservation { room: listing, session_id: SessionId(session_id) })
            } else {
                Err(MatchMakeError::expired(session_id))
            };
        }

        if listing.locked {
            return Err(MatchMakeError::invalid_room_id(room_id));
        }

        self.reserve_seat_for(&listing, options).await
    }

    /// Releases `session_id`'s seat in a locally hosted room and emits
    /// handler `leave` (spec §4.11, "leave(client): forward to handler").
    /// Unlike join, leave is never remote: the client's connection lives
    /// on whichever process already hosts the room, so there is no IPC
    /// fallback path here (spec §6, room contract's `leave` event).
    pub async fn leave(&self, room_id: &RoomId, session_id: SessionId) -> Result<(), MatchMakeError> {
        let handle = self.rooms.lock().await.get(room_id).map(|entry| entry.handle.clone());
        let handle = handle.ok_or_else(|| MatchMakeError::invalid_room_id(room_id))?;
        handle.release_seat(session_id).await.map_err(|e| MatchMakeError::unhandled(e.to_string()))
    }

    async fn find_listing_by_id(&self, room_id: &RoomId) -> Result<RoomListing, MatchMakeError> {
        let conditions = FindConditions {
            name: None,
            metadata: Default::default(),
            locked: None,
            private: None,
        };
        let candidates = self
            .driver
            .find(&conditions, None)
            .await
            .map_err(|e| MatchMakeError::unhandled(e.to_string()))?;
        candidates
            .into_iter()
            .find(|l| &l.room_id == room_id)
            .ok_or_else(|| MatchMakeError::invalid_room_id(room_id))
    }

    pub async fn query(&self, conditions: &FindConditions) -> Result<Vec<RoomListing>, MatchMakeError> {
        self.driver.find(conditions, None).await.map_err(|e| MatchMakeError::unhandled(e.to_string()))
    }

    // -----------------------------------------------------------------
    // §4.6 concurrency gate
    // -----------------------------------------------------------------

    async fn find_one_room_available(
        &self,
        name: &str,
        options: &ClientOptions,
        handler: &Arc<HandlerRegistration>,
    ) -> Result<Option<RoomListing>, MatchMakeError> {
        let gate_key = keys::concurrency_key(name);
        let concurrency = self
            .presence
            .incr(&gate_key)
            .await
            .map_err(|e| MatchMakeError::unhandled(e.to_string()))?
            - 1;

        let delay = (self.config.concurrency_gate_unit * concurrency.max(0) as u32)
            .min(self.config.concurrency_gate_cap);
        if delay > std::time::Duration::ZERO {
            tokio::time::sleep(delay).await;
        }

        let mut conditions =
            FindConditions { name: Some(name.to_string()), locked: Some(false), private: Some(false), metadata: Default::default() };
        for field in &handler.filter_by {
            if let Some(value) = options.get(field) {
                conditions.metadata.insert(field.clone(), value.clone());
            }
        }

        let result = self.driver.find(&conditions, handler.sort_options.as_ref()).await;
        let _ = self.presence.decr(&gate_key).await;

        let mut listings = result.map_err(|e| MatchMakeError::unhandled(e.to_string()))?;
        Ok(if listings.is_empty() { None } else { Some(listings.remove(0)) })
    }

    // -----------------------------------------------------------------
    // §4.7 load-balanced placement
    // -----------------------------------------------------------------

    async fn create_room(
        self: &Arc<Self>,
        name: &str,
        options: ClientOptions,
    ) -> Result<RoomListing, MatchMakeError> {
        let target = self.select_placement_target().await;

        if target == self.process_id {
            return self.handle_create_room(name, options).await;
        }

        let channel = keys::process_channel(&target);
        let request = IpcRequestKind::CreateRoom { room_name: name.to_string(), options: options.clone() };
        match request_from_ipc(self.presence.as_ref(), &channel, self.process_id.clone(), request, self.config.remote_room_timeout).await {
            Ok(value) => serde_json::from_value(value).map_err(|e| MatchMakeError::unhandled(e.to_string())),
            Err(err) => {
                tracing::warn!(%target, %err, "remote room create failed, falling back to local");
                self.handle_create_room(name, options).await
            }
        }
    }

    /// Reads `room-count`; processes with no entry are excluded from
    /// consideration rather than treated as count zero (original_source
    /// supplement: a process can be mid-graceful-shutdown, which `hdel`s
    /// its entry before finishing teardown — picking it as a target
    /// would race the shutdown). An empty hash (cluster bootstrap, no
    /// process has hosted a room yet) falls back to this process.
    async fn select_placement_target(&self) -> ProcessId {
        let counts = self.presence.hgetall(keys::ROOM_COUNT_HASH).await.unwrap_or_default();
        let mut candidates: Vec<(ProcessId, i64)> = counts
            .into_iter()
            .filter_map(|(pid, count)| count.parse::<i64>().ok().map(|n| (ProcessId(pid), n)))
            .collect();
        candidates.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0 .0.cmp(&b.0 .0)));
        candidates.into_iter().next().map(|(pid, _)| pid).unwrap_or_else(|| self.process_id.clone())
    }

    // -----------------------------------------------------------------
    // §4.8 local owner
    // -----------------------------------------------------------------

    pub(crate) async fn handle_create_room(
        self: &Arc<Self>,
        name: &str,
        options: ClientOptions,
    ) -> Result<RoomListing, MatchMakeError> {
        let handler = self.handler(name).await?;

        let room_id = RoomId::generate();
        let mut listing = self
            .driver
            .create_instance(room_id.clone(), name, self.process_id.clone())
            .await
            .map_err(|e| MatchMakeError::unhandled(e.to_string()))?;

        for field in &handler.filter_by {
            if let Some(value) = options.get(field) {
                listing.metadata.insert(field.clone(), value.clone());
            }
        }

        let merged_options = merge_options(&handler.default_options, &options);
        let room_handler = handler.factory.create();
        let room_handle = spawn_room(room_id.clone(), room_handler, self.room_events_tx.clone(), self.config.room_command_channel_size);

        if let Err(err) = room_handle.create(merged_options.clone()).await {
            let _ = room_handle.dispose().await;
            return Err(MatchMakeError::unhandled(err.to_string()));
        }

        self.presence
            .hincrby(keys::ROOM_COUNT_HASH, &self.process_id.to_string(), 1)
            .await
            .map_err(|e| MatchMakeError::unhandled(e.to_string()))?;

        listing.max_clients = merged_options.get("maxClients").and_then(|v| v.as_u64()).unwrap_or(0) as u32;

        let dispatch = Arc::new(RoomDispatch { handle: room_handle.clone() });
        subscribe_ipc(self.presence.clone(), keys::room_channel(&room_id), dispatch)
            .await
            .map_err(|e| MatchMakeError::unhandled(e.to_string()))?;

        let listing_handle = RoomListingHandle::new(listing.clone(), self.driver.clone());
        listing_handle.save().await.map_err(|e| MatchMakeError::unhandled(e.to_string()))?;

        self.rooms.lock().await.insert(room_id.clone(), RoomEntry { handle: room_handle, name: name.to_string(), listing: listing_handle });

        if !listing.unlisted {
            lobby::notify(self.presence.as_ref(), &room_id, false).await;
        }
        handler.emit(HandlerEvent::Create(room_id));

        Ok(listing)
    }

    // -----------------------------------------------------------------
    // §4.9 remote room call
    // -----------------------------------------------------------------

    async fn remote_room_call(
        &self,
        room_id: &RoomId,
        method: RoomMethod,
        args: serde_json::Value,
    ) -> Result<serde_json::Value, MatchMakeError> {
        let local_handle = self.rooms.lock().await.get(room_id).map(|entry| entry.handle.clone());

        if let Some(handle) = local_handle {
            return match method {
                RoomMethod::ReserveSeat => {
                    let pair = args.as_array().cloned().unwrap_or_default();
                    let session_id = pair.first().and_then(|v| v.as_str()).map(|s| SessionId(s.to_string())).unwrap_or_else(|| SessionId::generate());
                    let options = pair.get(1).and_then(|v| v.as_object()).cloned().unwrap_or_default();
                    handle.reserve_seat(session_id, options).await.map(|ok| serde_json::json!(ok)).map_err(|e| MatchMakeError::unhandled(e.to_string()))
                }
                RoomMethod::HasReservedSeat => {
                    let session_id = args.as_str().map(|s| SessionId(s.to_string())).unwrap_or_else(|| SessionId::generate());
                    handle.has_reserved_seat(session_id).await.map(|ok| serde_json::json!(ok)).map_err(|e| MatchMakeError::unhandled(e.to_string()))
                }
                RoomMethod::GetRoomId => Ok(serde_json::json!(handle.room_id().to_string())),
                RoomMethod::Disconnect => handle.disconnect().await.map(|_| serde_json::Value::Null).map_err(|e| MatchMakeError::unhandled(e.to_string())),
                RoomMethod::Custom(name) => handle.call(&name, args).await.map_err(|e| MatchMakeError::unhandled(e.to_string())),
            };
        }

        let channel = keys::room_channel(room_id);
        let request = IpcRequestKind::RoomCall { room_id: room_id.clone(), method: method.clone(), args: args.clone() };
        match request_from_ipc(self.presence.as_ref(), &channel, self.process_id.clone(), request, self.config.remote_room_timeout).await {
            Ok(value) => Ok(value),
            Err(IpcError::Timeout(elapsed)) => Err(MatchMakeError::unhandled(format!(
                "remote room ({room_id}) timed out, requesting \"{method}\" with args {args} ({}ms exceeded)",
                elapsed.as_millis()
            ))),
            Err(other) => Err(MatchMakeError::unhandled(other.to_string())),
        }
    }

    // -----------------------------------------------------------------
    // §4.10 seat reservation
    // -----------------------------------------------------------------

    async fn reserve_seat_for(
        &self,
        listing: &RoomListing,
        options: ClientOptions,
    ) -> Result<SeatReservation, MatchMakeError> {
        let session_id = SessionId::generate();
        let args = serde_json::json!([session_id.to_string(), options]);
        let ok = self
            .remote_room_call(&listing.room_id, RoomMethod::ReserveSeat, args)
            .await
            .map(|v| v.as_bool().unwrap_or(false))
            .unwrap_or(false);

        if !ok {
            return Err(SeatReservationError::new(listing.room_id.clone()).into());
        }

        Ok(SeatReservation { room: listing.clone(), session_id })
    }

    // -----------------------------------------------------------------
    // §4.11 room state machine
    // -----------------------------------------------------------------

    async fn run_event_loop(self: Arc<Self>, mut events: mpsc::UnboundedReceiver<(RoomId, RoomEvent)>) {
        while let Some((room_id, event)) = events.recv().await {
            match event {
                RoomEvent::Create => {}
                RoomEvent::Join(_) => {
                    if let Some(name) = self.room_name(&room_id).await {
                        if let Ok(handler) = self.handler(&name).await {
                            handler.emit(HandlerEvent::Join(room_id));
                        }
                    }
                }
                RoomEvent::Leave(_) => {
                    if let Some(name) = self.room_name(&room_id).await {
                        if let Ok(handler) = self.handler(&name).await {
                            handler.emit(HandlerEvent::Leave(room_id));
                        }
                    }
                }
                RoomEvent::Lock => self.on_room_lock(&room_id).await,
                RoomEvent::Unlock => self.on_room_unlock(&room_id).await,
                RoomEvent::Dispose => self.dispose_room(&room_id).await,
                RoomEvent::Disconnect => {
                    tracing::debug!(%room_id, "room disconnected");
                }
            }
        }
    }

    async fn room_name(&self, room_id: &RoomId) -> Option<String> {
        self.rooms.lock().await.get(room_id).map(|entry| entry.name.clone())
    }

    async fn on_room_lock(&self, room_id: &RoomId) {
        let _ = self.presence.unsubscribe(&keys::room_channel(room_id)).await;
        if let Some(entry) = self.rooms.lock().await.get_mut(room_id) {
            entry.listing.listing.locked = true;
            let _ = entry.listing.save().await;
        }
        if let Some(name) = self.room_name(room_id).await {
            if let Ok(handler) = self.handler(&name).await {
                handler.emit(HandlerEvent::Lock(room_id.clone()));
            }
        }
    }

    async fn on_room_unlock(&self, room_id: &RoomId) {
        let handle = self.rooms.lock().await.get(room_id).map(|entry| entry.handle.clone());
        if let Some(handle) = handle {
            let dispatch = Arc::new(RoomDispatch { handle });
            let _ = subscribe_ipc(self.presence.clone(), keys::room_channel(room_id), dispatch).await;
        }
        if let Some(entry) = self.rooms.lock().await.get_mut(room_id) {
            entry.listing.listing.locked = false;
            let _ = entry.listing.save().await;
        }
        if let Some(name) = self.room_name(room_id).await {
            if let Ok(handler) = self.handler(&name).await {
                handler.emit(HandlerEvent::Unlock(room_id.clone()));
            }
        }
    }

    async fn dispose_room(&self, room_id: &RoomId) {
        let is_shutting_down = *self.is_shutting_down.lock().await;
        if !is_shutting_down {
            let _ = self.presence.hincrby(keys::ROOM_COUNT_HASH, &self.process_id.to_string(), -1).await;
        }

        let entry = self.rooms.lock().await.remove(room_id);
        let Some(entry) = entry else { return };

        let _ = entry.listing.remove().await;
        if let Ok(handler) = self.handler(&entry.name).await {
            handler.emit(HandlerEvent::Dispose(room_id.clone()));
        }
        let _ = self.presence.del(&keys::concurrency_key(&entry.name)).await;
        let _ = self.presence.unsubscribe(&keys::room_channel(room_id)).await;

        if !entry.listing.listing.unlisted {
            lobby::notify(self.presence.as_ref(), room_id, true).await;
        }
    }

    // -----------------------------------------------------------------
    // §4.12 stale room cleanup
    // -----------------------------------------------------------------

    async fn cleanup_stale_rooms(self: &Arc<Self>, name: &str) {
        let conditions = FindConditions::by_name(name);
        let Ok(cached) = self.driver.find(&conditions, None).await else { return };
        let _ = self.presence.del(&keys::concurrency_key(name)).await;

        for listing in cached {
            let probe = self.remote_room_call(&listing.room_id, RoomMethod::GetRoomId, serde_json::Value::Null).await;
            if probe.is_err() {
                tracing::warn!(room_id = %listing.room_id, "stale room reaped");
                let _ = self.driver.remove(&listing.room_id).await;
                self.rooms.lock().await.remove(&listing.room_id);
            }
        }
    }

    // -----------------------------------------------------------------
    // §4.14 graceful shutdown
    // -----------------------------------------------------------------

    pub async fn graceful_shutdown(self: &Arc<Self>) -> Result<(), MatchMakeError> {
        {
            let mut shutting_down = self.is_shutting_down.lock().await;
            if *shutting_down {
                return Err(MatchMakeError::unhandled("matchmaker is already shutting down"));
            }
            *shutting_down = true;
        }

        let _ = self.presence.hdel(keys::ROOM_COUNT_HASH, &self.process_id.to_string()).await;
        let _ = self.presence.unsubscribe(&keys::process_channel(&self.process_id)).await;
        let _ = discovery::unregister_node(self.presence.as_ref(), &self.node).await;

        let handles: Vec<RoomHandle> = self.rooms.lock().await.values().map(|entry| entry.handle.clone()).collect();
        let disconnects = handles.into_iter().map(|handle| async move { handle.disconnect().await });
        for result in futures_util::future::join_all(disconnects).await {
            if let Err(err) = result {
                tracing::warn!(%err, "error disconnecting room during shutdown");
            }
        }

        Ok(())
    }
}

fn merge_options(defaults: &ClientOptions, overrides: &ClientOptions) -> ClientOptions {
    let mut merged = defaults.clone();
    for (key, value) in overrides {
        merged.insert(key.clone(), value.clone());
    }
    merged
}
