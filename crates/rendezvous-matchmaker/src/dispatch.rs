//! IPC dispatch targets: the process inbox (creates rooms) and a
//! per-room inbox (forwards method calls into that room's actor).

use std::sync::Arc;

use async_trait::async_trait;
use rendezvous_ipc::IpcDispatch;
use rendezvous_protocol::{IpcRequestKind, RoomMethod, SessionId};
use rendezvous_room::RoomHandle;

use crate::MatchMaker;

/// Installed on `p:<processId>`: the only request a process inbox ever
/// receives is "create a room" (spec §4.2 edge case, `methodName === null`).
pub(crate) struct ProcessDispatch {
    pub(crate) matchmaker: Arc<MatchMaker>,
}

#[async_trait]
impl IpcDispatch for ProcessDispatch {
    async fn dispatch(&self, kind: IpcRequestKind) -> Result<serde_json::Value, String> {
        match kind {
            IpcRequestKind::CreateRoom { room_name, options } => self
                .matchmaker
                .handle_create_room(&room_name, options)
                .await
                .map(|listing| serde_json::to_value(listing).unwrap_or(serde_json::Value::Null))
                .map_err(|e| e.to_string()),
            IpcRequestKind::RoomCall { .. } => {
                Err("process inbox does not accept room calls".to_string())
            }
        }
    }
}

/// Installed on `$<roomId>`: forwards method invocations into the local
/// room actor (spec §4.9's local-table branch, reached here because the
/// *caller* is remote).
pub(crate) struct RoomDispatch {
    pub(crate) handle: RoomHandle,
}

#[async_trait]
impl IpcDispatch for RoomDispatch {
    async fn dispatch(&self, kind: IpcRequestKind) -> Result<serde_json::Value, String> {
        let (method, args) = match kind {
            IpcRequestKind::RoomCall { method, args, .. } => (method, args),
            IpcRequestKind::CreateRoom { .. } => {
                return Err("room inbox does not accept create-room requests".to_string())
            }
        };

        match method {
            RoomMethod::ReserveSeat => {
                let (session_id, options) = parse_reserve_seat_args(&args)?;
                let ok = self.handle.reserve_seat(session_id, options).await.map_err(|e| e.to_string())?;
                Ok(serde_json::json!(ok))
            }
            RoomMethod::HasReservedSeat => {
                let session_id = args
                    .as_str()
                    .map(|s| SessionId(s.to_string()))
                    .ok_or_else(|| "hasReservedSeat expects a session id string".to_string())?;
                let has = self.handle.has_reserved_seat(session_id).await.map_err(|e| e.to_string())?;
                Ok(serde_json::json!(has))
            }
            RoomMethod::GetRoomId => Ok(serde_json::json!(self.handle.room_id().to_string())),
            RoomMethod::Disconnect => {
                self.handle.disconnect().await.map_err(|e| e.to_string())?;
                Ok(serde_json::Value::Null)
            }
            RoomMethod::Custom(name) => self.handle.call(&name, args).await.map_err(|e| e.to_string()),
        }
    }
}

fn parse_reserve_seat_args(
    args: &serde_json::Value,
) -> Result<(SessionId, rendezvous_protocol::ClientOptions), String> {
    let pair = args.as_array().ok_or_else(|| "_reserveSeat expects [sessionId, options]".to_string())?;
    let session_id = pair
        .first()
        .and_then(|v| v.as_str())
        .map(|s| SessionId(s.to_string()))
        .ok_or_else(|| "_reserveSeat missing sessionId".to_string())?;
    let options = pair
        .get(1)
        .and_then(|v| v.as_object())
        .cloned()
        .unwrap_or_default();
    Ok((session_id, options))
}
