//! Request/reply RPC over the presence pub/sub layer (spec §4.2).
//!
//! [`subscribe_ipc`] installs a long-lived dispatcher on a channel (a
//! process inbox `p:<processId>` or a room inbox `$<roomId>`);
//! [`request_from_ipc`] performs one request/reply round trip against
//! such a channel, racing the reply against a timeout.

mod error;

pub use error::IpcError;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rendezvous_protocol::{IpcRequest, IpcRequestKind, IpcResponse, ProcessId, RequestId};
use rendezvous_presence::Presence;

/// Handles one [`IpcRequestKind`] and produces a reply value or an error
/// message, installed on a channel via [`subscribe_ipc`].
#[async_trait]
pub trait IpcDispatch: Send + Sync + 'static {
    async fn dispatch(&self, kind: IpcRequestKind) -> Result<serde_json::Value, String>;
}

fn reply_channel(reply_to: &ProcessId, request_id: &RequestId) -> String {
    format!("ipc-reply:{reply_to}:{request_id}")
}

/// Subscribes `dispatch` on `channel`. Each incoming [`IpcRequest`] is
/// handed to `dispatch` and the result published back on the reply
/// channel derived from `(request.reply_to, request.request_id)`.
///
/// Returns only after the subscription is installed (spec §4.1
/// guarantee (a)) — the caller can rely on messages published
/// immediately after this returns being observed.
pub async fn subscribe_ipc(
    presence: Arc<dyn Presence>,
    channel: impl Into<String>,
    dispatch: Arc<dyn IpcDispatch>,
) -> Result<(), IpcError> {
    let channel = channel.into();
    let mut subscription = presence
        .subscribe(&channel)
        .await
        .map_err(|e| IpcError::ChannelUnreachable(e.to_string()))?;

    tokio::spawn(async move {
        while let Some(raw) = subscription.recv().await {
            let request: IpcRequest = match serde_json::from_str(&raw) {
                Ok(req) => req,
                Err(err) => {
                    tracing::warn!(%err, "ipc: failed to decode request");
                    continue;
                }
            };
            let presence = presence.clone();
            let dispatch = dispatch.clone();
            tokio::spawn(async move {
                let result = dispatch.dispatch(request.kind).await;
                let response = match result {
                    Ok(value) => IpcResponse::ok(request.request_id.clone(), value),
                    Err(message) => IpcResponse::err(request.request_id.clone(), message),
                };
                let channel = reply_channel(&request.reply_to, &request.request_id);
                if let Ok(payload) = serde_json::to_string(&response) {
                    let _ = presence.publish(&channel, &payload).await;
                }
            });
        }
    });

    Ok(())
}

/// Performs one request/reply round trip: publishes `kind` on `channel`
/// tagged with a fresh [`RequestId`], subscribes transiently to the
/// derived reply channel, and races the reply against `timeout`.
///
/// On timeout the transient subscription is torn down and any reply
/// that arrives afterward is discarded (spec §4.2).
pub async fn request_from_ipc(
    presence: &dyn Presence,
    channel: &str,
    reply_to: ProcessId,
    kind: IpcRequestKind,
    timeout: Duration,
) -> Result<serde_json::Value, IpcError> {
    let request_id = RequestId::generate();
    let reply_channel_name = reply_channel(&reply_to, &request_id);

    let mut reply_subscription = presence
        .subscribe(&reply_channel_name)
        .await
        .map_err(|e| IpcError::ChannelUnreachable(e.to_string()))?;

    let request = IpcRequest { request_id: request_id.clone(), reply_to, kind };
    let payload = serde_json::to_string(&request).map_err(|e| IpcError::Marshalling(e.to_string()))?;
    presence
        .publish(channel, &payload)
        .await
        .map_err(|e| IpcError::ChannelUnreachable(e.to_string()))?;

    let outcome = tokio::time::timeout(timeout, reply_subscription.recv()).await;
    let _ = presence.unsubscribe(&reply_channel_name).await;

    match outcome {
        Ok(Some(raw)) => {
            let response: IpcResponse =
                serde_json::from_str(&raw).map_err(|e| IpcError::Marshalling(e.to_string()))?;
            response.result.map_err(IpcError::Remote)
        }
        Ok(None) => Err(IpcError::ChannelUnreachable(reply_channel_name)),
        Err(_) => Err(IpcError::Timeout(timeout)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rendezvous_presence::LocalPresence;

    struct EchoDispatch;

    #[async_trait]
    impl IpcDispatch for EchoDispatch {
        async fn dispatch(&self, kind: IpcRequestKind) -> Result<serde_json::Value, String> {
            match kind {
                IpcRequestKind::RoomCall { args, .. } => Ok(args),
                IpcRequestKind::CreateRoom { room_name, .. } => Ok(serde_json::json!(room_name)),
            }
        }
    }

    struct FailDispatch;

    #[async_trait]
    impl IpcDispatch for FailDispatch {
        async fn dispatch(&self, _kind: IpcRequestKind) -> Result<serde_json::Value, String> {
            Err("nope".to_string())
        }
    }

    #[tokio::test]
    async fn test_request_from_ipc_round_trips_through_dispatch() {
        let presence: Arc<dyn Presence> = Arc::new(LocalPresence::new());
        subscribe_ipc(presence.clone(), "p:target", Arc::new(EchoDispatch)).await.unwrap();

        let result = request_from_ipc(
            presence.as_ref(),
            "p:target",
            ProcessId("requester".into()),
            IpcRequestKind::RoomCall {
                room_id: rendezvous_protocol::RoomId("r1".into()),
                method: rendezvous_protocol::RoomMethod::ReserveSeat,
                args: serde_json::json!("hello"),
            },
            Duration::from_millis(500),
        )
        .await
        .unwrap();

        assert_eq!(result, serde_json::json!("hello"));
    }

    #[tokio::test]
    async fn test_request_from_ipc_surfaces_dispatch_error() {
        let presence: Arc<dyn Presence> = Arc::new(LocalPresence::new());
        subscribe_ipc(presence.clone(), "p:target", Arc::new(FailDispatch)).await.unwrap();

        let result = request_from_ipc(
            presence.as_ref(),
            "p:target",
            ProcessId("requester".into()),
            IpcRequestKind::CreateRoom { room_name: "chat".into(), options: Default::default() },
            Duration::from_millis(500),
        )
        .await;

        assert!(matches!(result, Err(IpcError::Remote(_))));
    }

    #[tokio::test]
    async fn test_request_from_ipc_times_out_with_no_subscriber() {
        let presence: Arc<dyn Presence> = Arc::new(LocalPresence::new());

        let result = request_from_ipc(
            presence.as_ref(),
            "p:nobody",
            ProcessId("requester".into()),
            IpcRequestKind::CreateRoom { room_name: "chat".into(), options: Default::default() },
            Duration::from_millis(50),
        )
        .await;

        assert!(matches!(result, Err(IpcError::Timeout(_))));
    }
}
