//! WebSocket upgrade handler for STOMP client connections.
//!
//! Handles the HTTP → WebSocket upgrade and manages the connection lifecycle:
//! 1. Allocate a session id and register its outbound queue
//! 2. Decode inbound STOMP frames and run them through [`ClientSession`]
//! 3. Forward accepted frames to the broker relay
//! 4. Turn failures into ERROR frames for the same client
//! 5. Unregister and release relay state on disconnect

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{stream::SplitSink, SinkExt, StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::adapters::relay::RelayHandle;
use crate::application::ErrorDispatcher;
use crate::config::RelayConfig;
use crate::domain::failure::RelayFailure;
use crate::domain::stomp::{decode, encode, StompCommand, StompFrame};

use super::protocol::{ClientSession, SessionAction};
use super::sessions::SessionRegistry;

/// STOMP sub-protocols offered during the upgrade.
pub const STOMP_SUBPROTOCOLS: [&str; 3] = ["v12.stomp", "v11.stomp", "v10.stomp"];

/// State shared by every connection.
#[derive(Clone)]
pub struct GatewayState {
    pub sessions: Arc<SessionRegistry>,
    pub dispatcher: Arc<ErrorDispatcher>,
    pub relay: RelayHandle,
    pub relay_config: Arc<RelayConfig>,
    /// Capacity of each session's outbound queue.
    pub session_buffer: usize,
}

/// Handle WebSocket upgrade requests on the STOMP endpoint.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<GatewayState>) -> Response {
    ws.protocols(STOMP_SUBPROTOCOLS)
        .on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an established WebSocket connection until either side closes it.
async fn handle_socket(socket: WebSocket, state: GatewayState) {
    let (sender, mut receiver) = socket.split();

    let session_id = Uuid::new_v4().to_string();
    let (tx, rx) = mpsc::channel(state.session_buffer.max(1));
    state.sessions.register(session_id.clone(), tx.clone()).await;

    // Outbound queue → socket
    let mut send_task = {
        let session_id = session_id.clone();
        tokio::spawn(async move { pump_outbound(sender, rx, &session_id).await })
    };

    // Socket → session state machine
    let mut recv_task = {
        let state = state.clone();
        let session_id = session_id.clone();
        tokio::spawn(async move {
            let mut session = ClientSession::new(session_id);
            while let Some(result) = receiver.next().await {
                let keep_open = match result {
                    Ok(Message::Text(text)) => {
                        handle_inbound(&state, &mut session, &tx, text.as_bytes()).await
                    }
                    Ok(Message::Binary(bytes)) => {
                        handle_inbound(&state, &mut session, &tx, &bytes).await
                    }
                    Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => true,
                    Ok(Message::Close(_)) => {
                        tracing::debug!(session_id = %session.id(), "Client sent close frame");
                        false
                    }
                    Err(e) => {
                        tracing::debug!(session_id = %session.id(), "Receive error: {}", e);
                        false
                    }
                };
                if !keep_open {
                    break;
                }
            }
        })
    };

    // Wait for either task to finish
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => {
            // Let queued frames (receipts, errors) drain before closing
            state.sessions.unregister(&session_id).await;
            let _ = send_task.await;
        }
    }

    state.sessions.unregister(&session_id).await;
    state.relay.session_closed(session_id.clone()).await;
    tracing::info!(%session_id, "Client session closed");
}

/// Writes queued frames to the socket. An ERROR frame ends the connection.
async fn pump_outbound(
    mut sender: SplitSink<WebSocket, Message>,
    mut rx: mpsc::Receiver<StompFrame>,
    session_id: &str,
) {
    while let Some(frame) = rx.recv().await {
        let is_error = frame.command == StompCommand::Error;
        let text = String::from_utf8_lossy(&encode(&frame)).into_owned();
        if let Err(e) = sender.send(Message::Text(text)).await {
            tracing::debug!(%session_id, "Send error, closing connection: {}", e);
            return;
        }
        if is_error {
            tracing::debug!(%session_id, "Closing connection after ERROR frame");
            break;
        }
    }
    let _ = sender.send(Message::Close(None)).await;
}

/// Processes one WebSocket message. Returns `false` when the connection
/// should be closed.
async fn handle_inbound(
    state: &GatewayState,
    session: &mut ClientSession,
    tx: &mpsc::Sender<StompFrame>,
    bytes: &[u8],
) -> bool {
    let mut frame = match decode(bytes) {
        Ok(Some(frame)) => frame,
        // Heart-beat
        Ok(None) => return true,
        Err(err) => {
            tracing::warn!(session_id = %session.id(), error = %err, "Undecodable client frame");
            let failure = RelayFailure::from(err);
            if let Err(err) = state
                .dispatcher
                .send_error_to_channel(Some(&session.context()), &failure)
                .await
            {
                tracing::warn!(session_id = %session.id(), error = %err, "Failed to report decode error");
            }
            return true;
        }
    };

    match session.accept(&mut frame, &state.relay_config) {
        Ok(SessionAction::Reply(reply)) => enqueue(tx, reply).await,
        Ok(SessionAction::Forward) => {
            if let Err(err) = state.relay.forward(frame.clone()).await {
                reply_with_error(state, tx, &frame, &RelayFailure::from(err)).await;
            }
        }
        Ok(SessionAction::Disconnect(receipt)) => {
            if let Some(receipt) = receipt {
                enqueue(tx, receipt).await;
            }
            return false;
        }
        Err(failure) => reply_with_error(state, tx, &frame, &failure).await,
    }
    true
}

async fn reply_with_error(
    state: &GatewayState,
    tx: &mpsc::Sender<StompFrame>,
    frame: &StompFrame,
    failure: &RelayFailure,
) {
    tracing::debug!(
        session_id = ?frame.session_id,
        command = %frame.command,
        error = %failure,
        "Client frame rejected"
    );
    match state
        .dispatcher
        .handle_client_message_processing_error(Some(frame), failure)
    {
        Ok(error_frame) => enqueue(tx, error_frame).await,
        Err(err) => tracing::error!(error = %err, "Failed to build error frame"),
    }
}

async fn enqueue(tx: &mpsc::Sender<StompFrame>, frame: StompFrame) {
    if tx.send(frame).await.is_err() {
        tracing::debug!("Outbound queue closed before frame could be sent");
    }
}

/// Create axum router for the STOMP endpoint at `path`.
pub fn websocket_router(path: &str) -> axum::Router<GatewayState> {
    use axum::routing::get;

    axum::Router::new().route(path, get(ws_handler))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::serialization::JsonResponseCodec;
    use crate::application::SafeSerializer;
    use crate::domain::stomp::decode;
    use serde_json::Value;

    fn state() -> (GatewayState, mpsc::Receiver<crate::adapters::relay::RelayCommand>) {
        let sessions = Arc::new(SessionRegistry::new());
        let serializer = SafeSerializer::new(Arc::new(JsonResponseCodec));
        let dispatcher = Arc::new(ErrorDispatcher::new(serializer, sessions.clone()));
        let (relay_tx, relay_rx) = mpsc::channel(8);
        let state = GatewayState {
            sessions,
            dispatcher,
            relay: RelayHandle::new(relay_tx),
            relay_config: Arc::new(RelayConfig::default()),
            session_buffer: 8,
        };
        (state, relay_rx)
    }

    #[tokio::test]
    async fn connect_then_send_is_forwarded() {
        let (state, mut relay_rx) = state();
        let (tx, mut rx) = mpsc::channel(8);
        let mut session = ClientSession::new("s1");

        let keep = handle_inbound(
            &state,
            &mut session,
            &tx,
            b"CONNECT\naccept-version:1.2\nlogin:alice\n\n\0",
        )
        .await;
        assert!(keep);
        assert_eq!(rx.recv().await.unwrap().command, StompCommand::Connected);

        handle_inbound(&state, &mut session, &tx, b"SEND\ndestination:/topic/a\n\nhi\0").await;

        let Some(crate::adapters::relay::RelayCommand::Frame(frame)) = relay_rx.recv().await
        else {
            panic!("expected forwarded frame");
        };
        assert_eq!(frame.session_id.as_deref(), Some("s1"));
        assert_eq!(frame.principal.as_deref(), Some("alice"));
        assert_eq!(frame.body_text(), "hi");
    }

    #[tokio::test]
    async fn rejected_frame_yields_error_frame_with_receipt() {
        let (state, _relay_rx) = state();
        let (tx, mut rx) = mpsc::channel(8);
        let mut session = ClientSession::new("s1");
        handle_inbound(&state, &mut session, &tx, b"CONNECT\nlogin:alice\n\n\0").await;
        rx.recv().await.unwrap();

        handle_inbound(&state, &mut session, &tx, b"SEND\nreceipt:r1\n\nBAD CMD\0").await;

        let error = rx.recv().await.unwrap();
        assert_eq!(error.command, StompCommand::Error);
        assert_eq!(error.receipt_id(), Some("r1"));
        let body: Value = serde_json::from_slice(&error.body).unwrap();
        assert_eq!(body["statusCode"], 400);
        assert_eq!(
            body["message"],
            "400 BAD_REQUEST : code - 400 Missing destination header: [alice]"
        );
        assert_eq!(body["data"], "BAD CMD");
    }

    #[tokio::test]
    async fn frame_before_connect_is_denied() {
        let (state, _relay_rx) = state();
        let (tx, mut rx) = mpsc::channel(8);
        let mut session = ClientSession::new("s1");

        handle_inbound(&state, &mut session, &tx, b"SUBSCRIBE\nid:0\ndestination:/topic/a\n\n\0")
            .await;

        let error = rx.recv().await.unwrap();
        assert_eq!(error.command, StompCommand::Error);
        let body: Value = serde_json::from_slice(&error.body).unwrap();
        assert_eq!(body["statusCode"], 903);
    }

    #[tokio::test]
    async fn undecodable_frame_goes_out_of_band() {
        let (state, _relay_rx) = state();
        let (tx, mut rx) = mpsc::channel(8);
        state.sessions.register("s1", tx.clone()).await;
        let mut session = ClientSession::new("s1");

        let keep = handle_inbound(&state, &mut session, &tx, b"BOGUS\n\n\0").await;

        assert!(keep);
        let error = rx.recv().await.unwrap();
        assert_eq!(error.command, StompCommand::Error);
        assert_eq!(error.session_id.as_deref(), Some("s1"));
        let body: Value = serde_json::from_slice(&error.body).unwrap();
        assert_eq!(body["statusCode"], 400);
    }

    #[tokio::test]
    async fn heartbeat_is_ignored() {
        let (state, _relay_rx) = state();
        let (tx, mut rx) = mpsc::channel(8);
        let mut session = ClientSession::new("s1");

        assert!(handle_inbound(&state, &mut session, &tx, b"\n").await);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn disconnect_sends_receipt_and_closes() {
        let (state, _relay_rx) = state();
        let (tx, mut rx) = mpsc::channel(8);
        let mut session = ClientSession::new("s1");
        handle_inbound(&state, &mut session, &tx, b"CONNECT\n\n\0").await;
        rx.recv().await.unwrap();

        let keep = handle_inbound(&state, &mut session, &tx, b"DISCONNECT\nreceipt:9\n\n\0").await;

        assert!(!keep);
        let receipt = rx.recv().await.unwrap();
        assert_eq!(receipt.command, StompCommand::Receipt);
        assert_eq!(receipt.receipt_id(), Some("9"));
    }

    #[tokio::test]
    async fn stopped_relay_yields_generic_error() {
        let (state, relay_rx) = state();
        drop(relay_rx);
        let (tx, mut rx) = mpsc::channel(8);
        let mut session = ClientSession::new("s1");
        handle_inbound(&state, &mut session, &tx, b"CONNECT\n\n\0").await;
        rx.recv().await.unwrap();

        handle_inbound(&state, &mut session, &tx, b"SEND\ndestination:/queue/q\n\nx\0").await;

        let error = rx.recv().await.unwrap();
        assert_eq!(error.command, StompCommand::Error);
        assert_eq!(error.message(), Some("Broker relay is unavailable"));
        let encoded = encode(&error);
        assert!(decode(&encoded).unwrap().is_some());
    }

    #[test]
    fn websocket_router_creates_route() {
        let _router = websocket_router("/websocket");
    }
}
