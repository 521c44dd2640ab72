//! WebSocket room transport.
//!
//! Connects to the room endpoint, authenticates with an `auth` frame, then
//! runs two background tasks: a reader forwarding inbound `text` frames and a
//! writer draining the outbound queue. Sends only enqueue.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use maestro_core::error::TransportError;
use maestro_core::transport::{RoomCredentials, RoomMessage, SendKind, Transport};
use tokio::sync::{Mutex, mpsc};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, info, warn};

use crate::frame::Frame;

const QUEUE_DEPTH: usize = 256;

struct Session {
    user: String,
    outbound: mpsc::Sender<Frame>,
}

/// Room transport over a JSON-framed WebSocket.
#[derive(Default)]
pub struct WsRoomTransport {
    session: Mutex<Option<Session>>,
}

impl WsRoomTransport {
    pub fn new() -> Self {
        Self::default()
    }

    async fn enqueue(
        &self,
        kind: SendKind,
        display_name: &str,
        content: &str,
        recipients: &[String],
    ) -> Result<(), TransportError> {
        if recipients.is_empty() {
            return Ok(());
        }

        let guard = self.session.lock().await;
        let session = guard
            .as_ref()
            .ok_or_else(|| TransportError::ConnectionLost("Not connected".into()))?;

        let frame = Frame::outbound(kind, &session.user, display_name, content, recipients);
        session
            .outbound
            .send(frame)
            .await
            .map_err(|_| TransportError::ConnectionLost("Room writer stopped".into()))
    }
}

#[async_trait]
impl Transport for WsRoomTransport {
    fn name(&self) -> &str {
        "websocket"
    }

    async fn connect(
        &self,
        credentials: &RoomCredentials,
    ) -> Result<mpsc::Receiver<RoomMessage>, TransportError> {
        info!(endpoint = %credentials.endpoint, room = %credentials.room, "Connecting to room");

        let (ws_stream, _) = tokio_tungstenite::connect_async(credentials.endpoint.as_str())
            .await
            .map_err(|e| TransportError::ConnectFailed {
                endpoint: credentials.endpoint.clone(),
                reason: e.to_string(),
            })?;

        let (mut ws_write, mut ws_read) = ws_stream.split();

        let auth = Frame::Auth {
            room: credentials.room.clone(),
            user: credentials.user.clone(),
            pass: credentials.pass.clone(),
        }
        .encode()?;

        ws_write
            .send(WsMessage::Text(auth.into()))
            .await
            .map_err(|e| TransportError::ConnectFailed {
                endpoint: credentials.endpoint.clone(),
                reason: e.to_string(),
            })?;

        // Wait for the room's verdict on our credentials
        loop {
            match ws_read.next().await {
                Some(Ok(WsMessage::Text(text))) => match Frame::decode(text.as_str()) {
                    Ok(Frame::AuthOk) => break,
                    Ok(Frame::AuthError { reason }) => {
                        return Err(TransportError::AuthRejected(reason));
                    }
                    Ok(other) => debug!(frame = ?other, "Ignoring frame before auth reply"),
                    Err(e) => debug!(error = %e, "Ignoring malformed frame before auth reply"),
                },
                Some(Ok(WsMessage::Close(_))) | None => {
                    return Err(TransportError::ConnectionLost(
                        "Room closed the connection during authentication".into(),
                    ));
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(TransportError::ConnectionLost(e.to_string())),
            }
        }

        info!(room = %credentials.room, user = %credentials.user, "Joined room");

        let (out_tx, mut out_rx) = mpsc::channel::<Frame>(QUEUE_DEPTH);
        tokio::spawn(async move {
            while let Some(frame) = out_rx.recv().await {
                let text = match frame.encode() {
                    Ok(t) => t,
                    Err(e) => {
                        warn!(error = %e, "Dropping unencodable frame");
                        continue;
                    }
                };
                if let Err(e) = ws_write.send(WsMessage::Text(text.into())).await {
                    warn!(error = %e, "Room write failed");
                    break;
                }
            }
        });

        let (in_tx, in_rx) = mpsc::channel(QUEUE_DEPTH);
        tokio::spawn(async move {
            while let Some(result) = ws_read.next().await {
                let msg = match result {
                    Ok(m) => m,
                    Err(e) => {
                        warn!(error = %e, "Room read failed");
                        break;
                    }
                };

                let text = match msg {
                    WsMessage::Text(t) => t,
                    WsMessage::Close(_) => break,
                    _ => continue,
                };

                match Frame::decode(text.as_str()) {
                    Ok(frame) => {
                        if let Some(room_message) = frame.into_room_message() {
                            if in_tx.send(room_message).await.is_err() {
                                break; // receiver dropped
                            }
                        }
                    }
                    Err(e) => debug!(error = %e, "Skipping malformed room frame"),
                }
            }
            info!("Room connection closed");
        });

        *self.session.lock().await = Some(Session {
            user: credentials.user.clone(),
            outbound: out_tx,
        });

        Ok(in_rx)
    }

    async fn send_visible(
        &self,
        display_name: &str,
        content: &str,
        recipients: &[String],
    ) -> Result<(), TransportError> {
        self.enqueue(SendKind::Visible, display_name, content, recipients)
            .await
    }

    async fn send_silent(
        &self,
        display_name: &str,
        content: &str,
        recipients: &[String],
    ) -> Result<(), TransportError> {
        self.enqueue(SendKind::Silent, display_name, content, recipients)
            .await
    }
}
