//! Per-connection lifecycle.
//!
//! Each accepted socket gets exactly one reader (this task) and one writer
//! task. Everything that needs to reach the socket - command responses,
//! heartbeat pings, the final close frame - goes through the writer's
//! channel, so frames are serialized without a lock around the sink.
//!
//! A malformed or rejected envelope produces an error envelope and the
//! connection continues; only transport failures and missed read deadlines
//! tear the connection down.

use crate::auth::{AuthContext, ConnectionAuth};
use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::protocol::{Envelope, CODE_AUTH_ERROR, CODE_BAD_ENVELOPE};
use crate::router::Router;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::{CloseFrame, Message, WebSocketConfig};
use tokio_tungstenite::{accept_hdr_async_with_config, WebSocketStream};
use tracing::{debug, info, warn};

/// Frames the writer task knows how to emit.
enum OutboundFrame {
    Data(Envelope),
    Ping,
    Close,
}

/// Depth of the per-connection outbound queue.
const OUTBOUND_QUEUE_DEPTH: usize = 64;

/// Handles one client connection from upgrade to teardown.
///
/// Rejections during the HTTP upgrade (bad origin, failed auth) never
/// become WebSocket connections; the client sees a plain HTTP error.
pub async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    router: Arc<Router>,
    auth: Arc<dyn ConnectionAuth>,
    config: Arc<GatewayConfig>,
) -> Result<(), GatewayError> {
    let ws_config = WebSocketConfig::default()
        .max_message_size(Some(config.max_frame_bytes))
        .max_frame_size(Some(config.max_frame_bytes));

    // The handshake callback runs once; it smuggles the established
    // identity out through this slot.
    let context_slot: Arc<Mutex<Option<AuthContext>>> = Arc::new(Mutex::new(None));

    let callback = {
        let auth = auth.clone();
        let config = config.clone();
        let context_slot = context_slot.clone();
        move |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
            let origin = request
                .headers()
                .get("origin")
                .and_then(|v| v.to_str().ok());
            if !config.origin_allowed(origin) {
                warn!("🚫 Rejected origin {:?} from {}", origin, addr);
                return Err(reject(StatusCode::FORBIDDEN, "origin not allowed"));
            }

            match auth.on_connect(request.headers()) {
                Ok(context) => {
                    let mut slot = match context_slot.lock() {
                        Ok(guard) => guard,
                        Err(poisoned) => poisoned.into_inner(),
                    };
                    *slot = Some(context);
                    Ok(response)
                }
                Err(reason) => {
                    warn!("🚫 Rejected connection from {}: {}", addr, reason);
                    Err(reject(StatusCode::UNAUTHORIZED, &reason.to_string()))
                }
            }
        }
    };

    let ws_stream = accept_hdr_async_with_config(stream, callback, Some(ws_config)).await?;

    let mut context = {
        let mut slot = match context_slot.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        slot.take().ok_or_else(|| {
            GatewayError::Internal("handshake accepted without an auth context".to_string())
        })?
    };

    info!("🔌 Connection established: {} as {}", addr, context.subject);

    let (ws_sink, mut ws_source) = ws_stream.split();

    let (outbound, outbound_rx) = mpsc::channel::<OutboundFrame>(OUTBOUND_QUEUE_DEPTH);
    let writer = tokio::spawn(write_loop(ws_sink, outbound_rx, config.clone()));

    let heartbeat = {
        let outbound = outbound.clone();
        let interval = config.ping_interval();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // first tick fires immediately
            loop {
                ticker.tick().await;
                if outbound.send(OutboundFrame::Ping).await.is_err() {
                    break;
                }
            }
        })
    };

    // Read loop. Any inbound frame (including pongs) refreshes the
    // deadline; a full read-timeout of silence means the peer is gone.
    loop {
        let message = match timeout(config.read_timeout(), ws_source.next()).await {
            Err(_) => {
                info!("💤 Connection {} idle past read deadline", addr);
                break;
            }
            Ok(None) => break,
            Ok(Some(Err(e))) => {
                debug!("Connection {} read error: {}", addr, e);
                break;
            }
            Ok(Some(Ok(message))) => message,
        };

        match message {
            Message::Binary(bytes) => {
                context = handle_frame(&bytes, &router, auth.as_ref(), context, &outbound).await;
            }
            Message::Close(_) => {
                debug!("Connection {} sent close", addr);
                break;
            }
            // Pings are answered by the protocol layer; pongs and text
            // frames carry nothing for a binary protocol.
            Message::Ping(_) | Message::Pong(_) | Message::Text(_) | Message::Frame(_) => {}
        }
    }

    heartbeat.abort();
    let _ = outbound.send(OutboundFrame::Close).await;
    drop(outbound);
    let _ = writer.await;

    info!("👋 Connection closed: {}", addr);
    Ok(())
}

/// Decodes, authorizes, and routes one binary frame, queueing whatever
/// should go back to the client. Never fails the connection.
///
/// Returns the context to carry into the next frame: the authorizer's
/// updated context on an accepted envelope, the unchanged one otherwise.
async fn handle_frame(
    bytes: &[u8],
    router: &Router,
    auth: &dyn ConnectionAuth,
    context: AuthContext,
    outbound: &mpsc::Sender<OutboundFrame>,
) -> AuthContext {
    let envelope = match Envelope::decode(bytes) {
        Ok(envelope) => envelope,
        Err(e) => {
            debug!("Undecodable frame: {}", e);
            let reply = Envelope::error("", CODE_BAD_ENVELOPE, "frame is not a valid envelope");
            let _ = outbound.send(OutboundFrame::Data(reply)).await;
            return context;
        }
    };

    let context = match auth.on_envelope(&context, &envelope) {
        Ok(updated) => updated,
        Err(e) => {
            let reply = Envelope::error(envelope.correlation_id, CODE_AUTH_ERROR, e.to_string());
            let _ = outbound.send(OutboundFrame::Data(reply)).await;
            return context;
        }
    };

    match router.route(&envelope).await {
        Ok(replies) => {
            for reply in replies {
                if outbound.send(OutboundFrame::Data(reply)).await.is_err() {
                    return context;
                }
            }
        }
        Err(e) => {
            let reply = Envelope::error(envelope.correlation_id, e.code(), e.to_string());
            let _ = outbound.send(OutboundFrame::Data(reply)).await;
        }
    }

    context
}

/// The writer task: sole owner of the sink half. Exits when the channel
/// closes, a write fails, or a close frame has been sent.
async fn write_loop(
    mut sink: SplitSink<WebSocketStream<TcpStream>, Message>,
    mut outbound: mpsc::Receiver<OutboundFrame>,
    config: Arc<GatewayConfig>,
) {
    while let Some(frame) = outbound.recv().await {
        match frame {
            OutboundFrame::Data(envelope) => {
                let bytes = match envelope.encode() {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        warn!("Dropping unencodable envelope: {}", e);
                        continue;
                    }
                };
                match timeout(config.write_timeout(), sink.send(Message::binary(bytes))).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        debug!("Write failed: {}", e);
                        break;
                    }
                    Err(_) => {
                        debug!("Write deadline exceeded");
                        break;
                    }
                }
            }
            OutboundFrame::Ping => {
                let ping = Message::Ping(Vec::new().into());
                if timeout(config.control_timeout(), sink.send(ping))
                    .await
                    .map_or(true, |r| r.is_err())
                {
                    break;
                }
            }
            OutboundFrame::Close => {
                let close = Message::Close(Some(CloseFrame {
                    code: CloseCode::Normal,
                    reason: "bye".into(),
                }));
                let _ = timeout(config.control_timeout(), sink.send(close)).await;
                break;
            }
        }
    }
}

fn reject(status: StatusCode, reason: &str) -> ErrorResponse {
    let mut response = ErrorResponse::new(Some(reason.to_string()));
    *response.status_mut() = status;
    response
}
