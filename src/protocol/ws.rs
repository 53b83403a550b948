// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! WebSocket event stream for pergola roof devices.
//!
//! The device pushes state events over `wss://<host>/api/v1/ws/events`.
//! After connecting, the client authenticates with its bearer token and
//! subscribes to the state topics; a background keepalive then sends an
//! application-level Ping every 25 seconds for the life of the connection.
//!
//! The stream does not reconnect on its own. The reconciler notices a dead
//! stream through [`EventStreamHandle::is_connected`] and re-opens it on its
//! next scheduled poll, so there is exactly one retry loop in the system.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{Connector, MaybeTlsStream, WebSocketStream};

use crate::error::ProtocolError;
use crate::event::{EventTopic, PushEvent, classify};
use crate::protocol::DeviceConfig;

/// Interval between application-level Ping messages.
pub const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(25);

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Handle to an open event stream.
///
/// Owns the background read loop and keepalive tasks. Closing the handle
/// aborts both, which drops the socket halves and closes the connection.
#[derive(Debug)]
pub struct EventStreamHandle {
    reader: JoinHandle<()>,
    keepalive: JoinHandle<()>,
    connected: Arc<AtomicBool>,
}

impl EventStreamHandle {
    /// Returns `true` while the read loop is alive.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Closes the stream: cancels the keepalive and unblocks the read loop.
    pub fn close(self) {
        self.connected.store(false, Ordering::Release);
        self.keepalive.abort();
        self.reader.abort();
    }
}

/// Opens the event stream and spawns its background tasks.
///
/// Performs the `Authenticate` + `Subscribe` handshake before returning, so
/// a returned handle is a stream the device has accepted. Classified events
/// are delivered to `on_event` from the read loop until the connection
/// closes or errors.
///
/// # Errors
///
/// Returns error if the connection or the handshake fails.
pub async fn open_event_stream<F>(
    config: &DeviceConfig,
    token: &str,
    on_event: F,
) -> Result<EventStreamHandle, ProtocolError>
where
    F: Fn(PushEvent) + Send + Sync + 'static,
{
    let url = config.ws_url();

    tracing::debug!(url = %url, "Connecting to event stream");

    let connector = tls_connector(config)?;
    let (mut stream, _response) =
        tokio_tungstenite::connect_async_tls_with_config(url.as_str(), None, false, connector)
            .await
            .map_err(ProtocolError::WebSocket)?;

    handshake(&mut stream, token).await?;

    tracing::debug!("Event stream connected");

    let (mut write, mut read) = stream.split();
    let connected = Arc::new(AtomicBool::new(true));

    // Keepalive: the device drops silent connections. Send failures are
    // swallowed; the next read failure surfaces the disconnect.
    let keepalive = tokio::spawn(async move {
        let mut interval = tokio::time::interval(KEEPALIVE_INTERVAL);
        interval.tick().await;
        loop {
            interval.tick().await;
            let ping = serde_json::json!({"type": "Ping", "data": {}}).to_string();
            if let Err(error) = write.send(Message::text(ping)).await {
                tracing::debug!(error = %error, "Keepalive ping failed");
                break;
            }
        }
    });

    let keepalive_abort = keepalive.abort_handle();
    let connected_flag = Arc::clone(&connected);
    let reader = tokio::spawn(async move {
        while let Some(message) = read.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    if let Some(event) = classify(text.as_str()) {
                        on_event(event);
                    }
                }
                Ok(Message::Binary(payload)) => {
                    tracing::debug!(len = payload.len(), "Ignoring binary push message");
                }
                Ok(Message::Close(frame)) => {
                    tracing::debug!(?frame, "Event stream closed by device");
                    break;
                }
                Ok(_) => {}
                Err(error) => {
                    tracing::error!(error = %error, "Event stream read failed");
                    break;
                }
            }
        }
        connected_flag.store(false, Ordering::Release);
        keepalive_abort.abort();
    });

    Ok(EventStreamHandle {
        reader,
        keepalive,
        connected,
    })
}

/// Sends the Authenticate and Subscribe handshake messages.
async fn handshake(stream: &mut WsStream, token: &str) -> Result<(), ProtocolError> {
    let authenticate = serde_json::json!({
        "type": "Authenticate",
        "data": {"bearer": token},
    });
    stream
        .send(Message::text(authenticate.to_string()))
        .await
        .map_err(ProtocolError::WebSocket)?;

    let topics: Vec<&str> = EventTopic::ALL.iter().map(|topic| topic.as_str()).collect();
    let subscribe = serde_json::json!({
        "type": "Subscribe",
        "data": {"subscriptions": topics},
    });
    stream
        .send(Message::text(subscribe.to_string()))
        .await
        .map_err(ProtocolError::WebSocket)
}

/// Builds the TLS connector honoring the `verify_ssl` setting.
fn tls_connector(config: &DeviceConfig) -> Result<Option<Connector>, ProtocolError> {
    if config.verify_ssl() {
        return Ok(None);
    }

    let tls = native_tls::TlsConnector::builder()
        .danger_accept_invalid_certs(true)
        .danger_accept_invalid_hostnames(true)
        .build()
        .map_err(ProtocolError::Tls)?;

    Ok(Some(Connector::NativeTls(tls)))
}
