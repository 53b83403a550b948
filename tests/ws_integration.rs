// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the WebSocket event stream against an in-process
//! server.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use pergor_lib::EventTopic;
use pergor_lib::protocol::{DeviceConfig, open_event_stream};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;

const TOKEN: &str = "test-jwt-token";

type ServerStream = WebSocketStream<TcpStream>;

/// Binds a listener and returns it with a matching device configuration.
async fn listener_and_config() -> (TcpListener, DeviceConfig) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let config = DeviceConfig::new("127.0.0.1")
        .with_port(port)
        .with_plain_http();
    (listener, config)
}

/// Accepts one WebSocket connection.
async fn accept(listener: &TcpListener) -> ServerStream {
    let (stream, _) = listener.accept().await.unwrap();
    tokio_tungstenite::accept_async(stream).await.unwrap()
}

/// Reads the next text frame as JSON.
async fn next_json(server: &mut ServerStream) -> serde_json::Value {
    loop {
        let message = timeout(Duration::from_secs(5), server.next())
            .await
            .expect("timed out waiting for client message")
            .expect("connection closed")
            .expect("read failed");
        if let Message::Text(text) = message {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

/// Drives the server through the expected handshake.
async fn expect_handshake(server: &mut ServerStream) {
    let authenticate = next_json(server).await;
    assert_eq!(authenticate["type"], "Authenticate");
    assert_eq!(authenticate["data"]["bearer"], TOKEN);

    let subscribe = next_json(server).await;
    assert_eq!(subscribe["type"], "Subscribe");
    let subscriptions = subscribe["data"]["subscriptions"].as_array().unwrap();
    assert_eq!(subscriptions.len(), 5);
    for topic in EventTopic::ALL {
        assert!(subscriptions.contains(&serde_json::json!(topic.as_str())));
    }
}

async fn send_json(server: &mut ServerStream, value: serde_json::Value) {
    server
        .send(Message::text(value.to_string()))
        .await
        .unwrap();
}

#[tokio::test]
async fn handshake_then_event_delivery() {
    let (listener, config) = listener_and_config().await;

    let server_task = tokio::spawn(async move {
        let mut server = accept(&listener).await;
        expect_handshake(&mut server).await;

        // Protocol chatter and unknown types must not reach the callback
        send_json(&mut server, serde_json::json!({"type": "Authenticated", "data": {}})).await;
        send_json(
            &mut server,
            serde_json::json!({"type": "SubscriptionsUpdated", "data": {}}),
        )
        .await;
        send_json(
            &mut server,
            serde_json::json!({"type": "FIRMWARE_UPDATED", "data": {"version": 2}}),
        )
        .await;

        send_json(
            &mut server,
            serde_json::json!({
                "type": "SKYE2_STATUS_CHANGED",
                "data": {"roof_device": {"state": "moving", "direction": "stacking"}}
            }),
        )
        .await;

        // Keep the connection open until the client is done
        sleep(Duration::from_secs(5)).await;
    });

    let (tx, mut rx) = mpsc::unbounded_channel();
    let handle = open_event_stream(&config, TOKEN, move |event| {
        let _ = tx.send(event);
    })
    .await
    .unwrap();

    assert!(handle.is_connected());

    let event = timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("callback channel closed");

    assert_eq!(event.topic, EventTopic::Skye2StatusChanged);
    assert_eq!(
        event.data["roof_device"]["direction"],
        serde_json::json!("stacking")
    );

    // The discarded frames produced no further events
    assert!(rx.try_recv().is_err());

    handle.close();
    server_task.abort();
}

#[tokio::test]
async fn server_close_disconnects_the_stream() {
    let (listener, config) = listener_and_config().await;

    let server_task = tokio::spawn(async move {
        let mut server = accept(&listener).await;
        expect_handshake(&mut server).await;
        server.close(None).await.unwrap();
    });

    let handle = open_event_stream(&config, TOKEN, |_event| {}).await.unwrap();

    // The read loop notices the close within the transport's own latency
    let mut waited = Duration::ZERO;
    while handle.is_connected() && waited < Duration::from_secs(5) {
        sleep(Duration::from_millis(50)).await;
        waited += Duration::from_millis(50);
    }
    assert!(!handle.is_connected());

    server_task.await.unwrap();
    handle.close();
}

#[tokio::test]
async fn client_close_is_prompt() {
    let (listener, config) = listener_and_config().await;

    let server_task = tokio::spawn(async move {
        let mut server = accept(&listener).await;
        expect_handshake(&mut server).await;
        // Hold the connection open; the client closes first
        while server.next().await.is_some() {}
    });

    let handle = open_event_stream(&config, TOKEN, |_event| {}).await.unwrap();
    assert!(handle.is_connected());

    handle.close();

    // The server sees the connection drop once the client tasks are gone
    timeout(Duration::from_secs(5), server_task)
        .await
        .expect("server did not observe the close")
        .unwrap();
}

#[tokio::test]
async fn connection_refused_is_an_error() {
    let (listener, config) = listener_and_config().await;
    drop(listener);

    let result = open_event_stream(&config, TOKEN, |_event| {}).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn malformed_frames_are_discarded() {
    let (listener, config) = listener_and_config().await;

    let server_task = tokio::spawn(async move {
        let mut server = accept(&listener).await;
        expect_handshake(&mut server).await;

        server.send(Message::text("not json")).await.unwrap();
        server
            .send(Message::binary(vec![0x01, 0x02, 0x03]))
            .await
            .unwrap();
        send_json(&mut server, serde_json::json!(["an", "array"])).await;

        // A valid event after the garbage proves the loop survived it
        send_json(
            &mut server,
            serde_json::json!({"type": "ROOF_STATUS_CHANGED", "data": {"state": "ready"}}),
        )
        .await;

        sleep(Duration::from_secs(5)).await;
    });

    let (tx, mut rx) = mpsc::unbounded_channel();
    let handle = open_event_stream(&config, TOKEN, move |event| {
        let _ = tx.send(event);
    })
    .await
    .unwrap();

    let event = timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("callback channel closed");

    assert_eq!(event.topic, EventTopic::RoofStatusChanged);
    assert!(rx.try_recv().is_err());

    handle.close();
    server_task.abort();
}
