//! Feed stream against a local server speaking the realtime-database
//! streaming protocol.

use std::time::Duration;

use futures_util::StreamExt;
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::time::timeout;

use market_pulse::prelude::*;

const TEST_TIMEOUT: Duration = Duration::from_secs(10);

const SSE_HEAD: &[u8] =
    b"HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nConnection: close\r\n\r\n";

/// Serve one connection: `head`, then `body`, then optionally hold the socket open.
async fn serve_once(head: &'static [u8], body: &'static str, hold_open: bool) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 4096];
        let _ = socket.read(&mut request).await;
        socket.write_all(head).await.unwrap();
        socket.write_all(body.as_bytes()).await.unwrap();
        socket.flush().await.unwrap();
        if hold_open {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
        let _ = socket.shutdown().await;
    });

    format!("http://{}", addr)
}

/// Serve one held-open SSE connection per body, in order.
async fn serve_sequence(bodies: Vec<&'static str>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut open = Vec::new();
        for body in bodies {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 4096];
            let _ = socket.read(&mut request).await;
            socket.write_all(SSE_HEAD).await.unwrap();
            socket.write_all(body.as_bytes()).await.unwrap();
            socket.flush().await.unwrap();
            open.push(socket);
        }
        tokio::time::sleep(Duration::from_secs(60)).await;
    });

    format!("http://{}", addr)
}

fn config(database_url: String) -> StreamConfig {
    StreamConfig {
        reconnect: false,
        channel: "posts".into(),
        ..StreamConfig::new(&database_url)
    }
}

/// Collect events until `stop` matches one (inclusive).
async fn collect_until(stream: &FeedStream, stop: impl Fn(&FeedEvent) -> bool) -> Vec<FeedEvent> {
    let events = stream.events();
    tokio::pin!(events);
    let mut seen = Vec::new();
    loop {
        let event = timeout(TEST_TIMEOUT, events.next())
            .await
            .expect("timed out waiting for feed events")
            .expect("event stream ended");
        let done = stop(&event);
        seen.push(event);
        if done {
            return seen;
        }
    }
}

#[tokio::test]
async fn stream_rebuilds_channel_and_reports_end() {
    let body = concat!(
        "event: put\n",
        "data: {\"path\":\"/\",\"data\":{\"k1\":{\"tweet_id\":\"1\",\"username\":\"a\",\"text\":\"old\",\"timestamp\":\"2026-10-18T10:00:00Z\",\"importance_level\":3}}}\n\n",
        "event: keep-alive\n",
        "data: null\n\n",
        "event: put\n",
        "data: {\"path\":\"/k2\",\"data\":{\"tweet_id\":\"2\",\"username\":\"b\",\"text\":\"new\",\"timestamp\":\"2026-10-18T11:00:00Z\",\"importance_level\":5,\"insight\":\"Nenhum\"}}\n\n",
        "event: patch\n",
        "data: {\"path\":\"/k1\",\"data\":{\"insight\":\"ETF inflows\"}}\n\n",
    );
    let url = serve_once(SSE_HEAD, body, false).await;

    let mut stream = FeedStream::new(config(url));
    stream.connect().await.unwrap();
    let events = collect_until(&stream, |e| matches!(e, FeedEvent::MaxReconnectReached)).await;

    assert_eq!(events[0], FeedEvent::Connected);
    let snapshots: Vec<&serde_json::Value> = events
        .iter()
        .filter_map(|e| match e {
            FeedEvent::Snapshot(value) => Some(value),
            _ => None,
        })
        .collect();
    assert_eq!(snapshots.len(), 3);
    assert!(events.contains(&FeedEvent::Disconnected {
        reason: "Stream ended".into()
    }));

    let latest = snapshots[2];
    assert_eq!(latest["k1"]["insight"], json!("ETF inflows"));

    let mut feed = FeedState::new();
    assert!(feed.on_snapshot(Some(latest)));
    let ids: Vec<&str> = feed.posts().iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, ["2", "1"]);
    assert!(feed.posts()[0].insight.is_none());
    assert_eq!(feed.posts()[1].insight.as_deref(), Some("ETF inflows"));
    assert_eq!(feed.filter(ImportanceFilter::Level(3)).len(), 1);
}

#[tokio::test]
async fn cancel_ends_stream_without_reconnect() {
    let body = concat!(
        "event: put\n",
        "data: {\"path\":\"/\",\"data\":null}\n\n",
        "event: cancel\n",
        "data: \"Permission denied\"\n\n",
    );
    let url = serve_once(SSE_HEAD, body, true).await;

    let mut stream = FeedStream::new(StreamConfig {
        reconnect: true,
        ..config(url)
    });
    stream.connect().await.unwrap();
    let events = collect_until(&stream, |e| matches!(e, FeedEvent::Disconnected { .. })).await;

    assert_eq!(
        events.last().unwrap(),
        &FeedEvent::Disconnected {
            reason: "Cancelled: Permission denied".into()
        }
    );
    assert!(events.contains(&FeedEvent::Snapshot(serde_json::Value::Null)));

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(stream.ready_state(), ReadyState::Closed);
}

#[tokio::test]
async fn http_error_status_is_a_failed_connection() {
    let head: &[u8] = b"HTTP/1.1 401 Unauthorized\r\nContent-Type: application/json\r\nConnection: close\r\n\r\n";
    let url = serve_once(head, "{\"error\" : \"Permission denied\"}", false).await;

    let mut stream = FeedStream::new(config(url));
    stream.connect().await.unwrap();
    let events = collect_until(&stream, |e| matches!(e, FeedEvent::MaxReconnectReached)).await;

    match &events[0] {
        FeedEvent::Error(message) => assert!(message.contains("401"), "got {message}"),
        other => panic!("expected connection error, got {other:?}"),
    }
    assert!(!events.contains(&FeedEvent::Connected));
}

#[tokio::test]
async fn disconnect_stops_an_open_stream() {
    let body = "event: put\ndata: {\"path\":\"/\",\"data\":{\"k\":{\"text\":\"x\"}}}\n\n";
    let url = serve_once(SSE_HEAD, body, true).await;

    let mut stream = FeedStream::new(config(url));
    stream.connect().await.unwrap();
    collect_until(&stream, |e| matches!(e, FeedEvent::Snapshot(_))).await;
    assert!(stream.is_connected());

    timeout(Duration::from_secs(2), stream.disconnect())
        .await
        .expect("disconnect should not hang")
        .unwrap();
    assert_eq!(stream.ready_state(), ReadyState::Closed);
}

#[tokio::test]
async fn connect_after_cancel_opens_a_new_stream() {
    let url = serve_sequence(vec![
        "event: cancel\ndata: \"Permission denied\"\n\n",
        "event: put\ndata: {\"path\":\"/\",\"data\":{\"k\":{\"text\":\"back\"}}}\n\n",
    ])
    .await;

    let mut stream = FeedStream::new(config(url));
    stream.connect().await.unwrap();
    collect_until(&stream, |e| matches!(e, FeedEvent::Disconnected { .. })).await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(stream.ready_state(), ReadyState::Closed);

    stream.connect().await.unwrap();
    let events = collect_until(&stream, |e| matches!(e, FeedEvent::Snapshot(_))).await;
    assert_eq!(events[0], FeedEvent::Connected);
    assert_eq!(
        events.last().unwrap(),
        &FeedEvent::Snapshot(json!({ "k": { "text": "back" } }))
    );
    assert!(stream.is_connected());

    stream.disconnect().await.unwrap();
}
