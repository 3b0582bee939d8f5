//! Listener tests over the HTTP surface.
//!
//! Tests:
//! - Messages published while listening arrive in order
//! - Stop ends the stream while blocking pulls are in flight
//! - A pull failure closes the session and is reported by finish

mod common;

use std::time::Duration;

use futures::StreamExt;
use pubsub::config::ListenerConfig;
use pubsub::{Client, Error, Message};

use common::TestServer;

fn quick() -> ListenerConfig {
    ListenerConfig {
        buffer: 8,
        max_backoff: Duration::from_millis(50),
    }
}

async fn setup(server: &TestServer) -> Client {
    let client = server.client("proj");
    client.topic("t").create().await.unwrap();
    client
        .subscription("s")
        .create("t", Duration::ZERO, None)
        .await
        .unwrap();
    client
}

#[tokio::test]
async fn test_listen_receives_and_acks() {
    let server = TestServer::start().await;
    let client = setup(&server).await;
    let sub = client.subscription("s");

    let mut listener = sub.listen_with(quick()).expect("listen failed");

    let topic = client.topic("t");
    for payload in ["one", "two", "three"] {
        topic.publish(&Message::new(payload)).await.unwrap();
    }

    let mut received = Vec::new();
    while received.len() < 3 {
        let msg = tokio::time::timeout(Duration::from_secs(5), listener.next())
            .await
            .expect("timed out waiting for message")
            .expect("stream ended early");
        sub.ack(msg.ack_id()).await.expect("ack failed");
        received.push(String::from_utf8(msg.data).unwrap());
    }
    assert_eq!(received, ["one", "two", "three"]);
    assert_eq!(server.api.outstanding(), 0);

    listener.stop();
    assert!(listener.next().await.is_none());
    listener.finish().await.expect("listener should end cleanly");

    server.shutdown().await;
}

#[tokio::test]
async fn test_stop_during_blocking_pull() {
    let server = TestServer::start().await;
    let client = setup(&server).await;

    let listener = client
        .subscription("s")
        .listen_with(quick())
        .expect("listen failed");
    let handle = listener.stop_handle();

    // Let the task settle into its blocking pull loop.
    tokio::time::sleep(Duration::from_millis(120)).await;

    let stopper = tokio::spawn(async move {
        handle.stop();
        handle.stop();
    });
    stopper.await.unwrap();

    tokio::time::timeout(Duration::from_secs(2), listener.finish())
        .await
        .expect("stop should not wait for the pull to return")
        .expect("stopped listener should end cleanly");

    server.shutdown().await;
}

#[tokio::test]
async fn test_pull_failure_is_reported() {
    let server = TestServer::start().await;
    let client = setup(&server).await;
    server.api.set_fail_pulls(true);

    let mut listener = client
        .subscription("s")
        .listen_with(quick())
        .expect("listen failed");

    let end = tokio::time::timeout(Duration::from_secs(5), listener.next())
        .await
        .expect("stream should close");
    assert!(end.is_none());

    match listener.finish().await {
        Err(Error::Service { status, .. }) => assert_eq!(status, 503),
        other => panic!("expected service error, got {other:?}"),
    }

    server.shutdown().await;
}
