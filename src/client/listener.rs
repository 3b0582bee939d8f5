//! Continuous consumption of a subscription.
//!
//! A listener session runs one background task that pulls in a loop and
//! hands each decoded message to the caller through a bounded channel.
//! Every suspension point of the task (pull, hand-off, idle backoff) races
//! against the session's cancellation token, so [`Listener::stop`] takes
//! effect promptly even when no publisher is active or the caller stopped
//! reading.
//!
//! The session is closed either by a stop request or by the first pull
//! error. In both cases the stream ends without a final message; the error,
//! if any, is returned by [`Listener::finish`].

use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

use crate::client::subscription::{ListeningSlot, Subscription};
use crate::config::ListenerConfig;
use crate::error::Result;
use crate::flow::idle_backoff;
use crate::message::Message;

/// Stops a listener session. Cheap to clone, safe to call any number of
/// times from any task.
#[derive(Debug, Clone)]
pub struct StopHandle {
    token: CancellationToken,
    stopped: Arc<AtomicBool>,
}

impl StopHandle {
    fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request the session to close. Never blocks.
    pub fn stop(&self) {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            tracing::debug!("Listener stop requested");
        }
        self.token.cancel();
    }

    /// Whether [`stop`](Self::stop) has been called.
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// A stream of messages from one subscription.
///
/// Dropping the listener stops the session.
#[derive(Debug)]
pub struct Listener {
    messages: ReceiverStream<Message>,
    stop: StopHandle,
    task: JoinHandle<Result<()>>,
}

impl Listener {
    pub(crate) fn spawn(
        subscription: Subscription,
        slot: ListeningSlot,
        config: ListenerConfig,
    ) -> Self {
        let (tx, rx) = mpsc::channel(config.buffer.max(1));
        let stop = StopHandle::new();
        let token = stop.token.clone();

        tracing::debug!(subscription = subscription.full_name(), "Listener started");
        let task = tokio::spawn(async move {
            let _slot = slot;
            let result = run(&subscription, &tx, &token, &config).await;
            match &result {
                Ok(()) => tracing::debug!(
                    subscription = subscription.full_name(),
                    "Listener closed"
                ),
                Err(e) => tracing::warn!(
                    subscription = subscription.full_name(),
                    error = %e,
                    "Listener closed on pull error"
                ),
            }
            result
        });

        Self {
            messages: ReceiverStream::new(rx),
            stop,
            task,
        }
    }

    /// Stop the session. Idempotent.
    pub fn stop(&self) {
        self.stop.stop();
    }

    /// A handle that can stop this session from elsewhere.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Whether the session is closed: stopped, or its task has exited.
    pub fn is_closed(&self) -> bool {
        self.stop.is_stopped() || self.task.is_finished()
    }

    /// Wait for the background task to exit and return its terminal error.
    ///
    /// Returns `Ok(())` when the session ended by a stop request. This does
    /// not stop the session itself; call [`stop`](Self::stop) first unless
    /// the session is expected to fail.
    pub async fn finish(mut self) -> Result<()> {
        match (&mut self.task).await {
            Ok(result) => result,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(_) => Ok(()),
        }
    }
}

impl Stream for Listener {
    type Item = Message;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Message>> {
        let this = self.get_mut();
        if this.stop.is_stopped() {
            return Poll::Ready(None);
        }
        Pin::new(&mut this.messages).poll_next(cx)
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        self.stop.token.cancel();
    }
}

/// The session loop. Returns `Ok(())` on cancellation or when the receiving
/// side is gone, and the pull error otherwise.
async fn run(
    subscription: &Subscription,
    tx: &mpsc::Sender<Message>,
    token: &CancellationToken,
    config: &ListenerConfig,
) -> Result<()> {
    let mut idle_attempts: u32 = 0;

    loop {
        if token.is_cancelled() {
            return Ok(());
        }

        let pulled = tokio::select! {
            biased;
            () = token.cancelled() => return Ok(()),
            res = subscription.pull(false) => res?,
        };

        let Some(message) = pulled else {
            let delay = idle_backoff(idle_attempts, config.max_backoff);
            idle_attempts = idle_attempts.saturating_add(1);
            tokio::select! {
                biased;
                () = token.cancelled() => return Ok(()),
                () = tokio::time::sleep(delay) => {}
            }
            continue;
        };
        idle_attempts = 0;

        tokio::select! {
            biased;
            () = token.cancelled() => return Ok(()),
            sent = tx.send(message) => {
                if sent.is_err() {
                    return Ok(());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures::StreamExt;

    use crate::api::MemoryApi;
    use crate::config::ListenerConfig;
    use crate::{Client, Error, LabelValue, Message};

    use super::*;

    fn quick() -> ListenerConfig {
        ListenerConfig {
            buffer: 4,
            max_backoff: Duration::from_millis(20),
        }
    }

    async fn setup() -> (Arc<MemoryApi>, Client) {
        crate::observability::tracing::init_test_tracing();
        let api = Arc::new(MemoryApi::with_blocking_wait(Duration::from_millis(20)));
        let client = Client::with_api("proj", api.clone()).unwrap();
        client.topic("t").create().await.unwrap();
        client
            .subscription("s")
            .create("t", Duration::ZERO, None)
            .await
            .unwrap();
        (api, client)
    }

    async fn next(listener: &mut Listener) -> Option<Message> {
        tokio::time::timeout(Duration::from_secs(2), listener.next())
            .await
            .expect("listener should yield within timeout")
    }

    #[tokio::test]
    async fn test_delivers_in_order() {
        let (_api, client) = setup().await;
        let topic = client.topic("t");
        for i in 0..3i64 {
            topic
                .publish(&Message::new(format!("m{i}")).with_label("i", i))
                .await
                .unwrap();
        }

        let mut listener = client.subscription("s").listen_with(quick()).unwrap();
        for i in 0..3i64 {
            let msg = next(&mut listener).await.unwrap();
            assert_eq!(msg.data, format!("m{i}").into_bytes());
            assert_eq!(msg.labels["i"], LabelValue::Int(i));
        }

        listener.stop();
        listener.finish().await.unwrap();
    }

    #[tokio::test]
    async fn test_picks_up_messages_published_later() {
        let (_api, client) = setup().await;
        let mut listener = client.subscription("s").listen_with(quick()).unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        client
            .topic("t")
            .publish(&Message::new("late"))
            .await
            .unwrap();

        let msg = next(&mut listener).await.unwrap();
        assert_eq!(msg.data, b"late");
        listener.stop();
    }

    #[tokio::test]
    async fn test_no_delivery_after_stop() {
        let (_api, client) = setup().await;
        let topic = client.topic("t");
        for _ in 0..3 {
            topic.publish(&Message::new("x")).await.unwrap();
        }

        let mut listener = client.subscription("s").listen_with(quick()).unwrap();
        assert!(next(&mut listener).await.is_some());

        listener.stop();
        topic.publish(&Message::new("after")).await.unwrap();
        assert!(listener.next().await.is_none());
        assert!(listener.next().await.is_none());
        assert!(listener.is_closed());
    }

    #[tokio::test]
    async fn test_repeated_stop_is_harmless() {
        let (_api, client) = setup().await;
        let listener = client.subscription("s").listen_with(quick()).unwrap();
        let handle = listener.stop_handle();

        listener.stop();
        listener.stop();
        handle.stop();
        assert!(handle.is_stopped());

        tokio::time::timeout(Duration::from_secs(2), listener.finish())
            .await
            .expect("finish should not hang")
            .unwrap();
        handle.stop();
    }

    #[tokio::test]
    async fn test_stop_while_caller_not_reading() {
        let (_api, client) = setup().await;
        let topic = client.topic("t");
        // More messages than the buffer holds, so the task blocks on hand-off.
        for _ in 0..10 {
            topic.publish(&Message::new("x")).await.unwrap();
        }

        let listener = client.subscription("s").listen_with(quick()).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        listener.stop();
        tokio::time::timeout(Duration::from_secs(2), listener.finish())
            .await
            .expect("stop should unblock a pending hand-off")
            .unwrap();
    }

    #[tokio::test]
    async fn test_pull_error_closes_stream_and_reports() {
        let (api, client) = setup().await;
        api.set_fail_pulls(true);

        let mut listener = client.subscription("s").listen_with(quick()).unwrap();
        assert!(next(&mut listener).await.is_none());

        let err = listener.finish().await.unwrap_err();
        assert!(matches!(err, Error::Service { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_one_session_per_handle() {
        let (_api, client) = setup().await;
        let sub = client.subscription("s");

        let listener = sub.listen_with(quick()).unwrap();
        let err = sub.clone().listen_with(quick()).unwrap_err();
        assert!(matches!(err, Error::AlreadyListening(_)));

        listener.stop();
        listener.finish().await.unwrap();

        let again = sub.listen_with(quick()).unwrap();
        again.stop();
        again.finish().await.unwrap();
    }

    #[tokio::test]
    async fn test_independent_handles_listen_concurrently() {
        let (_api, client) = setup().await;
        let a = client.subscription("s").listen_with(quick()).unwrap();
        let b = client.subscription("s").listen_with(quick()).unwrap();
        a.stop();
        b.stop();
        a.finish().await.unwrap();
        b.finish().await.unwrap();
    }
}
