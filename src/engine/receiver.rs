//! Inbound side of a scrape session.
//!
//! Reads frames until the socket closes, classifies each one and forwards
//! correlated replies to the workflow engine. Notifications are handled
//! here: fatal ones abort the scrape, the rest are dropped.

// ============================================================================
// Imports
// ============================================================================

use rustc_hash::FxHashSet;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::error::{Error, Result};
use crate::protocol::{IncomingMessage, Notification, Reply};
use crate::transport::ConnectionReader;

// ============================================================================
// Receiver
// ============================================================================

/// Reads one connection and feeds the workflow engine.
pub struct Receiver<'a> {
    reader: ConnectionReader,
    replies: mpsc::UnboundedSender<Reply>,
    fatal_notifications: &'a FxHashSet<String>,
}

impl<'a> Receiver<'a> {
    /// Creates a receiver forwarding replies into `replies`.
    #[must_use]
    pub fn new(
        reader: ConnectionReader,
        replies: mpsc::UnboundedSender<Reply>,
        fatal_notifications: &'a FxHashSet<String>,
    ) -> Self {
        Self {
            reader,
            replies,
            fatal_notifications,
        }
    }

    /// Runs until the socket closes.
    ///
    /// Dropping the reply channel on return tells the workflow engine that
    /// no further replies will come.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FatalNotification`] when the engine pushes one of
    /// the configured fatal notifications.
    pub async fn run(mut self) -> Result<()> {
        let mut frames = 0usize;

        while let Some(text) = self.reader.next_frame().await {
            frames += 1;

            match IncomingMessage::parse(&text) {
                Ok(IncomingMessage::Correlated(reply)) => {
                    debug!(request_id = %reply.id, "Reply received");
                    if self.replies.send(reply).is_err() {
                        debug!("Workflow engine finished; dropping reply");
                    }
                }

                Ok(IncomingMessage::Notification(notification)) => {
                    self.handle_notification(notification)?;
                }

                Err(e) => {
                    warn!(error = %e, frame = %text, "Skipping malformed frame");
                }
            }
        }

        debug!(frames, "Receiver finished");
        Ok(())
    }

    /// Raises fatal notifications, drops the rest.
    fn handle_notification(&self, notification: Notification) -> Result<()> {
        if self.fatal_notifications.contains(&notification.method) {
            error!(
                method = %notification.method,
                params = %notification.params,
                "Fatal engine notification"
            );
            return Err(Error::fatal_notification(
                notification.method,
                &notification.params,
            ));
        }

        debug!(method = %notification.method, "Ignoring engine notification");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::{Value, json};

    use crate::identifiers::RequestId;
    use crate::protocol::{ON_CONNECTED, ON_MAX_PARALLEL_SESSIONS_EXCEEDED, Request};
    use crate::testing::{MockEngine, Respond};
    use crate::transport::Connection;

    fn fatal_set() -> FxHashSet<String> {
        std::iter::once(ON_MAX_PARALLEL_SESSIONS_EXCEEDED.to_owned()).collect()
    }

    #[tokio::test]
    async fn test_forwards_replies_and_skips_noise() {
        let engine = MockEngine::start_with_greeting(
            vec![json!({"jsonrpc": "2.0", "method": ON_CONNECTED, "params": {}})],
            |request: &Value| {
                Respond::Frames(vec![
                    "garbage".to_owned(),
                    json!({"params": {}}).to_string(),
                    json!({"id": request["id"], "result": {}}).to_string(),
                ])
            },
        )
        .await;

        let connection = Connection::open(&engine.app_url("a"), None).await.expect("open");
        let (mut writer, reader) = connection.split();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let fatal = fatal_set();

        let id = writer.next_id();
        writer.send(&Request::open_doc(id, "a")).await.expect("send");

        let receiver = Receiver::new(reader, tx, &fatal);
        let drive = async {
            let reply = rx.recv().await.expect("reply");
            writer.close().await.expect("close");
            reply
        };

        let (result, reply) = tokio::join!(receiver.run(), drive);
        assert!(result.is_ok());
        assert_eq!(reply.id, RequestId::new(1));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_fatal_notification_aborts() {
        let engine = MockEngine::start(|_request: &Value| {
            Respond::frames(vec![json!({
                "jsonrpc": "2.0",
                "method": ON_MAX_PARALLEL_SESSIONS_EXCEEDED,
                "params": {}
            })])
        })
        .await;

        let connection = Connection::open(&engine.app_url("a"), None).await.expect("open");
        let (mut writer, reader) = connection.split();
        let (tx, _rx) = mpsc::unbounded_channel();
        let fatal = fatal_set();

        let id = writer.next_id();
        writer.send(&Request::open_doc(id, "a")).await.expect("send");

        let result = Receiver::new(reader, tx, &fatal).run().await;
        assert!(matches!(
            result,
            Err(Error::FatalNotification { ref method, .. }) if method == ON_MAX_PARALLEL_SESSIONS_EXCEEDED
        ));
    }

    #[tokio::test]
    async fn test_ends_normally_when_engine_closes() {
        let engine = MockEngine::start(|_request: &Value| Respond::Hangup).await;

        let connection = Connection::open(&engine.app_url("a"), None).await.expect("open");
        let (mut writer, reader) = connection.split();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let fatal = fatal_set();

        let id = writer.next_id();
        writer.send(&Request::open_doc(id, "a")).await.expect("send");

        assert!(Receiver::new(reader, tx, &fatal).run().await.is_ok());
        assert!(rx.recv().await.is_none());
    }
}
