//! Message queues.
//!
//! Web handlers only produce messages. Receiving is receive-then-delete
//! (at-most-once) and is exposed through the CLI.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::instrument;

use super::Result;

/// A message dequeued but not yet deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    pub id: String,
    pub pop_receipt: String,
    pub text: String,
}

#[async_trait]
pub trait QueueService: Send + Sync {
    /// Create `queue`; succeeds if it already exists.
    async fn create_queue(&self, queue: &str) -> Result<()>;

    /// Append a text message.
    async fn put_message(&self, queue: &str, text: &str) -> Result<()>;

    /// Dequeue the next visible message, hiding it from other readers.
    async fn get_message(&self, queue: &str) -> Result<Option<QueueMessage>>;

    /// Permanently remove a dequeued message.
    async fn delete_message(&self, queue: &str, message: &QueueMessage) -> Result<()>;
}

#[derive(Clone)]
pub struct MessageQueues {
    queues: Arc<dyn QueueService>,
}

impl MessageQueues {
    #[must_use]
    pub fn new(queues: Arc<dyn QueueService>) -> Self {
        Self { queues }
    }

    /// Create `queue` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue service rejects the request.
    pub async fn ensure_queue(&self, queue: &str) -> Result<()> {
        self.queues.create_queue(queue).await
    }

    /// Enqueue one text message.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue service rejects the message.
    #[instrument(skip(self, payload), fields(bytes = payload.len()))]
    pub async fn send(&self, queue: &str, payload: &str) -> Result<()> {
        self.queues.put_message(queue, payload).await?;
        tracing::debug!("Message enqueued");
        Ok(())
    }

    /// Enqueue `event` serialized as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the enqueue fails.
    pub async fn send_json<T: Serialize + Sync>(&self, queue: &str, event: &T) -> Result<()> {
        let payload = serde_json::to_string(event)?;
        self.send(queue, &payload).await
    }

    /// Dequeue and delete at most one message.
    ///
    /// # Errors
    ///
    /// Returns an error if receiving or deleting fails. A message whose
    /// delete fails becomes visible again after the service's visibility
    /// timeout.
    #[instrument(skip(self))]
    pub async fn receive_one(&self, queue: &str) -> Result<Option<String>> {
        let Some(message) = self.queues.get_message(queue).await? else {
            return Ok(None);
        };
        self.queues.delete_message(queue, &message).await?;
        Ok(Some(message.text))
    }
}
