//! Queue inspection commands.

use abc_retailers_admin::storage::{
    ORDER_NOTIFICATIONS_QUEUE, STOCK_UPDATES_QUEUE, StorageServices,
};

use super::CommandError;

/// Dequeue up to `count` messages from one of the app's queues.
///
/// Received messages are deleted from the queue.
///
/// # Errors
///
/// Returns `CommandError::UnknownQueue` for a queue the app does not use,
/// or a storage error.
pub async fn receive(
    storage: &StorageServices,
    queue: &str,
    count: usize,
) -> Result<Vec<String>, CommandError> {
    if ![ORDER_NOTIFICATIONS_QUEUE, STOCK_UPDATES_QUEUE].contains(&queue) {
        return Err(CommandError::UnknownQueue(queue.to_owned()));
    }

    let mut messages = Vec::new();
    while messages.len() < count {
        match storage.queues().receive_one(queue).await? {
            Some(message) => messages.push(message),
            None => break,
        }
    }

    tracing::info!(queue, received = messages.len(), "Queue drained");
    Ok(messages)
}

/// Print a message, pretty-printed when it is JSON.
#[allow(clippy::print_stdout)]
pub fn print_message(message: &str) {
    match serde_json::from_str::<serde_json::Value>(message) {
        Ok(value) => println!(
            "{}",
            serde_json::to_string_pretty(&value).unwrap_or_else(|_| message.to_owned())
        ),
        Err(_) => println!("{message}"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_receive_stops_when_queue_is_empty() {
        let storage = StorageServices::in_memory();
        storage.ensure_provisioned().await.unwrap();
        storage
            .queues()
            .send(STOCK_UPDATES_QUEUE, r#"{"NewStock":7}"#)
            .await
            .unwrap();

        let messages = receive(&storage, STOCK_UPDATES_QUEUE, 5).await.unwrap();
        assert_eq!(messages, vec![r#"{"NewStock":7}"#.to_string()]);
        assert!(
            receive(&storage, STOCK_UPDATES_QUEUE, 5)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_receive_rejects_unknown_queue() {
        let storage = StorageServices::in_memory();
        let err = receive(&storage, "payments", 1).await.unwrap_err();
        assert!(matches!(err, CommandError::UnknownQueue(_)));
    }
}
