//! Session middleware configuration and flash messages.
//!
//! Sessions live in process memory and only carry flash messages between a
//! form post and the page it redirects to.

use serde::{Deserialize, Serialize};
use tower_sessions::{Expiry, MemoryStore, Session, SessionManagerLayer};

use crate::config::AppConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "abc_session";

/// Session expiry time in seconds (1 hour of inactivity).
const SESSION_EXPIRY_SECONDS: i64 = 60 * 60;

const FLASH_KEY: &str = "flash";

/// Create the session layer with an in-memory store.
#[must_use]
pub fn create_session_layer(config: &AppConfig) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_https())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// Flash message severity, used as a CSS class suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Error,
}

impl FlashKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

/// A one-shot message shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }
}

/// Queue a flash message. Failures are logged and otherwise ignored.
pub async fn push_flash(session: &Session, flash: Flash) {
    let mut pending: Vec<Flash> = session.get(FLASH_KEY).await.ok().flatten().unwrap_or_default();
    pending.push(flash);
    if let Err(e) = session.insert(FLASH_KEY, pending).await {
        tracing::warn!("Failed to store flash message: {e}");
    }
}

/// Take and clear all pending flash messages.
pub async fn take_flash(session: &Session) -> Vec<Flash> {
    session
        .remove::<Vec<Flash>>(FLASH_KEY)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn test_flash_is_taken_once() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);

        push_flash(&session, Flash::success("Customer created successfully.")).await;
        push_flash(&session, Flash::error("Something failed.")).await;

        let flashes = take_flash(&session).await;
        assert_eq!(flashes.len(), 2);
        assert_eq!(flashes[0].kind, FlashKind::Success);
        assert_eq!(flashes[1].message, "Something failed.");

        assert!(take_flash(&session).await.is_empty());
    }
}
