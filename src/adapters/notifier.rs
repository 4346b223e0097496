use crate::domain::model::{NotificationState, NotificationToken, SubmissionNotification};
use crate::domain::ports::Notifier;
use crate::utils::error::{PostBoxError, Result};
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// In-memory notification surface. Every transition is logged; a token can
/// move from pending to a terminal state exactly once.
#[derive(Debug, Default)]
pub struct NotificationCenter {
    next_token: AtomicU64,
    notifications: Mutex<BTreeMap<NotificationToken, SubmissionNotification>>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, token: NotificationToken) -> Option<SubmissionNotification> {
        self.entries().get(&token).cloned()
    }

    /// All notifications in the order they were opened.
    pub fn all(&self) -> Vec<SubmissionNotification> {
        self.entries().values().cloned().collect()
    }

    pub fn pending(&self) -> Vec<SubmissionNotification> {
        self.entries()
            .values()
            .filter(|notification| notification.is_pending())
            .cloned()
            .collect()
    }

    fn entries(&self) -> MutexGuard<'_, BTreeMap<NotificationToken, SubmissionNotification>> {
        self.notifications
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn resolve(&self, token: NotificationToken, state: NotificationState, message: &str) -> Result<()> {
        let mut entries = self.entries();
        let notification = entries
            .get_mut(&token)
            .ok_or_else(|| PostBoxError::NotificationError {
                message: format!("unknown token {}", token),
            })?;

        if !notification.is_pending() {
            return Err(PostBoxError::NotificationError {
                message: format!("{} already resolved as {:?}", token, notification.state),
            });
        }

        notification.state = state;
        notification.message = message.to_string();
        notification.resolved_at = Some(Utc::now());

        match state {
            NotificationState::Success => tracing::info!("✅ {}", message),
            NotificationState::Failure => tracing::error!("❌ {}", message),
            NotificationState::Pending => {}
        }
        Ok(())
    }
}

impl Notifier for NotificationCenter {
    fn open(&self, message: &str) -> NotificationToken {
        let token = NotificationToken(self.next_token.fetch_add(1, Ordering::Relaxed) + 1);
        self.entries().insert(
            token,
            SubmissionNotification {
                token,
                state: NotificationState::Pending,
                message: message.to_string(),
                opened_at: Utc::now(),
                resolved_at: None,
            },
        );
        tracing::info!("⏳ {}", message);
        token
    }

    fn resolve_success(&self, token: NotificationToken, message: &str) -> Result<()> {
        self.resolve(token, NotificationState::Success, message)
    }

    fn resolve_failure(&self, token: NotificationToken, message: &str) -> Result<()> {
        self.resolve(token, NotificationState::Failure, message)
    }
}
