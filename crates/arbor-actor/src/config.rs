use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the [`ActorRuntime`](crate::ActorRuntime).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// How long an activation may sit with an empty mailbox before it is
    /// retired. The next call re-activates it from durable state.
    pub idle_timeout: Duration,
    /// Delay before a reminder whose delivery failed is tried again.
    pub reminder_retry_delay: Duration,
    /// Delivery attempts per firing before the timer gives up. The reminder
    /// stays persisted and is retried by the next `resume_reminders`.
    pub reminder_max_attempts: u32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(15 * 60),
            reminder_retry_delay: Duration::from_secs(30),
            reminder_max_attempts: 5,
        }
    }
}
