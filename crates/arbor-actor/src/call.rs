use std::time::Duration;

use arbor_types::CorrelationId;
use tokio::time::Instant;

/// Per-request metadata carried inside every entity message.
///
/// The correlation id is only used for logging. The deadline, when set,
/// bounds the whole request including every fan-out call it makes: children
/// receive the parent's deadline, so when the parent gives up every
/// descendant still working on its behalf gives up too.
#[derive(Clone, Debug)]
pub struct CallContext {
    pub correlation_id: CorrelationId,
    pub deadline: Option<Instant>,
}

impl CallContext {
    pub fn new(correlation_id: CorrelationId) -> Self {
        Self {
            correlation_id,
            deadline: None,
        }
    }

    /// A context with a freshly generated correlation id and no deadline.
    pub fn generate() -> Self {
        Self::new(CorrelationId::generate())
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// The explicit deadline, or `now + fallback` when none was given.
    pub fn deadline_or(&self, fallback: Duration) -> Instant {
        self.deadline.unwrap_or_else(|| Instant::now() + fallback)
    }

    /// Context for a fan-out call: same correlation id, fixed deadline.
    pub fn child(&self, deadline: Instant) -> Self {
        Self {
            correlation_id: self.correlation_id.clone(),
            deadline: Some(deadline),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }
}

impl Default for CallContext {
    fn default() -> Self {
        Self::generate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_deadline_never_expires() {
        assert!(!CallContext::generate().is_expired());
    }

    #[test]
    fn child_keeps_correlation_and_takes_deadline() {
        let parent = CallContext::new(CorrelationId::from("req-1"));
        let deadline = Instant::now() + Duration::from_secs(5);
        let child = parent.child(deadline);
        assert_eq!(child.correlation_id.as_str(), "req-1");
        assert_eq!(child.deadline, Some(deadline));
    }

    #[test]
    fn explicit_deadline_wins_over_fallback() {
        let deadline = Instant::now() + Duration::from_millis(10);
        let call = CallContext::generate().with_deadline(deadline);
        assert_eq!(call.deadline_or(Duration::from_secs(60)), deadline);
    }

    #[tokio::test]
    async fn elapsed_deadline_is_expired() {
        let call = CallContext::generate().with_timeout(Duration::from_millis(5));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(call.is_expired());
    }
}
