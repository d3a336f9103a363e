use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use uuid::Uuid;

/// Ambient per-request state threaded through every store and service call.
///
/// Clones share one cancellation flag: cancelling any clone cancels the
/// request everywhere, and in-flight transactions abort at their next
/// statement or at commit.
#[derive(Clone, Debug)]
pub struct RequestContext {
    request_id: Uuid,
    actor: String,
    cancelled: Arc<AtomicBool>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self {
            request_id: Uuid::now_v7(),
            actor: "system".into(),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Attribute the request to a caller (used for audit stamping).
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = actor.into();
        self
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn actor(&self) -> &str {
        &self.actor
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_context_is_live() {
        let ctx = RequestContext::new();
        assert!(!ctx.is_cancelled());
        assert_eq!(ctx.actor(), "system");
    }

    #[test]
    fn cancellation_is_shared_between_clones() {
        let ctx = RequestContext::new().with_actor("ops");
        let clone = ctx.clone();
        clone.cancel();
        assert!(ctx.is_cancelled());
        assert_eq!(ctx.request_id(), clone.request_id());
        assert_eq!(ctx.actor(), "ops");
    }

    #[test]
    fn request_ids_are_unique() {
        assert_ne!(RequestContext::new().request_id(), RequestContext::new().request_id());
    }
}
