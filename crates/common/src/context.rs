//! The cancellation/deadline token threaded through every async handler.
//!
//! Stands in for the spec's "context" concept the way idiomatic Rust
//! expresses cooperative cancellation: an explicit, cloneable token passed
//! by reference, rather than ambient/thread-local state. Carries an
//! optional request id purely for log correlation — it plays no role in
//! cancellation itself.

use tokio_util::sync::CancellationToken;

/// Cancellation/deadline context passed into every RPC handler, engine
/// call, and store operation that can block.
#[derive(Debug, Clone)]
pub struct RequestContext {
    cancellation: CancellationToken,
    request_id: Option<String>,
}

impl RequestContext {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cancellation: CancellationToken::new(),
            request_id: None,
        }
    }

    #[must_use]
    pub fn with_request_id(request_id: impl Into<String>) -> Self {
        Self {
            cancellation: CancellationToken::new(),
            request_id: Some(request_id.into()),
        }
    }

    /// Derive a child context that is cancelled when either this context or
    /// the child is cancelled, but whose own cancellation doesn't propagate
    /// back up.
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            cancellation: self.cancellation.child_token(),
            request_id: self.request_id.clone(),
        }
    }

    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// Resolves once this context is cancelled. Intended for `tokio::select!`
    /// alongside the real work being guarded.
    pub async fn cancelled(&self) {
        self.cancellation.cancelled().await;
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cancellation_propagates_to_children_not_upward() {
        let parent = RequestContext::new();
        let child = parent.child();

        parent.cancel();
        assert!(child.is_cancelled());

        let unrelated_child = RequestContext::new().child();
        assert!(!unrelated_child.is_cancelled());
    }

    #[test]
    fn carries_request_id_for_correlation_only() {
        let ctx = RequestContext::with_request_id("req-1");
        assert_eq!(ctx.request_id(), Some("req-1"));
        assert!(!ctx.is_cancelled());
    }
}
