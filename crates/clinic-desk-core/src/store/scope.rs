//! Lifetime handle for views that trigger loads.

use tokio::sync::watch;

/// Tied to the lifetime of one view. Closing it cancels the view's pending
/// scoped loads so their results are never installed.
#[derive(Debug)]
pub struct ViewScope {
    closed: watch::Sender<bool>,
}

impl ViewScope {
    pub fn new() -> Self {
        let (closed, _) = watch::channel(false);
        Self { closed }
    }

    /// Mark the view as torn down.
    pub fn close(&self) {
        self.closed.send_replace(true);
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// Resolves once the scope is closed.
    pub async fn closed(&self) {
        let mut rx = self.closed.subscribe();
        // The sender lives in `self`, so this only ends on close.
        let _ = rx.wait_for(|closed| *closed).await;
    }
}

impl Default for ViewScope {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ViewScope {
    fn drop(&mut self) {
        self.close();
    }
}
