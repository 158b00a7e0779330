use tokio::sync::watch;

/// Single-value container that starts empty and broadcasts every replacement.
///
/// Subscribers always observe the latest committed value; an older value
/// never reappears after a newer one has been published.
#[derive(Debug)]
pub struct ObservableSlot<T> {
    tx: watch::Sender<Option<T>>,
}

impl<T: Clone> ObservableSlot<T> {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Replace the current value and notify subscribers.
    pub fn set(&self, value: T) {
        self.tx.send_replace(Some(value));
    }

    pub fn get(&self) -> Option<T> {
        self.tx.borrow().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.borrow().is_none()
    }

    /// Receiver positioned at the current value. Call `changed()` for updates.
    pub fn subscribe(&self) -> watch::Receiver<Option<T>> {
        self.tx.subscribe()
    }
}

impl<T: Clone> Default for ObservableSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}
