//! Single-slot status channels for the service command surfaces.
//!
//! Each service exposes three independent latest-value-wins channels:
//! a loading flag, an error message, and a success message. A new value
//! simply overwrites whatever was pending; consumers display a message and
//! then clear it explicitly so it is not shown twice.

use tokio::sync::watch;

/// A mutable cell holding at most one pending value, with subscribers.
#[derive(Debug)]
pub struct StatusCell<T> {
    sender: watch::Sender<T>,
}

impl<T: Clone> StatusCell<T> {
    /// Create a cell holding `initial`.
    pub fn new(initial: T) -> Self {
        Self {
            sender: watch::Sender::new(initial),
        }
    }

    /// Overwrite the current value. The previous value is discarded even if
    /// no consumer has seen it.
    pub fn set(&self, value: T) {
        self.sender.send_replace(value);
    }

    /// Clone the current value.
    pub fn get(&self) -> T {
        self.sender.borrow().clone()
    }

    /// Subscribe to value changes.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.sender.subscribe()
    }
}

/// The loading/error/success channel triple shared by the services.
#[derive(Debug)]
pub struct ServiceStatus {
    loading: StatusCell<bool>,
    error: StatusCell<Option<String>>,
    success: StatusCell<Option<String>>,
}

impl Default for ServiceStatus {
    fn default() -> Self {
        Self {
            loading: StatusCell::new(false),
            error: StatusCell::new(None),
            success: StatusCell::new(None),
        }
    }
}

impl ServiceStatus {
    /// Mark the start of a command: the loading flag goes up.
    pub(crate) fn begin(&self) {
        self.loading.set(true);
    }

    /// Finish a command without publishing a message (loads and refreshes).
    pub(crate) fn finish(&self) {
        self.loading.set(false);
    }

    /// Finish a command successfully, publishing `message`.
    pub(crate) fn succeed(&self, message: impl Into<String>) {
        self.success.set(Some(message.into()));
        self.loading.set(false);
    }

    /// Finish a command with an error, publishing `message`.
    pub(crate) fn fail(&self, message: impl Into<String>) {
        self.error.set(Some(message.into()));
        self.loading.set(false);
    }

    /// Whether a command is currently in flight.
    pub fn is_loading(&self) -> bool {
        self.loading.get()
    }

    /// Subscribe to the loading flag.
    pub fn loading(&self) -> watch::Receiver<bool> {
        self.loading.subscribe()
    }

    /// The pending error message, if any.
    pub fn error_message(&self) -> Option<String> {
        self.error.get()
    }

    /// Subscribe to the error message channel.
    pub fn error_messages(&self) -> watch::Receiver<Option<String>> {
        self.error.subscribe()
    }

    /// The pending success message, if any.
    pub fn success_message(&self) -> Option<String> {
        self.success.get()
    }

    /// Subscribe to the success message channel.
    pub fn success_messages(&self) -> watch::Receiver<Option<String>> {
        self.success.subscribe()
    }

    /// Clear the pending error message after displaying it.
    pub fn clear_error_message(&self) {
        self.error.set(None);
    }

    /// Clear the pending success message after displaying it.
    pub fn clear_success_message(&self) {
        self.success.set(None);
    }
}

#[cfg(test)]
mod status_tests {
    use super::ServiceStatus;

    #[test]
    fn begin_and_finish_toggle_loading() {
        let status = ServiceStatus::default();
        assert!(!status.is_loading());

        status.begin();
        assert!(status.is_loading());

        status.finish();
        assert!(!status.is_loading());
    }

    #[test]
    fn failure_clears_loading_and_sets_message() {
        let status = ServiceStatus::default();
        status.begin();

        status.fail("it broke");

        assert!(!status.is_loading());
        assert_eq!(status.error_message(), Some("it broke".to_owned()));
        assert_eq!(status.success_message(), None);
    }

    #[test]
    fn latest_message_wins() {
        let status = ServiceStatus::default();

        status.fail("first");
        status.fail("second");

        assert_eq!(status.error_message(), Some("second".to_owned()));
    }

    #[test]
    fn cleared_message_stays_cleared() {
        let status = ServiceStatus::default();
        status.succeed("saved");

        status.clear_success_message();

        assert_eq!(status.success_message(), None);
    }

    #[test]
    fn error_and_success_channels_are_independent() {
        let status = ServiceStatus::default();

        status.succeed("saved");
        status.fail("then it broke");

        assert_eq!(status.success_message(), Some("saved".to_owned()));
        assert_eq!(status.error_message(), Some("then it broke".to_owned()));
    }
}
