//! Delivery of pincode messages to applicants.

mod relay;

pub use relay::MailRelayNotifier;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

/// Notification delivery errors.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Delivery rejected: {0}")]
    Rejected(String),
}

/// Sends a message to a destination address.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, address: &str, subject: &str, body: &str) -> Result<(), NotifyError>;
}

/// Notifier that only records deliveries in the log.
///
/// Neither the address nor the body is logged. Both identify the
/// applicant and the body carries the pincode.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, _address: &str, subject: &str, _body: &str) -> Result<(), NotifyError> {
        info!(subject = %subject, "Notification delivered to log sink");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};
    use tracing::subscriber::DefaultGuard;

    /// Log output collected by a thread-local test subscriber.
    #[derive(Clone, Default)]
    pub(super) struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        pub(super) fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Route every event at debug and above into a buffer until the guard drops.
    pub(super) fn capture_logs() -> (CapturedLogs, DefaultGuard) {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(move || writer.clone())
            .finish();
        (logs, tracing::subscriber::set_default(subscriber))
    }

    #[tokio::test]
    async fn test_log_notifier_always_succeeds() {
        let notifier = LogNotifier;
        assert!(notifier
            .send("jane@x.com", "Registration pincode", "body")
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_log_notifier_keeps_address_and_pincode_out_of_logs() {
        let (logs, _guard) = capture_logs();

        LogNotifier
            .send(
                "jane@x.com",
                "Registration pincode",
                "Finalize registration with pincode 482913",
            )
            .await
            .unwrap();

        let out = logs.contents();
        assert!(out.contains("Notification delivered to log sink"));
        assert!(!out.contains("jane@x.com"));
        assert!(!out.contains("482913"));
    }
}
