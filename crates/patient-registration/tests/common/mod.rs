//! Common test utilities for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use patient_registration::registration::{Contact, StreetAddress};
use patient_registration::{
    IdGenerator, MemoryStore, Notifier, NotifyError, PersonalData, Pincode, PincodeGenerator,
    RegistrationCoordinator, RegistrationPolicy,
};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Email captured by the recording notifier.
#[derive(Debug, Clone)]
pub struct SentEmail {
    pub address: String,
    pub subject: String,
    pub body: String,
}

/// Notifier that keeps every message in memory and can be switched to fail.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentEmail>>,
    failing: AtomicBool,
}

impl RecordingNotifier {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }

    /// Pincode contained in the most recent email.
    pub fn last_pincode(&self) -> i64 {
        let sent = self.sent();
        let body = &sent.last().expect("no email sent").body;
        body.rsplit(' ').next().unwrap().parse().unwrap()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, address: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotifyError::Rejected("relay unavailable".into()));
        }
        self.sent.lock().unwrap().push(SentEmail {
            address: address.into(),
            subject: subject.into(),
            body: body.into(),
        });
        Ok(())
    }
}

/// Ids `reg-1`, `reg-2`, ...
#[derive(Default)]
pub struct SequentialIds(AtomicU64);

impl IdGenerator for SequentialIds {
    fn generate(&self) -> String {
        format!("reg-{}", self.0.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

/// Always hands out the same pincode.
pub struct FixedPincode(pub u64);

impl PincodeGenerator for FixedPincode {
    fn generate(&self) -> Pincode {
        Pincode::new(self.0).unwrap()
    }
}

pub const PINCODE: i64 = 482913;
pub const WRONG_PINCODE: i64 = 111111;

/// Coordinator wired to in-memory fakes.
pub struct Harness {
    pub coordinator: RegistrationCoordinator,
    pub notifier: Arc<RecordingNotifier>,
    pub store: Arc<MemoryStore>,
}

pub fn harness() -> Harness {
    let notifier = Arc::new(RecordingNotifier::default());
    let store = Arc::new(MemoryStore::new());
    let coordinator = RegistrationCoordinator::new(
        Arc::new(SequentialIds::default()),
        Arc::new(FixedPincode(PINCODE as u64)),
        notifier.clone(),
        store.clone(),
        RegistrationPolicy::default(),
    );

    Harness {
        coordinator,
        notifier,
        store,
    }
}

pub fn jane() -> PersonalData {
    PersonalData {
        full_name: "Jane Doe".into(),
        national_id: "123".into(),
        address: Some(StreetAddress {
            postal_code: "1234AB".into(),
            house_number: 12,
        }),
        contact: Some(Contact {
            email_address: "jane@x.com".into(),
        }),
    }
}
