//! Registration records and the pincode state machine.

mod coordinator;

pub use coordinator::{Confirmation, RegistrationCoordinator, RegistrationPolicy, StatusView};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a registration record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    /// Pincode sent, awaiting confirmation
    Pending,
    /// Pincode confirmed, registration complete
    Registered,
    /// Too many incorrect pincodes, permanently locked
    Blocked,
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RegistrationStatus::Pending => "pending",
            RegistrationStatus::Registered => "registered",
            RegistrationStatus::Blocked => "blocked",
        };
        f.write_str(s)
    }
}

/// One-time verification code. Always positive.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct Pincode(u64);

impl Pincode {
    /// Wrap a raw code, rejecting zero.
    pub fn new(value: u64) -> Option<Self> {
        (value > 0).then_some(Self(value))
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl TryFrom<u64> for Pincode {
    type Error = String;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Pincode::new(value).ok_or_else(|| "pincode must be positive".to_string())
    }
}

impl From<Pincode> for u64 {
    fn from(pin: Pincode) -> Self {
        pin.0
    }
}

impl fmt::Display for Pincode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Keeps codes out of `{:?}` output in logs and panics.
impl fmt::Debug for Pincode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Pincode(***)")
    }
}

/// Postal address of the applicant.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StreetAddress {
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub house_number: u32,
}

/// Contact details used to deliver the pincode.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Contact {
    #[serde(default)]
    pub email_address: String,
}

/// Identifying data captured at initiation. Immutable afterwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PersonalData {
    /// Full legal name
    #[serde(default)]
    pub full_name: String,

    /// National identification number (BSN)
    #[serde(default)]
    pub national_id: String,

    /// Postal address, optional
    #[serde(default)]
    pub address: Option<StreetAddress>,

    /// Contact details; the email address is mandatory
    #[serde(default)]
    pub contact: Option<Contact>,
}

impl PersonalData {
    /// Check that every mandatory field is present and non-blank.
    pub fn validate(&self) -> Result<(), String> {
        if self.full_name.trim().is_empty() {
            return Err("full name is required".into());
        }
        if self.national_id.trim().is_empty() {
            return Err("national identifier is required".into());
        }
        match self.email_address() {
            Some(email) if !email.trim().is_empty() => Ok(()),
            _ => Err("contact email address is required".into()),
        }
    }

    pub fn email_address(&self) -> Option<&str> {
        self.contact.as_ref().map(|c| c.email_address.as_str())
    }
}

/// Result of evaluating a submitted pincode against a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// Pincode matched; record is now Registered.
    Confirmed,
    /// Pincode did not match; counter incremented, possibly blocked.
    Rejected { attempts: u32, blocked: bool },
    /// Record was already blocked. Not mutated.
    AlreadyBlocked,
    /// Record was already registered. Not mutated.
    NotPending,
}

impl TransitionOutcome {
    /// Whether the record was changed and must be written back.
    pub fn is_mutation(self) -> bool {
        matches!(
            self,
            TransitionOutcome::Confirmed | TransitionOutcome::Rejected { .. }
        )
    }
}

/// Persisted state of one registration attempt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegistrationRecord {
    pub id: String,
    pub personal_data: PersonalData,
    pub status: RegistrationStatus,
    /// Expected code while pending, `None` once cleared
    pub pincode: Option<Pincode>,
    pub failed_attempts: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RegistrationRecord {
    /// Create a new pending record awaiting `pincode`.
    pub fn new_pending(id: String, personal_data: PersonalData, pincode: Pincode) -> Self {
        let now = Utc::now();
        Self {
            id,
            personal_data,
            status: RegistrationStatus::Pending,
            pincode: Some(pincode),
            failed_attempts: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply one verification attempt.
    ///
    /// Blocked and registered records are left untouched. A wrong code on a
    /// pending record bumps `failed_attempts` and blocks the record once the
    /// counter reaches `max_attempts`. A correct code registers the record
    /// and clears the pincode.
    pub fn submit_pincode(&mut self, submitted: Pincode, max_attempts: u32) -> TransitionOutcome {
        match self.status {
            RegistrationStatus::Blocked => return TransitionOutcome::AlreadyBlocked,
            RegistrationStatus::Registered => return TransitionOutcome::NotPending,
            RegistrationStatus::Pending => {}
        }

        self.updated_at = Utc::now();

        if self.pincode == Some(submitted) {
            self.status = RegistrationStatus::Registered;
            self.pincode = None;
            return TransitionOutcome::Confirmed;
        }

        self.failed_attempts = self.failed_attempts.saturating_add(1);
        let blocked = self.failed_attempts >= max_attempts;
        if blocked {
            self.status = RegistrationStatus::Blocked;
        }

        TransitionOutcome::Rejected {
            attempts: self.failed_attempts,
            blocked,
        }
    }

    /// Attempts left before the record blocks.
    pub fn attempts_remaining(&self, max_attempts: u32) -> u32 {
        match self.status {
            RegistrationStatus::Pending => max_attempts.saturating_sub(self.failed_attempts),
            _ => 0,
        }
    }
}
