//! Patient Registration - two-phase registration with emailed pincodes.
//!
//! An applicant submits personal data and receives a one-time pincode by
//! email, then submits that pincode to finalize the registration:
//! - Records move from Pending to Registered, or to Blocked after too many
//!   incorrect pincodes
//! - Concurrent confirmations on one record are serialized through
//!   compare-and-swap on the record store
//! - Id generation, pincode generation, email delivery and storage are
//!   pluggable collaborators

pub mod api;
pub mod config;
pub mod error;
pub mod generate;
pub mod notify;
pub mod registration;
pub mod store;

pub use config::Config;
pub use error::RegistrationError;
pub use generate::{IdGenerator, PincodeGenerator, RandomPincodeGenerator, UuidGenerator};
pub use notify::{LogNotifier, MailRelayNotifier, Notifier, NotifyError};
pub use registration::{
    Confirmation, PersonalData, Pincode, RegistrationCoordinator, RegistrationPolicy,
    RegistrationRecord, RegistrationStatus, StatusView,
};
pub use store::{FileStore, MemoryStore, RecordStore, StoreError};
