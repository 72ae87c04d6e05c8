//! Two-phase registration workflow.

use super::{PersonalData, Pincode, RegistrationRecord, RegistrationStatus, TransitionOutcome};
use crate::error::RegistrationError;
use crate::generate::{IdGenerator, PincodeGenerator};
use crate::notify::Notifier;
use crate::store::{CasOutcome, RecordStore};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Subject line of the pincode email.
pub const PINCODE_SUBJECT: &str = "Registration pincode";

/// Attempt limit applied to pincode verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistrationPolicy {
    /// Incorrect submissions allowed before the record blocks
    pub max_attempts: u32,
}

impl RegistrationPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }
}

impl Default for RegistrationPolicy {
    fn default() -> Self {
        Self { max_attempts: 5 }
    }
}

/// Successful completion of a registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Confirmation {
    pub id: String,
    pub status: RegistrationStatus,
}

/// Read-only view of a record. Never carries the pincode.
#[derive(Debug, Clone, Serialize)]
pub struct StatusView {
    pub id: String,
    pub status: RegistrationStatus,
    pub failed_attempts: u32,
    pub attempts_remaining: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Orchestrates initiation and completion of registrations.
///
/// Holds no per-request state; clones share the same collaborators.
#[derive(Clone)]
pub struct RegistrationCoordinator {
    ids: Arc<dyn IdGenerator>,
    pincodes: Arc<dyn PincodeGenerator>,
    notifier: Arc<dyn Notifier>,
    store: Arc<dyn RecordStore>,
    policy: RegistrationPolicy,
}

impl RegistrationCoordinator {
    pub fn new(
        ids: Arc<dyn IdGenerator>,
        pincodes: Arc<dyn PincodeGenerator>,
        notifier: Arc<dyn Notifier>,
        store: Arc<dyn RecordStore>,
        policy: RegistrationPolicy,
    ) -> Self {
        Self {
            ids,
            pincodes,
            notifier,
            store,
            policy,
        }
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Start a registration and email a pincode to the applicant.
    ///
    /// Nothing is stored unless the email was accepted. If the store write
    /// fails after that, the applicant holds a pincode for a registration
    /// that does not exist and has to start over.
    #[instrument(skip(self, personal_data))]
    pub async fn initiate_registration(
        &self,
        personal_data: PersonalData,
    ) -> Result<String, RegistrationError> {
        personal_data
            .validate()
            .map_err(RegistrationError::InvalidInput)?;

        let email = personal_data
            .email_address()
            .unwrap_or_default()
            .to_string();

        let pincode = self.pincodes.generate();
        let body = format!("Finalize registration with pincode {}", pincode);

        self.notifier
            .send(&email, PINCODE_SUBJECT, &body)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to deliver pincode, registration aborted");
                RegistrationError::NotificationFailed(e)
            })?;

        let id = self.ids.generate();
        let record = RegistrationRecord::new_pending(id.clone(), personal_data, pincode);

        if let Err(e) = self.store.insert(record).await {
            error!(
                registration_id = %id,
                error = %e,
                "Pincode was sent but the registration could not be stored"
            );
            return Err(e.into());
        }

        info!(registration_id = %id, "Registration initiated, awaiting pincode");
        Ok(id)
    }

    /// Confirm a registration with the emailed pincode.
    ///
    /// The read-evaluate-write cycle runs as a compare-and-swap loop, so
    /// concurrent submissions against the same record are never lost.
    #[instrument(skip(self, pincode))]
    pub async fn complete_registration(
        &self,
        id: &str,
        pincode: i64,
    ) -> Result<Confirmation, RegistrationError> {
        if id.trim().is_empty() {
            return Err(RegistrationError::InvalidInput(
                "registration id is required".into(),
            ));
        }
        let submitted = u64::try_from(pincode)
            .ok()
            .and_then(Pincode::new)
            .ok_or_else(|| {
                RegistrationError::InvalidInput("pincode must be a positive number".into())
            })?;

        let max_attempts = self.policy.max_attempts;
        let mut current = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| RegistrationError::NotFound(id.to_string()))?;

        let (outcome, record) = loop {
            let mut record = current.value.clone();
            let outcome = record.submit_pincode(submitted, max_attempts);

            if !outcome.is_mutation() {
                return Err(if record.status == RegistrationStatus::Blocked {
                    warn!(registration_id = %id, "Verification attempted on blocked registration");
                    RegistrationError::Blocked(id.to_string())
                } else {
                    RegistrationError::NotFound(format!("{} has no pending registration", id))
                });
            }

            match self
                .store
                .compare_and_swap(id, current.version, record.clone())
                .await?
            {
                CasOutcome::Swapped { version } => {
                    debug!(registration_id = %id, version, "Record updated");
                    break (outcome, record);
                }
                CasOutcome::Conflict { current: latest } => {
                    debug!(
                        registration_id = %id,
                        version = latest.version,
                        "Concurrent update, re-evaluating"
                    );
                    current = latest;
                }
                CasOutcome::Missing => {
                    return Err(RegistrationError::NotFound(id.to_string()));
                }
            }
        };

        if let TransitionOutcome::Rejected { attempts, blocked } = outcome {
            if blocked {
                warn!(registration_id = %id, attempts, "Too many incorrect pincodes, registration blocked");
            } else {
                warn!(registration_id = %id, attempts, "Incorrect pincode");
            }
            return Err(RegistrationError::InvalidPincode {
                attempts_remaining: record.attempts_remaining(max_attempts),
            });
        }

        info!(registration_id = %id, "Registration completed");
        Ok(Confirmation {
            id: record.id,
            status: record.status,
        })
    }

    /// Look up the current state of a registration.
    pub async fn registration_status(&self, id: &str) -> Result<StatusView, RegistrationError> {
        if id.trim().is_empty() {
            return Err(RegistrationError::InvalidInput(
                "registration id is required".into(),
            ));
        }

        let record = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| RegistrationError::NotFound(id.to_string()))?
            .value;

        Ok(StatusView {
            attempts_remaining: record.attempts_remaining(self.policy.max_attempts),
            id: record.id,
            status: record.status,
            failed_attempts: record.failed_attempts,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }
}
