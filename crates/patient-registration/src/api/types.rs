//! API request and response types.

use crate::registration::{PersonalData, RegistrationStatus};
use serde::{Deserialize, Serialize};

/// Request to start a registration.
#[derive(Debug, Deserialize)]
pub struct InitiateRequest {
    /// Applicant details; name, national id and email are mandatory
    pub patient: Option<PersonalData>,
}

/// Response after initiating registration.
#[derive(Debug, Serialize)]
pub struct InitiateResponse {
    pub id: String,
    pub status: RegistrationStatus,
    pub message: String,
}

/// Request to confirm a registration.
#[derive(Debug, Deserialize)]
pub struct CompleteRequest {
    /// Pincode from the registration email
    pub pincode: Option<i64>,
}

/// Response after successful confirmation.
#[derive(Debug, Serialize)]
pub struct CompleteResponse {
    pub id: String,
    pub status: RegistrationStatus,
    pub message: String,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub store_healthy: bool,
    pub registration_count: usize,
}
