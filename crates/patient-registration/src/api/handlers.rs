//! HTTP request handlers.

use super::types::{
    CompleteRequest, CompleteResponse, HealthResponse, InitiateRequest, InitiateResponse,
};
use super::AppState;
use crate::error::RegistrationError;
use crate::registration::{RegistrationStatus, StatusView};
use crate::store::RecordStore;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use tracing::{info, warn};

fn bad_body(rejection: JsonRejection) -> RegistrationError {
    RegistrationError::InvalidInput(rejection.body_text())
}

/// Health check endpoint.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let store = state.coordinator.store();
    let (store_healthy, registration_count) = match store.count().await {
        Ok(count) => (store.health_check().await, count),
        Err(e) => {
            warn!(error = %e, "Failed to count registrations");
            (false, 0)
        }
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        store_healthy,
        registration_count,
    })
}

/// Initiate registration for a patient.
pub async fn initiate_registration(
    State(state): State<AppState>,
    payload: Result<Json<InitiateRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<InitiateResponse>), RegistrationError> {
    let Json(request) = payload.map_err(bad_body)?;
    let patient = request
        .patient
        .ok_or_else(|| RegistrationError::InvalidInput("patient is required".into()))?;

    info!("Registration request received");

    let id = state.coordinator.initiate_registration(patient).await?;

    Ok((
        StatusCode::CREATED,
        Json(InitiateResponse {
            id: id.clone(),
            status: RegistrationStatus::Pending,
            message: format!(
                "Pincode sent. Use /v1/registrations/{}/complete to finalize.",
                id
            ),
        }),
    ))
}

/// Complete registration with the emailed pincode.
pub async fn complete_registration(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<CompleteRequest>, JsonRejection>,
) -> Result<Json<CompleteResponse>, RegistrationError> {
    let Json(request) = payload.map_err(bad_body)?;
    let pincode = request
        .pincode
        .ok_or_else(|| RegistrationError::InvalidInput("pincode is required".into()))?;

    info!(registration_id = %id, "Completion request received");

    let confirmation = state.coordinator.complete_registration(&id, pincode).await?;

    Ok(Json(CompleteResponse {
        id: confirmation.id,
        status: confirmation.status,
        message: "Registration confirmed.".to_string(),
    }))
}

/// Get the status of a registration.
pub async fn get_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StatusView>, RegistrationError> {
    let view = state.coordinator.registration_status(&id).await?;
    Ok(Json(view))
}
