// --- File: crates/slotbook_booking/src/submitter.rs ---
use crate::backend::{BookingBackend, RawResponse};
use crate::catalog::ServiceOption;
use crate::contact::{ContactInfo, ValidationError};
use crate::identity::DeviceIdentity;
use crate::window::BookableSlot;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use slotbook_common::SlotbookError;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

/// Message used when a failing backend gives no `detail`.
pub const GENERIC_SERVER_MESSAGE: &str = "Booking failed, please try again later";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SlotPayload {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomerPayload {
    pub name: String,
    pub email: String,
    /// Name of the chosen service.
    pub haircut: String,
}

/// JSON body of `POST /book`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookingPayload {
    pub slot: SlotPayload,
    #[serde(rename = "customerInfo")]
    pub customer_info: CustomerPayload,
}

impl BookingPayload {
    pub fn new(slot: &BookableSlot, service: &ServiceOption, contact: &ContactInfo) -> Self {
        Self {
            slot: SlotPayload {
                start: slot.start().to_rfc3339(),
                end: slot.end().to_rfc3339(),
            },
            customer_info: CustomerPayload {
                name: contact.name.trim().to_string(),
                email: contact.email.trim().to_string(),
                haircut: service.name().to_string(),
            },
        }
    }
}

/// What the backend accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingConfirmation {
    pub slot: BookableSlot,
    pub service: ServiceOption,
    /// Calendar event id, when the backend echoes one.
    pub event_id: Option<String>,
    /// The echoed booking as received.
    pub body: serde_json::Value,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("The available times have changed, please pick again")]
    StaleSlot,
    #[error("Too many booking attempts from this device, please wait before trying again")]
    RateLimited,
    #[error("{message}")]
    ServerError { status: StatusCode, message: String },
    #[error("No response from the booking server ({detail}). The booking may have been recorded anyway, please check your email before trying again")]
    TransportError { detail: String },
}

impl BookingError {
    /// Outcomes after which the cached windows can no longer be trusted.
    pub fn requires_refetch(&self) -> bool {
        matches!(self, BookingError::StaleSlot)
    }
}

impl From<BookingError> for SlotbookError {
    fn from(err: BookingError) -> Self {
        match &err {
            BookingError::Validation(_) => SlotbookError::ValidationError(err.to_string()),
            BookingError::StaleSlot => SlotbookError::ConflictError(err.to_string()),
            BookingError::RateLimited => SlotbookError::RateLimitError(err.to_string()),
            BookingError::ServerError { .. } => SlotbookError::ExternalServiceError {
                service_name: "booking backend".to_string(),
                message: err.to_string(),
            },
            BookingError::TransportError { .. } => SlotbookError::HttpError(err.to_string()),
        }
    }
}

/// Maps a `POST /book` response onto the booking taxonomy.
pub fn classify_booking_response(
    response: RawResponse,
    slot: &BookableSlot,
    service: &ServiceOption,
) -> Result<BookingConfirmation, BookingError> {
    if response.is_success() {
        let body: serde_json::Value =
            serde_json::from_str(&response.body).unwrap_or(serde_json::Value::Null);
        let event_id = body
            .get("event_id")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string);
        return Ok(BookingConfirmation {
            slot: slot.clone(),
            service: service.clone(),
            event_id,
            body,
        });
    }

    match response.status {
        StatusCode::NOT_FOUND => Err(BookingError::StaleSlot),
        StatusCode::TOO_MANY_REQUESTS => Err(BookingError::RateLimited),
        status => Err(BookingError::ServerError {
            status,
            message: response
                .detail()
                .unwrap_or_else(|| GENERIC_SERVER_MESSAGE.to_string()),
        }),
    }
}

/// Executes the create-booking request. Never retries.
pub struct BookingSubmitter<B: ?Sized> {
    backend: Arc<B>,
}

impl<B: BookingBackend + ?Sized> BookingSubmitter<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    /// Validates the contact, then issues exactly one request.
    ///
    /// Invalid contact details are rejected before anything is sent.
    #[instrument(skip_all, fields(start = %slot.start(), service = service.name()))]
    pub async fn submit(
        &self,
        slot: &BookableSlot,
        service: &ServiceOption,
        contact: &ContactInfo,
        identity: &DeviceIdentity,
    ) -> Result<BookingConfirmation, BookingError> {
        contact.validate()?;
        let payload = BookingPayload::new(slot, service, contact);

        let response = match self.backend.post_booking(&payload, identity).await {
            Ok(response) => response,
            Err(e) => {
                error!("Booking request got no response: {}", e);
                return Err(BookingError::TransportError { detail: e.0 });
            }
        };

        let outcome = classify_booking_response(response, slot, service);
        match &outcome {
            Ok(confirmation) => info!(
                "Booking accepted (event {})",
                confirmation.event_id.as_deref().unwrap_or("-")
            ),
            Err(BookingError::ServerError { status, message }) => {
                error!("Booking failed with {}: {}", status, message)
            }
            Err(e) => warn!("Booking rejected: {}", e),
        }
        outcome
    }
}
