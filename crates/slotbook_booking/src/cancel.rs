// --- File: crates/slotbook_booking/src/cancel.rs ---
use crate::backend::{BookingBackend, RawResponse};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// JSON body of `POST /cancel`, also the query of a cancel link.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CancelRequest {
    pub event_id: String,
    pub email: String,
}

#[derive(Deserialize)]
struct CancelQuery {
    event_id: Option<String>,
    email: Option<String>,
}

impl CancelRequest {
    /// Parses `event_id=...&email=...`, with or without a leading `?`.
    ///
    /// `None` when either field is missing or blank.
    pub fn from_query(query: &str) -> Option<Self> {
        let query = query.trim().trim_start_matches('?');
        let parsed: CancelQuery = serde_urlencoded::from_str(query).ok()?;
        let event_id = parsed.event_id.filter(|v| !v.trim().is_empty())?;
        let email = parsed.email.filter(|v| !v.trim().is_empty())?;
        Some(Self { event_id, email })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelOutcome {
    Cancelled,
    /// The backend refused or could not be reached.
    Failed { reason: String },
    /// The link did not carry both an event id and an email.
    Invalid,
}

pub fn classify_cancel_response(response: &RawResponse) -> CancelOutcome {
    if response.is_success() {
        CancelOutcome::Cancelled
    } else {
        CancelOutcome::Failed {
            reason: response
                .detail()
                .unwrap_or_else(|| format!("status {}", response.status)),
        }
    }
}

/// Sends a single cancel request. An invalid link sends nothing.
pub async fn cancel_booking<B: BookingBackend + ?Sized>(
    backend: &B,
    request: Option<CancelRequest>,
) -> CancelOutcome {
    let Some(request) = request else {
        warn!("Cancel link is missing event_id or email");
        return CancelOutcome::Invalid;
    };

    let outcome = match backend.post_cancel(&request).await {
        Ok(response) => classify_cancel_response(&response),
        Err(e) => CancelOutcome::Failed { reason: e.0 },
    };
    match &outcome {
        CancelOutcome::Cancelled => info!("Cancelled booking {}", request.event_id),
        CancelOutcome::Failed { reason } => {
            warn!("Cancelling booking {} failed: {}", request.event_id, reason)
        }
        CancelOutcome::Invalid => {}
    }
    outcome
}
