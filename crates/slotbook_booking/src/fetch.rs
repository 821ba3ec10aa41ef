// --- File: crates/slotbook_booking/src/fetch.rs ---
use crate::backend::{RawResponse, TransportError};
use crate::catalog::ServiceCatalog;
use crate::window::{BusinessZone, OpenWindow};
use http::StatusCode;
use serde::Deserialize;
use slotbook_common::SlotbookError;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

/// Failure to load windows or the catalog.
///
/// Kept apart from booking errors: the session stores it as a load error
/// with a retry affordance instead of failing a submission.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Too many requests from this device, try again later")]
    RateLimited,
    #[error("Backend answered with status {status}")]
    Status { status: StatusCode },
    #[error("Backend unreachable: {0}")]
    Transport(String),
    #[error("Unexpected response body: {0}")]
    Parse(String),
    #[error("Could not read {path}: {message}")]
    Io { path: String, message: String },
}

impl From<TransportError> for FetchError {
    fn from(err: TransportError) -> Self {
        FetchError::Transport(err.0)
    }
}

impl From<FetchError> for SlotbookError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::RateLimited => SlotbookError::RateLimitError(err.to_string()),
            FetchError::Status { .. } => SlotbookError::ExternalServiceError {
                service_name: "booking backend".to_string(),
                message: err.to_string(),
            },
            FetchError::Transport(message) => SlotbookError::HttpError(message),
            FetchError::Parse(message) => SlotbookError::ParseError(message),
            FetchError::Io { .. } => SlotbookError::InternalError(err.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WindowsResponse {
    terminy: Vec<WireWindow>,
}

#[derive(Debug, Deserialize)]
struct WireWindow {
    start: String,
    end: String,
    #[serde(default)]
    event_id: Option<String>,
}

fn check_status(response: &RawResponse) -> Result<(), FetchError> {
    if response.status == StatusCode::TOO_MANY_REQUESTS {
        return Err(FetchError::RateLimited);
    }
    if !response.is_success() {
        return Err(FetchError::Status {
            status: response.status,
        });
    }
    Ok(())
}

/// Interprets a windows response.
///
/// Individual windows that cannot be parsed (bad instant, end before start)
/// are skipped with a warning; the rest of the list is still usable.
pub fn classify_windows_response(
    zone: BusinessZone,
    response: RawResponse,
) -> Result<Vec<OpenWindow>, FetchError> {
    check_status(&response)?;
    let parsed: WindowsResponse =
        serde_json::from_str(&response.body).map_err(|e| FetchError::Parse(e.to_string()))?;

    let total = parsed.terminy.len();
    let windows: Vec<OpenWindow> = parsed
        .terminy
        .into_iter()
        .filter_map(|wire| {
            match OpenWindow::parse(zone, &wire.start, &wire.end, wire.event_id) {
                Ok(window) => Some(window),
                Err(e) => {
                    warn!("Skipping window {} - {}: {}", wire.start, wire.end, e);
                    None
                }
            }
        })
        .collect();
    info!("Fetched {} open windows ({} received)", windows.len(), total);
    Ok(windows)
}

pub fn classify_catalog_response(response: RawResponse) -> Result<ServiceCatalog, FetchError> {
    check_status(&response)?;
    ServiceCatalog::parse(&response.body).map_err(|e| FetchError::Parse(e.to_string()))
}

/// Reads the catalog from a local JSON file.
pub fn load_catalog_file(path: &Path) -> Result<ServiceCatalog, FetchError> {
    let body = std::fs::read_to_string(path).map_err(|e| FetchError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let catalog = ServiceCatalog::parse(&body).map_err(|e| FetchError::Parse(e.to_string()))?;
    info!(
        "Loaded {} services from {}",
        catalog.len(),
        path.display()
    );
    Ok(catalog)
}
