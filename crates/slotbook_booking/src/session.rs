// --- File: crates/slotbook_booking/src/session.rs ---
//! One customer's booking session.
//!
//! Owns the [`SelectionState`] and drives the network around it: initial
//! load of windows and catalog, refreshes, submission and cancellation. The
//! outcome policies from [`BookingConfig`] (redirect or stay, blocked page or
//! inline message) are applied here and nowhere else.

use crate::backend::BookingBackend;
use crate::cancel::{cancel_booking, CancelOutcome, CancelRequest};
use crate::catalog::ServiceCatalog;
use crate::contact::ContactInfo;
use crate::fetch::{classify_catalog_response, classify_windows_response, load_catalog_file, FetchError};
use crate::identity::DeviceIdentity;
use crate::selection::{RefreshEffect, SelectionError, SelectionState};
use crate::submitter::{BookingConfirmation, BookingError, BookingSubmitter};
use crate::window::{BookableSlot, BusinessZone, CalendarDay};
use chrono::{DateTime, Duration};
use chrono_tz::Tz;
use slotbook_common::{config_error, SlotbookError};
use slotbook_config::{
    AppConfig, BookingConfig, RateLimitPolicy, SuccessPolicy, WindowOrdering,
    DEFAULT_SLOT_STEP_MINUTES,
};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

/// Where the service catalog comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    /// Through [`BookingBackend::get_catalog`].
    Remote,
    File(PathBuf),
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub zone: BusinessZone,
    /// Distance between candidate slot starts.
    pub step: Duration,
    pub ordering: WindowOrdering,
    pub catalog: CatalogSource,
    pub on_success: SuccessPolicy,
    pub on_rate_limited: RateLimitPolicy,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            zone: BusinessZone::default(),
            step: Duration::minutes(DEFAULT_SLOT_STEP_MINUTES),
            ordering: WindowOrdering::default(),
            catalog: CatalogSource::Remote,
            on_success: SuccessPolicy::default(),
            on_rate_limited: RateLimitPolicy::default(),
        }
    }
}

impl SessionSettings {
    pub fn from_config(config: &AppConfig) -> Result<Self, SlotbookError> {
        Self::from_booking_config(&config.booking)
    }

    pub fn from_booking_config(booking: &BookingConfig) -> Result<Self, SlotbookError> {
        let zone = BusinessZone::from_name(&booking.time_zone).map_err(config_error)?;
        let step = Duration::try_minutes(booking.slot_step_minutes)
            .filter(|step| *step > Duration::zero())
            .ok_or_else(|| {
                config_error(format!(
                    "booking.slot_step_minutes must be a positive number of minutes, got {}",
                    booking.slot_step_minutes
                ))
            })?;
        // A configured URL wins over a local file.
        let catalog = match (&booking.catalog_url, &booking.catalog_path) {
            (None, Some(path)) => CatalogSource::File(PathBuf::from(path)),
            _ => CatalogSource::Remote,
        };
        Ok(Self {
            zone,
            step,
            ordering: booking.window_ordering,
            catalog,
            on_success: booking.on_success.clone(),
            on_rate_limited: booking.on_rate_limited.clone(),
        })
    }
}

/// Progress of a background load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Ready,
    Failed(FetchError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    /// The selection was not ready; nothing was sent.
    #[error(transparent)]
    Rejected(#[from] SelectionError),
    #[error(transparent)]
    Booking(#[from] BookingError),
}

impl From<SubmitError> for SlotbookError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::Rejected(e) => e.into(),
            SubmitError::Booking(e) => e.into(),
        }
    }
}

pub struct BookingSession<B: ?Sized> {
    backend: Arc<B>,
    submitter: BookingSubmitter<B>,
    identity: DeviceIdentity,
    settings: SessionSettings,
    state: SelectionState,
    catalog: ServiceCatalog,
    windows_state: LoadState,
    catalog_state: LoadState,
    redirect: Option<String>,
}

impl<B: BookingBackend + ?Sized> BookingSession<B> {
    pub fn new(backend: Arc<B>, identity: DeviceIdentity, settings: SessionSettings) -> Self {
        let state = SelectionState::new(settings.zone, settings.step, settings.ordering);
        Self {
            submitter: BookingSubmitter::new(Arc::clone(&backend)),
            backend,
            identity,
            settings,
            state,
            catalog: ServiceCatalog::default(),
            windows_state: LoadState::Loading,
            catalog_state: LoadState::Loading,
            redirect: None,
        }
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn catalog(&self) -> &ServiceCatalog {
        &self.catalog
    }

    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn windows_state(&self) -> &LoadState {
        &self.windows_state
    }

    pub fn catalog_state(&self) -> &LoadState {
        &self.catalog_state
    }

    /// True until the first windows fetch completes.
    pub fn is_loading(&self) -> bool {
        self.windows_state == LoadState::Loading
    }

    pub fn is_submitting(&self) -> bool {
        self.state.is_submitting()
    }

    /// The page the front end should navigate to, consumed once.
    pub fn take_redirect(&mut self) -> Option<String> {
        self.redirect.take()
    }

    fn now(&self) -> DateTime<Tz> {
        self.settings.zone.now()
    }

    /// Initial load of windows and catalog. Failures end up in
    /// [`windows_state`](Self::windows_state) and
    /// [`catalog_state`](Self::catalog_state), never in a panic.
    pub async fn load(&mut self) {
        self.windows_state = LoadState::Loading;
        self.catalog_state = LoadState::Loading;
        let _ = self.fetch_windows().await;
        self.fetch_catalog().await;
    }

    /// Re-runs whichever part of the load did not succeed.
    pub async fn retry_load(&mut self) {
        if self.windows_state != LoadState::Ready {
            info!("Retrying windows load");
            let _ = self.fetch_windows().await;
        }
        if self.catalog_state != LoadState::Ready {
            info!("Retrying catalog load");
            self.fetch_catalog().await;
        }
    }

    /// Explicit or periodic windows refetch.
    ///
    /// A failure is returned to the caller but leaves
    /// [`windows_state`](Self::windows_state) as it was once loaded.
    pub async fn refresh(&mut self) -> Result<RefreshEffect, FetchError> {
        self.fetch_windows().await
    }

    async fn fetch_windows(&mut self) -> Result<RefreshEffect, FetchError> {
        let ticket = self.state.issue_fetch();
        let result = match self.backend.get_windows(&self.identity).await {
            Ok(response) => classify_windows_response(self.settings.zone, response),
            Err(e) => Err(FetchError::from(e)),
        };
        match result {
            Ok(windows) => {
                self.windows_state = LoadState::Ready;
                let now = self.now();
                Ok(self.state.apply_fetched_windows(ticket, windows, now))
            }
            Err(e) => {
                if e == FetchError::RateLimited {
                    self.apply_rate_limit_policy();
                }
                // Windows from an earlier load stay usable
                if self.windows_state == LoadState::Ready {
                    warn!("Refreshing open windows failed: {}", e);
                } else {
                    error!("Loading open windows failed: {}", e);
                    self.windows_state = LoadState::Failed(e.clone());
                }
                Err(e)
            }
        }
    }

    async fn fetch_catalog(&mut self) {
        let result = match &self.settings.catalog {
            CatalogSource::File(path) => load_catalog_file(path),
            CatalogSource::Remote => match self.backend.get_catalog().await {
                Ok(response) => classify_catalog_response(response),
                Err(e) => Err(FetchError::from(e)),
            },
        };
        match result {
            Ok(catalog) => {
                info!("Service catalog ready with {} services", catalog.len());
                self.catalog = catalog;
                self.catalog_state = LoadState::Ready;
            }
            Err(e) => {
                error!("Loading service catalog failed: {}", e);
                self.catalog_state = LoadState::Failed(e);
            }
        }
    }

    fn apply_rate_limit_policy(&mut self) {
        if let RateLimitPolicy::Redirect { url } = &self.settings.on_rate_limited {
            warn!("Device is rate limited, redirecting to {}", url);
            self.redirect = Some(url.clone());
        }
    }

    pub fn choose_date(&mut self, date: CalendarDay) -> Result<(), SelectionError> {
        self.state.choose_date(date)
    }

    /// Chooses a service by its catalog name.
    pub fn choose_service(&mut self, name: &str) -> Result<(), SelectionError> {
        let service = self
            .catalog
            .find(name)
            .cloned()
            .ok_or_else(|| SelectionError::UnknownService(name.to_string()))?;
        self.state.choose_service(service)
    }

    pub fn choose_time(&mut self, slot: &BookableSlot) -> Result<(), SelectionError> {
        self.state.choose_time(slot)
    }

    pub fn choose_time_at(&mut self, start: DateTime<Tz>) -> Result<(), SelectionError> {
        self.state.choose_time_at(start)
    }

    /// Submits the current selection once.
    ///
    /// Any refetch the outcome calls for is awaited after the booking
    /// response has been recorded, never alongside the request.
    pub async fn submit(
        &mut self,
        contact: ContactInfo,
    ) -> Result<BookingConfirmation, SubmitError> {
        let pending = self.state.begin_submit(contact)?;
        let result = self
            .submitter
            .submit(&pending.slot, &pending.service, &pending.contact, &self.identity)
            .await;
        self.state.complete_submit(result.clone())?;

        match &result {
            Ok(_) => {
                if let SuccessPolicy::Redirect { url } = &self.settings.on_success {
                    self.redirect = Some(url.clone());
                }
                if let Err(e) = self.fetch_windows().await {
                    warn!("Refetch after booking failed: {}", e);
                }
            }
            Err(BookingError::RateLimited) => self.apply_rate_limit_policy(),
            Err(e) if e.requires_refetch() => {
                if let Err(fetch_err) = self.fetch_windows().await {
                    warn!("Refetch after stale slot failed: {}", fetch_err);
                }
            }
            Err(_) => {}
        }
        result.map_err(SubmitError::from)
    }

    /// Cancels a booking from a cancel link. Independent of the selection.
    pub async fn cancel(&self, request: Option<CancelRequest>) -> CancelOutcome {
        cancel_booking(self.backend.as_ref(), request).await
    }
}
