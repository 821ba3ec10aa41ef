// --- File: crates/slotbook_booking/src/selection.rs ---
//! The session's single source of truth for the date → service → time →
//! contact selection.
//!
//! Every transition is a method that runs to completion. Window refreshes
//! cascade-clear whatever they invalidate, always in the order time, then
//! service, then date, so nothing downstream keeps pointing at stale data.

use crate::availability::available_dates;
use crate::catalog::ServiceOption;
use crate::contact::{ContactInfo, ValidationError};
use crate::slots::generate_with_step;
use crate::submitter::{BookingConfirmation, BookingError};
use crate::window::{format_time, upcoming, BookableSlot, BusinessZone, CalendarDay, OpenWindow};
use chrono::{DateTime, Duration};
use chrono_tz::Tz;
use slotbook_common::SlotbookError;
use slotbook_config::WindowOrdering;
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    NoDate,
    DateChosen,
    ServiceChosen,
    TimeChosen,
    Submitting,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SubmissionStatus {
    #[default]
    Idle,
    Submitting,
    Succeeded(BookingConfirmation),
    Failed(BookingError),
}

/// What a window refresh did to the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshEffect {
    Unchanged,
    /// The chosen time disappeared; date and service are kept.
    TimeCleared,
    /// The chosen date disappeared; date, service and time are cleared.
    SelectionCleared,
    /// An out-of-order response was dropped without touching anything.
    Discarded,
}

/// Sequence number of a windows request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchTicket(u64);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("No open times on {0}")]
    DateUnavailable(CalendarDay),
    #[error("Choose a date first")]
    NoDateChosen,
    #[error("Unknown service: {0}")]
    UnknownService(String),
    #[error("Choose a service first")]
    NoServiceChosen,
    #[error("That time is not available for the chosen service")]
    SlotUnavailable,
    #[error("Choose a time first")]
    NoTimeChosen,
    #[error("A booking is already being submitted")]
    SubmissionInProgress,
    #[error("No booking is being submitted")]
    NotSubmitting,
    #[error(transparent)]
    InvalidContact(#[from] ValidationError),
}

impl From<SelectionError> for SlotbookError {
    fn from(err: SelectionError) -> Self {
        SlotbookError::ValidationError(err.to_string())
    }
}

/// Snapshot handed to the submitter when a submission starts.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingBooking {
    pub slot: BookableSlot,
    pub service: ServiceOption,
    pub contact: ContactInfo,
}

/// Confirmation panel content, in display formats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingSummary {
    /// `DD.MM.YYYY`
    pub date: String,
    /// `HH:MM`
    pub time: String,
    pub service: String,
}

#[derive(Debug, Clone)]
pub struct SelectionState {
    zone: BusinessZone,
    step: Duration,
    ordering: WindowOrdering,
    windows: Vec<OpenWindow>,
    dates: BTreeSet<CalendarDay>,
    date: Option<CalendarDay>,
    service: Option<ServiceOption>,
    slots: Vec<BookableSlot>,
    time: Option<BookableSlot>,
    contact: ContactInfo,
    status: SubmissionStatus,
    next_ticket: u64,
    applied_ticket: Option<FetchTicket>,
}

impl SelectionState {
    pub fn new(zone: BusinessZone, step: Duration, ordering: WindowOrdering) -> Self {
        Self {
            zone,
            step,
            ordering,
            windows: Vec::new(),
            dates: BTreeSet::new(),
            date: None,
            service: None,
            slots: Vec::new(),
            time: None,
            contact: ContactInfo::default(),
            status: SubmissionStatus::Idle,
            next_ticket: 0,
            applied_ticket: None,
        }
    }

    pub fn zone(&self) -> BusinessZone {
        self.zone
    }

    pub fn windows(&self) -> &[OpenWindow] {
        &self.windows
    }

    pub fn available_dates(&self) -> &BTreeSet<CalendarDay> {
        &self.dates
    }

    pub fn date(&self) -> Option<CalendarDay> {
        self.date
    }

    pub fn service(&self) -> Option<&ServiceOption> {
        self.service.as_ref()
    }

    /// Slots of the chosen date and service; empty until both are chosen.
    pub fn current_slots(&self) -> &[BookableSlot] {
        &self.slots
    }

    pub fn time(&self) -> Option<&BookableSlot> {
        self.time.as_ref()
    }

    pub fn contact(&self) -> &ContactInfo {
        &self.contact
    }

    pub fn status(&self) -> &SubmissionStatus {
        &self.status
    }

    pub fn last_error(&self) -> Option<&BookingError> {
        match &self.status {
            SubmissionStatus::Failed(err) => Some(err),
            _ => None,
        }
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self.status, SubmissionStatus::Submitting)
    }

    pub fn phase(&self) -> Phase {
        match self.status {
            SubmissionStatus::Submitting => Phase::Submitting,
            SubmissionStatus::Succeeded(_) => Phase::Succeeded,
            SubmissionStatus::Failed(_) => Phase::Failed,
            SubmissionStatus::Idle => match (&self.date, &self.service, &self.time) {
                (None, _, _) => Phase::NoDate,
                (Some(_), None, _) => Phase::DateChosen,
                (Some(_), Some(_), None) => Phase::ServiceChosen,
                (Some(_), Some(_), Some(_)) => Phase::TimeChosen,
            },
        }
    }

    fn ensure_not_submitting(&self) -> Result<(), SelectionError> {
        if self.is_submitting() {
            warn!("Selection change rejected while a booking is in flight");
            return Err(SelectionError::SubmissionInProgress);
        }
        Ok(())
    }

    /// A new choice dismisses the outcome of the previous submission.
    fn dismiss_outcome(&mut self) {
        self.status = SubmissionStatus::Idle;
    }

    fn recompute_slots(&mut self) {
        self.slots = match (self.date, &self.service) {
            (Some(date), Some(service)) => generate_with_step(
                &self.windows,
                date,
                service.duration_minutes(),
                self.step,
            ),
            _ => Vec::new(),
        };
    }

    pub fn choose_date(&mut self, date: CalendarDay) -> Result<(), SelectionError> {
        self.ensure_not_submitting()?;
        if !self.dates.contains(&date) {
            warn!("Rejected unavailable date {}", date);
            return Err(SelectionError::DateUnavailable(date));
        }
        self.time = None;
        self.service = None;
        self.slots.clear();
        self.date = Some(date);
        self.dismiss_outcome();
        info!("Date chosen: {}", date);
        Ok(())
    }

    pub fn choose_service(&mut self, service: ServiceOption) -> Result<(), SelectionError> {
        self.ensure_not_submitting()?;
        if self.date.is_none() {
            return Err(SelectionError::NoDateChosen);
        }
        self.time = None;
        info!(
            "Service chosen: {} ({} min)",
            service.name(),
            service.duration_minutes()
        );
        self.service = Some(service);
        self.recompute_slots();
        self.dismiss_outcome();
        Ok(())
    }

    /// Accepts only a member of [`current_slots`](Self::current_slots).
    pub fn choose_time(&mut self, slot: &BookableSlot) -> Result<(), SelectionError> {
        self.ensure_not_submitting()?;
        if self.service.is_none() {
            return Err(SelectionError::NoServiceChosen);
        }
        let Some(canonical) = self.slots.iter().find(|s| *s == slot).cloned() else {
            warn!("Rejected slot {} not among current slots", slot.start());
            return Err(SelectionError::SlotUnavailable);
        };
        info!("Time chosen: {}", format_time(&canonical.start()));
        self.time = Some(canonical);
        self.dismiss_outcome();
        Ok(())
    }

    /// Chooses the current slot starting at `start`.
    pub fn choose_time_at(&mut self, start: DateTime<Tz>) -> Result<(), SelectionError> {
        let slot = self
            .slots
            .iter()
            .find(|s| s.start() == start)
            .cloned()
            .ok_or(SelectionError::SlotUnavailable)?;
        self.choose_time(&slot)
    }

    pub fn set_contact(&mut self, contact: ContactInfo) {
        self.contact = contact;
    }

    /// Hands out the next windows request ticket.
    pub fn issue_fetch(&mut self) -> FetchTicket {
        self.next_ticket += 1;
        FetchTicket(self.next_ticket)
    }

    /// Applies a completed windows fetch according to the ordering policy.
    pub fn apply_fetched_windows(
        &mut self,
        ticket: FetchTicket,
        windows: Vec<OpenWindow>,
        now: DateTime<Tz>,
    ) -> RefreshEffect {
        if self.ordering == WindowOrdering::RequestOrder {
            if self.applied_ticket.is_some_and(|applied| ticket < applied) {
                debug!("Dropping out-of-order windows response {:?}", ticket);
                return RefreshEffect::Discarded;
            }
            self.applied_ticket = Some(ticket);
        }
        self.refresh_windows(windows, now)
    }

    /// Replaces the windows and cascades whatever they invalidate.
    ///
    /// Windows starting before `now` are dropped first, so past days never
    /// show up as available nor produce slots.
    pub fn refresh_windows(&mut self, windows: Vec<OpenWindow>, now: DateTime<Tz>) -> RefreshEffect {
        self.windows = upcoming(windows, now);
        self.dates = available_dates(&self.windows);
        debug!(
            "Windows replaced: {} windows on {} days",
            self.windows.len(),
            self.dates.len()
        );

        let Some(date) = self.date else {
            return RefreshEffect::Unchanged;
        };
        if !self.dates.contains(&date) {
            self.time = None;
            self.service = None;
            self.slots.clear();
            self.date = None;
            info!("Chosen date {} is no longer available, selection cleared", date);
            return RefreshEffect::SelectionCleared;
        }
        if self.service.is_none() {
            return RefreshEffect::Unchanged;
        }

        self.recompute_slots();
        let Some(time) = self.time.take() else {
            return RefreshEffect::Unchanged;
        };
        match self.slots.iter().find(|s| s.same_span(&time)) {
            Some(current) => {
                self.time = Some(current.clone());
                RefreshEffect::Unchanged
            }
            None => {
                info!(
                    "Chosen time {} is no longer available, time cleared",
                    format_time(&time.start())
                );
                RefreshEffect::TimeCleared
            }
        }
    }

    /// Validates and locks the selection for submission.
    ///
    /// Invalid contact details leave the status untouched.
    pub fn begin_submit(&mut self, contact: ContactInfo) -> Result<PendingBooking, SelectionError> {
        self.ensure_not_submitting()?;
        let (Some(service), Some(slot)) = (self.service.clone(), self.time.clone()) else {
            return Err(SelectionError::NoTimeChosen);
        };
        self.contact = contact;
        self.contact.validate()?;

        self.status = SubmissionStatus::Submitting;
        info!("Submitting booking for {}", format_time(&slot.start()));
        Ok(PendingBooking {
            slot,
            service,
            contact: self.contact.clone(),
        })
    }

    /// Records the submitter's outcome.
    ///
    /// Success clears date, service, time and contact but keeps the windows;
    /// failure keeps every selection so the user can retry or adjust.
    pub fn complete_submit(
        &mut self,
        result: Result<BookingConfirmation, BookingError>,
    ) -> Result<(), SelectionError> {
        if !self.is_submitting() {
            return Err(SelectionError::NotSubmitting);
        }
        match result {
            Ok(confirmation) => {
                self.time = None;
                self.service = None;
                self.slots.clear();
                self.date = None;
                self.contact = ContactInfo::default();
                self.status = SubmissionStatus::Succeeded(confirmation);
                info!("Booking succeeded, selection reset");
            }
            Err(err) => {
                warn!("Booking failed: {}", err);
                self.status = SubmissionStatus::Failed(err);
            }
        }
        Ok(())
    }

    /// Date, time and service of the current choice, once all three are set.
    pub fn summary(&self) -> Option<BookingSummary> {
        let (Some(date), Some(service), Some(time)) = (self.date, &self.service, &self.time) else {
            return None;
        };
        Some(BookingSummary {
            date: date.display(),
            time: format_time(&time.start()),
            service: service.name().to_string(),
        })
    }
}
