// --- File: crates/slotbook_booking/src/backend.rs ---
//! Seam between the booking core and the backend that owns the calendar.
//!
//! Implementations only move bytes: they return the status code and body as
//! received and report failures to get any response at all as
//! [`TransportError`]. Interpreting statuses is left to the fetch, submit and
//! cancel classifiers so that every backend is read the same way.

use crate::cancel::CancelRequest;
use crate::identity::DeviceIdentity;
use crate::submitter::BookingPayload;
use http::StatusCode;
use serde::Deserialize;
use slotbook_common::BoxFuture;
use thiserror::Error;

/// Status and body of a backend response, uninterpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

#[derive(Deserialize)]
struct DetailBody {
    detail: String,
}

impl RawResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn json(status: StatusCode, body: &serde_json::Value) -> Self {
        Self::new(status, body.to_string())
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// The `detail` message of a `{ "detail": "..." }` error body, if any.
    pub fn detail(&self) -> Option<String> {
        serde_json::from_str::<DetailBody>(&self.body)
            .ok()
            .map(|body| body.detail)
            .filter(|detail| !detail.trim().is_empty())
    }
}

/// No response was received (connect failure, timeout, broken body).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Requests the booking core issues against the backend.
pub trait BookingBackend: Send + Sync {
    /// `GET /` carrying the device identity header.
    fn get_windows<'a>(
        &'a self,
        identity: &'a DeviceIdentity,
    ) -> BoxFuture<'a, RawResponse, TransportError>;

    /// The static service catalog.
    fn get_catalog(&self) -> BoxFuture<'_, RawResponse, TransportError>;

    /// `POST /book` carrying the API key and device identity headers.
    fn post_booking<'a>(
        &'a self,
        payload: &'a BookingPayload,
        identity: &'a DeviceIdentity,
    ) -> BoxFuture<'a, RawResponse, TransportError>;

    /// `POST /cancel`.
    fn post_cancel<'a>(
        &'a self,
        request: &'a CancelRequest,
    ) -> BoxFuture<'a, RawResponse, TransportError>;
}

/// In-memory backend for tests and offline runs.
pub mod mock {
    use super::*;
    use crate::window::{BusinessZone, OpenWindow};
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::{Mutex, MutexGuard, PoisonError};

    /// A canned outcome consumed by the next matching request.
    #[derive(Debug, Clone)]
    pub enum Scripted {
        Respond(RawResponse),
        Fail(String),
    }

    impl Scripted {
        fn into_result(self) -> Result<RawResponse, TransportError> {
            match self {
                Scripted::Respond(response) => Ok(response),
                Scripted::Fail(message) => Err(TransportError(message)),
            }
        }
    }

    #[derive(Default)]
    struct MockState {
        windows: Vec<OpenWindow>,
        catalog: String,
        rate_limited: bool,
        scripted_windows: VecDeque<Scripted>,
        scripted_bookings: VecDeque<Scripted>,
        window_fetches: usize,
        booking_requests: usize,
        identities: Vec<String>,
        bookings: Vec<(String, BookingPayload)>,
        cancellations: Vec<CancelRequest>,
        next_event: usize,
    }

    /// Backend double that owns a list of open windows.
    ///
    /// A booking that fits inside a window is accepted and carves its span
    /// out of that window, so a later fetch no longer offers it. A booking
    /// outside every window gets a 404, like a slot somebody else took.
    pub struct InMemoryBackend {
        zone: BusinessZone,
        state: Mutex<MockState>,
    }

    impl InMemoryBackend {
        pub fn new(zone: BusinessZone) -> Self {
            Self {
                zone,
                state: Mutex::new(MockState {
                    catalog: "[]".to_string(),
                    ..MockState::default()
                }),
            }
        }

        pub fn with_windows(zone: BusinessZone, windows: Vec<OpenWindow>) -> Self {
            let backend = Self::new(zone);
            backend.set_windows(windows);
            backend
        }

        fn state(&self) -> MutexGuard<'_, MockState> {
            self.state.lock().unwrap_or_else(PoisonError::into_inner)
        }

        /// Replaces the open windows, as if the calendar changed elsewhere.
        pub fn set_windows(&self, windows: Vec<OpenWindow>) {
            self.state().windows = windows;
        }

        pub fn windows(&self) -> Vec<OpenWindow> {
            self.state().windows.clone()
        }

        pub fn set_catalog(&self, body: impl Into<String>) {
            self.state().catalog = body.into();
        }

        /// Every request answers 429 while set.
        pub fn set_rate_limited(&self, limited: bool) {
            self.state().rate_limited = limited;
        }

        pub fn script_window_fetch(&self, outcome: Scripted) {
            self.state().scripted_windows.push_back(outcome);
        }

        pub fn script_booking(&self, outcome: Scripted) {
            self.state().scripted_bookings.push_back(outcome);
        }

        pub fn window_fetches(&self) -> usize {
            self.state().window_fetches
        }

        pub fn booking_requests(&self) -> usize {
            self.state().booking_requests
        }

        /// Identity tokens seen on window fetches and bookings, in order.
        pub fn identities(&self) -> Vec<String> {
            self.state().identities.clone()
        }

        /// Accepted bookings with the event id they were given.
        pub fn bookings(&self) -> Vec<(String, BookingPayload)> {
            self.state().bookings.clone()
        }

        pub fn cancellations(&self) -> Vec<CancelRequest> {
            self.state().cancellations.clone()
        }

        fn rate_limited_response() -> RawResponse {
            RawResponse::json(
                StatusCode::TOO_MANY_REQUESTS,
                &json!({ "detail": "Too many requests" }),
            )
        }

        fn book(&self, state: &mut MockState, payload: &BookingPayload) -> RawResponse {
            let requested = match OpenWindow::parse(
                self.zone,
                &payload.slot.start,
                &payload.slot.end,
                None,
            ) {
                Ok(window) => window,
                Err(e) => {
                    return RawResponse::json(
                        StatusCode::BAD_REQUEST,
                        &json!({ "detail": e.to_string() }),
                    )
                }
            };

            let position = state.windows.iter().position(|window| {
                window.start() <= requested.start() && requested.end() <= window.end()
            });
            let Some(position) = position else {
                return RawResponse::json(
                    StatusCode::NOT_FOUND,
                    &json!({ "detail": "Slot is no longer available" }),
                );
            };

            let window = state.windows.remove(position);
            let source = window.source_id().map(str::to_string);
            let pieces = [
                (window.start(), requested.start()),
                (requested.end(), window.end()),
            ];
            for (start, end) in pieces {
                if start < end {
                    if let Ok(piece) = OpenWindow::new(self.zone, start, end, source.clone()) {
                        state.windows.push(piece);
                    }
                }
            }
            state.windows.sort_by_key(|w| w.start());

            state.next_event += 1;
            let event_id = format!("evt-{}", state.next_event);
            state.bookings.push((event_id.clone(), payload.clone()));
            RawResponse::json(
                StatusCode::OK,
                &json!({
                    "slot": { "start": payload.slot.start, "end": payload.slot.end },
                    "customerInfo": {
                        "name": payload.customer_info.name,
                        "email": payload.customer_info.email,
                        "haircut": payload.customer_info.haircut,
                    },
                    "event_id": event_id,
                }),
            )
        }
    }

    impl BookingBackend for InMemoryBackend {
        fn get_windows<'a>(
            &'a self,
            identity: &'a DeviceIdentity,
        ) -> BoxFuture<'a, RawResponse, TransportError> {
            Box::pin(async move {
                let mut state = self.state();
                state.window_fetches += 1;
                state.identities.push(identity.as_str().to_string());
                if let Some(outcome) = state.scripted_windows.pop_front() {
                    return outcome.into_result();
                }
                if state.rate_limited {
                    return Ok(Self::rate_limited_response());
                }
                let terminy: Vec<_> = state
                    .windows
                    .iter()
                    .map(|w| {
                        json!({
                            "start": w.start().to_rfc3339(),
                            "end": w.end().to_rfc3339(),
                            "event_id": w.source_id(),
                        })
                    })
                    .collect();
                Ok(RawResponse::json(StatusCode::OK, &json!({ "terminy": terminy })))
            })
        }

        fn get_catalog(&self) -> BoxFuture<'_, RawResponse, TransportError> {
            Box::pin(async move {
                let state = self.state();
                Ok(RawResponse::new(StatusCode::OK, state.catalog.clone()))
            })
        }

        fn post_booking<'a>(
            &'a self,
            payload: &'a BookingPayload,
            identity: &'a DeviceIdentity,
        ) -> BoxFuture<'a, RawResponse, TransportError> {
            Box::pin(async move {
                let mut state = self.state();
                state.booking_requests += 1;
                state.identities.push(identity.as_str().to_string());
                if let Some(outcome) = state.scripted_bookings.pop_front() {
                    return outcome.into_result();
                }
                if state.rate_limited {
                    return Ok(Self::rate_limited_response());
                }
                Ok(self.book(&mut state, payload))
            })
        }

        fn post_cancel<'a>(
            &'a self,
            request: &'a CancelRequest,
        ) -> BoxFuture<'a, RawResponse, TransportError> {
            Box::pin(async move {
                let mut state = self.state();
                state.cancellations.push(request.clone());
                let position = state.bookings.iter().position(|(event_id, payload)| {
                    *event_id == request.event_id
                        && payload.customer_info.email == request.email
                });
                match position {
                    Some(index) => {
                        state.bookings.remove(index);
                        Ok(RawResponse::json(
                            StatusCode::OK,
                            &json!({ "status": "cancelled" }),
                        ))
                    }
                    None => Ok(RawResponse::json(
                        StatusCode::NOT_FOUND,
                        &json!({ "detail": "Booking not found" }),
                    )),
                }
            })
        }
    }
}
