// --- File: crates/slotbook_booking/src/lib.rs ---
// Declare modules within this crate
pub mod availability;
pub mod backend;
pub mod cancel;
pub mod catalog;
pub mod client;
pub mod contact;
pub mod fetch;
pub mod identity;
#[cfg(test)]
mod identity_test;
pub mod selection;
pub mod session;
pub mod slots;
#[cfg(test)]
mod slots_proptest;
pub mod submitter;
#[cfg(test)]
mod submitter_test;
pub mod window;
#[cfg(test)]
mod window_test;

// Re-export the types front ends work with
pub use availability::{available_dates, first_available};
pub use backend::{BookingBackend, RawResponse, TransportError};
pub use cancel::{cancel_booking, CancelOutcome, CancelRequest};
pub use catalog::{ServiceCatalog, ServiceOption};
pub use client::HttpBackend;
pub use contact::{ContactInfo, ValidationError};
pub use fetch::FetchError;
pub use identity::{
    DeviceIdentity, FileIdentityStore, FingerprintSource, HostFingerprint, IdentityError,
    IdentityProvider, IdentityStore, MemoryIdentityStore, RandomFingerprint,
};
pub use selection::{
    BookingSummary, FetchTicket, Phase, RefreshEffect, SelectionError, SelectionState,
    SubmissionStatus,
};
pub use session::{BookingSession, CatalogSource, LoadState, SessionSettings, SubmitError};
pub use slots::{generate, generate_with_step, SLOT_STEP_MINUTES};
pub use submitter::{BookingConfirmation, BookingError, BookingPayload, BookingSubmitter};
pub use window::{format_time, BookableSlot, BusinessZone, CalendarDay, OpenWindow, WindowError};
