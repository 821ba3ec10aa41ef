// --- File: crates/slotbook_booking/src/availability.rs ---
use crate::window::{CalendarDay, OpenWindow};
use std::collections::BTreeSet;

/// Distinct zone-local days on which at least one window starts.
///
/// This only drives which days the date picker enables. A day whose windows
/// are too short for every service is still listed; reporting "no times" for
/// a service is the slot generator's job.
pub fn available_dates(windows: &[OpenWindow]) -> BTreeSet<CalendarDay> {
    windows.iter().map(OpenWindow::day).collect()
}

/// Earliest available day, used to preselect the calendar month.
pub fn first_available(windows: &[OpenWindow]) -> Option<CalendarDay> {
    windows.iter().map(OpenWindow::day).min()
}
