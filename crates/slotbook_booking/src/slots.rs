// --- File: crates/slotbook_booking/src/slots.rs ---
use crate::window::{BookableSlot, CalendarDay, OpenWindow};
use chrono::Duration;
use tracing::debug;

/// Distance between consecutive candidate starts inside one window.
pub const SLOT_STEP_MINUTES: i64 = 30;

/// Derives the bookable slots of `date` for a service lasting `duration_minutes`.
///
/// Every window whose zone-local start day is `date` is walked from its start
/// in steps of [`SLOT_STEP_MINUTES`]; a slot `[t, t + duration)` is emitted as
/// long as it still ends inside the window. The step does not depend on the
/// duration, so a 60 minute service in a 09:00-11:00 window yields 09:00,
/// 09:30 and 10:00.
///
/// Windows shorter than the duration produce nothing. The result is sorted by
/// start instant.
pub fn generate(
    windows: &[OpenWindow],
    date: CalendarDay,
    duration_minutes: i64,
) -> Vec<BookableSlot> {
    generate_with_step(
        windows,
        date,
        duration_minutes,
        Duration::minutes(SLOT_STEP_MINUTES),
    )
}

/// [`generate`] with an explicit step between candidate starts.
pub fn generate_with_step(
    windows: &[OpenWindow],
    date: CalendarDay,
    duration_minutes: i64,
    step: Duration,
) -> Vec<BookableSlot> {
    if duration_minutes <= 0 || step <= Duration::zero() {
        return Vec::new();
    }
    let Some(duration) = Duration::try_minutes(duration_minutes) else {
        return Vec::new();
    };

    let mut slots = Vec::new();
    for window in windows.iter().filter(|w| w.day() == date) {
        let mut current = window.start();
        loop {
            let slot_end = match current.checked_add_signed(duration) {
                Some(t) => t,
                None => break,
            };
            if slot_end > window.end() {
                break;
            }
            slots.push(BookableSlot::from_window(window, current, slot_end));
            current = match current.checked_add_signed(step) {
                Some(t) => t,
                None => break,
            };
        }
    }

    // stable: equal starts keep window order
    slots.sort_by(|a, b| a.start().cmp(&b.start()));
    debug!(
        "Generated {} slots for {} ({} min, step {} min)",
        slots.len(),
        date,
        duration_minutes,
        step.num_minutes()
    );
    slots
}
