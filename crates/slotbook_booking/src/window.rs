// --- File: crates/slotbook_booking/src/window.rs ---
//! Time model shared by every derivation in this crate.
//!
//! Instants are always held in the business time zone, never in the zone of
//! whoever happens to run the code. Calendar days are zone-local dates.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WindowError {
    #[error("Unknown time zone: {0}")]
    UnknownTimeZone(String),
    #[error("Failed to parse time: {0}")]
    TimeParseError(String),
    #[error("Invalid calendar day (expected YYYY-MM-DD): {0}")]
    InvalidDay(String),
    #[error("Window ends before it starts: {start} - {end}")]
    InvertedWindow { start: String, end: String },
}

/// The business's fixed reference time zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusinessZone(Tz);

impl Default for BusinessZone {
    fn default() -> Self {
        BusinessZone(Tz::Europe__Prague)
    }
}

impl BusinessZone {
    pub fn new(tz: Tz) -> Self {
        Self(tz)
    }

    /// Resolves an IANA zone name such as "Europe/Prague".
    pub fn from_name(name: &str) -> Result<Self, WindowError> {
        Tz::from_str(name)
            .map(Self)
            .map_err(|_| WindowError::UnknownTimeZone(name.to_string()))
    }

    pub fn tz(&self) -> Tz {
        self.0
    }

    pub fn now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.0)
    }

    pub fn today(&self) -> CalendarDay {
        self.day_of(&self.now())
    }

    /// Re-expresses any instant in the business zone.
    pub fn localize<Z: TimeZone>(&self, instant: &DateTime<Z>) -> DateTime<Tz> {
        instant.with_timezone(&self.0)
    }

    /// Zone-local calendar day of an instant.
    pub fn day_of<Z: TimeZone>(&self, instant: &DateTime<Z>) -> CalendarDay {
        CalendarDay(instant.with_timezone(&self.0).date_naive())
    }

    /// Local wall-clock time on `day`, resolved to the earlier instant when a
    /// DST fold makes it ambiguous. `None` inside a DST gap.
    pub fn at(&self, day: CalendarDay, hour: u32, minute: u32) -> Option<DateTime<Tz>> {
        let naive = day.0.and_hms_opt(hour, minute, 0)?;
        self.0.from_local_datetime(&naive).earliest()
    }

    /// Parses an ISO-8601 instant.
    ///
    /// Strings with an offset (`Z`, `+01:00`) are converted into the zone;
    /// strings without one are read as wall-clock time in the zone.
    pub fn parse_instant(&self, raw: &str) -> Result<DateTime<Tz>, WindowError> {
        let raw = raw.trim();
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Ok(parsed.with_timezone(&self.0));
        }
        let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M"))
            .map_err(|e| WindowError::TimeParseError(format!("{raw}: {e}")))?;
        self.0
            .from_local_datetime(&naive)
            .earliest()
            .ok_or_else(|| WindowError::TimeParseError(format!("{raw}: not a valid local time")))
    }
}

/// A zone-local calendar date, rendered as `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDay(NaiveDate);

impl CalendarDay {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    pub fn succ(&self) -> Option<Self> {
        self.0.succ_opt().map(Self)
    }

    /// Human format used in the booking summary, e.g. `05.03.2025`.
    pub fn display(&self) -> String {
        self.0.format("%d.%m.%Y").to_string()
    }
}

impl fmt::Display for CalendarDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for CalendarDay {
    type Err = WindowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Self)
            .map_err(|_| WindowError::InvalidDay(s.to_string()))
    }
}

/// A contiguous span during which appointments may be booked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenWindow {
    start: DateTime<Tz>,
    end: DateTime<Tz>,
    source_id: Option<String>,
}

impl OpenWindow {
    /// Builds a window with both instants moved into `zone`.
    pub fn new<Z: TimeZone>(
        zone: BusinessZone,
        start: DateTime<Z>,
        end: DateTime<Z>,
        source_id: Option<String>,
    ) -> Result<Self, WindowError> {
        let start = zone.localize(&start);
        let end = zone.localize(&end);
        if end < start {
            return Err(WindowError::InvertedWindow {
                start: start.to_rfc3339(),
                end: end.to_rfc3339(),
            });
        }
        Ok(Self {
            start,
            end,
            source_id,
        })
    }

    /// Parses a window from its wire representation.
    pub fn parse(
        zone: BusinessZone,
        start: &str,
        end: &str,
        source_id: Option<String>,
    ) -> Result<Self, WindowError> {
        let start = zone.parse_instant(start)?;
        let end = zone.parse_instant(end)?;
        Self::new(zone, start, end, source_id)
    }

    pub fn start(&self) -> DateTime<Tz> {
        self.start
    }

    pub fn end(&self) -> DateTime<Tz> {
        self.end
    }

    pub fn source_id(&self) -> Option<&str> {
        self.source_id.as_deref()
    }

    pub fn length(&self) -> Duration {
        self.end - self.start
    }

    /// Zone-local day of the window's start.
    pub fn day(&self) -> CalendarDay {
        CalendarDay(self.start.date_naive())
    }

    /// True when `slot` lies entirely inside this window and shares its source.
    pub fn contains(&self, slot: &BookableSlot) -> bool {
        self.start <= slot.start
            && slot.end <= self.end
            && self.source_id.as_deref() == slot.source_id.as_deref()
    }
}

/// A concrete, duration-aligned appointment candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookableSlot {
    start: DateTime<Tz>,
    end: DateTime<Tz>,
    source_id: Option<String>,
}

impl BookableSlot {
    pub(crate) fn from_window(window: &OpenWindow, start: DateTime<Tz>, end: DateTime<Tz>) -> Self {
        Self {
            start,
            end,
            source_id: window.source_id.clone(),
        }
    }

    pub fn start(&self) -> DateTime<Tz> {
        self.start
    }

    pub fn end(&self) -> DateTime<Tz> {
        self.end
    }

    pub fn source_id(&self) -> Option<&str> {
        self.source_id.as_deref()
    }

    pub fn length(&self) -> Duration {
        self.end - self.start
    }

    /// Same start and end, regardless of which window produced it.
    pub fn same_span(&self, other: &BookableSlot) -> bool {
        self.start == other.start && self.end == other.end
    }
}

/// Windows that start at or after `now`; everything else is in the past.
pub fn upcoming(windows: Vec<OpenWindow>, now: DateTime<Tz>) -> Vec<OpenWindow> {
    windows.into_iter().filter(|w| w.start >= now).collect()
}

/// `HH:MM` in the instant's own zone.
pub fn format_time(instant: &DateTime<Tz>) -> String {
    instant.format("%H:%M").to_string()
}
