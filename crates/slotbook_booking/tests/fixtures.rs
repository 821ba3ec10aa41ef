//! Test fixtures for booking integration tests
//!
//! Config, windows and catalog bodies shared by the HTTP backend and
//! booking flow tests.

#![allow(dead_code)]

use chrono::DateTime;
use chrono_tz::Tz;
use serde_json::{json, Value};
use slotbook_booking::{BusinessZone, CalendarDay, ContactInfo, OpenWindow};
use slotbook_config::{
    AppConfig, BackendConfig, BookingConfig, IdentityConfig, LoggingConfig, SuccessPolicy,
};

pub const API_KEY: &str = "test-api-key";
pub const DEVICE: &str = "device-under-test";

/// Config pointing at a mock server
pub fn create_test_config(base_url: &str) -> AppConfig {
    AppConfig {
        backend: BackendConfig {
            base_url: base_url.to_string(),
            api_key: Some(API_KEY.to_string()),
            api_key_header: "X-API-KEY".to_string(),
            identity_header: "Fingerprint".to_string(),
            timeout_secs: 5,
        },
        booking: BookingConfig {
            on_success: SuccessPolicy::ResetInPlace,
            ..BookingConfig::default()
        },
        identity: IdentityConfig::default(),
        logging: LoggingConfig::default(),
    }
}

pub fn zone() -> BusinessZone {
    BusinessZone::default()
}

pub fn tomorrow() -> CalendarDay {
    zone().today().succ().unwrap()
}

pub fn at(day: CalendarDay, hour: u32, minute: u32) -> DateTime<Tz> {
    zone().at(day, hour, minute).unwrap()
}

pub fn window(day: CalendarDay, from: (u32, u32), to: (u32, u32)) -> OpenWindow {
    OpenWindow::new(zone(), at(day, from.0, from.1), at(day, to.0, to.1), None).unwrap()
}

/// `GET /` body for the given windows
pub fn windows_body(windows: &[OpenWindow]) -> Value {
    let terminy: Vec<Value> = windows
        .iter()
        .map(|w| {
            json!({
                "start": w.start().to_rfc3339(),
                "end": w.end().to_rfc3339(),
            })
        })
        .collect();
    json!({ "terminy": terminy })
}

pub fn catalog_body() -> Value {
    json!([
        { "name": "Pánský střih", "duration": 30 },
        { "name": "Střih a vousy", "duration": 60 },
        { "name": "Dětský střih", "duration": 30 }
    ])
}

pub fn contact() -> ContactInfo {
    ContactInfo::new("Jana Nováková", "jana@example.cz")
}
