// --- File: crates/slotbook_booking/src/catalog.rs ---
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::warn;

/// A bookable service with a fixed duration, keyed by its name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceOption {
    name: String,
    duration_minutes: i64,
}

impl ServiceOption {
    /// `None` for an empty name, a non-positive duration or one too long
    /// to represent as a time span.
    pub fn new(name: impl Into<String>, duration_minutes: i64) -> Option<Self> {
        let name = name.into();
        if name.trim().is_empty() || duration_minutes <= 0 {
            return None;
        }
        Duration::try_minutes(duration_minutes)?;
        Some(Self {
            name,
            duration_minutes,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn duration_minutes(&self) -> i64 {
        self.duration_minutes
    }
}

/// Catalog entry as served: `{ "name": "...", "duration": 30 }`.
#[derive(Debug, Deserialize)]
struct CatalogEntry {
    name: String,
    duration: f64,
}

/// The static list of services, loaded once per session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceCatalog {
    options: Vec<ServiceOption>,
}

impl ServiceCatalog {
    /// Builds a catalog, dropping invalid entries and later duplicates of a name.
    pub fn from_options(options: impl IntoIterator<Item = ServiceOption>) -> Self {
        let mut seen = HashSet::new();
        let options = options
            .into_iter()
            .filter(|option| {
                let fresh = seen.insert(option.name.clone());
                if !fresh {
                    warn!("Duplicate service '{}' ignored", option.name);
                }
                fresh
            })
            .collect();
        Self { options }
    }

    /// Parses the catalog JSON array.
    pub fn parse(body: &str) -> Result<Self, serde_json::Error> {
        let entries: Vec<CatalogEntry> = serde_json::from_str(body)?;
        let options = entries.into_iter().filter_map(|entry| {
            let whole = entry.duration.fract() == 0.0 && entry.duration.is_finite();
            let option = if whole {
                ServiceOption::new(entry.name.clone(), entry.duration as i64)
            } else {
                None
            };
            if option.is_none() {
                warn!(
                    "Skipping service '{}' with unusable duration {}",
                    entry.name, entry.duration
                );
            }
            option
        });
        Ok(Self::from_options(options))
    }

    pub fn find(&self, name: &str) -> Option<&ServiceOption> {
        self.options.iter().find(|option| option.name == name)
    }

    pub fn options(&self) -> &[ServiceOption] {
        &self.options
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}
