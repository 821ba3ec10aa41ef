// --- File: crates/services/slotbook_terminal/src/main.rs ---

use clap::{Parser, Subcommand};
use slotbook_booking::{
    first_available, format_time, BookingSession, CalendarDay, CancelOutcome, CancelRequest, ContactInfo,
    DeviceIdentity, FileIdentityStore, HostFingerprint, HttpBackend, IdentityProvider, LoadState,
    MemoryIdentityStore, SessionSettings,
};
use slotbook_common::{init_from_config, log_result, SlotbookError};
use slotbook_config::{load_config, AppConfig};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Parser)]
#[command(name = "slotbook")]
#[command(about = "Browse open appointment times and book one")]
struct Cli {
    /// Overrides `[logging] level` from the config files
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Dates with at least one open window
    Dates,
    /// Bookable services and their durations
    Services,
    /// Start times for a service on a date
    Times {
        #[arg(long)]
        date: CalendarDay,
        #[arg(long)]
        service: String,
    },
    /// Book a start time
    Book {
        #[arg(long)]
        date: CalendarDay,
        #[arg(long)]
        service: String,
        /// Local start time, HH:MM
        #[arg(long)]
        time: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },
    /// Cancel a booking, either from a cancel link query or by id and email
    Cancel {
        #[arg(long, conflicts_with_all = ["event_id", "email"])]
        link: Option<String>,
        #[arg(long, requires = "email")]
        event_id: Option<String>,
        #[arg(long, requires = "event_id")]
        email: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), SlotbookError> {
    let mut config = load_config()?;
    if let Some(level) = cli.log_level {
        config.logging.level = Some(level);
    }
    // Dropping the guard stops the file writer
    let _guard = init_from_config(&config.logging);

    let identity = resolve_identity(&config)?;
    let backend = Arc::new(HttpBackend::new(&config)?);
    let settings = SessionSettings::from_config(&config)?;
    let mut session = BookingSession::new(backend, identity, settings);

    if let Commands::Cancel {
        link,
        event_id,
        email,
    } = &cli.command
    {
        let request = match (link, event_id, email) {
            (Some(link), _, _) => CancelRequest::from_query(link),
            (None, Some(event_id), Some(email)) => Some(CancelRequest {
                event_id: event_id.clone(),
                email: email.clone(),
            }),
            _ => None,
        };
        return cancel(&session, request).await;
    }

    session.load().await;
    ensure_loaded(&mut session)?;

    match cli.command {
        Commands::Dates => {
            match first_available(session.state().windows()) {
                Some(first) => println!("First available: {}", first.display()),
                None => println!("No open dates."),
            }
            for date in session.state().available_dates() {
                println!("{}  ({})", date.display(), date);
            }
        }
        Commands::Services => {
            for option in session.catalog().options() {
                println!("{} ({} min)", option.name(), option.duration_minutes());
            }
        }
        Commands::Times { date, service } => {
            session.choose_date(date)?;
            session.choose_service(&service)?;
            let slots = session.state().current_slots();
            if slots.is_empty() {
                println!("No free times for {} on {}.", service, date.display());
            }
            for slot in slots {
                println!("{}", format_time(&slot.start()));
            }
        }
        Commands::Book {
            date,
            service,
            time,
            name,
            email,
        } => {
            let (hour, minute) = parse_clock(&time)?;
            let start = session.state().zone().at(date, hour, minute).ok_or_else(|| {
                SlotbookError::ValidationError(format!("{time} does not exist on {date}"))
            })?;
            session.choose_date(date)?;
            session.choose_service(&service)?;
            session.choose_time_at(start)?;
            if let Some(summary) = session.state().summary() {
                println!(
                    "Booking {} on {} at {}...",
                    summary.service, summary.date, summary.time
                );
            }

            let confirmation = log_result(
                session.submit(ContactInfo::new(name, email)).await,
                "Booking confirmed",
                "Booking failed",
            )?;
            match confirmation.event_id {
                Some(event_id) => println!("Booked. Reference: {event_id}"),
                None => println!("Booked."),
            }
            if let Some(target) = session.take_redirect() {
                println!("Continue at {target}");
            }
        }
        Commands::Cancel { .. } => {}
    }
    Ok(())
}

async fn cancel(
    session: &BookingSession<HttpBackend>,
    request: Option<CancelRequest>,
) -> Result<(), SlotbookError> {
    match session.cancel(request).await {
        CancelOutcome::Cancelled => {
            println!("Booking cancelled.");
            Ok(())
        }
        CancelOutcome::Failed { reason } => Err(SlotbookError::ExternalServiceError {
            service_name: "booking backend".to_string(),
            message: reason,
        }),
        CancelOutcome::Invalid => Err(SlotbookError::ValidationError(
            "a cancel link needs both event_id and email".to_string(),
        )),
    }
}

fn resolve_identity(config: &AppConfig) -> Result<DeviceIdentity, SlotbookError> {
    let identity = match config.identity.store_path.as_deref() {
        Some(path) => {
            debug!("Device identity cached at {}", path);
            IdentityProvider::new(FileIdentityStore::new(path), HostFingerprint).resolve()?
        }
        None => IdentityProvider::new(MemoryIdentityStore::new(), HostFingerprint).resolve()?,
    };
    Ok(identity)
}

/// Fails on a windows or catalog load error, following a pending redirect first.
fn ensure_loaded(session: &mut BookingSession<HttpBackend>) -> Result<(), SlotbookError> {
    if let Some(target) = session.take_redirect() {
        info!("Redirected to {}", target);
        return Err(SlotbookError::RateLimitError(format!(
            "this device is temporarily blocked, see {target}"
        )));
    }
    for state in [session.windows_state(), session.catalog_state()] {
        if let LoadState::Failed(e) = state {
            return Err(e.clone().into());
        }
    }
    Ok(())
}

fn parse_clock(raw: &str) -> Result<(u32, u32), SlotbookError> {
    let invalid = || SlotbookError::ValidationError(format!("expected HH:MM, got {raw}"));
    let (hour, minute) = raw.trim().split_once(':').ok_or_else(invalid)?;
    let hour: u32 = hour.parse().map_err(|_| invalid())?;
    let minute: u32 = minute.parse().map_err(|_| invalid())?;
    if hour > 23 || minute > 59 {
        return Err(invalid());
    }
    Ok((hour, minute))
}
