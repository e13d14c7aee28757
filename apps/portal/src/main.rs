use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::{Local, NaiveDate};
use dotenv::dotenv;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use appointment_cell::{AppointmentService, SlotFinder, SlotSearchFilters};
use auth_cell::{AuthService, LoginRequest};
use availability_cell::{AvailabilityCalendar, AvailabilityService, ViewMode};
use shared_api_client::{FileSessionStore, PortalClient, SessionContext};
use shared_config::AppConfig;
use shared_models::auth::UserRole;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,reqwest=warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting care portal client");

    let config = AppConfig::from_env();
    if !config.is_configured() {
        bail!("PORTAL_API_URL is not set");
    }

    let store = Arc::new(FileSessionStore::new(config.session_file.clone()));
    let session = Arc::new(SessionContext::load(store).await?);
    let client = Arc::new(PortalClient::new(&config, session)?);
    let auth = AuthService::new(client.clone());

    let user = match auth.current_user().await {
        Some(user) => {
            info!("Resuming session for {}", user.email);
            user
        }
        None => login_from_env(&auth).await?,
    };

    let (reference, mode) = parse_args(std::env::args().skip(1))?;

    match user.role {
        UserRole::Provider => {
            let mut calendar = AvailabilityCalendar::new(
                AvailabilityService::new(client),
                &config,
                reference,
                mode,
            );
            if let Err(e) = calendar.reload().await {
                warn!("Could not load availability: {}", e);
            }

            let window = calendar.window();
            info!("{:?} view {} to {}", mode, window.start_date(), window.end_date());
            for day in calendar.day_buckets() {
                info!("{}: {} slots", day.date.format("%a %Y-%m-%d"), day.slots.len());
            }
            let summary = calendar.summary();
            info!(
                "Total {} | available {} | booked {} | cancelled {}",
                summary.total, summary.available, summary.booked, summary.cancelled
            );
            if let Some(message) = calendar.error() {
                warn!("{}", message);
            }
        }
        UserRole::Patient => {
            let mut finder = SlotFinder::new(AppointmentService::new(client), &config);
            match finder.search(SlotSearchFilters::on_date(reference)).await {
                Ok(count) => info!("{} open slots on {}", count, reference),
                Err(e) => warn!("Search failed: {}", e),
            }
            for entry in finder.results() {
                info!(
                    "{} ({}): {} slots",
                    entry.provider.full_name(),
                    entry.provider.specialty.as_deref().unwrap_or("general"),
                    entry.available_slots.len()
                );
            }
        }
    }

    Ok(())
}

async fn login_from_env(auth: &AuthService) -> anyhow::Result<shared_models::auth::User> {
    let email = std::env::var("PORTAL_EMAIL").context("no stored session and PORTAL_EMAIL is not set")?;
    let password = std::env::var("PORTAL_PASSWORD").context("PORTAL_PASSWORD is not set")?;
    let role = match std::env::var("PORTAL_ROLE").as_deref() {
        Ok("patient") => UserRole::Patient,
        Ok("provider") | Err(_) => UserRole::Provider,
        Ok(other) => bail!("unknown PORTAL_ROLE '{}'", other),
    };

    let user = auth.login(role, LoginRequest { email, password }).await?;
    info!("Signed in as {} ({})", user.display_name(), user.role);
    Ok(user)
}

/// `care-portal [YYYY-MM-DD] [day|week|month]`
fn parse_args(mut args: impl Iterator<Item = String>) -> anyhow::Result<(NaiveDate, ViewMode)> {
    let reference = match args.next() {
        Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .with_context(|| format!("invalid reference date '{}'", raw))?,
        None => Local::now().date_naive(),
    };
    let mode = match args.next().as_deref() {
        None | Some("week") => ViewMode::Week,
        Some("day") => ViewMode::Day,
        Some("month") => ViewMode::Month,
        Some(other) => bail!("unknown view mode '{}'", other),
    };
    Ok((reference, mode))
}
