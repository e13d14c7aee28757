use chrono::{Local, NaiveDate, NaiveTime};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::error::PortalError;

use crate::models::{AvailabilitySummary, DayBucket, Slot, SlotDraft, WindowAvailability};
use crate::services::availability::AvailabilityBackend;
use crate::services::bucketing::SlotBuckets;
use crate::services::validation::validate_draft;
use crate::services::window::{NavDirection, ViewMode, ViewWindow};

pub const SLOT_SAVED_MESSAGE: &str = "Availability saved";
pub const SLOT_DELETED_MESSAGE: &str = "Availability deleted";

/// Source of "today" for the past-date check, in the client's local time.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Issued when a window load starts; the response is only applied if the
/// calendar still shows that window when it arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    window: ViewWindow,
}

impl LoadTicket {
    pub fn window(&self) -> ViewWindow {
        self.window
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    /// The user navigated away before the response arrived.
    Stale,
}

/// View-model behind the provider availability calendar.
pub struct AvailabilityCalendar<B: AvailabilityBackend> {
    backend: B,
    clock: Box<dyn Clock>,
    fallback_error: String,
    window: ViewWindow,
    buckets: SlotBuckets,
    summary: AvailabilitySummary,
    server_summary: Option<AvailabilitySummary>,
    in_flight: usize,
    error: Option<String>,
    notice: Option<String>,
}

impl<B: AvailabilityBackend> AvailabilityCalendar<B> {
    pub fn new(backend: B, config: &AppConfig, reference: NaiveDate, mode: ViewMode) -> Self {
        Self {
            backend,
            clock: Box::new(SystemClock),
            fallback_error: config.fallback_error_message.clone(),
            window: ViewWindow::new(reference, mode),
            buckets: SlotBuckets::default(),
            summary: AvailabilitySummary::default(),
            server_summary: None,
            in_flight: 0,
            error: None,
            notice: None,
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    // ------------------------------------------------------------------
    // Rendering state
    // ------------------------------------------------------------------

    pub fn window(&self) -> ViewWindow {
        self.window
    }

    pub fn mode(&self) -> ViewMode {
        self.window.mode()
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.window.reference()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.window.dates()
    }

    pub fn day_buckets(&self) -> Vec<DayBucket> {
        self.buckets.buckets_for_window(&self.window)
    }

    pub fn slots_for_date(&self, date: NaiveDate) -> &[Slot] {
        self.buckets.slots_for_date(date)
    }

    pub fn slots_at(&self, date: NaiveDate, start: NaiveTime) -> Vec<&Slot> {
        self.buckets.slots_at(date, start)
    }

    pub fn find_slot(&self, slot_id: Uuid) -> Option<&Slot> {
        self.buckets.find(slot_id)
    }

    /// Counts of the slots currently displayed.
    pub fn summary(&self) -> AvailabilitySummary {
        self.summary
    }

    /// What the server claimed in its last applied response, kept for diagnostics.
    pub fn server_summary(&self) -> Option<AvailabilitySummary> {
        self.server_summary
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn dismiss_messages(&mut self) {
        self.error = None;
        self.notice = None;
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    /// Moves the window without loading; pair with [`AvailabilityCalendar::reload`].
    pub fn shift_window(&mut self, direction: NavDirection) {
        self.window = self.window.shifted(direction);
    }

    pub fn set_reference(&mut self, reference: NaiveDate) {
        self.window = ViewWindow::new(reference, self.window.mode());
    }

    pub fn set_mode(&mut self, mode: ViewMode) {
        self.window = self.window.with_mode(mode);
    }

    pub async fn navigate(&mut self, direction: NavDirection) -> Result<LoadOutcome, PortalError> {
        self.shift_window(direction);
        self.reload().await
    }

    pub async fn go_to(&mut self, reference: NaiveDate) -> Result<LoadOutcome, PortalError> {
        self.set_reference(reference);
        self.reload().await
    }

    pub async fn go_to_today(&mut self) -> Result<LoadOutcome, PortalError> {
        let today = self.clock.today();
        self.go_to(today).await
    }

    pub async fn switch_mode(&mut self, mode: ViewMode) -> Result<LoadOutcome, PortalError> {
        self.set_mode(mode);
        self.reload().await
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    /// Marks a load for the current window as in flight. Does not block other
    /// loads from starting.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.in_flight += 1;
        LoadTicket {
            window: self.window,
        }
    }

    /// Applies a response if its window is still current, replacing slots and
    /// summary wholesale.
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<WindowAvailability, PortalError>,
    ) -> Result<LoadOutcome, PortalError> {
        self.in_flight = self.in_flight.saturating_sub(1);

        if !ticket.window.same_range(&self.window) {
            debug!(
                "Dropping stale availability for {} to {}",
                ticket.window.start_date(),
                ticket.window.end_date()
            );
            return Ok(LoadOutcome::Stale);
        }

        match result {
            Ok(data) => {
                self.buckets = SlotBuckets::from_days(data.availability);
                self.summary = self.buckets.summary();
                self.server_summary = data.availability_summary;
                self.error = None;

                if let Some(reported) = self.server_summary {
                    if reported != self.summary {
                        warn!(
                            "Server summary {:?} disagrees with displayed slots {:?}",
                            reported, self.summary
                        );
                    }
                }

                Ok(LoadOutcome::Applied)
            }
            Err(e) => {
                error!("Failed to load availability: {}", e);
                self.buckets.clear();
                self.summary = AvailabilitySummary::default();
                self.server_summary = None;
                self.error = Some(e.user_message(&self.fallback_error));
                Err(e)
            }
        }
    }

    pub async fn reload(&mut self) -> Result<LoadOutcome, PortalError> {
        let ticket = self.begin_load();
        let result = self.backend.fetch_window(ticket.window()).await;
        self.complete_load(ticket, result)
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    pub async fn create_slot(&mut self, draft: SlotDraft) -> Result<(), PortalError> {
        self.check_draft(&draft)?;
        let result = self.backend.create_slot(draft).await;
        self.finish_mutation(result, SLOT_SAVED_MESSAGE).await
    }

    pub async fn update_slot(&mut self, slot_id: Uuid, draft: SlotDraft) -> Result<(), PortalError> {
        self.check_draft(&draft)?;
        let result = self.backend.update_slot(slot_id, draft).await;
        self.finish_mutation(result, SLOT_SAVED_MESSAGE).await
    }

    pub async fn delete_slot(&mut self, slot_id: Uuid) -> Result<(), PortalError> {
        let result = self.backend.delete_slot(slot_id).await;
        self.finish_mutation(result, SLOT_DELETED_MESSAGE).await
    }

    fn check_draft(&mut self, draft: &SlotDraft) -> Result<(), PortalError> {
        if let Err(e) = validate_draft(draft, self.clock.today()) {
            debug!("Draft rejected locally: {}", e);
            self.error = Some(e.user_message(&self.fallback_error));
            return Err(e);
        }
        Ok(())
    }

    /// On success, throws away every held slot and reloads the window. The
    /// mutation counts as done even if that reload fails; the reload error is
    /// left in `error` next to the notice. On failure, shows the message and
    /// leaves the calendar as it was.
    async fn finish_mutation(
        &mut self,
        result: Result<Option<String>, PortalError>,
        default_notice: &str,
    ) -> Result<(), PortalError> {
        match result {
            Ok(message) => {
                info!("Availability mutation accepted, reloading window");
                self.notice = Some(message.unwrap_or_else(|| default_notice.to_string()));
                self.error = None;
                self.buckets.clear();
                self.summary = AvailabilitySummary::default();
                self.server_summary = None;
                if let Err(e) = self.reload().await {
                    warn!("Change saved but the window could not be reloaded: {}", e);
                }
                Ok(())
            }
            Err(e) => {
                error!("Availability mutation failed: {}", e);
                self.error = Some(e.user_message(&self.fallback_error));
                Err(e)
            }
        }
    }
}
