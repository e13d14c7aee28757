use tracing::{error, info, warn};
use uuid::Uuid;

use availability_cell::models::Slot;
use availability_cell::services::calendar::{Clock, SystemClock};
use shared_config::AppConfig;
use shared_models::error::PortalError;

use crate::models::{BookingRequest, ProviderAvailability, SlotSearchFilters};
use crate::services::booking::BookingBackend;

pub const SLOT_NOT_LISTED_MESSAGE: &str = "The selected slot is no longer listed";
pub const SLOT_UNAVAILABLE_MESSAGE: &str = "This slot is no longer available";
pub const SLOT_IN_PAST_MESSAGE: &str = "Cannot book a slot in the past";
pub const BOOKED_MESSAGE: &str = "Appointment booked";

/// Patient-facing search results plus the booking action on them.
pub struct SlotFinder<B: BookingBackend> {
    backend: B,
    fallback_error: String,
    clock: Box<dyn Clock>,
    filters: Option<SlotSearchFilters>,
    results: Vec<ProviderAvailability>,
    loading: bool,
    error: Option<String>,
    notice: Option<String>,
}

impl<B: BookingBackend> SlotFinder<B> {
    pub fn new(backend: B, config: &AppConfig) -> Self {
        Self {
            backend,
            fallback_error: config.fallback_error_message.clone(),
            clock: Box::new(SystemClock),
            filters: None,
            results: Vec::new(),
            loading: false,
            error: None,
            notice: None,
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn results(&self) -> &[ProviderAvailability] {
        &self.results
    }

    pub fn filters(&self) -> Option<&SlotSearchFilters> {
        self.filters.as_ref()
    }

    pub fn total_slots(&self) -> usize {
        self.results.iter().map(|r| r.available_slots.len()).sum()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    fn find_slot(&self, provider_id: Uuid, slot_id: Uuid) -> Option<&Slot> {
        self.results
            .iter()
            .filter(|r| r.provider.id == provider_id)
            .flat_map(|r| r.available_slots.iter())
            .find(|slot| slot.id == slot_id)
    }

    /// Runs a search and replaces the results wholesale. Returns the number of
    /// matching slots.
    pub async fn search(&mut self, filters: SlotSearchFilters) -> Result<usize, PortalError> {
        self.filters = Some(filters.clone());
        self.loading = true;
        let result = self.backend.search(filters).await;
        self.loading = false;

        match result {
            Ok(results) => {
                self.results = results;
                self.error = None;
                Ok(self.total_slots())
            }
            Err(e) => {
                error!("Availability search failed: {}", e);
                self.error = Some(e.user_message(&self.fallback_error));
                Err(e)
            }
        }
    }

    /// Books a listed slot, then re-runs the last search so the booked slot
    /// disappears only if the server says so. A failed re-search does not undo
    /// the booking; it only sets `error`.
    pub async fn book(
        &mut self,
        provider_id: Uuid,
        slot_id: Uuid,
        reason: Option<String>,
    ) -> Result<(), PortalError> {
        let checked = self
            .check_bookable(provider_id, slot_id)
            .map(|slot| BookingRequest::for_slot(provider_id, slot));
        let mut request = match checked {
            Ok(request) => request,
            Err(e) => {
                self.error = Some(e.user_message(&self.fallback_error));
                return Err(e);
            }
        };
        request.reason = reason;

        match self.backend.book(request).await {
            Ok(message) => {
                info!("Booked slot {}", slot_id);
                self.notice = Some(message.unwrap_or_else(|| BOOKED_MESSAGE.to_string()));
                self.error = None;
                if let Some(filters) = self.filters.clone() {
                    if let Err(e) = self.search(filters).await {
                        warn!("Booking confirmed but the search could not be refreshed: {}", e);
                    }
                }
                Ok(())
            }
            Err(e) => {
                error!("Booking failed: {}", e);
                self.error = Some(e.user_message(&self.fallback_error));
                Err(e)
            }
        }
    }

    fn check_bookable(&self, provider_id: Uuid, slot_id: Uuid) -> Result<&Slot, PortalError> {
        let slot = self
            .find_slot(provider_id, slot_id)
            .ok_or_else(|| PortalError::Validation(SLOT_NOT_LISTED_MESSAGE.to_string()))?;

        if !slot.is_bookable() {
            return Err(PortalError::Validation(SLOT_UNAVAILABLE_MESSAGE.to_string()));
        }
        if slot.date < self.clock.today() {
            return Err(PortalError::Validation(SLOT_IN_PAST_MESSAGE.to_string()));
        }
        Ok(slot)
    }
}
