// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use shared_api_client::PortalClient;
use shared_models::error::PortalError;

use crate::models::{BookingRequest, ProviderAvailability, SearchResults, SlotSearchFilters};

/// Server operations behind patient search and booking.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookingBackend: Send + Sync {
    async fn search(&self, filters: SlotSearchFilters) -> Result<Vec<ProviderAvailability>, PortalError>;

    /// Returns the server's optional confirmation message.
    async fn book(&self, request: BookingRequest) -> Result<Option<String>, PortalError>;
}

pub struct AppointmentService {
    client: Arc<PortalClient>,
}

impl AppointmentService {
    pub fn new(client: Arc<PortalClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BookingBackend for AppointmentService {
    async fn search(&self, filters: SlotSearchFilters) -> Result<Vec<ProviderAvailability>, PortalError> {
        debug!("Searching availability with {:?}", filters);

        let results: SearchResults = self
            .client
            .get("/availability/search", &filters.to_query_pairs())
            .await?
            .require_data()?;

        debug!("Search returned {} providers", results.results.len());
        Ok(results.results)
    }

    async fn book(&self, request: BookingRequest) -> Result<Option<String>, PortalError> {
        debug!(
            "Booking slot {} with provider {}",
            request.slot_id, request.provider_id
        );

        let envelope = self
            .client
            .post::<Value>("/appointments", serde_json::to_value(&request)?)
            .await?;
        Ok(envelope.message)
    }
}
