use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use shared_api_client::PortalClient;
use shared_models::error::PortalError;

use crate::models::{SlotDraft, WindowAvailability};
use crate::services::window::ViewWindow;

/// Server operations the availability calendar depends on.
///
/// Mutations return the server's optional confirmation message.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AvailabilityBackend: Send + Sync {
    async fn fetch_window(&self, window: ViewWindow) -> Result<WindowAvailability, PortalError>;

    async fn create_slot(&self, draft: SlotDraft) -> Result<Option<String>, PortalError>;

    async fn update_slot(&self, slot_id: Uuid, draft: SlotDraft) -> Result<Option<String>, PortalError>;

    async fn delete_slot(&self, slot_id: Uuid) -> Result<Option<String>, PortalError>;
}

pub struct AvailabilityService {
    client: Arc<PortalClient>,
}

impl AvailabilityService {
    pub fn new(client: Arc<PortalClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AvailabilityBackend for AvailabilityService {
    async fn fetch_window(&self, window: ViewWindow) -> Result<WindowAvailability, PortalError> {
        debug!(
            "Fetching availability {} to {}",
            window.start_date(),
            window.end_date()
        );

        self.client
            .get::<WindowAvailability>("/availability", &window.query_params())
            .await?
            .require_data()
    }

    async fn create_slot(&self, draft: SlotDraft) -> Result<Option<String>, PortalError> {
        debug!("Creating availability slot on {}", draft.date);

        let envelope = self
            .client
            .post::<Value>("/availability", serde_json::to_value(&draft)?)
            .await?;
        Ok(envelope.message)
    }

    async fn update_slot(&self, slot_id: Uuid, draft: SlotDraft) -> Result<Option<String>, PortalError> {
        debug!("Updating availability slot {}", slot_id);

        let path = format!("/availability/{}", slot_id);
        let envelope = self
            .client
            .put::<Value>(&path, serde_json::to_value(&draft)?)
            .await?;
        Ok(envelope.message)
    }

    async fn delete_slot(&self, slot_id: Uuid) -> Result<Option<String>, PortalError> {
        debug!("Deleting availability slot {}", slot_id);

        let path = format!("/availability/{}", slot_id);
        let envelope = self.client.delete::<Value>(&path).await?;
        Ok(envelope.message)
    }
}
