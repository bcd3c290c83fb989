//! Fire-and-forget analytics event tracking.
//!
//! Events are written on a spawned task; a failed insert is logged and never
//! affects the response that triggered it.

use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use crate::store::{AnalyticsEvent, Database};

/// Handle for emitting analytics events.
#[derive(Clone)]
pub struct Analytics {
    db: Arc<dyn Database>,
}

impl Analytics {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    /// Record an event in the background. Returns immediately.
    pub fn track(
        &self,
        event_name: &str,
        user_id: Option<Uuid>,
        session_id: Option<String>,
        event_data: serde_json::Value,
    ) {
        let db = self.db.clone();
        let event = AnalyticsEvent {
            event_name: event_name.to_string(),
            user_id,
            session_id,
            event_data,
        };
        tokio::spawn(async move {
            if let Err(e) = db.insert_analytics_event(&event).await {
                warn!(event = %event.event_name, error = %e, "Failed to record analytics event");
            }
        });
    }
}
