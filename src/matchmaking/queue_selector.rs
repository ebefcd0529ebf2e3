//! Routing queue resolution

use crate::backend::SessionBackendClient;
use crate::error::Result;
use crate::types::RoutingQueue;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of looking up the target routing queue
#[derive(Debug, Clone, PartialEq)]
pub enum QueueSelection {
    Found(RoutingQueue),
    NotFound,
}

/// Resolves which configured routing queue a request is routed through.
///
/// Queues are fetched fresh on every call and only the first page is
/// examined; a target queue beyond `page_limit` is reported as not found.
pub struct QueueSelector {
    backend: Arc<dyn SessionBackendClient>,
    page_limit: u32,
}

impl QueueSelector {
    pub fn new(backend: Arc<dyn SessionBackendClient>, page_limit: u32) -> Self {
        Self {
            backend,
            page_limit,
        }
    }

    pub async fn select_queue(&self, target_name: &str) -> Result<QueueSelection> {
        let queues = self
            .backend
            .describe_routing_queues(self.page_limit)
            .await
            .map_err(|e| {
                warn!("Failed to describe routing queues: {}", e);
                e
            })?;

        if queues.is_empty() {
            info!("No routing queues available");
            return Ok(QueueSelection::NotFound);
        }

        debug!(
            "Fetched {} routing queues, looking for '{}'",
            queues.len(),
            target_name
        );

        match queues.into_iter().find(|q| q.name == target_name) {
            Some(queue) => Ok(QueueSelection::Found(queue)),
            None => {
                info!("Routing queue '{}' not among fetched queues", target_name);
                Ok(QueueSelection::NotFound)
            }
        }
    }
}
