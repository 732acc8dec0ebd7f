//! Push-notification event records

use serde::{Deserialize, Serialize};

use super::product::StockStatus;

/// Action component of a webhook topic (`product.<action>`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventAction {
    Created,
    Updated,
    Deleted,
    Restored,
}

impl EventAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
            Self::Restored => "restored",
        }
    }
}

impl std::str::FromStr for EventAction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(Self::Created),
            "updated" => Ok(Self::Updated),
            "deleted" => Ok(Self::Deleted),
            "restored" => Ok(Self::Restored),
            _ => Err(()),
        }
    }
}

/// Parse a `resource.action` topic, accepting only product topics
pub fn parse_topic(topic: &str) -> Option<EventAction> {
    let (resource, action) = topic.split_once('.')?;
    if resource != "product" {
        return None;
    }
    action.parse().ok()
}

/// One row per received push notification
///
/// Inserted on receipt with the stock delta pre-computed against the cache,
/// then mutated exactly once to mark processed or errored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub id: i64,
    pub topic: String,
    pub action: EventAction,
    pub product_id: i64,
    pub name: Option<String>,
    pub kind: Option<String>,
    /// Full raw payload as received
    pub payload: serde_json::Value,
    pub signature: Option<String>,
    pub old_stock_status: Option<StockStatus>,
    pub new_stock_status: Option<StockStatus>,
    pub old_stock_quantity: Option<i64>,
    pub new_stock_quantity: Option<i64>,
    /// new quantity minus old quantity, when both are known
    pub stock_delta: Option<i64>,
    pub retailer_id: Option<String>,
    pub processed: bool,
    pub processed_at: Option<i64>,
    pub error: Option<String>,
    pub created_at: i64,
}

/// Webhook counters for the status endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookCounters {
    pub received: i64,
    pub processed: i64,
    pub errors: i64,
}
