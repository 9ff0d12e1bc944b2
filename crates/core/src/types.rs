use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-banner counters for one (slot, user group) scope, as consumed by the
/// bandit selector. Banners with no recorded engagement carry zeros.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BannerStats {
    pub banner_id: i64,
    pub impressions: u64,
    pub clicks: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EngagementKind {
    Impression,
    Click,
}

impl EngagementKind {
    /// Wire name used in the notification payload. Fixed for downstream
    /// compatibility ("impress", not "impression").
    pub fn type_event(&self) -> &'static str {
        match self {
            Self::Impression => "impress",
            Self::Click => "click",
        }
    }
}

/// Immutable record of one counter increment. Exactly one event is produced
/// per successful increment; events are handed to the notification sink and
/// not stored beyond that.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngagementEvent {
    pub id: Uuid,
    pub kind: EngagementKind,
    pub banner_id: i64,
    pub slot_id: i64,
    pub usergroup_id: i64,
    pub occurred_at: DateTime<Utc>,
}

impl EngagementEvent {
    pub fn new(kind: EngagementKind, banner_id: i64, slot_id: i64, usergroup_id: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            banner_id,
            slot_id,
            usergroup_id,
            occurred_at: Utc::now(),
        }
    }
}

/// Outbound engagement record for the external analytics channel.
/// Field names are part of the downstream contract — do not rename.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub type_event: String,
    pub slot_id: i64,
    pub banner_id: i64,
    pub usergroup_id: i64,
    pub date_time: DateTime<Utc>,
}

impl From<&EngagementEvent> for Notification {
    fn from(event: &EngagementEvent) -> Self {
        Self {
            type_event: event.kind.type_event().to_string(),
            slot_id: event.slot_id,
            banner_id: event.banner_id,
            usergroup_id: event.usergroup_id,
            date_time: event.occurred_at,
        }
    }
}
