//! Rotation service — orchestrates assignment changes and engagement
//! recording over the injected storage and notification capabilities.
//!
//! Validation errors leave state untouched. Counter increments are durable
//! before any notification is attempted, and notification delivery never
//! changes the outcome reported to the caller.

use crate::bandit;
use rotation_core::error::{RotationError, RotationResult};
use rotation_core::notify::NotificationSink;
use rotation_core::store::{Catalog, Registry, StatsStore};
use rotation_core::types::{EngagementEvent, Notification};
use std::sync::Arc;
use tracing::{debug, info};

pub struct RotationService {
    catalog: Arc<dyn Catalog>,
    registry: Arc<dyn Registry>,
    stats: Arc<dyn StatsStore>,
    notifier: Arc<dyn NotificationSink>,
}

impl RotationService {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        registry: Arc<dyn Registry>,
        stats: Arc<dyn StatsStore>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            catalog,
            registry,
            stats,
            notifier,
        }
    }

    /// Put a banner into rotation for a slot.
    pub async fn add_banner(&self, banner_id: i64, slot_id: i64) -> RotationResult<()> {
        if !self.catalog.banner_exists(banner_id).await? {
            return Err(RotationError::BannerNotFound(banner_id));
        }
        if !self.catalog.slot_exists(slot_id).await? {
            return Err(RotationError::SlotNotFound(slot_id));
        }

        self.registry.add_assignment(banner_id, slot_id).await?;

        info!(banner_id, slot_id, "Banner added to rotation");
        metrics::counter!("rotation.assignments_added").increment(1);
        Ok(())
    }

    /// Take a banner out of rotation for a slot. Removing an absent
    /// assignment succeeds; accumulated statistics are kept, so a banner
    /// re-added later resumes where it left off.
    pub async fn remove_banner(&self, banner_id: i64, slot_id: i64) -> RotationResult<()> {
        self.registry.remove_assignment(banner_id, slot_id).await?;

        info!(banner_id, slot_id, "Banner removed from rotation");
        metrics::counter!("rotation.assignments_removed").increment(1);
        Ok(())
    }

    /// Choose the banner to show in the slot for the user group, record the
    /// impression, and forward an `impress` notification.
    pub async fn pick_banner(
        &self,
        slot_id: i64,
        usergroup_id: i64,
    ) -> RotationResult<(EngagementEvent, i64)> {
        if !self.catalog.slot_exists(slot_id).await? {
            return Err(RotationError::SlotNotFound(slot_id));
        }
        if !self.catalog.usergroup_exists(usergroup_id).await? {
            return Err(RotationError::UserGroupNotFound(usergroup_id));
        }

        let candidates = self.registry.active_banners(slot_id).await?;
        if candidates.is_empty() {
            return Err(RotationError::NoCandidates(slot_id));
        }

        let snapshot = self
            .stats
            .snapshot(slot_id, usergroup_id, &candidates)
            .await?;

        let banner_id = bandit::pick_banner(&snapshot)
            .ok_or(RotationError::NoCandidates(slot_id))?;

        let event = self
            .stats
            .increment_impression(banner_id, slot_id, usergroup_id)
            .await?;

        debug!(banner_id, slot_id, usergroup_id, "Banner picked");
        metrics::counter!("rotation.picks").increment(1);

        self.notify(&event);
        Ok((event, banner_id))
    }

    /// Record a click on a shown banner and forward a `click` notification.
    pub async fn record_click(
        &self,
        banner_id: i64,
        slot_id: i64,
        usergroup_id: i64,
    ) -> RotationResult<EngagementEvent> {
        if !self.catalog.banner_exists(banner_id).await? {
            return Err(RotationError::BannerNotFound(banner_id));
        }
        if !self.catalog.slot_exists(slot_id).await? {
            return Err(RotationError::SlotNotFound(slot_id));
        }
        if !self.catalog.usergroup_exists(usergroup_id).await? {
            return Err(RotationError::UserGroupNotFound(usergroup_id));
        }

        let event = self
            .stats
            .increment_click(banner_id, slot_id, usergroup_id)
            .await?;

        debug!(banner_id, slot_id, usergroup_id, "Click recorded");
        metrics::counter!("rotation.clicks").increment(1);

        self.notify(&event);
        Ok(event)
    }

    // Called only after the increment is durable; the sink absorbs its
    // own failures.
    fn notify(&self, event: &EngagementEvent) {
        self.notifier.deliver(Notification::from(event));
    }
}
