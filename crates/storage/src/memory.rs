//! In-memory backend backed by DashMap for lock-free concurrent access.
//! Used by the test suite and for running the service without Postgres.

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use rotation_core::error::{RotationError, RotationResult};
use rotation_core::store::{Catalog, Registry, StatsStore};
use rotation_core::types::{BannerStats, EngagementEvent, EngagementKind};
use std::collections::BTreeSet;
use tracing::debug;

#[derive(Default)]
struct StatCounters {
    impressions: u64,
    clicks: u64,
}

/// Concurrent in-memory store. Per-key increments go through the DashMap
/// entry API, which holds the shard lock for the whole read-modify-write.
#[derive(Default)]
pub struct MemoryStorage {
    banners: DashSet<i64>,
    slots: DashSet<i64>,
    usergroups: DashSet<i64>,
    // slot -> assigned banners; BTreeSet iteration gives the stable
    // ascending order the selector relies on for tie-breaking.
    assignments: DashMap<i64, BTreeSet<i64>>,
    stats: DashMap<(i64, i64, i64), StatCounters>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a banner into the catalog.
    pub fn insert_banner(&self, banner_id: i64) {
        self.banners.insert(banner_id);
    }

    /// Seed a slot into the catalog.
    pub fn insert_slot(&self, slot_id: i64) {
        self.slots.insert(slot_id);
    }

    /// Seed a user group into the catalog.
    pub fn insert_usergroup(&self, usergroup_id: i64) {
        self.usergroups.insert(usergroup_id);
    }

    fn bump(
        &self,
        kind: EngagementKind,
        banner_id: i64,
        slot_id: i64,
        usergroup_id: i64,
    ) -> EngagementEvent {
        let mut counters = self
            .stats
            .entry((banner_id, slot_id, usergroup_id))
            .or_default();
        match kind {
            EngagementKind::Impression => counters.impressions += 1,
            EngagementKind::Click => counters.clicks += 1,
        }
        drop(counters);

        EngagementEvent::new(kind, banner_id, slot_id, usergroup_id)
    }
}

#[async_trait]
impl Catalog for MemoryStorage {
    async fn banner_exists(&self, banner_id: i64) -> RotationResult<bool> {
        Ok(self.banners.contains(&banner_id))
    }

    async fn slot_exists(&self, slot_id: i64) -> RotationResult<bool> {
        Ok(self.slots.contains(&slot_id))
    }

    async fn usergroup_exists(&self, usergroup_id: i64) -> RotationResult<bool> {
        Ok(self.usergroups.contains(&usergroup_id))
    }
}

#[async_trait]
impl Registry for MemoryStorage {
    async fn add_assignment(&self, banner_id: i64, slot_id: i64) -> RotationResult<()> {
        let mut assigned = self.assignments.entry(slot_id).or_default();
        if !assigned.insert(banner_id) {
            return Err(RotationError::AlreadyAssigned { banner_id, slot_id });
        }
        Ok(())
    }

    async fn remove_assignment(&self, banner_id: i64, slot_id: i64) -> RotationResult<()> {
        let removed = self
            .assignments
            .get_mut(&slot_id)
            .map(|mut assigned| assigned.remove(&banner_id))
            .unwrap_or(false);
        if !removed {
            debug!(banner_id, slot_id, "Assignment already absent on remove");
        }
        Ok(())
    }

    async fn active_banners(&self, slot_id: i64) -> RotationResult<Vec<i64>> {
        Ok(self
            .assignments
            .get(&slot_id)
            .map(|assigned| assigned.iter().copied().collect())
            .unwrap_or_default())
    }
}

#[async_trait]
impl StatsStore for MemoryStorage {
    async fn snapshot(
        &self,
        slot_id: i64,
        usergroup_id: i64,
        banner_ids: &[i64],
    ) -> RotationResult<Vec<BannerStats>> {
        Ok(banner_ids
            .iter()
            .map(|&banner_id| {
                let (impressions, clicks) = self
                    .stats
                    .get(&(banner_id, slot_id, usergroup_id))
                    .map(|c| (c.impressions, c.clicks))
                    .unwrap_or((0, 0));
                BannerStats {
                    banner_id,
                    impressions,
                    clicks,
                }
            })
            .collect())
    }

    async fn increment_impression(
        &self,
        banner_id: i64,
        slot_id: i64,
        usergroup_id: i64,
    ) -> RotationResult<EngagementEvent> {
        Ok(self.bump(EngagementKind::Impression, banner_id, slot_id, usergroup_id))
    }

    async fn increment_click(
        &self,
        banner_id: i64,
        slot_id: i64,
        usergroup_id: i64,
    ) -> RotationResult<EngagementEvent> {
        Ok(self.bump(EngagementKind::Click, banner_id, slot_id, usergroup_id))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_duplicate_assignment_rejected() {
        let storage = MemoryStorage::new();
        storage.add_assignment(1, 5).await.unwrap();

        let err = storage.add_assignment(1, 5).await.unwrap_err();
        assert!(matches!(
            err,
            RotationError::AlreadyAssigned {
                banner_id: 1,
                slot_id: 5
            }
        ));

        // State equals the state after the first add only.
        assert_eq!(storage.active_banners(5).await.unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let storage = MemoryStorage::new();
        storage.add_assignment(1, 5).await.unwrap();

        storage.remove_assignment(1, 5).await.unwrap();
        storage.remove_assignment(1, 5).await.unwrap();
        storage.remove_assignment(99, 42).await.unwrap();

        assert!(storage.active_banners(5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_active_banners_ascending() {
        let storage = MemoryStorage::new();
        for banner_id in [30, 10, 20] {
            storage.add_assignment(banner_id, 7).await.unwrap();
        }
        assert_eq!(storage.active_banners(7).await.unwrap(), vec![10, 20, 30]);
    }

    #[tokio::test]
    async fn test_snapshot_defaults_to_zero() {
        let storage = MemoryStorage::new();
        storage.increment_impression(2, 5, 9).await.unwrap();

        let snapshot = storage.snapshot(5, 9, &[1, 2]).await.unwrap();
        assert_eq!(snapshot[0], BannerStats { banner_id: 1, impressions: 0, clicks: 0 });
        assert_eq!(snapshot[1], BannerStats { banner_id: 2, impressions: 1, clicks: 0 });
    }

    #[tokio::test]
    async fn test_stats_survive_assignment_removal() {
        let storage = MemoryStorage::new();
        storage.add_assignment(1, 5).await.unwrap();
        storage.increment_impression(1, 5, 9).await.unwrap();
        storage.increment_click(1, 5, 9).await.unwrap();

        storage.remove_assignment(1, 5).await.unwrap();
        storage.add_assignment(1, 5).await.unwrap();

        let snapshot = storage.snapshot(5, 9, &[1]).await.unwrap();
        assert_eq!(snapshot[0].impressions, 1);
        assert_eq!(snapshot[0].clicks, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_increments_are_not_lost() {
        let storage = Arc::new(MemoryStorage::new());
        let tasks: Vec<_> = (0..100)
            .map(|_| {
                let storage = storage.clone();
                tokio::spawn(async move {
                    storage.increment_impression(1, 5, 9).await.unwrap();
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap();
        }

        let snapshot = storage.snapshot(5, 9, &[1]).await.unwrap();
        assert_eq!(snapshot[0].impressions, 100);
    }
}
