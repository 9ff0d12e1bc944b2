//! Storage capability traits — the narrow interfaces the rotation core
//! consumes. Backends (Postgres for production, in-memory for tests) live in
//! `rotation-storage`; no component talks to an engine directly.

use crate::error::RotationResult;
use crate::types::{BannerStats, EngagementEvent};
use async_trait::async_trait;

/// Existence lookups against the entity catalog. Banners, slots and user
/// groups are identity-only here; their lifecycle is owned elsewhere.
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn banner_exists(&self, banner_id: i64) -> RotationResult<bool>;
    async fn slot_exists(&self, slot_id: i64) -> RotationResult<bool>;
    async fn usergroup_exists(&self, usergroup_id: i64) -> RotationResult<bool>;
}

/// Assignment lifecycle: which banners are in rotation for which slots.
/// The registry owns assignments exclusively.
#[async_trait]
pub trait Registry: Send + Sync {
    /// Create the (banner, slot) assignment. Fails with `AlreadyAssigned`
    /// if the pair exists; the check-and-insert is atomic in the backend.
    async fn add_assignment(&self, banner_id: i64, slot_id: i64) -> RotationResult<()>;

    /// Remove the assignment. Removing an absent pair is a no-op success.
    async fn remove_assignment(&self, banner_id: i64, slot_id: i64) -> RotationResult<()>;

    /// Banners currently assigned to the slot, ascending by banner id.
    /// The ordering is the selector's tie-break input and must be
    /// reproducible across calls.
    async fn active_banners(&self, slot_id: i64) -> RotationResult<Vec<i64>>;
}

/// Per-(banner, slot, usergroup) impression/click counters. Records are
/// created lazily on first increment and never deleted; counters only grow.
#[async_trait]
pub trait StatsStore: Send + Sync {
    /// Counters for the given banners scoped to (slot, usergroup), in the
    /// order requested. Banners with no record yet come back as (0, 0).
    async fn snapshot(
        &self,
        slot_id: i64,
        usergroup_id: i64,
        banner_ids: &[i64],
    ) -> RotationResult<Vec<BannerStats>>;

    /// Atomically create-or-increment the impression counter by one.
    /// Concurrent increments on the same key must all be retained.
    async fn increment_impression(
        &self,
        banner_id: i64,
        slot_id: i64,
        usergroup_id: i64,
    ) -> RotationResult<EngagementEvent>;

    /// Atomically create-or-increment the click counter by one.
    async fn increment_click(
        &self,
        banner_id: i64,
        slot_id: i64,
        usergroup_id: i64,
    ) -> RotationResult<EngagementEvent>;
}
