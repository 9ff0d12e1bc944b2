use thiserror::Error;

pub type RotationResult<T> = Result<T, RotationError>;

#[derive(Error, Debug)]
pub enum RotationError {
    #[error("banner {0} does not exist")]
    BannerNotFound(i64),

    #[error("slot {0} does not exist")]
    SlotNotFound(i64),

    #[error("user group {0} does not exist")]
    UserGroupNotFound(i64),

    #[error("banner {banner_id} is already assigned to slot {slot_id}")]
    AlreadyAssigned { banner_id: i64, slot_id: i64 },

    #[error("slot {0} has no assigned banners")]
    NoCandidates(i64),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl RotationError {
    /// Validation failures are returned to the caller without touching
    /// any state; storage failures abort the operation mid-flight.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::BannerNotFound(_)
                | Self::SlotNotFound(_)
                | Self::UserGroupNotFound(_)
                | Self::AlreadyAssigned { .. }
                | Self::NoCandidates(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_classification() {
        assert!(RotationError::BannerNotFound(7).is_validation());
        assert!(RotationError::AlreadyAssigned {
            banner_id: 1,
            slot_id: 2
        }
        .is_validation());
        assert!(RotationError::NoCandidates(5).is_validation());
        assert!(!RotationError::Storage(anyhow::anyhow!("connection reset")).is_validation());
    }

    #[test]
    fn test_display_carries_ids() {
        let err = RotationError::AlreadyAssigned {
            banner_id: 3,
            slot_id: 9,
        };
        let msg = err.to_string();
        assert!(msg.contains('3') && msg.contains('9'));
    }
}
