//! gRPC service implementation for the banner rotation service.
//! Uses tonic with code generated from banner.proto.

use rotation_core::error::RotationError;
use rotation_engine::RotationService;
use std::sync::Arc;
use tonic::{Request, Response, Status};
use tracing::error;

// Include the generated protobuf code.
// In CI/production, proto compilation generates this module.
// For development, we provide a manual definition.
pub mod banner_proto {
    // When proto compilation works:
    // tonic::include_proto!("rotation.banner.v1");

    // Manual definitions matching the proto file:
    #[derive(Clone, prost::Message)]
    pub struct AddBannerRequest {
        #[prost(int64, tag = "1")]
        pub banner_id: i64,
        #[prost(int64, tag = "2")]
        pub slot_id: i64,
    }

    #[derive(Clone, prost::Message)]
    pub struct AddBannerResponse {
        #[prost(string, tag = "1")]
        pub message: String,
    }

    #[derive(Clone, prost::Message)]
    pub struct RemoveBannerRequest {
        #[prost(int64, tag = "1")]
        pub banner_id: i64,
        #[prost(int64, tag = "2")]
        pub slot_id: i64,
    }

    #[derive(Clone, prost::Message)]
    pub struct RemoveBannerResponse {
        #[prost(string, tag = "1")]
        pub message: String,
    }

    #[derive(Clone, prost::Message)]
    pub struct ClickBannerRequest {
        #[prost(int64, tag = "1")]
        pub banner_id: i64,
        #[prost(int64, tag = "2")]
        pub slot_id: i64,
        #[prost(int64, tag = "3")]
        pub usergroup_id: i64,
    }

    #[derive(Clone, prost::Message)]
    pub struct ClickBannerResponse {
        #[prost(string, tag = "1")]
        pub message: String,
    }

    #[derive(Clone, prost::Message)]
    pub struct PickBannerRequest {
        #[prost(int64, tag = "1")]
        pub slot_id: i64,
        #[prost(int64, tag = "2")]
        pub usergroup_id: i64,
    }

    #[derive(Clone, prost::Message)]
    pub struct PickBannerResponse {
        #[prost(int64, tag = "1")]
        pub banner_id: i64,
        #[prost(string, tag = "2")]
        pub message: String,
    }
}

use banner_proto::*;

/// Map a domain error onto the gRPC status taxonomy.
fn status_from(err: RotationError) -> Status {
    match &err {
        RotationError::BannerNotFound(_)
        | RotationError::SlotNotFound(_)
        | RotationError::UserGroupNotFound(_) => Status::not_found(err.to_string()),
        RotationError::AlreadyAssigned { .. } => Status::already_exists(err.to_string()),
        RotationError::NoCandidates(_) => Status::failed_precondition(err.to_string()),
        _ => {
            error!(error = %err, "Rotation operation failed");
            Status::internal(err.to_string())
        }
    }
}

/// gRPC banner rotation service implementation.
pub struct BannerServiceImpl {
    service: Arc<RotationService>,
}

impl BannerServiceImpl {
    pub fn new(service: Arc<RotationService>) -> Self {
        Self { service }
    }
}

#[tonic::async_trait]
impl BannerServiceServer for BannerServiceImpl {
    async fn add_banner(
        &self,
        request: Request<AddBannerRequest>,
    ) -> Result<Response<AddBannerResponse>, Status> {
        let req = request.into_inner();
        self.service
            .add_banner(req.banner_id, req.slot_id)
            .await
            .map_err(status_from)?;

        Ok(Response::new(AddBannerResponse {
            message: "Banner added successfully".to_string(),
        }))
    }

    async fn remove_banner(
        &self,
        request: Request<RemoveBannerRequest>,
    ) -> Result<Response<RemoveBannerResponse>, Status> {
        let req = request.into_inner();
        self.service
            .remove_banner(req.banner_id, req.slot_id)
            .await
            .map_err(status_from)?;

        Ok(Response::new(RemoveBannerResponse {
            message: "Banner removed successfully".to_string(),
        }))
    }

    async fn click_banner(
        &self,
        request: Request<ClickBannerRequest>,
    ) -> Result<Response<ClickBannerResponse>, Status> {
        let req = request.into_inner();
        self.service
            .record_click(req.banner_id, req.slot_id, req.usergroup_id)
            .await
            .map_err(status_from)?;

        Ok(Response::new(ClickBannerResponse {
            message: "Banner clicked successfully".to_string(),
        }))
    }

    async fn pick_banner(
        &self,
        request: Request<PickBannerRequest>,
    ) -> Result<Response<PickBannerResponse>, Status> {
        let req = request.into_inner();
        let (_event, banner_id) = self
            .service
            .pick_banner(req.slot_id, req.usergroup_id)
            .await
            .map_err(status_from)?;

        Ok(Response::new(PickBannerResponse {
            banner_id,
            message: "Banner picked successfully".to_string(),
        }))
    }
}

/// Trait definition for the gRPC service (normally auto-generated by tonic).
#[tonic::async_trait]
pub trait BannerServiceServer: Send + Sync + 'static {
    async fn add_banner(
        &self,
        request: Request<AddBannerRequest>,
    ) -> Result<Response<AddBannerResponse>, Status>;

    async fn remove_banner(
        &self,
        request: Request<RemoveBannerRequest>,
    ) -> Result<Response<RemoveBannerResponse>, Status>;

    async fn click_banner(
        &self,
        request: Request<ClickBannerRequest>,
    ) -> Result<Response<ClickBannerResponse>, Status>;

    async fn pick_banner(
        &self,
        request: Request<PickBannerRequest>,
    ) -> Result<Response<PickBannerResponse>, Status>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_from(RotationError::BannerNotFound(1)).code(),
            tonic::Code::NotFound
        );
        assert_eq!(
            status_from(RotationError::UserGroupNotFound(9)).code(),
            tonic::Code::NotFound
        );
        assert_eq!(
            status_from(RotationError::AlreadyAssigned {
                banner_id: 1,
                slot_id: 2
            })
            .code(),
            tonic::Code::AlreadyExists
        );
        assert_eq!(
            status_from(RotationError::NoCandidates(5)).code(),
            tonic::Code::FailedPrecondition
        );
        assert_eq!(
            status_from(RotationError::Storage(anyhow::anyhow!("boom"))).code(),
            tonic::Code::Internal
        );
    }
}
