//! Client for the Cirrus Cloud management API.
//!
//! All resource handlers talk to the platform through the [`CloudApi`]
//! trait. The gRPC implementation is a thin shim over a shared channel;
//! tests substitute a fake that overrides only the methods they need.

use async_trait::async_trait;
use tonic::client::Grpc;
use tonic::codec::ProstCodec;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::metadata::{Ascii, MetadataValue};
use tonic::transport::{Channel, Endpoint};

use cirrus_common::api::{alb, compute, mdb, operation};
use cirrus_common::{Error, Result};

macro_rules! unimplemented_call {
    ($name:literal) => {
        Err(Error::Internal(format!("not implemented: {}", $name)))
    };
}

/// Management API surface used by the provider.
///
/// Every method has a default body returning an internal error, so a
/// test fake only overrides the calls its scenario exercises.
#[async_trait]
pub trait CloudApi: Send + Sync {
    // Compute instances

    async fn create_instance(
        &self,
        _request: compute::CreateInstanceRequest,
    ) -> Result<operation::Operation> {
        unimplemented_call!("create_instance")
    }

    async fn get_instance(&self, _request: compute::GetInstanceRequest) -> Result<compute::Instance> {
        unimplemented_call!("get_instance")
    }

    async fn list_instances(
        &self,
        _request: compute::ListInstancesRequest,
    ) -> Result<compute::ListInstancesResponse> {
        unimplemented_call!("list_instances")
    }

    async fn update_instance(
        &self,
        _request: compute::UpdateInstanceRequest,
    ) -> Result<operation::Operation> {
        unimplemented_call!("update_instance")
    }

    async fn delete_instance(
        &self,
        _request: compute::DeleteInstanceRequest,
    ) -> Result<operation::Operation> {
        unimplemented_call!("delete_instance")
    }

    // MySQL clusters

    async fn create_cluster(
        &self,
        _request: mdb::CreateClusterRequest,
    ) -> Result<operation::Operation> {
        unimplemented_call!("create_cluster")
    }

    async fn get_cluster(&self, _request: mdb::GetClusterRequest) -> Result<mdb::Cluster> {
        unimplemented_call!("get_cluster")
    }

    async fn update_cluster(
        &self,
        _request: mdb::UpdateClusterRequest,
    ) -> Result<operation::Operation> {
        unimplemented_call!("update_cluster")
    }

    async fn delete_cluster(
        &self,
        _request: mdb::DeleteClusterRequest,
    ) -> Result<operation::Operation> {
        unimplemented_call!("delete_cluster")
    }

    // MySQL users

    async fn create_user(&self, _request: mdb::CreateUserRequest) -> Result<operation::Operation> {
        unimplemented_call!("create_user")
    }

    async fn get_user(&self, _request: mdb::GetUserRequest) -> Result<mdb::User> {
        unimplemented_call!("get_user")
    }

    async fn update_user(&self, _request: mdb::UpdateUserRequest) -> Result<operation::Operation> {
        unimplemented_call!("update_user")
    }

    async fn delete_user(&self, _request: mdb::DeleteUserRequest) -> Result<operation::Operation> {
        unimplemented_call!("delete_user")
    }

    // MySQL databases

    async fn create_database(
        &self,
        _request: mdb::CreateDatabaseRequest,
    ) -> Result<operation::Operation> {
        unimplemented_call!("create_database")
    }

    async fn get_database(&self, _request: mdb::GetDatabaseRequest) -> Result<mdb::Database> {
        unimplemented_call!("get_database")
    }

    async fn delete_database(
        &self,
        _request: mdb::DeleteDatabaseRequest,
    ) -> Result<operation::Operation> {
        unimplemented_call!("delete_database")
    }

    // Application load balancer backend groups

    async fn create_backend_group(
        &self,
        _request: alb::CreateBackendGroupRequest,
    ) -> Result<operation::Operation> {
        unimplemented_call!("create_backend_group")
    }

    async fn get_backend_group(
        &self,
        _request: alb::GetBackendGroupRequest,
    ) -> Result<alb::BackendGroup> {
        unimplemented_call!("get_backend_group")
    }

    async fn update_backend_group(
        &self,
        _request: alb::UpdateBackendGroupRequest,
    ) -> Result<operation::Operation> {
        unimplemented_call!("update_backend_group")
    }

    async fn delete_backend_group(
        &self,
        _request: alb::DeleteBackendGroupRequest,
    ) -> Result<operation::Operation> {
        unimplemented_call!("delete_backend_group")
    }

    // Application load balancer virtual hosts

    async fn create_virtual_host(
        &self,
        _request: alb::CreateVirtualHostRequest,
    ) -> Result<operation::Operation> {
        unimplemented_call!("create_virtual_host")
    }

    async fn get_virtual_host(
        &self,
        _request: alb::GetVirtualHostRequest,
    ) -> Result<alb::VirtualHost> {
        unimplemented_call!("get_virtual_host")
    }

    async fn update_virtual_host(
        &self,
        _request: alb::UpdateVirtualHostRequest,
    ) -> Result<operation::Operation> {
        unimplemented_call!("update_virtual_host")
    }

    async fn delete_virtual_host(
        &self,
        _request: alb::DeleteVirtualHostRequest,
    ) -> Result<operation::Operation> {
        unimplemented_call!("delete_virtual_host")
    }

    // Operations

    async fn get_operation(
        &self,
        _request: operation::GetOperationRequest,
    ) -> Result<operation::Operation> {
        unimplemented_call!("get_operation")
    }
}

/// gRPC implementation of [`CloudApi`] over a shared channel.
pub struct GrpcCloudApi {
    channel: Channel,
    auth: Option<MetadataValue<Ascii>>,
}

impl GrpcCloudApi {
    /// Connect to the management API endpoint.
    pub async fn connect(endpoint: &str, token: Option<&str>) -> Result<Self> {
        let auth = match token {
            Some(t) => Some(
                MetadataValue::try_from(format!("Bearer {t}"))
                    .map_err(|_| Error::InvalidConfig("token contains invalid characters".into()))?,
            ),
            None => None,
        };
        let channel = Endpoint::from_shared(endpoint.to_string())
            .map_err(|e| Error::InvalidConfig(format!("invalid endpoint {endpoint:?}: {e}")))?
            .connect()
            .await
            .map_err(|e| Error::Unavailable(e.to_string()))?;
        Ok(Self { channel, auth })
    }

    async fn call<Req, Resp>(&self, path: &'static str, message: Req) -> Result<Resp>
    where
        Req: prost::Message + Send + Sync + 'static,
        Resp: prost::Message + Default + Send + Sync + 'static,
    {
        let mut grpc = Grpc::new(self.channel.clone());
        grpc.ready()
            .await
            .map_err(|e| Error::Unavailable(e.to_string()))?;
        let mut request = tonic::Request::new(message);
        if let Some(auth) = &self.auth {
            request.metadata_mut().insert("authorization", auth.clone());
        }
        let codec: ProstCodec<Req, Resp> = ProstCodec::default();
        let response = grpc
            .unary(request, PathAndQuery::from_static(path), codec)
            .await?;
        Ok(response.into_inner())
    }
}

#[async_trait]
impl CloudApi for GrpcCloudApi {
    async fn create_instance(
        &self,
        request: compute::CreateInstanceRequest,
    ) -> Result<operation::Operation> {
        self.call("/cirrus.compute.v1.InstanceService/Create", request)
            .await
    }

    async fn get_instance(&self, request: compute::GetInstanceRequest) -> Result<compute::Instance> {
        self.call("/cirrus.compute.v1.InstanceService/Get", request)
            .await
    }

    async fn list_instances(
        &self,
        request: compute::ListInstancesRequest,
    ) -> Result<compute::ListInstancesResponse> {
        self.call("/cirrus.compute.v1.InstanceService/List", request)
            .await
    }

    async fn update_instance(
        &self,
        request: compute::UpdateInstanceRequest,
    ) -> Result<operation::Operation> {
        self.call("/cirrus.compute.v1.InstanceService/Update", request)
            .await
    }

    async fn delete_instance(
        &self,
        request: compute::DeleteInstanceRequest,
    ) -> Result<operation::Operation> {
        self.call("/cirrus.compute.v1.InstanceService/Delete", request)
            .await
    }

    async fn create_cluster(
        &self,
        request: mdb::CreateClusterRequest,
    ) -> Result<operation::Operation> {
        self.call("/cirrus.mdb.mysql.v1.ClusterService/Create", request)
            .await
    }

    async fn get_cluster(&self, request: mdb::GetClusterRequest) -> Result<mdb::Cluster> {
        self.call("/cirrus.mdb.mysql.v1.ClusterService/Get", request)
            .await
    }

    async fn update_cluster(
        &self,
        request: mdb::UpdateClusterRequest,
    ) -> Result<operation::Operation> {
        self.call("/cirrus.mdb.mysql.v1.ClusterService/Update", request)
            .await
    }

    async fn delete_cluster(
        &self,
        request: mdb::DeleteClusterRequest,
    ) -> Result<operation::Operation> {
        self.call("/cirrus.mdb.mysql.v1.ClusterService/Delete", request)
            .await
    }

    async fn create_user(&self, request: mdb::CreateUserRequest) -> Result<operation::Operation> {
        self.call("/cirrus.mdb.mysql.v1.UserService/Create", request)
            .await
    }

    async fn get_user(&self, request: mdb::GetUserRequest) -> Result<mdb::User> {
        self.call("/cirrus.mdb.mysql.v1.UserService/Get", request)
            .await
    }

    async fn update_user(&self, request: mdb::UpdateUserRequest) -> Result<operation::Operation> {
        self.call("/cirrus.mdb.mysql.v1.UserService/Update", request)
            .await
    }

    async fn delete_user(&self, request: mdb::DeleteUserRequest) -> Result<operation::Operation> {
        self.call("/cirrus.mdb.mysql.v1.UserService/Delete", request)
            .await
    }

    async fn create_database(
        &self,
        request: mdb::CreateDatabaseRequest,
    ) -> Result<operation::Operation> {
        self.call("/cirrus.mdb.mysql.v1.DatabaseService/Create", request)
            .await
    }

    async fn get_database(&self, request: mdb::GetDatabaseRequest) -> Result<mdb::Database> {
        self.call("/cirrus.mdb.mysql.v1.DatabaseService/Get", request)
            .await
    }

    async fn delete_database(
        &self,
        request: mdb::DeleteDatabaseRequest,
    ) -> Result<operation::Operation> {
        self.call("/cirrus.mdb.mysql.v1.DatabaseService/Delete", request)
            .await
    }

    async fn create_backend_group(
        &self,
        request: alb::CreateBackendGroupRequest,
    ) -> Result<operation::Operation> {
        self.call("/cirrus.alb.v1.BackendGroupService/Create", request)
            .await
    }

    async fn get_backend_group(
        &self,
        request: alb::GetBackendGroupRequest,
    ) -> Result<alb::BackendGroup> {
        self.call("/cirrus.alb.v1.BackendGroupService/Get", request)
            .await
    }

    async fn update_backend_group(
        &self,
        request: alb::UpdateBackendGroupRequest,
    ) -> Result<operation::Operation> {
        self.call("/cirrus.alb.v1.BackendGroupService/Update", request)
            .await
    }

    async fn delete_backend_group(
        &self,
        request: alb::DeleteBackendGroupRequest,
    ) -> Result<operation::Operation> {
        self.call("/cirrus.alb.v1.BackendGroupService/Delete", request)
            .await
    }

    async fn create_virtual_host(
        &self,
        request: alb::CreateVirtualHostRequest,
    ) -> Result<operation::Operation> {
        self.call("/cirrus.alb.v1.VirtualHostService/Create", request)
            .await
    }

    async fn get_virtual_host(
        &self,
        request: alb::GetVirtualHostRequest,
    ) -> Result<alb::VirtualHost> {
        self.call("/cirrus.alb.v1.VirtualHostService/Get", request)
            .await
    }

    async fn update_virtual_host(
        &self,
        request: alb::UpdateVirtualHostRequest,
    ) -> Result<operation::Operation> {
        self.call("/cirrus.alb.v1.VirtualHostService/Update", request)
            .await
    }

    async fn delete_virtual_host(
        &self,
        request: alb::DeleteVirtualHostRequest,
    ) -> Result<operation::Operation> {
        self.call("/cirrus.alb.v1.VirtualHostService/Delete", request)
            .await
    }

    async fn get_operation(
        &self,
        request: operation::GetOperationRequest,
    ) -> Result<operation::Operation> {
        self.call("/cirrus.operation.OperationService/Get", request)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EmptyApi;

    #[async_trait]
    impl CloudApi for EmptyApi {}

    #[tokio::test]
    async fn default_methods_report_internal_error() {
        let api = EmptyApi;
        let err = api
            .get_user(mdb::GetUserRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
        assert!(err.to_string().contains("get_user"));
    }
}
