//! Application load balancer messages (`cirrus.alb.v1`).

use std::collections::HashMap;

use super::EnumTable;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum LoadBalancingMode {
    RoundRobin = 0,
    Random = 1,
    LeastRequest = 2,
    MaglevHash = 3,
}

pub const LOAD_BALANCING_MODE_NAMES: EnumTable = &[
    ("ROUND_ROBIN", 0),
    ("RANDOM", 1),
    ("LEAST_REQUEST", 2),
    ("MAGLEV_HASH", 3),
];

/// gRPC status codes a route can answer with directly. Zero (`OK`) is a
/// meaningful member, not an "unspecified" marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum GrpcStatus {
    Ok = 0,
    InvalidArgument = 1,
    NotFound = 2,
    PermissionDenied = 3,
    Unavailable = 4,
    Internal = 5,
    Unimplemented = 6,
}

pub const GRPC_STATUS_NAMES: EnumTable = &[
    ("OK", 0),
    ("INVALID_ARGUMENT", 1),
    ("NOT_FOUND", 2),
    ("PERMISSION_DENIED", 3),
    ("UNAVAILABLE", 4),
    ("INTERNAL", 5),
    ("UNIMPLEMENTED", 6),
];

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct LoadBalancingConfig {
    #[prost(int64, tag = "1")]
    pub panic_threshold: i64,
    #[prost(int64, tag = "2")]
    pub locality_aware_routing_percent: i64,
    #[prost(bool, tag = "3")]
    pub strict_locality: bool,
    #[prost(enumeration = "LoadBalancingMode", tag = "4")]
    pub mode: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HttpHealthCheck {
    #[prost(string, tag = "1")]
    pub host: String,
    #[prost(string, tag = "2")]
    pub path: String,
    #[prost(bool, tag = "3")]
    pub http2: bool,
    /// Empty and absent are distinct: an empty list means "accept the
    /// server defaults", which the caller must preserve.
    #[prost(int64, repeated, tag = "4")]
    pub expected_statuses: Vec<i64>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StreamHealthCheck {
    #[prost(string, tag = "1")]
    pub send: String,
    #[prost(string, tag = "2")]
    pub receive: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HealthCheck {
    #[prost(message, optional, tag = "1")]
    pub timeout: Option<::prost_types::Duration>,
    #[prost(message, optional, tag = "2")]
    pub interval: Option<::prost_types::Duration>,
    #[prost(double, tag = "3")]
    pub interval_jitter_percent: f64,
    #[prost(int64, tag = "4")]
    pub healthy_threshold: i64,
    #[prost(int64, tag = "5")]
    pub unhealthy_threshold: i64,
    #[prost(int64, tag = "6")]
    pub healthcheck_port: i64,
    #[prost(oneof = "health_check::Check", tags = "7, 8")]
    pub check: Option<health_check::Check>,
}

pub mod health_check {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Check {
        #[prost(message, tag = "7")]
        Stream(super::StreamHealthCheck),
        #[prost(message, tag = "8")]
        Http(super::HttpHealthCheck),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HttpBackend {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(message, optional, tag = "2")]
    pub backend_weight: Option<i64>,
    #[prost(int64, tag = "3")]
    pub port: i64,
    #[prost(string, repeated, tag = "4")]
    pub target_group_ids: Vec<String>,
    #[prost(message, repeated, tag = "5")]
    pub healthchecks: Vec<HealthCheck>,
    #[prost(message, optional, tag = "6")]
    pub load_balancing_config: Option<LoadBalancingConfig>,
    #[prost(bool, tag = "7")]
    pub http2: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StreamBackend {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(message, optional, tag = "2")]
    pub backend_weight: Option<i64>,
    #[prost(int64, tag = "3")]
    pub port: i64,
    #[prost(string, repeated, tag = "4")]
    pub target_group_ids: Vec<String>,
    #[prost(message, repeated, tag = "5")]
    pub healthchecks: Vec<HealthCheck>,
    #[prost(message, optional, tag = "6")]
    pub load_balancing_config: Option<LoadBalancingConfig>,
    #[prost(bool, tag = "7")]
    pub enable_proxy_protocol: bool,
    #[prost(bool, tag = "8")]
    pub keep_connections_on_host_health_failure: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HttpBackendGroup {
    #[prost(message, repeated, tag = "1")]
    pub backends: Vec<HttpBackend>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StreamBackendGroup {
    #[prost(message, repeated, tag = "1")]
    pub backends: Vec<StreamBackend>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BackendGroup {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(string, tag = "3")]
    pub description: String,
    #[prost(string, tag = "4")]
    pub folder_id: String,
    #[prost(map = "string, string", tag = "5")]
    pub labels: HashMap<String, String>,
    #[prost(message, optional, tag = "6")]
    pub created_at: Option<::prost_types::Timestamp>,
    #[prost(oneof = "backend_group::Backend", tags = "7, 8")]
    pub backend: Option<backend_group::Backend>,
}

pub mod backend_group {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Backend {
        #[prost(message, tag = "7")]
        Http(super::HttpBackendGroup),
        #[prost(message, tag = "8")]
        Stream(super::StreamBackendGroup),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CreateBackendGroupRequest {
    #[prost(string, tag = "1")]
    pub folder_id: String,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(string, tag = "3")]
    pub description: String,
    #[prost(map = "string, string", tag = "4")]
    pub labels: HashMap<String, String>,
    #[prost(oneof = "backend_group::Backend", tags = "7, 8")]
    pub backend: Option<backend_group::Backend>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetBackendGroupRequest {
    #[prost(string, tag = "1")]
    pub backend_group_id: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UpdateBackendGroupRequest {
    #[prost(string, tag = "1")]
    pub backend_group_id: String,
    #[prost(message, optional, tag = "2")]
    pub update_mask: Option<::prost_types::FieldMask>,
    #[prost(string, tag = "3")]
    pub name: String,
    #[prost(string, tag = "4")]
    pub description: String,
    #[prost(map = "string, string", tag = "5")]
    pub labels: HashMap<String, String>,
    #[prost(oneof = "backend_group::Backend", tags = "7, 8")]
    pub backend: Option<backend_group::Backend>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeleteBackendGroupRequest {
    #[prost(string, tag = "1")]
    pub backend_group_id: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StringMatch {
    #[prost(oneof = "string_match::Match", tags = "1, 2")]
    pub r#match: Option<string_match::Match>,
}

pub mod string_match {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Match {
        #[prost(string, tag = "1")]
        ExactMatch(String),
        #[prost(string, tag = "2")]
        PrefixMatch(String),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RegexMatchAndSubstitute {
    #[prost(string, tag = "1")]
    pub regex: String,
    #[prost(string, tag = "2")]
    pub substitute: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RateLimit {
    #[prost(message, optional, tag = "1")]
    pub all_requests: Option<rate_limit::Limit>,
    #[prost(message, optional, tag = "2")]
    pub requests_per_ip: Option<rate_limit::Limit>,
}

pub mod rate_limit {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Limit {
        #[prost(oneof = "limit::Rate", tags = "1, 2")]
        pub rate: Option<limit::Rate>,
    }

    pub mod limit {
        #[derive(Clone, PartialEq, ::prost::Oneof)]
        pub enum Rate {
            #[prost(int64, tag = "1")]
            PerSecond(i64),
            #[prost(int64, tag = "2")]
            PerMinute(i64),
        }
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RouteOptions {
    #[prost(message, optional, tag = "1")]
    pub rate_limit: Option<RateLimit>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HttpRouteMatch {
    #[prost(string, repeated, tag = "1")]
    pub http_method: Vec<String>,
    #[prost(message, optional, tag = "2")]
    pub path: Option<StringMatch>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HttpRouteAction {
    #[prost(string, tag = "1")]
    pub backend_group_id: String,
    #[prost(message, optional, tag = "2")]
    pub timeout: Option<::prost_types::Duration>,
    #[prost(string, tag = "3")]
    pub prefix_rewrite: String,
    #[prost(message, optional, tag = "4")]
    pub regex_rewrite: Option<RegexMatchAndSubstitute>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DirectResponseAction {
    #[prost(int64, tag = "1")]
    pub status: i64,
    #[prost(string, tag = "2")]
    pub body: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HttpRoute {
    #[prost(message, optional, tag = "1")]
    pub route_match: Option<HttpRouteMatch>,
    #[prost(oneof = "http_route::Action", tags = "2, 3")]
    pub action: Option<http_route::Action>,
}

pub mod http_route {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Action {
        #[prost(message, tag = "2")]
        Route(super::HttpRouteAction),
        #[prost(message, tag = "3")]
        DirectResponse(super::DirectResponseAction),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GrpcRouteMatch {
    #[prost(message, optional, tag = "1")]
    pub fqmn: Option<StringMatch>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GrpcRouteAction {
    #[prost(string, tag = "1")]
    pub backend_group_id: String,
    #[prost(message, optional, tag = "2")]
    pub max_timeout: Option<::prost_types::Duration>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GrpcStatusResponseAction {
    #[prost(enumeration = "GrpcStatus", tag = "1")]
    pub status: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GrpcRoute {
    #[prost(message, optional, tag = "1")]
    pub route_match: Option<GrpcRouteMatch>,
    #[prost(oneof = "grpc_route::Action", tags = "2, 3")]
    pub action: Option<grpc_route::Action>,
}

pub mod grpc_route {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Action {
        #[prost(message, tag = "2")]
        Route(super::GrpcRouteAction),
        #[prost(message, tag = "3")]
        StatusResponse(super::GrpcStatusResponseAction),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Route {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(oneof = "route::Kind", tags = "2, 3")]
    pub kind: Option<route::Kind>,
    #[prost(message, optional, tag = "4")]
    pub route_options: Option<RouteOptions>,
}

pub mod route {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Kind {
        #[prost(message, tag = "2")]
        Http(super::HttpRoute),
        #[prost(message, tag = "3")]
        Grpc(super::GrpcRoute),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct VirtualHost {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, repeated, tag = "2")]
    pub authority: Vec<String>,
    #[prost(message, repeated, tag = "3")]
    pub routes: Vec<Route>,
    #[prost(message, optional, tag = "4")]
    pub route_options: Option<RouteOptions>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CreateVirtualHostRequest {
    #[prost(string, tag = "1")]
    pub http_router_id: String,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(string, repeated, tag = "3")]
    pub authority: Vec<String>,
    #[prost(message, repeated, tag = "4")]
    pub routes: Vec<Route>,
    #[prost(message, optional, tag = "5")]
    pub route_options: Option<RouteOptions>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetVirtualHostRequest {
    #[prost(string, tag = "1")]
    pub http_router_id: String,
    #[prost(string, tag = "2")]
    pub virtual_host_name: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UpdateVirtualHostRequest {
    #[prost(string, tag = "1")]
    pub http_router_id: String,
    #[prost(string, tag = "2")]
    pub virtual_host_name: String,
    #[prost(message, optional, tag = "3")]
    pub update_mask: Option<::prost_types::FieldMask>,
    #[prost(string, repeated, tag = "4")]
    pub authority: Vec<String>,
    #[prost(message, repeated, tag = "5")]
    pub routes: Vec<Route>,
    #[prost(message, optional, tag = "6")]
    pub route_options: Option<RouteOptions>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeleteVirtualHostRequest {
    #[prost(string, tag = "1")]
    pub http_router_id: String,
    #[prost(string, tag = "2")]
    pub virtual_host_name: String,
}
