//! Compute service messages (`cirrus.compute.v1`).

use std::collections::HashMap;

use super::EnumTable;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum InstanceStatus {
    Unspecified = 0,
    Provisioning = 1,
    Running = 2,
    Stopping = 3,
    Stopped = 4,
    Starting = 5,
    Restarting = 6,
    Updating = 7,
    Error = 8,
    Crashed = 9,
    Deleting = 10,
}

pub const INSTANCE_STATUS_NAMES: EnumTable = &[
    ("STATUS_UNSPECIFIED", 0),
    ("PROVISIONING", 1),
    ("RUNNING", 2),
    ("STOPPING", 3),
    ("STOPPED", 4),
    ("STARTING", 5),
    ("RESTARTING", 6),
    ("UPDATING", 7),
    ("ERROR", 8),
    ("CRASHED", 9),
    ("DELETING", 10),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum DiskMode {
    Unspecified = 0,
    ReadOnly = 1,
    ReadWrite = 2,
}

pub const DISK_MODE_NAMES: EnumTable = &[
    ("MODE_UNSPECIFIED", 0),
    ("READ_ONLY", 1),
    ("READ_WRITE", 2),
];

/// Compute capacity of an instance, in base units (memory in bytes).
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Resources {
    #[prost(int64, tag = "1")]
    pub memory: i64,
    #[prost(int64, tag = "2")]
    pub cores: i64,
    #[prost(int64, tag = "3")]
    pub core_fraction: i64,
    #[prost(int64, tag = "4")]
    pub gpus: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DiskSpec {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub description: String,
    #[prost(string, tag = "3")]
    pub type_id: String,
    /// Size in bytes.
    #[prost(int64, tag = "4")]
    pub size: i64,
    #[prost(string, tag = "5")]
    pub image_id: String,
    #[prost(string, tag = "6")]
    pub snapshot_id: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AttachedDiskSpec {
    #[prost(enumeration = "DiskMode", tag = "1")]
    pub mode: i32,
    #[prost(string, tag = "2")]
    pub device_name: String,
    #[prost(bool, tag = "3")]
    pub auto_delete: bool,
    #[prost(message, optional, tag = "4")]
    pub disk_spec: Option<DiskSpec>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AttachedDisk {
    #[prost(enumeration = "DiskMode", tag = "1")]
    pub mode: i32,
    #[prost(string, tag = "2")]
    pub device_name: String,
    #[prost(bool, tag = "3")]
    pub auto_delete: bool,
    #[prost(string, tag = "4")]
    pub disk_id: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PrimaryAddress {
    #[prost(string, tag = "1")]
    pub address: String,
}

/// Interface order is meaningful: `index` is assigned by the platform in
/// the order the specs were submitted.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct NetworkInterface {
    #[prost(int64, tag = "1")]
    pub index: i64,
    #[prost(string, tag = "2")]
    pub mac_address: String,
    #[prost(string, tag = "3")]
    pub subnet_id: String,
    #[prost(message, optional, tag = "4")]
    pub primary_v4_address: Option<PrimaryAddress>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct NetworkInterfaceSpec {
    #[prost(string, tag = "1")]
    pub subnet_id: String,
    #[prost(message, optional, tag = "2")]
    pub primary_v4_address_spec: Option<PrimaryAddress>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Instance {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub folder_id: String,
    #[prost(message, optional, tag = "3")]
    pub created_at: Option<::prost_types::Timestamp>,
    #[prost(string, tag = "4")]
    pub name: String,
    #[prost(string, tag = "5")]
    pub description: String,
    #[prost(map = "string, string", tag = "6")]
    pub labels: HashMap<String, String>,
    #[prost(string, tag = "7")]
    pub zone_id: String,
    #[prost(string, tag = "8")]
    pub platform_id: String,
    #[prost(message, optional, tag = "9")]
    pub resources: Option<Resources>,
    #[prost(enumeration = "InstanceStatus", tag = "10")]
    pub status: i32,
    #[prost(map = "string, string", tag = "11")]
    pub metadata: HashMap<String, String>,
    #[prost(message, optional, tag = "12")]
    pub boot_disk: Option<AttachedDisk>,
    #[prost(message, repeated, tag = "13")]
    pub network_interfaces: Vec<NetworkInterface>,
    #[prost(string, tag = "14")]
    pub fqdn: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CreateInstanceRequest {
    #[prost(string, tag = "1")]
    pub folder_id: String,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(string, tag = "3")]
    pub description: String,
    #[prost(map = "string, string", tag = "4")]
    pub labels: HashMap<String, String>,
    #[prost(string, tag = "5")]
    pub zone_id: String,
    #[prost(string, tag = "6")]
    pub platform_id: String,
    #[prost(message, optional, tag = "7")]
    pub resources: Option<Resources>,
    #[prost(map = "string, string", tag = "8")]
    pub metadata: HashMap<String, String>,
    #[prost(message, optional, tag = "9")]
    pub boot_disk_spec: Option<AttachedDiskSpec>,
    #[prost(message, repeated, tag = "10")]
    pub network_interface_specs: Vec<NetworkInterfaceSpec>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetInstanceRequest {
    #[prost(string, tag = "1")]
    pub instance_id: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListInstancesRequest {
    #[prost(string, tag = "1")]
    pub folder_id: String,
    /// Server-side filter expression, e.g. `name="web-1"`.
    #[prost(string, tag = "2")]
    pub filter: String,
    #[prost(int64, tag = "3")]
    pub page_size: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListInstancesResponse {
    #[prost(message, repeated, tag = "1")]
    pub instances: Vec<Instance>,
    #[prost(string, tag = "2")]
    pub next_page_token: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UpdateInstanceRequest {
    #[prost(string, tag = "1")]
    pub instance_id: String,
    #[prost(message, optional, tag = "2")]
    pub update_mask: Option<::prost_types::FieldMask>,
    #[prost(string, tag = "3")]
    pub name: String,
    #[prost(string, tag = "4")]
    pub description: String,
    #[prost(map = "string, string", tag = "5")]
    pub labels: HashMap<String, String>,
    #[prost(map = "string, string", tag = "6")]
    pub metadata: HashMap<String, String>,
    #[prost(message, optional, tag = "7")]
    pub resources: Option<Resources>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeleteInstanceRequest {
    #[prost(string, tag = "1")]
    pub instance_id: String,
}
