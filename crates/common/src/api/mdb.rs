//! Managed MySQL service messages (`cirrus.mdb.mysql.v1`).

use std::collections::HashMap;

use super::EnumTable;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum Environment {
    Unspecified = 0,
    Production = 1,
    Prestable = 2,
}

pub const ENVIRONMENT_NAMES: EnumTable = &[
    ("ENVIRONMENT_UNSPECIFIED", 0),
    ("PRODUCTION", 1),
    ("PRESTABLE", 2),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ClusterStatus {
    Unknown = 0,
    Creating = 1,
    Running = 2,
    Error = 3,
    Updating = 4,
    Stopping = 5,
    Stopped = 6,
    Starting = 7,
}

pub const CLUSTER_STATUS_NAMES: EnumTable = &[
    ("STATUS_UNKNOWN", 0),
    ("CREATING", 1),
    ("RUNNING", 2),
    ("ERROR", 3),
    ("UPDATING", 4),
    ("STOPPING", 5),
    ("STOPPED", 6),
    ("STARTING", 7),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum AuthPlugin {
    Unspecified = 0,
    MysqlNativePassword = 1,
    CachingSha2Password = 2,
    Sha256Password = 3,
}

pub const AUTH_PLUGIN_NAMES: EnumTable = &[
    ("AUTH_PLUGIN_UNSPECIFIED", 0),
    ("MYSQL_NATIVE_PASSWORD", 1),
    ("CACHING_SHA2_PASSWORD", 2),
    ("SHA256_PASSWORD", 3),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum GlobalPermission {
    Unspecified = 0,
    ReplicationClient = 1,
    ReplicationSlave = 2,
    Process = 3,
    FlushOptimizerCosts = 4,
    ShowRoutine = 5,
    MdbAdmin = 6,
}

pub const GLOBAL_PERMISSION_NAMES: EnumTable = &[
    ("GLOBAL_PERMISSION_UNSPECIFIED", 0),
    ("REPLICATION_CLIENT", 1),
    ("REPLICATION_SLAVE", 2),
    ("PROCESS", 3),
    ("FLUSH_OPTIMIZER_COSTS", 4),
    ("SHOW_ROUTINE", 5),
    ("MDB_ADMIN", 6),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum DatabaseRole {
    Unspecified = 0,
    All = 1,
    Alter = 2,
    Create = 3,
    Delete = 4,
    Drop = 5,
    Insert = 6,
    Select = 7,
    Update = 8,
}

pub const DATABASE_ROLE_NAMES: EnumTable = &[
    ("ROLE_UNSPECIFIED", 0),
    ("ALL", 1),
    ("ALTER", 2),
    ("CREATE", 3),
    ("DELETE", 4),
    ("DROP", 5),
    ("INSERT", 6),
    ("SELECT", 7),
    ("UPDATE", 8),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum WeekDay {
    Unspecified = 0,
    Mon = 1,
    Tue = 2,
    Wed = 3,
    Thu = 4,
    Fri = 5,
    Sat = 6,
    Sun = 7,
}

pub const WEEK_DAY_NAMES: EnumTable = &[
    ("WEEK_DAY_UNSPECIFIED", 0),
    ("MON", 1),
    ("TUE", 2),
    ("WED", 3),
    ("THU", 4),
    ("FRI", 5),
    ("SAT", 6),
    ("SUN", 7),
];

/// Cluster host capacity. `disk_size` is in bytes.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Resources {
    #[prost(string, tag = "1")]
    pub resource_preset_id: String,
    #[prost(int64, tag = "2")]
    pub disk_size: i64,
    #[prost(string, tag = "3")]
    pub disk_type_id: String,
}

/// `google.type.TimeOfDay` subset used for backup windows.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TimeOfDay {
    #[prost(int32, tag = "1")]
    pub hours: i32,
    #[prost(int32, tag = "2")]
    pub minutes: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ClusterConfig {
    #[prost(string, tag = "1")]
    pub version: String,
    #[prost(message, optional, tag = "2")]
    pub resources: Option<Resources>,
    #[prost(message, optional, tag = "3")]
    pub backup_window_start: Option<TimeOfDay>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Anytime {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct WeeklyMaintenanceWindow {
    #[prost(enumeration = "WeekDay", tag = "1")]
    pub day: i32,
    #[prost(int64, tag = "2")]
    pub hour: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MaintenanceWindow {
    #[prost(oneof = "maintenance_window::Policy", tags = "1, 2")]
    pub policy: Option<maintenance_window::Policy>,
}

pub mod maintenance_window {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Policy {
        #[prost(message, tag = "1")]
        Anytime(super::Anytime),
        #[prost(message, tag = "2")]
        WeeklyMaintenanceWindow(super::WeeklyMaintenanceWindow),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Cluster {
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
    #[prost(enumeration = "Environment", tag = "7")]
    pub environment: i32,
    #[prost(message, optional, tag = "8")]
    pub config: Option<ClusterConfig>,
    #[prost(enumeration = "ClusterStatus", tag = "9")]
    pub status: i32,
    #[prost(string, repeated, tag = "10")]
    pub security_group_ids: Vec<String>,
    #[prost(bool, tag = "11")]
    pub deletion_protection: bool,
    #[prost(message, optional, tag = "12")]
    pub maintenance_window: Option<MaintenanceWindow>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CreateClusterRequest {
    #[prost(string, tag = "1")]
    pub folder_id: String,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(string, tag = "3")]
    pub description: String,
    #[prost(map = "string, string", tag = "4")]
    pub labels: HashMap<String, String>,
    #[prost(enumeration = "Environment", tag = "5")]
    pub environment: i32,
    #[prost(message, optional, tag = "6")]
    pub config_spec: Option<ClusterConfig>,
    #[prost(string, repeated, tag = "7")]
    pub security_group_ids: Vec<String>,
    #[prost(bool, tag = "8")]
    pub deletion_protection: bool,
    #[prost(message, optional, tag = "9")]
    pub maintenance_window: Option<MaintenanceWindow>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetClusterRequest {
    #[prost(string, tag = "1")]
    pub cluster_id: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UpdateClusterRequest {
    #[prost(string, tag = "1")]
    pub cluster_id: String,
    #[prost(message, optional, tag = "2")]
    pub update_mask: Option<::prost_types::FieldMask>,
    #[prost(string, tag = "3")]
    pub name: String,
    #[prost(string, tag = "4")]
    pub description: String,
    #[prost(map = "string, string", tag = "5")]
    pub labels: HashMap<String, String>,
    #[prost(message, optional, tag = "6")]
    pub config_spec: Option<ClusterConfig>,
    #[prost(string, repeated, tag = "7")]
    pub security_group_ids: Vec<String>,
    #[prost(bool, tag = "8")]
    pub deletion_protection: bool,
    #[prost(message, optional, tag = "9")]
    pub maintenance_window: Option<MaintenanceWindow>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeleteClusterRequest {
    #[prost(string, tag = "1")]
    pub cluster_id: String,
}

/// Grant of database-scoped roles to a user.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Permission {
    #[prost(string, tag = "1")]
    pub database_name: String,
    #[prost(enumeration = "DatabaseRole", repeated, tag = "2")]
    pub roles: Vec<i32>,
}

/// Per-user connection limits. Absent fields mean "no change"; `-1`
/// selects the server-side default.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ConnectionLimits {
    #[prost(message, optional, tag = "1")]
    pub max_questions_per_hour: Option<i64>,
    #[prost(message, optional, tag = "2")]
    pub max_updates_per_hour: Option<i64>,
    #[prost(message, optional, tag = "3")]
    pub max_connections_per_hour: Option<i64>,
    #[prost(message, optional, tag = "4")]
    pub max_user_connections: Option<i64>,
}

/// Connection pooler coordinates, filled in by the platform.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ConnectionManager {
    #[prost(string, tag = "1")]
    pub connection_id: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct User {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub cluster_id: String,
    #[prost(message, repeated, tag = "3")]
    pub permissions: Vec<Permission>,
    #[prost(enumeration = "GlobalPermission", repeated, tag = "4")]
    pub global_permissions: Vec<i32>,
    #[prost(message, optional, tag = "5")]
    pub connection_limits: Option<ConnectionLimits>,
    #[prost(enumeration = "AuthPlugin", tag = "6")]
    pub authentication_plugin: i32,
    #[prost(message, optional, tag = "7")]
    pub connection_manager: Option<ConnectionManager>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UserSpec {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub password: String,
    #[prost(message, repeated, tag = "3")]
    pub permissions: Vec<Permission>,
    #[prost(enumeration = "GlobalPermission", repeated, tag = "4")]
    pub global_permissions: Vec<i32>,
    #[prost(message, optional, tag = "5")]
    pub connection_limits: Option<ConnectionLimits>,
    #[prost(enumeration = "AuthPlugin", tag = "6")]
    pub authentication_plugin: i32,
    /// Wrapper-typed so that "unset" and "false" stay distinct.
    #[prost(message, optional, tag = "7")]
    pub generate_password: Option<bool>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CreateUserRequest {
    #[prost(string, tag = "1")]
    pub cluster_id: String,
    #[prost(message, optional, tag = "2")]
    pub user_spec: Option<UserSpec>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetUserRequest {
    #[prost(string, tag = "1")]
    pub cluster_id: String,
    #[prost(string, tag = "2")]
    pub user_name: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UpdateUserRequest {
    #[prost(string, tag = "1")]
    pub cluster_id: String,
    #[prost(string, tag = "2")]
    pub user_name: String,
    #[prost(message, optional, tag = "3")]
    pub update_mask: Option<::prost_types::FieldMask>,
    #[prost(string, tag = "4")]
    pub password: String,
    #[prost(message, repeated, tag = "5")]
    pub permissions: Vec<Permission>,
    #[prost(enumeration = "GlobalPermission", repeated, tag = "6")]
    pub global_permissions: Vec<i32>,
    #[prost(message, optional, tag = "7")]
    pub connection_limits: Option<ConnectionLimits>,
    #[prost(enumeration = "AuthPlugin", tag = "8")]
    pub authentication_plugin: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeleteUserRequest {
    #[prost(string, tag = "1")]
    pub cluster_id: String,
    #[prost(string, tag = "2")]
    pub user_name: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Database {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub cluster_id: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DatabaseSpec {
    #[prost(string, tag = "1")]
    pub name: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CreateDatabaseRequest {
    #[prost(string, tag = "1")]
    pub cluster_id: String,
    #[prost(message, optional, tag = "2")]
    pub database_spec: Option<DatabaseSpec>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetDatabaseRequest {
    #[prost(string, tag = "1")]
    pub cluster_id: String,
    #[prost(string, tag = "2")]
    pub database_name: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeleteDatabaseRequest {
    #[prost(string, tag = "1")]
    pub cluster_id: String,
    #[prost(string, tag = "2")]
    pub database_name: String,
}
