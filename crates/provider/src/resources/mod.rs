//! Resource handlers.
//!
//! Each module declares one resource type: its schema, the expand and
//! flatten mappings between the configuration tree and wire messages,
//! and the CRUD handlers that drive the management API.

use async_trait::async_trait;

use cirrus_common::api::EnumTable;
use cirrus_common::{api, Error, Result};

use crate::client::CloudApi;
use crate::config::ProviderConfig;
use crate::diag::Diagnostics;
use crate::schema::Schema;
use crate::state::DynamicValue;

pub mod alb_backend_group;
pub mod alb_virtual_host;
pub mod compute_instance;
pub mod mdb_common;
pub mod mdb_mysql_cluster;
pub mod mdb_mysql_database;
pub mod mdb_mysql_user;

/// Create failure, with the resource ID when one was already assigned.
///
/// A create that fails after submission must still hand the ID back so
/// the half-created resource is tracked and can be retried or destroyed,
/// instead of leaking.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct CreateFailure {
    pub id: Option<String>,
    pub error: Error,
}

impl CreateFailure {
    /// Failure after the resource already has an identity.
    pub fn partial(id: impl Into<String>, error: Error) -> Self {
        Self {
            id: Some(id.into()),
            error,
        }
    }
}

impl From<Error> for CreateFailure {
    fn from(error: Error) -> Self {
        Self { id: None, error }
    }
}

/// CRUD surface of a managed resource type.
#[async_trait]
pub trait Resource {
    fn type_name() -> &'static str;

    fn schema() -> Schema;

    /// Create the resource and return its full state.
    async fn create(
        api: &dyn CloudApi,
        config: &ProviderConfig,
        cfg: &DynamicValue,
    ) -> std::result::Result<DynamicValue, CreateFailure>;

    /// Read current state. `Ok(None)` means the resource is gone and
    /// must be removed from state.
    async fn read(
        api: &dyn CloudApi,
        config: &ProviderConfig,
        state: &DynamicValue,
    ) -> Result<Option<DynamicValue>>;

    /// Apply the configuration to an existing resource and return the
    /// refreshed state.
    async fn update(
        api: &dyn CloudApi,
        config: &ProviderConfig,
        state: &DynamicValue,
        cfg: &DynamicValue,
    ) -> Result<DynamicValue>;

    /// Delete the resource. Deleting a resource that no longer exists
    /// succeeds.
    async fn delete(
        api: &dyn CloudApi,
        config: &ProviderConfig,
        state: &DynamicValue,
    ) -> Result<()>;
}

/// Schemas of every resource type the provider serves.
pub fn resource_schemas() -> Vec<(&'static str, Schema)> {
    vec![
        (
            compute_instance::ComputeInstance::type_name(),
            compute_instance::ComputeInstance::schema(),
        ),
        (
            mdb_mysql_cluster::MysqlCluster::type_name(),
            mdb_mysql_cluster::MysqlCluster::schema(),
        ),
        (
            mdb_mysql_user::MysqlUser::type_name(),
            mdb_mysql_user::MysqlUser::schema(),
        ),
        (
            mdb_mysql_database::MysqlDatabase::type_name(),
            mdb_mysql_database::MysqlDatabase::schema(),
        ),
        (
            alb_backend_group::AlbBackendGroup::type_name(),
            alb_backend_group::AlbBackendGroup::schema(),
        ),
        (
            alb_virtual_host::AlbVirtualHost::type_name(),
            alb_virtual_host::AlbVirtualHost::schema(),
        ),
    ]
}

/// Map a protobuf enum name from configuration to its wire ordinal.
///
/// Unknown names and the zero "unspecified" member produce a diagnostic
/// listing the accepted values.
pub(crate) fn expand_enum(
    attribute: &str,
    value: &str,
    table: EnumTable,
    diags: &mut Diagnostics,
) -> i32 {
    match api::enum_value(table, value) {
        Some(v) if v != 0 => v,
        _ => {
            diags.add_attribute_error(
                attribute,
                format!(
                    "value {value:?} is not supported, allowed: {}",
                    api::enum_allowed(table).join(", ")
                ),
            );
            0
        }
    }
}

/// Wire ordinal back to its protobuf name; unknown ordinals flatten to
/// an empty string rather than failing a refresh.
pub(crate) fn flatten_enum(value: i32, table: EnumTable) -> String {
    api::enum_name(table, value).unwrap_or("").to_string()
}

/// Not-found from a read is "resource gone", everything else is an error.
pub(crate) fn read_result<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cirrus_common::api::mdb::ENVIRONMENT_NAMES;

    #[test]
    fn expand_enum_accepts_known_names() {
        let mut diags = Diagnostics::new();
        assert_eq!(
            expand_enum("environment", "PRESTABLE", ENVIRONMENT_NAMES, &mut diags),
            2
        );
        assert!(!diags.has_errors());
    }

    #[test]
    fn expand_enum_lists_allowed_values() {
        let mut diags = Diagnostics::new();
        expand_enum("environment", "STAGING", ENVIRONMENT_NAMES, &mut diags);
        let err = diags.into_result().unwrap_err().to_string();
        assert!(err.contains("PRODUCTION"), "{err}");
        assert!(err.contains("PRESTABLE"), "{err}");
        assert!(err.contains("STAGING"), "{err}");
    }

    #[test]
    fn expand_enum_rejects_unspecified() {
        let mut diags = Diagnostics::new();
        expand_enum(
            "environment",
            "ENVIRONMENT_UNSPECIFIED",
            ENVIRONMENT_NAMES,
            &mut diags,
        );
        assert!(diags.has_errors());
    }

    #[test]
    fn every_resource_declares_a_schema() {
        let schemas = resource_schemas();
        assert_eq!(schemas.len(), 6);
        for (name, schema) in schemas {
            assert!(name.starts_with("cirrus_"), "{name}");
            assert!(!schema.attributes.is_empty(), "{name}");
        }
    }
}
