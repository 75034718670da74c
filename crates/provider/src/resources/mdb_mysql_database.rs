//! `cirrus_mdb_mysql_database` resource.
//!
//! Databases carry no mutable attributes; both identifying attributes
//! force replacement, so the resource has create, read and delete only.

use std::time::Duration;

use tracing::{debug, info};

use cirrus_common::api::mdb::{
    CreateDatabaseRequest, Database, DatabaseSpec, DeleteDatabaseRequest, GetDatabaseRequest,
};
use cirrus_common::{Error, Result};

use crate::client::CloudApi;
use crate::config::ProviderConfig;
use crate::diag::Diagnostics;
use crate::id;
use crate::ops::{retry_conflicting_operation, wait_operation};
use crate::schema::{AttributeSchema, AttributeType, Schema};
use crate::state::{get_string_attr, make_state, string_value, DynamicValue};

use super::{read_result, CreateFailure, Resource};

const CREATE_TIMEOUT: Duration = Duration::from_secs(10 * 60);
const DELETE_TIMEOUT: Duration = Duration::from_secs(10 * 60);

pub struct MysqlDatabase;

#[async_trait::async_trait]
impl Resource for MysqlDatabase {
    fn type_name() -> &'static str {
        "cirrus_mdb_mysql_database"
    }

    fn schema() -> Schema {
        Schema::new(
            "A database inside a managed MySQL cluster.",
            vec![
                AttributeSchema::new("cluster_id", AttributeType::String)
                    .required()
                    .force_new(),
                AttributeSchema::new("name", AttributeType::String)
                    .required()
                    .force_new(),
            ],
        )
    }

    async fn create(
        api: &dyn CloudApi,
        config: &ProviderConfig,
        cfg: &DynamicValue,
    ) -> std::result::Result<DynamicValue, CreateFailure> {
        let mut diags = Diagnostics::new();
        Self::schema().validate(cfg, &mut diags);
        diags.into_result()?;
        let cluster_id = get_string_attr(cfg, "cluster_id");
        let name = get_string_attr(cfg, "name");

        debug!(%cluster_id, database = %name, "creating MySQL database");
        let request = CreateDatabaseRequest {
            cluster_id: cluster_id.clone(),
            database_spec: Some(DatabaseSpec { name: name.clone() }),
        };
        let op = retry_conflicting_operation(|| {
            let request = request.clone();
            async move { api.create_database(request).await }
        })
        .await?;

        let database_id = id::construct(&cluster_id, &name);
        wait_operation(
            api,
            op,
            config.poll_interval,
            config.create_timeout(CREATE_TIMEOUT),
        )
        .await
        .map_err(|e| CreateFailure::partial(database_id.clone(), e))?;

        let database = api
            .get_database(GetDatabaseRequest {
                cluster_id,
                database_name: name,
            })
            .await
            .map_err(|e| CreateFailure::partial(database_id.clone(), e))?;
        info!(%database_id, "MySQL database created");
        Ok(flatten_database(&database))
    }

    async fn read(
        api: &dyn CloudApi,
        _config: &ProviderConfig,
        state: &DynamicValue,
    ) -> Result<Option<DynamicValue>> {
        let database_id = get_string_attr(state, "id");
        let (cluster_id, database_name) = id::deconstruct(&database_id)?;
        match read_result(
            api.get_database(GetDatabaseRequest {
                cluster_id,
                database_name,
            })
            .await,
        )? {
            Some(database) => Ok(Some(flatten_database(&database))),
            None => {
                debug!(%database_id, "MySQL database is gone, removing from state");
                Ok(None)
            }
        }
    }

    async fn update(
        _api: &dyn CloudApi,
        _config: &ProviderConfig,
        _state: &DynamicValue,
        _cfg: &DynamicValue,
    ) -> Result<DynamicValue> {
        // Both attributes are force-new; the plan layer replaces instead.
        Err(Error::Internal(
            "MySQL databases cannot be updated in place".to_string(),
        ))
    }

    async fn delete(
        api: &dyn CloudApi,
        config: &ProviderConfig,
        state: &DynamicValue,
    ) -> Result<()> {
        let database_id = get_string_attr(state, "id");
        let (cluster_id, database_name) = id::deconstruct(&database_id)?;
        debug!(%database_id, "deleting MySQL database");
        let request = DeleteDatabaseRequest {
            cluster_id,
            database_name,
        };
        let op = match retry_conflicting_operation(|| {
            let request = request.clone();
            async move { api.delete_database(request).await }
        })
        .await
        {
            Ok(op) => op,
            Err(e) if e.is_not_found() => {
                debug!(%database_id, "MySQL database already deleted");
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        match wait_operation(
            api,
            op,
            config.poll_interval,
            config.delete_timeout(DELETE_TIMEOUT),
        )
        .await
        {
            Ok(_) => {
                info!(%database_id, "MySQL database deleted");
                Ok(())
            }
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// Data source read keyed by `cluster_id` and `name`.
pub async fn read_database_data_source(
    api: &dyn CloudApi,
    cfg: &DynamicValue,
) -> Result<DynamicValue> {
    let cluster_id = get_string_attr(cfg, "cluster_id");
    let database_name = get_string_attr(cfg, "name");
    if cluster_id.is_empty() || database_name.is_empty() {
        return Err(Error::InvalidConfig(
            "both cluster_id and name must be set".to_string(),
        ));
    }
    let database = api
        .get_database(GetDatabaseRequest {
            cluster_id,
            database_name,
        })
        .await?;
    Ok(flatten_database(&database))
}

fn flatten_database(database: &Database) -> DynamicValue {
    make_state(vec![
        (
            "id",
            string_value(id::construct(&database.cluster_id, &database.name)),
        ),
        ("cluster_id", string_value(&database.cluster_id)),
        ("name", string_value(&database.name)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_builds_composite_id() {
        let database = Database {
            name: "orders".into(),
            cluster_id: "c9qm1ab2".into(),
        };
        let state = flatten_database(&database);
        assert_eq!(get_string_attr(&state, "id"), "c9qm1ab2:orders");
        assert_eq!(get_string_attr(&state, "cluster_id"), "c9qm1ab2");
        assert_eq!(get_string_attr(&state, "name"), "orders");
    }

    struct OneDatabaseApi;

    #[async_trait::async_trait]
    impl CloudApi for OneDatabaseApi {
        async fn get_database(&self, request: GetDatabaseRequest) -> Result<Database> {
            Ok(Database {
                name: request.database_name,
                cluster_id: request.cluster_id,
            })
        }
    }

    #[tokio::test]
    async fn data_source_requires_both_keys() {
        let query = make_state(vec![
            ("cluster_id", string_value("c9qm1ab2")),
            ("name", string_value("orders")),
        ]);
        let state = read_database_data_source(&OneDatabaseApi, &query)
            .await
            .unwrap();
        assert_eq!(get_string_attr(&state, "id"), "c9qm1ab2:orders");

        let incomplete = make_state(vec![("cluster_id", string_value("c9qm1ab2"))]);
        let err = read_database_data_source(&OneDatabaseApi, &incomplete)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }
}
