//! `cirrus_mdb_mysql_cluster` resource.

use std::time::Duration;

use tracing::{debug, info};

use cirrus_common::api::mdb::{
    Cluster, ClusterConfig, CreateClusterRequest, DeleteClusterRequest, GetClusterRequest,
    UpdateClusterRequest, CLUSTER_STATUS_NAMES, ENVIRONMENT_NAMES,
};
use cirrus_common::{timefmt, Error, Result};

use crate::client::CloudApi;
use crate::config::ProviderConfig;
use crate::diag::Diagnostics;
use crate::ops::{retry_conflicting_operation, wait_operation};
use crate::schema::{AttributeSchema, AttributeType, Schema};
use crate::state::{
    bool_value, get_block, get_bool_attr, get_map_attr, get_optional_string_attr, get_string_attr,
    get_string_list, make_state, string_list_value, string_map_value, string_value, DynamicValue,
};

use super::{flatten_enum, mdb_common, read_result, CreateFailure, Resource};

const CREATE_TIMEOUT: Duration = Duration::from_secs(30 * 60);
const UPDATE_TIMEOUT: Duration = Duration::from_secs(60 * 60);
const DELETE_TIMEOUT: Duration = Duration::from_secs(15 * 60);

/// Mutable fields, sent in full on every update.
const UPDATE_MASK: &[&str] = &[
    "name",
    "description",
    "labels",
    "config_spec",
    "security_group_ids",
    "deletion_protection",
    "maintenance_window",
];

pub struct MysqlCluster;

#[async_trait::async_trait]
impl Resource for MysqlCluster {
    fn type_name() -> &'static str {
        "cirrus_mdb_mysql_cluster"
    }

    fn schema() -> Schema {
        Schema::new(
            "A managed MySQL cluster.",
            vec![
                AttributeSchema::new("name", AttributeType::String).required(),
                AttributeSchema::new("description", AttributeType::String),
                AttributeSchema::new("folder_id", AttributeType::String)
                    .computed()
                    .force_new(),
                AttributeSchema::new("environment", AttributeType::String)
                    .required()
                    .force_new()
                    .description("PRODUCTION or PRESTABLE."),
                AttributeSchema::new("version", AttributeType::String).required(),
                AttributeSchema::new(
                    "resources",
                    AttributeType::Block(Schema::new(
                        "",
                        vec![
                            AttributeSchema::new("resource_preset_id", AttributeType::String)
                                .required(),
                            AttributeSchema::new("disk_size", AttributeType::Int)
                                .required()
                                .description("Disk size in gigabytes."),
                            AttributeSchema::new("disk_type_id", AttributeType::String),
                        ],
                    )),
                )
                .required()
                .max_items(1),
                AttributeSchema::new(
                    "backup_window_start",
                    AttributeType::Block(Schema::new(
                        "",
                        vec![
                            AttributeSchema::new("hours", AttributeType::Int),
                            AttributeSchema::new("minutes", AttributeType::Int),
                        ],
                    )),
                )
                .max_items(1)
                .computed(),
                AttributeSchema::new(
                    "maintenance_window",
                    AttributeType::Block(Schema::new(
                        "",
                        vec![
                            AttributeSchema::new("type", AttributeType::String).required(),
                            AttributeSchema::new("day", AttributeType::String),
                            AttributeSchema::new("hour", AttributeType::Int),
                        ],
                    )),
                )
                .max_items(1)
                .computed(),
                AttributeSchema::new("labels", AttributeType::Map(Box::new(AttributeType::String))),
                AttributeSchema::new(
                    "security_group_ids",
                    AttributeType::Set(Box::new(AttributeType::String)),
                ),
                AttributeSchema::new("deletion_protection", AttributeType::Bool)
                    .default_value(bool_value(false)),
                AttributeSchema::new("status", AttributeType::String).computed(),
                AttributeSchema::new("created_at", AttributeType::String).computed(),
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
        let request = expand_create_request(cfg, config, &mut diags)?;
        diags.into_result()?;

        debug!(name = %request.name, folder_id = %request.folder_id, "creating MySQL cluster");
        let op = retry_conflicting_operation(|| {
            let request = request.clone();
            async move { api.create_cluster(request).await }
        })
        .await?;

        let mut cluster_id = op.resource_id.clone();
        match wait_operation(
            api,
            op,
            config.poll_interval,
            config.create_timeout(CREATE_TIMEOUT),
        )
        .await
        {
            Ok(done) => {
                if cluster_id.is_empty() {
                    cluster_id = done.resource_id;
                }
            }
            Err(e) if !cluster_id.is_empty() => {
                return Err(CreateFailure::partial(cluster_id, e))
            }
            Err(e) => return Err(e.into()),
        }
        if cluster_id.is_empty() {
            return Err(Error::Internal(
                "create operation did not report a cluster ID".to_string(),
            )
            .into());
        }

        let cluster = api
            .get_cluster(GetClusterRequest {
                cluster_id: cluster_id.clone(),
            })
            .await
            .map_err(|e| CreateFailure::partial(cluster_id.clone(), e))?;
        info!(%cluster_id, "MySQL cluster created");
        Ok(flatten_cluster(&cluster))
    }

    async fn read(
        api: &dyn CloudApi,
        _config: &ProviderConfig,
        state: &DynamicValue,
    ) -> Result<Option<DynamicValue>> {
        let cluster_id = get_string_attr(state, "id");
        match read_result(api.get_cluster(GetClusterRequest { cluster_id: cluster_id.clone() }).await)? {
            Some(cluster) => Ok(Some(flatten_cluster(&cluster))),
            None => {
                debug!(%cluster_id, "MySQL cluster is gone, removing from state");
                Ok(None)
            }
        }
    }

    async fn update(
        api: &dyn CloudApi,
        config: &ProviderConfig,
        state: &DynamicValue,
        cfg: &DynamicValue,
    ) -> Result<DynamicValue> {
        let cluster_id = get_string_attr(state, "id");
        let mut diags = Diagnostics::new();
        Self::schema().validate(cfg, &mut diags);
        let config_spec = expand_cluster_config(cfg, &mut diags);
        let maintenance_window = get_block(cfg, "maintenance_window")
            .and_then(|block| mdb_common::expand_maintenance_window(block, &mut diags));
        diags.into_result()?;

        debug!(%cluster_id, "updating MySQL cluster");
        let request = UpdateClusterRequest {
            cluster_id: cluster_id.clone(),
            update_mask: Some(prost_types::FieldMask {
                paths: UPDATE_MASK.iter().map(|p| p.to_string()).collect(),
            }),
            name: get_string_attr(cfg, "name"),
            description: get_string_attr(cfg, "description"),
            labels: get_map_attr(cfg, "labels"),
            config_spec: Some(config_spec),
            security_group_ids: get_string_list(cfg, "security_group_ids"),
            deletion_protection: get_bool_attr(cfg, "deletion_protection", false),
            maintenance_window,
        };
        let op = retry_conflicting_operation(|| {
            let request = request.clone();
            async move { api.update_cluster(request).await }
        })
        .await?;
        wait_operation(
            api,
            op,
            config.poll_interval,
            config.update_timeout(UPDATE_TIMEOUT),
        )
        .await?;

        let cluster = api.get_cluster(GetClusterRequest { cluster_id }).await?;
        Ok(flatten_cluster(&cluster))
    }

    async fn delete(
        api: &dyn CloudApi,
        config: &ProviderConfig,
        state: &DynamicValue,
    ) -> Result<()> {
        let cluster_id = get_string_attr(state, "id");
        debug!(%cluster_id, "deleting MySQL cluster");
        let request = DeleteClusterRequest {
            cluster_id: cluster_id.clone(),
        };
        let op = match retry_conflicting_operation(|| {
            let request = request.clone();
            async move { api.delete_cluster(request).await }
        })
        .await
        {
            Ok(op) => op,
            Err(e) if e.is_not_found() => {
                debug!(%cluster_id, "MySQL cluster already deleted");
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
                info!(%cluster_id, "MySQL cluster deleted");
                Ok(())
            }
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e),
        }
    }
}

fn expand_create_request(
    cfg: &DynamicValue,
    provider: &ProviderConfig,
    diags: &mut Diagnostics,
) -> Result<CreateClusterRequest> {
    let folder_id = provider.resolve_folder_id(get_optional_string_attr(cfg, "folder_id"))?;
    let environment =
        mdb_common::expand_environment(&get_string_attr(cfg, "environment"), diags);
    let maintenance_window = get_block(cfg, "maintenance_window")
        .and_then(|block| mdb_common::expand_maintenance_window(block, diags));
    Ok(CreateClusterRequest {
        folder_id,
        name: get_string_attr(cfg, "name"),
        description: get_string_attr(cfg, "description"),
        labels: get_map_attr(cfg, "labels"),
        environment,
        config_spec: Some(expand_cluster_config(cfg, diags)),
        security_group_ids: get_string_list(cfg, "security_group_ids"),
        deletion_protection: get_bool_attr(cfg, "deletion_protection", false),
        maintenance_window,
    })
}

fn expand_cluster_config(cfg: &DynamicValue, diags: &mut Diagnostics) -> ClusterConfig {
    let resources = match get_block(cfg, "resources") {
        Some(block) => Some(mdb_common::expand_resources(block, diags)),
        None => {
            diags.add_attribute_error("resources", "block must be set");
            None
        }
    };
    ClusterConfig {
        version: get_string_attr(cfg, "version"),
        resources,
        backup_window_start: get_block(cfg, "backup_window_start")
            .map(|block| mdb_common::expand_backup_window(block, diags)),
    }
}

fn flatten_cluster(cluster: &Cluster) -> DynamicValue {
    let config = cluster.config.as_ref();
    let mut security_group_ids = cluster.security_group_ids.clone();
    security_group_ids.sort();
    make_state(vec![
        ("id", string_value(&cluster.id)),
        ("folder_id", string_value(&cluster.folder_id)),
        ("name", string_value(&cluster.name)),
        ("description", string_value(&cluster.description)),
        ("labels", string_map_value(&cluster.labels)),
        (
            "environment",
            string_value(flatten_enum(cluster.environment, ENVIRONMENT_NAMES)),
        ),
        (
            "version",
            string_value(config.map(|c| c.version.as_str()).unwrap_or("")),
        ),
        (
            "resources",
            match config.and_then(|c| c.resources.as_ref()) {
                Some(resources) => mdb_common::flatten_resources(resources),
                None => DynamicValue::Null,
            },
        ),
        (
            "backup_window_start",
            match config.and_then(|c| c.backup_window_start.as_ref()) {
                Some(window) => mdb_common::flatten_backup_window(window),
                None => DynamicValue::Null,
            },
        ),
        (
            "maintenance_window",
            match &cluster.maintenance_window {
                Some(window) => mdb_common::flatten_maintenance_window(window),
                None => DynamicValue::Null,
            },
        ),
        ("security_group_ids", string_list_value(security_group_ids)),
        (
            "deletion_protection",
            bool_value(cluster.deletion_protection),
        ),
        (
            "status",
            string_value(flatten_enum(cluster.status, CLUSTER_STATUS_NAMES)),
        ),
        (
            "created_at",
            match &cluster.created_at {
                Some(ts) => string_value(timefmt::format_timestamp(ts)),
                None => DynamicValue::Null,
            },
        ),
    ])
}
