//! `cirrus_mdb_mysql_user` resource.
//!
//! Users are sub-resources of a MySQL cluster and have no ID of their
//! own; the Terraform ID is `<cluster_id>:<name>`. All mutations go
//! through the cluster and can collide with other operations on it, so
//! every submission runs under the conflict retry.

use std::time::Duration;

use tracing::{debug, info};

use cirrus_common::api::mdb::{
    ConnectionLimits, CreateUserRequest, DeleteUserRequest, GetUserRequest, Permission,
    UpdateUserRequest, User, UserSpec, AUTH_PLUGIN_NAMES, DATABASE_ROLE_NAMES,
    GLOBAL_PERMISSION_NAMES,
};
use cirrus_common::{Error, Result};

use crate::client::CloudApi;
use crate::config::ProviderConfig;
use crate::diag::Diagnostics;
use crate::id;
use crate::ops::{retry_conflicting_operation, wait_operation};
use crate::schema::{AttributeSchema, AttributeType, Schema};
use crate::state::{
    block_value, bool_value, get_block, get_optional_bool_attr, get_optional_int_attr,
    get_optional_string_attr, get_string_attr, get_string_list, int_value, make_state,
    string_list_value, string_value, DynamicValue,
};

use super::{expand_enum, flatten_enum, read_result, CreateFailure, Resource};

const CREATE_TIMEOUT: Duration = Duration::from_secs(10 * 60);
const UPDATE_TIMEOUT: Duration = Duration::from_secs(10 * 60);
const DELETE_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Mutable fields, sent in full on every update.
const UPDATE_MASK: &[&str] = &[
    "authentication_plugin",
    "password",
    "permissions",
    "connection_limits",
    "global_permissions",
];

pub struct MysqlUser;

#[async_trait::async_trait]
impl Resource for MysqlUser {
    fn type_name() -> &'static str {
        "cirrus_mdb_mysql_user"
    }

    fn schema() -> Schema {
        Schema::new(
            "A user of a managed MySQL cluster.",
            vec![
                AttributeSchema::new("cluster_id", AttributeType::String)
                    .required()
                    .force_new(),
                AttributeSchema::new("name", AttributeType::String)
                    .required()
                    .force_new(),
                AttributeSchema::new("password", AttributeType::String)
                    .sensitive()
                    .description("Plain-text password. Conflicts with generate_password."),
                AttributeSchema::new("generate_password", AttributeType::Bool)
                    .default_value(bool_value(false))
                    .description("Let the platform generate the password."),
                AttributeSchema::new(
                    "permission",
                    AttributeType::Block(Schema::new(
                        "",
                        vec![
                            AttributeSchema::new("database_name", AttributeType::String)
                                .required(),
                            AttributeSchema::new(
                                "roles",
                                AttributeType::List(Box::new(AttributeType::String)),
                            ),
                        ],
                    )),
                )
                .computed(),
                AttributeSchema::new(
                    "global_permissions",
                    AttributeType::Set(Box::new(AttributeType::String)),
                )
                .computed(),
                AttributeSchema::new(
                    "connection_limits",
                    AttributeType::Block(Schema::new(
                        "",
                        vec![
                            AttributeSchema::new("max_questions_per_hour", AttributeType::Int)
                                .default_value(int_value(-1)),
                            AttributeSchema::new("max_updates_per_hour", AttributeType::Int)
                                .default_value(int_value(-1)),
                            AttributeSchema::new("max_connections_per_hour", AttributeType::Int)
                                .default_value(int_value(-1)),
                            AttributeSchema::new("max_user_connections", AttributeType::Int)
                                .default_value(int_value(-1)),
                        ],
                    )),
                )
                .max_items(1)
                .computed(),
                AttributeSchema::new("authentication_plugin", AttributeType::String).computed(),
                AttributeSchema::new(
                    "connection_manager",
                    AttributeType::Map(Box::new(AttributeType::String)),
                )
                .computed(),
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
        let cluster_id = get_string_attr(cfg, "cluster_id");
        let spec = expand_user_spec(cfg, &mut diags);
        diags.into_result()?;
        check_password_configuration(&spec)?;

        let user_name = spec.name.clone();
        debug!(%cluster_id, user = %user_name, "creating MySQL user");
        let request = CreateUserRequest {
            cluster_id: cluster_id.clone(),
            user_spec: Some(spec),
        };
        let op = retry_conflicting_operation(|| {
            let request = request.clone();
            async move { api.create_user(request).await }
        })
        .await?;

        // From here on the user has an identity; failures must keep it.
        let user_id = id::construct(&cluster_id, &user_name);
        wait_operation(
            api,
            op,
            config.poll_interval,
            config.create_timeout(CREATE_TIMEOUT),
        )
        .await
        .map_err(|e| CreateFailure::partial(user_id.clone(), e))?;

        let user = api
            .get_user(GetUserRequest {
                cluster_id,
                user_name,
            })
            .await
            .map_err(|e| CreateFailure::partial(user_id.clone(), e))?;
        info!(%user_id, "MySQL user created");
        let mut state = flatten_user(&user);
        carry_sensitive(cfg, &mut state);
        Ok(state)
    }

    async fn read(
        api: &dyn CloudApi,
        _config: &ProviderConfig,
        state: &DynamicValue,
    ) -> Result<Option<DynamicValue>> {
        let user_id = get_string_attr(state, "id");
        let (cluster_id, user_name) = id::deconstruct(&user_id)?;
        match read_result(
            api.get_user(GetUserRequest {
                cluster_id,
                user_name,
            })
            .await,
        )? {
            Some(user) => {
                let mut new_state = flatten_user(&user);
                carry_sensitive(state, &mut new_state);
                Ok(Some(new_state))
            }
            None => {
                debug!(%user_id, "MySQL user is gone, removing from state");
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
        let user_id = get_string_attr(state, "id");
        let (cluster_id, user_name) = id::deconstruct(&user_id)?;

        let mut diags = Diagnostics::new();
        Self::schema().validate(cfg, &mut diags);
        let spec = expand_user_spec(cfg, &mut diags);
        diags.into_result()?;
        check_password_configuration(&spec)?;

        debug!(%user_id, "updating MySQL user");
        let request = UpdateUserRequest {
            cluster_id: cluster_id.clone(),
            user_name: user_name.clone(),
            update_mask: Some(prost_types::FieldMask {
                paths: UPDATE_MASK.iter().map(|p| p.to_string()).collect(),
            }),
            password: spec.password,
            permissions: spec.permissions,
            global_permissions: spec.global_permissions,
            connection_limits: spec.connection_limits,
            authentication_plugin: spec.authentication_plugin,
        };
        let op = retry_conflicting_operation(|| {
            let request = request.clone();
            async move { api.update_user(request).await }
        })
        .await?;
        wait_operation(
            api,
            op,
            config.poll_interval,
            config.update_timeout(UPDATE_TIMEOUT),
        )
        .await?;

        let user = api
            .get_user(GetUserRequest {
                cluster_id,
                user_name,
            })
            .await?;
        let mut new_state = flatten_user(&user);
        carry_sensitive(cfg, &mut new_state);
        Ok(new_state)
    }

    async fn delete(
        api: &dyn CloudApi,
        config: &ProviderConfig,
        state: &DynamicValue,
    ) -> Result<()> {
        let user_id = get_string_attr(state, "id");
        let (cluster_id, user_name) = id::deconstruct(&user_id)?;
        debug!(%user_id, "deleting MySQL user");
        let request = DeleteUserRequest {
            cluster_id,
            user_name,
        };
        let op = match retry_conflicting_operation(|| {
            let request = request.clone();
            async move { api.delete_user(request).await }
        })
        .await
        {
            Ok(op) => op,
            Err(e) if e.is_not_found() => {
                debug!(%user_id, "MySQL user already deleted");
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
                info!(%user_id, "MySQL user deleted");
                Ok(())
            }
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// Data source read keyed by `cluster_id` and `name`.
pub async fn read_user_data_source(
    api: &dyn CloudApi,
    cfg: &DynamicValue,
) -> Result<DynamicValue> {
    let cluster_id = get_string_attr(cfg, "cluster_id");
    let user_name = get_string_attr(cfg, "name");
    if cluster_id.is_empty() || user_name.is_empty() {
        return Err(Error::InvalidConfig(
            "both cluster_id and name must be set".to_string(),
        ));
    }
    let user = api
        .get_user(GetUserRequest {
            cluster_id,
            user_name,
        })
        .await?;
    Ok(flatten_user(&user))
}

fn expand_user_spec(cfg: &DynamicValue, diags: &mut Diagnostics) -> UserSpec {
    UserSpec {
        name: get_string_attr(cfg, "name"),
        password: get_string_attr(cfg, "password"),
        permissions: expand_permissions(cfg, diags),
        global_permissions: expand_global_permissions(cfg, diags),
        connection_limits: get_block(cfg, "connection_limits").map(expand_connection_limits),
        authentication_plugin: match get_optional_string_attr(cfg, "authentication_plugin") {
            Some(plugin) => expand_enum("authentication_plugin", &plugin, AUTH_PLUGIN_NAMES, diags),
            None => 0,
        },
        generate_password: get_optional_bool_attr(cfg, "generate_password"),
    }
}

/// A user must get its password exactly one way: either a literal
/// `password` or `generate_password = true`.
fn check_password_configuration(spec: &UserSpec) -> Result<()> {
    let has_password = !spec.password.is_empty();
    let generated = spec.generate_password == Some(true);
    if has_password == generated {
        return Err(Error::InvalidConfig(
            "must specify either password or generate_password".to_string(),
        ));
    }
    Ok(())
}

fn expand_permissions(cfg: &DynamicValue, diags: &mut Diagnostics) -> Vec<Permission> {
    let blocks = match cfg.get("permission").and_then(|v| v.as_list()) {
        Some(blocks) => blocks,
        None => return Vec::new(),
    };
    blocks
        .iter()
        .enumerate()
        .map(|(i, block)| Permission {
            database_name: get_string_attr(block, "database_name"),
            roles: get_string_list(block, "roles")
                .iter()
                .map(|role| {
                    expand_enum(
                        &format!("permission.{i}.roles"),
                        role,
                        DATABASE_ROLE_NAMES,
                        diags,
                    )
                })
                .collect(),
        })
        .collect()
}

fn flatten_permissions(permissions: &[Permission]) -> DynamicValue {
    let mut sorted: Vec<&Permission> = permissions.iter().collect();
    sorted.sort_by(|a, b| a.database_name.cmp(&b.database_name));
    DynamicValue::List(
        sorted
            .into_iter()
            .map(|p| {
                make_state(vec![
                    ("database_name", string_value(&p.database_name)),
                    (
                        "roles",
                        DynamicValue::List(
                            p.roles
                                .iter()
                                .map(|&r| string_value(flatten_enum(r, DATABASE_ROLE_NAMES)))
                                .collect(),
                        ),
                    ),
                ])
            })
            .collect(),
    )
}

fn expand_global_permissions(cfg: &DynamicValue, diags: &mut Diagnostics) -> Vec<i32> {
    get_string_list(cfg, "global_permissions")
        .iter()
        .map(|name| expand_enum("global_permissions", name, GLOBAL_PERMISSION_NAMES, diags))
        .collect()
}

fn flatten_global_permissions(permissions: &[i32]) -> DynamicValue {
    let mut names: Vec<String> = permissions
        .iter()
        .map(|&p| flatten_enum(p, GLOBAL_PERMISSION_NAMES))
        .collect();
    names.sort();
    string_list_value(names)
}

fn expand_connection_limits(block: &DynamicValue) -> ConnectionLimits {
    ConnectionLimits {
        max_questions_per_hour: get_optional_int_attr(block, "max_questions_per_hour"),
        max_updates_per_hour: get_optional_int_attr(block, "max_updates_per_hour"),
        max_connections_per_hour: get_optional_int_attr(block, "max_connections_per_hour"),
        max_user_connections: get_optional_int_attr(block, "max_user_connections"),
    }
}

fn flatten_connection_limits(limits: &ConnectionLimits) -> DynamicValue {
    block_value(vec![
        (
            "max_questions_per_hour",
            int_value(limits.max_questions_per_hour.unwrap_or(-1)),
        ),
        (
            "max_updates_per_hour",
            int_value(limits.max_updates_per_hour.unwrap_or(-1)),
        ),
        (
            "max_connections_per_hour",
            int_value(limits.max_connections_per_hour.unwrap_or(-1)),
        ),
        (
            "max_user_connections",
            int_value(limits.max_user_connections.unwrap_or(-1)),
        ),
    ])
}

fn flatten_user(user: &User) -> DynamicValue {
    make_state(vec![
        (
            "id",
            string_value(id::construct(&user.cluster_id, &user.name)),
        ),
        ("cluster_id", string_value(&user.cluster_id)),
        ("name", string_value(&user.name)),
        ("permission", flatten_permissions(&user.permissions)),
        (
            "global_permissions",
            flatten_global_permissions(&user.global_permissions),
        ),
        (
            "connection_limits",
            match &user.connection_limits {
                Some(limits) => flatten_connection_limits(limits),
                None => DynamicValue::Null,
            },
        ),
        (
            "authentication_plugin",
            if user.authentication_plugin != 0 {
                string_value(flatten_enum(user.authentication_plugin, AUTH_PLUGIN_NAMES))
            } else {
                DynamicValue::Null
            },
        ),
        (
            "connection_manager",
            match &user.connection_manager {
                Some(cm) => make_state(vec![("connection_id", string_value(&cm.connection_id))]),
                None => DynamicValue::Null,
            },
        ),
    ])
}

/// Password material never comes back from the API; carry it over from
/// the configuration so refreshes do not produce phantom diffs.
fn carry_sensitive(cfg: &DynamicValue, state: &mut DynamicValue) {
    for key in ["password", "generate_password"] {
        if let Some(value) = cfg.get(key) {
            state.set(key, value.clone());
        }
    }
}
