//! Resource lifecycle scenarios against an in-memory API fake.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use cirrus_common::api::mdb;
use cirrus_common::api::operation::{GetOperationRequest, Operation};
use cirrus_common::{Error, Result};
use cirrus_provider::resources::{
    mdb_mysql_cluster::MysqlCluster,
    mdb_mysql_user::{read_user_data_source, MysqlUser},
    Resource,
};
use cirrus_provider::state::{
    block_value, bool_value, get_string_attr, int_value, make_state, set_eq, string_list_value,
    string_value, DynamicValue,
};
use cirrus_provider::{CloudApi, ProviderConfig};

/// Fake MySQL user service keeping users in memory.
#[derive(Default)]
struct FakeMysql {
    calls: Mutex<Vec<&'static str>>,
    users: Mutex<HashMap<String, mdb::User>>,
    conflicts_before_accept: AtomicU32,
    last_update: Mutex<Option<mdb::UpdateUserRequest>>,
}

impl FakeMysql {
    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn key(cluster_id: &str, user_name: &str) -> String {
        format!("{cluster_id}/{user_name}")
    }
}

#[async_trait]
impl CloudApi for FakeMysql {
    async fn create_user(&self, request: mdb::CreateUserRequest) -> Result<Operation> {
        self.record("create_user");
        if self
            .conflicts_before_accept
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(Error::Conflict("operation in progress on cluster".into()));
        }
        let spec = request.user_spec.unwrap_or_default();
        let user = mdb::User {
            name: spec.name.clone(),
            cluster_id: request.cluster_id.clone(),
            permissions: spec.permissions,
            global_permissions: spec.global_permissions,
            connection_limits: spec.connection_limits,
            authentication_plugin: spec.authentication_plugin,
            connection_manager: None,
        };
        self.users
            .lock()
            .unwrap()
            .insert(Self::key(&request.cluster_id, &spec.name), user);
        Ok(Operation::done_for("op-create-user", request.cluster_id))
    }

    async fn get_user(&self, request: mdb::GetUserRequest) -> Result<mdb::User> {
        self.record("get_user");
        self.users
            .lock()
            .unwrap()
            .get(&Self::key(&request.cluster_id, &request.user_name))
            .cloned()
            .ok_or_else(|| Error::not_found("user", request.user_name))
    }

    async fn update_user(&self, request: mdb::UpdateUserRequest) -> Result<Operation> {
        self.record("update_user");
        if !self
            .users
            .lock()
            .unwrap()
            .contains_key(&Self::key(&request.cluster_id, &request.user_name))
        {
            return Err(Error::not_found("user", request.user_name));
        }
        *self.last_update.lock().unwrap() = Some(request);
        Ok(Operation::done("op-update-user"))
    }

    async fn delete_user(&self, request: mdb::DeleteUserRequest) -> Result<Operation> {
        self.record("delete_user");
        match self
            .users
            .lock()
            .unwrap()
            .remove(&Self::key(&request.cluster_id, &request.user_name))
        {
            Some(_) => Ok(Operation::done("op-delete-user")),
            None => Err(Error::not_found("user", request.user_name)),
        }
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_test_writer()
        .try_init();
}

fn provider_config() -> ProviderConfig {
    init_tracing();
    ProviderConfig::new("http://localhost:19900", "folder-1")
}

fn user_config() -> DynamicValue {
    make_state(vec![
        ("cluster_id", string_value("c9qm1ab2")),
        ("name", string_value("app")),
        ("password", string_value("secret")),
    ])
}

#[tokio::test]
async fn create_rejects_ambiguous_password_without_touching_api() {
    let api = FakeMysql::default();
    let mut cfg = user_config();
    cfg.set("generate_password", bool_value(true));

    let failure = MysqlUser::create(&api, &provider_config(), &cfg)
        .await
        .unwrap_err();
    assert!(failure.id.is_none());
    assert!(matches!(failure.error, Error::InvalidConfig(_)));
    assert!(api.calls().is_empty(), "validation must precede API calls");
}

#[tokio::test]
async fn create_user_roundtrip() {
    let api = FakeMysql::default();
    let mut cfg = user_config();
    cfg.set(
        "global_permissions",
        string_list_value(["REPLICATION_CLIENT", "PROCESS"]),
    );
    let state = MysqlUser::create(&api, &provider_config(), &cfg)
        .await
        .unwrap();

    assert_eq!(get_string_attr(&state, "id"), "c9qm1ab2:app");
    assert_eq!(get_string_attr(&state, "cluster_id"), "c9qm1ab2");
    // Password never comes back from the API but must survive in state.
    assert_eq!(get_string_attr(&state, "password"), "secret");
    // Set attributes flatten sorted; compare as sets against the config.
    assert!(set_eq(
        state.get("global_permissions").unwrap(),
        cfg.get("global_permissions").unwrap(),
    ));
    assert_eq!(api.calls(), vec!["create_user", "get_user"]);
}

#[tokio::test]
async fn data_source_reads_existing_user() {
    let api = FakeMysql::default();
    let config = provider_config();
    MysqlUser::create(&api, &config, &user_config())
        .await
        .unwrap();

    let query = make_state(vec![
        ("cluster_id", string_value("c9qm1ab2")),
        ("name", string_value("app")),
    ]);
    let state = read_user_data_source(&api, &query).await.unwrap();
    assert_eq!(get_string_attr(&state, "id"), "c9qm1ab2:app");

    let incomplete = make_state(vec![("name", string_value("app"))]);
    let err = read_user_data_source(&api, &incomplete).await.unwrap_err();
    assert!(matches!(err, Error::InvalidConfig(_)));
}

#[tokio::test(start_paused = true)]
async fn create_retries_while_cluster_is_busy() {
    let api = FakeMysql {
        conflicts_before_accept: AtomicU32::new(2),
        ..Default::default()
    };
    let state = MysqlUser::create(&api, &provider_config(), &user_config())
        .await
        .unwrap();

    assert_eq!(get_string_attr(&state, "id"), "c9qm1ab2:app");
    assert_eq!(
        api.calls(),
        vec!["create_user", "create_user", "create_user", "get_user"]
    );
}

#[tokio::test]
async fn update_sends_the_full_field_mask() {
    let api = FakeMysql::default();
    let config = provider_config();
    let state = MysqlUser::create(&api, &config, &user_config())
        .await
        .unwrap();

    let mut cfg = user_config();
    cfg.set("password", string_value("rotated"));
    let new_state = MysqlUser::update(&api, &config, &state, &cfg).await.unwrap();
    assert_eq!(get_string_attr(&new_state, "password"), "rotated");

    let request = api.last_update.lock().unwrap().clone().unwrap();
    assert_eq!(request.password, "rotated");
    let mask = request.update_mask.unwrap();
    for field in [
        "authentication_plugin",
        "password",
        "permissions",
        "connection_limits",
        "global_permissions",
    ] {
        assert!(mask.paths.iter().any(|p| p == field), "missing {field}");
    }
}

#[tokio::test]
async fn read_of_missing_user_clears_state() {
    let api = FakeMysql::default();
    let state = make_state(vec![
        ("id", string_value("c9qm1ab2:gone")),
        ("cluster_id", string_value("c9qm1ab2")),
        ("name", string_value("gone")),
    ]);
    let refreshed = MysqlUser::read(&api, &provider_config(), &state)
        .await
        .unwrap();
    assert!(refreshed.is_none());
}

#[tokio::test]
async fn delete_of_missing_user_succeeds() {
    let api = FakeMysql::default();
    let state = make_state(vec![("id", string_value("c9qm1ab2:gone"))]);
    MysqlUser::delete(&api, &provider_config(), &state)
        .await
        .unwrap();
    assert_eq!(api.calls(), vec!["delete_user"]);
}

/// Cluster service whose create operation is accepted and then fails.
struct FailingClusterApi;

#[async_trait]
impl CloudApi for FailingClusterApi {
    async fn create_cluster(&self, _request: mdb::CreateClusterRequest) -> Result<Operation> {
        Ok(Operation {
            resource_id: "mysql-c1".to_string(),
            ..Operation::running("op-create-cluster")
        })
    }

    async fn get_operation(&self, request: GetOperationRequest) -> Result<Operation> {
        Ok(Operation::failed(
            request.operation_id,
            9,
            "host allocation failed",
        ))
    }
}

#[tokio::test(start_paused = true)]
async fn failed_cluster_create_keeps_the_assigned_id() {
    let cfg = make_state(vec![
        ("name", string_value("primary")),
        ("environment", string_value("PRODUCTION")),
        ("version", string_value("8.0")),
        (
            "resources",
            block_value(vec![
                ("resource_preset_id", string_value("s2.micro")),
                ("disk_size", int_value(10)),
            ]),
        ),
    ]);
    let failure = MysqlCluster::create(&FailingClusterApi, &provider_config(), &cfg)
        .await
        .unwrap_err();

    // The half-created cluster must stay tracked for a later destroy.
    assert_eq!(failure.id.as_deref(), Some("mysql-c1"));
    match failure.error {
        Error::OperationFailed { message, .. } => {
            assert!(message.contains("host allocation"), "{message}")
        }
        other => panic!("unexpected error: {other}"),
    }
}
