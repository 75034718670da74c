//! `cirrus_compute_instance` resource and data source.

use std::time::Duration;

use tracing::{debug, info};

use cirrus_common::api::compute::{
    AttachedDiskSpec, CreateInstanceRequest, DeleteInstanceRequest, DiskSpec, GetInstanceRequest,
    Instance, ListInstancesRequest, NetworkInterfaceSpec, PrimaryAddress, Resources,
    UpdateInstanceRequest, DISK_MODE_NAMES, INSTANCE_STATUS_NAMES,
};
use cirrus_common::{datasize, timefmt, Error, Result};

use crate::client::CloudApi;
use crate::config::ProviderConfig;
use crate::diag::Diagnostics;
use crate::ops::wait_operation;
use crate::schema::{AttributeSchema, AttributeType, Schema};
use crate::state::{
    block_value, bool_value, float_value, get_block, get_bool_attr, get_int_attr, get_map_attr,
    get_optional_string_attr, get_string_attr, int_value, make_state, string_map_value,
    string_value, DynamicValue,
};

use super::{expand_enum, flatten_enum, read_result, CreateFailure, Resource};

const CREATE_TIMEOUT: Duration = Duration::from_secs(10 * 60);
const UPDATE_TIMEOUT: Duration = Duration::from_secs(10 * 60);
const DELETE_TIMEOUT: Duration = Duration::from_secs(10 * 60);

const DEFAULT_PLATFORM: &str = "standard-v3";
const DEFAULT_CORE_FRACTION: i64 = 100;

/// Mutable fields, sent in full on every update.
const UPDATE_MASK: &[&str] = &["name", "description", "labels", "metadata", "resources"];

pub struct ComputeInstance;

#[async_trait::async_trait]
impl Resource for ComputeInstance {
    fn type_name() -> &'static str {
        "cirrus_compute_instance"
    }

    fn schema() -> Schema {
        Schema::new(
            "A virtual machine instance.",
            vec![
                AttributeSchema::new("name", AttributeType::String).required(),
                AttributeSchema::new("description", AttributeType::String),
                AttributeSchema::new("folder_id", AttributeType::String)
                    .computed()
                    .force_new(),
                AttributeSchema::new("zone", AttributeType::String)
                    .computed()
                    .force_new(),
                AttributeSchema::new("platform_id", AttributeType::String)
                    .default_value(string_value(DEFAULT_PLATFORM))
                    .force_new(),
                AttributeSchema::new("labels", AttributeType::Map(Box::new(AttributeType::String))),
                AttributeSchema::new(
                    "metadata",
                    AttributeType::Map(Box::new(AttributeType::String)),
                ),
                AttributeSchema::new(
                    "resources",
                    AttributeType::Block(Schema::new(
                        "",
                        vec![
                            AttributeSchema::new("cores", AttributeType::Int).required(),
                            AttributeSchema::new("memory", AttributeType::Float)
                                .required()
                                .description("RAM in gigabytes; fractions are allowed."),
                            AttributeSchema::new("core_fraction", AttributeType::Int)
                                .default_value(int_value(DEFAULT_CORE_FRACTION)),
                            AttributeSchema::new("gpus", AttributeType::Int)
                                .default_value(int_value(0)),
                        ],
                    )),
                )
                .required()
                .max_items(1),
                AttributeSchema::new(
                    "boot_disk",
                    AttributeType::Block(Schema::new(
                        "",
                        vec![
                            AttributeSchema::new("auto_delete", AttributeType::Bool)
                                .default_value(bool_value(true)),
                            AttributeSchema::new("device_name", AttributeType::String).computed(),
                            AttributeSchema::new("mode", AttributeType::String).computed(),
                            AttributeSchema::new("disk_id", AttributeType::String).computed(),
                            AttributeSchema::new(
                                "initialize_params",
                                AttributeType::Block(Schema::new(
                                    "",
                                    vec![
                                        AttributeSchema::new("name", AttributeType::String),
                                        AttributeSchema::new("description", AttributeType::String),
                                        AttributeSchema::new("size", AttributeType::Int)
                                            .description("Disk size in gigabytes."),
                                        AttributeSchema::new("type", AttributeType::String)
                                            .default_value(string_value("network-hdd")),
                                        AttributeSchema::new("image_id", AttributeType::String),
                                        AttributeSchema::new("snapshot_id", AttributeType::String),
                                    ],
                                )),
                            )
                            .max_items(1),
                        ],
                    )),
                )
                .required()
                .force_new()
                .max_items(1),
                AttributeSchema::new(
                    "network_interface",
                    AttributeType::Block(Schema::new(
                        "",
                        vec![
                            AttributeSchema::new("subnet_id", AttributeType::String).required(),
                            AttributeSchema::new("ip_address", AttributeType::String).computed(),
                            AttributeSchema::new("index", AttributeType::Int).computed(),
                            AttributeSchema::new("mac_address", AttributeType::String).computed(),
                        ],
                    )),
                )
                .required()
                .force_new(),
                AttributeSchema::new("fqdn", AttributeType::String).computed(),
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

        debug!(name = %request.name, zone = %request.zone_id, "creating instance");
        let op = api.create_instance(request).await?;
        let mut instance_id = op.resource_id.clone();
        match wait_operation(
            api,
            op,
            config.poll_interval,
            config.create_timeout(CREATE_TIMEOUT),
        )
        .await
        {
            Ok(done) => {
                if instance_id.is_empty() {
                    instance_id = done.resource_id;
                }
            }
            Err(e) if !instance_id.is_empty() => {
                return Err(CreateFailure::partial(instance_id, e))
            }
            Err(e) => return Err(e.into()),
        }
        if instance_id.is_empty() {
            return Err(Error::Internal(
                "create operation did not report an instance ID".to_string(),
            )
            .into());
        }

        let instance = api
            .get_instance(GetInstanceRequest {
                instance_id: instance_id.clone(),
            })
            .await
            .map_err(|e| CreateFailure::partial(instance_id.clone(), e))?;
        info!(%instance_id, "instance created");
        let mut state = flatten_instance(&instance);
        carry_boot_disk_params(cfg, &mut state);
        Ok(state)
    }

    async fn read(
        api: &dyn CloudApi,
        _config: &ProviderConfig,
        state: &DynamicValue,
    ) -> Result<Option<DynamicValue>> {
        let instance_id = get_string_attr(state, "id");
        match read_result(
            api.get_instance(GetInstanceRequest {
                instance_id: instance_id.clone(),
            })
            .await,
        )? {
            Some(instance) => {
                let mut new_state = flatten_instance(&instance);
                carry_boot_disk_params(state, &mut new_state);
                Ok(Some(new_state))
            }
            None => {
                debug!(%instance_id, "instance is gone, removing from state");
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
        let instance_id = get_string_attr(state, "id");
        let mut diags = Diagnostics::new();
        Self::schema().validate(cfg, &mut diags);
        let resources = match get_block(cfg, "resources") {
            Some(block) => Some(expand_resources(block)),
            None => None,
        };
        diags.into_result()?;

        debug!(%instance_id, "updating instance");
        let request = UpdateInstanceRequest {
            instance_id: instance_id.clone(),
            update_mask: Some(prost_types::FieldMask {
                paths: UPDATE_MASK.iter().map(|p| p.to_string()).collect(),
            }),
            name: get_string_attr(cfg, "name"),
            description: get_string_attr(cfg, "description"),
            labels: get_map_attr(cfg, "labels"),
            metadata: get_map_attr(cfg, "metadata"),
            resources,
        };
        let op = api.update_instance(request).await?;
        wait_operation(
            api,
            op,
            config.poll_interval,
            config.update_timeout(UPDATE_TIMEOUT),
        )
        .await?;

        let instance = api.get_instance(GetInstanceRequest { instance_id }).await?;
        let mut new_state = flatten_instance(&instance);
        carry_boot_disk_params(cfg, &mut new_state);
        Ok(new_state)
    }

    async fn delete(
        api: &dyn CloudApi,
        config: &ProviderConfig,
        state: &DynamicValue,
    ) -> Result<()> {
        let instance_id = get_string_attr(state, "id");
        debug!(%instance_id, "deleting instance");
        let op = match api
            .delete_instance(DeleteInstanceRequest {
                instance_id: instance_id.clone(),
            })
            .await
        {
            Ok(op) => op,
            Err(e) if e.is_not_found() => {
                debug!(%instance_id, "instance already deleted");
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
                info!(%instance_id, "instance deleted");
                Ok(())
            }
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// Data source read: by `instance_id`, or by `name` resolved within the
/// folder.
pub async fn read_instance_data_source(
    api: &dyn CloudApi,
    config: &ProviderConfig,
    cfg: &DynamicValue,
) -> Result<DynamicValue> {
    let instance = match get_optional_string_attr(cfg, "instance_id") {
        Some(instance_id) => api.get_instance(GetInstanceRequest { instance_id }).await?,
        None => {
            let name = get_optional_string_attr(cfg, "name").ok_or_else(|| {
                Error::InvalidConfig("either instance_id or name must be set".to_string())
            })?;
            let folder_id =
                config.resolve_folder_id(get_optional_string_attr(cfg, "folder_id"))?;
            let response = api
                .list_instances(ListInstancesRequest {
                    folder_id,
                    filter: format!("name={name:?}"),
                    page_size: 2,
                })
                .await?;
            response
                .instances
                .into_iter()
                .next()
                .ok_or_else(|| Error::not_found("instance", &name))?
        }
    };
    Ok(flatten_instance(&instance))
}

fn expand_create_request(
    cfg: &DynamicValue,
    provider: &ProviderConfig,
    diags: &mut Diagnostics,
) -> Result<CreateInstanceRequest> {
    let folder_id = provider.resolve_folder_id(get_optional_string_attr(cfg, "folder_id"))?;
    let resources = match get_block(cfg, "resources") {
        Some(block) => Some(expand_resources(block)),
        None => {
            diags.add_attribute_error("resources", "block must be set");
            None
        }
    };
    let boot_disk_spec = match get_block(cfg, "boot_disk") {
        Some(block) => Some(expand_boot_disk(block, diags)),
        None => {
            diags.add_attribute_error("boot_disk", "block must be set");
            None
        }
    };
    Ok(CreateInstanceRequest {
        folder_id,
        name: get_string_attr(cfg, "name"),
        description: get_string_attr(cfg, "description"),
        labels: get_map_attr(cfg, "labels"),
        zone_id: get_string_attr(cfg, "zone"),
        platform_id: get_optional_string_attr(cfg, "platform_id")
            .unwrap_or_else(|| DEFAULT_PLATFORM.to_string()),
        resources,
        metadata: get_map_attr(cfg, "metadata"),
        boot_disk_spec,
        network_interface_specs: expand_network_interfaces(cfg),
    })
}

fn expand_resources(block: &DynamicValue) -> Resources {
    Resources {
        memory: datasize::gb_to_bytes_f64(crate::state::get_float_attr(block, "memory", 0.0)),
        cores: get_int_attr(block, "cores", 0),
        core_fraction: get_int_attr(block, "core_fraction", DEFAULT_CORE_FRACTION),
        gpus: get_int_attr(block, "gpus", 0),
    }
}

fn expand_boot_disk(block: &DynamicValue, diags: &mut Diagnostics) -> AttachedDiskSpec {
    let disk_spec = get_block(block, "initialize_params").map(|params| {
        let image_id = get_optional_string_attr(params, "image_id");
        let snapshot_id = get_optional_string_attr(params, "snapshot_id");
        match (&image_id, &snapshot_id) {
            (None, None) => diags.add_attribute_error(
                "boot_disk.0.initialize_params",
                "either image_id or snapshot_id must be set",
            ),
            (Some(_), Some(_)) => diags.add_attribute_error(
                "boot_disk.0.initialize_params",
                "image_id and snapshot_id are mutually exclusive",
            ),
            _ => {}
        }
        DiskSpec {
            name: get_string_attr(params, "name"),
            description: get_string_attr(params, "description"),
            type_id: get_optional_string_attr(params, "type")
                .unwrap_or_else(|| "network-hdd".to_string()),
            size: datasize::to_bytes(get_int_attr(params, "size", 0)),
            image_id: image_id.unwrap_or_default(),
            snapshot_id: snapshot_id.unwrap_or_default(),
        }
    });
    let mode = match get_optional_string_attr(block, "mode") {
        Some(mode) => expand_enum("boot_disk.0.mode", &mode, DISK_MODE_NAMES, diags),
        None => 0,
    };
    AttachedDiskSpec {
        mode,
        device_name: get_string_attr(block, "device_name"),
        auto_delete: get_bool_attr(block, "auto_delete", true),
        disk_spec,
    }
}

fn expand_network_interfaces(cfg: &DynamicValue) -> Vec<NetworkInterfaceSpec> {
    cfg.get("network_interface")
        .and_then(|v| v.as_list())
        .map(|items| {
            items
                .iter()
                .map(|block| NetworkInterfaceSpec {
                    subnet_id: get_string_attr(block, "subnet_id"),
                    primary_v4_address_spec: get_optional_string_attr(block, "ip_address")
                        .map(|address| PrimaryAddress { address }),
                })
                .collect()
        })
        .unwrap_or_default()
}

fn flatten_instance(instance: &Instance) -> DynamicValue {
    // Interfaces come back in platform order; state keeps index order so
    // positional references stay stable.
    let mut interfaces = instance.network_interfaces.clone();
    interfaces.sort_by_key(|nic| nic.index);
    let network_interface = DynamicValue::List(
        interfaces
            .iter()
            .map(|nic| {
                make_state(vec![
                    ("subnet_id", string_value(&nic.subnet_id)),
                    (
                        "ip_address",
                        match &nic.primary_v4_address {
                            Some(addr) => string_value(&addr.address),
                            None => DynamicValue::Null,
                        },
                    ),
                    ("index", int_value(nic.index)),
                    ("mac_address", string_value(&nic.mac_address)),
                ])
            })
            .collect(),
    );

    make_state(vec![
        ("id", string_value(&instance.id)),
        ("folder_id", string_value(&instance.folder_id)),
        ("name", string_value(&instance.name)),
        ("description", string_value(&instance.description)),
        ("labels", string_map_value(&instance.labels)),
        ("zone", string_value(&instance.zone_id)),
        ("platform_id", string_value(&instance.platform_id)),
        ("metadata", string_map_value(&instance.metadata)),
        (
            "resources",
            match &instance.resources {
                Some(resources) => block_value(vec![
                    ("cores", int_value(resources.cores)),
                    (
                        "memory",
                        float_value(datasize::bytes_to_gb_f64(resources.memory)),
                    ),
                    ("core_fraction", int_value(resources.core_fraction)),
                    ("gpus", int_value(resources.gpus)),
                ]),
                None => DynamicValue::Null,
            },
        ),
        (
            "boot_disk",
            match &instance.boot_disk {
                Some(disk) => block_value(vec![
                    ("auto_delete", bool_value(disk.auto_delete)),
                    ("device_name", string_value(&disk.device_name)),
                    (
                        "mode",
                        if disk.mode != 0 {
                            string_value(flatten_enum(disk.mode, DISK_MODE_NAMES))
                        } else {
                            DynamicValue::Null
                        },
                    ),
                    ("disk_id", string_value(&disk.disk_id)),
                ]),
                None => DynamicValue::Null,
            },
        ),
        ("network_interface", network_interface),
        ("fqdn", string_value(&instance.fqdn)),
        (
            "status",
            string_value(flatten_enum(instance.status, INSTANCE_STATUS_NAMES)),
        ),
        (
            "created_at",
            match &instance.created_at {
                Some(ts) => string_value(timefmt::format_timestamp(ts)),
                None => DynamicValue::Null,
            },
        ),
    ])
}

/// The API never echoes `initialize_params` back; keep the configured
/// block so refreshes do not drop it.
fn carry_boot_disk_params(src: &DynamicValue, state: &mut DynamicValue) {
    let params = match get_block(src, "boot_disk").and_then(|b| b.get("initialize_params")) {
        Some(params) => params.clone(),
        None => return,
    };
    if let DynamicValue::Map(m) = state {
        if let Some(DynamicValue::List(items)) = m.get_mut("boot_disk") {
            if let Some(first) = items.first_mut() {
                first.set("initialize_params", params);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cirrus_common::api::compute::{AttachedDisk, NetworkInterface};
    use crate::state::get_float_attr;

    fn provider() -> ProviderConfig {
        ProviderConfig::new("http://localhost:19900", "folder-default")
    }

    fn base_config() -> DynamicValue {
        make_state(vec![
            ("name", string_value("web-1")),
            ("zone", string_value("ru-central1-a")),
            (
                "resources",
                block_value(vec![
                    ("cores", int_value(2)),
                    ("memory", float_value(0.5)),
                ]),
            ),
            (
                "boot_disk",
                block_value(vec![(
                    "initialize_params",
                    block_value(vec![
                        ("size", int_value(10)),
                        ("image_id", string_value("img-ubuntu")),
                    ]),
                )]),
            ),
            (
                "network_interface",
                DynamicValue::List(vec![make_state(vec![(
                    "subnet_id",
                    string_value("subnet-1"),
                )])]),
            ),
        ])
    }

    #[test]
    fn expands_memory_and_disk_to_bytes() {
        let mut diags = Diagnostics::new();
        let request = expand_create_request(&base_config(), &provider(), &mut diags).unwrap();
        assert!(!diags.has_errors(), "{:?}", diags.entries());
        assert_eq!(request.resources.as_ref().unwrap().memory, 512 * 1024 * 1024);
        assert_eq!(request.resources.as_ref().unwrap().core_fraction, 100);
        let disk = request.boot_disk_spec.unwrap().disk_spec.unwrap();
        assert_eq!(disk.size, 10 * (1 << 30));
        assert_eq!(disk.type_id, "network-hdd");
        assert_eq!(request.platform_id, "standard-v3");
    }

    #[test]
    fn boot_disk_requires_exactly_one_source() {
        let mut cfg = base_config();
        cfg.set(
            "boot_disk",
            block_value(vec![(
                "initialize_params",
                block_value(vec![("size", int_value(10))]),
            )]),
        );
        let mut diags = Diagnostics::new();
        expand_create_request(&cfg, &provider(), &mut diags).unwrap();
        assert!(diags.has_errors());

        let mut cfg = base_config();
        cfg.set(
            "boot_disk",
            block_value(vec![(
                "initialize_params",
                block_value(vec![
                    ("image_id", string_value("img-1")),
                    ("snapshot_id", string_value("snap-1")),
                ]),
            )]),
        );
        let mut diags = Diagnostics::new();
        expand_create_request(&cfg, &provider(), &mut diags).unwrap();
        assert!(diags.has_errors());
    }

    #[test]
    fn flatten_orders_interfaces_by_index() {
        let instance = Instance {
            id: "vm-1".into(),
            network_interfaces: vec![
                NetworkInterface {
                    index: 1,
                    subnet_id: "subnet-b".into(),
                    ..Default::default()
                },
                NetworkInterface {
                    index: 0,
                    subnet_id: "subnet-a".into(),
                    primary_v4_address: Some(PrimaryAddress {
                        address: "10.0.0.4".into(),
                    }),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        let state = flatten_instance(&instance);
        let nics = state.get("network_interface").unwrap().as_list().unwrap();
        assert_eq!(get_string_attr(&nics[0], "subnet_id"), "subnet-a");
        assert_eq!(get_string_attr(&nics[0], "ip_address"), "10.0.0.4");
        assert_eq!(get_string_attr(&nics[1], "subnet_id"), "subnet-b");
    }

    #[test]
    fn flatten_converts_memory_back_to_gigabytes() {
        let instance = Instance {
            id: "vm-1".into(),
            status: 2,
            resources: Some(Resources {
                memory: 512 * 1024 * 1024,
                cores: 2,
                core_fraction: 100,
                gpus: 0,
            }),
            boot_disk: Some(AttachedDisk {
                mode: 2,
                disk_id: "disk-1".into(),
                auto_delete: true,
                ..Default::default()
            }),
            ..Default::default()
        };
        let state = flatten_instance(&instance);
        let resources = get_block(&state, "resources").unwrap();
        assert_eq!(get_float_attr(resources, "memory", 0.0), 0.5);
        assert_eq!(get_string_attr(&state, "status"), "RUNNING");
        let disk = get_block(&state, "boot_disk").unwrap();
        assert_eq!(get_string_attr(disk, "mode"), "READ_WRITE");
    }

    struct ListApi;

    #[async_trait::async_trait]
    impl CloudApi for ListApi {
        async fn list_instances(
            &self,
            request: cirrus_common::api::compute::ListInstancesRequest,
        ) -> Result<cirrus_common::api::compute::ListInstancesResponse> {
            assert_eq!(request.folder_id, "folder-default");
            assert_eq!(request.filter, "name=\"web-1\"");
            Ok(cirrus_common::api::compute::ListInstancesResponse {
                instances: vec![Instance {
                    id: "vm-9".into(),
                    name: "web-1".into(),
                    ..Default::default()
                }],
                next_page_token: String::new(),
            })
        }
    }

    #[tokio::test]
    async fn data_source_resolves_instance_by_name() {
        let cfg = make_state(vec![("name", string_value("web-1"))]);
        let state = read_instance_data_source(&ListApi, &provider(), &cfg)
            .await
            .unwrap();
        assert_eq!(get_string_attr(&state, "id"), "vm-9");
    }

    #[test]
    fn initialize_params_survive_refresh() {
        let cfg = base_config();
        let mut state = flatten_instance(&Instance {
            id: "vm-1".into(),
            boot_disk: Some(AttachedDisk::default()),
            ..Default::default()
        });
        carry_boot_disk_params(&cfg, &mut state);
        let disk = get_block(&state, "boot_disk").unwrap();
        let params = get_block(disk, "initialize_params").unwrap();
        assert_eq!(get_string_attr(params, "image_id"), "img-ubuntu");
    }
}
