//! `cirrus_alb_backend_group` resource.
//!
//! A backend group is either HTTP or stream; the wire message keeps the
//! two in a oneof, the configuration mirrors that with two mutually
//! exclusive block lists.

use std::time::Duration;

use tracing::{debug, info};

use cirrus_common::api::alb::{
    backend_group, health_check, BackendGroup, CreateBackendGroupRequest,
    DeleteBackendGroupRequest, GetBackendGroupRequest, HealthCheck, HttpBackend, HttpBackendGroup,
    HttpHealthCheck, LoadBalancingConfig, StreamBackend, StreamBackendGroup, StreamHealthCheck,
    UpdateBackendGroupRequest, LOAD_BALANCING_MODE_NAMES,
};
use cirrus_common::{api, timefmt, Error, Result};

use crate::client::CloudApi;
use crate::config::ProviderConfig;
use crate::diag::Diagnostics;
use crate::ops::{retry_conflicting_operation, wait_operation};
use crate::schema::{AttributeSchema, AttributeType, Schema};
use crate::state::{
    block_value, bool_value, float_value, get_block, get_bool_attr, get_float_attr, get_int_attr,
    get_map_attr, get_optional_string_attr, get_string_attr, get_string_list, int_value,
    make_state, string_list_value, string_map_value, string_value, DynamicValue,
};

use super::{read_result, CreateFailure, Resource};

const CREATE_TIMEOUT: Duration = Duration::from_secs(5 * 60);
const UPDATE_TIMEOUT: Duration = Duration::from_secs(5 * 60);
const DELETE_TIMEOUT: Duration = Duration::from_secs(5 * 60);

const DEFAULT_BACKEND_WEIGHT: i64 = 1;

/// Mutable fields, sent in full on every update.
const UPDATE_MASK: &[&str] = &["name", "description", "labels", "backend"];

pub struct AlbBackendGroup;

#[async_trait::async_trait]
impl Resource for AlbBackendGroup {
    fn type_name() -> &'static str {
        "cirrus_alb_backend_group"
    }

    fn schema() -> Schema {
        Schema::new(
            "A load balancer backend group.",
            vec![
                AttributeSchema::new("name", AttributeType::String).required(),
                AttributeSchema::new("description", AttributeType::String),
                AttributeSchema::new("folder_id", AttributeType::String)
                    .computed()
                    .force_new(),
                AttributeSchema::new("labels", AttributeType::Map(Box::new(AttributeType::String))),
                AttributeSchema::new("http_backend", AttributeType::Block(http_backend_schema()))
                    .description("HTTP backends. Conflicts with stream_backend."),
                AttributeSchema::new(
                    "stream_backend",
                    AttributeType::Block(stream_backend_schema()),
                )
                .description("Stream backends. Conflicts with http_backend."),
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
        let folder_id = config.resolve_folder_id(get_optional_string_attr(cfg, "folder_id"))?;
        let backend = expand_backend(cfg, &mut diags);
        diags.into_result()?;

        let name = get_string_attr(cfg, "name");
        debug!(%name, %folder_id, "creating backend group");
        let request = CreateBackendGroupRequest {
            folder_id,
            name,
            description: get_string_attr(cfg, "description"),
            labels: get_map_attr(cfg, "labels"),
            backend,
        };
        let op = retry_conflicting_operation(|| {
            let request = request.clone();
            async move { api.create_backend_group(request).await }
        })
        .await?;

        let mut group_id = op.resource_id.clone();
        match wait_operation(
            api,
            op,
            config.poll_interval,
            config.create_timeout(CREATE_TIMEOUT),
        )
        .await
        {
            Ok(done) => {
                if group_id.is_empty() {
                    group_id = done.resource_id;
                }
            }
            Err(e) if !group_id.is_empty() => return Err(CreateFailure::partial(group_id, e)),
            Err(e) => return Err(e.into()),
        }
        if group_id.is_empty() {
            return Err(Error::Internal(
                "create operation did not report a backend group ID".to_string(),
            )
            .into());
        }

        let group = api
            .get_backend_group(GetBackendGroupRequest {
                backend_group_id: group_id.clone(),
            })
            .await
            .map_err(|e| CreateFailure::partial(group_id.clone(), e))?;
        info!(%group_id, "backend group created");
        Ok(flatten_backend_group(&group))
    }

    async fn read(
        api: &dyn CloudApi,
        _config: &ProviderConfig,
        state: &DynamicValue,
    ) -> Result<Option<DynamicValue>> {
        let group_id = get_string_attr(state, "id");
        match read_result(
            api.get_backend_group(GetBackendGroupRequest {
                backend_group_id: group_id.clone(),
            })
            .await,
        )? {
            Some(group) => Ok(Some(flatten_backend_group(&group))),
            None => {
                debug!(%group_id, "backend group is gone, removing from state");
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
        let group_id = get_string_attr(state, "id");
        let mut diags = Diagnostics::new();
        Self::schema().validate(cfg, &mut diags);
        let backend = expand_backend(cfg, &mut diags);
        diags.into_result()?;

        debug!(%group_id, "updating backend group");
        let request = UpdateBackendGroupRequest {
            backend_group_id: group_id.clone(),
            update_mask: Some(prost_types::FieldMask {
                paths: UPDATE_MASK.iter().map(|p| p.to_string()).collect(),
            }),
            name: get_string_attr(cfg, "name"),
            description: get_string_attr(cfg, "description"),
            labels: get_map_attr(cfg, "labels"),
            backend,
        };
        let op = retry_conflicting_operation(|| {
            let request = request.clone();
            async move { api.update_backend_group(request).await }
        })
        .await?;
        wait_operation(
            api,
            op,
            config.poll_interval,
            config.update_timeout(UPDATE_TIMEOUT),
        )
        .await?;

        let group = api
            .get_backend_group(GetBackendGroupRequest {
                backend_group_id: group_id,
            })
            .await?;
        Ok(flatten_backend_group(&group))
    }

    async fn delete(
        api: &dyn CloudApi,
        config: &ProviderConfig,
        state: &DynamicValue,
    ) -> Result<()> {
        let group_id = get_string_attr(state, "id");
        debug!(%group_id, "deleting backend group");
        let request = DeleteBackendGroupRequest {
            backend_group_id: group_id.clone(),
        };
        let op = match retry_conflicting_operation(|| {
            let request = request.clone();
            async move { api.delete_backend_group(request).await }
        })
        .await
        {
            Ok(op) => op,
            Err(e) if e.is_not_found() => {
                debug!(%group_id, "backend group already deleted");
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
                info!(%group_id, "backend group deleted");
                Ok(())
            }
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e),
        }
    }
}

fn healthcheck_schema() -> Schema {
    Schema::new(
        "",
        vec![
            AttributeSchema::new("timeout", AttributeType::String).required(),
            AttributeSchema::new("interval", AttributeType::String).required(),
            AttributeSchema::new("interval_jitter_percent", AttributeType::Float),
            AttributeSchema::new("healthy_threshold", AttributeType::Int),
            AttributeSchema::new("unhealthy_threshold", AttributeType::Int),
            AttributeSchema::new("healthcheck_port", AttributeType::Int),
            AttributeSchema::new(
                "http_healthcheck",
                AttributeType::Block(Schema::new(
                    "",
                    vec![
                        AttributeSchema::new("host", AttributeType::String),
                        AttributeSchema::new("path", AttributeType::String),
                        AttributeSchema::new("http2", AttributeType::Bool)
                            .default_value(bool_value(false)),
                        AttributeSchema::new(
                            "expected_statuses",
                            AttributeType::List(Box::new(AttributeType::Int)),
                        ),
                    ],
                )),
            )
            .max_items(1),
            AttributeSchema::new(
                "stream_healthcheck",
                AttributeType::Block(Schema::new(
                    "",
                    vec![
                        AttributeSchema::new("send", AttributeType::String),
                        AttributeSchema::new("receive", AttributeType::String),
                    ],
                )),
            )
            .max_items(1),
        ],
    )
}

fn load_balancing_schema() -> Schema {
    Schema::new(
        "",
        vec![
            AttributeSchema::new("panic_threshold", AttributeType::Int),
            AttributeSchema::new("locality_aware_routing_percent", AttributeType::Int),
            AttributeSchema::new("strict_locality", AttributeType::Bool)
                .default_value(bool_value(false)),
            AttributeSchema::new("mode", AttributeType::String)
                .default_value(string_value("ROUND_ROBIN")),
        ],
    )
}

fn common_backend_attrs() -> Vec<AttributeSchema> {
    vec![
        AttributeSchema::new("name", AttributeType::String).required(),
        AttributeSchema::new("port", AttributeType::Int),
        AttributeSchema::new("weight", AttributeType::Int)
            .default_value(int_value(DEFAULT_BACKEND_WEIGHT)),
        AttributeSchema::new(
            "target_group_ids",
            AttributeType::Set(Box::new(AttributeType::String)),
        )
        .required(),
        AttributeSchema::new("healthcheck", AttributeType::Block(healthcheck_schema())),
        AttributeSchema::new(
            "load_balancing_config",
            AttributeType::Block(load_balancing_schema()),
        )
        .max_items(1),
    ]
}

fn http_backend_schema() -> Schema {
    let mut attrs = common_backend_attrs();
    attrs.push(
        AttributeSchema::new("http2", AttributeType::Bool).default_value(bool_value(false)),
    );
    Schema::new("", attrs)
}

fn stream_backend_schema() -> Schema {
    let mut attrs = common_backend_attrs();
    attrs.push(
        AttributeSchema::new("enable_proxy_protocol", AttributeType::Bool)
            .default_value(bool_value(false)),
    );
    attrs.push(
        AttributeSchema::new(
            "keep_connections_on_host_health_failure",
            AttributeType::Bool,
        )
        .default_value(bool_value(false)),
    );
    Schema::new("", attrs)
}

fn expand_backend(
    cfg: &DynamicValue,
    diags: &mut Diagnostics,
) -> Option<backend_group::Backend> {
    let http = cfg.get("http_backend").and_then(|v| v.as_list());
    let stream = cfg.get("stream_backend").and_then(|v| v.as_list());
    match (http, stream) {
        (Some(_), Some(_)) => {
            diags.add_error("http_backend and stream_backend are mutually exclusive");
            None
        }
        (Some(backends), None) => Some(backend_group::Backend::Http(HttpBackendGroup {
            backends: backends
                .iter()
                .enumerate()
                .map(|(i, b)| expand_http_backend(i, b, diags))
                .collect(),
        })),
        (None, Some(backends)) => Some(backend_group::Backend::Stream(StreamBackendGroup {
            backends: backends
                .iter()
                .enumerate()
                .map(|(i, b)| expand_stream_backend(i, b, diags))
                .collect(),
        })),
        (None, None) => {
            diags.add_error("either http_backend or stream_backend must be set");
            None
        }
    }
}

fn expand_http_backend(index: usize, block: &DynamicValue, diags: &mut Diagnostics) -> HttpBackend {
    HttpBackend {
        name: get_string_attr(block, "name"),
        backend_weight: Some(get_int_attr(block, "weight", DEFAULT_BACKEND_WEIGHT)),
        port: get_int_attr(block, "port", 0),
        target_group_ids: get_string_list(block, "target_group_ids"),
        healthchecks: expand_healthchecks(&format!("http_backend.{index}"), block, diags),
        load_balancing_config: get_block(block, "load_balancing_config")
            .map(|lb| expand_load_balancing(&format!("http_backend.{index}"), lb, diags)),
        http2: get_bool_attr(block, "http2", false),
    }
}

fn expand_stream_backend(
    index: usize,
    block: &DynamicValue,
    diags: &mut Diagnostics,
) -> StreamBackend {
    StreamBackend {
        name: get_string_attr(block, "name"),
        backend_weight: Some(get_int_attr(block, "weight", DEFAULT_BACKEND_WEIGHT)),
        port: get_int_attr(block, "port", 0),
        target_group_ids: get_string_list(block, "target_group_ids"),
        healthchecks: expand_healthchecks(&format!("stream_backend.{index}"), block, diags),
        load_balancing_config: get_block(block, "load_balancing_config")
            .map(|lb| expand_load_balancing(&format!("stream_backend.{index}"), lb, diags)),
        enable_proxy_protocol: get_bool_attr(block, "enable_proxy_protocol", false),
        keep_connections_on_host_health_failure: get_bool_attr(
            block,
            "keep_connections_on_host_health_failure",
            false,
        ),
    }
}

fn expand_healthchecks(
    path: &str,
    backend: &DynamicValue,
    diags: &mut Diagnostics,
) -> Vec<HealthCheck> {
    backend
        .get("healthcheck")
        .and_then(|v| v.as_list())
        .map(|items| {
            items
                .iter()
                .enumerate()
                .map(|(i, block)| expand_healthcheck(&format!("{path}.healthcheck.{i}"), block, diags))
                .collect()
        })
        .unwrap_or_default()
}

fn expand_healthcheck(path: &str, block: &DynamicValue, diags: &mut Diagnostics) -> HealthCheck {
    let parse = |attr: &str, diags: &mut Diagnostics| {
        let text = get_string_attr(block, attr);
        match timefmt::parse_duration(&text) {
            Ok(d) => Some(d),
            Err(e) => {
                diags.add_attribute_error(format!("{path}.{attr}"), e.to_string());
                None
            }
        }
    };
    let timeout = parse("timeout", diags);
    let interval = parse("interval", diags);

    let http = get_block(block, "http_healthcheck");
    let stream = get_block(block, "stream_healthcheck");
    let check = match (http, stream) {
        (Some(_), Some(_)) => {
            diags.add_attribute_error(
                path,
                "http_healthcheck and stream_healthcheck are mutually exclusive",
            );
            None
        }
        (Some(http), None) => Some(health_check::Check::Http(HttpHealthCheck {
            host: get_string_attr(http, "host"),
            path: get_string_attr(http, "path"),
            http2: get_bool_attr(http, "http2", false),
            expected_statuses: http
                .get("expected_statuses")
                .and_then(|v| v.as_list())
                .map(|items| items.iter().filter_map(|v| v.as_i64()).collect())
                .unwrap_or_default(),
        })),
        (None, Some(stream)) => Some(health_check::Check::Stream(StreamHealthCheck {
            send: get_string_attr(stream, "send"),
            receive: get_string_attr(stream, "receive"),
        })),
        (None, None) => {
            diags.add_attribute_error(
                path,
                "either http_healthcheck or stream_healthcheck must be set",
            );
            None
        }
    };

    HealthCheck {
        timeout,
        interval,
        interval_jitter_percent: get_float_attr(block, "interval_jitter_percent", 0.0),
        healthy_threshold: get_int_attr(block, "healthy_threshold", 0),
        unhealthy_threshold: get_int_attr(block, "unhealthy_threshold", 0),
        healthcheck_port: get_int_attr(block, "healthcheck_port", 0),
        check,
    }
}

fn expand_load_balancing(
    path: &str,
    block: &DynamicValue,
    diags: &mut Diagnostics,
) -> LoadBalancingConfig {
    // ROUND_ROBIN is ordinal zero and a legitimate configured value.
    let mode = match get_optional_string_attr(block, "mode") {
        Some(name) => match api::enum_value(LOAD_BALANCING_MODE_NAMES, &name) {
            Some(mode) => mode,
            None => {
                diags.add_attribute_error(
                    format!("{path}.load_balancing_config.0.mode"),
                    format!(
                        "value {name:?} is not supported, allowed: {}",
                        LOAD_BALANCING_MODE_NAMES
                            .iter()
                            .map(|(n, _)| *n)
                            .collect::<Vec<_>>()
                            .join(", ")
                    ),
                );
                0
            }
        },
        None => 0,
    };
    LoadBalancingConfig {
        panic_threshold: get_int_attr(block, "panic_threshold", 0),
        locality_aware_routing_percent: get_int_attr(block, "locality_aware_routing_percent", 0),
        strict_locality: get_bool_attr(block, "strict_locality", false),
        mode,
    }
}

fn flatten_backend_group(group: &BackendGroup) -> DynamicValue {
    let (http_backend, stream_backend) = match &group.backend {
        Some(backend_group::Backend::Http(http)) => (
            DynamicValue::List(http.backends.iter().map(flatten_http_backend).collect()),
            DynamicValue::Null,
        ),
        Some(backend_group::Backend::Stream(stream)) => (
            DynamicValue::Null,
            DynamicValue::List(stream.backends.iter().map(flatten_stream_backend).collect()),
        ),
        None => (DynamicValue::Null, DynamicValue::Null),
    };
    make_state(vec![
        ("id", string_value(&group.id)),
        ("name", string_value(&group.name)),
        ("description", string_value(&group.description)),
        ("folder_id", string_value(&group.folder_id)),
        ("labels", string_map_value(&group.labels)),
        ("http_backend", http_backend),
        ("stream_backend", stream_backend),
        (
            "created_at",
            match &group.created_at {
                Some(ts) => string_value(timefmt::format_timestamp(ts)),
                None => DynamicValue::Null,
            },
        ),
    ])
}

fn flatten_common_backend(
    name: &str,
    weight: Option<i64>,
    port: i64,
    target_group_ids: &[String],
    healthchecks: &[HealthCheck],
    load_balancing: Option<&LoadBalancingConfig>,
) -> Vec<(&'static str, DynamicValue)> {
    let mut target_group_ids = target_group_ids.to_vec();
    target_group_ids.sort();
    vec![
        ("name", string_value(name)),
        ("weight", int_value(weight.unwrap_or(DEFAULT_BACKEND_WEIGHT))),
        ("port", int_value(port)),
        ("target_group_ids", string_list_value(target_group_ids)),
        (
            "healthcheck",
            DynamicValue::List(healthchecks.iter().map(flatten_healthcheck).collect()),
        ),
        (
            "load_balancing_config",
            match load_balancing {
                Some(lb) => block_value(vec![
                    ("panic_threshold", int_value(lb.panic_threshold)),
                    (
                        "locality_aware_routing_percent",
                        int_value(lb.locality_aware_routing_percent),
                    ),
                    ("strict_locality", bool_value(lb.strict_locality)),
                    (
                        "mode",
                        string_value(
                            api::enum_name(LOAD_BALANCING_MODE_NAMES, lb.mode).unwrap_or(""),
                        ),
                    ),
                ]),
                None => DynamicValue::Null,
            },
        ),
    ]
}

fn flatten_http_backend(backend: &HttpBackend) -> DynamicValue {
    let mut attrs = flatten_common_backend(
        &backend.name,
        backend.backend_weight,
        backend.port,
        &backend.target_group_ids,
        &backend.healthchecks,
        backend.load_balancing_config.as_ref(),
    );
    attrs.push(("http2", bool_value(backend.http2)));
    make_state(attrs)
}

fn flatten_stream_backend(backend: &StreamBackend) -> DynamicValue {
    let mut attrs = flatten_common_backend(
        &backend.name,
        backend.backend_weight,
        backend.port,
        &backend.target_group_ids,
        &backend.healthchecks,
        backend.load_balancing_config.as_ref(),
    );
    attrs.push((
        "enable_proxy_protocol",
        bool_value(backend.enable_proxy_protocol),
    ));
    attrs.push((
        "keep_connections_on_host_health_failure",
        bool_value(backend.keep_connections_on_host_health_failure),
    ));
    make_state(attrs)
}

fn flatten_healthcheck(check: &HealthCheck) -> DynamicValue {
    let (http, stream) = match &check.check {
        // The expected_statuses list is rendered even when empty; an
        // empty list asks for the server defaults and must not collapse
        // into an absent attribute.
        Some(health_check::Check::Http(h)) => (
            block_value(vec![
                ("host", string_value(&h.host)),
                ("path", string_value(&h.path)),
                ("http2", bool_value(h.http2)),
                (
                    "expected_statuses",
                    DynamicValue::List(h.expected_statuses.iter().map(|&s| int_value(s)).collect()),
                ),
            ]),
            DynamicValue::Null,
        ),
        Some(health_check::Check::Stream(s)) => (
            DynamicValue::Null,
            block_value(vec![
                ("send", string_value(&s.send)),
                ("receive", string_value(&s.receive)),
            ]),
        ),
        None => (DynamicValue::Null, DynamicValue::Null),
    };
    make_state(vec![
        (
            "timeout",
            match &check.timeout {
                Some(d) => string_value(timefmt::format_duration(d)),
                None => DynamicValue::Null,
            },
        ),
        (
            "interval",
            match &check.interval {
                Some(d) => string_value(timefmt::format_duration(d)),
                None => DynamicValue::Null,
            },
        ),
        (
            "interval_jitter_percent",
            float_value(check.interval_jitter_percent),
        ),
        ("healthy_threshold", int_value(check.healthy_threshold)),
        ("unhealthy_threshold", int_value(check.unhealthy_threshold)),
        ("healthcheck_port", int_value(check.healthcheck_port)),
        ("http_healthcheck", http),
        ("stream_healthcheck", stream),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http_group_config() -> DynamicValue {
        make_state(vec![
            ("name", string_value("web-backends")),
            (
                "http_backend",
                DynamicValue::List(vec![make_state(vec![
                    ("name", string_value("primary")),
                    ("port", int_value(8080)),
                    ("target_group_ids", string_list_value(["tg-1"])),
                    (
                        "healthcheck",
                        DynamicValue::List(vec![make_state(vec![
                            ("timeout", string_value("1s")),
                            ("interval", string_value("2s")),
                            (
                                "http_healthcheck",
                                block_value(vec![("path", string_value("/health"))]),
                            ),
                        ])]),
                    ),
                ])]),
            ),
        ])
    }

    #[test]
    fn expands_http_backends() {
        let mut diags = Diagnostics::new();
        let backend = expand_backend(&http_group_config(), &mut diags).unwrap();
        assert!(!diags.has_errors(), "{:?}", diags.entries());
        let http = match backend {
            backend_group::Backend::Http(http) => http,
            other => panic!("unexpected backend kind: {other:?}"),
        };
        assert_eq!(http.backends.len(), 1);
        let b = &http.backends[0];
        assert_eq!(b.backend_weight, Some(1));
        assert_eq!(b.port, 8080);
        let hc = &b.healthchecks[0];
        assert_eq!(hc.timeout.as_ref().unwrap().seconds, 1);
        match hc.check.as_ref().unwrap() {
            health_check::Check::Http(h) => {
                assert_eq!(h.path, "/health");
                assert!(h.expected_statuses.is_empty());
            }
            other => panic!("unexpected check: {other:?}"),
        }
    }

    #[test]
    fn backend_kinds_are_mutually_exclusive() {
        let mut cfg = http_group_config();
        cfg.set(
            "stream_backend",
            DynamicValue::List(vec![make_state(vec![
                ("name", string_value("tcp")),
                ("target_group_ids", string_list_value(["tg-1"])),
            ])]),
        );
        let mut diags = Diagnostics::new();
        assert!(expand_backend(&cfg, &mut diags).is_none());
        assert!(diags.has_errors());
    }

    #[test]
    fn some_backend_kind_is_required() {
        let cfg = make_state(vec![("name", string_value("empty"))]);
        let mut diags = Diagnostics::new();
        assert!(expand_backend(&cfg, &mut diags).is_none());
        assert!(diags.has_errors());
    }

    #[test]
    fn healthcheck_requires_exactly_one_protocol() {
        let block = make_state(vec![
            ("timeout", string_value("1s")),
            ("interval", string_value("2s")),
            (
                "http_healthcheck",
                block_value(vec![("path", string_value("/"))]),
            ),
            (
                "stream_healthcheck",
                block_value(vec![("send", string_value("ping"))]),
            ),
        ]);
        let mut diags = Diagnostics::new();
        expand_healthcheck("healthcheck.0", &block, &mut diags);
        assert!(diags.has_errors());

        let neither = make_state(vec![
            ("timeout", string_value("1s")),
            ("interval", string_value("2s")),
        ]);
        let mut diags = Diagnostics::new();
        expand_healthcheck("healthcheck.0", &neither, &mut diags);
        assert!(diags.has_errors());
    }

    #[test]
    fn bad_durations_are_reported_with_path() {
        let block = make_state(vec![
            ("timeout", string_value("soon")),
            ("interval", string_value("2s")),
            (
                "stream_healthcheck",
                block_value(vec![("send", string_value("ping"))]),
            ),
        ]);
        let mut diags = Diagnostics::new();
        expand_healthcheck("http_backend.0.healthcheck.0", &block, &mut diags);
        let err = diags.into_result().unwrap_err().to_string();
        assert!(err.contains("http_backend.0.healthcheck.0.timeout"), "{err}");
    }

    #[test]
    fn empty_expected_statuses_stay_an_empty_list() {
        // An empty list means "accept the server defaults" and must
        // survive flatten as an empty list, not disappear.
        let check = HealthCheck {
            timeout: Some(prost_types::Duration {
                seconds: 1,
                nanos: 0,
            }),
            interval: Some(prost_types::Duration {
                seconds: 2,
                nanos: 0,
            }),
            check: Some(health_check::Check::Http(HttpHealthCheck {
                path: "/health".into(),
                expected_statuses: vec![],
                ..Default::default()
            })),
            ..Default::default()
        };
        let state = flatten_healthcheck(&check);
        let http = get_block(&state, "http_healthcheck").unwrap();
        assert_eq!(
            http.get("expected_statuses"),
            Some(&DynamicValue::List(vec![]))
        );
        // A stream check has no http block at all.
        assert!(get_block(&state, "stream_healthcheck").is_none());
    }

    #[test]
    fn expected_statuses_flatten_in_wire_order() {
        let check = HealthCheck {
            check: Some(health_check::Check::Http(HttpHealthCheck {
                expected_statuses: vec![200, 204],
                ..Default::default()
            })),
            ..Default::default()
        };
        let state = flatten_healthcheck(&check);
        let http = get_block(&state, "http_healthcheck").unwrap();
        assert_eq!(
            http.get("expected_statuses"),
            Some(&DynamicValue::List(vec![int_value(200), int_value(204)]))
        );
    }

    #[test]
    fn durations_flatten_canonically() {
        let check = HealthCheck {
            timeout: Some(prost_types::Duration {
                seconds: 1,
                nanos: 500_000_000,
            }),
            interval: Some(prost_types::Duration {
                seconds: 2,
                nanos: 0,
            }),
            check: Some(health_check::Check::Stream(StreamHealthCheck::default())),
            ..Default::default()
        };
        let state = flatten_healthcheck(&check);
        assert_eq!(get_string_attr(&state, "timeout"), "1s500ms");
        assert_eq!(get_string_attr(&state, "interval"), "2s");
    }

    #[test]
    fn flatten_keeps_backend_kind() {
        let group = BackendGroup {
            id: "bg-1".into(),
            name: "web".into(),
            backend: Some(backend_group::Backend::Stream(StreamBackendGroup {
                backends: vec![StreamBackend {
                    name: "tcp".into(),
                    backend_weight: None,
                    target_group_ids: vec!["tg-b".into(), "tg-a".into()],
                    enable_proxy_protocol: true,
                    ..Default::default()
                }],
            })),
            ..Default::default()
        };
        let state = flatten_backend_group(&group);
        assert!(state.get("http_backend").unwrap().is_null());
        let backends = state.get("stream_backend").unwrap().as_list().unwrap();
        let b = &backends[0];
        // Absent weight flattens to the declared default.
        assert_eq!(get_int_attr(b, "weight", 0), 1);
        assert_eq!(
            b.get("target_group_ids"),
            Some(&string_list_value(["tg-a", "tg-b"]))
        );
        assert_eq!(get_bool_attr(b, "enable_proxy_protocol", false), true);
    }
}
