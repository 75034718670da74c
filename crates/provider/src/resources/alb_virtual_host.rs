//! `cirrus_alb_virtual_host` resource.
//!
//! Virtual hosts live inside an HTTP router and are addressed by
//! `<http_router_id>:<name>`. Routes are ordered; every route is either
//! HTTP or gRPC and carries exactly one action.

use std::time::Duration;

use tracing::{debug, info};

use cirrus_common::api::alb::{
    grpc_route, http_route, rate_limit, route, string_match, CreateVirtualHostRequest,
    DeleteVirtualHostRequest, DirectResponseAction, GetVirtualHostRequest, GrpcRoute,
    GrpcRouteAction, GrpcRouteMatch, GrpcStatusResponseAction, HttpRoute, HttpRouteAction,
    HttpRouteMatch, RateLimit, RegexMatchAndSubstitute, Route, RouteOptions, StringMatch,
    UpdateVirtualHostRequest, VirtualHost, GRPC_STATUS_NAMES,
};
use cirrus_common::{api, timefmt, Result};

use crate::client::CloudApi;
use crate::config::ProviderConfig;
use crate::diag::Diagnostics;
use crate::id;
use crate::ops::{retry_conflicting_operation, wait_operation};
use crate::schema::{AttributeSchema, AttributeType, Schema};
use crate::state::{
    block_value, get_block, get_int_attr, get_optional_int_attr, get_optional_string_attr,
    get_string_attr, get_string_list, int_value, make_state, string_list_value, string_value,
    DynamicValue,
};

use super::{read_result, CreateFailure, Resource};

const CREATE_TIMEOUT: Duration = Duration::from_secs(5 * 60);
const UPDATE_TIMEOUT: Duration = Duration::from_secs(5 * 60);
const DELETE_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Mutable fields, sent in full on every update.
const UPDATE_MASK: &[&str] = &["authority", "routes", "route_options"];

pub struct AlbVirtualHost;

#[async_trait::async_trait]
impl Resource for AlbVirtualHost {
    fn type_name() -> &'static str {
        "cirrus_alb_virtual_host"
    }

    fn schema() -> Schema {
        Schema::new(
            "A virtual host inside an HTTP router.",
            vec![
                AttributeSchema::new("http_router_id", AttributeType::String)
                    .required()
                    .force_new(),
                AttributeSchema::new("name", AttributeType::String)
                    .required()
                    .force_new(),
                AttributeSchema::new(
                    "authority",
                    AttributeType::Set(Box::new(AttributeType::String)),
                ),
                AttributeSchema::new("route", AttributeType::Block(route_schema())),
                AttributeSchema::new("route_options", AttributeType::Block(route_options_schema()))
                    .max_items(1),
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
        let routes = expand_routes(cfg, &mut diags);
        let route_options = get_block(cfg, "route_options")
            .map(|block| expand_route_options("route_options.0", block, &mut diags));
        diags.into_result()?;

        let http_router_id = get_string_attr(cfg, "http_router_id");
        let name = get_string_attr(cfg, "name");
        debug!(%http_router_id, virtual_host = %name, "creating virtual host");
        let request = CreateVirtualHostRequest {
            http_router_id: http_router_id.clone(),
            name: name.clone(),
            authority: get_string_list(cfg, "authority"),
            routes,
            route_options,
        };
        let op = retry_conflicting_operation(|| {
            let request = request.clone();
            async move { api.create_virtual_host(request).await }
        })
        .await?;

        let host_id = id::construct(&http_router_id, &name);
        wait_operation(
            api,
            op,
            config.poll_interval,
            config.create_timeout(CREATE_TIMEOUT),
        )
        .await
        .map_err(|e| CreateFailure::partial(host_id.clone(), e))?;

        let host = api
            .get_virtual_host(GetVirtualHostRequest {
                http_router_id: http_router_id.clone(),
                virtual_host_name: name,
            })
            .await
            .map_err(|e| CreateFailure::partial(host_id.clone(), e))?;
        info!(%host_id, "virtual host created");
        Ok(flatten_virtual_host(&http_router_id, &host))
    }

    async fn read(
        api: &dyn CloudApi,
        _config: &ProviderConfig,
        state: &DynamicValue,
    ) -> Result<Option<DynamicValue>> {
        let host_id = get_string_attr(state, "id");
        let (http_router_id, virtual_host_name) = id::deconstruct(&host_id)?;
        match read_result(
            api.get_virtual_host(GetVirtualHostRequest {
                http_router_id: http_router_id.clone(),
                virtual_host_name,
            })
            .await,
        )? {
            Some(host) => Ok(Some(flatten_virtual_host(&http_router_id, &host))),
            None => {
                debug!(%host_id, "virtual host is gone, removing from state");
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
        let host_id = get_string_attr(state, "id");
        let (http_router_id, virtual_host_name) = id::deconstruct(&host_id)?;

        let mut diags = Diagnostics::new();
        Self::schema().validate(cfg, &mut diags);
        let routes = expand_routes(cfg, &mut diags);
        let route_options = get_block(cfg, "route_options")
            .map(|block| expand_route_options("route_options.0", block, &mut diags));
        diags.into_result()?;

        debug!(%host_id, "updating virtual host");
        let request = UpdateVirtualHostRequest {
            http_router_id: http_router_id.clone(),
            virtual_host_name: virtual_host_name.clone(),
            update_mask: Some(prost_types::FieldMask {
                paths: UPDATE_MASK.iter().map(|p| p.to_string()).collect(),
            }),
            authority: get_string_list(cfg, "authority"),
            routes,
            route_options,
        };
        let op = retry_conflicting_operation(|| {
            let request = request.clone();
            async move { api.update_virtual_host(request).await }
        })
        .await?;
        wait_operation(
            api,
            op,
            config.poll_interval,
            config.update_timeout(UPDATE_TIMEOUT),
        )
        .await?;

        let host = api
            .get_virtual_host(GetVirtualHostRequest {
                http_router_id: http_router_id.clone(),
                virtual_host_name,
            })
            .await?;
        Ok(flatten_virtual_host(&http_router_id, &host))
    }

    async fn delete(
        api: &dyn CloudApi,
        config: &ProviderConfig,
        state: &DynamicValue,
    ) -> Result<()> {
        let host_id = get_string_attr(state, "id");
        let (http_router_id, virtual_host_name) = id::deconstruct(&host_id)?;
        debug!(%host_id, "deleting virtual host");
        let request = DeleteVirtualHostRequest {
            http_router_id,
            virtual_host_name,
        };
        let op = match retry_conflicting_operation(|| {
            let request = request.clone();
            async move { api.delete_virtual_host(request).await }
        })
        .await
        {
            Ok(op) => op,
            Err(e) if e.is_not_found() => {
                debug!(%host_id, "virtual host already deleted");
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
                info!(%host_id, "virtual host deleted");
                Ok(())
            }
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e),
        }
    }
}

fn string_match_schema() -> Schema {
    Schema::new(
        "",
        vec![
            AttributeSchema::new("exact", AttributeType::String),
            AttributeSchema::new("prefix", AttributeType::String),
        ],
    )
}

fn rate_limit_unit_schema() -> Schema {
    Schema::new(
        "",
        vec![
            AttributeSchema::new("per_second", AttributeType::Int),
            AttributeSchema::new("per_minute", AttributeType::Int),
        ],
    )
}

fn route_options_schema() -> Schema {
    Schema::new(
        "",
        vec![AttributeSchema::new(
            "rate_limit",
            AttributeType::Block(Schema::new(
                "",
                vec![
                    AttributeSchema::new(
                        "all_requests",
                        AttributeType::Block(rate_limit_unit_schema()),
                    )
                    .max_items(1),
                    AttributeSchema::new(
                        "requests_per_ip",
                        AttributeType::Block(rate_limit_unit_schema()),
                    )
                    .max_items(1),
                ],
            )),
        )
        .max_items(1)],
    )
}

fn route_schema() -> Schema {
    Schema::new(
        "",
        vec![
            AttributeSchema::new("name", AttributeType::String).required(),
            AttributeSchema::new(
                "http_route",
                AttributeType::Block(Schema::new(
                    "",
                    vec![
                        AttributeSchema::new(
                            "http_match",
                            AttributeType::Block(Schema::new(
                                "",
                                vec![
                                    AttributeSchema::new(
                                        "http_method",
                                        AttributeType::List(Box::new(AttributeType::String)),
                                    ),
                                    AttributeSchema::new(
                                        "path",
                                        AttributeType::Block(string_match_schema()),
                                    )
                                    .max_items(1),
                                ],
                            )),
                        )
                        .max_items(1),
                        AttributeSchema::new(
                            "http_route_action",
                            AttributeType::Block(Schema::new(
                                "",
                                vec![
                                    AttributeSchema::new(
                                        "backend_group_id",
                                        AttributeType::String,
                                    )
                                    .required(),
                                    AttributeSchema::new("timeout", AttributeType::String),
                                    AttributeSchema::new("prefix_rewrite", AttributeType::String),
                                    AttributeSchema::new(
                                        "regex_rewrite",
                                        AttributeType::Block(Schema::new(
                                            "",
                                            vec![
                                                AttributeSchema::new(
                                                    "regex",
                                                    AttributeType::String,
                                                )
                                                .required(),
                                                AttributeSchema::new(
                                                    "substitute",
                                                    AttributeType::String,
                                                ),
                                            ],
                                        )),
                                    )
                                    .max_items(1),
                                ],
                            )),
                        )
                        .max_items(1),
                        AttributeSchema::new(
                            "direct_response_action",
                            AttributeType::Block(Schema::new(
                                "",
                                vec![
                                    AttributeSchema::new("status", AttributeType::Int).required(),
                                    AttributeSchema::new("body", AttributeType::String),
                                ],
                            )),
                        )
                        .max_items(1),
                    ],
                )),
            )
            .max_items(1),
            AttributeSchema::new(
                "grpc_route",
                AttributeType::Block(Schema::new(
                    "",
                    vec![
                        AttributeSchema::new(
                            "grpc_match",
                            AttributeType::Block(Schema::new(
                                "",
                                vec![AttributeSchema::new(
                                    "fqmn",
                                    AttributeType::Block(string_match_schema()),
                                )
                                .max_items(1)],
                            )),
                        )
                        .max_items(1),
                        AttributeSchema::new(
                            "grpc_route_action",
                            AttributeType::Block(Schema::new(
                                "",
                                vec![
                                    AttributeSchema::new(
                                        "backend_group_id",
                                        AttributeType::String,
                                    )
                                    .required(),
                                    AttributeSchema::new("max_timeout", AttributeType::String),
                                ],
                            )),
                        )
                        .max_items(1),
                        AttributeSchema::new(
                            "grpc_status_response_action",
                            AttributeType::Block(Schema::new(
                                "",
                                vec![AttributeSchema::new("status", AttributeType::String)
                                    .required()],
                            )),
                        )
                        .max_items(1),
                    ],
                )),
            )
            .max_items(1),
        ],
    )
}

fn expand_routes(cfg: &DynamicValue, diags: &mut Diagnostics) -> Vec<Route> {
    cfg.get("route")
        .and_then(|v| v.as_list())
        .map(|items| {
            items
                .iter()
                .enumerate()
                .map(|(i, block)| expand_route(&format!("route.{i}"), block, diags))
                .collect()
        })
        .unwrap_or_default()
}

fn expand_route(path: &str, block: &DynamicValue, diags: &mut Diagnostics) -> Route {
    let http = get_block(block, "http_route");
    let grpc = get_block(block, "grpc_route");
    let kind = match (http, grpc) {
        (Some(_), Some(_)) => {
            diags.add_attribute_error(path, "http_route and grpc_route are mutually exclusive");
            None
        }
        (Some(http), None) => Some(route::Kind::Http(expand_http_route(
            &format!("{path}.http_route.0"),
            http,
            diags,
        ))),
        (None, Some(grpc)) => Some(route::Kind::Grpc(expand_grpc_route(
            &format!("{path}.grpc_route.0"),
            grpc,
            diags,
        ))),
        (None, None) => {
            diags.add_attribute_error(path, "either http_route or grpc_route must be set");
            None
        }
    };
    Route {
        name: get_string_attr(block, "name"),
        kind,
        route_options: None,
    }
}

fn expand_http_route(path: &str, block: &DynamicValue, diags: &mut Diagnostics) -> HttpRoute {
    let route_match = get_block(block, "http_match").map(|m| HttpRouteMatch {
        http_method: get_string_list(m, "http_method"),
        path: get_block(m, "path")
            .and_then(|sm| expand_string_match(&format!("{path}.http_match.0.path.0"), sm, diags)),
    });

    let forward = get_block(block, "http_route_action");
    let direct = get_block(block, "direct_response_action");
    let action = match (forward, direct) {
        (Some(_), Some(_)) => {
            diags.add_attribute_error(
                path,
                "http_route_action and direct_response_action are mutually exclusive",
            );
            None
        }
        (Some(action), None) => Some(http_route::Action::Route(HttpRouteAction {
            backend_group_id: get_string_attr(action, "backend_group_id"),
            timeout: expand_optional_duration(
                &format!("{path}.http_route_action.0.timeout"),
                action,
                "timeout",
                diags,
            ),
            prefix_rewrite: get_string_attr(action, "prefix_rewrite"),
            regex_rewrite: get_block(action, "regex_rewrite").map(|rr| RegexMatchAndSubstitute {
                regex: get_string_attr(rr, "regex"),
                substitute: get_string_attr(rr, "substitute"),
            }),
        })),
        (None, Some(direct)) => Some(http_route::Action::DirectResponse(DirectResponseAction {
            status: get_int_attr(direct, "status", 0),
            body: get_string_attr(direct, "body"),
        })),
        (None, None) => {
            diags.add_attribute_error(path, "an action block must be set");
            None
        }
    };
    HttpRoute { route_match, action }
}

fn expand_grpc_route(path: &str, block: &DynamicValue, diags: &mut Diagnostics) -> GrpcRoute {
    let route_match = get_block(block, "grpc_match").map(|m| GrpcRouteMatch {
        fqmn: get_block(m, "fqmn")
            .and_then(|sm| expand_string_match(&format!("{path}.grpc_match.0.fqmn.0"), sm, diags)),
    });

    let forward = get_block(block, "grpc_route_action");
    let status = get_block(block, "grpc_status_response_action");
    let action = match (forward, status) {
        (Some(_), Some(_)) => {
            diags.add_attribute_error(
                path,
                "grpc_route_action and grpc_status_response_action are mutually exclusive",
            );
            None
        }
        (Some(action), None) => Some(grpc_route::Action::Route(GrpcRouteAction {
            backend_group_id: get_string_attr(action, "backend_group_id"),
            max_timeout: expand_optional_duration(
                &format!("{path}.grpc_route_action.0.max_timeout"),
                action,
                "max_timeout",
                diags,
            ),
        })),
        (None, Some(status_block)) => {
            let status = expand_grpc_status(
                &format!("{path}.grpc_status_response_action.0.status"),
                &get_string_attr(status_block, "status"),
                diags,
            );
            Some(grpc_route::Action::StatusResponse(GrpcStatusResponseAction {
                status,
            }))
        }
        (None, None) => {
            diags.add_attribute_error(path, "an action block must be set");
            None
        }
    };
    GrpcRoute { route_match, action }
}

fn expand_string_match(
    path: &str,
    block: &DynamicValue,
    diags: &mut Diagnostics,
) -> Option<StringMatch> {
    let exact = get_optional_string_attr(block, "exact");
    let prefix = get_optional_string_attr(block, "prefix");
    let matcher = match (exact, prefix) {
        (Some(_), Some(_)) => {
            diags.add_attribute_error(path, "exact and prefix are mutually exclusive");
            return None;
        }
        (Some(exact), None) => string_match::Match::ExactMatch(exact),
        (None, Some(prefix)) => string_match::Match::PrefixMatch(prefix),
        (None, None) => {
            diags.add_attribute_error(path, "either exact or prefix must be set");
            return None;
        }
    };
    Some(StringMatch {
        r#match: Some(matcher),
    })
}

fn expand_optional_duration(
    path: &str,
    block: &DynamicValue,
    attr: &str,
    diags: &mut Diagnostics,
) -> Option<prost_types::Duration> {
    let text = get_optional_string_attr(block, attr)?;
    match timefmt::parse_duration(&text) {
        Ok(d) => Some(d),
        Err(e) => {
            diags.add_attribute_error(path, e.to_string());
            None
        }
    }
}

/// gRPC statuses are spelled lowercase in configuration and state;
/// `ok` is ordinal zero and perfectly valid.
fn expand_grpc_status(path: &str, value: &str, diags: &mut Diagnostics) -> i32 {
    match api::enum_value(GRPC_STATUS_NAMES, value.to_uppercase().as_str()) {
        Some(status) => status,
        None => {
            let allowed: Vec<String> = GRPC_STATUS_NAMES
                .iter()
                .map(|(n, _)| n.to_lowercase())
                .collect();
            diags.add_attribute_error(
                path,
                format!(
                    "value {value:?} is not supported, allowed: {}",
                    allowed.join(", ")
                ),
            );
            0
        }
    }
}

fn flatten_grpc_status(status: i32) -> String {
    api::enum_name(GRPC_STATUS_NAMES, status)
        .unwrap_or("")
        .to_lowercase()
}

fn expand_route_options(
    path: &str,
    block: &DynamicValue,
    diags: &mut Diagnostics,
) -> RouteOptions {
    RouteOptions {
        rate_limit: get_block(block, "rate_limit").map(|rl| RateLimit {
            all_requests: get_block(rl, "all_requests")
                .and_then(|b| expand_rate_limit_unit(&format!("{path}.rate_limit.0.all_requests.0"), b, diags)),
            requests_per_ip: get_block(rl, "requests_per_ip")
                .and_then(|b| expand_rate_limit_unit(&format!("{path}.rate_limit.0.requests_per_ip.0"), b, diags)),
        }),
    }
}

fn expand_rate_limit_unit(
    path: &str,
    block: &DynamicValue,
    diags: &mut Diagnostics,
) -> Option<rate_limit::Limit> {
    let per_second = get_optional_int_attr(block, "per_second");
    let per_minute = get_optional_int_attr(block, "per_minute");
    let rate = match (per_second, per_minute) {
        (Some(_), Some(_)) => {
            diags.add_attribute_error(path, "per_second and per_minute are mutually exclusive");
            return None;
        }
        (Some(v), None) => rate_limit::limit::Rate::PerSecond(v),
        (None, Some(v)) => rate_limit::limit::Rate::PerMinute(v),
        (None, None) => {
            diags.add_attribute_error(path, "either per_second or per_minute must be set");
            return None;
        }
    };
    Some(rate_limit::Limit { rate: Some(rate) })
}

fn flatten_virtual_host(http_router_id: &str, host: &VirtualHost) -> DynamicValue {
    let mut authority = host.authority.clone();
    authority.sort();
    make_state(vec![
        (
            "id",
            string_value(id::construct(http_router_id, &host.name)),
        ),
        ("http_router_id", string_value(http_router_id)),
        ("name", string_value(&host.name)),
        ("authority", string_list_value(authority)),
        (
            "route",
            DynamicValue::List(host.routes.iter().map(flatten_route).collect()),
        ),
        (
            "route_options",
            match &host.route_options {
                Some(options) => flatten_route_options(options),
                None => DynamicValue::Null,
            },
        ),
    ])
}

fn flatten_route(route: &Route) -> DynamicValue {
    let (http, grpc) = match &route.kind {
        Some(route::Kind::Http(http)) => (flatten_http_route(http), DynamicValue::Null),
        Some(route::Kind::Grpc(grpc)) => (DynamicValue::Null, flatten_grpc_route(grpc)),
        None => (DynamicValue::Null, DynamicValue::Null),
    };
    make_state(vec![
        ("name", string_value(&route.name)),
        ("http_route", http),
        ("grpc_route", grpc),
    ])
}

fn flatten_http_route(route: &HttpRoute) -> DynamicValue {
    let http_match = match &route.route_match {
        Some(m) => block_value(vec![
            ("http_method", string_list_value(m.http_method.clone())),
            (
                "path",
                match &m.path {
                    Some(sm) => flatten_string_match(sm),
                    None => DynamicValue::Null,
                },
            ),
        ]),
        None => DynamicValue::Null,
    };
    let (forward, direct) = match &route.action {
        Some(http_route::Action::Route(action)) => (
            block_value(vec![
                ("backend_group_id", string_value(&action.backend_group_id)),
                (
                    "timeout",
                    match &action.timeout {
                        Some(d) => string_value(timefmt::format_duration(d)),
                        None => DynamicValue::Null,
                    },
                ),
                ("prefix_rewrite", string_value(&action.prefix_rewrite)),
                (
                    "regex_rewrite",
                    match &action.regex_rewrite {
                        Some(rr) => block_value(vec![
                            ("regex", string_value(&rr.regex)),
                            ("substitute", string_value(&rr.substitute)),
                        ]),
                        None => DynamicValue::Null,
                    },
                ),
            ]),
            DynamicValue::Null,
        ),
        Some(http_route::Action::DirectResponse(action)) => (
            DynamicValue::Null,
            block_value(vec![
                ("status", int_value(action.status)),
                ("body", string_value(&action.body)),
            ]),
        ),
        None => (DynamicValue::Null, DynamicValue::Null),
    };
    block_value(vec![
        ("http_match", http_match),
        ("http_route_action", forward),
        ("direct_response_action", direct),
    ])
}

fn flatten_grpc_route(route: &GrpcRoute) -> DynamicValue {
    let grpc_match = match &route.route_match {
        Some(m) => block_value(vec![(
            "fqmn",
            match &m.fqmn {
                Some(sm) => flatten_string_match(sm),
                None => DynamicValue::Null,
            },
        )]),
        None => DynamicValue::Null,
    };
    let (forward, status) = match &route.action {
        Some(grpc_route::Action::Route(action)) => (
            block_value(vec![
                ("backend_group_id", string_value(&action.backend_group_id)),
                (
                    "max_timeout",
                    match &action.max_timeout {
                        Some(d) => string_value(timefmt::format_duration(d)),
                        None => DynamicValue::Null,
                    },
                ),
            ]),
            DynamicValue::Null,
        ),
        Some(grpc_route::Action::StatusResponse(action)) => (
            DynamicValue::Null,
            block_value(vec![(
                "status",
                string_value(flatten_grpc_status(action.status)),
            )]),
        ),
        None => (DynamicValue::Null, DynamicValue::Null),
    };
    block_value(vec![
        ("grpc_match", grpc_match),
        ("grpc_route_action", forward),
        ("grpc_status_response_action", status),
    ])
}

fn flatten_string_match(sm: &StringMatch) -> DynamicValue {
    match &sm.r#match {
        Some(string_match::Match::ExactMatch(value)) => {
            block_value(vec![("exact", string_value(value))])
        }
        Some(string_match::Match::PrefixMatch(value)) => {
            block_value(vec![("prefix", string_value(value))])
        }
        None => DynamicValue::Null,
    }
}

fn flatten_route_options(options: &RouteOptions) -> DynamicValue {
    match &options.rate_limit {
        Some(rate_limit) => block_value(vec![(
            "rate_limit",
            block_value(vec![
                (
                    "all_requests",
                    flatten_rate_limit_unit(rate_limit.all_requests.as_ref()),
                ),
                (
                    "requests_per_ip",
                    flatten_rate_limit_unit(rate_limit.requests_per_ip.as_ref()),
                ),
            ]),
        )]),
        None => block_value(vec![]),
    }
}

fn flatten_rate_limit_unit(limit: Option<&rate_limit::Limit>) -> DynamicValue {
    match limit.and_then(|l| l.rate.as_ref()) {
        Some(rate_limit::limit::Rate::PerSecond(v)) => {
            block_value(vec![("per_second", int_value(*v))])
        }
        Some(rate_limit::limit::Rate::PerMinute(v)) => {
            block_value(vec![("per_minute", int_value(*v))])
        }
        None => DynamicValue::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_flattens_each_unit_under_its_window() {
        let options = RouteOptions {
            rate_limit: Some(RateLimit {
                all_requests: Some(rate_limit::Limit {
                    rate: Some(rate_limit::limit::Rate::PerSecond(10)),
                }),
                requests_per_ip: Some(rate_limit::Limit {
                    rate: Some(rate_limit::limit::Rate::PerMinute(15)),
                }),
            }),
        };
        let state = flatten_route_options(&options);
        let block = state.as_list().unwrap().first().unwrap();
        let rate_limit = get_block(block, "rate_limit").unwrap();
        let all = get_block(rate_limit, "all_requests").unwrap();
        assert_eq!(get_int_attr(all, "per_second", 0), 10);
        assert!(all.get("per_minute").is_none());
        let per_ip = get_block(rate_limit, "requests_per_ip").unwrap();
        assert_eq!(get_int_attr(per_ip, "per_minute", 0), 15);
        assert!(per_ip.get("per_second").is_none());
    }

    #[test]
    fn rate_limit_units_are_mutually_exclusive() {
        let block = make_state(vec![
            ("per_second", int_value(10)),
            ("per_minute", int_value(15)),
        ]);
        let mut diags = Diagnostics::new();
        assert!(expand_rate_limit_unit("rate_limit", &block, &mut diags).is_none());
        assert!(diags.has_errors());
    }

    #[test]
    fn grpc_status_round_trips_lowercase() {
        let mut diags = Diagnostics::new();
        assert_eq!(expand_grpc_status("status", "ok", &mut diags), 0);
        assert_eq!(expand_grpc_status("status", "not_found", &mut diags), 2);
        assert!(!diags.has_errors());
        assert_eq!(flatten_grpc_status(0), "ok");
        assert_eq!(flatten_grpc_status(4), "unavailable");

        expand_grpc_status("status", "teapot", &mut diags);
        let err = diags.into_result().unwrap_err().to_string();
        assert!(err.contains("permission_denied"), "{err}");
    }

    #[test]
    fn string_match_requires_exactly_one_arm() {
        let mut diags = Diagnostics::new();
        let exact = make_state(vec![("exact", string_value("/api"))]);
        let sm = expand_string_match("path", &exact, &mut diags).unwrap();
        assert_eq!(
            sm.r#match,
            Some(string_match::Match::ExactMatch("/api".into()))
        );

        let both = make_state(vec![
            ("exact", string_value("/api")),
            ("prefix", string_value("/a")),
        ]);
        assert!(expand_string_match("path", &both, &mut diags).is_none());
        assert!(diags.has_errors());
    }

    #[test]
    fn route_requires_exactly_one_kind() {
        let block = make_state(vec![("name", string_value("r1"))]);
        let mut diags = Diagnostics::new();
        let route = expand_route("route.0", &block, &mut diags);
        assert!(route.kind.is_none());
        assert!(diags.has_errors());
    }

    #[test]
    fn http_route_expands_action_and_rewrite() {
        let block = make_state(vec![
            ("name", string_value("api")),
            (
                "http_route",
                block_value(vec![
                    (
                        "http_match",
                        block_value(vec![
                            ("http_method", string_list_value(["GET", "POST"])),
                            ("path", block_value(vec![("prefix", string_value("/api/"))])),
                        ]),
                    ),
                    (
                        "http_route_action",
                        block_value(vec![
                            ("backend_group_id", string_value("bg-1")),
                            ("timeout", string_value("30s")),
                            (
                                "regex_rewrite",
                                block_value(vec![
                                    ("regex", string_value("^/api/(.*)")),
                                    ("substitute", string_value("/$1")),
                                ]),
                            ),
                        ]),
                    ),
                ]),
            ),
        ]);
        let mut diags = Diagnostics::new();
        let route = expand_route("route.0", &block, &mut diags);
        assert!(!diags.has_errors(), "{:?}", diags.entries());
        let http = match route.kind.unwrap() {
            route::Kind::Http(http) => http,
            other => panic!("unexpected kind: {other:?}"),
        };
        assert_eq!(
            http.route_match.as_ref().unwrap().http_method,
            vec!["GET", "POST"]
        );
        match http.action.unwrap() {
            http_route::Action::Route(action) => {
                assert_eq!(action.backend_group_id, "bg-1");
                assert_eq!(action.timeout.unwrap().seconds, 30);
                assert_eq!(action.regex_rewrite.unwrap().regex, "^/api/(.*)");
            }
            other => panic!("unexpected action: {other:?}"),
        }
    }

    #[test]
    fn routes_flatten_in_wire_order() {
        let host = VirtualHost {
            name: "api".into(),
            authority: vec!["b.example.com".into(), "a.example.com".into()],
            routes: vec![
                Route {
                    name: "second".into(),
                    kind: Some(route::Kind::Grpc(GrpcRoute {
                        route_match: None,
                        action: Some(grpc_route::Action::StatusResponse(
                            GrpcStatusResponseAction { status: 2 },
                        )),
                    })),
                    route_options: None,
                },
                Route {
                    name: "first".into(),
                    kind: Some(route::Kind::Http(HttpRoute {
                        route_match: None,
                        action: Some(http_route::Action::DirectResponse(DirectResponseAction {
                            status: 404,
                            body: "not here".into(),
                        })),
                    })),
                    route_options: None,
                },
            ],
            route_options: None,
        };
        let state = flatten_virtual_host("router-1", &host);
        assert_eq!(get_string_attr(&state, "id"), "router-1:api");
        // Authority is a set and flattens sorted; routes keep wire order.
        assert_eq!(
            state.get("authority"),
            Some(&string_list_value(["a.example.com", "b.example.com"]))
        );
        let routes = state.get("route").unwrap().as_list().unwrap();
        assert_eq!(get_string_attr(&routes[0], "name"), "second");
        let grpc = get_block(&routes[0], "grpc_route").unwrap();
        let status = get_block(grpc, "grpc_status_response_action").unwrap();
        assert_eq!(get_string_attr(status, "status"), "not_found");
        let http = get_block(&routes[1], "http_route").unwrap();
        let direct = get_block(http, "direct_response_action").unwrap();
        assert_eq!(get_int_attr(direct, "status", 0), 404);
    }
}
