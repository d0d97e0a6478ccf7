//! Typed configuration -> ARM request

use std::collections::HashMap;

use super::config::{PrivateEndpointConfig, ServiceConnection};
use crate::client::models::{
    PrivateEndpoint, PrivateEndpointProperties, PrivateLinkServiceConnection,
    PrivateLinkServiceConnectionProperties, SubResource,
};
use crate::utils::normalize_location;

/// Connections whose manual flag equals `want_manual`, in request form
pub fn expand_service_connections(
    connections: &[ServiceConnection],
    want_manual: bool,
) -> Vec<PrivateLinkServiceConnection> {
    connections
        .iter()
        .filter(|c| c.is_manual_connection == want_manual)
        .map(|c| PrivateLinkServiceConnection {
            name: Some(c.name.clone()),
            properties: Some(PrivateLinkServiceConnectionProperties {
                private_link_service_id: Some(c.private_connection_resource_id.clone()),
                group_ids: Some(c.subresource_names.clone()),
                request_message: c.request_message.clone().filter(|m| !m.is_empty()),
                ..Default::default()
            }),
            ..Default::default()
        })
        .collect()
}

pub fn expand_tags(tags: &HashMap<String, String>) -> HashMap<String, String> {
    tags.clone()
}

/// Request body for create/update
pub fn expand_private_endpoint(config: &PrivateEndpointConfig) -> PrivateEndpoint {
    let connections = &config.private_service_connections;
    PrivateEndpoint {
        location: Some(normalize_location(&config.location)),
        tags: Some(expand_tags(&config.tags)),
        properties: Some(PrivateEndpointProperties {
            subnet: Some(SubResource {
                id: Some(config.subnet_id.clone()),
            }),
            private_link_service_connections: Some(expand_service_connections(connections, false)),
            manual_private_link_service_connections: Some(expand_service_connections(
                connections,
                true,
            )),
            ..Default::default()
        }),
        ..Default::default()
    }
}
