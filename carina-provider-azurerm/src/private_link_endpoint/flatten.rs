//! ARM response -> typed state

use std::collections::HashMap;

use super::config::{PrivateEndpointConfig, PrivateEndpointState, ServiceConnection};
use crate::client::models::{NetworkInterface, PrivateEndpoint, PrivateLinkServiceConnection};
use crate::utils::normalize_location;

fn flatten_connection(
    item: &PrivateLinkServiceConnection,
    is_manual_connection: bool,
    private_ip: Option<&str>,
) -> ServiceConnection {
    let mut connection = ServiceConnection {
        name: item.name.clone().unwrap_or_default(),
        is_manual_connection,
        private_ip_address: private_ip.map(str::to_string),
        ..Default::default()
    };

    if let Some(props) = &item.properties {
        connection.subresource_names = props.group_ids.clone().unwrap_or_default();
        connection.private_connection_resource_id =
            props.private_link_service_id.clone().unwrap_or_default();
        connection.request_message = props.request_message.clone();
        connection.provisioning_state = props
            .provisioning_state
            .clone()
            .filter(|s| !s.is_empty());
        connection.status = props
            .private_link_service_connection_state
            .as_ref()
            .and_then(|s| s.status.clone());
    }

    connection
}

/// Automatic connections followed by manual ones, each carrying `private_ip`
pub fn flatten_service_connections(
    automatic: Option<&[PrivateLinkServiceConnection]>,
    manual: Option<&[PrivateLinkServiceConnection]>,
    private_ip: Option<&str>,
) -> Vec<ServiceConnection> {
    let automatic = automatic
        .unwrap_or_default()
        .iter()
        .map(|item| flatten_connection(item, false, private_ip));
    let manual = manual
        .unwrap_or_default()
        .iter()
        .map(|item| flatten_connection(item, true, private_ip));
    automatic.chain(manual).collect()
}

/// IDs of the attached interfaces, in source order
pub fn flatten_interface_ids(input: Option<&[NetworkInterface]>) -> Vec<String> {
    input
        .unwrap_or_default()
        .iter()
        .filter_map(|nic| nic.id.clone())
        .collect()
}

pub fn flatten_tags(tags: Option<&HashMap<String, String>>) -> HashMap<String, String> {
    tags.cloned().unwrap_or_default()
}

/// Typed state of a fetched endpoint
///
/// `resource_group` and `name` come from the endpoint's ID; the name reported
/// by the service wins when present.
pub fn flatten_private_endpoint(
    id: &str,
    resource_group: &str,
    name: &str,
    endpoint: &PrivateEndpoint,
    private_ip: Option<&str>,
) -> PrivateEndpointState {
    let props = endpoint.properties.as_ref();

    let subnet_id = props
        .and_then(|p| p.subnet.as_ref())
        .and_then(|s| s.id.clone())
        .unwrap_or_default();
    let network_interface_ids =
        flatten_interface_ids(props.and_then(|p| p.network_interfaces.as_deref()));
    let private_service_connections = match props {
        Some(p) => flatten_service_connections(
            p.private_link_service_connections.as_deref(),
            p.manual_private_link_service_connections.as_deref(),
            private_ip,
        ),
        None => Vec::new(),
    };

    PrivateEndpointState {
        id: id.to_string(),
        config: PrivateEndpointConfig {
            name: endpoint.name.clone().unwrap_or_else(|| name.to_string()),
            location: endpoint
                .location
                .as_deref()
                .map(normalize_location)
                .unwrap_or_default(),
            resource_group_name: resource_group.to_string(),
            subnet_id,
            private_service_connections,
            tags: flatten_tags(endpoint.tags.as_ref()),
        },
        network_interface_ids,
    }
}
