//! ARM `Microsoft.Network` wire types (api-version 2019-06-01)
//!
//! Every field is optional on the wire; absent fields are skipped on output.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Reference to another ARM resource by ID
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubResource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivateEndpoint {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<PrivateEndpointProperties>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivateEndpointProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet: Option<SubResource>,
    /// Read-only: interfaces created for the endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_interfaces: Option<Vec<NetworkInterface>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_link_service_connections: Option<Vec<PrivateLinkServiceConnection>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manual_private_link_service_connections: Option<Vec<PrivateLinkServiceConnection>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivateLinkServiceConnection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<PrivateLinkServiceConnectionProperties>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivateLinkServiceConnectionProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_link_service_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_link_service_connection_state: Option<PrivateLinkServiceConnectionState>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivateLinkServiceConnectionState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actions_required: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterface {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<NetworkInterfaceProperties>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterfaceProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_configurations: Option<Vec<InterfaceIpConfiguration>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceIpConfiguration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<InterfaceIpConfigurationProperties>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceIpConfigurationProperties {
    #[serde(rename = "privateIPAddress", skip_serializing_if = "Option::is_none")]
    pub private_ip_address: Option<String>,
    #[serde(
        rename = "privateIPAllocationMethod",
        skip_serializing_if = "Option::is_none"
    )]
    pub private_ip_allocation_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary: Option<bool>,
}

impl NetworkInterface {
    /// Private address of the first IP configuration, if it has one
    pub fn first_private_ip_address(&self) -> Option<&str> {
        self.properties
            .as_ref()?
            .ip_configurations
            .as_ref()?
            .first()?
            .properties
            .as_ref()?
            .private_ip_address
            .as_deref()
    }
}

/// Body of an ARM error response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorResponse {
    pub error: Option<ErrorDetail>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorDetail {
    pub code: Option<String>,
    pub message: Option<String>,
}

/// Body returned by an `Azure-AsyncOperation` status monitor
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AsyncOperationStatus {
    pub status: Option<String>,
    pub error: Option<ErrorDetail>,
}

/// Terminal and non-terminal states shared by async operations and provisioning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
    InProgress,
    Succeeded,
    Failed,
    Canceled,
}

impl OperationState {
    pub fn parse(status: &str) -> Self {
        if status.eq_ignore_ascii_case("Succeeded") {
            OperationState::Succeeded
        } else if status.eq_ignore_ascii_case("Failed") {
            OperationState::Failed
        } else if status.eq_ignore_ascii_case("Canceled")
            || status.eq_ignore_ascii_case("Cancelled")
        {
            OperationState::Canceled
        } else {
            OperationState::InProgress
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn private_endpoint_deserializes_from_arm_json() {
        let body = r#"{
            "id": "/subscriptions/sub/resourceGroups/rg1/providers/Microsoft.Network/privateEndpoints/ep1",
            "name": "ep1",
            "type": "Microsoft.Network/privateEndpoints",
            "location": "westeurope",
            "tags": {"env": "test"},
            "properties": {
                "provisioningState": "Succeeded",
                "subnet": {"id": "/subnets/s1"},
                "networkInterfaces": [{"id": "/nic/ep1.nic"}],
                "privateLinkServiceConnections": [{
                    "name": "conn1",
                    "properties": {
                        "provisioningState": "Succeeded",
                        "privateLinkServiceId": "/services/svc1",
                        "groupIds": ["blob"],
                        "privateLinkServiceConnectionState": {"status": "Approved", "description": "Auto-Approved"}
                    }
                }],
                "manualPrivateLinkServiceConnections": []
            }
        }"#;

        let endpoint: PrivateEndpoint = serde_json::from_str(body).unwrap();
        assert_eq!(endpoint.name.as_deref(), Some("ep1"));
        assert_eq!(
            endpoint.resource_type.as_deref(),
            Some("Microsoft.Network/privateEndpoints")
        );
        let props = endpoint.properties.unwrap();
        assert_eq!(props.subnet.unwrap().id.as_deref(), Some("/subnets/s1"));
        let conn = &props.private_link_service_connections.unwrap()[0];
        let conn_props = conn.properties.as_ref().unwrap();
        assert_eq!(conn_props.group_ids, Some(vec!["blob".to_string()]));
        assert_eq!(
            conn_props
                .private_link_service_connection_state
                .as_ref()
                .and_then(|s| s.status.as_deref()),
            Some("Approved")
        );
        assert_eq!(props.manual_private_link_service_connections, Some(vec![]));
    }

    #[test]
    fn request_omits_absent_fields() {
        let endpoint = PrivateEndpoint {
            location: Some("westeurope".to_string()),
            properties: Some(PrivateEndpointProperties {
                subnet: Some(SubResource {
                    id: Some("/subnets/s1".to_string()),
                }),
                ..Default::default()
            }),
            ..Default::default()
        };

        let json = serde_json::to_value(&endpoint).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "location": "westeurope",
                "properties": {"subnet": {"id": "/subnets/s1"}}
            })
        );
    }

    #[test]
    fn interface_ip_uses_arm_casing() {
        let body = r#"{
            "id": "/nic/ep1.nic",
            "properties": {
                "ipConfigurations": [
                    {"name": "first", "properties": {"privateIPAddress": "10.0.0.4", "privateIPAllocationMethod": "Dynamic"}},
                    {"name": "second", "properties": {"privateIPAddress": "10.0.0.5"}}
                ]
            }
        }"#;

        let nic: NetworkInterface = serde_json::from_str(body).unwrap();
        assert_eq!(nic.first_private_ip_address(), Some("10.0.0.4"));
        assert_eq!(NetworkInterface::default().first_private_ip_address(), None);
    }

    #[test]
    fn operation_state_parsing() {
        assert_eq!(OperationState::parse("Succeeded"), OperationState::Succeeded);
        assert_eq!(OperationState::parse("failed"), OperationState::Failed);
        assert_eq!(OperationState::parse("Canceled"), OperationState::Canceled);
        assert_eq!(OperationState::parse("Updating"), OperationState::InProgress);
    }
}
