//! Typed configuration and observed state of a private link endpoint

use std::collections::HashMap;

use carina_core::resource::Value;

use super::error::EndpointError;

/// One `private_service_connection` block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceConnection {
    pub name: String,
    pub is_manual_connection: bool,
    pub private_connection_resource_id: String,
    pub subresource_names: Vec<String>,
    pub request_message: Option<String>,
    pub provisioning_state: Option<String>,
    pub status: Option<String>,
    pub private_ip_address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrivateEndpointConfig {
    pub name: String,
    pub location: String,
    pub resource_group_name: String,
    pub subnet_id: String,
    pub private_service_connections: Vec<ServiceConnection>,
    pub tags: HashMap<String, String>,
}

/// Endpoint as observed remotely
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrivateEndpointState {
    /// ARM resource ID
    pub id: String,
    pub config: PrivateEndpointConfig,
    pub network_interface_ids: Vec<String>,
}

fn invalid(name: &str, reason: impl Into<String>) -> EndpointError {
    EndpointError::InvalidAttribute {
        name: name.to_string(),
        reason: reason.into(),
    }
}

fn required_string(attrs: &HashMap<String, Value>, name: &str) -> Result<String, EndpointError> {
    match attrs.get(name) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(invalid(name, "expected a string")),
        None => Err(invalid(name, "attribute is required")),
    }
}

fn optional_string(
    attrs: &HashMap<String, Value>,
    name: &str,
) -> Result<Option<String>, EndpointError> {
    match attrs.get(name) {
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(invalid(name, "expected a string")),
        None => Ok(None),
    }
}

fn string_list(attrs: &HashMap<String, Value>, name: &str) -> Result<Vec<String>, EndpointError> {
    match attrs.get(name) {
        None => Ok(Vec::new()),
        Some(Value::List(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| invalid(name, "expected a list of strings"))
            })
            .collect(),
        Some(_) => Err(invalid(name, "expected a list of strings")),
    }
}

impl ServiceConnection {
    fn from_attributes(attrs: &HashMap<String, Value>) -> Result<Self, EndpointError> {
        let is_manual_connection = match attrs.get("is_manual_connection") {
            Some(Value::Bool(b)) => *b,
            Some(_) => return Err(invalid("is_manual_connection", "expected a bool")),
            None => return Err(invalid("is_manual_connection", "attribute is required")),
        };

        Ok(Self {
            name: required_string(attrs, "name")?,
            is_manual_connection,
            private_connection_resource_id: required_string(
                attrs,
                "private_connection_resource_id",
            )?,
            subresource_names: string_list(attrs, "subresource_names")?,
            request_message: optional_string(attrs, "request_message")?
                .filter(|s| !s.is_empty()),
            provisioning_state: None,
            status: None,
            private_ip_address: None,
        })
    }

    fn to_value(&self) -> Value {
        let mut map = HashMap::new();
        map.insert("name".to_string(), Value::from(self.name.as_str()));
        map.insert(
            "is_manual_connection".to_string(),
            Value::Bool(self.is_manual_connection),
        );
        map.insert(
            "private_connection_resource_id".to_string(),
            Value::from(self.private_connection_resource_id.as_str()),
        );
        map.insert(
            "subresource_names".to_string(),
            Value::string_list(self.subresource_names.iter().cloned()),
        );

        let optional = [
            ("request_message", &self.request_message),
            ("provisioning_state", &self.provisioning_state),
            ("status", &self.status),
            ("private_ip_address", &self.private_ip_address),
        ];
        for (key, value) in optional {
            if let Some(v) = value {
                map.insert(key.to_string(), Value::from(v.as_str()));
            }
        }

        Value::Map(map)
    }
}

impl PrivateEndpointConfig {
    /// Parse schema-validated attributes
    pub fn from_attributes(attrs: &HashMap<String, Value>) -> Result<Self, EndpointError> {
        let private_service_connections = match attrs.get("private_service_connection") {
            None => Vec::new(),
            Some(Value::List(items)) => items
                .iter()
                .map(|item| match item {
                    Value::Map(block) => ServiceConnection::from_attributes(block),
                    _ => Err(invalid("private_service_connection", "expected a block")),
                })
                .collect::<Result<_, _>>()?,
            Some(_) => {
                return Err(invalid(
                    "private_service_connection",
                    "expected a list of blocks",
                ));
            }
        };

        let tags = match attrs.get("tags") {
            None => HashMap::new(),
            Some(Value::Map(map)) => map
                .iter()
                .map(|(k, v)| match v {
                    Value::String(s) => Ok((k.clone(), s.clone())),
                    _ => Err(invalid("tags", format!("value for {:?} must be a string", k))),
                })
                .collect::<Result<_, _>>()?,
            Some(_) => return Err(invalid("tags", "expected a map of strings")),
        };

        Ok(Self {
            name: required_string(attrs, "name")?,
            location: required_string(attrs, "location")?,
            resource_group_name: required_string(attrs, "resource_group_name")?,
            subnet_id: required_string(attrs, "subnet_id")?,
            private_service_connections,
            tags,
        })
    }
}

impl PrivateEndpointState {
    /// Render the state as attributes for the host
    pub fn to_attributes(&self) -> HashMap<String, Value> {
        let config = &self.config;
        let mut attributes = HashMap::new();
        attributes.insert("name".to_string(), Value::from(config.name.as_str()));
        attributes.insert("location".to_string(), Value::from(config.location.as_str()));
        attributes.insert(
            "resource_group_name".to_string(),
            Value::from(config.resource_group_name.as_str()),
        );
        attributes.insert("subnet_id".to_string(), Value::from(config.subnet_id.as_str()));
        attributes.insert(
            "private_service_connection".to_string(),
            Value::List(
                config
                    .private_service_connections
                    .iter()
                    .map(ServiceConnection::to_value)
                    .collect(),
            ),
        );
        attributes.insert(
            "network_interface_ids".to_string(),
            Value::string_list(self.network_interface_ids.iter().cloned()),
        );

        if !config.tags.is_empty() {
            let tags = config
                .tags
                .iter()
                .map(|(k, v)| (k.clone(), Value::from(v.as_str())))
                .collect();
            attributes.insert("tags".to_string(), Value::Map(tags));
        }

        attributes
    }
}
