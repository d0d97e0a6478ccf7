//! Private link endpoint resource schema definition
//!
//! Based on the ARM Microsoft.Network/privateEndpoints resource (api-version 2019-06-01).

use std::collections::HashMap;

use carina_core::resource::Value;
use carina_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};
use regex::Regex;

pub const REQUEST_MESSAGE_MAX_LENGTH: usize = 140;
pub const MAX_TAGS: usize = 50;
pub const TAG_KEY_MAX_LENGTH: usize = 512;
pub const TAG_VALUE_MAX_LENGTH: usize = 256;

/// Validate the message sent to the owner of a manually approved service
pub fn validate_request_message(s: &str) -> Result<(), String> {
    let length = s.chars().count();
    if length == 0 || length > REQUEST_MESSAGE_MAX_LENGTH {
        return Err(format!(
            "request_message must be between 1 and {} characters in length, got {}",
            REQUEST_MESSAGE_MAX_LENGTH, length
        ));
    }
    if s.trim().is_empty() {
        return Err("request_message must not consist only of whitespace".to_string());
    }
    Ok(())
}

/// Validate an ARM resource group name
pub fn validate_resource_group_name(s: &str) -> Result<(), String> {
    if s.len() > 90 {
        return Err(format!(
            "resource group name {:?} may not exceed 90 characters in length",
            s
        ));
    }
    if s.ends_with('.') {
        return Err(format!(
            "resource group name {:?} may not end with a period",
            s
        ));
    }

    let pattern = Regex::new(r"^[-\w._()]+$")
        .map_err(|e| format!("Failed to compile regex: {e}"))?;
    if !pattern.is_match(s) {
        return Err(format!(
            "resource group name {:?} may only contain alphanumeric characters, dash, underscores, parentheses and periods",
            s
        ));
    }
    Ok(())
}

/// Validate tag count and key/value lengths
pub fn validate_tags(tags: &HashMap<String, Value>) -> Result<(), String> {
    if tags.len() > MAX_TAGS {
        return Err(format!(
            "a maximum of {} tags can be applied to each ARM resource, got {}",
            MAX_TAGS,
            tags.len()
        ));
    }

    let mut keys: Vec<&String> = tags.keys().collect();
    keys.sort();
    for key in keys {
        if key.chars().count() > TAG_KEY_MAX_LENGTH {
            return Err(format!(
                "the maximum length for a tag key is {} characters: {:?}",
                TAG_KEY_MAX_LENGTH, key
            ));
        }
        if let Some(Value::String(value)) = tags.get(key)
            && value.chars().count() > TAG_VALUE_MAX_LENGTH
        {
            return Err(format!(
                "the maximum length for a tag value is {} characters: value for {:?}",
                TAG_VALUE_MAX_LENGTH, key
            ));
        }
    }
    Ok(())
}

pub fn request_message() -> AttributeType {
    AttributeType::Custom {
        name: "RequestMessage".to_string(),
        base: Box::new(AttributeType::String),
        validate: |value| match value {
            Value::String(s) => validate_request_message(s),
            _ => Err("Expected string".to_string()),
        },
    }
}

pub fn resource_group_name() -> AttributeType {
    AttributeType::Custom {
        name: "ResourceGroupName".to_string(),
        base: Box::new(AttributeType::String),
        validate: |value| match value {
            Value::String(s) => validate_resource_group_name(s),
            _ => Err("Expected string".to_string()),
        },
    }
}

pub fn tags() -> AttributeType {
    AttributeType::Custom {
        name: "Tags".to_string(),
        base: Box::new(types::string_map()),
        validate: |value| match value {
            Value::Map(map) => validate_tags(map),
            _ => Err("Expected map".to_string()),
        },
    }
}

/// Attributes of one `private_service_connection` block
pub fn private_service_connection() -> AttributeType {
    AttributeType::Block(vec![
        AttributeSchema::new("name", types::non_empty_string())
            .required()
            .with_description("Name of the connection."),
        AttributeSchema::new("is_manual_connection", AttributeType::Bool)
            .required()
            .with_description("Whether the connection requires manual approval by the service owner."),
        AttributeSchema::new("private_connection_resource_id", types::non_empty_string())
            .required()
            .with_description("ID of the private link service or resource to connect to."),
        AttributeSchema::new(
            "subresource_names",
            AttributeType::List(Box::new(types::non_empty_string())),
        )
        .with_description("Sub-resources (group IDs) of the target the endpoint connects to."),
        AttributeSchema::new("request_message", request_message())
            .with_description("Message passed to the owner of the remote resource. Only valid for manual connections."),
        AttributeSchema::new("provisioning_state", AttributeType::String).computed(),
        AttributeSchema::new("status", AttributeType::String).computed(),
        AttributeSchema::new("private_ip_address", AttributeType::String).computed(),
    ])
}

/// Returns the schema for private_link_endpoint
pub fn schema() -> ResourceSchema {
    ResourceSchema::new("azurerm.private_link_endpoint")
        .with_description("A private endpoint projecting a remote service into a subnet")
        .attribute(
            AttributeSchema::new("name", types::non_empty_string())
                .required()
                .force_new()
                .with_description("Name of the private endpoint."),
        )
        .attribute(
            AttributeSchema::new("location", types::non_empty_string())
                .required()
                .force_new()
                .with_description("Azure location (e.g. westeurope)."),
        )
        .attribute(
            AttributeSchema::new("resource_group_name", resource_group_name())
                .required()
                .force_new()
                .with_description("Resource group holding the endpoint."),
        )
        .attribute(
            AttributeSchema::new("subnet_id", types::non_empty_string())
                .required()
                .with_description("ID of the subnet the endpoint's interface is placed in."),
        )
        .attribute(
            AttributeSchema::new(
                "private_service_connection",
                AttributeType::List(Box::new(private_service_connection())),
            )
            .with_max_items(1),
        )
        .attribute(
            AttributeSchema::new(
                "network_interface_ids",
                AttributeType::List(Box::new(AttributeType::String)),
            )
            .computed()
            .with_description("Network interfaces attached to the endpoint."),
        )
        .attribute(AttributeSchema::new("tags", tags()))
}
