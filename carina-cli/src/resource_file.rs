//! JSON resource files and state output

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use carina_core::resource::{Resource, State, Value};
use carina_provider_azurerm::resources::find_resource_type;
use serde::Deserialize;
use serde_json::json;

/// `{"type": "private_link_endpoint", "name": "...", "attributes": {...}}`
#[derive(Debug, Deserialize)]
pub struct ResourceFile {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
    #[serde(default)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl ResourceFile {
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, String> {
        serde_json::from_str(content).map_err(|e| format!("Parse error: {}", e))
    }

    pub fn into_resource(self) -> Result<Resource, String> {
        let mut resource = Resource::new(self.resource_type, self.name);
        for (key, value) in self.attributes {
            let value = json_to_value(&value)
                .ok_or_else(|| format!("Unsupported value for attribute {:?}", key))?;
            resource.attributes.insert(key, value);
        }
        Ok(resource)
    }
}

/// Validate a resource against the schema of its type
pub fn validate_resource(resource: &Resource) -> Result<(), String> {
    let resource_type = find_resource_type(&resource.id.resource_type)
        .ok_or_else(|| format!("Unknown resource type: {}", resource.id.resource_type))?;

    if let Err(errors) = resource_type.schema().validate(&resource.attributes) {
        let messages: Vec<String> = errors
            .iter()
            .map(|e| format!("{}.{}: {}", resource.id.resource_type, resource.id.name, e))
            .collect();
        return Err(format!("Validation failed:\n  {}", messages.join("\n  ")));
    }
    Ok(())
}

/// Convert JSON value to attribute Value
fn json_to_value(value: &serde_json::Value) -> Option<Value> {
    match value {
        serde_json::Value::String(s) => Some(Value::String(s.clone())),
        serde_json::Value::Bool(b) => Some(Value::Bool(*b)),
        serde_json::Value::Number(n) => n.as_i64().map(Value::Int),
        serde_json::Value::Array(arr) => arr
            .iter()
            .map(json_to_value)
            .collect::<Option<Vec<_>>>()
            .map(Value::List),
        serde_json::Value::Object(map) => map
            .iter()
            .map(|(k, v)| json_to_value(v).map(|v| (k.clone(), v)))
            .collect::<Option<HashMap<_, _>>>()
            .map(Value::Map),
        serde_json::Value::Null => None,
    }
}

/// Convert attribute Value to JSON value
fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::String(s) => json!(s),
        Value::Int(i) => json!(i),
        Value::Bool(b) => json!(b),
        Value::List(items) => serde_json::Value::Array(items.iter().map(value_to_json).collect()),
        Value::Map(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let object = keys
                .into_iter()
                .map(|k| (k.clone(), value_to_json(&map[k])))
                .collect();
            serde_json::Value::Object(object)
        }
    }
}

pub fn state_to_json(state: &State) -> serde_json::Value {
    json!({
        "type": state.id.resource_type,
        "name": state.id.name,
        "identifier": state.identifier,
        "attributes": value_to_json(&Value::Map(state.attributes.clone())),
    })
}
