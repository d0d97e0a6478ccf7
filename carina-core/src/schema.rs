//! Schema - Define type schemas for resources
//!
//! Providers define schemas for each resource type. A schema says which
//! attributes a resource accepts, which ones are computed by the remote
//! service, which ones force replacement when changed, and how values are
//! validated before any remote call is made.

use std::collections::HashMap;
use std::fmt;

use crate::resource::Value;

/// Attribute type
#[derive(Debug, Clone)]
pub enum AttributeType {
    /// String
    String,
    /// Integer
    Int,
    /// Boolean
    Bool,
    /// Custom type (with validation function)
    Custom {
        name: String,
        base: Box<AttributeType>,
        validate: fn(&Value) -> Result<(), String>,
    },
    /// List
    List(Box<AttributeType>),
    /// Map
    Map(Box<AttributeType>),
    /// Nested block with its own attributes
    Block(Vec<AttributeSchema>),
}

impl AttributeType {
    /// Check if a value conforms to this type
    pub fn validate(&self, value: &Value) -> Result<(), TypeError> {
        match (self, value) {
            (AttributeType::String, Value::String(_)) => Ok(()),
            (AttributeType::Int, Value::Int(_)) => Ok(()),
            (AttributeType::Bool, Value::Bool(_)) => Ok(()),

            (AttributeType::Custom { validate, base, .. }, v) => {
                base.validate(v)?;
                validate(v).map_err(|msg| TypeError::ValidationFailed { message: msg })
            }

            (AttributeType::List(inner), Value::List(items)) => {
                for (i, item) in items.iter().enumerate() {
                    inner.validate(item).map_err(|e| TypeError::ListItemError {
                        index: i,
                        inner: Box::new(e),
                    })?;
                }
                Ok(())
            }

            (AttributeType::Map(inner), Value::Map(map)) => {
                for (k, v) in map {
                    inner.validate(v).map_err(|e| TypeError::MapValueError {
                        key: k.clone(),
                        inner: Box::new(e),
                    })?;
                }
                Ok(())
            }

            (AttributeType::Block(fields), Value::Map(map)) => {
                let errors = validate_attributes(fields.iter(), map);
                if errors.is_empty() {
                    Ok(())
                } else {
                    Err(TypeError::BlockErrors(errors))
                }
            }

            _ => Err(TypeError::TypeMismatch {
                expected: self.type_name(),
                got: value.type_name(),
            }),
        }
    }

    fn type_name(&self) -> String {
        match self {
            AttributeType::String => "String".to_string(),
            AttributeType::Int => "Int".to_string(),
            AttributeType::Bool => "Bool".to_string(),
            AttributeType::Custom { name, .. } => name.clone(),
            AttributeType::List(inner) => format!("List<{}>", inner.type_name()),
            AttributeType::Map(inner) => format!("Map<{}>", inner.type_name()),
            AttributeType::Block(_) => "Block".to_string(),
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// Type error
#[derive(Debug, Clone, thiserror::Error)]
pub enum TypeError {
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Required attribute '{name}' is missing")]
    MissingRequired { name: String },

    #[error("Attribute '{name}' is computed and cannot be set")]
    ComputedAttribute { name: String },

    #[error("Attribute '{name}' accepts at most {max} item(s), got {got}")]
    TooManyItems { name: String, max: usize, got: usize },

    #[error("Attribute '{name}': {inner}")]
    AttributeError { name: String, inner: Box<TypeError> },

    #[error("List item at index {index}: {inner}")]
    ListItemError { index: usize, inner: Box<TypeError> },

    #[error("Map value for key '{key}': {inner}")]
    MapValueError { key: String, inner: Box<TypeError> },

    /// Every violation found inside a nested block
    #[error("{}", join_errors(.0))]
    BlockErrors(Vec<TypeError>),
}

fn join_errors(errors: &[TypeError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl Value {
    fn type_name(&self) -> String {
        match self {
            Value::String(_) => "String".to_string(),
            Value::Int(_) => "Int".to_string(),
            Value::Bool(_) => "Bool".to_string(),
            Value::List(_) => "List".to_string(),
            Value::Map(_) => "Map".to_string(),
        }
    }
}

/// Attribute schema
#[derive(Debug, Clone)]
pub struct AttributeSchema {
    pub name: String,
    pub attr_type: AttributeType,
    pub required: bool,
    /// Set by the remote service only; supplying it in configuration is an error
    pub computed: bool,
    /// Changing this attribute requires destroying and recreating the resource
    pub force_new: bool,
    /// Upper bound on the number of items of a list attribute
    pub max_items: Option<usize>,
    pub description: Option<String>,
}

impl AttributeSchema {
    pub fn new(name: impl Into<String>, attr_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            attr_type,
            required: false,
            computed: false,
            force_new: false,
            max_items: None,
            description: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn with_max_items(mut self, max: usize) -> Self {
        self.max_items = Some(max);
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    fn check(&self, value: &Value) -> Result<(), TypeError> {
        if self.computed {
            return Err(TypeError::ComputedAttribute {
                name: self.name.clone(),
            });
        }

        if let (Some(max), Value::List(items)) = (self.max_items, value)
            && items.len() > max
        {
            return Err(TypeError::TooManyItems {
                name: self.name.clone(),
                max,
                got: items.len(),
            });
        }

        self.attr_type
            .validate(value)
            .map_err(|e| TypeError::AttributeError {
                name: self.name.clone(),
                inner: Box::new(e),
            })
    }
}

/// Validate a set of attribute values against attribute schemas, collecting every error
fn validate_attributes<'a>(
    schemas: impl Iterator<Item = &'a AttributeSchema>,
    attributes: &HashMap<String, Value>,
) -> Vec<TypeError> {
    let mut errors = Vec::new();

    for schema in schemas {
        match attributes.get(&schema.name) {
            Some(value) => {
                if let Err(e) = schema.check(value) {
                    errors.push(e);
                }
            }
            None if schema.required => errors.push(TypeError::MissingRequired {
                name: schema.name.clone(),
            }),
            None => {}
        }
    }

    // Unknown attributes are allowed (for flexibility)
    errors
}

/// Resource schema
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    pub resource_type: String,
    pub attributes: HashMap<String, AttributeSchema>,
    pub description: Option<String>,
}

impl ResourceSchema {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            attributes: HashMap::new(),
            description: None,
        }
    }

    pub fn attribute(mut self, schema: AttributeSchema) -> Self {
        self.attributes.insert(schema.name.clone(), schema);
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Validate resource attributes
    pub fn validate(&self, attributes: &HashMap<String, Value>) -> Result<(), Vec<TypeError>> {
        let mut schemas: Vec<&AttributeSchema> = self.attributes.values().collect();
        schemas.sort_by(|a, b| a.name.cmp(&b.name));

        let errors = validate_attributes(schemas.into_iter(), attributes);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Force-new attributes whose desired value differs from the current one
    pub fn replacement_attributes(
        &self,
        current: &HashMap<String, Value>,
        desired: &HashMap<String, Value>,
    ) -> Vec<String> {
        let mut changed: Vec<String> = self
            .attributes
            .values()
            .filter(|schema| schema.force_new)
            .filter(|schema| {
                matches!(
                    (current.get(&schema.name), desired.get(&schema.name)),
                    (Some(from), Some(to)) if from != to
                )
            })
            .map(|schema| schema.name.clone())
            .collect();
        changed.sort();
        changed
    }
}

/// Helper functions for common types
pub mod types {
    use super::*;

    /// String that must contain something other than whitespace
    pub fn non_empty_string() -> AttributeType {
        AttributeType::Custom {
            name: "NonEmptyString".to_string(),
            base: Box::new(AttributeType::String),
            validate: |value| match value {
                Value::String(s) => validate_no_empty_string(s),
                _ => Err("Expected string".to_string()),
            },
        }
    }

    /// Map of string values
    pub fn string_map() -> AttributeType {
        AttributeType::Map(Box::new(AttributeType::String))
    }
}

/// Reject empty or whitespace-only strings
pub fn validate_no_empty_string(s: &str) -> Result<(), String> {
    if s.trim().is_empty() {
        Err("value must not be empty or consist only of whitespace".to_string())
    } else {
        Ok(())
    }
}
