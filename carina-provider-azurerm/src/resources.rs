//! Resource type definitions for the Azure Resource Manager provider

use carina_core::provider::ResourceType;
use carina_core::schema::ResourceSchema;

use crate::schemas;

macro_rules! define_resource_type {
    ($name:ident, $type_name:expr, $schema:path) => {
        pub struct $name;
        impl ResourceType for $name {
            fn name(&self) -> &'static str {
                $type_name
            }
            fn schema(&self) -> ResourceSchema {
                $schema()
            }
        }
    };
}

define_resource_type!(
    PrivateLinkEndpointType,
    "private_link_endpoint",
    schemas::private_link_endpoint::schema
);

/// Returns all resource types supported by this provider
pub fn resource_types() -> Vec<Box<dyn ResourceType>> {
    vec![Box::new(PrivateLinkEndpointType)]
}

/// Find a resource type by name
pub fn find_resource_type(name: &str) -> Option<Box<dyn ResourceType>> {
    resource_types().into_iter().find(|t| t.name() == name)
}
