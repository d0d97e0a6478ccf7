//! Azure resource schema definitions

pub mod private_link_endpoint;

use carina_core::schema::ResourceSchema;

/// Returns all Azure schemas
pub fn all_schemas() -> Vec<ResourceSchema> {
    vec![private_link_endpoint::schema()]
}
