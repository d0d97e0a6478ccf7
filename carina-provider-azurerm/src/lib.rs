//! Carina Azure Resource Manager Provider
//!
//! Azure Resource Manager Provider implementation.
//!
//! ## Module Structure
//!
//! - `client` - ARM network client and long-running-operation poller
//! - `config` - Provider configuration from the environment
//! - `context` - Cancellation and deadlines for remote calls
//! - `private_link_endpoint` - Private link endpoint resource binding
//! - `provider` - AzurermProvider implementation
//! - `resource_id` - ARM resource ID parsing
//! - `resources` - Resource type definitions
//! - `schemas` - Resource schemas
//! - `utils` - Helper functions for value normalization

pub mod client;
pub mod config;
pub mod context;
pub mod private_link_endpoint;
pub mod provider;
pub mod resource_id;
pub mod resources;
pub mod schemas;
pub mod utils;

// Re-export main types
pub use config::{ConfigError, ProviderConfig};
pub use context::{StopContext, StopHandle};
pub use provider::AzurermProvider;
pub use utils::normalize_location;

use carina_core::provider::{BoxFuture, Provider, ProviderResult};
use carina_core::resource::{Resource, ResourceId, State};

use resources::resource_types;

// =============================================================================
// Provider Trait Implementation
// =============================================================================

impl Provider for AzurermProvider {
    fn name(&self) -> &'static str {
        "azurerm"
    }

    fn resource_types(&self) -> Vec<Box<dyn carina_core::provider::ResourceType>> {
        resource_types()
    }

    fn read(
        &self,
        id: &ResourceId,
        identifier: Option<&str>,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.map(|s| s.to_string());
        Box::pin(async move { self.read_resource(&id, identifier.as_deref()).await })
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone();
        Box::pin(async move { self.create_resource(resource).await })
    }

    fn update(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        let from = from.clone();
        let to = to.clone();
        Box::pin(async move { self.update_resource(id, &identifier, &from, to).await })
    }

    fn delete(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<()>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        Box::pin(async move { self.delete_resource(&id, &identifier).await })
    }
}
