//! Azure Resource Manager Provider implementation
//!
//! This module contains the main provider implementation that validates
//! resources against their schemas and drives the resource bindings.

use std::collections::HashMap;
use std::sync::Arc;

use azure_core::credentials::{Secret, TokenCredential};
use azure_identity::{ClientSecretCredential, ManagedIdentityCredential};
use carina_core::provider::{ProviderError, ProviderResult, ResourceType};
use carina_core::resource::{Resource, ResourceId, State, Value};
use log::info;

use crate::client::{ArmNetworkClient, NetworkClient};
use crate::config::{Authentication, ProviderConfig};
use crate::context::StopContext;
use crate::private_link_endpoint::{
    ApplyMode, PrivateEndpointConfig, PrivateEndpointState, reconcile,
};
use crate::resources::find_resource_type;
use crate::utils::normalize_location;

/// Azure Resource Manager Provider
pub struct AzurermProvider {
    client: Arc<dyn NetworkClient>,
    config: ProviderConfig,
    stop: StopContext,
}

fn credential(config: &ProviderConfig) -> ProviderResult<Arc<dyn TokenCredential>> {
    match &config.authentication {
        Authentication::ServicePrincipal {
            tenant_id,
            client_id,
            client_secret,
        } => {
            let credential: Arc<dyn TokenCredential> = ClientSecretCredential::new(
                tenant_id,
                client_id.clone(),
                Secret::new(client_secret.clone()),
                None,
            )
            .map_err(|e| {
                ProviderError::new(format!("Failed to create ClientSecretCredential: {}", e))
            })?;
            Ok(credential)
        }
        Authentication::ManagedIdentity => {
            let credential: Arc<dyn TokenCredential> = ManagedIdentityCredential::new(None)
                .map_err(|e| {
                    ProviderError::new(format!("Failed to create ManagedIdentityCredential: {}", e))
                })?;
            Ok(credential)
        }
    }
}

impl AzurermProvider {
    /// Create a provider talking to ARM with credentials from `config`
    pub fn new(config: ProviderConfig) -> ProviderResult<Self> {
        let client = ArmNetworkClient::new(
            config.resource_manager_endpoint.clone(),
            config.subscription_id.clone(),
            credential(&config)?,
            config.poll_interval,
        );
        Ok(Self::with_client(config, Arc::new(client)))
    }

    /// Create a provider on top of an existing network client
    pub fn with_client(config: ProviderConfig, client: Arc<dyn NetworkClient>) -> Self {
        Self {
            client,
            config,
            stop: StopContext::background(),
        }
    }

    /// Run every operation under `stop`, in addition to the operation timeout
    pub fn with_stop_context(mut self, stop: StopContext) -> Self {
        self.stop = stop;
        self
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn stop_context(&self) -> StopContext {
        self.stop.clone().deadline_in(self.config.operation_timeout)
    }

    fn resource_type(&self, id: &ResourceId) -> ProviderResult<Box<dyn ResourceType>> {
        find_resource_type(&id.resource_type).ok_or_else(|| {
            ProviderError::new(format!("Unknown resource type: {}", id.resource_type))
                .for_resource(id.clone())
        })
    }

    /// Check attributes against the schema and parse them into a typed configuration
    fn parse_config(&self, resource: &Resource) -> ProviderResult<PrivateEndpointConfig> {
        let schema = self.resource_type(&resource.id)?.schema();
        if let Err(errors) = schema.validate(&resource.attributes) {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            return Err(
                ProviderError::validation(messages.join("; ")).for_resource(resource.id.clone())
            );
        }

        PrivateEndpointConfig::from_attributes(&resource.attributes)
            .map_err(|e| ProviderError::from(e).for_resource(resource.id.clone()))
    }

    fn to_state(id: ResourceId, state: PrivateEndpointState) -> State {
        let identifier = state.id.clone();
        State::existing(id, state.to_attributes()).with_identifier(identifier)
    }

    // =========================================================================
    // Resource Operations
    // =========================================================================

    /// Read a resource by its ARM ID
    pub async fn read_resource(
        &self,
        id: &ResourceId,
        identifier: Option<&str>,
    ) -> ProviderResult<State> {
        self.resource_type(id)?;

        let identifier = match identifier {
            Some(identifier) => identifier,
            None => return Ok(State::not_found(id.clone())),
        };

        let ctx = self.stop_context();
        match reconcile::read(self.client.as_ref(), &ctx, identifier)
            .await
            .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?
        {
            Some(state) => Ok(Self::to_state(id.clone(), state)),
            None => Ok(State::not_found(id.clone())),
        }
    }

    /// Create a resource
    pub async fn create_resource(&self, resource: Resource) -> ProviderResult<State> {
        let config = self.parse_config(&resource)?;

        let ctx = self.stop_context();
        let mode = ApplyMode::Create {
            requires_import: self.config.import_protection,
        };
        let state = reconcile::create_or_update(self.client.as_ref(), &ctx, &config, mode)
            .await
            .map_err(|e| ProviderError::from(e).for_resource(resource.id.clone()))?;

        info!("Created {} as {}", resource.id.name, state.id);
        Ok(Self::to_state(resource.id, state))
    }

    /// Update a resource in place
    ///
    /// Changes to force-new attributes are refused; they need delete and recreate.
    pub async fn update_resource(
        &self,
        id: ResourceId,
        identifier: &str,
        from: &State,
        to: Resource,
    ) -> ProviderResult<State> {
        let config = self.parse_config(&to)?;

        let schema = self.resource_type(&id)?.schema();
        let replaced = schema.replacement_attributes(
            &comparable(&from.attributes),
            &comparable(&to.attributes),
        );
        if !replaced.is_empty() {
            return Err(ProviderError::validation(format!(
                "Update not supported for {}, delete and recreate (changed: {})",
                identifier,
                replaced.join(", ")
            ))
            .for_resource(id));
        }

        let (resource_group, name) = reconcile::parse_endpoint_id(identifier)
            .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;
        if !resource_group.eq_ignore_ascii_case(&config.resource_group_name)
            || name != config.name
        {
            return Err(ProviderError::validation(format!(
                "Identifier {:?} does not match name {:?} in resource group {:?}",
                identifier, config.name, config.resource_group_name
            ))
            .for_resource(id));
        }

        let ctx = self.stop_context();
        let state =
            reconcile::create_or_update(self.client.as_ref(), &ctx, &config, ApplyMode::Update)
                .await
                .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;

        Ok(Self::to_state(id, state))
    }

    /// Delete a resource
    pub async fn delete_resource(&self, id: &ResourceId, identifier: &str) -> ProviderResult<()> {
        self.resource_type(id)?;

        let ctx = self.stop_context();
        reconcile::delete(self.client.as_ref(), &ctx, identifier)
            .await
            .map_err(|e| ProviderError::from(e).for_resource(id.clone()))
    }
}

/// Attributes with location normalized and the resource group lower-cased
///
/// "West Europe" equals "westeurope"; resource group names are case-insensitive in ARM.
fn comparable(attributes: &HashMap<String, Value>) -> HashMap<String, Value> {
    let mut attributes = attributes.clone();
    if let Some(Value::String(location)) = attributes.get("location") {
        let normalized = normalize_location(location);
        attributes.insert("location".to_string(), Value::String(normalized));
    }
    if let Some(Value::String(resource_group)) = attributes.get("resource_group_name") {
        let lowered = resource_group.to_lowercase();
        attributes.insert("resource_group_name".to_string(), Value::String(lowered));
    }
    attributes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::{MockNetworkClient, endpoint_id};
    use crate::client::models::PrivateEndpoint;
    use carina_core::provider::{Provider, ProviderErrorKind};

    fn provider(import_protection: bool) -> (AzurermProvider, Arc<MockNetworkClient>) {
        let client = Arc::new(MockNetworkClient::new());
        let mut config = ProviderConfig::new("sub1");
        config.import_protection = import_protection;
        (
            AzurermProvider::with_client(config, client.clone()),
            client,
        )
    }

    fn connection() -> Value {
        let mut map = HashMap::new();
        map.insert("name".to_string(), Value::from("conn1"));
        map.insert("is_manual_connection".to_string(), Value::Bool(false));
        map.insert(
            "private_connection_resource_id".to_string(),
            Value::from("/services/svc1"),
        );
        map.insert("subresource_names".to_string(), Value::string_list(["blob"]));
        Value::Map(map)
    }

    fn resource() -> Resource {
        Resource::new("private_link_endpoint", "endpoint")
            .with_attribute("name", Value::from("ep1"))
            .with_attribute("location", Value::from("West Europe"))
            .with_attribute("resource_group_name", Value::from("rg1"))
            .with_attribute("subnet_id", Value::from("/subnets/s1"))
            .with_attribute(
                "private_service_connection",
                Value::List(vec![connection()]),
            )
    }

    #[tokio::test]
    async fn create_then_read() {
        let (provider, _client) = provider(false);

        let created = provider.create(&resource()).await.unwrap();
        assert!(created.exists);
        let identifier = created.identifier.clone().unwrap();
        assert_eq!(identifier, endpoint_id("rg1", "ep1"));
        assert_eq!(
            created.attributes.get("location"),
            Some(&Value::from("westeurope"))
        );

        let read = provider
            .read(&created.id, Some(&identifier))
            .await
            .unwrap();
        assert_eq!(read, created);
    }

    #[tokio::test]
    async fn schema_errors_are_validation_errors() {
        let (provider, client) = provider(false);
        let mut resource = resource();
        resource.attributes.remove("subnet_id");
        resource
            .attributes
            .insert("network_interface_ids".to_string(), Value::string_list(["/nic"]));

        let err = provider.create(&resource).await.unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::Validation);
        assert!(err.message.contains("subnet_id"));
        assert!(err.message.contains("network_interface_ids"));
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn unknown_resource_type_is_rejected() {
        let (provider, _client) = provider(false);
        let resource = Resource::new("vpc", "main");
        let err = provider.create(&resource).await.unwrap_err();
        assert!(err.message.contains("Unknown resource type"));
    }

    #[tokio::test]
    async fn read_without_identifier_is_not_found() {
        let (provider, client) = provider(false);
        let id = ResourceId::new("private_link_endpoint", "endpoint");
        let state = provider.read(&id, None).await.unwrap();
        assert!(!state.exists);
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn read_of_deleted_endpoint_clears_identity() {
        let (provider, _client) = provider(false);
        let id = ResourceId::new("private_link_endpoint", "endpoint");
        let state = provider
            .read(&id, Some(&endpoint_id("rg1", "gone")))
            .await
            .unwrap();
        assert!(!state.exists);
        assert_eq!(state.identifier, None);
    }

    #[tokio::test]
    async fn strict_mode_reports_already_exists() {
        let (provider, client) = provider(true);
        client.insert_endpoint(
            "rg1",
            "ep1",
            PrivateEndpoint {
                id: Some(endpoint_id("rg1", "ep1")),
                ..Default::default()
            },
        );

        let err = provider.create(&resource()).await.unwrap_err();
        assert!(err.is_already_exists());
        assert!(err.message.contains("needs to be imported"));
        assert_eq!(
            err.resource_id,
            Some(ResourceId::new("private_link_endpoint", "endpoint"))
        );
    }

    #[tokio::test]
    async fn update_changes_subnet_in_place() {
        let (provider, _client) = provider(false);
        let created = provider.create(&resource()).await.unwrap();
        let identifier = created.identifier.clone().unwrap();

        let desired = resource().with_attribute("subnet_id", Value::from("/subnets/s2"));
        let updated = provider
            .update(&created.id, &identifier, &created, &desired)
            .await
            .unwrap();
        assert_eq!(
            updated.attributes.get("subnet_id"),
            Some(&Value::from("/subnets/s2"))
        );
    }

    #[tokio::test]
    async fn update_refuses_force_new_change() {
        let (provider, client) = provider(false);
        let created = provider.create(&resource()).await.unwrap();
        let identifier = created.identifier.clone().unwrap();
        let calls_before = client.calls().len();

        let desired = resource().with_attribute("location", Value::from("East US"));
        let err = provider
            .update(&created.id, &identifier, &created, &desired)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::Validation);
        assert!(err.message.contains("location"));
        assert_eq!(client.calls().len(), calls_before);
    }

    #[tokio::test]
    async fn update_ignores_resource_group_case() {
        let (provider, _client) = provider(false);
        let existing = resource().with_attribute("resource_group_name", Value::from("RG1"));
        let created = provider.create(&existing).await.unwrap();
        let identifier = created.identifier.clone().unwrap();
        assert_eq!(identifier, endpoint_id("RG1", "ep1"));

        let desired = resource().with_attribute("subnet_id", Value::from("/subnets/s2"));
        let updated = provider
            .update(&created.id, &identifier, &created, &desired)
            .await
            .unwrap();
        assert_eq!(
            updated.attributes.get("subnet_id"),
            Some(&Value::from("/subnets/s2"))
        );
    }

    #[tokio::test]
    async fn update_refuses_identifier_of_other_endpoint() {
        let (provider, client) = provider(false);
        let created = provider.create(&resource()).await.unwrap();
        let calls_before = client.calls().len();

        let err = provider
            .update(&created.id, &endpoint_id("rg1", "ep2"), &created, &resource())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::Validation);
        assert!(err.message.contains("does not match"));
        assert_eq!(client.calls().len(), calls_before);
    }

    #[tokio::test]
    async fn stopped_provider_cancels_operations() {
        let (provider, client) = provider(false);
        let (stop, handle) = StopContext::cancellable();
        let provider = provider.with_stop_context(stop);
        handle.stop();

        let err = provider.create(&resource()).await.unwrap_err();
        assert!(err.message.contains("cancelled"));
        assert!(client.endpoint("rg1", "ep1").is_none());
    }

    #[tokio::test]
    async fn import_existing_and_missing() {
        let (provider, _client) = provider(false);
        let created = provider.create(&resource()).await.unwrap();
        let identifier = created.identifier.clone().unwrap();

        let imported = provider.import(&created.id, &identifier).await.unwrap();
        assert_eq!(imported.identifier, Some(identifier));

        let err = provider
            .import(&created.id, &endpoint_id("rg1", "missing"))
            .await
            .unwrap_err();
        assert!(err.message.contains("non-existent"));
    }

    #[tokio::test]
    async fn delete_twice_succeeds() {
        let (provider, client) = provider(false);
        let created = provider.create(&resource()).await.unwrap();
        let identifier = created.identifier.clone().unwrap();

        provider.delete(&created.id, &identifier).await.unwrap();
        provider.delete(&created.id, &identifier).await.unwrap();
        assert!(client.endpoint("rg1", "ep1").is_none());
    }
}
