//! Create/update, read and delete of a private link endpoint against ARM

use log::{debug, info};

use super::config::{PrivateEndpointConfig, PrivateEndpointState};
use super::error::{EndpointError, Operation};
use super::expand::expand_private_endpoint;
use super::flatten::flatten_private_endpoint;
use super::validation::validate_settings;
use crate::client::NetworkClient;
use crate::context::StopContext;
use crate::resource_id::AzureResourceId;

/// Whether an apply creates a new endpoint or updates a tracked one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyMode {
    /// `requires_import`: fail when an endpoint with the same name already exists
    Create { requires_import: bool },
    Update,
}

/// Resource group and name of a private endpoint ID
pub fn parse_endpoint_id(id: &str) -> Result<(String, String), EndpointError> {
    let parsed = AzureResourceId::parse(id).map_err(|e| EndpointError::InvalidId {
        id: id.to_string(),
        reason: e.to_string(),
    })?;
    let name = parsed
        .get("privateEndpoints")
        .ok_or_else(|| EndpointError::InvalidId {
            id: id.to_string(),
            reason: "missing \"privateEndpoints\" segment".to_string(),
        })?
        .to_string();
    Ok((parsed.resource_group, name))
}

pub async fn create_or_update(
    client: &dyn NetworkClient,
    ctx: &StopContext,
    config: &PrivateEndpointConfig,
    mode: ApplyMode,
) -> Result<PrivateEndpointState, EndpointError> {
    validate_settings(config)?;

    let name = config.name.as_str();
    let resource_group = config.resource_group_name.as_str();
    let request_error = |operation, source| EndpointError::Request {
        operation,
        name: name.to_string(),
        resource_group: resource_group.to_string(),
        source,
    };

    if let ApplyMode::Create {
        requires_import: true,
    } = mode
    {
        debug!(
            "Checking for existing Private Link Endpoint {:?} (Resource Group {:?})",
            name, resource_group
        );
        match client.get_private_endpoint(ctx, resource_group, name).await {
            Ok(existing) => {
                return Err(EndpointError::AlreadyExists {
                    id: existing.id.unwrap_or_else(|| name.to_string()),
                });
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(request_error(Operation::CheckExisting, e)),
        }
    }

    let parameters = expand_private_endpoint(config);

    info!(
        "Creating/updating Private Link Endpoint {:?} (Resource Group {:?})",
        name, resource_group
    );
    let operation = client
        .begin_create_or_update_private_endpoint(ctx, resource_group, name, &parameters)
        .await
        .map_err(|e| request_error(Operation::CreateOrUpdate, e))?;

    debug!("Waiting for Private Link Endpoint {:?}: {:?}", name, operation);
    client
        .wait_for_completion(ctx, &operation)
        .await
        .map_err(|source| EndpointError::Wait {
            operation: Operation::CreateOrUpdate,
            name: name.to_string(),
            resource_group: resource_group.to_string(),
            source,
        })?;

    let endpoint = client
        .get_private_endpoint(ctx, resource_group, name)
        .await
        .map_err(|e| request_error(Operation::Read, e))?;
    let id = match endpoint.id {
        Some(id) if !id.is_empty() => id,
        _ => {
            return Err(EndpointError::EmptyId {
                name: name.to_string(),
                resource_group: resource_group.to_string(),
            });
        }
    };

    read(client, ctx, &id)
        .await?
        .ok_or_else(|| EndpointError::NotFoundAfterApply {
            name: name.to_string(),
            resource_group: resource_group.to_string(),
        })
}

/// Current state of the endpoint, or `None` when it no longer exists
pub async fn read(
    client: &dyn NetworkClient,
    ctx: &StopContext,
    id: &str,
) -> Result<Option<PrivateEndpointState>, EndpointError> {
    let (resource_group, name) = parse_endpoint_id(id)?;

    let endpoint = match client.get_private_endpoint(ctx, &resource_group, &name).await {
        Ok(endpoint) => endpoint,
        Err(e) if e.is_not_found() => {
            info!("Private Link Endpoint {:?} does not exist - removing from state", id);
            return Ok(None);
        }
        Err(source) => {
            return Err(EndpointError::Request {
                operation: Operation::Read,
                name: name.clone(),
                resource_group: resource_group.clone(),
                source,
            });
        }
    };

    let first_interface = endpoint
        .properties
        .as_ref()
        .and_then(|p| p.network_interfaces.as_ref())
        .and_then(|nics| nics.first())
        .and_then(|nic| nic.id.clone());

    let private_ip = match first_interface {
        Some(nic_id) => resolve_private_ip(client, ctx, &resource_group, &nic_id).await?,
        None => None,
    };

    Ok(Some(flatten_private_endpoint(
        id,
        &resource_group,
        &name,
        &endpoint,
        private_ip.as_deref(),
    )))
}

/// Private address of the first IP configuration of an interface
///
/// The interface is looked up in the endpoint's resource group.
async fn resolve_private_ip(
    client: &dyn NetworkClient,
    ctx: &StopContext,
    resource_group: &str,
    nic_id: &str,
) -> Result<Option<String>, EndpointError> {
    let parsed = AzureResourceId::parse(nic_id).map_err(|e| EndpointError::InvalidId {
        id: nic_id.to_string(),
        reason: e.to_string(),
    })?;
    let nic_name = parsed
        .get("networkInterfaces")
        .ok_or_else(|| EndpointError::InvalidId {
            id: nic_id.to_string(),
            reason: "missing \"networkInterfaces\" segment".to_string(),
        })?;

    let nic = client
        .get_network_interface(ctx, resource_group, nic_name)
        .await
        .map_err(|source| {
            if source.is_not_found() {
                EndpointError::InterfaceNotFound {
                    name: nic_name.to_string(),
                    resource_group: resource_group.to_string(),
                }
            } else {
                EndpointError::Interface {
                    name: nic_name.to_string(),
                    resource_group: resource_group.to_string(),
                    source,
                }
            }
        })?;

    Ok(nic.first_private_ip_address().map(str::to_string))
}

/// Delete the endpoint; an endpoint that is already gone counts as deleted
pub async fn delete(
    client: &dyn NetworkClient,
    ctx: &StopContext,
    id: &str,
) -> Result<(), EndpointError> {
    let (resource_group, name) = parse_endpoint_id(id)?;

    info!(
        "Deleting Private Link Endpoint {:?} (Resource Group {:?})",
        name, resource_group
    );
    let operation = match client
        .begin_delete_private_endpoint(ctx, &resource_group, &name)
        .await
    {
        Ok(operation) => operation,
        Err(e) if e.is_not_found() => {
            info!("Private Link Endpoint {:?} was already deleted", id);
            return Ok(());
        }
        Err(source) => {
            return Err(EndpointError::Request {
                operation: Operation::Delete,
                name: name.clone(),
                resource_group: resource_group.clone(),
                source,
            });
        }
    };

    match client.wait_for_completion(ctx, &operation).await {
        Ok(()) => Ok(()),
        Err(e) if e.is_not_found() => {
            debug!("Private Link Endpoint {:?} disappeared while deleting", id);
            Ok(())
        }
        Err(source) => Err(EndpointError::Wait {
            operation: Operation::Delete,
            name,
            resource_group,
            source,
        }),
    }
}
