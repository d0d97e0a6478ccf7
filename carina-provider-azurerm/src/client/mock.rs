//! In-memory `NetworkClient` for tests

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::models::{
    InterfaceIpConfiguration, InterfaceIpConfigurationProperties, NetworkInterface,
    NetworkInterfaceProperties, PrivateEndpoint, PrivateLinkServiceConnection,
    PrivateLinkServiceConnectionState,
};
use super::{ClientError, ClientResult, LongRunningOperation, NetworkClient, PollTarget};
use crate::context::StopContext;

pub(crate) const SUBSCRIPTION: &str = "00000000-0000-0000-0000-000000000000";

/// Failure injected into a scripted call
#[derive(Debug, Clone)]
pub(crate) enum Failure {
    Api(u16, &'static str),
    NotFound,
    OperationFailed(&'static str),
}

impl Failure {
    fn to_error(&self) -> ClientError {
        match self {
            Failure::Api(status, message) => ClientError::Api {
                status: *status,
                code: Some("MockError".to_string()),
                message: message.to_string(),
            },
            Failure::NotFound => ClientError::not_found("mock resource not found"),
            Failure::OperationFailed(message) => ClientError::OperationFailed {
                status: "Failed".to_string(),
                code: Some("MockFailure".to_string()),
                message: Some(message.to_string()),
            },
        }
    }
}

#[derive(Default)]
struct MockState {
    endpoints: HashMap<(String, String), PrivateEndpoint>,
    interfaces: HashMap<(String, String), NetworkInterface>,
    calls: Vec<String>,
    fail_get: Option<Failure>,
    fail_begin: Option<Failure>,
    fail_wait: Option<Failure>,
    fail_interface: Option<Failure>,
    /// Attach a network interface to endpoints created from now on
    attach_interface: bool,
    /// Assign an empty ID to endpoints created from now on
    empty_id: bool,
}

pub(crate) struct MockNetworkClient {
    state: Mutex<MockState>,
}

pub(crate) fn endpoint_id(resource_group: &str, name: &str) -> String {
    format!(
        "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Network/privateEndpoints/{}",
        SUBSCRIPTION, resource_group, name
    )
}

pub(crate) fn interface_id(resource_group: &str, name: &str) -> String {
    format!(
        "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Network/networkInterfaces/{}",
        SUBSCRIPTION, resource_group, name
    )
}

pub(crate) fn interface_with_ips(id: &str, addresses: &[&str]) -> NetworkInterface {
    NetworkInterface {
        id: Some(id.to_string()),
        properties: Some(NetworkInterfaceProperties {
            ip_configurations: Some(
                addresses
                    .iter()
                    .map(|ip| InterfaceIpConfiguration {
                        properties: Some(InterfaceIpConfigurationProperties {
                            private_ip_address: Some(ip.to_string()),
                            ..Default::default()
                        }),
                        ..Default::default()
                    })
                    .collect(),
            ),
            ..Default::default()
        }),
        ..Default::default()
    }
}

impl MockNetworkClient {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                attach_interface: true,
                ..Default::default()
            }),
        }
    }

    /// Seed a remote endpoint as if created outside this provider
    pub fn insert_endpoint(&self, resource_group: &str, name: &str, endpoint: PrivateEndpoint) {
        let mut state = self.state.lock().unwrap();
        state
            .endpoints
            .insert((resource_group.to_string(), name.to_string()), endpoint);
    }

    pub fn insert_interface(&self, resource_group: &str, name: &str, interface: NetworkInterface) {
        let mut state = self.state.lock().unwrap();
        state
            .interfaces
            .insert((resource_group.to_string(), name.to_string()), interface);
    }

    pub fn remove_interface(&self, resource_group: &str, name: &str) {
        let mut state = self.state.lock().unwrap();
        state
            .interfaces
            .remove(&(resource_group.to_string(), name.to_string()));
    }

    pub fn endpoint(&self, resource_group: &str, name: &str) -> Option<PrivateEndpoint> {
        let state = self.state.lock().unwrap();
        state
            .endpoints
            .get(&(resource_group.to_string(), name.to_string()))
            .cloned()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count_calls(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    pub fn fail_get(&self, failure: Failure) {
        self.state.lock().unwrap().fail_get = Some(failure);
    }

    pub fn fail_begin(&self, failure: Failure) {
        self.state.lock().unwrap().fail_begin = Some(failure);
    }

    pub fn fail_wait(&self, failure: Failure) {
        self.state.lock().unwrap().fail_wait = Some(failure);
    }

    pub fn fail_interface(&self, failure: Failure) {
        self.state.lock().unwrap().fail_interface = Some(failure);
    }

    pub fn without_interfaces(&self) {
        self.state.lock().unwrap().attach_interface = false;
    }

    pub fn assign_empty_ids(&self) {
        self.state.lock().unwrap().empty_id = true;
    }
}

/// Fill in the fields the service computes for a stored endpoint
fn provision(
    resource_group: &str,
    name: &str,
    mut endpoint: PrivateEndpoint,
    empty_id: bool,
    interface: Option<String>,
) -> PrivateEndpoint {
    endpoint.id = Some(if empty_id {
        String::new()
    } else {
        endpoint_id(resource_group, name)
    });
    endpoint.name = Some(name.to_string());
    endpoint.resource_type = Some("Microsoft.Network/privateEndpoints".to_string());

    let properties = endpoint.properties.get_or_insert_with(Default::default);
    properties.provisioning_state = Some("Succeeded".to_string());
    properties.network_interfaces = interface.map(|id| {
        vec![NetworkInterface {
            id: Some(id),
            ..Default::default()
        }]
    });

    let mark = |connections: &mut Option<Vec<PrivateLinkServiceConnection>>, status: &str| {
        for connection in connections.iter_mut().flatten() {
            let props = connection.properties.get_or_insert_with(Default::default);
            props.provisioning_state = Some("Succeeded".to_string());
            props.private_link_service_connection_state = Some(PrivateLinkServiceConnectionState {
                status: Some(status.to_string()),
                ..Default::default()
            });
        }
    };
    mark(&mut properties.private_link_service_connections, "Approved");
    mark(&mut properties.manual_private_link_service_connections, "Pending");

    endpoint
}

#[async_trait]
impl NetworkClient for MockNetworkClient {
    async fn get_private_endpoint(
        &self,
        ctx: &StopContext,
        resource_group: &str,
        name: &str,
    ) -> ClientResult<PrivateEndpoint> {
        ctx.run(async {
            let mut state = self.state.lock().unwrap();
            state
                .calls
                .push(format!("get_private_endpoint {}/{}", resource_group, name));
            if let Some(failure) = &state.fail_get {
                return Err(failure.to_error());
            }
            state
                .endpoints
                .get(&(resource_group.to_string(), name.to_string()))
                .cloned()
                .ok_or_else(|| ClientError::not_found(format!("{} not found", name)))
        })
        .await
    }

    async fn begin_create_or_update_private_endpoint(
        &self,
        ctx: &StopContext,
        resource_group: &str,
        name: &str,
        parameters: &PrivateEndpoint,
    ) -> ClientResult<LongRunningOperation> {
        ctx.run(async {
            let mut state = self.state.lock().unwrap();
            state.calls.push(format!(
                "begin_create_or_update_private_endpoint {}/{}",
                resource_group, name
            ));
            if let Some(failure) = &state.fail_begin {
                return Err(failure.to_error());
            }

            let interface = if state.attach_interface {
                let nic_name = format!("{}.nic.0a1b2c", name);
                let nic_id = interface_id(resource_group, &nic_name);
                state
                    .interfaces
                    .entry((resource_group.to_string(), nic_name))
                    .or_insert_with(|| interface_with_ips(&nic_id, &["10.0.0.4", "10.0.0.5"]));
                Some(nic_id)
            } else {
                None
            };

            let endpoint = provision(
                resource_group,
                name,
                parameters.clone(),
                state.empty_id,
                interface,
            );
            state
                .endpoints
                .insert((resource_group.to_string(), name.to_string()), endpoint);

            Ok(LongRunningOperation {
                target: PollTarget::AsyncOperation(format!("mock://operations/put/{}", name)),
                retry_after: None,
            })
        })
        .await
    }

    async fn begin_delete_private_endpoint(
        &self,
        ctx: &StopContext,
        resource_group: &str,
        name: &str,
    ) -> ClientResult<LongRunningOperation> {
        ctx.run(async {
            let mut state = self.state.lock().unwrap();
            state.calls.push(format!(
                "begin_delete_private_endpoint {}/{}",
                resource_group, name
            ));
            if let Some(failure) = &state.fail_begin {
                return Err(failure.to_error());
            }
            match state
                .endpoints
                .remove(&(resource_group.to_string(), name.to_string()))
            {
                Some(_) => Ok(LongRunningOperation {
                    target: PollTarget::Location(format!("mock://operations/delete/{}", name)),
                    retry_after: None,
                }),
                None => Err(ClientError::not_found(format!("{} not found", name))),
            }
        })
        .await
    }

    async fn wait_for_completion(
        &self,
        ctx: &StopContext,
        operation: &LongRunningOperation,
    ) -> ClientResult<()> {
        if let PollTarget::AsyncOperation(url) | PollTarget::Location(url) = &operation.target {
            self.state
                .lock()
                .unwrap()
                .calls
                .push(format!("wait_for_completion {}", url));
        }
        ctx.sleep(std::time::Duration::ZERO).await?;
        match &self.state.lock().unwrap().fail_wait {
            Some(failure) => Err(failure.to_error()),
            None => Ok(()),
        }
    }

    async fn get_network_interface(
        &self,
        ctx: &StopContext,
        resource_group: &str,
        name: &str,
    ) -> ClientResult<NetworkInterface> {
        ctx.run(async {
            let mut state = self.state.lock().unwrap();
            state
                .calls
                .push(format!("get_network_interface {}/{}", resource_group, name));
            if let Some(failure) = &state.fail_interface {
                return Err(failure.to_error());
            }
            state
                .interfaces
                .get(&(resource_group.to_string(), name.to_string()))
                .cloned()
                .ok_or_else(|| ClientError::not_found(format!("{} not found", name)))
        })
        .await
    }
}
