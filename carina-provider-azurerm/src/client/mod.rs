//! Azure Resource Manager network client
//!
//! `NetworkClient` is the seam between the resource bindings and the remote
//! service. `ArmNetworkClient` talks to ARM over HTTPS; tests substitute an
//! in-memory implementation.

pub mod arm;
#[cfg(test)]
pub(crate) mod mock;
pub mod models;
#[cfg(test)]
pub(crate) mod stub;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::context::StopContext;
use models::{NetworkInterface, PrivateEndpoint};

pub use arm::ArmNetworkClient;

/// Errors returned by the network client
#[derive(Debug, Error)]
pub enum ClientError {
    /// The service answered with a non-success status
    #[error("{status} {}: {message}", code.as_deref().unwrap_or("Unknown"))]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to obtain an access token: {0}")]
    Credential(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// A long-running operation reached a non-success terminal state
    #[error("Operation finished with status {status:?}: {}", message.as_deref().unwrap_or("no details"))]
    OperationFailed {
        status: String,
        code: Option<String>,
        message: Option<String>,
    },

    #[error("Operation was cancelled")]
    Cancelled,

    #[error("Operation deadline exceeded")]
    DeadlineExceeded,
}

impl ClientError {
    pub fn not_found(message: impl Into<String>) -> Self {
        ClientError::Api {
            status: 404,
            code: Some("NotFound".to_string()),
            message: message.into(),
        }
    }

    /// The remote object does not exist (HTTP 404)
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::Api { status: 404, .. })
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Where to look for the outcome of an asynchronous operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollTarget {
    /// Nothing to poll: the initiating call already reached a terminal state
    Completed,
    /// `Azure-AsyncOperation` status monitor
    AsyncOperation(String),
    /// `Location` header, polled until it stops answering 202
    Location(String),
    /// The resource itself, polled until its provisioning state is terminal
    ProvisioningState(String),
    /// The resource itself, polled until it answers 404
    ResourceGone(String),
}

/// Handle on an asynchronous remote operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LongRunningOperation {
    pub target: PollTarget,
    /// Server-suggested delay before the first poll
    pub retry_after: Option<Duration>,
}

impl LongRunningOperation {
    pub fn completed() -> Self {
        Self {
            target: PollTarget::Completed,
            retry_after: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.target == PollTarget::Completed
    }
}

/// Calls against `Microsoft.Network` consumed by the resource bindings
///
/// Every call takes the caller's `StopContext`; a stopped context ends the
/// call with `ClientError::Cancelled` or `ClientError::DeadlineExceeded`.
#[async_trait]
pub trait NetworkClient: Send + Sync {
    async fn get_private_endpoint(
        &self,
        ctx: &StopContext,
        resource_group: &str,
        name: &str,
    ) -> ClientResult<PrivateEndpoint>;

    /// Start a create-or-update; completion is observed with `wait_for_completion`
    async fn begin_create_or_update_private_endpoint(
        &self,
        ctx: &StopContext,
        resource_group: &str,
        name: &str,
        parameters: &PrivateEndpoint,
    ) -> ClientResult<LongRunningOperation>;

    /// Start a delete; completion is observed with `wait_for_completion`
    async fn begin_delete_private_endpoint(
        &self,
        ctx: &StopContext,
        resource_group: &str,
        name: &str,
    ) -> ClientResult<LongRunningOperation>;

    /// Block until the operation reaches a terminal state
    async fn wait_for_completion(
        &self,
        ctx: &StopContext,
        operation: &LongRunningOperation,
    ) -> ClientResult<()>;

    async fn get_network_interface(
        &self,
        ctx: &StopContext,
        resource_group: &str,
        name: &str,
    ) -> ClientResult<NetworkInterface>;
}
