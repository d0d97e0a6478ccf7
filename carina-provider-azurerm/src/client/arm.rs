//! `NetworkClient` over the Azure Resource Manager REST API
//!
//! Requests carry a bearer token from an `azure_core` `TokenCredential`.
//! Long-running operations are followed through the `Azure-AsyncOperation`
//! or `Location` headers, or through the resource's provisioning state.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use azure_core::credentials::TokenCredential;
use log::debug;
use reqwest::header::{HeaderMap, AUTHORIZATION};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use super::models::{
    AsyncOperationStatus, ErrorResponse, NetworkInterface, OperationState, PrivateEndpoint,
};
use super::{ClientError, ClientResult, LongRunningOperation, NetworkClient, PollTarget};
use crate::context::StopContext;

/// API version of `Microsoft.Network` used for every request
pub const API_VERSION: &str = "2019-06-01";

const ASYNC_OPERATION_HEADER: &str = "azure-asyncoperation";
const LOCATION_HEADER: &str = "location";
const RETRY_AFTER_HEADER: &str = "retry-after";

/// ARM client scoped to one subscription
pub struct ArmNetworkClient {
    http: reqwest::Client,
    endpoint: String,
    subscription_id: String,
    credential: Arc<dyn TokenCredential>,
    poll_interval: Duration,
}

impl std::fmt::Debug for ArmNetworkClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArmNetworkClient")
            .field("endpoint", &self.endpoint)
            .field("subscription_id", &self.subscription_id)
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

impl ArmNetworkClient {
    pub fn new(
        endpoint: impl Into<String>,
        subscription_id: impl Into<String>,
        credential: Arc<dyn TokenCredential>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            subscription_id: subscription_id.into(),
            credential,
            poll_interval,
        }
    }

    /// Send requests through `http` instead of a default client
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// URL of a `Microsoft.Network` resource in this subscription
    fn resource_url(&self, resource_group: &str, kind: &str, name: &str) -> String {
        format!(
            "{}/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Network/{}/{}?api-version={}",
            self.endpoint, self.subscription_id, resource_group, kind, name, API_VERSION
        )
    }

    fn private_endpoint_url(&self, resource_group: &str, name: &str) -> String {
        self.resource_url(resource_group, "privateEndpoints", name)
    }

    fn network_interface_url(&self, resource_group: &str, name: &str) -> String {
        self.resource_url(resource_group, "networkInterfaces", name)
    }

    async fn bearer_token(&self) -> ClientResult<String> {
        let scope = format!("{}/.default", self.endpoint);
        let token = self
            .credential
            .get_token(&[scope.as_str()], None)
            .await
            .map_err(|e| ClientError::Credential(e.to_string()))?;
        Ok(token.token.secret().to_string())
    }

    /// Send an authorized request and turn non-success statuses into `ClientError::Api`
    async fn send(&self, ctx: &StopContext, request: RequestBuilder) -> ClientResult<Response> {
        ctx.run(async {
            let token = self.bearer_token().await?;
            let response = request
                .header(AUTHORIZATION, format!("Bearer {token}"))
                .send()
                .await?;

            let status = response.status();
            if status.is_success() {
                Ok(response)
            } else {
                let body = response.text().await.unwrap_or_default();
                Err(api_error(status, &body))
            }
        })
        .await
    }

    async fn get_json<T: DeserializeOwned>(&self, ctx: &StopContext, url: &str) -> ClientResult<T> {
        let response = self.send(ctx, self.http.get(url)).await?;
        decode(ctx, response).await
    }

    fn poll_delay(&self, retry_after: Option<Duration>) -> Duration {
        retry_after.unwrap_or(self.poll_interval)
    }

    async fn poll_async_operation(
        &self,
        ctx: &StopContext,
        url: &str,
        first_delay: Duration,
    ) -> ClientResult<()> {
        let mut delay = first_delay;
        loop {
            ctx.sleep(delay).await?;

            let response = self.send(ctx, self.http.get(url)).await?;
            let retry_after = retry_after(response.headers());
            let status: AsyncOperationStatus = decode(ctx, response).await?;
            let raw = status.status.unwrap_or_default();

            match OperationState::parse(&raw) {
                OperationState::Succeeded => return Ok(()),
                OperationState::Failed | OperationState::Canceled => {
                    let error = status.error.unwrap_or_default();
                    return Err(ClientError::OperationFailed {
                        status: raw,
                        code: error.code,
                        message: error.message,
                    });
                }
                OperationState::InProgress => {
                    debug!("Operation {} is {:?}, polling again", url, raw);
                    delay = self.poll_delay(retry_after);
                }
            }
        }
    }

    async fn poll_location(
        &self,
        ctx: &StopContext,
        url: &str,
        first_delay: Duration,
    ) -> ClientResult<()> {
        let mut delay = first_delay;
        loop {
            ctx.sleep(delay).await?;

            let response = self.send(ctx, self.http.get(url)).await?;
            if response.status() != StatusCode::ACCEPTED {
                return Ok(());
            }
            debug!("Operation {} still accepted, polling again", url);
            delay = self.poll_delay(retry_after(response.headers()));
        }
    }

    async fn poll_provisioning_state(
        &self,
        ctx: &StopContext,
        url: &str,
        first_delay: Duration,
    ) -> ClientResult<()> {
        let mut delay = first_delay;
        loop {
            ctx.sleep(delay).await?;

            let resource: serde_json::Value = self.get_json(ctx, url).await?;
            let raw = resource
                .pointer("/properties/provisioningState")
                .and_then(|v| v.as_str())
                .unwrap_or("Succeeded")
                .to_string();

            match OperationState::parse(&raw) {
                OperationState::Succeeded => return Ok(()),
                OperationState::Failed | OperationState::Canceled => {
                    return Err(ClientError::OperationFailed {
                        status: raw,
                        code: None,
                        message: None,
                    });
                }
                OperationState::InProgress => {
                    debug!("Resource {} is {:?}, polling again", url, raw);
                    delay = self.poll_interval;
                }
            }
        }
    }

    /// Poll a resource being deleted; ends with the not-found error once it is gone
    async fn poll_resource_gone(
        &self,
        ctx: &StopContext,
        url: &str,
        first_delay: Duration,
    ) -> ClientResult<()> {
        let mut delay = first_delay;
        loop {
            ctx.sleep(delay).await?;

            let response = self.send(ctx, self.http.get(url)).await?;
            debug!("Resource {} still exists, polling again", url);
            delay = self.poll_delay(retry_after(response.headers()));
        }
    }
}

#[async_trait]
impl NetworkClient for ArmNetworkClient {
    async fn get_private_endpoint(
        &self,
        ctx: &StopContext,
        resource_group: &str,
        name: &str,
    ) -> ClientResult<PrivateEndpoint> {
        let url = self.private_endpoint_url(resource_group, name);
        self.get_json(ctx, &url).await
    }

    async fn begin_create_or_update_private_endpoint(
        &self,
        ctx: &StopContext,
        resource_group: &str,
        name: &str,
        parameters: &PrivateEndpoint,
    ) -> ClientResult<LongRunningOperation> {
        let url = self.private_endpoint_url(resource_group, name);
        let request = self.http.request(Method::PUT, &url).json(parameters);
        let response = self.send(ctx, request).await?;
        Ok(long_running_operation(
            &Method::PUT,
            response.status(),
            response.headers(),
            &url,
        ))
    }

    async fn begin_delete_private_endpoint(
        &self,
        ctx: &StopContext,
        resource_group: &str,
        name: &str,
    ) -> ClientResult<LongRunningOperation> {
        let url = self.private_endpoint_url(resource_group, name);
        let response = self.send(ctx, self.http.delete(&url)).await?;
        Ok(long_running_operation(
            &Method::DELETE,
            response.status(),
            response.headers(),
            &url,
        ))
    }

    async fn wait_for_completion(
        &self,
        ctx: &StopContext,
        operation: &LongRunningOperation,
    ) -> ClientResult<()> {
        let first_delay = self.poll_delay(operation.retry_after);
        match &operation.target {
            PollTarget::Completed => Ok(()),
            PollTarget::AsyncOperation(url) => {
                self.poll_async_operation(ctx, url, first_delay).await
            }
            PollTarget::Location(url) => self.poll_location(ctx, url, first_delay).await,
            PollTarget::ProvisioningState(url) => {
                self.poll_provisioning_state(ctx, url, first_delay).await
            }
            PollTarget::ResourceGone(url) => self.poll_resource_gone(ctx, url, first_delay).await,
        }
    }

    async fn get_network_interface(
        &self,
        ctx: &StopContext,
        resource_group: &str,
        name: &str,
    ) -> ClientResult<NetworkInterface> {
        let url = self.network_interface_url(resource_group, name);
        self.get_json(ctx, &url).await
    }
}

async fn decode<T: DeserializeOwned>(ctx: &StopContext, response: Response) -> ClientResult<T> {
    let body = ctx.run(async { Ok(response.text().await?) }).await?;
    serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))
}

/// Build `ClientError::Api` from a failed response, reading the ARM error body when present
fn api_error(status: StatusCode, body: &str) -> ClientError {
    let detail = serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|r| r.error)
        .unwrap_or_default();

    let message = detail.message.unwrap_or_else(|| {
        if body.is_empty() {
            status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string()
        } else {
            body.to_string()
        }
    });

    ClientError::Api {
        status: status.as_u16(),
        code: detail.code,
        message,
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
}

/// `Retry-After` in seconds
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    header_str(headers, RETRY_AFTER_HEADER)
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Decide how to follow an operation from its initiating response
fn long_running_operation(
    method: &Method,
    status: StatusCode,
    headers: &HeaderMap,
    resource_url: &str,
) -> LongRunningOperation {
    let target = if let Some(url) = header_str(headers, ASYNC_OPERATION_HEADER) {
        PollTarget::AsyncOperation(url.to_string())
    } else if let Some(url) = header_str(headers, LOCATION_HEADER) {
        PollTarget::Location(url.to_string())
    } else if *method == Method::PUT && status == StatusCode::CREATED {
        PollTarget::ProvisioningState(resource_url.to_string())
    } else if *method == Method::DELETE && status == StatusCode::ACCEPTED {
        PollTarget::ResourceGone(resource_url.to_string())
    } else {
        PollTarget::Completed
    };

    LongRunningOperation {
        target,
        retry_after: retry_after(headers),
    }
}
