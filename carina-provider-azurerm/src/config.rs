//! Provider configuration read from the environment

use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_RESOURCE_MANAGER_ENDPOINT: &str = "https://management.azure.com";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Environment variable {0} is required")]
    Missing(&'static str),

    #[error("Invalid value {value:?} for {name}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// How the provider authenticates against Azure Active Directory
#[derive(Clone, PartialEq, Eq)]
pub enum Authentication {
    ServicePrincipal {
        tenant_id: String,
        client_id: String,
        client_secret: String,
    },
    ManagedIdentity,
}

impl std::fmt::Debug for Authentication {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Authentication::ServicePrincipal {
                tenant_id,
                client_id,
                ..
            } => f
                .debug_struct("ServicePrincipal")
                .field("tenant_id", tenant_id)
                .field("client_id", client_id)
                .field("client_secret", &"<redacted>")
                .finish(),
            Authentication::ManagedIdentity => write!(f, "ManagedIdentity"),
        }
    }
}

/// Settings shared by every resource the provider manages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub subscription_id: String,
    pub authentication: Authentication,
    pub resource_manager_endpoint: String,
    /// Refuse to create resources that already exist remotely
    pub import_protection: bool,
    pub poll_interval: Duration,
    pub operation_timeout: Duration,
}

impl ProviderConfig {
    /// Configuration for `subscription_id` with every other setting at its default
    pub fn new(subscription_id: impl Into<String>) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            authentication: Authentication::ManagedIdentity,
            resource_manager_endpoint: DEFAULT_RESOURCE_MANAGER_ENDPOINT.to_string(),
            import_protection: false,
            poll_interval: DEFAULT_POLL_INTERVAL,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from any variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let subscription_id =
            get("ARM_SUBSCRIPTION_ID").ok_or(ConfigError::Missing("ARM_SUBSCRIPTION_ID"))?;

        let authentication = match (
            get("ARM_TENANT_ID"),
            get("ARM_CLIENT_ID"),
            get("ARM_CLIENT_SECRET"),
        ) {
            (Some(tenant_id), Some(client_id), Some(client_secret)) => {
                Authentication::ServicePrincipal {
                    tenant_id,
                    client_id,
                    client_secret,
                }
            }
            _ => Authentication::ManagedIdentity,
        };

        let mut config = Self::new(subscription_id);
        config.authentication = authentication;

        if let Some(endpoint) = get("ARM_RESOURCE_MANAGER_ENDPOINT") {
            if !endpoint.starts_with("https://") && !endpoint.starts_with("http://") {
                return Err(ConfigError::Invalid {
                    name: "ARM_RESOURCE_MANAGER_ENDPOINT",
                    value: endpoint,
                    reason: "expected an http(s) URL".to_string(),
                });
            }
            config.resource_manager_endpoint = endpoint.trim_end_matches('/').to_string();
        }

        if let Some(strict) = get("ARM_PROVIDER_STRICT") {
            config.import_protection = parse_bool("ARM_PROVIDER_STRICT", &strict)?;
        }

        if let Some(seconds) = get("ARM_POLL_INTERVAL_SECONDS") {
            config.poll_interval =
                Duration::from_secs(parse_positive("ARM_POLL_INTERVAL_SECONDS", &seconds)?);
        }

        if let Some(minutes) = get("ARM_OPERATION_TIMEOUT_MINUTES") {
            let seconds = parse_positive("ARM_OPERATION_TIMEOUT_MINUTES", &minutes)?
                .checked_mul(60)
                .ok_or_else(|| ConfigError::Invalid {
                    name: "ARM_OPERATION_TIMEOUT_MINUTES",
                    value: minutes.clone(),
                    reason: "timeout is too large".to_string(),
                })?;
            config.operation_timeout = Duration::from_secs(seconds);
        }

        Ok(config)
    }
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(ConfigError::Invalid {
            name,
            value: value.to_string(),
            reason: "expected true, false, 1 or 0".to_string(),
        }),
    }
}

fn parse_positive(name: &'static str, value: &str) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::Invalid {
            name,
            value: value.to_string(),
            reason: "expected a positive integer".to_string(),
        }),
    }
}
