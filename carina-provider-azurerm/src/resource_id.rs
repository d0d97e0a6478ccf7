//! Parsing of Azure Resource Manager resource IDs
//!
//! An ARM ID is a `/`-separated list of alternating keys and values:
//! `/subscriptions/{sub}/resourceGroups/{rg}/providers/{namespace}/{type}/{name}`.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceIdError {
    #[error("Resource ID must not be empty")]
    Empty,

    #[error("Resource ID {0:?} must start with '/'")]
    NotAbsolute(String),

    #[error("Resource ID {0:?} must contain an even number of segments")]
    OddSegments(String),

    #[error("Resource ID {0:?} contains an empty key")]
    EmptyKey(String),

    #[error("Resource ID {id:?} has an empty value for {key:?}")]
    EmptyValue { id: String, key: String },

    #[error("No subscription ID found in {0:?}")]
    MissingSubscription(String),

    #[error("No resource group name found in {0:?}")]
    MissingResourceGroup(String),
}

/// Components of an ARM resource ID
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AzureResourceId {
    pub subscription_id: String,
    pub resource_group: String,
    /// Resource provider namespace, e.g. `Microsoft.Network`
    pub provider: Option<String>,
    /// Remaining key/value pairs in their original order
    pub path: Vec<(String, String)>,
}

impl AzureResourceId {
    pub fn parse(id: &str) -> Result<Self, ResourceIdError> {
        if id.is_empty() {
            return Err(ResourceIdError::Empty);
        }
        let Some(trimmed) = id.strip_prefix('/') else {
            return Err(ResourceIdError::NotAbsolute(id.to_string()));
        };

        let segments: Vec<&str> = trimmed.trim_end_matches('/').split('/').collect();
        if segments.len() % 2 != 0 {
            return Err(ResourceIdError::OddSegments(id.to_string()));
        }

        let mut subscription_id = None;
        let mut resource_group = None;
        let mut provider = None;
        let mut path = Vec::new();

        for pair in segments.chunks(2) {
            let (key, value) = (pair[0], pair[1]);
            if key.is_empty() {
                return Err(ResourceIdError::EmptyKey(id.to_string()));
            }
            if value.is_empty() {
                return Err(ResourceIdError::EmptyValue {
                    id: id.to_string(),
                    key: key.to_string(),
                });
            }

            match key {
                "subscriptions" if subscription_id.is_none() => {
                    subscription_id = Some(value.to_string())
                }
                k if k.eq_ignore_ascii_case("resourceGroups") && resource_group.is_none() => {
                    resource_group = Some(value.to_string())
                }
                "providers" if provider.is_none() => provider = Some(value.to_string()),
                _ => path.push((key.to_string(), value.to_string())),
            }
        }

        let subscription_id =
            subscription_id.ok_or_else(|| ResourceIdError::MissingSubscription(id.to_string()))?;
        let resource_group =
            resource_group.ok_or_else(|| ResourceIdError::MissingResourceGroup(id.to_string()))?;

        Ok(Self {
            subscription_id,
            resource_group,
            provider,
            path,
        })
    }

    /// Value stored under `key` in the path, if any
    pub fn get(&self, key: &str) -> Option<&str> {
        self.path
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}
