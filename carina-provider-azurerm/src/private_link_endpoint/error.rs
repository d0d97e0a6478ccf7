use carina_core::provider::{ProviderError, ProviderErrorKind};
use thiserror::Error;

use crate::client::ClientError;

/// Remote step that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CheckExisting,
    CreateOrUpdate,
    Read,
    Delete,
}

impl Operation {
    fn verb(&self) -> &'static str {
        match self {
            Operation::CheckExisting => "checking for presence of existing",
            Operation::CreateOrUpdate => "creating/updating",
            Operation::Read => "retrieving",
            Operation::Delete => "deleting",
        }
    }

    fn noun(&self) -> &'static str {
        match self {
            Operation::CheckExisting => "presence check",
            Operation::CreateOrUpdate => "creation/update",
            Operation::Read => "retrieval",
            Operation::Delete => "deletion",
        }
    }
}

#[derive(Debug, Error)]
pub enum EndpointError {
    #[error("Invalid attribute {name:?}: {reason}")]
    InvalidAttribute { name: String, reason: String },

    #[error("\"private_service_connection\":{connection:?} is invalid, {reason}")]
    InvalidSettings { connection: String, reason: String },

    #[error("Invalid resource ID {id:?}: {reason}")]
    InvalidId { id: String, reason: String },

    #[error("Private Link Endpoint {id:?} already exists")]
    AlreadyExists { id: String },

    #[error("Error {} Private Link Endpoint {name:?} (Resource Group {resource_group:?}): {source}", operation.verb())]
    Request {
        operation: Operation,
        name: String,
        resource_group: String,
        source: ClientError,
    },

    #[error("Error waiting for {} of Private Link Endpoint {name:?} (Resource Group {resource_group:?}): {source}", operation.noun())]
    Wait {
        operation: Operation,
        name: String,
        resource_group: String,
        source: ClientError,
    },

    #[error("API returns a nil/empty id on Private Link Endpoint {name:?} (Resource Group {resource_group:?})")]
    EmptyId { name: String, resource_group: String },

    #[error("Network Interface {name:?} (Resource Group {resource_group:?}) was not found")]
    InterfaceNotFound { name: String, resource_group: String },

    #[error("Error making Read request on Network Interface {name:?} (Resource Group {resource_group:?}): {source}")]
    Interface {
        name: String,
        resource_group: String,
        source: ClientError,
    },

    #[error("Private Link Endpoint {name:?} (Resource Group {resource_group:?}) was not found after apply")]
    NotFoundAfterApply { name: String, resource_group: String },
}

impl EndpointError {
    /// The configuration was rejected before any remote call
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            EndpointError::InvalidAttribute { .. }
                | EndpointError::InvalidSettings { .. }
                | EndpointError::InvalidId { .. }
        )
    }
}

impl From<EndpointError> for ProviderError {
    fn from(err: EndpointError) -> Self {
        if let EndpointError::AlreadyExists { id } = &err {
            return ProviderError::already_exists("azurerm.private_link_endpoint", id);
        }

        let kind = if err.is_validation() {
            ProviderErrorKind::Validation
        } else {
            ProviderErrorKind::Other
        };
        ProviderError::new(err.to_string())
            .with_kind(kind)
            .with_cause(err)
    }
}
