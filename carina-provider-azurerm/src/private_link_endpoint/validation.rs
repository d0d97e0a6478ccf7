use super::config::PrivateEndpointConfig;
use super::error::EndpointError;

/// Check settings spanning several fields of a connection
///
/// Manual connections need a request message; automatic ones must not have one.
pub fn validate_settings(config: &PrivateEndpointConfig) -> Result<(), EndpointError> {
    for connection in &config.private_service_connections {
        let has_message = connection
            .request_message
            .as_deref()
            .is_some_and(|m| !m.is_empty());

        if !connection.is_manual_connection && has_message {
            return Err(EndpointError::InvalidSettings {
                connection: connection.name.clone(),
                reason: "the \"request_message\" attribute cannot be set if the \
                         \"is_manual_connection\" attribute is \"false\""
                    .to_string(),
            });
        }
        if connection.is_manual_connection && !has_message {
            return Err(EndpointError::InvalidSettings {
                connection: connection.name.clone(),
                reason: "the \"request_message\" attribute must not be empty".to_string(),
            });
        }
    }
    Ok(())
}
