use std::fmt;

use thiserror::Error;

use crate::change::ResourceId;

/// The step that was being attempted when a reconciliation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    Fetch,
    Plan,
    Create,
    Update,
    Destroy,
}

impl fmt::Display for Attempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch => write!(f, "fetch"),
            Self::Plan => write!(f, "plan"),
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Destroy => write!(f, "destroy"),
        }
    }
}

/// Errors raised while reconciling a pool or node.
///
/// Every variant is terminal: nothing is retried or rolled back.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("{attempt} {resource} failed: unable to connect to {url}: {message}")]
    Transport {
        resource: ResourceId,
        attempt: Attempt,
        url: String,
        message: String,
    },

    #[error("{attempt} {resource} failed: pool not found")]
    ResourceNotFound {
        resource: ResourceId,
        attempt: Attempt,
    },

    #[error("{attempt} {resource} failed: malformed response: {detail}")]
    MalformedResponse {
        resource: ResourceId,
        attempt: Attempt,
        detail: String,
    },

    #[error("{attempt} {resource} failed: server reported {error_id}: {error_text}")]
    RemoteError {
        resource: ResourceId,
        attempt: Attempt,
        error_id: String,
        error_text: String,
    },

    #[error("{attempt} {resource} failed: got HTTP {status} from server: {body}")]
    RemoteRejected {
        resource: ResourceId,
        attempt: Attempt,
        status: u16,
        body: String,
    },

    #[error("unsupported state '{state}' for {resource}")]
    UnsupportedState { resource: ResourceId, state: String },

    #[error("operation {operation} on {resource} requires the following missing parameters: {missing}")]
    MissingParameter {
        resource: ResourceId,
        operation: String,
        missing: String,
    },
}

impl ReconcileError {
    pub fn transport(
        resource: &ResourceId,
        attempt: Attempt,
        url: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Transport {
            resource: resource.clone(),
            attempt,
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn not_found(resource: &ResourceId, attempt: Attempt) -> Self {
        Self::ResourceNotFound {
            resource: resource.clone(),
            attempt,
        }
    }

    pub fn malformed(resource: &ResourceId, attempt: Attempt, detail: impl Into<String>) -> Self {
        Self::MalformedResponse {
            resource: resource.clone(),
            attempt,
            detail: detail.into(),
        }
    }

    pub fn remote_error(
        resource: &ResourceId,
        attempt: Attempt,
        error_id: impl Into<String>,
        error_text: impl Into<String>,
    ) -> Self {
        Self::RemoteError {
            resource: resource.clone(),
            attempt,
            error_id: error_id.into(),
            error_text: error_text.into(),
        }
    }

    pub fn rejected(
        resource: &ResourceId,
        attempt: Attempt,
        status: u16,
        body: impl Into<String>,
    ) -> Self {
        Self::RemoteRejected {
            resource: resource.clone(),
            attempt,
            status,
            body: body.into(),
        }
    }

    pub fn unsupported_state(resource: &ResourceId, state: impl Into<String>) -> Self {
        Self::UnsupportedState {
            resource: resource.clone(),
            state: state.into(),
        }
    }

    pub fn missing_parameter(
        resource: &ResourceId,
        operation: impl Into<String>,
        missing: impl Into<String>,
    ) -> Self {
        Self::MissingParameter {
            resource: resource.clone(),
            operation: operation.into(),
            missing: missing.into(),
        }
    }

    pub fn resource(&self) -> &ResourceId {
        match self {
            Self::Transport { resource, .. }
            | Self::ResourceNotFound { resource, .. }
            | Self::MalformedResponse { resource, .. }
            | Self::RemoteError { resource, .. }
            | Self::RemoteRejected { resource, .. }
            | Self::UnsupportedState { resource, .. }
            | Self::MissingParameter { resource, .. } => resource,
        }
    }

    /// The step that failed, if the error happened while talking to the server.
    pub fn attempt(&self) -> Option<Attempt> {
        match self {
            Self::Transport { attempt, .. }
            | Self::ResourceNotFound { attempt, .. }
            | Self::MalformedResponse { attempt, .. }
            | Self::RemoteError { attempt, .. }
            | Self::RemoteRejected { attempt, .. } => Some(*attempt),
            Self::UnsupportedState { .. } | Self::MissingParameter { .. } => None,
        }
    }

    /// Coarse classification, used for logging and exit-code mapping.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Transport { .. } => ErrorCategory::Transport,
            Self::ResourceNotFound { .. } => ErrorCategory::NotFound,
            Self::MalformedResponse { .. } => ErrorCategory::Malformed,
            Self::RemoteError { .. } | Self::RemoteRejected { .. } => ErrorCategory::Remote,
            Self::UnsupportedState { .. } | Self::MissingParameter { .. } => {
                ErrorCategory::Validation
            }
        }
    }
}

/// Error categories for logging and exit-code mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Transport,
    NotFound,
    Malformed,
    Remote,
    Validation,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport => write!(f, "transport"),
            Self::NotFound => write!(f, "not_found"),
            Self::Malformed => write!(f, "malformed"),
            Self::Remote => write!(f, "remote"),
            Self::Validation => write!(f, "validation"),
        }
    }
}

/// Convenience result type for reconciliation
pub type Result<T> = std::result::Result<T, ReconcileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = ReconcileError::not_found(&ResourceId::node("web", "n1:80"), Attempt::Fetch);
        assert_eq!(
            err.to_string(),
            "fetch node n1:80 in pool web failed: pool not found"
        );
        assert_eq!(err.category(), ErrorCategory::NotFound);
        assert_eq!(err.attempt(), Some(Attempt::Fetch));
    }

    #[test]
    fn test_rejected_carries_status_and_body() {
        let err = ReconcileError::rejected(
            &ResourceId::pool("web"),
            Attempt::Create,
            409,
            "{\"error_id\":\"resource.exists\"}",
        );
        let msg = err.to_string();
        assert!(msg.contains("create pool web"));
        assert!(msg.contains("HTTP 409"));
        assert!(msg.contains("resource.exists"));
        assert_eq!(err.category(), ErrorCategory::Remote);
    }

    #[test]
    fn test_transport_message_includes_url() {
        let err = ReconcileError::transport(
            &ResourceId::pool("web"),
            Attempt::Fetch,
            "https://lb:9070/api/tm/3.0/config/active/pools/web",
            "connection refused",
        );
        assert!(err.to_string().contains("https://lb:9070/api/tm/3.0/config/active/pools/web"));
        assert_eq!(err.category(), ErrorCategory::Transport);
    }

    #[test]
    fn test_validation_errors_have_no_attempt() {
        let err = ReconcileError::unsupported_state(&ResourceId::pool("web"), "gone");
        assert_eq!(err.to_string(), "unsupported state 'gone' for pool web");
        assert_eq!(err.attempt(), None);
        assert_eq!(err.category(), ErrorCategory::Validation);

        let err = ReconcileError::missing_parameter(&ResourceId::pool("web"), "drainnodes", "nodes");
        assert_eq!(
            err.to_string(),
            "operation drainnodes on pool web requires the following missing parameters: nodes"
        );
    }

    #[test]
    fn test_resource_accessor() {
        let id = ResourceId::node("web", "n1:80");
        let err = ReconcileError::malformed(&id, Attempt::Plan, "missing properties");
        assert_eq!(err.resource(), &id);
    }

    #[test]
    fn test_error_categories_display() {
        assert_eq!(ErrorCategory::Transport.to_string(), "transport");
        assert_eq!(ErrorCategory::NotFound.to_string(), "not_found");
        assert_eq!(ErrorCategory::Malformed.to_string(), "malformed");
        assert_eq!(ErrorCategory::Remote.to_string(), "remote");
        assert_eq!(ErrorCategory::Validation.to_string(), "validation");
    }
}
