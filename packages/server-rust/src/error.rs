//! Error taxonomy for the orchestration core.

use healthins_core::ActorId;

/// Errors surfaced to callers of pipelines, registries, commands, and facades.
///
/// Validation variants (`ActorNotFound` through `InvalidState`) are local
/// failures that are reported verbatim and never retried. Collaborator
/// failures travel through [`OperationError::Store`] untouched.
#[derive(Debug, thiserror::Error)]
pub enum OperationError {
    #[error("actor {0} not found")]
    ActorNotFound(ActorId),
    #[error("actor {0} is inactive")]
    ActorInactive(ActorId),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("{kind} {id} not found")]
    ResourceNotFound { kind: &'static str, id: String },
    #[error("unsupported type: {0}")]
    UnsupportedType(String),
    #[error("no strategy found for campaign type: {0}")]
    NoStrategyForCampaignType(String),
    #[error("campaign {subject} matches multiple strategies: {candidates:?}")]
    AmbiguousStrategy {
        subject: String,
        candidates: Vec<String>,
    },
    #[error("undo not supported for this command")]
    UndoNotSupported,
    #[error("no snapshot available: command has not been executed")]
    NoSnapshotAvailable,
    #[error("nothing to undo: snapshot already restored")]
    NothingToUndo,
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl OperationError {
    /// Shorthand for [`OperationError::ResourceNotFound`].
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        OperationError::ResourceNotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Stable short label used for span fields and metrics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            OperationError::ActorNotFound(_) => "actor_not_found",
            OperationError::ActorInactive(_) => "actor_inactive",
            OperationError::InvalidRequest(_) => "invalid_request",
            OperationError::Forbidden(_) => "forbidden",
            OperationError::InvalidState(_) => "invalid_state",
            OperationError::ResourceNotFound { .. } => "resource_not_found",
            OperationError::UnsupportedType(_) => "unsupported_type",
            OperationError::NoStrategyForCampaignType(_) => "no_strategy",
            OperationError::AmbiguousStrategy { .. } => "ambiguous_strategy",
            OperationError::UndoNotSupported => "undo_not_supported",
            OperationError::NoSnapshotAvailable => "no_snapshot",
            OperationError::NothingToUndo => "nothing_to_undo",
            OperationError::Store(_) => "store",
        }
    }
}

/// Startup configuration errors raised while wiring registries.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("duplicate strategy key: {key}")]
    DuplicateKey { key: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_keep_their_message() {
        let err: OperationError = anyhow::anyhow!("connection reset").into();
        assert_eq!(err.to_string(), "connection reset");
        assert_eq!(err.kind(), "store");
    }

    #[test]
    fn resource_not_found_formats_kind_and_id() {
        let err = OperationError::not_found("policy", 42);
        assert_eq!(err.to_string(), "policy 42 not found");
    }

    #[test]
    fn actor_errors_name_the_actor() {
        assert_eq!(
            OperationError::ActorInactive(ActorId(7)).to_string(),
            "actor 7 is inactive"
        );
    }
}
