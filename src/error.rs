//! Render errors.
//!
//! Every variant is an unrecoverable contract violation or a host failure
//! passed through untouched. Nothing in the engine retries.

use std::error::Error;

use crate::fiber::FiberId;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// A state update was requested before any root was committed.
    #[error("state update requested before the first commit")]
    NoCommittedRoot,

    /// Commit could not find an ancestor owning a host node.
    #[error("no host parent found for fiber {fiber:?}")]
    MissingHostParent { fiber: FiberId },

    /// A fiber that needs a host node (or a host descendant) has none.
    #[error("fiber {fiber:?} has no host node to operate on")]
    MissingHostNode { fiber: FiberId },

    /// A fiber id no longer resolves in the arena.
    #[error("unknown fiber {0:?}")]
    UnknownFiber(FiberId),

    /// The host rejected a mutation.
    #[error("host mutation failed")]
    Host(#[source] Box<dyn Error + Send + Sync>),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RenderError {
    /// Wrap a host error.
    pub fn host(err: impl Error + Send + Sync + 'static) -> Self {
        RenderError::Host(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            RenderError::NoCommittedRoot.to_string(),
            "state update requested before the first commit"
        );

        let io = std::io::Error::other("boom");
        let err = RenderError::from(io);
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_host_error_keeps_source() {
        let err = RenderError::host(std::io::Error::other("bad property"));
        let source = err.source().map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("bad property"));
    }
}
