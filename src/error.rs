//! Error types for registry construction, dispatch and handler lifecycle.

use std::fmt;

/// Error returned by a [`Handler`](crate::handler::Handler).
///
/// Wraps any error type so handlers are free to use their own.
#[derive(Debug)]
pub struct HandlerError(Box<dyn std::error::Error + Send + Sync + 'static>);

impl HandlerError {
    pub fn new<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self(Box::new(err))
    }

    /// Build an error from a plain message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self(message.into().into())
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for HandlerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl From<std::io::Error> for HandlerError {
    fn from(err: std::io::Error) -> Self {
        Self::new(err)
    }
}

/// Lets a handler propagate a failed nested forward or include with `?`.
impl From<DispatchError> for HandlerError {
    fn from(err: DispatchError) -> Self {
        Self::new(err)
    }
}

/// Lifecycle phase in which a handler failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    Init,
    Destroy,
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecyclePhase::Init => f.write_str("init"),
            LifecyclePhase::Destroy => f.write_str("destroy"),
        }
    }
}

/// Errors raised by the dispatch layer.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// A pattern or mapping is malformed. Raised while the registry is built.
    #[error("invalid handler mapping '{pattern}': {reason}")]
    Configuration { pattern: String, reason: String },

    /// A dispatch was attempted in a state where it is not allowed, such as
    /// forwarding after the response was committed.
    #[error("dispatch precondition failed: {0}")]
    Precondition(String),

    /// The invoked handler failed. Layers are already unwound.
    #[error("handler '{handler}' failed: {source}")]
    Handler {
        handler: String,
        #[source]
        source: HandlerError,
    },

    /// A handler failed to initialize or to be destroyed.
    #[error("handler '{handler}' failed during {phase}: {source}")]
    Lifecycle {
        handler: String,
        phase: LifecyclePhase,
        #[source]
        source: HandlerError,
    },
}

impl DispatchError {
    pub(crate) fn configuration(pattern: &str, reason: impl Into<String>) -> Self {
        DispatchError::Configuration {
            pattern: pattern.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_handler_error_display() {
        let err = HandlerError::msg("boom");
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_dispatch_error_exposes_source() {
        let err = DispatchError::Handler {
            handler: "index".to_string(),
            source: HandlerError::msg("boom"),
        };
        assert_eq!(err.to_string(), "handler 'index' failed: boom");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_lifecycle_error_names_phase() {
        let err = DispatchError::Lifecycle {
            handler: "jsp".to_string(),
            phase: LifecyclePhase::Destroy,
            source: HandlerError::msg("still busy"),
        };
        assert!(err.to_string().contains("during destroy"));
    }
}
