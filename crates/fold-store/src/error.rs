//! Error types for the store

use std::fmt;
use thiserror::Error;

/// Point in the reduction pipeline where application code failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    BeforeReduce,
    Reduce,
    Override,
    AfterReduce,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::BeforeReduce => "before_reduce",
            Stage::Reduce => "reduce",
            Stage::Override => "override hook",
            Stage::AfterReduce => "after_reduce",
        };
        f.write_str(name)
    }
}

/// Errors surfaced by the store.
///
/// Cloneable so a single terminal error can be handed to every subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The store was built outside a tokio runtime and no handle was given.
    #[error("no tokio runtime available to run the store")]
    NoRuntime,

    /// A middleware hook returned an error.
    #[error("middleware `{middleware}` failed in {stage}: {message}")]
    Middleware {
        stage: Stage,
        middleware: String,
        message: String,
    },

    /// Application code panicked inside the pipeline.
    #[error("panic in {stage}: {message}")]
    Panicked { stage: Stage, message: String },

    /// The action channel was closed and reopening it failed.
    #[error("action bus closed and could not be reopened")]
    BusClosed,

    /// The store stopped processing because of an earlier error.
    #[error("store halted: {0}")]
    Halted(Box<StoreError>),

    /// Forwarding of an action sequence was cancelled.
    #[error("action sequence forwarding was cancelled")]
    Cancelled,

    /// Configuration could not be read or parsed.
    #[error("invalid store config: {0}")]
    Config(String),
}

impl StoreError {
    /// Wrap an error as the reason a store halted, without nesting twice.
    pub fn halted(reason: StoreError) -> Self {
        match reason {
            StoreError::Halted(_) => reason,
            other => StoreError::Halted(Box::new(other)),
        }
    }

    /// Whether this error ends processing for the store that raised it.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, StoreError::Cancelled | StoreError::Config(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_halted_does_not_nest() {
        let once = StoreError::halted(StoreError::BusClosed);
        let twice = StoreError::halted(once.clone());
        assert_eq!(once, twice);
        assert_eq!(twice.to_string(), "store halted: action bus closed and could not be reopened");
    }

    #[test]
    fn test_middleware_error_display() {
        let err = StoreError::Middleware {
            stage: Stage::AfterReduce,
            middleware: "audit".to_string(),
            message: "disk full".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "middleware `audit` failed in after_reduce: disk full"
        );
    }

    #[test]
    fn test_cancelled_is_not_fatal() {
        assert!(!StoreError::Cancelled.is_fatal());
        assert!(StoreError::BusClosed.is_fatal());
    }
}
