//! LoggingMiddleware - logs all actions for debugging

use super::Middleware;
use std::fmt::Debug;

/// LoggingMiddleware - logs every action and the state it produced
///
/// Actions are logged at debug level, resulting states at trace level since
/// they can be large. The label distinguishes several stores in one log.
pub struct LoggingMiddleware {
    label: String,
}

impl LoggingMiddleware {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Default for LoggingMiddleware {
    fn default() -> Self {
        Self::new("store")
    }
}

impl<S: Debug, A: Debug> Middleware<S, A> for LoggingMiddleware {
    fn before_reduce(&self, _state: &S, action: &A) -> anyhow::Result<()> {
        log::debug!("[{}] Action: {:?}", self.label, action);
        Ok(())
    }

    fn after_reduce(&self, action: &A, next_state: &S) -> anyhow::Result<()> {
        log::trace!("[{}] State after {:?}: {:?}", self.label, action, next_state);
        Ok(())
    }

    fn name(&self) -> &str {
        "logging"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_middleware_passes_through() {
        let middleware = LoggingMiddleware::new("test");
        assert!(Middleware::<u8, &str>::before_reduce(&middleware, &1, &"tick").is_ok());
        assert!(Middleware::<u8, &str>::after_reduce(&middleware, &"tick", &2).is_ok());
        assert_eq!(Middleware::<u8, &str>::name(&middleware), "logging");
        assert_eq!(middleware.label(), "test");
    }
}
