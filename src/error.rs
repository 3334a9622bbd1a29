use thiserror::Error;

/// Message shown to users in place of raw numeric failures.
pub const USER_FACING_MESSAGE: &str = "Cannot compute projection with current data";

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Percent change undefined: baseline {0} is zero")]
    DivisionUndefined(&'static str),
    #[error("Simulation cancelled after {completed} of {requested} trials")]
    Cancelled { completed: usize, requested: usize },
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Error while reading input: {0}")]
    Io(#[from] std::io::Error),
    #[error("Error while parsing input: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    /// Text a presentation layer can surface without leaking NaN or
    /// division details. Cancellation is reported as-is.
    pub fn user_message(&self) -> String {
        match self {
            Self::Cancelled { .. } => "Simulation cancelled".to_string(),
            Self::NotFound(what) => format!("Not found: {what}"),
            _ => USER_FACING_MESSAGE.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

impl From<EngineError> for String {
    fn from(e: EngineError) -> Self {
        e.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_hides_numeric_errors() {
        let err = EngineError::DivisionUndefined("ebitda");
        assert_eq!(err.user_message(), USER_FACING_MESSAGE);
        assert!(err.to_string().contains("ebitda"));

        let err = EngineError::InvalidInput("scenario list is empty".into());
        assert_eq!(err.user_message(), USER_FACING_MESSAGE);
    }

    #[test]
    fn test_cancelled_message() {
        let err = EngineError::Cancelled { completed: 10, requested: 100 };
        assert_eq!(err.user_message(), "Simulation cancelled");
        assert_eq!(err.to_string(), "Simulation cancelled after 10 of 100 trials");
    }
}
