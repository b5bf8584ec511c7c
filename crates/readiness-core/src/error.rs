use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReadinessError {
    #[error("not initialized: run 'readiness init'")]
    NotInitialized,

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("assessment not found: {0}")]
    SessionNotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Caller-facing category of a [`ReadinessError`].
///
/// Validation, NotFound and Conflict are caller errors and never retried;
/// Internal covers configuration and I/O failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Internal,
}

impl ReadinessError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReadinessError::Validation(_) => ErrorKind::Validation,
            ReadinessError::SessionNotFound(_) => ErrorKind::NotFound,
            ReadinessError::Conflict(_) => ErrorKind::Conflict,
            ReadinessError::NotInitialized
            | ReadinessError::InvalidCatalog(_)
            | ReadinessError::Io(_)
            | ReadinessError::Yaml(_)
            | ReadinessError::Json(_) => ErrorKind::Internal,
        }
    }
}

pub type Result<T> = std::result::Result<T, ReadinessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_variants() {
        assert_eq!(
            ReadinessError::Validation("score".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            ReadinessError::SessionNotFound("abc".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            ReadinessError::Conflict("moved".into()).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(ReadinessError::NotInitialized.kind(), ErrorKind::Internal);
    }

    #[test]
    fn messages_name_the_subject() {
        let e = ReadinessError::SessionNotFound("1234".into());
        assert_eq!(e.to_string(), "assessment not found: 1234");
    }
}
