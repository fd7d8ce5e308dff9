use std::path::Path;

use thiserror::Error;

/// Application-wide result type alias.
pub type Result<T> = std::result::Result<T, AppError>;

/// Process-level errors. Only these can end the session.
#[derive(Debug, Error)]
pub enum AppError {
    /// I/O errors outside the browsing core (terminal, log file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Terminal initialization or rendering errors.
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// Invalid path provided by the user.
    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

/// Failure of a collaborator call. Recovered at the view level.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// A listing or command failed (device set, `simctl`, permissions).
    #[error("{0}")]
    Fetch(String),

    /// A file or table became unreadable.
    #[error("cannot read {path}: {message}")]
    Read { path: String, message: String },

    /// A renderer cannot handle the payload.
    #[error("unsupported format: {0}")]
    Unsupported(String),
}

impl FetchError {
    pub fn read(path: &Path, err: impl std::fmt::Display) -> Self {
        FetchError::Read {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }

    pub fn unsupported(err: impl std::fmt::Display) -> Self {
        FetchError::Unsupported(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::Io(_)));
        assert!(app_err.to_string().contains("file not found"));
    }

    #[test]
    fn terminal_error_display() {
        let err = AppError::Terminal("failed to enter raw mode".into());
        assert_eq!(err.to_string(), "Terminal error: failed to enter raw mode");
    }

    #[test]
    fn invalid_path_error_display() {
        let err = AppError::InvalidPath("/nonexistent".into());
        assert_eq!(err.to_string(), "Invalid path: /nonexistent");
    }

    #[test]
    fn read_error_names_path() {
        let err = FetchError::read(Path::new("/tmp/a.db"), "permission denied");
        assert_eq!(err.to_string(), "cannot read /tmp/a.db: permission denied");
    }

    #[test]
    fn unsupported_error_display() {
        let err = FetchError::unsupported("rar");
        assert_eq!(err.to_string(), "unsupported format: rar");
    }
}
