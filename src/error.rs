// Error types shared by the library modules, plus the classifier that tells
// the narrowing loop which failures it may recover from.

use thiserror::Error;

/// Result alias used across the library layer.
pub type Result<T> = std::result::Result<T, LugachError>;

#[derive(Debug, Error)]
pub enum LugachError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Prompt error: {0}")]
    Prompt(#[from] dialoguer::Error),

    /// The retry budget ran out without a successful response.
    #[error("Remote service unavailable or authentication failed after {attempts} attempts")]
    RemoteUnavailable { attempts: u32 },

    /// The server rejected a search term for being too short.
    #[error("Search term too short: {message}")]
    QueryTooShort { message: String },

    #[error("Server answered {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("Unexpected data shape: {message}")]
    UnexpectedShape { message: String },

    #[error("Pagination exceeded the limit of {max_pages} pages")]
    PageLimitExceeded { max_pages: usize },

    #[error("The app name given ({name}) is not a known app")]
    UnknownApp { name: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },
}

impl LugachError {
    pub fn unexpected_shape<S: Into<String>>(message: S) -> Self {
        Self::UnexpectedShape {
            message: message.into(),
        }
    }

    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Decide whether the narrowing loop can retry the round that produced
    /// this error.
    pub fn classify(&self) -> ErrorClass {
        match self {
            Self::QueryTooShort { .. } => {
                ErrorClass::Recoverable("Too few characters, try again.".to_string())
            }
            _ => ErrorClass::Fatal,
        }
    }

    /// True when the user cancelled a prompt (Ctrl-C or end of input).
    pub fn is_interrupt(&self) -> bool {
        let io = match self {
            Self::Io(e) => e,
            Self::Prompt(dialoguer::Error::IO(e)) => e,
            _ => return false,
        };
        matches!(
            io.kind(),
            std::io::ErrorKind::Interrupted | std::io::ErrorKind::UnexpectedEof
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorClass {
    /// Show the message and retry the same round.
    Recoverable(String),
    Fatal,
}

/// Tagged result of one search step against a candidate source.
#[derive(Debug)]
pub enum SearchOutcome<C> {
    Candidates(Vec<C>),
    Recoverable(String),
    Fatal(LugachError),
}

impl<C> SearchOutcome<C> {
    pub fn from_result(result: Result<Vec<C>>) -> Self {
        match result {
            Ok(candidates) => Self::Candidates(candidates),
            Err(e) => match e.classify() {
                ErrorClass::Recoverable(message) => Self::Recoverable(message),
                ErrorClass::Fatal => Self::Fatal(e),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_too_short_is_recoverable() {
        let err = LugachError::QueryTooShort {
            message: "2 or more characters is required".into(),
        };
        assert!(matches!(err.classify(), ErrorClass::Recoverable(_)));
    }

    #[test]
    fn other_errors_are_fatal() {
        assert_eq!(
            LugachError::RemoteUnavailable { attempts: 3 }.classify(),
            ErrorClass::Fatal
        );
        assert_eq!(
            LugachError::unexpected_shape("two attendance rows").classify(),
            ErrorClass::Fatal
        );
    }

    #[test]
    fn search_outcome_tags_results() {
        let ok: SearchOutcome<u8> = SearchOutcome::from_result(Ok(vec![1, 2]));
        assert!(matches!(ok, SearchOutcome::Candidates(v) if v == vec![1, 2]));

        let short: SearchOutcome<u8> = SearchOutcome::from_result(Err(LugachError::QueryTooShort {
            message: "x".into(),
        }));
        assert!(matches!(short, SearchOutcome::Recoverable(_)));

        let fatal: SearchOutcome<u8> =
            SearchOutcome::from_result(Err(LugachError::config("missing key")));
        assert!(matches!(fatal, SearchOutcome::Fatal(LugachError::Config { .. })));
    }

    #[test]
    fn interrupted_prompt_is_detected() {
        let err = LugachError::Io(std::io::Error::new(std::io::ErrorKind::Interrupted, "^C"));
        assert!(err.is_interrupt());
        assert!(!LugachError::config("x").is_interrupt());
    }
}
