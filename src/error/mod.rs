use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the routef router
#[derive(Error, Debug)]
pub enum Error {
    #[error("parse error in pattern `{pattern}` at offset {offset}: {message}")]
    Parse {
        pattern: String,
        offset: usize,
        message: String,
    },

    #[error("invalid regex `{regex}` in pattern `{pattern}`: {source}")]
    Regex {
        pattern: String,
        regex: String,
        #[source]
        source: regex::Error,
    },

    #[error("parameter not found: {0}")]
    ParameterNotFound(String),

    #[error("parameter index out of range: {0}")]
    ParameterIndexOutOfRange(usize),

    #[error("unknown route name: {0}")]
    UnknownRoute(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("HTTP error: {0}")]
    Http(#[from] hyper::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn parse(pattern: impl Into<String>, offset: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            pattern: pattern.into(),
            offset,
            message: message.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Parse { .. } => "E_PARSE",
            Error::Regex { .. } => "E_REGEX",
            Error::ParameterNotFound(_) => "E_PARAM_NOT_FOUND",
            Error::ParameterIndexOutOfRange(_) => "E_PARAM_INDEX",
            Error::UnknownRoute(_) => "E_UNKNOWN_ROUTE",
            Error::Validation(_) => "E_VALIDATION",
            Error::Http(_) => "E_HTTP",
            Error::Json(_) => "E_JSON",
            Error::Io(_) => "E_IO",
            Error::Internal(_) => "E_INTERNAL",
        }
    }

    /// Get HTTP status code for the error
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Parse { .. } | Error::Regex { .. } | Error::Validation(_) => 400,
            _ => 500,
        }
    }
}
