use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, InnpulseError>;

#[derive(Debug, Error)]
pub enum InnpulseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    Invalid(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Failures talking to the backend, classified the way the console reports them
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApiError {
    /// Transport failure: DNS, refused connection, TLS, timeout
    #[error("Cannot reach server: {0}")]
    Network(String),

    #[error("Session expired, log in again")]
    Unauthorized,

    #[error("Not permitted: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unexpected response ({status}): {message}")]
    Status { status: u16, message: String },

    #[error("Malformed response: {0}")]
    Decode(String),

    /// The request could not be built, e.g. a bad base URL
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// Whether the failure means the server could not be reached at all
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else if err.is_builder() {
            Self::InvalidRequest(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<reqwest::Error> for InnpulseError {
    fn from(err: reqwest::Error) -> Self {
        Self::Api(err.into())
    }
}

impl InnpulseError {
    /// Whether an offline snapshot is a reasonable substitute for this failure
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Api(api) if api.is_network())
    }
}
