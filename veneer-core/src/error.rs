// Error types for Veneer

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The API was used in a way it does not allow, e.g. setting data after
    /// the body was forced.
    #[error("Usage error: {0}")]
    Usage(String),

    /// Data has a shape the consumer cannot handle.
    #[error("Data shape error: {0}")]
    DataShape(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The response body stream lacks a capability required by the wrapper.
    #[error("Resource validation error: {0}")]
    ResourceValidation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl Error {
    /// Get the HTTP status code an unhandled error should surface as.
    ///
    /// Every failure raised here is a server-side problem: the data the
    /// application produced could not be rendered.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Usage(_)
            | Error::DataShape(_)
            | Error::Serialization(_)
            | Error::ResourceValidation(_)
            | Error::Io(_)
            | Error::Internal(_) => 500,
        }
    }

    /// Get the `http::StatusCode` for this error
    pub fn http_status(&self) -> http::StatusCode {
        http::StatusCode::from_u16(self.status_code())
            .unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Check if this is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        self.http_status().is_client_error()
    }

    /// Check if this is a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        self.http_status().is_server_error()
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
