use thiserror::Error;

/// Error type for every action dispatch
/// Implements Clone for sending through reply channels
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error
{   /// Request parameters rejected before any network call
    #[error("Validation error: {0}")]
    Validation(String)
  , /// API returned a non-success status
    #[error("HTTP error {status}: {body}")]
    Http
    {   status: u16
      , body: String
    }
  , /// No response received (connect, timeout, DNS, TLS)
    #[error("Transport error: {0}")]
    Transport(String)
  , /// Failed to parse API response
    #[error("Parse error: {0}")]
    Parse(String)
  , /// File attached to a multipart action could not be read
    #[error("File error: {0}")]
    File(String)
  , /// API key is missing
    #[error("Missing API key: {0}")]
    MissingApiKey(String)
  , /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String)
  , /// Client task is no longer running
    #[error("Client disconnected")]
    Disconnected
}

impl Error
{   /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16>
    {   match self
        {   Error::Http { status, .. } => Some(*status)
          , _ => None
        }
    }
}
