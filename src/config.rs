//! Configuration for the OpenAI dispatch client

use serde::{Deserialize, Serialize};
use log::debug;

/// Production API endpoint
pub const OPENAI_API_BASE: &str
  = "https://api.openai.com/v1/";

/// Connect and read timeout applied to every call
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Environment variable holding the bearer credential
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig
{   /// Static bearer credential
    pub api_key: String
  , /// API base URL
    pub base_url: String
  , /// Connect and read timeout in seconds
    pub timeout_secs: u64
  , /// Log request lines and response status
    pub verbose: bool
}

impl ClientConfig
{   /// Create a configuration for the production endpoint
    pub fn new(api_key: impl Into<String>) -> Self
    {   ClientConfig
        {   api_key: api_key.into()
          , base_url: OPENAI_API_BASE.to_string()
          , timeout_secs: DEFAULT_TIMEOUT_SECS
          , verbose: cfg!(debug_assertions)
        }
    }

    /// Read the credential from `OPENAI_API_KEY`
    pub fn from_env() -> Result<Self, crate::error::Error>
    {   debug!("Reading API key from {}", API_KEY_ENV);
        match std::env::var(API_KEY_ENV)
        {   Ok(key) if !key.trim().is_empty() => Ok(Self::new(key))
          , _ => Err(crate::error::Error::MissingApiKey(
              API_KEY_ENV.to_string()
            ))
        }
    }

    /// Point the client at another server (mock servers in tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self
    {   self.base_url = base_url.into();
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self
    {   self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self
    {   self.verbose = verbose;
        self
    }

    /// Full URL for a path relative to the base URL
    pub fn endpoint(&self, path: &str) -> String
    {   format!(
          "{}/{}",
          self.base_url.trim_end_matches('/'),
          path.trim_start_matches('/')
        )
    }
}
