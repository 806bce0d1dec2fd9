use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    /// Network failure talking to the API.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("OAuth error: {0}")]
    OAuth(String),

    /// A live stream failed mid-flight and was torn down.
    #[error("Stream fault: {message}")]
    StreamFault {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Configuration error: {message}")]
    ConfigError {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, BotError>;

impl BotError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    pub fn stream_fault(message: impl Into<String>) -> Self {
        Self::StreamFault {
            message: message.into(),
            source: None,
        }
    }

    pub fn stream_fault_with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::StreamFault {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
            source: None,
        }
    }

    pub fn config_error_with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::ConfigError {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Short label used for error metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Http(_) => "http",
            Self::Api { .. } => "api",
            Self::Json(_) => "json",
            Self::OAuth(_) => "oauth",
            Self::StreamFault { .. } => "stream",
            Self::ConfigError { .. } => "config",
            Self::Other(_) => "other",
        }
    }
}

impl From<toml::de::Error> for BotError {
    fn from(error: toml::de::Error) -> Self {
        Self::config_error_with_source("Failed to parse configuration", error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;
    use std::fmt;

    #[derive(Debug)]
    struct TestError(String);

    impl fmt::Display for TestError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    impl Error for TestError {}

    #[test]
    fn test_stream_fault() {
        let error = BotError::stream_fault("test error");
        assert!(matches!(error, BotError::StreamFault { message, source }
            if message == "test error" && source.is_none()));

        let source = TestError("source error".to_string());
        let error = BotError::stream_fault_with_source("test error", source);
        assert!(matches!(error, BotError::StreamFault { message, source: Some(_) }
            if message == "test error"));
    }

    #[test]
    fn test_config_error() {
        let error = BotError::config_error("test error");
        assert!(matches!(error, BotError::ConfigError { message, source }
            if message == "test error" && source.is_none()));

        let source = TestError("source error".to_string());
        let error = BotError::config_error_with_source("test error", source);
        assert!(matches!(error, BotError::ConfigError { message, source: Some(_) }
            if message == "test error"));
    }

    #[test]
    fn test_error_conversion() {
        let anyhow_error = anyhow::anyhow!("test error");
        let error: BotError = anyhow_error.into();
        assert!(matches!(error, BotError::Other(_)));

        let json_error = serde_json::from_str::<u64>("nope").unwrap_err();
        let error: BotError = json_error.into();
        assert_eq!(error.kind(), "json");

        let toml_error = toml::from_str::<toml::Table>("= broken").unwrap_err();
        let error: BotError = toml_error.into();
        assert!(matches!(error, BotError::ConfigError { source: Some(_), .. }));
    }

    #[test]
    fn test_error_display() {
        let error = BotError::api(429, "Rate limit exceeded");
        assert_eq!(error.to_string(), "API error 429: Rate limit exceeded");

        let error = BotError::stream_fault("test error");
        assert_eq!(error.to_string(), "Stream fault: test error");

        let error = BotError::config_error("test error");
        assert_eq!(error.to_string(), "Configuration error: test error");

        let error = BotError::OAuth("bad key".to_string());
        assert_eq!(error.to_string(), "OAuth error: bad key");
    }
}
