//! Classification and presentation of [`CoreError`]s.
//!
//! Retry decisions, log output and the messages the web front end shows all
//! go through [`ErrorExt`].

use crate::error::*;
use std::time::Duration;
use tracing::error;

/// How a stage should treat a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Network hiccups, timeouts, 429s and 5xx responses. Retried with backoff.
    Transient,
    /// Configuration, credentials and bad input. Fails fast.
    Permanent,
}

pub trait ErrorExt {
    fn class(&self) -> ErrorClass;
    fn retry_after(&self) -> Option<Duration>;
    fn user_friendly_message(&self) -> String;
    fn error_code(&self) -> &'static str;
    fn log_error(&self) -> &Self;

    fn is_retryable(&self) -> bool {
        self.class() == ErrorClass::Transient
    }
}

impl ErrorExt for CoreError {
    fn class(&self) -> ErrorClass {
        match self {
            CoreError::RedditApi(e) => e.class(),
            CoreError::Storage(e) => e.class(),
            CoreError::Llm(e) => e.class(),
            CoreError::Network(e) if !e.is_builder() && !e.is_decode() => ErrorClass::Transient,
            CoreError::RequestFailed {
                status_code: Some(429 | 500..=599),
                ..
            } => ErrorClass::Transient,
            _ => ErrorClass::Permanent,
        }
    }

    /// The delay the remote side asked for, if any.
    fn retry_after(&self) -> Option<Duration> {
        match self {
            CoreError::RedditApi(RedditApiError::RateLimitExceeded { retry_after })
            | CoreError::Llm(LlmError::RateLimitExceeded { retry_after, .. }) => {
                Some(Duration::from_secs(*retry_after))
            }
            _ => None,
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            CoreError::RedditApi(e) => reddit_message(e),
            CoreError::Llm(e) => llm_message(e),
            CoreError::Config(e) => config_message(e),
            CoreError::Storage(StorageError::InvalidKey { key }) => {
                format!("'{key}' is not a valid storage key.")
            }
            CoreError::Storage(StorageError::CorruptDocument { key, .. }) => {
                format!("Stored document '{key}' could not be parsed.")
            }
            CoreError::Storage(_) | CoreError::Io(_) => {
                "Digest storage could not be accessed.".to_string()
            }
            CoreError::Network(_) => "Network connection error.".to_string(),
            CoreError::InvalidInput { message } => format!("Invalid input: {message}"),
            CoreError::NotFound { resource } => format!("Could not find {resource}."),
            CoreError::RequestFailed { message, .. } => format!("Request failed: {message}"),
            CoreError::Serialization(_) => "A document could not be encoded.".to_string(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            CoreError::RedditApi(_) => "REDDIT_API",
            CoreError::Storage(_) => "STORAGE",
            CoreError::Llm(_) => "LLM",
            CoreError::Config(_) => "CONFIG",
            CoreError::Io(_) => "IO",
            CoreError::Serialization(_) => "SERIALIZATION",
            CoreError::Network(_) => "NETWORK",
            CoreError::InvalidInput { .. } => "INVALID_INPUT",
            CoreError::NotFound { .. } => "NOT_FOUND",
            CoreError::RequestFailed { .. } => "REQUEST_FAILED",
        }
    }

    fn log_error(&self) -> &Self {
        error!(
            code = self.error_code(),
            class = ?self.class(),
            "{}",
            self
        );
        self
    }
}

impl RedditApiError {
    pub fn class(&self) -> ErrorClass {
        match self {
            RedditApiError::RateLimitExceeded { .. }
            | RedditApiError::RequestTimeout
            | RedditApiError::InvalidResponse { .. } => ErrorClass::Transient,
            // The client drops a rejected token, so the next attempt re-authenticates.
            RedditApiError::InvalidToken => ErrorClass::Transient,
            RedditApiError::ServerError { status_code } if *status_code >= 500 => {
                ErrorClass::Transient
            }
            _ => ErrorClass::Permanent,
        }
    }
}

impl StorageError {
    pub fn class(&self) -> ErrorClass {
        match self {
            StorageError::WriteFailed { .. } | StorageError::ReadFailed { .. } => {
                ErrorClass::Transient
            }
            StorageError::InvalidKey { .. } | StorageError::CorruptDocument { .. } => {
                ErrorClass::Permanent
            }
        }
    }
}

impl LlmError {
    pub fn class(&self) -> ErrorClass {
        match self {
            LlmError::RateLimitExceeded { .. }
            | LlmError::ServiceUnavailable { .. }
            | LlmError::RequestTimeout { .. } => ErrorClass::Transient,
            _ => ErrorClass::Permanent,
        }
    }
}

fn reddit_message(e: &RedditApiError) -> String {
    match e {
        RedditApiError::AuthenticationFailed { .. } | RedditApiError::InvalidToken => {
            "Reddit rejected the application credentials.".to_string()
        }
        RedditApiError::RateLimitExceeded { retry_after } => {
            format!("Reddit is rate limiting requests; retry in {retry_after} seconds.")
        }
        RedditApiError::Forbidden { resource } => {
            format!("{resource} is private or quarantined.")
        }
        RedditApiError::SubredditNotFound { subreddit } => {
            format!("r/{subreddit} does not exist.")
        }
        _ => "Reddit could not be reached.".to_string(),
    }
}

fn llm_message(e: &LlmError) -> String {
    match e {
        LlmError::InvalidApiKey { provider } => format!("{provider} rejected the API key."),
        LlmError::RateLimitExceeded {
            provider,
            retry_after,
        } => format!("{provider} is rate limiting requests; retry in {retry_after} seconds."),
        LlmError::ModelNotAvailable { model } => format!("Model '{model}' is not available."),
        _ => "The summarization service could not produce a digest.".to_string(),
    }
}

fn config_message(e: &ConfigError) -> String {
    match e {
        ConfigError::FileNotFound { path } => format!("Configuration file '{path}' not found."),
        ConfigError::MissingField { field } => {
            format!("Required configuration field '{field}' is missing.")
        }
        ConfigError::InvalidValue { field, .. } => {
            format!("Invalid value for configuration field '{field}'.")
        }
        ConfigError::MissingEnvironmentVariable { var_name } => {
            format!("Environment variable '{var_name}' is required but not set.")
        }
        ConfigError::ValidationFailed { reason } => format!("Invalid configuration: {reason}."),
        ConfigError::Parse(_) => "The configuration file is not valid TOML.".to_string(),
    }
}
