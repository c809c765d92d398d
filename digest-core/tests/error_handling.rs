use digest_core::{
    ConfigError, CoreError, ErrorClass, ErrorExt, LlmError, RedditApiError, StorageError,
};
use std::time::Duration;

#[test]
fn test_error_codes() {
    let reddit_error = CoreError::RedditApi(RedditApiError::InvalidToken);
    assert_eq!(reddit_error.error_code(), "REDDIT_API");

    let storage_error = CoreError::Storage(StorageError::InvalidKey {
        key: "../x".to_string(),
    });
    assert_eq!(storage_error.error_code(), "STORAGE");

    let llm_error = CoreError::Llm(LlmError::InvalidApiKey {
        provider: "openai".to_string(),
    });
    assert_eq!(llm_error.error_code(), "LLM");

    assert_eq!(CoreError::not_found("digest").error_code(), "NOT_FOUND");
}

#[test]
fn test_error_classes() {
    let transient = CoreError::RedditApi(RedditApiError::RateLimitExceeded { retry_after: 60 });
    assert_eq!(transient.class(), ErrorClass::Transient);

    let provider_down = CoreError::Llm(LlmError::ServiceUnavailable {
        provider: "openai".to_string(),
    });
    assert!(provider_down.is_retryable());

    let upstream_5xx = CoreError::RequestFailed {
        message: "bad gateway".to_string(),
        status_code: Some(502),
    };
    assert_eq!(upstream_5xx.class(), ErrorClass::Transient);

    let permanent = CoreError::Config(ConfigError::MissingEnvironmentVariable {
        var_name: "REDDIT_CLIENT_ID".to_string(),
    });
    assert_eq!(permanent.class(), ErrorClass::Permanent);

    let bad_input = CoreError::invalid_input("no filtered posts");
    assert_eq!(bad_input.class(), ErrorClass::Permanent);

    let escaping_key = CoreError::Storage(StorageError::InvalidKey {
        key: "/etc/passwd".to_string(),
    });
    assert!(!escaping_key.is_retryable());

    let missing_community = CoreError::RedditApi(RedditApiError::SubredditNotFound {
        subreddit: "nope".to_string(),
    });
    assert_eq!(missing_community.class(), ErrorClass::Permanent);

    let revoked_token = CoreError::RedditApi(RedditApiError::InvalidToken);
    assert_eq!(revoked_token.class(), ErrorClass::Transient);
    assert_eq!(revoked_token.retry_after(), None);

    let bad_secret = CoreError::RedditApi(RedditApiError::AuthenticationFailed {
        reason: "invalid_client".to_string(),
    });
    assert_eq!(bad_secret.class(), ErrorClass::Permanent);
}

#[test]
fn test_retry_after_only_for_rate_limits() {
    let rate_limit_error =
        CoreError::RedditApi(RedditApiError::RateLimitExceeded { retry_after: 60 });
    assert_eq!(
        rate_limit_error.retry_after(),
        Some(Duration::from_secs(60))
    );

    let server_error = CoreError::RedditApi(RedditApiError::ServerError { status_code: 500 });
    assert_eq!(server_error.retry_after(), None);

    let auth_error = CoreError::RedditApi(RedditApiError::AuthenticationFailed {
        reason: "bad secret".to_string(),
    });
    assert_eq!(auth_error.retry_after(), None);
}

#[test]
fn test_user_friendly_messages() {
    let reddit_error = CoreError::RedditApi(RedditApiError::InvalidToken);
    assert!(reddit_error
        .user_friendly_message()
        .contains("rejected the application credentials"));

    let config_error = CoreError::Config(ConfigError::MissingEnvironmentVariable {
        var_name: "OPENAI_API_KEY".to_string(),
    });
    assert!(config_error
        .user_friendly_message()
        .contains("OPENAI_API_KEY"));

    let missing = CoreError::RedditApi(RedditApiError::SubredditNotFound {
        subreddit: "grok".to_string(),
    });
    assert_eq!(missing.user_friendly_message(), "r/grok does not exist.");
}
