use digest_core::{CoreError, RedditApiError, RedditCredentials};
use oauth2::basic::BasicClient;
use oauth2::http::{HeaderValue, Method};
use oauth2::{
    AuthUrl, ClientId, ClientSecret, HttpRequest, HttpResponse, TokenResponse, TokenUrl,
};
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

pub const REDDIT_AUTH_URL: &str = "https://www.reddit.com/api/v1/authorize";
pub const REDDIT_TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";

/// Tokens are refreshed this long before the server says they expire.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(3600);

/// A bearer token for application-only access.
#[derive(Debug, Clone)]
pub struct AppToken {
    secret: String,
    expires_at: Instant,
}

impl AppToken {
    pub fn new(secret: String, lifetime: Duration) -> Self {
        Self {
            secret,
            expires_at: Instant::now() + lifetime.saturating_sub(EXPIRY_MARGIN),
        }
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Client-credentials grant against the token endpoint.
#[derive(Debug, Clone)]
pub struct AppAuthenticator {
    oauth_client: BasicClient,
    http_client: Client,
    token_url: String,
}

impl AppAuthenticator {
    pub fn new(credentials: &RedditCredentials) -> Result<Self, CoreError> {
        Self::with_token_url(credentials, REDDIT_TOKEN_URL)
    }

    pub fn with_token_url(
        credentials: &RedditCredentials,
        token_url: &str,
    ) -> Result<Self, CoreError> {
        let auth_url = AuthUrl::new(REDDIT_AUTH_URL.to_string()).map_err(invalid_url)?;
        let token_url_string = token_url.to_string();
        let token_url = TokenUrl::new(token_url_string.clone()).map_err(invalid_url)?;

        let oauth_client = BasicClient::new(
            ClientId::new(credentials.client_id.clone()),
            Some(ClientSecret::new(credentials.client_secret.clone())),
            auth_url,
            Some(token_url),
        );

        // The token endpoint rejects requests without a descriptive user agent.
        let http_client = Client::builder()
            .user_agent(&credentials.user_agent)
            .timeout(Duration::from_secs(30))
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            oauth_client,
            http_client,
            token_url: token_url_string,
        })
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    pub async fn authenticate(&self) -> Result<AppToken, CoreError> {
        debug!("Requesting application token");
        let http_client = self.http_client.clone();
        let response = self
            .oauth_client
            .exchange_client_credentials()
            .request_async(|request| send_token_request(http_client, request))
            .await
            .map_err(|e| {
                error!("Application token request failed: {}", e);
                CoreError::RedditApi(RedditApiError::AuthenticationFailed {
                    reason: e.to_string(),
                })
            })?;

        let lifetime = response.expires_in().unwrap_or(DEFAULT_TOKEN_LIFETIME);
        info!("Obtained application token valid for {:?}", lifetime);
        Ok(AppToken::new(
            response.access_token().secret().to_string(),
            lifetime,
        ))
    }
}

async fn send_token_request(
    http_client: Client,
    request: HttpRequest,
) -> Result<HttpResponse, reqwest::Error> {
    let method = if request.method == Method::GET {
        reqwest::Method::GET
    } else {
        reqwest::Method::POST
    };

    let mut builder = http_client
        .request(method, request.url.as_str())
        .body(request.body);
    for (name, value) in request.headers.iter() {
        builder = builder.header(name.as_str(), value.as_bytes());
    }

    let response = builder.send().await?;
    let status_code = response.status().as_u16();
    let mut headers = oauth2::http::HeaderMap::new();
    for (name, value) in response.headers().iter() {
        if let (Ok(name), Ok(value)) = (
            oauth2::http::header::HeaderName::from_bytes(name.as_str().as_bytes()),
            HeaderValue::from_bytes(value.as_bytes()),
        ) {
            headers.append(name, value);
        }
    }
    let body = response.bytes().await?.to_vec();

    Ok(HttpResponse {
        status_code: oauth2::http::StatusCode::from_u16(status_code)
            .unwrap_or(oauth2::http::StatusCode::INTERNAL_SERVER_ERROR),
        headers,
        body,
    })
}

fn invalid_url(e: oauth2::url::ParseError) -> CoreError {
    CoreError::RedditApi(RedditApiError::AuthenticationFailed {
        reason: format!("invalid OAuth endpoint: {e}"),
    })
}
