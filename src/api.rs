use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{info, warn};

use crate::error::{ApiError, AuthError, IngestError};
use crate::types::{
    AuthToken, ContestResult, Credentials, LastContestResponse, LoginResponse, SaveResultsRequest,
};

pub const LOGIN_PATH: &str = "/auth/login";
pub const LAST_CONTEST_PATH: &str = "/lotofacil/last";
pub const SAVE_RESULTS_PATH: &str = "/lotofacil/save-results";

/// Client for the results API. Every call is made once; nothing is retried.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, IngestError> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            IngestError::Configuration(format!("failed to build HTTP client: {}", e))
        })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Exchanges the configured identity for a bearer token.
    pub async fn login(&self, credentials: &Credentials) -> Result<AuthToken, AuthError> {
        info!("Logging in to results API");

        let response = self
            .client
            .post(self.url(LOGIN_PATH))
            .json(credentials)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "Login rejected");
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let login: LoginResponse = serde_json::from_str(&body)
            .map_err(|e| AuthError::MalformedResponse(e.to_string()))?;

        match login.access_token {
            Some(token) if !token.is_empty() => {
                info!("Login successful");
                Ok(AuthToken::new(token))
            }
            _ => Err(AuthError::MalformedResponse(
                "no access token in response".to_string(),
            )),
        }
    }

    /// Highest contest number the store already holds, or 0 when it holds none.
    pub async fn last_contest(&self, token: &AuthToken) -> Result<u32, ApiError> {
        let transport = |source| ApiError::Transport {
            endpoint: LAST_CONTEST_PATH,
            source,
        };

        let response = self
            .client
            .get(self.url(LAST_CONTEST_PATH))
            .bearer_auth(token.as_str())
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            info!("No results stored yet, importing every contest");
            return Ok(0);
        }

        let body = response.text().await.map_err(transport)?;
        if !status.is_success() {
            return Err(ApiError::Status {
                endpoint: LAST_CONTEST_PATH,
                status: status.as_u16(),
                body,
            });
        }

        let last: LastContestResponse =
            serde_json::from_str(&body).map_err(|e| ApiError::MalformedResponse {
                endpoint: LAST_CONTEST_PATH,
                reason: e.to_string(),
            })?;
        let last_contest = last.contest_number.unwrap_or(0);

        info!(last_contest, "Last stored contest retrieved");
        Ok(last_contest)
    }

    /// Posts one batch as `{ "results": [...] }`.
    pub async fn save_results(
        &self,
        token: &AuthToken,
        results: &[ContestResult],
    ) -> Result<(), ApiError> {
        let transport = |source| ApiError::Transport {
            endpoint: SAVE_RESULTS_PATH,
            source,
        };

        let response = self
            .client
            .post(self.url(SAVE_RESULTS_PATH))
            .bearer_auth(token.as_str())
            .json(&SaveResultsRequest { results })
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.map_err(transport)?;
            return Err(ApiError::Status {
                endpoint: SAVE_RESULTS_PATH,
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}
