//! REST backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use fund_core::backend_errors::{DEFAULT_FALLBACK, parse_backend_errors};
use fund_core::{
    ApiConfig, ApiError, Campaign, Cause, FundraisingApi, NewCause, NewProject, PageQuery,
    Paginated, Project, ProjectBeneficiary, ProjectFilter, ProjectUpdate, UserProfile,
};

/// Request fields the backend may report validation errors against.
const KNOWN_FIELDS: &[&str] = &[
    "name",
    "img",
    "icon",
    "causes",
    "causes_names",
    "target",
    "campaign_limit",
    "city",
    "country",
    "description",
    "status",
];

/// Maps an unsuccessful response to an [`ApiError`].
fn error_for_status(
    status: StatusCode,
    body: Option<&Value>,
) -> ApiError {
    match status {
        StatusCode::NOT_FOUND => ApiError::NotFound,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            let errors = parse_backend_errors(body, &[], "Authentication required.");
            ApiError::Unauthorized(errors.to_string())
        }
        StatusCode::BAD_REQUEST => {
            ApiError::Validation(parse_backend_errors(body, KNOWN_FIELDS, DEFAULT_FALLBACK))
        }
        other => {
            let message = match body {
                Some(body) => parse_backend_errors(Some(body), &[], DEFAULT_FALLBACK).to_string(),
                None => other
                    .canonical_reason()
                    .unwrap_or(DEFAULT_FALLBACK)
                    .to_string(),
            };
            ApiError::Http {
                status: other.as_u16(),
                message,
            }
        }
    }
}

fn transport(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::Transport(format!("request timed out: {e}"))
    } else {
        ApiError::Transport(e.to_string())
    }
}

/// [`FundraisingApi`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: Url,
}

impl HttpClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        // Trailing slash so relative joins append instead of replacing the
        // last path segment.
        let base = format!("{}/", config.base_url.trim_end_matches('/'));
        let base_url = Url::parse(&base).map_err(|e| {
            ApiError::Configuration(format!("invalid base URL '{}': {e}", config.base_url))
        })?;

        let mut headers = HeaderMap::new();
        if let Some(token) = &config.token {
            let value = HeaderValue::from_str(&format!("Token {token}"))
                .map_err(|e| ApiError::Configuration(format!("invalid token: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(format!("fundraise/{}", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::Configuration(format!("failed to create HTTP client: {e}")))?;

        info!(
            base_url = %base_url,
            timeout_ms = config.timeout_ms,
            authenticated = config.token.is_some(),
            "created API client"
        );

        Ok(Self { client, base_url })
    }

    fn endpoint(
        &self,
        path: &str,
    ) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::Configuration(format!("failed to construct URL '{path}': {e}")))
    }

    async fn check(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        let body = serde_json::from_str::<Value>(&text).ok();
        let error = error_for_status(status, body.as_ref());
        warn!(status = status.as_u16(), error = %error, "API request failed");
        Err(error)
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = Self::check(request.send().await.map_err(transport)?).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn execute(
        &self,
        request: RequestBuilder,
    ) -> Result<(), ApiError> {
        Self::check(request.send().await.map_err(transport)?).await?;
        Ok(())
    }
}

#[async_trait]
impl FundraisingApi for HttpClient {
    async fn list_projects(
        &self,
        page: PageQuery,
        filter: &ProjectFilter,
    ) -> Result<Paginated<Project>, ApiError> {
        let url = self.endpoint("projects/")?;
        let mut query: Vec<(&str, String)> = vec![
            ("limit", page.limit().to_string()),
            ("offset", page.offset().to_string()),
        ];
        query.extend(filter.query_pairs());
        debug!(url = %url, ?query, "listing projects");
        self.fetch(self.client.get(url).query(&query)).await
    }

    async fn get_project(&self, id: i64) -> Result<Project, ApiError> {
        let url = self.endpoint(&format!("projects/{id}/"))?;
        debug!(url = %url, "fetching project");
        self.fetch(self.client.get(url)).await
    }

    async fn create_project(&self, project: &NewProject) -> Result<Project, ApiError> {
        let url = self.endpoint("projects/")?;
        debug!(url = %url, name = %project.name, "creating project");
        let created: Project = self.fetch(self.client.post(url).json(project)).await?;
        info!(id = created.id, name = %created.name, "project created");
        Ok(created)
    }

    async fn update_project(&self, id: i64, update: &ProjectUpdate) -> Result<Project, ApiError> {
        let url = self.endpoint(&format!("projects/{id}/"))?;
        debug!(url = %url, "patching project");
        self.fetch(self.client.patch(url).json(update)).await
    }

    async fn delete_project(&self, id: i64) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("projects/{id}/"))?;
        debug!(url = %url, "deleting project");
        self.execute(self.client.delete(url)).await
    }

    async fn list_project_beneficiaries(
        &self,
        project_id: i64,
    ) -> Result<Vec<ProjectBeneficiary>, ApiError> {
        let url = self.endpoint(&format!("projects/{project_id}/assignments/"))?;
        self.fetch(self.client.get(url)).await
    }

    async fn list_project_campaigns(&self, project_id: i64) -> Result<Vec<Campaign>, ApiError> {
        let url = self.endpoint(&format!("projects/{project_id}/campaigns/"))?;
        self.fetch(self.client.get(url)).await
    }

    async fn list_causes(&self) -> Result<Vec<Cause>, ApiError> {
        let url = self.endpoint("causes/")?;
        self.fetch(self.client.get(url)).await
    }

    async fn get_cause(&self, id: i64) -> Result<Cause, ApiError> {
        let url = self.endpoint(&format!("causes/{id}/"))?;
        self.fetch(self.client.get(url)).await
    }

    async fn create_cause(&self, cause: &NewCause) -> Result<Cause, ApiError> {
        let url = self.endpoint("causes/")?;
        debug!(url = %url, name = %cause.name, "creating cause");
        self.fetch(self.client.post(url).json(cause)).await
    }

    async fn update_cause(&self, id: i64, cause: &NewCause) -> Result<Cause, ApiError> {
        let url = self.endpoint(&format!("causes/{id}/"))?;
        self.fetch(self.client.patch(url).json(cause)).await
    }

    async fn delete_cause(&self, id: i64) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("causes/{id}/"))?;
        self.execute(self.client.delete(url)).await
    }

    async fn current_user(&self) -> Result<UserProfile, ApiError> {
        let url = self.endpoint("auth/user/")?;
        self.fetch(self.client.get(url)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn client(base_url: &str) -> HttpClient {
        HttpClient::new(&ApiConfig {
            base_url: base_url.to_string(),
            ..ApiConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn endpoints_are_relative_to_base_path() {
        for base in ["http://localhost:8000/api", "http://localhost:8000/api/"] {
            let c = client(base);
            assert_eq!(
                c.endpoint("projects/7/").unwrap().as_str(),
                "http://localhost:8000/api/projects/7/"
            );
        }
    }

    #[test]
    fn invalid_base_url_is_a_configuration_error() {
        let result = HttpClient::new(&ApiConfig {
            base_url: "::nope".to_string(),
            ..ApiConfig::default()
        });
        assert!(matches!(result, Err(ApiError::Configuration(_))));
    }

    #[test]
    fn token_with_newline_is_rejected() {
        let result = HttpClient::new(&ApiConfig {
            token: Some("abc\ndef".to_string()),
            ..ApiConfig::default()
        });
        assert!(matches!(result, Err(ApiError::Configuration(_))));
    }

    #[test]
    fn bad_request_becomes_validation_error() {
        let body = json!({"name": ["This field may not be blank."], "detail": "Bad."});
        let error = error_for_status(StatusCode::BAD_REQUEST, Some(&body));

        let errors = error.backend_errors().unwrap();
        assert_eq!(errors.field("name"), Some("This field may not be blank."));
        assert_eq!(errors.non_field_error.as_deref(), Some("Bad."));
    }

    #[test]
    fn auth_failures_carry_detail() {
        let body = json!({"detail": "Invalid token."});
        assert_eq!(
            error_for_status(StatusCode::UNAUTHORIZED, Some(&body)),
            ApiError::Unauthorized("Invalid token.".to_string())
        );
        assert_eq!(
            error_for_status(StatusCode::FORBIDDEN, None),
            ApiError::Unauthorized("Authentication required.".to_string())
        );
    }

    #[test]
    fn not_found_and_server_errors() {
        assert_eq!(error_for_status(StatusCode::NOT_FOUND, None), ApiError::NotFound);
        assert_eq!(
            error_for_status(StatusCode::BAD_GATEWAY, None),
            ApiError::Http {
                status: 502,
                message: "Bad Gateway".to_string()
            }
        );
    }

    #[tokio::test]
    async fn unreachable_server_is_a_transport_error() {
        // Port 9 (discard) is closed on test machines.
        let c = client("http://127.0.0.1:9/api");
        let result = c.list_causes().await;
        assert!(matches!(result, Err(ApiError::Transport(_))), "{result:?}");
    }
}
