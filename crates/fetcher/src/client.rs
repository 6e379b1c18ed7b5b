//! HTTP client for the remote SOC API.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashboard_core::{LoginRequest, LoginResponse, Record, Resource, Session};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use telemetry::{health, metrics};
use tracing::{debug, warn};
use url::Url;

use crate::error::{FetchError, FetchResult};
use crate::source::{Action, ResourceSource};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const LOGIN_PATH: &str = "login";

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API base address, e.g. `http://localhost:3000` or `https://soc/api`.
    pub base_url: String,
    /// Bound on each request, connect to last body byte.
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Error body the API sends with rejected requests.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Remote API client.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base: Url,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> FetchResult<Self> {
        let mut raw = config.base_url.trim().to_string();
        // Url::join replaces the last segment unless the base ends in '/'
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let base = Url::parse(&raw)
            .map_err(|e| FetchError::InvalidBase(format!("{}: {}", config.base_url, e)))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(FetchError::InvalidBase(format!(
                "{}: unsupported scheme {}",
                config.base_url,
                base.scheme()
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| FetchError::Setup(e.to_string()))?;

        Ok(Self { base, http })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Absolute URL of an API path.
    pub fn url_for(&self, path: &str) -> FetchResult<Url> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| FetchError::InvalidBase(format!("{}: {}", path, e)))
    }

    async fn send(&self, name: &str, request: RequestBuilder) -> FetchResult<Response> {
        let response = request.send().await.map_err(|e| classify(name, e))?;
        check_status(name, response.status())?;
        Ok(response)
    }

    async fn read_records(
        &self,
        name: &str,
        request: RequestBuilder,
        single: bool,
    ) -> FetchResult<Vec<Record>> {
        let response = self.send(name, request).await?;
        let body: Value = response.json().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    resource: name.to_string(),
                }
            } else {
                FetchError::Decode {
                    resource: name.to_string(),
                    message: e.to_string(),
                }
            }
        })?;
        if single {
            parse_record(name, body).map(|record| vec![record])
        } else {
            parse_records(name, body)
        }
    }

    fn record_outcome<T>(&self, name: &str, result: &FetchResult<T>) {
        let api = &health().remote_api;
        match result {
            Ok(_) => api.set_healthy(),
            Err(e) => {
                metrics().fetch_failures.inc();
                if e.is_auth() {
                    metrics().auth_failures.inc();
                }
                warn!(resource = name, code = e.code(), error = %e, "API request failed");
                match e {
                    FetchError::Network { .. } | FetchError::Timeout { .. } => {
                        api.set_unhealthy(e.to_string())
                    }
                    FetchError::Status { status, .. } if *status >= 500 => {
                        api.set_unhealthy(e.to_string())
                    }
                    // The API answered, so it is reachable
                    _ => api.set_healthy(),
                }
            }
        }
    }
}

#[async_trait]
impl ResourceSource for ApiClient {
    async fn fetch(
        &self,
        resource: Resource,
        session: Option<&Session>,
    ) -> FetchResult<Vec<Record>> {
        let name = resource.path();
        // Per-user resources need the session to name their path
        let path = resource
            .path_for(session)
            .ok_or_else(|| FetchError::Unauthorized {
                resource: name.to_string(),
                status: 401,
            })?;
        let url = self.url_for(&path)?;

        let mut request = self.http.get(url);
        if let Some(session) = session {
            request = request.bearer_auth(session.token());
        }

        metrics().fetch_requests.inc();
        let started = Instant::now();
        let result = self.read_records(name, request, resource.is_single()).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        metrics().fetch_latency_ms.observe(elapsed_ms);
        self.record_outcome(name, &result);

        if let Ok(records) = &result {
            debug!(resource = name, count = records.len(), elapsed_ms, "Fetched resource");
        }
        result
    }

    async fn login(&self, request: &LoginRequest) -> FetchResult<LoginResponse> {
        let url = self.url_for(LOGIN_PATH)?;
        let response = self
            .http
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| classify(LOGIN_PATH, e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error.or(body.message))
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("login failed")
                        .to_string()
                });
            warn!(status = status.as_u16(), email = %request.email, "Login rejected by API");
            return Err(FetchError::LoginRejected {
                status: status.as_u16(),
                message,
            });
        }

        let login: LoginResponse = response.json().await.map_err(|e| FetchError::Decode {
            resource: LOGIN_PATH.to_string(),
            message: e.to_string(),
        })?;
        debug!(user_id = %login.user.id, role = %login.user.role, "Login accepted");
        Ok(login)
    }

    async fn post_action(&self, action: Action, session: Option<&Session>) -> FetchResult<()> {
        let name = action.path();
        let mut request = self.http.post(self.url_for(name)?);
        if let Some(session) = session {
            request = request.bearer_auth(session.token());
        }

        metrics().fetch_requests.inc();
        let result = self.send(name, request).await.map(|_| ());
        self.record_outcome(name, &result);
        result
    }

    fn is_healthy(&self) -> bool {
        health().remote_api.is_healthy()
    }
}

fn classify(name: &str, err: reqwest::Error) -> FetchError {
    let resource = name.to_string();
    if err.is_timeout() {
        FetchError::Timeout { resource }
    } else if err.is_decode() {
        FetchError::Decode {
            resource,
            message: err.to_string(),
        }
    } else {
        FetchError::Network {
            resource,
            message: err.to_string(),
        }
    }
}

fn check_status(name: &str, status: StatusCode) -> FetchResult<()> {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(FetchError::Unauthorized {
            resource: name.to_string(),
            status: status.as_u16(),
        });
    }
    if !status.is_success() {
        return Err(FetchError::Status {
            resource: name.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(())
}

/// Reads a response body that must be a JSON array of objects.
pub fn parse_records(name: &str, body: Value) -> FetchResult<Vec<Record>> {
    let items = match body {
        Value::Array(items) => items,
        other => {
            return Err(FetchError::Decode {
                resource: name.to_string(),
                message: format!("expected a JSON array, got {}", kind_of(&other)),
            })
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            Record::try_from(item).map_err(|other| FetchError::Decode {
                resource: name.to_string(),
                message: format!("element {} is {}, not an object", i, kind_of(&other)),
            })
        })
        .collect()
}

/// Reads a response body that must be a single JSON object.
pub fn parse_record(name: &str, body: Value) -> FetchResult<Record> {
    Record::try_from(body).map_err(|other| FetchError::Decode {
        resource: name.to_string(),
        message: format!("expected a JSON object, got {}", kind_of(&other)),
    })
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
