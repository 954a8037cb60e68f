//! Authenticated TrainerCentral REST client.
//!
//! [`TrainerCentralClient`] is the explicit session context: settings, token
//! manager, HTTP client and the (possibly discovered) org id. It is shared
//! through an `Arc` by every resource API.

use reqwest::{multipart, Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::auth::TokenManager;
use crate::config::{DomainSource, Settings};
use crate::error::{TcError, TcResult};
use crate::utils::HttpClient;

/// HTML document uploaded as lesson material
#[derive(Debug, Clone)]
pub struct HtmlUpload {
    /// Label shown in TrainerCentral; the file is sent as `{label}.html`
    pub label: String,
    pub html: String,
    pub view_type: u8,
}

impl HtmlUpload {
    fn to_form(&self) -> TcResult<multipart::Form> {
        let part = multipart::Part::bytes(self.html.clone().into_bytes())
            .file_name(format!("{}.html", self.label))
            .mime_str("text/html")
            .map_err(|e| TcError::validation(format!("invalid upload: {}", e)))?;

        Ok(multipart::Form::new()
            .part("file", part)
            .text("viewType", self.view_type.to_string())
            .text("label", self.label.clone()))
    }
}

/// Shared session context for every TrainerCentral call
#[derive(Debug)]
pub struct TrainerCentralClient {
    settings: Settings,
    tokens: TokenManager,
    http: HttpClient,
    discovered_org_id: Mutex<Option<String>>,
}

impl TrainerCentralClient {
    /// Build the client. Fails with a configuration error before any network
    /// activity if the settings carry no usable identity.
    pub fn new(settings: Settings) -> TcResult<Self> {
        settings.validate()?;
        let http = HttpClient::new(Duration::from_secs(settings.timeout_secs))?;
        Ok(Self::with_http(settings, http))
    }

    pub fn with_http(settings: Settings, http: HttpClient) -> Self {
        let tokens = TokenManager::new(&settings, http.clone());
        Self {
            settings,
            tokens,
            http,
            discovered_org_id: Mutex::new(None),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    /// Effective TrainerCentral domain and where it came from
    pub async fn domain(&self) -> (String, DomainSource) {
        let token_api_domain = self.tokens.current_api_domain().await;
        self.settings.resolve_domain(token_api_domain.as_deref())
    }

    /// Configured org id, or the first portal listed by `{domain}/portals.json`
    pub async fn org_id(&self) -> TcResult<String> {
        if let Some(id) = &self.settings.org_id {
            return Ok(id.clone());
        }

        let mut cached = self.discovered_org_id.lock().await;
        if let Some(id) = cached.as_ref() {
            return Ok(id.clone());
        }

        let token = self.tokens.get_valid_access_token().await?;
        let (domain, _) = self.domain().await;
        let url = format!("{}/portals.json", domain);
        tracing::debug!("Org id not configured, looking it up at {}", url);

        let portals = self
            .send_authorized(&url, token, |c, u| Ok(c.get(u)))
            .await
            .map_err(|e| match e {
                TcError::Upstream { .. } | TcError::UnexpectedResponse(_) => {
                    TcError::Configuration(format!(
                        "TRAINERCENTRAL_ORG_ID is not set and portals.json lookup failed: {}",
                        e
                    ))
                }
                other => other,
            })?;

        let id = first_portal_id(&portals).ok_or_else(|| {
            TcError::Configuration(
                "TRAINERCENTRAL_ORG_ID is not set and portals.json lists no portal".to_string(),
            )
        })?;

        tracing::info!(org_id = %id, "Discovered TrainerCentral org id");
        *cached = Some(id.clone());
        Ok(id)
    }

    /// `{domain}/api/v4/{org_id}`
    pub async fn base_url(&self) -> TcResult<String> {
        let org_id = self.org_id().await?;
        let (domain, source) = self.domain().await;
        tracing::trace!(?source, "Resolved TrainerCentral domain {}", domain);
        Ok(format!("{}/api/v4/{}", domain, org_id))
    }

    /// GET `{base}/{path}` with optional query parameters
    pub async fn get(&self, path: &str, query: &[(&str, String)]) -> TcResult<Value> {
        self.call(path, |c, u| Ok(c.get(u).query(query))).await
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> TcResult<Value> {
        self.call(path, |c, u| Ok(c.post(u).json(body))).await
    }

    /// POST with a JSON body and query parameters (`?type=3` on test forms)
    pub async fn post_json_with_query(
        &self,
        path: &str,
        query: &[(&str, String)],
        body: &Value,
    ) -> TcResult<Value> {
        self.call(path, |c, u| Ok(c.post(u).query(query).json(body)))
            .await
    }

    pub async fn put_json(&self, path: &str, body: &Value) -> TcResult<Value> {
        self.call(path, |c, u| Ok(c.put(u).json(body))).await
    }

    pub async fn delete(&self, path: &str) -> TcResult<Value> {
        self.call(path, |c, u| Ok(c.delete(u))).await
    }

    /// Multipart POST; the form is rebuilt if the request has to be retried
    pub async fn post_multipart(&self, path: &str, upload: &HtmlUpload) -> TcResult<Value> {
        self.call(path, |c, u| Ok(c.post(u).multipart(upload.to_form()?)))
            .await
    }

    /// GET a link returned by the API. Relative links are resolved against the domain.
    pub async fn get_link(&self, link: &str) -> TcResult<Value> {
        let token = self.tokens.get_valid_access_token().await?;
        let url = if link.starts_with("http://") || link.starts_with("https://") {
            link.to_string()
        } else {
            let (domain, _) = self.domain().await;
            format!("{}/{}", domain, link.trim_start_matches('/'))
        };
        self.send_authorized(&url, token, |c, u| Ok(c.get(u))).await
    }

    async fn call<F>(&self, path: &str, build: F) -> TcResult<Value>
    where
        F: Fn(&Client, &str) -> TcResult<RequestBuilder> + Send + Sync,
    {
        // token first: a refresh may change the domain
        let token = self.tokens.get_valid_access_token().await?;
        let url = format!("{}/{}", self.base_url().await?, path);
        self.send_authorized(&url, token, build).await
    }

    /// Send once; on 401 refresh the token and send exactly one more time.
    async fn send_authorized<F>(&self, url: &str, token: String, build: F) -> TcResult<Value>
    where
        F: Fn(&Client, &str) -> TcResult<RequestBuilder> + Send + Sync,
    {
        let response = self.send_once(url, &token, &build).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Self::into_json(url, response).await;
        }

        let token = self.tokens.refresh_rejected(&token).await?;
        let response = self.send_once(url, &token, &build).await?;
        Self::into_json(url, response).await
    }

    async fn send_once<F>(&self, url: &str, token: &str, build: &F) -> TcResult<Response>
    where
        F: Fn(&Client, &str) -> TcResult<RequestBuilder> + Send + Sync,
    {
        let request = build(self.http.client(), url)?.bearer_auth(token);
        let response = request.send().await?;
        tracing::debug!(status = %response.status(), "TrainerCentral {}", url);
        Ok(response)
    }

    async fn into_json(url: &str, response: Response) -> TcResult<Value> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "TrainerCentral call failed: {}", url);
            return Err(TcError::Upstream {
                status: status.as_u16(),
                message: if body.trim().is_empty() {
                    status.canonical_reason().unwrap_or("no body").to_string()
                } else {
                    body
                },
            });
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).map_err(|e| {
            TcError::UnexpectedResponse(format!("{} returned invalid JSON: {}", url, e))
        })
    }
}

fn first_portal_id(portals: &Value) -> Option<String> {
    let first = portals.get("portals")?.as_array()?.first()?;
    match first.get("id")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
