//! OAuth discovery endpoints.
//!
//! MCP clients that speak the authorization flow fetch these documents to find
//! out which authorization server issues tokens for this resource. Zoho's own
//! well-known documents cannot be extended, so the relevant fields are mirrored
//! here and point at the Zoho endpoints.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::auth::TRAINERCENTRAL_SCOPES;
use crate::config::Settings;

/// Protected-resource metadata (RFC 9728)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProtectedResourceMetadata {
    pub resource: String,
    pub authorization_servers: Vec<String>,
    pub scopes_supported: Vec<String>,
    pub bearer_methods_supported: Vec<String>,
    pub resource_documentation: String,
}

/// Authorization-server metadata (RFC 8414) mirroring Zoho
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationServerMetadata {
    pub issuer: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub scopes_supported: Vec<String>,
    pub response_types_supported: Vec<String>,
    pub grant_types_supported: Vec<String>,
    pub code_challenge_methods_supported: Vec<String>,
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    version: &'static str,
}

/// Documents served by the discovery router
#[derive(Debug, Clone)]
pub struct Discovery {
    resource_base_url: String,
    accounts_url: String,
}

impl Discovery {
    pub fn new(resource_base_url: impl Into<String>, accounts_url: impl Into<String>) -> Self {
        Self {
            resource_base_url: resource_base_url.into().trim_end_matches('/').to_string(),
            accounts_url: accounts_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(&settings.resource_base_url, &settings.accounts_url)
    }

    pub fn protected_resource(&self) -> ProtectedResourceMetadata {
        ProtectedResourceMetadata {
            resource: self.resource_base_url.clone(),
            authorization_servers: vec![self.accounts_url.clone()],
            scopes_supported: scopes(),
            bearer_methods_supported: vec!["header".to_string()],
            resource_documentation: format!("{}/docs", self.resource_base_url),
        }
    }

    pub fn authorization_server(&self) -> AuthorizationServerMetadata {
        AuthorizationServerMetadata {
            issuer: self.accounts_url.clone(),
            authorization_endpoint: format!("{}/oauth/v2/auth", self.accounts_url),
            token_endpoint: format!("{}/oauth/v2/token", self.accounts_url),
            scopes_supported: scopes(),
            response_types_supported: vec!["code".to_string()],
            grant_types_supported: vec![
                "authorization_code".to_string(),
                "refresh_token".to_string(),
            ],
            code_challenge_methods_supported: vec!["S256".to_string()],
        }
    }

    /// Router with the well-known documents and a health check
    pub fn router(self) -> Router {
        Router::new()
            .route(
                "/.well-known/oauth-protected-resource",
                get(protected_resource),
            )
            .route(
                "/.well-known/oauth-authorization-server",
                get(authorization_server),
            )
            // OIDC clients get the same document
            .route(
                "/.well-known/openid-configuration",
                get(authorization_server),
            )
            .route("/healthz", get(healthz))
            .with_state(Arc::new(self))
    }

    /// Bind `addr` and serve until the task is dropped
    pub async fn serve(self, addr: SocketAddr) -> std::io::Result<()> {
        let app = self.router();
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!(addr = %addr, "Serving OAuth discovery metadata");
        axum::serve(listener, app).await
    }
}

fn scopes() -> Vec<String> {
    TRAINERCENTRAL_SCOPES.iter().map(|s| s.to_string()).collect()
}

async fn protected_resource(State(d): State<Arc<Discovery>>) -> Json<ProtectedResourceMetadata> {
    Json(d.protected_resource())
}

async fn authorization_server(
    State(d): State<Arc<Discovery>>,
) -> Json<AuthorizationServerMetadata> {
    Json(d.authorization_server())
}

async fn healthz() -> Json<Health> {
    Json(Health {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    fn discovery() -> Discovery {
        Discovery::new("https://mcp.example.com/", "https://accounts.zoho.eu")
    }

    async fn get_json(uri: &str) -> (StatusCode, Value) {
        let resp = discovery()
            .router()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    #[tokio::test]
    async fn test_protected_resource_points_at_zoho() {
        let (status, body) = get_json("/.well-known/oauth-protected-resource").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["resource"], "https://mcp.example.com");
        assert_eq!(body["authorization_servers"][0], "https://accounts.zoho.eu");
        assert_eq!(
            body["scopes_supported"].as_array().unwrap().len(),
            TRAINERCENTRAL_SCOPES.len()
        );
    }

    #[tokio::test]
    async fn test_authorization_server_and_openid_match() {
        let (_, oauth) = get_json("/.well-known/oauth-authorization-server").await;
        let (_, oidc) = get_json("/.well-known/openid-configuration").await;
        assert_eq!(oauth, oidc);
        assert_eq!(oauth["issuer"], "https://accounts.zoho.eu");
        assert_eq!(
            oauth["token_endpoint"],
            "https://accounts.zoho.eu/oauth/v2/token"
        );
        assert_eq!(oauth["code_challenge_methods_supported"][0], "S256");
    }

    #[tokio::test]
    async fn test_healthz() {
        let (status, body) = get_json("/healthz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_unknown_path_is_404() {
        let (status, _) = get_json("/.well-known/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
