//! Zoho OAuth token management.
//!
//! The [`TokenManager`] owns the access token, its expiry, the (possibly
//! rotated) refresh token and the api domain reported by the last token
//! response. Every read and refresh goes through one async mutex, so callers
//! racing on an expired token share a single refresh.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::config::Settings;
use crate::error::{TcError, TcResult};
use crate::utils::HttpClient;

/// Tokens are refreshed this many seconds before they actually expire
pub const REFRESH_SAFETY_WINDOW_SECS: i64 = 60;

/// Lifetime assumed when the token response omits `expires_in`
pub const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

/// OAuth scopes needed by the full tool catalog
pub const TRAINERCENTRAL_SCOPES: &[&str] = &[
    "TrainerCentral.courseapi.ALL",
    "TrainerCentral.sessionapi.ALL",
    "TrainerCentral.sectionapi.ALL",
    "TrainerCentral.talkapi.ALL",
    "TrainerCentral.userapi.ALL",
    "TrainerCentral.portalapi.ALL",
];

/// Comma separated scope string in the form Zoho expects
pub fn default_scope() -> String {
    TRAINERCENTRAL_SCOPES.join(",")
}

/// Raw token endpoint response. Zoho reports some failures as
/// HTTP 200 with an `error` field, so every field is optional.
#[derive(Debug, Deserialize)]
struct OAuthTokenResponse {
    access_token: Option<String>,
    expires_in: Option<i64>,
    refresh_token: Option<String>,
    api_domain: Option<String>,
    error: Option<String>,
}

/// Result of a successful token exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenGrant {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_domain: Option<String>,
}

#[derive(Debug)]
struct TokenState {
    access_token: Option<String>,
    expires_at: DateTime<Utc>,
    refresh_token: Option<String>,
    api_domain: Option<String>,
}

impl TokenState {
    fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        match self.access_token {
            Some(_) => self.expires_at <= now + Duration::seconds(REFRESH_SAFETY_WINDOW_SECS),
            None => true,
        }
    }

    fn apply(&mut self, grant: &TokenGrant) {
        self.access_token = Some(grant.access_token.clone());
        self.expires_at = grant.expires_at;
        if let Some(rt) = &grant.refresh_token {
            self.refresh_token = Some(rt.clone());
        }
        if let Some(api) = &grant.api_domain {
            self.api_domain = Some(api.clone());
        }
    }
}

/// Holds and renews the Zoho access token
#[derive(Debug)]
pub struct TokenManager {
    http: HttpClient,
    accounts_url: String,
    client_id: Option<String>,
    client_secret: Option<String>,
    state: Mutex<TokenState>,
}

impl TokenManager {
    pub fn new(settings: &Settings, http: HttpClient) -> Self {
        let expires_at = DateTime::from_timestamp(settings.access_token_expires_at, 0)
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

        Self {
            http,
            accounts_url: settings.accounts_url.clone(),
            client_id: settings.client_id.clone(),
            client_secret: settings.client_secret.clone(),
            state: Mutex::new(TokenState {
                access_token: settings.access_token.clone(),
                expires_at,
                refresh_token: settings.refresh_token.clone(),
                api_domain: None,
            }),
        }
    }

    /// `{accounts_url}/oauth/v2/token`
    pub fn token_endpoint(&self) -> String {
        format!("{}/oauth/v2/token", self.accounts_url)
    }

    /// `{accounts_url}/oauth/v2/auth`
    pub fn authorization_endpoint(&self) -> String {
        format!("{}/oauth/v2/auth", self.accounts_url)
    }

    /// Return a token that is valid for at least the safety window,
    /// refreshing first when needed.
    pub async fn get_valid_access_token(&self) -> TcResult<String> {
        let mut state = self.state.lock().await;
        if !state.needs_refresh(Utc::now()) {
            if let Some(token) = &state.access_token {
                return Ok(token.clone());
            }
        }

        tracing::debug!("Access token missing or near expiry, refreshing");
        let grant = self.refresh_grant(state.refresh_token.as_deref()).await?;
        state.apply(&grant);
        Ok(grant.access_token)
    }

    /// Called after TrainerCentral rejected `rejected` with 401.
    ///
    /// When another caller already replaced that token, the newer one is
    /// returned without touching the network.
    pub async fn refresh_rejected(&self, rejected: &str) -> TcResult<String> {
        let mut state = self.state.lock().await;
        if let Some(current) = &state.access_token {
            if current != rejected && !state.needs_refresh(Utc::now()) {
                tracing::debug!("Token already refreshed by a concurrent call");
                return Ok(current.clone());
            }
        }

        tracing::warn!("TrainerCentral rejected the access token; refreshing");
        let grant = self.refresh_grant(state.refresh_token.as_deref()).await?;
        state.apply(&grant);
        Ok(grant.access_token)
    }

    /// Refresh unconditionally and return the new grant
    pub async fn refresh_now(&self) -> TcResult<TokenGrant> {
        let mut state = self.state.lock().await;
        let grant = self.refresh_grant(state.refresh_token.as_deref()).await?;
        state.apply(&grant);
        Ok(grant)
    }

    /// Exchange an authorization code (from the consent redirect) for tokens
    /// and adopt them as the current grant.
    pub async fn exchange_authorization_code(
        &self,
        code: &str,
        redirect_uri: &str,
        scope: Option<&str>,
    ) -> TcResult<TokenGrant> {
        let (client_id, client_secret) = self.client_credentials()?;

        let mut form = vec![
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("redirect_uri", redirect_uri),
        ];
        if let Some(scope) = scope {
            form.push(("scope", scope));
        }

        let grant = self.request_grant(&form).await?;
        if grant.refresh_token.is_none() {
            tracing::warn!("Authorization code exchange returned no refresh token");
        }

        self.state.lock().await.apply(&grant);
        Ok(grant)
    }

    /// Consent URL that yields an offline (refreshable) authorization code
    pub fn authorization_url(
        &self,
        redirect_uri: &str,
        scope: &str,
        state: Option<&str>,
    ) -> TcResult<String> {
        let client_id = self
            .client_id
            .as_deref()
            .ok_or_else(|| TcError::Configuration("ZOHO_CLIENT_ID is not set".to_string()))?;

        let mut params = vec![
            ("response_type", "code"),
            ("client_id", client_id),
            ("scope", scope),
            ("redirect_uri", redirect_uri),
            ("access_type", "offline"),
            ("prompt", "consent"),
        ];
        if let Some(state) = state {
            params.push(("state", state));
        }

        let url = url::Url::parse_with_params(&self.authorization_endpoint(), &params)
            .map_err(|e| TcError::Configuration(format!("invalid accounts url: {}", e)))?;
        Ok(url.to_string())
    }

    /// Api domain reported by the most recent token response
    pub async fn current_api_domain(&self) -> Option<String> {
        self.state.lock().await.api_domain.clone()
    }

    /// Expiry of the cached access token
    pub async fn cached_expiry(&self) -> DateTime<Utc> {
        self.state.lock().await.expires_at
    }

    fn client_credentials(&self) -> TcResult<(&str, &str)> {
        match (self.client_id.as_deref(), self.client_secret.as_deref()) {
            (Some(id), Some(secret)) => Ok((id, secret)),
            _ => Err(TcError::authentication(
                "cannot obtain a token: ZOHO_CLIENT_ID and ZOHO_CLIENT_SECRET are required",
            )),
        }
    }

    async fn refresh_grant(&self, refresh_token: Option<&str>) -> TcResult<TokenGrant> {
        let refresh_token = refresh_token.ok_or_else(|| {
            TcError::authentication("access token expired and no ZOHO_REFRESH_TOKEN is configured")
        })?;
        let (client_id, client_secret) = self.client_credentials()?;

        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", client_id),
            ("client_secret", client_secret),
        ];
        let grant = self.request_grant(&form).await?;
        tracing::info!(expires_at = %grant.expires_at, "Refreshed Zoho access token");
        Ok(grant)
    }

    async fn request_grant(&self, form: &[(&str, &str)]) -> TcResult<TokenGrant> {
        let response = self
            .http
            .client()
            .post(self.token_endpoint())
            .form(form)
            .send()
            .await
            .map_err(|e| TcError::authentication(format!("token request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TcError::authentication(format!("token response unreadable: {}", e)))?;

        if !status.is_success() {
            return Err(TcError::Authentication {
                message: format!("token endpoint returned {}: {}", status, body),
                status: Some(status.as_u16()),
            });
        }

        let parsed: OAuthTokenResponse =
            serde_json::from_str(&body).map_err(|e| TcError::Authentication {
                message: format!("token response is not JSON: {}", e),
                status: Some(status.as_u16()),
            })?;

        let access_token = match (parsed.access_token, parsed.error) {
            (_, Some(error)) => {
                return Err(TcError::Authentication {
                    message: format!("token endpoint returned error '{}'", error),
                    status: Some(status.as_u16()),
                })
            }
            (Some(token), None) if !token.is_empty() => token,
            _ => {
                return Err(TcError::Authentication {
                    message: "token response has no access_token".to_string(),
                    status: Some(status.as_u16()),
                })
            }
        };

        let expires_in = parsed.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);
        Ok(TokenGrant {
            access_token,
            expires_at: expiry_after(Utc::now(), expires_in),
            refresh_token: parsed.refresh_token.filter(|t| !t.is_empty()),
            api_domain: parsed
                .api_domain
                .map(|d| d.trim_end_matches('/').to_string())
                .filter(|d| !d.is_empty()),
        })
    }
}

/// `now + expires_in`; a non-positive or unrepresentable lifetime falls back
/// to the default one.
fn expiry_after(now: DateTime<Utc>, expires_in: i64) -> DateTime<Utc> {
    let expiry = Some(expires_in)
        .filter(|secs| *secs > 0)
        .and_then(Duration::try_seconds)
        .and_then(|lifetime| now.checked_add_signed(lifetime));

    match expiry {
        Some(at) => at,
        None => {
            tracing::warn!(
                expires_in,
                "Token endpoint returned an unusable expires_in; assuming {}s",
                DEFAULT_EXPIRES_IN_SECS
            );
            now + Duration::seconds(DEFAULT_EXPIRES_IN_SECS)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn settings(accounts_url: &str, extra: &[(&str, &str)]) -> Settings {
        let mut vars: HashMap<String, String> = [
            ("ZOHO_CLIENT_ID", "client"),
            ("ZOHO_CLIENT_SECRET", "secret"),
            ("ZOHO_REFRESH_TOKEN", "refresh-1"),
            ("ZOHO_ACCOUNTS_URL", accounts_url),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        for (k, v) in extra {
            vars.insert(k.to_string(), v.to_string());
        }
        Settings::from_vars(&vars).unwrap()
    }

    fn manager(settings: &Settings) -> TokenManager {
        TokenManager::new(
            settings,
            HttpClient::new(std::time::Duration::from_secs(5)).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_refresh_caches_future_expiry() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/oauth/v2/token")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()),
                Matcher::UrlEncoded("refresh_token".into(), "refresh-1".into()),
                Matcher::UrlEncoded("client_id".into(), "client".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"access_token":"fresh","expires_in":3600,"api_domain":"https://www.zohoapis.eu"}"#,
            )
            .expect(1)
            .create_async()
            .await;

        let tm = manager(&settings(&server.url(), &[]));
        let token = tm.get_valid_access_token().await.unwrap();
        assert_eq!(token, "fresh");
        assert!(tm.cached_expiry().await > Utc::now() + Duration::seconds(3000));
        assert_eq!(
            tm.current_api_domain().await.as_deref(),
            Some("https://www.zohoapis.eu")
        );

        // cached now, no second call
        assert_eq!(tm.get_valid_access_token().await.unwrap(), "fresh");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_valid_configured_token_skips_refresh() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/oauth/v2/token")
            .expect(0)
            .create_async()
            .await;

        let future = (Utc::now() + Duration::hours(1)).timestamp().to_string();
        let tm = manager(&settings(
            &server.url(),
            &[("ZOHO_ACCESS_TOKEN", "preissued"), ("ACCESS_TOKEN_EXPIRES_AT", future.as_str())],
        ));
        assert_eq!(tm.get_valid_access_token().await.unwrap(), "preissued");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_expired_token_refreshes_exactly_once() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/oauth/v2/token")
            .with_status(200)
            .with_body(r#"{"access_token":"renewed","expires_in":3600}"#)
            .expect(1)
            .create_async()
            .await;

        let past = (Utc::now() - Duration::minutes(5)).timestamp().to_string();
        let tm = manager(&settings(
            &server.url(),
            &[("ZOHO_ACCESS_TOKEN", "stale"), ("ACCESS_TOKEN_EXPIRES_AT", past.as_str())],
        ));
        assert_eq!(tm.get_valid_access_token().await.unwrap(), "renewed");
        assert_eq!(tm.get_valid_access_token().await.unwrap(), "renewed");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_token_inside_safety_window_is_refreshed() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/oauth/v2/token")
            .with_status(200)
            .with_body(r#"{"access_token":"renewed"}"#)
            .expect(1)
            .create_async()
            .await;

        let soon = (Utc::now() + Duration::seconds(30)).timestamp().to_string();
        let tm = manager(&settings(
            &server.url(),
            &[("ZOHO_ACCESS_TOKEN", "almost"), ("ACCESS_TOKEN_EXPIRES_AT", soon.as_str())],
        ));
        assert_eq!(tm.get_valid_access_token().await.unwrap(), "renewed");
        // default lifetime applies when expires_in is absent
        assert!(tm.cached_expiry().await > Utc::now() + Duration::seconds(3500));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_out_of_range_expires_in_uses_default_lifetime() {
        for expires_in in ["9000000000000", "-5", "0"] {
            let mut server = mockito::Server::new_async().await;
            let mock = server
                .mock("POST", "/oauth/v2/token")
                .with_status(200)
                .with_body(format!(
                    r#"{{"access_token":"t","expires_in":{}}}"#,
                    expires_in
                ))
                .expect(1)
                .create_async()
                .await;

            let tm = manager(&settings(&server.url(), &[]));
            assert_eq!(tm.get_valid_access_token().await.unwrap(), "t");

            let expiry = tm.cached_expiry().await;
            assert!(expiry > Utc::now() + Duration::seconds(3500), "expires_in={}", expires_in);
            assert!(expiry <= Utc::now() + Duration::seconds(3600), "expires_in={}", expires_in);
            // the cached token is reused rather than refreshed again
            assert_eq!(tm.get_valid_access_token().await.unwrap(), "t");
            mock.assert_async().await;
        }
    }

    #[test]
    fn test_expiry_after_keeps_valid_lifetime() {
        let now = Utc::now();
        assert_eq!(expiry_after(now, 120), now + Duration::seconds(120));
        assert_eq!(
            expiry_after(now, i64::MAX),
            now + Duration::seconds(DEFAULT_EXPIRES_IN_SECS)
        );
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_refresh() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/oauth/v2/token")
            .with_status(200)
            .with_body(r#"{"access_token":"shared","expires_in":3600}"#)
            .expect(1)
            .create_async()
            .await;

        let tm = Arc::new(manager(&settings(&server.url(), &[])));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let tm = Arc::clone(&tm);
                tokio::spawn(async move { tm.get_valid_access_token().await })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "shared");
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_refresh_failure_is_authentication_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/oauth/v2/token")
            .with_status(400)
            .with_body(r#"{"error":"invalid_client"}"#)
            .create_async()
            .await;

        let tm = manager(&settings(&server.url(), &[]));
        match tm.get_valid_access_token().await {
            Err(TcError::Authentication { status, message }) => {
                assert_eq!(status, Some(400));
                assert!(message.contains("invalid_client"));
            }
            other => panic!("expected authentication error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_error_field_with_200_is_authentication_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/oauth/v2/token")
            .with_status(200)
            .with_body(r#"{"error":"invalid_code"}"#)
            .create_async()
            .await;

        let tm = manager(&settings(&server.url(), &[]));
        let err = tm.get_valid_access_token().await.unwrap_err();
        assert!(matches!(err, TcError::Authentication { status: Some(200), .. }));
    }

    #[tokio::test]
    async fn test_missing_refresh_token_fails_without_network() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/oauth/v2/token")
            .expect(0)
            .create_async()
            .await;

        let vars: HashMap<String, String> = [
            ("ZOHO_ACCESS_TOKEN", "only-token"),
            ("ZOHO_ACCOUNTS_URL", server.url().as_str()),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let tm = manager(&Settings::from_vars(&vars).unwrap());

        let err = tm.get_valid_access_token().await.unwrap_err();
        assert!(matches!(err, TcError::Authentication { status: None, .. }));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_refresh_rejected_reuses_newer_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/oauth/v2/token")
            .with_status(200)
            .with_body(r#"{"access_token":"newer","expires_in":3600}"#)
            .expect(1)
            .create_async()
            .await;

        let tm = manager(&settings(&server.url(), &[]));
        assert_eq!(tm.get_valid_access_token().await.unwrap(), "newer");

        // a caller still holding the old token gets the current one for free
        assert_eq!(tm.refresh_rejected("older").await.unwrap(), "newer");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_refresh_rejected_renews_current_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/oauth/v2/token")
            .with_status(200)
            .with_body(r#"{"access_token":"replacement","refresh_token":"refresh-2"}"#)
            .expect(1)
            .create_async()
            .await;

        let future = (Utc::now() + Duration::hours(1)).timestamp().to_string();
        let tm = manager(&settings(
            &server.url(),
            &[("ZOHO_ACCESS_TOKEN", "revoked"), ("ACCESS_TOKEN_EXPIRES_AT", future.as_str())],
        ));
        assert_eq!(tm.refresh_rejected("revoked").await.unwrap(), "replacement");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_exchange_authorization_code() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/oauth/v2/token")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("grant_type".into(), "authorization_code".into()),
                Matcher::UrlEncoded("code".into(), "1000.code".into()),
                Matcher::UrlEncoded("redirect_uri".into(), "http://localhost/cb".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"{"access_token":"a","refresh_token":"r","expires_in":3600,"api_domain":"https://www.zohoapis.com/"}"#,
            )
            .create_async()
            .await;

        let tm = manager(&settings(&server.url(), &[]));
        let grant = tm
            .exchange_authorization_code("1000.code", "http://localhost/cb", None)
            .await
            .unwrap();
        assert_eq!(grant.refresh_token.as_deref(), Some("r"));
        assert_eq!(grant.api_domain.as_deref(), Some("https://www.zohoapis.com"));
        assert_eq!(tm.get_valid_access_token().await.unwrap(), "a");
        mock.assert_async().await;
    }

    #[test]
    fn test_authorization_url_parameters() {
        let tm = manager(&settings("https://accounts.zoho.com", &[]));
        let url = tm
            .authorization_url("http://localhost:8000/callback", &default_scope(), Some("xyz"))
            .unwrap();
        let parsed = url::Url::parse(&url).unwrap();
        assert_eq!(parsed.path(), "/oauth/v2/auth");

        let query: HashMap<_, _> = parsed.query_pairs().into_owned().collect();
        assert_eq!(query["response_type"], "code");
        assert_eq!(query["access_type"], "offline");
        assert_eq!(query["prompt"], "consent");
        assert_eq!(query["client_id"], "client");
        assert_eq!(query["state"], "xyz");
        assert!(query["scope"].contains("TrainerCentral.courseapi.ALL"));
    }
}
