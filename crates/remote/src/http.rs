//! HTTP implementation of the remote data service client.
//!
//! Talks to a hosted backend exposing GoTrue-style auth under `/auth/v1`,
//! PostgREST-style tables under `/rest/v1`, and object storage under
//! `/storage/v1`. The project API key is attached to every request; once a
//! session exists its access token replaces the key as the bearer credential.

use crate::error::{RemoteError, RemoteResult};
use crate::models::{
    CategoryPatch, CategoryRow, MenuItemPatch, MenuItemRow, NewCategory, NewMenuItem, Session,
};
use crate::traits::{AuthApi, BucketApi, CategoriesApi, MenuItemsApi};
use async_trait::async_trait;
use bytes::Bytes;
use crema_core::RemoteConfig;
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use time::{Duration, OffsetDateTime};
use tokio::sync::RwLock;
use url::Url;
use uuid::Uuid;

/// Fallback access-token lifetime when the auth response carries no expiry.
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

/// HTTP client for the hosted data service.
pub struct HttpRemote {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
    bucket: String,
    session: RwLock<Option<Session>>,
}

impl HttpRemote {
    /// Create a client from configuration.
    pub fn new(config: &RemoteConfig) -> RemoteResult<Self> {
        config.validate().map_err(RemoteError::Config)?;
        let base_url = Url::parse(&config.url)
            .map_err(|e| RemoteError::Url(format!("{}: {e}", config.url)))?;

        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            api_key: config.api_key.clone(),
            bucket: config.bucket.clone(),
            session: RwLock::new(None),
        })
    }

    fn url(&self, path: &str) -> RemoteResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| RemoteError::Url(format!("{path}: {e}")))
    }

    /// Bearer credential for the next request: the session's access token
    /// when one is live, the project API key otherwise.
    async fn bearer_token(&self) -> String {
        let guard = self.session.read().await;
        match &*guard {
            Some(session) if !session.is_expired() => session.access_token.clone(),
            _ => self.api_key.clone(),
        }
    }

    async fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.api_key)
            .bearer_auth(self.bearer_token().await)
    }

    /// Translate a non-success response into a `RemoteError`.
    async fn read_error(&self, response: reqwest::Response) -> RemoteError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        RemoteError::from_status(status, error_message(status, &body))
    }

    async fn send_rows<T: DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
    ) -> RemoteResult<Vec<T>> {
        let response = req.send().await?;
        if !response.status().is_success() {
            return Err(self.read_error(response).await);
        }
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Send a request expected to affect exactly one row; an empty
    /// representation means no row matched.
    async fn send_single<T: DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
        what: &str,
    ) -> RemoteResult<T> {
        let rows: Vec<T> = self.send_rows(req).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| RemoteError::NotFound(what.to_string()))
    }

    fn list_url(&self, table: &str) -> RemoteResult<Url> {
        let mut url = self.url(&format!("/rest/v1/{table}"))?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("order", "created_at.asc");
        Ok(url)
    }

    fn row_url(&self, table: &str, id: Uuid) -> RemoteResult<Url> {
        let mut url = self.url(&format!("/rest/v1/{table}"))?;
        url.query_pairs_mut()
            .append_pair("id", &format!("eq.{id}"))
            .append_pair("select", "*");
        Ok(url)
    }

    fn insert_url(&self, table: &str) -> RemoteResult<Url> {
        let mut url = self.url(&format!("/rest/v1/{table}"))?;
        url.query_pairs_mut().append_pair("select", "*");
        Ok(url)
    }

    async fn refresh_session(&self, refresh_token: &str) -> RemoteResult<Session> {
        let url = self.url("/auth/v1/token?grant_type=refresh_token")?;
        let response = self
            .http
            .post(url)
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(self.read_error(response).await);
        }
        let token: TokenResponse = response.json().await?;
        Ok(token.into_session())
    }
}

#[async_trait]
impl AuthApi for HttpRemote {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> RemoteResult<Session> {
        let url = self.url("/auth/v1/token?grant_type=password")?;
        let response = self
            .http
            .post(url)
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(self.read_error(response).await);
        }

        let token: TokenResponse = response.json().await?;
        let session = token.into_session();
        *self.session.write().await = Some(session.clone());
        Ok(session)
    }

    async fn get_session(&self) -> RemoteResult<Option<Session>> {
        let refresh_token = {
            let guard = self.session.read().await;
            match &*guard {
                Some(session) if !session.is_expired() => return Ok(Some(session.clone())),
                Some(session) => session.refresh_token.clone(),
                None => return Ok(None),
            }
        };

        // The stored session has expired. Try to refresh it once; a failed
        // refresh means there is no session anymore, not an error.
        let Some(refresh_token) = refresh_token else {
            *self.session.write().await = None;
            return Ok(None);
        };

        match self.refresh_session(&refresh_token).await {
            Ok(session) => {
                *self.session.write().await = Some(session.clone());
                Ok(Some(session))
            }
            Err(err) => {
                tracing::debug!(error = %err, "session refresh failed, treating as signed out");
                *self.session.write().await = None;
                Ok(None)
            }
        }
    }

    async fn sign_out(&self) -> RemoteResult<()> {
        // Drop the local session first: a failed remote call must not leave
        // a token behind that keeps privileged calls working.
        let session = self.session.write().await.take();
        let Some(session) = session else {
            return Ok(());
        };

        let url = self.url("/auth/v1/logout")?;
        let response = self
            .http
            .post(url)
            .header("apikey", &self.api_key)
            .bearer_auth(session.access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(self.read_error(response).await);
        }
        Ok(())
    }
}

#[async_trait]
impl CategoriesApi for HttpRemote {
    async fn list_categories(&self) -> RemoteResult<Vec<CategoryRow>> {
        let url = self.list_url("categories")?;
        let req = self.authed(self.http.get(url)).await;
        self.send_rows(req).await
    }

    async fn insert_category(&self, category: &NewCategory) -> RemoteResult<CategoryRow> {
        let url = self.insert_url("categories")?;
        let req = self
            .authed(self.http.post(url))
            .await
            .header("Prefer", "return=representation")
            .json(category);
        self.send_single(req, "inserted category").await
    }

    async fn update_category(&self, id: Uuid, patch: &CategoryPatch) -> RemoteResult<CategoryRow> {
        let url = self.row_url("categories", id)?;
        let req = self
            .authed(self.http.patch(url))
            .await
            .header("Prefer", "return=representation")
            .json(patch);
        self.send_single(req, &format!("category {id}")).await
    }

    async fn delete_category(&self, id: Uuid) -> RemoteResult<CategoryRow> {
        let url = self.row_url("categories", id)?;
        let req = self
            .authed(self.http.delete(url))
            .await
            .header("Prefer", "return=representation");
        self.send_single(req, &format!("category {id}")).await
    }
}

/// Insert body for `menu_items`: the draft plus its owning category.
#[derive(serde::Serialize)]
struct InsertMenuItem<'a> {
    #[serde(flatten)]
    item: &'a NewMenuItem,
    category_id: Uuid,
}

#[async_trait]
impl MenuItemsApi for HttpRemote {
    async fn list_menu_items(&self) -> RemoteResult<Vec<MenuItemRow>> {
        let url = self.list_url("menu_items")?;
        let req = self.authed(self.http.get(url)).await;
        self.send_rows(req).await
    }

    async fn insert_menu_item(
        &self,
        category_id: Uuid,
        item: &NewMenuItem,
    ) -> RemoteResult<MenuItemRow> {
        let url = self.insert_url("menu_items")?;
        let body = InsertMenuItem { item, category_id };
        let req = self
            .authed(self.http.post(url))
            .await
            .header("Prefer", "return=representation")
            .json(&body);
        self.send_single(req, "inserted menu item").await
    }

    async fn update_menu_item(
        &self,
        id: Uuid,
        patch: &MenuItemPatch,
    ) -> RemoteResult<MenuItemRow> {
        let url = self.row_url("menu_items", id)?;
        let req = self
            .authed(self.http.patch(url))
            .await
            .header("Prefer", "return=representation")
            .json(patch);
        self.send_single(req, &format!("menu item {id}")).await
    }

    async fn delete_menu_item(&self, id: Uuid) -> RemoteResult<MenuItemRow> {
        let url = self.row_url("menu_items", id)?;
        let req = self
            .authed(self.http.delete(url))
            .await
            .header("Prefer", "return=representation");
        self.send_single(req, &format!("menu item {id}")).await
    }
}

#[async_trait]
impl BucketApi for HttpRemote {
    async fn upload(&self, key: &str, data: Bytes, content_type: &str) -> RemoteResult<()> {
        let url = self.url(&format!("/storage/v1/object/{}/{}", self.bucket, key))?;
        let req = self
            .authed(self.http.post(url))
            .await
            .header(CONTENT_TYPE, content_type)
            .header(CACHE_CONTROL, "3600")
            .header("x-upsert", "false")
            .body(data);

        let response = req.send().await?;
        if response.status().is_success() {
            return Ok(());
        }

        // Some storage gateways report a key collision as a 400 with a
        // "Duplicate" payload instead of a 409.
        match self.read_error(response).await {
            RemoteError::Api { message, .. } if message.contains("Duplicate") => {
                Err(RemoteError::AlreadyExists(message))
            }
            err => Err(err),
        }
    }

    fn public_url(&self, key: &str) -> RemoteResult<String> {
        let url = self.url(&format!(
            "/storage/v1/object/public/{}/{}",
            self.bucket, key
        ))?;
        Ok(url.to_string())
    }

    async fn remove(&self, keys: &[String]) -> RemoteResult<()> {
        if keys.is_empty() {
            return Ok(());
        }
        let url = self.url(&format!("/storage/v1/object/{}", self.bucket))?;
        let req = self
            .authed(self.http.delete(url))
            .await
            .json(&serde_json::json!({ "prefixes": keys }));

        let response = req.send().await?;
        if !response.status().is_success() {
            return Err(self.read_error(response).await);
        }
        Ok(())
    }
}

// =============================================================================
// Wire types for the auth API
// =============================================================================

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    /// Unix timestamp (seconds); newer gateways send this directly.
    #[serde(default)]
    expires_at: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    user: Option<TokenUser>,
}

#[derive(Debug, Deserialize)]
struct TokenUser {
    #[serde(default)]
    email: Option<String>,
}

impl TokenResponse {
    fn into_session(self) -> Session {
        let expires_at = self
            .expires_at
            .and_then(|secs| OffsetDateTime::from_unix_timestamp(secs).ok())
            .unwrap_or_else(|| {
                OffsetDateTime::now_utc()
                    + Duration::seconds(self.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS))
            });

        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user_email: self.user.and_then(|u| u.email),
        }
    }
}

/// Pull a human-readable message out of an error payload. The auth, table,
/// and storage APIs each use a different field name.
fn error_message(status: u16, body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: Option<String>,
        msg: Option<String>,
        error_description: Option<String>,
        error: Option<String>,
    }

    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message.or(b.msg).or(b.error_description).or(b.error))
        .unwrap_or_else(|| {
            if body.is_empty() {
                format!("HTTP {status}")
            } else {
                body.chars().take(200).collect()
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote() -> HttpRemote {
        HttpRemote::new(&RemoteConfig::for_testing()).unwrap()
    }

    #[test]
    fn new_rejects_invalid_config() {
        let mut config = RemoteConfig::for_testing();
        config.api_key = "".to_string();
        assert!(matches!(
            HttpRemote::new(&config),
            Err(RemoteError::Config(_))
        ));
    }

    #[test]
    fn list_url_orders_by_creation_time() {
        let url = remote().list_url("categories").unwrap();
        assert_eq!(url.path(), "/rest/v1/categories");
        let query = url.query().unwrap();
        assert!(query.contains("select=%2A") || query.contains("select=*"));
        assert!(query.contains("order=created_at.asc"));
    }

    #[test]
    fn row_url_filters_by_id() {
        let id = Uuid::new_v4();
        let url = remote().row_url("menu_items", id).unwrap();
        assert!(url.query().unwrap().contains(&format!("id=eq.{id}")));
    }

    #[test]
    fn public_url_is_under_the_public_object_route() {
        let url = remote().public_url("menu-items/abc.jpg").unwrap();
        assert_eq!(
            url,
            "http://localhost:54321/storage/v1/object/public/menu-images/menu-items/abc.jpg"
        );
    }

    #[test]
    fn error_message_handles_the_api_variants() {
        assert_eq!(error_message(400, r#"{"message":"Duplicate"}"#), "Duplicate");
        assert_eq!(error_message(400, r#"{"msg":"bad"}"#), "bad");
        assert_eq!(
            error_message(400, r#"{"error_description":"wrong password"}"#),
            "wrong password"
        );
        assert_eq!(error_message(502, ""), "HTTP 502");
        assert_eq!(error_message(500, "plain text"), "plain text");
    }

    #[test]
    fn token_response_expiry_prefers_absolute_timestamp() {
        let token = TokenResponse {
            access_token: "t".to_string(),
            expires_in: Some(60),
            expires_at: Some(0),
            refresh_token: None,
            user: None,
        };
        let session = token.into_session();
        assert_eq!(session.expires_at.unix_timestamp(), 0);
        assert!(session.is_expired());
    }

    #[test]
    fn token_response_expiry_falls_back_to_lifetime() {
        let token = TokenResponse {
            access_token: "t".to_string(),
            expires_in: Some(120),
            expires_at: None,
            refresh_token: Some("r".to_string()),
            user: Some(TokenUser {
                email: Some("admin@example.com".to_string()),
            }),
        };
        let session = token.into_session();
        assert!(!session.is_expired());
        assert_eq!(session.user_email.as_deref(), Some("admin@example.com"));
    }
}
