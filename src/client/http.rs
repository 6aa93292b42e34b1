use crate::client::{ClientError, ContactApi, ContactFields};
use crate::configuration::CsrfSettings;
use crate::data_models::{ApiResponse, AuthResponse, AuthStatus, ContactResponse};
use crate::db::{Credentials, Registration};
use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::ACCEPT;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use url::Url;

/// Talks to the API with a cookie jar, the way the browser does: the
/// session cookie rides along and the CSRF cookie is echoed as a header.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    jar: Arc<Jar>,
    base_url: Url,
    csrf: CsrfSettings,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_csrf(base_url, CsrfSettings::default())
    }

    pub fn with_csrf(base_url: &str, csrf: CsrfSettings) -> Result<Self, ClientError> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let jar = Arc::new(Jar::default());
        let http = Client::builder()
            .cookie_provider(jar.clone())
            .build()?;
        Ok(Self {
            http,
            jar,
            base_url,
            csrf,
        })
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base_url.join(path)?)
    }

    /// The CSRF token currently held in the jar.
    pub fn csrf_token(&self) -> Option<String> {
        let cookies = self.jar.cookies(&self.base_url)?;
        let cookies = cookies.to_str().ok()?;
        cookies
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == self.csrf.cookie_name)
            .map(|(_, value)| value.to_string())
    }

    async fn read<R: DeserializeOwned>(response: Response) -> Result<R, ClientError> {
        let status = response.status();
        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|_| ClientError::UnexpectedResponse(status.as_u16(), text))
    }

    async fn get<R: DeserializeOwned>(&self, path: &str) -> Result<R, ClientError> {
        let response = self
            .http
            .get(self.url(path)?)
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        Self::read(response).await
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, ClientError>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let mut request = self
            .http
            .post(self.url(path)?)
            .header(ACCEPT, "application/json")
            .json(body);
        if let Some(token) = self.csrf_token() {
            request = request.header(self.csrf.header_name.as_str(), token);
        }
        Self::read(request.send().await?).await
    }

    pub async fn register(&self, registration: &Registration) -> Result<AuthResponse, ClientError> {
        self.fetch_csrf_cookie().await?;
        self.post("register", registration).await
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ClientError> {
        self.fetch_csrf_cookie().await?;
        self.post("login", credentials).await
    }

    pub async fn logout(&self) -> Result<ApiResponse, ClientError> {
        self.fetch_csrf_cookie().await?;
        self.post("logout", &serde_json::json!({})).await
    }

    pub async fn check_auth(&self) -> Result<AuthStatus, ClientError> {
        self.get("check-auth").await
    }
}

#[async_trait]
impl ContactApi for ApiClient {
    async fn fetch_csrf_cookie(&self) -> Result<(), ClientError> {
        self.http
            .get(self.url("csrf-cookie")?)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn submit_contact(&self, fields: &ContactFields) -> Result<ContactResponse, ClientError> {
        self.post("contact", fields).await
    }
}
