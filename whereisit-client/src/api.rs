use anyhow::{bail, Context, Result};
use reqwest::Client;
use shared::protocol::{API_KEY_HEADER, DEVICES_PATH, REGISTER_PATH};
use shared::types::{DeviceEntry, RegisterRequest};

/// Credentials for the daemon's API routes
#[derive(Debug, Clone, Default, clap::Args)]
pub struct Credentials {
    /// Value for the x-api-key header
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Basic auth user name
    #[arg(long, global = true)]
    pub username: Option<String>,

    /// Basic auth password
    #[arg(long, global = true)]
    pub password: Option<String>,
}

pub struct ApiClient {
    http: Client,
    base_url: String,
    credentials: Credentials,
}

impl ApiClient {
    pub fn new(base_url: &str, credentials: Credentials) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, mut req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(key) = &self.credentials.api_key {
            req = req.header(API_KEY_HEADER, key);
        }
        if let Some(user) = &self.credentials.username {
            req = req.basic_auth(user, self.credentials.password.as_ref());
        }
        req
    }

    /// Announce this device to the directory
    pub async fn register(&self, request: &RegisterRequest) -> Result<()> {
        let response = self
            .authorize(self.http.post(self.url(REGISTER_PATH)))
            .json(request)
            .send()
            .await
            .context("Failed to send registration")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Registration rejected with {}: {}", status, body.trim());
        }
        Ok(())
    }

    /// Devices registered from the caller's network
    pub async fn devices(&self) -> Result<Vec<DeviceEntry>> {
        let response = self
            .authorize(self.http.get(self.url(DEVICES_PATH)))
            .send()
            .await
            .context("Failed to query devices")?;

        let status = response.status();
        if !status.is_success() {
            bail!("Device query failed with {}", status);
        }
        response
            .json()
            .await
            .context("Failed to decode device list")
    }
}
