use crate::error::DownloadError;
use reqwest::{Client, Proxy};
use std::time::Duration;

/// Some CDNs refuse requests that don't look like they come from a browser.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 6.3; Trident/7.0; rv:11.0) like Gecko";

/// SOCKS5 proxy applied to every request a download issues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    /// `host:port`, with or without a `socks5://` scheme.
    pub address: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl ProxyConfig {
    fn url(&self) -> String {
        if self.address.contains("://") {
            self.address.clone()
        } else {
            format!("socks5://{}", self.address)
        }
    }
}

#[derive(Debug, Clone)]
pub struct DownloaderConfig {
    pub user_agent: String,
    /// Per-request timeout. `None` leaves requests unbounded.
    pub request_timeout: Option<Duration>,
    pub connect_timeout: Duration,
    pub proxy: Option<ProxyConfig>,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: None,
            connect_timeout: Duration::from_secs(10),
            proxy: None,
        }
    }
}

impl DownloaderConfig {
    pub fn build_client(&self) -> Result<Client, DownloadError> {
        let mut builder = Client::builder()
            .user_agent(&self.user_agent)
            .connect_timeout(self.connect_timeout);

        if let Some(timeout) = self.request_timeout {
            builder = builder.timeout(timeout);
        }

        if let Some(proxy) = &self.proxy {
            let mut p = Proxy::all(proxy.url()).map_err(DownloadError::Client)?;
            if let Some(user) = &proxy.username {
                p = p.basic_auth(user, proxy.password.as_deref().unwrap_or(""));
            }
            builder = builder.proxy(p);
        }

        builder.build().map_err(DownloadError::Client)
    }
}
