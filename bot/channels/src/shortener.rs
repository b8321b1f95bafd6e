//! URL shortener client.
//!
//! Best-effort by contract: disabled, misconfigured, non-200, or failing
//! requests all hand the original URL back unchanged.

use reqwest::Client;
use tracing::debug;

use filelink_config::ShortenerConfig;

pub struct ShortenerClient {
    http: Client,
}

impl Default for ShortenerClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ShortenerClient {
    pub fn new() -> Self {
        Self {
            http: Client::new(),
        }
    }

    pub async fn shorten(&self, config: &ShortenerConfig, url: &str) -> String {
        if !config.enabled || config.api_key.is_empty() || config.api_url.is_empty() {
            return url.to_string();
        }
        match self.request(config, url).await {
            Ok(short) if !short.is_empty() => short,
            Ok(_) => url.to_string(),
            Err(error) => {
                debug!(error = %error, "Shortener failed, using the long URL");
                url.to_string()
            }
        }
    }

    async fn request(&self, config: &ShortenerConfig, url: &str) -> anyhow::Result<String> {
        let response = self
            .http
            .get(&config.api_url)
            .query(&[
                ("api", config.api_key.as_str()),
                ("url", url),
                ("format", "text"),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            anyhow::bail!("shortener returned {}", response.status());
        }
        Ok(response.text().await?.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_shortener_returns_the_original_url() {
        let client = ShortenerClient::new();
        let config = ShortenerConfig::default();
        let url = "https://share.example.dev/12ab34cd";
        assert_eq!(client.shorten(&config, url).await, url);
    }

    #[tokio::test]
    async fn missing_credentials_return_the_original_url() {
        let client = ShortenerClient::new();
        let config = ShortenerConfig {
            enabled: true,
            api_key: String::new(),
            api_url: "https://sho.rt/api".into(),
        };
        let url = "https://share.example.dev/12ab34cd";
        assert_eq!(client.shorten(&config, url).await, url);
    }
}
