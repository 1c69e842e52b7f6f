//! Configuration for resource clients.

use std::time::Duration;

/// Configuration shared by the HTTP resource clients.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server origin (e.g. `http://localhost:8000`).
    pub base_url: String,
    /// Path prefix in front of every resource.
    pub api_prefix: String,
    /// Connect timeout.
    pub connect_timeout: Duration,
    /// Whole-request timeout.
    pub timeout: Duration,
    /// `User-Agent` header value.
    pub user_agent: String,
}

impl ClientConfig {
    /// Creates a configuration for the given server origin.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_prefix: "/api".into(),
            connect_timeout: Duration::from_secs(10),
            timeout: Duration::from_secs(30),
            user_agent: concat!("tablesync/", env!("CARGO_PKG_VERSION")).into(),
        }
    }

    /// Sets the API path prefix.
    pub fn with_api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.api_prefix = prefix.into();
        self
    }

    /// Sets the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// URL of a resource collection, with a trailing slash.
    pub fn collection_url(&self, resource: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let prefix = self.api_prefix.trim_matches('/');
        if prefix.is_empty() {
            format!("{base}/{resource}/")
        } else {
            format!("{base}/{prefix}/{resource}/")
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("http://localhost:8000")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_config_builder() {
        let config = ClientConfig::new("https://clinic.example.com")
            .with_api_prefix("/v2/api")
            .with_timeout(Duration::from_secs(5))
            .with_connect_timeout(Duration::from_secs(1));

        assert_eq!(config.api_prefix, "/v2/api");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.connect_timeout, Duration::from_secs(1));
        assert!(config.user_agent.starts_with("tablesync/"));
    }

    #[test]
    fn collection_urls() {
        let config = ClientConfig::new("http://localhost:8000/");
        assert_eq!(
            config.collection_url("countries"),
            "http://localhost:8000/api/countries/"
        );

        let config = ClientConfig::new("http://localhost:8000").with_api_prefix("");
        assert_eq!(
            config.collection_url("public-servants"),
            "http://localhost:8000/public-servants/"
        );
    }
}
