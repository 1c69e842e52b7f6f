//! Server configuration.

/// Configuration for the resource server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Path prefix in front of every resource.
    pub api_prefix: String,
    /// Trim surrounding whitespace from text values.
    pub trim_text: bool,
    /// Coerce incoming values to their field types.
    pub coerce_values: bool,
    /// Allow updates to change a record's key.
    pub allow_key_change: bool,
}

impl ServerConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self {
            api_prefix: "/api".into(),
            trim_text: true,
            coerce_values: true,
            allow_key_change: true,
        }
    }

    /// Sets the API path prefix.
    pub fn with_api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.api_prefix = prefix.into();
        self
    }

    /// Enables or disables trimming of text values.
    pub fn with_trim_text(mut self, trim: bool) -> Self {
        self.trim_text = trim;
        self
    }

    /// Enables or disables value coercion.
    pub fn with_coerce_values(mut self, coerce: bool) -> Self {
        self.coerce_values = coerce;
        self
    }

    /// Allows or forbids key changes on update.
    pub fn with_allow_key_change(mut self, allow: bool) -> Self {
        self.allow_key_change = allow;
        self
    }

    /// Prefix split into path segments.
    pub(crate) fn prefix_segments(&self) -> Vec<&str> {
        self.api_prefix
            .split('/')
            .filter(|s| !s.is_empty())
            .collect()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder() {
        let config = ServerConfig::new()
            .with_api_prefix("/v1/api/")
            .with_trim_text(false)
            .with_allow_key_change(false);

        assert_eq!(config.prefix_segments(), vec!["v1", "api"]);
        assert!(!config.trim_text);
        assert!(config.coerce_values);
        assert!(!config.allow_key_change);
    }

    #[test]
    fn empty_prefix() {
        let config = ServerConfig::new().with_api_prefix("");
        assert!(config.prefix_segments().is_empty());
    }
}
