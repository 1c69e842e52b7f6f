//! Blocking HTTP client over `ureq`.

use crate::config::ClientConfig;
use crate::http::{HttpClient, HttpRequest, HttpResponse};
use std::io::Read;

/// [`HttpClient`] backed by a shared `ureq::Agent`.
///
/// Connect and request timeouts come from [`ClientConfig`]; an expired
/// timeout is reported as a failed send.
#[derive(Clone)]
pub struct UreqClient {
    agent: ureq::Agent,
}

impl UreqClient {
    /// Builds a client from the given configuration.
    pub fn new(config: &ClientConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(config.connect_timeout)
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build();
        Self { agent }
    }
}

impl Default for UreqClient {
    fn default() -> Self {
        Self::new(&ClientConfig::default())
    }
}

impl HttpClient for UreqClient {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, String> {
        let call = self
            .agent
            .request(request.method.as_str(), &request.url)
            .set("accept", "application/json");

        let result = match &request.body {
            Some(body) => call
                .set("content-type", "application/json")
                .send_bytes(body),
            None => call.call(),
        };

        let response = match result {
            Ok(response) => response,
            Err(ureq::Error::Status(_, response)) => response,
            Err(ureq::Error::Transport(err)) => {
                return Err(format!("{} {}: {}", request.method, request.url, err))
            }
        };

        let status = response.status();
        let mut body = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut body)
            .map_err(|e| format!("failed to read response body: {e}"))?;

        Ok(HttpResponse { status, body })
    }
}
