//! Blocking HTTP execution for the core's requests.

use std::time::Duration;

use book_core::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError};
use tracing::debug;

/// Runs requests with a ureq agent. Error statuses come back as responses so
/// the core decides what they mean.
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self { agent }
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

impl Transport for UreqTransport {
    fn execute(&self, req: &HttpRequest) -> Result<HttpResponse, TransportError> {
        debug!(method = %req.method, path = %req.path, "http request");
        let result = match req.method {
            HttpMethod::Get => with_headers(self.agent.get(&req.path), &req.headers).call(),
            HttpMethod::Delete => with_headers(self.agent.delete(&req.path), &req.headers).call(),
            HttpMethod::Post => {
                let builder = with_headers(self.agent.post(&req.path), &req.headers);
                match &req.body {
                    Some(body) => builder.send(body.as_bytes()),
                    None => builder.send_empty(),
                }
            }
            HttpMethod::Put => {
                let builder = with_headers(self.agent.put(&req.path), &req.headers);
                match &req.body {
                    Some(body) => builder.send(body.as_bytes()),
                    None => builder.send_empty(),
                }
            }
        };

        let mut response = result.map_err(|e| TransportError::new(e.to_string()))?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| TransportError::new(e.to_string()))?;
        debug!(status, "http response");

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
