//! Blocking ureq transport (feature `ureq`, on by default).

use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError};

pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    /// 4xx/5xx come back as data; only connection-level failures are errors.
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
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
        let agent = &self.agent;
        let headers = &req.headers;
        let result = match (req.method, req.body.as_deref()) {
            (HttpMethod::Get, _) => with_headers(agent.get(&req.path), headers).call(),
            (HttpMethod::Delete, _) => with_headers(agent.delete(&req.path), headers).call(),
            (HttpMethod::Post, Some(body)) => {
                with_headers(agent.post(&req.path), headers).send(body.as_bytes())
            }
            (HttpMethod::Post, None) => with_headers(agent.post(&req.path), headers).send_empty(),
            (HttpMethod::Put, Some(body)) => {
                with_headers(agent.put(&req.path), headers).send(body.as_bytes())
            }
            (HttpMethod::Put, None) => with_headers(agent.put(&req.path), headers).send_empty(),
        };
        let mut response = result.map_err(|e| TransportError(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| (k.as_str().to_string(), v.to_str().unwrap_or_default().to_string()))
            .collect();
        // a truncated body is a transport failure, not an empty reply
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| TransportError(e.to_string()))?;
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
