use std::collections::HashMap;
use std::time::Duration;

use crate::codegen::HttpCall;
use crate::error::RuntimeError;
use crate::model::HttpMethod;

/// Connection-pool knobs of the shared outbound client.
#[derive(Debug, Clone)]
pub struct HttpPoolConfig {
    pub pool_max_idle_per_host: usize,
    pub pool_idle_timeout: Duration,
    pub tcp_keepalive: Option<Duration>,
}

impl Default for HttpPoolConfig {
    fn default() -> Self {
        Self {
            pool_max_idle_per_host: 10,
            pool_idle_timeout: Duration::from_secs(90),
            tcp_keepalive: Some(Duration::from_secs(60)),
        }
    }
}

/// Shared outbound HTTP caller. One pooled client serves every HTTP node;
/// per-call timeouts come from the node's port configuration.
pub struct HttpCaller {
    client: reqwest::Client,
}

impl HttpCaller {
    pub fn new(config: HttpPoolConfig) -> Self {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(config.pool_idle_timeout)
            .tcp_keepalive(config.tcp_keepalive)
            .build()
            .unwrap_or_default();
        Self { client }
    }

    /// Substitute every declared `{name}` path variable with the request
    /// parameter of the same name, falling back to the declared default.
    pub fn resolve_url(call: &HttpCall, params: &HashMap<String, String>) -> String {
        let mut url = call.url.clone();
        for param in &call.path_params {
            let placeholder = format!("{{{}}}", param.name);
            let value = params
                .get(&param.name)
                .map(String::as_str)
                .unwrap_or(param.default_value.as_str());
            url = url.replace(&placeholder, value);
        }
        url
    }

    pub async fn call(
        &self,
        call: &HttpCall,
        url: &str,
        headers: &HashMap<String, String>,
        body: Option<&str>,
        node_name: &str,
    ) -> Result<String, RuntimeError> {
        let mut request = match call.method {
            HttpMethod::Get => self.client.get(url),
            HttpMethod::Post => self.client.post(url),
        };

        for (name, value) in headers {
            if skip_forward_header(name) {
                continue;
            }
            request = request.header(name, value);
        }

        if call.method == HttpMethod::Post {
            request = request.body(body.unwrap_or_default().to_string());
        }

        let failed = |message: String| RuntimeError::HttpCallFailed {
            node_name: node_name.to_string(),
            url: url.to_string(),
            message,
        };

        let response = request
            .timeout(Duration::from_secs(call.timeout_secs))
            .send()
            .await
            .map_err(|e| {
                tracing::error!(node = node_name, url, error = %e, "outbound request failed");
                failed(e.to_string())
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| failed(format!("failed to read response body: {e}")))?;

        if !status.is_success() {
            tracing::error!(node = node_name, url, %status, "upstream returned an error status");
            return Err(failed(format!("status={}, body={}", status.as_u16(), text)));
        }

        Ok(text)
    }
}

impl Default for HttpCaller {
    fn default() -> Self {
        Self::new(HttpPoolConfig::default())
    }
}

/// Headers the pooled client manages itself, never forwarded verbatim.
fn skip_forward_header(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    name == "content-length" || name == "accept-encoding" || name == "host"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PathParam;

    fn call_with_params(url: &str, params: Vec<PathParam>) -> HttpCall {
        HttpCall {
            url: url.into(),
            method: HttpMethod::Get,
            timeout_secs: 5,
            path_params: params,
        }
    }

    #[test]
    fn test_path_param_substitution() {
        let call = call_with_params(
            "http://up/users/{userId}/orders/{orderId}",
            vec![
                PathParam {
                    name: "userId".into(),
                    default_value: "0".into(),
                },
                PathParam {
                    name: "orderId".into(),
                    default_value: "none".into(),
                },
            ],
        );
        let mut params = HashMap::new();
        params.insert("userId".to_string(), "42".to_string());

        let url = HttpCaller::resolve_url(&call, &params);
        assert_eq!(url, "http://up/users/42/orders/none");
    }

    #[test]
    fn test_url_without_params_untouched() {
        let call = call_with_params("http://up/plain", vec![]);
        assert_eq!(
            HttpCaller::resolve_url(&call, &HashMap::new()),
            "http://up/plain"
        );
    }

    #[test]
    fn test_skip_forward_header() {
        assert!(skip_forward_header("Content-Length"));
        assert!(skip_forward_header("accept-encoding"));
        assert!(skip_forward_header("Host"));
        assert!(!skip_forward_header("x-tenant"));
    }
}
