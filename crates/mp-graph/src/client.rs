//! Graph API call primitive

use std::time::Duration;

use mp_core::GraphConfig;
use reqwest::{Client, Method};
use serde_json::Value;
use tracing::{debug, error};

use crate::error::{GraphError, Result};

/// Graph API client
#[derive(Clone)]
pub struct GraphClient {
    client: Client,
    config: GraphConfig,
}

impl GraphClient {
    /// Create a new client with the configured request timeout
    pub fn new(config: &GraphConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Perform one Graph API call.
    ///
    /// `GET` sends `params` as the query string, anything else as a form
    /// body. The call fails when the status is not successful, the body has
    /// an `error` field, or any of `required` is absent or null. On success
    /// the parsed JSON body is returned.
    pub async fn call(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, &str)],
        required: &[&str],
    ) -> Result<Value> {
        let url = self.config.endpoint(path);
        debug!("Graph API {} /{}", method, path.trim_start_matches('/'));

        let request = if method == Method::GET {
            self.client.get(&url).query(params)
        } else {
            self.client.request(method.clone(), &url).form(params)
        };

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        let json: Value = match serde_json::from_str(&text) {
            Ok(json) => json,
            Err(_) if !status.is_success() => {
                error!("Graph API error: {} - {}", status, text);
                return Err(GraphError::Api {
                    status: status.as_u16(),
                    body: text,
                });
            }
            Err(_) => {
                error!("Graph API returned non-JSON body: {}", text);
                return Err(GraphError::InvalidJson {
                    status: status.as_u16(),
                    body: text,
                });
            }
        };

        if !status.is_success() || json.get("error").is_some() {
            let body = pretty(&json);
            error!("Graph API error: {} - {}", status, body);
            return Err(GraphError::Api {
                status: status.as_u16(),
                body,
            });
        }

        if let Some(field) = required
            .iter()
            .find(|field| json.get(**field).is_none_or(Value::is_null))
        {
            let body = pretty(&json);
            error!("Graph API response missing {}: {}", field, body);
            return Err(GraphError::MissingField {
                field: field.to_string(),
                body,
            });
        }

        debug!("Graph API {} /{} -> {}", method, path.trim_start_matches('/'), status);
        Ok(json)
    }

    /// `GET` shorthand
    pub async fn get(&self, path: &str, params: &[(&str, &str)], required: &[&str]) -> Result<Value> {
        self.call(Method::GET, path, params, required).await
    }

    /// `POST` shorthand
    pub async fn post(&self, path: &str, params: &[(&str, &str)], required: &[&str]) -> Result<Value> {
        self.call(Method::POST, path, params, required).await
    }
}

fn pretty(json: &Value) -> String {
    serde_json::to_string_pretty(json).unwrap_or_else(|_| json.to_string())
}

/// String value of `field`, treating empty strings as absent
pub(crate) fn string_field(json: &Value, field: &str) -> Result<String> {
    json.get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| GraphError::MissingField {
            field: field.to_string(),
            body: pretty(json),
        })
}
