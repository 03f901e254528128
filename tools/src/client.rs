//! Client for `POST {base}/{protocol}/tools/{tool}` endpoints that answer `{"result": ...}`.

use std::time::Duration;

use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::error::ToolError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone)]
pub struct ToolClient {
    base_url: String,
    http: Client,
}

impl ToolClient {
    pub fn new(base_url: &str) -> Result<Self, ToolError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self::with_client(base_url, http))
    }

    pub fn with_client(base_url: &str, http: Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tool_url(&self, protocol: &str, tool: &str) -> String {
        format!(
            "{}/{}/tools/{}",
            self.base_url,
            protocol.trim_matches('/'),
            tool
        )
    }

    /// Invokes `tool` with `params` as the JSON body and returns the unwrapped `result`.
    pub async fn call<P, R>(&self, protocol: &str, tool: &str, params: &P) -> Result<R, ToolError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.tool_url(protocol, tool);
        tracing::debug!("Calling tool {}", url);

        let response = self.http.post(&url).json(params).send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Tool {} answered {}", tool, status);
            return Err(ToolError::Status {
                tool: tool.to_string(),
                status: status.as_u16(),
            });
        }

        let mut body: Value = response.json().await?;
        let result = body
            .get_mut("result")
            .map(Value::take)
            .ok_or_else(|| ToolError::Decode {
                tool: tool.to_string(),
                message: "missing result field".to_string(),
            })?;
        serde_json::from_value(result).map_err(|e| ToolError::Decode {
            tool: tool.to_string(),
            message: e.to_string(),
        })
    }
}
