#[cfg(test)]
#[path = "sandbox_api_test.rs"]
mod tests;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::ExecutionResult;
use crate::domain::models::SandboxBackend;
use crate::domain::models::SandboxRequest;

/// Client for the sandbox execution endpoint, `POST {url}/api/sandbox`.
pub struct SandboxApi {
    url: String,
}

impl Default for SandboxApi {
    fn default() -> SandboxApi {
        return SandboxApi {
            url: Config::get(ConfigKey::SandboxURL),
        };
    }
}

#[async_trait]
impl SandboxBackend for SandboxApi {
    #[allow(clippy::implicit_return)]
    async fn execute(&self, request: SandboxRequest) -> Result<ExecutionResult> {
        if self.url.is_empty() {
            bail!("Sandbox URL is not defined");
        }

        let res = reqwest::Client::new()
            .post(format!("{url}/api/sandbox", url = self.url))
            .json(&request)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            tracing::error!(status = status, body = %body, "Failed to execute fragment in sandbox");
            bail!(format!("Sandbox request failed with status {status}"));
        }

        let result = res.json::<ExecutionResult>().await?;
        tracing::debug!(sbx_id = %result.sbx_id, url = ?result.url, "Sandbox ready");

        return Ok(result);
    }
}
