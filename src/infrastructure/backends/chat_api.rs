#[cfg(test)]
#[path = "chat_api_test.rs"]
mod tests;

use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use futures::stream::TryStreamExt;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tokio_util::io::StreamReader;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::AttemptId;
use crate::domain::models::ChatRequest;
use crate::domain::models::CodeFragment;
use crate::domain::models::Event;
use crate::domain::models::Fragment;
use crate::domain::models::GenerationBackend;
use crate::domain::models::GenerationError;

fn convert_err(err: reqwest::Error) -> std::io::Error {
    let err_msg = err.to_string();
    return std::io::Error::new(std::io::ErrorKind::Interrupted, err_msg);
}

/// Strips SSE framing from a stream line. Returns `None` for lines carrying no
/// value.
fn clean_line(line: &str) -> Option<&str> {
    let mut cleaned_line = line.trim();
    if let Some(data) = cleaned_line.strip_prefix("data:") {
        cleaned_line = data.trim();
    }

    if cleaned_line.is_empty() || cleaned_line == "[DONE]" {
        return None;
    }

    return Some(cleaned_line);
}

/// Client for the streaming generation endpoint, `POST {url}/api/chat`.
pub struct ChatApi {
    url: String,
    timeout: String,
}

impl Default for ChatApi {
    fn default() -> ChatApi {
        return ChatApi {
            url: Config::get(ConfigKey::EndpointURL),
            timeout: Config::get(ConfigKey::HealthCheckTimeout),
        };
    }
}

#[async_trait]
impl GenerationBackend for ChatApi {
    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        if self.url.is_empty() {
            bail!("Generation endpoint URL is not defined");
        }

        let res = reqwest::Client::new()
            .get(&self.url)
            .timeout(Duration::from_millis(self.timeout.parse::<u64>()?))
            .send()
            .await;

        let res = match res {
            Ok(res) => res,
            Err(err) => {
                tracing::error!(error = ?err, "Generation endpoint is not reachable");
                bail!("Generation endpoint is not reachable");
            }
        };

        let status = res.status().as_u16();
        if status >= 500 {
            tracing::error!(status = status, "Generation endpoint health check failed");
            bail!("Generation endpoint health check failed");
        }

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn stream_fragment<'a>(
        &self,
        attempt: AttemptId,
        request: ChatRequest,
        tx: &'a mpsc::UnboundedSender<Event>,
    ) -> Result<(), GenerationError> {
        let res = reqwest::Client::new()
            .post(format!("{url}/api/chat", url = self.url))
            .json(&request)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            tracing::error!(
                attempt = %attempt,
                status = status,
                body = %body,
                "Failed to make generation request"
            );
            return Err(GenerationError::classify(status, &body));
        }

        let stream = res.bytes_stream().map_err(convert_err);
        let mut lines_reader = StreamReader::new(stream).lines();

        while let Some(line) = lines_reader.next_line().await? {
            let cleaned_line = match clean_line(&line) {
                Some(cleaned_line) => cleaned_line,
                None => continue,
            };

            let partial: CodeFragment = serde_json::from_str(cleaned_line)?;
            tracing::debug!(attempt = %attempt, body = ?partial, "Generation delta");
            tx.send(Event::StreamDelta(attempt, Fragment::Code(partial)))?;
        }

        return Ok(());
    }
}
