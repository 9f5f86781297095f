#[cfg(test)]
#[path = "backend_test.rs"]
mod tests;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_derive::Deserialize;
use serde_derive::Serialize;
use tokio::sync::mpsc;

use super::AttemptId;
use super::ContentPart;
use super::Event;
use super::ExecutionResult;
use super::Fragment;
use super::GenerationError;
use super::Message;
use super::Role;
use super::Session;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestMessage {
    pub role: Role,
    pub content: Vec<ContentPart>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDescriptor {
    pub id: String,
    pub provider: String,
    pub provider_id: String,
    pub name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(rename = "baseURL", skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// Everything besides history that goes into a generation request.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GenerationSettings {
    pub template: String,
    pub model: ModelDescriptor,
    pub config: GenerationConfig,
}

/// Body of the streaming generation endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<RequestMessage>,
    #[serde(rename = "userID", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(rename = "teamID", skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
    pub template: String,
    pub model: ModelDescriptor,
    pub config: GenerationConfig,
}

impl ChatRequest {
    pub fn new(messages: &[Message], session: &Session, settings: &GenerationSettings) -> ChatRequest {
        let messages = messages
            .iter()
            .map(|message| {
                let content = message
                    .content
                    .iter()
                    .map(|part| {
                        if let ContentPart::Code { text } = part {
                            return ContentPart::Text { text: text.clone() };
                        }
                        return part.clone();
                    })
                    .collect();

                return RequestMessage {
                    role: message.role,
                    content,
                };
            })
            .collect();

        return ChatRequest {
            messages,
            user_id: session.user_id.clone(),
            team_id: session.team_id.clone(),
            template: settings.template.clone(),
            model: settings.model.clone(),
            config: settings.config.clone(),
        };
    }

    /// Credential supplied by the caller, if any.
    pub fn api_key(&self) -> Option<&str> {
        return self
            .config
            .api_key
            .as_deref()
            .filter(|key| return !key.is_empty());
    }
}

/// Body of the sandbox execution endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SandboxRequest {
    pub fragment: Fragment,
    #[serde(rename = "userID", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(rename = "teamID", skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

impl SandboxRequest {
    pub fn new(fragment: Fragment, session: &Session) -> SandboxRequest {
        return SandboxRequest {
            fragment,
            user_id: session.user_id.clone(),
            team_id: session.team_id.clone(),
            access_token: session.access_token.clone(),
        };
    }
}

#[async_trait]
pub trait GenerationBackend {
    /// Used when starting a chat to warn early if the endpoint is unreachable.
    async fn health_check(&self) -> Result<()>;

    /// Streams a fragment for the conversation. Each partial value is sent as
    /// an `Event::StreamDelta` and replaces the previous one. Returns once the
    /// stream is exhausted; the caller reports completion.
    async fn stream_fragment<'a>(
        &self,
        attempt: AttemptId,
        request: ChatRequest,
        tx: &'a mpsc::UnboundedSender<Event>,
    ) -> Result<(), GenerationError>;
}

pub type GenerationBackendArc = Arc<dyn GenerationBackend + Send + Sync>;

#[async_trait]
pub trait SandboxBackend {
    /// Executes a code fragment and returns where it can be reached.
    async fn execute(&self, request: SandboxRequest) -> Result<ExecutionResult>;
}

pub type SandboxBackendArc = Arc<dyn SandboxBackend + Send + Sync>;
