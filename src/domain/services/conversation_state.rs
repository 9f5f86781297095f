#[cfg(test)]
#[path = "conversation_state_test.rs"]
mod tests;

use std::mem;

use super::GenerationService;
use super::IntentClassifier;
use crate::domain::models::AttemptId;
use crate::domain::models::ChatRequest;
use crate::domain::models::ContentPart;
use crate::domain::models::Conversation;
use crate::domain::models::Event;
use crate::domain::models::ExecutionResult;
use crate::domain::models::Fragment;
use crate::domain::models::FragmentKind;
use crate::domain::models::GenerationError;
use crate::domain::models::GenerationRequest;
use crate::domain::models::LoadingState;
use crate::domain::models::Message;
use crate::domain::models::Notice;
use crate::domain::models::PreviewState;
use crate::domain::models::SandboxRequest;
use crate::domain::models::Session;
use crate::domain::models::Tab;

/// Owns the transcript, the preview and the single active generation.
///
/// Workers never touch this state. They report `Event`s which the owner feeds
/// back through `handle_event`, where anything not belonging to the active
/// attempt is dropped.
pub struct ConversationState {
    pub conversation: Conversation,
    pub preview: PreviewState,
    pub loading: LoadingState,
    pub session: Session,
    pub error: Option<GenerationError>,
    /// Stays set after a rate-limit failure until the user acts again.
    pub rate_limited: bool,
    generations: GenerationService,
    active: Option<GenerationRequest>,
    last_attempt: AttemptId,
    notices: Vec<Notice>,
}

impl ConversationState {
    pub fn new(generations: GenerationService, session: Session) -> ConversationState {
        return ConversationState {
            conversation: Conversation::default(),
            preview: PreviewState::default(),
            loading: LoadingState::Idle,
            session,
            error: None,
            rate_limited: false,
            generations,
            active: None,
            last_attempt: AttemptId::default(),
            notices: vec![],
        };
    }

    pub fn generations(&self) -> &GenerationService {
        return &self.generations;
    }

    pub fn is_loading(&self) -> bool {
        return self.loading.is_loading();
    }

    pub fn active_attempt(&self) -> Option<AttemptId> {
        return self.active.as_ref().map(|active| return active.attempt);
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        return mem::take(&mut self.notices);
    }

    /// Records a user message and starts generating a reply for it. Any
    /// running generation is stopped first; its partial reply stays in the
    /// transcript.
    pub fn submit(&mut self, text: &str, attachments: Vec<ContentPart>) -> Option<AttemptId> {
        self.stop();

        let text = text.trim();
        if text.is_empty() && attachments.is_empty() {
            return None;
        }

        self.conversation.push(Message::user(text, attachments));
        self.error = None;
        self.rate_limited = false;

        if !self.session.can_generate() {
            tracing::debug!("Submission held until the user signs in");
            self.notices.push(Notice::AuthRequired);
            return None;
        }

        let kind = IntentClassifier::classify(text);
        return Some(self.dispatch(kind, text));
    }

    /// Sends the conversation up to the most recent user message to the
    /// generative path again.
    pub fn retry(&mut self) -> Option<AttemptId> {
        self.stop();

        if self.conversation.through_last_user().is_none() {
            return None;
        }

        self.error = None;
        self.rate_limited = false;

        if !self.session.can_generate() {
            self.notices.push(Notice::AuthRequired);
            return None;
        }

        return Some(self.dispatch(FragmentKind::Code, ""));
    }

    /// Cancels the active attempt. Calling it with nothing running only
    /// resets the loading state.
    pub fn stop(&mut self) {
        if let Some(active) = self.active.take() {
            tracing::debug!(attempt = %active.attempt, kind = %active.kind, "Stopping generation");
            active.abort();

            if let Some(last) = self.conversation.last_mut() {
                last.streaming = false;
            }
        }

        self.loading = LoadingState::Idle;
    }

    /// Drops the last exchange. Refused while generating or when there is no
    /// full exchange to remove.
    pub fn undo(&mut self) -> bool {
        if self.active.is_some() {
            return false;
        }

        if !self.conversation.undo() {
            return false;
        }

        self.preview.reset();
        return true;
    }

    pub fn clear(&mut self) {
        self.stop();
        self.conversation.clear();
        self.preview.reset();
        self.loading = LoadingState::Idle;
        self.error = None;
        self.rate_limited = false;
    }

    /// Puts the fragment of an earlier message back on display.
    pub fn select_message(&mut self, index: usize) -> bool {
        let message = match self.conversation.get(index) {
            Some(message) if !message.streaming => message,
            _ => return false,
        };

        if let Some(fragment) = message.object.clone() {
            let result = message.result.clone();
            let attempt = message.attempt;
            self.preview.show(fragment, result, Tab::Fragment, attempt);
            return true;
        }

        return false;
    }

    pub fn set_tab(&mut self, tab: Tab) {
        self.preview.selected_tab = tab;
    }

    pub fn close_preview(&mut self) {
        self.preview.close();
    }

    pub fn handle_event(&mut self, event: Event) {
        if let Event::SandboxFinished(attempt, result) = event {
            self.apply_execution(attempt, result);
            return;
        }

        let attempt = event.attempt();
        if self.active_attempt() != Some(attempt) {
            tracing::debug!(attempt = %attempt, active = ?self.active_attempt(), "Dropping event from stale attempt");
            return;
        }

        match event {
            Event::Synthesized(_, fragment) => self.settle_synthesis(attempt, fragment),
            Event::StreamDelta(_, fragment) => self.apply_delta(attempt, fragment),
            Event::StreamFinished(_) => self.settle_stream(attempt),
            Event::StreamFailed(_, err) => self.settle_failure(err),
            Event::SandboxFinished(..) => (),
        }
    }

    fn dispatch(&mut self, kind: FragmentKind, text: &str) -> AttemptId {
        let attempt = self.last_attempt.next();
        self.last_attempt = attempt;

        let handle = if kind.is_canned() {
            self.generations.synthesize(attempt, kind, text.to_string())
        } else {
            let history = self.conversation.through_last_user().unwrap_or_default();
            let request = ChatRequest::new(history, &self.session, self.generations.settings());
            self.generations.stream(attempt, request)
        };

        tracing::debug!(attempt = %attempt, kind = %kind, "Dispatched generation");
        self.active = Some(GenerationRequest {
            attempt,
            kind,
            handle,
        });
        self.loading = LoadingState::Active(kind);

        return attempt;
    }

    fn finish(&mut self) {
        self.active = None;
        self.loading = LoadingState::Idle;
    }

    fn settle_synthesis(&mut self, attempt: AttemptId, fragment: Fragment) {
        self.finish();
        self.conversation
            .push(Message::assistant(fragment.clone(), attempt));
        self.preview
            .show(fragment, None, Tab::Fragment, Some(attempt));
    }

    /// Partial values replace whatever the last assistant message held.
    fn apply_delta(&mut self, attempt: AttemptId, fragment: Fragment) {
        if let Some(last) = self.conversation.last_mut() {
            if last.is_assistant() {
                last.replace_object(fragment);
                last.result = None;
                last.attempt = Some(attempt);
                last.streaming = true;
                return;
            }
        }

        let mut message = Message::assistant(fragment, attempt);
        message.streaming = true;
        self.conversation.push(message);
    }

    fn settle_stream(&mut self, attempt: AttemptId) {
        self.finish();

        let mut fragment = None;
        if let Some(last) = self.conversation.last_mut() {
            if last.is_assistant() && last.attempt == Some(attempt) {
                last.streaming = false;
                fragment = last.object.clone();
            }
        }

        let fragment = match fragment {
            Some(fragment) => fragment,
            None => {
                tracing::warn!(attempt = %attempt, "Stream finished without a fragment");
                self.settle_failure(GenerationError::Unexpected(
                    "the model returned an empty response".to_string(),
                ));
                return;
            }
        };

        let executable = fragment
            .as_code()
            .map(|code| return code.has_executable_code())
            .unwrap_or(false);

        self.preview
            .show(fragment.clone(), None, Tab::Code, Some(attempt));

        if executable {
            self.preview.loading = true;
            let request = SandboxRequest::new(fragment, &self.session);
            self.generations.execute(attempt, request);
        }
    }

    fn settle_failure(&mut self, err: GenerationError) {
        self.finish();
        if let Some(last) = self.conversation.last_mut() {
            last.streaming = false;
        }

        self.rate_limited = err.is_rate_limited();
        self.notices.push(Notice::GenerationFailed(err.clone()));
        self.error = Some(err);
    }

    fn apply_execution(&mut self, attempt: AttemptId, result: Result<ExecutionResult, String>) {
        let showing = self.preview.is_showing(attempt);
        if showing {
            self.preview.loading = false;
        }

        match result {
            Ok(result) => {
                if let Some(message) = self.conversation.find_by_attempt_mut(attempt) {
                    message.result = Some(result.clone());
                } else {
                    tracing::debug!(attempt = %attempt, "Execution result for a removed message");
                }

                if showing {
                    self.preview.result = Some(result);
                    self.preview.selected_tab = Tab::Fragment;
                }
            }
            Err(err) => {
                self.notices.push(Notice::SandboxFailed(err));
            }
        }
    }
}
