use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time;

use super::ConversationState;
use crate::domain::models::AttemptId;
use crate::domain::models::ChatRequest;
use crate::domain::models::CodeFragment;
use crate::domain::models::Event;
use crate::domain::models::ExecutionResult;
use crate::domain::models::Fragment;
use crate::domain::models::FragmentKind;
use crate::domain::models::GenerationBackend;
use crate::domain::models::GenerationBackendArc;
use crate::domain::models::GenerationError;
use crate::domain::models::GenerationSettings;
use crate::domain::models::LoadingState;
use crate::domain::models::Notice;
use crate::domain::models::Role;
use crate::domain::models::SandboxBackend;
use crate::domain::models::SandboxBackendArc;
use crate::domain::models::SandboxRequest;
use crate::domain::models::Session;
use crate::domain::models::Tab;
use crate::domain::services::GenerationService;

#[derive(Default)]
struct ScriptedBackend {
    deltas: Vec<CodeFragment>,
    failure: Option<GenerationError>,
    requests: Arc<Mutex<Vec<ChatRequest>>>,
}

#[async_trait]
impl GenerationBackend for ScriptedBackend {
    async fn health_check(&self) -> Result<()> {
        return Ok(());
    }

    async fn stream_fragment<'a>(
        &self,
        attempt: AttemptId,
        request: ChatRequest,
        tx: &'a mpsc::UnboundedSender<Event>,
    ) -> Result<(), GenerationError> {
        self.requests.lock().unwrap().push(request);

        for delta in self.deltas.iter() {
            tx.send(Event::StreamDelta(attempt, Fragment::Code(delta.clone())))?;
        }

        if let Some(err) = &self.failure {
            return Err(err.clone());
        }

        return Ok(());
    }
}

/// Never produces anything, so events are injected by hand.
struct PendingBackend {}

#[async_trait]
impl GenerationBackend for PendingBackend {
    async fn health_check(&self) -> Result<()> {
        return Ok(());
    }

    async fn stream_fragment<'a>(
        &self,
        _attempt: AttemptId,
        _request: ChatRequest,
        _tx: &'a mpsc::UnboundedSender<Event>,
    ) -> Result<(), GenerationError> {
        futures::future::pending::<()>().await;
        return Ok(());
    }
}

#[derive(Default)]
struct RecordingSandbox {
    requests: Arc<Mutex<Vec<SandboxRequest>>>,
}

#[async_trait]
impl SandboxBackend for RecordingSandbox {
    async fn execute(&self, request: SandboxRequest) -> Result<ExecutionResult> {
        self.requests.lock().unwrap().push(request);

        return Ok(ExecutionResult {
            sbx_id: "sbx-1".to_string(),
            template: "nextjs-developer".to_string(),
            url: Some("https://sbx-1.example.dev".to_string()),
            ..Default::default()
        });
    }
}

fn new_state(
    backend: GenerationBackendArc,
    sandbox: SandboxBackendArc,
    session: Session,
) -> (ConversationState, mpsc::UnboundedReceiver<Event>) {
    let (tx, rx) = mpsc::unbounded_channel::<Event>();
    let generations = GenerationService::new(
        backend,
        sandbox,
        GenerationSettings::default(),
        Duration::from_millis(2000),
        tx,
    );

    return (ConversationState::new(generations, session), rx);
}

fn pending_state() -> (ConversationState, mpsc::UnboundedReceiver<Event>) {
    return new_state(
        Arc::new(PendingBackend {}),
        Arc::new(RecordingSandbox::default()),
        Session::default(),
    );
}

async fn pump(state: &mut ConversationState, rx: &mut mpsc::UnboundedReceiver<Event>, count: usize) {
    for _ in 0..count {
        let event = rx.recv().await.unwrap();
        state.handle_event(event);
    }
}

fn code(commentary: &str, source: Option<&str>) -> CodeFragment {
    return CodeFragment {
        commentary: Some(commentary.to_string()),
        template: Some("nextjs-developer".to_string()),
        title: Some("Counter".to_string()),
        code: source.map(|s| return s.to_string()),
        ..Default::default()
    };
}

mod canned {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn it_synthesizes_camera_feeds_after_the_delay() -> Result<()> {
        let (mut state, mut rx) = pending_state();

        state.submit("Show me camera feeds for store Downtown", vec![]);
        assert_eq!(state.loading, LoadingState::Active(FragmentKind::CameraFeed));
        assert_eq!(state.conversation.len(), 1);

        let early = time::timeout(Duration::from_millis(1999), rx.recv()).await;
        assert!(early.is_err());

        pump(&mut state, &mut rx, 1).await;

        assert!(!state.is_loading());
        assert_eq!(state.conversation.len(), 2);

        let message = state.conversation.last().unwrap();
        assert_eq!(message.role, Role::Assistant);
        let object = serde_json::to_value(message.object.as_ref().unwrap())?;
        assert_eq!(object["type"], "camera_feed");
        assert_eq!(object["store_name"], "Downtown");
        assert_eq!(object["cameras"].as_array().unwrap().len(), 6);

        assert!(state.preview.visible);
        assert_eq!(state.preview.selected_tab, Tab::Fragment);
        assert_eq!(state.preview.fragment, message.object);

        return Ok(());
    }

    #[tokio::test(start_paused = true)]
    async fn it_stops_idempotently() {
        let (mut state, mut rx) = pending_state();
        state.submit("How were sales today?", vec![]);

        state.stop();
        let once = (state.loading, state.conversation.clone(), state.preview.clone());
        state.stop();

        assert_eq!(
            (state.loading, state.conversation.clone(), state.preview.clone()),
            once
        );
        assert_eq!(state.loading, LoadingState::Idle);
        assert_eq!(state.conversation.len(), 1);
        assert!(state.preview.is_empty());

        time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn it_ignores_a_synthesis_that_fires_after_stop() {
        let (mut state, _rx) = pending_state();
        let attempt = state.submit("Forecast next month", vec![]).unwrap();
        state.stop();

        state.handle_event(Event::Synthesized(
            attempt,
            Fragment::Help {
                commentary: "late".to_string(),
                examples: vec![],
            },
        ));

        assert_eq!(state.conversation.len(), 1);
        assert!(state.preview.is_empty());
    }
}

mod streaming {
    use super::*;

    #[tokio::test]
    async fn it_streams_code_and_executes_once() {
        let sandbox = RecordingSandbox::default();
        let sandbox_requests = sandbox.requests.clone();
        let backend = ScriptedBackend {
            deltas: vec![
                CodeFragment {
                    commentary: Some("Building".to_string()),
                    ..Default::default()
                },
                code("Building a counter", None),
                code("Building a counter", Some("export default function Counter() {}")),
            ],
            ..Default::default()
        };
        let (mut state, mut rx) = new_state(Arc::new(backend), Arc::new(sandbox), Session::default());

        state.submit("Build me a counter app", vec![]);
        assert_eq!(state.loading, LoadingState::Active(FragmentKind::Code));

        pump(&mut state, &mut rx, 4).await;

        assert!(!state.is_loading());
        assert_eq!(state.conversation.len(), 2);
        let message = state.conversation.last().unwrap();
        assert!(!message.streaming);
        assert_eq!(
            message.object.as_ref().unwrap().as_code().unwrap().code,
            Some("export default function Counter() {}".to_string())
        );
        assert_eq!(state.preview.selected_tab, Tab::Code);
        assert!(state.preview.loading);

        pump(&mut state, &mut rx, 1).await;

        assert_eq!(sandbox_requests.lock().unwrap().len(), 1);
        assert!(!state.preview.loading);
        assert_eq!(state.preview.selected_tab, Tab::Fragment);
        assert_eq!(state.preview.result.as_ref().unwrap().sbx_id, "sbx-1");
        assert!(state.conversation.last().unwrap().result.is_some());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn it_replaces_partials_without_merging() {
        let (mut state, _rx) = pending_state();
        let attempt = state.submit("Build me a counter app", vec![]).unwrap();

        state.handle_event(Event::StreamDelta(
            attempt,
            Fragment::Code(code("Drafting", Some("let a = 1;"))),
        ));
        assert!(state.conversation.last().unwrap().streaming);

        state.handle_event(Event::StreamDelta(
            attempt,
            Fragment::Code(code("Rethinking", None)),
        ));

        assert_eq!(state.conversation.len(), 2);
        let message = state.conversation.last().unwrap();
        assert_eq!(message.text(), "Rethinking");
        assert_eq!(message.object.as_ref().unwrap().as_code().unwrap().code, None);
        assert!(state.preview.is_empty());
    }

    #[tokio::test]
    async fn it_drops_stale_deltas_after_a_newer_attempt_starts() {
        let (mut state, _rx) = pending_state();

        let first = state.submit("Build a todo app", vec![]).unwrap();
        state.stop();
        let second = state.submit("Build a chess app", vec![]).unwrap();
        assert!(second > first);

        state.handle_event(Event::StreamDelta(first, Fragment::Code(code("stale", None))));
        state.handle_event(Event::StreamFinished(first));

        assert_eq!(state.conversation.len(), 2);
        assert_eq!(state.loading, LoadingState::Active(FragmentKind::Code));

        state.handle_event(Event::StreamDelta(second, Fragment::Code(code("fresh", None))));
        assert_eq!(state.conversation.len(), 3);
        assert_eq!(state.conversation.last().unwrap().text(), "fresh");

        state.handle_event(Event::StreamDelta(first, Fragment::Code(code("stale", None))));
        assert_eq!(state.conversation.last().unwrap().text(), "fresh");
    }

    #[tokio::test]
    async fn it_stops_the_running_generation_on_submit() {
        let (mut state, _rx) = pending_state();

        let first = state.submit("Build a todo app", vec![]).unwrap();
        state.handle_event(Event::StreamDelta(first, Fragment::Code(code("half", None))));
        let second = state.submit("Build a chess app", vec![]).unwrap();

        assert_eq!(state.active_attempt(), Some(second));
        assert_eq!(state.conversation.len(), 3);
        let partial = state.conversation.get(1).unwrap();
        assert_eq!(partial.text(), "half");
        assert!(!partial.streaming);
    }

    #[tokio::test]
    async fn it_flags_rate_limits_until_the_user_retries() {
        let backend = ScriptedBackend {
            failure: Some(GenerationError::RateLimited {
                limit: 10,
                remaining: 0,
                reset: 0,
            }),
            ..Default::default()
        };
        let requests = backend.requests.clone();
        let (mut state, mut rx) = new_state(
            Arc::new(backend),
            Arc::new(RecordingSandbox::default()),
            Session::default(),
        );

        state.submit("Build me a game", vec![]);
        pump(&mut state, &mut rx, 1).await;

        assert!(state.rate_limited);
        assert!(!state.is_loading());
        assert!(state.error.as_ref().unwrap().is_rate_limited());
        assert!(matches!(
            state.drain_notices().as_slice(),
            [Notice::GenerationFailed(GenerationError::RateLimited { .. })]
        ));

        state.retry();
        assert!(!state.rate_limited);
        assert!(state.error.is_none());
        assert_eq!(state.loading, LoadingState::Active(FragmentKind::Code));

        pump(&mut state, &mut rx, 1).await;
        let requests = requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].messages.len(), 1);
        assert_eq!(state.conversation.len(), 1);
    }

    #[tokio::test]
    async fn it_fails_streams_that_produce_nothing() {
        let (mut state, mut rx) = new_state(
            Arc::new(ScriptedBackend::default()),
            Arc::new(RecordingSandbox::default()),
            Session::default(),
        );

        state.submit("Build me a game", vec![]);
        pump(&mut state, &mut rx, 1).await;

        assert!(!state.is_loading());
        assert_eq!(state.error.as_ref().unwrap().kind(), "unexpected");
        assert!(!state.rate_limited);
    }

    #[tokio::test(start_paused = true)]
    async fn it_retries_canned_requests_through_generation() {
        let (mut state, mut rx) = pending_state();
        state.submit("How were sales today?", vec![]);
        pump(&mut state, &mut rx, 1).await;

        let attempt = state.retry().unwrap();
        assert_eq!(state.loading, LoadingState::Active(FragmentKind::Code));

        state.handle_event(Event::StreamDelta(attempt, Fragment::Code(code("Regenerated", None))));
        assert_eq!(state.conversation.len(), 2);
        assert_eq!(state.conversation.last().unwrap().text(), "Regenerated");
    }
}

mod lifecycle {
    use super::*;

    #[tokio::test]
    async fn it_holds_submissions_until_signed_in() {
        let session = Session {
            auth_required: true,
            ..Default::default()
        };
        let (mut state, mut rx) = new_state(
            Arc::new(PendingBackend {}),
            Arc::new(RecordingSandbox::default()),
            session,
        );

        assert_eq!(state.submit("Build me a game", vec![]), None);
        assert_eq!(state.conversation.len(), 1);
        assert!(!state.is_loading());
        assert_eq!(state.drain_notices(), vec![Notice::AuthRequired]);
        assert!(rx.try_recv().is_err());

        state.session.login("alice", None, None);
        assert!(state.submit("Build me a game", vec![]).is_some());
        assert_eq!(state.conversation.len(), 2);
        assert_eq!(state.conversation.get(0).unwrap().text(), "Build me a game");
        assert!(state.is_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn it_undoes_one_exchange() {
        let (mut state, mut rx) = pending_state();
        assert!(!state.undo());

        state.submit("What can you do?", vec![]);
        assert!(!state.undo());

        pump(&mut state, &mut rx, 1).await;
        assert!(!state.preview.is_empty());

        assert!(state.undo());
        assert!(state.conversation.is_empty());
        assert!(state.preview.is_empty());
        assert!(!state.preview.visible);
    }

    #[tokio::test]
    async fn it_refuses_undo_with_a_single_message() {
        let (mut state, _rx) = pending_state();
        state.submit("Build me a game", vec![]);
        state.stop();

        assert!(!state.undo());
        assert_eq!(state.conversation.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn it_keeps_the_previous_exchange_after_a_failed_turn() {
        let (mut state, mut rx) = pending_state();
        state.submit("What can you do?", vec![]);
        pump(&mut state, &mut rx, 1).await;

        let attempt = state.submit("Build me a chess game", vec![]).unwrap();
        state.handle_event(Event::StreamFailed(
            attempt,
            GenerationError::Overloaded("busy".to_string()),
        ));
        assert!(!state.is_loading());

        assert!(!state.undo());
        let roles = state
            .conversation
            .messages()
            .iter()
            .map(|message| return message.role)
            .collect::<Vec<Role>>();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User]);
    }

    #[tokio::test(start_paused = true)]
    async fn it_selects_fragments_from_history() {
        let (mut state, mut rx) = pending_state();
        state.submit("What can you do?", vec![]);
        pump(&mut state, &mut rx, 1).await;
        state.submit("Show me the cameras", vec![]);
        pump(&mut state, &mut rx, 1).await;

        assert_eq!(
            state.preview.fragment.as_ref().unwrap().kind(),
            FragmentKind::CameraFeed
        );

        state.close_preview();
        assert!(!state.select_message(0));
        assert!(state.select_message(1));
        assert!(state.preview.visible);
        assert_eq!(state.preview.fragment.as_ref().unwrap().kind(), FragmentKind::Help);

        state.set_tab(Tab::Code);
        assert_eq!(state.preview.selected_tab, Tab::Code);
    }

    #[tokio::test(start_paused = true)]
    async fn it_clears_everything() {
        let (mut state, mut rx) = pending_state();
        state.submit("What can you do?", vec![]);
        pump(&mut state, &mut rx, 1).await;
        state.submit("Build me a game", vec![]);

        state.clear();

        assert!(state.conversation.is_empty());
        assert!(state.preview.is_empty());
        assert_eq!(state.loading, LoadingState::Idle);
        assert_eq!(state.active_attempt(), None);
    }

    #[tokio::test]
    async fn it_ignores_blank_submissions() {
        let (mut state, _rx) = pending_state();

        assert_eq!(state.submit("   ", vec![]), None);
        assert!(state.conversation.is_empty());
    }
}
