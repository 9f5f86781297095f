use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time;

use super::CannedSynthesizer;
use crate::domain::models::AttemptId;
use crate::domain::models::ChatRequest;
use crate::domain::models::Event;
use crate::domain::models::FragmentKind;
use crate::domain::models::GenerationBackendArc;
use crate::domain::models::GenerationSettings;
use crate::domain::models::SandboxBackendArc;
use crate::domain::models::SandboxRequest;

fn send_event(tx: &mpsc::UnboundedSender<Event>, event: Event) {
    if tx.send(event).is_err() {
        tracing::debug!("Event receiver dropped, discarding generation result");
    }
}

/// Spawns the workers behind each attempt. Every worker reports back through
/// the event channel; aborting its handle cancels it without a report.
pub struct GenerationService {
    backend: GenerationBackendArc,
    sandbox: SandboxBackendArc,
    settings: GenerationSettings,
    synthesis_delay: Duration,
    tx: mpsc::UnboundedSender<Event>,
}

impl GenerationService {
    pub fn new(
        backend: GenerationBackendArc,
        sandbox: SandboxBackendArc,
        settings: GenerationSettings,
        synthesis_delay: Duration,
        tx: mpsc::UnboundedSender<Event>,
    ) -> GenerationService {
        return GenerationService {
            backend,
            sandbox,
            settings,
            synthesis_delay,
            tx,
        };
    }

    pub fn settings(&self) -> &GenerationSettings {
        return &self.settings;
    }

    pub fn backend(&self) -> &GenerationBackendArc {
        return &self.backend;
    }

    pub fn synthesize(&self, attempt: AttemptId, kind: FragmentKind, text: String) -> JoinHandle<()> {
        let tx = self.tx.clone();
        let delay = self.synthesis_delay;

        return tokio::spawn(async move {
            time::sleep(delay).await;

            if let Some(fragment) = CannedSynthesizer::synthesize(kind, &text) {
                send_event(&tx, Event::Synthesized(attempt, fragment));
            } else {
                tracing::warn!(attempt = %attempt, kind = %kind, "No canned fragment for kind");
            }
        });
    }

    pub fn stream(&self, attempt: AttemptId, request: ChatRequest) -> JoinHandle<()> {
        let tx = self.tx.clone();
        let backend = self.backend.clone();

        return tokio::spawn(async move {
            let res = backend.stream_fragment(attempt, request, &tx).await;

            match res {
                Ok(()) => send_event(&tx, Event::StreamFinished(attempt)),
                Err(err) => {
                    tracing::error!(attempt = %attempt, error = ?err, "Generation stream failed");
                    send_event(&tx, Event::StreamFailed(attempt, err));
                }
            }
        });
    }

    pub fn execute(&self, attempt: AttemptId, request: SandboxRequest) -> JoinHandle<()> {
        let tx = self.tx.clone();
        let sandbox = self.sandbox.clone();

        return tokio::spawn(async move {
            let res = sandbox
                .execute(request)
                .await
                .map_err(|err| return format!("{err:#}"));

            if let Err(err) = &res {
                tracing::error!(attempt = %attempt, error = %err, "Sandbox execution failed");
            }
            send_event(&tx, Event::SandboxFinished(attempt, res));
        });
    }
}
