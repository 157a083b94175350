//! A backend that replays canned responses instead of calling a provider.
//!
//! Used by tests across the workspace and for running the server offline.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::AnalysisError;
use crate::provider::{Prompt, ProviderBackend, ProviderId, RequestConfig, RequestKind};

#[derive(Debug, Clone)]
struct Step {
    delay: Duration,
    result: Result<String, AnalysisError>,
}

#[derive(Default)]
struct Queue {
    steps: VecDeque<Step>,
    /// Replayed whenever `steps` is empty.
    otherwise: Option<Step>,
}

impl Queue {
    fn next(&mut self) -> Option<Step> {
        self.steps.pop_front().or_else(|| self.otherwise.clone())
    }
}

pub struct ScriptedBackend {
    id: ProviderId,
    moves: Mutex<Queue>,
    analyses: Mutex<Queue>,
    calls: AtomicU32,
    prompts: Mutex<Vec<Prompt>>,
}

impl ScriptedBackend {
    pub fn new(id: ProviderId) -> Self {
        Self {
            id,
            moves: Mutex::new(Queue::default()),
            analyses: Mutex::new(Queue::default()),
            calls: AtomicU32::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn queue(&self, kind: RequestKind) -> &Mutex<Queue> {
        match kind {
            RequestKind::SuggestMove => &self.moves,
            RequestKind::Analyze => &self.analyses,
        }
    }

    fn push(self, kind: RequestKind, delay: Duration, result: Result<String, AnalysisError>) -> Self {
        if let Ok(mut queue) = self.queue(kind).lock() {
            queue.steps.push_back(Step { delay, result });
        }
        self
    }

    fn set_otherwise(self, kind: RequestKind, result: Result<String, AnalysisError>) -> Self {
        if let Ok(mut queue) = self.queue(kind).lock() {
            queue.otherwise = Some(Step {
                delay: Duration::ZERO,
                result,
            });
        }
        self
    }

    pub fn move_reply(self, text: impl Into<String>) -> Self {
        self.push(RequestKind::SuggestMove, Duration::ZERO, Ok(text.into()))
    }

    pub fn move_reply_after(self, delay: Duration, text: impl Into<String>) -> Self {
        self.push(RequestKind::SuggestMove, delay, Ok(text.into()))
    }

    pub fn move_failure(self, error: AnalysisError) -> Self {
        self.push(RequestKind::SuggestMove, Duration::ZERO, Err(error))
    }

    pub fn moves_otherwise(self, result: Result<String, AnalysisError>) -> Self {
        self.set_otherwise(RequestKind::SuggestMove, result)
    }

    pub fn analysis_reply(self, text: impl Into<String>) -> Self {
        self.push(RequestKind::Analyze, Duration::ZERO, Ok(text.into()))
    }

    pub fn analysis_failure(self, error: AnalysisError) -> Self {
        self.push(RequestKind::Analyze, Duration::ZERO, Err(error))
    }

    pub fn analyses_otherwise(self, result: Result<String, AnalysisError>) -> Self {
        self.set_otherwise(RequestKind::Analyze, result)
    }

    /// Total `complete` calls so far, both kinds.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<Prompt> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ProviderBackend for ScriptedBackend {
    fn id(&self) -> ProviderId {
        self.id
    }

    async fn complete(&self, prompt: &Prompt, _config: &RequestConfig) -> Result<String, AnalysisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.clone());
        }

        let step = self
            .queue(prompt.kind)
            .lock()
            .ok()
            .and_then(|mut queue| queue.next());
        let Some(step) = step else {
            return Err(AnalysisError::ProviderUnavailable(format!("{}: script exhausted", self.id)));
        };

        if !step.delay.is_zero() {
            tokio::time::sleep(step.delay).await;
        }
        step.result
    }
}
