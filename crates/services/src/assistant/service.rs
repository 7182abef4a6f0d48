use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use prep_core::model::{KnowledgeBase, KnowledgeReply, SuggestedAction};

use super::generator::{DEFAULT_TIMEOUT, TextGenerator};
use crate::error::GenerationError;

pub const DEGRADED_NOTICE: &str =
    "The online assistant is unavailable right now, so this answer comes from offline guidance.";

/// Which path produced a chat reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    Knowledge,
    Remote,
    /// Remote generation failed; the keyword table answered instead.
    Degraded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantReply {
    pub text: String,
    pub action: Option<SuggestedAction>,
    pub source: ReplySource,
    pub notice: Option<&'static str>,
}

impl AssistantReply {
    fn local(reply: KnowledgeReply, source: ReplySource) -> Self {
        Self {
            text: reply.text,
            action: reply.action,
            notice: (source == ReplySource::Degraded).then_some(DEGRADED_NOTICE),
            source,
        }
    }
}

/// Chat answers from an optional remote generator, backed by the keyword table.
pub struct AssistantService {
    knowledge: KnowledgeBase,
    generator: Option<Arc<dyn TextGenerator>>,
    timeout: Duration,
}

impl AssistantService {
    /// Keyword-only assistant.
    #[must_use]
    pub fn local(knowledge: KnowledgeBase) -> Self {
        Self {
            knowledge,
            generator: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_generator(mut self, generator: Arc<dyn TextGenerator>, timeout: Duration) -> Self {
        self.generator = Some(generator);
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn is_remote_enabled(&self) -> bool {
        self.generator.is_some()
    }

    #[must_use]
    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    #[must_use]
    pub fn respond_local(&self, text: &str) -> AssistantReply {
        AssistantReply::local(self.knowledge.respond(text), ReplySource::Knowledge)
    }

    /// Answer `text`, trying the remote generator once when configured.
    pub async fn respond(&self, text: &str) -> AssistantReply {
        let Some(generator) = self.generator.as_ref() else {
            return self.respond_local(text);
        };
        if text.trim().is_empty() {
            return self.respond_local(text);
        }

        let generated = match tokio::time::timeout(self.timeout, generator.generate(text)).await {
            Ok(result) => result,
            Err(_) => Err(GenerationError::Timeout),
        };

        match generated {
            Ok(answer) => {
                debug!(chars = answer.len(), "remote assistant answered");
                let local = self.knowledge.respond(text);
                AssistantReply {
                    text: answer,
                    action: local.matched.and(local.action),
                    source: ReplySource::Remote,
                    notice: None,
                }
            }
            Err(err) => {
                warn!(%err, "remote assistant failed, using offline guidance");
                AssistantReply::local(self.knowledge.respond(text), ReplySource::Degraded)
            }
        }
    }

    /// Start answering in the background. Drop or cancel the handle when the
    /// chat screen goes away.
    #[must_use]
    pub fn submit(self: &Arc<Self>, text: String) -> PendingReply {
        let service = Arc::clone(self);
        let handle = tokio::spawn(async move { service.respond(&text).await });
        PendingReply {
            handle: Some(handle),
        }
    }
}

/// In-flight chat request. Aborted when dropped.
#[derive(Debug)]
pub struct PendingReply {
    handle: Option<JoinHandle<AssistantReply>>,
}

impl PendingReply {
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// The reply, or `None` if the request was cancelled.
    pub async fn wait(mut self) -> Option<AssistantReply> {
        let handle = self.handle.take()?;
        match handle.await {
            Ok(reply) => Some(reply),
            Err(err) => {
                debug!(%err, "chat request did not complete");
                None
            }
        }
    }
}

impl Drop for PendingReply {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use prep_core::catalog;
    use prep_core::model::{ActionTarget, EMPTY_QUESTION_REPLY, FALLBACK_REPLY, ModuleKey};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Canned(&'static str);

    #[async_trait]
    impl TextGenerator for Canned {
        async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
            Ok(self.0.to_string())
        }
    }

    struct Failing;

    #[async_trait]
    impl TextGenerator for Failing {
        async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
            Err(GenerationError::EmptyResponse)
        }
    }

    struct Slow(Arc<AtomicUsize>);

    #[async_trait]
    impl TextGenerator for Slow {
        async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok("late".to_string())
        }
    }

    fn with(generator: impl TextGenerator + 'static) -> AssistantService {
        AssistantService::local(catalog::knowledge_base())
            .with_generator(Arc::new(generator), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn local_reply_uses_keyword_table() {
        let service = AssistantService::local(catalog::knowledge_base());
        let reply = service.respond("what about earthquake safety").await;
        assert_eq!(reply.source, ReplySource::Knowledge);
        assert!(reply.text.contains("Drop, Cover, and Hold On"));
        assert_eq!(
            reply.action.map(|a| a.target),
            Some(ActionTarget::OpenModule(ModuleKey::Earthquake))
        );
    }

    #[tokio::test]
    async fn remote_answer_keeps_matching_action() {
        let reply = with(Canned("Stay calm.")).respond("flood tips").await;
        assert_eq!(reply.source, ReplySource::Remote);
        assert_eq!(reply.text, "Stay calm.");
        assert_eq!(
            reply.action.map(|a| a.target),
            Some(ActionTarget::OpenModule(ModuleKey::Flood))
        );

        let reply = with(Canned("No idea.")).respond("volcano").await;
        assert!(reply.action.is_none());
    }

    #[tokio::test]
    async fn failure_degrades_to_local() {
        let reply = with(Failing).respond("volcano").await;
        assert_eq!(reply.source, ReplySource::Degraded);
        assert_eq!(reply.text, FALLBACK_REPLY);
        assert_eq!(reply.notice, Some(DEGRADED_NOTICE));
    }

    #[tokio::test]
    async fn blank_input_skips_remote() {
        let reply = with(Canned("ignored")).respond("  ").await;
        assert_eq!(reply.source, ReplySource::Knowledge);
        assert_eq!(reply.text, EMPTY_QUESTION_REPLY);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_degrades() {
        let calls = Arc::new(AtomicUsize::new(0));
        let reply = with(Slow(Arc::clone(&calls))).respond("fire").await;
        assert_eq!(reply.source, ReplySource::Degraded);
        assert!(reply.text.contains("Stop, Drop, and Roll"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn submitted_request_resolves() {
        let service = Arc::new(with(Canned("Go to higher ground.")));
        let pending = service.submit("flood".to_string());
        let reply = pending.wait().await.unwrap();
        assert_eq!(reply.text, "Go to higher ground.");
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_request_never_delivers() {
        let calls = Arc::new(AtomicUsize::new(0));
        let service = Arc::new(
            AssistantService::local(catalog::knowledge_base())
                .with_generator(Arc::new(Slow(Arc::clone(&calls))), Duration::from_secs(120)),
        );

        let mut pending = service.submit("fire".to_string());
        tokio::task::yield_now().await;
        assert!(pending.is_pending());
        pending.cancel();
        assert!(!pending.is_pending());
        assert_eq!(pending.wait().await, None);

        drop(service.submit("flood".to_string()));
        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
