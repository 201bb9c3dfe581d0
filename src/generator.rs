use crate::error::Result;
use crate::fallback::LocalCorpus;
use crate::prompt::{build_prompt, resolve_seed};
use crate::providers::{check_capabilities, CompletionProvider};
use crate::resolver::ResponseResolver;
use crate::types::{GenerationRequest, GenerationResult};
use rand::Rng;
use std::sync::Arc;
use tracing::info;

/// Builds the prompt, makes one provider call, and resolves the reply.
///
/// Each call is one attempt. There is no retry: a failed call resolves to a
/// fallback result and the caller decides whether to try again.
#[derive(Clone)]
pub struct CaptionGenerator {
    provider: Arc<dyn CompletionProvider>,
    resolver: ResponseResolver,
}

impl std::fmt::Debug for CaptionGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptionGenerator")
            .field("provider", &self.provider.name())
            .field("model", &self.provider.model())
            .finish()
    }
}

impl CaptionGenerator {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self {
            provider,
            resolver: ResponseResolver::default(),
        }
    }

    /// Use a different fallback corpus.
    pub fn with_corpus(mut self, corpus: LocalCorpus) -> Self {
        self.resolver = ResponseResolver::new(corpus);
        self
    }

    pub fn provider(&self) -> &dyn CompletionProvider {
        self.provider.as_ref()
    }

    /// Run one attempt, drawing a variety seed from the thread RNG if needed.
    ///
    /// # Errors
    ///
    /// Only configuration errors are returned (missing credential, image sent
    /// to a model without vision). Transport and format problems produce a
    /// fallback [`GenerationResult`].
    pub async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        let seed = resolve_seed(request, &mut rand::rng());
        self.run(request, seed).await
    }

    /// Run one attempt with an explicit random source for seed selection.
    pub async fn generate_with_rng<R: Rng + ?Sized>(
        &self,
        request: &GenerationRequest,
        rng: &mut R,
    ) -> Result<GenerationResult> {
        let seed = resolve_seed(request, rng);
        self.run(request, seed).await
    }

    async fn run(&self, request: &GenerationRequest, seed: String) -> Result<GenerationResult> {
        let prompt = build_prompt(request, &seed);
        check_capabilities(self.provider.as_ref(), &prompt)?;

        info!(
            provider = self.provider.name(),
            model = self.provider.model(),
            attempt = request.attempt,
            mode = ?request.mode(),
            "requesting caption"
        );

        let outcome = match self.provider.complete(&prompt).await {
            Err(err) if err.is_configuration() => return Err(err),
            other => other,
        };

        let mut seeded = request.clone();
        seeded.variety_seed = Some(seed);
        Ok(self.resolver.resolve(outcome, &seeded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerationError;
    use crate::prompt::Prompt;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Scripted {
        reply: Mutex<Option<Result<String>>>,
        seen: Mutex<Vec<Prompt>>,
    }

    impl Scripted {
        fn new(reply: Result<String>) -> Arc<Self> {
            Arc::new(Self {
                reply: Mutex::new(Some(reply)),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl CompletionProvider for Scripted {
        fn name(&self) -> &str {
            "Scripted"
        }
        fn model(&self) -> &str {
            "scripted-1"
        }
        fn supports_vision(&self) -> bool {
            false
        }
        fn requires_credential(&self) -> bool {
            false
        }
        fn has_credential(&self) -> bool {
            false
        }
        async fn complete(&self, prompt: &Prompt) -> Result<String> {
            self.seen.lock().unwrap().push(prompt.clone());
            self.reply.lock().unwrap().take().unwrap_or(Err(GenerationError::Timeout))
        }
    }

    #[tokio::test]
    async fn success_path_passes_seed_into_prompt() {
        let provider = Scripted::new(Ok(r##"{"caption":"Hi","hashtags":["#x"]}"##.into()));
        let generator = CaptionGenerator::new(provider.clone());
        let request = GenerationRequest::text("a", "b").variety_seed("abc");

        let result = generator.generate(&request).await.unwrap();
        assert_eq!(result.caption, "Hi");
        let seen = provider.seen.lock().unwrap();
        assert!(seen[0].text.contains("Random seed for variety: abc"));
    }

    #[tokio::test]
    async fn vision_mismatch_is_returned_before_calling() {
        let provider = Scripted::new(Ok("unused".into()));
        let generator = CaptionGenerator::new(provider.clone());
        let request =
            GenerationRequest::image(crate::types::ImageInput::new(vec![1], "image/png"));

        let err = generator.generate(&request).await.unwrap_err();
        assert!(matches!(err, GenerationError::VisionUnsupported { .. }));
        assert!(provider.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn timeout_resolves_to_fallback() {
        let provider = Scripted::new(Err(GenerationError::Timeout));
        let generator = CaptionGenerator::new(provider);
        let request = GenerationRequest::text("a", "b").variety_seed("abc");

        let result = generator.generate(&request).await.unwrap();
        assert!(result.was_fallback);
        assert!(result.error_note.unwrap().contains("timed out"));
    }
}
