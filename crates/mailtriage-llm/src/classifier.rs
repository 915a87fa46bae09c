//! Runs the five classification tasks for one message.

use crate::backend::CompletionBackend;
use crate::error::{LlmError, LlmResult};
use crate::parse;
use crate::prompts;
use crate::types::CompletionRequest;
use mailtriage_config::ClassifierConfig;
use mailtriage_core::{ClassificationResult, ClassificationTask, EntityMap};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::debug;

/// Tunables for the classifier.
#[derive(Debug, Clone)]
pub struct ClassifierSettings {
    pub temperature: f32,
    /// Issue the five requests of a message concurrently.
    pub concurrent_tasks: bool,
    /// Maximum requests in flight across every caller of this classifier.
    pub max_in_flight: usize,
    pub max_content_chars: usize,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self::from_config(&ClassifierConfig::default())
    }
}

impl ClassifierSettings {
    pub fn from_config(config: &ClassifierConfig) -> Self {
        Self {
            temperature: config.temperature,
            concurrent_tasks: config.concurrent_tasks,
            max_in_flight: config.max_in_flight.max(1),
            max_content_chars: config.max_content_chars.max(1),
        }
    }
}

/// All five facets of one message.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub request: ClassificationResult,
    pub sentiment: String,
    pub intent: String,
    pub entities: EntityMap,
    pub spam_status: String,
}

/// Issues classification requests against a shared backend.
///
/// Cloning is cheap and clones share the same request limiter.
#[derive(Clone)]
pub struct Classifier {
    backend: Arc<dyn CompletionBackend>,
    permits: Arc<Semaphore>,
    settings: ClassifierSettings,
}

impl Classifier {
    pub fn new(backend: Arc<dyn CompletionBackend>, settings: ClassifierSettings) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(settings.max_in_flight)),
            backend,
            settings,
        }
    }

    pub fn settings(&self) -> &ClassifierSettings {
        &self.settings
    }

    /// Run all five tasks over `content` and collect the results.
    pub async fn classify(&self, content: &str) -> LlmResult<Classification> {
        let content = truncate_content(content, self.settings.max_content_chars);
        debug!(
            "Classifying {} chars with model {}",
            content.chars().count(),
            self.backend.model_name()
        );

        if self.settings.concurrent_tasks {
            let (request, sentiment, intent, entities, spam_status) = tokio::try_join!(
                self.classify_request(&content),
                self.analyze_sentiment(&content),
                self.classify_intent(&content),
                self.extract_entities(&content),
                self.detect_spam(&content),
            )?;

            Ok(Classification {
                request,
                sentiment,
                intent,
                entities,
                spam_status,
            })
        } else {
            Ok(Classification {
                request: self.classify_request(&content).await?,
                sentiment: self.analyze_sentiment(&content).await?,
                intent: self.classify_intent(&content).await?,
                entities: self.extract_entities(&content).await?,
                spam_status: self.detect_spam(&content).await?,
            })
        }
    }

    /// Request category with sub-requests and a confidence score.
    pub async fn classify_request(&self, content: &str) -> LlmResult<ClassificationResult> {
        let raw = self.run(ClassificationTask::RequestType, content).await?;
        parse::parse_request_classification(&raw)
    }

    /// Sentiment label, expected to be Positive, Negative or Neutral but not enforced.
    pub async fn analyze_sentiment(&self, content: &str) -> LlmResult<String> {
        let raw = self.run(ClassificationTask::Sentiment, content).await?;
        Ok(parse::free_text(&raw))
    }

    pub async fn classify_intent(&self, content: &str) -> LlmResult<String> {
        let raw = self.run(ClassificationTask::Intent, content).await?;
        Ok(parse::free_text(&raw))
    }

    pub async fn extract_entities(&self, content: &str) -> LlmResult<EntityMap> {
        let raw = self.run(ClassificationTask::Entities, content).await?;
        parse::parse_entities(&raw)
    }

    pub async fn detect_spam(&self, content: &str) -> LlmResult<String> {
        let raw = self.run(ClassificationTask::Spam, content).await?;
        Ok(parse::free_text(&raw))
    }

    /// One round trip for one task, gated by the shared request limiter.
    async fn run(&self, task: ClassificationTask, content: &str) -> LlmResult<String> {
        let request = CompletionRequest {
            task,
            system: prompts::system_prompt(task).to_string(),
            prompt: prompts::user_prompt(task, content),
            max_tokens: prompts::max_tokens(task),
            temperature: self.settings.temperature,
        };

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| LlmError::LimiterClosed)?;

        debug!("Running task {}", task);
        self.backend
            .complete(&request)
            .await
            .map_err(|e| e.for_task(task))
    }
}

/// Truncate content to at most `max_chars` characters, adding an ellipsis if cut.
fn truncate_content(content: &str, max_chars: usize) -> String {
    if content.chars().count() <= max_chars {
        content.to_string()
    } else {
        let truncated: String = content.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}
