//! Batch pipeline: parse, extract, classify and aggregate every source file.

use crate::error::{IngestError, IngestResult};
use crate::extractors::extract_all;
use crate::parsers::parse_source;
use crate::source::enumerate_sources;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use mailtriage_config::{Config, PipelineConfig};
use mailtriage_core::{
    BatchMode, BatchReport, DocumentReport, DocumentStatus, EmailAnalysis, EmailDocument,
    ExtractionPolicy, SourceFile,
};
use mailtriage_llm::{Classification, Classifier, ClassifierSettings, CompletionBackend};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Batch behaviour of a pipeline.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub mode: BatchMode,
    /// Documents processed at the same time.
    pub max_concurrent_documents: usize,
    /// Upper bound for one document, from parsing to aggregation.
    pub document_timeout: Duration,
    pub extraction_policy: ExtractionPolicy,
}

impl PipelineSettings {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            mode: config.mode,
            max_concurrent_documents: config.max_concurrent_documents.max(1),
            document_timeout: Duration::from_secs(config.document_timeout_seconds),
            extraction_policy: config.extraction_policy,
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

/// Turns message files into analyses.
pub struct Pipeline {
    classifier: Classifier,
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(classifier: Classifier, settings: PipelineSettings) -> Self {
        Self {
            classifier,
            settings,
        }
    }

    /// Build a pipeline from configuration around an existing backend.
    pub fn from_config(config: &Config, backend: Arc<dyn CompletionBackend>) -> Self {
        let classifier = Classifier::new(
            backend,
            ClassifierSettings::from_config(&config.classifier),
        );
        Self::new(classifier, PipelineSettings::from_config(&config.pipeline))
    }

    /// Override the batch mode.
    pub fn with_mode(mut self, mode: BatchMode) -> Self {
        self.settings.mode = mode;
        self
    }

    /// Override the number of documents processed at once.
    pub fn with_concurrency(mut self, documents: usize) -> Self {
        self.settings.max_concurrent_documents = documents.max(1);
        self
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Enumerate `dir` and process every message file in it.
    pub async fn process_directory(&self, dir: &Path) -> IngestResult<BatchReport> {
        let sources = enumerate_sources(dir)?;
        self.run(&sources).await
    }

    /// Process `sources`, keeping their order in the report.
    pub async fn run(&self, sources: &[SourceFile]) -> IngestResult<BatchReport> {
        self.run_with_progress(sources, |_| {}).await
    }

    /// Like [`Pipeline::run`], calling `on_document` as each document finishes.
    ///
    /// In strict mode the first failure in enumeration order is returned and
    /// documents still in flight are dropped.
    pub async fn run_with_progress<F>(
        &self,
        sources: &[SourceFile],
        mut on_document: F,
    ) -> IngestResult<BatchReport>
    where
        F: FnMut(&DocumentReport),
    {
        let started_at = Utc::now();
        let mode = self.settings.mode;

        info!(
            "Processing {} message(s), {} at a time ({} mode)",
            sources.len(),
            self.settings.max_concurrent_documents,
            mode
        );

        let mut outcomes = stream::iter(sources.iter().enumerate())
            .map(|(index, source)| async move { (index, source, self.process_source(source).await) })
            .buffered(self.settings.max_concurrent_documents);

        let mut documents = Vec::with_capacity(sources.len());

        while let Some((index, source, result)) = outcomes.next().await {
            let status = match result {
                Ok(analysis) => DocumentStatus::Ok { analysis },
                Err(e) if mode == BatchMode::Strict => {
                    error!("Failed to process {}: {}", source.file_name(), e);
                    return Err(e);
                }
                Err(e) => {
                    warn!("Failed to process {} ({}): {}", source.file_name(), e.stage(), e);
                    DocumentStatus::Failed {
                        stage: e.stage(),
                        error: e.to_string(),
                    }
                }
            };

            let report = DocumentReport {
                index,
                file: source.file_name(),
                format: source.format,
                status,
            };
            on_document(&report);
            documents.push(report);
        }

        let report = BatchReport {
            mode,
            started_at,
            finished_at: Utc::now(),
            documents,
        };

        info!(
            "Processed {} message(s): {} succeeded, {} failed",
            report.documents.len(),
            report.succeeded(),
            report.failed()
        );

        Ok(report)
    }

    /// Process one source file within the document timeout.
    pub async fn process_source(&self, source: &SourceFile) -> IngestResult<EmailAnalysis> {
        let limit = self.settings.document_timeout;
        match tokio::time::timeout(limit, self.analyze(source)).await {
            Ok(result) => result,
            Err(_) => Err(IngestError::Timeout {
                path: source.path.clone(),
                seconds: limit.as_secs(),
            }),
        }
    }

    async fn analyze(&self, source: &SourceFile) -> IngestResult<EmailAnalysis> {
        debug!("Processing {:?}", source.path);

        let policy = self.settings.extraction_policy;
        let owned = source.clone();
        let document = tokio::task::spawn_blocking(move || -> IngestResult<EmailDocument> {
            let document = parse_source(&owned)?;
            extract_all(&document, policy)?;
            Ok(document)
        })
        .await
        .map_err(|e| IngestError::Task(e.to_string()))??;

        let classification = self.classifier.classify(&document.combined_text()).await?;
        aggregate(&document, classification)
    }
}

/// Merge the classification of `document` into one validated record.
pub fn aggregate(
    document: &EmailDocument,
    classification: Classification,
) -> IngestResult<EmailAnalysis> {
    if document.subject.trim().is_empty() {
        return Err(IngestError::Aggregation("subject is empty".to_string()));
    }

    let confidence = classification.request.confidence_score;
    if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
        return Err(IngestError::Aggregation(format!(
            "confidence score {} is outside [0, 1]",
            confidence
        )));
    }

    Ok(EmailAnalysis::new(
        document.subject.clone(),
        classification.request,
        classification.sentiment,
        classification.intent,
        classification.entities,
        classification.spam_status,
    ))
}

/// Process the configured source directory with `backend`.
pub async fn process_directory(
    config: &Config,
    backend: Arc<dyn CompletionBackend>,
) -> IngestResult<BatchReport> {
    Pipeline::from_config(config, backend)
        .process_directory(Path::new(&config.source.directory))
        .await
}

/// Synchronous entry point: run [`process_directory`] on a fresh runtime.
///
/// Must not be called from inside a tokio runtime.
pub fn process_directory_blocking(
    config: &Config,
    backend: Arc<dyn CompletionBackend>,
) -> IngestResult<BatchReport> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(process_directory(config, backend))
}
