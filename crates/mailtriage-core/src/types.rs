//! Core domain types for mailtriage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Subject used when a message carries none.
pub const NO_SUBJECT: &str = "No Subject";

/// Body used when a message carries none.
pub const NO_BODY: &str = "No Body";

/// On-disk encoding of an email message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerFormat {
    /// Raw RFC 5322 message (`.eml`).
    Eml,
    /// Outlook compound-file message (`.msg`).
    Msg,
}

impl ContainerFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerFormat::Eml => "eml",
            ContainerFormat::Msg => "msg",
        }
    }

    /// Detect the container format from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "eml" => Some(ContainerFormat::Eml),
            "msg" => Some(ContainerFormat::Msg),
            _ => None,
        }
    }

    /// Detect the container format from a path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

impl std::fmt::Display for ContainerFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A message file discovered in the source directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub path: PathBuf,
    pub format: ContainerFormat,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, format: ContainerFormat) -> Self {
        Self {
            path: path.into(),
            format,
        }
    }

    /// File name for display, falling back to the full path.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Content category of an attachment, derived from its declared MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentCategory {
    Pdf,
    Office,
    Image,
    Other,
}

impl ContentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentCategory::Pdf => "pdf",
            ContentCategory::Office => "office",
            ContentCategory::Image => "image",
            ContentCategory::Other => "other",
        }
    }

    /// Classify a MIME type string such as `application/pdf` or `image/png`.
    pub fn from_mime(mime: &str) -> Self {
        let mime = mime.trim().to_lowercase();
        if mime.contains("pdf") {
            ContentCategory::Pdf
        } else if mime.contains("msword") || mime.contains("wordprocessingml") {
            ContentCategory::Office
        } else if mime.starts_with("image/") {
            ContentCategory::Image
        } else {
            ContentCategory::Other
        }
    }
}

impl std::fmt::Display for ContentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which extraction failures are replaced by empty text instead of failing the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionPolicy {
    /// PDF failures become empty text; office and image failures fail the document.
    #[default]
    Reference,
    /// Every failure becomes empty text.
    Lenient,
    /// Every failure fails the document.
    Strict,
}

impl ExtractionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionPolicy::Reference => "reference",
            ExtractionPolicy::Lenient => "lenient",
            ExtractionPolicy::Strict => "strict",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "reference" => Some(ExtractionPolicy::Reference),
            "lenient" => Some(ExtractionPolicy::Lenient),
            "strict" => Some(ExtractionPolicy::Strict),
            _ => None,
        }
    }

    /// Whether a failed extraction for `category` is substituted with empty text.
    pub fn substitutes(&self, category: ContentCategory) -> bool {
        match self {
            ExtractionPolicy::Reference => category == ContentCategory::Pdf,
            ExtractionPolicy::Lenient => true,
            ExtractionPolicy::Strict => false,
        }
    }
}

impl std::fmt::Display for ExtractionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single attachment of a message.
///
/// The extracted text is written at most once; later writes are rejected.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub file_name: Option<String>,
    pub mime_type: String,
    pub category: ContentCategory,
    pub payload: Vec<u8>,
    extracted_text: OnceLock<String>,
}

impl Attachment {
    pub fn new(mime_type: impl Into<String>, payload: Vec<u8>) -> Self {
        let mime_type = mime_type.into();
        Self {
            file_name: None,
            category: ContentCategory::from_mime(&mime_type),
            mime_type,
            payload,
            extracted_text: OnceLock::new(),
        }
    }

    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    /// Text extracted from the payload, if extraction already ran.
    pub fn extracted_text(&self) -> Option<&str> {
        self.extracted_text.get().map(String::as_str)
    }

    /// Store the extraction result. Returns `false` if a result was already stored.
    pub fn set_extracted_text(&self, text: String) -> bool {
        self.extracted_text.set(text).is_ok()
    }

    /// Name for log messages.
    pub fn display_name(&self) -> &str {
        self.file_name.as_deref().unwrap_or("<unnamed>")
    }
}

/// A parsed email message, normalized across container formats.
#[derive(Debug, Clone)]
pub struct EmailDocument {
    pub subject: String,
    pub body: String,
    pub attachments: Vec<Attachment>,
}

impl EmailDocument {
    /// Build a document, substituting sentinels for missing or blank fields.
    pub fn new(subject: Option<String>, body: Option<String>) -> Self {
        Self {
            subject: non_blank(subject).unwrap_or_else(|| NO_SUBJECT.to_string()),
            body: non_blank(body).unwrap_or_else(|| NO_BODY.to_string()),
            attachments: Vec::new(),
        }
    }

    pub fn with_attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = attachments;
        self
    }

    /// Body followed by every extracted attachment text, one per line.
    ///
    /// Attachments that were never extracted contribute an empty line.
    pub fn combined_text(&self) -> String {
        let mut text = self.body.clone();
        for attachment in &self.attachments {
            text.push('\n');
            text.push_str(attachment.extracted_text().unwrap_or(""));
        }
        text
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// One of the five independent classification facets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationTask {
    RequestType,
    Sentiment,
    Intent,
    Entities,
    Spam,
}

impl ClassificationTask {
    /// All tasks in the order they are issued when running sequentially.
    pub const ALL: [ClassificationTask; 5] = [
        ClassificationTask::RequestType,
        ClassificationTask::Sentiment,
        ClassificationTask::Intent,
        ClassificationTask::Entities,
        ClassificationTask::Spam,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClassificationTask::RequestType => "request_type",
            ClassificationTask::Sentiment => "sentiment",
            ClassificationTask::Intent => "intent",
            ClassificationTask::Entities => "entities",
            ClassificationTask::Spam => "spam",
        }
    }

    /// Whether the response must decode into structured data.
    pub fn is_structured(&self) -> bool {
        matches!(
            self,
            ClassificationTask::RequestType | ClassificationTask::Entities
        )
    }
}

impl std::fmt::Display for ClassificationTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Request category assigned to a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub request_type: String,
    pub sub_request_types: Vec<String>,
    pub confidence_score: f64,
}

/// Named entities extracted from a message; keys are chosen by the service.
pub type EntityMap = BTreeMap<String, String>;

/// The per-message record returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailAnalysis {
    pub subject: String,
    pub request_type: String,
    pub sub_request_types: Vec<String>,
    pub confidence_score: f64,
    pub sentiment: String,
    pub intent: String,
    pub entities: EntityMap,
    pub spam_status: String,
}

impl EmailAnalysis {
    pub fn new(
        subject: impl Into<String>,
        classification: ClassificationResult,
        sentiment: impl Into<String>,
        intent: impl Into<String>,
        entities: EntityMap,
        spam_status: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            request_type: classification.request_type,
            sub_request_types: classification.sub_request_types,
            confidence_score: classification.confidence_score,
            sentiment: sentiment.into(),
            intent: intent.into(),
            entities,
            spam_status: spam_status.into(),
        }
    }
}

/// How a batch reacts to a failing document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BatchMode {
    /// The first failure fails the whole batch.
    #[default]
    Strict,
    /// Failures are reported per document and the batch carries on.
    Isolated,
}

impl BatchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchMode::Strict => "strict",
            BatchMode::Isolated => "isolated",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "strict" => Some(BatchMode::Strict),
            "isolated" => Some(BatchMode::Isolated),
            _ => None,
        }
    }
}

impl std::fmt::Display for BatchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Pipeline stage a document failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Parse,
    Extraction,
    Classification,
    Aggregation,
    Timeout,
    Internal,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Parse => "parse",
            Stage::Extraction => "extraction",
            Stage::Classification => "classification",
            Stage::Aggregation => "aggregation",
            Stage::Timeout => "timeout",
            Stage::Internal => "internal",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of processing one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DocumentStatus {
    Ok { analysis: EmailAnalysis },
    Failed { stage: Stage, error: String },
}

/// One document's slot in a batch, in enumeration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentReport {
    pub index: usize,
    pub file: String,
    pub format: ContainerFormat,
    #[serde(flatten)]
    pub status: DocumentStatus,
}

impl DocumentReport {
    pub fn is_ok(&self) -> bool {
        matches!(self.status, DocumentStatus::Ok { .. })
    }
}

/// The result of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub mode: BatchMode,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub documents: Vec<DocumentReport>,
}

impl BatchReport {
    /// Successful analyses, in enumeration order.
    pub fn analyses(&self) -> Vec<&EmailAnalysis> {
        self.documents
            .iter()
            .filter_map(|d| match &d.status {
                DocumentStatus::Ok { analysis } => Some(analysis),
                DocumentStatus::Failed { .. } => None,
            })
            .collect()
    }

    /// Consume the report, keeping only the successful analyses.
    pub fn into_analyses(self) -> Vec<EmailAnalysis> {
        self.documents
            .into_iter()
            .filter_map(|d| match d.status {
                DocumentStatus::Ok { analysis } => Some(analysis),
                DocumentStatus::Failed { .. } => None,
            })
            .collect()
    }

    /// Reports of documents that failed.
    pub fn failures(&self) -> Vec<&DocumentReport> {
        self.documents.iter().filter(|d| !d.is_ok()).collect()
    }

    pub fn succeeded(&self) -> usize {
        self.documents.iter().filter(|d| d.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.documents.len() - self.succeeded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_analysis(subject: &str) -> EmailAnalysis {
        EmailAnalysis::new(
            subject,
            ClassificationResult {
                request_type: "Loan Completion".to_string(),
                sub_request_types: vec!["Address Change".to_string()],
                confidence_score: 0.92,
            },
            "Neutral",
            "Query",
            EntityMap::new(),
            "Not Spam",
        )
    }

    #[test]
    fn test_container_format_from_extension() {
        assert_eq!(ContainerFormat::from_extension("eml"), Some(ContainerFormat::Eml));
        assert_eq!(ContainerFormat::from_extension("MSG"), Some(ContainerFormat::Msg));
        assert_eq!(ContainerFormat::from_extension("txt"), None);
        assert_eq!(
            ContainerFormat::from_path(Path::new("/tmp/a/b.Eml")),
            Some(ContainerFormat::Eml)
        );
    }

    #[test]
    fn test_content_category_from_mime() {
        assert_eq!(ContentCategory::from_mime("application/pdf"), ContentCategory::Pdf);
        assert_eq!(ContentCategory::from_mime("application/msword"), ContentCategory::Office);
        assert_eq!(
            ContentCategory::from_mime(
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            ),
            ContentCategory::Office
        );
        assert_eq!(ContentCategory::from_mime("image/png"), ContentCategory::Image);
        assert_eq!(ContentCategory::from_mime("IMAGE/JPEG"), ContentCategory::Image);
        assert_eq!(ContentCategory::from_mime("text/plain"), ContentCategory::Other);
    }

    #[test]
    fn test_extracted_text_is_set_once() {
        let attachment = Attachment::new("application/pdf", vec![1, 2, 3]);
        assert!(attachment.extracted_text().is_none());
        assert!(attachment.set_extracted_text("first".to_string()));
        assert!(!attachment.set_extracted_text("second".to_string()));
        assert_eq!(attachment.extracted_text(), Some("first"));
    }

    #[test]
    fn test_document_sentinels() {
        let doc = EmailDocument::new(None, Some("   ".to_string()));
        assert_eq!(doc.subject, NO_SUBJECT);
        assert_eq!(doc.body, NO_BODY);

        let doc = EmailDocument::new(Some("Hi".to_string()), Some("Body".to_string()));
        assert_eq!(doc.subject, "Hi");
        assert_eq!(doc.body, "Body");
    }

    #[test]
    fn test_combined_text() {
        let pdf = Attachment::new("application/pdf", vec![]);
        pdf.set_extracted_text("pdf text".to_string());
        let other = Attachment::new("text/csv", vec![]);
        other.set_extracted_text(String::new());

        let doc = EmailDocument::new(Some("S".into()), Some("body".into()))
            .with_attachments(vec![pdf, other]);

        assert_eq!(doc.combined_text(), "body\npdf text\n");
    }

    #[test]
    fn test_analysis_serializes_camel_case() {
        let value = serde_json::to_value(sample_analysis("Hello")).unwrap();
        assert_eq!(value["subject"], "Hello");
        assert_eq!(value["requestType"], "Loan Completion");
        assert_eq!(value["subRequestTypes"][0], "Address Change");
        assert_eq!(value["confidenceScore"], 0.92);
        assert_eq!(value["spamStatus"], "Not Spam");
        assert!(value["entities"].is_object());
    }

    #[test]
    fn test_batch_report_counts() {
        let now = Utc::now();
        let report = BatchReport {
            mode: BatchMode::Isolated,
            started_at: now,
            finished_at: now,
            documents: vec![
                DocumentReport {
                    index: 0,
                    file: "a.eml".to_string(),
                    format: ContainerFormat::Eml,
                    status: DocumentStatus::Ok {
                        analysis: sample_analysis("A"),
                    },
                },
                DocumentReport {
                    index: 1,
                    file: "b.msg".to_string(),
                    format: ContainerFormat::Msg,
                    status: DocumentStatus::Failed {
                        stage: Stage::Parse,
                        error: "bad header".to_string(),
                    },
                },
            ],
        };

        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.analyses()[0].subject, "A");
        assert_eq!(report.failures()[0].file, "b.msg");

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["documents"][1]["status"], "failed");
        assert_eq!(value["documents"][1]["stage"], "parse");
        assert_eq!(value["documents"][0]["analysis"]["subject"], "A");
    }

    #[test]
    fn test_extraction_policy_substitutes() {
        let reference = ExtractionPolicy::default();
        assert!(reference.substitutes(ContentCategory::Pdf));
        assert!(!reference.substitutes(ContentCategory::Office));
        assert!(!reference.substitutes(ContentCategory::Image));

        assert!(ExtractionPolicy::Lenient.substitutes(ContentCategory::Image));
        assert!(!ExtractionPolicy::Strict.substitutes(ContentCategory::Pdf));
    }

    #[test]
    fn test_batch_mode_from_str() {
        assert_eq!(BatchMode::from_str("Strict"), Some(BatchMode::Strict));
        assert_eq!(BatchMode::from_str("isolated"), Some(BatchMode::Isolated));
        assert_eq!(BatchMode::from_str("partial"), None);
        assert_eq!(BatchMode::default(), BatchMode::Strict);
    }
}
