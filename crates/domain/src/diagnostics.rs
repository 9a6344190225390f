//! Diagnostics stream returned to the plugin host
//!
//! The host renders these next to the resource being applied. Informational
//! entries describe absorbed retries; error entries accompany every terminal
//! failure that crosses the orchestrator boundary.

use serde::{Deserialize, Serialize};

use crate::errors::{ApiError, ApiErrorKind};

/// Severity of a single diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Progress worth surfacing, such as retries that succeeded
    Info,
    /// Operation succeeded but needs attention
    Warning,
    /// Operation failed
    Error,
}

/// One entry in the diagnostics stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// How serious the entry is
    pub severity: Severity,
    /// One-line headline
    pub summary: String,
    /// Longer explanation, possibly empty
    pub detail: String,
    /// Error category when the diagnostic stems from an [`ApiError`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ApiErrorKind>,
}

/// Ordered collection of diagnostics produced by one host call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&mut self, summary: impl Into<String>, detail: impl Into<String>) {
        self.push(Severity::Info, summary, detail, None);
    }

    pub fn warning(&mut self, summary: impl Into<String>, detail: impl Into<String>) {
        self.push(Severity::Warning, summary, detail, None);
    }

    pub fn error(&mut self, summary: impl Into<String>, detail: impl Into<String>) {
        self.push(Severity::Error, summary, detail, None);
    }

    /// Record a terminal error together with its category and recovery hint.
    pub fn api_error(&mut self, summary: impl Into<String>, err: &ApiError) {
        let kind = err.kind();
        self.push(
            Severity::Error,
            summary,
            format!("{err} ({})", kind.recovery_hint()),
            Some(kind),
        );
    }

    fn push(
        &mut self,
        severity: Severity,
        summary: impl Into<String>,
        detail: impl Into<String>,
        kind: Option<ApiErrorKind>,
    ) {
        self.0.push(Diagnostic { severity, summary: summary.into(), detail: detail.into(), kind });
    }

    /// Move every entry of `other` to the end of `self`.
    pub fn append(&mut self, other: Diagnostics) {
        self.0.extend(other.0);
    }

    /// Whether any entry is an error.
    pub fn has_errors(&self) -> bool {
        self.0.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }

    /// Diagnostics of one severity, in emission order.
    pub fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter().filter(move |d| d.severity == severity)
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
