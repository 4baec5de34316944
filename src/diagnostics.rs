//! Recoverable problems found during a bundling run.
//!
//! Nothing in here aborts a run. The resolver, rewriter and writer record a
//! [`Diagnostic`] for each problem they step over, and the caller decides
//! whether the collected set makes the run a failure.

use serde::Serialize;

use crate::types::DocumentId;

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// What went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A referenced schema could not be retrieved.
    FetchFailed,
    /// A referenced schema was retrieved but is not well-formed XML.
    ParseFailed,
    /// A reference carries a location but no namespace, so it cannot be keyed.
    MissingNamespace,
    /// A reference names a namespace that never made it into the registry.
    UnresolvedNamespace,
    /// An output file could not be written.
    WriteFailed,
}

impl DiagnosticKind {
    pub fn severity(&self) -> Severity {
        match self {
            DiagnosticKind::FetchFailed
            | DiagnosticKind::ParseFailed
            | DiagnosticKind::WriteFailed => Severity::Error,
            DiagnosticKind::MissingNamespace | DiagnosticKind::UnresolvedNamespace => {
                Severity::Warning
            }
        }
    }

    /// Short code used in text output.
    pub fn code(&self) -> &'static str {
        match self {
            DiagnosticKind::FetchFailed => "fetch-failed",
            DiagnosticKind::ParseFailed => "parse-failed",
            DiagnosticKind::MissingNamespace => "missing-namespace",
            DiagnosticKind::UnresolvedNamespace => "unresolved-namespace",
            DiagnosticKind::WriteFailed => "write-failed",
        }
    }
}

/// A single recoverable problem.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    /// Document the offending reference lives in.
    pub document: DocumentId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, document: DocumentId, message: impl Into<String>) -> Self {
        Self {
            severity: kind.severity(),
            kind,
            document,
            namespace: None,
            location: None,
            message: message.into(),
        }
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.kind.code(), self.document)?;
        if let Some(ns) = &self.namespace {
            write!(f, " namespace={}", ns)?;
        }
        if let Some(loc) = &self.location {
            write!(f, " location={}", loc)?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Ordered collection of diagnostics for one run.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic and log it as a warning.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        tracing::warn!(
            code = diagnostic.kind.code(),
            document = %diagnostic.document,
            namespace = diagnostic.namespace.as_deref().unwrap_or(""),
            location = diagnostic.location.as_deref().unwrap_or(""),
            "{}",
            diagnostic.message
        );
        self.0.push(diagnostic);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.0.extend(other.0);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn errors(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warnings(&self) -> usize {
        self.count(Severity::Warning)
    }

    /// Number of diagnostics of a given kind.
    pub fn count_kind(&self, kind: DiagnosticKind) -> usize {
        self.0.iter().filter(|d| d.kind == kind).count()
    }

    fn count(&self, severity: Severity) -> usize {
        self.0.iter().filter(|d| d.severity == severity).count()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
