//! Persists a rewritten bundle to disk.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::document::Document;
use crate::error::WriteError;
use crate::registry::NamespaceRegistry;
use crate::types::{BundleOptions, DocumentId};

/// Files written by [`write_bundle`] and the ones that failed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WriteReport {
    pub written: Vec<PathBuf>,
    #[serde(skip)]
    pub diagnostics: Diagnostics,
}

impl WriteReport {
    pub fn is_complete(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Create `path` and its parents. Succeeds if the directory already exists.
pub fn ensure_dir(path: &Path) -> Result<(), WriteError> {
    std::fs::create_dir_all(path).map_err(|source| WriteError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

/// Write `content` to `path`, replacing any existing file.
pub fn write_file(path: &Path, content: &str) -> Result<(), WriteError> {
    std::fs::write(path, content).map_err(|source| WriteError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn write_document(path: &Path, document: &Document) -> Result<(), WriteError> {
    let content = document
        .serialize()
        .map_err(|source| WriteError::Serialize {
            path: path.to_path_buf(),
            source,
        })?;
    write_file(path, &content)
}

/// Write the root as `<folder>/<basename>.wsdl` and every named schema as
/// `<folder>/<local name>`.
///
/// A failure to write one file is recorded and the remaining files are still
/// attempted. If the folder cannot be created, that single failure is recorded
/// and nothing is attempted.
pub fn write_bundle(
    root: &Document,
    registry: &NamespaceRegistry,
    options: &BundleOptions,
) -> WriteReport {
    let mut report = WriteReport::default();

    if let Err(e) = ensure_dir(&options.folder) {
        report.diagnostics.push(
            Diagnostic::new(DiagnosticKind::WriteFailed, DocumentId::Root, e.to_string())
                .location(options.folder.display().to_string()),
        );
        return report;
    }

    let mut targets = vec![(
        DocumentId::Root,
        options.folder.join(options.root_file_name()),
        root,
    )];
    for schema in registry.values() {
        let Some(name) = schema.local_name() else {
            tracing::debug!(namespace = schema.namespace(), "skipping unnamed schema");
            continue;
        };
        targets.push((
            DocumentId::Schema(schema.namespace().to_string()),
            options.folder.join(name),
            schema.document(),
        ));
    }

    for (owner, path, document) in targets {
        match write_document(&path, document) {
            Ok(()) => {
                tracing::info!(path = %path.display(), "written");
                report.written.push(path);
            }
            Err(e) => {
                let diagnostic =
                    Diagnostic::new(DiagnosticKind::WriteFailed, owner.clone(), e.to_string())
                        .location(path.display().to_string());
                let diagnostic = match owner {
                    DocumentId::Schema(ns) => diagnostic.namespace(ns),
                    DocumentId::Root => diagnostic,
                };
                report.diagnostics.push(diagnostic);
            }
        }
    }

    report
}
