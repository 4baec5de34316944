//! Rewrites import locations to the local filenames chosen by the namer.

use std::collections::HashMap;

use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::document::Document;
use crate::registry::NamespaceRegistry;
use crate::resolver::scan_imports;
use crate::types::{DocumentId, ImportAttributes};

/// Result of rewriting a set of documents.
#[derive(Debug, Clone, Default)]
pub struct RewriteSummary {
    /// Location attributes whose value actually changed.
    pub rewritten: usize,
    /// References left untouched.
    pub diagnostics: Diagnostics,
}

/// Snapshot of namespace → local filename for every named schema.
pub fn local_names(registry: &NamespaceRegistry) -> HashMap<String, String> {
    registry
        .values()
        .filter_map(|schema| {
            schema
                .local_name()
                .map(|name| (schema.namespace().to_string(), name.to_string()))
        })
        .collect()
}

/// Point every import reference in `document` at its local filename.
///
/// The document is scanned afresh. References whose namespace has no local
/// name keep their location and produce an `UnresolvedNamespace` warning;
/// references without a namespace produce a `MissingNamespace` warning.
/// Returns the number of attributes changed.
pub fn rewrite_document(
    document: &mut Document,
    owner: &DocumentId,
    names: &HashMap<String, String>,
    attributes: &ImportAttributes,
    diagnostics: &mut Diagnostics,
) -> usize {
    let mut rewritten = 0;

    for reference in scan_imports(document, owner, attributes) {
        let Some(namespace) = reference.namespace else {
            diagnostics.push(
                Diagnostic::new(
                    DiagnosticKind::MissingNamespace,
                    owner.clone(),
                    format!(
                        "reference has no '{}' attribute and cannot be resolved",
                        attributes.namespace
                    ),
                )
                .location(reference.location),
            );
            continue;
        };

        match names.get(&namespace) {
            Some(local) if *local == reference.location => {}
            Some(local) => {
                document.set_attribute(reference.handle, &attributes.location, local);
                rewritten += 1;
            }
            None => diagnostics.push(
                Diagnostic::new(
                    DiagnosticKind::UnresolvedNamespace,
                    owner.clone(),
                    "namespace was not resolved; location left unchanged",
                )
                .namespace(namespace)
                .location(reference.location),
            ),
        }
    }

    rewritten
}

/// Rewrite the root document and every registered schema.
pub fn rewrite_all(
    root: &mut Document,
    registry: &mut NamespaceRegistry,
    attributes: &ImportAttributes,
) -> RewriteSummary {
    let names = local_names(registry);
    let mut summary = RewriteSummary::default();

    summary.rewritten += rewrite_document(
        root,
        &DocumentId::Root,
        &names,
        attributes,
        &mut summary.diagnostics,
    );

    for schema in registry.values_mut() {
        let owner = DocumentId::Schema(schema.namespace().to_string());
        summary.rewritten += rewrite_document(
            schema.document_mut(),
            &owner,
            &names,
            attributes,
            &mut summary.diagnostics,
        );
    }

    tracing::debug!(rewritten = summary.rewritten, "rewrote import locations");
    summary
}
