//! Schema resolution - discovers every schema reachable from a root document.
//!
//! Resolution is a breadth-first closure over namespaces. The root is scanned
//! for import references; each unregistered namespace is fetched, parsed and
//! registered; then every registered-but-unscanned schema is scanned the same
//! way, sweep after sweep, until a sweep finds nothing left to scan. Because
//! the registry only grows and is consulted before every fetch, each namespace
//! is fetched at most once and cyclic imports terminate.

use std::collections::HashSet;

use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::document::{Document, ElementHandle};
use crate::loader::{resolve_location, Fetcher};
use crate::registry::{NamespaceRegistry, SchemaDocument};
use crate::types::{DocumentId, ImportAttributes};

/// An element carrying the location attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReference {
    /// Document the element belongs to.
    pub document: DocumentId,
    /// Target namespace. `None` when the attribute is absent or blank.
    pub namespace: Option<String>,
    /// Location exactly as written.
    pub location: String,
    /// Element inside the owning document, for in-place rewriting.
    pub handle: ElementHandle,
}

/// Find every import reference in `document`, in document order.
pub fn scan_imports(
    document: &Document,
    owner: &DocumentId,
    attributes: &ImportAttributes,
) -> Vec<ImportReference> {
    document
        .find_elements_with_attribute(&attributes.location)
        .into_iter()
        .map(|handle| {
            let namespace = document
                .attribute(handle, &attributes.namespace)
                .map(|ns| ns.trim().to_string())
                .filter(|ns| !ns.is_empty());
            let location = document
                .attribute(handle, &attributes.location)
                .unwrap_or_default();
            ImportReference {
                document: owner.clone(),
                namespace,
                location,
                handle,
            }
        })
        .collect()
}

/// Outcome of resolving a root document.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub registry: NamespaceRegistry,
    /// Fetch and parse failures, one per failed namespace, plus one per
    /// reference with an empty location.
    pub diagnostics: Diagnostics,
    /// Number of sweeps over registered schemas after the root pass.
    pub sweeps: usize,
}

/// Drives the fixpoint traversal for one root document.
pub struct Resolver<'a> {
    fetcher: &'a dyn Fetcher,
    attributes: &'a ImportAttributes,
    registry: NamespaceRegistry,
    failed: HashSet<String>,
    diagnostics: Diagnostics,
}

impl<'a> Resolver<'a> {
    pub fn new(fetcher: &'a dyn Fetcher, attributes: &'a ImportAttributes) -> Self {
        Self {
            fetcher,
            attributes,
            registry: NamespaceRegistry::new(),
            failed: HashSet::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    /// Resolve every schema reachable from `root`.
    ///
    /// `root_source` is where the root was loaded from; relative locations in
    /// the root are resolved against it. Individual fetch or parse failures are
    /// recorded in the returned diagnostics and never stop the traversal.
    pub fn resolve(mut self, root: &Document, root_source: Option<&str>) -> Resolution {
        let frontier = scan_imports(root, &DocumentId::Root, self.attributes);
        tracing::debug!(references = frontier.len(), "scanned root document");
        self.process(&frontier, root_source);

        let mut sweeps = 0;
        loop {
            let pending = self.registry.unscanned();
            if pending.is_empty() {
                break;
            }
            sweeps += 1;
            let before = self.registry.len();

            for namespace in pending {
                let Some(schema) = self.registry.get(&namespace) else {
                    continue;
                };
                let owner = DocumentId::Schema(namespace.clone());
                let references = scan_imports(schema.document(), &owner, self.attributes);
                let source = schema.source().to_string();

                self.process(&references, Some(&source));
                if let Some(schema) = self.registry.get_mut(&namespace) {
                    schema.mark_scanned();
                }
            }

            tracing::debug!(
                sweep = sweeps,
                added = self.registry.len() - before,
                "resolution sweep finished"
            );
        }

        Resolution {
            registry: self.registry,
            diagnostics: self.diagnostics,
            sweeps,
        }
    }

    fn process(&mut self, references: &[ImportReference], base: Option<&str>) {
        for reference in references {
            // References without a namespace are reported by the rewriter.
            let Some(namespace) = &reference.namespace else {
                continue;
            };
            if self.registry.contains(namespace) || self.failed.contains(namespace) {
                continue;
            }
            // Reported, but the namespace stays open for other references.
            if reference.location.trim().is_empty() {
                self.diagnostics.push(
                    Diagnostic::new(
                        DiagnosticKind::FetchFailed,
                        reference.document.clone(),
                        "reference has an empty location",
                    )
                    .namespace(namespace.as_str())
                    .location(reference.location.as_str()),
                );
                continue;
            }

            match self.load(reference, namespace, base) {
                Ok(schema) => {
                    tracing::info!(
                        namespace = namespace.as_str(),
                        location = schema.source(),
                        "registered schema"
                    );
                    self.registry.register(namespace.clone(), schema);
                }
                Err(diagnostic) => {
                    self.failed.insert(namespace.clone());
                    self.diagnostics.push(diagnostic);
                }
            }
        }
    }

    fn load(
        &self,
        reference: &ImportReference,
        namespace: &str,
        base: Option<&str>,
    ) -> Result<SchemaDocument, Diagnostic> {
        let failure = |kind: DiagnosticKind, message: String| {
            Diagnostic::new(kind, reference.document.clone(), message)
                .namespace(namespace)
                .location(reference.location.as_str())
        };

        let source = resolve_location(base, &reference.location)
            .map_err(|e| failure(DiagnosticKind::FetchFailed, e.to_string()))?;
        let text = self
            .fetcher
            .fetch(&source)
            .map_err(|e| failure(DiagnosticKind::FetchFailed, e.to_string()))?;
        let document = Document::parse(&text)
            .map_err(|e| failure(DiagnosticKind::ParseFailed, e.to_string()))?;

        if let Some(target) = document.root_attribute("targetNamespace") {
            if target != namespace {
                tracing::debug!(
                    namespace,
                    target_namespace = target.as_str(),
                    "imported schema declares a different targetNamespace"
                );
            }
        }

        Ok(SchemaDocument::new(
            namespace,
            reference.location.as_str(),
            source,
            document,
        ))
    }
}

/// Resolve every schema reachable from `root` with the given fetcher.
pub fn resolve(
    root: &Document,
    root_source: Option<&str>,
    fetcher: &dyn Fetcher,
    attributes: &ImportAttributes,
) -> Resolution {
    Resolver::new(fetcher, attributes).resolve(root, root_source)
}
