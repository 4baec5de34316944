//! Orchestrates a bundling run: load the root, resolve, name, rewrite, write.
//!
//! Only a root that cannot be loaded or parsed aborts the run. Every other
//! problem ends up in the run's diagnostics and the bundle is produced with
//! whatever could be resolved.

use std::path::PathBuf;

use serde::Serialize;

use crate::diagnostics::Diagnostics;
use crate::document::Document;
use crate::error::BundleError;
use crate::loader::Fetcher;
use crate::namer::assign_names;
use crate::registry::NamespaceRegistry;
use crate::resolver::Resolver;
use crate::rewriter::rewrite_all;
use crate::types::BundleOptions;
use crate::writer::{write_bundle, WriteReport};

/// One resolved schema and the file it will be written to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanEntry {
    pub namespace: String,
    /// Location as written by the first referrer.
    pub location: String,
    /// Location actually fetched.
    pub source: String,
    pub local_name: String,
}

/// Summary of a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct BundleReport {
    pub root: String,
    pub folder: PathBuf,
    pub root_file: String,
    pub schemas: Vec<PlanEntry>,
    pub written: Vec<PathBuf>,
    pub rewritten: usize,
    pub errors: usize,
    pub warnings: usize,
    pub diagnostics: Diagnostics,
}

impl BundleReport {
    /// True when nothing was skipped, unresolved or left unwritten.
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// A root document with every reachable schema resolved, named and rewritten,
/// held in memory until [`Bundle::write`] is called.
#[derive(Debug, Clone)]
pub struct Bundle {
    options: BundleOptions,
    source: String,
    root: Document,
    registry: NamespaceRegistry,
    diagnostics: Diagnostics,
    rewritten: usize,
}

impl Bundle {
    /// Load the root from `source` and resolve everything it imports.
    ///
    /// # Errors
    ///
    /// Returns `BundleError::Config` for invalid options,
    /// `BundleError::RootFetch` if the root cannot be loaded and
    /// `BundleError::RootParse` if it is not well-formed XML.
    pub fn resolve(
        source: &str,
        fetcher: &dyn Fetcher,
        options: BundleOptions,
    ) -> Result<Self, BundleError> {
        let source = source.trim();
        if source.is_empty() {
            return Err(BundleError::Config {
                message: "root location must not be empty".to_string(),
            });
        }
        options.validate()?;

        tracing::info!(root = source, fetcher = fetcher.name(), "loading root document");
        let text = fetcher
            .fetch(source)
            .map_err(|e| BundleError::RootFetch {
                location: source.to_string(),
                source: e,
            })?;
        tracing::debug!(length = text.len(), "root document loaded");

        Self::from_root_text(&text, source, fetcher, options)
    }

    /// Resolve from root text that was already loaded from `source`.
    ///
    /// Relative import locations in the root are resolved against `source`.
    pub fn from_root_text(
        text: &str,
        source: &str,
        fetcher: &dyn Fetcher,
        options: BundleOptions,
    ) -> Result<Self, BundleError> {
        options.validate()?;
        let mut root = Document::parse(text).map_err(|e| BundleError::RootParse {
            location: source.to_string(),
            source: e,
        })?;

        let resolution =
            Resolver::new(fetcher, &options.attributes).resolve(&root, Some(source));
        let mut registry = resolution.registry;
        let mut diagnostics = resolution.diagnostics;
        tracing::info!(
            schemas = registry.len(),
            sweeps = resolution.sweeps,
            "resolution finished"
        );

        // Names depend on the final registry size, so naming waits for the fixpoint.
        assign_names(&mut registry, &options.basename);

        let summary = rewrite_all(&mut root, &mut registry, &options.attributes);
        diagnostics.extend(summary.diagnostics);

        Ok(Self {
            options,
            source: source.to_string(),
            root,
            registry,
            diagnostics,
            rewritten: summary.rewritten,
        })
    }

    pub fn options(&self) -> &BundleOptions {
        &self.options
    }

    /// Where the root was loaded from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The rewritten root document.
    pub fn root(&self) -> &Document {
        &self.root
    }

    pub fn registry(&self) -> &NamespaceRegistry {
        &self.registry
    }

    /// Diagnostics from resolution and rewriting.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Number of import locations that were rewritten.
    pub fn rewritten(&self) -> usize {
        self.rewritten
    }

    /// Resolved schemas with their local names, in registration order.
    pub fn plan(&self) -> Vec<PlanEntry> {
        self.registry
            .values()
            .map(|schema| PlanEntry {
                namespace: schema.namespace().to_string(),
                location: schema.location().to_string(),
                source: schema.source().to_string(),
                local_name: schema.local_name().unwrap_or_default().to_string(),
            })
            .collect()
    }

    /// Write the root and every schema to the output folder.
    pub fn write(&self) -> WriteReport {
        write_bundle(&self.root, &self.registry, &self.options)
    }

    /// Build a report without writing anything.
    pub fn report(&self) -> BundleReport {
        self.report_with(WriteReport::default())
    }

    /// Write the bundle and report on the whole run.
    pub fn write_report(&self) -> BundleReport {
        self.report_with(self.write())
    }

    fn report_with(&self, write: WriteReport) -> BundleReport {
        let mut diagnostics = self.diagnostics.clone();
        diagnostics.extend(write.diagnostics);

        BundleReport {
            root: self.source.clone(),
            folder: self.options.folder.clone(),
            root_file: self.options.root_file_name(),
            schemas: self.plan(),
            written: write.written,
            rewritten: self.rewritten,
            errors: diagnostics.errors(),
            warnings: diagnostics.warnings(),
            diagnostics,
        }
    }
}

/// Resolve `source` and write the bundle in one step.
///
/// # Errors
///
/// Fails only when the options are invalid or the root cannot be loaded or
/// parsed; see [`Bundle::resolve`].
pub fn bundle(
    source: &str,
    fetcher: &dyn Fetcher,
    options: BundleOptions,
) -> Result<BundleReport, BundleError> {
    let bundle = Bundle::resolve(source, fetcher, options)?;
    Ok(bundle.write_report())
}
