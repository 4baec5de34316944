//! Core types for schema bundling.

use std::path::PathBuf;

use serde::Serialize;

use crate::error::BundleError;

/// Default attribute holding an import's location (`xsd:import/@schemaLocation`).
pub const DEFAULT_LOCATION_ATTR: &str = "schemaLocation";

/// Default attribute holding an import's target namespace (`xsd:import/@namespace`).
pub const DEFAULT_NAMESPACE_ATTR: &str = "namespace";

/// File extension of the bundled root document.
pub const ROOT_EXTENSION: &str = "wsdl";

/// File extension of bundled schema documents.
pub const SCHEMA_EXTENSION: &str = "xsd";

/// Names of the two attributes that make an element an import reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportAttributes {
    pub location: String,
    pub namespace: String,
}

impl Default for ImportAttributes {
    fn default() -> Self {
        Self {
            location: DEFAULT_LOCATION_ATTR.to_string(),
            namespace: DEFAULT_NAMESPACE_ATTR.to_string(),
        }
    }
}

impl ImportAttributes {
    pub fn new(location: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            namespace: namespace.into(),
        }
    }
}

/// Identifies the document an import reference was found in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentId {
    /// The root WSDL.
    Root,
    /// A registered schema, keyed by its namespace.
    Schema(String),
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentId::Root => write!(f, "root"),
            DocumentId::Schema(ns) => write!(f, "{}", ns),
        }
    }
}

/// Options for a bundling run.
#[derive(Debug, Clone)]
pub struct BundleOptions {
    /// Output folder for every bundled file.
    pub folder: PathBuf,
    /// Base of every output filename: `<basename>.wsdl`, `<basename>_<n>.xsd`.
    pub basename: String,
    pub attributes: ImportAttributes,
}

impl BundleOptions {
    /// Create options with the default import attributes.
    ///
    /// The basename is trimmed.
    pub fn new(folder: impl Into<PathBuf>, basename: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
            basename: basename.into().trim().to_string(),
            attributes: ImportAttributes::default(),
        }
    }

    /// Override the import attribute names.
    pub fn attributes(mut self, attributes: ImportAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Reject options that cannot produce a bundle.
    ///
    /// # Errors
    ///
    /// Returns `BundleError::Config` for an empty folder, an empty basename,
    /// a basename containing a path separator, or empty attribute names.
    pub fn validate(&self) -> Result<(), BundleError> {
        let config = |message: &str| {
            Err(BundleError::Config {
                message: message.to_string(),
            })
        };

        if self.folder.as_os_str().is_empty() {
            return config("folder must not be empty");
        }
        if self.basename.is_empty() {
            return config("basename must not be empty");
        }
        if self.basename.contains(['/', '\\']) {
            return config("basename must not contain path separators");
        }
        if self.attributes.location.trim().is_empty() || self.attributes.namespace.trim().is_empty()
        {
            return config("import attribute names must not be empty");
        }
        Ok(())
    }

    /// Filename of the bundled root document.
    pub fn root_file_name(&self) -> String {
        format!("{}.{}", self.basename, ROOT_EXTENSION)
    }
}
