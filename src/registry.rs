//! Namespace-keyed store of resolved schema documents.

use indexmap::IndexMap;

use crate::document::Document;

/// A fetched and parsed schema.
#[derive(Debug, Clone)]
pub struct SchemaDocument {
    namespace: String,
    /// Location as written in the referencing document.
    location: String,
    /// Location actually fetched, after resolving against the referrer.
    source: String,
    document: Document,
    scanned: bool,
    local_name: Option<String>,
}

impl SchemaDocument {
    pub fn new(
        namespace: impl Into<String>,
        location: impl Into<String>,
        source: impl Into<String>,
        document: Document,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            location: location.into(),
            source: source.into(),
            document,
            scanned: false,
            local_name: None,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// Whether this document's own imports have been examined.
    pub fn is_scanned(&self) -> bool {
        self.scanned
    }

    pub(crate) fn mark_scanned(&mut self) {
        self.scanned = true;
    }

    /// Local filename, available once naming has run.
    pub fn local_name(&self) -> Option<&str> {
        self.local_name.as_deref()
    }

    /// Assign the local filename. Only the first assignment takes effect.
    pub(crate) fn assign_local_name(&mut self, name: String) -> bool {
        if self.local_name.is_some() {
            return false;
        }
        self.local_name = Some(name);
        true
    }
}

/// Namespace → schema map that keeps first-registration order.
///
/// An entry is never replaced or removed once registered.
#[derive(Debug, Clone, Default)]
pub struct NamespaceRegistry {
    entries: IndexMap<String, SchemaDocument>,
}

impl NamespaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, namespace: &str) -> bool {
        self.entries.contains_key(namespace)
    }

    pub fn get(&self, namespace: &str) -> Option<&SchemaDocument> {
        self.entries.get(namespace)
    }

    pub(crate) fn get_mut(&mut self, namespace: &str) -> Option<&mut SchemaDocument> {
        self.entries.get_mut(namespace)
    }

    /// Register a document under `namespace`.
    ///
    /// Returns `false` and leaves the registry untouched if the namespace is
    /// already present.
    pub fn register(&mut self, namespace: impl Into<String>, document: SchemaDocument) -> bool {
        let namespace = namespace.into();
        if self.entries.contains_key(&namespace) {
            return false;
        }
        self.entries.insert(namespace, document);
        true
    }

    /// Documents in registration order.
    pub fn values(&self) -> impl Iterator<Item = &SchemaDocument> {
        self.entries.values()
    }

    pub(crate) fn values_mut(&mut self) -> impl Iterator<Item = &mut SchemaDocument> {
        self.entries.values_mut()
    }

    /// Namespaces in registration order.
    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Namespaces of registered documents not yet scanned, in registration order.
    pub(crate) fn unscanned(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, doc)| !doc.is_scanned())
            .map(|(ns, _)| ns.clone())
            .collect()
    }

    /// Local filename assigned to `namespace`, if registered and named.
    pub fn local_name(&self, namespace: &str) -> Option<&str> {
        self.get(namespace).and_then(SchemaDocument::local_name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
