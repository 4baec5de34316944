//! WSDL Bundler
//!
//! Vendors a WSDL and every XML schema it transitively imports into one flat,
//! self-contained folder.
//!
//! Every element carrying a location attribute (`schemaLocation` by default)
//! and a namespace attribute (`namespace` by default) is an import reference.
//! Starting from the root, each referenced namespace is fetched once, parsed,
//! and scanned for further imports until nothing new is reachable. Every
//! schema is then given a local name (`<basename>_<n>.xsd`) and every
//! reference, in the root and in the schemas, is rewritten to point at it.
//!
//! # Example
//!
//! ```no_run
//! use wsdl_bundle::{bundle, BundleOptions, FetcherKind, HttpOptions};
//!
//! let fetcher = FetcherKind::Auto.build(&HttpOptions::default()).unwrap();
//! let options = BundleOptions::new("src/main/wsdl", "billing");
//! let report = bundle("https://example.com/billing?wsdl", fetcher.as_ref(), options).unwrap();
//!
//! // billing.wsdl, billing_0.xsd, billing_1.xsd, ...
//! for path in &report.written {
//!     println!("{}", path.display());
//! }
//! ```
//!
//! # Output Layout
//!
//! | File | Content |
//! |------|---------|
//! | `<basename>.wsdl` | Root document, imports rewritten |
//! | `<basename>_<n>.xsd` | n-th schema in discovery order, zero-padded to a common width |
//!
//! # Failure Handling
//!
//! A root that cannot be loaded or parsed fails the run. A schema that cannot
//! be fetched or parsed is skipped: the references to it keep their original
//! location and a [`Diagnostic`] records why.

mod bundle;
mod diagnostics;
mod document;
mod error;
mod loader;
mod namer;
mod registry;
mod resolver;
mod rewriter;
mod types;
mod writer;

pub use bundle::{bundle, Bundle, BundleReport, PlanEntry};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Severity};
pub use document::{decode_document, Document, ElementHandle};
pub use error::{BundleError, DocumentError, FetchError, WriteError};
pub use loader::{
    is_url, resolve_location, FetcherKind, Fetcher, FileFetcher, HttpAuth, HttpOptions,
    HTTP_TIMEOUT,
};
pub use namer::{assign_names, index_width, local_name};
pub use registry::{NamespaceRegistry, SchemaDocument};
pub use resolver::{resolve, scan_imports, ImportReference, Resolution, Resolver};
pub use rewriter::{local_names, rewrite_all, rewrite_document, RewriteSummary};
pub use types::{
    BundleOptions, DocumentId, ImportAttributes, DEFAULT_LOCATION_ATTR, DEFAULT_NAMESPACE_ATTR,
};
pub use writer::{ensure_dir, write_bundle, write_file, WriteReport};

#[cfg(feature = "remote")]
pub use loader::{AutoFetcher, HttpFetcher};
