//! Error types for fetching, parsing and bundling schema documents.

use std::path::PathBuf;
use thiserror::Error;

/// Errors while retrieving the raw content of a document.
#[derive(Debug, Error)]
pub enum FetchError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // Configuration errors (exit code 2)
    #[error("{fetcher} fetcher cannot load '{location}'")]
    Unsupported {
        location: String,
        fetcher: &'static str,
    },

    #[error("invalid location '{location}': {message}")]
    InvalidLocation { location: String, message: String },

    #[error("cannot decode {location}: {source}")]
    Decode {
        location: String,
        #[source]
        source: quick_xml::encoding::EncodingError,
    },

    #[error("invalid fetcher configuration: {message}")]
    InvalidConfig { message: String },
}

impl FetchError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            FetchError::FileNotFound { .. } | FetchError::ReadError { .. } => 3,
            #[cfg(feature = "remote")]
            FetchError::NetworkError { .. } => 3,
            _ => 2,
        }
    }
}

/// Errors while parsing or serializing an XML document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("document is empty")]
    Empty,

    #[error("invalid XML at byte {position}: {source}")]
    Xml {
        position: u64,
        #[source]
        source: quick_xml::Error,
    },

    #[error("document has no root element")]
    NoRootElement,

    #[error("element <{name}> is never closed")]
    UnclosedElement { name: String },

    #[error("cannot serialize document: {source}")]
    Serialize {
        #[source]
        source: std::io::Error,
    },
}

/// Errors while persisting one file of the bundle.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("cannot create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot serialize {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: DocumentError,
    },
}

/// Errors that abort a whole bundling run.
#[derive(Debug, Error)]
pub enum BundleError {
    #[error("cannot load root document {location}: {source}")]
    RootFetch {
        location: String,
        #[source]
        source: FetchError,
    },

    #[error("cannot parse root document {location}: {source}")]
    RootParse {
        location: String,
        #[source]
        source: DocumentError,
    },

    #[error("invalid configuration: {message}")]
    Config { message: String },
}

impl BundleError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            BundleError::RootFetch { source, .. } => source.exit_code(),
            BundleError::RootParse { .. } | BundleError::Config { .. } => 2,
        }
    }
}
