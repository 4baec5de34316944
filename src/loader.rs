//! Document loading from files and HTTP URLs.
//!
//! The bundler never reaches the network or the filesystem directly; it asks a
//! [`Fetcher`] for the text behind a location. [`FetcherKind`] is the fixed
//! set of strategies a caller can choose from.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::document::decode_document;
use crate::error::FetchError;

/// Default timeout for HTTP requests (10 seconds).
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Retrieves the raw text behind a location.
pub trait Fetcher {
    /// Short strategy name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Fetch the content at `location`.
    ///
    /// # Errors
    ///
    /// Returns a `FetchError` when the location cannot be loaded. Callers
    /// decide whether that is fatal.
    fn fetch(&self, location: &str) -> Result<String, FetchError>;
}

/// The named fetch strategies available to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FetcherKind {
    /// HTTP(S) locations over the network, everything else from disk.
    #[default]
    Auto,
    /// HTTP(S) only.
    Http,
    /// Local files only.
    File,
}

impl FetcherKind {
    pub const ALL: &'static [FetcherKind] = &[FetcherKind::Auto, FetcherKind::Http, FetcherKind::File];

    /// Parse a strategy name. Returns `None` for unknown names.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "auto" => Some(FetcherKind::Auto),
            "http" => Some(FetcherKind::Http),
            "file" => Some(FetcherKind::File),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FetcherKind::Auto => "auto",
            FetcherKind::Http => "http",
            FetcherKind::File => "file",
        }
    }

    /// Build the fetcher for this strategy.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::InvalidConfig` if the HTTP options are invalid or
    /// the crate was built without the `remote` feature and HTTP is needed.
    pub fn build(&self, options: &HttpOptions) -> Result<Box<dyn Fetcher>, FetchError> {
        match self {
            FetcherKind::File => Ok(Box::new(FileFetcher)),
            #[cfg(feature = "remote")]
            FetcherKind::Http => Ok(Box::new(HttpFetcher::new(options)?)),
            #[cfg(feature = "remote")]
            FetcherKind::Auto => Ok(Box::new(AutoFetcher {
                http: HttpFetcher::new(options)?,
            })),
            #[cfg(not(feature = "remote"))]
            FetcherKind::Http => {
                let _ = options;
                Err(FetchError::InvalidConfig {
                    message: "built without the `remote` feature".to_string(),
                })
            }
            #[cfg(not(feature = "remote"))]
            FetcherKind::Auto => {
                options.validate()?;
                Ok(Box::new(FileFetcher))
            }
        }
    }
}

/// Authorization sent with every HTTP request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum HttpAuth {
    #[default]
    None,
    /// Raw `Authorization` header value.
    Header(String),
    /// Basic authentication from a user name and password.
    Basic { user: String, password: String },
    /// Pre-encoded basic credentials, sent as `Basic <token>`.
    BasicToken(String),
}

impl HttpAuth {
    /// The `Authorization` header value, or `None` when no auth is configured.
    ///
    /// `Basic` credentials are encoded by the HTTP client instead.
    pub fn header_value(&self) -> Option<String> {
        match self {
            HttpAuth::Header(value) => Some(value.trim().to_string()),
            HttpAuth::BasicToken(token) => Some(format!("Basic {}", token.trim())),
            HttpAuth::None | HttpAuth::Basic { .. } => None,
        }
    }
}

/// Transport settings for [`HttpFetcher`].
#[derive(Debug, Clone)]
pub struct HttpOptions {
    /// Per-request timeout. A timeout counts as a fetch failure.
    pub timeout: Duration,
    /// HTTP proxy URL, e.g. `http://proxy.local:3128`.
    pub proxy: Option<String>,
    pub auth: HttpAuth,
    /// Accept any TLS certificate. Off unless explicitly requested.
    pub accept_invalid_certs: bool,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            timeout: HTTP_TIMEOUT,
            proxy: None,
            auth: HttpAuth::None,
            accept_invalid_certs: false,
        }
    }
}

impl HttpOptions {
    /// Check the options without building a client.
    pub fn validate(&self) -> Result<(), FetchError> {
        if self.timeout.is_zero() {
            return Err(FetchError::InvalidConfig {
                message: "timeout must be greater than zero".to_string(),
            });
        }
        if let Some(proxy) = &self.proxy {
            validate_proxy(proxy)?;
        }
        Ok(())
    }
}

fn validate_proxy(proxy: &str) -> Result<(), FetchError> {
    let invalid = |message: String| FetchError::InvalidConfig { message };

    let parsed = url::Url::parse(proxy).map_err(|e| invalid(format!("proxy '{}': {}", proxy, e)))?;
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(invalid(format!("proxy '{}' has no host", proxy)));
    }
    match parsed.port_or_known_default() {
        Some(port) if port >= 1 => Ok(()),
        _ => Err(invalid(format!("proxy '{}' has no valid port", proxy))),
    }
}

/// Check if a string looks like an HTTP URL (starts with http:// or https://).
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

fn is_file_url(s: &str) -> bool {
    s.starts_with("file://")
}

/// Resolve a location as written in a document against the source the
/// document itself was loaded from.
///
/// Absolute URLs and absolute paths are returned unchanged. Relative
/// locations are joined onto a URL base with URL semantics and onto a file
/// base relative to the file's directory.
///
/// # Errors
///
/// Returns `FetchError::InvalidLocation` for a blank location or if a URL
/// base cannot be joined.
pub fn resolve_location(base: Option<&str>, location: &str) -> Result<String, FetchError> {
    let location = location.trim();
    if location.is_empty() {
        return Err(FetchError::InvalidLocation {
            location: location.to_string(),
            message: "location is empty".to_string(),
        });
    }
    if is_url(location) || is_file_url(location) || Path::new(location).is_absolute() {
        return Ok(location.to_string());
    }

    let Some(base) = base else {
        return Ok(location.to_string());
    };

    if is_url(base) || is_file_url(base) {
        let invalid = |message: String| FetchError::InvalidLocation {
            location: location.to_string(),
            message,
        };
        let base_url = url::Url::parse(base).map_err(|e| invalid(e.to_string()))?;
        let joined = base_url.join(location).map_err(|e| invalid(e.to_string()))?;
        return Ok(joined.to_string());
    }

    let dir = Path::new(base).parent().unwrap_or(Path::new(""));
    Ok(dir.join(location).to_string_lossy().into_owned())
}

/// Loads documents from the local filesystem (paths or `file://` URLs).
#[derive(Debug, Clone, Copy, Default)]
pub struct FileFetcher;

impl FileFetcher {
    fn path_for(location: &str) -> Result<PathBuf, FetchError> {
        if is_file_url(location) {
            let url = url::Url::parse(location).map_err(|e| FetchError::InvalidLocation {
                location: location.to_string(),
                message: e.to_string(),
            })?;
            return url.to_file_path().map_err(|()| FetchError::InvalidLocation {
                location: location.to_string(),
                message: "not a local file URL".to_string(),
            });
        }
        Ok(PathBuf::from(location))
    }
}

impl Fetcher for FileFetcher {
    fn name(&self) -> &'static str {
        "file"
    }

    fn fetch(&self, location: &str) -> Result<String, FetchError> {
        if is_url(location) {
            return Err(FetchError::Unsupported {
                location: location.to_string(),
                fetcher: self.name(),
            });
        }

        let path = Self::path_for(location)?;
        if !path.exists() {
            return Err(FetchError::FileNotFound { path });
        }

        tracing::debug!(path = %path.display(), "reading file");
        let bytes =
            std::fs::read(&path).map_err(|source| FetchError::ReadError { path, source })?;
        decode_document(&bytes).map_err(|source| FetchError::Decode {
            location: location.to_string(),
            source,
        })
    }
}

/// Loads documents over HTTP(S) with a blocking client.
///
/// Requires the `remote` feature (enabled by default).
#[cfg(feature = "remote")]
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    auth: HttpAuth,
}

#[cfg(feature = "remote")]
impl HttpFetcher {
    /// Build a client from the given options.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::InvalidConfig` for an invalid proxy or timeout.
    pub fn new(options: &HttpOptions) -> Result<Self, FetchError> {
        options.validate()?;
        let config_error = |source: reqwest::Error| FetchError::InvalidConfig {
            message: source.to_string(),
        };

        let mut builder = reqwest::blocking::Client::builder()
            .timeout(options.timeout)
            .danger_accept_invalid_certs(options.accept_invalid_certs);
        if let Some(proxy) = &options.proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy.as_str()).map_err(config_error)?);
        }
        let client = builder.build().map_err(config_error)?;

        Ok(Self {
            client,
            auth: options.auth.clone(),
        })
    }
}

#[cfg(feature = "remote")]
impl Fetcher for HttpFetcher {
    fn name(&self) -> &'static str {
        "http"
    }

    fn fetch(&self, location: &str) -> Result<String, FetchError> {
        if !is_url(location) {
            return Err(FetchError::Unsupported {
                location: location.to_string(),
                fetcher: self.name(),
            });
        }
        let network_error = |source: reqwest::Error| FetchError::NetworkError {
            url: location.to_string(),
            source,
        };

        let mut request = self.client.get(location);
        request = match &self.auth {
            HttpAuth::Basic { user, password } => request.basic_auth(user, Some(password)),
            auth => match auth.header_value() {
                Some(value) => request.header(reqwest::header::AUTHORIZATION, value),
                None => request,
            },
        };

        tracing::debug!(url = location, "fetching");
        let response = request.send().map_err(network_error)?;

        // Check for HTTP errors before reading the body
        let response = response.error_for_status().map_err(network_error)?;

        let bytes = response.bytes().map_err(network_error)?;
        decode_document(&bytes).map_err(|source| FetchError::Decode {
            location: location.to_string(),
            source,
        })
    }
}

/// Routes HTTP(S) locations to [`HttpFetcher`] and everything else to
/// [`FileFetcher`].
#[cfg(feature = "remote")]
#[derive(Debug, Clone)]
pub struct AutoFetcher {
    http: HttpFetcher,
}

#[cfg(feature = "remote")]
impl Fetcher for AutoFetcher {
    fn name(&self) -> &'static str {
        "auto"
    }

    fn fetch(&self, location: &str) -> Result<String, FetchError> {
        if is_url(location) {
            self.http.fetch(location)
        } else {
            FileFetcher.fetch(location)
        }
    }
}
