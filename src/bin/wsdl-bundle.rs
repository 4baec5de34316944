//! WSDL Bundler CLI
//!
//! Command-line interface for vendoring a WSDL and its imported schemas.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use wsdl_bundle::{
    Bundle, BundleOptions, BundleReport, Fetcher, FetcherKind, HttpAuth, HttpOptions,
    ImportAttributes, Severity, DEFAULT_LOCATION_ATTR, DEFAULT_NAMESPACE_ATTR,
};

#[derive(Parser)]
#[command(name = "wsdl-bundle")]
#[command(about = "Download a WSDL and every XSD it imports into a local bundle")]
#[command(version)]
struct Cli {
    /// Log debug output
    #[arg(long, short, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(long, short, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve all imports and write the bundle to a folder
    Bundle {
        /// Root document: file path or URL (http:// or https://)
        source: String,

        /// Output folder
        #[arg(long)]
        folder: PathBuf,

        /// Output basename: <basename>.wsdl and <basename>_<n>.xsd
        #[arg(long)]
        basename: String,

        #[command(flatten)]
        resolve: ResolveArgs,

        /// Output format: text (default) or json
        #[arg(long, default_value = "text")]
        format: String,

        /// Exit with code 1 if any reference could not be resolved or written
        #[arg(long)]
        strict: bool,
    },

    /// Resolve all imports and print the bundle plan without writing
    Inspect {
        /// Root document: file path or URL (http:// or https://)
        source: String,

        /// Basename used for the planned schema names
        #[arg(long, default_value = "bundle")]
        basename: String,

        #[command(flatten)]
        resolve: ResolveArgs,

        /// Output format: text (default) or json
        #[arg(long, default_value = "text")]
        format: String,
    },
}

/// Options shared by every command that resolves imports.
#[derive(Args)]
struct ResolveArgs {
    /// Attribute holding an import's location
    #[arg(long, default_value = DEFAULT_LOCATION_ATTR)]
    location_attr: String,

    /// Attribute holding an import's target namespace
    #[arg(long, default_value = DEFAULT_NAMESPACE_ATTR)]
    namespace_attr: String,

    /// Fetch strategy: auto, http or file
    #[arg(long, default_value = "auto", value_parser = parse_fetcher)]
    fetcher: FetcherKind,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout: u64,

    /// HTTP proxy URL (e.g., http://proxy.local:3128)
    #[arg(long)]
    proxy: Option<String>,

    /// Raw Authorization header value
    #[arg(long, conflicts_with_all = ["basic_user", "basic_token"])]
    auth_header: Option<String>,

    /// User for HTTP basic authentication
    #[arg(long, requires = "basic_password", conflicts_with = "basic_token")]
    basic_user: Option<String>,

    /// Password for HTTP basic authentication
    #[arg(long, requires = "basic_user")]
    basic_password: Option<String>,

    /// Pre-encoded HTTP basic credentials
    #[arg(long)]
    basic_token: Option<String>,

    /// Accept invalid TLS certificates
    #[arg(long)]
    insecure: bool,
}

impl ResolveArgs {
    fn attributes(&self) -> ImportAttributes {
        ImportAttributes::new(&self.location_attr, &self.namespace_attr)
    }

    fn http_options(&self) -> HttpOptions {
        let auth = match (
            &self.auth_header,
            &self.basic_user,
            &self.basic_password,
            &self.basic_token,
        ) {
            (Some(value), _, _, _) => HttpAuth::Header(value.clone()),
            (_, Some(user), Some(password), _) => HttpAuth::Basic {
                user: user.clone(),
                password: password.clone(),
            },
            (_, _, _, Some(token)) => HttpAuth::BasicToken(token.clone()),
            _ => HttpAuth::None,
        };

        HttpOptions {
            timeout: Duration::from_secs(self.timeout),
            proxy: self.proxy.clone(),
            auth,
            accept_invalid_certs: self.insecure,
        }
    }

    fn build_fetcher(&self) -> Result<Box<dyn Fetcher>, u8> {
        self.fetcher.build(&self.http_options()).map_err(|e| {
            eprintln!("Error: {}", e);
            e.exit_code() as u8
        })
    }
}

fn parse_fetcher(s: &str) -> Result<FetcherKind, String> {
    FetcherKind::parse(s).ok_or_else(|| {
        let names: Vec<_> = FetcherKind::ALL.iter().map(FetcherKind::as_str).collect();
        format!("unknown fetcher '{}', expected one of: {}", s, names.join(", "))
    })
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Bundle {
            source,
            folder,
            basename,
            resolve,
            format,
            strict,
        } => run_bundle(&source, folder, basename, &resolve, &format, strict),

        Commands::Inspect {
            source,
            basename,
            resolve,
            format,
        } => run_inspect(&source, basename, &resolve, &format),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

/// Log to stderr. `RUST_LOG` overrides the level picked from the flags.
fn init_logging(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn resolve_bundle(
    source: &str,
    folder: PathBuf,
    basename: String,
    args: &ResolveArgs,
) -> Result<Bundle, u8> {
    let fetcher = args.build_fetcher()?;
    let options = BundleOptions::new(folder, basename).attributes(args.attributes());

    Bundle::resolve(source, fetcher.as_ref(), options).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })
}

fn run_bundle(
    source: &str,
    folder: PathBuf,
    basename: String,
    args: &ResolveArgs,
    format: &str,
    strict: bool,
) -> Result<(), u8> {
    let bundle = resolve_bundle(source, folder, basename, args)?;
    let report = bundle.write_report();

    if format == "json" {
        print_json(&report)?;
    } else {
        print_report(&report);
    }

    if strict && !report.is_clean() {
        Err(1)
    } else {
        Ok(())
    }
}

fn run_inspect(source: &str, basename: String, args: &ResolveArgs, format: &str) -> Result<(), u8> {
    let bundle = resolve_bundle(source, PathBuf::from("."), basename, args)?;
    let report = bundle.report();

    if format == "json" {
        return print_json(&report);
    }

    println!("{} -> {}", report.root, report.root_file);
    for entry in &report.schemas {
        println!("  {} -> {} ({})", entry.namespace, entry.local_name, entry.source);
    }
    print_diagnostics(&report);
    Ok(())
}

fn print_json(report: &BundleReport) -> Result<(), u8> {
    let json = serde_json::to_string_pretty(report).map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;
    println!("{}", json);
    Ok(())
}

fn print_report(report: &BundleReport) {
    println!(
        "Bundling {} into {} ...\n",
        report.root,
        report.folder.display()
    );

    for path in &report.written {
        println!("  \x1b[32m✓\x1b[0m {}", path.display());
    }
    print_diagnostics(report);

    println!();
    let summary = format!(
        "{} schemas, {} files written, {} references rewritten ({} errors, {} warnings)",
        report.schemas.len(),
        report.written.len(),
        report.rewritten,
        report.errors,
        report.warnings
    );
    if report.is_clean() {
        println!("\x1b[32m✓ {}\x1b[0m", summary);
    } else {
        println!("\x1b[33m⚠ {}\x1b[0m", summary);
    }
}

fn print_diagnostics(report: &BundleReport) {
    for diag in &report.diagnostics {
        let (color, label) = match diag.severity {
            Severity::Error => ("\x1b[31m", "error"),
            Severity::Warning => ("\x1b[33m", "warning"),
        };
        println!(
            "    {}{}[{}]\x1b[0m: {}{}{} - {}",
            color,
            label,
            diag.kind.code(),
            diag.document,
            diag.namespace
                .as_deref()
                .map(|ns| format!(" {}", ns))
                .unwrap_or_default(),
            diag.location
                .as_deref()
                .map(|loc| format!(" ({})", loc))
                .unwrap_or_default(),
            diag.message
        );
    }
}
