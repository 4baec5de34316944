//! Integration tests for bundling.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;

use tempfile::TempDir;
use wsdl_bundle::{
    bundle, scan_imports, Bundle, BundleError, BundleOptions, DiagnosticKind, Document,
    DocumentId, FetchError, Fetcher, ImportAttributes,
};

/// Serves documents from memory and counts requests per location.
#[derive(Default)]
struct MemoryFetcher {
    documents: HashMap<String, String>,
    requests: RefCell<Vec<String>>,
}

impl MemoryFetcher {
    fn with(mut self, location: &str, content: impl Into<String>) -> Self {
        self.documents.insert(location.to_string(), content.into());
        self
    }

    fn count(&self, location: &str) -> usize {
        self.requests
            .borrow()
            .iter()
            .filter(|l| l.as_str() == location)
            .count()
    }
}

impl Fetcher for MemoryFetcher {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn fetch(&self, location: &str) -> Result<String, FetchError> {
        self.requests.borrow_mut().push(location.to_string());
        self.documents
            .get(location)
            .cloned()
            .ok_or_else(|| FetchError::FileNotFound {
                path: PathBuf::from(location),
            })
    }
}

fn import(namespace: &str, location: &str) -> String {
    format!(
        r#"<xsd:import namespace="{}" schemaLocation="{}"/>"#,
        namespace, location
    )
}

fn xsd(target: &str, imports: &[(&str, &str)]) -> String {
    let body: String = imports.iter().map(|(ns, loc)| import(ns, loc)).collect();
    format!(
        r#"<xsd:schema xmlns:xsd="http://www.w3.org/2001/XMLSchema" targetNamespace="{}">{}</xsd:schema>"#,
        target, body
    )
}

fn wsdl(imports: &[(&str, &str)]) -> String {
    let body: String = imports.iter().map(|(ns, loc)| import(ns, loc)).collect();
    format!(
        r#"<wsdl:definitions xmlns:wsdl="http://schemas.xmlsoap.org/wsdl/" xmlns:xsd="http://www.w3.org/2001/XMLSchema"><wsdl:types><xsd:schema>{}</xsd:schema></wsdl:types></wsdl:definitions>"#,
        body
    )
}

fn locations(doc: &Document) -> Vec<String> {
    scan_imports(doc, &DocumentId::Root, &ImportAttributes::default())
        .into_iter()
        .map(|r| r.location)
        .collect()
}

fn plan_names(bundle: &Bundle) -> Vec<(String, String)> {
    bundle
        .plan()
        .into_iter()
        .map(|entry| (entry.namespace, entry.local_name))
        .collect()
}

const ROOT: &str = "http://x/svc?wsdl";

// === Resolution ===

mod resolution {
    use super::*;

    #[test]
    fn chain_is_followed_to_the_end() {
        let fetcher = MemoryFetcher::default()
            .with(ROOT, wsdl(&[("urn:a", "http://x/a.xsd")]))
            .with("http://x/a.xsd", xsd("urn:a", &[("urn:b", "http://x/b.xsd")]))
            .with("http://x/b.xsd", xsd("urn:b", &[]));

        let bundle = Bundle::resolve(ROOT, &fetcher, BundleOptions::new("out", "svc")).unwrap();

        assert_eq!(
            plan_names(&bundle),
            [
                ("urn:a".to_string(), "svc_0.xsd".to_string()),
                ("urn:b".to_string(), "svc_1.xsd".to_string()),
            ]
        );
        assert_eq!(locations(bundle.root()), ["svc_0.xsd"]);
        assert_eq!(
            locations(bundle.registry().get("urn:a").unwrap().document()),
            ["svc_1.xsd"]
        );
        assert!(bundle.diagnostics().is_empty());
    }

    #[test]
    fn deep_nesting_beyond_two_levels() {
        // root -> a -> b -> c -> d
        let fetcher = MemoryFetcher::default()
            .with(ROOT, wsdl(&[("urn:a", "a.xsd")]))
            .with("http://x/a.xsd", xsd("urn:a", &[("urn:b", "b.xsd")]))
            .with("http://x/b.xsd", xsd("urn:b", &[("urn:c", "c.xsd")]))
            .with("http://x/c.xsd", xsd("urn:c", &[("urn:d", "d.xsd")]))
            .with("http://x/d.xsd", xsd("urn:d", &[]));

        let bundle = Bundle::resolve(ROOT, &fetcher, BundleOptions::new("out", "svc")).unwrap();

        let namespaces: Vec<_> = bundle.registry().namespaces().collect();
        assert_eq!(namespaces, ["urn:a", "urn:b", "urn:c", "urn:d"]);
        assert_eq!(
            locations(bundle.registry().get("urn:c").unwrap().document()),
            ["svc_3.xsd"]
        );
    }

    #[test]
    fn diamond_fetches_shared_schema_once() {
        let fetcher = MemoryFetcher::default()
            .with(ROOT, wsdl(&[("urn:a", "a.xsd"), ("urn:b", "b.xsd")]))
            .with("http://x/a.xsd", xsd("urn:a", &[("urn:c", "c.xsd")]))
            .with("http://x/b.xsd", xsd("urn:b", &[("urn:c", "c.xsd")]))
            .with("http://x/c.xsd", xsd("urn:c", &[]));

        let bundle = Bundle::resolve(ROOT, &fetcher, BundleOptions::new("out", "svc")).unwrap();

        assert_eq!(fetcher.count("http://x/c.xsd"), 1);
        assert_eq!(bundle.registry().len(), 3);
        let c = bundle.registry().local_name("urn:c").unwrap();
        assert_eq!(c, "svc_2.xsd");
        assert_eq!(
            locations(bundle.registry().get("urn:a").unwrap().document()),
            [c]
        );
        assert_eq!(
            locations(bundle.registry().get("urn:b").unwrap().document()),
            [c]
        );
    }

    #[test]
    fn cycle_terminates() {
        let fetcher = MemoryFetcher::default()
            .with(ROOT, wsdl(&[("urn:a", "a.xsd")]))
            .with("http://x/a.xsd", xsd("urn:a", &[("urn:b", "b.xsd")]))
            .with("http://x/b.xsd", xsd("urn:b", &[("urn:a", "a.xsd")]));

        let bundle = Bundle::resolve(ROOT, &fetcher, BundleOptions::new("out", "svc")).unwrap();

        assert_eq!(bundle.registry().len(), 2);
        assert_eq!(fetcher.count("http://x/a.xsd"), 1);
        assert_eq!(fetcher.count("http://x/b.xsd"), 1);
        assert_eq!(
            locations(bundle.registry().get("urn:b").unwrap().document()),
            ["svc_0.xsd"]
        );
    }

    #[test]
    fn first_location_wins_for_a_namespace() {
        let fetcher = MemoryFetcher::default()
            .with(
                ROOT,
                wsdl(&[("urn:a", "http://x/a.xsd"), ("urn:a", "http://mirror/a.xsd")]),
            )
            .with("http://x/a.xsd", xsd("urn:a", &[]));

        let bundle = Bundle::resolve(ROOT, &fetcher, BundleOptions::new("out", "svc")).unwrap();

        assert_eq!(fetcher.count("http://mirror/a.xsd"), 0);
        assert_eq!(bundle.registry().get("urn:a").unwrap().source(), "http://x/a.xsd");
        // Both references point at the single local copy
        assert_eq!(locations(bundle.root()), ["svc_0.xsd", "svc_0.xsd"]);
    }
}

// === Naming ===

mod naming {
    use super::*;

    #[test]
    fn wide_bundles_are_zero_padded() {
        let count = 250;
        let root_imports: Vec<(String, String)> = (0..count)
            .map(|i| (format!("urn:s{}", i), format!("http://x/s{}.xsd", i)))
            .collect();
        let borrowed: Vec<(&str, &str)> = root_imports
            .iter()
            .map(|(ns, loc)| (ns.as_str(), loc.as_str()))
            .collect();

        let mut fetcher = MemoryFetcher::default().with(ROOT, wsdl(&borrowed));
        for (ns, loc) in &root_imports {
            fetcher = fetcher.with(loc, xsd(ns, &[]));
        }

        let bundle = Bundle::resolve(ROOT, &fetcher, BundleOptions::new("out", "svc")).unwrap();
        let plan = bundle.plan();

        assert_eq!(plan.len(), count);
        assert_eq!(plan[0].local_name, "svc_000.xsd");
        assert_eq!(plan[7].local_name, "svc_007.xsd");
        assert_eq!(plan[249].local_name, "svc_249.xsd");
    }

    #[test]
    fn names_are_deterministic() {
        let build = || {
            MemoryFetcher::default()
                .with(ROOT, wsdl(&[("urn:b", "b.xsd"), ("urn:a", "a.xsd")]))
                .with("http://x/a.xsd", xsd("urn:a", &[("urn:c", "c.xsd")]))
                .with("http://x/b.xsd", xsd("urn:b", &[]))
                .with("http://x/c.xsd", xsd("urn:c", &[]))
        };

        let first = Bundle::resolve(ROOT, &build(), BundleOptions::new("out", "svc")).unwrap();
        let second = Bundle::resolve(ROOT, &build(), BundleOptions::new("out", "svc")).unwrap();

        assert_eq!(plan_names(&first), plan_names(&second));
        assert_eq!(
            first.root().serialize().unwrap(),
            second.root().serialize().unwrap()
        );
    }
}

// === Failure Handling ===

mod failures {
    use super::*;

    #[test]
    fn missing_inner_schema_is_skipped() {
        let fetcher = MemoryFetcher::default()
            .with(ROOT, wsdl(&[("urn:a", "a.xsd")]))
            .with("http://x/a.xsd", xsd("urn:a", &[("urn:gone", "gone.xsd")]));

        let bundle = Bundle::resolve(ROOT, &fetcher, BundleOptions::new("out", "svc")).unwrap();

        assert_eq!(bundle.registry().len(), 1);
        assert_eq!(
            bundle.diagnostics().count_kind(DiagnosticKind::FetchFailed),
            1
        );
        assert_eq!(
            bundle
                .diagnostics()
                .count_kind(DiagnosticKind::UnresolvedNamespace),
            1
        );
        // The failed reference keeps its original location
        assert_eq!(
            locations(bundle.registry().get("urn:a").unwrap().document()),
            ["gone.xsd"]
        );
    }

    #[test]
    fn malformed_schema_is_skipped() {
        let fetcher = MemoryFetcher::default()
            .with(ROOT, wsdl(&[("urn:a", "a.xsd"), ("urn:b", "b.xsd")]))
            .with("http://x/a.xsd", "<xsd:schema><oops></xsd:schema>")
            .with("http://x/b.xsd", xsd("urn:b", &[]));

        let bundle = Bundle::resolve(ROOT, &fetcher, BundleOptions::new("out", "svc")).unwrap();

        assert_eq!(plan_names(&bundle), [("urn:b".to_string(), "svc_0.xsd".to_string())]);
        assert_eq!(
            bundle.diagnostics().count_kind(DiagnosticKind::ParseFailed),
            1
        );
        assert_eq!(locations(bundle.root()), ["a.xsd", "svc_0.xsd"]);
    }

    #[test]
    fn failed_namespace_is_not_retried() {
        let fetcher = MemoryFetcher::default()
            .with(ROOT, wsdl(&[("urn:gone", "gone.xsd"), ("urn:a", "a.xsd")]))
            .with("http://x/a.xsd", xsd("urn:a", &[("urn:gone", "gone.xsd")]));

        let bundle = Bundle::resolve(ROOT, &fetcher, BundleOptions::new("out", "svc")).unwrap();

        assert_eq!(fetcher.count("http://x/gone.xsd"), 1);
        assert_eq!(
            bundle.diagnostics().count_kind(DiagnosticKind::FetchFailed),
            1
        );
    }

    #[test]
    fn empty_location_does_not_refetch_the_root() {
        let fetcher = MemoryFetcher::default().with(ROOT, wsdl(&[("urn:a", "")]));

        let bundle = Bundle::resolve(ROOT, &fetcher, BundleOptions::new("out", "svc")).unwrap();

        assert_eq!(fetcher.count(ROOT), 1);
        assert!(bundle.registry().is_empty());
        assert_eq!(
            bundle.diagnostics().count_kind(DiagnosticKind::FetchFailed),
            1
        );
        assert_eq!(locations(bundle.root()), [""]);
    }

    #[test]
    fn root_failures_abort() {
        let fetcher = MemoryFetcher::default().with("bad.wsdl", "");

        let err = Bundle::resolve(ROOT, &fetcher, BundleOptions::new("out", "svc")).unwrap_err();
        assert!(matches!(err, BundleError::RootFetch { .. }));
        assert_eq!(err.exit_code(), 3);

        let err =
            Bundle::resolve("bad.wsdl", &fetcher, BundleOptions::new("out", "svc")).unwrap_err();
        assert!(matches!(err, BundleError::RootParse { .. }));
        assert_eq!(err.exit_code(), 2);
    }
}

// === Writing ===

mod writing {
    use super::*;

    #[test]
    fn writes_flat_bundle() {
        let dir = TempDir::new().unwrap();
        let folder = dir.path().join("wsdl");
        let fetcher = MemoryFetcher::default()
            .with(ROOT, wsdl(&[("urn:a", "a.xsd")]))
            .with("http://x/a.xsd", xsd("urn:a", &[("urn:b", "b.xsd")]))
            .with("http://x/b.xsd", xsd("urn:b", &[]));

        let report = bundle(ROOT, &fetcher, BundleOptions::new(&folder, "svc")).unwrap();

        assert!(report.is_clean());
        assert_eq!(report.rewritten, 2);
        assert_eq!(
            report.written,
            [
                folder.join("svc.wsdl"),
                folder.join("svc_0.xsd"),
                folder.join("svc_1.xsd"),
            ]
        );
        let a = std::fs::read_to_string(folder.join("svc_0.xsd")).unwrap();
        assert_eq!(a, xsd("urn:a", &[("urn:b", "svc_1.xsd")]));
    }

    #[test]
    fn rebundling_output_changes_nothing() {
        let dir = TempDir::new().unwrap();
        let fetcher = MemoryFetcher::default()
            .with(ROOT, wsdl(&[("urn:a", "a.xsd")]))
            .with("http://x/a.xsd", xsd("urn:a", &[("urn:a", "a.xsd")]));

        let first = dir.path().join("first");
        bundle(ROOT, &fetcher, BundleOptions::new(&first, "svc")).unwrap();

        // Bundle the written output again from disk
        let fetcher = wsdl_bundle::FileFetcher;
        let root = first.join("svc.wsdl");
        let second = dir.path().join("second");
        let report = bundle(
            root.to_str().unwrap(),
            &fetcher,
            BundleOptions::new(&second, "svc"),
        )
        .unwrap();

        assert_eq!(report.rewritten, 0);
        for name in ["svc.wsdl", "svc_0.xsd"] {
            assert_eq!(
                std::fs::read_to_string(first.join(name)).unwrap(),
                std::fs::read_to_string(second.join(name)).unwrap()
            );
        }
    }

    #[test]
    fn declared_encoding_is_written_as_utf8() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("src");
        std::fs::create_dir(&source).unwrap();
        std::fs::write(
            source.join("svc.wsdl"),
            wsdl(&[("urn:a", "a.xsd")]),
        )
        .unwrap();
        std::fs::write(
            source.join("a.xsd"),
            &b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><xsd:schema targetNamespace=\"urn:a\"><xsd:annotation>caf\xE9</xsd:annotation></xsd:schema>"[..],
        )
        .unwrap();

        let out = dir.path().join("out");
        let root = source.join("svc.wsdl");
        let report = bundle(
            root.to_str().unwrap(),
            &wsdl_bundle::FileFetcher,
            BundleOptions::new(&out, "svc"),
        )
        .unwrap();
        assert!(report.is_clean());

        let written = std::fs::read_to_string(out.join("svc_0.xsd")).unwrap();
        assert!(written.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(written.contains("caf\u{e9}"));
    }

    #[test]
    fn writing_twice_overwrites() {
        let dir = TempDir::new().unwrap();
        let fetcher = MemoryFetcher::default()
            .with(ROOT, wsdl(&[("urn:a", "a.xsd")]))
            .with("http://x/a.xsd", xsd("urn:a", &[]));

        let resolved =
            Bundle::resolve(ROOT, &fetcher, BundleOptions::new(dir.path(), "svc")).unwrap();
        let first = resolved.write();
        let second = resolved.write();

        assert!(first.is_complete());
        assert_eq!(first.written, second.written);
    }
}

// === Remote ===

#[cfg(feature = "remote")]
mod remote {
    use super::*;
    use std::io::Write;
    use std::time::Duration;
    use wsdl_bundle::{HttpFetcher, HttpOptions};

    #[test]
    fn timeout_is_a_fetch_failure() {
        let mut server = mockito::Server::new();
        let _root = server
            .mock("GET", "/svc.wsdl")
            .with_body(wsdl(&[("urn:slow", "slow.xsd"), ("urn:b", "b.xsd")]))
            .create();
        let _slow = server
            .mock("GET", "/slow.xsd")
            .with_chunked_body(|w| {
                std::thread::sleep(Duration::from_secs(2));
                w.write_all(xsd("urn:slow", &[]).as_bytes())
            })
            .create();
        let _b = server
            .mock("GET", "/b.xsd")
            .with_body(xsd("urn:b", &[]))
            .create();

        let options = HttpOptions {
            timeout: Duration::from_millis(200),
            ..HttpOptions::default()
        };
        let fetcher = HttpFetcher::new(&options).unwrap();
        let root = format!("{}/svc.wsdl", server.url());

        let bundle = Bundle::resolve(&root, &fetcher, BundleOptions::new("out", "svc")).unwrap();

        assert_eq!(plan_names(&bundle), [("urn:b".to_string(), "svc_0.xsd".to_string())]);
        let failed: Vec<_> = bundle
            .diagnostics()
            .iter()
            .filter(|d| d.kind == DiagnosticKind::FetchFailed)
            .collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].namespace.as_deref(), Some("urn:slow"));
        assert_eq!(locations(bundle.root()), ["slow.xsd", "svc_0.xsd"]);
    }
}
