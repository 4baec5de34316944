//! Deterministic local filenames for resolved schemas.

use crate::registry::NamespaceRegistry;
use crate::types::SCHEMA_EXTENSION;

/// Number of decimal digits needed for the indices `0..count`.
///
/// Always at least 1, so a single schema is `_0`, seven are `_0`..`_6` and
/// 250 are `_000`..`_249`.
pub fn index_width(count: usize) -> usize {
    let mut largest = count.saturating_sub(1);
    let mut width = 1;
    while largest >= 10 {
        largest /= 10;
        width += 1;
    }
    width
}

/// Local filename for the schema at `index`, e.g. `svc_07.xsd`.
pub fn local_name(basename: &str, index: usize, width: usize) -> String {
    format!(
        "{}_{:0width$}.{}",
        basename,
        index,
        SCHEMA_EXTENSION,
        width = width
    )
}

/// Assign a local name to every registered schema in registration order.
///
/// Must run after resolution has reached its fixpoint: the width depends on
/// the final count. Schemas that already carry a name keep it.
pub fn assign_names(registry: &mut NamespaceRegistry, basename: &str) {
    let width = index_width(registry.len());
    for (index, schema) in registry.values_mut().enumerate() {
        let name = local_name(basename, index, width);
        tracing::debug!(namespace = schema.namespace(), name = name.as_str(), "assigned local name");
        schema.assign_local_name(name);
    }
}
