//! Per-group manifest export.
//!
//! Writes one generated document per operation group listing the operations
//! the gateway exposes for it. The output is a build artifact for consumers
//! of the API surface, regenerated on demand.

use std::fs;
use std::path::Path;
use tracing::info;

use super::registry::OperationRegistry;
use crate::error::Result;

const HEADER: &str = "\
# ------------------------------------------------------
# THIS FILE WAS AUTOMATICALLY GENERATED (DO NOT MODIFY)
# ------------------------------------------------------
";

/// Write one manifest file per group into `dir`, creating it if needed.
pub fn export_group_manifests(registry: &OperationRegistry, dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)?;

    for group in registry.groups() {
        let path = dir.join(format!("{}.manifest.txt", group.to_lowercase()));

        let mut document = String::from(HEADER);
        document.push('\n');
        document.push_str(&format!("# Operations for group: {group}\n\n"));

        for operation in registry.operations().filter(|op| op.group == group) {
            if operation.arguments.is_empty() {
                document.push_str(&format!("{}\n", operation.name));
            } else {
                document.push_str(&format!(
                    "{}({})\n",
                    operation.name,
                    operation.arguments.join(", ")
                ));
            }
        }

        fs::write(&path, document)?;
        info!(group = %group, path = %path.display(), "Exported group manifest");
    }

    Ok(())
}
