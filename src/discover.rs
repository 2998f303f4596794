use std::path::{Path, PathBuf};

use clap::ValueEnum;
use walkdir::WalkDir;

/// How a raster file name maps to its `fileIdentifier` key in the CSV table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum IdPolicy {
    /// Full file name including the extension (`scene.tif`).
    FileName,
    /// File name with the trailing `.tif` extension stripped (`scene`).
    Stem,
}

/// Recursively enumerate `.tif` files under `root`, case-insensitively.
///
/// Traversal order is filesystem-dependent. Unreadable entries are skipped.
pub fn discover_rasters(root: &Path) -> impl Iterator<Item = PathBuf> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(|name| has_tif_extension(name))
        })
        .map(|entry| entry.into_path())
}

/// Resolve the identifier for a raster under the given policy.
///
/// Returns `None` for file names that are not valid UTF-8.
pub fn resolve_identifier(path: &Path, policy: IdPolicy) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    match policy {
        IdPolicy::FileName => Some(name.to_string()),
        IdPolicy::Stem => Some(strip_tif_extension(name).to_string()),
    }
}

fn has_tif_extension(name: &str) -> bool {
    name.len() > 4 && name[name.len() - 4..].eq_ignore_ascii_case(".tif")
}

// Only the trailing extension is removed: `scene.tiffoo.tif` resolves to
// `scene.tiffoo`, not `scene`.
fn strip_tif_extension(name: &str) -> &str {
    if has_tif_extension(name) {
        &name[..name.len() - 4]
    } else {
        name
    }
}
