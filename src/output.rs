//! JSON output consumed by later CI steps.
//!
//! Views and tables go to separate files in the destination directory, each a
//! JSON array of `catalog/schema/name` strings.

use crate::bundle::{BundleId, ChangedBundles};
use crate::error::BundleError;
use std::collections::BTreeSet;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

pub const VIEW_BUNDLES_FILE: &str = "view_bundles.json";
pub const TABLE_BUNDLES_FILE: &str = "table_bundles.json";

/// Locations of the files written by [`write_bundle_files`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BundleOutputPaths {
    pub views: PathBuf,
    pub tables: PathBuf,
}

/// Write both bundle files into `dest_dir`, creating it when missing.
///
/// Each file is staged in a temporary file beside its target and renamed into
/// place, so readers never observe a partially written array.
pub fn write_bundle_files(
    dest_dir: &Path,
    bundles: &ChangedBundles,
) -> Result<BundleOutputPaths, BundleError> {
    fs::create_dir_all(dest_dir).map_err(|err| BundleError::io(dest_dir, err))?;
    let views = dest_dir.join(VIEW_BUNDLES_FILE);
    let tables = dest_dir.join(TABLE_BUNDLES_FILE);
    write_json_atomic(&views, &bundles.views)?;
    write_json_atomic(&tables, &bundles.tables)?;
    Ok(BundleOutputPaths { views, tables })
}

fn write_json_atomic(target: &Path, ids: &BTreeSet<BundleId>) -> Result<(), BundleError> {
    let dir = target.parent().unwrap_or(Path::new("."));
    let tmp = NamedTempFile::new_in(dir).map_err(|err| BundleError::io(dir, err))?;
    let mut writer = BufWriter::new(tmp);
    serde_json::to_writer(&mut writer, ids).map_err(|err| BundleError::json(target, err))?;
    writer.flush().map_err(|err| BundleError::io(target, err))?;
    let tmp = writer
        .into_inner()
        .map_err(|err| BundleError::io(target, err.into_error()))?;
    tmp.persist(target)
        .map_err(|err| BundleError::io(target, err.error))?;
    debug!(path = %target.display(), count = ids.len(), "wrote bundle file");
    Ok(())
}

/// Read the two bundle files back from `dest_dir`.
pub fn read_bundle_files(dest_dir: &Path) -> Result<ChangedBundles, BundleError> {
    Ok(ChangedBundles {
        views: read_json(&dest_dir.join(VIEW_BUNDLES_FILE))?,
        tables: read_json(&dest_dir.join(TABLE_BUNDLES_FILE))?,
    })
}

fn read_json(path: &Path) -> Result<BTreeSet<BundleId>, BundleError> {
    let data = fs::read_to_string(path).map_err(|err| BundleError::io(path, err))?;
    serde_json::from_str(&data).map_err(|err| BundleError::json(path, err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::BundleKind;
    use serde_json::Value;
    use tempfile::TempDir;

    fn sample() -> ChangedBundles {
        let mut bundles = ChangedBundles::default();
        bundles.insert(BundleKind::View, BundleId::from_segments("acme", "sales", "customers"));
        bundles.insert(BundleKind::Table, BundleId::from_segments("acme", "sales", "orders"));
        bundles.insert(BundleKind::Table, BundleId::from_segments("acme", "hr", "people"));
        bundles
    }

    #[test]
    fn writes_sorted_string_arrays() {
        let dir = TempDir::new().unwrap();
        let paths = write_bundle_files(dir.path(), &sample()).unwrap();
        assert_eq!(paths.views, dir.path().join(VIEW_BUNDLES_FILE));

        let tables: Value =
            serde_json::from_str(&fs::read_to_string(&paths.tables).unwrap()).unwrap();
        assert_eq!(tables, serde_json::json!(["acme/hr/people", "acme/sales/orders"]));
        let views: Value =
            serde_json::from_str(&fs::read_to_string(&paths.views).unwrap()).unwrap();
        assert_eq!(views, serde_json::json!(["acme/sales/customers"]));
    }

    #[test]
    fn empty_sets_write_empty_arrays() {
        let dir = TempDir::new().unwrap();
        let paths = write_bundle_files(dir.path(), &ChangedBundles::default()).unwrap();
        assert_eq!(fs::read_to_string(paths.views).unwrap(), "[]");
        assert_eq!(fs::read_to_string(paths.tables).unwrap(), "[]");
    }

    #[test]
    fn creates_missing_destination_and_overwrites() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("out").join("bundles");
        write_bundle_files(&dest, &sample()).unwrap();
        write_bundle_files(&dest, &ChangedBundles::default()).unwrap();
        assert!(read_bundle_files(&dest).unwrap().is_empty());
        let leftovers: Vec<_> = fs::read_dir(&dest).unwrap().collect();
        assert_eq!(leftovers.len(), 2);
    }

    #[test]
    fn invalid_json_names_the_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(VIEW_BUNDLES_FILE), "[").unwrap();
        fs::write(dir.path().join(TABLE_BUNDLES_FILE), "[]").unwrap();
        let err = read_bundle_files(dir.path()).unwrap_err();
        match err {
            BundleError::Json { path, .. } => {
                assert_eq!(path, dir.path().join(VIEW_BUNDLES_FILE))
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
