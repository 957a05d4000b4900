//! Bundle derivation from changed file paths.
//!
//! A bundle is the directory three levels below the catalog root:
//! `<environment>/<catalog>/<schema>/<table>/<file>`. Each changed file maps to
//! the `catalog/schema/table` identifier of its parent directory, and the
//! directory's contents decide whether the bundle is a table or a view.

use crate::error::BundleError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const LOAD_SCRIPT_PREFIX: &str = "load_";
const LOAD_SCRIPT_EXTENSION: &str = "sql";
const TASKS_DIR: &str = "tasks";

/// `catalog/schema/name` identifier of a bundle.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BundleId(pub String);

impl BundleId {
    pub fn from_segments(catalog: &str, schema: &str, name: &str) -> Self {
        BundleId(format!("{catalog}/{schema}/{name}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BundleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BundleKind {
    Table,
    View,
}

/// Bundles touched by a change set, split by kind.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ChangedBundles {
    pub views: BTreeSet<BundleId>,
    pub tables: BTreeSet<BundleId>,
}

impl ChangedBundles {
    pub fn insert(&mut self, kind: BundleKind, id: BundleId) -> bool {
        match kind {
            BundleKind::Table => self.tables.insert(id),
            BundleKind::View => self.views.insert(id),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty() && self.tables.is_empty()
    }

    pub fn len(&self) -> usize {
        self.views.len() + self.tables.len()
    }
}

/// Lists the files (symlinks to files included) directly inside a directory.
///
/// Classification only needs file names, so the pipeline goes through this
/// trait instead of touching the file system directly.
pub trait DirectoryListing {
    fn list_file_names(&self, dir: &Path) -> io::Result<Vec<String>>;
}

/// [`DirectoryListing`] over the real file system, resolving changed paths
/// against `root`.
#[derive(Clone, Debug)]
pub struct FsListing {
    root: PathBuf,
}

impl FsListing {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Default for FsListing {
    fn default() -> Self {
        Self::new(".")
    }
}

impl DirectoryListing for FsListing {
    fn list_file_names(&self, dir: &Path) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(self.root.join(dir))? {
            let entry = entry?;
            // `Path::is_file` follows symlinks, so linked load scripts count.
            if !entry.path().is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

/// True for `load_*.sql` file names, which mark a bundle as a table.
pub fn is_load_script(name: &str) -> bool {
    name.starts_with(LOAD_SCRIPT_PREFIX)
        && Path::new(name).extension().and_then(|ext| ext.to_str()) == Some(LOAD_SCRIPT_EXTENSION)
}

/// Classify a bundle directory by looking for a load script inside it.
pub fn classify_bundle_dir(
    dir: &Path,
    listing: &impl DirectoryListing,
) -> Result<BundleKind, BundleError> {
    let names = listing
        .list_file_names(dir)
        .map_err(|err| BundleError::io(dir, err))?;
    if names.iter().any(|name| is_load_script(name)) {
        Ok(BundleKind::Table)
    } else {
        Ok(BundleKind::View)
    }
}

/// Ancestor directories of a changed file, nearest first.
struct Ancestry<'a> {
    table_dir: &'a Path,
    table: &'a str,
    schema: &'a str,
    catalog: &'a str,
    environment: &'a str,
}

impl<'a> Ancestry<'a> {
    fn of(file: &'a Path) -> Self {
        let table_dir = parent_of(file);
        let schema_dir = parent_of(table_dir);
        let catalog_dir = parent_of(schema_dir);
        let environment_dir = parent_of(catalog_dir);
        Self {
            table_dir,
            table: dir_name(table_dir),
            schema: dir_name(schema_dir),
            catalog: dir_name(catalog_dir),
            environment: dir_name(environment_dir),
        }
    }

    /// Name of the first ancestor that marks a metadata folder, if any.
    fn metadata_folder(&self) -> Option<&'a str> {
        if self.table.is_empty() || self.table.starts_with('_') || self.table == TASKS_DIR {
            return Some(self.table);
        }
        if self.schema.is_empty() || self.schema.starts_with('_') || self.schema == TASKS_DIR {
            return Some(self.schema);
        }
        if self.catalog.is_empty() || self.catalog.starts_with('_') {
            return Some(self.catalog);
        }
        None
    }
}

fn parent_of(path: &Path) -> &Path {
    path.parent().unwrap_or(Path::new(""))
}

fn dir_name(path: &Path) -> &str {
    path.file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default()
}

/// Fold changed file paths into the set of bundles they belong to.
///
/// Files under metadata folders (names starting with `_`, or `tasks` at the
/// table and schema level) are skipped. When `expected_environment` is set,
/// the first file whose fourth ancestor differs aborts the whole derivation.
/// Each bundle directory is listed once, however many of its files changed.
/// Directories from different environments can share an identifier; each is
/// classified on its own, so an identifier may land in both sets.
pub fn derive_bundles<I, S>(
    files: I,
    expected_environment: Option<&str>,
    listing: &impl DirectoryListing,
) -> Result<ChangedBundles, BundleError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut bundles = ChangedBundles::default();
    let mut classified: BTreeMap<PathBuf, BundleKind> = BTreeMap::new();

    for file in files {
        let file = file.as_ref();
        let ancestry = Ancestry::of(Path::new(file));

        if let Some(folder) = ancestry.metadata_folder() {
            debug!(file, folder, "skipping file under metadata folder");
            continue;
        }

        if let Some(expected) = expected_environment {
            if ancestry.environment != expected {
                return Err(BundleError::EnvironmentMismatch {
                    file: file.to_string(),
                    expected: expected.to_string(),
                    actual: ancestry.environment.to_string(),
                });
            }
        }

        let id = BundleId::from_segments(ancestry.catalog, ancestry.schema, ancestry.table);
        let kind = match classified.get(ancestry.table_dir) {
            Some(kind) => *kind,
            None => {
                let kind = classify_bundle_dir(ancestry.table_dir, listing)?;
                classified.insert(ancestry.table_dir.to_path_buf(), kind);
                kind
            }
        };
        debug!(file, bundle = %id, ?kind, "derived bundle");
        bundles.insert(kind, id);
    }

    info!(
        views = bundles.views.len(),
        tables = bundles.tables.len(),
        "derived bundles"
    );
    Ok(bundles)
}
