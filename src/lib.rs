//! Shared library for the changed-bundles CI step.
//!
//! A CI job lists the files changed by a pull request (`git diff
//! --name-status` or `git status --porcelain` style), and this crate turns
//! that list into the set of data bundles that need redeploying. The stages
//! are public so other helpers can reuse them:
//!
//! 1. [`status`] extracts added, modified and renamed paths inside one
//!    workspace folder.
//! 2. [`bundle`] folds each path into a `catalog/schema/name` bundle and
//!    classifies it as a table or a view from the bundle directory contents.
//! 3. [`naming`] rejects bundles whose names leave the Danish snake_case
//!    charset, reporting every offender at once.
//! 4. [`output`] writes `view_bundles.json` and `table_bundles.json`.
//!
//! [`run`] wires the stages together for the `bundles-from-git-status` binary.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub mod bundle;
pub mod error;
pub mod naming;
pub mod output;
pub mod status;

pub use bundle::{
    BundleId, BundleKind, ChangedBundles, DirectoryListing, FsListing, classify_bundle_dir,
    derive_bundles, is_load_script,
};
pub use error::BundleError;
pub use naming::{
    NamingViolations, bundle_name_pattern, is_valid_bundle_name, validate_bundle_names,
};
pub use output::{
    BundleOutputPaths, TABLE_BUNDLES_FILE, VIEW_BUNDLES_FILE, read_bundle_files,
    write_bundle_files,
};
pub use status::{
    ChangeRecord, ChangeStatus, changed_files_from_lines, parse_status_line, parse_status_report,
};

/// Everything a single run needs; nothing is read from globals.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RunConfig {
    /// Git status report to read.
    pub status_file: PathBuf,
    /// Directory receiving the two bundle files.
    pub output_dir: PathBuf,
    /// Top-level folder a changed path must start with.
    pub workspace_folder: String,
    /// Relax name validation to any word character, upper case included.
    pub ignore_case: bool,
    /// Required name of each bundle's fourth ancestor directory.
    pub expected_environment: Option<String>,
    /// Directory the changed paths are relative to.
    pub repo_root: PathBuf,
}

impl RunConfig {
    pub fn new(
        status_file: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        workspace_folder: impl Into<String>,
    ) -> Self {
        Self {
            status_file: status_file.into(),
            output_dir: output_dir.into(),
            workspace_folder: workspace_folder.into(),
            ignore_case: false,
            expected_environment: None,
            repo_root: PathBuf::from("."),
        }
    }
}

/// Outcome of a successful [`run`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RunSummary {
    pub changed_files: usize,
    pub views: usize,
    pub tables: usize,
    pub outputs: BundleOutputPaths,
}

/// Read the status report and derive validated bundles without writing output.
///
/// Returns the bundles together with the number of changed files that were
/// considered.
pub fn collect_bundles(
    config: &RunConfig,
    listing: &impl DirectoryListing,
) -> Result<(ChangedBundles, usize), BundleError> {
    let report = read_status_file(&config.status_file)?;
    let files = changed_files_from_lines(report.lines(), &config.workspace_folder)?;
    let bundles = derive_bundles(&files, config.expected_environment.as_deref(), listing)?;
    validate_bundle_names(&bundles, config.ignore_case)?;
    Ok((bundles, files.len()))
}

/// Full pipeline against the real file system rooted at `config.repo_root`.
///
/// Output files are only written once every bundle name has been validated.
pub fn run(config: &RunConfig) -> Result<RunSummary, BundleError> {
    let listing = FsListing::new(&config.repo_root);
    let (bundles, changed_files) = collect_bundles(config, &listing)?;
    let outputs = write_bundle_files(&config.output_dir, &bundles)?;
    info!(
        views = bundles.views.len(),
        tables = bundles.tables.len(),
        output_dir = %config.output_dir.display(),
        "wrote bundle files"
    );
    Ok(RunSummary {
        changed_files,
        views: bundles.views.len(),
        tables: bundles.tables.len(),
        outputs,
    })
}

fn read_status_file(path: &Path) -> Result<String, BundleError> {
    fs::read_to_string(path).map_err(|err| BundleError::io(path, err))
}
