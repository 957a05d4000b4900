//! Parsing of git status reports into changed file paths.
//!
//! The report holds one change per line in the `--name-status` shape:
//! `<status>\t<path>` for additions, modifications and deletions, and
//! `<status><score>\t<old path>\t<new path>` for renames and copies. Only the
//! first character of the status token is significant.

use crate::error::BundleError;
use tracing::{debug, info};

/// Status letter of a single change record.
///
/// `Other` keeps the less common git codes (copies, type changes, unmerged
/// paths) representable so they are dropped explicitly instead of misread.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ChangeStatus {
    Added,
    Modified,
    Deleted,
    Renamed { score: Option<u8> },
    Other(char),
}

impl ChangeStatus {
    /// Parse a raw status token such as `A`, `M` or `R087`.
    fn from_token(token: &str) -> Option<Self> {
        let mut chars = token.chars();
        let code = chars.next()?;
        let status = match code {
            'A' => ChangeStatus::Added,
            'M' => ChangeStatus::Modified,
            'D' => ChangeStatus::Deleted,
            'R' => ChangeStatus::Renamed {
                score: chars.as_str().parse().ok(),
            },
            other => ChangeStatus::Other(other),
        };
        Some(status)
    }

    /// Whether a change of this kind can introduce or alter a bundle.
    pub fn is_relevant(&self) -> bool {
        matches!(
            self,
            ChangeStatus::Added | ChangeStatus::Modified | ChangeStatus::Renamed { .. }
        )
    }
}

/// One parsed line of the status report.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ChangeRecord {
    pub status: ChangeStatus,
    pub path: String,
    /// Source path of a rename or copy.
    pub old_path: Option<String>,
}

impl ChangeRecord {
    /// First `/`-separated segment of the path.
    pub fn top_level_folder(&self) -> &str {
        self.path.split('/').next().unwrap_or_default()
    }
}

/// Parse a single status line.
///
/// Blank lines yield `Ok(None)`. A line without a tab-separated path, or with
/// an empty status token, is rejected with its 1-based `line_number`.
pub fn parse_status_line(
    line: &str,
    line_number: usize,
) -> Result<Option<ChangeRecord>, BundleError> {
    let line = line.trim_end_matches(['\n', '\r']);
    if line.trim().is_empty() {
        return Ok(None);
    }

    let fields: Vec<&str> = line.split('\t').collect();
    let malformed = |reason| BundleError::MalformedStatusLine {
        line_number,
        reason,
        line: line.to_string(),
    };
    if fields.len() < 2 {
        return Err(malformed("missing tab-separated path"));
    }
    let status =
        ChangeStatus::from_token(fields[0]).ok_or_else(|| malformed("empty status token"))?;
    let path = fields[fields.len() - 1].to_string();
    let old_path = if fields.len() > 2 {
        Some(fields[1].to_string())
    } else {
        None
    };

    Ok(Some(ChangeRecord {
        status,
        path,
        old_path,
    }))
}

/// Parse every line of a status report, skipping blanks.
pub fn parse_status_report<I, S>(lines: I) -> Result<Vec<ChangeRecord>, BundleError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut records = Vec::new();
    for (idx, line) in lines.into_iter().enumerate() {
        if let Some(record) = parse_status_line(line.as_ref(), idx + 1)? {
            records.push(record);
        }
    }
    Ok(records)
}

/// Paths of added, modified and renamed files under `workspace_folder`.
///
/// Report order is preserved and repeated paths are kept; deduplication
/// happens once paths are folded into bundles.
pub fn changed_files_from_lines<I, S>(
    lines: I,
    workspace_folder: &str,
) -> Result<Vec<String>, BundleError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut changed = Vec::new();
    for record in parse_status_report(lines)? {
        if !record.status.is_relevant() {
            debug!(path = %record.path, status = ?record.status, "ignoring change status");
            continue;
        }
        if record.top_level_folder() != workspace_folder {
            debug!(path = %record.path, workspace_folder, "outside workspace folder");
            continue;
        }
        changed.push(record.path);
    }
    info!(count = changed.len(), workspace_folder, "collected changed files");
    Ok(changed)
}
