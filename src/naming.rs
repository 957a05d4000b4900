//! Naming convention checks for bundle identifiers.
//!
//! Every segment of `catalog/schema/name` must be snake_case over the Danish
//! alphabet: lowercase `a-z`, `æ`, `ø`, `å`, digits and underscore. The
//! case-insensitive mode swaps the lowercase class for `\w`, which admits any
//! Unicode word character rather than only uppercase Danish letters.

use crate::bundle::{BundleId, ChangedBundles};
use crate::error::BundleError;
use regex::Regex;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;
use tracing::info;

static STRICT_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z_\dæøå]+/[a-z_\dæøå]+/[a-z_\dæøå]+$").expect("static regex must compile")
});
static RELAXED_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\w\dæøåÆØÅ]+/[\w\dæøåÆØÅ]+/[\w\dæøåÆØÅ]+$")
        .expect("static regex must compile")
});

/// Full-match pattern for a bundle identifier.
pub fn bundle_name_pattern(ignore_case: bool) -> &'static Regex {
    if ignore_case {
        &RELAXED_NAME_RE
    } else {
        &STRICT_NAME_RE
    }
}

pub fn is_valid_bundle_name(name: &str, ignore_case: bool) -> bool {
    bundle_name_pattern(ignore_case).is_match(name)
}

/// Every bundle that failed the naming check, grouped by kind.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NamingViolations {
    pub ignore_case: bool,
    pub views: Vec<BundleId>,
    pub tables: Vec<BundleId>,
}

impl NamingViolations {
    pub fn is_empty(&self) -> bool {
        self.views.is_empty() && self.tables.is_empty()
    }

    pub fn len(&self) -> usize {
        self.views.len() + self.tables.len()
    }
}

impl fmt::Display for NamingViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let not = if self.ignore_case { "" } else { "NOT " };
        writeln!(
            f,
            "Only Danish letters (a-z and æøå), digits and underscore is allowed in names."
        )?;
        write!(f, "Uppercase letters are {not}allowed.")?;
        for (kind, names) in [("views", &self.views), ("tables", &self.tables)] {
            if names.is_empty() {
                continue;
            }
            write!(
                f,
                "\nThe following {kind} are named with characters that are not allowed:"
            )?;
            for name in names {
                write!(f, "\n- {name}")?;
            }
        }
        Ok(())
    }
}

/// Check every view and table name, failing once with all offenders.
pub fn validate_bundle_names(
    bundles: &ChangedBundles,
    ignore_case: bool,
) -> Result<(), BundleError> {
    let pattern = bundle_name_pattern(ignore_case);
    let offenders = |ids: &BTreeSet<BundleId>| -> Vec<BundleId> {
        ids.iter()
            .filter(|id| !pattern.is_match(id.as_str()))
            .cloned()
            .collect()
    };

    let violations = NamingViolations {
        ignore_case,
        views: offenders(&bundles.views),
        tables: offenders(&bundles.tables),
    };
    if violations.is_empty() {
        info!(checked = bundles.len(), ignore_case, "bundle names valid");
        return Ok(());
    }
    Err(BundleError::NamingConvention(violations))
}
