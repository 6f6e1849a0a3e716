//! Ignore predicate: version-control directories, the root ignore file, and extra patterns.

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use log::{debug, warn};
use std::path::{Path, PathBuf};

use crate::pipeline::PipelineError;
use crate::pipeline::error_handler::{ErrorTx, report};
use crate::utils::config::{EXCLUDED_DIR_NAMES, PackagePaths};

/// Read-only after construction; shared by reference with the walker (and its threads).
#[derive(Debug, Default)]
pub struct IgnorePredicate {
    matcher: Option<Gitignore>,
    /// Exact files never to count (the per-file output destination).
    excluded_files: Vec<PathBuf>,
}

impl IgnorePredicate {
    /// Predicate that only excludes version-control directories.
    pub fn none() -> Self {
        Self::default()
    }

    /// Build from the ignore file at `root` plus `extra` patterns (gitignore syntax).
    ///
    /// A missing ignore file is normal. A malformed one is reported on `error_tx` and dropped,
    /// so the predicate degrades to the extra patterns alone; invalid extra patterns are logged
    /// and skipped.
    pub fn load(root: &Path, extra: &[String], error_tx: &ErrorTx) -> Self {
        let ignore_path = ignore_file_path(root);
        let from_file = if ignore_path.is_file() {
            let mut builder = GitignoreBuilder::new(root);
            match builder.add(&ignore_path) {
                None => Some(builder),
                Some(err) => {
                    let err = PipelineError::IgnoreLoad {
                        path: ignore_path.clone(),
                        msg: err.to_string(),
                    };
                    warn!("{}; ignore file not applied", err);
                    report(error_tx, err);
                    None
                }
            }
        } else {
            debug!("No ignore file at {}", ignore_path.display());
            None
        };

        let mut builder = from_file.unwrap_or_else(|| GitignoreBuilder::new(root));
        for pattern in extra {
            if let Err(err) = builder.add_line(None, pattern) {
                warn!("Skipping exclude pattern {:?}: {}", pattern, err);
            }
        }

        match builder.build() {
            Ok(matcher) if matcher.is_empty() => Self::none(),
            Ok(matcher) => {
                debug!("Ignore predicate loaded with {} patterns", matcher.num_ignores());
                Self {
                    matcher: Some(matcher),
                    excluded_files: Vec::new(),
                }
            }
            Err(err) => {
                let err = PipelineError::IgnoreLoad {
                    path: ignore_path,
                    msg: err.to_string(),
                };
                warn!("{}; ignore file not applied", err);
                report(error_tx, err);
                Self::none()
            }
        }
    }

    /// True for a directory the walker must not descend into.
    pub fn skip_dir(&self, path: &Path) -> bool {
        is_vcs_dir(path) || self.matches(path, true)
    }

    /// Also skip `path` itself. Matched by canonical path, so a file that does not exist yet
    /// is left alone.
    pub fn excluding_file(mut self, path: &Path) -> Self {
        if let Ok(canonical) = path.canonicalize() {
            debug!("Excluding {} from the walk", canonical.display());
            self.excluded_files.push(canonical);
        }
        self
    }

    /// True for a file matched by the ignore patterns or excluded by path.
    pub fn skip_file(&self, path: &Path) -> bool {
        self.excluded_files.iter().any(|f| f == path) || self.matches(path, false)
    }

    fn matches(&self, path: &Path, is_dir: bool) -> bool {
        self.matcher
            .as_ref()
            .is_some_and(|m| m.matched(path, is_dir).is_ignore())
    }
}

/// Directory named like a version-control metadata directory (`.git`, `.hg`, `.svn`).
pub fn is_vcs_dir(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| EXCLUDED_DIR_NAMES.contains(&name))
}

/// Ignore file location for `root`, for diagnostics.
pub fn ignore_file_path(root: &Path) -> PathBuf {
    root.join(PackagePaths::get().ignore_filename())
}
