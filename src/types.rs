//! Public and internal types for the locpipe API and pipeline.

use memmap2::Mmap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::ops::{AddAssign, Deref};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::pipeline::{PipelineError, QueueCaps};
use crate::utils::config::ReadConsts;

// ---- Work units ----
//
// A file moves through the pipeline as FileJob -> LoadedJob -> CountedJob. Each stage takes the
// previous state by value and sends the next one on, so content and counts are set exactly once
// and no two stages ever hold the same unit.

/// A discovered file: identity plus the language resolved from its extension.
#[derive(Debug, PartialEq, Eq)]
pub struct FileJob {
    path: PathBuf,
    extension: String,
    language: &'static str,
}

impl FileJob {
    pub fn new(path: PathBuf, extension: impl Into<String>, language: &'static str) -> Self {
        Self {
            path,
            extension: extension.into(),
            language,
        }
    }

    /// Full path (directory joined with file name).
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory the file lives in.
    pub fn location(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    pub fn filename(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Lowercased extension used for the language lookup.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn language(&self) -> &'static str {
        self.language
    }
}

/// File bytes: buffered for ordinary files, memory-mapped above [`ReadConsts::MMAP_THRESHOLD`].
pub enum Content {
    Buffered(Vec<u8>),
    Mapped(Mmap),
}

impl Deref for Content {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Content::Buffered(bytes) => bytes.as_slice(),
            Content::Mapped(map) => &map[..],
        }
    }
}

impl std::fmt::Debug for Content {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            Content::Buffered(_) => "Buffered",
            Content::Mapped(_) => "Mapped",
        };
        write!(f, "{}({} bytes)", kind, self.len())
    }
}

/// A job whose content has been read by the reader pool.
#[derive(Debug)]
pub struct LoadedJob {
    pub job: FileJob,
    pub content: Content,
}

/// A job counted by the classifier pool. Content is released at this point.
#[derive(Debug)]
pub struct CountedJob {
    pub job: FileJob,
    pub bytes: u64,
    pub counts: LineCounts,
}

// ---- Metrics ----

/// Line categories for one file (or a sum of files).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LineCounts {
    pub lines: u64,
    pub code: u64,
    pub comment: u64,
    pub blank: u64,
}

impl AddAssign for LineCounts {
    fn add_assign(&mut self, rhs: Self) {
        self.lines += rhs.lines;
        self.code += rhs.code;
        self.comment += rhs.comment;
        self.blank += rhs.blank;
    }
}

/// Aggregate counters for one language.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LanguageSummary {
    pub files: u64,
    pub bytes: u64,
    #[serde(flatten)]
    pub counts: LineCounts,
}

impl AddAssign for LanguageSummary {
    fn add_assign(&mut self, rhs: Self) {
        self.files += rhs.files;
        self.bytes += rhs.bytes;
        self.counts += rhs.counts;
    }
}

/// Cumulative summary: language → counters. Only the sink mutates it; addition is commutative,
/// so totals do not depend on the order units arrive in.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Summary {
    languages: BTreeMap<&'static str, LanguageSummary>,
}

impl Summary {
    /// Fold one counted file into the summary.
    pub fn add(&mut self, counted: &CountedJob) {
        *self.languages.entry(counted.job.language()).or_default() += LanguageSummary {
            files: 1,
            bytes: counted.bytes,
            counts: counted.counts,
        };
    }

    pub fn get(&self, language: &str) -> Option<&LanguageSummary> {
        self.languages.get(language)
    }

    /// Languages in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &LanguageSummary)> {
        self.languages.iter().map(|(k, v)| (*k, v))
    }

    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }

    /// Sum over all languages.
    pub fn total(&self) -> LanguageSummary {
        self.languages
            .values()
            .fold(LanguageSummary::default(), |mut acc, s| {
                acc += *s;
                acc
            })
    }
}

/// One line of per-file output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    /// Path relative to the walk root, `/`-separated.
    pub path: String,
    pub language: &'static str,
    pub extension: String,
    pub bytes: u64,
    #[serde(flatten)]
    pub counts: LineCounts,
}

// ---- Run control ----

/// Shared cancellation signal. The walker checks it per entry and pool workers per item;
/// once raised, stages stop and queue closure cascades downstream.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// What one pipeline run produced, plus what it dropped along the way.
#[derive(Debug)]
pub struct RunReport<T> {
    /// Sink output: a [`Summary`] in aggregate mode, the record count in per-file mode.
    pub output: T,
    /// Units dropped by the walker, readers, or classifiers (never fatal).
    pub skipped: Vec<PipelineError>,
    /// Files the walker emitted.
    pub discovered: usize,
    /// Worker count per pool.
    pub num_threads: usize,
    /// True when the run stopped early on a [`CancelFlag`].
    pub cancelled: bool,
}

// ---- Options ----

/// Where the sink sends results.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// Sum per language and report once at the end.
    #[default]
    Aggregate,
    /// One JSON record per file, written to the path (`-` for stdout).
    PerFile(PathBuf),
}

impl OutputMode {
    /// File the per-file records go to. None for the aggregate summary or stdout.
    pub fn destination_file(&self) -> Option<&Path> {
        match self {
            OutputMode::PerFile(dest) if dest.as_os_str() != "-" => Some(dest),
            _ => None,
        }
    }
}

/// Run configuration. Built once (defaults, then `.locpipe.toml`, then CLI) and passed by
/// reference into the pipeline; never mutated during a run.
#[derive(Clone, Debug)]
pub struct Opts {
    /// Override worker count per pool. When None, derived from available parallelism.
    pub num_threads: Option<usize>,
    /// Override queue capacities. When None, derived from the worker count.
    pub queue_caps: Option<QueueCaps>,
    /// Walk with the parallel ignore walker (unordered) instead of walkdir.
    pub parallel_walk: bool,
    /// Follow symbolic links.
    pub follow_links: bool,
    /// Extra exclude patterns (gitignore syntax), merged with the root ignore file.
    pub exclude: Vec<String>,
    /// Files larger than this are dropped as read errors. 0 disables the limit.
    pub max_file_size: u64,
    /// Aggregate summary or per-file records.
    pub output: OutputMode,
    /// Print the aggregate summary as JSON instead of a table (CLI only).
    pub json: bool,
    /// Debug logging, skipped-file listing and a progress counter.
    pub verbose: bool,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            num_threads: None,
            queue_caps: None,
            parallel_walk: true,
            follow_links: false,
            exclude: Vec::new(),
            max_file_size: ReadConsts::DEFAULT_MAX_FILE_SIZE,
            output: OutputMode::Aggregate,
            json: false,
            verbose: false,
        }
    }
}
