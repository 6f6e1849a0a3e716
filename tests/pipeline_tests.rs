use crossbeam_channel::{Receiver, bounded, unbounded};
use locpipe::engine::{IgnorePredicate, running_as_root};
use locpipe::pipeline::{
    PipelineContext, WorkerPool, run_parallel_walk, spawn_reader_pool, spawn_relay,
    spawn_walk_thread,
};
use locpipe::{
    CancelFlag, Classifier, ClassifyError, FileJob, LineClassifier, LineCounts, LoadedJob, Opts,
    OutputMode, PipelineError, QueueCaps, count_dir, count_dir_with, write_file_records,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// Walk context over `root` with no extra patterns. Returns the error receiver to keep alive.
fn walk_context(root: &Path) -> (PipelineContext, Receiver<PipelineError>) {
    let (error_tx, error_rx) = unbounded::<PipelineError>();
    let ctx = PipelineContext {
        root: root.to_path_buf(),
        ignore: Arc::new(IgnorePredicate::load(root, &[], &error_tx)),
        follow_links: false,
        cancel: CancelFlag::new(),
        error_tx,
    };
    (ctx, error_rx)
}

fn opts_with_threads(n: usize) -> Opts {
    Opts {
        num_threads: Some(n),
        ..Default::default()
    }
}

/// Mixed tree: Rust, Python, Markdown, an unknown extension, and ignored/VCS content.
fn mixed_tree(root: &Path) {
    write(root, "src/main.rs", "// entry\nfn main() {\n\n    run();\n}\n");
    write(root, "src/lib.rs", "pub fn run() {}\n");
    write(root, "src/nested/deep/util.rs", "/* a\n b */\npub fn x() {}\n");
    write(root, "scripts/build.py", "# build\nimport os\n\nprint(os.name)\n");
    write(root, "README.md", "# Title\n\n<!-- note -->\ntext\n");
    write(root, "data.zzq", "not counted\n");
    write(root, ".git/hooks/pre-commit.py", "print('hook')\n");
    write(root, "target/debug/gen.rs", "fn generated() {}\n");
    write(root, ".gitignore", "target/\n");
}

// --- scenarios ---

#[test]
fn test_three_files_of_one_language() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    for name in ["a.rs", "b.rs", "c.rs"] {
        write(dir.path(), name, "fn f() {}\n");
    }
    let report = count_dir(dir.path(), &Opts::default())?;
    let rust = report.output.get("Rust").expect("Rust row");
    assert_eq!(rust.files, 3);
    assert_eq!(rust.counts.code, 3);
    assert_eq!(report.discovered, 3);
    assert!(report.skipped.is_empty());
    assert!(!report.cancelled);
    Ok(())
}

#[test]
fn test_ignored_subdirectory_is_absent() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), ".gitignore", "vendor/\n");
    write(dir.path(), "vendor/a.rs", "fn a() {}\n");
    write(dir.path(), "vendor/b.rs", "fn b() {}\n");
    write(dir.path(), "src/main.rs", "fn main() {}\n");
    let report = count_dir(dir.path(), &Opts::default()).unwrap();
    assert_eq!(report.output.get("Rust").map(|s| s.files), Some(1));
    assert_eq!(report.discovered, 1);
}

#[test]
fn test_unrecognized_extension_is_silently_dropped() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "notes.zzq", "whatever\n");
    write(dir.path(), "main.rs", "fn main() {}\n");
    let report = count_dir(dir.path(), &Opts::default()).unwrap();
    assert_eq!(report.output.iter().count(), 1);
    assert_eq!(report.output.total().files, 1);
    assert!(report.skipped.is_empty());
}

#[cfg(unix)]
#[test]
fn test_unreadable_subdirectory_does_not_stop_walk() {
    use std::os::unix::fs::PermissionsExt;

    if running_as_root() {
        // Permission bits do not apply to root.
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "ok.rs", "fn ok() {}\n");
    write(dir.path(), "sibling/also_ok.rs", "fn also() {}\n");
    write(dir.path(), "locked/hidden.rs", "fn hidden() {}\n");
    let locked = dir.path().join("locked");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    let serial = Opts {
        parallel_walk: false,
        ..Default::default()
    };
    let serial_report = count_dir(dir.path(), &serial);
    let parallel_report = count_dir(dir.path(), &Opts::default());
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    let serial_report = serial_report.unwrap();
    assert_eq!(serial_report.output.get("Rust").map(|s| s.files), Some(2));
    assert!(
        serial_report
            .skipped
            .iter()
            .any(|e| matches!(e, PipelineError::Traversal { .. }))
    );
    let parallel_report = parallel_report.unwrap();
    assert_eq!(parallel_report.output.get("Rust").map(|s| s.files), Some(2));
}

#[test]
fn test_malformed_ignore_file_degrades_to_match_nothing() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), ".gitignore", "vendor/\nbad[\n");
    write(dir.path(), "vendor/a.rs", "fn a() {}\n");
    write(dir.path(), "src/main.rs", "fn main() {}\n");
    let report = count_dir(dir.path(), &Opts::default()).unwrap();
    assert_eq!(report.output.get("Rust").map(|s| s.files), Some(2));
    assert_eq!(report.skipped.len(), 1);
    assert!(matches!(report.skipped[0], PipelineError::IgnoreLoad { .. }));
    assert_eq!(report.skipped[0].stage(), "walk");
}

#[cfg(unix)]
#[test]
fn test_dangling_symlink_reported_and_walk_continues() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "ok.rs", "fn ok() {}\n");
    write(dir.path(), "sub/also_ok.rs", "fn also() {}\n");
    std::os::unix::fs::symlink(dir.path().join("missing.rs"), dir.path().join("broken.rs"))
        .unwrap();

    for parallel_walk in [false, true] {
        let opts = Opts {
            follow_links: true,
            parallel_walk,
            ..Default::default()
        };
        let report = count_dir(dir.path(), &opts).unwrap();
        assert_eq!(
            report.output.get("Rust").map(|s| s.files),
            Some(2),
            "parallel_walk = {parallel_walk}"
        );
        assert!(
            report.skipped.iter().any(|e| matches!(
                e,
                PipelineError::Traversal { path: Some(p), .. } if p.ends_with("broken.rs")
            )),
            "parallel_walk = {parallel_walk}: {:?}",
            report.skipped
        );
    }
}

#[test]
fn test_per_file_destination_under_root_is_not_counted() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    write(dir.path(), "main.rs", "fn main() {}\n");
    let dest = dir.path().join("records.json");
    let opts = Opts {
        output: OutputMode::PerFile(dest.clone()),
        ..Default::default()
    };
    let mut out = fs::File::create(&dest)?;
    let report = write_file_records(dir.path(), &opts, &mut out)?;
    drop(out);
    assert_eq!(report.output, 1);

    let again = write_file_records(dir.path(), &opts, &mut Vec::new())?;
    assert_eq!(again.output, 1);
    let summary = count_dir(dir.path(), &opts)?;
    assert!(summary.output.get("JSON").is_none());
    Ok(())
}

#[test]
fn test_empty_root_completes_with_zero_summary() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let report = count_dir(dir.path(), &Opts::default())?;
    assert!(report.output.is_empty());
    assert_eq!(report.output.total().counts, LineCounts::default());
    assert_eq!(report.discovered, 0);
    assert!(!report.cancelled);
    Ok(())
}

#[test]
fn test_missing_root_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(count_dir(&dir.path().join("nope"), &Opts::default()).is_err());
}

// --- filtering ---

#[test]
fn test_mixed_tree_per_language_totals() {
    let dir = tempfile::tempdir().unwrap();
    mixed_tree(dir.path());
    let report = count_dir(dir.path(), &Opts::default()).unwrap();
    let summary = &report.output;

    let rust = summary.get("Rust").unwrap();
    assert_eq!(rust.files, 3);
    assert_eq!(rust.counts.lines, 9);
    assert_eq!(rust.counts.code, 5);
    assert_eq!(rust.counts.comment, 3);
    assert_eq!(rust.counts.blank, 1);

    let python = summary.get("Python").unwrap();
    assert_eq!(python.files, 1);
    assert_eq!(python.counts.comment, 1);

    let markdown = summary.get("Markdown").unwrap();
    assert_eq!(markdown.counts.comment, 1);
    assert_eq!(markdown.counts.blank, 1);

    assert_eq!(summary.total().files, 5);
    assert_eq!(report.discovered, 5);
}

#[test]
fn test_os_junk_files_are_not_units() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "._resource.rs", "junk\n");
    write(dir.path(), "real.rs", "fn r() {}\n");
    let report = count_dir(dir.path(), &Opts::default()).unwrap();
    assert_eq!(report.output.total().files, 1);
}

#[test]
fn test_exclude_patterns_from_opts() {
    let dir = tempfile::tempdir().unwrap();
    mixed_tree(dir.path());
    let opts = Opts {
        exclude: vec!["scripts/".to_string(), "*.md".to_string()],
        ..Default::default()
    };
    let report = count_dir(dir.path(), &opts).unwrap();
    assert!(report.output.get("Python").is_none());
    assert!(report.output.get("Markdown").is_none());
    assert_eq!(report.output.get("Rust").map(|s| s.files), Some(3));
}

// --- invariants ---

#[test]
fn test_repeated_runs_are_identical() {
    let dir = tempfile::tempdir().unwrap();
    mixed_tree(dir.path());
    let first = count_dir(dir.path(), &Opts::default()).unwrap();
    let second = count_dir(dir.path(), &Opts::default()).unwrap();
    assert_eq!(first.output, second.output);
}

#[test]
fn test_totals_independent_of_pool_size_and_queue_caps() {
    let dir = tempfile::tempdir().unwrap();
    for i in 0..60 {
        write(
            dir.path(),
            &format!("pkg{}/mod{}.rs", i % 7, i),
            "// c\nfn f() {}\n\n",
        );
    }
    let baseline = count_dir(dir.path(), &opts_with_threads(1)).unwrap();
    let tight = Opts {
        num_threads: Some(8),
        queue_caps: Some(QueueCaps::uniform(1)),
        ..Default::default()
    };
    let tight = count_dir(dir.path(), &tight).unwrap();
    let serial = Opts {
        num_threads: Some(3),
        parallel_walk: false,
        ..Default::default()
    };
    let serial = count_dir(dir.path(), &serial).unwrap();

    assert_eq!(baseline.output.get("Rust").map(|s| s.files), Some(60));
    assert_eq!(baseline.output, tight.output);
    assert_eq!(baseline.output, serial.output);
    assert_eq!(tight.num_threads, 8);
}

#[test]
fn test_walker_blocks_on_full_queue() {
    let dir = tempfile::tempdir().unwrap();
    for i in 0..10 {
        write(dir.path(), &format!("f{}.rs", i), "fn f() {}\n");
    }
    let root = dir.path().canonicalize().unwrap();
    let (ctx, _error_rx) = walk_context(&root);
    let (tx, rx) = bounded(2);
    let handle = spawn_walk_thread(tx, ctx, false);

    let deadline = Instant::now() + Duration::from_secs(5);
    while rx.len() < 2 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
    }
    thread::sleep(Duration::from_millis(100));
    assert_eq!(rx.len(), 2);
    assert!(!handle.is_finished());

    drop(rx);
    assert_eq!(handle.join().unwrap(), 2);
}

#[test]
fn test_parallel_walker_does_not_read_ahead_of_full_queue() {
    const DIRS: usize = 2000;
    const WALK_THREADS: usize = 4;

    let dir = tempfile::tempdir().unwrap();
    for i in 0..DIRS {
        write(dir.path(), &format!("d{}/f.rs", i), "fn f() {}\n");
    }
    let root = dir.path().canonicalize().unwrap();
    let (ctx, _error_rx) = walk_context(&root);
    let (tx, rx) = bounded(1);
    let handle = thread::spawn(move || run_parallel_walk(tx, ctx, WALK_THREADS));

    let deadline = Instant::now() + Duration::from_secs(5);
    while rx.is_empty() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
    }
    thread::sleep(Duration::from_millis(200));
    assert_eq!(rx.len(), 1);
    assert!(!handle.is_finished());

    // Whatever the walker has not reached yet disappears; a walker that read ahead would
    // still deliver it.
    for i in 0..DIRS {
        let _ = fs::remove_dir_all(root.join(format!("d{}", i)));
    }
    let received = rx.iter().count();
    assert_eq!(handle.join().unwrap(), received);
    assert!(
        received <= 1 + 4 * WALK_THREADS,
        "walker delivered {received} jobs after the tree was removed"
    );
}

// --- cancellation ---

#[test]
fn test_cancel_before_start_completes_run() {
    let dir = tempfile::tempdir().unwrap();
    mixed_tree(dir.path());
    let cancel = CancelFlag::new();
    cancel.cancel();
    let report =
        count_dir_with(dir.path(), &Opts::default(), Arc::new(LineClassifier), &cancel).unwrap();
    assert!(report.cancelled);
    assert_eq!(report.discovered, 0);
    assert!(report.output.is_empty());
}

/// Counts like the default classifier, but raises the cancel flag on the first file.
struct CancellingClassifier {
    cancel: CancelFlag,
    calls: AtomicUsize,
}

impl Classifier for CancellingClassifier {
    fn classify(&self, content: &[u8], language: &str) -> Result<LineCounts, ClassifyError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.cancel.cancel();
        LineClassifier.classify(content, language)
    }
}

#[test]
fn test_cancel_mid_run_stops_early() {
    let dir = tempfile::tempdir().unwrap();
    for i in 0..200 {
        write(dir.path(), &format!("d{}/f{}.rs", i % 10, i), "fn f() {}\n");
    }
    let cancel = CancelFlag::new();
    let classifier = Arc::new(CancellingClassifier {
        cancel: cancel.clone(),
        calls: AtomicUsize::new(0),
    });
    let opts = Opts {
        num_threads: Some(1),
        queue_caps: Some(QueueCaps::uniform(1)),
        ..Default::default()
    };
    let report = count_dir_with(dir.path(), &opts, classifier.clone(), &cancel).unwrap();
    assert!(report.cancelled);
    assert!(report.output.total().files < 200);
    assert!(classifier.calls.load(Ordering::Relaxed) < 200);
}

// --- dropped units ---

#[test]
fn test_oversize_file_dropped_as_read_error() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "small.rs", "fn s() {}\n");
    write(dir.path(), "big.rs", &"// padding\n".repeat(20));
    let opts = Opts {
        max_file_size: 64,
        ..Default::default()
    };
    let report = count_dir(dir.path(), &opts).unwrap();
    assert_eq!(report.output.get("Rust").map(|s| s.files), Some(1));
    assert_eq!(report.discovered, 2);
    assert_eq!(report.skipped.len(), 1);
    match &report.skipped[0] {
        PipelineError::TooLarge { path, limit, .. } => {
            assert!(path.ends_with("big.rs"));
            assert_eq!(*limit, 64);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(report.skipped[0].stage(), "read");
}

#[test]
fn test_zero_max_file_size_means_unlimited() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "big.rs", &"fn f() {}\n".repeat(1000));
    let opts = Opts {
        max_file_size: 0,
        ..Default::default()
    };
    let report = count_dir(dir.path(), &opts).unwrap();
    assert_eq!(
        report.output.get("Rust").map(|s| s.counts.code),
        Some(1000)
    );
}

#[test]
fn test_binary_file_dropped_as_classification_error() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("blob.c"), b"\x7fELF\0\0\x01").unwrap();
    write(dir.path(), "ok.c", "int main(void) { return 0; }\n");
    let report = count_dir(dir.path(), &Opts::default()).unwrap();
    assert_eq!(report.output.get("C").map(|s| s.files), Some(1));
    assert_eq!(report.skipped.len(), 1);
    assert!(matches!(
        report.skipped[0],
        PipelineError::Classification {
            source: ClassifyError::Binary(_),
            ..
        }
    ));
}

/// Refuses one language, counts every other.
struct RefusePython;

impl Classifier for RefusePython {
    fn classify(&self, content: &[u8], language: &str) -> Result<LineCounts, ClassifyError> {
        if language == "Python" {
            return Err(ClassifyError::Unsupported(language.to_string()));
        }
        LineClassifier.classify(content, language)
    }
}

#[test]
fn test_custom_classifier_failures_are_reported() {
    let dir = tempfile::tempdir().unwrap();
    mixed_tree(dir.path());
    let report = count_dir_with(
        dir.path(),
        &Opts::default(),
        Arc::new(RefusePython),
        &CancelFlag::new(),
    )
    .unwrap();
    assert!(report.output.get("Python").is_none());
    assert_eq!(report.output.get("Rust").map(|s| s.files), Some(3));
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].stage(), "classify");
    assert!(
        report.skipped[0]
            .path()
            .is_some_and(|p| p.ends_with("scripts/build.py"))
    );
}

#[test]
fn test_unreadable_job_dropped_as_read_error() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "present.rs", "fn p() {}\n");
    let present = dir.path().join("present.rs");
    let vanished = dir.path().join("vanished.rs");
    // A directory named like a source file: discovered, but not readable as one.
    fs::create_dir(dir.path().join("folder.rs")).unwrap();
    let folder = dir.path().join("folder.rs");

    let (in_tx, in_rx) = bounded::<FileJob>(4);
    let (out_tx, out_rx) = bounded::<LoadedJob>(4);
    let (error_tx, error_rx) = unbounded::<PipelineError>();
    let pool = spawn_reader_pool(in_rx, out_tx, 2, 0, &error_tx, &CancelFlag::new());
    drop(error_tx);
    for path in [&vanished, &present, &folder] {
        in_tx.send(FileJob::new(path.clone(), "rs", "Rust")).unwrap();
    }
    drop(in_tx);

    let loaded: Vec<PathBuf> = out_rx.iter().map(|l| l.job.path().to_path_buf()).collect();
    assert_eq!(pool.join().unwrap(), 1);
    assert_eq!(loaded, vec![present]);

    let errors: Vec<PipelineError> = error_rx.try_iter().collect();
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().all(|e| e.stage() == "read"));
    assert!(errors.iter().any(|e| matches!(
        e,
        PipelineError::Read { path, .. } if path == &vanished
    )));
    assert!(errors.iter().any(|e| e.path() == Some(folder.as_path())));
}

// --- per-file mode ---

#[test]
fn test_per_file_records_one_per_counted_file() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    mixed_tree(dir.path());
    let mut out = Vec::new();
    let report = write_file_records(dir.path(), &Opts::default(), &mut out)?;
    assert_eq!(report.output, 5);

    let text = String::from_utf8(out)?;
    let records = text
        .lines()
        .map(serde_json::from_str)
        .collect::<Result<Vec<serde_json::Value>, _>>()?;
    assert_eq!(records.len(), 5);

    let mut paths: Vec<&str> = records.iter().map(|r| r["path"].as_str().unwrap()).collect();
    paths.sort_unstable();
    assert_eq!(
        paths,
        vec![
            "README.md",
            "scripts/build.py",
            "src/lib.rs",
            "src/main.rs",
            "src/nested/deep/util.rs",
        ]
    );

    let main = records
        .iter()
        .find(|r| r["path"] == "src/main.rs")
        .unwrap();
    assert_eq!(main["language"], "Rust");
    assert_eq!(main["extension"], "rs");
    assert_eq!(main["lines"], 5);
    assert_eq!(main["code"], 3);
    assert_eq!(main["comment"], 1);
    assert_eq!(main["blank"], 1);
    Ok(())
}

// --- building blocks ---

#[test]
fn test_relay_forwards_everything_and_closes() {
    let (in_tx, in_rx) = bounded::<u32>(4);
    let (out_tx, out_rx) = bounded::<u32>(1);
    let relay = spawn_relay(in_rx, out_tx, "test");
    let producer = thread::spawn(move || {
        for i in 0..100 {
            in_tx.send(i).unwrap();
        }
    });
    let received: Vec<u32> = out_rx.iter().collect();
    producer.join().unwrap();
    assert_eq!(relay.join().unwrap(), 100);
    assert_eq!(received, (0..100).collect::<Vec<_>>());
}

#[test]
fn test_worker_pool_output_closes_after_last_worker() {
    let (in_tx, in_rx) = bounded::<u64>(8);
    let (out_tx, out_rx) = bounded::<u64>(8);
    let pool = WorkerPool::spawn("double", 4, in_rx, out_tx, &CancelFlag::new(), |n| {
        (n % 10 != 0).then_some(n * 2)
    });
    assert_eq!(pool.size(), 4);
    assert_eq!(pool.name(), "double");

    let producer = thread::spawn(move || {
        for i in 0..1000 {
            in_tx.send(i).unwrap();
        }
    });
    let mut received: Vec<u64> = out_rx.iter().collect();
    producer.join().unwrap();
    assert_eq!(pool.join().unwrap(), 900);

    received.sort_unstable();
    let expected: Vec<u64> = (0..1000).filter(|n| n % 10 != 0).map(|n| n * 2).collect();
    assert_eq!(received, expected);
}

#[test]
fn test_summary_bytes_match_file_sizes() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.rs", "fn a() {}\n");
    write(dir.path(), "b.rs", "fn bb() {}\n");
    let report = count_dir(dir.path(), &Opts::default()).unwrap();
    let expected: u64 = ["a.rs", "b.rs"]
        .iter()
        .map(|n| fs::metadata(dir.path().join(n)).unwrap().len())
        .sum();
    assert_eq!(report.output.get("Rust").map(|s| s.bytes), Some(expected));
}
