//! CLI command handler: aggregate summary by default; --files streams per-file records.

use anyhow::{Context, Result};
use log::{debug, warn};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use crate::engine::arg_parser::Cli;
use crate::engine::report::{render_json, render_table};
use crate::engine::{Classifier, LineClassifier};
use crate::pipeline::{collect_summary, log_skipped, stream_file_records};
use crate::utils::{apply_file_to_opts, load_settings_toml, setup_logging};
use crate::{CancelFlag, Opts, OutputMode, RunReport};

/// Overwrite opts field from a CLI flag when it was given.
macro_rules! apply_cli_opt {
    ($cli:expr, $opts:expr, $field:ident) => {
        if let Some(v) = $cli.$field {
            $opts.$field = v;
        }
    };
}

/// Apply CLI flags on top of `opts` (defaults, then `.locpipe.toml`). Only flags actually
/// given override; `--exclude` replaces the file's list when non-empty.
pub fn apply_cli_to_opts(cli: &Cli, opts: &mut Opts) {
    if cli.threads.is_some() {
        opts.num_threads = cli.threads;
    }
    if let Some(serial) = cli.serial_walk {
        opts.parallel_walk = !serial;
    }
    apply_cli_opt!(cli, opts, follow_links);
    if !cli.exclude.is_empty() {
        opts.exclude = cli.exclude.clone();
    }
    apply_cli_opt!(cli, opts, max_file_size);
    if let Some(ref dest) = cli.files {
        opts.output = OutputMode::PerFile(dest.clone());
    }
    apply_cli_opt!(cli, opts, json);
    apply_cli_opt!(cli, opts, verbose);
}

fn setup_opts(cli: &Cli) -> Opts {
    let mut opts = Opts::default();
    let loaded = load_settings_toml(&cli.dir);
    if let Ok(Some(ref file)) = loaded {
        apply_file_to_opts(file, &mut opts);
    }
    apply_cli_to_opts(cli, &mut opts);
    setup_logging(opts.verbose);
    match loaded {
        Ok(Some(_)) => debug!("Loaded settings from {}", cli.dir.display()),
        Ok(None) => {}
        Err(e) => warn!("{:#}; settings file ignored", e),
    }
    opts
}

/// Count `cli.dir` and print the summary, or stream per-file records to `--files`.
pub fn handle_run(cli: &Cli) -> Result<()> {
    let opts = setup_opts(cli);
    debug!(
        "{} CONFIG:{:#?}",
        env!("CARGO_PKG_NAME").to_uppercase(),
        opts
    );

    let cancel = CancelFlag::new();
    let cancel_handler = cancel.clone();
    ctrlc::set_handler(move || cancel_handler.cancel()).context("set Ctrl+C handler")?;

    let classifier: Arc<dyn Classifier> = Arc::new(LineClassifier);
    match opts.output {
        OutputMode::Aggregate => {
            let report = collect_summary(&cli.dir, &opts, classifier, &cancel)?;
            finish_report(&opts, &report);
            let rendered = if opts.json {
                render_json(&report.output)?
            } else {
                render_table(&report.output)
            };
            println!("{}", rendered.trim_end());
        }
        OutputMode::PerFile(ref dest) => {
            let report = if dest == Path::new("-") {
                let stdout = io::stdout();
                let mut writer = BufWriter::new(stdout.lock());
                stream_file_records(&cli.dir, &opts, classifier, &cancel, &mut writer)?
            } else {
                let file = File::create(dest)
                    .with_context(|| format!("create output file {}", dest.display()))?;
                let mut writer = BufWriter::new(file);
                let report = stream_file_records(&cli.dir, &opts, classifier, &cancel, &mut writer)?;
                writer.flush().context("flush output file")?;
                report
            };
            finish_report(&opts, &report);
            debug!("{} records written", report.output);
        }
    }
    Ok(())
}

fn finish_report<T>(opts: &Opts, report: &RunReport<T>) {
    log_skipped(opts, &report.skipped);
    if report.cancelled {
        warn!("Interrupted: results cover only the files processed before Ctrl+C.");
    }
    debug!(
        "{} files discovered, {} workers per pool",
        report.discovered, report.num_threads
    );
}
