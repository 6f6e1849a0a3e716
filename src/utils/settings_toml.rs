//! Load `.locpipe.toml` from the root directory (CLI only). Library callers build [`Opts`] directly.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::utils::config::PackagePaths;
use crate::{OutputMode, Opts};

#[derive(Debug, Default, Deserialize)]
pub struct SettingsToml {
    #[serde(default)]
    settings: SettingsSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsSection {
    threads: Option<usize>,
    serial_walk: Option<bool>,
    follow_links: Option<bool>,
    exclude: Option<Vec<String>>,
    max_file_size: Option<u64>,
    files: Option<String>,
    json: Option<bool>,
    verbose: Option<bool>,
}

impl SettingsToml {
    /// Parse settings from TOML text.
    pub fn parse(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}

/// Load the settings file from `dir`. Ok(None) when there is no file; unreadable or malformed
/// files are errors for the caller to log once logging is up.
pub fn load_settings_toml(dir: &Path) -> Result<Option<SettingsToml>> {
    let path = dir.join(PackagePaths::get().config_filename());
    let s = match std::fs::read_to_string(&path) {
        Ok(s) => s,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("read {}", path.display())),
    };
    let file = SettingsToml::parse(&s).with_context(|| format!("parse {}", path.display()))?;
    Ok(Some(file))
}

/// Overwrite opts field from file when present.
macro_rules! apply_file_opt {
    ($sec:expr, $opts:expr, $sec_field:ident => $opts_field:ident) => {
        if let Some(v) = $sec.$sec_field {
            $opts.$opts_field = v;
        }
    };
}

/// Apply file settings to opts (only fields present in the file). Call before applying CLI flags.
pub fn apply_file_to_opts(file: &SettingsToml, opts: &mut Opts) {
    let sec = &file.settings;
    if let Some(n) = sec.threads {
        opts.num_threads = Some(n);
    }
    if let Some(serial) = sec.serial_walk {
        opts.parallel_walk = !serial;
    }
    apply_file_opt!(sec, opts, follow_links => follow_links);
    if let Some(ref v) = sec.exclude {
        opts.exclude = v.clone();
    }
    apply_file_opt!(sec, opts, max_file_size => max_file_size);
    if let Some(ref dest) = sec.files {
        opts.output = OutputMode::PerFile(PathBuf::from(dest));
    }
    apply_file_opt!(sec, opts, json => json);
    apply_file_opt!(sec, opts, verbose => verbose);
}
