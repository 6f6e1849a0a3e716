pub mod config;
pub mod fd_limit;
pub mod logger;
pub mod settings_toml;

pub use config::*;
pub use fd_limit::{FDS_PER_READER, cap_readers, max_open_fds, max_readers_by_fd_limit};
pub use logger::setup_logging;
pub use settings_toml::{SettingsToml, apply_file_to_opts, load_settings_toml};
