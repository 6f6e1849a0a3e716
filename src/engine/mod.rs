//! Engine: language table, line classification, ignore rules, CLI and reporting.

pub mod arg_parser;
pub mod classifier;
pub mod cli;
pub mod ignore_rules;
pub mod languages;
pub mod progress;
pub mod report;
pub mod tools;

pub use arg_parser::Cli;
pub use classifier::{Classifier, ClassifyError, LineClassifier, count_lines, looks_binary};
pub use cli::{apply_cli_to_opts, handle_run};
pub use ignore_rules::IgnorePredicate;
pub use languages::{CommentSyntax, comment_syntax, detect, language_for_extension};
pub use report::{render_json, render_table};
pub use tools::{check_root_and_canonicalize, path_relative_to, record_path, running_as_root};
