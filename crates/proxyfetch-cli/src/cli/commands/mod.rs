//! CLI command handlers. Each command is in its own file.

mod completions;
mod fetch;
mod show_config;

pub use completions::{run_completions, run_man};
pub use fetch::{run_fetch, FetchArgs};
pub use show_config::run_show_config;
