//! Configuration loading, validation, and env substitution.
//!
//! Config files: `paperbot.toml`, `paperbot.yaml`, or `paperbot.json`
//! Searched in `./` then `~/.config/paperbot/`.
//!
//! Supports `${ENV_VAR}` and `${ENV_VAR:-default}` substitution in the raw file.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;

pub use {
    error::{Error, Result},
    loader::{apply_env_overrides, config_dir, discover_and_load, find_config_file, load_config},
    schema::{
        ChatConfig, MetricsConfig, PaperbotConfig, PipelineConfig, RepositoryConfig,
        SummarizerConfig, WhatsAppConfig,
    },
};
