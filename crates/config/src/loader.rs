use std::path::{Path, PathBuf};

use {
    secrecy::Secret,
    tracing::{debug, warn},
};

use crate::{Error, Result, env_subst::substitute_env, schema::PaperbotConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "paperbot.toml",
    "paperbot.yaml",
    "paperbot.yml",
    "paperbot.json",
];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<PaperbotConfig> {
    let raw = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./paperbot.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/paperbot/paperbot.{toml,yaml,yml,json}` (user-global)
///
/// Returns `PaperbotConfig::default()` if no config file is found or it fails
/// to parse.
pub fn discover_and_load() -> PaperbotConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    PaperbotConfig::default()
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    CONFIG_FILENAMES
        .iter()
        .map(PathBuf::from)
        .chain(
            config_dir()
                .into_iter()
                .flat_map(|dir| CONFIG_FILENAMES.iter().map(move |name| dir.join(name))),
        )
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/paperbot/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "paperbot").map(|d| d.config_dir().to_path_buf())
}

/// Apply `PAPERBOT_*` environment overrides on top of a loaded config.
pub fn apply_env_overrides(config: &mut PaperbotConfig) {
    apply_overrides_with(config, |name| std::env::var(name).ok());
}

fn apply_overrides_with(config: &mut PaperbotConfig, lookup: impl Fn(&str) -> Option<String>) {
    let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(url) = var("PAPERBOT_REPOSITORY_URL") {
        config.repository.base_url = Some(url);
    }
    if let Some(key) = var("PAPERBOT_GEMINI_API_KEY") {
        config.summarizer.api_key = Some(Secret::new(key));
    }
    if let Some(model) = var("PAPERBOT_GEMINI_MODEL") {
        config.summarizer.model = model;
    }
    if let Some(url) = var("PAPERBOT_SIDECAR_URL") {
        config.whatsapp.sidecar_url = url;
    }
}

fn parse_config(raw: &str, path: &Path) -> Result<PaperbotConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");
    let parse_err = |message: String| Error::Parse {
        path: path.to_path_buf(),
        message,
    };

    match ext {
        "toml" => toml::from_str(raw).map_err(|e| parse_err(e.to_string())),
        "yaml" | "yml" => serde_yaml::from_str(raw).map_err(|e| parse_err(e.to_string())),
        "json" => serde_json::from_str(raw).map_err(|e| parse_err(e.to_string())),
        other => Err(Error::UnsupportedFormat {
            extension: other.to_string(),
        }),
    }
}
