use std::path::Path;

use {
    anyhow::{Context, Result},
    paperbot_config::{PaperbotConfig, apply_env_overrides, find_config_file, load_config},
    tracing::debug,
};

/// ANSI color codes.
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Load the explicit or discovered config file, apply `PAPERBOT_*`
/// overrides and validate the result. Without a file the defaults are used.
pub fn load(explicit: Option<&Path>) -> Result<PaperbotConfig> {
    let path = explicit.map(Path::to_path_buf).or_else(find_config_file);
    let mut config = match &path {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            load_config(path).with_context(|| format!("loading {}", path.display()))?
        },
        None => {
            debug!("no config file found, using defaults");
            PaperbotConfig::default()
        },
    };
    apply_env_overrides(&mut config);
    config.validate()?;
    Ok(config)
}

/// Settings that load fine but leave commands unusable.
fn warnings(config: &PaperbotConfig) -> Vec<&'static str> {
    let mut out = Vec::new();
    if config.repository.base_url.is_none() {
        out.push("repository.base_url is not set; search and detail commands will fail");
    }
    if config.summarizer.api_key.is_none() {
        out.push("summarizer.api_key is not set; document analysis will fail");
    }
    out
}

pub fn check(explicit: Option<&Path>) -> Result<()> {
    match explicit.map(Path::to_path_buf).or_else(find_config_file) {
        Some(path) => eprintln!("Checking {}\n", path.display()),
        None => eprintln!("No config file found; checking defaults.\n"),
    }

    let config = match load(explicit) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("  {BOLD}{RED}error{RESET} {e:#}");
            std::process::exit(1);
        },
    };

    let warnings = warnings(&config);
    for warning in &warnings {
        eprintln!("  {BOLD}{YELLOW}warning{RESET} {warning}");
    }
    if warnings.is_empty() {
        eprintln!("No issues found.\n");
    } else {
        eprintln!("\n{} warning(s)\n", warnings.len());
    }

    // Secrets print redacted.
    println!("{config:#?}");
    Ok(())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, std::io::Write};

    #[test]
    fn defaults_warn_about_missing_endpoints() {
        assert_eq!(warnings(&PaperbotConfig::default()).len(), 2);
    }

    #[test]
    fn explicit_file_is_loaded_and_validated() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[repository]\nbase_url = \"https://api.example/repo\"\n\n[pipeline]\nmax_pages = 3"
        )
        .unwrap();

        let config = load(Some(file.path())).unwrap();
        assert_eq!(config.pipeline.max_pages, 3);
        assert_eq!(
            config.repository.base_url.as_deref(),
            Some("https://api.example/repo")
        );
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[pipeline]\nmax_pages = 0").unwrap();

        assert!(load(Some(file.path())).is_err());
    }
}
