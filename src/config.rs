use crate::cli::Cli;
use crate::github::DEFAULT_API_BASE;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_COMMON_EXTENSIONS: [&str; 9] =
    ["js", "py", "java", "cpp", "html", "css", "ts", "jsx", "tsx"];
pub const DEFAULT_TEXT_FILE: &str = "prompt.txt";
pub const DEFAULT_ARCHIVE_FILE: &str = "partial_repo.zip";
const DEFAULT_CONCURRENCY: usize = 8;
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const LOCAL_CONFIG_FILE: &str = ".ghyank.toml";

/// On-disk settings. Every field is optional so files can be layered.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    pub token: Option<String>,
    pub api_base_url: Option<String>,
    pub common_extensions: Option<Vec<String>>,
    pub text_file: Option<PathBuf>,
    pub archive_file: Option<PathBuf>,
    pub concurrency: Option<usize>,
    pub timeout_secs: Option<u64>,
}

impl Config {
    pub fn merge(&mut self, other: Config) {
        if other.token.is_some() {
            self.token = other.token;
        }
        if other.api_base_url.is_some() {
            self.api_base_url = other.api_base_url;
        }
        if other.common_extensions.is_some() {
            self.common_extensions = other.common_extensions;
        }
        if other.text_file.is_some() {
            self.text_file = other.text_file;
        }
        if other.archive_file.is_some() {
            self.archive_file = other.archive_file;
        }
        if other.concurrency.is_some() {
            self.concurrency = other.concurrency;
        }
        if other.timeout_secs.is_some() {
            self.timeout_secs = other.timeout_secs;
        }
    }

    /// Global config, then `.ghyank.toml` in the working directory, then the
    /// explicitly named file. Only the explicit file is allowed to fail.
    pub fn load(explicit: Option<&Path>) -> Result<Config> {
        let mut config = Config::default();

        if let Some(dir) = dirs::config_dir() {
            if let Some(global) = read_optional(&dir.join("ghyank").join("config.toml")) {
                config.merge(global);
            }
        }
        if let Some(local) = read_optional(Path::new(LOCAL_CONFIG_FILE)) {
            config.merge(local);
        }
        if let Some(path) = explicit {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            let named: Config = toml::from_str(&content)
                .with_context(|| format!("Invalid config file {}", path.display()))?;
            config.merge(named);
        }
        Ok(config)
    }
}

fn read_optional(path: &Path) -> Option<Config> {
    let content = fs::read_to_string(path).ok()?;
    match toml::from_str::<Config>(&content) {
        Ok(config) => {
            tracing::debug!(path = %path.display(), "loaded config");
            Some(config)
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), "ignoring invalid config: {e}");
            None
        }
    }
}

/// `.JS` and `js` both name the `js` extension group.
pub fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub token: Option<String>,
    pub api_base: String,
    pub common_extensions: HashSet<String>,
    pub text_file: PathBuf,
    pub archive_file: PathBuf,
    pub concurrency: usize,
    pub timeout: Duration,
}

impl Settings {
    /// CLI flags (including `GITHUB_TOKEN` through clap) win over the config file.
    pub fn resolve(cli: &Cli, config: Config) -> Settings {
        let extensions: Vec<String> = if !cli.common_ext.is_empty() {
            cli.common_ext.clone()
        } else if let Some(list) = config.common_extensions {
            list
        } else {
            DEFAULT_COMMON_EXTENSIONS.iter().map(|s| s.to_string()).collect()
        };

        let text_file = cli
            .output
            .clone()
            .flatten()
            .or(config.text_file)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TEXT_FILE));
        let archive_file = cli
            .zip
            .clone()
            .flatten()
            .or(config.archive_file)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ARCHIVE_FILE));

        Settings {
            token: cli.token.clone().or(config.token),
            api_base: config
                .api_base_url
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            common_extensions: extensions
                .iter()
                .map(|e| normalize_extension(e))
                .filter(|e| !e.is_empty())
                .collect(),
            text_file,
            archive_file,
            concurrency: config.concurrency.unwrap_or(DEFAULT_CONCURRENCY).max(1),
            timeout: Duration::from_secs(config.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::tempdir;

    fn cli(args: &[&str]) -> Cli {
        let mut full = vec!["ghyank"];
        full.extend_from_slice(args);
        Cli::parse_from(full)
    }

    #[test]
    fn later_config_overrides_field_by_field() {
        let mut base: Config = toml::from_str("token = \"a\"\nconcurrency = 2\n").unwrap();
        let over: Config = toml::from_str("concurrency = 16\n").unwrap();
        base.merge(over);
        assert_eq!(base.token.as_deref(), Some("a"));
        assert_eq!(base.concurrency, Some(16));
    }

    #[test]
    fn explicit_file_is_loaded_and_must_parse() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("good.toml");
        fs::write(&good, "common_extensions = [\"rs\", \".TOML\"]\ntimeout_secs = 5\n").unwrap();
        let config = Config::load(Some(&good)).unwrap();
        assert_eq!(config.timeout_secs, Some(5));

        let bad = dir.path().join("bad.toml");
        fs::write(&bad, "concurrency = \"lots\"").unwrap();
        assert!(Config::load(Some(&bad)).is_err());
        assert!(Config::load(Some(&dir.path().join("missing.toml"))).is_err());
    }

    #[test]
    fn defaults_apply_without_config() {
        let settings = Settings::resolve(&cli(&["https://github.com/o/r"]), Config::default());
        assert_eq!(settings.api_base, DEFAULT_API_BASE);
        assert!(settings.common_extensions.contains("tsx"));
        assert_eq!(settings.common_extensions.len(), 9);
        assert_eq!(settings.text_file, PathBuf::from("prompt.txt"));
        assert_eq!(settings.archive_file, PathBuf::from("partial_repo.zip"));
        assert_eq!(settings.concurrency, 8);
    }

    #[test]
    fn cli_wins_over_config() {
        let config = Config {
            token: Some("from-file".to_string()),
            common_extensions: Some(vec!["md".to_string()]),
            archive_file: Some(PathBuf::from("cfg.zip")),
            ..Config::default()
        };
        let settings = Settings::resolve(
            &cli(&[
                "https://github.com/o/r",
                "--token",
                "from-cli",
                "--common-ext",
                ".RS,toml",
                "--zip",
            ]),
            config,
        );
        assert_eq!(settings.token.as_deref(), Some("from-cli"));
        let mut exts: Vec<_> = settings.common_extensions.into_iter().collect();
        exts.sort();
        assert_eq!(exts, vec!["rs", "toml"]);
        assert_eq!(settings.archive_file, PathBuf::from("cfg.zip"));
    }
}
