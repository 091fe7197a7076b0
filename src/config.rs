use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use homedir::my_home;
use serde::{Deserialize, Serialize};

const CONFIG_FILE: &str = "config.yaml";
const DEFAULT_LINKS_PATH: &str = "links.csv";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Csv link store, relative to the base path unless absolute.
    #[serde(default = "default_links_path")]
    pub links_path: String,

    /// Page size used when a search doesn't ask for one.
    #[serde(default)]
    pub default_limit: Option<usize>,

    /// Search unparsable queries as plain text instead of failing.
    #[serde(default = "default_literal_fallback")]
    pub literal_fallback: bool,

    #[serde(skip_serializing, skip_deserializing)]
    base_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            links_path: default_links_path(),
            default_limit: None,
            literal_fallback: default_literal_fallback(),
            base_path: PathBuf::new(),
        }
    }
}

fn default_links_path() -> String {
    DEFAULT_LINKS_PATH.to_string()
}

fn default_literal_fallback() -> bool {
    true
}

/// `LINKSEARCH_BASE_PATH`, or `~/.local/share/linksearch`.
pub fn base_path() -> anyhow::Result<PathBuf> {
    if let Ok(path) = std::env::var("LINKSEARCH_BASE_PATH") {
        return Ok(PathBuf::from(path));
    }

    let home = my_home()
        .context("could not determine home directory")?
        .context("home directory path is empty")?;
    Ok(home.join(".local/share/linksearch"))
}

impl Config {
    fn validate(&self) -> anyhow::Result<()> {
        if self.links_path.trim().is_empty() {
            bail!("links_path must not be empty");
        }
        if self.default_limit == Some(0) {
            bail!("default_limit must be greater than 0");
        }
        Ok(())
    }

    pub fn load_with(base_path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let base_path = base_path.as_ref();
        std::fs::create_dir_all(base_path)
            .with_context(|| format!("failed to create {}", base_path.display()))?;

        let config_path = base_path.join(CONFIG_FILE);

        // create new if does not exist
        if !config_path.exists() {
            log::info!("writing default config to {}", config_path.display());
            std::fs::write(&config_path, serde_yml::to_string(&Self::default())?)?;
        }

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;
        let mut config: Self = serde_yml::from_str(&config_str).context("config is malformed")?;

        config.base_path = base_path.to_path_buf();
        config.validate()?;

        // resave in case config version needs an upgrade
        if config_str != serde_yml::to_string(&config)? {
            config.save()?;
        }

        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_str = serde_yml::to_string(&self)?;
        std::fs::write(self.base_path.join(CONFIG_FILE), config_str)?;
        Ok(())
    }

    pub fn links_path(&self) -> PathBuf {
        self.base_path.join(&self.links_path)
    }
}
