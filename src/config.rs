use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::models::Bounds;

pub const EXAMPLE_CONFIG: &str = "provider:\n  api_base: \"http://localhost:5001/v1\"\n  api_key: \"YOUR_KEY\"\n  model: \"qwen3_30b_a3\"\ncanvas:\n  width: 640\n  height: 400\n  padding: 3\n";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    #[serde(default)]
    pub canvas: CanvasConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderConfig {
    pub api_base: String,
    #[serde(default)]
    pub api_key: Option<String>,
    pub model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    300
}

/// Keyword map canvas, in pixels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CanvasConfig {
    pub width: f64,
    pub height: f64,
    pub padding: f64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 640.0,
            height: 400.0,
            padding: 3.0,
        }
    }
}

impl CanvasConfig {
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.width, self.height)
    }
}

impl ProviderConfig {
    /// `{api_base}/chat/completions`, validated.
    pub fn completions_url(&self) -> Result<Url> {
        let base = Url::parse(self.api_base.trim_end_matches('/'))
            .with_context(|| format!("invalid api_base '{}'", self.api_base))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(anyhow!("api_base must be http or https, got '{}'", base.scheme()));
        }
        Ok(Url::parse(&format!("{}/chat/completions", base.as_str().trim_end_matches('/')))?)
    }
}

pub fn parse_config(yaml: &str) -> Result<AppConfig> {
    let mut cfg: AppConfig = serde_yaml::from_str(yaml).context("parsing config YAML")?;
    if cfg.provider.api_key.as_deref().map_or(true, str::is_empty) {
        cfg.provider.api_key = std::env::var("API_KEY").ok().filter(|k| !k.is_empty());
    }
    cfg.provider.completions_url()?;
    Ok(cfg)
}

pub fn load_config(path: &Path) -> Result<AppConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    parse_config(&text)
}

/// `--config` > `SENTIMIND_CONFIG` > `$SENTIMIND_CONFIG_DIR/config.yaml` >
/// `$HOME/.config/sentimind/config.yaml`.
pub fn resolve_config_path(cli: Option<&str>) -> Result<PathBuf> {
    if let Some(p) = cli {
        debug!("Using config file from --config argument: {}", p);
        return Ok(PathBuf::from(p));
    }
    if let Ok(p) = std::env::var("SENTIMIND_CONFIG") {
        debug!("Using config file from SENTIMIND_CONFIG: {}", p);
        return Ok(PathBuf::from(p));
    }
    let base_dir = if let Ok(dir) = std::env::var("SENTIMIND_CONFIG_DIR") {
        PathBuf::from(dir)
    } else {
        let home = std::env::var("HOME").map_err(|_| {
            anyhow!("cannot locate a config: pass --config or set SENTIMIND_CONFIG")
        })?;
        PathBuf::from(home).join(".config").join("sentimind")
    };
    Ok(base_dir.join("config.yaml"))
}
