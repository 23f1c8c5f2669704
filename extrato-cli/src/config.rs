use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use extrato_feed::{DEFAULT_PAGE_LIMIT, FeedConfig};

use crate::state::{ensure_extrato_home, extrato_home};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiSection,
    pub feed: FeedSection,
    /// Category id -> display name.
    #[serde(default)]
    pub categories: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiSection {
    pub base_url: String,
    /// Name of the environment variable holding the bearer token.
    pub token_env: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedSection {
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_page_limit() -> u32 {
    DEFAULT_PAGE_LIMIT
}

fn default_timezone() -> String {
    "America/Sao_Paulo".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiSection {
                base_url: "http://localhost:3000/api".to_string(),
                token_env: Some("EXTRATO_TOKEN".to_string()),
            },
            feed: FeedSection {
                page_limit: default_page_limit(),
                timezone: default_timezone(),
            },
            categories: BTreeMap::new(),
        }
    }
}

impl Config {
    pub fn feed_config(&self) -> FeedConfig {
        FeedConfig {
            page_limit: self.feed.page_limit.max(1),
        }
    }

    /// Bearer token read from the configured environment variable, if any.
    pub fn token(&self) -> Option<String> {
        let var = self.api.token_env.as_deref()?;
        std::env::var(var).ok().filter(|t| !t.trim().is_empty())
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(extrato_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = ensure_extrato_home()?.join("config.toml");
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_survives_toml() {
        let cfg = Config::default();
        let text = toml::to_string_pretty(&cfg).unwrap();
        assert!(text.contains("[api]"));
        assert!(text.contains("page_limit = 20"));
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back, cfg);
    }

    #[test]
    fn feed_section_fields_are_optional() {
        let cfg: Config = toml::from_str(
            r#"
            [api]
            base_url = "https://bank.example"

            [feed]

            [categories]
            food = "Alimentação"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.feed.page_limit, 20);
        assert_eq!(cfg.feed.timezone, "America/Sao_Paulo");
        assert_eq!(cfg.api.token_env, None);
        assert_eq!(cfg.categories.get("food").map(String::as_str), Some("Alimentação"));
    }

    #[test]
    fn zero_page_limit_is_clamped() {
        let mut cfg = Config::default();
        cfg.feed.page_limit = 0;
        assert_eq!(cfg.feed_config().page_limit, 1);
    }
}
