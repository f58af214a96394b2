use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub storage: Storage,
    #[serde(default)]
    pub server: Server,
    #[serde(default)]
    pub limits: Limits,
    #[serde(default)]
    pub demo: Demo,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Storage { pub root_dir: PathBuf }

#[derive(Debug, Deserialize, Clone)]
pub struct Server {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_port")]
    pub port: u16,
}
fn default_bind_addr() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 4000 }

impl Default for Server {
    fn default() -> Self { Self { bind_addr: default_bind_addr(), port: default_port() } }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Limits {
    #[serde(default = "default_max_request_kb")]
    pub max_request_kb: usize,
}
fn default_max_request_kb() -> usize { 64 }

impl Default for Limits {
    fn default() -> Self { Self { max_request_kb: default_max_request_kb() } }
}

/// Off unless asked for: mounts the deliberately broken `/read-no-validate`.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Demo {
    #[serde(default)]
    pub insecure_routes: bool,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)?;
        let mut cfg: Config = if path.extension().map(|e| e == "json").unwrap_or(false) {
            serde_json::from_str(&raw)?
        } else {
            toml::from_str(&raw)?
        };
        if cfg.storage.root_dir.is_relative() {
            let base = path.parent().unwrap_or_else(|| Path::new("."));
            cfg.storage.root_dir = base.join(&cfg.storage.root_dir);
        }
        Ok(cfg)
    }

    /// `PORT` wins over the file, matching how the labs are usually launched.
    pub fn apply_env(&mut self) -> anyhow::Result<()> {
        if let Ok(port) = std::env::var("PORT") {
            self.server.port = port.parse().with_context(|| format!("invalid PORT: {port}"))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.bind_addr.trim().is_empty() { anyhow::bail!("bind_addr must not be empty"); }
        if self.limits.max_request_kb == 0 { anyhow::bail!("max_request_kb must be > 0"); }
        if self.storage.root_dir.as_os_str().is_empty() { anyhow::bail!("root_dir must not be empty"); }
        Ok(())
    }
}

/// Create the root if it is missing and return its canonical absolute form.
pub fn prepare_root(root: &Path) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(root).with_context(|| format!("creating root {}", root.display()))?;
    let c = dunce::canonicalize(root).with_context(|| format!("canonicalizing root {}", root.display()))?;
    if !c.is_dir() {
        anyhow::bail!("root_dir is not a directory: {}", c.display());
    }
    Ok(c)
}
