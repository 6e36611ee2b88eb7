//! Client-side context management.
//!
//! Reads/writes `~/.celcontrol/config.toml`.

use std::path::{Path, PathBuf};

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use celcontrol_core::StoreConfig;

/// Mexico City has no DST; reports use its wall clock unless told otherwise.
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = -6 * 60;

fn default_offset() -> i32 {
    DEFAULT_UTC_OFFSET_MINUTES
}

/// A single context: one shop's store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Context {
    /// Context name (e.g. "centro").
    pub name: String,

    /// Offset applied to sale dates in exported reports.
    #[serde(default = "default_offset")]
    pub utc_offset_minutes: i32,

    pub store: StoreConfig,
}

impl Context {
    pub fn utc_offset(&self) -> anyhow::Result<FixedOffset> {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Invalid utc_offset_minutes {} in context \"{}\".",
                    self.utc_offset_minutes,
                    self.name
                )
            })
    }
}

/// Client configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Name of the currently active context.
    #[serde(rename = "current-context", default)]
    pub current_context: String,

    /// List of configured contexts.
    #[serde(default)]
    pub contexts: Vec<Context>,
}

impl ClientConfig {
    /// Default config file path: ~/.celcontrol/config.toml.
    pub fn default_path() -> PathBuf {
        dirs_path().join("config.toml")
    }

    /// Load config from disk, or return default if file doesn't exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: ClientConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the currently active context, if any.
    pub fn current(&self) -> Option<&Context> {
        self.get(&self.current_context)
    }

    pub fn get(&self, name: &str) -> Option<&Context> {
        self.contexts.iter().find(|c| c.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Context> {
        self.contexts.iter_mut().find(|c| c.name == name)
    }

    /// Resolve the context a command runs against: the override if given,
    /// otherwise the current one.
    pub fn resolve(&self, name: Option<&str>) -> anyhow::Result<&Context> {
        match name {
            Some(name) => self.get(name).ok_or_else(|| {
                anyhow::anyhow!(
                    "Context \"{name}\" not found. Run `celcontrol context list` to see available contexts."
                )
            }),
            None => self.current().ok_or_else(|| {
                anyhow::anyhow!("No current context. Run `celcontrol context create <name> --sqlite <path>`.")
            }),
        }
    }

    /// Add or update a context.
    pub fn upsert_context(&mut self, ctx: Context) {
        if let Some(existing) = self.get_mut(&ctx.name) {
            *existing = ctx;
        } else {
            self.contexts.push(ctx);
        }
    }

    /// Remove a context by name. Returns true if it was found.
    pub fn remove_context(&mut self, name: &str) -> bool {
        let len = self.contexts.len();
        self.contexts.retain(|c| c.name != name);
        if self.current_context == name {
            self.current_context = String::new();
        }
        self.contexts.len() < len
    }
}

/// Return the CelControl config directory (~/.celcontrol).
fn dirs_path() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".celcontrol")
}
