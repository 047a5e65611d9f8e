//! Runtime configuration, read from the environment.
//!
//! Every setting has a default so the binary runs without any variables set;
//! command-line flags override what is read here.

use crate::boxes::{BoxPolicy, DEFAULT_UNASSIGNED};
use crate::entity::ImageLayout;
use crate::rebuild::RebuildOptions;
use crate::source::DEFAULT_PAGE_DELAY;
use crate::split_list;
use anyhow::{Context, Result};
use std::env::{self, VarError};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_STORE_DIR: &str = "BRICKSHELF_STORE_DIR";
pub const ENV_PAGE_DELAY_MS: &str = "BRICKSHELF_PAGE_DELAY_MS";
pub const ENV_UNASSIGNED_BOX: &str = "BRICKSHELF_UNASSIGNED_BOX";
pub const ENV_EXCLUDED_BOXES: &str = "BRICKSHELF_EXCLUDED_BOXES";
pub const ENV_LOG: &str = "BRICKSHELF_LOG";

const DEFAULT_STORE_DIR: &str = "shelves";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Directory holding one log file per collection.
    pub store_dir: PathBuf,
    pub page_delay: Duration,
    pub layout: ImageLayout,
    pub box_policy: BoxPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_dir: PathBuf::from(DEFAULT_STORE_DIR),
            page_delay: DEFAULT_PAGE_DELAY,
            layout: ImageLayout::default(),
            box_policy: BoxPolicy::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name))
    }

    /// Build a configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Result<String, VarError>,
    {
        let read = |name: &str| -> Option<String> {
            match lookup(name) {
                Ok(value) if !value.trim().is_empty() => Some(value),
                Ok(_) | Err(VarError::NotPresent) => None,
                Err(VarError::NotUnicode(os)) => Some(os.to_string_lossy().into_owned()),
            }
        };

        let mut config = Self::default();
        if let Some(dir) = read(ENV_STORE_DIR) {
            config.store_dir = PathBuf::from(dir);
        }
        if let Some(raw) = read(ENV_PAGE_DELAY_MS) {
            let millis: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("{ENV_PAGE_DELAY_MS} must be milliseconds, got '{raw}'"))?;
            config.page_delay = Duration::from_millis(millis);
        }
        config.box_policy.unassigned = read(ENV_UNASSIGNED_BOX)
            .map(|v| v.trim().to_string())
            .unwrap_or_else(|| DEFAULT_UNASSIGNED.to_string());
        if let Some(raw) = read(ENV_EXCLUDED_BOXES) {
            config.box_policy.excluded = split_list(&raw).into_iter().collect();
        }
        Ok(config)
    }

    pub fn rebuild_options(&self) -> RebuildOptions {
        RebuildOptions {
            page_delay: self.page_delay,
            layout: self.layout.clone(),
        }
    }
}
