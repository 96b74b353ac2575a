use anyhow::{bail, Context};
use selectorcore::catalog::query::{CatalogQueryBuilder, DEFAULT_TABLE};
use selectorcore::math::geometry::DISH_DIAMETER_M;
use selectorcore::processing::{ListenerSettings, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CatalogConfig {
    /// SQLite file holding the target list.
    pub path: Option<PathBuf>,
    pub table: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: None,
            table: DEFAULT_TABLE.to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetryConfig {
    pub attempts: u32,
    pub backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 1,
            backoff_ms: 250,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SelectorConfig {
    pub pointing_channel: String,
    pub targets_channel: String,
    pub catalog: CatalogConfig,
    pub dish_diameter_m: f64,
    pub retry: RetryConfig,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            pointing_channel: "pointing_channel".to_string(),
            targets_channel: "targets_channel".to_string(),
            catalog: CatalogConfig::default(),
            dish_diameter_m: DISH_DIAMETER_M,
            retry: RetryConfig::default(),
        }
    }
}

impl SelectorConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading selector config {}", path_ref.display()))?;
        let config: SelectorConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing selector config {}", path_ref.display()))?;
        config
            .validate()
            .with_context(|| format!("validating selector config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(
        catalog: Option<PathBuf>,
        pointing_channel: String,
        targets_channel: String,
    ) -> Self {
        Self {
            pointing_channel,
            targets_channel,
            catalog: CatalogConfig {
                path: catalog,
                ..CatalogConfig::default()
            },
            ..Self::default()
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.pointing_channel.is_empty() || self.targets_channel.is_empty() {
            bail!("channel names must not be empty");
        }
        if self.pointing_channel == self.targets_channel {
            bail!(
                "pointing and targets channels must differ (both {:?})",
                self.pointing_channel
            );
        }
        if !(self.dish_diameter_m.is_finite() && self.dish_diameter_m > 0.0) {
            bail!("dish_diameter_m must be positive, got {}", self.dish_diameter_m);
        }
        CatalogQueryBuilder::new(self.catalog.table.clone())?;
        if self.retry.attempts == 0 {
            bail!("retry.attempts must be at least 1");
        }
        Ok(())
    }

    pub fn to_listener_settings(&self) -> ListenerSettings {
        ListenerSettings {
            pointing_channel: self.pointing_channel.clone(),
            targets_channel: self.targets_channel.clone(),
            table: self.catalog.table.clone(),
            dish_diameter_m: self.dish_diameter_m,
            retry: RetryPolicy::new(
                self.retry.attempts,
                Duration::from_millis(self.retry.backoff_ms),
            ),
        }
    }
}
