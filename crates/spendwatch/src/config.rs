use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::Error;

const DEFAULT_CONFIG_NAME: &str = "spendwatch.toml";
pub const WEBHOOK_ENV: &str = "SLACK_WEBHOOK_URL";

/// On-disk configuration. Every section is optional.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    pub billing: Option<Billing>,
    #[serde(default)]
    pub slack: Slack,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum Billing {
    /// Saved GetCostAndUsage response, for dry runs and tests
    Fixture { path: PathBuf },
    #[cfg(feature = "costexplorer")]
    CostExplorer {
        region: Option<String>,
        profile: Option<String>,
    },
}

#[derive(Debug, Default, Deserialize)]
pub struct Slack {
    /// Used only when SLACK_WEBHOOK_URL is unset
    pub webhook_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Fully resolved settings handed to the job.
#[derive(Debug, Clone)]
pub struct Settings {
    pub webhook_url: String,
    pub billing: Billing,
    pub timeout: Option<Duration>,
}

impl Config {
    /// Load configuration from an explicit path, or search upward from current dir.
    /// No file found is not an error: defaults apply. A relative fixture path is taken
    /// relative to the config file.
    pub fn load(path_override: Option<PathBuf>) -> Result<Self> {
        let path = match path_override {
            Some(p) => p,
            None => match find_upwards(DEFAULT_CONFIG_NAME) {
                Some(p) => p,
                None => return Ok(Config::default()),
            },
        };

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Reading config file {}", path.display()))?;
        let mut cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Parsing TOML config {}", path.display()))?;

        if let (Some(Billing::Fixture { path: fixture }), Some(base)) =
            (cfg.billing.as_mut(), path.parent())
        {
            if fixture.is_relative() {
                let joined = base.join(&*fixture);
                *fixture = joined;
            }
        }
        Ok(cfg)
    }

    /// Merge the file with the webhook URL taken from the environment. The environment wins.
    pub fn resolve(self, env_webhook: Option<String>) -> std::result::Result<Settings, Error> {
        let webhook_url = env_webhook
            .filter(|u| !u.trim().is_empty())
            .or(self.slack.webhook_url)
            .ok_or_else(|| {
                Error::config(format!(
                    "{WEBHOOK_ENV} is not set and no slack.webhook_url is configured"
                ))
            })?;
        reqwest::Url::parse(&webhook_url)
            .map_err(|e| Error::config(format!("invalid webhook URL: {e}")))?;

        let billing = match self.billing {
            Some(b) => b,
            None => default_billing()?,
        };

        Ok(Settings {
            webhook_url,
            billing,
            timeout: self.slack.timeout_secs.map(Duration::from_secs),
        })
    }
}

#[cfg(feature = "costexplorer")]
fn default_billing() -> std::result::Result<Billing, Error> {
    Ok(Billing::CostExplorer {
        region: None,
        profile: None,
    })
}

#[cfg(not(feature = "costexplorer"))]
fn default_billing() -> std::result::Result<Billing, Error> {
    Err(Error::config(
        "no [billing] section and Cost Explorer support is not compiled in",
    ))
}

fn find_upwards(file_name: &str) -> Option<PathBuf> {
    let mut dir = std::env::current_dir().ok()?;
    loop {
        let candidate = dir.join(file_name);
        if candidate.exists() {
            return Some(candidate);
        }
        if !dir.pop() {
            break;
        }
    }
    None
}
