//! Run configuration: CLI flags merged over an optional TOML file

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use logreader_logs::{FilterConfig, SourceSpec};
use logreader_remote::{RemoteTarget, SessionOptions};
use logreader_types::LOG_FILE_NAME;

use crate::Args;
use crate::output::ColorMode;

/// Default upper bound on opening the remote session
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default delay between polls of a followed local file
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Settings that may be kept in the config file
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub ip: Option<String>,
    pub level_types: Option<String>,
    pub classes: Option<String>,
    pub methods: Option<String>,
    pub connect_timeout_secs: Option<u64>,
    pub poll_interval_ms: Option<u64>,
    pub color: Option<ColorMode>,
}

impl FileConfig {
    /// `<config dir>/logreader/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("logreader").join("config.toml"))
    }

    /// Load the explicit file, or the default one if it exists
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::read(path),
            None => match Self::default_path() {
                Some(path) if path.is_file() => Self::read(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }
}

/// Everything a run needs, resolved once at startup
#[derive(Clone, Debug)]
pub struct RunConfig {
    pub target: RemoteTarget,
    pub follow: bool,
    pub local_simulation: bool,
    pub filter: FilterConfig,
    pub connect_timeout: Duration,
    pub poll_interval: Duration,
    pub color: ColorMode,
}

impl RunConfig {
    /// Merge CLI arguments over the config file
    pub fn resolve(args: &Args, file: FileConfig) -> Self {
        let ip = args.ip.as_deref().or(file.ip.as_deref());
        let target = RemoteTarget::resolve(
            args.team,
            ip,
            args.local_simulation,
            args.no_driverstation,
        );

        let filter = FilterConfig::from_lists(
            args.level_types.as_deref().or(file.level_types.as_deref()),
            args.classes.as_deref().or(file.classes.as_deref()),
            args.methods.as_deref().or(file.methods.as_deref()),
        );

        let connect_timeout = args
            .connect_timeout
            .or(file.connect_timeout_secs)
            .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS);
        let poll_interval = args
            .poll_interval_ms
            .or(file.poll_interval_ms)
            .unwrap_or(DEFAULT_POLL_INTERVAL_MS);

        Self {
            target,
            follow: args.follow,
            local_simulation: args.local_simulation,
            filter,
            connect_timeout: Duration::from_secs(connect_timeout),
            poll_interval: Duration::from_millis(poll_interval),
            color: args.color.or(file.color).unwrap_or_default(),
        }
    }

    /// Pick the log source: the local file for a simulation, the robot otherwise
    pub fn source_spec(&self, working_dir: &Path) -> SourceSpec {
        if self.local_simulation {
            let path = working_dir.join(LOG_FILE_NAME);
            if self.follow {
                SourceSpec::Follow {
                    path,
                    poll_interval: self.poll_interval,
                }
            } else {
                SourceSpec::Snapshot { path }
            }
        } else {
            SourceSpec::Remote {
                host: self.target.host.clone(),
                follow: self.follow,
                options: SessionOptions {
                    connect_timeout: self.connect_timeout,
                    ..Default::default()
                },
            }
        }
    }
}
