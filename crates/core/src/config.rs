//! Application configuration loaded from defaults, a TOML file and the environment.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{ensure, Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

/// Directory under the user's config dir holding `config.toml`.
pub const CONFIG_DIR: &str = "grindbot";
/// Prefix for environment overrides, e.g. `GRINDBOT_TUNING__SEARCH_STEP_MILLIS`.
pub const ENV_PREFIX: &str = "GRINDBOT";

const DEFAULT_CONFIG: &str = r#"# grindbot configuration

[bot]
# Channel the trigger is accepted in.
channel_id = 0
# Message content that opens a new session.
trigger = "!bot"
farewell = "Goodbye!"

[tuning]
# Seconds per work unit; one unit costs and restores five times this amount.
work_unit_timeout_secs = 5
search_step_millis = 700
battle_pause_millis = 1000
# Remove the session panel after this many seconds (0 keeps it).
panel_lifetime_secs = 0

[player]
id = 1
name = "Adventurer"
stranger_id = 2
"#;

/// Chat-facing bot settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Channel where the trigger message opens sessions.
    pub channel_id: u64,
    /// Exact message content that opens a session.
    pub trigger: String,
    /// Reply sent when a session is cancelled.
    pub farewell: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            channel_id: 0,
            trigger: "!bot".to_string(),
            farewell: "Goodbye!".to_string(),
        }
    }
}

/// Timing knobs for the background activities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Length of one work unit in seconds.
    pub work_unit_timeout_secs: u64,
    /// Length of one "Hunting." animation frame.
    pub search_step_millis: u64,
    /// Pause before each battle exchange.
    pub battle_pause_millis: u64,
    /// Lifetime of a session panel; `0` keeps it until cancelled.
    pub panel_lifetime_secs: u64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            work_unit_timeout_secs: 5,
            search_step_millis: 700,
            battle_pause_millis: 1000,
            panel_lifetime_secs: 0,
        }
    }
}

impl Tuning {
    /// Silver spent and health restored per work unit.
    pub fn work_unit_price(&self) -> u32 {
        u32::try_from(self.work_unit_timeout_secs.saturating_mul(5)).unwrap_or(u32::MAX)
    }

    /// Seconds of "Counter" bought per work unit.
    pub fn work_unit_counter(&self) -> u32 {
        u32::try_from(self.work_unit_timeout_secs).unwrap_or(u32::MAX)
    }

    /// Duration of one of the three "Working" frames.
    pub fn work_frame(&self) -> Duration {
        Duration::from_secs(self.work_unit_timeout_secs) / 3
    }

    /// Duration of one "Hunting." frame.
    pub fn search_step(&self) -> Duration {
        Duration::from_millis(self.search_step_millis)
    }

    /// Pause before each exchange of blows.
    pub fn battle_pause(&self) -> Duration {
        Duration::from_millis(self.battle_pause_millis)
    }

    /// How long a panel stays up, `None` when it never expires.
    pub fn panel_lifetime(&self) -> Option<Duration> {
        (self.panel_lifetime_secs > 0).then(|| Duration::from_secs(self.panel_lifetime_secs))
    }

    /// Reject timings that would turn the loops into busy spins.
    ///
    /// A zero work unit is free and heals nothing, so a bout could never end.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.work_unit_timeout_secs > 0,
            "tuning.work_unit_timeout_secs must be at least 1"
        );
        ensure!(
            self.search_step_millis > 0,
            "tuning.search_step_millis must be at least 1"
        );
        ensure!(
            self.battle_pause_millis > 0,
            "tuning.battle_pause_millis must be at least 1"
        );
        Ok(())
    }
}

/// Identity the terminal front-end acts as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// User id of the local player.
    pub id: u64,
    /// Display name of the local player.
    pub name: String,
    /// User id used when pressing buttons as somebody else.
    pub stranger_id: u64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            id: 1,
            name: "Adventurer".to_string(),
            stranger_id: 2,
        }
    }
}

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Chat-facing settings.
    pub bot: BotConfig,
    /// Activity timings.
    pub tuning: Tuning,
    /// Local identity.
    pub player: PlayerConfig,
}

impl AppConfig {
    /// Load configuration from the default path and environment.
    pub fn load() -> Result<Self> {
        Self::load_from(config_path())
    }

    /// Load configuration from `path` (optional) layered over defaults and
    /// under environment overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let settings = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(File::from(path).format(FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("failed to read configuration {}", path.display()))?;
        let config: Self = settings
            .try_deserialize()
            .with_context(|| format!("invalid configuration in {}", path.display()))?;
        config
            .tuning
            .validate()
            .with_context(|| format!("invalid tuning in {}", path.display()))?;
        Ok(config)
    }
}

/// Location of the user's configuration file.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
        .join("config.toml")
}

/// Write the commented default configuration if no file exists yet.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = config_path();
    write_default_config(&path)?;
    Ok(path)
}

fn write_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write default config {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_match_builtin_file() -> Result<()> {
        let dir = tempdir()?;
        let config = AppConfig::load_from(dir.path().join("missing.toml"))?;
        assert_eq!(config.bot.trigger, "!bot");
        assert_eq!(config.tuning, Tuning::default());
        assert_eq!(config.player.name, "Adventurer");
        Ok(())
    }

    #[test]
    fn file_overrides_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[bot]\nchannel_id = 1234\n\n[tuning]\nsearch_step_millis = 10\n",
        )?;
        let config = AppConfig::load_from(&path)?;
        assert_eq!(config.bot.channel_id, 1234);
        assert_eq!(config.tuning.search_step_millis, 10);
        assert_eq!(config.tuning.work_unit_timeout_secs, 5);
        Ok(())
    }

    #[test]
    fn writes_default_file_once() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join("config.toml");
        write_default_config(&path)?;
        assert_eq!(fs::read_to_string(&path)?, DEFAULT_CONFIG);

        fs::write(&path, "[bot]\ntrigger = \"!play\"\n")?;
        write_default_config(&path)?;
        assert_eq!(AppConfig::load_from(&path)?.bot.trigger, "!play");
        Ok(())
    }

    #[test]
    fn zero_timings_are_rejected() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");
        for line in [
            "work_unit_timeout_secs = 0",
            "search_step_millis = 0",
            "battle_pause_millis = 0",
        ] {
            fs::write(&path, format!("[tuning]\n{line}\n"))?;
            let err = AppConfig::load_from(&path).expect_err("zero timing accepted");
            let field = line.split(' ').next().unwrap_or_default();
            assert!(
                format!("{err:#}").contains(field),
                "error for {field} was: {err:#}"
            );
        }
        Ok(())
    }

    #[test]
    fn zero_panel_lifetime_is_allowed() {
        let tuning = Tuning {
            panel_lifetime_secs: 0,
            ..Tuning::default()
        };
        assert!(tuning.validate().is_ok());
    }

    #[test]
    fn work_unit_price_follows_timeout() {
        let tuning = Tuning::default();
        assert_eq!(tuning.work_unit_price(), 25);
        assert_eq!(tuning.work_unit_counter(), 5);
        assert_eq!(tuning.work_frame(), Duration::from_nanos(1_666_666_666));
        assert_eq!(tuning.panel_lifetime(), None);
    }
}
