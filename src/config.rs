use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{WatchError, WatchResult};
use crate::source::tibiadata::DEFAULT_API_URL;
use crate::validation::{self, optional_setting};

pub const DEFAULT_CONFIG_PATH: &str = "guildwatch.toml";
const DEFAULT_DATABASE: &str = ".data/guildwatch.db";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    webhook_url: Option<String>,
    #[serde(default = "default_interval")]
    interval: u64,
    #[serde(default = "default_group_pause")]
    group_pause: u64,
    database: Option<PathBuf>,
    api_url: Option<String>,
    username: Option<String>,
    avatar_url: Option<String>,
    #[serde(default)]
    guilds: Vec<RawGuild>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawGuild {
    Name(String),
    Table {
        name: String,
        webhook_url: Option<String>,
        #[serde(default)]
        override_name: bool,
        #[serde(default)]
        override_image: bool,
    },
}

fn default_interval() -> u64 {
    300
}

fn default_group_pause() -> u64 {
    2
}

/// A guild to watch, with its webhook already resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildConfig {
    pub name: String,
    pub webhook_url: String,
    /// Post under the guild's name instead of the global username.
    pub override_name: bool,
    /// Post with the guild's logo as avatar.
    pub override_image: bool,
}

/// Loaded from TOML:
///
/// ```toml
/// webhook_url = "https://discord.com/api/webhooks/..."
/// interval = 300
/// guilds = ["Redd Alliance", { name = "Bald Dwarfs", override_name = true }]
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub interval: Duration,
    pub group_pause: Duration,
    pub database: PathBuf,
    pub api_url: String,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
    pub guilds: Vec<GuildConfig>,
}

impl Config {
    pub fn load(path: &Path) -> WatchResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            WatchError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> WatchResult<Self> {
        let raw: RawConfig = toml::from_str(s)?;
        Self::validate(raw)
    }

    fn validate(raw: RawConfig) -> WatchResult<Self> {
        let global_webhook = match optional_setting(raw.webhook_url.as_deref()) {
            Some(url) => Some(validation::discord_webhook(&url, "webhook_url")?),
            None => None,
        };

        if raw.guilds.is_empty() {
            return Err(WatchError::Config("no guilds configured".to_string()));
        }
        let mut guilds: Vec<GuildConfig> = Vec::new();
        for entry in raw.guilds {
            let (name, webhook, override_name, override_image) = match entry {
                RawGuild::Name(name) => (name, None, false, false),
                RawGuild::Table {
                    name,
                    webhook_url,
                    override_name,
                    override_image,
                } => (name, webhook_url, override_name, override_image),
            };
            let name = validation::guild_name(&name)?;
            if guilds.iter().any(|g| g.name.eq_ignore_ascii_case(&name)) {
                return Err(WatchError::Config(format!("guild '{}' is listed twice", name)));
            }

            let webhook_url = match optional_setting(webhook.as_deref()) {
                Some(url) => validation::discord_webhook(&url, &format!("webhook_url of '{}'", name))?,
                None => global_webhook.clone().ok_or_else(|| {
                    WatchError::Config(format!("no webhook_url for guild '{}'", name))
                })?,
            };

            guilds.push(GuildConfig {
                name,
                webhook_url,
                override_name,
                override_image,
            });
        }

        Ok(Config {
            interval: validation::scan_interval(raw.interval)?,
            group_pause: Duration::from_secs(raw.group_pause),
            database: raw.database.unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE)),
            api_url: optional_setting(raw.api_url.as_deref()).unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            username: optional_setting(raw.username.as_deref()),
            avatar_url: optional_setting(raw.avatar_url.as_deref()),
            guilds,
        })
    }

    pub fn find_guild(&self, name: &str) -> Option<&GuildConfig> {
        let name = validation::guild_name(name).ok()?;
        self.guilds.iter().find(|g| g.name.eq_ignore_ascii_case(&name))
    }

    /// Several guilds share a channel, so panel titles should say which one.
    pub fn is_multi_guild(&self) -> bool {
        self.guilds.len() > 1
    }
}
