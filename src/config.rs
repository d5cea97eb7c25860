use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::scheduler::Trigger;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// LeetCode usernames to track.
    pub subjects: Vec<String>,
    #[serde(default = "default_true")]
    pub run_on_start: bool,
    /// Fixed offset the trigger times are written in (330 = IST).
    #[serde(default)]
    pub utc_offset_minutes: i32,
    #[serde(default)]
    pub leetcode: LeetCodeConfig,
    #[serde(default)]
    pub mail: MailConfig,
    #[serde(default)]
    pub checks: Vec<CheckConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LeetCodeConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_site")]
    pub site: String,
    #[serde(default = "default_recent_limit")]
    pub recent_limit: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LeetCodeConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            site: default_site(),
            recent_limit: default_recent_limit(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_endpoint() -> String {
    "https://leetcode.com/graphql/".to_string()
}

fn default_site() -> String {
    "https://leetcode.com".to_string()
}

fn default_recent_limit() -> u32 {
    50
}

fn default_timeout_secs() -> u64 {
    20
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    #[default]
    Smtp,
    /// Print the email instead of sending it.
    Stdout,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MailConfig {
    #[serde(default)]
    pub transport: Transport,
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Vec<String>,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            transport: Transport::default(),
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            username: None,
            password: None,
            from: None,
            to: Vec::new(),
        }
    }
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckMode {
    DailyTarget,
    Inactivity,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CheckConfig {
    pub name: String,
    pub mode: CheckMode,
    #[serde(default)]
    pub lookback_days: u32,
    #[serde(default)]
    pub triggers: Vec<String>,
    /// Daily-target only: also mail when every subject has solved it.
    #[serde(default)]
    pub notify_when_done: bool,
}

impl CheckConfig {
    pub fn parsed_triggers(&self) -> Result<Vec<Trigger>> {
        self.triggers
            .iter()
            .map(|t| {
                t.parse::<Trigger>()
                    .with_context(|| format!("Invalid trigger in check '{}'", self.name))
            })
            .collect()
    }
}

impl Config {
    pub fn check(&self, name: &str) -> Option<&CheckConfig> {
        self.checks.iter().find(|c| c.name == name)
    }

    /// Pull credentials and recipients from the environment, overriding the file.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(user) = lookup("LEETNUDGE_SMTP_USERNAME") {
            self.mail.username = Some(user);
        }
        if let Some(pass) = lookup("LEETNUDGE_SMTP_PASSWORD") {
            self.mail.password = Some(pass);
        }
        if let Some(to) = lookup("LEETNUDGE_MAIL_TO") {
            self.mail.to = split_recipients(&to);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.subjects.is_empty() {
            anyhow::bail!("No subjects configured. Add LeetCode usernames to `subjects`.");
        }
        let mut seen = HashSet::new();
        for subject in &self.subjects {
            if subject.trim().is_empty() {
                anyhow::bail!("Blank entry in `subjects`");
            }
            if !seen.insert(subject.as_str()) {
                anyhow::bail!("Duplicate subject '{subject}'");
            }
        }
        if self.checks.is_empty() {
            anyhow::bail!("No checks configured. Add at least one [[checks]] table.");
        }
        if self.utc_offset_minutes.unsigned_abs() >= 24 * 60 {
            anyhow::bail!("utc_offset_minutes out of range: {}", self.utc_offset_minutes);
        }
        let mut names = HashSet::new();
        for check in &self.checks {
            if !names.insert(check.name.as_str()) {
                anyhow::bail!("Duplicate check name '{}'", check.name);
            }
            check.parsed_triggers()?;
        }
        if self.mail.transport == Transport::Smtp {
            if self.mail.from.is_none() {
                anyhow::bail!("[mail] from is required for the smtp transport");
            }
            if self.mail.to.is_empty() {
                anyhow::bail!("[mail] to is empty. Set it or LEETNUDGE_MAIL_TO.");
            }
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

/// Comma-separated list with all whitespace stripped.
pub fn split_recipients(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.chars().filter(|c| !c.is_whitespace()).collect::<String>())
        .filter(|s| !s.is_empty())
        .collect()
}

pub fn load(path: &str) -> Result<Config> {
    let path = expand_tilde(path);
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    config.apply_env();
    config.validate()?;
    Ok(config)
}

pub fn default_base_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".leetnudge")
}

pub async fn init_config_dir() -> Result<PathBuf> {
    let base = default_base_dir();
    tokio::fs::create_dir_all(&base).await?;

    let config_path = base.join("config.toml");
    if !config_path.exists() {
        tokio::fs::write(&config_path, TEMPLATE).await?;
    }
    Ok(config_path)
}

const TEMPLATE: &str = r#"# LeetCode usernames to watch
subjects = ["your-leetcode-username"]

# Run every check once at startup, then follow the triggers
run_on_start = true

# Trigger times below are in this fixed offset from UTC (330 = IST)
utc_offset_minutes = 0

[leetcode]
endpoint = "https://leetcode.com/graphql/"
recent_limit = 50
timeout_secs = 20

[mail]
transport = "smtp"   # or "stdout" for a dry run
smtp_host = "smtp.gmail.com"
smtp_port = 587
username = "you@gmail.com"
# password = "app-password"   # prefer LEETNUDGE_SMTP_PASSWORD
from = "you@gmail.com"
to = ["you@gmail.com"]

[[checks]]
name = "potd"
mode = "daily_target"
triggers = ["10:00", "22:00"]
notify_when_done = true

[[checks]]
name = "inactivity"
mode = "inactivity"
lookback_days = 3
triggers = ["00:00"]
"#;

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}
