use std::path::PathBuf;

use eyre::Result;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::identity::USER_AGENTS;
use crate::strategy::MIN_TRANSCRIPT_CHARS;

/// Read-only acquisition configuration, shared by every strategy.
///
/// Loaded once per process from ~/.config/ytxt/config.toml when present;
/// rotation over the lists happens via random picks per attempt, the lists
/// themselves are never mutated.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Invidious-compatible read-only mirror endpoints.
    pub mirror_instances: Vec<String>,
    /// User-agent strings rotated per attempt.
    pub user_agents: Vec<String>,
    /// Proxy URLs for the proxied transcript-API strategy. Empty means
    /// fall back to user-agent rotation only.
    pub proxies: Vec<String>,
    /// Subtitle language preference order for the download strategy.
    pub subtitle_langs: Vec<String>,
    /// Speech-to-text model passed to the transcription backend.
    pub whisper_model: Option<String>,
    /// Acceptance threshold for top-level strategy results.
    pub min_transcript_chars: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            mirror_instances: default_mirror_instances(),
            user_agents: USER_AGENTS.iter().map(|ua| ua.to_string()).collect(),
            proxies: Vec::new(),
            subtitle_langs: default_subtitle_langs(),
            whisper_model: None,
            min_transcript_chars: MIN_TRANSCRIPT_CHARS,
        }
    }
}

fn default_mirror_instances() -> Vec<String> {
    [
        "https://invidious.snopyta.org",
        "https://invidious.kavin.rocks",
        "https://vid.puffyan.us",
        "https://invidious.namazso.eu",
        "https://yt.artemislena.eu",
        "https://invidious.flokinet.to",
        "https://invidious.projectsegfau.lt",
        "https://y.com.sb",
        "https://invidious.slipfox.xyz",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_subtitle_langs() -> Vec<String> {
    ["en", "en-US", "en-GB", "en-CA", "en-AU"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Config {
    /// Load config from ~/.config/ytxt/config.toml if it exists
    pub fn load() -> Result<Self> {
        let path = config_path();
        if path.exists() {
            debug!("Loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            debug!("No config file found at {}", path.display());
            Ok(Config::default())
        }
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join("ytxt")
        .join("config.toml")
}
