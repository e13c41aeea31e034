use anyhow::{Context, ensure};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::naming::{AUDIO_EXTENSION, NamingPolicy};

/// Optional TOML configuration. Every section has defaults, so an empty file is valid.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub version: u32,
    pub output: Output,
    pub soundcloud: SoundCloud,
    pub extractor: Extractor,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Config> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let cfg: Config =
            toml::from_str(&contents).with_context(|| "Failed to parse config TOML")?;
        cfg.validate()
            .with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(cfg)
    }

    /// Target paths always end in `.mp3`, so the extractor must convert to mp3
    /// or the file it writes would never be found again
    fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.extractor.audio_format.eq_ignore_ascii_case(AUDIO_EXTENSION),
            "extractor.audio_format must be \"{AUDIO_EXTENSION}\", got \"{}\"",
            self.extractor.audio_format
        );
        Ok(())
    }

    /// Loads `path` when given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<Config> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Config::default()),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Output {
    /// Directory the `<channel>/<year>/<month>` tree is written under
    pub root: PathBuf,
    pub naming: NamingPolicy,
}

impl Default for Output {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            naming: NamingPolicy::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SoundCloud {
    pub client_id: Option<String>,
    pub api_base: String,
    pub timeout_secs: u64,
}

impl Default for SoundCloud {
    fn default() -> Self {
        Self {
            client_id: None,
            api_base: "https://api.soundcloud.com".to_string(),
            timeout_secs: 120,
        }
    }
}

/// External audio extraction tool used for YouTube links
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Extractor {
    pub command: String,
    /// Put before the tool's own arguments, e.g. `["-m", "yt_dlp"]` with `command = "python3"`
    pub args: Vec<String>,
    pub audio_format: String,
    pub audio_quality: String,
    pub timeout_secs: u64,
}

impl Default for Extractor {
    fn default() -> Self {
        Self {
            command: "youtube-dl".to_string(),
            args: Vec::new(),
            audio_format: "mp3".to_string(),
            audio_quality: "0".to_string(),
            timeout_secs: 900,
        }
    }
}
