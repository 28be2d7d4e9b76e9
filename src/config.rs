use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Upper bound on any single pipeline stage delay. Pacing is cosmetic and
/// must stay bounded so a bad config cannot stall streams.
const MAX_STAGE_DELAY_MS: u64 = 60_000;
/// Upper bound on the inter-word delay during answer streaming.
const MAX_WORD_DELAY_MS: u64 = 1_000;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub documents: DocumentsConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
    #[serde(default)]
    pub jobs: JobsConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DocumentsConfig {
    /// Directory scanned for documents. Created on load if missing.
    pub dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_provider() -> String {
    "gemini".to_string()
}
fn default_model() -> String {
    "gemini-2.0-flash-exp".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

/// Delays between pipeline stages, in milliseconds.
///
/// These simulate progressive work for the client UI. All of them may be
/// zero, which test suites use to run the full pipeline without sleeping.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct PacingConfig {
    #[serde(default = "default_thinking_ms")]
    pub thinking_ms: u64,
    #[serde(default = "default_searching_ms")]
    pub searching_ms: u64,
    #[serde(default = "default_retrieving_ms")]
    pub retrieving_ms: u64,
    #[serde(default = "default_analyzing_ms")]
    pub analyzing_ms: u64,
    #[serde(default = "default_word_delay_ms")]
    pub word_delay_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            thinking_ms: default_thinking_ms(),
            searching_ms: default_searching_ms(),
            retrieving_ms: default_retrieving_ms(),
            analyzing_ms: default_analyzing_ms(),
            word_delay_ms: default_word_delay_ms(),
        }
    }
}

impl PacingConfig {
    /// All delays set to zero. Streams run as fast as the scheduler allows.
    pub fn zero() -> Self {
        Self {
            thinking_ms: 0,
            searching_ms: 0,
            retrieving_ms: 0,
            analyzing_ms: 0,
            word_delay_ms: 0,
        }
    }
}

fn default_thinking_ms() -> u64 {
    500
}
fn default_searching_ms() -> u64 {
    800
}
fn default_retrieving_ms() -> u64 {
    600
}
fn default_analyzing_ms() -> u64 {
    700
}
fn default_word_delay_ms() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct JobsConfig {
    /// Jobs older than this are evicted on the next submission.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    /// Registry capacity. The oldest jobs are evicted past this bound.
    #[serde(default = "default_max_pending")]
    pub max_pending: usize,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            max_pending: default_max_pending(),
        }
    }
}

fn default_ttl_secs() -> u64 {
    3_600
}
fn default_max_pending() -> usize {
    1_024
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    match config.generation.provider.as_str() {
        "gemini" | "template" => {}
        other => anyhow::bail!(
            "Unknown generation provider: '{}'. Must be gemini or template.",
            other
        ),
    }

    if config.generation.timeout_secs == 0 {
        anyhow::bail!("generation.timeout_secs must be > 0");
    }

    let stages = [
        ("pacing.thinking_ms", config.pacing.thinking_ms),
        ("pacing.searching_ms", config.pacing.searching_ms),
        ("pacing.retrieving_ms", config.pacing.retrieving_ms),
        ("pacing.analyzing_ms", config.pacing.analyzing_ms),
    ];
    for (name, value) in stages {
        if value > MAX_STAGE_DELAY_MS {
            anyhow::bail!("{} must be <= {}", name, MAX_STAGE_DELAY_MS);
        }
    }

    if config.pacing.word_delay_ms > MAX_WORD_DELAY_MS {
        anyhow::bail!("pacing.word_delay_ms must be <= {}", MAX_WORD_DELAY_MS);
    }

    if config.jobs.ttl_secs == 0 {
        anyhow::bail!("jobs.ttl_secs must be > 0");
    }

    if config.jobs.max_pending == 0 {
        anyhow::bail!("jobs.max_pending must be >= 1");
    }

    if config.server.bind.is_empty() {
        anyhow::bail!("server.bind must not be empty");
    }

    Ok(config)
}
