use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_usize(profile: &str, key: &str, default: usize) -> usize {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_bool(profile: &str, key: &str, default: bool) -> bool {
    profiled_env_opt(profile, key)
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub rules: RulesConfig,
    pub engine: EngineConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `PROCWATCH_PROFILE`. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("PROCWATCH_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            rules: RulesConfig::from_env_profiled(p),
            engine: EngineConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  rules:   dir={}, watch={}", self.rules.rules_dir.display(), self.rules.watch);
        tracing::info!("  engine:  parallel_threshold={}", self.engine.parallel_threshold);
    }
}

// ── Rules ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    /// Directory scanned for rule files.
    pub rules_dir: PathBuf,
    /// Hot-reload rule files when they change on disk.
    pub watch: bool,
}

impl RulesConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            rules_dir: PathBuf::from(profiled_env_or(p, "RULES_DIR", "data/rules")),
            watch: profiled_env_bool(p, "RULES_WATCH", false),
        }
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            rules_dir: PathBuf::from("data/rules"),
            watch: false,
        }
    }
}

// ── Engine ────────────────────────────────────────────────────

pub const DEFAULT_PARALLEL_THRESHOLD: usize = 64;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Rule count at or above which rules are evaluated on the rayon pool.
    /// Zero disables parallel evaluation.
    pub parallel_threshold: usize,
}

impl EngineConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            parallel_threshold: profiled_env_usize(
                p,
                "DETECT_PARALLEL_THRESHOLD",
                DEFAULT_PARALLEL_THRESHOLD,
            ),
        }
    }

    /// True when a batch of `rule_count` rules should be split across threads.
    pub fn is_parallel(&self, rule_count: usize) -> bool {
        self.parallel_threshold > 0 && rule_count >= self.parallel_threshold
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}
