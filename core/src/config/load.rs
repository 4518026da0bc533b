use std::path::{Path, PathBuf};

use super::types::AppConfig;

/// Get the default data directory: ~/.stdio-tap
pub fn get_data_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_err(|_| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(PathBuf::from(home).join(".stdio-tap"))
}

pub fn load_default() -> anyhow::Result<AppConfig> {
    // Priority 1: ~/.stdio-tap/config.toml
    let user_config = get_data_dir()
        .map(|d| d.join("config.toml"))
        .ok()
        .filter(|p| p.exists());

    // Priority 2: ./stdio-tap.toml
    let local_config = Path::new("stdio-tap.toml");

    let cfg = match user_config {
        Some(path) => load_from_path(&path)?,
        None if local_config.exists() => load_from_path(local_config)?,
        None => AppConfig::default(),
    };

    Ok(apply_env_overrides(cfg, |key| std::env::var(key).ok()))
}

pub fn load_from_path(path: &Path) -> anyhow::Result<AppConfig> {
    let s = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("read {} failed: {e}", path.display()))?;
    let cfg = toml::from_str::<AppConfig>(&s)
        .map_err(|e| anyhow::anyhow!("parse {} failed: {e}", path.display()))?;
    Ok(cfg)
}

/// Environment variable overrides (highest priority below CLI flags).
pub fn apply_env_overrides<F>(mut cfg: AppConfig, get: F) -> AppConfig
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = get("STDIO_TAP_LOG_DIR") {
        if !v.trim().is_empty() {
            cfg.capture.log_dir = v;
        }
    }
    if let Some(v) = get("STDIO_TAP_LOG_LEVEL") {
        if !v.trim().is_empty() {
            cfg.logging.level = v;
        }
    }
    cfg
}

/// Expand `~` and environment variables in a configured directory.
pub fn resolve_dir(raw: &str) -> PathBuf {
    match shellexpand::full(raw) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => PathBuf::from(shellexpand::tilde(raw).as_ref()),
    }
}
