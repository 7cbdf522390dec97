use dirs::data_dir;
use std::path::PathBuf;

pub const CACHE_DIR_ENV: &str = "KUBESIG_CACHE_DIR";

/// ~/.local/share/Kubesig   (or platform-equivalent)
pub fn kubesig_home() -> PathBuf {
    data_dir()
        .unwrap_or_else(|| PathBuf::from("~/.local/share"))
        .join("Kubesig")
}

/// ~/.local/share/Kubesig/cache, unless `KUBESIG_CACHE_DIR` is set
pub fn cache_dir() -> PathBuf {
    match std::env::var_os(CACHE_DIR_ENV) {
        Some(p) if !p.is_empty() => PathBuf::from(p),
        _ => kubesig_home().join("cache"),
    }
}

/// <cache>/results
pub fn results_cache_dir() -> PathBuf {
    cache_dir().join("results")
}
