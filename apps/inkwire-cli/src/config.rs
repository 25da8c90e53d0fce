//! CLI configuration management.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/inkwire/config.toml`
//! - Windows: `%APPDATA%/inkwire/config.toml`

use std::path::{Path, PathBuf};

use inkwire_ws_recognizer::RecognitionConfig;

/// Loads configuration from `path`, writing a default file if none exists.
pub fn load(path: &Path) -> anyhow::Result<RecognitionConfig> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        let config: RecognitionConfig = toml::from_str(&content)?;
        Ok(config)
    } else {
        let config = RecognitionConfig::default();
        save(path, &config)?;
        tracing::warn!(
            path = %path.display(),
            "no configuration found, wrote defaults; set server.applicationKey and server.hmacKey"
        );
        Ok(config)
    }
}

/// Saves configuration to `path`.
pub fn save(path: &Path, config: &RecognitionConfig) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;

    // Restrict permissions on Unix (holds the HMAC key).
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }

    tracing::debug!(path = %path.display(), "configuration saved");
    Ok(())
}

/// Returns the platform-specific configuration file path.
pub fn default_config_path() -> anyhow::Result<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        Ok(PathBuf::from(appdata).join("inkwire").join("config.toml"))
    }

    #[cfg(not(target_os = "windows"))]
    {
        let base = std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|_| std::env::var("HOME").map(|h| PathBuf::from(h).join(".config")))
            .map_err(|_| anyhow::anyhow!("cannot locate a configuration directory"))?;
        Ok(base.join("inkwire").join("config.toml"))
    }
}
