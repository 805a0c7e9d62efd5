use crate::core::error::StatusError;
use std::path::PathBuf;

pub fn get_config_directory() -> Result<PathBuf, StatusError> {
    let base = match std::env::consts::OS {
        "linux" | "freebsd" | "netbsd" | "openbsd" => std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .ok()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config"))),
        "macos" => dirs::home_dir().map(|home| home.join("Library/Application Support")),
        _ => dirs::config_dir(),
    };

    base.map(|dir| dir.join("git-glance"))
        .ok_or(StatusError::ConfigDirectoryNotFound)
}

pub fn get_settings_file() -> Result<PathBuf, StatusError> {
    Ok(get_config_directory()?.join("config.json"))
}
