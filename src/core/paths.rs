use crate::error::{Error, Result};
use std::env;
use std::path::PathBuf;

/// Base shipwright config directory (~/.config/shipwright/ on Unix).
pub fn shipwright() -> Result<PathBuf> {
    #[cfg(windows)]
    {
        let appdata = env::var("APPDATA").map_err(|_| {
            Error::internal_unexpected("APPDATA environment variable not set on Windows")
        })?;
        Ok(PathBuf::from(appdata).join("shipwright"))
    }

    #[cfg(not(windows))]
    {
        let home = env::var("HOME").map_err(|_| {
            Error::internal_unexpected("HOME environment variable not set on Unix-like system")
        })?;
        Ok(PathBuf::from(home).join(".config").join("shipwright"))
    }
}

/// Global shipwright.json config file path
pub fn shipwright_json() -> Result<PathBuf> {
    Ok(shipwright()?.join("shipwright.json"))
}
