//! Optional configuration file, merged underneath explicit CLI flags.
//!
//! Looked up at `<config dir>/dcpu16/config.toml`. Every key is
//! optional; a missing file is simply the default configuration, and a
//! malformed one is reported and ignored.

use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub khz: Option<u32>,
    pub little_endian: Option<bool>,
    pub detect_loops: Option<bool>,
    pub graphics: Option<bool>,
}

fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("dcpu16").join("config.toml"))
}

pub fn load() -> Config {
    let Some(path) = config_path() else {
        return Config::default();
    };
    let Ok(text) = std::fs::read_to_string(&path) else {
        return Config::default();
    };
    match toml::from_str(&text) {
        Ok(config) => config,
        Err(e) => {
            log::warn!("ignoring malformed config {}: {e}", path.display());
            Config::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_keys_parse() {
        let config: Config = toml::from_str(
            "khz = 1000\nlittle_endian = true\ndetect_loops = true\ngraphics = false\n",
        )
        .unwrap();
        assert_eq!(config.khz, Some(1000));
        assert_eq!(config.little_endian, Some(true));
        assert_eq!(config.detect_loops, Some(true));
        assert_eq!(config.graphics, Some(false));
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.khz.is_none());
        assert!(config.little_endian.is_none());
    }

    #[test]
    fn unknown_keys_are_tolerated() {
        let config: Config = toml::from_str("future_option = 3\nkhz = 200\n").unwrap();
        assert_eq!(config.khz, Some(200));
    }
}
