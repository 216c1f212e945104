//! Configuration for the SomaFM source
//!
//! Settings come from an optional YAML file and environment overrides:
//!
//! 1. `PMOSOMAFM_CONFIG` names a YAML file (missing keys take defaults)
//! 2. `PMOSOMAFM_CONFIG__<KEY>` overrides a single key, e.g.
//!    `PMOSOMAFM_CONFIG__TIMEOUT_SECS=10`
//!
//! ```yaml
//! feed_url: http://somafm.com/channels.xml
//! timeout_secs: 30
//! user_agent: PMOMusic/0.1.0 (pmosomafm)
//! preferred_format: mp3
//! ```

use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::client::{DEFAULT_FEED_URL, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use crate::error::Result;
use crate::track::DEFAULT_STREAM_FORMAT;

const ENV_CONFIG_FILE: &str = "PMOSOMAFM_CONFIG";
const ENV_PREFIX: &str = "PMOSOMAFM_CONFIG__";

/// SomaFM source settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SomaFmConfig {
    /// Channel feed location
    pub feed_url: String,
    /// Timeout for one feed fetch, in seconds
    pub timeout_secs: u64,
    /// User-Agent sent with the feed request
    pub user_agent: String,
    /// Stream format used when resolving a station to a track
    pub preferred_format: String,
}

impl Default for SomaFmConfig {
    fn default() -> Self {
        Self {
            feed_url: DEFAULT_FEED_URL.to_string(),
            timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            preferred_format: DEFAULT_STREAM_FORMAT.to_string(),
        }
    }
}

impl SomaFmConfig {
    /// Load from `PMOSOMAFM_CONFIG` (if set) and apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = match env::var(ENV_CONFIG_FILE) {
            Ok(path) => {
                info!(env_var = ENV_CONFIG_FILE, path = %path, "Loading SomaFM config");
                Self::from_file(path)?
            }
            Err(_) => Self::default(),
        };

        config.apply_overrides(unicode_vars(env::vars_os()));
        Ok(config)
    }

    /// Load from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parse YAML content; an empty document yields the defaults
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let mut config: Self = serde_yaml::from_str(content)?;
        if config.timeout_secs == 0 {
            warn!("Ignoring zero timeout_secs, using {}s", DEFAULT_REQUEST_TIMEOUT_SECS);
            config.timeout_secs = DEFAULT_REQUEST_TIMEOUT_SECS;
        }
        Ok(config)
    }

    /// Apply `PMOSOMAFM_CONFIG__*` overrides from `(name, value)` pairs
    ///
    /// Unknown keys are ignored; an unparsable or zero `TIMEOUT_SECS` is
    /// logged and leaves the current value in place.
    pub fn apply_overrides<I>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (name, value) in vars {
            let Some(key) = name.strip_prefix(ENV_PREFIX) else {
                continue;
            };

            match key.to_ascii_lowercase().as_str() {
                "feed_url" => self.feed_url = value,
                "user_agent" => self.user_agent = value,
                "preferred_format" => self.preferred_format = value,
                "timeout_secs" => match value.trim().parse::<u64>() {
                    Ok(secs) if secs > 0 => self.timeout_secs = secs,
                    _ => warn!(
                        env_var = %name,
                        value = %value,
                        "Ignoring invalid timeout override"
                    ),
                },
                _ => {}
            }
        }
    }

    /// Feed fetch timeout as a [`Duration`]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Environment pairs that are valid Unicode; others are skipped
fn unicode_vars<I>(vars: I) -> impl Iterator<Item = (String, String)>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    vars.into_iter()
        .filter_map(|(name, value)| Some((name.into_string().ok()?, value.into_string().ok()?)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = SomaFmConfig::default();
        assert_eq!(config.feed_url, "http://somafm.com/channels.xml");
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.preferred_format, "mp3");
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = SomaFmConfig::from_yaml_str("timeout_secs: 5\n").unwrap();
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.feed_url, DEFAULT_FEED_URL);

        assert_eq!(
            SomaFmConfig::from_yaml_str("   \n").unwrap(),
            SomaFmConfig::default()
        );
    }

    #[test]
    fn test_invalid_yaml() {
        let err = SomaFmConfig::from_yaml_str("timeout_secs: [oops").unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "feed_url: https://mirror.example.com/channels.xml").unwrap();
        writeln!(file, "preferred_format: aacp").unwrap();

        let config = SomaFmConfig::from_file(file.path()).unwrap();
        assert_eq!(config.feed_url, "https://mirror.example.com/channels.xml");
        assert_eq!(config.preferred_format, "aacp");
        assert_eq!(config.timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = SomaFmConfig::from_file(dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, crate::Error::Io(_)));
    }

    #[test]
    fn test_overrides() {
        let mut config = SomaFmConfig::default();
        config.apply_overrides(vars(&[
            ("PMOSOMAFM_CONFIG__FEED_URL", "http://localhost/channels.xml"),
            ("PMOSOMAFM_CONFIG__TIMEOUT_SECS", "12"),
            ("PMOSOMAFM_CONFIG__UNKNOWN", "x"),
            ("PATH", "/usr/bin"),
        ]));
        assert_eq!(config.feed_url, "http://localhost/channels.xml");
        assert_eq!(config.timeout_secs, 12);
    }

    #[test]
    fn test_invalid_timeout_override_is_ignored() {
        let mut config = SomaFmConfig::default();
        config.apply_overrides(vars(&[("PMOSOMAFM_CONFIG__TIMEOUT_SECS", "soon")]));
        assert_eq!(config.timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
    }

    #[test]
    fn test_zero_timeout_is_ignored() {
        let mut config = SomaFmConfig::default();
        config.apply_overrides(vars(&[("PMOSOMAFM_CONFIG__TIMEOUT_SECS", "0")]));
        assert_eq!(config.timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);

        let config = SomaFmConfig::from_yaml_str("timeout_secs: 0\n").unwrap();
        assert_eq!(config.timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_unicode_env_vars_are_skipped() {
        use std::os::unix::ffi::OsStringExt;

        let env = vec![
            (
                OsString::from("BROKEN"),
                OsString::from_vec(b"\xff\xfe".to_vec()),
            ),
            (
                OsString::from_vec(b"PMOSOMAFM_CONFIG__\xff".to_vec()),
                OsString::from("x"),
            ),
            (
                OsString::from("PMOSOMAFM_CONFIG__PREFERRED_FORMAT"),
                OsString::from("aacp"),
            ),
        ];

        let mut config = SomaFmConfig::default();
        config.apply_overrides(unicode_vars(env));
        assert_eq!(config.preferred_format, "aacp");
        assert_eq!(config.feed_url, DEFAULT_FEED_URL);
    }
}
