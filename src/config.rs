// src/config.rs
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::dedup::MatchPolicy;
use crate::watch::WatchIntervals;

pub const ENV_FEED_URL: &str = "FEED_URL";
pub const ENV_FEED_APP_TOKEN: &str = "FEED_APP_TOKEN";
pub const ENV_SHEET_KEY: &str = "SHEET_KEY";
pub const ENV_SHEETS_ACCESS_TOKEN: &str = "SHEETS_ACCESS_TOKEN";
pub const ENV_TWITTER_ACCESS_TOKEN: &str = "TWITTER_ACCESS_TOKEN";
pub const ENV_POLL_INTERVAL_SECS: &str = "POLL_INTERVAL_SECS";
pub const ENV_BACKOFF_SECS: &str = "FETCH_FAILURE_BACKOFF_SECS";
pub const ENV_MATCH_POLICY: &str = "MATCH_POLICY";
pub const ENV_DRY_RUN: &str = "DRY_RUN";
pub const ENV_METRICS_PORT: &str = "METRICS_PORT";
pub const ENV_CONFIG_PATH: &str = "WATCH_CONFIG_PATH";

const DEFAULT_CONFIG_PATH: &str = "config/watch.toml";

/// Everything the daemon needs, loaded once at startup and passed by
/// reference from there. Secrets come from the environment only; the
/// optional TOML file carries non-secret tuning, and the environment wins
/// where both speak.
#[derive(Debug, Clone)]
pub struct Config {
    pub feed_url: String,
    pub feed_app_token: String,
    pub sheet_key: String,
    pub sheets_access_token: String,
    pub twitter_access_token: String,
    pub intervals: WatchIntervals,
    pub match_policy: MatchPolicy,
    pub dry_run: bool,
    pub metrics_port: Option<u16>,
}

#[derive(Debug, Default, serde::Deserialize)]
struct FileConfig {
    feed_url: Option<String>,
    poll_interval_secs: Option<u64>,
    fetch_failure_backoff_secs: Option<u64>,
    match_policy: Option<String>,
}

fn load_file_config() -> Result<FileConfig> {
    let path = match std::env::var(ENV_CONFIG_PATH) {
        Ok(p) => PathBuf::from(p),
        Err(_) => {
            let fallback = Path::new(DEFAULT_CONFIG_PATH);
            if !fallback.exists() {
                return Ok(FileConfig::default());
            }
            fallback.to_path_buf()
        }
    };
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("reading watch config from {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

fn required(name: &str) -> Result<String> {
    std::env::var(name).with_context(|| format!("missing required environment variable {name}"))
}

fn env_secs(name: &str, fallback: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(fallback)
}

fn env_flag(name: &str) -> bool {
    std::env::var(name).ok().is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let file = load_file_config()?;
        let dry_run = env_flag(ENV_DRY_RUN);

        let feed_url = std::env::var(ENV_FEED_URL)
            .ok()
            .or(file.feed_url)
            .with_context(|| format!("missing {ENV_FEED_URL} (env or config file)"))?;
        let feed_app_token = required(ENV_FEED_APP_TOKEN)?;

        // Ledger and publisher credentials are only consulted when the
        // real collaborators are in play.
        let (sheet_key, sheets_access_token, twitter_access_token) = if dry_run {
            (
                std::env::var(ENV_SHEET_KEY).unwrap_or_default(),
                std::env::var(ENV_SHEETS_ACCESS_TOKEN).unwrap_or_default(),
                std::env::var(ENV_TWITTER_ACCESS_TOKEN).unwrap_or_default(),
            )
        } else {
            (
                required(ENV_SHEET_KEY)?,
                required(ENV_SHEETS_ACCESS_TOKEN)?,
                required(ENV_TWITTER_ACCESS_TOKEN)?,
            )
        };

        let defaults = WatchIntervals::default();
        let poll = env_secs(
            ENV_POLL_INTERVAL_SECS,
            file.poll_interval_secs.unwrap_or(defaults.poll.as_secs()),
        );
        let backoff = env_secs(
            ENV_BACKOFF_SECS,
            file.fetch_failure_backoff_secs
                .unwrap_or(defaults.fetch_failure_backoff.as_secs()),
        );

        let match_policy = match std::env::var(ENV_MATCH_POLICY).ok().or(file.match_policy) {
            Some(s) => s.parse()?,
            None => MatchPolicy::default(),
        };

        let metrics_port = std::env::var(ENV_METRICS_PORT)
            .ok()
            .map(|v| {
                v.parse::<u16>()
                    .with_context(|| format!("{ENV_METRICS_PORT} is not a port number: {v:?}"))
            })
            .transpose()?;

        Ok(Self {
            feed_url,
            feed_app_token,
            sheet_key,
            sheets_access_token,
            twitter_access_token,
            intervals: WatchIntervals {
                poll: Duration::from_secs(poll),
                fetch_failure_backoff: Duration::from_secs(backoff),
            },
            match_policy,
            dry_run,
            metrics_port,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn clear_watch_env() {
        for name in [
            ENV_FEED_URL,
            ENV_FEED_APP_TOKEN,
            ENV_SHEET_KEY,
            ENV_SHEETS_ACCESS_TOKEN,
            ENV_TWITTER_ACCESS_TOKEN,
            ENV_POLL_INTERVAL_SECS,
            ENV_BACKOFF_SECS,
            ENV_MATCH_POLICY,
            ENV_DRY_RUN,
            ENV_METRICS_PORT,
            ENV_CONFIG_PATH,
        ] {
            env::remove_var(name);
        }
    }

    #[serial_test::serial]
    #[test]
    fn missing_required_vars_name_the_variable() {
        clear_watch_env();
        env::set_var(ENV_FEED_URL, "https://example.test/incidents.json");
        let err = Config::from_env().unwrap_err();
        assert!(format!("{err:#}").contains(ENV_FEED_APP_TOKEN));
    }

    #[serial_test::serial]
    #[test]
    fn dry_run_skips_collaborator_credentials() {
        clear_watch_env();
        env::set_var(ENV_FEED_URL, "https://example.test/incidents.json");
        env::set_var(ENV_FEED_APP_TOKEN, "tok");
        env::set_var(ENV_DRY_RUN, "1");

        let cfg = Config::from_env().unwrap();
        assert!(cfg.dry_run);
        assert_eq!(cfg.match_policy, MatchPolicy::Pair);
        assert_eq!(cfg.intervals.poll, Duration::from_secs(300));
        assert_eq!(cfg.intervals.fetch_failure_backoff, Duration::from_secs(900));
        clear_watch_env();
    }

    #[serial_test::serial]
    #[test]
    fn env_overrides_file_tuning() {
        clear_watch_env();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("watch.toml");
        std::fs::write(
            &path,
            r#"
feed_url = "https://file.test/incidents.json"
poll_interval_secs = 60
match_policy = "field"
"#,
        )
        .unwrap();

        env::set_var(ENV_CONFIG_PATH, path.display().to_string());
        env::set_var(ENV_FEED_APP_TOKEN, "tok");
        env::set_var(ENV_DRY_RUN, "true");
        env::set_var(ENV_POLL_INTERVAL_SECS, "120");

        let cfg = Config::from_env().unwrap();
        assert_eq!(cfg.feed_url, "https://file.test/incidents.json");
        assert_eq!(cfg.intervals.poll, Duration::from_secs(120)); // env wins
        assert_eq!(cfg.match_policy, MatchPolicy::Field);
        clear_watch_env();
    }
}
