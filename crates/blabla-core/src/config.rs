use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::cursor::DEFAULT_CURSOR_FILE;
use crate::poll::PollConfig;
use crate::schema::{DecodeOptions, OptionalFieldPolicy, DEFAULT_MAX_DEPTH, MIN_MAX_DEPTH};
use crate::{errors::Error, Result};

pub const DEFAULT_API_BASE_URL: &str = "https://api.telegram.org/";

/// Typed configuration for the bot process.
#[derive(Clone, Debug)]
pub struct Config {
    // Identity
    pub bot_token: String,
    pub bot_name: String,

    // Endpoint
    pub api_base_url: String,
    /// Client-side slack on top of the long-poll timeout.
    pub poll_grace: Duration,

    pub log_level: String,
    pub cursor_file: PathBuf,
    pub poll: PollConfig,
    pub decode: DecodeOptions,
}

impl Config {
    /// Environment (plus `.env` in the working directory) with file fallbacks
    /// for the token and bot name.
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).and_then(non_empty);

        let bot_token = match var("BOT_TOKEN") {
            Some(token) => token.trim().to_string(),
            None => read_first_line(&path_or(&var, "BOT_TOKEN_FILE", "token.txt"), "bot token")?,
        };
        let bot_name = match var("BOT_NAME") {
            Some(name) => name.trim().to_string(),
            None => read_first_line(&path_or(&var, "BOT_NAME_FILE", "name.txt"), "bot name")?,
        };

        let api_base_url = var("API_BASE_URL").unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        let log_level = var("LOG_LEVEL").unwrap_or_else(|| "information".to_string());
        let cursor_file = path_or(&var, "CURSOR_FILE", DEFAULT_CURSOR_FILE);

        let defaults = PollConfig::default();
        let poll = PollConfig {
            timeout_secs: parse_u64(&var, "POLL_TIMEOUT_SECS").unwrap_or(defaults.timeout_secs),
            reconnect_delay: parse_u64(&var, "RECONNECT_DELAY_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.reconnect_delay),
            checkpoint_each_batch: parse_bool(&var, "CHECKPOINT_EACH_BATCH")
                .unwrap_or(defaults.checkpoint_each_batch),
        };
        let poll_grace = Duration::from_millis(parse_u64(&var, "POLL_GRACE_MS").unwrap_or(10_000));

        let optional_fields = match var("OPTIONAL_FIELD_POLICY") {
            None => OptionalFieldPolicy::default(),
            Some(raw) => OptionalFieldPolicy::parse(&raw).ok_or_else(|| {
                Error::Config(format!(
                    "OPTIONAL_FIELD_POLICY must be `strict` or `lenient`, got {raw:?}"
                ))
            })?,
        };
        let max_depth = parse_u64(&var, "MAX_DECODE_DEPTH")
            .and_then(|d| usize::try_from(d).ok())
            .unwrap_or(DEFAULT_MAX_DEPTH)
            .max(MIN_MAX_DEPTH);

        Ok(Self {
            bot_token,
            bot_name,
            api_base_url,
            poll_grace,
            log_level,
            cursor_file,
            poll,
            decode: DecodeOptions {
                optional_fields,
                max_depth,
            },
        })
    }
}

fn path_or(var: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> PathBuf {
    var(key)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(default))
}

fn read_first_line(path: &Path, what: &str) -> Result<String> {
    let contents = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("cannot read {what} from {}: {e}", path.display())))?;
    contents
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .ok_or_else(|| Error::Config(format!("{} is empty, expected the {what}", path.display())))
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() || env::var_os(key).is_some() {
            continue; // existing env wins
        }

        let mut val = v.trim();
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = &val[1..val.len() - 1];
        }

        env::set_var(key, val);
    }
}

fn parse_bool(var: &impl Fn(&str) -> Option<String>, key: &str) -> Option<bool> {
    var(key).map(|s| {
        matches!(
            s.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn parse_u64(var: &impl Fn(&str) -> Option<String>, key: &str) -> Option<u64> {
    var(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_identity_is_set() {
        let config =
            Config::from_lookup(lookup(&[("BOT_TOKEN", " 1:abc "), ("BOT_NAME", "blablabot")]))
                .unwrap();

        assert_eq!(config.bot_token, "1:abc");
        assert_eq!(config.bot_name, "blablabot");
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.log_level, "information");
        assert_eq!(config.cursor_file, PathBuf::from("blablabot_update_id.txt"));
        assert_eq!(config.poll, PollConfig::default());
        assert_eq!(config.poll_grace, Duration::from_secs(10));
        assert_eq!(config.decode, DecodeOptions::default());
    }

    #[test]
    fn identity_falls_back_to_files() {
        let dir = tempfile::tempdir().unwrap();
        let token = dir.path().join("token.txt");
        let name = dir.path().join("name.txt");
        fs::write(&token, "9:xyz\n").unwrap();
        fs::write(&name, "blablabot\nignored\n").unwrap();

        let config = Config::from_lookup(lookup(&[
            ("BOT_TOKEN_FILE", token.to_str().unwrap()),
            ("BOT_NAME_FILE", name.to_str().unwrap()),
        ]))
        .unwrap();
        assert_eq!(config.bot_token, "9:xyz");
        assert_eq!(config.bot_name, "blablabot");
    }

    #[test]
    fn missing_token_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("token.txt");
        let err = Config::from_lookup(lookup(&[
            ("BOT_TOKEN_FILE", missing.to_str().unwrap()),
            ("BOT_NAME", "blablabot"),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::Config(ref msg) if msg.contains("bot token")));
    }

    #[test]
    fn overrides_are_parsed() {
        let config = Config::from_lookup(lookup(&[
            ("BOT_TOKEN", "t"),
            ("BOT_NAME", "n"),
            ("API_BASE_URL", "http://127.0.0.1:8081/"),
            ("CURSOR_FILE", "/var/lib/bot/cursor"),
            ("POLL_TIMEOUT_SECS", "5"),
            ("POLL_GRACE_MS", "250"),
            ("RECONNECT_DELAY_MS", "0"),
            ("CHECKPOINT_EACH_BATCH", "off"),
            ("OPTIONAL_FIELD_POLICY", "Lenient"),
            ("MAX_DECODE_DEPTH", "1"),
        ]))
        .unwrap();

        assert_eq!(config.api_base_url, "http://127.0.0.1:8081/");
        assert_eq!(config.cursor_file, PathBuf::from("/var/lib/bot/cursor"));
        assert_eq!(config.poll.timeout_secs, 5);
        assert_eq!(config.poll.reconnect_delay, Duration::ZERO);
        assert!(!config.poll.checkpoint_each_batch);
        assert_eq!(config.poll_grace, Duration::from_millis(250));
        assert_eq!(config.decode.optional_fields, OptionalFieldPolicy::Lenient);
        assert_eq!(config.decode.max_depth, MIN_MAX_DEPTH);
    }

    #[test]
    fn unknown_policy_is_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("BOT_TOKEN", "t"),
            ("BOT_NAME", "n"),
            ("OPTIONAL_FIELD_POLICY", "sloppy"),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
