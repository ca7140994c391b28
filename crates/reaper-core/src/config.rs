use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use secrecy::SecretString;

use crate::{errors::Error, Result};

/// Threshold used when `DAYS_INACTIVE` is not set.
///
/// Falling back to zero would make every channel eligible on the first run, so the
/// default is an explicit, non-trivial value instead.
pub const DEFAULT_DAYS_INACTIVE: u32 = 60;
pub const DEFAULT_PAGE_SIZE: usize = 1000;
pub const DEFAULT_HISTORY_LIMIT: usize = 100;
pub const DEFAULT_API_BASE_URL: &str = "https://slack.com/api";
pub const DOTENV_PATH: &str = ".env";

/// Typed run configuration, constructed once and passed by reference.
#[derive(Debug)]
pub struct Config {
    pub bot_token: SecretString,
    pub api_base_url: String,

    // Policy
    pub days_inactive: u32,
    pub allowlist_path: PathBuf,
    pub archivelist_path: PathBuf,

    // Backoff
    pub retry_delay: Option<Duration>,

    // Paging
    pub page_size: usize,
    pub history_limit: usize,
}

impl Config {
    /// Load from the process environment, after applying `.env` if present.
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(DOTENV_PATH));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).and_then(non_empty);

        let bot_token = get("BOT_TOKEN").ok_or_else(|| {
            Error::Config("BOT_TOKEN environment variable is required".to_string())
        })?;

        let days_inactive = match get("DAYS_INACTIVE") {
            Some(raw) => parse_num::<u32>("DAYS_INACTIVE", &raw)?,
            None => {
                tracing::warn!(
                    default = DEFAULT_DAYS_INACTIVE,
                    "DAYS_INACTIVE not set, using default threshold"
                );
                DEFAULT_DAYS_INACTIVE
            }
        };

        let retry_delay = get("RETRY_DELAY")
            .map(|raw| parse_num::<u64>("RETRY_DELAY", &raw))
            .transpose()?
            .map(Duration::from_secs);

        let page_size = get("PAGE_SIZE")
            .map(|raw| parse_num::<usize>("PAGE_SIZE", &raw))
            .transpose()?
            .unwrap_or(DEFAULT_PAGE_SIZE);
        let history_limit = get("HISTORY_LIMIT")
            .map(|raw| parse_num::<usize>("HISTORY_LIMIT", &raw))
            .transpose()?
            .unwrap_or(DEFAULT_HISTORY_LIMIT);
        if page_size == 0 || history_limit == 0 {
            return Err(Error::Config(
                "PAGE_SIZE and HISTORY_LIMIT must be at least 1".to_string(),
            ));
        }

        let allowlist_path = PathBuf::from(
            get("ALLOWLIST_PATH").unwrap_or_else(|| "./allowlist.txt".to_string()),
        );
        let archivelist_path = PathBuf::from(
            get("ARCHIVELIST_PATH").unwrap_or_else(|| "./archivelist.txt".to_string()),
        );

        let api_base_url = get("SLACK_API_BASE_URL")
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            bot_token: SecretString::from(bot_token),
            api_base_url,
            days_inactive,
            allowlist_path,
            archivelist_path,
            retry_delay,
            page_size,
            history_limit,
        })
    }
}

fn parse_num<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| Error::Config(format!("{key} must be a non-negative integer, got {raw:?}")))
}

/// Copy `KEY=value` pairs from `path` into the process environment.
/// Variables that are already set win. A missing file is not an error.
pub fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let line = line.strip_prefix("export ").unwrap_or(line);
        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        out.push((key.to_string(), val));
    }
    out
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
