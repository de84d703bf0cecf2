// Configuration: a properties file loaded once at process entry and turned into
// an explicit ClientConfig that every client receives at construction
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

// Default location of the properties file, relative to the crate root
pub const DEFAULT_CONFIG_PATH: &str = "resources/config.properties";

// Environment variable the test runner can use to point at another file
pub const CONFIG_PATH_ENV: &str = "BOOKING_CONFIG";

pub const BASE_URL_KEY: &str = "base.url";
pub const USERNAME_KEY: &str = "username";
pub const PASSWORD_KEY: &str = "password";
pub const TIMEOUT_MS_KEY: &str = "timeout.ms";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Missing configuration key: {0}")]
    MissingKey(String),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

// Key-value pairs read from a properties source
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties {
    values: HashMap<String, String>,
}

impl Properties {
    // Java properties syntax: `key=value`, `key: value` or `key value` entries,
    // `#`/`!` comments, backslash escapes and `\`-continued lines
    pub fn parse(text: &str) -> Self {
        let mut values = HashMap::new();

        for line in logical_lines(text) {
            let (key, value) = split_entry(&line);
            if key.is_empty() {
                continue;
            }
            values.insert(key, value);
        }

        Self { values }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    // Load from BOOKING_CONFIG if set, otherwise from the bundled resource
    pub fn load_default() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Self::load(PathBuf::from(path)),
            None => Self::load(DEFAULT_CONFIG_PATH),
        }
    }

    pub fn get(&self, key: &str) -> Result<&str, ConfigError> {
        self.values
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| ConfigError::MissingKey(key.to_string()))
    }

    pub fn base_url(&self) -> Result<&str, ConfigError> {
        self.get(BASE_URL_KEY)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// Joins continuation lines and drops comments and blank lines
fn logical_lines(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut pending: Option<String> = None;

    for raw in text.lines() {
        let line = raw.trim_start();
        let mut current = match pending.take() {
            Some(head) => head,
            None if line.is_empty() || line.starts_with('#') || line.starts_with('!') => {
                continue;
            }
            None => String::new(),
        };

        if ends_with_continuation(line) {
            current.push_str(&line[..line.len() - 1]);
            pending = Some(current);
        } else {
            current.push_str(line);
            lines.push(current);
        }
    }

    lines.extend(pending);
    lines
}

// An odd run of trailing backslashes escapes the line break
fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

// The key ends at the first unescaped `=`, `:` or whitespace
fn split_entry(line: &str) -> (String, String) {
    let mut escaped = false;
    let mut key_end = line.len();

    for (idx, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => {
                key_end = idx;
                break;
            }
            c if c.is_whitespace() => {
                key_end = idx;
                break;
            }
            _ => {}
        }
    }

    let rest = line[key_end..].trim_start();
    let rest = rest
        .strip_prefix(|c: char| c == '=' || c == ':')
        .unwrap_or(rest);

    (unescape(&line[..key_end]), unescape(rest.trim()))
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push('u');
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }

    out
}

// Everything the clients need to talk to the booking service
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
    // None keeps the HTTP client default
    pub timeout_ms: Option<u64>,
}

impl ClientConfig {
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: normalize_base_url(&base_url.into()),
            username: username.into(),
            password: password.into(),
            timeout_ms: None,
        }
    }

    pub fn from_properties(properties: &Properties) -> Result<Self, ConfigError> {
        let timeout_ms = match properties.get(TIMEOUT_MS_KEY) {
            Ok(raw) => Some(raw.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                key: TIMEOUT_MS_KEY.to_string(),
                value: raw.to_string(),
            })?),
            Err(ConfigError::MissingKey(_)) => None,
            Err(e) => return Err(e),
        };

        let base_url = properties.base_url()?;
        if base_url.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: BASE_URL_KEY.to_string(),
                value: base_url.to_string(),
            });
        }

        Ok(Self {
            base_url: normalize_base_url(base_url),
            username: properties.get(USERNAME_KEY)?.to_string(),
            password: properties.get(PASSWORD_KEY)?.to_string(),
            timeout_ms,
        })
    }

    pub fn load_default() -> Result<Self, ConfigError> {
        Self::from_properties(&Properties::load_default()?)
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }
}

fn normalize_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}
