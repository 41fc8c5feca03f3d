use std::{env, fs, path::Path, time::Duration};

use crate::{errors::Error, formatting::EscapeMode, Result};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.red-pill.ai/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_PRICE_API_BASE_URL: &str = "https://api.coingecko.com/api/v3";
pub const DEFAULT_WEBHOOK_PATH: &str = "/api/telegram-webhook";

/// How updates reach the bot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transport {
    /// Telegram POSTs updates to our HTTP endpoint.
    Webhook,
    /// We long-poll `getUpdates` (local development).
    Polling,
}

impl Transport {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "webhook" => Some(Self::Webhook),
            "polling" | "poll" => Some(Self::Polling),
            _ => None,
        }
    }
}

/// Behavior toggles selecting between the handler variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Features {
    pub escape_mode: EscapeMode,
    /// `/start` creates a wallet instead of replying with a plain welcome.
    pub wallets: bool,
    /// Include the private key inline in the `/start` reply.
    pub reveal_key_on_start: bool,
    pub chain_keyboard: bool,
    pub tool_calling: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            escape_mode: EscapeMode::default(),
            wallets: true,
            reveal_key_on_start: false,
            chain_keyboard: true,
            tool_calling: true,
        }
    }
}

/// Typed configuration, read from the environment (and an optional `.env`).
#[derive(Clone, Debug)]
pub struct Config {
    // Telegram
    pub telegram_bot_token: String,
    pub telegram_api_url: Option<String>,

    // AI + price providers
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub openai_model: String,
    pub price_api_base_url: String,
    pub http_timeout: Duration,

    // Transport
    pub transport: Transport,
    pub bind_addr: String,
    pub webhook_path: String,

    pub mini_app_url: Option<String>,
    pub features: Features,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup (the environment in production).
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| get(key).and_then(non_empty);

        // Required: missing credentials are fatal at startup.
        let telegram_bot_token = get("TELEGRAM_BOT_TOKEN").ok_or_else(|| {
            Error::Config("TELEGRAM_BOT_TOKEN environment variable is required".to_string())
        })?;
        let openai_api_key = get("OPENAI_API_KEY").ok_or_else(|| {
            Error::Config("OPENAI_API_KEY environment variable is required".to_string())
        })?;

        let telegram_api_url = get("TELEGRAM_API_URL");
        let openai_base_url = get("OPENAI_BASE_URL")
            .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let openai_model = get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string());
        let price_api_base_url = get("PRICE_API_BASE_URL")
            .unwrap_or_else(|| DEFAULT_PRICE_API_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let http_timeout =
            Duration::from_secs(parse_u64(get("HTTP_TIMEOUT_SECS"), "HTTP_TIMEOUT_SECS")?.unwrap_or(30));

        let transport = match get("BOT_TRANSPORT") {
            Some(raw) => Transport::parse(&raw).ok_or_else(|| {
                Error::Config(format!(
                    "BOT_TRANSPORT must be `webhook` or `polling`, got `{raw}`"
                ))
            })?,
            None => Transport::Webhook,
        };
        let bind_addr = get("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let webhook_path = get("WEBHOOK_PATH").unwrap_or_else(|| DEFAULT_WEBHOOK_PATH.to_string());
        if !webhook_path.starts_with('/') {
            return Err(Error::Config(format!(
                "WEBHOOK_PATH must start with `/`, got `{webhook_path}`"
            )));
        }

        let mini_app_url = get("MINI_APP_URL");

        let defaults = Features::default();
        let escape_mode = match get("ESCAPE_MODE") {
            Some(raw) => EscapeMode::parse(&raw).ok_or_else(|| {
                Error::Config(format!(
                    "ESCAPE_MODE must be one of plain, markdown_v2, markdown_v2_collapse_dashes; got `{raw}`"
                ))
            })?,
            None => defaults.escape_mode,
        };
        let features = Features {
            escape_mode,
            wallets: get("ENABLE_WALLETS")
                .map(|s| parse_bool(&s))
                .unwrap_or(defaults.wallets),
            reveal_key_on_start: get("REVEAL_KEY_ON_START")
                .map(|s| parse_bool(&s))
                .unwrap_or(defaults.reveal_key_on_start),
            chain_keyboard: get("ENABLE_CHAIN_KEYBOARD")
                .map(|s| parse_bool(&s))
                .unwrap_or(defaults.chain_keyboard),
            tool_calling: get("ENABLE_TOOL_CALLING")
                .map(|s| parse_bool(&s))
                .unwrap_or(defaults.tool_calling),
        };

        Ok(Self {
            telegram_bot_token,
            telegram_api_url,
            openai_api_key,
            openai_base_url,
            openai_model,
            price_api_base_url,
            http_timeout,
            transport,
            bind_addr,
            webhook_path,
            mini_app_url,
            features,
        })
    }
}

/// Read `KEY=value` lines from `path` into the environment.
///
/// Existing variables win; a missing file is not an error.
pub fn load_dotenv_if_present(path: &Path) {
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
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        env::set_var(key, unquote(v.trim()));
    }
}

/// Read a non-blank environment variable.
pub fn env_str(key: &str) -> Option<String> {
    env::var(key).ok().and_then(non_empty)
}

fn unquote(val: &str) -> &str {
    if val.len() >= 2
        && ((val.starts_with('"') && val.ends_with('"'))
            || (val.starts_with('\'') && val.ends_with('\'')))
    {
        return &val[1..val.len() - 1];
    }
    val
}

fn parse_bool(s: &str) -> bool {
    matches!(
        s.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_u64(v: Option<String>, key: &str) -> Result<Option<u64>> {
    v.map(|s| {
        s.trim()
            .parse::<u64>()
            .map_err(|_| Error::Config(format!("{key} must be a non-negative integer, got `{s}`")))
    })
    .transpose()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
