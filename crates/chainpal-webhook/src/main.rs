//! Registers (or inspects) the bot's webhook with Telegram.

use std::path::Path;

use anyhow::{anyhow, bail, Context};
use clap::{Parser, ValueEnum};
use teloxide::prelude::*;
use tracing::info;

use chainpal_core::config::{env_str, load_dotenv_if_present};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Deployment {
    Dev,
    Prod,
}

impl Deployment {
    fn url_var(self) -> &'static str {
        match self {
            Deployment::Dev => "DEV_WEBHOOK_URL",
            Deployment::Prod => "PROD_WEBHOOK_URL",
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "chainpal-webhook", about = "Set or inspect the Telegram webhook")]
struct Cli {
    /// Deployment whose webhook URL is read from the environment.
    #[arg(short, long, value_enum, conflicts_with = "url")]
    env: Option<Deployment>,

    /// Explicit webhook URL.
    #[arg(short, long)]
    url: Option<String>,

    /// Only print the current webhook info; `--url`/`--env` are ignored.
    #[arg(short, long)]
    info: bool,
}

/// Where the webhook should point, or `None` when only inspecting.
fn resolve_target(
    cli: &Cli,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Option<reqwest::Url>> {
    if cli.info {
        return Ok(None);
    }
    let raw = match (&cli.url, cli.env) {
        (Some(url), _) => url.clone(),
        (None, Some(env)) => lookup(env.url_var())
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| anyhow!("{} is not set", env.url_var()))?,
        (None, None) => bail!("nothing to do: pass --url, --env or --info"),
    };
    let url = reqwest::Url::parse(raw.trim()).with_context(|| format!("invalid webhook url `{raw}`"))?;
    Ok(Some(url))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    load_dotenv_if_present(Path::new(".env"));
    chainpal_core::logging::init("chainpal-webhook")?;

    let token = env_str("TELEGRAM_BOT_TOKEN").context("TELEGRAM_BOT_TOKEN is required")?;
    let mut bot = Bot::new(token);
    if let Some(api) = env_str("TELEGRAM_API_URL") {
        bot = bot.set_api_url(reqwest::Url::parse(&api).context("invalid TELEGRAM_API_URL")?);
    }

    if let Some(url) = resolve_target(&cli, env_str)? {
        bot.set_webhook(url.clone())
            .await
            .context("setWebhook failed")?;
        info!(%url, "webhook set");
    }

    let webhook = bot.get_webhook_info().await.context("getWebhookInfo failed")?;
    println!("{webhook:#?}");
    Ok(())
}
