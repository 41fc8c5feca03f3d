use std::{path::Path, sync::Arc};

use tracing::info;

use chainpal_core::{
    config::{load_dotenv_if_present, Config, Transport},
    dispatcher::Dispatcher,
    ports::{Assistant, PriceOracle},
    session::InMemorySessionStore,
};
use chainpal_openai::{ChatCompletionAssistant, CoinGeckoClient, OpenAiClient};
use chainpal_telegram::{build_bot, router, webhook, TelegramMessenger};
use chainpal_wallet::EvmWalletGenerator;

#[tokio::main]
async fn main() -> Result<(), chainpal_core::Error> {
    // RUST_LOG may come from .env.
    load_dotenv_if_present(Path::new(".env"));
    chainpal_core::logging::init("chainpal")?;

    let cfg = Config::load()?;
    info!(
        model = %cfg.openai_model,
        transport = ?cfg.transport,
        escape_mode = ?cfg.features.escape_mode,
        "configuration loaded"
    );

    let bot = build_bot(&cfg)?;
    let messenger = Arc::new(TelegramMessenger::new(bot.clone()));

    let client = OpenAiClient::new(
        cfg.openai_base_url.clone(),
        cfg.openai_api_key.clone(),
        cfg.openai_model.clone(),
        cfg.http_timeout,
    )?;
    let assistant: Arc<dyn Assistant> = if cfg.features.tool_calling {
        let prices: Arc<dyn PriceOracle> = Arc::new(CoinGeckoClient::new(
            cfg.price_api_base_url.clone(),
            cfg.http_timeout,
        )?);
        Arc::new(ChatCompletionAssistant::with_price_tool(client, prices))
    } else {
        Arc::new(ChatCompletionAssistant::plain(client))
    };

    let dispatcher = Arc::new(
        Dispatcher::new(
            cfg.features,
            messenger,
            assistant,
            Arc::new(EvmWalletGenerator::new()),
            Arc::new(InMemorySessionStore::new()),
        )
        .with_mini_app_url(cfg.mini_app_url.clone()),
    );

    let served = match cfg.transport {
        Transport::Webhook => {
            webhook::serve_webhook(&cfg.bind_addr, &cfg.webhook_path, dispatcher).await
        }
        Transport::Polling => router::run_polling(bot, dispatcher).await,
    };
    served.map_err(|e| chainpal_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
