//! Telegram adapter (teloxide + axum webhook).
//!
//! This crate implements the `chainpal-core` MessagingPort over the Telegram
//! Bot API and feeds inbound updates into the core dispatcher.

use async_trait::async_trait;

use teloxide::{
    prelude::*,
    types::{InlineKeyboardButton, InlineKeyboardMarkup, WebAppInfo},
};

pub mod router;
pub mod webhook;
pub mod wire;

use chainpal_core::{
    config::Config,
    errors::Error,
    messaging::{
        port::MessagingPort,
        types::{ButtonAction, InlineKeyboard, OutboundMessage, ParseMode},
    },
    Result,
};

/// Build the Bot API client, honoring a custom API base URL when configured.
pub fn build_bot(cfg: &Config) -> Result<Bot> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());
    let Some(raw) = &cfg.telegram_api_url else {
        return Ok(bot);
    };
    let url = reqwest::Url::parse(raw)
        .map_err(|e| Error::Config(format!("TELEGRAM_API_URL is not a valid URL: {e}")))?;
    Ok(bot.set_api_url(url))
}

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    pub fn bot(&self) -> Bot {
        self.bot.clone()
    }

    fn tg_chat(chat_id: chainpal_core::domain::ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::External(format!("telegram error: {e}"))
    }
}

/// Convert a core keyboard into Telegram inline markup.
pub fn to_markup(keyboard: &InlineKeyboard) -> Result<InlineKeyboardMarkup> {
    let mut rows = Vec::with_capacity(keyboard.rows.len());
    for row in &keyboard.rows {
        let mut buttons = Vec::with_capacity(row.len());
        for b in row {
            let button = match &b.action {
                ButtonAction::Callback(data) => {
                    InlineKeyboardButton::callback(b.label.clone(), data.clone())
                }
                ButtonAction::WebApp(raw) => {
                    let url = reqwest::Url::parse(raw).map_err(|e| {
                        Error::External(format!("invalid mini app url `{raw}`: {e}"))
                    })?;
                    InlineKeyboardButton::web_app(b.label.clone(), WebAppInfo { url })
                }
            };
            buttons.push(button);
        }
        rows.push(buttons);
    }
    Ok(InlineKeyboardMarkup::new(rows))
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    async fn send_message(&self, msg: &OutboundMessage) -> Result<()> {
        let mut req = self
            .bot
            .send_message(Self::tg_chat(msg.chat_id), msg.text.clone());
        if let Some(ParseMode::MarkdownV2) = msg.parse_mode {
            req = req.parse_mode(teloxide::types::ParseMode::MarkdownV2);
        }
        if let Some(keyboard) = &msg.keyboard {
            req = req.reply_markup(to_markup(keyboard)?);
        }

        req.await.map_err(Self::map_err)?;
        Ok(())
    }

    async fn answer_callback_query(&self, callback_id: &str) -> Result<()> {
        self.bot
            .answer_callback_query(callback_id.to_string())
            .await
            .map_err(Self::map_err)?;
        Ok(())
    }
}
